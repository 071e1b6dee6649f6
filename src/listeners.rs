//! Synchronous, single-threaded change notification.
//!
//! A [`Listeners`] list hands out [`Subscription`] guards; dropping a guard
//! removes its callback, so a torn-down consumer can never be called back.

use std::{
    cell::RefCell,
    collections::HashSet,
    rc::{Rc, Weak},
};

type Callback<T> = Box<dyn FnMut(&T)>;

struct Registry<T> {
    next_id: u64,
    callbacks: Vec<(u64, Callback<T>)>,
    // ids dropped while their callback was taken out for a notification
    removed: HashSet<u64>,
}

pub struct Listeners<T> {
    inner: Rc<RefCell<Registry<T>>>,
}

impl<T: 'static> Listeners<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry {
                next_id: 0,
                callbacks: Vec::new(),
                removed: HashSet::new(),
            })),
        }
    }

    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let id = {
            let mut registry = self.inner.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.callbacks.push((id, Box::new(callback)));
            id
        };
        let weak: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.inner);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let mut registry = inner.borrow_mut();
                    let before = registry.callbacks.len();
                    registry.callbacks.retain(|(other, _)| *other != id);
                    if registry.callbacks.len() == before {
                        registry.removed.insert(id);
                    }
                }
            })),
        }
    }

    /// Calls every live callback with `value`, in subscription order.
    ///
    /// Callbacks may subscribe or drop subscriptions while being notified.
    pub fn notify(&self, value: &T) {
        let mut callbacks = std::mem::take(&mut self.inner.borrow_mut().callbacks);
        for (id, callback) in callbacks.iter_mut() {
            // an earlier callback in this round may have dropped this subscription
            if self.inner.borrow().removed.contains(id) {
                continue;
            }
            callback(value);
        }
        let mut registry = self.inner.borrow_mut();
        let removed = std::mem::take(&mut registry.removed);
        callbacks.retain(|(id, _)| !removed.contains(id));
        callbacks.append(&mut registry.callbacks);
        registry.callbacks = callbacks;
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.inner.borrow().callbacks.len())
            .finish()
    }
}

/// Keeps a callback registered until dropped.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Keep the callback registered for the lifetime of the list.
    pub fn forget(mut self) {
        self.release = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Subscription")
    }
}
