use std::{cell::RefCell, rc::Rc};

use configurator_ngin::{
    listeners::{Listeners, Subscription},
    viewport::{Layout, ViewportAdapter, ViewportSize},
};

#[test]
fn should_call_in_subscription_order() {
    let listeners: Listeners<u32> = Listeners::new();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let (a, b) = (calls.clone(), calls.clone());
    let _first = listeners.subscribe(move |v| a.borrow_mut().push(("first", *v)));
    let _second = listeners.subscribe(move |v| b.borrow_mut().push(("second", *v)));

    listeners.notify(&7);
    assert_eq!(*calls.borrow(), vec![("first", 7), ("second", 7)]);
    assert_eq!(listeners.len(), 2);
}

#[test]
fn should_unsubscribe_on_drop() {
    let listeners: Listeners<u32> = Listeners::new();
    let count = Rc::new(RefCell::new(0));
    let sink = count.clone();
    let subscription = listeners.subscribe(move |_| *sink.borrow_mut() += 1);
    listeners.notify(&1);
    drop(subscription);
    listeners.notify(&2);
    assert_eq!(*count.borrow(), 1);
    assert!(listeners.is_empty());
}

#[test]
fn should_keep_forgotten_subscriptions() {
    let listeners: Listeners<u32> = Listeners::new();
    let count = Rc::new(RefCell::new(0));
    let sink = count.clone();
    listeners.subscribe(move |_| *sink.borrow_mut() += 1).forget();
    listeners.notify(&1);
    listeners.notify(&2);
    assert_eq!(*count.borrow(), 2);
}

#[test]
fn should_allow_unsubscribing_while_notifying() {
    let listeners: Listeners<u32> = Listeners::new();
    let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let count = Rc::new(RefCell::new(0));
    let (sink, own) = (count.clone(), slot.clone());
    let subscription = listeners.subscribe(move |_| {
        *sink.borrow_mut() += 1;
        // drops its own guard
        own.borrow_mut().take();
    });
    *slot.borrow_mut() = Some(subscription);

    listeners.notify(&1);
    listeners.notify(&2);
    assert_eq!(*count.borrow(), 1);
    assert!(listeners.is_empty());
}

#[test]
fn should_not_call_a_peer_dropped_earlier_in_the_same_round() {
    let listeners: Listeners<u32> = Listeners::new();
    let peer_slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
    let peer_calls = Rc::new(RefCell::new(0));

    let slot = peer_slot.clone();
    let _first = listeners.subscribe(move |_| {
        slot.borrow_mut().take();
    });
    let sink = peer_calls.clone();
    *peer_slot.borrow_mut() = Some(listeners.subscribe(move |_| *sink.borrow_mut() += 1));

    listeners.notify(&1);
    listeners.notify(&2);
    assert_eq!(*peer_calls.borrow(), 0);
    assert_eq!(listeners.len(), 1);
}

#[test]
fn should_allow_subscribing_while_notifying() {
    let listeners: Rc<Listeners<u32>> = Rc::new(Listeners::new());
    let added: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));
    let (inner, store) = (listeners.clone(), added.clone());
    let _outer = listeners.subscribe(move |_| {
        store.borrow_mut().push(inner.subscribe(|_| {}));
    });

    listeners.notify(&1);
    assert_eq!(listeners.len(), 2);
    listeners.notify(&2);
    assert_eq!(listeners.len(), 3);
}

#[test]
fn should_switch_layout_at_breakpoint() {
    assert_eq!(ViewportSize::new(1023, 800).layout(), Layout::Narrow);
    assert_eq!(ViewportSize::new(1024, 800).layout(), Layout::Wide);
    assert!(ViewportSize::new(375, 800).is_narrow());
    assert_eq!(ViewportSize::new(1600, 800).aspect(), 2.0);
    assert_eq!(ViewportSize::new(1600, 0).aspect(), 1.0);
}

#[test]
fn should_notify_viewport_changes_only() {
    let mut viewport = ViewportAdapter::new(ViewportSize::new(1280, 720));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let _subscription = viewport.subscribe(move |size| sink.borrow_mut().push(*size));

    assert!(!viewport.observe(ViewportSize::new(1280, 720)));
    assert!(viewport.observe(ViewportSize::new(800, 600)));
    assert!(!viewport.observe(ViewportSize::new(800, 600)));
    assert_eq!(*seen.borrow(), vec![ViewportSize::new(800, 600)]);
    assert_eq!(viewport.width(), 800);
    assert!(viewport.is_narrow());
}
