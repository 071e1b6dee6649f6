//! Viewport width tracking and the narrow/wide layout switch.

use crate::listeners::{Listeners, Subscription};

/// Viewports narrower than this use the narrow (swipeable) layout.
pub const NARROW_BREAKPOINT: u32 = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    Narrow,
    Wide,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_narrow(&self) -> bool {
        self.width < NARROW_BREAKPOINT
    }

    /// Width over height; 1 while the viewport has no height yet.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }

    pub fn layout(&self) -> Layout {
        if self.is_narrow() {
            Layout::Narrow
        } else {
            Layout::Wide
        }
    }
}

#[derive(Debug)]
pub struct ViewportAdapter {
    size: ViewportSize,
    listeners: Listeners<ViewportSize>,
}

impl ViewportAdapter {
    pub fn new(size: ViewportSize) -> Self {
        Self {
            size,
            listeners: Listeners::new(),
        }
    }

    pub fn size(&self) -> ViewportSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn is_narrow(&self) -> bool {
        self.size.is_narrow()
    }

    pub fn layout(&self) -> Layout {
        self.size.layout()
    }

    /// Record an observed size. Returns `true` and notifies only if it changed.
    pub fn observe(&mut self, size: ViewportSize) -> bool {
        if size == self.size {
            return false;
        }
        self.size = size;
        self.listeners.notify(&self.size);
        true
    }

    pub fn subscribe(&self, callback: impl FnMut(&ViewportSize) + 'static) -> Subscription {
        self.listeners.subscribe(callback)
    }
}
