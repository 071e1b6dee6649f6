//! Scroll progress: the master value the whole scene is driven by.
//!
//! The raw scroll fraction of the page is remapped through a piecewise
//! linear curve. The default curve keeps the intro still until 3 % of the
//! page has been scrolled and then ramps up quickly.

use anyhow::{anyhow, ensure};

use crate::listeners::{Listeners, Subscription};

pub const SCROLL_BREAKPOINTS: [f32; 3] = [0.03, 0.1, 1.0];
pub const PROGRESS_BREAKPOINTS: [f32; 3] = [0.0, 0.05, 1.0];

/// A clamped piecewise-linear map through `(input[i], output[i])`.
#[derive(Clone, Debug, PartialEq)]
pub struct PiecewiseLinear {
    input: Vec<f32>,
    output: Vec<f32>,
}

impl PiecewiseLinear {
    /// `input` must be strictly increasing and as long as `output` (at least two points).
    pub fn new(input: &[f32], output: &[f32]) -> anyhow::Result<Self> {
        ensure!(
            input.len() == output.len(),
            "curve has {} inputs but {} outputs",
            input.len(),
            output.len()
        );
        ensure!(input.len() >= 2, "curve needs at least two points");
        if let Some(pair) = input.windows(2).find(|pair| !(pair[0] < pair[1])) {
            return Err(anyhow!(
                "curve inputs must be strictly increasing, got {} then {}",
                pair[0],
                pair[1]
            ));
        }
        Ok(Self {
            input: input.to_vec(),
            output: output.to_vec(),
        })
    }

    /// Breakpoints hit exactly; outside the input range the end values are held.
    pub fn map(&self, x: f32) -> f32 {
        let last = self.input.len() - 1;
        if x.is_nan() || x <= self.input[0] {
            return self.output[0];
        }
        if x >= self.input[last] {
            return self.output[last];
        }
        let next = self.input.partition_point(|&breakpoint| breakpoint < x);
        if x == self.input[next] {
            return self.output[next];
        }
        let prev = next - 1;
        let t = (x - self.input[prev]) / (self.input[next] - self.input[prev]);
        self.output[prev] + t * (self.output[next] - self.output[prev])
    }
}

impl Default for PiecewiseLinear {
    fn default() -> Self {
        Self {
            input: SCROLL_BREAKPOINTS.to_vec(),
            output: PROGRESS_BREAKPOINTS.to_vec(),
        }
    }
}

/// Page geometry at the time of a scroll event, in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollPosition {
    pub offset: f64,
    pub scroll_height: f64,
    pub viewport_height: f64,
}

impl ScrollPosition {
    pub fn max_offset(&self) -> f64 {
        (self.scroll_height - self.viewport_height).max(0.0)
    }

    /// Fraction of the scrollable distance covered; 0 on pages that cannot scroll.
    pub fn fraction(&self) -> f32 {
        let max = self.max_offset();
        if max <= 0.0 {
            return 0.0;
        }
        (self.offset / max).clamp(0.0, 1.0) as f32
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollState {
    /// Raw scroll fraction of the page in `[0, 1]`.
    pub raw: f32,
    /// Remapped progress in `[0, 1]`.
    pub progress: f32,
}

#[derive(Debug)]
pub struct ScrollProgress {
    curve: PiecewiseLinear,
    state: ScrollState,
    listeners: Listeners<ScrollState>,
}

impl ScrollProgress {
    pub fn new(curve: PiecewiseLinear) -> Self {
        let state = ScrollState {
            raw: 0.0,
            progress: curve.map(0.0),
        };
        Self {
            curve,
            state,
            listeners: Listeners::new(),
        }
    }

    pub fn curve(&self) -> &PiecewiseLinear {
        &self.curve
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn progress(&self) -> f32 {
        self.state.progress
    }

    pub fn raw(&self) -> f32 {
        self.state.raw
    }

    /// Record a scroll event. Subscribers are notified on every call, changed or not.
    pub fn set_fraction(&mut self, raw: f32) -> ScrollState {
        let raw = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 1.0) };
        self.state = ScrollState {
            raw,
            progress: self.curve.map(raw).clamp(0.0, 1.0),
        };
        self.listeners.notify(&self.state);
        self.state
    }

    pub fn set_position(&mut self, position: ScrollPosition) -> ScrollState {
        self.set_fraction(position.fraction())
    }

    pub fn subscribe(&self, callback: impl FnMut(&ScrollState) + 'static) -> Subscription {
        self.listeners.subscribe(callback)
    }
}

impl Default for ScrollProgress {
    fn default() -> Self {
        Self::new(PiecewiseLinear::default())
    }
}
