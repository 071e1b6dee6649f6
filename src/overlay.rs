//! The 2D overlay panel composited over the scene.
//!
//! The panel holds the visitor-facing state of the three product controls
//! (length, width, colour), the swipeable pane index used on narrow
//! viewports and the eased "return to top" scroll. It never touches the
//! scene: [`OverlayPanel::handle`] reports a [`ControlChange`] and the owner
//! forwards it to the parametric controller.

use instant::Duration;

use crate::{
    data_structures::material::Rgb,
    parametric::{
        DEFAULT_COLOR, DEFAULT_LENGTH, DEFAULT_WIDTH, LENGTH_MAX, LENGTH_MIN, ParametricControls,
        WIDTH_MAX, WIDTH_MIN,
    },
    scroll::{PiecewiseLinear, ScrollState},
    viewport::{Layout, NARROW_BREAKPOINT, ViewportSize},
};

/// Preset colours offered next to the free picker.
pub const SWATCHES: [&str; 4] = ["#865c50", "#6d7e4c", "#227772", "#92689c"];

/// Raw scroll fraction at which the panel switches between its collapsed and open extents.
pub const PANEL_THRESHOLD: f32 = 0.9;
/// The backdrop plane behind the bag is hidden once progress passes this.
pub const BACKDROP_MAX_PROGRESS: f32 = 0.8;

pub const RETURN_TO_TOP_DURATION: Duration = Duration::from_secs(5);

const OPACITY_INPUT: [f32; 3] = [0.5, 0.6, 1.0];
const OPACITY_OUTPUT: [f32; 3] = [0.0, 1.0, 1.0];

/// A CSS style `cubic-bezier(x1, y1, x2, y2)` timing curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl CubicBezier {
    pub const EASE_IN_OUT: CubicBezier = CubicBezier::new(0.42, 0.0, 0.58, 1.0);

    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    fn component(t: f32, p1: f32, p2: f32) -> f32 {
        let u = 1.0 - t;
        3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
    }

    fn derivative(t: f32, p1: f32, p2: f32) -> f32 {
        let u = 1.0 - t;
        3.0 * u * u * p1 + 6.0 * u * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
    }

    /// Eased progress for linear progress `x` in `[0, 1]`.
    pub fn ease(&self, x: f32) -> f32 {
        let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
        if x == 0.0 || x == 1.0 {
            return x;
        }
        // Newton iteration on x(t) = x, falling back to bisection when the slope vanishes
        let mut t = x;
        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        for _ in 0..16 {
            let error = Self::component(t, self.x1, self.x2) - x;
            if error.abs() < 1e-6 {
                break;
            }
            if error > 0.0 {
                hi = t;
            } else {
                lo = t;
            }
            let slope = Self::derivative(t, self.x1, self.x2);
            let next = t - error / slope;
            t = if slope.abs() > 1e-6 && next > lo && next < hi {
                next
            } else {
                (lo + hi) / 2.0
            };
        }
        Self::component(t, self.y1, self.y2)
    }
}

/// An eased scroll back to offset zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollToTop {
    from: f64,
    started: Duration,
    duration: Duration,
    curve: CubicBezier,
}

impl ScrollToTop {
    pub fn new(from: f64, started: Duration) -> Self {
        Self {
            from,
            started,
            duration: RETURN_TO_TOP_DURATION,
            curve: CubicBezier::EASE_IN_OUT,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Scroll offset at clock `now`, and whether the animation has finished.
    pub fn offset_at(&self, now: Duration) -> (f64, bool) {
        let elapsed = now.saturating_sub(self.started);
        if elapsed >= self.duration || self.duration.is_zero() {
            return (0.0, true);
        }
        let x = (elapsed.as_secs_f64() / self.duration.as_secs_f64()) as f32;
        let eased = self.curve.ease(x) as f64;
        (self.from * (1.0 - eased), false)
    }
}

/// Slider plus number box bound to one numeric control.
///
/// The slider is always in range. The number box forwards every edit
/// unclamped and only clamps when it loses focus.
#[derive(Clone, Debug, PartialEq)]
pub struct NumberField {
    min: f32,
    max: f32,
    value: f32,
    text: String,
    focused: bool,
}

impl NumberField {
    pub fn new(min: f32, max: f32, value: f32) -> Self {
        Self {
            min,
            max,
            value,
            text: format_number(value),
            focused: false,
        }
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Last live value, possibly out of range while the box is being edited.
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn slide(&mut self, value: f32) -> f32 {
        let value = if value.is_nan() {
            self.min
        } else {
            value.clamp(self.min, self.max)
        };
        self.value = value;
        self.text = format_number(value);
        value
    }

    /// Returns the parsed value, if the text is a number.
    pub fn input(&mut self, text: &str) -> Option<f32> {
        self.text = text.to_string();
        let value = parse_number(text)?;
        self.value = value;
        Some(value)
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Commit the box: clamp to the bounds, with unparsable text falling back to the minimum.
    pub fn blur(&mut self) -> f32 {
        self.focused = false;
        let value = match parse_number(&self.text) {
            Some(value) if value > self.max => self.max,
            Some(value) if value < self.min => self.min,
            Some(value) => value,
            None => self.min,
        };
        self.value = value;
        self.text = format_number(value);
        value
    }

    /// Filled share of the slider track in percent.
    pub fn fill_percent(&self) -> f32 {
        ((self.value - self.min) / (self.max - self.min) * 100.0).clamp(0.0, 100.0)
    }
}

fn parse_number(text: &str) -> Option<f32> {
    text.trim().parse::<f32>().ok().filter(|value| value.is_finite())
}

fn format_number(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Which pane is shown in the narrow layout: 0 length, 1 width, 2 colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaneIndex(u8);

impl PaneIndex {
    pub const LAST: u8 = 2;

    pub fn new(index: u8) -> Self {
        Self(index.min(Self::LAST))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn next(self) -> Self {
        if self.0 > 1 { Self(0) } else { Self(self.0 + 1) }
    }

    pub fn prev(self) -> Self {
        if self.0 < 1 { Self(Self::LAST) } else { Self(self.0 - 1) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Length,
    Width,
}

/// Input coming from the overlay's widgets.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlEvent {
    Slider(Field, f32),
    Input(Field, String),
    Focus(Field),
    Blur(Field),
    /// Free hex input from the picker.
    Color(String),
    Swatch(usize),
    ColorChip,
    NextPane,
    PrevPane,
    ReturnToTop,
}

/// A value the parametric controller has to apply.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlChange {
    Length(f32),
    Width(f32),
    Color(Rgb),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extent {
    Full,
    Zero,
}

/// Scroll-dependent styling of the panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayStyle {
    pub opacity: f32,
    pub width: Extent,
    pub height: Extent,
    /// Padding is forced to zero until the panel is open.
    pub reset_padding: bool,
}

impl OverlayStyle {
    pub fn for_scroll(raw: f32, layout: Layout) -> Self {
        let narrow = layout == Layout::Narrow;
        let past = raw > PANEL_THRESHOLD;
        let before = raw < PANEL_THRESHOLD;
        Self {
            opacity: opacity_curve().map(raw),
            width: if past || (before && narrow) {
                Extent::Full
            } else {
                Extent::Zero
            },
            height: if before && narrow {
                Extent::Zero
            } else {
                Extent::Full
            },
            reset_padding: !past,
        }
    }
}

fn opacity_curve() -> PiecewiseLinear {
    PiecewiseLinear::new(&OPACITY_INPUT, &OPACITY_OUTPUT).unwrap_or_default()
}

pub fn backdrop_visible(progress: f32) -> bool {
    progress <= BACKDROP_MAX_PROGRESS
}

/// Everything a host needs to draw the overlay for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayView {
    pub style: OverlayStyle,
    pub backdrop_visible: bool,
    pub pane: u8,
    pub show_prev: bool,
    pub show_next: bool,
    pub picker_open: bool,
    pub length_text: String,
    pub width_text: String,
    pub length_focused: bool,
    pub width_focused: bool,
    /// Slider fill in percent, narrow layout only.
    pub length_fill: Option<f32>,
    pub width_fill: Option<f32>,
    pub color: String,
}

#[derive(Clone, Debug)]
pub struct OverlayPanel {
    length: NumberField,
    width: NumberField,
    color: Rgb,
    picker_open: bool,
    pane: PaneIndex,
    return_to_top: Option<ScrollToTop>,
}

impl OverlayPanel {
    pub fn new() -> Self {
        Self {
            length: NumberField::new(LENGTH_MIN, LENGTH_MAX, DEFAULT_LENGTH),
            width: NumberField::new(WIDTH_MIN, WIDTH_MAX, DEFAULT_WIDTH),
            color: Rgb::from_hex(DEFAULT_COLOR).unwrap_or(Rgb::WHITE),
            picker_open: false,
            pane: PaneIndex::default(),
            return_to_top: None,
        }
    }

    pub fn length(&self) -> &NumberField {
        &self.length
    }

    pub fn width(&self) -> &NumberField {
        &self.width
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn pane(&self) -> PaneIndex {
        self.pane
    }

    pub fn is_picker_open(&self) -> bool {
        self.picker_open
    }

    pub fn is_returning_to_top(&self) -> bool {
        self.return_to_top.is_some()
    }

    /// Current live values of the three controls.
    pub fn controls(&self) -> ParametricControls {
        ParametricControls {
            length: self.length.value(),
            width: self.width.value(),
            color: self.color,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut NumberField {
        match field {
            Field::Length => &mut self.length,
            Field::Width => &mut self.width,
        }
    }

    fn change(field: Field, value: f32) -> ControlChange {
        match field {
            Field::Length => ControlChange::Length(value),
            Field::Width => ControlChange::Width(value),
        }
    }

    /// Apply one widget event. `scroll_offset` and `now` are only used to start the return to top.
    pub fn handle(
        &mut self,
        event: ControlEvent,
        viewport: ViewportSize,
        scroll_offset: f64,
        now: Duration,
    ) -> Option<ControlChange> {
        match event {
            ControlEvent::Slider(field, value) => {
                Some(Self::change(field, self.field_mut(field).slide(value)))
            }
            ControlEvent::Input(field, text) => self
                .field_mut(field)
                .input(&text)
                .map(|value| Self::change(field, value)),
            ControlEvent::Focus(field) => {
                self.field_mut(field).focus();
                None
            }
            ControlEvent::Blur(field) => Some(Self::change(field, self.field_mut(field).blur())),
            ControlEvent::Color(hex) => match Rgb::from_hex(&hex) {
                Ok(color) => {
                    self.color = color;
                    Some(ControlChange::Color(color))
                }
                Err(e) => {
                    log::debug!("Ignoring colour input {:?}: {}", hex, e);
                    None
                }
            },
            ControlEvent::Swatch(i) => {
                let color = Rgb::from_hex(SWATCHES.get(i)?).ok()?;
                self.color = color;
                Some(ControlChange::Color(color))
            }
            ControlEvent::ColorChip => {
                self.picker_open = !self.picker_open;
                if viewport.width > NARROW_BREAKPOINT {
                    self.pane = PaneIndex::new(if self.pane.get() != 2 { 2 } else { 0 });
                }
                None
            }
            ControlEvent::NextPane => {
                self.pane = self.pane.next();
                self.picker_open = false;
                None
            }
            ControlEvent::PrevPane => {
                self.pane = self.pane.prev();
                self.picker_open = false;
                None
            }
            ControlEvent::ReturnToTop => {
                if scroll_offset > 0.0 {
                    self.return_to_top = Some(ScrollToTop::new(scroll_offset, now));
                }
                None
            }
        }
    }

    /// Next scroll offset of a running return to top.
    pub fn step_return_to_top(&mut self, now: Duration) -> Option<f64> {
        let animation = self.return_to_top?;
        let (offset, finished) = animation.offset_at(now);
        if finished {
            self.return_to_top = None;
        }
        Some(offset)
    }

    pub fn view(&self, scroll: ScrollState, layout: Layout) -> OverlayView {
        let narrow = layout == Layout::Narrow;
        OverlayView {
            style: OverlayStyle::for_scroll(scroll.raw, layout),
            backdrop_visible: backdrop_visible(scroll.progress),
            pane: self.pane.get(),
            show_prev: narrow && self.pane.get() > 0,
            show_next: narrow && self.pane.get() < PaneIndex::LAST,
            picker_open: self.picker_open,
            length_text: self.length.text().to_string(),
            width_text: self.width.text().to_string(),
            length_focused: self.length.is_focused(),
            width_focused: self.width.is_focused(),
            length_fill: narrow.then(|| self.length.fill_percent()),
            width_fill: narrow.then(|| self.width.fill_percent()),
            color: self.color.to_hex(),
        }
    }
}

impl Default for OverlayPanel {
    fn default() -> Self {
        Self::new()
    }
}
