//! Browser host: DOM listeners, resize observer and the animation-frame loop.
//!
//! Every browser resource is held by a guard that releases it on drop, so
//! dropping a [`Page`] tears the configurator down completely.

use std::{cell::RefCell, rc::Rc};

use instant::Duration;
use wasm_bindgen::{closure::Closure, prelude::*, JsCast};
use web_sys as web;

use crate::{
    context::Config,
    flow::{Configurator, Frame, Out, RenderSurface},
    overlay::{ControlEvent, Extent, Field, OverlayView, SWATCHES},
    resources,
    scroll::ScrollPosition,
    viewport::ViewportSize,
};

pub const LENGTH_SLIDER_ID: &str = "length-slider";
pub const LENGTH_INPUT_ID: &str = "length-input";
pub const WIDTH_SLIDER_ID: &str = "width-slider";
pub const WIDTH_INPUT_ID: &str = "width-input";
pub const COLOR_INPUT_ID: &str = "color-input";
pub const COLOR_CHIP_ID: &str = "color-chip";
pub const PICKER_ID: &str = "color-picker";
pub const NEXT_PANE_ID: &str = "pane-next";
pub const PREV_PANE_ID: &str = "pane-prev";
pub const RETURN_TO_TOP_ID: &str = "return-to-top";
pub const PANEL_ID: &str = "overlay-panel";
pub const CARD_ID: &str = "overlay-card";
pub const BACKDROP_ID: &str = "backdrop";
pub const LOADING_ID: &str = "loading";

fn js_error(e: JsValue) -> anyhow::Error {
    anyhow::anyhow!("{:?}", e)
}

fn window_document() -> anyhow::Result<(web::Window, web::Document)> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;
    Ok((window, document))
}

/// Milliseconds since page load as a frame clock.
fn clock(window: &web::Window) -> Duration {
    let millis = window
        .performance()
        .map(|performance| performance.now())
        .unwrap_or(0.0);
    Duration::from_secs_f64(millis.max(0.0) / 1000.0)
}

fn viewport_size(window: &web::Window) -> ViewportSize {
    let dimension = |value: Result<JsValue, JsValue>| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0).max(0.0) as u32
    };
    ViewportSize::new(dimension(window.inner_width()), dimension(window.inner_height()))
}

fn scroll_position(window: &web::Window, document: &web::Document) -> ScrollPosition {
    let viewport_height = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let scroll_height = document
        .document_element()
        .map(|root| root.scroll_height() as f64)
        .unwrap_or(viewport_height);
    ScrollPosition {
        offset: window.scroll_y().unwrap_or(0.0),
        scroll_height,
        viewport_height,
    }
}

/// A DOM event listener, removed from its target on drop.
pub struct EventListener {
    target: web::EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web::Event)>,
}

impl EventListener {
    pub fn new(
        target: &web::EventTarget,
        kind: &'static str,
        handler: impl FnMut(web::Event) + 'static,
    ) -> anyhow::Result<Self> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web::Event)>);
        target
            .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
            .map_err(js_error)?;
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

/// Watches the document body for size changes until dropped.
pub struct ResizeGuard {
    observer: web::ResizeObserver,
    _closure: Closure<dyn FnMut()>,
}

impl ResizeGuard {
    pub fn new(target: &web::Element, mut handler: impl FnMut() + 'static) -> anyhow::Result<Self> {
        let closure = Closure::wrap(Box::new(move || handler()) as Box<dyn FnMut()>);
        let observer =
            web::ResizeObserver::new(closure.as_ref().unchecked_ref()).map_err(js_error)?;
        observer.observe(target);
        Ok(Self {
            observer,
            _closure: closure,
        })
    }
}

impl Drop for ResizeGuard {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// A `requestAnimationFrame` loop, cancelled on drop.
pub struct FrameLoop {
    tick: FrameCallback,
    handle: Rc<RefCell<Option<i32>>>,
}

impl FrameLoop {
    pub fn start(mut frame: impl FnMut() + 'static) -> anyhow::Result<Self> {
        let (window, _) = window_document()?;
        let tick: FrameCallback = Rc::new(RefCell::new(None));
        let handle = Rc::new(RefCell::new(None));
        let tick_clone = tick.clone();
        let handle_clone = handle.clone();
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            frame();
            if let (Some(w), Some(callback)) = (web::window(), tick_clone.borrow().as_ref()) {
                let next = w
                    .request_animation_frame(callback.as_ref().unchecked_ref())
                    .ok();
                *handle_clone.borrow_mut() = next;
            }
        }) as Box<dyn FnMut()>));
        let first = match tick.borrow().as_ref() {
            Some(callback) => window
                .request_animation_frame(callback.as_ref().unchecked_ref())
                .map_err(js_error)?,
            None => anyhow::bail!("frame callback missing"),
        };
        *handle.borrow_mut() = Some(first);
        Ok(Self { tick, handle })
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        if let (Some(window), Some(handle)) = (web::window(), self.handle.borrow_mut().take()) {
            let _ = window.cancel_animation_frame(handle);
        }
        // the closure holds a clone of `tick`; taking it breaks the cycle
        self.tick.borrow_mut().take();
    }
}

fn set_style(document: &web::Document, id: &str, property: &str, value: &str) {
    if let Some(element) = document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<web::HtmlElement>().ok())
    {
        let _ = element.style().set_property(property, value);
    }
}

fn toggle_class(document: &web::Document, id: &str, class: &str, on: bool) {
    if let Some(element) = document.get_element_by_id(id) {
        let _ = element.class_list().toggle_with_force(class, on);
    }
}

fn set_input_value(document: &web::Document, id: &str, value: &str) {
    if let Some(input) = document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<web::HtmlInputElement>().ok())
    {
        if input.value() != value {
            input.set_value(value);
        }
    }
}

/// Reflects the overlay state into the page's markup. The 3D scene itself is drawn elsewhere.
pub struct DomSurface {
    document: web::Document,
}

impl DomSurface {
    pub fn new(document: web::Document) -> Self {
        Self { document }
    }

    fn apply_overlay(&self, view: &OverlayView) {
        let document = &self.document;
        let extent = |extent: Extent| match extent {
            Extent::Full => "100%",
            Extent::Zero => "0",
        };
        set_style(document, PANEL_ID, "opacity", &view.style.opacity.to_string());
        set_style(document, CARD_ID, "width", extent(view.style.width));
        set_style(document, CARD_ID, "height", extent(view.style.height));
        if view.style.reset_padding {
            set_style(document, CARD_ID, "padding", "0");
        } else {
            let _ = document
                .get_element_by_id(CARD_ID)
                .and_then(|el| el.dyn_into::<web::HtmlElement>().ok())
                .map(|el| el.style().remove_property("padding"));
        }
        toggle_class(document, CARD_ID, &format!("pane-{}", view.pane), true);
        for pane in 0..3u8 {
            if pane != view.pane {
                toggle_class(document, CARD_ID, &format!("pane-{}", pane), false);
            }
        }
        toggle_class(document, PREV_PANE_ID, "hidden", !view.show_prev);
        toggle_class(document, NEXT_PANE_ID, "hidden", !view.show_next);
        toggle_class(document, PICKER_ID, "open", view.picker_open);
        toggle_class(document, BACKDROP_ID, "hidden", !view.backdrop_visible);
        toggle_class(document, LENGTH_INPUT_ID, "focused", view.length_focused);
        toggle_class(document, WIDTH_INPUT_ID, "focused", view.width_focused);
        if !view.length_focused {
            set_input_value(document, LENGTH_INPUT_ID, &view.length_text);
        }
        if !view.width_focused {
            set_input_value(document, WIDTH_INPUT_ID, &view.width_text);
        }
        set_input_value(document, LENGTH_SLIDER_ID, &view.length_text);
        set_input_value(document, WIDTH_SLIDER_ID, &view.width_text);
        set_style(document, COLOR_CHIP_ID, "background-color", &view.color);
        for (id, fill) in [
            (LENGTH_SLIDER_ID, view.length_fill),
            (WIDTH_SLIDER_ID, view.width_fill),
        ] {
            match fill {
                Some(fill) => {
                    set_style(
                        document,
                        id,
                        "background-image",
                        &format!("linear-gradient(to right, {0}, {0})", view.color),
                    );
                    set_style(document, id, "background-size", &format!("{}% 100%", fill));
                }
                None => {
                    set_style(document, id, "background-image", "none");
                }
            }
        }
    }
}

impl RenderSurface for DomSurface {
    fn resize(&mut self, size: ViewportSize) {
        log::debug!("Viewport resized to {}x{}", size.width, size.height);
    }

    fn draw(&mut self, frame: &Frame<'_>) -> anyhow::Result<()> {
        self.apply_overlay(&frame.overlay);
        Ok(())
    }
}

/// A mounted configurator and everything that keeps it running.
pub struct Page {
    configurator: Rc<RefCell<Configurator>>,
    _listeners: Vec<EventListener>,
    _resize: ResizeGuard,
    _frames: FrameLoop,
}

impl Page {
    pub fn configurator(&self) -> Rc<RefCell<Configurator>> {
        self.configurator.clone()
    }
}

fn bind(
    document: &web::Document,
    listeners: &mut Vec<EventListener>,
    id: &str,
    kind: &'static str,
    configurator: &Rc<RefCell<Configurator>>,
    event: impl Fn(&web::Event) -> Option<ControlEvent> + 'static,
) -> anyhow::Result<()> {
    let Some(element) = document.get_element_by_id(id) else {
        log::warn!("Element #{} not found, control left unbound", id);
        return Ok(());
    };
    let configurator = configurator.clone();
    listeners.push(EventListener::new(&element, kind, move |e| {
        let Some(control) = event(&e) else { return };
        let now = web::window().map(|w| clock(&w)).unwrap_or_default();
        configurator.borrow_mut().on_control(control, now);
    })?);
    Ok(())
}

fn input_value(event: &web::Event) -> Option<String> {
    event
        .target()
        .and_then(|target| target.dyn_into::<web::HtmlInputElement>().ok())
        .map(|input| input.value())
}

fn bind_controls(
    document: &web::Document,
    configurator: &Rc<RefCell<Configurator>>,
) -> anyhow::Result<Vec<EventListener>> {
    let mut listeners = Vec::new();
    for (field, slider, input) in [
        (Field::Length, LENGTH_SLIDER_ID, LENGTH_INPUT_ID),
        (Field::Width, WIDTH_SLIDER_ID, WIDTH_INPUT_ID),
    ] {
        bind(document, &mut listeners, slider, "input", configurator, move |e| {
            let value = input_value(e)?.parse::<f32>().ok()?;
            Some(ControlEvent::Slider(field, value))
        })?;
        bind(document, &mut listeners, input, "input", configurator, move |e| {
            Some(ControlEvent::Input(field, input_value(e)?))
        })?;
        bind(document, &mut listeners, input, "focus", configurator, move |_| {
            Some(ControlEvent::Focus(field))
        })?;
        bind(document, &mut listeners, input, "blur", configurator, move |_| {
            Some(ControlEvent::Blur(field))
        })?;
    }
    bind(document, &mut listeners, COLOR_INPUT_ID, "input", configurator, |e| {
        Some(ControlEvent::Color(input_value(e)?))
    })?;
    for i in 0..SWATCHES.len() {
        bind(
            document,
            &mut listeners,
            &format!("swatch-{}", i),
            "click",
            configurator,
            move |_| Some(ControlEvent::Swatch(i)),
        )?;
    }
    bind(document, &mut listeners, COLOR_CHIP_ID, "click", configurator, |_| {
        Some(ControlEvent::ColorChip)
    })?;
    bind(document, &mut listeners, NEXT_PANE_ID, "click", configurator, |_| {
        Some(ControlEvent::NextPane)
    })?;
    bind(document, &mut listeners, PREV_PANE_ID, "click", configurator, |_| {
        Some(ControlEvent::PrevPane)
    })?;
    bind(document, &mut listeners, RETURN_TO_TOP_ID, "click", configurator, |_| {
        Some(ControlEvent::ReturnToTop)
    })?;
    Ok(listeners)
}

/// Wire a configurator to the current page, drawing through `surface`.
pub fn mount<S: RenderSurface + 'static>(config: Config, surface: S) -> anyhow::Result<Page> {
    let (window, document) = window_document()?;
    let body = document
        .body()
        .ok_or_else(|| anyhow::anyhow!("document has no body"))?;

    let mut config = config;
    config.viewport = viewport_size(&window);
    let loading = document.clone();
    let configurator = Rc::new(RefCell::new(Configurator::with_ready_callback(
        &config,
        move |_| toggle_class(&loading, LOADING_ID, "hidden", true),
    )?));
    let surface = Rc::new(RefCell::new(surface));
    surface.borrow_mut().resize(config.viewport);

    let mut listeners = bind_controls(&document, &configurator)?;

    {
        let configurator = configurator.clone();
        let (w, d) = (window.clone(), document.clone());
        let on_scroll = move |_: web::Event| {
            configurator.borrow_mut().on_scroll(scroll_position(&w, &d));
        };
        listeners.push(EventListener::new(&window, "scroll", on_scroll)?);
    }
    configurator
        .borrow_mut()
        .on_scroll(scroll_position(&window, &document));

    let resize = {
        let configurator = configurator.clone();
        let surface = surface.clone();
        let w = window.clone();
        ResizeGuard::new(&body, move || {
            let size = viewport_size(&w);
            if configurator.borrow_mut().on_resize(size) {
                surface.borrow_mut().resize(size);
            }
        })?
    };

    {
        let configurator = configurator.clone();
        let model_path = config.model_path.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match resources::load_scene_gltf(&model_path).await {
                Ok(asset) => configurator.borrow_mut().on_asset_loaded(asset),
                Err(e) => configurator.borrow_mut().on_asset_failed(e),
            }
        });
    }

    let frames = {
        let configurator = configurator.clone();
        let w = window.clone();
        FrameLoop::start(move || {
            let now = clock(&w);
            let result = {
                let mut surface = surface.borrow_mut();
                configurator.borrow_mut().render(&mut *surface, now)
            };
            match result {
                Ok(Out::ScrollTo(offset)) => w.scroll_to_with_x_and_y(0.0, offset),
                Ok(Out::Empty) => (),
                Err(e) => log::error!("Frame could not be drawn: {:#}", e),
            }
        })?
    };

    log::info!("Configurator mounted");
    Ok(Page {
        configurator,
        _listeners: listeners,
        _resize: resize,
        _frames: frames,
    })
}

thread_local! {
    static PAGE: RefCell<Option<Page>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();

    let (_, document) = window_document().map_err(|e| JsValue::from_str(&e.to_string()))?;
    let page = mount(Config::default(), DomSurface::new(document))
        .map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;
    PAGE.with(|slot| *slot.borrow_mut() = Some(page));
    Ok(())
}

/// Remove every listener and stop the frame loop.
#[wasm_bindgen]
pub fn unmount() {
    PAGE.with(|slot| slot.borrow_mut().take());
}
