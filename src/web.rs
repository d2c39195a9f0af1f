//! Browser entry points
//!
//! `BrowserHost` schedules frames with `requestAnimationFrame` and forwards
//! window resizes using the canvas layout size. `start_starfield` and
//! `start_wave` are exported to JS and return a `JsRenderer` handle.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, Window};

use crate::core::{Size, WaveConfig};
use crate::host::{FrameCallback, FrameHost, FrameId, ListenerId, ResizeListener};
use crate::renderer::{AnyRenderer, SceneConfig};
use crate::surface::CanvasSurface;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    // Initialize tracing for browser console
    tracing_wasm::set_as_global_default();
}

/// Delay of the timer fallback when `requestAnimationFrame` is refused
const RETRY_DELAY_MS: i32 = 16;

/// Browser handle of a scheduled callback
#[derive(Clone, Copy, Debug)]
enum Scheduled {
    Animation(i32),
    Timeout(i32),
}

#[derive(Default)]
struct BrowserInner {
    next_id: u64,
    /// Scheduled callbacks by our id, with their browser handle
    frames: HashMap<u64, (Scheduled, Closure<dyn FnMut()>)>,
    /// Ids whose callback already ran; their closures are freed on the next
    /// request or cancel, never from inside themselves
    fired: Vec<u64>,
    listeners: HashMap<u64, Closure<dyn FnMut()>>,
}

impl BrowserInner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn collect_fired(&mut self) {
        for id in self.fired.drain(..) {
            self.frames.remove(&id);
        }
    }
}

pub struct BrowserHost {
    window: Window,
    canvas: HtmlCanvasElement,
    inner: Rc<RefCell<BrowserInner>>,
}

impl BrowserHost {
    pub fn new(window: Window, canvas: HtmlCanvasElement) -> Self {
        Self {
            window,
            canvas,
            inner: Rc::new(RefCell::new(BrowserInner::default())),
        }
    }
}

impl FrameHost for BrowserHost {
    fn request_frame(&self, callback: FrameCallback) -> FrameId {
        let mut inner = self.inner.borrow_mut();
        inner.collect_fired();
        let id = inner.next_id();

        let weak: Weak<RefCell<BrowserInner>> = Rc::downgrade(&self.inner);
        let mut callback = Some(callback);
        let closure = Closure::wrap(Box::new(move || {
            if let Some(callback) = callback.take() {
                callback();
            }
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().fired.push(id);
            }
        }) as Box<dyn FnMut()>);

        let function = closure.as_ref().unchecked_ref();
        let scheduled = match self.window.request_animation_frame(function) {
            Ok(handle) => Some(Scheduled::Animation(handle)),
            Err(e) => {
                warn!(?e, "requestAnimationFrame failed, retrying on a timer");
                match self
                    .window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(function, RETRY_DELAY_MS)
                {
                    Ok(handle) => Some(Scheduled::Timeout(handle)),
                    Err(e) => {
                        warn!(?e, "Failed to schedule frame, renderer loop stopped");
                        None
                    }
                }
            }
        };
        if let Some(scheduled) = scheduled {
            inner.frames.insert(id, (scheduled, closure));
        }
        FrameId(id)
    }

    fn cancel_frame(&self, id: FrameId) {
        let mut inner = self.inner.borrow_mut();
        inner.collect_fired();
        match inner.frames.remove(&id.0) {
            Some((Scheduled::Animation(handle), _closure)) => {
                if let Err(e) = self.window.cancel_animation_frame(handle) {
                    debug!(?e, "cancelAnimationFrame failed");
                }
            }
            Some((Scheduled::Timeout(handle), _closure)) => self.window.clear_timeout_with_handle(handle),
            None => {}
        }
    }

    fn add_resize_listener(&self, mut listener: ResizeListener) -> ListenerId {
        let canvas = self.canvas.clone();
        let closure = Closure::wrap(Box::new(move || {
            let size = Size::new(canvas.offset_width() as f64, canvas.offset_height() as f64);
            if size.is_drawable() {
                listener(size);
            }
        }) as Box<dyn FnMut()>);

        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id();
        if let Err(e) = self
            .window
            .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
        {
            warn!(?e, "Failed to add resize listener");
        }
        inner.listeners.insert(id, closure);
        ListenerId(id)
    }

    fn remove_resize_listener(&self, id: ListenerId) {
        let Some(closure) = self.inner.borrow_mut().listeners.remove(&id.0) else {
            return;
        };
        if let Err(e) = self
            .window
            .remove_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
        {
            debug!(?e, "Failed to remove resize listener");
        }
    }
}

/// Handle returned to JS. Dropping it (`free()`) stops the renderer.
#[wasm_bindgen]
pub struct JsRenderer {
    renderer: AnyRenderer,
}

#[wasm_bindgen]
impl JsRenderer {
    /// Stop animating and release every browser callback. Safe to call twice.
    pub fn stop(&self) {
        self.renderer.stop();
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.renderer.is_running()
    }

    /// Pointer position in canvas CSS pixels. Only the wave scene reacts.
    #[wasm_bindgen(js_name = setPointer)]
    pub fn set_pointer(&self, x: f64, y: f64) {
        self.renderer.set_pointer(x, y);
    }

    pub fn fps(&self) -> f64 {
        self.renderer.fps()
    }
}

fn canvas_by_id(canvas_id: &str) -> Result<(Window, HtmlCanvasElement), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let canvas = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?
        .get_element_by_id(canvas_id)
        .ok_or_else(|| JsValue::from_str(&format!("no element with id '{}'", canvas_id)))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str(&format!("'{}' is not a canvas", canvas_id)))?;
    Ok((window, canvas))
}

fn run(canvas_id: &str, config: SceneConfig) -> Result<JsRenderer, JsValue> {
    let (window, canvas) = canvas_by_id(canvas_id)?;
    let config = match config {
        // The wave point sizes follow the display density unless configured
        SceneConfig::Wave(mut wave) if wave.pixel_ratio == WaveConfig::default().pixel_ratio => {
            wave.pixel_ratio = window.device_pixel_ratio() as f32;
            SceneConfig::Wave(wave)
        }
        other => other,
    };
    let surface = CanvasSurface::new(canvas.clone())?;
    let host = BrowserHost::new(window, canvas);
    let renderer = AnyRenderer::start(surface, &config, host).map_err(to_js)?;
    info!(canvas_id, scene = config.name(), "Renderer running");
    Ok(JsRenderer { renderer })
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Start the particle field on a canvas. `config_json` is an optional
/// camelCase `FieldConfig`; missing fields take their defaults.
#[wasm_bindgen(js_name = startStarfield)]
pub fn start_starfield(canvas_id: &str, config_json: Option<String>) -> Result<JsRenderer, JsValue> {
    run(canvas_id, SceneConfig::from_json("starfield", config_json.as_deref()).map_err(to_js)?)
}

/// Start the wave scene on a canvas
#[wasm_bindgen(js_name = startWave)]
pub fn start_wave(canvas_id: &str, config_json: Option<String>) -> Result<JsRenderer, JsValue> {
    run(canvas_id, SceneConfig::from_json("wave", config_json.as_deref()).map_err(to_js)?)
}
