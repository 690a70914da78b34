use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, Window};

// ============================================================================
// CROSSING - Collision-avoidance demo for a two-track level crossing
// ============================================================================

mod canvas;
mod console;
pub mod config;
pub mod driver;
pub mod error;
pub mod render;
pub mod scene;
pub mod sim;

pub use config::{SimConfig, TrainConfig};
pub use driver::{FrameScheduler, LoopDriver, ManualScheduler};
pub use error::{ConfigError, SurfaceError};
pub use render::{Surface, draw_scene};
pub use scene::{Axis, BrakingState, Heading, Intersection, Role, Scene, Train, TrainId};
pub use sim::{SimEvent, clamp_dt, conflict_predicted, step, time_to_entry};

// ----------------------------------------------------------------------------
// Browser frame clock
// ----------------------------------------------------------------------------

struct RafScheduler {
    window: Window,
    callback: Closure<dyn FnMut(f64)>,
    // Ticket for the frame currently requested, read by the callback
    armed: Rc<Cell<Option<u64>>>,
}

impl FrameScheduler for RafScheduler {
    type Handle = i32;

    fn request(&mut self, ticket: u64) -> Option<i32> {
        self.armed.set(Some(ticket));
        match self.window.request_animation_frame(self.callback.as_ref().unchecked_ref()) {
            Ok(id) => Some(id),
            Err(err) => {
                log::warn!("{}", SurfaceError::FrameRequest(format!("{err:?}")));
                self.armed.set(None);
                None
            }
        }
    }

    fn cancel(&mut self, handle: i32) {
        self.armed.set(None);
        if let Err(err) = self.window.cancel_animation_frame(handle) {
            log::debug!("cancelAnimationFrame failed: {err:?}");
        }
    }
}

struct Host {
    driver: LoopDriver<RafScheduler>,
    window: Window,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Host {
    fn frame(&mut self, ticket: u64, now: f64) {
        self.driver.on_frame(ticket, now, &mut self.ctx);
    }

    fn resize(&mut self) {
        let (w, h, dpr) = viewport(&self.window, &self.canvas);
        self.driver.resize(w, h, dpr, &mut self.ctx);
    }
}

/// CSS size of the canvas element plus the device pixel ratio.
fn viewport(window: &Window, canvas: &HtmlCanvasElement) -> (f32, f32, f32) {
    let rect = canvas.get_bounding_client_rect();
    (rect.width() as f32, rect.height() as f32, window.device_pixel_ratio() as f32)
}

fn find_canvas(canvas_id: &str) -> Result<(Window, HtmlCanvasElement, CanvasRenderingContext2d), SurfaceError> {
    let window = web_sys::window().ok_or(SurfaceError::NoWindow)?;
    let document = window.document().ok_or(SurfaceError::NoDocument)?;
    let canvas = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| SurfaceError::CanvasNotFound(canvas_id.to_string()))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| SurfaceError::NotACanvas(canvas_id.to_string()))?;
    let ctx = canvas
        .get_context("2d")
        .map_err(|err| SurfaceError::ContextUnavailable(format!("{err:?}")))?
        .ok_or_else(|| SurfaceError::ContextUnavailable("getContext returned null".to_string()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| SurfaceError::ContextUnavailable("not a 2d context".to_string()))?;
    Ok((window, canvas, ctx))
}

fn parse_config(value: &JsValue) -> Result<SimConfig, ConfigError> {
    if value.is_undefined() || value.is_null() {
        return Ok(SimConfig::default());
    }
    if !value.is_object() {
        return Err(ConfigError::NotAnObject);
    }
    let json: String = js_sys::JSON::stringify(value)
        .map_err(|_| ConfigError::NotAnObject)?
        .into();
    SimConfig::from_json(&json)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttachPlan {
    Keep,
    Bind,
    Rebind,
}

fn plan_attach(bound: Option<&str>, requested: &str) -> AttachPlan {
    match bound {
        None => AttachPlan::Bind,
        Some(id) if id == requested => AttachPlan::Keep,
        Some(_) => AttachPlan::Rebind,
    }
}

// ----------------------------------------------------------------------------
// JS API
// ----------------------------------------------------------------------------

#[wasm_bindgen]
pub struct CrossingSim {
    config: SimConfig,
    canvas_id: Option<String>,
    host: Option<Rc<RefCell<Host>>>,
    on_resize: Option<Closure<dyn FnMut()>>,
}

#[wasm_bindgen]
impl CrossingSim {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console::init(log::LevelFilter::Info);
        Self {
            config: SimConfig::default(),
            canvas_id: None,
            host: None,
            on_resize: None,
        }
    }

    /// Build with a plain settings object. Bad settings are logged and the
    /// defaults used instead.
    pub fn with_config(config: JsValue) -> CrossingSim {
        let mut sim = Self::new();
        match parse_config(&config) {
            Ok(parsed) => sim.config = parsed,
            Err(err) => log::warn!("{err}; using default crossing config"),
        }
        sim
    }

    /// Bind to the canvas with this id and draw the opening frame. Returns
    /// false (and does nothing else) if the canvas is not in the page yet, so
    /// the host can call again when the view opens.
    ///
    /// Attaching to a different canvas drops the old binding first, which
    /// also stops the loop.
    pub fn attach(&mut self, canvas_id: &str) -> bool {
        let bound = self.host.as_ref().and(self.canvas_id.as_deref());
        match plan_attach(bound, canvas_id) {
            AttachPlan::Keep => return true,
            AttachPlan::Rebind => {
                log::info!("crossing sim moving to #{canvas_id}");
                self.destroy();
            }
            AttachPlan::Bind => {}
        }
        self.canvas_id = Some(canvas_id.to_string());
        match self.bind(canvas_id) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("crossing sim not attached: {err}");
                false
            }
        }
    }

    fn bind(&mut self, canvas_id: &str) -> Result<(), SurfaceError> {
        let (window, canvas, mut ctx) = find_canvas(canvas_id)?;
        let (w, h, dpr) = viewport(&window, &canvas);
        let scene = Scene::new(self.config.clone(), w, h, dpr);

        ctx.set_size(scene.width, scene.height);
        draw_scene(&scene, &mut ctx);
        log::info!("crossing sim attached to #{canvas_id} ({}x{} @{dpr})", scene.width, scene.height);

        let armed = Rc::new(Cell::new(None));
        let host = Rc::new_cyclic(|weak: &Weak<RefCell<Host>>| {
            let weak = weak.clone();
            let slot = armed.clone();
            let callback = Closure::wrap(Box::new(move |now: f64| {
                let (Some(host), Some(ticket)) = (weak.upgrade(), slot.take()) else {
                    return;
                };
                if let Ok(mut host) = host.try_borrow_mut() {
                    host.frame(ticket, now);
                }
            }) as Box<dyn FnMut(f64)>);

            let scheduler = RafScheduler {
                window: window.clone(),
                callback,
                armed,
            };
            RefCell::new(Host {
                driver: LoopDriver::new(scene, scheduler),
                window: window.clone(),
                canvas,
                ctx,
            })
        });

        let weak = Rc::downgrade(&host);
        let on_resize = Closure::wrap(Box::new(move || {
            let Some(host) = weak.upgrade() else { return };
            if let Ok(mut host) = host.try_borrow_mut() {
                host.resize();
            }
        }) as Box<dyn FnMut()>);
        window
            .add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())
            .map_err(|err| SurfaceError::Listener(format!("{err:?}")))?;

        self.host = Some(host);
        self.on_resize = Some(on_resize);
        Ok(())
    }

    /// Start (or restart) the animation. Retries attaching first if the
    /// canvas was missing earlier.
    pub fn start(&mut self) {
        if self.host.is_none() {
            let Some(id) = self.canvas_id.clone() else { return };
            if !self.attach(&id) {
                return;
            }
        }
        self.with_host(|host| host.driver.start());
    }

    pub fn stop(&mut self) {
        self.with_host(|host| host.driver.stop());
    }

    pub fn reset(&mut self) {
        self.with_host(|host| {
            let Host { driver, ctx, .. } = host;
            driver.reset(ctx);
        });
    }

    /// Re-read the canvas size; the resize listener calls the same path.
    pub fn resize(&mut self) {
        self.with_host(Host::resize);
    }

    /// Draw the current state without advancing it.
    pub fn draw(&mut self) {
        self.with_host(|host| {
            let Host { driver, ctx, .. } = host;
            driver.redraw(ctx);
        });
    }

    /// Stop the loop and drop the canvas binding and resize listener.
    pub fn destroy(&mut self) {
        self.with_host(|host| host.driver.stop());
        if let (Some(host), Some(on_resize)) = (self.host.take(), self.on_resize.take()) {
            let window = host.borrow().window.clone();
            if let Err(err) = window.remove_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref()) {
                log::debug!("removing resize listener failed: {err:?}");
            }
            log::info!("crossing sim destroyed");
        }
        self.canvas_id = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.host.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.host
            .as_ref()
            .and_then(|host| host.try_borrow().ok().map(|h| h.driver.is_running()))
            .unwrap_or(false)
    }

    /// "cruising", "braking" or "holding" for the yielding train; empty when detached.
    pub fn yielding_state(&self) -> String {
        let Some(host) = &self.host else { return String::new() };
        let Ok(host) = host.try_borrow() else { return String::new() };
        let scene = host.driver.scene();
        scene
            .index_of(Role::Yielding)
            .map(|i| scene.trains[i].state.as_str().to_string())
            .unwrap_or_default()
    }

    fn with_host(&mut self, f: impl FnOnce(&mut Host)) {
        let Some(host) = &self.host else { return };
        match host.try_borrow_mut() {
            Ok(mut host) => f(&mut host),
            Err(_) => log::debug!("crossing sim busy, call ignored"),
        }
    }
}

impl Default for CrossingSim {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CrossingSim {
    fn drop(&mut self) {
        self.destroy();
    }
}
