// driver.rs - Per-frame loop
//
// The driver owns the scene and decides when ticks happen. Frame timing comes
// from a FrameScheduler: requestAnimationFrame in the browser, a manual queue
// in tests. Every request carries a ticket; a callback whose ticket is stale
// (the loop was stopped or restarted since) does nothing.

use crate::render::{Surface, draw_scene};
use crate::scene::Scene;
use crate::sim::{self, SimEvent};

pub trait FrameScheduler {
    type Handle;

    /// Ask for one callback on the next frame, to be delivered to
    /// `LoopDriver::on_frame` with `ticket`.
    fn request(&mut self, ticket: u64) -> Option<Self::Handle>;

    fn cancel(&mut self, handle: Self::Handle);
}

pub struct LoopDriver<F: FrameScheduler> {
    scene: Scene,
    scheduler: F,

    running: bool,
    pending: Option<F::Handle>,
    ticket: u64,
    last_ts: Option<f64>, // ms, None until the first frame after start
}

impl<F: FrameScheduler> LoopDriver<F> {
    pub fn new(scene: Scene, scheduler: F) -> Self {
        Self {
            scene,
            scheduler,
            running: false,
            pending: None,
            ticket: 0,
            last_ts: None,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start the loop. If it is already running it is cancelled and restarted.
    pub fn start(&mut self) {
        if self.running {
            self.cancel_pending();
        }
        self.running = true;
        self.last_ts = None;
        self.ticket += 1;
        log::info!("crossing sim started");
        self.schedule();
    }

    /// Stop the loop. Safe to call when already stopped.
    pub fn stop(&mut self) {
        self.cancel_pending();
        if self.running {
            log::info!("crossing sim stopped");
        }
        self.running = false;
        // Invalidate anything already queued by the host
        self.ticket += 1;
    }

    /// Stop, put both trains back at their spawn points and draw a still frame.
    pub fn reset<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        self.stop();
        self.scene.reset_scenario(false);
        log::info!("crossing sim reset");
        draw_scene(&self.scene, surface);
    }

    /// Re-layout for a new viewport and draw a still frame. A running loop
    /// keeps running; a stopped one stays stopped.
    pub fn resize<S: Surface + ?Sized>(&mut self, viewport_w: f32, viewport_h: f32, density: f32, surface: &mut S) {
        self.scene.layout(viewport_w, viewport_h, density);
        self.scene.reset_scenario(true);
        surface.set_size(self.scene.width, self.scene.height);
        log::debug!(
            "crossing sim resized to {}x{} @{}",
            self.scene.width,
            self.scene.height,
            self.scene.dpr
        );
        draw_scene(&self.scene, surface);
    }

    /// Draw the current state without ticking.
    pub fn redraw<S: Surface + ?Sized>(&self, surface: &mut S) {
        draw_scene(&self.scene, surface);
    }

    /// Animation callback: tick, draw, request the next frame.
    pub fn on_frame<S: Surface + ?Sized>(&mut self, ticket: u64, now_ms: f64, surface: &mut S) -> Vec<SimEvent> {
        if !self.running || ticket != self.ticket {
            return Vec::new();
        }
        self.pending = None;

        let last = self.last_ts.replace(now_ms).unwrap_or(now_ms);
        let dt = ((now_ms - last) / 1000.0) as f32;

        let events = sim::step(&mut self.scene, dt);
        draw_scene(&self.scene, surface);
        self.schedule();
        events
    }

    fn schedule(&mut self) {
        self.pending = self.scheduler.request(self.ticket);
        if self.pending.is_none() {
            log::warn!("no animation frame available, crossing sim halted");
            self.running = false;
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }
}

/// Scheduler that just queues tickets; the caller delivers frames by hand.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    queued: Vec<u64>,
    cancelled: usize,
}

impl ManualScheduler {
    /// Next ticket to deliver, oldest first.
    pub fn take(&mut self) -> Option<u64> {
        if self.queued.is_empty() { None } else { Some(self.queued.remove(0)) }
    }

    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    type Handle = u64;

    fn request(&mut self, ticket: u64) -> Option<u64> {
        self.queued.push(ticket);
        Some(ticket)
    }

    fn cancel(&mut self, handle: u64) {
        if let Some(pos) = self.queued.iter().position(|t| *t == handle) {
            self.queued.remove(pos);
            self.cancelled += 1;
        }
    }
}

impl LoopDriver<ManualScheduler> {
    /// Deliver the oldest queued frame at `now_ms`. Returns None if nothing was queued.
    pub fn pump<S: Surface + ?Sized>(&mut self, now_ms: f64, surface: &mut S) -> Option<Vec<SimEvent>> {
        let ticket = self.scheduler.take()?;
        Some(self.on_frame(ticket, now_ms, surface))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::render::tests::{Op, Recorder};
    use crate::scene::{BrakingState, TrainId};
    use approx::assert_relative_eq;

    fn driver() -> LoopDriver<ManualScheduler> {
        let scene = Scene::new(SimConfig::default(), 800.0, 600.0, 1.0);
        LoopDriver::new(scene, ManualScheduler::default())
    }

    #[test]
    fn first_frame_has_zero_dt() {
        let mut d = driver();
        let mut rec = Recorder::default();
        let before = d.scene().trains.clone();

        d.start();
        d.pump(1000.0, &mut rec).unwrap();

        // Static positions, but the frame was drawn and the next one requested
        assert_eq!(d.scene().train(TrainId::A).front, before[0].front);
        assert!(matches!(rec.ops[0], Op::Clear(..)));
        assert_eq!(d.scheduler().queued(), 1);
    }

    #[test]
    fn dt_comes_from_timestamps() {
        let mut d = driver();
        let mut rec = Recorder::default();
        let start = d.scene().train(TrainId::A).front;

        d.start();
        d.pump(1000.0, &mut rec);
        d.pump(1010.0, &mut rec);

        assert_relative_eq!(d.scene().train(TrainId::A).front, start + 1.8, epsilon = 1e-4);
    }

    #[test]
    fn clock_starting_at_zero_is_a_real_timestamp() {
        let mut d = driver();
        let mut rec = Recorder::default();
        let start = d.scene().train(TrainId::A).front;

        d.start();
        d.pump(0.0, &mut rec);
        d.pump(10.0, &mut rec);
        d.pump(20.0, &mut rec);

        // Two 10 ms steps at 180 px/s
        assert_relative_eq!(d.scene().train(TrainId::A).front, start + 3.6, epsilon = 1e-4);
    }

    #[test]
    fn long_gap_is_clamped() {
        let mut d = driver();
        let mut rec = Recorder::default();
        let start = d.scene().train(TrainId::A).front;

        d.start();
        d.pump(1000.0, &mut rec);
        d.pump(6000.0, &mut rec); // tab was in the background

        // 180 * 0.05
        assert_relative_eq!(d.scene().train(TrainId::A).front, start + 9.0, epsilon = 1e-4);
    }

    #[test]
    fn start_twice_keeps_one_frame_in_flight() {
        let mut d = driver();
        d.start();
        d.start();

        assert!(d.is_running());
        assert_eq!(d.scheduler().queued(), 1);
        assert_eq!(d.scheduler().cancelled(), 1);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut d = driver();
        d.stop();
        assert!(!d.is_running());

        d.start();
        d.stop();
        d.stop();
        assert!(!d.is_running());
        assert_eq!(d.scheduler().queued(), 0);
    }

    #[test]
    fn stale_ticket_is_ignored() {
        let mut d = driver();
        let mut rec = Recorder::default();

        d.start();
        let stale = 1;
        d.stop();
        d.start();
        let events = d.on_frame(stale, 1000.0, &mut rec);

        assert!(events.is_empty());
        assert!(rec.ops.is_empty());
    }

    #[test]
    fn frame_after_stop_does_nothing() {
        let mut d = driver();
        let mut rec = Recorder::default();

        d.start();
        d.pump(1000.0, &mut rec);
        d.stop();
        let before = d.scene().trains.clone();

        // A callback the host failed to cancel still fires
        let events = d.on_frame(1, 1016.0, &mut rec);
        assert!(events.is_empty());
        assert_eq!(d.scene().trains, before);
    }

    #[test]
    fn reset_stops_and_redraws() {
        let mut d = driver();
        let mut rec = Recorder::default();

        d.start();
        for i in 0..30 {
            d.pump(1000.0 + i as f64 * 16.0, &mut rec);
        }
        assert_eq!(d.scene().train(TrainId::B).state, BrakingState::Braking);

        let mut still = Recorder::default();
        d.reset(&mut still);

        assert!(!d.is_running());
        assert!(matches!(still.ops[0], Op::Clear(..)));
        for t in &d.scene().trains {
            assert_eq!(t.front, t.start);
            assert_eq!(t.state, BrakingState::Cruising);
        }
    }

    #[test]
    fn resize_does_not_restart() {
        let mut d = driver();
        let mut rec = Recorder::default();

        d.resize(1024.0, 768.0, 1.0, &mut rec);
        assert!(!d.is_running());
        assert_eq!(d.scheduler().queued(), 0);
        assert_eq!(rec.ops[0], Op::Clear(1024.0, 768.0));
    }

    #[test]
    fn resize_keeps_running_loop_alive() {
        let mut d = driver();
        let mut rec = Recorder::default();

        d.start();
        d.pump(1000.0, &mut rec);
        d.resize(640.0, 480.0, 2.0, &mut rec);

        assert!(d.is_running());
        assert!(d.pump(1016.0, &mut rec).is_some());
        assert_relative_eq!(d.scene().width, 1280.0);
    }
}
