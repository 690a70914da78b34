// scene/ - Crossing geometry and train placement
//
// Everything stored here is in device pixels. `layout` sizes the canvas and
// the intersection, `reset_scenario` (re)places both trains. The scene owns
// the config so every boundary is derived from one source.

mod train;

pub use train::{Axis, BrakingState, Heading, Role, Train, TrainId};

use crate::config::{SimConfig, TrainConfig};

pub const MIN_WIDTH: f32 = 320.0;
pub const MIN_HEIGHT: f32 = 240.0;
pub const MIN_HALF: f32 = 32.0;

// Intersection half-width as a fraction of the shorter canvas side
const HALF_FRACTION: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Intersection {
    pub x: f32,
    pub y: f32,
    pub half: f32,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    pub dpr: f32,

    pub intersection: Intersection,
    pub trains: [Train; 2],

    config: SimConfig,
}

/// Motion snapshot carried across a resize.
#[derive(Debug, Clone, Copy)]
struct Progress {
    fraction: f32,
    speed_ratio: f32,
}

impl Progress {
    fn of(train: &Train) -> Self {
        let speed_ratio = if train.nominal_velocity > 0.0 {
            train.velocity / train.nominal_velocity
        } else {
            1.0
        };
        Self {
            fraction: train.progress(),
            speed_ratio,
        }
    }
}

impl Scene {
    pub fn new(config: SimConfig, viewport_w: f32, viewport_h: f32, density: f32) -> Self {
        let mut scene = Self {
            width: MIN_WIDTH,
            height: MIN_HEIGHT,
            dpr: 1.0,
            intersection: Intersection::default(),
            trains: [Train::new(TrainId::A), Train::new(TrainId::B)],
            config,
        };
        scene.layout(viewport_w, viewport_h, density);
        scene.reset_scenario(false);
        scene
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// CSS pixels -> device pixels
    #[inline]
    pub fn px(&self, css: f32) -> f32 {
        css * self.dpr
    }

    /// Size the canvas for a viewport. Degenerate input clamps to the minimum
    /// canvas instead of failing.
    pub fn layout(&mut self, viewport_w: f32, viewport_h: f32, density: f32) {
        let dpr = if density.is_finite() && density > 0.0 { density } else { 1.0 };
        self.dpr = dpr;
        self.width = scaled(viewport_w, dpr).max(MIN_WIDTH);
        self.height = scaled(viewport_h, dpr).max(MIN_HEIGHT);

        self.intersection = Intersection {
            x: (self.width / 2.0).floor(),
            y: (self.height / 2.0).floor(),
            half: (self.width.min(self.height) * HALF_FRACTION).max(MIN_HALF),
        };
    }

    /// Re-derive train geometry from the current layout. Without
    /// `preserve_geometry` both trains go back to their spawn points; with it
    /// each keeps its fraction of the way along its run and its fraction of
    /// nominal speed.
    pub fn reset_scenario(&mut self, preserve_geometry: bool) {
        let saved = [Progress::of(&self.trains[0]), Progress::of(&self.trains[1])];

        for i in 0..self.trains.len() {
            self.refresh_geometry(i);
        }

        for (i, progress) in saved.into_iter().enumerate() {
            if preserve_geometry {
                self.restore(i, progress);
            } else {
                self.trains[i].respawn();
            }
        }
    }

    fn refresh_geometry(&mut self, i: usize) {
        let id = self.trains[i].id;
        let axis = self.trains[i].axis;
        let sign = self.trains[i].sign();

        let TrainConfig { speed, acceleration } = match axis {
            Axis::Horizontal => self.config.horizontal,
            Axis::Vertical => self.config.vertical,
        };
        let length = self.px(self.config.train_length);
        let width = self.px(self.config.train_width);
        let approach = self.px(self.config.approach_margin);
        let half = self.intersection.half;
        let center = self.center_on(axis);
        let lateral = self.center_on(axis.other());
        let start = center - sign * (half + approach + length);
        let role = if id == self.config.yielding { Role::Yielding } else { Role::Priority };
        let nominal_velocity = self.px(speed);
        let acceleration = self.px(acceleration);

        let train = &mut self.trains[i];
        train.role = role;
        train.length = length;
        train.width = width;
        train.lateral = lateral;
        train.start = start;
        train.nominal_velocity = nominal_velocity;
        train.acceleration = acceleration;

        let wrap = self.wrap_front(&self.trains[i]);
        self.trains[i].span = sign * (wrap - start);
    }

    fn restore(&mut self, i: usize, progress: Progress) {
        let stop = self.stop_line_for(&self.trains[i]);
        let train = &mut self.trains[i];

        train.front = train.start + train.sign() * progress.fraction * train.span;
        train.velocity = (progress.speed_ratio * train.nominal_velocity).clamp(0.0, train.nominal_velocity);

        match train.state {
            BrakingState::Cruising => {}
            BrakingState::Braking => {
                train.stop_line = stop;
                if train.distance_to(stop) <= 0.0 {
                    train.hold_at(stop);
                }
            }
            BrakingState::Holding => train.hold_at(stop),
        }
    }

    #[inline]
    pub fn train(&self, id: TrainId) -> &Train {
        &self.trains[id.index()]
    }

    /// Index of the first train with `role`.
    pub fn index_of(&self, role: Role) -> Option<usize> {
        self.trains.iter().position(|t| t.role == role)
    }

    /// Intersection center measured along `axis`.
    #[inline]
    pub fn center_on(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.intersection.x,
            Axis::Vertical => self.intersection.y,
        }
    }

    #[inline]
    pub fn extent(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// Where the front counts as entering the intersection.
    pub fn entry_boundary(&self, train: &Train) -> f32 {
        let reach = self.intersection.half + self.px(self.config.clearance);
        self.center_on(train.axis) - train.sign() * reach
    }

    /// Where the rear counts as having left the intersection.
    pub fn exit_boundary(&self, train: &Train) -> f32 {
        let reach = self.intersection.half + self.px(self.config.clearance);
        self.center_on(train.axis) + train.sign() * reach
    }

    pub fn stop_line_for(&self, train: &Train) -> f32 {
        self.entry_boundary(train) - train.sign() * self.px(self.config.stop_margin)
    }

    /// Front position beyond which the train is off-canvas and wraps.
    pub fn wrap_front(&self, train: &Train) -> f32 {
        let margin = self.px(self.config.wrap_margin);
        let edge = match train.heading {
            Heading::Increasing => self.extent(train.axis) + margin,
            Heading::Decreasing => -margin,
        };
        edge + train.sign() * train.length
    }

    pub fn has_cleared(&self, train: &Train) -> bool {
        train.sign() * (train.rear() - self.exit_boundary(train)) > 0.0
    }
}

fn scaled(logical: f32, dpr: f32) -> f32 {
    let v = (logical * dpr).floor();
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}
