// render.rs - Draw the scene
//
// Read-only over the scene. All output goes through the Surface trait so the
// same drawing code runs against a browser canvas or a recorder in tests.

use crate::scene::{Axis, Role, Scene, Train};

const TRACK_COLOR: &str = "#6c757d";
const TRACK_WIDTH: f32 = 12.0;
const TRACK_INSET: f32 = 20.0;

const ZONE_FILL: &str = "rgba(255, 193, 7, 0.1)";
const ZONE_STROKE: &str = "rgba(255, 193, 7, 0.7)";
const ZONE_LINE: f32 = 2.0;

const SIGNAL_RED: &str = "#dc3545";
const SIGNAL_GREEN: &str = "#28a745";
const SIGNAL_RADIUS: f32 = 6.0;
const SIGNAL_SETBACK: f32 = 18.0; // along the track, outside the square
const SIGNAL_OFFSET: f32 = 20.0; // beside the track

const CORNER_RADIUS: f32 = 6.0;
const ARROW_COLOR: &str = "#ffffff";
const ARROW_DEPTH: f32 = 10.0;
const ARROW_HALF: f32 = 6.0;

pub const BRAKING_MESSAGE: &str = "Braking to avoid collision";
const MESSAGE_FONT: f32 = 14.0;
const MESSAGE_OUTLINE: &str = "rgba(255,255,255,0.8)";
const MESSAGE_OUTLINE_WIDTH: f32 = 3.0;
const MESSAGE_POS: (f32, f32) = (16.0, 24.0);

/// 2D drawing primitives, in device pixels.
pub trait Surface {
    /// Match the backing store to the scene. Called on layout changes only.
    fn set_size(&mut self, _width: f32, _height: f32) {}

    fn clear(&mut self, width: f32, height: f32);
    fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: &str);
    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, fill: &str, stroke: &str, line_width: f32);
    fn round_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, fill: &str);
    fn circle(&mut self, cx: f32, cy: f32, r: f32, fill: &str);
    fn triangle(&mut self, points: [(f32, f32); 3], fill: &str);
    /// Outline first, then fill, so the text reads on any background.
    fn text(&mut self, text: &str, x: f32, y: f32, font_px: f32, fill: &str, outline: &str, outline_width: f32);
}

/// (along, lateral) -> canvas (x, y)
#[inline]
fn point(axis: Axis, along: f32, lateral: f32) -> (f32, f32) {
    match axis {
        Axis::Horizontal => (along, lateral),
        Axis::Vertical => (lateral, along),
    }
}

pub fn draw_scene<S: Surface + ?Sized>(scene: &Scene, surface: &mut S) {
    surface.clear(scene.width, scene.height);

    draw_tracks(scene, surface);
    draw_zone(scene, surface);
    for train in &scene.trains {
        draw_signal(scene, train, surface);
    }
    for train in &scene.trains {
        draw_train(scene, train, surface);
    }

    let yielding_stopped = scene
        .trains
        .iter()
        .any(|t| t.role == Role::Yielding && t.is_stopping());
    if yielding_stopped {
        surface.text(
            BRAKING_MESSAGE,
            scene.px(MESSAGE_POS.0),
            scene.px(MESSAGE_POS.1),
            scene.px(MESSAGE_FONT),
            SIGNAL_RED,
            MESSAGE_OUTLINE,
            scene.px(MESSAGE_OUTLINE_WIDTH),
        );
    }
}

fn draw_tracks<S: Surface + ?Sized>(scene: &Scene, surface: &mut S) {
    let inset = scene.px(TRACK_INSET);
    let width = scene.px(TRACK_WIDTH);
    let ix = scene.intersection;

    surface.line((inset, ix.y), (scene.width - inset, ix.y), width, TRACK_COLOR);
    surface.line((ix.x, inset), (ix.x, scene.height - inset), width, TRACK_COLOR);
}

fn draw_zone<S: Surface + ?Sized>(scene: &Scene, surface: &mut S) {
    let ix = scene.intersection;
    surface.rect(
        ix.x - ix.half,
        ix.y - ix.half,
        ix.half * 2.0,
        ix.half * 2.0,
        ZONE_FILL,
        ZONE_STROKE,
        scene.px(ZONE_LINE),
    );
}

// Signal sits on the approach side of the square, beside the train's track
fn draw_signal<S: Surface + ?Sized>(scene: &Scene, train: &Train, surface: &mut S) {
    let s = train.sign();
    let along = scene.center_on(train.axis) - s * (scene.intersection.half + scene.px(SIGNAL_SETBACK));
    let lateral = train.lateral - s * scene.px(SIGNAL_OFFSET);
    let (x, y) = point(train.axis, along, lateral);
    let color = if train.is_stopping() { SIGNAL_RED } else { SIGNAL_GREEN };

    surface.circle(x, y, scene.px(SIGNAL_RADIUS), color);
}

fn draw_train<S: Surface + ?Sized>(scene: &Scene, train: &Train, surface: &mut S) {
    let s = train.sign();
    let back = train.front.min(train.rear());
    let (x, y) = point(train.axis, back, train.lateral - train.width / 2.0);
    let (w, h) = match train.axis {
        Axis::Horizontal => (train.length, train.width),
        Axis::Vertical => (train.width, train.length),
    };
    surface.round_rect(x, y, w, h, scene.px(CORNER_RADIUS), train.color);

    let base = train.front - s * scene.px(ARROW_DEPTH);
    let half = scene.px(ARROW_HALF);
    surface.triangle(
        [
            point(train.axis, base, train.lateral - half),
            point(train.axis, train.front, train.lateral),
            point(train.axis, base, train.lateral + half),
        ],
        ARROW_COLOR,
    );
}
