// canvas.rs - Surface backed by a browser 2D context

use std::f64::consts::TAU;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::render::Surface;

// Drawing failures are cosmetic; note them and carry on with the frame
fn check(what: &str, result: Result<(), JsValue>) {
    if let Err(err) = result {
        log::debug!("canvas {what} failed: {err:?}");
    }
}

impl Surface for CanvasRenderingContext2d {
    // Resizing the backing store wipes it, so only touch it when it changed
    fn set_size(&mut self, width: f32, height: f32) {
        let Some(canvas) = self.canvas() else { return };
        let (w, h) = (width as u32, height as u32);
        if canvas.width() != w {
            canvas.set_width(w);
        }
        if canvas.height() != h {
            canvas.set_height(h);
        }
    }

    fn clear(&mut self, width: f32, height: f32) {
        self.clear_rect(0.0, 0.0, width as f64, height as f64);
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: &str) {
        self.save();
        self.set_line_cap("round");
        self.set_stroke_style_str(color);
        self.set_line_width(width as f64);
        self.begin_path();
        self.move_to(from.0 as f64, from.1 as f64);
        self.line_to(to.0 as f64, to.1 as f64);
        self.stroke();
        self.restore();
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, fill: &str, stroke: &str, line_width: f32) {
        self.save();
        self.set_fill_style_str(fill);
        self.set_stroke_style_str(stroke);
        self.set_line_width(line_width as f64);
        self.begin_path();
        CanvasRenderingContext2d::rect(self, x as f64, y as f64, w as f64, h as f64);
        self.fill();
        self.stroke();
        self.restore();
    }

    fn round_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, fill: &str) {
        let (x, y, w, h) = (x as f64, y as f64, w as f64, h as f64);
        let r = (radius as f64).min(w / 2.0).min(h / 2.0);

        self.save();
        self.set_fill_style_str(fill);
        self.begin_path();
        self.move_to(x + r, y);
        self.line_to(x + w - r, y);
        self.quadratic_curve_to(x + w, y, x + w, y + r);
        self.line_to(x + w, y + h - r);
        self.quadratic_curve_to(x + w, y + h, x + w - r, y + h);
        self.line_to(x + r, y + h);
        self.quadratic_curve_to(x, y + h, x, y + h - r);
        self.line_to(x, y + r);
        self.quadratic_curve_to(x, y, x + r, y);
        self.close_path();
        self.fill();
        self.restore();
    }

    fn circle(&mut self, cx: f32, cy: f32, r: f32, fill: &str) {
        self.save();
        self.set_fill_style_str(fill);
        self.begin_path();
        check("arc", self.arc(cx as f64, cy as f64, r as f64, 0.0, TAU));
        self.fill();
        self.restore();
    }

    fn triangle(&mut self, points: [(f32, f32); 3], fill: &str) {
        let [a, b, c] = points;
        self.save();
        self.set_fill_style_str(fill);
        self.begin_path();
        self.move_to(a.0 as f64, a.1 as f64);
        self.line_to(b.0 as f64, b.1 as f64);
        self.line_to(c.0 as f64, c.1 as f64);
        self.close_path();
        self.fill();
        self.restore();
    }

    fn text(&mut self, text: &str, x: f32, y: f32, font_px: f32, fill: &str, outline: &str, outline_width: f32) {
        let (x, y) = (x as f64, y as f64);
        self.save();
        self.set_font(&format!("{font_px}px Inter, Arial"));
        self.set_fill_style_str(fill);
        self.set_stroke_style_str(outline);
        self.set_line_width(outline_width as f64);
        check("stroke_text", self.stroke_text(text, x, y));
        check("fill_text", self.fill_text(text, x, y));
        self.restore();
    }
}
