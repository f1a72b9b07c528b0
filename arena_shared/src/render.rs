//! Rendering abstraction.
//!
//! This crate intentionally does not depend on a graphics backend.
//! Define the primitives a renderer implementation would satisfy, plus the
//! numeric shape conventions every backend must honor.

use crate::color::Color;

/// Polygon orientation offset for a numeric shape parameter.
///
/// The convention, kept exactly as the wire format defines it:
/// - shape 0 draws a circle (the offset is irrelevant and returned as 0);
/// - an even side count is rotated by `PI / shape` so a flat edge faces up;
/// - odd side counts get no parity offset;
/// - a fractional component adds `frac(shape) * 2 * PI` of extra rotation.
pub fn poly_angle_offset(shape: f32) -> f32 {
    if shape == 0.0 {
        return 0.0;
    }
    // The parity offset applies only when `shape % 2` is exactly zero, so a
    // fractional side count never takes it.
    let parity = if shape % 2.0 == 0.0 {
        std::f32::consts::PI / shape
    } else {
        0.0
    };
    parity + shape.fract() * std::f32::consts::TAU
}

/// Trapezoid half-heights `(far, near)` for a signed aspect ratio.
///
/// `aspect > 0` widens the far end (`[width * aspect, width]`); a negative
/// aspect widens the near end instead (`[width, -width / aspect]`).
pub fn trapezoid_heights(width: f32, aspect: f32) -> (f32, f32) {
    if aspect > 0.0 {
        (width * aspect, width)
    } else {
        (width, -width / aspect)
    }
}

/// A minimal rendering API.
///
/// All coordinates are screen-space; `shape` follows the
/// [`poly_angle_offset`] convention.
pub trait RenderBackend: Send + Sync {
    fn begin_frame(&mut self);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);
    fn draw_poly(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        shape: f32,
        angle: f32,
        fill: Color,
        stroke: Color,
    );
    fn draw_trapezoid(
        &mut self,
        x: f32,
        y: f32,
        length: f32,
        width: f32,
        angle: f32,
        aspect: f32,
        fill: Color,
        stroke: Color,
    );
    fn draw_bar(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);
    fn end_frame(&mut self);
}

/// A no-op renderer useful for headless runs.
#[derive(Default)]
pub struct NullRenderer;

impl RenderBackend for NullRenderer {
    fn begin_frame(&mut self) {}
    fn fill_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _color: Color) {}
    fn draw_poly(
        &mut self,
        _x: f32,
        _y: f32,
        _radius: f32,
        _shape: f32,
        _angle: f32,
        _fill: Color,
        _stroke: Color,
    ) {
    }
    fn draw_trapezoid(
        &mut self,
        _x: f32,
        _y: f32,
        _length: f32,
        _width: f32,
        _angle: f32,
        _aspect: f32,
        _fill: Color,
        _stroke: Color,
    ) {
    }
    fn draw_bar(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _color: Color) {}
    fn end_frame(&mut self) {}
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
    },
    Poly {
        x: f32,
        y: f32,
        radius: f32,
        shape: f32,
        angle: f32,
        fill: Color,
        stroke: Color,
    },
    Trapezoid {
        x: f32,
        y: f32,
        length: f32,
        width: f32,
        angle: f32,
        aspect: f32,
        fill: Color,
        stroke: Color,
    },
    Bar {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
    },
}

/// Records draw calls so tests can assert on emitted frames.
#[derive(Default)]
pub struct RecordingRenderer {
    pub frames_begun: u32,
    pub frames_ended: u32,
    pub calls: Vec<DrawCall>,
}

impl RenderBackend for RecordingRenderer {
    fn begin_frame(&mut self) {
        self.frames_begun += 1;
        self.calls.clear();
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.calls.push(DrawCall::Rect { x, y, w, h, color });
    }

    fn draw_poly(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        shape: f32,
        angle: f32,
        fill: Color,
        stroke: Color,
    ) {
        self.calls.push(DrawCall::Poly {
            x,
            y,
            radius,
            shape,
            angle,
            fill,
            stroke,
        });
    }

    fn draw_trapezoid(
        &mut self,
        x: f32,
        y: f32,
        length: f32,
        width: f32,
        angle: f32,
        aspect: f32,
        fill: Color,
        stroke: Color,
    ) {
        self.calls.push(DrawCall::Trapezoid {
            x,
            y,
            length,
            width,
            angle,
            aspect,
            fill,
            stroke,
        });
    }

    fn draw_bar(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.calls.push(DrawCall::Bar { x, y, w, h, color });
    }

    fn end_frame(&mut self) {
        self.frames_ended += 1;
    }
}
