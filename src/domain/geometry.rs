// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/geometry.rs
//
// Canvas-space geometry: points, rectangles and the crop rectangle math.

use crate::constant::FLOATING_POINT_DIGIT;

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to `other`.
    pub fn manhattan(&self, other: Point) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// Canvas dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }

    /// Snap to whole pixels and intersect with a `width` x `height` buffer.
    ///
    /// Returns `None` when nothing of the rectangle lies inside the buffer.
    pub fn to_pixel_rect(&self, width: u32, height: u32) -> Option<PixelRect> {
        let x0 = self.left.round().max(0.0);
        let y0 = self.top.round().max(0.0);
        let x1 = self.right().round().min(f64::from(width));
        let y1 = self.bottom().round().min(f64::from(height));

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rect = PixelRect::new(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32);
        Some(rect)
    }
}

/// Rectangle in whole pixels, always inside the buffer it was derived for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Clamp `value` into `[min(lo, hi), max(lo, hi)]`.
///
/// The bounds may arrive in either order; callers rely on this to keep the
/// anchor corner fixed while the dragged corner moves freely.
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    let (lo, hi) = if lo > hi { (hi, lo) } else { (lo, hi) };
    value.min(hi).max(lo)
}

/// Round away floating point noise (keeps `FLOATING_POINT_DIGIT` decimals).
pub fn fix_floating_point(value: f64) -> f64 {
    let factor = 10f64.powi(FLOATING_POINT_DIGIT);
    (value * factor).round() / factor
}

/// Rectangle spanned by a drag from `start` to `pointer` inside `bounds`.
///
/// With `preset_ratio` the result keeps `width / height == ratio`, otherwise
/// `shift_held` forces a square. A preset ratio takes precedence over shift.
pub fn rect_from_points(
    start: Point,
    pointer: Point,
    bounds: Size,
    preset_ratio: Option<f64>,
    shift_held: bool,
) -> Rect {
    let Point { x, y } = pointer;
    let (canvas_width, canvas_height) = (bounds.width, bounds.height);

    let mut left = clamp(x, 0.0, start.x);
    let mut top = clamp(y, 0.0, start.y);
    let mut width = clamp(x, start.x, canvas_width) - left;
    let mut height = clamp(y, start.y, canvas_height) - top;

    let moving_left = start.x >= x;
    let moving_up = start.y >= y;

    match preset_ratio.filter(|ratio| *ratio > 0.0) {
        None if shift_held => {
            // A pointer on the origin's column or row grows the square
            // right or down.
            let left_of = x < start.x;
            let above = y < start.y;

            let available_x = if left_of {
                start.x
            } else {
                canvas_width - start.x
            };
            let available_y = if above {
                start.y
            } else {
                canvas_height - start.y
            };
            let side = width.max(height).min(available_x).min(available_y).max(0.0);
            width = side;
            height = side;

            if left_of {
                left = start.x - width;
            }
            if above {
                top = start.y - height;
            }
        }
        None => {}
        Some(ratio) => {
            height = width / ratio;

            if moving_left {
                left = clamp(start.x - width, 0.0, canvas_width);
            }
            if moving_up {
                top = clamp(start.y - height, 0.0, canvas_height);
            }

            // Second pass near the bottom edge: shrink by height instead.
            if top + height > canvas_height {
                height = canvas_height - top;
                width = height * ratio;

                if moving_left {
                    left = clamp(start.x - width, 0.0, canvas_width);
                }
                if moving_up {
                    top = clamp(start.y - height, 0.0, canvas_height);
                }
            }
        }
    }

    Rect::new(left, top, width, height)
}

/// Largest rectangle of aspect `preset_ratio` centered on the canvas.
pub fn preset_rect(preset_ratio: f64, bounds: Size) -> Rect {
    let (canvas_width, canvas_height) = (bounds.width, bounds.height);
    let standard = canvas_width.max(canvas_height);
    let scale_for = |value: f64, limit: f64| if value > limit { limit / value } else { 1.0 };

    let mut width = standard * preset_ratio;
    let mut height = standard;

    let scale_width = scale_for(width, canvas_width);
    width *= scale_width;
    height *= scale_width;

    let scale_height = scale_for(height, canvas_height);
    width = fix_floating_point(width * scale_height);
    height = fix_floating_point(height * scale_height);

    Rect::new(
        (canvas_width - width) / 2.0,
        (canvas_height - height) / 2.0,
        width,
        height,
    )
}
