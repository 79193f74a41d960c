// SPDX-License-Identifier: GPL-3.0-or-later
// src/constant.rs
//
// Tool constants that should not be changed by the user.

/// Manhattan distance a pointer must travel before a crop drag resizes the zone.
pub const MOUSE_MOVE_THRESHOLD: f64 = 10.0;

/// Edge length of the square blocks averaged by the global mosaic filter.
pub const MOSAIC_BLOCK_SIZE: u32 = 50;

/// Brush width used until a caller sets one.
pub const DEFAULT_BRUSH_WIDTH: u32 = 12;

/// Brush color used until a caller sets one.
pub const DEFAULT_BRUSH_COLOR: &str = "rgba(0, 0, 0, 0.5)";

/// Key code reported for the shift key.
pub const KEY_CODE_SHIFT: u32 = 16;

/// Decimal digits kept by `fix_floating_point`.
pub const FLOATING_POINT_DIGIT: i32 = 2;

/// Geometry of a freshly started crop zone (left, top, width, height).
pub const CROPZONE_START_GEOMETRY: (f64, f64, f64, f64) = (0.0, 0.0, 0.5, 0.5);

/// Off-canvas placeholder geometry used when a zone is reset without a ratio.
pub const CROPZONE_PLACEHOLDER_GEOMETRY: (f64, f64, f64, f64) = (-10.0, -10.0, 1.0, 1.0);

/// Crosshair cursor shown while the crop tool is active.
pub const CROP_CURSOR_SVG: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg width="22px" height="22px" viewBox="0 0 22 22" version="1.1" xmlns="http://www.w3.org/2000/svg">
  <g stroke="#FFFFFF" stroke-width="0.5" fill="#2F2F46" fill-rule="nonzero">
    <path d="M11.75,0.75 L11.75,4.8 C14.5,5.1 16.9,7.5 17.2,10.25 L21.25,10.25 L21.25,11.75 L17.2,11.75 C16.9,14.5 14.5,16.9 11.75,17.2 L11.75,21.25 L10.25,21.25 L10.25,17.2 C7.5,16.9 5.1,14.5 4.8,11.75 L0.75,11.75 L0.75,10.25 L4.8,10.25 C5.1,7.5 7.5,5.1 10.25,4.8 L10.25,0.75 Z"/>
  </g>
</svg>
"##;

/// MIME type of every canvas export.
pub const EXPORT_MIME: &str = "image/png";
