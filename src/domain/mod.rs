// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/mod.rs
//
// Pure geometry, color and pixel logic. No canvas or event concerns.

pub mod blob;
pub mod color;
pub mod geometry;
pub mod pixels;

pub use blob::Blob;
pub use color::Rgba;
pub use geometry::{PixelRect, Point, Rect, Size};
pub use pixels::PixelBlock;
