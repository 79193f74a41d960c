// SPDX-License-Identifier: GPL-3.0-or-later
// src/lib.rs
//
// Crop region and mosaic brush tools for canvas-based image editors.

pub mod canvas;
pub mod config;
pub mod constant;
pub mod domain;
pub mod tools;

pub use canvas::{Canvas, Graphics, ImageHost, KeySource, RasterCanvas, Workbench};
pub use config::ToolConfig;
pub use tools::{Cropper, FreeDrawing};
