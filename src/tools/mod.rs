// SPDX-License-Identifier: GPL-3.0-or-later
// src/tools/mod.rs
//
// Interactive tools: the crop region selector and the free drawing brush.

pub mod brush;
pub mod crop_zone;
pub mod cropper;
pub mod export;
pub mod free_drawing;

pub use brush::{Brush, BrushMode, BrushSettings, MosaicStrategy, PatternBrush, PencilBrush};
pub use crop_zone::{CropZone, CropZoneStyle};
pub use cropper::{CroppedImage, Cropper, DragSession};
pub use export::{ExportOutcome, Generation, PendingExport};
pub use free_drawing::FreeDrawing;
