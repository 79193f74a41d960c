// SPDX-License-Identifier: GPL-3.0-or-later
// src/config.rs
//
// User-tunable settings shared by the crop and drawing tools.

use crate::constant::{
    DEFAULT_BRUSH_COLOR, DEFAULT_BRUSH_WIDTH, MOSAIC_BLOCK_SIZE, MOUSE_MOVE_THRESHOLD,
};
use crate::tools::MosaicStrategy;

/// Configuration for the tool controllers.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    /// Manhattan distance below which a crop drag is ignored.
    pub mouse_move_threshold: f64,
    /// Block edge length of the global mosaic filter.
    pub mosaic_block_size: u32,
    /// Initial brush width in pixels.
    pub brush_width: u32,
    /// Initial brush color (any format accepted by `Rgba::parse`).
    pub brush_color: String,
    /// Which mosaic implementation a mosaic session uses.
    pub mosaic_strategy: MosaicStrategy,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            mouse_move_threshold: MOUSE_MOVE_THRESHOLD,
            mosaic_block_size: MOSAIC_BLOCK_SIZE,
            brush_width: DEFAULT_BRUSH_WIDTH,
            brush_color: DEFAULT_BRUSH_COLOR.to_string(),
            mosaic_strategy: MosaicStrategy::default(),
        }
    }
}
