// SPDX-License-Identifier: GPL-3.0-or-later
// src/tools/brush.rs
//
// Brush state, settings and the two stroke renderers.

use std::sync::Arc;

use image::RgbaImage;

use crate::domain::Rgba;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrushMode {
    #[default]
    Pencil,
    Mosaic,
}

/// How a mosaic session pixelates the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MosaicStrategy {
    /// Paint with a pattern cut from a mosaicked snapshot of the canvas.
    #[default]
    Pattern,
    /// Average the block under the pointer on every move, then export the
    /// canvas as a new layer when the gesture ends.
    Live,
}

/// Current brush configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub width: u32,
    pub color: Rgba,
    pub mode: BrushMode,
}

/// Options accepted by `FreeDrawing::start`, `set_brush` and `set_mosaic`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrushSettings {
    pub width: Option<u32>,
    pub color: Option<String>,
    pub mosaic: bool,
    /// Overrides the configured strategy for this session.
    pub strategy: Option<MosaicStrategy>,
}

impl BrushSettings {
    pub fn pencil(width: u32, color: &str) -> Self {
        Self {
            width: Some(width),
            color: Some(color.to_string()),
            ..Self::default()
        }
    }

    pub fn mosaic(width: u32) -> Self {
        Self {
            width: Some(width),
            mosaic: true,
            ..Self::default()
        }
    }

    pub fn with_strategy(mut self, strategy: MosaicStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
}

/// Solid-color stroke renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct PencilBrush {
    pub width: u32,
    pub color: Rgba,
}

/// Stroke renderer that paints pixels copied from `source` at the same
/// canvas coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternBrush {
    pub width: u32,
    pub source: Arc<RgbaImage>,
}
