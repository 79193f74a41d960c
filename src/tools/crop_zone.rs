// SPDX-License-Identifier: GPL-3.0-or-later
// src/tools/crop_zone.rs
//
// Crop zone overlay entity and its style.

use crate::canvas::{CanvasObject, ObjectId, ObjectKind};
use crate::domain::{Rect, Rgba};

/// Visual style of the crop overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct CropZoneStyle {
    /// Border width in pixels. Zero draws no border.
    pub stroke_width: f64,
    pub stroke_color: Rgba,
    pub corner_size: f64,
    pub corner_color: Rgba,
    /// Tint blended over the inside of the zone.
    pub fill: Rgba,
    /// Color of the dimmed area outside the zone.
    pub dim_color: Rgba,
}

impl Default for CropZoneStyle {
    fn default() -> Self {
        Self {
            stroke_width: 0.0,
            stroke_color: Rgba::BLACK,
            corner_size: 10.0,
            corner_color: Rgba::BLACK,
            fill: Rgba::TRANSPARENT,
            dim_color: Rgba::new(0, 0, 0, 0.55),
        }
    }
}

/// The draggable crop rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct CropZone {
    id: ObjectId,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Fixed width / height ratio, if a preset is applied.
    pub preset_ratio: Option<f64>,
    pub visible: bool,
    pub style: CropZoneStyle,
}

impl CropZone {
    pub fn new(rect: Rect, style: CropZoneStyle) -> Self {
        Self {
            id: ObjectId::next(),
            left: rect.left,
            top: rect.top,
            width: rect.width,
            height: rect.height,
            preset_ratio: None,
            visible: true,
            style,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.left, self.top, self.width, self.height)
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.left = rect.left;
        self.top = rect.top;
        self.width = rect.width;
        self.height = rect.height;
    }

    /// A zone is usable for cropping when it sits on the canvas with a
    /// positive area.
    pub fn is_valid(&self) -> bool {
        self.left >= 0.0 && self.top >= 0.0 && self.width > 0.0 && self.height > 0.0
    }

    /// Canvas object snapshot of the zone. Pointer-downs on the zone itself
    /// belong to the canvas (move/scale), not to the crop drag.
    pub fn to_object(&self) -> CanvasObject {
        CanvasObject {
            id: self.id,
            evented: true,
            visible: self.visible,
            kind: ObjectKind::CropZone(self.clone()),
        }
    }
}
