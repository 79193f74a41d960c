// SPDX-License-Identifier: GPL-3.0-or-later
// src/canvas/mod.rs
//
// Contracts between the tools and the editor that hosts them: the canvas
// surface, keyboard input, editor wiring and the image layer sink.

pub mod raster;
pub mod workbench;

use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;

use crate::domain::blob::png_data_url;
use crate::domain::{Blob, PixelRect, Point, Rect, Rgba, Size};
use crate::tools::{CropZone, CropZoneStyle, PatternBrush, PencilBrush};

pub use raster::RasterCanvas;
pub use workbench::{Keyboard, LayerStack, Workbench};

// =============================================================================
// Identifiers
// =============================================================================

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identity of a registered event handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl HandlerId {
    pub fn next() -> Self {
        Self(next_id())
    }
}

/// Identity of an object placed on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    pub fn next() -> Self {
        Self(next_id())
    }
}

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanvasEventKind {
    MouseDown,
    MouseMove,
    MouseUp,
}

/// Pointer event as delivered by the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: CanvasEventKind,
    /// Position in device (viewport) coordinates.
    pub position: Point,
    /// Evented object under the pointer, if any.
    pub target: Option<ObjectId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEventKind {
    KeyDown,
    KeyUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub key_code: u32,
}

/// Cursor shown over the canvas when nothing else overrides it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    /// CSS cursor value, e.g. `url("data:...") , auto`.
    Custom(String),
}

// =============================================================================
// Canvas objects
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    CropZone(CropZone),
    /// Opaque content placed by the editor (images, shapes, text).
    Shape { bounds: Rect, fill: Rgba },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasObject {
    pub id: ObjectId,
    /// Whether pointer events can target this object.
    pub evented: bool,
    pub visible: bool,
    pub kind: ObjectKind,
}

impl CanvasObject {
    pub fn shape(bounds: Rect, fill: Rgba) -> Self {
        Self {
            id: ObjectId::next(),
            evented: true,
            visible: true,
            kind: ObjectKind::Shape { bounds, fill },
        }
    }

    pub fn bounds(&self) -> Rect {
        match &self.kind {
            ObjectKind::CropZone(zone) => zone.rect(),
            ObjectKind::Shape { bounds, .. } => *bounds,
        }
    }
}

/// Stroke renderer used by the canvas while drawing mode is on.
#[derive(Debug, Clone, PartialEq)]
pub enum FreeDrawingBrush {
    Pencil(PencilBrush),
    Pattern(PatternBrush),
}

impl FreeDrawingBrush {
    pub fn width(&self) -> u32 {
        match self {
            Self::Pencil(brush) => brush.width,
            Self::Pattern(brush) => brush.width,
        }
    }
}

// =============================================================================
// Collaborator traits
// =============================================================================

/// The drawing surface shared by every tool.
pub trait Canvas {
    fn width(&self) -> f64;
    fn height(&self) -> f64;

    fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Ids of every object, bottom to top.
    fn object_ids(&self) -> Vec<ObjectId>;
    fn is_evented(&self, id: ObjectId) -> Option<bool>;
    fn set_evented(&mut self, id: ObjectId, evented: bool);
    fn set_visible(&mut self, id: ObjectId, visible: bool);

    /// Add `object` on top of the stack, replacing an object with the same id.
    fn add(&mut self, object: CanvasObject);
    /// Remove an object. Returns whether it was present.
    fn remove(&mut self, id: ObjectId) -> bool;
    fn contains(&self, id: ObjectId) -> bool;

    fn active_object(&self) -> Option<ObjectId>;
    fn set_active_object(&mut self, id: ObjectId);
    fn discard_active_object(&mut self);

    /// Transform a device position into canvas coordinates.
    fn get_pointer(&self, position: Point) -> Point;

    fn selection(&self) -> bool;
    fn set_selection(&mut self, enabled: bool);
    fn is_drawing_mode(&self) -> bool;
    fn set_drawing_mode(&mut self, enabled: bool);
    fn cursor(&self) -> Cursor;
    fn set_cursor(&mut self, cursor: Cursor);
    fn free_drawing_brush(&self) -> Option<&FreeDrawingBrush>;
    fn set_free_drawing_brush(&mut self, brush: FreeDrawingBrush);

    fn on(&mut self, kind: CanvasEventKind, handler: HandlerId);
    fn off(&mut self, kind: CanvasEventKind, handler: HandlerId);
    fn has_listener(&self, kind: CanvasEventKind, handler: HandlerId) -> bool;
    fn listener_count(&self, kind: CanvasEventKind) -> usize;

    /// Copy of the raw pixel buffer inside `rect`.
    fn get_image_data(&self, rect: PixelRect) -> anyhow::Result<RgbaImage>;
    /// Write `data` into the raw pixel buffer with its top-left at `(x, y)`.
    fn put_image_data(&mut self, data: &RgbaImage, x: u32, y: u32) -> anyhow::Result<()>;

    /// Rasterize the visible canvas, optionally restricted to `rect`.
    fn snapshot(&self, rect: Option<Rect>) -> anyhow::Result<RgbaImage>;

    /// Rasterize to a PNG data URL.
    fn to_data_url(&self, rect: Option<Rect>) -> anyhow::Result<String> {
        png_data_url(&self.snapshot(rect)?)
    }
}

/// Keyboard events delivered from the document the editor lives in.
pub trait KeySource {
    fn subscribe(&mut self, kind: KeyEventKind, handler: HandlerId);
    fn unsubscribe(&mut self, kind: KeyEventKind, handler: HandlerId);
    fn is_subscribed(&self, kind: KeyEventKind, handler: HandlerId) -> bool;
    fn subscriber_count(&self, kind: KeyEventKind) -> usize;
}

/// Editor wiring handed to every tool call.
pub trait Graphics {
    fn canvas(&self) -> &dyn Canvas;
    fn canvas_mut(&mut self) -> &mut dyn Canvas;
    fn key_source(&mut self) -> &mut dyn KeySource;

    /// Name of the image being edited.
    fn image_name(&self) -> String;

    /// Style overrides for the crop selection overlay.
    fn crop_selection_style(&self) -> CropZoneStyle {
        CropZoneStyle::default()
    }
}

/// The editor that receives finished raster layers.
pub trait ImageHost {
    /// Register `blob` and return a URL the editor can display.
    fn create_object_url(&mut self, blob: Blob) -> anyhow::Result<String>;

    /// Add a new image layer sourced from `url`.
    fn add_image_object(&mut self, url: &str) -> anyhow::Result<()>;
}
