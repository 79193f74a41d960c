// SPDX-License-Identifier: GPL-3.0-or-later
// src/canvas/raster.rs
//
// In-memory canvas over an RGBA buffer with an object stack drawn on top.

use anyhow::{bail, ensure};
use image::{Pixel, RgbaImage, imageops};

use super::{
    Canvas, CanvasEventKind, CanvasObject, Cursor, FreeDrawingBrush, HandlerId, ObjectId,
    ObjectKind, PointerEvent,
};
use crate::domain::{PixelRect, Point, Rect};
use crate::tools::CropZone;

/// Raster canvas: a pixel buffer plus overlay objects, selection and
/// drawing-mode flags and an event listener registry.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    pixels: RgbaImage,
    objects: Vec<CanvasObject>,
    active: Option<ObjectId>,
    selection: bool,
    drawing_mode: bool,
    cursor: Cursor,
    brush: Option<FreeDrawingBrush>,
    listeners: Vec<(CanvasEventKind, HandlerId)>,
    zoom: f64,
    offset: Point,
}

impl RasterCanvas {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels,
            objects: Vec::new(),
            active: None,
            selection: true,
            drawing_mode: false,
            cursor: Cursor::Default,
            brush: None,
            listeners: Vec::new(),
            zoom: 1.0,
            offset: Point::default(),
        }
    }

    /// Viewport mapping used by `get_pointer`: `canvas = (device - offset) / zoom`.
    pub fn with_viewport(mut self, zoom: f64, offset: Point) -> Self {
        self.zoom = if zoom > 0.0 { zoom } else { 1.0 };
        self.offset = offset;
        self
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn objects(&self) -> &[CanvasObject] {
        &self.objects
    }

    /// Topmost evented, visible object under a canvas-space point.
    pub fn hit_test(&self, point: Point) -> Option<ObjectId> {
        self.objects
            .iter()
            .rev()
            .find(|object| object.evented && object.visible && object.bounds().contains(point))
            .map(|object| object.id)
    }

    /// Build the event the canvas would deliver for a pointer at the device
    /// position `position`.
    pub fn pointer_event(&self, kind: CanvasEventKind, position: Point) -> PointerEvent {
        PointerEvent {
            kind,
            position,
            target: self.hit_test(self.get_pointer(position)),
        }
    }

    /// Render a stroke through canvas-space `path` with the active brush.
    pub fn draw_stroke(&mut self, path: &[Point]) -> anyhow::Result<()> {
        ensure!(self.drawing_mode, "Canvas is not in drawing mode");
        let Some(brush) = self.brush.clone() else {
            bail!("No drawing brush configured");
        };

        let mut previous: Option<Point> = None;
        for &point in path {
            match previous {
                None => self.dab(&brush, point),
                Some(from) => {
                    let distance = ((point.x - from.x).powi(2) + (point.y - from.y).powi(2)).sqrt();
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let steps = distance.ceil().max(1.0) as u32;
                    for step in 1..=steps {
                        let t = f64::from(step) / f64::from(steps);
                        let at = Point::new(
                            from.x + (point.x - from.x) * t,
                            from.y + (point.y - from.y) * t,
                        );
                        self.dab(&brush, at);
                    }
                }
            }
            previous = Some(point);
        }
        Ok(())
    }

    /// Paint one round brush tip centered at `center`.
    fn dab(&mut self, brush: &FreeDrawingBrush, center: Point) {
        let radius = f64::from(brush.width().max(1)) / 2.0;
        let (width, height) = self.pixels.dimensions();
        let bounds = Rect::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0);
        let Some(area) = bounds.to_pixel_rect(width, height) else {
            return;
        };

        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                let dx = f64::from(x) + 0.5 - center.x;
                let dy = f64::from(y) + 0.5 - center.y;
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                match brush {
                    FreeDrawingBrush::Pencil(pencil) => {
                        self.pixels.get_pixel_mut(x, y).blend(&pencil.color.to_pixel());
                    }
                    FreeDrawingBrush::Pattern(pattern) => {
                        if let Some(source) = pattern.source.get_pixel_checked(x, y) {
                            self.pixels.put_pixel(x, y, *source);
                        }
                    }
                }
            }
        }
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut CanvasObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    fn object(&self, id: ObjectId) -> Option<&CanvasObject> {
        self.objects.iter().find(|object| object.id == id)
    }
}

impl Canvas for RasterCanvas {
    fn width(&self) -> f64 {
        f64::from(self.pixels.width())
    }

    fn height(&self) -> f64 {
        f64::from(self.pixels.height())
    }

    fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.iter().map(|object| object.id).collect()
    }

    fn is_evented(&self, id: ObjectId) -> Option<bool> {
        self.object(id).map(|object| object.evented)
    }

    fn set_evented(&mut self, id: ObjectId, evented: bool) {
        if let Some(object) = self.object_mut(id) {
            object.evented = evented;
        }
    }

    fn set_visible(&mut self, id: ObjectId, visible: bool) {
        if let Some(object) = self.object_mut(id) {
            object.visible = visible;
            if let ObjectKind::CropZone(zone) = &mut object.kind {
                zone.visible = visible;
            }
        }
    }

    fn add(&mut self, object: CanvasObject) {
        self.objects.retain(|existing| existing.id != object.id);
        self.objects.push(object);
    }

    fn remove(&mut self, id: ObjectId) -> bool {
        let before = self.objects.len();
        self.objects.retain(|object| object.id != id);
        if self.active == Some(id) {
            self.active = None;
        }
        self.objects.len() != before
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.object(id).is_some()
    }

    fn active_object(&self) -> Option<ObjectId> {
        self.active
    }

    fn set_active_object(&mut self, id: ObjectId) {
        if self.contains(id) {
            self.active = Some(id);
        }
    }

    fn discard_active_object(&mut self) {
        self.active = None;
    }

    fn get_pointer(&self, position: Point) -> Point {
        Point::new(
            (position.x - self.offset.x) / self.zoom,
            (position.y - self.offset.y) / self.zoom,
        )
    }

    fn selection(&self) -> bool {
        self.selection
    }

    fn set_selection(&mut self, enabled: bool) {
        self.selection = enabled;
    }

    fn is_drawing_mode(&self) -> bool {
        self.drawing_mode
    }

    fn set_drawing_mode(&mut self, enabled: bool) {
        self.drawing_mode = enabled;
    }

    fn cursor(&self) -> Cursor {
        self.cursor.clone()
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn free_drawing_brush(&self) -> Option<&FreeDrawingBrush> {
        self.brush.as_ref()
    }

    fn set_free_drawing_brush(&mut self, brush: FreeDrawingBrush) {
        self.brush = Some(brush);
    }

    fn on(&mut self, kind: CanvasEventKind, handler: HandlerId) {
        self.listeners.push((kind, handler));
    }

    fn off(&mut self, kind: CanvasEventKind, handler: HandlerId) {
        self.listeners.retain(|entry| *entry != (kind, handler));
    }

    fn has_listener(&self, kind: CanvasEventKind, handler: HandlerId) -> bool {
        self.listeners.contains(&(kind, handler))
    }

    fn listener_count(&self, kind: CanvasEventKind) -> usize {
        self.listeners.iter().filter(|(k, _)| *k == kind).count()
    }

    fn get_image_data(&self, rect: PixelRect) -> anyhow::Result<RgbaImage> {
        let (width, height) = self.pixels.dimensions();
        ensure!(
            rect.x.saturating_add(rect.width) <= width
                && rect.y.saturating_add(rect.height) <= height,
            "Pixel read {rect:?} exceeds canvas {width}x{height}"
        );
        Ok(imageops::crop_imm(&self.pixels, rect.x, rect.y, rect.width, rect.height).to_image())
    }

    fn put_image_data(&mut self, data: &RgbaImage, x: u32, y: u32) -> anyhow::Result<()> {
        let (width, height) = self.pixels.dimensions();
        ensure!(
            x.saturating_add(data.width()) <= width && y.saturating_add(data.height()) <= height,
            "Pixel write of {}x{} at ({x}, {y}) exceeds canvas {width}x{height}",
            data.width(),
            data.height()
        );
        imageops::replace(&mut self.pixels, data, i64::from(x), i64::from(y));
        Ok(())
    }

    fn snapshot(&self, rect: Option<Rect>) -> anyhow::Result<RgbaImage> {
        let mut composite = self.pixels.clone();
        for object in self.objects.iter().filter(|object| object.visible) {
            match &object.kind {
                ObjectKind::Shape { bounds, fill } => {
                    let color = fill.to_pixel();
                    for_each_pixel(&mut composite, *bounds, |pixel| pixel.blend(&color));
                }
                ObjectKind::CropZone(zone) => draw_crop_zone(&mut composite, zone),
            }
        }

        let Some(rect) = rect else {
            return Ok(composite);
        };
        let (width, height) = composite.dimensions();
        let Some(area) = rect.to_pixel_rect(width, height) else {
            bail!("Export area {rect:?} lies outside the canvas");
        };
        Ok(imageops::crop_imm(&composite, area.x, area.y, area.width, area.height).to_image())
    }
}

fn for_each_pixel(
    image: &mut RgbaImage,
    bounds: Rect,
    mut paint: impl FnMut(&mut image::Rgba<u8>),
) {
    let (width, height) = image.dimensions();
    if let Some(area) = bounds.to_pixel_rect(width, height) {
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                paint(image.get_pixel_mut(x, y));
            }
        }
    }
}

/// Dim everything outside the zone and mark its corners.
fn draw_crop_zone(image: &mut RgbaImage, zone: &CropZone) {
    let (width, height) = image.dimensions();
    let dim = zone.style.dim_color.to_pixel();
    let inside = zone.rect().to_pixel_rect(width, height);

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let covered = inside.is_some_and(|area| {
            x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
        });
        if !covered {
            pixel.blend(&dim);
        }
    }

    let rect = zone.rect();
    let tint = zone.style.fill.to_pixel();
    if tint[3] > 0 {
        for_each_pixel(image, rect, |pixel| pixel.blend(&tint));
    }

    let stroke = zone.style.stroke_width;
    if stroke > 0.0 {
        let color = zone.style.stroke_color.to_pixel();
        let half = stroke / 2.0;
        for edge in [
            Rect::new(rect.left - half, rect.top - half, rect.width + stroke, stroke),
            Rect::new(rect.left - half, rect.bottom() - half, rect.width + stroke, stroke),
            Rect::new(rect.left - half, rect.top - half, stroke, rect.height + stroke),
            Rect::new(rect.right() - half, rect.top - half, stroke, rect.height + stroke),
        ] {
            for_each_pixel(image, edge, |pixel| *pixel = color);
        }
    }

    let corner = zone.style.corner_size;
    let color = zone.style.corner_color.to_pixel();
    for (cx, cy) in [
        (rect.left, rect.top),
        (rect.right(), rect.top),
        (rect.left, rect.bottom()),
        (rect.right(), rect.bottom()),
    ] {
        let handle = Rect::new(cx - corner / 2.0, cy - corner / 2.0, corner, corner);
        for_each_pixel(image, handle, |pixel| pixel.blend(&color));
    }
}
