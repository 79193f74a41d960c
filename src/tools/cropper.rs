// SPDX-License-Identifier: GPL-3.0-or-later
// src/tools/cropper.rs
//
// Crop tool: turns pointer drags into a constrained crop zone and extracts
// the cropped image.

use crate::canvas::{
    CanvasEventKind, Cursor, Graphics, HandlerId, KeyEvent, KeyEventKind, ObjectId, PointerEvent,
};
use crate::config::ToolConfig;
use crate::constant::{
    CROP_CURSOR_SVG, CROPZONE_PLACEHOLDER_GEOMETRY, CROPZONE_START_GEOMETRY, KEY_CODE_SHIFT,
};
use crate::domain::blob::data_url;
use crate::domain::geometry::{preset_rect, rect_from_points};
use crate::domain::{Point, Rect};
use crate::tools::crop_zone::CropZone;

/// Origin and modifier state of one crop drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub start_x: f64,
    pub start_y: f64,
    pub shift_held: bool,
}

impl DragSession {
    fn start(&self) -> Point {
        Point::new(self.start_x, self.start_y)
    }
}

/// Image extracted from the canvas by `Cropper::get_cropped_image_data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CroppedImage {
    pub image_name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy)]
struct Listeners {
    key_down: HandlerId,
    key_up: HandlerId,
    mouse_down: HandlerId,
    mouse_move: HandlerId,
    mouse_up: HandlerId,
}

impl Listeners {
    fn new() -> Self {
        Self {
            key_down: HandlerId::next(),
            key_up: HandlerId::next(),
            mouse_down: HandlerId::next(),
            mouse_move: HandlerId::next(),
            mouse_up: HandlerId::next(),
        }
    }

    fn for_pointer(&self, kind: CanvasEventKind) -> HandlerId {
        match kind {
            CanvasEventKind::MouseDown => self.mouse_down,
            CanvasEventKind::MouseMove => self.mouse_move,
            CanvasEventKind::MouseUp => self.mouse_up,
        }
    }

    fn for_key(&self, kind: KeyEventKind) -> HandlerId {
        match kind {
            KeyEventKind::KeyDown => self.key_down,
            KeyEventKind::KeyUp => self.key_up,
        }
    }
}

/// Canvas state overwritten by `start` and put back by `end`.
#[derive(Debug, Clone)]
struct SavedCanvasState {
    selection: bool,
    cursor: Cursor,
    evented: Vec<(ObjectId, bool)>,
}

/// Crop region controller.
#[derive(Debug)]
pub struct Cropper {
    threshold: f64,
    zone: Option<CropZone>,
    drag: Option<DragSession>,
    with_shift_key: bool,
    listeners: Listeners,
    saved: Option<SavedCanvasState>,
}

impl Cropper {
    pub fn new(config: &ToolConfig) -> Self {
        Self {
            threshold: config.mouse_move_threshold,
            zone: None,
            drag: None,
            with_shift_key: false,
            listeners: Listeners::new(),
            saved: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.zone.is_some()
    }

    pub fn zone(&self) -> Option<&CropZone> {
        self.zone.as_ref()
    }

    pub fn drag_session(&self) -> Option<DragSession> {
        self.drag
    }

    pub fn is_shift_held(&self) -> bool {
        self.with_shift_key
    }

    /// Activate the tool. Does nothing when already active.
    pub fn start(&mut self, g: &mut dyn Graphics) {
        if self.zone.is_some() {
            return;
        }

        let (left, top, width, height) = CROPZONE_START_GEOMETRY;
        let zone = CropZone::new(
            Rect::new(left, top, width, height),
            g.crop_selection_style(),
        );

        let canvas = g.canvas_mut();
        let mut evented = Vec::new();
        for id in canvas.object_ids() {
            if let Some(previous) = canvas.is_evented(id) {
                evented.push((id, previous));
                canvas.set_evented(id, false);
            }
        }

        canvas.discard_active_object();
        canvas.add(zone.to_object());
        canvas.on(CanvasEventKind::MouseDown, self.listeners.mouse_down);

        self.saved = Some(SavedCanvasState {
            selection: canvas.selection(),
            cursor: canvas.cursor(),
            evented,
        });
        canvas.set_selection(false);
        canvas.set_cursor(crop_cursor());

        let keys = g.key_source();
        keys.subscribe(KeyEventKind::KeyDown, self.listeners.key_down);
        keys.subscribe(KeyEventKind::KeyUp, self.listeners.key_up);

        self.zone = Some(zone);
        log::debug!("Crop tool started");
    }

    /// Deactivate the tool and put the canvas back the way `start` found it.
    pub fn end(&mut self, g: &mut dyn Graphics) {
        let Some(zone) = self.zone.take() else {
            return;
        };
        let saved = self.saved.take();

        let canvas = g.canvas_mut();
        canvas.remove(zone.id());

        match &saved {
            Some(saved) => {
                canvas.set_selection(saved.selection);
                canvas.set_cursor(saved.cursor.clone());
            }
            None => {
                canvas.set_selection(true);
                canvas.set_cursor(Cursor::Default);
            }
        }

        canvas.off(CanvasEventKind::MouseDown, self.listeners.mouse_down);
        if self.drag.take().is_some() {
            canvas.off(CanvasEventKind::MouseMove, self.listeners.mouse_move);
            canvas.off(CanvasEventKind::MouseUp, self.listeners.mouse_up);
        }

        for (id, evented) in saved.map(|saved| saved.evented).unwrap_or_default() {
            if canvas.contains(id) {
                canvas.set_evented(id, evented);
            }
        }

        let keys = g.key_source();
        keys.unsubscribe(KeyEventKind::KeyDown, self.listeners.key_down);
        keys.unsubscribe(KeyEventKind::KeyUp, self.listeners.key_up);

        self.with_shift_key = false;
        log::debug!("Crop tool ended");
    }

    /// Route a canvas pointer event. Returns whether a registered handler ran.
    pub fn handle_pointer(&mut self, g: &mut dyn Graphics, event: &PointerEvent) -> bool {
        if !g
            .canvas()
            .has_listener(event.kind, self.listeners.for_pointer(event.kind))
        {
            return false;
        }

        match event.kind {
            CanvasEventKind::MouseDown => self.on_mouse_down(g, event),
            CanvasEventKind::MouseMove => self.on_mouse_move(g, event),
            CanvasEventKind::MouseUp => self.on_mouse_up(g),
        }
        true
    }

    /// Route a keyboard event. Returns whether a registered handler ran.
    pub fn handle_key(&mut self, g: &mut dyn Graphics, event: &KeyEvent) -> bool {
        if !g
            .key_source()
            .is_subscribed(event.kind, self.listeners.for_key(event.kind))
        {
            return false;
        }

        if event.key_code == KEY_CODE_SHIFT {
            let held = event.kind == KeyEventKind::KeyDown;
            self.with_shift_key = held;
            if let Some(drag) = self.drag.as_mut() {
                drag.shift_held = held;
            }
        }
        true
    }

    fn on_mouse_down(&mut self, g: &mut dyn Graphics, event: &PointerEvent) {
        if event.target.is_some() {
            return;
        }

        let canvas = g.canvas_mut();
        canvas.set_selection(false);
        let start = canvas.get_pointer(event.position);

        self.drag = Some(DragSession {
            start_x: start.x,
            start_y: start.y,
            shift_held: self.with_shift_key,
        });

        for kind in [CanvasEventKind::MouseMove, CanvasEventKind::MouseUp] {
            let handler = self.listeners.for_pointer(kind);
            if !canvas.has_listener(kind, handler) {
                canvas.on(kind, handler);
            }
        }
    }

    fn on_mouse_move(&mut self, g: &mut dyn Graphics, event: &PointerEvent) {
        let (Some(drag), Some(zone)) = (self.drag, self.zone.as_mut()) else {
            return;
        };

        let canvas = g.canvas_mut();
        let pointer = canvas.get_pointer(event.position);
        if pointer.manhattan(drag.start()) <= self.threshold {
            return;
        }

        canvas.remove(zone.id());
        zone.set_rect(rect_from_points(
            drag.start(),
            pointer,
            canvas.size(),
            zone.preset_ratio,
            drag.shift_held,
        ));
        canvas.add(zone.to_object());
        canvas.set_active_object(zone.id());
    }

    fn on_mouse_up(&mut self, g: &mut dyn Graphics) {
        let canvas = g.canvas_mut();
        if let Some(zone) = &self.zone {
            canvas.set_active_object(zone.id());
        }
        canvas.off(CanvasEventKind::MouseMove, self.listeners.mouse_move);
        canvas.off(CanvasEventKind::MouseUp, self.listeners.mouse_up);
        self.drag = None;
    }

    /// Rasterize the canvas inside `rect` without the crop overlay.
    ///
    /// Returns `Ok(None)` without touching the canvas when `rect` is `None`.
    pub fn get_cropped_image_data(
        &self,
        g: &mut dyn Graphics,
        rect: Option<Rect>,
    ) -> anyhow::Result<Option<CroppedImage>> {
        let Some(rect) = rect else {
            return Ok(None);
        };

        let canvas = g.canvas_mut();
        let overlay = self.zone.as_ref().filter(|zone| canvas.contains(zone.id()));
        let was_active = overlay.is_some_and(|zone| canvas.active_object() == Some(zone.id()));

        if let Some(zone) = overlay {
            canvas.remove(zone.id());
        }

        let url = canvas.to_data_url(Some(rect));

        if let Some(zone) = overlay {
            canvas.add(zone.to_object());
            if was_active {
                canvas.set_active_object(zone.id());
            }
        }

        let url = url?;
        Ok(Some(CroppedImage {
            image_name: g.image_name(),
            url,
        }))
    }

    /// Current zone geometry, or `None` when there is no usable zone.
    pub fn get_cropzone_rect(&self) -> Option<Rect> {
        self.zone
            .as_ref()
            .filter(|zone| zone.is_valid())
            .map(CropZone::rect)
    }

    /// Replace the zone geometry: the largest centered rectangle of
    /// `preset_ratio`, or the off-canvas placeholder when no ratio is given.
    pub fn set_cropzone_rect(&mut self, g: &mut dyn Graphics, preset_ratio: Option<f64>) {
        let Some(zone) = self.zone.as_mut() else {
            return;
        };
        let preset_ratio = preset_ratio.filter(|ratio| ratio.is_finite() && *ratio > 0.0);

        let canvas = g.canvas_mut();
        canvas.discard_active_object();
        canvas.set_selection(false);
        canvas.remove(zone.id());

        match preset_ratio {
            Some(ratio) => zone.set_rect(preset_rect(ratio, canvas.size())),
            None => {
                let (left, top, width, height) = CROPZONE_PLACEHOLDER_GEOMETRY;
                zone.set_rect(Rect::new(left, top, width, height));
            }
        }
        zone.preset_ratio = preset_ratio;

        canvas.add(zone.to_object());
        canvas.set_selection(true);

        if preset_ratio.is_some() {
            canvas.set_active_object(zone.id());
        }
    }

    /// Show or hide the zone without touching geometry or listeners.
    pub fn change_visibility(&mut self, g: &mut dyn Graphics, visible: bool) {
        if let Some(zone) = self.zone.as_mut() {
            zone.visible = visible;
            g.canvas_mut().set_visible(zone.id(), visible);
        }
    }
}

fn crop_cursor() -> Cursor {
    let url = data_url("image/svg+xml", CROP_CURSOR_SVG.as_bytes());
    Cursor::Custom(format!("url(\"{url}\"),auto"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, CanvasObject, KeySource, RasterCanvas, Workbench};
    use crate::domain::Rgba;
    use image::RgbaImage;

    fn workbench(width: u32, height: u32) -> Workbench {
        Workbench::new(RasterCanvas::new(RgbaImage::new(width, height)), "photo.png")
    }

    fn drag(cropper: &mut Cropper, wb: &mut Workbench, from: (f64, f64), to: (f64, f64)) {
        for (kind, (x, y)) in [
            (CanvasEventKind::MouseDown, from),
            (CanvasEventKind::MouseMove, to),
            (CanvasEventKind::MouseUp, to),
        ] {
            let event = wb.canvas.pointer_event(kind, Point::new(x, y));
            cropper.handle_pointer(wb, &event);
        }
    }

    fn shift(cropper: &mut Cropper, wb: &mut Workbench, kind: KeyEventKind) {
        cropper.handle_key(
            wb,
            &KeyEvent {
                kind,
                key_code: KEY_CODE_SHIFT,
            },
        );
    }

    #[test]
    fn start_is_idempotent() {
        let mut wb = workbench(100, 100);
        let mut cropper = Cropper::new(&ToolConfig::default());

        cropper.start(&mut wb);
        let zone_id = cropper.zone().unwrap().id();
        cropper.start(&mut wb);

        assert_eq!(cropper.zone().unwrap().id(), zone_id);
        assert_eq!(wb.canvas.listener_count(CanvasEventKind::MouseDown), 1);
        assert_eq!(wb.keyboard.subscriber_count(KeyEventKind::KeyDown), 1);
        assert_eq!(wb.canvas.object_ids(), vec![zone_id]);
    }

    #[test]
    fn end_without_start_is_a_no_op() {
        let mut wb = workbench(10, 10);
        let mut cropper = Cropper::new(&ToolConfig::default());
        cropper.end(&mut wb);
        assert!(wb.canvas.selection());
        assert_eq!(wb.canvas.cursor(), Cursor::Default);
    }

    #[test]
    fn start_end_restores_canvas_state() {
        let mut wb = workbench(100, 100);
        let shape = CanvasObject::shape(Rect::new(0.0, 0.0, 10.0, 10.0), Rgba::BLACK);
        let mut locked = CanvasObject::shape(Rect::new(20.0, 20.0, 10.0, 10.0), Rgba::BLACK);
        locked.evented = false;
        let (shape_id, locked_id) = (shape.id, locked.id);
        wb.canvas.add(shape);
        wb.canvas.add(locked);

        let mut cropper = Cropper::new(&ToolConfig::default());
        for _ in 0..3 {
            cropper.start(&mut wb);
            assert_eq!(wb.canvas.is_evented(shape_id), Some(false));
            assert!(!wb.canvas.selection());
            assert!(matches!(wb.canvas.cursor(), Cursor::Custom(_)));
            cropper.end(&mut wb);
        }

        assert_eq!(wb.canvas.is_evented(shape_id), Some(true));
        assert_eq!(wb.canvas.is_evented(locked_id), Some(false));
        assert_eq!(wb.canvas.object_ids(), vec![shape_id, locked_id]);
        assert!(wb.canvas.selection());
        assert_eq!(wb.canvas.cursor(), Cursor::Default);
        for kind in [
            CanvasEventKind::MouseDown,
            CanvasEventKind::MouseMove,
            CanvasEventKind::MouseUp,
        ] {
            assert_eq!(wb.canvas.listener_count(kind), 0);
        }
        assert_eq!(wb.keyboard.subscriber_count(KeyEventKind::KeyDown), 0);
        assert_eq!(wb.keyboard.subscriber_count(KeyEventKind::KeyUp), 0);
    }

    #[test]
    fn drag_sets_zone_geometry() {
        let mut wb = workbench(100, 100);
        let mut cropper = Cropper::new(&ToolConfig::default());
        cropper.start(&mut wb);

        drag(&mut cropper, &mut wb, (10.0, 10.0), (60.0, 40.0));

        assert_eq!(
            cropper.get_cropzone_rect(),
            Some(Rect::new(10.0, 10.0, 50.0, 30.0))
        );
        assert_eq!(wb.canvas.active_object(), Some(cropper.zone().unwrap().id()));
        assert_eq!(wb.canvas.listener_count(CanvasEventKind::MouseMove), 0);
        assert!(cropper.drag_session().is_none());
    }

    #[test]
    fn shift_drag_is_square() {
        let mut wb = workbench(100, 100);
        let mut cropper = Cropper::new(&ToolConfig::default());
        cropper.start(&mut wb);

        shift(&mut cropper, &mut wb, KeyEventKind::KeyDown);
        drag(&mut cropper, &mut wb, (10.0, 10.0), (60.0, 40.0));
        assert_eq!(
            cropper.get_cropzone_rect(),
            Some(Rect::new(10.0, 10.0, 50.0, 50.0))
        );

        shift(&mut cropper, &mut wb, KeyEventKind::KeyUp);
        assert!(!cropper.is_shift_held());
    }

    #[test]
    fn micro_drag_is_ignored() {
        let mut wb = workbench(100, 100);
        let mut cropper = Cropper::new(&ToolConfig::default());
        cropper.start(&mut wb);

        drag(&mut cropper, &mut wb, (10.0, 10.0), (15.0, 15.0));
        assert_eq!(
            cropper.zone().unwrap().rect(),
            Rect::new(0.0, 0.0, 0.5, 0.5)
        );
    }

    #[test]
    fn pointer_down_on_an_object_is_ignored() {
        let mut wb = workbench(100, 100);
        let mut cropper = Cropper::new(&ToolConfig::default());
        cropper.start(&mut wb);
        cropper.set_cropzone_rect(&mut wb, Some(1.0));

        let event = wb
            .canvas
            .pointer_event(CanvasEventKind::MouseDown, Point::new(50.0, 50.0));
        assert!(event.target.is_some());
        cropper.handle_pointer(&mut wb, &event);
        assert!(cropper.drag_session().is_none());
        assert_eq!(wb.canvas.listener_count(CanvasEventKind::MouseMove), 0);
    }

    #[test]
    fn set_cropzone_rect_applies_preset_ratio() {
        let mut wb = workbench(300, 200);
        let mut cropper = Cropper::new(&ToolConfig::default());
        cropper.start(&mut wb);

        cropper.set_cropzone_rect(&mut wb, Some(4.0 / 3.0));
        let rect = cropper.get_cropzone_rect().unwrap();
        assert!((rect.width / rect.height - 4.0 / 3.0).abs() < 0.01);
        assert!(rect.left >= 0.0 && rect.right() <= 300.0);
        assert!(rect.top >= 0.0 && rect.bottom() <= 200.0);
        assert!(wb.canvas.selection());
        assert_eq!(wb.canvas.active_object(), Some(cropper.zone().unwrap().id()));

        cropper.set_cropzone_rect(&mut wb, None);
        assert_eq!(cropper.get_cropzone_rect(), None);
        assert_eq!(cropper.zone().unwrap().preset_ratio, None);
    }

    #[test]
    fn preset_ratio_constrains_later_drags() {
        let mut wb = workbench(100, 100);
        let mut cropper = Cropper::new(&ToolConfig::default());
        cropper.start(&mut wb);
        cropper.set_cropzone_rect(&mut wb, Some(2.0));
        wb.canvas.discard_active_object();

        shift(&mut cropper, &mut wb, KeyEventKind::KeyDown);
        // Start outside the centered 100x50 zone so the drag is not captured by it.
        drag(&mut cropper, &mut wb, (10.0, 80.0), (90.0, 99.0));
        let rect = cropper.get_cropzone_rect().unwrap();
        assert!((rect.width / rect.height - 2.0).abs() < 1e-9);
        assert!(rect.bottom() <= 100.0);
    }

    #[test]
    fn cropped_image_data_requires_rect() {
        let mut wb = workbench(20, 20);
        let mut cropper = Cropper::new(&ToolConfig::default());
        cropper.start(&mut wb);
        let before = wb.canvas.object_ids();

        assert_eq!(cropper.get_cropped_image_data(&mut wb, None).unwrap(), None);
        assert_eq!(wb.canvas.object_ids(), before);
    }

    #[test]
    fn cropped_image_data_exports_rect_and_restores_overlay() {
        let mut wb = workbench(40, 30);
        let mut cropper = Cropper::new(&ToolConfig::default());
        cropper.start(&mut wb);
        drag(&mut cropper, &mut wb, (5.0, 5.0), (25.0, 20.0));

        let rect = cropper.get_cropzone_rect();
        let cropped = cropper
            .get_cropped_image_data(&mut wb, rect)
            .unwrap()
            .unwrap();
        assert_eq!(cropped.image_name, "photo.png");

        let blob = crate::domain::Blob::from_data_url(&cropped.url).unwrap();
        assert_eq!((blob.width, blob.height), (20, 15));
        assert!(wb.canvas.contains(cropper.zone().unwrap().id()));
        assert_eq!(wb.canvas.active_object(), Some(cropper.zone().unwrap().id()));
    }

    #[test]
    fn change_visibility_keeps_geometry() {
        let mut wb = workbench(100, 100);
        let mut cropper = Cropper::new(&ToolConfig::default());
        cropper.start(&mut wb);
        drag(&mut cropper, &mut wb, (10.0, 10.0), (60.0, 40.0));

        cropper.change_visibility(&mut wb, false);
        assert!(!cropper.zone().unwrap().visible);
        assert_eq!(
            cropper.get_cropzone_rect(),
            Some(Rect::new(10.0, 10.0, 50.0, 30.0))
        );
        assert_eq!(wb.canvas.listener_count(CanvasEventKind::MouseDown), 1);
    }

    #[test]
    fn end_mid_drag_releases_move_listeners() {
        let mut wb = workbench(100, 100);
        let mut cropper = Cropper::new(&ToolConfig::default());
        cropper.start(&mut wb);

        let event = wb
            .canvas
            .pointer_event(CanvasEventKind::MouseDown, Point::new(5.0, 5.0));
        cropper.handle_pointer(&mut wb, &event);
        assert_eq!(wb.canvas.listener_count(CanvasEventKind::MouseMove), 1);

        cropper.end(&mut wb);
        assert_eq!(wb.canvas.listener_count(CanvasEventKind::MouseMove), 0);
        assert_eq!(wb.canvas.listener_count(CanvasEventKind::MouseUp), 0);
    }
}
