// SPDX-License-Identifier: GPL-3.0-or-later
// src/tools/free_drawing.rs
//
// Free drawing tool: plain pencil strokes and the mosaic brush.

use std::sync::Arc;

use anyhow::Context;

use crate::canvas::{
    Canvas, CanvasEventKind, FreeDrawingBrush, Graphics, HandlerId, PointerEvent,
};
use crate::config::ToolConfig;
use crate::domain::pixels::{self, PixelBlock};
use crate::domain::Rgba;
use crate::tools::brush::{
    Brush, BrushMode, BrushSettings, MosaicStrategy, PatternBrush, PencilBrush,
};
use crate::tools::export::{Generation, PendingExport};

#[derive(Debug, Clone, Copy)]
struct Handlers {
    mouse_down: HandlerId,
    mouse_move: HandlerId,
    mouse_up: HandlerId,
}

impl Handlers {
    fn for_kind(&self, kind: CanvasEventKind) -> HandlerId {
        match kind {
            CanvasEventKind::MouseDown => self.mouse_down,
            CanvasEventKind::MouseMove => self.mouse_move,
            CanvasEventKind::MouseUp => self.mouse_up,
        }
    }
}

/// Pixel brush controller.
#[derive(Debug)]
pub struct FreeDrawing {
    brush: Brush,
    block_size: u32,
    strategy: MosaicStrategy,
    /// Strategy of the running mosaic session, if any.
    mosaic: Option<MosaicStrategy>,
    pencil: Option<PencilBrush>,
    pattern: Option<PatternBrush>,
    handlers: Handlers,
    generation: Generation,
}

impl FreeDrawing {
    pub fn new(config: &ToolConfig) -> anyhow::Result<Self> {
        let color = Rgba::parse(&config.brush_color).context("Invalid brush color in config")?;

        Ok(Self {
            brush: Brush {
                width: config.brush_width.max(1),
                color,
                mode: BrushMode::Pencil,
            },
            block_size: config.mosaic_block_size.max(1),
            strategy: config.mosaic_strategy,
            mosaic: None,
            pencil: None,
            pattern: None,
            handlers: Handlers {
                mouse_down: HandlerId::next(),
                mouse_move: HandlerId::next(),
                mouse_up: HandlerId::next(),
            },
            generation: Generation::default(),
        })
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn mosaic_strategy(&self) -> Option<MosaicStrategy> {
        self.mosaic
    }

    /// Start drawing: mosaic mode when `settings.mosaic` is set, pencil
    /// strokes otherwise.
    pub fn start(&mut self, g: &mut dyn Graphics, settings: &BrushSettings) -> anyhow::Result<()> {
        log::debug!("Free drawing started (mosaic: {})", settings.mosaic);
        if settings.mosaic {
            self.set_mosaic(g, settings)
        } else {
            g.canvas_mut().set_drawing_mode(true);
            self.set_brush(g, settings)
        }
    }

    /// Configure the pencil stroke renderer. Unset values keep their
    /// previous setting.
    pub fn set_brush(&mut self, g: &mut dyn Graphics, settings: &BrushSettings) -> anyhow::Result<()> {
        let color = settings.color.as_deref().map(Rgba::parse).transpose()?;

        self.apply_width(settings);
        if let Some(color) = color {
            self.brush.color = color;
        }

        let canvas = g.canvas_mut();
        self.release_live(canvas);
        self.mosaic = None;
        self.brush.mode = BrushMode::Pencil;

        let pencil = self.pencil.get_or_insert_with(|| PencilBrush {
            width: self.brush.width,
            color: self.brush.color,
        });
        pencil.width = self.brush.width;
        pencil.color = self.brush.color;

        canvas.set_free_drawing_brush(FreeDrawingBrush::Pencil(pencil.clone()));
        Ok(())
    }

    /// Enter mosaic mode with the configured (or requested) strategy.
    pub fn set_mosaic(&mut self, g: &mut dyn Graphics, settings: &BrushSettings) -> anyhow::Result<()> {
        self.apply_width(settings);
        let strategy = settings.strategy.unwrap_or(self.strategy);

        let canvas = g.canvas_mut();
        canvas.set_selection(false);

        match strategy {
            MosaicStrategy::Pattern => {
                self.release_live(canvas);
                canvas.set_drawing_mode(true);

                if self.pattern.is_none() {
                    let mut source = canvas
                        .snapshot(None)
                        .context("Failed to capture canvas for mosaic brush")?;
                    pixels::mosaic(&mut source, self.block_size);
                    self.pattern = Some(PatternBrush {
                        width: self.brush.width,
                        source: Arc::new(source),
                    });
                }

                if let Some(pattern) = self.pattern.as_mut() {
                    pattern.width = self.brush.width;
                    canvas.set_free_drawing_brush(FreeDrawingBrush::Pattern(pattern.clone()));
                }
            }
            MosaicStrategy::Live => {
                canvas.set_drawing_mode(false);
                if !canvas.has_listener(CanvasEventKind::MouseDown, self.handlers.mouse_down) {
                    canvas.on(CanvasEventKind::MouseDown, self.handlers.mouse_down);
                }
            }
        }

        self.brush.mode = BrushMode::Mosaic;
        self.mosaic = Some(strategy);
        Ok(())
    }

    /// Drop the cached mosaic pattern so the next mosaic session captures
    /// the canvas again.
    pub fn reset_pattern(&mut self) {
        self.pattern = None;
    }

    /// Stop drawing. Stroke renderers stay cached for the next `start`;
    /// exports still in flight are discarded.
    pub fn end(&mut self, g: &mut dyn Graphics) {
        let canvas = g.canvas_mut();
        canvas.set_drawing_mode(false);
        canvas.set_selection(true);
        self.release_live(canvas);
        self.mosaic = None;
        self.generation.advance();
        log::debug!("Free drawing ended");
    }

    /// Route a canvas pointer event. A finished live-mosaic gesture yields
    /// the export to hand to the editor.
    pub fn handle_pointer(
        &mut self,
        g: &mut dyn Graphics,
        event: &PointerEvent,
    ) -> anyhow::Result<Option<PendingExport>> {
        let handler = self.handlers.for_kind(event.kind);
        if !g.canvas().has_listener(event.kind, handler) {
            return Ok(None);
        }

        match event.kind {
            CanvasEventKind::MouseDown => {
                let canvas = g.canvas_mut();
                for kind in [CanvasEventKind::MouseMove, CanvasEventKind::MouseUp] {
                    let handler = self.handlers.for_kind(kind);
                    if !canvas.has_listener(kind, handler) {
                        canvas.on(kind, handler);
                    }
                }
                Ok(None)
            }
            CanvasEventKind::MouseMove => {
                self.smear(g.canvas_mut(), event)?;
                Ok(None)
            }
            CanvasEventKind::MouseUp => self.finish_gesture(g.canvas_mut()).map(Some),
        }
    }

    /// Pixelate the brush-sized block under the pointer.
    fn smear(&self, canvas: &mut dyn Canvas, event: &PointerEvent) -> anyhow::Result<()> {
        let pointer = canvas.get_pointer(event.position);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (width, height) = (canvas.width() as u32, canvas.height() as u32);

        let Some(block) = PixelBlock::centered(pointer, self.brush.width, width, height) else {
            return Ok(());
        };

        let mut data = canvas.get_image_data(block.rect())?;
        pixels::average_opaque(&mut data);
        canvas.put_image_data(&data, block.x(), block.y())
    }

    fn finish_gesture(&self, canvas: &mut dyn Canvas) -> anyhow::Result<PendingExport> {
        canvas.off(CanvasEventKind::MouseMove, self.handlers.mouse_move);
        canvas.off(CanvasEventKind::MouseUp, self.handlers.mouse_up);

        let data_url = canvas
            .to_data_url(None)
            .context("Failed to rasterize canvas for mosaic export")?;
        Ok(PendingExport::new(data_url, &self.generation))
    }

    fn apply_width(&mut self, settings: &BrushSettings) {
        if let Some(width) = settings.width.filter(|width| *width > 0) {
            self.brush.width = width;
        }
    }

    fn release_live(&self, canvas: &mut dyn Canvas) {
        canvas.off(CanvasEventKind::MouseDown, self.handlers.mouse_down);
        canvas.off(CanvasEventKind::MouseMove, self.handlers.mouse_move);
        canvas.off(CanvasEventKind::MouseUp, self.handlers.mouse_up);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{RasterCanvas, Workbench};
    use crate::domain::{PixelRect, Point};
    use image::{Rgba as Pixel, RgbaImage};

    fn workbench() -> Workbench {
        let pixels = RgbaImage::from_fn(100, 100, |x, y| {
            if (x + y) % 2 == 0 {
                Pixel([255, 0, 0, 255])
            } else {
                Pixel([0, 0, 255, 0])
            }
        });
        Workbench::new(RasterCanvas::new(pixels), "photo.png")
    }

    fn tool() -> FreeDrawing {
        FreeDrawing::new(&ToolConfig::default()).unwrap()
    }

    #[test]
    fn pencil_start_configures_brush() {
        let mut wb = workbench();
        let mut drawing = tool();

        drawing
            .start(&mut wb, &BrushSettings::pencil(20, "#ff0000"))
            .unwrap();

        assert!(wb.canvas.is_drawing_mode());
        assert_eq!(
            wb.canvas.free_drawing_brush(),
            Some(&FreeDrawingBrush::Pencil(PencilBrush {
                width: 20,
                color: Rgba::new(255, 0, 0, 1.0),
            }))
        );
        assert_eq!(drawing.brush().mode, BrushMode::Pencil);
    }

    #[test]
    fn set_brush_keeps_unset_values() {
        let mut wb = workbench();
        let mut drawing = tool();
        drawing.start(&mut wb, &BrushSettings::default()).unwrap();
        assert_eq!(drawing.brush().width, 12);
        assert_eq!(drawing.brush().color, Rgba::new(0, 0, 0, 0.5));

        drawing
            .set_brush(
                &mut wb,
                &BrushSettings {
                    width: Some(4),
                    ..BrushSettings::default()
                },
            )
            .unwrap();
        assert_eq!(drawing.brush().width, 4);
        assert_eq!(drawing.brush().color, Rgba::new(0, 0, 0, 0.5));
    }

    #[test]
    fn bad_color_leaves_brush_untouched() {
        let mut wb = workbench();
        let mut drawing = tool();
        let settings = BrushSettings::pencil(30, "not-a-color");
        assert!(drawing.set_brush(&mut wb, &settings).is_err());
        assert_eq!(drawing.brush().width, 12);
    }

    #[test]
    fn pattern_mosaic_paints_with_filtered_snapshot() {
        let mut wb = workbench();
        let mut drawing = tool();

        drawing.start(&mut wb, &BrushSettings::mosaic(16)).unwrap();

        assert!(wb.canvas.is_drawing_mode());
        assert!(!wb.canvas.selection());
        let Some(FreeDrawingBrush::Pattern(pattern)) = wb.canvas.free_drawing_brush() else {
            panic!("expected a pattern brush");
        };
        assert_eq!(pattern.width, 16);
        // Checkerboard averages to half red, half blue, half alpha per block.
        assert_eq!(pattern.source.get_pixel(0, 0), &Pixel([127, 0, 127, 127]));
        assert_eq!(wb.canvas.listener_count(CanvasEventKind::MouseDown), 0);
    }

    #[test]
    fn pattern_is_captured_once() {
        let mut wb = workbench();
        let mut drawing = tool();
        drawing.start(&mut wb, &BrushSettings::mosaic(8)).unwrap();
        drawing.end(&mut wb);

        wb.canvas
            .put_image_data(&RgbaImage::new(100, 100), 0, 0)
            .unwrap();
        drawing.start(&mut wb, &BrushSettings::mosaic(8)).unwrap();
        let Some(FreeDrawingBrush::Pattern(pattern)) = wb.canvas.free_drawing_brush() else {
            panic!("expected a pattern brush");
        };
        assert_eq!(pattern.source.get_pixel(0, 0), &Pixel([127, 0, 127, 127]));

        drawing.reset_pattern();
        drawing.start(&mut wb, &BrushSettings::mosaic(8)).unwrap();
        let Some(FreeDrawingBrush::Pattern(pattern)) = wb.canvas.free_drawing_brush() else {
            panic!("expected a pattern brush");
        };
        assert_eq!(pattern.source.get_pixel(0, 0), &Pixel([0, 0, 0, 0]));
    }

    #[test]
    fn live_mosaic_smears_clamped_block() {
        let mut wb = workbench();
        let mut drawing = tool();
        let settings = BrushSettings::mosaic(10).with_strategy(MosaicStrategy::Live);
        drawing.start(&mut wb, &settings).unwrap();
        assert!(!wb.canvas.is_drawing_mode());

        for (kind, point) in [
            (CanvasEventKind::MouseDown, Point::new(1.0, 1.0)),
            (CanvasEventKind::MouseMove, Point::new(1.0, 1.0)),
        ] {
            let event = wb.canvas.pointer_event(kind, point);
            assert!(drawing.handle_pointer(&mut wb, &event).unwrap().is_none());
        }

        // Block centered at (1, 1) is clipped to the 6x6 corner.
        let block = wb.canvas.get_image_data(PixelRect::new(0, 0, 6, 6)).unwrap();
        assert!(block.pixels().all(|p| *p == Pixel([127, 0, 127, 255])));
        let outside = wb.canvas.get_image_data(PixelRect::new(6, 0, 1, 1)).unwrap();
        assert_eq!(outside.get_pixel(0, 0), &Pixel([255, 0, 0, 255]));
    }

    #[test]
    fn live_mosaic_gesture_yields_export() {
        let mut wb = workbench();
        let mut drawing = tool();
        let settings = BrushSettings::mosaic(10).with_strategy(MosaicStrategy::Live);
        drawing.start(&mut wb, &settings).unwrap();

        let mut pending = None;
        for kind in [
            CanvasEventKind::MouseDown,
            CanvasEventKind::MouseMove,
            CanvasEventKind::MouseUp,
        ] {
            let event = wb.canvas.pointer_event(kind, Point::new(50.0, 50.0));
            pending = drawing.handle_pointer(&mut wb, &event).unwrap();
        }

        let pending = pending.expect("mouse up produces an export");
        assert!(pending.data_url().starts_with("data:image/png;base64,"));
        assert!(!pending.is_stale());
        assert_eq!(wb.canvas.listener_count(CanvasEventKind::MouseMove), 0);
        assert_eq!(wb.canvas.listener_count(CanvasEventKind::MouseDown), 1);

        drawing.end(&mut wb);
        assert!(pending.is_stale());
    }

    #[test]
    fn start_end_cycles_do_not_leak_listeners() {
        let mut wb = workbench();
        let mut drawing = tool();
        let settings = BrushSettings::mosaic(10).with_strategy(MosaicStrategy::Live);

        for _ in 0..4 {
            drawing.start(&mut wb, &settings).unwrap();
            drawing.start(&mut wb, &settings).unwrap();
            let down = wb.canvas.pointer_event(CanvasEventKind::MouseDown, Point::new(5.0, 5.0));
            drawing.handle_pointer(&mut wb, &down).unwrap();
            assert_eq!(wb.canvas.listener_count(CanvasEventKind::MouseDown), 1);
            drawing.end(&mut wb);
        }

        for kind in [
            CanvasEventKind::MouseDown,
            CanvasEventKind::MouseMove,
            CanvasEventKind::MouseUp,
        ] {
            assert_eq!(wb.canvas.listener_count(kind), 0);
        }
        assert!(wb.canvas.selection());
        assert!(!wb.canvas.is_drawing_mode());
    }

    #[test]
    fn switching_to_pencil_drops_live_mosaic() {
        let mut wb = workbench();
        let mut drawing = tool();
        let settings = BrushSettings::mosaic(10).with_strategy(MosaicStrategy::Live);
        drawing.start(&mut wb, &settings).unwrap();

        drawing.start(&mut wb, &BrushSettings::default()).unwrap();
        assert_eq!(wb.canvas.listener_count(CanvasEventKind::MouseDown), 0);
        assert_eq!(drawing.mosaic_strategy(), None);
        assert_eq!(drawing.brush().mode, BrushMode::Pencil);
    }
}
