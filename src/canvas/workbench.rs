// SPDX-License-Identifier: GPL-3.0-or-later
// src/canvas/workbench.rs
//
// Headless editor wiring: keyboard listeners, the layer sink and the
// `Graphics` bundle the tools operate on.

use std::collections::HashMap;

use super::{Canvas, Graphics, HandlerId, ImageHost, KeyEventKind, KeySource, RasterCanvas};
use crate::domain::Blob;
use crate::tools::CropZoneStyle;

/// Document-level keyboard listener registry.
#[derive(Debug, Clone, Default)]
pub struct Keyboard {
    listeners: Vec<(KeyEventKind, HandlerId)>,
}

impl KeySource for Keyboard {
    fn subscribe(&mut self, kind: KeyEventKind, handler: HandlerId) {
        self.listeners.push((kind, handler));
    }

    fn unsubscribe(&mut self, kind: KeyEventKind, handler: HandlerId) {
        self.listeners.retain(|entry| *entry != (kind, handler));
    }

    fn is_subscribed(&self, kind: KeyEventKind, handler: HandlerId) -> bool {
        self.listeners.contains(&(kind, handler))
    }

    fn subscriber_count(&self, kind: KeyEventKind) -> usize {
        self.listeners.iter().filter(|(k, _)| *k == kind).count()
    }
}

/// Image layers added by finished tools, with the blobs behind their URLs.
#[derive(Debug, Clone, Default)]
pub struct LayerStack {
    layers: Vec<String>,
    blobs: HashMap<String, Blob>,
    next_url: u64,
}

impl LayerStack {
    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn blob(&self, url: &str) -> Option<&Blob> {
        self.blobs.get(url)
    }
}

impl ImageHost for LayerStack {
    fn create_object_url(&mut self, blob: Blob) -> anyhow::Result<String> {
        self.next_url += 1;
        let url = format!("blob:strix/{}", self.next_url);
        self.blobs.insert(url.clone(), blob);
        Ok(url)
    }

    fn add_image_object(&mut self, url: &str) -> anyhow::Result<()> {
        anyhow::ensure!(self.blobs.contains_key(url), "Unknown object URL {url}");
        self.layers.push(url.to_string());
        Ok(())
    }
}

/// A raster canvas and its keyboard, as seen by the tools.
#[derive(Debug, Clone)]
pub struct Workbench {
    pub canvas: RasterCanvas,
    pub keyboard: Keyboard,
    pub crop_style: CropZoneStyle,
    image_name: String,
}

impl Workbench {
    pub fn new(canvas: RasterCanvas, image_name: impl Into<String>) -> Self {
        Self {
            canvas,
            keyboard: Keyboard::default(),
            crop_style: CropZoneStyle::default(),
            image_name: image_name.into(),
        }
    }
}

impl Graphics for Workbench {
    fn canvas(&self) -> &dyn Canvas {
        &self.canvas
    }

    fn canvas_mut(&mut self) -> &mut dyn Canvas {
        &mut self.canvas
    }

    fn key_source(&mut self) -> &mut dyn KeySource {
        &mut self.keyboard
    }

    fn image_name(&self) -> String {
        self.image_name.clone()
    }

    fn crop_selection_style(&self) -> CropZoneStyle {
        self.crop_style.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::blob::png_data_url;
    use image::{Rgba as Pixel, RgbaImage};

    fn blob() -> Blob {
        let image = RgbaImage::from_pixel(3, 2, Pixel([1, 2, 3, 255]));
        let url = png_data_url(&image).unwrap();
        Blob::from_data_url(&url).unwrap()
    }

    #[test]
    fn keyboard_tracks_subscriptions_per_kind() {
        let mut keyboard = Keyboard::default();
        let handler = HandlerId::next();

        keyboard.subscribe(KeyEventKind::KeyDown, handler);
        assert!(keyboard.is_subscribed(KeyEventKind::KeyDown, handler));
        assert!(!keyboard.is_subscribed(KeyEventKind::KeyUp, handler));
        assert_eq!(keyboard.subscriber_count(KeyEventKind::KeyDown), 1);

        keyboard.unsubscribe(KeyEventKind::KeyDown, handler);
        assert_eq!(keyboard.subscriber_count(KeyEventKind::KeyDown), 0);
    }

    #[test]
    fn layer_stack_issues_distinct_urls() {
        let mut host = LayerStack::default();
        let first = host.create_object_url(blob()).unwrap();
        let second = host.create_object_url(blob()).unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("blob:strix/"));
        assert!(host.layers().is_empty());

        host.add_image_object(&second).unwrap();
        assert_eq!(host.layers(), [second.clone()]);
        assert_eq!(host.blob(&second).map(|b| b.width), Some(3));
    }

    #[test]
    fn layer_stack_rejects_unknown_urls() {
        let mut host = LayerStack::default();
        assert!(host.add_image_object("blob:strix/99").is_err());
        assert!(host.layers().is_empty());
    }

    #[test]
    fn workbench_exposes_canvas_and_name() {
        let mut wb = Workbench::new(RasterCanvas::new(RgbaImage::new(8, 4)), "scan.png");
        assert_eq!(wb.image_name(), "scan.png");
        assert_eq!(wb.canvas().width(), 8.0);

        wb.canvas_mut().set_selection(false);
        assert!(!wb.canvas.selection());

        let handler = HandlerId::next();
        wb.key_source().subscribe(KeyEventKind::KeyUp, handler);
        assert!(wb.keyboard.is_subscribed(KeyEventKind::KeyUp, handler));
    }
}
