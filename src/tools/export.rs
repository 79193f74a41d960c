// SPDX-License-Identifier: GPL-3.0-or-later
// src/tools/export.rs
//
// Hand-off of a finished mosaic gesture to the editor as a new image layer.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;

use crate::canvas::ImageHost;
use crate::domain::Blob;

/// Session counter shared between a tool and the exports it issued.
///
/// Ending a session advances the counter; exports issued before that point
/// are discarded instead of delivered.
#[derive(Debug, Clone, Default)]
pub struct Generation(Arc<AtomicU64>);

impl Generation {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Move to the next session. Returns the new generation.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The host accepted a new layer at this URL.
    Delivered(String),
    /// The issuing session ended before the export completed.
    Discarded,
}

/// Rasterized canvas waiting to be decoded and handed to the host.
#[derive(Debug)]
pub struct PendingExport {
    data_url: String,
    issued: u64,
    generation: Generation,
}

impl PendingExport {
    pub fn new(data_url: String, generation: &Generation) -> Self {
        Self {
            data_url,
            issued: generation.current(),
            generation: generation.clone(),
        }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn is_stale(&self) -> bool {
        self.generation.current() != self.issued
    }

    /// Decode the export off the UI thread and add it to `host` as an image
    /// layer, unless the session that produced it has ended meanwhile.
    pub async fn deliver(self, host: &mut dyn ImageHost) -> anyhow::Result<ExportOutcome> {
        let Self {
            data_url,
            issued,
            generation,
        } = self;

        let blob = tokio::task::spawn_blocking(move || Blob::from_data_url(&data_url))
            .await
            .context("Export decoding task failed")??;

        if generation.current() != issued {
            log::info!("Discarding export from an ended mosaic session");
            return Ok(ExportOutcome::Discarded);
        }

        let url = host
            .create_object_url(blob)
            .context("Host rejected the exported image")?;
        host.add_image_object(&url)
            .with_context(|| format!("Failed to add image layer {url}"))?;

        log::info!("Mosaic export added as layer {url}");
        Ok(ExportOutcome::Delivered(url))
    }
}
