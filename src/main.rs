// SPDX-License-Identifier: GPL-3.0-or-later
// src/main.rs
//
// Headless command line front end: runs the crop and mosaic tools on image
// files through the in-memory workbench.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use image::RgbaImage;

use strix::canvas::{CanvasEventKind, KeyEvent, KeyEventKind, LayerStack};
use strix::constant::{
    DEFAULT_BRUSH_WIDTH, KEY_CODE_SHIFT, MOSAIC_BLOCK_SIZE, MOUSE_MOVE_THRESHOLD,
};
use strix::domain::{Blob, Point, pixels};
use strix::tools::{BrushSettings, ExportOutcome, MosaicStrategy};
use strix::{Cropper, FreeDrawing, RasterCanvas, ToolConfig, Workbench};

/// Crop and mosaic tools for raster images.
#[derive(Parser, Debug)]
#[command(name = "strix", version, about)]
struct Cli {
    /// Log tool activity at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crop to a preset aspect ratio or to a dragged rectangle.
    Crop {
        input: PathBuf,
        output: PathBuf,
        /// Largest centered region with this width/height ratio.
        #[arg(long, conflicts_with_all = ["from", "to"])]
        ratio: Option<f64>,
        /// Drag start, as X,Y.
        #[arg(long, value_parser = parse_point, requires = "to")]
        from: Option<Point>,
        /// Drag end, as X,Y.
        #[arg(long, value_parser = parse_point, requires = "from")]
        to: Option<Point>,
        /// Hold shift during the drag.
        #[arg(long)]
        square: bool,
        /// Minimum pointer travel before the drag resizes the zone.
        #[arg(long, default_value_t = MOUSE_MOVE_THRESHOLD)]
        threshold: f64,
    },
    /// Pixelate the whole image in square blocks.
    Mosaic {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value_t = MOSAIC_BLOCK_SIZE)]
        block: u32,
    },
    /// Smear mosaic blocks along a pointer path.
    Smear {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value_t = DEFAULT_BRUSH_WIDTH)]
        width: u32,
        /// Pointer positions, as X,Y.
        #[arg(long, value_parser = parse_point, num_args = 1.., required = true)]
        path: Vec<Point>,
    },
}

impl Command {
    /// Tool settings selected by the subcommand's flags.
    fn tool_config(&self) -> ToolConfig {
        let defaults = ToolConfig::default();
        match self {
            Self::Crop { threshold, .. } => ToolConfig {
                mouse_move_threshold: *threshold,
                ..defaults
            },
            Self::Mosaic { block, .. } => ToolConfig {
                mosaic_block_size: *block,
                ..defaults
            },
            Self::Smear { width, .. } => ToolConfig {
                brush_width: *width,
                mosaic_strategy: MosaicStrategy::Live,
                ..defaults
            },
        }
    }
}

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got `{value}`"))?;
    let x = x.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(Point::new(x, y))
}

fn load(path: &Path) -> anyhow::Result<RgbaImage> {
    let image = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(image.to_rgba8())
}

fn save(image: &RgbaImage, path: &Path) -> anyhow::Result<()> {
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn image_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn crop(
    config: &ToolConfig,
    input: &Path,
    output: &Path,
    ratio: Option<f64>,
    drag: Option<(Point, Point)>,
    square: bool,
) -> anyhow::Result<()> {
    let mut wb = Workbench::new(RasterCanvas::new(load(input)?), image_name(input));
    let mut cropper = Cropper::new(config);
    cropper.start(&mut wb);

    if let Some(ratio) = ratio {
        cropper.set_cropzone_rect(&mut wb, Some(ratio));
    } else if let Some((from, to)) = drag {
        if square {
            cropper.handle_key(
                &mut wb,
                &KeyEvent {
                    kind: KeyEventKind::KeyDown,
                    key_code: KEY_CODE_SHIFT,
                },
            );
        }
        for (kind, position) in [
            (CanvasEventKind::MouseDown, from),
            (CanvasEventKind::MouseMove, to),
            (CanvasEventKind::MouseUp, to),
        ] {
            let event = wb.canvas.pointer_event(kind, position);
            cropper.handle_pointer(&mut wb, &event);
        }
    } else {
        bail!("Either --ratio or --from/--to is required");
    }

    let rect = cropper.get_cropzone_rect();
    let cropped = cropper.get_cropped_image_data(&mut wb, rect)?;
    cropper.end(&mut wb);

    let Some(cropped) = cropped else {
        bail!("No crop region was selected");
    };
    log::info!("Cropped {} to {:?}", cropped.image_name, rect);
    save(&Blob::from_data_url(&cropped.url)?.to_image()?, output)
}

async fn smear(
    config: &ToolConfig,
    input: &Path,
    output: &Path,
    path: &[Point],
) -> anyhow::Result<()> {
    let (Some(first), Some(last)) = (path.first(), path.last()) else {
        bail!("The smear path is empty");
    };

    let mut wb = Workbench::new(RasterCanvas::new(load(input)?), image_name(input));
    let mut drawing = FreeDrawing::new(config)?;
    let settings = BrushSettings {
        mosaic: true,
        ..BrushSettings::default()
    };
    drawing.start(&mut wb, &settings)?;

    let events = std::iter::once((CanvasEventKind::MouseDown, *first))
        .chain(path.iter().map(|point| (CanvasEventKind::MouseMove, *point)))
        .chain(std::iter::once((CanvasEventKind::MouseUp, *last)));

    let mut pending = None;
    for (kind, position) in events {
        let event = wb.canvas.pointer_event(kind, position);
        if let Some(export) = drawing.handle_pointer(&mut wb, &event)? {
            pending = Some(export);
        }
    }

    let pending = pending.context("The mosaic gesture produced no export")?;
    let mut layers = LayerStack::default();
    let outcome = pending.deliver(&mut layers).await?;
    drawing.end(&mut wb);

    match outcome {
        ExportOutcome::Delivered(url) => {
            let blob = layers
                .blob(&url)
                .with_context(|| format!("Layer {url} has no image"))?;
            save(&blob.to_image()?, output)
        }
        ExportOutcome::Discarded => bail!("The mosaic export was discarded"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .init()
        .context("Failed to initialize logger")?;

    let config = cli.command.tool_config();

    match cli.command {
        Command::Crop {
            input,
            output,
            ratio,
            from,
            to,
            square,
            ..
        } => crop(&config, &input, &output, ratio, from.zip(to), square),
        Command::Mosaic { input, output, .. } => {
            let block = config.mosaic_block_size;
            anyhow::ensure!(block > 0, "Block size must be positive");
            let mut image = load(&input)?;
            pixels::mosaic(&mut image, block);
            log::info!("Pixelated {} in {block}px blocks", input.display());
            save(&image, &output)
        }
        Command::Smear {
            input,
            output,
            path,
            ..
        } => smear(&config, &input, &output, &path).await,
    }
}
