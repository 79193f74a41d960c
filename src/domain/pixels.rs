// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/pixels.rs
//
// Block averaging over RGBA buffers: the global mosaic filter and the
// bounds-clamped block used by the live mosaic brush.

use image::{Rgba, RgbaImage};

use super::geometry::{PixelRect, Point, Rect};

/// A square block of the canvas buffer addressed by its center and size.
///
/// Construction clips the block to the buffer, so reads and writes through
/// the resulting rectangle never leave `[0, W) x [0, H)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBlock {
    rect: PixelRect,
}

impl PixelBlock {
    /// Block of `size` x `size` pixels whose top-left corner sits at
    /// `center - size / 2`, clipped to a `width` x `height` buffer.
    ///
    /// Returns `None` when the block lies entirely outside the buffer.
    pub fn centered(center: Point, size: u32, width: u32, height: u32) -> Option<Self> {
        if size == 0 {
            return None;
        }
        let half = f64::from(size) / 2.0;
        let side = f64::from(size);
        Rect::new(center.x - half, center.y - half, side, side)
            .to_pixel_rect(width, height)
            .map(|rect| Self { rect })
    }

    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    pub fn x(&self) -> u32 {
        self.rect.x
    }

    pub fn y(&self) -> u32 {
        self.rect.y
    }
}

/// Replace every `block_size` x `block_size` tile of `image` (clipped at the
/// right and bottom edges) with the average of its R, G, B and A channels.
pub fn mosaic(image: &mut RgbaImage, block_size: u32) {
    let block_size = block_size.max(1);
    let (width, height) = image.dimensions();

    for block_y in (0..height).step_by(block_size as usize) {
        for block_x in (0..width).step_by(block_size as usize) {
            let rect = PixelRect::new(
                block_x,
                block_y,
                block_size.min(width - block_x),
                block_size.min(height - block_y),
            );
            let average = average_rgba(image, rect);
            fill(image, rect, average);
        }
    }
}

/// Average the R, G and B channels of `block` and paint the whole block with
/// that color at full opacity. Existing alpha is ignored.
pub fn average_opaque(block: &mut RgbaImage) {
    let (width, height) = block.dimensions();
    let rect = PixelRect::new(0, 0, width, height);
    if rect.is_empty() {
        return;
    }
    let Rgba([r, g, b, _]) = average_rgba(block, rect);
    fill(block, rect, Rgba([r, g, b, u8::MAX]));
}

/// Floor of the per-channel mean over `rect`.
fn average_rgba(image: &RgbaImage, rect: PixelRect) -> Rgba<u8> {
    let count = rect.area();
    if count == 0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut sums = [0u64; 4];
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            let pixel = image.get_pixel(x, y);
            for (sum, channel) in sums.iter_mut().zip(pixel.0) {
                *sum += u64::from(channel);
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    let channel = |sum: u64| (sum / count) as u8;
    Rgba([
        channel(sums[0]),
        channel(sums[1]),
        channel(sums[2]),
        channel(sums[3]),
    ])
}

fn fill(image: &mut RgbaImage, rect: PixelRect, color: Rgba<u8>) {
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            image.put_pixel(x, y, color);
        }
    }
}
