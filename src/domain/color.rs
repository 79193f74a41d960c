// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/color.rs
//
// RGBA brush colors parsed from CSS-style strings.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, anyhow, bail};

/// Straight (non-premultiplied) RGBA color with a fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in `0.0..=1.0`.
    pub a: f32,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 1.0);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(...)`, `rgba(...)`
    /// or a basic color name.
    pub fn parse(input: &str) -> anyhow::Result<Self> {
        let value = input.trim().to_ascii_lowercase();

        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex).with_context(|| format!("Invalid hex color '{input}'"));
        }

        if let Some(args) = value
            .strip_prefix("rgba(")
            .or_else(|| value.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_functional(args).with_context(|| format!("Invalid color '{input}'"));
        }

        named(&value).ok_or_else(|| anyhow!("Unknown color '{input}'"))
    }

    /// Alpha as a byte (`0..=255`).
    pub fn alpha_u8(&self) -> u8 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let alpha = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
        alpha
    }

    /// Pixel value for an RGBA8 buffer.
    pub fn to_pixel(&self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.alpha_u8()])
    }

    /// CSS `rgba(r, g, b, a)` notation handed to stroke renderers.
    pub fn to_rgba_string(&self) -> String {
        self.to_string()
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Rgba {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_hex(hex: &str) -> anyhow::Result<Rgba> {
    let digits: Vec<u8> = hex
        .chars()
        .map(|c| {
            c.to_digit(16)
                .map(|d| d as u8)
                .ok_or_else(|| anyhow!("'{c}' is not a hex digit"))
        })
        .collect::<anyhow::Result<_>>()?;

    let channels: Vec<u8> = match digits.len() {
        3 | 4 => digits.iter().map(|d| d * 17).collect(),
        6 | 8 => digits.chunks(2).map(|pair| pair[0] * 16 + pair[1]).collect(),
        n => bail!("expected 3, 4, 6 or 8 hex digits, got {n}"),
    };

    let alpha = channels.get(3).map_or(1.0, |a| f32::from(*a) / 255.0);
    Ok(Rgba::new(channels[0], channels[1], channels[2], alpha))
}

fn parse_functional(args: &str) -> anyhow::Result<Rgba> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        bail!("expected 3 or 4 components, got {}", parts.len());
    }

    let channel = |part: &str| -> anyhow::Result<u8> {
        let value = if let Some(percent) = part.strip_suffix('%') {
            percent.parse::<f32>()? * 2.55
        } else {
            part.parse::<f32>()?
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let byte = value.round().clamp(0.0, 255.0) as u8;
        Ok(byte)
    };

    let alpha = match parts.get(3) {
        Some(part) => part.parse::<f32>()?.clamp(0.0, 1.0),
        None => 1.0,
    };

    Ok(Rgba::new(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}

fn named(name: &str) -> Option<Rgba> {
    let color = match name {
        "black" => Rgba::BLACK,
        "white" => Rgba::new(255, 255, 255, 1.0),
        "red" => Rgba::new(255, 0, 0, 1.0),
        "green" => Rgba::new(0, 128, 0, 1.0),
        "blue" => Rgba::new(0, 0, 255, 1.0),
        "yellow" => Rgba::new(255, 255, 0, 1.0),
        "gray" | "grey" => Rgba::new(128, 128, 128, 1.0),
        "transparent" => Rgba::TRANSPARENT,
        _ => return None,
    };
    Some(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_brush_color() {
        let color = Rgba::parse("rgba(0, 0, 0, 0.5)").unwrap();
        assert_eq!(color, Rgba::new(0, 0, 0, 0.5));
        assert_eq!(color.alpha_u8(), 128);
        assert_eq!(color.to_rgba_string(), "rgba(0, 0, 0, 0.5)");
    }

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Rgba::parse("#fff").unwrap(), Rgba::new(255, 255, 255, 1.0));
        assert_eq!(Rgba::parse("#FF8000").unwrap(), Rgba::new(255, 128, 0, 1.0));
        assert_eq!(Rgba::parse("#00000000").unwrap().a, 0.0);
    }

    #[test]
    fn parses_rgb_and_names() {
        assert_eq!(Rgba::parse("rgb(10, 20, 30)").unwrap(), Rgba::new(10, 20, 30, 1.0));
        assert_eq!(Rgba::parse(" Red ").unwrap(), Rgba::new(255, 0, 0, 1.0));
        assert_eq!("transparent".parse::<Rgba>().unwrap(), Rgba::TRANSPARENT);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Rgba::parse("#12").is_err());
        assert!(Rgba::parse("rgba(1, 2)").is_err());
        assert!(Rgba::parse("chartreuse-ish").is_err());
    }
}
