//! Color parsing and tinting primitives.
//!
//! Product layers are recolored with a multiplicative tint: white pixels in
//! the source artwork take on the tint color exactly, darker pixels darken
//! it, and alpha is untouched. The same primitive colors the single-image
//! product background.

use image::{Rgba, RgbaImage};

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    /// Parse a `#rrggbb` or `rrggbb` hex string. Also accepts the short
    /// `#rgb` form.
    pub fn parse(hex: &str) -> Option<Rgb> {
        let hex = hex.trim().trim_start_matches('#');
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Rgb { r, g, b })
            }
            3 => {
                let d = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok();
                let (r, g, b) = (d(0)?, d(1)?, d(2)?);
                Some(Rgb {
                    r: r * 17,
                    g: g * 17,
                    b: b * 17,
                })
            }
            _ => None,
        }
    }

    /// Parse with a white fallback for missing or malformed values.
    pub fn parse_or_white(hex: Option<&str>) -> Rgb {
        hex.and_then(Rgb::parse).unwrap_or(Rgb::WHITE)
    }

    /// Format as a lowercase `#rrggbb` string.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Multiply blend of two channel values in [0, 255].
#[inline]
pub fn multiply_channel(a: u8, b: u8) -> u8 {
    ((a as u16 * b as u16 + 127) / 255) as u8
}

/// Multiply-tint a single pixel. Alpha passes through.
#[inline]
pub fn tint_pixel(px: Rgba<u8>, tint: Rgb) -> Rgba<u8> {
    Rgba([
        multiply_channel(px[0], tint.r),
        multiply_channel(px[1], tint.g),
        multiply_channel(px[2], tint.b),
        px[3],
    ])
}

/// Produce a tinted copy of an image.
///
/// Always applied to the pristine source so repeated recoloring never
/// accumulates: tint(tint(img, a), b) is never computed, only tint(img, b).
pub fn tint_image(source: &RgbaImage, tint: Rgb) -> RgbaImage {
    if tint == Rgb::WHITE {
        return source.clone();
    }
    let mut out = source.clone();
    for px in out.pixels_mut() {
        *px = tint_pixel(*px, tint);
    }
    out
}
