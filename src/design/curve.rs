//! Curved-text footprint math and text measurement.
//!
//! Curved text is laid out along a circular arc. The curve intensity maps
//! to the arc's central angle: `0` is flat, `±1` bends the baseline into a
//! half circle (sign picks bow-up vs bow-down, which does not change the
//! footprint). Bending shortens the horizontal extent to the arc's chord
//! and grows the vertical extent by the arc's sagitta, so the effective
//! bounding box must be recomputed whenever content, size or curvature
//! changes: stale footprints would make saved print dimensions diverge
//! from the rendered result.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use serde::{Deserialize, Serialize};

/// Maximum central angle at `|intensity| == 1`: a half circle.
const MAX_ARC_RADIANS: f32 = std::f32::consts::PI;

/// Below this angle the arc is indistinguishable from a straight line.
const FLAT_EPSILON: f32 = 1e-3;

/// Effective unscaled bounding box of a curved-text object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Footprint {
    pub width: f32,
    pub height: f32,
}

/// Arc parameters for a baseline of `length` bent by `intensity`.
///
/// Returns `None` when the curve is effectively flat.
pub fn arc_params(length: f32, intensity: f32) -> Option<(f32, f32)> {
    let theta = intensity.clamp(-1.0, 1.0).abs() * MAX_ARC_RADIANS;
    if theta < FLAT_EPSILON || length <= 0.0 {
        return None;
    }
    let radius = length / theta;
    Some((radius, theta))
}

/// Compute the effective bounding box of text with base dimensions
/// `width` × `height` bent by `intensity`.
pub fn footprint(width: f32, height: f32, intensity: f32) -> Footprint {
    match arc_params(width, intensity) {
        None => Footprint { width, height },
        Some((radius, theta)) => {
            let half = theta / 2.0;
            let chord = 2.0 * radius * half.sin();
            let sagitta = radius * (1.0 - half.cos());
            Footprint {
                width: chord,
                height: height + sagitta,
            }
        }
    }
}

/// Measure the advance width of a line of text at `font_size` pixels.
///
/// With a font, sums real glyph advances. Without one, falls back to the
/// half-em-per-character approximation (a lossy estimate, good enough for
/// seeding a new object before the host's font is available).
pub fn measure_text_width(content: &str, font_size: f32, font: Option<&FontArc>) -> f32 {
    match font {
        Some(f) => {
            let scaled = f.as_scaled(PxScale::from(font_size));
            content
                .chars()
                .map(|c| scaled.h_advance(f.glyph_id(c)))
                .sum()
        }
        None => content.chars().count() as f32 * font_size * 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_at_zero_intensity() {
        let fp = footprint(90.0, 24.0, 0.0);
        assert_eq!(fp, Footprint { width: 90.0, height: 24.0 });
        assert!(arc_params(90.0, 0.0).is_none());
    }

    #[test]
    fn test_half_circle_footprint() {
        // theta = pi: chord = 2L/pi, sagitta = L/pi
        let fp = footprint(100.0, 20.0, 1.0);
        assert!((fp.width - 200.0 / std::f32::consts::PI).abs() < 1e-3);
        assert!((fp.height - (20.0 + 100.0 / std::f32::consts::PI)).abs() < 1e-3);
    }

    #[test]
    fn test_sign_does_not_change_footprint() {
        assert_eq!(footprint(80.0, 16.0, 0.6), footprint(80.0, 16.0, -0.6));
    }

    #[test]
    fn test_intensity_clamped() {
        assert_eq!(footprint(80.0, 16.0, 5.0), footprint(80.0, 16.0, 1.0));
    }

    #[test]
    fn test_bending_narrows_and_raises() {
        let flat = footprint(100.0, 20.0, 0.0);
        let bent = footprint(100.0, 20.0, 0.5);
        let more = footprint(100.0, 20.0, 1.0);
        assert!(bent.width < flat.width);
        assert!(more.width < bent.width);
        assert!(bent.height > flat.height);
        assert!(more.height > bent.height);
    }

    #[test]
    fn test_tiny_intensity_is_flat() {
        let fp = footprint(100.0, 20.0, 1e-5);
        assert_eq!(fp, Footprint { width: 100.0, height: 20.0 });
    }

    #[test]
    fn test_measure_without_font_uses_heuristic() {
        let w = measure_text_width("HELLO", 24.0, None);
        assert!((w - 5.0 * 12.0).abs() < 1e-6);
    }
}
