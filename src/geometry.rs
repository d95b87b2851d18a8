//! Geometry mapping between a product side and a render surface.
//!
//! Pure coordinate math, no state: the mockup artwork is contain-fit into
//! the render surface (then magnified by the side's zoom), centered, and
//! the print area follows the same transform. The pixel-to-millimeter
//! ratio derived here is the single source of truth for print-size math.
//!
//! While the artwork's true pixel dimensions are still unknown (images load
//! asynchronously), [`SideGeometry::resolve`] produces a *provisional*
//! mapping from an assumed background of twice the print area. Consumers
//! must re-resolve once real dimensions arrive; the `provisional` flag
//! exists so nothing caches the estimate as final.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::product::{PlacementAnchor, ProductSide};

/// Axis-aligned rectangle in render-surface pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Point at a relative position inside the rect (0,0 = top-left,
    /// 1,1 = bottom-right).
    pub fn relative_point(&self, fx: f32, fy: f32) -> (f32, f32) {
        (self.x + self.width * fx, self.y + self.height * fy)
    }
}

/// Resolved mapping between one product side and one render surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideGeometry {
    /// Contain-fit scale times the side's zoom.
    pub scale: f32,
    /// Top-left of the (centered) artwork in render pixel space.
    pub origin: (f32, f32),
    /// The print area mapped into render pixel space.
    pub print_area_rect: Rect,
    /// Millimeters per render-independent artwork pixel.
    pub px_to_mm: f32,
    /// True when computed from an assumed background size; re-resolve once
    /// the artwork's real dimensions are known.
    pub provisional: bool,
}

/// Millimeters per artwork pixel for a side.
///
/// Falls back to `1.0` (a documented lossy approximation, never NaN or
/// infinity) when the print area or its real-life width is missing or
/// degenerate.
pub fn px_to_mm_ratio(side: &ProductSide) -> f32 {
    let px = side.print_area.width;
    let mm = side.real_life.print_area_width_mm;
    if px <= 0.0 || mm <= 0.0 || !px.is_finite() || !mm.is_finite() {
        warn!(
            side = %side.id,
            print_area_px = px,
            print_area_mm = mm,
            "degenerate print-area dimensions, falling back to 1px = 1mm"
        );
        return 1.0;
    }
    mm / px
}

impl SideGeometry {
    /// Map a side onto a `render_width` × `render_height` surface.
    ///
    /// `background` is the artwork's native pixel size once known. With
    /// `None`, the mapping is estimated from an assumed background of twice
    /// the print area and flagged provisional.
    pub fn resolve(
        side: &ProductSide,
        render_width: f32,
        render_height: f32,
        background: Option<(u32, u32)>,
    ) -> SideGeometry {
        let (bg_w, bg_h, provisional) = match background {
            Some((w, h)) if w > 0 && h > 0 => (w as f32, h as f32, false),
            _ => (
                side.print_area.width * 2.0,
                side.print_area.height * 2.0,
                true,
            ),
        };

        let scale = (render_width / bg_w).min(render_height / bg_h) * side.zoom_scale;
        let origin = (
            render_width / 2.0 - bg_w * scale / 2.0,
            render_height / 2.0 - bg_h * scale / 2.0,
        );
        let print_area_rect = Rect {
            x: origin.0 + side.print_area.x * scale,
            y: origin.1 + side.print_area.y * scale,
            width: side.print_area.width * scale,
            height: side.print_area.height * scale,
        };

        SideGeometry {
            scale,
            origin,
            print_area_rect,
            px_to_mm: px_to_mm_ratio(side),
            provisional,
        }
    }

    /// Forward mapping: canvas point for a named placement preset.
    pub fn anchor_point(&self, anchor: PlacementAnchor) -> (f32, f32) {
        let (fx, fy) = match anchor {
            PlacementAnchor::LeftChest => (0.15, 0.15),
            PlacementAnchor::RightChest => (0.65, 0.15),
            PlacementAnchor::Center => (0.5, 0.5),
        };
        self.print_area_rect.relative_point(fx, fy)
    }

    /// Inverse mapping: normalize a canvas point against the print area,
    /// clamped to `[0, 1]²` at the boundary.
    ///
    /// The normalized pair persists a placement independently of the exact
    /// pixel rect it was captured against; scale it back through the print
    /// area (see [`SideGeometry::to_real_units`]) before storage.
    pub fn normalize(&self, point: (f32, f32)) -> (f32, f32) {
        let r = self.print_area_rect;
        let nx = if r.width > 0.0 {
            ((point.0 - r.x) / r.width).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let ny = if r.height > 0.0 {
            ((point.1 - r.y) / r.height).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (nx, ny)
    }

    /// Scale a normalized placement into real-world millimeters.
    pub fn to_real_units(&self, side: &ProductSide, normalized: (f32, f32)) -> (f32, f32) {
        (
            normalized.0 * side.print_area.width * self.px_to_mm,
            normalized.1 * side.print_area.height * self.px_to_mm,
        )
    }

    /// Seed rect for a dropped-in logo, in render pixel space.
    ///
    /// The side's placement holds print-area-relative fractions: the
    /// anchor point shifted by `(x, y)` becomes the rect's center, and
    /// `width`/`height` scale against the print area.
    pub fn default_logo_rect(&self, side: &ProductSide) -> Option<Rect> {
        let placement = side.default_logo_placement.as_ref()?;
        let (ax, ay) = self.anchor_point(placement.anchor);
        let r = self.print_area_rect;
        let w = placement.width * r.width;
        let h = placement.height * r.height;
        Some(Rect {
            x: ax + placement.x * r.width - w / 2.0,
            y: ay + placement.y * r.height - h / 2.0,
            width: w,
            height: h,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{PrintArea, RealLifeDimensions, SideVisual};

    fn side(print_area_width_mm: f32) -> ProductSide {
        ProductSide {
            id: "front".into(),
            name: "Front".into(),
            visual: SideVisual::Single {
                image_url: "https://assets.example/front.png".into(),
            },
            print_area: PrintArea {
                x: 50.0,
                y: 50.0,
                width: 200.0,
                height: 200.0,
            },
            real_life: RealLifeDimensions {
                product_width_mm: 520.0,
                print_area_width_mm,
                print_area_height_mm: 300.0,
            },
            zoom_scale: 1.0,
            default_logo_placement: None,
        }
    }

    #[test]
    fn test_px_to_mm_ratio() {
        // 300mm over 200px = 1.5 mm/px
        assert!((px_to_mm_ratio(&side(300.0)) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_px_to_mm_ratio_fallback() {
        assert_eq!(px_to_mm_ratio(&side(0.0)), 1.0);
        assert_eq!(px_to_mm_ratio(&side(-5.0)), 1.0);
        assert_eq!(px_to_mm_ratio(&side(f32::NAN)), 1.0);
    }

    #[test]
    fn test_contain_fit_centers_background() {
        let g = SideGeometry::resolve(&side(300.0), 800.0, 600.0, Some((400, 400)));
        // Contain fit: scale = min(800/400, 600/400) = 1.5
        assert!((g.scale - 1.5).abs() < 1e-6);
        // Centered horizontally: (800 - 400*1.5)/2 = 100
        assert!((g.origin.0 - 100.0).abs() < 1e-6);
        assert!((g.origin.1 - 0.0).abs() < 1e-6);
        // Print area follows the same transform
        assert!((g.print_area_rect.x - (100.0 + 50.0 * 1.5)).abs() < 1e-6);
        assert!((g.print_area_rect.width - 300.0).abs() < 1e-6);
        assert!(!g.provisional);
    }

    #[test]
    fn test_zoom_magnifies_after_fit() {
        let mut s = side(300.0);
        s.zoom_scale = 2.0;
        let g = SideGeometry::resolve(&s, 800.0, 600.0, Some((400, 400)));
        assert!((g.scale - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_provisional_estimate_without_background() {
        let g = SideGeometry::resolve(&side(300.0), 800.0, 800.0, None);
        assert!(g.provisional);
        // Assumed background = print area * 2 = 400x400
        assert!((g.scale - 2.0).abs() < 1e-6);
        let g2 = SideGeometry::resolve(&side(300.0), 800.0, 800.0, Some((0, 10)));
        assert!(g2.provisional);
    }

    #[test]
    fn test_anchor_points() {
        let g = SideGeometry::resolve(&side(300.0), 400.0, 400.0, Some((400, 400)));
        let r = g.print_area_rect;
        let (cx, cy) = g.anchor_point(PlacementAnchor::Center);
        assert!((cx - (r.x + r.width / 2.0)).abs() < 1e-6);
        assert!((cy - (r.y + r.height / 2.0)).abs() < 1e-6);
        let (lx, ly) = g.anchor_point(PlacementAnchor::LeftChest);
        assert!((lx - (r.x + r.width * 0.15)).abs() < 1e-6);
        assert!((ly - (r.y + r.height * 0.15)).abs() < 1e-6);
        let (rx, _) = g.anchor_point(PlacementAnchor::RightChest);
        assert!((rx - (r.x + r.width * 0.65)).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_clamps_at_boundary() {
        let g = SideGeometry::resolve(&side(300.0), 400.0, 400.0, Some((400, 400)));
        let r = g.print_area_rect;
        assert_eq!(g.normalize((r.x - 100.0, r.y - 100.0)), (0.0, 0.0));
        assert_eq!(
            g.normalize((r.x + r.width + 50.0, r.y + r.height + 50.0)),
            (1.0, 1.0)
        );
        let (nx, ny) = g.normalize((r.x + r.width / 2.0, r.y + r.height / 4.0));
        assert!((nx - 0.5).abs() < 1e-6);
        assert!((ny - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_round_trip_through_real_units() {
        let s = side(300.0);
        let g = SideGeometry::resolve(&s, 400.0, 400.0, Some((400, 400)));
        let point = g.anchor_point(PlacementAnchor::RightChest);
        let norm = g.normalize(point);
        let (mm_x, mm_y) = g.to_real_units(&s, norm);
        // 0.65 * 300mm, 0.15 * 300mm
        assert!((mm_x - 195.0).abs() < 1e-3);
        assert!((mm_y - 45.0).abs() < 1e-3);
    }

    #[test]
    fn test_default_logo_rect_seeding() {
        use crate::product::{LogoPlacement, PlacementAnchor};
        let mut s = side(300.0);
        assert!(
            SideGeometry::resolve(&s, 400.0, 400.0, Some((400, 400)))
                .default_logo_rect(&s)
                .is_none()
        );
        s.default_logo_placement = Some(LogoPlacement {
            x: 0.0,
            y: 0.0,
            width: 0.2,
            height: 0.1,
            anchor: PlacementAnchor::LeftChest,
        });
        let g = SideGeometry::resolve(&s, 400.0, 400.0, Some((400, 400)));
        let rect = g.default_logo_rect(&s).unwrap();
        let (ax, ay) = g.anchor_point(PlacementAnchor::LeftChest);
        assert!((rect.x + rect.width / 2.0 - ax).abs() < 1e-4);
        assert!((rect.y + rect.height / 2.0 - ay).abs() < 1e-4);
        assert!((rect.width - 0.2 * g.print_area_rect.width).abs() < 1e-4);
    }

    #[test]
    fn test_scale_invariance_of_real_units() {
        // The same normalized placement maps to the same millimeters at any
        // surface size.
        let s = side(300.0);
        let g1 = SideGeometry::resolve(&s, 400.0, 400.0, Some((400, 400)));
        let g2 = SideGeometry::resolve(&s, 1237.0, 911.0, Some((400, 400)));
        let a = g1.to_real_units(&s, (0.3, 0.7));
        let b = g2.to_real_units(&s, (0.3, 0.7));
        assert!((a.0 - b.0).abs() < 1e-4);
        assert!((a.1 - b.1).abs() < 1e-4);
    }
}
