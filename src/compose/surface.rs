//! The render surface: stacked mockup layers plus design-object overlay.
//!
//! ```text
//! ProductSide ──► loaded layers ──► restack by z_index ──► tint ──► mockup
//!                                                                    │
//! CanvasState objects ──► per-object tiles ──► rotated blits ──► composite
//! ```
//!
//! The surface owns decoded layer images for one compositor session. Each
//! layer keeps its pristine decode; recoloring always tints the pristine
//! pixels, so repeated color changes never accumulate. Rendering is
//! bottom-to-top: layers in ascending `z_index`, then design objects in
//! list order, so layers never occlude placed designs.

use std::collections::HashMap;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{imageops, DynamicImage, Rgba, RgbaImage};
use tracing::debug;

use crate::color::{tint_image, Rgb};
use crate::design::{curve, DesignObject, ShapeKind};
use crate::error::MaquetaError;
use crate::geometry::SideGeometry;

/// One decoded, recolorable layer on the surface.
pub struct LoadedLayer {
    pub id: String,
    pub z_index: i32,
    pristine: RgbaImage,
    tinted: Option<RgbaImage>,
    tint: Rgb,
}

impl LoadedLayer {
    pub fn new(id: &str, z_index: i32, image: DynamicImage) -> Self {
        Self {
            id: id.to_string(),
            z_index,
            pristine: image.to_rgba8(),
            tinted: None,
            tint: Rgb::WHITE,
        }
    }

    /// Pixel dimensions of the decoded layer.
    pub fn dimensions(&self) -> (u32, u32) {
        self.pristine.dimensions()
    }

    pub fn tint(&self) -> Rgb {
        self.tint
    }

    /// Recolor from the pristine decode. Setting the same tint again is a
    /// no-op; setting white drops the tinted copy entirely.
    pub fn set_tint(&mut self, tint: Rgb) {
        if tint == self.tint {
            return;
        }
        self.tint = tint;
        self.tinted = if tint == Rgb::WHITE {
            None
        } else {
            Some(tint_image(&self.pristine, tint))
        };
    }

    /// The image as currently colored.
    fn visible(&self) -> &RgbaImage {
        self.tinted.as_ref().unwrap_or(&self.pristine)
    }
}

/// Stacked layers for one render surface.
pub struct Surface {
    render_width: u32,
    render_height: u32,
    layers: Vec<LoadedLayer>,
    /// Authoritative artwork dimensions: the first successfully loaded
    /// layer's pixel size.
    background_px: Option<(u32, u32)>,
}

impl Surface {
    pub fn new(render_width: u32, render_height: u32) -> Self {
        Self {
            render_width,
            render_height,
            layers: Vec::new(),
            background_px: None,
        }
    }

    pub fn render_size(&self) -> (u32, u32) {
        (self.render_width, self.render_height)
    }

    pub fn background_px(&self) -> Option<(u32, u32)> {
        self.background_px
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Add a loaded layer. The first one fixes the authoritative artwork
    /// dimensions for all placement math on this side.
    pub fn push_layer(&mut self, layer: LoadedLayer) {
        if self.background_px.is_none() {
            self.background_px = Some(layer.dimensions());
        }
        self.layers.push(layer);
    }

    /// Re-order the stack strictly by ascending `z_index`, keeping
    /// insertion order for equal indices. Final visual stacking is
    /// z ascending bottom→top regardless of load completion order.
    pub fn restack(&mut self) {
        self.layers.sort_by_key(|l| l.z_index);
    }

    /// Layer ids in current bottom→top order.
    pub fn stacking_order(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }

    pub fn layer_mut(&mut self, id: &str) -> Option<&mut LoadedLayer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn layers_mut(&mut self) -> impl Iterator<Item = &mut LoadedLayer> {
        self.layers.iter_mut()
    }

    /// Render the colored mockup (layers only) into render pixel space.
    pub fn render_mockup(&self, geometry: &SideGeometry) -> RgbaImage {
        let mut canvas = RgbaImage::from_pixel(
            self.render_width,
            self.render_height,
            Rgba([255, 255, 255, 255]),
        );
        for layer in &self.layers {
            let (w, h) = layer.dimensions();
            let scaled_w = ((w as f32) * geometry.scale).round().max(1.0) as u32;
            let scaled_h = ((h as f32) * geometry.scale).round().max(1.0) as u32;
            let scaled = imageops::resize(
                layer.visible(),
                scaled_w,
                scaled_h,
                imageops::FilterType::Triangle,
            );
            imageops::overlay(
                &mut canvas,
                &scaled,
                geometry.origin.0.round() as i64,
                geometry.origin.1.round() as i64,
            );
        }
        canvas
    }

    /// Render the full composite: mockup, then design objects in list
    /// order (front-most last).
    ///
    /// `object_images` maps image-object URLs to their decoded artwork;
    /// objects whose artwork is absent are skipped. Text needs `font`;
    /// without one, text objects are skipped with a debug log.
    pub fn render_composite(
        &self,
        geometry: &SideGeometry,
        objects: &[DesignObject],
        object_images: &HashMap<String, DynamicImage>,
        font: Option<&FontArc>,
    ) -> RgbaImage {
        let mut canvas = self.render_mockup(geometry);
        for obj in objects {
            draw_object(&mut canvas, obj, object_images, font);
        }
        canvas
    }

    /// PNG-encode a rendered composite, for thumbnails and previews.
    pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, MaquetaError> {
        let mut out = std::io::Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(image.clone())
            .write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| MaquetaError::Image(format!("PNG encode failed: {}", e)))?;
        Ok(out.into_inner())
    }
}

// ============================================================================
// OBJECT DRAWING
// ============================================================================

fn draw_object(
    canvas: &mut RgbaImage,
    obj: &DesignObject,
    object_images: &HashMap<String, DynamicImage>,
    font: Option<&FontArc>,
) {
    let Some(tile) = render_object_tile(obj, object_images, font) else {
        return;
    };
    let c = obj.common();
    let (w, h) = obj.scaled_size();
    let center = (c.left + w / 2.0, c.top + h / 2.0);
    blit_rotated(canvas, &tile, center, c.angle);
}

/// Rasterize one object into an axis-aligned tile at its scaled size.
fn render_object_tile(
    obj: &DesignObject,
    object_images: &HashMap<String, DynamicImage>,
    font: Option<&FontArc>,
) -> Option<RgbaImage> {
    let (w, h) = obj.scaled_size();
    if w < 1.0 || h < 1.0 {
        return None;
    }
    let (tw, th) = (w.round() as u32, h.round() as u32);

    match obj {
        DesignObject::Image { url, .. } => {
            let Some(source) = object_images.get(url) else {
                debug!(url = %url, "image object artwork not loaded, skipping");
                return None;
            };
            Some(imageops::resize(
                &source.to_rgba8(),
                tw,
                th,
                imageops::FilterType::Triangle,
            ))
        }
        DesignObject::Shape {
            kind,
            fill,
            stroke,
            stroke_width,
            ..
        } => {
            let fill = Rgb::parse_or_white(Some(fill.as_str()));
            let stroke = stroke.as_deref().map(|s| (Rgb::parse_or_white(Some(s)), *stroke_width));
            Some(render_shape_tile(*kind, tw, th, fill, stroke))
        }
        DesignObject::Text { content, style, .. } => {
            let font = require_font(font)?;
            let color = Rgb::parse_or_white(Some(style.fill.as_str()));
            let mut tile = RgbaImage::new(tw, th);
            let scale_y = obj.common().scale_y;
            draw_text(&mut tile, content, style.font_size * scale_y, color, font, 0.0, 0.0);
            Some(tile)
        }
        DesignObject::CurvedText {
            content,
            style,
            curve_intensity,
            ..
        } => {
            let font = require_font(font)?;
            let color = Rgb::parse_or_white(Some(style.fill.as_str()));
            let scale_y = obj.common().scale_y;
            Some(render_curved_text_tile(
                content,
                style.font_size * scale_y,
                *curve_intensity,
                color,
                font,
                (tw, th),
            ))
        }
    }
}

fn require_font(font: Option<&FontArc>) -> Option<&FontArc> {
    if font.is_none() {
        debug!("no font supplied, skipping text raster");
    }
    font
}

fn render_shape_tile(
    kind: ShapeKind,
    width: u32,
    height: u32,
    fill: Rgb,
    stroke: Option<(Rgb, f32)>,
) -> RgbaImage {
    let mut tile = RgbaImage::new(width, height);
    let (w, h) = (width as f32, height as f32);
    let stroke_px = stroke.map(|(_, sw)| sw.max(1.0)).unwrap_or(0.0);

    for y in 0..height {
        for x in 0..width {
            let (fx, fy) = (x as f32 + 0.5, y as f32 + 0.5);
            let inside = match kind {
                ShapeKind::Rect => true,
                ShapeKind::Ellipse => {
                    let nx = (fx - w / 2.0) / (w / 2.0);
                    let ny = (fy - h / 2.0) / (h / 2.0);
                    nx * nx + ny * ny <= 1.0
                }
            };
            if !inside {
                continue;
            }
            let on_border = match kind {
                ShapeKind::Rect => {
                    fx < stroke_px || fy < stroke_px || fx > w - stroke_px || fy > h - stroke_px
                }
                ShapeKind::Ellipse => {
                    let nx = (fx - w / 2.0) / (w / 2.0 - stroke_px).max(1.0);
                    let ny = (fy - h / 2.0) / (h / 2.0 - stroke_px).max(1.0);
                    nx * nx + ny * ny > 1.0
                }
            };
            let color = match (&stroke, on_border) {
                (Some((stroke_color, _)), true) => *stroke_color,
                _ => fill,
            };
            tile.put_pixel(x, y, Rgba([color.r, color.g, color.b, 255]));
        }
    }
    tile
}

/// Raster a straight line of text into `tile` at the given offset.
fn draw_text(
    tile: &mut RgbaImage,
    content: &str,
    font_size: f32,
    color: Rgb,
    font: &FontArc,
    offset_x: f32,
    offset_y: f32,
) {
    let scale = PxScale::from(font_size);
    let scaled = font.as_scaled(scale);
    let ascent = scaled.ascent();
    let mut caret = offset_x;

    for ch in content.chars() {
        let glyph_id = font.glyph_id(ch);
        let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(caret, offset_y + ascent));
        caret += scaled.h_advance(glyph_id);
        let Some(outline) = font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outline.px_bounds();
        outline.draw(|gx, gy, coverage| {
            let px = bounds.min.x as i32 + gx as i32;
            let py = bounds.min.y as i32 + gy as i32;
            if px < 0 || py < 0 || px >= tile.width() as i32 || py >= tile.height() as i32 {
                return;
            }
            let alpha = (coverage * 255.0) as u8;
            let dst = tile.get_pixel_mut(px as u32, py as u32);
            *dst = alpha_over(Rgba([color.r, color.g, color.b, alpha]), *dst);
        });
    }
}

/// Raster text bent along an arc into a tile of the curved footprint size.
///
/// Each glyph is drawn into its own mini-tile, then blitted at its arc
/// position rotated to the local tangent.
fn render_curved_text_tile(
    content: &str,
    font_size: f32,
    intensity: f32,
    color: Rgb,
    font: &FontArc,
    (tile_w, tile_h): (u32, u32),
) -> RgbaImage {
    let mut tile = RgbaImage::new(tile_w, tile_h);
    let scale = PxScale::from(font_size);
    let scaled = font.as_scaled(scale);
    let line_height = scaled.ascent() - scaled.descent();
    let total_width = curve::measure_text_width(content, font_size, Some(font));

    let Some((radius, theta)) = curve::arc_params(total_width, intensity) else {
        draw_text(&mut tile, content, font_size, color, font, 0.0, 0.0);
        return tile;
    };

    let bow_up = intensity > 0.0;
    // Circle center in tile space: below the arc for bow-up text, above
    // for bow-down.
    let center_x = tile_w as f32 / 2.0;
    let center_y = if bow_up {
        line_height / 2.0 + radius
    } else {
        tile_h as f32 - line_height / 2.0 - radius
    };

    let mut arc_pos = 0.0;
    for ch in content.chars() {
        let advance = scaled.h_advance(font.glyph_id(ch));
        let t = (arc_pos + advance / 2.0) / total_width - 0.5;
        arc_pos += advance;
        let phi = t * theta;

        let glyph_w = advance.ceil().max(1.0) as u32;
        let glyph_h = line_height.ceil().max(1.0) as u32;
        let mut glyph_tile = RgbaImage::new(glyph_w, glyph_h);
        let mut s = String::new();
        s.push(ch);
        draw_text(&mut glyph_tile, &s, font_size, color, font, 0.0, 0.0);

        let (gx, gy, angle) = if bow_up {
            (
                center_x + radius * phi.sin(),
                center_y - radius * phi.cos(),
                phi.to_degrees(),
            )
        } else {
            (
                center_x + radius * phi.sin(),
                center_y + radius * phi.cos(),
                -phi.to_degrees(),
            )
        };
        blit_rotated(&mut tile, &glyph_tile, (gx, gy), angle);
    }
    tile
}

/// Source-over alpha blend of `src` onto `dst`.
#[inline]
fn alpha_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as u32;
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let inv = 255 - sa;
    let blend = |s: u8, d: u8| ((s as u32 * sa + d as u32 * inv + 127) / 255) as u8;
    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (sa + (dst[3] as u32 * inv + 127) / 255).min(255) as u8,
    ])
}

/// Blit `tile` onto `canvas` centered at `center`, rotated clockwise by
/// `angle_deg`. Nearest-neighbor sampling through the inverse transform.
fn blit_rotated(canvas: &mut RgbaImage, tile: &RgbaImage, center: (f32, f32), angle_deg: f32) {
    let (tw, th) = (tile.width() as f32, tile.height() as f32);
    let rad = angle_deg.to_radians();
    let (sin, cos) = rad.sin_cos();

    // Bounding box of the rotated tile on the canvas
    let half_w = (tw * cos.abs() + th * sin.abs()) / 2.0;
    let half_h = (tw * sin.abs() + th * cos.abs()) / 2.0;
    let x0 = ((center.0 - half_w).floor().max(0.0)) as u32;
    let y0 = ((center.1 - half_h).floor().max(0.0)) as u32;
    let x1 = ((center.0 + half_w).ceil() as i64).clamp(0, canvas.width() as i64) as u32;
    let y1 = ((center.1 + half_h).ceil() as i64).clamp(0, canvas.height() as i64) as u32;

    for y in y0..y1 {
        for x in x0..x1 {
            // Inverse-rotate the canvas point into tile space
            let dx = x as f32 + 0.5 - center.0;
            let dy = y as f32 + 0.5 - center.1;
            let sx = dx * cos + dy * sin + tw / 2.0;
            let sy = -dx * sin + dy * cos + th / 2.0;
            if sx < 0.0 || sy < 0.0 || sx >= tw || sy >= th {
                continue;
            }
            let src = *tile.get_pixel(sx as u32, sy as u32);
            if src[3] == 0 {
                continue;
            }
            let dst = canvas.get_pixel_mut(x, y);
            *dst = alpha_over(src, *dst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{PrintArea, ProductSide, RealLifeDimensions, SideVisual};

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(rgba)))
    }

    fn test_geometry() -> SideGeometry {
        let side = ProductSide {
            id: "front".into(),
            name: "Front".into(),
            visual: SideVisual::Single {
                image_url: String::new(),
            },
            print_area: PrintArea {
                x: 0.0,
                y: 0.0,
                width: 8.0,
                height: 8.0,
            },
            real_life: RealLifeDimensions::default(),
            zoom_scale: 1.0,
            default_logo_placement: None,
        };
        SideGeometry::resolve(&side, 16.0, 16.0, Some((16, 16)))
    }

    #[test]
    fn test_restack_orders_by_z_index() {
        let mut surface = Surface::new(16, 16);
        surface.push_layer(LoadedLayer::new("trim", 2, solid(16, 16, [255, 0, 0, 255])));
        surface.push_layer(LoadedLayer::new("body", 0, solid(16, 16, [0, 255, 0, 255])));
        surface.push_layer(LoadedLayer::new("collar", 1, solid(16, 16, [0, 0, 255, 255])));
        surface.restack();
        assert_eq!(surface.stacking_order(), vec!["body", "collar", "trim"]);
    }

    #[test]
    fn test_first_layer_fixes_background_dimensions() {
        let mut surface = Surface::new(16, 16);
        assert_eq!(surface.background_px(), None);
        surface.push_layer(LoadedLayer::new("a", 0, solid(32, 24, [0, 0, 0, 255])));
        surface.push_layer(LoadedLayer::new("b", 1, solid(64, 48, [0, 0, 0, 255])));
        assert_eq!(surface.background_px(), Some((32, 24)));
    }

    #[test]
    fn test_tint_is_recomputed_from_pristine() {
        let mut layer = LoadedLayer::new("a", 0, solid(2, 2, [200, 200, 200, 255]));
        layer.set_tint(Rgb { r: 0, g: 0, b: 0 });
        layer.set_tint(Rgb { r: 255, g: 0, b: 0 });
        // If tints accumulated, the black pass would have zeroed everything.
        let px = layer.visible().get_pixel(0, 0);
        assert_eq!(px[0], 200);
        assert_eq!(px[1], 0);
    }

    #[test]
    fn test_mockup_stacks_top_layer_over_bottom() {
        let mut surface = Surface::new(16, 16);
        surface.push_layer(LoadedLayer::new("top", 1, solid(16, 16, [255, 0, 0, 255])));
        surface.push_layer(LoadedLayer::new("bottom", 0, solid(16, 16, [0, 255, 0, 255])));
        surface.restack();
        let out = surface.render_mockup(&test_geometry());
        let px = out.get_pixel(8, 8);
        // Red layer has the higher z index and must win
        assert_eq!((px[0], px[1]), (255, 0));
    }

    #[test]
    fn test_composite_draws_shape_over_layers() {
        let mut surface = Surface::new(16, 16);
        surface.push_layer(LoadedLayer::new("body", 0, solid(16, 16, [0, 255, 0, 255])));
        let mut shape = DesignObject::shape(ShapeKind::Rect, 4.0, 4.0, 8.0, 8.0);
        if let DesignObject::Shape { fill, .. } = &mut shape {
            *fill = "#0000ff".into();
        }
        let out = surface.render_composite(
            &test_geometry(),
            &[shape],
            &HashMap::new(),
            None,
        );
        let px = out.get_pixel(8, 8);
        assert_eq!((px[0], px[1], px[2]), (0, 0, 255));
        // Outside the shape the layer shows through
        let px = out.get_pixel(1, 1);
        assert_eq!((px[0], px[1]), (0, 255));
    }

    #[test]
    fn test_missing_image_artwork_is_skipped() {
        let surface = Surface::new(16, 16);
        let obj = DesignObject::image("https://x/missing.png", 0.0, 0.0, 8.0, 8.0);
        // Must not panic; object is simply absent from the composite.
        let out = surface.render_composite(&test_geometry(), &[obj], &HashMap::new(), None);
        assert_eq!(out.dimensions(), (16, 16));
    }

    #[test]
    fn test_encode_png_round_trips() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        let png = Surface::encode_png(&img).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.to_rgba8(), img);
    }
}
