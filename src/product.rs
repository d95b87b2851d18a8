//! Catalog-facing product configuration types.
//!
//! A product is customized one *side* at a time (front, back, sleeve…).
//! Each side describes its mockup artwork (a single image, or a stack of
//! recolorable layers) plus the print-area rectangle in the artwork's
//! native pixel space and the real-life dimensions that anchor all
//! pixel-to-millimeter math.
//!
//! These types are plain data: they are read from the surrounding catalog
//! service and never mutated by this crate.

use serde::{Deserialize, Serialize};

/// The sub-rectangle of a side's artwork eligible for design placement,
/// in the artwork's native pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintArea {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Real-world measurements of a product side.
///
/// `print_area_width_mm` paired with [`PrintArea::width`] defines the
/// pixel-to-millimeter ratio used for all print-size math.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RealLifeDimensions {
    #[serde(default)]
    pub product_width_mm: f32,
    #[serde(default)]
    pub print_area_width_mm: f32,
    #[serde(default)]
    pub print_area_height_mm: f32,
}

/// One selectable color for a product layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorOption {
    /// `#rrggbb` tint applied to the layer artwork.
    pub hex: String,
    /// Manufacturer color code (e.g. "PMS 186C").
    pub color_code: String,
}

/// One recolorable visual sub-asset of a layered side.
///
/// Layers stack by ascending `z_index`, bottom to top. All layer images of
/// a side share the same underlying pixel dimensions; the first
/// successfully loaded layer's dimensions are authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLayer {
    pub id: String,
    pub name: String,
    pub image_url: String,
    #[serde(default)]
    pub color_options: Vec<ColorOption>,
    #[serde(default)]
    pub z_index: i32,
}

impl ProductLayer {
    /// The layer's default tint: its first declared color option.
    pub fn default_hex(&self) -> Option<&str> {
        self.color_options.first().map(|c| c.hex.as_str())
    }
}

/// How a side is drawn: one flat image, or a recolorable layer stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SideVisual {
    /// A single mockup image, recolored as a whole by the product color.
    Single { image_url: String },
    /// A stack of independently recolorable layers.
    Layered { layers: Vec<ProductLayer> },
}

/// Named placement preset inside the print area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementAnchor {
    LeftChest,
    RightChest,
    Center,
}

/// Default placement for a dropped-in logo, in print-area-relative units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogoPlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub anchor: PlacementAnchor,
}

fn default_zoom() -> f32 {
    1.0
}

/// One printable side of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSide {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub visual: SideVisual,
    pub print_area: PrintArea,
    pub real_life: RealLifeDimensions,
    /// Render-time magnification applied after the contain-fit scale.
    #[serde(default = "default_zoom")]
    pub zoom_scale: f32,
    #[serde(default)]
    pub default_logo_placement: Option<LogoPlacement>,
}

/// A customizable product as the catalog service presents it.
///
/// Only the fields this core reads; everything else the catalog carries
/// (pricing class, stock, descriptions) stays with the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    /// One entry per printable side.
    #[serde(default)]
    pub configuration: Vec<ProductSide>,
    #[serde(default)]
    pub size_options: Vec<String>,
    #[serde(default)]
    pub manufacturer_id: Option<String>,
}

impl Product {
    pub fn side(&self, side_id: &str) -> Option<&ProductSide> {
        self.configuration.iter().find(|s| s.id == side_id)
    }
}

impl ProductSide {
    pub fn is_layered(&self) -> bool {
        matches!(self.visual, SideVisual::Layered { .. })
    }

    /// Layers of a layered side, empty for single-image sides.
    pub fn layers(&self) -> &[ProductLayer] {
        match &self.visual {
            SideVisual::Layered { layers } => layers,
            SideVisual::Single { .. } => &[],
        }
    }
}
