//! # Design Object Model
//!
//! A single type hierarchy that is both the Rust API and the JSON API:
//! [`DesignObject`] is constructible in Rust and round-trips through
//! serde unchanged on every field that affects visual output.
//!
//! ```
//! use maqueta::design::DesignObject;
//!
//! let text = DesignObject::text("HELLO", 120.0, 80.0, 40.0, 20.0);
//! let json = serde_json::to_string(&text).unwrap();
//! let back: DesignObject = serde_json::from_str(&json).unwrap();
//! assert_eq!(back.common().id, text.common().id);
//! assert_eq!(back.scaled_size(), text.scaled_size());
//! ```
//!
//! Plain text and curved text are mutually exclusive representations of one
//! logical element: [`DesignObject::to_curved`] and
//! [`DesignObject::to_plain`] build a *new* object (keeping the id) rather
//! than mutating the variant in place.

pub mod curve;
pub mod snapshot;
pub mod state;

pub use state::{CanvasState, DecodeMode};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use curve::Footprint;

/// Reserved name for the background mockup object on an interactive
/// canvas. Never serialized; the background is regenerated from the
/// product side at render time.
pub const BACKGROUND_MARKER: &str = "__mockup_background__";

fn new_object_id() -> Uuid {
    Uuid::new_v4()
}

fn default_scale() -> f32 {
    1.0
}

fn default_fill() -> String {
    "#000000".to_string()
}

fn default_font_size() -> f32 {
    24.0
}

fn default_font_family() -> String {
    "sans-serif".to_string()
}

/// Geometry and identity shared by every design object.
///
/// Position and size are in canvas pixel space; `width`/`height` are the
/// unscaled base dimensions and `scale_x`/`scale_y` the interactive resize
/// factors, matching how the editor's scene graph reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectCommon {
    #[serde(default = "new_object_id")]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub left: f32,
    #[serde(default)]
    pub top: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_scale")]
    pub scale_x: f32,
    #[serde(default = "default_scale")]
    pub scale_y: f32,
    /// Rotation in degrees, clockwise.
    #[serde(default)]
    pub angle: f32,
    /// Guides, selection handles and the background marker set this; such
    /// objects never reach saved state or pricing.
    #[serde(default)]
    pub excluded_from_export: bool,
    /// Runtime-only interactivity flag, set by the decode mode.
    #[serde(skip)]
    pub selectable: bool,
}

impl ObjectCommon {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            id: new_object_id(),
            name: String::new(),
            left,
            top,
            width,
            height,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            excluded_from_export: false,
            selectable: true,
        }
    }
}

/// Fill/stroke styling for text variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default = "default_fill")]
    pub fill: String,
    #[serde(default)]
    pub stroke: Option<String>,
    #[serde(default)]
    pub stroke_width: f32,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_font_family")]
    pub font_family: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            fill: default_fill(),
            stroke: None,
            stroke_width: 0.0,
            font_size: default_font_size(),
            font_family: default_font_family(),
        }
    }
}

/// Geometric primitive of a shape object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rect,
    Ellipse,
}

/// One placed design element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DesignObject {
    /// Uploaded artwork placed on the canvas.
    Image {
        #[serde(flatten)]
        common: ObjectCommon,
        url: String,
    },
    /// Straight text.
    Text {
        #[serde(flatten)]
        common: ObjectCommon,
        content: String,
        #[serde(flatten)]
        style: TextStyle,
    },
    /// Text bent along a circular arc. The cached footprint is the
    /// effective (unscaled) bounding box of the bent text; it is refreshed
    /// before every serialization because curvature distorts it.
    CurvedText {
        #[serde(flatten)]
        common: ObjectCommon,
        content: String,
        #[serde(flatten)]
        style: TextStyle,
        curve_intensity: f32,
        footprint: Footprint,
    },
    /// Filled vector shape.
    Shape {
        #[serde(flatten)]
        common: ObjectCommon,
        kind: ShapeKind,
        #[serde(default = "default_fill")]
        fill: String,
        #[serde(default)]
        stroke: Option<String>,
        #[serde(default)]
        stroke_width: f32,
    },
}

impl DesignObject {
    /// Convenience constructor for a text object.
    pub fn text(content: &str, left: f32, top: f32, width: f32, height: f32) -> Self {
        DesignObject::Text {
            common: ObjectCommon::new(left, top, width, height),
            content: content.to_string(),
            style: TextStyle::default(),
        }
    }

    /// Convenience constructor for a shape object.
    pub fn shape(kind: ShapeKind, left: f32, top: f32, width: f32, height: f32) -> Self {
        DesignObject::Shape {
            common: ObjectCommon::new(left, top, width, height),
            kind,
            fill: default_fill(),
            stroke: None,
            stroke_width: 0.0,
        }
    }

    /// Convenience constructor for an image object.
    pub fn image(url: &str, left: f32, top: f32, width: f32, height: f32) -> Self {
        DesignObject::Image {
            common: ObjectCommon::new(left, top, width, height),
            url: url.to_string(),
        }
    }

    pub fn common(&self) -> &ObjectCommon {
        match self {
            DesignObject::Image { common, .. }
            | DesignObject::Text { common, .. }
            | DesignObject::CurvedText { common, .. }
            | DesignObject::Shape { common, .. } => common,
        }
    }

    pub fn common_mut(&mut self) -> &mut ObjectCommon {
        match self {
            DesignObject::Image { common, .. }
            | DesignObject::Text { common, .. }
            | DesignObject::CurvedText { common, .. }
            | DesignObject::Shape { common, .. } => common,
        }
    }

    /// Whether this object belongs in saved state and pricing.
    pub fn is_exported(&self) -> bool {
        let c = self.common();
        !c.excluded_from_export && c.name != BACKGROUND_MARKER
    }

    /// Fill and stroke colors, for objects whose color count is counted
    /// per distinct color (text and shapes). `None` for images.
    pub fn paint(&self) -> Option<(&str, Option<&str>)> {
        match self {
            DesignObject::Text { style, .. } | DesignObject::CurvedText { style, .. } => {
                Some((style.fill.as_str(), style.stroke.as_deref()))
            }
            DesignObject::Shape { fill, stroke, .. } => {
                Some((fill.as_str(), stroke.as_deref()))
            }
            DesignObject::Image { .. } => None,
        }
    }

    /// Unscaled effective base size: the cached footprint for curved text,
    /// `width`/`height` otherwise.
    pub fn base_size(&self) -> (f32, f32) {
        match self {
            DesignObject::CurvedText { footprint, .. } => (footprint.width, footprint.height),
            other => {
                let c = other.common();
                (c.width, c.height)
            }
        }
    }

    /// On-canvas size after interactive scaling.
    pub fn scaled_size(&self) -> (f32, f32) {
        let (w, h) = self.base_size();
        let c = self.common();
        (w * c.scale_x, h * c.scale_y)
    }

    /// Recompute the cached curved-text footprint from the current base
    /// dimensions and curvature. No-op for every other variant.
    pub fn refresh_footprint(&mut self) {
        if let DesignObject::CurvedText {
            common,
            curve_intensity,
            footprint,
            ..
        } = self
        {
            *footprint = curve::footprint(common.width, common.height, *curve_intensity);
        }
    }

    /// Rebuild a plain text object as curved text with the given
    /// intensity. Returns a new instance carrying the same id; the caller
    /// replaces its reference. `None` for non-text variants.
    pub fn to_curved(&self, curve_intensity: f32) -> Option<DesignObject> {
        match self {
            DesignObject::Text {
                common,
                content,
                style,
            } => {
                let footprint = curve::footprint(common.width, common.height, curve_intensity);
                Some(DesignObject::CurvedText {
                    common: common.clone(),
                    content: content.clone(),
                    style: style.clone(),
                    curve_intensity,
                    footprint,
                })
            }
            _ => None,
        }
    }

    /// Rebuild a curved text object as plain text. Returns a new instance
    /// carrying the same id. `None` for non-curved variants.
    pub fn to_plain(&self) -> Option<DesignObject> {
        match self {
            DesignObject::CurvedText {
                common,
                content,
                style,
                ..
            } => Some(DesignObject::Text {
                common: common.clone(),
                content: content.clone(),
                style: style.clone(),
            }),
            _ => None,
        }
    }
}
