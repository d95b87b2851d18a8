//! Classification of one placed object into a billable quote.

use std::collections::BTreeSet;

use crate::color::Rgb;
use crate::design::DesignObject;

use super::{
    ColorCount, DimensionsMm, ObjectKind, ObjectPricing, PrintSizeTier, Quote, RateTable,
};

/// Billable bucket for a design object's variant.
pub fn object_kind(obj: &DesignObject) -> ObjectKind {
    match obj {
        DesignObject::Image { .. } => ObjectKind::Image,
        DesignObject::Text { .. } | DesignObject::CurvedText { .. } => ObjectKind::Text,
        DesignObject::Shape { .. } => ObjectKind::Shape,
    }
}

/// Real-world print footprint: effective base size × interactive scale ×
/// the side's pixel-to-millimeter ratio. Curved text measures by its
/// refreshed footprint, not the flat base.
pub fn dimensions_mm(obj: &DesignObject, px_to_mm: f32) -> DimensionsMm {
    let (w, h) = obj.scaled_size();
    DimensionsMm {
        width: w * px_to_mm,
        height: h * px_to_mm,
    }
}

/// Canonicalize a color so `#FF0000`, `#f00` and `ff0000` count once.
fn canonical(color: &str) -> String {
    Rgb::parse(color)
        .map(Rgb::to_hex)
        .unwrap_or_else(|| color.trim().to_ascii_lowercase())
}

/// Distinct colors actually used by the object's fill and stroke. Images
/// are full-color; their color math belongs to the rate table.
pub fn color_count(obj: &DesignObject) -> ColorCount {
    let Some((fill, stroke)) = obj.paint() else {
        return ColorCount::FullColor;
    };
    let stroke_width = match obj {
        DesignObject::Text { style, .. } | DesignObject::CurvedText { style, .. } => {
            style.stroke_width
        }
        DesignObject::Shape { stroke_width, .. } => *stroke_width,
        DesignObject::Image { .. } => 0.0,
    };

    let mut colors = BTreeSet::new();
    colors.insert(canonical(fill));
    if let Some(stroke) = stroke {
        if stroke_width > 0.0 {
            colors.insert(canonical(stroke));
        }
    }
    ColorCount::Counted(colors.len() as u32)
}

/// Classify one object into its billable quote.
pub async fn classify(
    obj: &DesignObject,
    px_to_mm: f32,
    table: &dyn RateTable,
) -> ObjectPricing {
    let dims = dimensions_mm(obj, px_to_mm);
    let kind = object_kind(obj);
    let colors = color_count(obj);
    let method = table.method_for(kind, &colors);
    let tier = PrintSizeTier::snap(dims.larger());

    let quote = match tier {
        Some(tier) => match table.lookup(method, tier, &colors).await {
            Some(amount) => Quote::Priced(amount),
            None => Quote::Unpriced,
        },
        None => Quote::Unpriced,
    };

    ObjectPricing {
        object_id: obj.common().id,
        object_type: kind,
        print_method: method,
        method_label: table.short_name(method),
        print_size: tier,
        color_count: colors,
        dimensions_mm: dims,
        quote,
        bulk_pricing: method.is_bulk_variable(),
    }
}
