//! # Print Pricing
//!
//! Vocabulary and collaborator seams for turning placed design objects
//! into a billable cost breakdown.
//!
//! The actual rate schedule is an opaque collaborator behind [`RateTable`]:
//! this crate never hardcodes what a 10×10cm embroidery costs, it only
//! classifies objects into `(method, size tier, color count)` and sums the
//! amounts the table returns. A combination the table cannot price is
//! surfaced as [`Quote::Unpriced`], never silently billed as zero:
//! under-charging an order is worse than pausing checkout.
//!
//! All money is integer minor units; no floats anywhere near a total.

pub mod aggregate;
pub mod classify;

pub use aggregate::PricingEngine;
pub use classify::classify;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// MONEY
// ============================================================================

/// An amount in integer minor currency units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Money {
        Money(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }
}

impl std::ops::Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

// ============================================================================
// CLASSIFICATION VOCABULARY
// ============================================================================

/// Manufacturing technique billed per object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintMethod {
    DigitalPrint,
    ScreenPrint,
    Embroidery,
    Applique,
}

impl PrintMethod {
    /// Methods whose unit price varies with order quantity; their quotes
    /// carry a bulk-order disclaimer in the presentation layer. No
    /// quantity discount is applied here.
    pub fn is_bulk_variable(self) -> bool {
        matches!(
            self,
            PrintMethod::ScreenPrint | PrintMethod::Embroidery | PrintMethod::Applique
        )
    }
}

/// Discrete size bucket used for price lookup instead of continuous
/// measurement. Ordered smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintSizeTier {
    Cm10,
    Cm20,
    A4,
    A3,
}

impl PrintSizeTier {
    pub const ALL: [PrintSizeTier; 4] = [
        PrintSizeTier::Cm10,
        PrintSizeTier::Cm20,
        PrintSizeTier::A4,
        PrintSizeTier::A3,
    ];

    /// Upper bound of the tier's larger dimension, in millimeters.
    pub fn max_dimension_mm(self) -> f32 {
        match self {
            PrintSizeTier::Cm10 => 100.0,
            PrintSizeTier::Cm20 => 200.0,
            PrintSizeTier::A4 => 297.0,
            PrintSizeTier::A3 => 420.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PrintSizeTier::Cm10 => "10×10cm",
            PrintSizeTier::Cm20 => "20×20cm",
            PrintSizeTier::A4 => "A4",
            PrintSizeTier::A3 => "A3",
        }
    }

    /// Snap a measurement to the smallest tier that is not smaller than
    /// it. `None` when it exceeds the largest supported tier.
    ///
    /// Monotonic: a bigger object can never land in a smaller tier.
    pub fn snap(larger_dimension_mm: f32) -> Option<PrintSizeTier> {
        PrintSizeTier::ALL
            .into_iter()
            .find(|tier| tier.max_dimension_mm() >= larger_dimension_mm)
    }
}

/// Number of distinct colors billed for an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorCount {
    /// Distinct fill/stroke colors actually used (text, shapes).
    Counted(u32),
    /// Full-color artwork (images); the rate table owns its color math.
    FullColor,
}

/// Billable bucket of a design object's raw type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Image,
    Text,
    Shape,
}

/// Real-world footprint of a placed object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionsMm {
    pub width: f32,
    pub height: f32,
}

impl DimensionsMm {
    pub fn larger(self) -> f32 {
        self.width.max(self.height)
    }
}

/// Outcome of a rate-table lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quote {
    Priced(Money),
    /// The table had no row for this combination (or the object exceeds
    /// every supported tier). Blocks checkout-readiness.
    Unpriced,
}

impl Quote {
    pub fn amount(self) -> Option<Money> {
        match self {
            Quote::Priced(m) => Some(m),
            Quote::Unpriced => None,
        }
    }

    pub fn is_priced(self) -> bool {
        matches!(self, Quote::Priced(_))
    }
}

// ============================================================================
// BREAKDOWN TYPES
// ============================================================================

/// Billable classification of one placed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectPricing {
    pub object_id: Uuid,
    pub object_type: ObjectKind,
    pub print_method: PrintMethod,
    /// Display label for the method, from the rate table.
    pub method_label: String,
    /// `None` when the object exceeds every supported tier.
    pub print_size: Option<PrintSizeTier>,
    pub color_count: ColorCount,
    pub dimensions_mm: DimensionsMm,
    pub quote: Quote,
    /// Quote carries a bulk-order disclaimer in the presentation layer.
    pub bulk_pricing: bool,
}

/// Cost breakdown for one product side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidePricing {
    pub side_id: String,
    pub side_name: String,
    pub has_objects: bool,
    /// Sum of priced objects on this side.
    pub total_price: Money,
    pub objects: Vec<ObjectPricing>,
}

/// Order-facing pricing summary across all sides.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PricingSummary {
    pub side_pricing: Vec<SidePricing>,
    /// Unit-price addition; quantity multiplication happens outside this
    /// core.
    pub total_additional_price: Money,
    pub total_object_count: usize,
    /// Recomputation stamp that produced this summary.
    pub version: u64,
}

impl PricingSummary {
    /// False while any object is unpriced: an unknown rate must pause
    /// checkout, not under-charge it.
    pub fn checkout_ready(&self) -> bool {
        self.side_pricing
            .iter()
            .flat_map(|s| s.objects.iter())
            .all(|o| o.quote.is_priced())
    }
}

// ============================================================================
// RATE TABLE COLLABORATOR
// ============================================================================

/// The opaque pricing-configuration collaborator.
///
/// Lookups may hit a remote config service, hence async. Implementations
/// must be cheap to call repeatedly; the aggregator re-queries on every
/// recomputation.
#[async_trait]
pub trait RateTable: Send + Sync {
    /// Price for one object classification, or `None` when the
    /// combination has no configured rate.
    async fn lookup(
        &self,
        method: PrintMethod,
        size: PrintSizeTier,
        colors: &ColorCount,
    ) -> Option<Money>;

    /// Human-readable short label for a method.
    fn short_name(&self, method: PrintMethod) -> String;

    /// Which method bills an object of this kind. Default policy:
    /// full-color artwork goes to digital print, spot-color marks to
    /// screen print.
    fn method_for(&self, kind: ObjectKind, _colors: &ColorCount) -> PrintMethod {
        match kind {
            ObjectKind::Image => PrintMethod::DigitalPrint,
            ObjectKind::Text | ObjectKind::Shape => PrintMethod::ScreenPrint,
        }
    }
}

/// In-memory rate table: base rate per `(method, tier)` plus an optional
/// per-extra-color surcharge per method.
#[derive(Debug, Default)]
pub struct StaticRateTable {
    base: HashMap<(PrintMethod, PrintSizeTier), Money>,
    color_surcharge: HashMap<PrintMethod, Money>,
}

impl StaticRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rate(mut self, method: PrintMethod, size: PrintSizeTier, amount: Money) -> Self {
        self.base.insert((method, size), amount);
        self
    }

    pub fn color_surcharge(mut self, method: PrintMethod, amount: Money) -> Self {
        self.color_surcharge.insert(method, amount);
        self
    }
}

#[async_trait]
impl RateTable for StaticRateTable {
    async fn lookup(
        &self,
        method: PrintMethod,
        size: PrintSizeTier,
        colors: &ColorCount,
    ) -> Option<Money> {
        let base = *self.base.get(&(method, size))?;
        let surcharge = match colors {
            ColorCount::Counted(n) if *n > 1 => {
                let per_color = self
                    .color_surcharge
                    .get(&method)
                    .copied()
                    .unwrap_or(Money::ZERO);
                Money::from_minor(per_color.minor() * (*n as i64 - 1))
            }
            _ => Money::ZERO,
        };
        Some(base + surcharge)
    }

    fn short_name(&self, method: PrintMethod) -> String {
        match method {
            PrintMethod::DigitalPrint => "Digital",
            PrintMethod::ScreenPrint => "Screen",
            PrintMethod::Embroidery => "Embroidery",
            PrintMethod::Applique => "Appliqué",
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_sum() {
        let total: Money = [Money::from_minor(1500), Money::from_minor(2500)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_minor(4000));
    }

    #[test]
    fn test_tier_snap_picks_smallest_sufficient() {
        assert_eq!(PrintSizeTier::snap(60.0), Some(PrintSizeTier::Cm10));
        assert_eq!(PrintSizeTier::snap(100.0), Some(PrintSizeTier::Cm10));
        assert_eq!(PrintSizeTier::snap(100.1), Some(PrintSizeTier::Cm20));
        assert_eq!(PrintSizeTier::snap(297.0), Some(PrintSizeTier::A4));
        assert_eq!(PrintSizeTier::snap(400.0), Some(PrintSizeTier::A3));
        assert_eq!(PrintSizeTier::snap(500.0), None);
    }

    #[test]
    fn test_tier_snap_is_monotonic() {
        let sizes = [5.0, 42.0, 99.9, 100.0, 150.0, 201.0, 297.0, 419.0];
        let mut last = None;
        for size in sizes {
            let tier = PrintSizeTier::snap(size);
            assert!(tier >= last, "tier regressed at {size}");
            last = tier;
        }
    }

    #[test]
    fn test_bulk_variable_methods() {
        assert!(PrintMethod::ScreenPrint.is_bulk_variable());
        assert!(PrintMethod::Embroidery.is_bulk_variable());
        assert!(PrintMethod::Applique.is_bulk_variable());
        assert!(!PrintMethod::DigitalPrint.is_bulk_variable());
    }

    #[tokio::test]
    async fn test_static_table_color_surcharge() {
        let table = StaticRateTable::new()
            .rate(
                PrintMethod::ScreenPrint,
                PrintSizeTier::Cm10,
                Money::from_minor(3000),
            )
            .color_surcharge(PrintMethod::ScreenPrint, Money::from_minor(500));

        let one = table
            .lookup(
                PrintMethod::ScreenPrint,
                PrintSizeTier::Cm10,
                &ColorCount::Counted(1),
            )
            .await;
        assert_eq!(one, Some(Money::from_minor(3000)));

        let three = table
            .lookup(
                PrintMethod::ScreenPrint,
                PrintSizeTier::Cm10,
                &ColorCount::Counted(3),
            )
            .await;
        assert_eq!(three, Some(Money::from_minor(4000)));
    }

    #[tokio::test]
    async fn test_static_table_miss_is_none() {
        let table = StaticRateTable::new();
        let missing = table
            .lookup(
                PrintMethod::Embroidery,
                PrintSizeTier::A3,
                &ColorCount::FullColor,
            )
            .await;
        assert_eq!(missing, None);
    }

    #[test]
    fn test_checkout_blocked_by_unpriced_object() {
        let mut summary = PricingSummary::default();
        assert!(summary.checkout_ready());
        summary.side_pricing.push(SidePricing {
            side_id: "front".into(),
            side_name: "Front".into(),
            has_objects: true,
            total_price: Money::ZERO,
            objects: vec![ObjectPricing {
                object_id: Uuid::new_v4(),
                object_type: ObjectKind::Text,
                print_method: PrintMethod::ScreenPrint,
                method_label: "Screen".into(),
                print_size: None,
                color_count: ColorCount::Counted(1),
                dimensions_mm: DimensionsMm {
                    width: 500.0,
                    height: 100.0,
                },
                quote: Quote::Unpriced,
                bulk_pricing: true,
            }],
        });
        assert!(!summary.checkout_ready());
    }
}
