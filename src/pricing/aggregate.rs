//! Reactive aggregation of per-object quotes into a [`PricingSummary`].
//!
//! Rate-table lookups are asynchronous, so two recomputations can be in
//! flight at once (the user keeps editing while a lookup is slow). Every
//! recomputation is stamped from a monotonic counter and the stamp is
//! re-checked at commit time: a computation that finds a newer stamp was
//! issued while it ran discards its own result instead of publishing it.
//! The commit check and the publish happen with no suspension point in
//! between, so on the single-threaded runtime the newest stamp always
//! wins.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::debug;

use crate::design::DesignObject;
use crate::geometry;
use crate::product::ProductSide;

use super::classify::classify;
use super::{Money, PricingSummary, RateTable, SidePricing};

/// Recomputes and publishes the live pricing summary.
pub struct PricingEngine {
    table: Arc<dyn RateTable>,
    issued: AtomicU64,
    summary_tx: watch::Sender<PricingSummary>,
}

impl PricingEngine {
    pub fn new(table: Arc<dyn RateTable>) -> Self {
        let (summary_tx, _) = watch::channel(PricingSummary::default());
        Self {
            table,
            issued: AtomicU64::new(0),
            summary_tx,
        }
    }

    /// Observe summary updates. The receiver sees only committed
    /// summaries, in stamp order.
    pub fn subscribe(&self) -> watch::Receiver<PricingSummary> {
        self.summary_tx.subscribe()
    }

    /// The most recently committed summary.
    pub fn summary(&self) -> PricingSummary {
        self.summary_tx.borrow().clone()
    }

    /// Recompute the summary for the given sides and their live objects.
    ///
    /// Returns the committed summary, or `None` when a newer
    /// recomputation was issued while this one ran and the result was
    /// discarded.
    pub async fn recompute(
        &self,
        sides: &[(&ProductSide, &[DesignObject])],
    ) -> Option<PricingSummary> {
        let stamp = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        let mut side_pricing = Vec::with_capacity(sides.len());
        let mut total = Money::ZERO;
        let mut object_count = 0;

        for (side, objects) in sides {
            let ratio = geometry::px_to_mm_ratio(side);
            let mut rows = Vec::new();
            for obj in objects.iter().filter(|o| o.is_exported()) {
                rows.push(classify(obj, ratio, self.table.as_ref()).await);
            }

            let side_total: Money = rows.iter().filter_map(|r| r.quote.amount()).sum();
            total += side_total;
            object_count += rows.len();
            side_pricing.push(SidePricing {
                side_id: side.id.clone(),
                side_name: side.name.clone(),
                has_objects: !rows.is_empty(),
                total_price: side_total,
                objects: rows,
            });
        }

        let summary = PricingSummary {
            side_pricing,
            total_additional_price: total,
            total_object_count: object_count,
            version: stamp,
        };

        if self.issued.load(Ordering::SeqCst) != stamp {
            debug!(stamp, "stale pricing recomputation discarded");
            return None;
        }
        self.summary_tx.send_replace(summary.clone());
        Some(summary)
    }
}
