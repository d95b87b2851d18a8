//! # Maqueta - Product Mockup Design & Pricing Core
//!
//! Maqueta is the core engine of a product-customization editor: users
//! place design elements (text, curved text, images, shapes) onto a
//! multi-sided, multi-layer product mockup and get an accurate print-cost
//! breakdown as they work. It provides:
//!
//! - **Geometry mapping**: pure transforms between a side's real-world
//!   print area and a render surface's pixel space
//! - **Canvas state**: lossless, forgiving snapshots of a placed design
//! - **Layer compositing**: async, retrying, recolorable mockup stacking
//! - **Print pricing**: reactive per-object classification and totals
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use maqueta::compose::{CompositeSession, ImageLoader, SessionCounter};
//! use maqueta::design::{CanvasState, DesignObject};
//! use maqueta::pricing::{PricingEngine, StaticRateTable};
//!
//! # async fn demo(side: maqueta::product::ProductSide) -> Result<(), maqueta::MaquetaError> {
//! // Compose the mockup for one product side
//! let counter = Arc::new(SessionCounter::new());
//! let loader = Arc::new(ImageLoader::over_http());
//! let state = CanvasState::from_json(r#"{"version":2,"objects":[]}"#);
//! let session = CompositeSession::begin(side.clone(), loader, counter, 800, 600);
//! session.load(&state).await?;
//!
//! // Price the live design
//! let engine = PricingEngine::new(Arc::new(StaticRateTable::new()));
//! let objects: Vec<DesignObject> = state.restore(maqueta::design::DecodeMode::Editing);
//! let _summary = engine.recompute(&[(&side, &objects)]).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`product`] | Catalog-facing side/layer configuration |
//! | [`geometry`] | Print-area ↔ render-surface mapping |
//! | [`design`] | Design objects and canvas-state snapshots |
//! | [`compose`] | Layer loading, tinting and compositing |
//! | [`pricing`] | Object classification and reactive totals |
//! | [`color`] | Hex colors and multiplicative tinting |
//! | [`error`] | Error types |
//!
//! ## Concurrency Model
//!
//! Single-threaded and cooperative: all waiting is `await`-based (image
//! fetch and decode, backoff sleeps, rate-table lookups, the render-frame
//! barrier). Superseded work is never cancelled in flight; it is
//! discarded at its next version-token check, which is the system's only
//! cancellation mechanism.

pub mod color;
pub mod compose;
pub mod design;
pub mod error;
pub mod geometry;
pub mod pricing;
pub mod product;

// Re-exports for convenience
pub use compose::{CompositeSession, LoadState, SessionCounter};
pub use error::MaquetaError;
pub use pricing::{PricingEngine, PricingSummary};
