//! # Layer Compositor
//!
//! Loads a product side's visual representation and keeps it synchronized
//! with color selections, exposing the result as a renderable surface.
//!
//! One [`CompositeSession`] owns one surface instance for its lifetime.
//! Sessions are versioned by a caller-owned [`SessionCounter`]: beginning a
//! new session (side switch, surface re-mount) bumps the counter, and every
//! suspension point in an older session re-checks its token before touching
//! shared state. A superseded task simply stops; discard-on-completion is
//! the only cancellation mechanism, and it is enough because all writes
//! funnel through those checks.
//!
//! Loading follows a strict order so stacking is deterministic regardless
//! of how fast each image arrives: every layer is fetched sequentially
//! through the verified-decode protocol, failed layers are dropped (never
//! aborting the composite), the stack is re-sorted by ascending `z_index`,
//! and only after one render-frame barrier does the session report
//! [`LoadState::Ready`]. Color tints and design overlays are refused
//! before that point.

pub mod loader;
pub mod surface;

pub use loader::{HttpImageSource, ImageLoader, ImageSource, RetryPolicy};
pub use surface::{LoadedLayer, Surface};

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ab_glyph::FontArc;
use image::RgbaImage;
use tokio::sync::{RwLock, watch};
use tracing::{debug, warn};

use crate::color::Rgb;
use crate::design::{CanvasState, DesignObject};
use crate::error::MaquetaError;
use crate::geometry::SideGeometry;
use crate::product::{ProductSide, SideVisual};

/// Load-state machine of a compositor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Monotonic session-version source, owned by whoever owns the surface.
///
/// The newest token wins; anything older is treated as superseded.
#[derive(Debug, Default)]
pub struct SessionCounter(AtomicU64);

impl SessionCounter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Issue the next session token.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The most recently issued token.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// One loading/rendering session for one product side.
pub struct CompositeSession {
    token: u64,
    counter: Arc<SessionCounter>,
    side: ProductSide,
    render_width: u32,
    render_height: u32,
    loader: Arc<ImageLoader>,
    surface: RwLock<Surface>,
    state_tx: watch::Sender<LoadState>,
}

/// The render-frame boundary: one scheduler turn between "all layers
/// added" and "composite ready", so nothing binds to a stack the renderer
/// has not finished painting.
async fn frame_barrier() {
    tokio::task::yield_now().await;
}

impl CompositeSession {
    /// Begin a new session, superseding any previous session issued from
    /// the same counter.
    pub fn begin(
        side: ProductSide,
        loader: Arc<ImageLoader>,
        counter: Arc<SessionCounter>,
        render_width: u32,
        render_height: u32,
    ) -> Self {
        let token = counter.next();
        let (state_tx, _) = watch::channel(LoadState::Idle);
        Self {
            token,
            counter,
            side,
            render_width,
            render_height,
            loader,
            surface: RwLock::new(Surface::new(render_width, render_height)),
            state_tx,
        }
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    /// Whether this session is still the newest one.
    pub fn is_current(&self) -> bool {
        self.counter.current() == self.token
    }

    /// Observable load state.
    pub fn load_state(&self) -> watch::Receiver<LoadState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> LoadState {
        *self.state_tx.borrow()
    }

    /// Current geometry mapping; provisional until a layer has loaded.
    pub async fn geometry(&self) -> SideGeometry {
        let background = self.surface.read().await.background_px();
        SideGeometry::resolve(
            &self.side,
            self.render_width as f32,
            self.render_height as f32,
            background,
        )
    }

    /// Bottom→top layer ids currently on the surface.
    pub async fn stacking_order(&self) -> Vec<String> {
        self.surface
            .read()
            .await
            .stacking_order()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Current tint of a loaded layer.
    pub async fn layer_tint(&self, layer_id: &str) -> Option<Rgb> {
        let mut surface = self.surface.write().await;
        surface.layer_mut(layer_id).map(|l| l.tint())
    }

    /// Load the side's visual representation and apply the snapshot's
    /// color selections.
    ///
    /// Asset failures never propagate: a layer that exhausts its retries
    /// is dropped, and only a side with *no* loadable artwork at all ends
    /// in [`LoadState::Failed`]. A superseded session stops quietly.
    pub async fn load(&self, state: &CanvasState) -> Result<(), MaquetaError> {
        self.state_tx.send_replace(LoadState::Loading);

        match &self.side.visual {
            SideVisual::Single { image_url } => match self.loader.load(image_url).await {
                Ok(image) => {
                    if !self.is_current() {
                        debug!(side = %self.side.id, "session superseded during background load");
                        return Ok(());
                    }
                    self.surface
                        .write()
                        .await
                        .push_layer(LoadedLayer::new(&self.side.id, 0, image));
                }
                Err(e) => {
                    warn!(side = %self.side.id, error = %e, "background image failed after retries");
                    self.state_tx.send_replace(LoadState::Failed);
                    return Ok(());
                }
            },
            SideVisual::Layered { layers } => {
                // Sequential by design: completion order can never differ
                // from declaration order, and the explicit restack below
                // settles the final z order either way.
                for layer_cfg in layers {
                    match self.loader.load(&layer_cfg.image_url).await {
                        Ok(image) => {
                            if !self.is_current() {
                                debug!(side = %self.side.id, "session superseded during layer load");
                                return Ok(());
                            }
                            self.surface.write().await.push_layer(LoadedLayer::new(
                                &layer_cfg.id,
                                layer_cfg.z_index,
                                image,
                            ));
                        }
                        Err(e) => {
                            warn!(
                                side = %self.side.id,
                                layer = %layer_cfg.id,
                                error = %e,
                                "layer image failed after retries, dropping layer"
                            );
                        }
                    }
                }
            }
        }

        {
            let mut surface = self.surface.write().await;
            if surface.is_empty() {
                self.state_tx.send_replace(LoadState::Failed);
                return Ok(());
            }
            surface.restack();
        }

        frame_barrier().await;
        if !self.is_current() {
            debug!(side = %self.side.id, "session superseded at frame barrier");
            return Ok(());
        }

        self.state_tx.send_replace(LoadState::Ready);
        self.apply_tints(state).await;
        Ok(())
    }

    /// Re-apply color selections to a ready composite.
    pub async fn apply_colors(&self, state: &CanvasState) -> Result<(), MaquetaError> {
        if self.state() != LoadState::Ready {
            return Err(MaquetaError::Session(
                "color application before layers are ready".into(),
            ));
        }
        if !self.is_current() {
            debug!(side = %self.side.id, "stale color application discarded");
            return Ok(());
        }
        self.apply_tints(state).await;
        Ok(())
    }

    /// Resolve and set every layer's tint: explicit selection → first
    /// declared color option → white.
    async fn apply_tints(&self, state: &CanvasState) {
        let mut surface = self.surface.write().await;
        match &self.side.visual {
            SideVisual::Single { .. } => {
                let tint = Rgb::parse_or_white(state.product_color.as_deref());
                for layer in surface.layers_mut() {
                    layer.set_tint(tint);
                }
            }
            SideVisual::Layered { layers } => {
                for layer_cfg in layers {
                    if let Some(layer) = surface.layer_mut(&layer_cfg.id) {
                        let hex = state
                            .layer_colors
                            .get(&layer_cfg.id)
                            .map(String::as_str)
                            .or_else(|| layer_cfg.default_hex());
                        layer.set_tint(Rgb::parse_or_white(hex));
                    }
                }
            }
        }
    }

    /// Render the full composite: mockup plus design objects.
    ///
    /// Image-object artwork is fetched through the same verified-decode
    /// loader; an object whose artwork cannot be loaded is skipped, never
    /// fatal.
    pub async fn composite(
        &self,
        objects: &[DesignObject],
        font: Option<&FontArc>,
    ) -> Result<RgbaImage, MaquetaError> {
        if self.state() != LoadState::Ready {
            return Err(MaquetaError::Session(
                "composite requested before layers are ready".into(),
            ));
        }

        let mut object_images = HashMap::new();
        for obj in objects {
            if let DesignObject::Image { url, .. } = obj {
                if object_images.contains_key(url) {
                    continue;
                }
                match self.loader.load(url).await {
                    Ok(image) => {
                        object_images.insert(url.clone(), image);
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "design image failed to load, skipping in composite");
                    }
                }
            }
        }

        let geometry = self.geometry().await;
        let surface = self.surface.read().await;
        Ok(surface.render_composite(&geometry, objects, &object_images, font))
    }

    /// PNG-encoded composite for thumbnails and previews.
    pub async fn png_preview(
        &self,
        objects: &[DesignObject],
        font: Option<&FontArc>,
    ) -> Result<Vec<u8>, MaquetaError> {
        let composite = self.composite(objects, font).await?;
        Surface::encode_png(&composite)
    }
}
