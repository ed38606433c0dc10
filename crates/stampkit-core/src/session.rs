//! Interactive stamping session state.
//!
//! A [`StampSession`] is the explicit context object behind a placement UI:
//! it owns the working raster, the selected overlays, the rotation-mode
//! selection, and the list of committed labels. `preview` answers
//! pointer-move events without changing anything; `commit` answers clicks by
//! folding the composite into the working raster and recording its label.

use crate::compose::{composite, ComposeError, CompositeResult, RotationMode};
use crate::decode::RasterImage;
use crate::{Anchor, NormalizedBBox};

/// Caller-held state for an interactive stamping session.
#[derive(Debug, Clone)]
pub struct StampSession {
    working: RasterImage,
    overlays: Vec<RasterImage>,
    current: usize,
    mode: RotationMode,
    class_id: u32,
    committed: Vec<NormalizedBBox>,
}

impl StampSession {
    /// Start a session over a background with one overlay selected.
    ///
    /// Overlays are promoted to RGBA up front so previews never pay for the
    /// conversion.
    pub fn new(background: RasterImage, overlay: RasterImage, class_id: u32) -> Self {
        Self {
            working: background.to_rgb(),
            overlays: vec![overlay.to_rgba()],
            current: 0,
            mode: RotationMode::default(),
            class_id,
            committed: Vec::new(),
        }
    }

    /// Add another overlay to cycle through.
    pub fn add_overlay(&mut self, overlay: RasterImage) {
        self.overlays.push(overlay.to_rgba());
    }

    /// Select the next overlay, wrapping around.
    pub fn next_overlay(&mut self) {
        self.current = (self.current + 1) % self.overlays.len();
    }

    /// Select the previous overlay, wrapping around.
    pub fn prev_overlay(&mut self) {
        self.current = (self.current + self.overlays.len() - 1) % self.overlays.len();
    }

    /// The overlay that the next preview/commit will stamp.
    pub fn current_overlay(&self) -> &RasterImage {
        &self.overlays[self.current]
    }

    /// Change how rotation angles are chosen. Persists until changed again.
    pub fn set_rotation_mode(&mut self, mode: RotationMode) {
        self.mode = mode;
    }

    pub fn rotation_mode(&self) -> RotationMode {
        self.mode
    }

    /// Set a fixed angle from free-form text, recovering to 0 degrees on
    /// unparseable input.
    pub fn set_fixed_from_input(&mut self, text: &str) {
        self.mode = RotationMode::fixed_from_input(text);
    }

    pub fn set_class_id(&mut self, class_id: u32) {
        self.class_id = class_id;
    }

    /// The working raster: the background plus every committed stamp.
    pub fn image(&self) -> &RasterImage {
        &self.working
    }

    /// Labels of all committed stamps, in commit order.
    pub fn labels(&self) -> &[NormalizedBBox] {
        &self.committed
    }

    /// Composite at the anchor without changing session state.
    ///
    /// Called per pointer-move for live preview; `Random` mode draws a fresh
    /// angle every time.
    pub fn preview(&self, anchor: Anchor) -> Result<CompositeResult, ComposeError> {
        let mut result = composite(&self.working, self.current_overlay(), anchor, self.mode)?;
        result.bbox = result.bbox.with_class(self.class_id);
        Ok(result)
    }

    /// Composite at the anchor and make it permanent: the result becomes the
    /// new working raster and its label joins the committed list.
    ///
    /// On error the session is left unchanged.
    pub fn commit(&mut self, anchor: Anchor) -> Result<CompositeResult, ComposeError> {
        let result = self.preview(anchor)?;
        self.working = result.image.clone();
        self.committed.push(result.bbox);
        Ok(result)
    }
}
