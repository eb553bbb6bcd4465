use crate::geometry::{self, CellMetrics, LayoutMode, Size};
use crate::store::LayoutStore;

/// Which grip the pointer grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    /// Bottom-right corner: both axes.
    Corner,
    /// Right edge: width only.
    RightEdge,
    /// Bottom edge: height only.
    BottomEdge,
}

/// Tracks one in-progress pointer resize: Idle → Resizing(handle) → Idle.
///
/// The live size shown during the gesture is clamped to the mode minimum
/// but stays visual-only. Commit converts the final pixel size to whole
/// cells in grid mode and to whole pixels in free-form mode. Commits never
/// run collision resolution: growing a card in place may overlap a
/// neighbour, and a later drag of either card resolves it.
#[derive(Debug, Clone, Default)]
pub struct ResizeController {
    active: Option<ActiveResize>,
}

#[derive(Debug, Clone)]
struct ActiveResize {
    card_id: String,
    handle: ResizeHandle,
    /// Resize base in layout units (cells or pixels).
    base: Size,
}

impl ResizeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resizing(&self) -> Option<(&str, ResizeHandle)> {
        self.active.as_ref().map(|a| (a.card_id.as_str(), a.handle))
    }

    /// Snapshot the card's current size as the resize base.
    pub fn start(&mut self, store: &LayoutStore, card_id: &str, handle: ResizeHandle) -> bool {
        match store.card(card_id) {
            Some(card) => {
                self.active = Some(ActiveResize {
                    card_id: card_id.to_string(),
                    handle,
                    base: card.geometry.rect().size(),
                });
                true
            }
            None => false,
        }
    }

    /// Live pixel size for the current delta, clamped to the mode minimum.
    /// Purely visual; nothing is committed.
    pub fn preview(
        &self,
        store: &LayoutStore,
        metrics: &CellMetrics,
        dx: f32,
        dy: f32,
    ) -> Option<(f32, f32)> {
        let active = self.active.as_ref()?;
        Some(live_px_size(
            active,
            store.layout.mode,
            metrics,
            dx,
            dy,
        ))
    }

    /// End the gesture and commit the clamped size. Grid mode converts the
    /// final pixel size to a whole cell count, rounding up.
    pub fn commit(&mut self, store: &mut LayoutStore, metrics: &CellMetrics, dx: f32, dy: f32) {
        let Some(active) = self.active.take() else {
            return;
        };
        let (w_px, h_px) = live_px_size(&active, store.layout.mode, metrics, dx, dy);
        let size = match store.layout.mode {
            LayoutMode::Grid => geometry::to_cells(w_px, h_px, metrics),
            LayoutMode::FreeForm => Size {
                w: w_px.round() as i32,
                h: h_px.round() as i32,
            },
        };
        store.apply_resize_commit(&active.card_id, size);
    }
}

fn live_px_size(
    active: &ActiveResize,
    mode: LayoutMode,
    metrics: &CellMetrics,
    dx: f32,
    dy: f32,
) -> (f32, f32) {
    let (base_w, base_h, min_w, min_h) = match mode {
        LayoutMode::Grid => (
            metrics.span_px(active.base.w),
            metrics.span_px(active.base.h),
            metrics.span_px(geometry::MIN_CELLS),
            metrics.span_px(geometry::MIN_CELLS),
        ),
        LayoutMode::FreeForm => (
            active.base.w as f32,
            active.base.h as f32,
            geometry::MIN_FREEFORM_PX as f32,
            geometry::MIN_FREEFORM_PX as f32,
        ),
    };

    let (w, h) = match active.handle {
        ResizeHandle::Corner => (base_w + dx, base_h + dy),
        ResizeHandle::RightEdge => (base_w + dx, base_h),
        ResizeHandle::BottomEdge => (base_w, base_h + dy),
    };
    (w.max(min_w), h.max(min_h))
}
