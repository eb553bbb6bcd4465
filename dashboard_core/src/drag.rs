use crate::collision::PositionUpdate;
use crate::geometry::{self, CellMetrics, LayoutMode, PixelRect, Rect};
use crate::store::LayoutStore;

/// Tracks one in-progress pointer move: Idle → Dragging → Idle.
///
/// While dragging, the host renders the card translated by the raw pointer
/// delta (`preview`); geometry only changes at `commit`, which routes the
/// proposed rectangle through collision resolution. There is no revert
/// path: ending the gesture always commits with the last observed delta,
/// and clamping guarantees a legal end state.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    active: Option<ActiveDrag>,
}

#[derive(Debug, Clone)]
struct ActiveDrag {
    card_id: String,
    origin: Rect,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the card being dragged, if any.
    pub fn dragging(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.card_id.as_str())
    }

    /// Snapshot the card's current rectangle as the drag origin.
    /// Returns false for an unknown card; the controller stays idle.
    pub fn start(&mut self, store: &LayoutStore, card_id: &str) -> bool {
        match store.card(card_id) {
            Some(card) => {
                self.active = Some(ActiveDrag {
                    card_id: card_id.to_string(),
                    origin: card.geometry.rect(),
                });
                true
            }
            None => false,
        }
    }

    /// Where the host should paint the dragged card for a live pointer
    /// delta. Purely visual; nothing is committed.
    pub fn preview(
        &self,
        store: &LayoutStore,
        metrics: &CellMetrics,
        dx: f32,
        dy: f32,
    ) -> Option<PixelRect> {
        let active = self.active.as_ref()?;
        let mut px = geometry::to_pixels(&active.origin, store.layout.mode, metrics);
        px.x += dx;
        px.y += dy;
        Some(px)
    }

    /// End the gesture: quantize the delta (grid) or round it (free-form),
    /// clamp into bounds, and apply through collision resolution.
    pub fn commit(
        &mut self,
        store: &mut LayoutStore,
        metrics: &CellMetrics,
        dx: f32,
        dy: f32,
    ) -> Vec<PositionUpdate> {
        let Some(active) = self.active.take() else {
            return Vec::new();
        };
        let proposed = proposed_rect(
            &active.origin,
            store.layout.mode,
            store.layout.columns,
            metrics,
            dx,
            dy,
        );
        store.apply_drag_commit(&active.card_id, proposed)
    }
}

fn proposed_rect(
    origin: &Rect,
    mode: LayoutMode,
    columns: i32,
    metrics: &CellMetrics,
    dx: f32,
    dy: f32,
) -> Rect {
    match mode {
        LayoutMode::Grid => {
            let max_x = (columns - origin.w).max(0);
            Rect {
                x: (origin.x + metrics.cells_for_delta(dx)).clamp(0, max_x),
                y: (origin.y + metrics.cells_for_delta(dy)).max(0),
                w: origin.w,
                h: origin.h,
            }
        }
        LayoutMode::FreeForm => Rect {
            x: (origin.x + dx.round() as i32).max(0),
            y: (origin.y + dy.round() as i32).max(0),
            w: origin.w,
            h: origin.h,
        },
    }
}
