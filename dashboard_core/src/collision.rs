use crate::Card;
use crate::geometry::{LayoutMode, Rect};
use crate::placement::{self, GridBounds};

/// One geometry change produced by a resolve pass. The full set is applied
/// atomically by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionUpdate {
    pub id: String,
    pub rect: Rect,
}

/// Resolve a proposed rectangle for one card against everyone else.
///
/// Cards whose rectangle intersects `proposed` are displaced, in card
/// order, to the nearest spot that clears the proposed rectangle and every
/// card already settled. Each displaced card joins the occupied set before
/// the next one is processed, so displacement never cycles. This is a
/// local, order-stable relaxation, not an optimal repack: the same input
/// always produces the same output, and that predictability is the point.
///
/// When nothing overlaps, the result is exactly one update for the moving
/// card.
pub fn resolve(
    cards: &[Card],
    moving_id: &str,
    proposed: Rect,
    mode: LayoutMode,
    bounds: GridBounds,
) -> Vec<PositionUpdate> {
    let mut updates = vec![PositionUpdate {
        id: moving_id.to_string(),
        rect: proposed,
    }];

    let displaced: Vec<&Card> = cards
        .iter()
        .filter(|c| c.id != moving_id && c.geometry.rect().intersects(&proposed))
        .collect();
    if displaced.is_empty() {
        return updates;
    }

    // Occupied set: everyone staying put, plus the proposed rectangle.
    let mut occupied: Vec<Rect> = cards
        .iter()
        .filter(|c| c.id != moving_id && !displaced.iter().any(|d| d.id == c.id))
        .map(|c| c.geometry.rect())
        .collect();
    occupied.push(proposed);

    for card in displaced {
        let current = card.geometry.rect();
        let spot = match mode {
            LayoutMode::Grid => displace_grid(&occupied, current, bounds),
            LayoutMode::FreeForm => sweep_down(&occupied, current),
        };
        log::debug!(
            "displaced card {} from ({},{}) to ({},{})",
            card.id,
            current.x,
            current.y,
            spot.x,
            spot.y
        );
        occupied.push(spot);
        updates.push(PositionUpdate {
            id: card.id.clone(),
            rect: spot,
        });
    }

    updates
}

/// Grid displacement: row-major scan forward from the card's own cell.
/// The scan bounds extend below the occupied set, so a slot always exists
/// as long as the card is no wider than the canvas.
fn displace_grid(occupied: &[Rect], current: Rect, bounds: GridBounds) -> Rect {
    let lowest = occupied.iter().map(Rect::bottom).max().unwrap_or(0);
    let extended = GridBounds {
        columns: bounds.columns,
        rows: bounds.rows.max(lowest + current.h),
    };
    placement::first_fit_from(occupied, current.size(), extended, current.x, current.y)
        .unwrap_or(Rect {
            x: 0,
            y: 0,
            w: current.w,
            h: current.h,
        })
}

/// Free-form displacement: increase `y` until the rectangle clears every
/// occupied rectangle. Each step lands on the bottom edge of a blocker, so
/// `y` strictly increases and the sweep terminates.
fn sweep_down(occupied: &[Rect], mut rect: Rect) -> Rect {
    loop {
        let blocker_bottom = occupied
            .iter()
            .filter(|o| o.intersects(&rect))
            .map(|o| o.bottom())
            .max();
        match blocker_bottom {
            Some(bottom) => rect.y = bottom,
            None => return rect,
        }
    }
}
