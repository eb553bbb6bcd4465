use crate::geometry::{Rect, Size};

/// Vertical gap left above a newly appended free-form card.
pub const FREEFORM_GAP: i32 = 16;

/// Grid canvas extent in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub columns: i32,
    pub rows: i32,
}

/// First unoccupied rectangle of `size`, scanning candidate top-left cells
/// in row-major order from the origin. Falls back to the origin when the
/// canvas is full; the caller accepts the transient overlap.
///
/// Row-major order is the tie-break that makes repeated insertions fill
/// the canvas left-to-right, top-to-bottom.
pub fn find_free_rect(occupied: &[Rect], size: Size, bounds: GridBounds) -> Rect {
    first_fit_from(occupied, size, bounds, 0, 0).unwrap_or(Rect {
        x: 0,
        y: 0,
        w: size.w,
        h: size.h,
    })
}

/// Row-major first-fit scan starting at cell `(start_x, start_y)`.
/// The first row is scanned from `start_x`, later rows from column zero.
pub fn first_fit_from(
    occupied: &[Rect],
    size: Size,
    bounds: GridBounds,
    start_x: i32,
    start_y: i32,
) -> Option<Rect> {
    if size.w > bounds.columns {
        return None;
    }

    let max_x = bounds.columns - size.w;
    let max_y = bounds.rows - size.h;

    let mut y = start_y.max(0);
    let mut x = start_x.clamp(0, max_x);
    while y <= max_y {
        while x <= max_x {
            let candidate = Rect {
                x,
                y,
                w: size.w,
                h: size.h,
            };
            if !occupied.iter().any(|o| o.intersects(&candidate)) {
                return Some(candidate);
            }
            x += 1;
        }
        x = 0;
        y += 1;
    }

    None
}

/// Free-form placement: append below the current bounding box. No search
/// is needed since the canvas is unbounded downward.
pub fn append_below(occupied: &[Rect], size: Size) -> Rect {
    let y = match occupied.iter().map(Rect::bottom).max() {
        Some(bottom) => bottom + FREEFORM_GAP,
        None => 0,
    };
    Rect {
        x: 0,
        y,
        w: size.w,
        h: size.h,
    }
}
