use serde::{Deserialize, Serialize};

/// Minimum card edge in grid mode, in cells.
pub const MIN_CELLS: i32 = 2;

/// Minimum card edge in free-form mode, in pixels.
pub const MIN_FREEFORM_PX: i32 = 100;

/// The coordinate regime a layout is in.
///
/// Grid mode expresses geometry as integer cell indices on a fixed-column
/// canvas; free-form mode as whole pixels on a canvas unbounded downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    Grid,
    FreeForm,
}

/// Axis-aligned rectangle, top-left origin. Cells in grid mode,
/// pixels in free-form mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn size(&self) -> Size {
        Size {
            w: self.w,
            h: self.h,
        }
    }

    /// Strict axis-aligned overlap test. Touching edges do not overlap.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub w: i32,
    pub h: i32,
}

/// A rectangle in host pixel space, used for rendering and live previews.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Pixel metrics of one grid cell as reported by the host shell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub cell_px: f32,
    pub gutter_px: f32,
}

impl CellMetrics {
    pub fn new(cell_px: f32, gutter_px: f32) -> Self {
        Self {
            cell_px: cell_px.max(1.0),
            gutter_px: gutter_px.max(0.0),
        }
    }

    /// Pixel span of `cells` adjacent cells, gutters included between them.
    pub fn span_px(&self, cells: i32) -> f32 {
        if cells <= 0 {
            return 0.0;
        }
        cells as f32 * self.cell_px + (cells - 1) as f32 * self.gutter_px
    }

    /// Pixel offset of cell index `cell` from the canvas origin.
    pub fn origin_px(&self, cell: i32) -> f32 {
        cell as f32 * (self.cell_px + self.gutter_px)
    }

    /// Number of whole cells a pixel span resolves to, rounding up.
    pub fn cells_for_span(&self, px: f32) -> i32 {
        let step = self.cell_px + self.gutter_px;
        ((px.max(0.0) + self.gutter_px) / step).ceil() as i32
    }

    /// Number of cells a pixel delta moves across, rounding to nearest.
    pub fn cells_for_delta(&self, px: f32) -> i32 {
        (px / (self.cell_px + self.gutter_px)).round() as i32
    }
}

/// Mode-dependent minimum card size.
pub fn min_size(mode: LayoutMode) -> Size {
    match mode {
        LayoutMode::Grid => Size {
            w: MIN_CELLS,
            h: MIN_CELLS,
        },
        LayoutMode::FreeForm => Size {
            w: MIN_FREEFORM_PX,
            h: MIN_FREEFORM_PX,
        },
    }
}

/// Clamp a size up to the active mode's minimum. Inputs are never rejected.
pub fn clamp_min(size: Size, mode: LayoutMode) -> Size {
    let min = min_size(mode);
    Size {
        w: size.w.max(min.w),
        h: size.h.max(min.h),
    }
}

/// Map layout geometry to host pixel space.
pub fn to_pixels(rect: &Rect, mode: LayoutMode, metrics: &CellMetrics) -> PixelRect {
    match mode {
        LayoutMode::Grid => PixelRect {
            x: metrics.origin_px(rect.x),
            y: metrics.origin_px(rect.y),
            w: metrics.span_px(rect.w),
            h: metrics.span_px(rect.h),
        },
        LayoutMode::FreeForm => PixelRect {
            x: rect.x as f32,
            y: rect.y as f32,
            w: rect.w as f32,
            h: rect.h as f32,
        },
    }
}

/// Map a pixel size to whole cell counts (ceiling division), clamped to
/// the grid minimum.
pub fn to_cells(w_px: f32, h_px: f32, metrics: &CellMetrics) -> Size {
    clamp_min(
        Size {
            w: metrics.cells_for_span(w_px),
            h: metrics.cells_for_span(h_px),
        },
        LayoutMode::Grid,
    )
}
