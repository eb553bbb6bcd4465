use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod collision;
pub mod command;
pub mod drag;
pub mod geometry;
pub mod persist;
pub mod placement;
pub mod resize;

mod store;

pub use collision::PositionUpdate;
pub use drag::DragController;
pub use geometry::{CellMetrics, LayoutMode, PixelRect, Rect, Size};
pub use persist::{JsonFileAdapter, PersistedCard, PersistedLayout, PersistenceAdapter};
pub use resize::{ResizeController, ResizeHandle};
pub use store::LayoutStore;

pub fn version() -> &'static str {
    "0.1.0"
}

/// A layout is the top-level document we edit and persist:
/// an ordered list of cards plus the coordinate regime they live in.
#[derive(Debug, Clone)]
pub struct Layout {
    pub name: String,
    pub mode: LayoutMode,

    /// Grid mode only: canvas width in cells.
    pub columns: i32,
    /// Grid mode only: canvas height in cells. Auto-grows to the lowest
    /// card bottom edge, never shrinks.
    pub rows: i32,

    pub cards: Vec<Card>,

    /// Opaque per-card style blobs owned by the styling collaborator.
    /// Carried through save/restore without interpretation.
    pub themes: BTreeMap<String, serde_json::Value>,
}

impl Layout {
    pub fn grid(name: impl Into<String>, columns: i32, rows: i32) -> Self {
        Self {
            name: name.into(),
            mode: LayoutMode::Grid,
            columns: columns.max(geometry::MIN_CELLS),
            rows: rows.max(geometry::MIN_CELLS),
            cards: Vec::new(),
            themes: BTreeMap::new(),
        }
    }

    pub fn free_form(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: LayoutMode::FreeForm,
            columns: 0,
            rows: 0,
            cards: Vec::new(),
            themes: BTreeMap::new(),
        }
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn card_mut(&mut self, id: &str) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    /// Collision rectangles of every card except `skip`, in card order.
    pub fn occupied_rects(&self, skip: Option<&str>) -> Vec<Rect> {
        self.cards
            .iter()
            .filter(|c| skip != Some(c.id.as_str()))
            .map(|c| c.geometry.rect())
            .collect()
    }

    /// Free-form canvas size, derived as the bounding box of all cards.
    pub fn canvas_size(&self) -> Size {
        let w = self.cards.iter().map(|c| c.geometry.rect().right()).max();
        let h = self.cards.iter().map(|c| c.geometry.rect().bottom()).max();
        Size {
            w: w.unwrap_or(0),
            h: h.unwrap_or(0),
        }
    }
}

/// One placed widget instance. The engine only ever sees its geometry;
/// what the card renders is resolved by the host through the catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub content_type: String,
    pub geometry: CardGeometry,
}

/// Card geometry in the layout's active regime: cell counts in grid mode,
/// whole pixels in free-form mode. `scale` is a visual zoom on top of the
/// rectangle and never takes part in collision testing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardGeometry {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub scale: f32,
}

impl CardGeometry {
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            w: rect.w,
            h: rect.h,
            scale: 1.0,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            w: self.w,
            h: self.h,
        }
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.x = rect.x;
        self.y = rect.y;
        self.w = rect.w;
        self.h = rect.h;
    }
}

/// The content catalogue collaborator. The engine reads `default_size`
/// for placement and checks resolvability on restore; rendering stays on
/// the host side.
pub trait ContentProvider {
    fn resolve(&self, content_type: &str) -> Option<CardKind>;
}

/// Describes one card type in the catalogue.
#[derive(Debug, Clone)]
pub struct CardKind {
    pub type_id: String,
    pub title: String,
    /// Default footprint in cells. Free-form placement converts this
    /// through the host's cell metrics.
    pub default_size: Size,
}

/// A small in-memory catalogue, enough for the hosts and the tests.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    kinds: BTreeMap<String, CardKind>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        for kind in default_card_kinds() {
            catalog.add_kind(kind);
        }
        catalog
    }

    pub fn add_kind(&mut self, kind: CardKind) {
        self.kinds.insert(kind.type_id.clone(), kind);
    }

    pub fn kinds(&self) -> impl Iterator<Item = &CardKind> {
        self.kinds.values()
    }
}

impl ContentProvider for Catalog {
    fn resolve(&self, content_type: &str) -> Option<CardKind> {
        self.kinds.get(content_type).cloned()
    }
}

/// A helper: returns a default tiny catalogue we can start with.
pub fn default_card_kinds() -> Vec<CardKind> {
    vec![
        CardKind {
            type_id: "clock".to_string(),
            title: "Clock".to_string(),
            default_size: Size { w: 2, h: 2 },
        },
        CardKind {
            type_id: "notes".to_string(),
            title: "Notes".to_string(),
            default_size: Size { w: 3, h: 4 },
        },
        CardKind {
            type_id: "weather".to_string(),
            title: "Weather".to_string(),
            default_size: Size { w: 3, h: 2 },
        },
        CardKind {
            type_id: "links".to_string(),
            title: "Quick Links".to_string(),
            default_size: Size { w: 2, h: 3 },
        },
    ]
}
