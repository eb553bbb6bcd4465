use std::time::{SystemTime, UNIX_EPOCH};

use crate::collision::{self, PositionUpdate};
use crate::geometry::{self, CellMetrics, LayoutMode, Rect, Size};
use crate::persist::{PersistedCard, PersistedLayout};
use crate::placement::{self, GridBounds};
use crate::{Card, CardGeometry, ContentProvider, Layout};

/// Owns the layout and is the only place card geometry is mutated.
/// Every operation leaves the document in a legal state; bad inputs are
/// clamped, never rejected.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    pub layout: Layout,
}

impl LayoutStore {
    pub fn new(layout: Layout) -> Self {
        let mut store = Self { layout };
        store.grow_rows();
        store
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.layout.card(id)
    }

    pub fn grid_bounds(&self) -> GridBounds {
        GridBounds {
            columns: self.layout.columns,
            rows: self.layout.rows,
        }
    }

    /// Add a card from the catalogue at the first free spot. Always places
    /// the card: a full grid canvas falls back to the origin and the
    /// overlap resolves on the next drag.
    pub fn add_card(
        &mut self,
        catalog: &dyn ContentProvider,
        content_type: &str,
        metrics: &CellMetrics,
    ) -> anyhow::Result<String> {
        let Some(kind) = catalog.resolve(content_type) else {
            anyhow::bail!("unknown card type '{content_type}'");
        };

        let occupied = self.layout.occupied_rects(None);
        let rect = match self.layout.mode {
            LayoutMode::Grid => {
                let size = geometry::clamp_min(kind.default_size, LayoutMode::Grid);
                placement::find_free_rect(&occupied, size, self.grid_bounds())
            }
            LayoutMode::FreeForm => {
                let size = geometry::clamp_min(
                    Size {
                        w: metrics.span_px(kind.default_size.w).round() as i32,
                        h: metrics.span_px(kind.default_size.h).round() as i32,
                    },
                    LayoutMode::FreeForm,
                );
                placement::append_below(&occupied, size)
            }
        };

        let id = self.unique_card_id(content_type);
        self.layout.cards.push(Card {
            id: id.clone(),
            content_type: content_type.to_string(),
            geometry: CardGeometry::from_rect(rect),
        });
        self.grow_rows();
        Ok(id)
    }

    pub fn remove_card(&mut self, id: &str) -> bool {
        let before = self.layout.cards.len();
        self.layout.cards.retain(|c| c.id != id);
        self.layout.themes.remove(id);
        self.layout.cards.len() != before
    }

    /// Commit a drag: run collision resolution and apply the whole update
    /// set in one pass.
    pub fn apply_drag_commit(&mut self, id: &str, proposed: Rect) -> Vec<PositionUpdate> {
        if self.layout.card(id).is_none() {
            return Vec::new();
        }

        let updates = collision::resolve(
            &self.layout.cards,
            id,
            proposed,
            self.layout.mode,
            self.grid_bounds(),
        );
        for update in &updates {
            if let Some(card) = self.layout.card_mut(&update.id) {
                card.geometry.set_rect(update.rect);
            }
        }
        self.grow_rows();
        updates
    }

    /// Commit a resize. Deliberately no collision pass: growing a card in
    /// place may overlap a neighbour, and the next drag of either card
    /// re-establishes no-overlap.
    pub fn apply_resize_commit(&mut self, id: &str, size: Size) {
        let mode = self.layout.mode;
        if let Some(card) = self.layout.card_mut(id) {
            let size = geometry::clamp_min(size, mode);
            card.geometry.w = size.w;
            card.geometry.h = size.h;
        }
        self.grow_rows();
    }

    /// Visual zoom factor, clamped to 0.5–2.0. Never affects collision
    /// rectangles.
    pub fn set_scale(&mut self, id: &str, scale: f32) {
        if let Some(card) = self.layout.card_mut(id) {
            card.geometry.scale = scale.clamp(0.5, 2.0);
        }
    }

    /// One-way reinterpretation of the stored numbers: cell counts become
    /// pixel counts or vice versa, with no conversion. Callers wanting a
    /// tidy arrangement pair this with a fresh placement pass.
    pub fn set_mode(&mut self, mode: LayoutMode) {
        self.layout.mode = mode;
        for card in &mut self.layout.cards {
            let clamped = geometry::clamp_min(card.geometry.rect().size(), mode);
            card.geometry.w = clamped.w;
            card.geometry.h = clamped.h;
        }
        self.grow_rows();
    }

    /// Rendered-content measurement callback. Recomputes the card's cell
    /// footprint and mutates only when the cell count actually changes,
    /// so re-measuring an unchanged card never schedules another commit.
    pub fn content_measured(
        &mut self,
        id: &str,
        w_px: f32,
        h_px: f32,
        metrics: &CellMetrics,
    ) -> bool {
        if self.layout.mode != LayoutMode::Grid {
            return false;
        }
        let Some(card) = self.layout.card(id) else {
            return false;
        };

        let want = geometry::to_cells(w_px, h_px, metrics);
        if want == card.geometry.rect().size() {
            return false;
        }
        self.apply_resize_commit(id, want);
        true
    }

    pub fn serialize(&self) -> PersistedLayout {
        PersistedLayout {
            cards: self
                .layout
                .cards
                .iter()
                .map(|c| PersistedCard {
                    id: c.id.clone(),
                    content_type: c.content_type.clone(),
                    layout: c.geometry,
                })
                .collect(),
            themes: self.layout.themes.clone(),
            updated_at: epoch_millis(),
        }
    }

    /// Rehydrate from a snapshot. Entries whose type the catalogue no
    /// longer resolves are skipped; snapshot geometry is trusted as-is,
    /// on the assumption it was legal when saved.
    pub fn restore(&mut self, snapshot: PersistedLayout, catalog: &dyn ContentProvider) {
        self.layout.cards.clear();
        for entry in snapshot.cards {
            if catalog.resolve(&entry.content_type).is_none() {
                log::warn!(
                    "dropping card {}: unknown content type '{}'",
                    entry.id,
                    entry.content_type
                );
                continue;
            }
            self.layout.cards.push(Card {
                id: entry.id,
                content_type: entry.content_type,
                geometry: entry.layout,
            });
        }
        self.layout.themes = snapshot.themes;
        self.grow_rows();
    }

    /// Grid rows track the lowest card bottom edge and never shrink.
    fn grow_rows(&mut self) {
        if self.layout.mode != LayoutMode::Grid {
            return;
        }
        let lowest = self
            .layout
            .cards
            .iter()
            .map(|c| c.geometry.rect().bottom())
            .max()
            .unwrap_or(0);
        self.layout.rows = self.layout.rows.max(lowest);
    }

    fn unique_card_id(&self, content_type: &str) -> String {
        loop {
            let id = format!(
                "{content_type}-{}-{:04x}",
                epoch_millis(),
                rand::random::<u16>()
            );
            if self.layout.card(&id).is_none() {
                return id;
            }
        }
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Catalog;

    fn metrics() -> CellMetrics {
        CellMetrics::new(120.0, 0.0)
    }

    fn grid_store() -> LayoutStore {
        LayoutStore::new(Layout::grid("Home", 12, 10))
    }

    fn assert_no_overlap(store: &LayoutStore) {
        let rects = store.layout.occupied_rects(None);
        for (i, a) in rects.iter().enumerate() {
            for b in rects.iter().skip(i + 1) {
                assert!(!a.intersects(b), "cards overlap: {a:?} vs {b:?}");
            }
        }
    }

    fn assert_in_bounds(store: &LayoutStore) {
        for card in &store.layout.cards {
            let r = card.geometry.rect();
            assert!(r.x >= 0 && r.y >= 0);
            assert!(r.right() <= store.layout.columns);
            assert!(r.bottom() <= store.layout.rows);
        }
    }

    #[test]
    fn cards_fill_grid_row_major() -> anyhow::Result<()> {
        let catalog = Catalog::with_defaults();
        let mut store = grid_store();

        let a = store.add_card(&catalog, "clock", &metrics())?;
        let b = store.add_card(&catalog, "clock", &metrics())?;

        assert_eq!(store.card(&a).unwrap().geometry.rect(), Rect::new(0, 0, 2, 2));
        assert_eq!(store.card(&b).unwrap().geometry.rect(), Rect::new(2, 0, 2, 2));
        assert_no_overlap(&store);
        assert_in_bounds(&store);
        Ok(())
    }

    #[test]
    fn drag_commit_displaces_and_keeps_invariants() -> anyhow::Result<()> {
        let catalog = Catalog::with_defaults();
        let mut store = grid_store();
        let a = store.add_card(&catalog, "clock", &metrics())?;
        let b = store.add_card(&catalog, "clock", &metrics())?;

        // Drag A two cells right, onto B.
        let updates = store.apply_drag_commit(&a, Rect::new(2, 0, 2, 2));

        assert_eq!(updates.len(), 2);
        assert_eq!(store.card(&a).unwrap().geometry.rect(), Rect::new(2, 0, 2, 2));
        assert_eq!(store.card(&b).unwrap().geometry.rect(), Rect::new(4, 0, 2, 2));
        assert_no_overlap(&store);
        assert_in_bounds(&store);
        Ok(())
    }

    #[test]
    fn drag_commits_keep_no_overlap_across_a_sequence() -> anyhow::Result<()> {
        let catalog = Catalog::with_defaults();
        let mut store = grid_store();

        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(store.add_card(&catalog, "clock", &metrics())?);
        }
        for _ in 0..2 {
            ids.push(store.add_card(&catalog, "weather", &metrics())?);
        }

        let moves = [
            (0, Rect::new(2, 0, 2, 2)),
            (3, Rect::new(0, 0, 2, 2)),
            (4, Rect::new(1, 1, 3, 2)),
            (1, Rect::new(9, 5, 2, 2)),
            (5, Rect::new(0, 0, 3, 2)),
        ];
        for (idx, proposed) in moves {
            store.apply_drag_commit(&ids[idx], proposed);
            assert_no_overlap(&store);
            assert_in_bounds(&store);
        }
        Ok(())
    }

    #[test]
    fn full_canvas_add_falls_back_to_origin() -> anyhow::Result<()> {
        let catalog = Catalog::with_defaults();
        let mut store = LayoutStore::new(Layout::grid("Tiny", 2, 2));

        let a = store.add_card(&catalog, "clock", &metrics())?;
        let b = store.add_card(&catalog, "clock", &metrics())?;

        assert_eq!(store.card(&a).unwrap().geometry.rect(), Rect::new(0, 0, 2, 2));
        // Canvas is full: B lands at the origin, transiently overlapping.
        assert_eq!(store.card(&b).unwrap().geometry.rect(), Rect::new(0, 0, 2, 2));
        Ok(())
    }

    #[test]
    fn freeform_cards_stack_downward() -> anyhow::Result<()> {
        let catalog = Catalog::with_defaults();
        let mut store = LayoutStore::new(Layout::free_form("Desk"));

        let a = store.add_card(&catalog, "clock", &metrics())?;
        let b = store.add_card(&catalog, "clock", &metrics())?;

        let ra = store.card(&a).unwrap().geometry.rect();
        let rb = store.card(&b).unwrap().geometry.rect();
        assert_eq!(ra, Rect::new(0, 0, 240, 240));
        assert_eq!(rb.y, ra.bottom() + placement::FREEFORM_GAP);
        Ok(())
    }

    #[test]
    fn resize_commit_skips_collision_resolution() -> anyhow::Result<()> {
        let catalog = Catalog::with_defaults();
        let mut store = grid_store();
        let a = store.add_card(&catalog, "clock", &metrics())?;
        let b = store.add_card(&catalog, "clock", &metrics())?;

        // Growing A to 5x5 swallows B's cells; the overlap is accepted.
        store.apply_resize_commit(&a, Size { w: 5, h: 5 });

        let ra = store.card(&a).unwrap().geometry.rect();
        let rb = store.card(&b).unwrap().geometry.rect();
        assert_eq!(ra, Rect::new(0, 0, 5, 5));
        assert!(ra.intersects(&rb));

        // The next drag of B re-establishes no-overlap.
        store.apply_drag_commit(&b, rb);
        assert_no_overlap(&store);
        Ok(())
    }

    #[test]
    fn resize_clamps_to_minimum() -> anyhow::Result<()> {
        let catalog = Catalog::with_defaults();
        let mut store = grid_store();
        let a = store.add_card(&catalog, "notes", &metrics())?;

        store.apply_resize_commit(&a, Size { w: 0, h: -3 });
        let r = store.card(&a).unwrap().geometry.rect();
        assert_eq!(r.size(), geometry::min_size(LayoutMode::Grid));
        Ok(())
    }

    #[test]
    fn rows_grow_with_card_bottoms() -> anyhow::Result<()> {
        let catalog = Catalog::with_defaults();
        let mut store = grid_store();
        let a = store.add_card(&catalog, "clock", &metrics())?;

        store.apply_drag_commit(&a, Rect::new(0, 14, 2, 2));
        assert_eq!(store.layout.rows, 16);

        // Rows never shrink.
        store.apply_drag_commit(&a, Rect::new(0, 0, 2, 2));
        assert_eq!(store.layout.rows, 16);
        Ok(())
    }

    #[test]
    fn scale_is_clamped_and_ignored_by_collision() -> anyhow::Result<()> {
        let catalog = Catalog::with_defaults();
        let mut store = grid_store();
        let a = store.add_card(&catalog, "clock", &metrics())?;
        let b = store.add_card(&catalog, "clock", &metrics())?;

        store.set_scale(&a, 5.0);
        assert_eq!(store.card(&a).unwrap().geometry.scale, 2.0);
        store.set_scale(&a, 0.1);
        assert_eq!(store.card(&a).unwrap().geometry.scale, 0.5);

        // Collision rectangles are untouched by scale.
        let updates = store.apply_drag_commit(&b, Rect::new(6, 6, 2, 2));
        assert_eq!(updates.len(), 1);
        Ok(())
    }

    #[test]
    fn serialize_restore_round_trips() -> anyhow::Result<()> {
        let catalog = Catalog::with_defaults();
        let mut store = grid_store();
        store.add_card(&catalog, "clock", &metrics())?;
        store.add_card(&catalog, "notes", &metrics())?;
        store.add_card(&catalog, "weather", &metrics())?;
        store
            .layout
            .themes
            .insert("whatever".to_string(), serde_json::json!({"bg": "dark"}));

        let before: Vec<_> = store
            .layout
            .cards
            .iter()
            .map(|c| (c.id.clone(), c.content_type.clone(), c.geometry))
            .collect();

        let snapshot = store.serialize();
        store.restore(snapshot, &catalog);

        let after: Vec<_> = store
            .layout
            .cards
            .iter()
            .map(|c| (c.id.clone(), c.content_type.clone(), c.geometry))
            .collect();
        assert_eq!(before, after);
        assert_eq!(
            store.layout.themes.get("whatever"),
            Some(&serde_json::json!({"bg": "dark"}))
        );
        Ok(())
    }

    #[test]
    fn restore_skips_unknown_types() -> anyhow::Result<()> {
        let catalog = Catalog::with_defaults();
        let mut store = grid_store();
        let a = store.add_card(&catalog, "clock", &metrics())?;
        store.add_card(&catalog, "notes", &metrics())?;

        let mut snapshot = store.serialize();
        snapshot.cards[1].content_type = "discontinued-widget".to_string();

        store.restore(snapshot, &catalog);
        assert_eq!(store.layout.cards.len(), 1);
        assert_eq!(store.layout.cards[0].id, a);
        Ok(())
    }

    #[test]
    fn content_measured_is_idempotent() -> anyhow::Result<()> {
        let catalog = Catalog::with_defaults();
        let mut store = grid_store();
        let a = store.add_card(&catalog, "clock", &metrics())?;

        // 130px of content still fits the current 2-cell footprint.
        assert!(!store.content_measured(&a, 130.0, 130.0, &metrics()));

        // Content grew: 3 cells now.
        assert!(store.content_measured(&a, 130.0, 290.0, &metrics()));
        assert_eq!(store.card(&a).unwrap().geometry.h, 3);

        // Same measurement again must not schedule another commit.
        assert!(!store.content_measured(&a, 130.0, 290.0, &metrics()));
        Ok(())
    }

    #[test]
    fn set_mode_reinterprets_without_converting() -> anyhow::Result<()> {
        let catalog = Catalog::with_defaults();
        let mut store = grid_store();
        let a = store.add_card(&catalog, "notes", &metrics())?;

        store.set_mode(LayoutMode::FreeForm);
        // 3x4 cells become 3x4 "pixels", clamped up to the pixel floor.
        let r = store.card(&a).unwrap().geometry.rect();
        assert_eq!(r.size(), geometry::min_size(LayoutMode::FreeForm));
        assert_eq!((r.x, r.y), (0, 0));
        Ok(())
    }

    #[test]
    fn card_ids_stay_unique_and_stable() -> anyhow::Result<()> {
        let catalog = Catalog::with_defaults();
        let mut store = grid_store();

        let mut ids = Vec::new();
        for _ in 0..8 {
            ids.push(store.add_card(&catalog, "clock", &metrics())?);
        }
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());

        // Ids survive drag and resize untouched.
        store.apply_drag_commit(&ids[0], Rect::new(5, 5, 2, 2));
        store.apply_resize_commit(&ids[0], Size { w: 3, h: 3 });
        assert!(store.card(&ids[0]).is_some());
        Ok(())
    }
}
