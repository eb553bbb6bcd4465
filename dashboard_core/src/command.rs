// dashboard_core/src/command.rs
use crate::drag::DragController;
use crate::geometry::CellMetrics;
use crate::resize::{ResizeController, ResizeHandle};
use crate::store::LayoutStore;
use crate::ContentProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyStatus {
    Applied,
    Incomplete,  // valid so far, but needs more tokens
    NotACommand, // doesn't look like layout syntax
    Failed(String),
}

/// Apply one line of layout syntax to the store, driving the controllers
/// the same way a pointer host would (start, then commit).
///
/// Grammar (deltas are pixels):
///   add <type>
///   move <card> <dx> <dy>
///   resize <card> corner|right|bottom <dx> <dy>
///   scale <card> <factor>
///   remove <card>
///
/// `<card>` is a 1-based position in the card list or a full card id.
pub fn try_apply_layout_line(
    line: &str,
    store: &mut LayoutStore,
    catalog: &dyn ContentProvider,
    metrics: &CellMetrics,
) -> ApplyStatus {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&cmd) = tokens.first() else {
        return ApplyStatus::NotACommand;
    };

    match cmd.to_lowercase().as_str() {
        "add" => {
            let Some(kind) = tokens.get(1) else {
                return ApplyStatus::Incomplete;
            };
            match store.add_card(catalog, kind, metrics) {
                Ok(_) => ApplyStatus::Applied,
                Err(err) => ApplyStatus::Failed(format!("{err:#}")),
            }
        }

        "move" => {
            let (Some(card), Some(dx), Some(dy)) = (tokens.get(1), tokens.get(2), tokens.get(3))
            else {
                return ApplyStatus::Incomplete;
            };
            let Some(id) = resolve_card(store, card) else {
                return ApplyStatus::Failed(format!("no card '{card}'"));
            };
            let (Ok(dx), Ok(dy)) = (dx.parse::<f32>(), dy.parse::<f32>()) else {
                return ApplyStatus::NotACommand;
            };

            let mut drag = DragController::new();
            drag.start(store, &id);
            drag.commit(store, metrics, dx, dy);
            ApplyStatus::Applied
        }

        "resize" => {
            let (Some(card), Some(handle), Some(dx), Some(dy)) = (
                tokens.get(1),
                tokens.get(2),
                tokens.get(3),
                tokens.get(4),
            ) else {
                return ApplyStatus::Incomplete;
            };
            let Some(id) = resolve_card(store, card) else {
                return ApplyStatus::Failed(format!("no card '{card}'"));
            };
            let handle = match handle.to_lowercase().as_str() {
                "corner" => ResizeHandle::Corner,
                "right" => ResizeHandle::RightEdge,
                "bottom" => ResizeHandle::BottomEdge,
                _ => return ApplyStatus::NotACommand,
            };
            let (Ok(dx), Ok(dy)) = (dx.parse::<f32>(), dy.parse::<f32>()) else {
                return ApplyStatus::NotACommand;
            };

            let mut resize = ResizeController::new();
            resize.start(store, &id, handle);
            resize.commit(store, metrics, dx, dy);
            ApplyStatus::Applied
        }

        "scale" => {
            let (Some(card), Some(factor)) = (tokens.get(1), tokens.get(2)) else {
                return ApplyStatus::Incomplete;
            };
            let Some(id) = resolve_card(store, card) else {
                return ApplyStatus::Failed(format!("no card '{card}'"));
            };
            let Ok(factor) = factor.parse::<f32>() else {
                return ApplyStatus::NotACommand;
            };
            store.set_scale(&id, factor);
            ApplyStatus::Applied
        }

        "remove" => {
            let Some(card) = tokens.get(1) else {
                return ApplyStatus::Incomplete;
            };
            let Some(id) = resolve_card(store, card) else {
                return ApplyStatus::Failed(format!("no card '{card}'"));
            };
            store.remove_card(&id);
            ApplyStatus::Applied
        }

        _ => ApplyStatus::NotACommand,
    }
}

/// A card token is a 1-based list position or a full id.
fn resolve_card(store: &LayoutStore, token: &str) -> Option<String> {
    if let Ok(index) = token.parse::<usize>() {
        if index >= 1 {
            return store
                .layout
                .cards
                .get(index - 1)
                .map(|c| c.id.clone());
        }
        return None;
    }
    store.card(token).map(|c| c.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::{Catalog, Layout};

    fn setup() -> (LayoutStore, Catalog, CellMetrics) {
        (
            LayoutStore::new(Layout::grid("Home", 12, 10)),
            Catalog::with_defaults(),
            CellMetrics::new(120.0, 0.0),
        )
    }

    #[test]
    fn add_then_move_by_index() {
        let (mut store, catalog, metrics) = setup();

        let st = try_apply_layout_line("add clock", &mut store, &catalog, &metrics);
        assert_eq!(st, ApplyStatus::Applied);
        assert_eq!(store.layout.cards.len(), 1);

        let st = try_apply_layout_line("move 1 240 0", &mut store, &catalog, &metrics);
        assert_eq!(st, ApplyStatus::Applied);
        assert_eq!(
            store.layout.cards[0].geometry.rect(),
            Rect::new(2, 0, 2, 2)
        );
    }

    #[test]
    fn incomplete_move_is_incomplete() {
        let (mut store, catalog, metrics) = setup();
        let st = try_apply_layout_line("move 1", &mut store, &catalog, &metrics);
        assert_eq!(st, ApplyStatus::Incomplete);
    }

    #[test]
    fn non_layout_lines_are_ignored() {
        let (mut store, catalog, metrics) = setup();
        let st = try_apply_layout_line("help", &mut store, &catalog, &metrics);
        assert_eq!(st, ApplyStatus::NotACommand);
    }

    #[test]
    fn unknown_type_reports_failure() {
        let (mut store, catalog, metrics) = setup();
        let st = try_apply_layout_line("add teleporter", &mut store, &catalog, &metrics);
        assert!(matches!(st, ApplyStatus::Failed(_)));
    }

    #[test]
    fn resize_by_handle_name() {
        let (mut store, catalog, metrics) = setup();
        try_apply_layout_line("add clock", &mut store, &catalog, &metrics);

        let st = try_apply_layout_line("resize 1 corner 115 115", &mut store, &catalog, &metrics);
        assert_eq!(st, ApplyStatus::Applied);
        assert_eq!(
            store.layout.cards[0].geometry.rect(),
            Rect::new(0, 0, 3, 3)
        );
    }

    #[test]
    fn remove_by_id() {
        let (mut store, catalog, metrics) = setup();
        try_apply_layout_line("add clock", &mut store, &catalog, &metrics);
        let id = store.layout.cards[0].id.clone();

        let st = try_apply_layout_line(&format!("remove {id}"), &mut store, &catalog, &metrics);
        assert_eq!(st, ApplyStatus::Applied);
        assert!(store.layout.cards.is_empty());
    }
}
