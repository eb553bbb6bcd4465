use anyhow::Context;
use eframe::egui;

use dashboard_core::{
    Catalog, CellMetrics, ContentProvider, DragController, JsonFileAdapter, Layout, LayoutMode,
    LayoutStore, PersistenceAdapter, PixelRect, ResizeController, ResizeHandle, geometry,
};

const COLUMNS: i32 = 12;
const ROWS: i32 = 10;
const CELL_PX: f32 = 96.0;
const GUTTER_PX: f32 = 8.0;
const HANDLE_PX: f32 = 12.0;

fn main() -> eframe::Result<()> {
    env_logger::init();

    let layout_key = std::env::args().nth(1).unwrap_or_else(|| "home".to_string());

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Dashboard Builder",
        options,
        Box::new(|_cc| {
            Ok(Box::new(
                DashboardApp::new(layout_key).expect("failed to open layout"),
            ))
        }),
    )
}

struct DashboardApp {
    layout_key: String,
    adapter: JsonFileAdapter,
    catalog: Catalog,
    metrics: CellMetrics,
    store: LayoutStore,

    drag: DragController,
    resize: ResizeController,
    /// Accumulated pointer delta of the gesture in flight.
    gesture_delta: egui::Vec2,

    // UI state
    edit_mode: bool,
    add_type: String,
    selected: Option<String>,
    last_error: Option<String>,
}

impl DashboardApp {
    fn new(layout_key: String) -> anyhow::Result<Self> {
        let adapter = JsonFileAdapter::new(".");
        let catalog = Catalog::with_defaults();

        let mut store = LayoutStore::new(Layout::grid(layout_key.clone(), COLUMNS, ROWS));
        if let Some(snapshot) = adapter
            .load(&layout_key)
            .with_context(|| format!("load layout '{layout_key}'"))?
        {
            store.restore(snapshot, &catalog);
        }

        Ok(Self {
            layout_key,
            adapter,
            catalog,
            metrics: CellMetrics::new(CELL_PX, GUTTER_PX),
            store,
            drag: DragController::new(),
            resize: ResizeController::new(),
            gesture_delta: egui::Vec2::ZERO,
            edit_mode: true,
            add_type: "clock".to_string(),
            selected: None,
            last_error: None,
        })
    }

    fn safe_save(&mut self) {
        if let Err(e) = self.adapter.save(&self.layout_key, &self.store.serialize()) {
            self.last_error = Some(format!("{e:#}"));
        }
    }

    fn safe_load(&mut self) {
        match self.adapter.load(&self.layout_key) {
            Ok(Some(snapshot)) => self.store.restore(snapshot, &self.catalog),
            Ok(None) => self.last_error = Some(format!("no saved layout '{}'", self.layout_key)),
            Err(e) => self.last_error = Some(format!("{e:#}")),
        }
    }

    fn safe_add(&mut self) {
        let kind = self.add_type.clone();
        if let Err(e) = self.store.add_card(&self.catalog, &kind, &self.metrics) {
            self.last_error = Some(format!("{e:#}"));
        }
    }

    /// Painted rectangle for a card, in canvas space. The dragged card
    /// follows the live pointer delta; the resized card previews its live
    /// size; everyone else sits at committed geometry.
    fn paint_rect(&self, card_id: &str) -> Option<PixelRect> {
        if self.drag.dragging() == Some(card_id) {
            return self.drag.preview(
                &self.store,
                &self.metrics,
                self.gesture_delta.x,
                self.gesture_delta.y,
            );
        }

        let card = self.store.card(card_id)?;
        let mut px = geometry::to_pixels(
            &card.geometry.rect(),
            self.store.layout.mode,
            &self.metrics,
        );
        if let Some((resizing_id, _)) = self.resize.resizing() {
            if resizing_id == card_id {
                if let Some((w, h)) = self.resize.preview(
                    &self.store,
                    &self.metrics,
                    self.gesture_delta.x,
                    self.gesture_delta.y,
                ) {
                    px.w = w;
                    px.h = h;
                }
            }
        }
        Some(px)
    }

    fn card_ui(&mut self, ui: &mut egui::Ui, origin: egui::Pos2, card_id: &str) {
        let Some(px) = self.paint_rect(card_id) else {
            return;
        };
        let rect = egui::Rect::from_min_size(
            origin + egui::vec2(px.x, px.y),
            egui::vec2(px.w, px.h),
        );

        let (content_type, scale) = match self.store.card(card_id) {
            Some(card) => (card.content_type.clone(), card.geometry.scale),
            None => return,
        };
        let title = self
            .catalog
            .resolve(&content_type)
            .map(|k| k.title)
            .unwrap_or_else(|| content_type.clone());

        // Paint first, interact after, so the handles sit on top.
        let active = self.drag.dragging() == Some(card_id)
            || matches!(self.resize.resizing(), Some((id, _)) if id == card_id);
        let selected = self.selected.as_deref() == Some(card_id);
        let fill = card_color(&content_type);
        let stroke = if active || selected {
            egui::Stroke::new(2.0, egui::Color32::WHITE)
        } else {
            egui::Stroke::new(1.0, egui::Color32::from_gray(90))
        };
        ui.painter()
            .rect_filled(rect, egui::Rounding::same(6.0), fill);
        ui.painter()
            .rect_stroke(rect, egui::Rounding::same(6.0), stroke);
        ui.painter().text(
            rect.min + egui::vec2(8.0, 6.0),
            egui::Align2::LEFT_TOP,
            title,
            egui::FontId::proportional(14.0 * scale),
            egui::Color32::WHITE,
        );

        if !self.edit_mode {
            // View mode: the controllers are disabled entirely.
            return;
        }

        let body = ui.interact(
            rect,
            egui::Id::new((card_id, "body")),
            egui::Sense::click_and_drag(),
        );
        if body.clicked() {
            self.selected = Some(card_id.to_string());
        }
        if body.drag_started() {
            self.gesture_delta = egui::Vec2::ZERO;
            self.drag.start(&self.store, card_id);
        }
        if body.dragged() {
            self.gesture_delta += body.drag_delta();
        }
        if body.drag_stopped() {
            self.gesture_delta += body.drag_delta();
            self.drag.commit(
                &mut self.store,
                &self.metrics,
                self.gesture_delta.x,
                self.gesture_delta.y,
            );
        }

        let handles = [
            (
                ResizeHandle::Corner,
                egui::Rect::from_min_size(
                    rect.max - egui::vec2(HANDLE_PX, HANDLE_PX),
                    egui::vec2(HANDLE_PX, HANDLE_PX),
                ),
            ),
            (
                ResizeHandle::RightEdge,
                egui::Rect::from_min_size(
                    egui::pos2(rect.max.x - HANDLE_PX, rect.min.y),
                    egui::vec2(HANDLE_PX, rect.height() - HANDLE_PX),
                ),
            ),
            (
                ResizeHandle::BottomEdge,
                egui::Rect::from_min_size(
                    egui::pos2(rect.min.x, rect.max.y - HANDLE_PX),
                    egui::vec2(rect.width() - HANDLE_PX, HANDLE_PX),
                ),
            ),
        ];
        for (handle, handle_rect) in handles {
            let resp = ui.interact(
                handle_rect,
                egui::Id::new((card_id, "handle", handle_kind_tag(handle))),
                egui::Sense::drag(),
            );
            if resp.drag_started() {
                self.gesture_delta = egui::Vec2::ZERO;
                self.resize.start(&self.store, card_id, handle);
            }
            if resp.dragged() {
                self.gesture_delta += resp.drag_delta();
            }
            if resp.drag_stopped() {
                self.gesture_delta += resp.drag_delta();
                self.resize.commit(
                    &mut self.store,
                    &self.metrics,
                    self.gesture_delta.x,
                    self.gesture_delta.y,
                );
            }
        }
    }
}

fn handle_kind_tag(handle: ResizeHandle) -> &'static str {
    match handle {
        ResizeHandle::Corner => "corner",
        ResizeHandle::RightEdge => "right",
        ResizeHandle::BottomEdge => "bottom",
    }
}

fn card_color(content_type: &str) -> egui::Color32 {
    const PALETTE: [egui::Color32; 5] = [
        egui::Color32::from_rgb(0x3a, 0x5a, 0x8c),
        egui::Color32::from_rgb(0x6b, 0x4f, 0x8c),
        egui::Color32::from_rgb(0x2f, 0x6f, 0x5f),
        egui::Color32::from_rgb(0x8c, 0x5a, 0x3a),
        egui::Color32::from_rgb(0x5f, 0x5f, 0x6f),
    ];
    let sum: usize = content_type.bytes().map(usize::from).sum();
    PALETTE[sum % PALETTE.len()]
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Dashboard Builder");
                ui.separator();
                ui.label(format!("Layout: {}", self.layout_key));
            });

            ui.horizontal(|ui| {
                if ui
                    .selectable_label(self.edit_mode, if self.edit_mode { "Editing" } else { "Edit" })
                    .clicked()
                {
                    self.edit_mode = !self.edit_mode;
                }

                ui.separator();

                // mode switch: reinterprets geometry, does not convert it
                let mut mode = self.store.layout.mode;
                egui::ComboBox::from_id_source("mode")
                    .selected_text(format!("{mode:?}"))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut mode, LayoutMode::Grid, "Grid");
                        ui.selectable_value(&mut mode, LayoutMode::FreeForm, "FreeForm");
                    });
                if mode != self.store.layout.mode {
                    self.store.set_mode(mode);
                }

                ui.separator();

                ui.label("Add:");
                egui::ComboBox::from_id_source("add_type")
                    .selected_text(self.add_type.clone())
                    .show_ui(ui, |ui| {
                        let kinds: Vec<String> =
                            self.catalog.kinds().map(|k| k.type_id.clone()).collect();
                        for kind in kinds {
                            ui.selectable_value(&mut self.add_type, kind.clone(), kind);
                        }
                    });
                if ui
                    .add_enabled(self.edit_mode, egui::Button::new("Add card"))
                    .clicked()
                {
                    self.safe_add();
                }

                ui.separator();

                if ui.button("Save").clicked() {
                    self.safe_save();
                }
                if ui.button("Load").clicked() {
                    self.safe_load();
                }
            });

            if let Some(id) = self.selected.clone() {
                if self.store.card(&id).is_none() {
                    self.selected = None;
                } else if self.edit_mode {
                    ui.horizontal(|ui| {
                        ui.label(format!("Selected: {id}"));
                        let mut scale = self
                            .store
                            .card(&id)
                            .map(|c| c.geometry.scale)
                            .unwrap_or(1.0);
                        if ui
                            .add(egui::Slider::new(&mut scale, 0.5..=2.0).text("scale"))
                            .changed()
                        {
                            self.store.set_scale(&id, scale);
                        }
                        if ui.button("Remove").clicked() {
                            self.store.remove_card(&id);
                            self.selected = None;
                        }
                    });
                }
            }

            if let Some(err) = &self.last_error {
                ui.colored_label(egui::Color32::RED, format!("Error: {err}"));
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                // Reserve room for the whole arrangement.
                let canvas = canvas_px(&self.store, &self.metrics);
                let (canvas_rect, _) = ui.allocate_exact_size(
                    egui::vec2(canvas.0.max(ui.available_width()), canvas.1 + CELL_PX),
                    egui::Sense::hover(),
                );
                let origin = canvas_rect.min;

                // Draw the dragged card last so it paints on top.
                let mut ids: Vec<String> =
                    self.store.layout.cards.iter().map(|c| c.id.clone()).collect();
                if let Some(active) = self.drag.dragging().map(str::to_string) {
                    ids.retain(|id| *id != active);
                    ids.push(active);
                }
                for id in ids {
                    self.card_ui(ui, origin, &id);
                }
            });
        });
    }
}

/// Pixel extent of the committed arrangement.
fn canvas_px(store: &LayoutStore, metrics: &CellMetrics) -> (f32, f32) {
    match store.layout.mode {
        LayoutMode::Grid => (
            metrics.span_px(store.layout.columns),
            metrics.span_px(store.layout.rows),
        ),
        LayoutMode::FreeForm => {
            let size = store.layout.canvas_size();
            (size.w as f32, size.h as f32)
        }
    }
}
