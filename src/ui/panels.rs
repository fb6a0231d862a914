use std::sync::Arc;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::plot_columns;
use crate::error::{DashboardError, Severity};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – control widgets
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let data = match &state.data {
        Some(data) => Arc::clone(data),
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    let dataset = &data.cleaned;
    let manufacturers = state.manufacturers();
    let candidates = plot_columns(dataset);
    let numeric = dataset.numeric_columns();
    let categorical = dataset.categorical_columns();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Price range ----
            if let Some((lo, hi)) = state.price_bounds() {
                ui.strong("Price range");
                let current = state.selection.price_range;
                let (mut min, mut max) = current.map_or((lo, hi), |r| (r.min, r.max));
                let changed_min = ui
                    .add(egui::Slider::new(&mut min, lo..=hi).text("min"))
                    .changed();
                let changed_max = ui
                    .add(egui::Slider::new(&mut max, lo..=hi).text("max"))
                    .changed();
                if changed_min || changed_max {
                    state.set_price_range(min, max);
                }
                ui.separator();
            }

            // ---- Manufacturer comparison ----
            ui.strong("Price comparison");
            choice_combo(ui, "Manufacturer 1", &manufacturers, &mut state.selection.manufacturer1);
            choice_combo(ui, "Manufacturer 2", &manufacturers, &mut state.selection.manufacturer2);
            ui.checkbox(&mut state.selection.normalized, "Normalized");
            ui.separator();

            // ---- Scatter matrix ----
            ui.strong("Scatter plot matrix");
            choice_combo(ui, "X axis", &candidates, &mut state.selection.scatter_x);
            choice_combo(ui, "Y axis", &candidates, &mut state.selection.scatter_y);
            choice_combo(ui, "Color", &candidates, &mut state.selection.scatter_color);
            ui.separator();

            // ---- Box plot ----
            ui.strong("Box plot");
            choice_combo(ui, "Value", &numeric, &mut state.selection.box_value);
            choice_combo(ui, "Group by", &categorical, &mut state.selection.box_group);
            ui.separator();

            // ---- Table rows ----
            let total = dataset.len();
            let step = state.config.row_limit_step.min(total).max(1);
            if total > 0 {
                ui.strong("Rows shown");
                let mut n = state.selection.row_limit;
                if ui
                    .add(egui::Slider::new(&mut n, step..=total).step_by(step as f64))
                    .changed()
                {
                    state.set_row_limit(n);
                }
            }
        });
}

/// Combo box over `options`, writing the pick into `current`.
fn choice_combo(ui: &mut Ui, label: &str, options: &[String], current: &mut Option<String>) {
    let selected = current.clone().unwrap_or_default();
    egui::ComboBox::from_label(label)
        .selected_text(&selected)
        .show_ui(ui, |ui: &mut Ui| {
            for option in options {
                if ui.selectable_label(selected == *option, option).clicked() {
                    *current = Some(option.clone());
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(data) = &state.data {
            ui.label(format!(
                "{} listings from {}",
                data.raw.len(),
                data.path.display()
            ));
        }

        ui.separator();

        if ui.selectable_label(state.show_raw, "Raw data").clicked() {
            state.show_raw = !state.show_raw;
        }
    });
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

/// Banner for an error, warning or info message.
pub fn notice(ui: &mut Ui, err: &DashboardError) {
    let (prefix, color) = match err.severity() {
        Severity::Error => ("Error", Color32::RED),
        Severity::Warning => ("Warning", Color32::from_rgb(230, 160, 0)),
        Severity::Info => ("Info", Color32::LIGHT_BLUE),
    };
    ui.label(RichText::new(format!("{prefix}: {err}")).color(color));
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open listings")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(path);
    }
}
