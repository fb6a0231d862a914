use eframe::egui::{self, ScrollArea, Ui};

use crate::chart::{self, HistNorm};
use crate::data::cache::{LoadedData, Views};
use crate::data::model::columns::{MANUFACTURER, PRICE, TYPE};
use crate::error::DashboardError;
use crate::state::AppState;
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ExplorerApp {
    pub state: AppState,
}

impl ExplorerApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: controls ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: table and charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .id_salt("dashboard")
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| dashboard(ui, &mut self.state));
        });
    }
}

fn dashboard(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Vehicle Advertisement Listings - US");

    if let Some(err) = &state.load_error {
        panels::notice(ui, err);
        return;
    }
    let (Some(data), Some(views)) = (state.data.clone(), state.views()) else {
        ui.label("Open a file to explore listings  (File → Open…)");
        return;
    };

    // ---- Table ----
    let shown = state.table_rows(&views);
    let source = if state.show_raw { &data.raw } else { &data.cleaned };
    ui.label(format!(
        "Showing {} of {} listings",
        shown.len(),
        source.len()
    ));
    table::listings_table(ui, source, &shown);
    let summary = data.report.summary_lines();
    if !summary.is_empty() {
        ui.collapsing("Cleaning summary", |ui: &mut Ui| {
            for line in summary {
                ui.label(line);
            }
        });
    }
    ui.separator();

    let priced = match &views.priced {
        Ok(view) => view.as_slice(),
        Err(err) => {
            panels::notice(ui, err);
            return;
        }
    };

    type_histogram_section(ui, &data, priced);
    price_comparison_section(ui, state, &data, &views);
    scatter_section(ui, state, &data, priced);
    box_section(ui, state, &data, priced);
}

fn type_histogram_section(ui: &mut Ui, data: &LoadedData, view: &[usize]) {
    ui.heading("Histogram of the types of vehicles by manufacturer");
    match chart::category_histogram(&data.cleaned, view, MANUFACTURER, TYPE) {
        Ok(spec) => plot::category_histogram(ui, &spec),
        Err(err) => panels::notice(ui, &err),
    }
    ui.separator();
}

fn price_comparison_section(ui: &mut Ui, state: &AppState, data: &LoadedData, views: &Views) {
    ui.heading("Histogram of price distribution between manufacturers");
    let sel = &state.selection;
    let norm = if sel.normalized {
        HistNorm::Percent
    } else {
        HistNorm::Count
    };

    let spec = views.pair.clone().and_then(|pair| {
        chart::numeric_histogram(
            &data.cleaned,
            &pair,
            PRICE,
            MANUFACTURER,
            state.config.histogram_bins,
            norm,
        )
    });
    match spec {
        Ok(spec) => {
            ui.label(format!(
                "Price Distribution: {} vs {}",
                sel.manufacturer1.as_deref().unwrap_or_default(),
                sel.manufacturer2.as_deref().unwrap_or_default()
            ));
            plot::overlay_histogram(ui, &spec);
        }
        Err(err) => {
            panels::notice(ui, &err);
            if matches!(err, DashboardError::InvalidManufacturerPair) {
                panels::notice(ui, &DashboardError::empty("the selected manufacturers"));
            }
            plot::empty_plot(ui, "price_histogram_empty");
        }
    }
    ui.separator();
}

fn scatter_section(ui: &mut Ui, state: &AppState, data: &LoadedData, view: &[usize]) {
    let sel = &state.selection;
    let x = sel.scatter_x.as_deref();
    let y = sel.scatter_y.as_deref();
    let color = sel.scatter_color.as_deref();
    ui.heading(format!(
        "Scatter plot matrix of {} and {} by {}",
        x.unwrap_or("?"),
        y.unwrap_or("?"),
        color.unwrap_or("?")
    ));
    match chart::scatter_matrix(&data.cleaned, view, &[x, y], color) {
        Ok(spec) => plot::scatter_matrix(ui, &spec),
        Err(err) => panels::notice(ui, &err),
    }
    ui.separator();
}

fn box_section(ui: &mut Ui, state: &AppState, data: &LoadedData, view: &[usize]) {
    let sel = &state.selection;
    ui.heading(format!(
        "Box plot of {} by {}",
        sel.box_value.as_deref().unwrap_or("?"),
        sel.box_group.as_deref().unwrap_or("?")
    ));
    match chart::box_plot(
        &data.cleaned,
        view,
        sel.box_value.as_deref(),
        sel.box_group.as_deref(),
    ) {
        Ok(spec) => plot::box_plot(ui, &spec),
        Err(err) => panels::notice(ui, &err),
    }
}
