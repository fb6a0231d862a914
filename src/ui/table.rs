use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::Dataset;

const ROW_HEIGHT: f32 = 18.0;
const MAX_TABLE_HEIGHT: f32 = 300.0;

/// Render `rows` of `dataset` with every column, in source order.
pub fn listings_table(ui: &mut Ui, dataset: &Dataset, rows: &[usize]) {
    let columns = &dataset.column_names;

    ui.push_id("listings_table", |ui: &mut Ui| {
        egui::ScrollArea::horizontal()
            .id_salt("listings_table_hscroll")
            .show(ui, |ui: &mut Ui| {
                TableBuilder::new(ui)
                    .striped(true)
                    .max_scroll_height(MAX_TABLE_HEIGHT)
                    .columns(Column::auto().at_least(60.0).resizable(true), columns.len())
                    .header(20.0, |mut header| {
                        for col in columns {
                            header.col(|ui: &mut Ui| {
                                ui.strong(col);
                            });
                        }
                    })
                    .body(|body| {
                        body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                            let i = rows[row.index()];
                            for col in columns {
                                row.col(|ui: &mut Ui| {
                                    ui.label(dataset.value(i, col).to_string());
                                });
                            }
                        });
                    });
            });
    });
}
