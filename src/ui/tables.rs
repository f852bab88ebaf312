use eframe::egui::{self, Align, Layout, RichText, ScrollArea, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::analysis::describe::Summary;
use crate::color;
use crate::data::model::{CellValue, DataTable};

const ROW_HEIGHT: f32 = 20.0;

// ---------------------------------------------------------------------------
// Preview table
// ---------------------------------------------------------------------------

/// Rows of `table` with the row index in the first column.
pub fn data_table(ui: &mut Ui, id: &str, table: &DataTable) {
    let columns = table.columns();
    ui.push_id(id, |ui: &mut Ui| {
        ScrollArea::horizontal().id_salt(id).show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .vscroll(false)
                .cell_layout(Layout::left_to_right(Align::Center))
                .column(TableColumn::auto().at_least(30.0))
                .columns(TableColumn::auto().at_least(70.0), columns.len())
                .header(ROW_HEIGHT + 4.0, |mut header| {
                    header.col(|_ui| {});
                    for column in columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(&column.name);
                            ui.label(
                                RichText::new(column.kind.label())
                                    .small()
                                    .color(color::kind_color(column.kind)),
                            );
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, table.len(), |mut row| {
                        let i = row.index();
                        row.col(|ui: &mut Ui| {
                            ui.weak(i.to_string());
                        });
                        for value in table.row(i) {
                            row.col(|ui: &mut Ui| {
                                cell(ui, value);
                            });
                        }
                    });
                });
        });
    });
}

fn cell(ui: &mut Ui, value: &CellValue) {
    if value.is_missing() {
        ui.label(RichText::new(value.to_string()).color(color::MISSING_GRAY));
    } else {
        ui.label(value.to_string());
    }
}

// ---------------------------------------------------------------------------
// Descriptive statistics table
// ---------------------------------------------------------------------------

/// One row per statistic, one column per table column.
pub fn summary_table(ui: &mut Ui, id: &str, summary: &Summary) {
    let rows = summary.rows();
    ui.push_id(id, |ui: &mut Ui| {
        ScrollArea::horizontal().id_salt(id).show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .vscroll(false)
                .cell_layout(Layout::left_to_right(Align::Center))
                .column(TableColumn::auto().at_least(50.0))
                .columns(TableColumn::auto().at_least(70.0), summary.columns.len())
                .header(ROW_HEIGHT, |mut header| {
                    header.col(|_ui| {});
                    for column in &summary.columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(&column.name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                        let stat = rows[row.index()];
                        row.col(|ui: &mut Ui| {
                            ui.strong(stat.label());
                        });
                        for column in &summary.columns {
                            row.col(|ui: &mut Ui| {
                                let text = column.display(stat);
                                if text == "NaN" {
                                    ui.label(RichText::new(text).color(color::MISSING_GRAY));
                                } else {
                                    ui.label(text);
                                }
                            });
                        }
                    });
                });
        });
    });
}

/// Placeholder line for sections with nothing to show.
pub fn empty_note(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).italics().color(egui::Color32::GRAY));
}
