use std::path::Path;

use eframe::egui::{self, Align2, Color32, Id, LayerId, Order, ScrollArea, TextStyle};

use crate::data::loader::Upload;
use crate::state::AppState;
use crate::ui::charts::{self, ChartBackend};
use crate::ui::panels;

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyDescribeApp {
    pub state: AppState,
    backend: Box<dyn ChartBackend>,
    /// Table generation the backend's caches belong to.
    seen_generation: u64,
}

impl RustyDescribeApp {
    pub fn new(state: AppState) -> Self {
        let backend = charts::backend_for(state.backend_kind);
        Self {
            state,
            backend,
            seen_generation: 0,
        }
    }

    /// Treat the first file dropped onto the window as an upload.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        let upload = match (file.path, file.bytes) {
            (Some(path), _) => Upload::from_path(&path),
            (None, Some(bytes)) => Upload::from_bytes(file.name, bytes),
            (None, None) => {
                log::warn!("Dropped file '{}' has neither path nor contents", file.name);
                return;
            }
        };
        self.state.open(upload);
    }
}

/// Dim the window and name the file while it is dragged over.
fn preview_hovered_files(ctx: &egui::Context) {
    let hovered = ctx.input(|i| i.raw.hovered_files.clone());
    let Some(file) = hovered.first() else {
        return;
    };
    let name = file
        .path
        .as_deref()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.mime.clone());

    let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("file_drop")));
    let screen = ctx.screen_rect();
    painter.rect_filled(screen, 0.0, Color32::from_black_alpha(180));
    painter.text(
        screen.center(),
        Align2::CENTER_CENTER,
        format!("Drop to analyse {name}"),
        TextStyle::Heading.resolve(&ctx.style()),
        Color32::WHITE,
    );
}

impl eframe::App for RustyDescribeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_dropped_files(ctx);

        let generation = self.state.flow.generation();
        if generation != self.seen_generation {
            self.backend.reset(ctx);
            self.seen_generation = generation;
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Central panel: report ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    panels::report_view(ui, &mut self.state, self.backend.as_mut());
                });
        });

        preview_hovered_files(ctx);
    }
}
