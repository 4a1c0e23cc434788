//! Summary feedback window: egui/eframe application.
//!
//! # Architecture
//!
//! [`SummaryApp`] is the top-level [`eframe::App`].  It owns the text the
//! user is typing and two channel endpoints:
//!
//! * `command_tx` sends [`SessionCommand`] to the session loop.
//! * `view_rx` receives [`SessionView`] snapshots back.
//!
//! # Layout
//!
//! | Row | Widget |
//! |-----|--------|
//! | 1 | Multiline input |
//! | 2 | 要約 button (disabled while a submission is in flight) |
//! | 3 | Read-only output (final stage text) |
//! | 4 | 👍 / 👎 buttons (disabled while busy), "評価済み" once rated |
//! | 5 | Download button (enabled once a result exists) |
//! | 6 | Status line |

use std::path::PathBuf;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::session::{SessionCommand, SessionView};
use crate::store::Vote;

// ---------------------------------------------------------------------------
// SummaryApp
// ---------------------------------------------------------------------------

/// eframe application: one interactive session.
pub struct SummaryApp {
    /// Text in the input box; sent as-is, normalization happens downstream.
    input: String,

    /// Latest snapshot from the session loop.
    view: SessionView,

    /// Set by the UI itself (download result, closed channel).  Cleared by
    /// the next snapshot from the session loop.
    local_status: Option<String>,

    /// A submit was sent and its first snapshot has not arrived yet.
    pending: bool,

    download_path: PathBuf,

    command_tx: mpsc::Sender<SessionCommand>,
    view_rx: mpsc::Receiver<SessionView>,
}

impl SummaryApp {
    /// * `command_tx` sender end of the session command channel.
    /// * `view_rx`    receiver end of the session view channel.
    /// * `download_dir` where the CSV is written on download.
    pub fn new(
        command_tx: mpsc::Sender<SessionCommand>,
        view_rx: mpsc::Receiver<SessionView>,
        config: &AppConfig,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            input: String::new(),
            view: SessionView::default(),
            local_status: None,
            pending: false,
            download_path: download_dir.join(&config.ui.download_file_name),
            command_tx,
            view_rx,
        }
    }

    fn busy(&self) -> bool {
        self.pending || self.view.busy
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain all pending snapshots (non-blocking); the newest wins.
    fn poll_views(&mut self) {
        while let Ok(view) = self.view_rx.try_recv() {
            self.view = view;
            self.pending = false;
            self.local_status = None;
        }
    }

    fn send(&mut self, cmd: SessionCommand) {
        if let Err(e) = self.command_tx.try_send(cmd) {
            log::warn!("ui: command not delivered: {e}");
            self.pending = false;
            self.local_status = Some("処理を受け付けられませんでした".into());
        }
    }

    // ── Actions ──────────────────────────────────────────────────────────

    fn submit(&mut self) {
        self.pending = true;
        self.send(SessionCommand::Summarize(self.input.clone()));
    }

    /// Vote on the record currently on screen.
    fn rate(&mut self, vote: Vote) {
        self.send(SessionCommand::Rate(self.view.key.clone(), vote));
    }

    fn download(&mut self) {
        let Some(payload) = &self.view.download_payload else {
            return;
        };
        let message = match std::fs::write(&self.download_path, payload) {
            Ok(()) => {
                log::info!("ui: wrote {}", self.download_path.display());
                format!("保存しました: {}", self.download_path.display())
            }
            Err(e) => {
                log::error!("ui: download to {} failed: {e}", self.download_path.display());
                format!("保存に失敗しました: {e}")
            }
        };
        self.local_status = Some(message);
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn draw_input(&mut self, ui: &mut egui::Ui) {
        ui.label("文書");
        ui.add(
            egui::TextEdit::multiline(&mut self.input)
                .desired_rows(8)
                .desired_width(f32::INFINITY),
        );

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            if ui.add_enabled(!self.busy(), egui::Button::new("要約")).clicked() {
                self.submit();
            }
            if self.busy() {
                ui.spinner();
            }
        });
    }

    fn draw_output(&mut self, ui: &mut egui::Ui) {
        ui.label("結果");
        let mut shown = self.view.display_text.as_str();
        ui.add(
            egui::TextEdit::multiline(&mut shown)
                .desired_rows(6)
                .desired_width(f32::INFINITY),
        );

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            let can_vote = !self.busy();
            if ui.add_enabled(can_vote, egui::Button::new("👍")).clicked() {
                self.rate(Vote::Up);
            }
            if ui.add_enabled(can_vote, egui::Button::new("👎")).clicked() {
                self.rate(Vote::Down);
            }
            if self.view.submitted {
                ui.label(
                    egui::RichText::new("評価済み")
                        .color(egui::Color32::from_rgb(80, 200, 120))
                        .size(12.0),
                );
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add_enabled(self.view.download_enabled(), egui::Button::new("ダウンロード"))
                    .clicked()
                {
                    self.download();
                }
            });
        });
    }

    fn draw_status(&self, ui: &mut egui::Ui) {
        let status = self
            .local_status
            .as_deref()
            .unwrap_or(self.view.status_message.as_str());
        if !status.is_empty() {
            ui.label(
                egui::RichText::new(status)
                    .color(egui::Color32::from_rgb(160, 160, 160))
                    .size(12.0),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for SummaryApp {
    /// Called every frame by eframe.  Polls the view channel, then renders.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_views();

        // Results arrive off the UI thread; keep polling.
        if self.busy() {
            ctx.request_repaint_after(Duration::from_millis(66));
        } else {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_input(ui);
            ui.separator();
            self.draw_output(ui);
            ui.separator();
            self.draw_status(ui);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("summary window closing");
    }
}
