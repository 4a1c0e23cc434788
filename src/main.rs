//! Application entry point: summary feedback window.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk.  On first run the defaults are written
//!    out as a template; the result is then validated.
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the prediction client and the pipeline from the configured
//!    stages.
//! 5. Open the SQLite record store (degrades to an unavailable store).
//! 6. Create session channels (`command`, `view`) and spawn the session
//!    loop on the runtime.
//! 7. Run [`eframe::run_native`], which blocks the main thread until the
//!    window is closed.

use std::sync::Arc;

use async_trait::async_trait;
use eframe::egui;
use tokio::sync::mpsc;

use summary_feedback::{
    app::SummaryApp,
    config::{AppConfig, AppPaths},
    pipeline::PipelineRunner,
    predict::{DataRobotClient, Predictor},
    session::{run_session, SessionCommand, SessionView, Workflow},
    store::{Record, RecordKey, RecordStore, SqliteRecordStore, StoreError, Vote},
};

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (w, h) = config.ui.window_size;
    let vp = egui::ViewportBuilder::default()
        .with_title("要約フィードバック")
        .with_inner_size([w, h])
        .with_min_inner_size([360.0, 320.0]);

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("summary feedback starting up");

    // 2. Configuration
    let paths = AppPaths::new();
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    if !paths.settings_file.exists() {
        // First run: leave a template for the credentials and deployment ids.
        match config.save() {
            Ok(()) => log::info!("Wrote default settings to {}", paths.settings_file.display()),
            Err(e) => log::warn!("Could not write default settings: {e}"),
        }
    }
    if let Err(e) = config.validate() {
        log::error!("Configuration is incomplete: {e:#}. Requests will fail until settings.toml is fixed.");
    }

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;

    // 4. Prediction pipeline
    let predictor: Arc<dyn Predictor> = Arc::new(DataRobotClient::from_config(&config.prediction));
    let runner = PipelineRunner::new(predictor, config.pipeline.stages.clone());
    log::info!(
        "pipeline: {}",
        runner
            .stages()
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(" → ")
    );

    // 5. Record store
    let columns: Vec<String> = runner.stages().iter().map(|s| s.column.clone()).collect();
    let db_path = config.store.resolved_path();
    let store: Arc<dyn RecordStore> = match rt.block_on(SqliteRecordStore::open(
        &db_path,
        &config.store.table,
        &columns,
    )) {
        Ok(store) => {
            log::info!("Record store opened: {}", db_path.display());
            Arc::new(store)
        }
        Err(e) => {
            log::error!("Could not open record store ({}): {e}", db_path.display());
            Arc::new(UnavailableStore {
                reason: e.to_string(),
            })
        }
    };

    // 6. Session loop
    let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(16);
    let (view_tx, view_rx) = mpsc::channel::<SessionView>(32);

    let workflow = Arc::new(Workflow::new(runner, store));
    rt.spawn(run_session(workflow, command_rx, view_tx));

    // 7. Window (blocks until closed)
    let app = SummaryApp::new(command_tx, view_rx, &config, paths.download_dir.clone());
    let options = native_options(&config);

    eframe::run_native(
        "summary-feedback",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}

// ---------------------------------------------------------------------------
// UnavailableStore: fallback RecordStore when the database cannot be opened
// ---------------------------------------------------------------------------

struct UnavailableStore {
    reason: String,
}

#[async_trait]
impl RecordStore for UnavailableStore {
    async fn append(&self, _record: &Record) -> Result<(), StoreError> {
        Err(StoreError::Connection(self.reason.clone()))
    }

    async fn update_rating(&self, _key: &RecordKey, _vote: Vote) -> Result<(), StoreError> {
        Err(StoreError::Connection(self.reason.clone()))
    }

    async fn get(&self, _key: &RecordKey) -> Result<Option<Record>, StoreError> {
        Err(StoreError::Connection(self.reason.clone()))
    }
}
