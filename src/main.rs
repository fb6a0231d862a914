mod app;
mod chart;
mod color;
mod config;
mod data;
mod error;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use app::ExplorerApp;
use clap::Parser;
use config::DashboardConfig;
use eframe::egui;
use state::AppState;

#[derive(Parser)]
#[command(name = "listings-explorer", version, about = "Explore used-vehicle listings")]
struct Cli {
    /// Listings file to open (.csv, .json, .parquet); overrides the config
    data: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.data {
        config.data_path = path;
    }

    let mut state = AppState::new(config);
    state.reload();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Listings Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(ExplorerApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to start the UI: {e}"))
}
