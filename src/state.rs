use std::path::PathBuf;
use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::data::cache::{LoadedData, PipelineCache, Views};
use crate::data::filter::{clamp_row_limit, head, price_bounds, FilterSelection, PriceRange};
use crate::data::model::columns::MANUFACTURER;
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    cache: PipelineCache,

    /// File currently shown (or that failed to load).
    pub data_path: PathBuf,

    /// Raw + cleaned dataset (None until a load succeeds).
    pub data: Option<Arc<LoadedData>>,

    /// Set when the last load failed; the dashboard shows only this.
    pub load_error: Option<DashboardError>,

    /// Current control values.
    pub selection: FilterSelection,

    /// Show the table as read from disk instead of cleaned.
    pub show_raw: bool,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            cache: PipelineCache::new(config.cleaning.clone()),
            data_path: config.data_path.clone(),
            config,
            data: None,
            load_error: None,
            selection: FilterSelection::default(),
            show_raw: false,
        }
    }

    /// Load (or re-use) the dataset at `path`. Control values reset only
    /// when a new dataset version comes back.
    pub fn open(&mut self, path: PathBuf) {
        match self.cache.load(&path) {
            Ok(data) => {
                let same = self
                    .data
                    .as_ref()
                    .is_some_and(|d| d.generation == data.generation);
                if !same {
                    self.selection = FilterSelection::defaults_for(
                        &data.cleaned,
                        self.config.default_row_limit,
                        self.config.row_limit_step,
                    );
                }
                self.data = Some(data);
                self.load_error = None;
            }
            Err(e) => {
                log::error!("{e}");
                self.data = None;
                self.load_error = Some(e);
            }
        }
        self.data_path = path;
    }

    /// Re-read the current file if it changed on disk.
    pub fn reload(&mut self) {
        self.open(self.data_path.clone());
    }

    /// Filter views for the current selection.
    pub fn views(&mut self) -> Option<Arc<Views>> {
        let data = self.data.clone()?;
        Some(self.cache.views(&data, &self.selection))
    }

    /// Distinct manufacturers of the cleaned dataset, sorted.
    pub fn manufacturers(&self) -> Vec<String> {
        self.data
            .as_ref()
            .map(|d| d.cleaned.distinct_labels(MANUFACTURER))
            .unwrap_or_default()
    }

    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        self.data.as_ref().and_then(|d| price_bounds(&d.cleaned))
    }

    /// Move one end of the price range, dragging the other along so that
    /// `min <= max` holds.
    pub fn set_price_range(&mut self, min: f64, max: f64) {
        let Some((lo, hi)) = self.price_bounds() else {
            return;
        };
        let current = self.selection.price_range;
        let (min, max) = (min.clamp(lo, hi), max.clamp(lo, hi));
        let moved_min = current.map_or(true, |r| r.min != min);
        let (min, max) = match (min > max, moved_min) {
            (true, true) => (min, min),
            (true, false) => (max, max),
            (false, _) => (min, max),
        };
        self.selection.price_range = Some(PriceRange { min, max });
    }

    pub fn set_row_limit(&mut self, requested: usize) {
        let total = self.data.as_ref().map_or(0, |d| d.cleaned.len());
        self.selection.row_limit = clamp_row_limit(requested, self.config.row_limit_step, total);
    }

    /// Rows shown in the data table: the head of the price view, or of the
    /// whole raw dataset when showing raw data.
    pub fn table_rows(&self, views: &Views) -> Vec<usize> {
        let limit = self.selection.row_limit;
        match (&self.data, self.show_raw) {
            (Some(d), true) => head(&d.raw.all_indices(), limit).to_vec(),
            (Some(_), false) => views
                .priced
                .as_deref()
                .map(|v| head(v, limit).to_vec())
                .unwrap_or_default(),
            (None, _) => Vec::new(),
        }
    }
}
