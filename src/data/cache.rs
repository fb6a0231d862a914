use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::DashboardError;

use super::clean::{clean_with_report, CleaningReport, CleaningRules};
use super::filter::{filter_manufacturer_pair, filter_price_range, FilterSelection};
use super::loader::load_file;
use super::model::Dataset;

/// Filter results kept before the view cache is flushed.
const MAX_CACHED_VIEWS: usize = 64;

// ---------------------------------------------------------------------------
// Cache keys
// ---------------------------------------------------------------------------

/// Identifies one version of a file on disk: length and modification time.
type FileSignature = (u64, Option<SystemTime>);

fn file_signature(path: &Path) -> Result<FileSignature, DashboardError> {
    let meta = std::fs::metadata(path)
        .ok()
        .filter(|m| m.is_file())
        .ok_or_else(|| DashboardError::FileNotFound {
            path: path.to_path_buf(),
        })?;
    Ok((meta.len(), meta.modified().ok()))
}

/// Dataset generation, `f64::to_bits` of the price bounds, manufacturer pair.
type ViewKey = (u64, Option<(u64, u64)>, Option<String>, Option<String>);

fn view_key(generation: u64, selection: &FilterSelection) -> ViewKey {
    (
        generation,
        selection
            .price_range
            .map(|r| (r.min.to_bits(), r.max.to_bits())),
        selection.manufacturer1.clone(),
        selection.manufacturer2.clone(),
    )
}

// ---------------------------------------------------------------------------
// Cached values
// ---------------------------------------------------------------------------

/// Output of the load + clean stage for one file version.
#[derive(Debug)]
pub struct LoadedData {
    /// Distinguishes datasets in view cache keys.
    pub generation: u64,
    pub path: PathBuf,
    pub raw: Dataset,
    pub cleaned: Dataset,
    pub report: CleaningReport,
}

/// Output of the filter stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Views {
    /// Rows of the cleaned dataset inside the price range.
    pub priced: Result<Vec<usize>, DashboardError>,
    /// Rows of `priced` from the two chosen manufacturers.
    pub pair: Result<Vec<usize>, DashboardError>,
}

// ---------------------------------------------------------------------------
// PipelineCache
// ---------------------------------------------------------------------------

/// Memoizes load + clean by (path, file signature) for the most recently
/// loaded file, and filtering by (dataset generation, price range,
/// manufacturer pair).
pub struct PipelineCache {
    rules: CleaningRules,
    loads: HashMap<(PathBuf, FileSignature), Arc<LoadedData>>,
    views: HashMap<ViewKey, Arc<Views>>,
    next_generation: u64,
}

impl PipelineCache {
    pub fn new(rules: CleaningRules) -> Self {
        Self {
            rules,
            loads: HashMap::new(),
            views: HashMap::new(),
            next_generation: 0,
        }
    }

    /// Load and clean `path`, reusing the previous result while the file is
    /// unchanged on disk.
    pub fn load(&mut self, path: &Path) -> Result<Arc<LoadedData>, DashboardError> {
        let signature = file_signature(path)?;
        let key = (path.to_path_buf(), signature);
        if let Some(hit) = self.loads.get(&key) {
            log::debug!("cache hit for {}", path.display());
            return Ok(Arc::clone(hit));
        }

        log::info!("loading {}", path.display());
        let raw = load_file(path)?;
        let (cleaned, report) = clean_with_report(&raw, &self.rules);
        log::info!(
            "loaded {} listings with columns {:?}; filled {} cells",
            raw.len(),
            raw.column_names,
            report.total_filled()
        );

        let generation = self.next_generation;
        self.next_generation += 1;
        let data = Arc::new(LoadedData {
            generation,
            path: path.to_path_buf(),
            raw,
            cleaned,
            report,
        });

        // Only the dataset on screen is kept; views of older ones go too.
        self.loads.clear();
        self.views.clear();
        self.loads.insert(key, Arc::clone(&data));
        Ok(data)
    }

    /// Filter the cleaned dataset for the current selection.
    pub fn views(&mut self, data: &LoadedData, selection: &FilterSelection) -> Arc<Views> {
        let key = view_key(data.generation, selection);
        if let Some(hit) = self.views.get(&key) {
            return Arc::clone(hit);
        }

        let dataset = &data.cleaned;
        let priced = match selection.price_range {
            Some(range) => filter_price_range(dataset, range),
            None if dataset.is_empty() => Err(DashboardError::empty("this file")),
            None => Ok(dataset.all_indices()),
        };
        let pair = match &priced {
            Ok(view) => filter_manufacturer_pair(
                dataset,
                view,
                selection.manufacturer1.as_deref(),
                selection.manufacturer2.as_deref(),
            ),
            Err(e) => Err(e.clone()),
        };
        for err in [&priced, &pair].into_iter().filter_map(|r| r.as_ref().err()) {
            log::debug!("selection: {err}");
        }

        if self.views.len() >= MAX_CACHED_VIEWS {
            self.views.clear();
        }
        let views = Arc::new(Views { priced, pair });
        self.views.insert(key, Arc::clone(&views));
        views
    }
}
