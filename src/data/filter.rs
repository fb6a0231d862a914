use crate::error::DashboardError;

use super::model::columns::{MANUFACTURER, PRICE};
use super::model::Dataset;
use super::stats::min_max;

// ---------------------------------------------------------------------------
// Filter selection: what the user picked in the side panel
// ---------------------------------------------------------------------------

/// Inclusive price bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        self.min <= price && price <= self.max
    }
}

/// All user-chosen parameters. Rebuilt from control state on every frame
/// and never persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSelection {
    /// `None` means "no price constraint".
    pub price_range: Option<PriceRange>,
    pub manufacturer1: Option<String>,
    pub manufacturer2: Option<String>,
    /// Show the price histogram as percent of each manufacturer.
    pub normalized: bool,
    pub scatter_x: Option<String>,
    pub scatter_y: Option<String>,
    pub scatter_color: Option<String>,
    pub box_value: Option<String>,
    pub box_group: Option<String>,
    pub row_limit: usize,
}

impl FilterSelection {
    /// Defaults for a freshly loaded dataset: full price range, the 2nd and
    /// 3rd manufacturer to appear in the file, `odometer`/`price`/`type`
    /// for the scatter matrix.
    pub fn defaults_for(dataset: &Dataset, row_limit: usize, row_step: usize) -> Self {
        let manufacturers = dataset.labels_in_row_order(MANUFACTURER);
        let picks = pick_defaults(&[], &manufacturers, 3);
        let manufacturer_at = |slot: usize| picks.get(slot).map(|&i| manufacturers[i].clone());

        let plot_columns = plot_columns(dataset);
        let scatter = pick_defaults(&["odometer", "price", "type"], &plot_columns, 3);
        let scatter_at = |slot: usize| scatter.get(slot).map(|&i| plot_columns[i].clone());

        let numeric = dataset.numeric_columns();
        let box_value = pick_defaults(&[PRICE], &numeric, 1)
            .first()
            .map(|&i| numeric[i].clone());
        let categorical = dataset.categorical_columns();
        let box_group = pick_defaults(&["condition"], &categorical, 1)
            .first()
            .map(|&i| categorical[i].clone());

        FilterSelection {
            price_range: price_bounds(dataset).map(|(min, max)| PriceRange { min, max }),
            manufacturer1: manufacturer_at(1),
            manufacturer2: manufacturer_at(2),
            normalized: false,
            scatter_x: scatter_at(0),
            scatter_y: scatter_at(1),
            scatter_color: scatter_at(2),
            box_value,
            box_group,
            row_limit: clamp_row_limit(row_limit, row_step, dataset.len()),
        }
    }
}

/// Candidate columns for the scatter matrix: numeric first, then categorical.
pub fn plot_columns(dataset: &Dataset) -> Vec<String> {
    let mut cols = dataset.numeric_columns();
    cols.extend(dataset.categorical_columns());
    cols
}

// ---------------------------------------------------------------------------
// Default picking
// ---------------------------------------------------------------------------

/// Choose `count` indices into `available`.
///
/// Slot `i` takes `preferred[i]` when that item is available and not yet
/// taken. Remaining slots take position `i` if free, else the first free
/// position. Once every item is taken, slots repeat the last position
/// (`min(i, len - 1)`). Empty `available` yields no picks.
pub fn pick_defaults(preferred: &[&str], available: &[String], count: usize) -> Vec<usize> {
    if available.is_empty() {
        return Vec::new();
    }
    let mut picks: Vec<Option<usize>> = vec![None; count];
    let mut taken = vec![false; available.len()];

    for (slot, want) in preferred.iter().take(count).enumerate() {
        if let Some(pos) = available.iter().position(|a| a == want) {
            if !taken[pos] {
                taken[pos] = true;
                picks[slot] = Some(pos);
            }
        }
    }

    for (slot, pick) in picks.iter_mut().enumerate() {
        if pick.is_some() {
            continue;
        }
        let pos = if slot < available.len() && !taken[slot] {
            Some(slot)
        } else {
            taken.iter().position(|t| !t)
        };
        let pos = pos.unwrap_or(slot.min(available.len() - 1));
        taken[pos] = true;
        *pick = Some(pos);
    }

    picks.into_iter().flatten().collect()
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Smallest and largest numeric price in the dataset.
pub fn price_bounds(dataset: &Dataset) -> Option<(f64, f64)> {
    min_max((0..dataset.len()).filter_map(|i| dataset.value(i, PRICE).as_f64()))
}

/// Indices of rows whose price lies in `range` (inclusive).
pub fn filter_price_range(
    dataset: &Dataset,
    range: PriceRange,
) -> Result<Vec<usize>, DashboardError> {
    let view: Vec<usize> = (0..dataset.len())
        .filter(|&i| {
            dataset
                .value(i, PRICE)
                .as_f64()
                .is_some_and(|p| range.contains(p))
        })
        .collect();
    if view.is_empty() {
        return Err(DashboardError::empty(format!(
            "prices between {} and {}",
            range.min, range.max
        )));
    }
    Ok(view)
}

/// Rows of `view` listed by either of two distinct manufacturers.
pub fn filter_manufacturer_pair(
    dataset: &Dataset,
    view: &[usize],
    first: Option<&str>,
    second: Option<&str>,
) -> Result<Vec<usize>, DashboardError> {
    let (first, second) = match (first, second) {
        (Some(a), Some(b)) if a != b => (a, b),
        _ => return Err(DashboardError::InvalidManufacturerPair),
    };
    let pair: Vec<usize> = view
        .iter()
        .copied()
        .filter(|&i| {
            dataset
                .value(i, MANUFACTURER)
                .as_str()
                .is_some_and(|m| m == first || m == second)
        })
        .collect();
    if pair.is_empty() {
        return Err(DashboardError::empty(format!("{first} and {second}")));
    }
    Ok(pair)
}

/// Clamp a requested row count to `[step, total]`, where `step` itself is
/// capped at `total` for tiny datasets.
pub fn clamp_row_limit(requested: usize, step: usize, total: usize) -> usize {
    requested.clamp(step.min(total), total)
}

/// The first `n` rows of a view.
pub fn head(view: &[usize], n: usize) -> &[usize] {
    &view[..n.min(view.len())]
}

/// Fail with [`DashboardError::InvalidColumnChoice`] unless `column` is set
/// and present in the schema.
pub fn require_column<'a>(
    dataset: &Dataset,
    column: Option<&'a str>,
) -> Result<&'a str, DashboardError> {
    match column {
        Some(c) if dataset.has_column(c) => Ok(c),
        other => Err(DashboardError::InvalidColumnChoice {
            column: other.unwrap_or("<none>").to_string(),
        }),
    }
}
