//! Chart specifications: plain data computed from a dataset view, turned
//! into plots by `ui::plot`.

use std::collections::{BTreeMap, BTreeSet};

use crate::data::filter::require_column;
use crate::data::model::{ColumnKind, Dataset, Value};
use crate::data::stats::{min_max, BoxStats};
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

/// One named series of bar heights.
#[derive(Debug, Clone, PartialEq)]
pub struct CountSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Label used for grouping; absent cells get their own group.
fn label(value: &Value) -> String {
    value.to_string()
}

// ---------------------------------------------------------------------------
// Category histogram (vehicle types by manufacturer)
// ---------------------------------------------------------------------------

/// Counts of each `x` category, split into one stacked series per value of
/// the color column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryHistogram {
    pub x_column: String,
    pub color_column: String,
    pub categories: Vec<String>,
    pub series: Vec<CountSeries>,
}

pub fn category_histogram(
    dataset: &Dataset,
    view: &[usize],
    x_column: &str,
    color_column: &str,
) -> Result<CategoryHistogram, DashboardError> {
    let x_column = require_column(dataset, Some(x_column))?;
    let color_column = require_column(dataset, Some(color_column))?;

    let mut counts: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    let mut categories: BTreeSet<String> = BTreeSet::new();
    for &i in view {
        let x = label(dataset.value(i, x_column));
        let color = label(dataset.value(i, color_column));
        *counts.entry(color).or_default().entry(x.clone()).or_default() += 1.0;
        categories.insert(x);
    }

    let categories: Vec<String> = categories.into_iter().collect();
    let series = counts
        .into_iter()
        .map(|(name, by_x)| CountSeries {
            name,
            values: categories
                .iter()
                .map(|c| by_x.get(c).copied().unwrap_or(0.0))
                .collect(),
        })
        .collect();

    Ok(CategoryHistogram {
        x_column: x_column.to_string(),
        color_column: color_column.to_string(),
        categories,
        series,
    })
}

// ---------------------------------------------------------------------------
// Numeric histogram (price of two manufacturers)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistNorm {
    Count,
    /// Percent of each series' own total.
    Percent,
}

/// Equal-width bins shared by every series, overlaid in the plot.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub value_column: String,
    pub start: f64,
    pub bin_width: f64,
    pub norm: HistNorm,
    pub series: Vec<CountSeries>,
}

impl Histogram {
    pub fn bin_center(&self, bin: usize) -> f64 {
        self.start + (bin as f64 + 0.5) * self.bin_width
    }

    pub fn y_label(&self) -> &'static str {
        match self.norm {
            HistNorm::Count => "Count",
            HistNorm::Percent => "Percentage",
        }
    }
}

pub fn numeric_histogram(
    dataset: &Dataset,
    view: &[usize],
    value_column: &str,
    group_column: &str,
    bins: usize,
    norm: HistNorm,
) -> Result<Histogram, DashboardError> {
    let value_column = require_column(dataset, Some(value_column))?;
    let group_column = require_column(dataset, Some(group_column))?;

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for &i in view {
        if let Some(v) = dataset.value(i, value_column).as_f64() {
            groups
                .entry(label(dataset.value(i, group_column)))
                .or_default()
                .push(v);
        }
    }

    let (lo, hi) = min_max(groups.values().flatten().copied())
        .ok_or_else(|| DashboardError::empty(format!("numeric {value_column} values")))?;
    let bins = bins.max(1);
    let (start, bin_width) = if hi > lo {
        (lo, (hi - lo) / bins as f64)
    } else {
        (lo - 0.5, 1.0 / bins as f64)
    };

    let series = groups
        .into_iter()
        .map(|(name, values)| {
            let mut counts = vec![0.0; bins];
            for v in &values {
                let bin = (((v - start) / bin_width).floor() as usize).min(bins - 1);
                counts[bin] += 1.0;
            }
            if norm == HistNorm::Percent {
                let total = values.len() as f64;
                counts.iter_mut().for_each(|c| *c = *c / total * 100.0);
            }
            CountSeries { name, values: counts }
        })
        .collect();

    Ok(Histogram {
        value_column: value_column.to_string(),
        start,
        bin_width,
        norm,
        series,
    })
}

// ---------------------------------------------------------------------------
// Scatter matrix
// ---------------------------------------------------------------------------

/// How a column maps onto a plot axis.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisEncoding {
    Numeric,
    /// Category labels; a point's coordinate is its label's index.
    Categorical(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub column: String,
    pub encoding: AxisEncoding,
}

impl Axis {
    fn for_column(dataset: &Dataset, column: &str) -> Self {
        let encoding = match dataset.column_kind(column) {
            Some(ColumnKind::Numeric) => AxisEncoding::Numeric,
            _ => AxisEncoding::Categorical(dataset.distinct_labels(column)),
        };
        Axis {
            column: column.to_string(),
            encoding,
        }
    }

    fn coordinate(&self, value: &Value) -> Option<f64> {
        match &self.encoding {
            AxisEncoding::Numeric => value.as_f64(),
            AxisEncoding::Categorical(labels) => {
                if value.is_null() {
                    return None;
                }
                let text = value.to_string();
                labels.iter().position(|l| *l == text).map(|p| p as f64)
            }
        }
    }

    /// Tick label for a plot coordinate.
    pub fn tick_label(&self, coordinate: f64) -> Option<String> {
        match &self.encoding {
            AxisEncoding::Numeric => None,
            AxisEncoding::Categorical(labels) => {
                let rounded = coordinate.round();
                if (coordinate - rounded).abs() > 1e-6 || rounded < 0.0 {
                    return None;
                }
                labels.get(rounded as usize).cloned()
            }
        }
    }
}

/// Points of one color group. `shades` is filled (0..1, one per point)
/// only when coloring by a numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub shades: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPanel {
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<ScatterSeries>,
}

/// Row-major `n × n` grid of panels for `n` dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterMatrix {
    pub dimensions: Vec<String>,
    pub color_column: String,
    pub panels: Vec<ScatterPanel>,
}

impl ScatterMatrix {
    pub fn panel(&self, row: usize, col: usize) -> Option<&ScatterPanel> {
        self.panels.get(row * self.dimensions.len() + col)
    }
}

pub fn scatter_matrix(
    dataset: &Dataset,
    view: &[usize],
    dimensions: &[Option<&str>],
    color_column: Option<&str>,
) -> Result<ScatterMatrix, DashboardError> {
    let dimensions = dimensions
        .iter()
        .map(|d| require_column(dataset, *d))
        .collect::<Result<Vec<_>, _>>()?;
    let color_column = require_column(dataset, color_column)?;
    if view.is_empty() {
        return Err(DashboardError::empty("the scatter plot matrix"));
    }

    let axes: Vec<Axis> = dimensions
        .iter()
        .map(|d| Axis::for_column(dataset, d))
        .collect();
    let numeric_color = dataset.column_kind(color_column) == Some(ColumnKind::Numeric);
    let shade_range = if numeric_color {
        min_max(view.iter().filter_map(|&i| dataset.value(i, color_column).as_f64()))
    } else {
        None
    };

    let mut panels = Vec::with_capacity(axes.len() * axes.len());
    for y in &axes {
        for x in &axes {
            let mut groups: BTreeMap<String, ScatterSeries> = BTreeMap::new();
            for &i in view {
                let (Some(px), Some(py)) = (
                    x.coordinate(dataset.value(i, &x.column)),
                    y.coordinate(dataset.value(i, &y.column)),
                ) else {
                    continue;
                };
                let color = dataset.value(i, color_column);
                let name = if numeric_color {
                    color_column.to_string()
                } else {
                    label(color)
                };
                let series = groups.entry(name.clone()).or_insert_with(|| ScatterSeries {
                    name,
                    points: Vec::new(),
                    shades: Vec::new(),
                });
                series.points.push([px, py]);
                if let Some((lo, hi)) = shade_range {
                    let shade = color
                        .as_f64()
                        .map(|c| if hi > lo { (c - lo) / (hi - lo) } else { 0.5 })
                        .unwrap_or(0.0);
                    series.shades.push(shade);
                }
            }
            panels.push(ScatterPanel {
                x: x.clone(),
                y: y.clone(),
                series: groups.into_values().collect(),
            });
        }
    }

    Ok(ScatterMatrix {
        dimensions: dimensions.iter().map(|d| d.to_string()).collect(),
        color_column: color_column.to_string(),
        panels,
    })
}

// ---------------------------------------------------------------------------
// Box plot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BoxGroup {
    pub name: String,
    pub stats: BoxStats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxPlotSpec {
    pub value_column: String,
    pub group_column: String,
    pub groups: Vec<BoxGroup>,
}

pub fn box_plot(
    dataset: &Dataset,
    view: &[usize],
    value_column: Option<&str>,
    group_column: Option<&str>,
) -> Result<BoxPlotSpec, DashboardError> {
    let value_column = require_column(dataset, value_column)?;
    let group_column = require_column(dataset, group_column)?;

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for &i in view {
        if let Some(v) = dataset.value(i, value_column).as_f64() {
            groups
                .entry(label(dataset.value(i, group_column)))
                .or_default()
                .push(v);
        }
    }
    let groups: Vec<BoxGroup> = groups
        .into_iter()
        .filter_map(|(name, values)| {
            BoxStats::from_values(values).map(|stats| BoxGroup { name, stats })
        })
        .collect();
    if groups.is_empty() {
        return Err(DashboardError::empty(format!("numeric {value_column} values")));
    }

    Ok(BoxPlotSpec {
        value_column: value_column.to_string(),
        group_column: group_column.to_string(),
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Row;

    fn listing(manufacturer: &str, kind: &str, price: f64, odometer: i64) -> Row {
        let mut row = Row::new();
        row.insert("manufacturer".into(), Value::String(manufacturer.into()));
        row.insert("type".into(), Value::String(kind.into()));
        row.insert("price".into(), Value::Float(price));
        row.insert("odometer".into(), Value::Integer(odometer));
        row
    }

    fn lot() -> Dataset {
        Dataset::new(
            vec!["manufacturer".into(), "type".into(), "price".into(), "odometer".into()],
            vec![
                listing("ford", "truck", 0.0, 100),
                listing("ford", "sedan", 10.0, 200),
                listing("bmw", "sedan", 10.0, 300),
                listing("bmw", "sedan", 5.0, 400),
            ],
        )
    }

    #[test]
    fn category_histogram_stacks_by_color() {
        let ds = lot();
        let h = category_histogram(&ds, &ds.all_indices(), "manufacturer", "type").unwrap();
        assert_eq!(h.categories, vec!["bmw", "ford"]);
        assert_eq!(
            h.series,
            vec![
                CountSeries { name: "sedan".into(), values: vec![2.0, 1.0] },
                CountSeries { name: "truck".into(), values: vec![0.0, 1.0] },
            ]
        );
    }

    #[test]
    fn histogram_shares_bins_across_groups() {
        let ds = lot();
        let h = numeric_histogram(&ds, &ds.all_indices(), "price", "manufacturer", 2, HistNorm::Count)
            .unwrap();
        assert_eq!((h.start, h.bin_width, h.series[0].values.len()), (0.0, 5.0, 2));
        // bmw: 10 → last bin, 5 → second bin. ford: 0 → first, 10 → last.
        assert_eq!(h.series[0].values, vec![0.0, 2.0]);
        assert_eq!(h.series[1].values, vec![1.0, 1.0]);
        assert_eq!(h.bin_center(0), 2.5);
        assert_eq!(h.y_label(), "Count");
    }

    #[test]
    fn normalized_histogram_is_percent_of_group() {
        let ds = lot();
        let h = numeric_histogram(&ds, &[0, 1, 2], "price", "manufacturer", 2, HistNorm::Percent)
            .unwrap();
        assert_eq!(h.series[0].values, vec![0.0, 100.0]);
        assert_eq!(h.series[1].values, vec![50.0, 50.0]);
        assert_eq!(h.y_label(), "Percentage");
    }

    #[test]
    fn histogram_of_constant_values_has_one_filled_bin() {
        let ds = lot();
        let h = numeric_histogram(&ds, &[1, 2], "price", "manufacturer", 4, HistNorm::Count).unwrap();
        let total: f64 = h.series.iter().flat_map(|s| s.values.iter()).sum();
        assert_eq!(total, 2.0);
        assert!(h.bin_width > 0.0);
    }

    #[test]
    fn unknown_column_is_invalid_choice() {
        let ds = lot();
        let err = numeric_histogram(&ds, &[0], "mpg", "manufacturer", 5, HistNorm::Count).unwrap_err();
        assert_eq!(err, DashboardError::InvalidColumnChoice { column: "mpg".into() });
    }

    #[test]
    fn scatter_matrix_grid_and_color_groups() {
        let ds = lot();
        let m = scatter_matrix(
            &ds,
            &ds.all_indices(),
            &[Some("odometer"), Some("price")],
            Some("type"),
        )
        .unwrap();
        assert_eq!(m.panels.len(), 4);
        let p = m.panel(0, 1).unwrap();
        assert_eq!((p.x.column.as_str(), p.y.column.as_str()), ("price", "odometer"));
        let names: Vec<&str> = p.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["sedan", "truck"]);
        assert_eq!(p.series[1].points, vec![[0.0, 100.0]]);
        assert!(p.series[0].shades.is_empty());
    }

    #[test]
    fn categorical_axis_uses_label_rank() {
        let ds = lot();
        let m = scatter_matrix(&ds, &[0, 2], &[Some("manufacturer")], Some("price")).unwrap();
        let p = m.panel(0, 0).unwrap();
        assert_eq!(p.series.len(), 1);
        assert_eq!(p.series[0].points, vec![[1.0, 1.0], [0.0, 0.0]]);
        assert_eq!(p.series[0].shades, vec![0.0, 1.0]);
        assert_eq!(p.x.tick_label(0.0).as_deref(), Some("bmw"));
        assert_eq!(p.x.tick_label(0.5), None);
    }

    #[test]
    fn scatter_matrix_rejects_missing_columns_and_empty_views() {
        let ds = lot();
        assert!(matches!(
            scatter_matrix(&ds, &[0], &[Some("odometer"), None], Some("type")),
            Err(DashboardError::InvalidColumnChoice { .. })
        ));
        assert!(matches!(
            scatter_matrix(&ds, &[], &[Some("odometer")], Some("type")),
            Err(DashboardError::EmptySelection { .. })
        ));
    }

    #[test]
    fn box_plot_per_group() {
        let ds = lot();
        let spec = box_plot(&ds, &ds.all_indices(), Some("price"), Some("manufacturer")).unwrap();
        assert_eq!(spec.groups.len(), 2);
        assert_eq!(spec.groups[0].name, "bmw");
        assert_eq!(spec.groups[0].stats.median, 7.5);
        assert_eq!(spec.groups[1].stats.count, 2);
    }
}
