use std::ops::RangeInclusive;

use eframe::egui::{self, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Plot, PlotPoints, Points,
};

use crate::chart::{
    Axis, AxisEncoding, BoxPlotSpec, CategoryHistogram, Histogram, ScatterMatrix, ScatterPanel,
};
use crate::color::{shade_color, ColorMap};

const PLOT_HEIGHT: f32 = 320.0;
const MATRIX_CELL: f32 = 260.0;
/// Numeric colour columns are drawn in this many shade buckets.
const SHADE_STEPS: usize = 10;

/// Axis formatter printing `labels[i]` at integer marks and nothing elsewhere.
fn label_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    let axis = Axis {
        column: String::new(),
        encoding: AxisEncoding::Categorical(labels),
    };
    move |mark: GridMark, _range: &RangeInclusive<f64>| -> String {
        axis.tick_label(mark.value).unwrap_or_default()
    }
}

/// Placeholder shown instead of a chart when its view is empty.
pub fn empty_plot(ui: &mut Ui, id: &str) {
    Plot::new(id).height(PLOT_HEIGHT).show(ui, |_plot_ui| {});
}

// ---------------------------------------------------------------------------
// Category histogram (stacked bars)
// ---------------------------------------------------------------------------

pub fn category_histogram(ui: &mut Ui, spec: &CategoryHistogram) {
    let colors = ColorMap::new(spec.series.iter().map(|s| s.name.as_str()));

    let mut charts: Vec<BarChart> = Vec::with_capacity(spec.series.len());
    for series in &spec.series {
        let bars = series
            .values
            .iter()
            .enumerate()
            .map(|(i, &count)| Bar::new(i as f64, count).width(0.8))
            .collect();
        let below: Vec<&BarChart> = charts.iter().collect();
        let chart = BarChart::new(bars)
            .name(&series.name)
            .color(colors.color_for(&series.name))
            .stack_on(&below);
        charts.push(chart);
    }

    Plot::new("category_histogram")
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label(&spec.x_column)
        .y_axis_label(format!("count by {}", spec.color_column))
        .x_axis_formatter(label_formatter(spec.categories.clone()))
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// Numeric histogram (overlaid bars)
// ---------------------------------------------------------------------------

pub fn overlay_histogram(ui: &mut Ui, spec: &Histogram) {
    let colors = ColorMap::new(spec.series.iter().map(|s| s.name.as_str()));

    Plot::new("price_histogram")
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label(&spec.value_column)
        .y_axis_label(spec.y_label())
        .show(ui, |plot_ui| {
            for series in &spec.series {
                let bars = series
                    .values
                    .iter()
                    .enumerate()
                    .map(|(bin, &v)| Bar::new(spec.bin_center(bin), v).width(spec.bin_width))
                    .collect();
                let chart = BarChart::new(bars)
                    .name(&series.name)
                    .color(colors.color_for(&series.name).gamma_multiply(0.75));
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// Scatter matrix
// ---------------------------------------------------------------------------

pub fn scatter_matrix(ui: &mut Ui, spec: &ScatterMatrix) {
    let n = spec.dimensions.len();
    let names = spec
        .panels
        .iter()
        .flat_map(|p| p.series.iter().map(|s| s.name.as_str()));
    let mut unique: Vec<&str> = names.collect();
    unique.sort_unstable();
    unique.dedup();
    let colors = ColorMap::new(unique);

    ui.label(format!("colored by {}", spec.color_column));

    egui::Grid::new("scatter_matrix")
        .num_columns(n)
        .show(ui, |ui: &mut Ui| {
            for row in 0..n {
                for col in 0..n {
                    if let Some(panel) = spec.panel(row, col) {
                        scatter_panel(ui, &format!("scatter_{row}_{col}"), panel, &colors);
                    }
                }
                ui.end_row();
            }
        });
}

fn scatter_panel(ui: &mut Ui, id: &str, panel: &ScatterPanel, colors: &ColorMap) {
    let mut plot = Plot::new(id)
        .width(MATRIX_CELL)
        .height(MATRIX_CELL)
        .legend(Legend::default())
        .x_axis_label(&panel.x.column)
        .y_axis_label(&panel.y.column);
    if let Some(fmt) = categorical_formatter(&panel.x) {
        plot = plot.x_axis_formatter(fmt);
    }
    if let Some(fmt) = categorical_formatter(&panel.y) {
        plot = plot.y_axis_formatter(fmt);
    }

    plot.show(ui, |plot_ui| {
        for series in &panel.series {
            if series.shades.is_empty() {
                let points = Points::new(PlotPoints::from(series.points.clone()))
                    .name(&series.name)
                    .radius(2.0)
                    .color(colors.color_for(&series.name));
                plot_ui.points(points);
                continue;
            }
            // One layer per shade bucket keeps the item count small.
            let mut buckets: Vec<Vec<[f64; 2]>> = vec![Vec::new(); SHADE_STEPS];
            for (p, shade) in series.points.iter().zip(&series.shades) {
                let b = ((shade * SHADE_STEPS as f64) as usize).min(SHADE_STEPS - 1);
                buckets[b].push(*p);
            }
            for (b, pts) in buckets.into_iter().enumerate() {
                if pts.is_empty() {
                    continue;
                }
                let t = (b as f64 + 0.5) / SHADE_STEPS as f64;
                plot_ui.points(
                    Points::new(PlotPoints::from(pts))
                        .name(&series.name)
                        .radius(2.0)
                        .color(shade_color(t)),
                );
            }
        }
    });
}

fn categorical_formatter(
    axis: &Axis,
) -> Option<impl Fn(GridMark, &RangeInclusive<f64>) -> String> {
    match &axis.encoding {
        AxisEncoding::Numeric => None,
        AxisEncoding::Categorical(labels) => Some(label_formatter(labels.clone())),
    }
}

// ---------------------------------------------------------------------------
// Box plot
// ---------------------------------------------------------------------------

pub fn box_plot(ui: &mut Ui, spec: &BoxPlotSpec) {
    let colors = ColorMap::new(spec.groups.iter().map(|g| g.name.as_str()));
    let labels: Vec<String> = spec.groups.iter().map(|g| g.name.clone()).collect();

    Plot::new("box_plot")
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label(&spec.group_column)
        .y_axis_label(&spec.value_column)
        .x_axis_formatter(label_formatter(labels))
        .show(ui, |plot_ui| {
            for (i, group) in spec.groups.iter().enumerate() {
                let s = &group.stats;
                let color = colors.color_for(&group.name);
                let elem = BoxElem::new(
                    i as f64,
                    BoxSpread::new(s.lower_whisker, s.q1, s.median, s.q3, s.upper_whisker),
                )
                .name(&group.name)
                .box_width(0.6);
                let legend = format!("{} (n={})", group.name, s.count);
                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(legend).color(color));

                if !s.outliers.is_empty() {
                    let outliers: Vec<[f64; 2]> =
                        s.outliers.iter().map(|&v| [i as f64, v]).collect();
                    plot_ui.points(
                        Points::new(PlotPoints::from(outliers))
                            .name(&group.name)
                            .radius(2.0)
                            .color(color.gamma_multiply(0.6)),
                    );
                }
            }
        });
}
