//! Bar plot of eval scores by model, faceted by task, with confidence interval error bars.

use super::plots::{save_svg, series_color, PlotError, Result, FONT};
use crate::frame::DataFrame;
use crate::logs::evals::{MODEL, SCORE_HEADLINE_STDERR, SCORE_HEADLINE_VALUE, TASK_NAME};
use crate::stats::bounds::{with_confidence_bounds, ConfidenceBounds};
use crate::stats::confidence::{z_alpha, DEFAULT_CONFIDENCE_LEVEL};
use plotters::prelude::*;
use std::path::Path;

/// Fraction of the score domain added above its upper end.
const TOP_INSET: f64 = 0.025;
/// Horizontal gap on each side of a bar, in bar slots.
const BAR_GAP: f64 = 0.12;
/// Half width of the error bar end ticks, in bar slots.
const TICK_HALF_WIDTH: f64 = 0.12;

const LEGEND_PADDING: i32 = 10;
const LEGEND_ROW_HEIGHT: i32 = 20;
const LEGEND_SWATCH: i32 = 12;
/// Rough width of one legend character at the legend font size.
const LEGEND_CHAR_WIDTH: i32 = 7;
const MIN_PLOT_HEIGHT: i32 = 120;

/// One bar of a facet.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub model: String,
    pub value: f64,
    /// Absent when the stderr is missing.
    pub bounds: Option<ConfidenceBounds>,
}

/// Bars of a single task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFacet {
    pub task: String,
    pub bars: Vec<Bar>,
}

/// Bar plot that summarizes eval scores by model and task.
///
/// By default the headline score and stderr columns produced by
/// [`evals_df`](crate::logs::evals_df) are plotted.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalsBarPlot {
    /// Confidence level of the error bars.
    pub ci: f64,
    pub score_field: String,
    pub stderr_field: String,
    /// Beginning and end of the y axis.
    pub score_domain: (f64, f64),
    pub width: u32,
    pub height: u32,
}

impl Default for EvalsBarPlot {
    fn default() -> Self {
        Self {
            ci: DEFAULT_CONFIDENCE_LEVEL,
            score_field: SCORE_HEADLINE_VALUE.to_string(),
            stderr_field: SCORE_HEADLINE_STDERR.to_string(),
            score_domain: (0.0, 1.0),
            width: 900,
            height: 500,
        }
    }
}

impl EvalsBarPlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ci(mut self, ci: f64) -> Self {
        self.ci = ci;
        self
    }

    pub fn with_score_field(mut self, field: impl Into<String>) -> Self {
        self.score_field = field.into();
        self
    }

    pub fn with_stderr_field(mut self, field: impl Into<String>) -> Self {
        self.stderr_field = field.into();
        self
    }

    pub fn with_score_domain(mut self, low: f64, high: f64) -> Self {
        self.score_domain = (low, high);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Groups the scores of `frame` into one facet per task, with one bar per model.
    ///
    /// Facets are sorted by task and bars by model, so the plot does not depend on the
    /// order of the logs. Rows without a task, model or score are skipped, as are further
    /// evals of a model already plotted for the same task.
    ///
    /// # Errors
    ///
    /// Fails on an unsupported confidence level before looking at the data, if the score
    /// and stderr fields are the same column, and if any of the required columns is missing.
    pub fn facets(&self, frame: &DataFrame) -> Result<Vec<TaskFacet>> {
        z_alpha(self.ci)?;
        if self.score_field == self.stderr_field {
            return Err(PlotError::InvalidData(format!(
                "Score and stderr fields are both '{}'",
                self.score_field
            )));
        }

        let mut scores = frame.select(&[
            TASK_NAME,
            MODEL,
            self.score_field.as_str(),
            self.stderr_field.as_str(),
        ])?;
        let (lower_field, upper_field) =
            with_confidence_bounds(&mut scores, &self.score_field, &self.stderr_field, self.ci)?;

        let mut facets: Vec<TaskFacet> = Vec::new();
        for row in scores.rows() {
            let (Some(task), Some(model), Some(value)) = (
                row.str(TASK_NAME)?,
                row.str(MODEL)?,
                row.f64(&self.score_field)?,
            ) else {
                tracing::debug!(row = row.index(), "skipping row without task, model or score");
                continue;
            };

            let bounds = match (row.f64(&lower_field)?, row.f64(&upper_field)?) {
                (Some(lower), Some(upper)) => Some(ConfidenceBounds { lower, upper }),
                _ => None,
            };

            let index = match facets.iter().position(|facet| facet.task == task) {
                Some(index) => index,
                None => {
                    facets.push(TaskFacet {
                        task: task.to_string(),
                        bars: Vec::new(),
                    });
                    facets.len() - 1
                }
            };

            let facet = &mut facets[index];
            if facet.bars.iter().any(|bar| bar.model == model) {
                tracing::debug!(task, model, "skipping repeated eval of model");
                continue;
            }

            facet.bars.push(Bar {
                model: model.to_string(),
                value,
                bounds,
            });
        }

        facets.sort_by(|a, b| a.task.cmp(&b.task));
        for facet in &mut facets {
            facet.bars.sort_by(|a, b| a.model.cmp(&b.model));
        }
        Ok(facets)
    }

    /// Renders the plot as an SVG document.
    pub fn render_svg(&self, frame: &DataFrame) -> Result<String> {
        let (low, high) = self.score_domain;
        if !(low < high) {
            return Err(PlotError::InvalidData(format!(
                "Score domain [{}, {}] is empty",
                low, high
            )));
        }

        let facets = self.facets(frame)?;
        if facets.is_empty() {
            return Err(PlotError::InvalidData("No scores to plot".to_string()));
        }

        let models = legend_models(&facets);
        let legend = legend_layout(&models, self.width);
        let legend_height = LEGEND_PADDING * 2 + legend.rows * LEGEND_ROW_HEIGHT;
        let plot_height = self.height as i32 - legend_height;
        if plot_height < MIN_PLOT_HEIGHT {
            return Err(PlotError::InvalidData(format!(
                "Plot height {} leaves no room for {} legend rows",
                self.height, legend.rows
            )));
        }

        let top = high + (high - low) * TOP_INSET;
        let base = 0f64.clamp(low, high);
        let color_of = |model: &str| {
            series_color(models.iter().position(|m| m == model).unwrap_or_default())
        };

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

            let (plot_area, legend_area) = root.split_vertically(plot_height);
            let panels = plot_area.split_evenly((1, facets.len()));

            for (index, (panel, facet)) in panels.iter().zip(&facets).enumerate() {
                let slots = facet.bars.len().max(1) as f64;
                let mut chart = ChartBuilder::on(panel)
                    .caption(&facet.task, (FONT, 14))
                    .margin(6)
                    .x_label_area_size(10)
                    .y_label_area_size(45)
                    .build_cartesian_2d(0f64..slots, low..top)
                    .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

                let mut mesh = chart.configure_mesh();
                mesh.disable_x_mesh()
                    .x_labels(0)
                    .y_labels(6)
                    .label_style((FONT, 11))
                    .y_label_formatter(&|y| format!("{:.1}", y));
                if index == 0 {
                    mesh.y_desc("score");
                }
                mesh.draw().map_err(|e| PlotError::Drawing(e.to_string()))?;

                chart
                    .draw_series(facet.bars.iter().enumerate().map(|(slot, bar)| {
                        let x = slot as f64;
                        Rectangle::new(
                            [
                                (x + BAR_GAP, base),
                                (x + 1.0 - BAR_GAP, bar.value.clamp(low, top)),
                            ],
                            color_of(&bar.model).filled(),
                        )
                    }))
                    .map_err(|e| PlotError::Drawing(e.to_string()))?;

                chart
                    .draw_series(
                        facet
                            .bars
                            .iter()
                            .enumerate()
                            .filter_map(|(slot, bar)| bar.bounds.map(|bounds| (slot, bounds)))
                            .flat_map(|(slot, bounds)| error_bar(slot as f64 + 0.5, bounds, low, top)),
                    )
                    .map_err(|e| PlotError::Drawing(e.to_string()))?;
            }

            for (model, &(x, row)) in models.iter().zip(&legend.positions) {
                let y = LEGEND_PADDING + row * LEGEND_ROW_HEIGHT;
                legend_area
                    .draw(&Rectangle::new(
                        [(x, y), (x + LEGEND_SWATCH, y + LEGEND_SWATCH)],
                        color_of(model).filled(),
                    ))
                    .map_err(|e| PlotError::Drawing(e.to_string()))?;
                legend_area
                    .draw(&Text::new(
                        model.clone(),
                        (x + LEGEND_SWATCH + 4, y),
                        (FONT, 12).into_font(),
                    ))
                    .map_err(|e| PlotError::Drawing(e.to_string()))?;
            }

            root.present()
                .map_err(|e| PlotError::Drawing(e.to_string()))?;
        }

        Ok(svg)
    }

    /// Renders the plot and saves it as an SVG file.
    pub fn render(&self, frame: &DataFrame, output_path: &Path) -> Result<()> {
        let svg = self.render_svg(frame)?;
        save_svg(&svg, output_path)
    }
}

/// Vertical rule between the bounds with a tick at each end.
fn error_bar(x: f64, bounds: ConfidenceBounds, low: f64, top: f64) -> [PathElement<(f64, f64)>; 3] {
    let lower = bounds.lower.clamp(low, top);
    let upper = bounds.upper.clamp(low, top);
    let style = BLACK.stroke_width(1);
    let tick = |y: f64| {
        PathElement::new(vec![(x - TICK_HALF_WIDTH, y), (x + TICK_HALF_WIDTH, y)], style)
    };

    [
        PathElement::new(vec![(x, lower), (x, upper)], style),
        tick(lower),
        tick(upper),
    ]
}

/// Sorted models of all facets.
fn legend_models(facets: &[TaskFacet]) -> Vec<String> {
    let mut models: Vec<String> = facets
        .iter()
        .flat_map(|facet| &facet.bars)
        .map(|bar| bar.model.clone())
        .collect();
    models.sort();
    models.dedup();
    models
}

#[derive(Debug, PartialEq)]
struct LegendLayout {
    /// Left edge and row of each entry.
    positions: Vec<(i32, i32)>,
    rows: i32,
}

/// Places legend entries left to right, wrapping onto a new row when `width` is exceeded.
fn legend_layout(models: &[String], width: u32) -> LegendLayout {
    let width = width as i32;
    let mut positions = Vec::with_capacity(models.len());
    let (mut x, mut row) = (LEGEND_PADDING, 0);

    for model in models {
        let entry_width =
            LEGEND_SWATCH + 4 + model.chars().count() as i32 * LEGEND_CHAR_WIDTH + 16;
        if x > LEGEND_PADDING && x + entry_width > width - LEGEND_PADDING {
            x = LEGEND_PADDING;
            row += 1;
        }
        positions.push((x, row));
        x += entry_width;
    }

    LegendLayout {
        positions,
        rows: if models.is_empty() { 0 } else { row + 1 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Value;
    use tempfile::TempDir;

    fn evals() -> DataFrame {
        let mut frame = DataFrame::new([
            TASK_NAME,
            MODEL,
            SCORE_HEADLINE_VALUE,
            SCORE_HEADLINE_STDERR,
        ])
        .unwrap();
        let rows: [(&str, &str, Value, Value); 5] = [
            ("cybench", "openai/gpt-4o", 0.72.into(), 0.05.into()),
            ("cybench", "anthropic/claude", 0.5.into(), Value::Null),
            ("intercode", "anthropic/claude", 0.9.into(), 0.01.into()),
            ("intercode", "anthropic/claude", 0.1.into(), 0.01.into()),
            ("intercode", "openai/gpt-4o", Value::Null, Value::Null),
        ];
        for (task, model, value, stderr) in rows {
            frame
                .push_row(vec![task.into(), model.into(), value, stderr])
                .unwrap();
        }
        frame
    }

    #[test]
    fn facets_group_bars_by_task() {
        let facets = EvalsBarPlot::new().facets(&evals()).unwrap();
        assert_eq!(facets.len(), 2);
        assert_eq!(facets[0].task, "cybench");
        assert_eq!(facets[1].task, "intercode");

        let gpt = &facets[0].bars[1];
        assert_eq!(gpt.model, "openai/gpt-4o");
        let bounds = gpt.bounds.unwrap();
        assert!((bounds.lower - 0.622).abs() < 1e-9);
        assert!((bounds.upper - 0.818).abs() < 1e-9);

        assert_eq!(facets[0].bars[0].model, "anthropic/claude");
        assert_eq!(facets[0].bars[0].bounds, None);

        // repeated evals and missing scores are skipped
        assert_eq!(facets[1].bars.len(), 1);
        assert_eq!(facets[1].bars[0].value, 0.9);
    }

    #[test]
    fn order_does_not_depend_on_rows() {
        let frame = evals();
        let rows: Vec<_> = frame.rows().collect();
        let mut reversed = DataFrame::new(frame.columns().to_vec()).unwrap();
        for row in rows.iter().rev() {
            reversed.push_row(row.values().to_vec()).unwrap();
        }

        let facets = EvalsBarPlot::new().facets(&reversed).unwrap();
        let tasks: Vec<&str> = facets.iter().map(|facet| facet.task.as_str()).collect();
        assert_eq!(tasks, ["cybench", "intercode"]);
        let models: Vec<&str> = facets[0].bars.iter().map(|bar| bar.model.as_str()).collect();
        assert_eq!(models, ["anthropic/claude", "openai/gpt-4o"]);

        // the first eval of a repeated model still wins
        assert_eq!(facets[1].bars[0].value, 0.1);
        assert_eq!(legend_models(&facets), ["anthropic/claude", "openai/gpt-4o"]);
    }

    #[test]
    fn same_score_and_stderr_field_is_invalid() {
        let result = EvalsBarPlot::new()
            .with_stderr_field(SCORE_HEADLINE_VALUE)
            .facets(&evals());
        assert!(matches!(result, Err(PlotError::InvalidData(_))));
    }

    #[test]
    fn confidence_level_changes_bounds() {
        let facets = EvalsBarPlot::new().with_ci(0.99).facets(&evals()).unwrap();
        let bounds = facets[0].bars[1].bounds.unwrap();
        assert!((bounds.upper - (0.72 + 2.576 * 0.05)).abs() < 1e-9);
    }

    #[test]
    fn unsupported_ci_fails_on_empty_frame() {
        let result = EvalsBarPlot::new()
            .with_ci(0.93)
            .facets(&DataFrame::default());
        assert!(matches!(result, Err(PlotError::Confidence(_))));
    }

    #[test]
    fn missing_score_field_is_reported() {
        let result = EvalsBarPlot::new()
            .with_score_field("accuracy")
            .facets(&evals());
        assert!(matches!(result, Err(PlotError::Frame(_))));
    }

    #[test]
    fn renders_svg_with_facets_and_legend() {
        let svg = EvalsBarPlot::new().render_svg(&evals()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        for text in ["cybench", "intercode", "openai/gpt-4o", "anthropic/claude", "score"] {
            assert!(svg.contains(text), "missing {}", text);
        }
    }

    #[test]
    fn render_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("evals_bar.svg");
        EvalsBarPlot::new().render(&evals(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn nothing_to_plot_is_invalid() {
        let empty = evals().filter(|_| false);
        let result = EvalsBarPlot::new().render_svg(&empty);
        assert!(matches!(result, Err(PlotError::InvalidData(_))));
    }

    #[test]
    fn empty_domain_is_invalid() {
        let result = EvalsBarPlot::new()
            .with_score_domain(1.0, 1.0)
            .render_svg(&evals());
        assert!(matches!(result, Err(PlotError::InvalidData(_))));
    }

    #[test]
    fn legend_wraps_rows() {
        let models: Vec<String> = (0..4).map(|i| format!("provider/model-{}", i)).collect();
        let layout = legend_layout(&models, 300);
        assert_eq!(layout.rows, 4);
        assert!(layout.positions.iter().all(|&(x, _)| x == LEGEND_PADDING));

        let layout = legend_layout(&models, 2000);
        assert_eq!(layout.rows, 1);
        assert_eq!(legend_layout(&[], 300).rows, 0);
    }
}
