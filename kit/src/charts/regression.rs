use super::{fonts::FONT_FAMILY, render_error, text_available, Figure, FigureOptions};
use crate::error::Result;
use crate::models::IndicatorTable;
use crate::utils::{linear_fit, LinearFit};
use plotters::prelude::*;
use std::path::Path;

/// Scatter plot of two columns with the fitted least squares line.
///
/// Both axes start at zero; points below zero fall outside the plot.
#[derive(Debug, Clone)]
pub struct RegressionFigure {
    title: String,
    x_label: String,
    y_label: String,
    points: Vec<(f64, f64)>,
    fit: Option<LinearFit>,
}

impl RegressionFigure {
    pub fn from_table(title: &str, table: &IndicatorTable, x: &str, y: &str) -> Result<Self> {
        let points = table
            .column(x)?
            .into_iter()
            .zip(table.column(y)?)
            .filter_map(|(a, b)| Some((a?, b?)))
            .collect();

        Ok(Self {
            title: title.to_string(),
            x_label: x.to_string(),
            y_label: y.to_string(),
            points,
            fit: linear_fit(table, x, y)?,
        })
    }

    pub fn fit(&self) -> Option<&LinearFit> {
        self.fit.as_ref()
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    fn upper_bound(values: impl Iterator<Item = f64>) -> f64 {
        let max = values.fold(0.0_f64, f64::max);
        if max > 0.0 {
            max * 1.05
        } else {
            1.0
        }
    }
}

impl Figure for RegressionFigure {
    fn title(&self) -> &str {
        &self.title
    }

    fn render(&self, path: &Path, options: &FigureOptions) -> Result<()> {
        let text = text_available();
        let x_max = Self::upper_bound(self.points.iter().map(|p| p.0));
        let y_max = Self::upper_bound(self.points.iter().map(|p| p.1));

        let root = BitMapBackend::new(path, options.pixel_size()).into_drawing_area();
        root.fill(&WHITE).map_err(|e| render_error(path, e))?;

        let mut builder = ChartBuilder::on(&root);
        builder.margin(options.scaled(8.0) as i32);
        if text {
            builder
                .caption(&self.title, (FONT_FAMILY, options.scaled(14.0)))
                .x_label_area_size(options.scaled(40.0))
                .y_label_area_size(options.scaled(60.0));
        }
        let mut chart = builder
            .build_cartesian_2d(0f64..x_max, 0f64..y_max)
            .map_err(|e| render_error(path, e))?;

        if text {
            chart
                .configure_mesh()
                .x_desc(&self.x_label)
                .y_desc(&self.y_label)
                .label_style((FONT_FAMILY, options.scaled(10.0)))
                .axis_desc_style((FONT_FAMILY, options.scaled(12.0)))
                .draw()
                .map_err(|e| render_error(path, e))?;
        }

        let radius = options.scaled(3.0);
        chart
            .draw_series(
                self.points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), radius, BLUE.mix(0.6).filled())),
            )
            .map_err(|e| render_error(path, e))?;

        if let Some(fit) = &self.fit {
            let line = LineSeries::new(
                [(0.0, fit.predict(0.0)), (x_max, fit.predict(x_max))],
                ShapeStyle::from(&BLUE).stroke_width(options.scaled(1.5)),
            );
            chart.draw_series(line).map_err(|e| render_error(path, e))?;
        }

        root.present().map_err(|e| render_error(path, e))?;
        Ok(())
    }
}
