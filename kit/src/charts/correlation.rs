use super::{fonts::FONT_FAMILY, render_error, text_available, Figure, FigureOptions};
use crate::error::Result;
use crate::models::IndicatorTable;
use crate::utils::CorrelationMatrix;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

/// Annotated heat map of the lower triangle of a correlation matrix.
///
/// The diagonal is left blank; row names run down the left edge and column
/// names along the bottom.
#[derive(Debug, Clone)]
pub struct CorrelationFigure {
    title: String,
    matrix: CorrelationMatrix,
}

impl CorrelationFigure {
    pub fn new(title: &str, matrix: CorrelationMatrix) -> Self {
        Self {
            title: title.to_string(),
            matrix,
        }
    }

    pub fn from_table(title: &str, table: &IndicatorTable) -> Result<Self> {
        Ok(Self::new(title, CorrelationMatrix::from_table(table)?))
    }

    pub fn matrix(&self) -> &CorrelationMatrix {
        &self.matrix
    }
}

/// Blue for negative, white at zero, red for positive.
fn diverging(r: f64) -> RGBColor {
    let t = r.clamp(-1.0, 1.0).abs();
    let fade = |full: u8| (255.0 - (255.0 - full as f64) * t).round() as u8;
    if r >= 0.0 {
        RGBColor(fade(178), fade(24), fade(43))
    } else {
        RGBColor(fade(33), fade(102), fade(172))
    }
}

impl Figure for CorrelationFigure {
    fn title(&self) -> &str {
        &self.title
    }

    fn render(&self, path: &Path, options: &FigureOptions) -> Result<()> {
        let text = text_available();
        let n = self.matrix.columns.len().max(1) as f64;
        // room for the names, in cell units
        let (label_w, label_h) = if text { (2.0, 0.6) } else { (0.0, 0.0) };

        let root = BitMapBackend::new(path, options.pixel_size()).into_drawing_area();
        root.fill(&WHITE).map_err(|e| render_error(path, e))?;

        let mut builder = ChartBuilder::on(&root);
        builder.margin(options.scaled(5.0) as i32);
        if text {
            builder.caption(&self.title, (FONT_FAMILY, options.scaled(18.0)));
        }
        let mut chart = builder
            .build_cartesian_2d(-label_w..n, (n + label_h)..0f64)
            .map_err(|e| render_error(path, e))?;

        let cells = self.matrix.values.iter().enumerate().flat_map(|(row, values)| {
            values
                .iter()
                .enumerate()
                .filter(move |(col, _)| *col < row)
                .map(move |(col, r)| (row, col, *r))
        });

        chart
            .draw_series(cells.clone().map(|(row, col, r)| {
                let color = r.map(diverging).unwrap_or(RGBColor(220, 220, 220));
                Rectangle::new(
                    [(col as f64, row as f64), (col as f64 + 1.0, row as f64 + 1.0)],
                    color.filled(),
                )
            }))
            .map_err(|e| render_error(path, e))?;

        if text {
            let centered = Pos::new(HPos::Center, VPos::Center);
            let value_style = TextStyle::from((FONT_FAMILY, options.scaled(11.0)).into_font())
                .pos(centered);
            let name_style = TextStyle::from((FONT_FAMILY, options.scaled(9.0)).into_font())
                .pos(centered);

            chart
                .draw_series(cells.map(|(row, col, r)| {
                    let label = r.map(|v| format!("{:.2}", v)).unwrap_or_default();
                    Text::new(
                        label,
                        (col as f64 + 0.5, row as f64 + 0.5),
                        value_style.clone(),
                    )
                }))
                .map_err(|e| render_error(path, e))?;

            let columns = &self.matrix.columns;
            let row_style = name_style.pos(Pos::new(HPos::Right, VPos::Center));
            chart
                .draw_series(columns.iter().enumerate().skip(1).map(|(row, name)| {
                    Text::new(name.clone(), (-0.1, row as f64 + 0.5), row_style.clone())
                }))
                .map_err(|e| render_error(path, e))?;

            let col_style = name_style.pos(Pos::new(HPos::Center, VPos::Top));
            let bottom = columns.iter().enumerate().take(columns.len().saturating_sub(1));
            chart
                .draw_series(bottom.map(|(col, name)| {
                    Text::new(name.clone(), (col as f64 + 0.5, n + 0.1), col_style.clone())
                }))
                .map_err(|e| render_error(path, e))?;
        }

        root.present().map_err(|e| render_error(path, e))?;
        Ok(())
    }
}
