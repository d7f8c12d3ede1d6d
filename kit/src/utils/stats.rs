use crate::error::Result;
use crate::models::IndicatorTable;
use serde::{Deserialize, Serialize};

/// Pairs where both sides are present.
fn complete_pairs(x: &[Option<f64>], y: &[Option<f64>]) -> Vec<(f64, f64)> {
    x.iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Pearson correlation over pairwise-complete observations.
///
/// `None` with fewer than two pairs or when either side has zero variance.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs = complete_pairs(x, y);
    if pairs.len() < 2 {
        return None;
    }
    let mx = mean(pairs.iter().map(|p| p.0))?;
    let my = mean(pairs.iter().map(|p| p.1))?;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Square correlation matrix over the columns of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn from_table(table: &IndicatorTable) -> Result<Self> {
        let columns = table.columns().to_vec();
        let data = columns
            .iter()
            .map(|c| table.column(c))
            .collect::<Result<Vec<_>>>()?;

        let n = columns.len();
        let mut values = vec![vec![None; n]; n];
        for i in 0..n {
            for j in i..n {
                let r = pearson(&data[i], &data[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        Ok(Self { columns, values })
    }

    pub fn get(&self, x: &str, y: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == x)?;
        let j = self.columns.iter().position(|c| c == y)?;
        self.values[i][j]
    }
}

/// Ordinary least squares fit of `y = intercept + slope * x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub x: String,
    pub y: String,
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
    pub n: usize,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

pub fn linear_fit(table: &IndicatorTable, x: &str, y: &str) -> Result<Option<LinearFit>> {
    let xs = table.column(x)?;
    let ys = table.column(y)?;
    let pairs = complete_pairs(&xs, &ys);
    if pairs.len() < 2 {
        return Ok(None);
    }

    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / pairs.len() as f64;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / pairs.len() as f64;
    let sxy: f64 = pairs.iter().map(|(a, b)| (a - mx) * (b - my)).sum();
    let sxx: f64 = pairs.iter().map(|(a, _)| (a - mx).powi(2)).sum();
    if sxx == 0.0 {
        return Ok(None);
    }

    let slope = sxy / sxx;
    Ok(Some(LinearFit {
        x: x.to_string(),
        y: y.to_string(),
        slope,
        intercept: my - slope * mx,
        r: pearson(&xs, &ys).unwrap_or(0.0),
        n: pairs.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn table() -> IndicatorTable {
        let mut table = IndicatorTable::new(
            "country",
            vec!["x".to_string(), "y".to_string(), "z".to_string()],
        );
        table.push_row("A", vec![Some(1.0), Some(3.0), Some(5.0)]).unwrap();
        table.push_row("B", vec![Some(2.0), Some(5.0), Some(5.0)]).unwrap();
        table.push_row("C", vec![Some(3.0), Some(7.0), Some(5.0)]).unwrap();
        table.push_row("D", vec![None, Some(100.0), Some(5.0)]).unwrap();
        table
    }

    #[test]
    fn test_pearson_perfect_and_inverse() {
        let x = [Some(1.0), Some(2.0), Some(3.0)];
        let y = [Some(2.0), Some(4.0), Some(6.0)];
        let z = [Some(3.0), Some(2.0), Some(1.0)];
        assert!(approx(pearson(&x, &y).unwrap(), 1.0));
        assert!(approx(pearson(&x, &z).unwrap(), -1.0));
    }

    #[test]
    fn test_pearson_degenerate() {
        assert_eq!(pearson(&[Some(1.0)], &[Some(2.0)]), None);
        assert_eq!(pearson(&[Some(1.0), Some(1.0)], &[Some(2.0), Some(3.0)]), None);
        assert_eq!(pearson(&[Some(1.0), None], &[None, Some(3.0)]), None);
    }

    #[test]
    fn test_correlation_matrix_skips_missing_and_constant() {
        let matrix = CorrelationMatrix::from_table(&table()).unwrap();
        assert!(approx(matrix.get("x", "y").unwrap(), 1.0));
        assert!(approx(matrix.get("x", "x").unwrap(), 1.0));
        assert_eq!(matrix.get("x", "z"), None);
        assert_eq!(matrix.get("x", "y"), matrix.get("y", "x"));
    }

    #[test]
    fn test_linear_fit() {
        let fit = linear_fit(&table(), "x", "y").unwrap().unwrap();
        assert!(approx(fit.slope, 2.0));
        assert!(approx(fit.intercept, 1.0));
        assert!(approx(fit.r, 1.0));
        assert_eq!(fit.n, 3);
        assert!(approx(fit.predict(10.0), 21.0));
    }

    #[test]
    fn test_linear_fit_constant_x_is_none() {
        assert!(linear_fit(&table(), "z", "x").unwrap().is_none());
        assert!(linear_fit(&table(), "x", "missing").is_err());
    }
}
