use serde::Serialize;
use wqm_core::Dataset;

/// Pairwise Pearson correlations between parameters at one site.
///
/// Square and symmetric. A cell is `None` when fewer than two readings have
/// both values, or when either side has no variance over those readings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    parameters: Vec<String>,
    cells: Vec<Option<f64>>,
}

impl CorrelationMatrix {
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn size(&self) -> usize {
        self.parameters.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        let n = self.size();
        if row >= n || col >= n {
            return None;
        }
        self.cells[row * n + col]
    }

    pub fn get_by_name(&self, a: &str, b: &str) -> Option<f64> {
        let row = self.parameters.iter().position(|p| p == a)?;
        let col = self.parameters.iter().position(|p| p == b)?;
        self.get(row, col)
    }

    /// Cells row by row.
    pub fn rows(&self) -> impl Iterator<Item = &[Option<f64>]> {
        self.cells.chunks(self.size().max(1))
    }

    /// True when no cell holds a coefficient.
    pub fn all_null(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}

/// Pearson coefficient of paired observations, clamped to `[-1, 1]`.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2
        || is_constant(pairs.iter().map(|p| p.0))
        || is_constant(pairs.iter().map(|p| p.1))
    {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    let denominator = (sxx * syy).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return None;
    }
    Some((sxy / denominator).clamp(-1.0, 1.0))
}

// Exact equality, not a variance threshold.
fn is_constant(mut values: impl Iterator<Item = f64>) -> bool {
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}

/// Correlation matrix of `params` over the readings of one site.
///
/// Each pair uses only the readings where both of its values are non-null.
/// An empty `params` means every parameter of the dataset. Names that are
/// not parameters of the dataset get all-null rows and columns.
pub fn correlation_matrix(dataset: &Dataset, site: &str, params: &[String]) -> CorrelationMatrix {
    let parameters: Vec<String> = if params.is_empty() {
        dataset.parameters().to_vec()
    } else {
        params.to_vec()
    };
    let schema = dataset.schema();
    let indices: Vec<Option<usize>> = parameters
        .iter()
        .map(|p| schema.parameter_index(p))
        .collect();
    let rows: Vec<_> = dataset
        .readings()
        .iter()
        .filter(|r| r.site_name == site)
        .collect();

    let n = parameters.len();
    let mut cells = vec![None; n * n];
    for i in 0..n {
        for j in i..n {
            let (Some(a), Some(b)) = (indices[i], indices[j]) else {
                continue;
            };
            let pairs: Vec<(f64, f64)> = rows
                .iter()
                .filter_map(|r| Some((r.value(a)?, r.value(b)?)))
                .collect();
            let coefficient = if i == j {
                pearson(&pairs).map(|_| 1.0)
            } else {
                pearson(&pairs)
            };
            cells[i * n + j] = coefficient;
            cells[j * n + i] = coefficient;
        }
    }
    CorrelationMatrix { parameters, cells }
}
