//! Correlation analyzer: daily returns, Pearson matrix, and the extreme pairs.
//!
//! Returns are fractional changes (`p[t] / p[t-1] - 1`); the first row has no
//! predecessor and is dropped. Pairs are read from the strict upper triangle in
//! row-major order, and ties for strongest or weakest go to the pair met first
//! in that order.

use crate::domain::price_table::{Column, PriceTable, ReturnsTable};
use std::fmt;

pub fn returns_table(prices: &PriceTable) -> ReturnsTable {
    if prices.row_count() < 2 {
        let columns = prices
            .columns()
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: Vec::new(),
            })
            .collect();
        return ReturnsTable::new(Vec::new(), columns);
    }

    let columns = prices
        .columns()
        .iter()
        .map(|c| Column {
            name: c.name.clone(),
            values: c.values.windows(2).map(|w| w[1] / w[0] - 1.0).collect(),
        })
        .collect();

    ReturnsTable::new(prices.dates()[1..].to_vec(), columns)
}

/// Sample Pearson correlation. NaN with fewer than two observations or when
/// either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return f64::NAN;
    }
    let (x, y) = (&x[..n], &y[..n]);

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    (cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    names: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn size(&self) -> usize {
        self.names.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }

    pub fn value(&self, row: &str, col: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == row)?;
        let j = self.names.iter().position(|n| n == col)?;
        Some(self.values[i][j])
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }
}

pub fn correlation_matrix(returns: &ReturnsTable) -> CorrelationMatrix {
    let columns = returns.columns();
    let k = columns.len();
    let mut values = vec![vec![f64::NAN; k]; k];

    for i in 0..k {
        for j in i..k {
            let r = pearson(&columns[i].values, &columns[j].values);
            // a non-constant column correlates exactly 1 with itself
            let r = if i == j && !r.is_nan() { 1.0 } else { r };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        names: columns.iter().map(|c| c.name.clone()).collect(),
        values,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationPair {
    pub row: String,
    pub col: String,
    pub value: f64,
}

impl fmt::Display for CorrelationPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ↔ {} = {:.2}", self.row, self.col, self.value)
    }
}

/// Strict upper triangle in row-major order. NaN entries cannot be ranked and
/// are left out.
pub fn upper_triangle(matrix: &CorrelationMatrix) -> Vec<CorrelationPair> {
    let k = matrix.size();
    let mut pairs = Vec::new();
    for i in 0..k {
        for j in (i + 1)..k {
            let value = matrix.get(i, j);
            if value.is_nan() {
                continue;
            }
            pairs.push(CorrelationPair {
                row: matrix.names[i].clone(),
                col: matrix.names[j].clone(),
                value,
            });
        }
    }
    pairs
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extremes {
    pub strongest: CorrelationPair,
    pub weakest: CorrelationPair,
}

pub fn extremes(pairs: &[CorrelationPair]) -> Option<Extremes> {
    let first = pairs.first()?;
    let mut strongest = first;
    let mut weakest = first;
    for pair in &pairs[1..] {
        if pair.value > strongest.value {
            strongest = pair;
        }
        if pair.value < weakest.value {
            weakest = pair;
        }
    }
    Some(Extremes {
        strongest: strongest.clone(),
        weakest: weakest.clone(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationAnalysis {
    pub returns: ReturnsTable,
    pub matrix: CorrelationMatrix,
    pub pairs: Vec<CorrelationPair>,
    pub extremes: Option<Extremes>,
}

pub fn analyze(prices: &PriceTable) -> CorrelationAnalysis {
    let returns = returns_table(prices);
    let matrix = correlation_matrix(&returns);
    let pairs = if returns.row_count() < 2 || returns.column_count() < 2 {
        Vec::new()
    } else {
        upper_triangle(&matrix)
    };
    let extremes = extremes(&pairs);

    CorrelationAnalysis {
        returns,
        matrix,
        pairs,
        extremes,
    }
}
