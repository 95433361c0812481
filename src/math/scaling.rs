//! Per-row min-max scaling to `[-1, 1]`.
//!
//! Network inputs and targets are scaled row by row using the ranges seen in
//! training. A constant row (`max == min`) maps to 0.

use nalgebra::DMatrix;

#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl MinMaxScaler {
    /// Ranges of each row of `m`. Returns `None` for an empty or non-finite matrix.
    pub fn fit(m: &DMatrix<f64>) -> Option<Self> {
        if m.ncols() == 0 {
            return None;
        }
        let mut min = Vec::with_capacity(m.nrows());
        let mut max = Vec::with_capacity(m.nrows());
        for row in m.row_iter() {
            let lo = row.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if !(lo.is_finite() && hi.is_finite()) {
                return None;
            }
            min.push(lo);
            max.push(hi);
        }
        Some(Self { min, max })
    }

    pub fn len(&self) -> usize {
        self.min.len()
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_empty()
    }

    pub fn transform(&self, m: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = m.clone();
        for (i, mut row) in out.row_iter_mut().enumerate() {
            let (lo, hi) = (self.min[i], self.max[i]);
            for v in row.iter_mut() {
                *v = scale(*v, lo, hi);
            }
        }
        out
    }

    pub fn inverse(&self, m: &DMatrix<f64>) -> DMatrix<f64> {
        let mut out = m.clone();
        for (i, mut row) in out.row_iter_mut().enumerate() {
            let (lo, hi) = (self.min[i], self.max[i]);
            for v in row.iter_mut() {
                *v = unscale(*v, lo, hi);
            }
        }
        out
    }
}

fn scale(v: f64, lo: f64, hi: f64) -> f64 {
    let span = hi - lo;
    if span <= 0.0 {
        return 0.0;
    }
    2.0 * (v - lo) / span - 1.0
}

fn unscale(v: f64, lo: f64, hi: f64) -> f64 {
    let span = hi - lo;
    if span <= 0.0 {
        return lo;
    }
    (v + 1.0) * span / 2.0 + lo
}
