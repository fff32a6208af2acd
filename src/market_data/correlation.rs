use ndarray::Array2;
use serde::Serialize;
use std::collections::BTreeMap;

use super::types::AssetSeries;

/// Pairwise Pearson correlation of close prices
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub assets: Vec<String>,
    pub values: Array2<f64>,
}

impl CorrelationMatrix {
    pub fn get(&self, asset_a: &str, asset_b: &str) -> Option<f64> {
        let i = self.assets.iter().position(|a| a == asset_a)?;
        let j = self.assets.iter().position(|a| a == asset_b)?;
        Some(self.values[[i, j]])
    }
}

/// Correlations over the dates each pair has in common.
///
/// Pairs with fewer than two shared dates or a constant price get NaN.
pub fn correlation_matrix(series_by_asset: &BTreeMap<String, AssetSeries>) -> CorrelationMatrix {
    let assets: Vec<String> = series_by_asset.keys().cloned().collect();
    let series: Vec<&AssetSeries> = series_by_asset.values().collect();
    let n = assets.len();

    let mut values = Array2::from_elem((n, n), f64::NAN);
    for i in 0..n {
        values[[i, i]] = 1.0;
        for j in (i + 1)..n {
            let (x, y) = aligned_prices(series[i], series[j]);
            let rho = pearson(&x, &y);
            values[[i, j]] = rho;
            values[[j, i]] = rho;
        }
    }

    CorrelationMatrix { assets, values }
}

fn aligned_prices(a: &AssetSeries, b: &AssetSeries) -> (Vec<f64>, Vec<f64>) {
    let (pa, pb) = (a.points(), b.points());
    let (mut i, mut j) = (0, 0);
    let mut x = Vec::new();
    let mut y = Vec::new();
    while i < pa.len() && j < pb.len() {
        match pa[i].date.cmp(&pb[j].date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                x.push(pa[i].close_price);
                y.push(pb[j].close_price);
                i += 1;
                j += 1;
            }
        }
    }
    (x, y)
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        cov += (a - mean_x) * (b - mean_y);
        var_x += (a - mean_x).powi(2);
        var_y += (b - mean_y).powi(2);
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return f64::NAN;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}
