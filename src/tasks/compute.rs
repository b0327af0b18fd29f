// src/tasks/compute.rs

//! CPU-bound sample tasks.

use std::time::Instant;

use anyhow::{Result, bail};
use rand::Rng;
use tracing::info;

use crate::engine::Task;

/// Largest matrix side accepted; three `f64` matrices of this size are
/// about 100 MB.
pub const MAX_MATRIX_SIZE: usize = 2_000;

/// Multiplies two random `size`×`size` matrices and logs the elapsed time.
#[derive(Debug, Clone)]
pub struct MatrixMultiplyTask {
    name: String,
    size: usize,
}

impl MatrixMultiplyTask {
    pub fn new(size: usize) -> Self {
        Self {
            name: "matrix-multiply".to_string(),
            size,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Task for MatrixMultiplyTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> Result<()> {
        if self.size == 0 {
            bail!("matrix size must be >= 1");
        }
        if self.size > MAX_MATRIX_SIZE {
            bail!("matrix size {} exceeds the maximum of {MAX_MATRIX_SIZE}", self.size);
        }

        let n = self.size;
        let mut rng = rand::thread_rng();
        let a: Vec<f64> = (0..n * n).map(|_| rng.r#gen::<f64>()).collect();
        let b: Vec<f64> = (0..n * n).map(|_| rng.r#gen::<f64>()).collect();

        let started = Instant::now();
        let product = multiply(&a, &b, n);
        let elapsed = started.elapsed();

        let trace: f64 = (0..n).map(|i| product[i * n + i]).sum();
        info!(
            task = %self.name,
            size = n,
            elapsed_ms = elapsed.as_millis() as u64,
            trace,
            "matrix multiply done"
        );
        Ok(())
    }
}

/// Row-major square matrix product.
pub fn multiply(a: &[f64], b: &[f64], n: usize) -> Vec<f64> {
    let mut out = vec![0.0; n * n];
    for i in 0..n {
        for k in 0..n {
            let aik = a[i * n + k];
            for j in 0..n {
                out[i * n + j] += aik * b[k * n + j];
            }
        }
    }
    out
}

/// Draws `count` integers in `0..=100` and logs their mean and variance.
#[derive(Debug, Clone)]
pub struct RandomStatsTask {
    name: String,
    count: usize,
}

impl RandomStatsTask {
    pub fn new(count: usize) -> Self {
        Self {
            name: "random-stats".to_string(),
            count,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl Task for RandomStatsTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> Result<()> {
        let mut rng = rand::thread_rng();
        let samples: Vec<u32> = (0..self.count).map(|_| rng.gen_range(0..=100)).collect();

        let Some((mean, variance)) = mean_and_variance(&samples) else {
            bail!("random stats needs at least one sample");
        };

        info!(
            task = %self.name,
            n = self.count,
            mean,
            variance,
            "random stats computed"
        );
        Ok(())
    }
}

/// Population mean and variance; `None` for an empty slice.
pub fn mean_and_variance(samples: &[u32]) -> Option<(f64, f64)> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().map(|&x| f64::from(x)).sum::<f64>() / n;
    let variance = samples
        .iter()
        .map(|&x| (f64::from(x) - mean).powi(2))
        .sum::<f64>()
        / n;
    Some((mean, variance))
}
