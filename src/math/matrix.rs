use rand::prelude::*;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

use crate::error::{Result, ValError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal(rng: &mut ThreadRng) -> f64 {
        // Draw two independent uniform samples in (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Xavier (Glorot) initialization: samples from N(0, sqrt(1 / rows)).
    ///
    /// Shape: (rows, cols). Weights are stored input-major, so `rows` is the
    /// fan-in.
    pub fn xavier(rows: usize, cols: usize) -> Matrix {
        let mut rng = rand::thread_rng();
        let std_dev = (1.0 / rows.max(1) as f64).sqrt();
        let mut res = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = Matrix::sample_standard_normal(&mut rng) * std_dev;
            }
        }
        res
    }

    /// Builds a matrix from row vectors; every row must have the same width.
    /// An empty `data` yields a 0×0 matrix.
    pub fn from_data(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let cols = data.first().map_or(0, Vec::len);
        if let Some((i, row)) = data.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(ValError::shape(
                format!("{cols} columns"),
                format!("row {i} with {} columns", row.len()),
            ));
        }
        Ok(Matrix { rows: data.len(), cols, data })
    }

    /// Row `i` as a slice.
    ///
    /// # Panics
    /// If `i >= self.rows`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i]
    }

    /// Copies column `j` out of every row.
    ///
    /// # Panics
    /// If `j >= self.cols` and the matrix has at least one row.
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.data.iter().map(|row| row[j]).collect()
    }

    pub fn matmul(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(ValError::shape(
                format!("lhs cols == rhs rows ({})", rhs.rows),
                format!("lhs cols {}", self.cols),
            ));
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = 0.0;

                for k in 0..self.cols {
                    sum += self.data[i][k] * rhs.data[k][j];
                }

                res.data[i][j] = sum;
            }
        }

        Ok(res)
    }

    /// Adds a 1×cols row to every row (bias broadcast).
    pub fn add_row(mut self, bias: &Matrix) -> Result<Matrix> {
        if bias.rows != 1 || bias.cols != self.cols {
            return Err(ValError::shape(
                format!("1x{}", self.cols),
                format!("{}x{}", bias.rows, bias.cols),
            ));
        }
        for row in &mut self.data {
            for (x, b) in row.iter_mut().zip(&bias.data[0]) {
                *x += b;
            }
        }
        Ok(self)
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// Stacks matrices vertically. All parts must share a column count.
    pub fn concat_rows(parts: Vec<Matrix>) -> Result<Matrix> {
        let cols = parts.first().map_or(0, |m| m.cols);
        let mut data = Vec::with_capacity(parts.iter().map(|m| m.rows).sum());
        for part in parts {
            if part.cols != cols {
                return Err(ValError::shape(format!("{cols} columns"), format!("{} columns", part.cols)));
            }
            data.extend(part.data);
        }
        Ok(Matrix { rows: data.len(), cols, data })
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matmul_and_bias() {
        let x = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let w = Matrix::from_data(vec![vec![1.0], vec![-1.0]]).unwrap();
        let b = Matrix::from_data(vec![vec![0.5]]).unwrap();
        let y = x.matmul(&w).unwrap().add_row(&b).unwrap();
        assert_eq!(y.column(0), vec![-0.5, -0.5]);
    }

    #[test]
    fn test_matmul_rejects_bad_shapes() {
        let x = Matrix::zeros(2, 3);
        let w = Matrix::zeros(2, 1);
        assert!(matches!(x.matmul(&w), Err(ValError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let res = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(res.is_err());
    }

    #[test]
    fn test_concat_rows() {
        let a = Matrix::from_data(vec![vec![1.0, 2.0]]).unwrap();
        let b = Matrix::from_data(vec![vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        let c = Matrix::concat_rows(vec![a, b]).unwrap();
        assert_eq!(c.rows, 3);
        assert_eq!(c.row(2), &[5.0, 6.0]);
        assert!(Matrix::concat_rows(vec![Matrix::zeros(1, 2), Matrix::zeros(1, 3)]).is_err());
    }

    #[test]
    #[should_panic]
    fn test_row_out_of_range_panics() {
        let m = Matrix::zeros(2, 2);
        let _ = m.row(2);
    }

    #[test]
    #[should_panic]
    fn test_column_out_of_range_panics() {
        let m = Matrix::zeros(2, 2);
        let _ = m.column(2);
    }

    #[test]
    fn test_xavier_shape() {
        let w = Matrix::xavier(4, 3);
        assert_eq!((w.rows, w.cols), (4, 3));
        assert!(w.data.iter().flatten().all(|x| x.is_finite()));
    }
}
