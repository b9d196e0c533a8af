/**
 * SimReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use fnv::FnvHashMap;
use serde_derive::{Deserialize, Serialize};

use crate::error::{RecoError, Result};

pub type DenseVector = Vec<f64>;

/// Sparse count vector as `(index, count)` pairs, sorted by index.
pub type SparseVector = Vec<(u32, u16)>;
pub type SparseMatrix = Vec<SparseVector>;

/// Unordered counts, only used while interactions are still being accumulated.
pub type SparseAccumulator = Vec<FnvHashMap<u32, u16>>;

/// Square item x item or rectangular query x item scores in [-1, 1].
pub type SimilarityMatrix = DenseMatrix;

pub fn new_dense_vector(dimensions: usize) -> DenseVector {
    vec![0.0; dimensions]
}

pub fn new_sparse_matrix(num_rows: usize) -> SparseMatrix {
    vec![Vec::new(); num_rows]
}

pub fn new_sparse_accumulator(num_rows: usize) -> SparseAccumulator {
    vec![FnvHashMap::with_capacity_and_hasher(0, Default::default()); num_rows]
}

/// Row-major dense matrix of `f64` values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    num_rows: usize,
    num_columns: usize,
    values: Vec<f64>,
}

impl DenseMatrix {

    pub fn zeros(num_rows: usize, num_columns: usize) -> Self {
        DenseMatrix { num_rows, num_columns, values: vec![0.0; num_rows * num_columns] }
    }

    /// Stacks the given rows, all of which must have the same length.
    pub fn from_rows(rows: Vec<DenseVector>) -> Result<Self> {

        let num_rows = rows.len();
        let num_columns = rows.first().map(|row| row.len()).unwrap_or(0);

        let mut values = Vec::with_capacity(num_rows * num_columns);

        for row in rows.into_iter() {
            if row.len() != num_columns {
                return Err(RecoError::DimensionMismatch { expected: num_columns, found: row.len() });
            }
            values.extend(row);
        }

        Ok(DenseMatrix { num_rows, num_columns, values })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    pub fn is_square(&self) -> bool {
        self.num_rows == self.num_columns
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.num_columns;
        &self.values[start..start + self.num_columns]
    }

    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.values[row * self.num_columns + column]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

#[cfg(test)]
mod tests {

    use super::DenseMatrix;
    use crate::error::RecoError;

    #[test]
    fn rows_are_laid_out_row_major() {
        let matrix = DenseMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]])
            .unwrap();

        assert_eq!(matrix.num_rows(), 3);
        assert_eq!(matrix.num_columns(), 2);
        assert_eq!(matrix.row(1), &[3.0, 4.0]);
        assert_eq!(matrix.get(2, 0), 5.0);
        assert!(!matrix.is_square());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let result = DenseMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);

        match result {
            Err(RecoError::DimensionMismatch { expected, found }) => {
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            },
            _ => panic!("expected a dimension mismatch"),
        }
    }

    #[test]
    fn no_rows_gives_empty_matrix() {
        let matrix = DenseMatrix::from_rows(Vec::new()).unwrap();
        assert_eq!(matrix.num_rows(), 0);
        assert_eq!(matrix.num_columns(), 0);
        assert!(matrix.values().is_empty());
    }
}
