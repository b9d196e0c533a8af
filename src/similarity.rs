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

use std::cmp::Ordering;
use std::time::Instant;

use log::{debug, info};
use scoped_pool::Pool;

use crate::error::{RecoError, Result};
use crate::types::{DenseMatrix, SimilarityMatrix, SparseVector};
use crate::utils;

/// A set of equally sized row vectors that can be compared pairwise.
pub trait RowVectors: Sync {

    fn num_rows(&self) -> usize;

    fn dimensions(&self) -> usize;

    /// Dot product of row `row` of `self` with row `other_row` of `other`.
    fn dot(&self, row: usize, other: &Self, other_row: usize) -> f64;
}

impl RowVectors for DenseMatrix {

    fn num_rows(&self) -> usize {
        DenseMatrix::num_rows(self)
    }

    fn dimensions(&self) -> usize {
        self.num_columns()
    }

    fn dot(&self, row: usize, other: &Self, other_row: usize) -> f64 {
        dense_dot(self.row(row), other.row(other_row))
    }
}

/// Borrowed view of sparse count vectors, e.g. the item columns of an interaction matrix.
pub struct SparseRows<'a> {
    rows: &'a [SparseVector],
    dimensions: usize,
}

impl<'a> SparseRows<'a> {
    pub fn new(rows: &'a [SparseVector], dimensions: usize) -> Self {
        SparseRows { rows, dimensions }
    }
}

impl<'a> RowVectors for SparseRows<'a> {

    fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn dot(&self, row: usize, other: &Self, other_row: usize) -> f64 {

        let a = &self.rows[row];
        let b = &other.rows[other_row];

        let (mut i, mut j) = (0, 0);
        let mut dot = 0.0;

        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    dot += a[i].1 as f64 * b[j].1 as f64;
                    i += 1;
                    j += 1;
                }
            }
        }

        dot
    }
}

#[inline]
fn dense_dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine from a precomputed dot product and norms. Zero norm vectors are similar to nothing.
#[inline]
fn cosine(dot: f64, norm_a: f64, norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).max(-1.0).min(1.0)
    }
}

fn norms<R: RowVectors>(rows: &R) -> Vec<f64> {
    (0..rows.num_rows())
        .map(|row| rows.dot(row, rows, row).sqrt())
        .collect()
}

pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(RecoError::DimensionMismatch { expected: a.len(), found: b.len() });
    }

    Ok(cosine(dense_dot(a, b), dense_dot(a, a).sqrt(), dense_dot(b, b).sqrt()))
}

/// Square similarity matrix of all rows against each other, computed in bands of at most
/// `batch_size` rows. The result does not depend on `batch_size` or `num_threads`.
pub fn compute_similarity<R: RowVectors>(
    rows: &R,
    batch_size: usize,
    num_threads: usize,
) -> Result<SimilarityMatrix> {
    compute_cross_similarity(rows, rows, batch_size, num_threads)
}

/// Similarity of every query row against every row, one output row per query. Batches own
/// disjoint bands of the pre-allocated output and only read the finished inputs, so they are
/// handed to a pool of `num_threads` workers without any locking.
pub fn compute_cross_similarity<R: RowVectors>(
    queries: &R,
    rows: &R,
    batch_size: usize,
    num_threads: usize,
) -> Result<SimilarityMatrix> {

    if batch_size == 0 {
        return Err(RecoError::InvalidConfig("batch_size must be a positive integer".to_owned()));
    }

    if queries.dimensions() != rows.dimensions() {
        return Err(RecoError::DimensionMismatch {
            expected: rows.dimensions(),
            found: queries.dimensions(),
        });
    }

    let num_queries = queries.num_rows();
    let num_rows = rows.num_rows();

    if num_rows == 0 {
        return Err(RecoError::EmptyDataset("no rows to compare against".to_owned()));
    }

    let start = Instant::now();

    let query_norms = norms(queries);
    let row_norms = norms(rows);

    let batch_size = batch_size.min(num_queries.max(1));
    let num_batches = (num_queries + batch_size - 1) / batch_size;
    let band_size = batch_size * num_rows;

    let mut similarities = SimilarityMatrix::zeros(num_queries, num_rows);

    if num_threads <= 1 || num_batches <= 1 {
        for (batch, band) in similarities.values_mut().chunks_mut(band_size).enumerate() {
            fill_band(queries, &query_norms, rows, &row_norms, batch * batch_size, band);
        }
    } else {
        let pool = Pool::new(num_threads.min(num_batches));

        pool.scoped(|scope| {
            for (batch, band) in similarities.values_mut().chunks_mut(band_size).enumerate() {

                let query_norms = &query_norms;
                let row_norms = &row_norms;

                scope.execute(move || {
                    fill_band(queries, query_norms, rows, row_norms, batch * batch_size, band)
                });
            }
        });

        pool.shutdown();
    }

    info!(
        "Computed {}x{} similarities in {} batches of up to {} rows in {}ms",
        num_queries,
        num_rows,
        num_batches,
        batch_size,
        utils::to_millis(start.elapsed()),
    );

    Ok(similarities)
}

fn fill_band<R: RowVectors>(
    queries: &R,
    query_norms: &[f64],
    rows: &R,
    row_norms: &[f64],
    first_query: usize,
    band: &mut [f64],
) {

    let num_rows = row_norms.len();
    let num_queries_in_band = band.len() / num_rows;

    debug!("Batch {}..{}/{}", first_query, first_query + num_queries_in_band, query_norms.len());

    for (offset, output) in band.chunks_mut(num_rows).enumerate() {
        let query = first_query + offset;
        for (row, value) in output.iter_mut().enumerate() {
            *value = cosine(queries.dot(query, rows, row), query_norms[query], row_norms[row]);
        }
    }
}

/// Similarity of a single query vector, such as a user profile, against every row of `matrix`.
pub fn compute_query_similarity(query: &[f64], matrix: &DenseMatrix) -> Result<Vec<f64>> {

    if query.len() != matrix.num_columns() {
        return Err(RecoError::DimensionMismatch {
            expected: matrix.num_columns(),
            found: query.len(),
        });
    }

    let query_norm = dense_dot(query, query).sqrt();

    let similarities = (0..matrix.num_rows())
        .map(|row| {
            let vector = matrix.row(row);
            cosine(dense_dot(query, vector), query_norm, dense_dot(vector, vector).sqrt())
        })
        .collect();

    Ok(similarities)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::types::{DenseMatrix, SparseVector};

    fn close_enough_to(value: f64, expected: f64) -> bool {
        (value - expected).abs() < 1e-9
    }

    fn features() -> DenseMatrix {
        DenseMatrix::from_rows(vec![
            vec![1.0, 0.0, 2.0, 0.0],
            vec![2.0, 0.0, 4.0, 0.0],
            vec![0.0, 3.0, 0.0, 1.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![1.0, 1.0, 1.0, 1.0],
            vec![0.5, 4.0, 0.0, 2.5],
            vec![3.0, 1.0, 0.0, 0.0],
        ]).unwrap()
    }

    #[test]
    fn cosine_of_vectors() {
        assert!(close_enough_to(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0));
        assert!(close_enough_to(cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]).unwrap(), 1.0));
        assert!(close_enough_to(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap(), -1.0));
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap(), 0.0);
        assert!(cosine_similarity(&[1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn symmetric_with_unit_diagonal() {
        let features = features();
        let similarities = compute_similarity(&features, 3, 1).unwrap();

        assert!(similarities.is_square());

        for i in 0..features.num_rows() {
            for j in 0..features.num_rows() {
                assert_eq!(similarities.get(i, j), similarities.get(j, i));
                assert!(similarities.get(i, j) >= -1.0 && similarities.get(i, j) <= 1.0);
            }
        }

        for i in 0..features.num_rows() {
            if i == 3 {
                assert_eq!(similarities.get(i, i), 0.0);
            } else {
                assert!(close_enough_to(similarities.get(i, i), 1.0));
            }
        }

        assert!(close_enough_to(similarities.get(0, 1), 1.0));
        assert_eq!(similarities.get(3, 4), 0.0);
    }

    #[test]
    fn batch_size_and_threads_do_not_change_the_result() {
        let features = features();
        let reference = compute_similarity(&features, features.num_rows(), 1).unwrap();

        for batch_size in 1..=features.num_rows() + 2 {
            for num_threads in &[1, 2, 4] {
                let batched = compute_similarity(&features, batch_size, *num_threads).unwrap();
                assert_eq!(batched, reference);
            }
        }
    }

    #[test]
    fn sparse_rows_match_their_dense_counterpart() {
        let sparse: Vec<SparseVector> = vec![
            vec![(0, 1), (2, 2)],
            vec![(1, 1), (2, 1), (3, 1)],
            vec![],
            vec![(0, 3), (3, 1)],
        ];
        let dense = DenseMatrix::from_rows(vec![
            vec![1.0, 0.0, 2.0, 0.0],
            vec![0.0, 1.0, 1.0, 1.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![3.0, 0.0, 0.0, 1.0],
        ]).unwrap();

        let from_sparse = compute_similarity(&SparseRows::new(&sparse, 4), 2, 2).unwrap();
        let from_dense = compute_similarity(&dense, 2, 2).unwrap();

        for i in 0..4 {
            for j in 0..4 {
                assert!(close_enough_to(from_sparse.get(i, j), from_dense.get(i, j)));
            }
        }
    }

    #[test]
    fn items_sharing_all_users_are_most_similar() {
        // A and B share both users, C has a user of its own
        let items: Vec<SparseVector> = vec![
            vec![(0, 1), (1, 1)],
            vec![(0, 1), (1, 1)],
            vec![(2, 1)],
        ];

        let similarities = compute_similarity(&SparseRows::new(&items, 3), 1, 1).unwrap();

        assert!(close_enough_to(similarities.get(0, 1), 1.0));
        assert_eq!(similarities.get(0, 2), 0.0);
        assert!(similarities.get(0, 1) > similarities.get(0, 2));
    }

    #[test]
    fn cross_similarity_matches_query_similarity() {
        let features = features();
        let queries = DenseMatrix::from_rows(vec![
            vec![1.0, 2.0, 0.0, 1.0],
            vec![0.0, 0.0, 1.0, 0.0],
        ]).unwrap();

        let cross = compute_cross_similarity(&queries, &features, 1, 2).unwrap();

        assert_eq!(cross.num_rows(), 2);
        assert_eq!(cross.num_columns(), features.num_rows());

        for query in 0..queries.num_rows() {
            let single = compute_query_similarity(queries.row(query), &features).unwrap();
            assert_eq!(cross.row(query), single.as_slice());
        }
    }

    #[test]
    fn incompatible_widths_are_rejected() {
        let features = features();
        let queries = DenseMatrix::from_rows(vec![vec![1.0, 2.0]]).unwrap();

        match compute_cross_similarity(&queries, &features, 10, 1) {
            Err(RecoError::DimensionMismatch { expected, found }) => {
                assert_eq!(expected, 4);
                assert_eq!(found, 2);
            },
            _ => panic!("expected a dimension mismatch"),
        }

        assert!(compute_query_similarity(&[1.0], &features).is_err());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(compute_similarity(&features(), 0, 1).is_err());
    }

    #[test]
    fn nothing_to_compare_against() {
        let empty = DenseMatrix::zeros(0, 4);
        match compute_similarity(&empty, 10, 1) {
            Err(RecoError::EmptyDataset(_)) => {},
            _ => panic!("expected an empty dataset error"),
        }
    }
}
