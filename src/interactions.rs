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

use std::time::Instant;

use fnv::FnvHashSet;
use log::info;

use crate::catalog::Listing;
use crate::error::{RecoError, Result};
use crate::similarity::SparseRows;
use crate::stats::{DataDictionary, Renaming};
use crate::types;
use crate::types::{SparseMatrix, SparseVector};
use crate::utils;

/// Sparse user x item count matrix. Each observed (user, item) pair has exactly one entry,
/// holding the number of times it was observed. The matrix is stored twice, once per user
/// (rows) and once per item (columns), both sorted by index.
#[derive(Clone, Debug)]
pub struct InteractionMatrix {
    data_dict: DataDictionary,
    renaming: Renaming,
    user_rows: SparseMatrix,
    item_columns: SparseMatrix,
}

impl InteractionMatrix {

    /// Builds the matrix from `(item, visitors)` pairs. Items without visitors still get a
    /// (then empty) column.
    pub fn build<'a, I, U>(visits: I) -> Result<Self>
        where I: IntoIterator<Item = (&'a str, U)>,
              U: IntoIterator<Item = &'a str> {

        let start = Instant::now();

        let visits: Vec<(&'a str, Vec<&'a str>)> = visits.into_iter()
            .map(|(item, visitors)| (item, visitors.into_iter().collect()))
            .collect();

        let mut user_names = FnvHashSet::default();
        let mut item_names = FnvHashSet::default();
        let mut num_interactions: u64 = 0;

        for (item, visitors) in visits.iter() {
            item_names.insert(*item);
            for user in visitors.iter() {
                user_names.insert(*user);
                num_interactions += 1;
            }
        }

        if num_interactions == 0 {
            return Err(RecoError::EmptyDataset(
                format!("no interactions found for {} items", item_names.len())));
        }

        let data_dict = DataDictionary::from_names(user_names, item_names, num_interactions);

        let mut counts = types::new_sparse_accumulator(data_dict.num_items());

        for (item, visitors) in visits.iter() {
            let item_index = data_dict.item_index(item)
                .ok_or_else(|| RecoError::UnknownItem(item.to_string()))?;

            for user in visitors.iter() {
                let user_index = data_dict.user_index(user)
                    .ok_or_else(|| RecoError::UnknownUser(user.to_string()))?;

                let count = counts[item_index as usize].entry(user_index).or_insert(0);
                *count = count.saturating_add(1);
            }
        }

        let item_columns: SparseMatrix = counts.into_iter()
            .map(|column| {
                let mut column: SparseVector = column.into_iter().collect();
                column.sort_unstable_by_key(|&(user_index, _)| user_index);
                column
            })
            .collect();

        // Walking the columns in item order leaves every user row sorted by item index
        let mut user_rows = types::new_sparse_matrix(data_dict.num_users());
        for (item_index, column) in item_columns.iter().enumerate() {
            for &(user_index, count) in column.iter() {
                user_rows[user_index as usize].push((item_index as u32, count));
            }
        }

        let renaming = Renaming::from(&data_dict);

        info!(
            "Built interaction matrix with {} interactions between {} users and {} items in {}ms",
            data_dict.num_interactions(),
            data_dict.num_users(),
            data_dict.num_items(),
            utils::to_millis(start.elapsed()),
        );

        Ok(InteractionMatrix { data_dict, renaming, user_rows, item_columns })
    }

    /// Builds the matrix from the `visitors` of each listing, dropping visits rated below
    /// `min_rating` if a threshold is given.
    pub fn from_listings(listings: &[Listing], min_rating: Option<f64>) -> Result<Self> {
        InteractionMatrix::build(listings.iter()
            .map(|listing| (listing.listing_id.as_str(), listing.visitors_rated_at_least(min_rating))))
    }

    pub fn num_users(&self) -> usize {
        self.data_dict.num_users()
    }

    pub fn num_items(&self) -> usize {
        self.data_dict.num_items()
    }

    /// Number of raw interactions, before repeated pairs were merged.
    pub fn num_interactions(&self) -> u64 {
        self.data_dict.num_interactions()
    }

    /// Number of distinct (user, item) entries.
    pub fn num_entries(&self) -> usize {
        self.item_columns.iter().map(|column| column.len()).sum()
    }

    pub fn data_dict(&self) -> &DataDictionary {
        &self.data_dict
    }

    pub fn item_ids(&self) -> &[String] {
        self.renaming.item_names()
    }

    pub fn user_row(&self, user_index: u32) -> &[(u32, u16)] {
        &self.user_rows[user_index as usize]
    }

    pub fn item_column(&self, item_index: u32) -> &[(u32, u16)] {
        &self.item_columns[item_index as usize]
    }

    pub fn count(&self, user_index: u32, item_index: u32) -> u16 {
        let row = self.user_row(user_index);
        match row.binary_search_by_key(&item_index, |&(item, _)| item) {
            Ok(position) => row[position].1,
            Err(_) => 0,
        }
    }

    /// The items as vectors over the user space, the input for item x item similarities.
    pub fn item_vectors(&self) -> SparseRows {
        SparseRows::new(&self.item_columns, self.num_users())
    }
}

#[cfg(test)]
mod tests {

    use super::InteractionMatrix;
    use crate::catalog::Listing;
    use crate::error::RecoError;

    #[test]
    fn one_entry_per_observed_pair() {
        let matrix = InteractionMatrix::build(vec![
            ("pony", vec!["charles", "alice", "bob"]),
            ("apple", vec!["alice", "bob", "alice"]),
            ("dog", vec!["alice"]),
        ]).unwrap();

        assert_eq!(matrix.num_users(), 3);
        assert_eq!(matrix.num_items(), 3);
        assert_eq!(matrix.num_interactions(), 7);
        assert_eq!(matrix.num_entries(), 6);

        let dict = matrix.data_dict();
        let alice = dict.user_index("alice").unwrap();
        let apple = dict.item_index("apple").unwrap();
        let charles = dict.user_index("charles").unwrap();

        assert_eq!(matrix.count(alice, apple), 2);
        assert_eq!(matrix.count(charles, apple), 0);
        assert_eq!(matrix.item_ids(), &["apple", "dog", "pony"]);
    }

    #[test]
    fn rows_and_columns_agree() {
        let matrix = InteractionMatrix::build(vec![
            ("b", vec!["u2", "u1"]),
            ("a", vec!["u1"]),
            ("c", vec!["u3", "u1"]),
        ]).unwrap();

        assert_eq!(matrix.user_row(0), &[(0, 1), (1, 1), (2, 1)]);
        assert_eq!(matrix.item_column(2), &[(0, 1), (2, 1)]);

        for user in 0..matrix.num_users() as u32 {
            for &(item, count) in matrix.user_row(user) {
                assert!(matrix.item_column(item).contains(&(user, count)));
            }
        }
    }

    #[test]
    fn building_twice_gives_identical_matrices() {
        let visits = vec![("x", vec!["u9", "u3"]), ("y", vec!["u3", "u5"]), ("z", vec![])];

        let first = InteractionMatrix::build(visits.clone()).unwrap();
        let second = InteractionMatrix::build(visits).unwrap();

        assert_eq!(first.item_ids(), second.item_ids());
        for item in 0..first.num_items() as u32 {
            assert_eq!(first.item_column(item), second.item_column(item));
        }
        assert!(first.item_column(2).is_empty());
    }

    #[test]
    fn no_interactions_is_an_empty_dataset() {
        let result = InteractionMatrix::build(vec![("a", Vec::<&str>::new())]);
        match result {
            Err(RecoError::EmptyDataset(_)) => {},
            _ => panic!("expected an empty dataset error"),
        }
    }

    #[test]
    fn low_ratings_are_dropped() {
        let listings = vec![
            Listing {
                listing_id: "a".to_owned(),
                visitors: vec!["u1".to_owned(), "u2".to_owned()],
                user_ratings: Some(vec![95.0, 40.0]),
                ..Listing::default()
            },
            Listing {
                listing_id: "b".to_owned(),
                visitors: vec!["u2".to_owned()],
                user_ratings: Some(vec![91.0]),
                ..Listing::default()
            },
        ];

        let matrix = InteractionMatrix::from_listings(&listings, Some(90.0)).unwrap();

        assert_eq!(matrix.num_interactions(), 2);
        let u2 = matrix.data_dict().user_index("u2").unwrap();
        assert_eq!(matrix.user_row(u2), &[(1, 1)]);
    }
}
