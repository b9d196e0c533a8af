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

use fnv::{FnvHashMap, FnvHashSet};

/// One row of the listing table, as handed over by the ingestion layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Listing {
    pub listing_id: String,
    pub property_type: String,
    pub room_type: String,
    pub city: String,
    pub accommodates: f64,
    pub bedrooms: f64,
    /// Currency formatted, parsed by the feature builder.
    pub price: String,
    /// Names of the amenities this listing offers.
    pub amenities: FnvHashSet<String>,
    pub visitors: Vec<String>,
    /// Parallel to `visitors` when present.
    pub user_ratings: Option<Vec<f64>>,
}

impl Listing {

    /// Visitors whose rating reaches `min_rating`. Without a threshold, or without ratings,
    /// every visitor is kept.
    pub fn visitors_rated_at_least(&self, min_rating: Option<f64>) -> Vec<&str> {
        match (min_rating, &self.user_ratings) {
            (Some(min_rating), Some(ratings)) => {
                self.visitors.iter()
                    .zip(ratings.iter())
                    .filter(|(_, rating)| **rating >= min_rating)
                    .map(|(visitor, _)| visitor.as_str())
                    .collect()
            },
            _ => self.visitors.iter().map(|visitor| visitor.as_str()).collect(),
        }
    }
}

/// The visits of every user, in the order in which they appear in the listing table.
/// Users are kept in order of their first appearance.
#[derive(Clone, Debug, Default)]
pub struct UserHistories {
    user_ids: Vec<String>,
    histories: Vec<Vec<String>>,
    user_dict: FnvHashMap<String, usize>,
}

impl UserHistories {

    pub fn from_listings(listings: &[Listing]) -> Self {

        let mut user_histories = UserHistories::default();

        for listing in listings.iter() {
            for visitor in listing.visitors.iter() {
                user_histories.push(visitor, &listing.listing_id);
            }
        }

        user_histories
    }

    pub fn push(&mut self, user_id: &str, item_id: &str) {

        let index = match self.user_dict.get(user_id) {
            Some(index) => *index,
            None => {
                let index = self.user_ids.len();
                self.user_dict.insert(user_id.to_owned(), index);
                self.user_ids.push(user_id.to_owned());
                self.histories.push(Vec::new());
                index
            }
        };

        self.histories[index].push(item_id.to_owned());
    }

    pub fn num_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn user_id(&self, index: usize) -> &str {
        &self.user_ids[index]
    }

    pub fn history_at(&self, index: usize) -> &[String] {
        &self.histories[index]
    }

    pub fn history(&self, user_id: &str) -> Option<&[String]> {
        self.user_dict.get(user_id).map(|index| self.histories[*index].as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.user_ids.iter()
            .zip(self.histories.iter())
            .map(|(user_id, history)| (user_id.as_str(), history.as_slice()))
    }

    /// Indices of all users with at least `min_history` visits.
    pub fn eligible(&self, min_history: usize) -> Vec<usize> {
        self.histories.iter()
            .enumerate()
            .filter(|(_, history)| history.len() >= min_history)
            .map(|(index, _)| index)
            .collect()
    }
}
