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

use std::collections::BTreeSet;
use std::time::Instant;

use fnv::{FnvHashMap, FnvHashSet};
use log::info;
use serde_derive::{Deserialize, Serialize};

use crate::catalog::Listing;
use crate::error::{RecoError, Result};
use crate::types;
use crate::types::{DenseMatrix, DenseVector};
use crate::utils;

pub const NUMERIC_FIELDS: [&str; 3] = ["accommodates", "bedrooms", "price"];
pub const CATEGORICAL_FIELDS: [&str; 3] = ["property_type", "room_type", "city"];

/// Parses a currency formatted price such as `$1,250.00`, keeping only digits and the
/// decimal point.
pub fn parse_price(item: &str, raw: &str) -> Result<f64> {

    let digits: String = raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if digits.is_empty() {
        return Err(RecoError::malformed_field(item, "price", raw));
    }

    digits.parse::<f64>()
        .map_err(|_| RecoError::malformed_field(item, "price", raw))
}

fn categorical_value<'a>(listing: &'a Listing, field: &str) -> &'a str {
    match field {
        "property_type" => &listing.property_type,
        "room_type" => &listing.room_type,
        _ => &listing.city,
    }
}

/// The fitted layout of the feature vectors: the numeric fields, one 0/1 column per amenity,
/// then a one-hot block per categorical field with its categories in sorted order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    amenities: Vec<String>,
    categories: Vec<(String, Vec<String>)>,
}

impl FeatureEncoder {

    pub fn fit(listings: &[Listing], amenities: &[String]) -> Result<Self> {

        if listings.is_empty() {
            return Err(RecoError::EmptyDataset("no listings to fit features on".to_owned()));
        }

        let categories = CATEGORICAL_FIELDS.iter()
            .map(|field| {
                let values: BTreeSet<&str> = listings.iter()
                    .map(|listing| categorical_value(listing, field))
                    .collect();
                let values: Vec<String> = values.into_iter().map(|value| value.to_owned()).collect();

                (field.to_string(), values)
            })
            .collect();

        Ok(FeatureEncoder { amenities: amenities.to_vec(), categories })
    }

    pub fn dimensions(&self) -> usize {
        NUMERIC_FIELDS.len()
            + self.amenities.len()
            + self.categories.iter().map(|(_, values)| values.len()).sum::<usize>()
    }

    pub fn feature_names(&self) -> Vec<String> {

        let mut names: Vec<String> = NUMERIC_FIELDS.iter().map(|field| field.to_string()).collect();
        names.extend(self.amenities.iter().cloned());

        for (field, values) in self.categories.iter() {
            names.extend(values.iter().map(|value| format!("{}_{}", field, value)));
        }

        names
    }

    /// Feature vector of a single listing. Categories not seen while fitting encode as all zeros.
    pub fn encode(&self, listing: &Listing) -> Result<DenseVector> {

        let mut features = Vec::with_capacity(self.dimensions());

        features.push(listing.accommodates);
        features.push(listing.bedrooms);
        features.push(parse_price(&listing.listing_id, &listing.price)?);

        for amenity in self.amenities.iter() {
            features.push(if listing.amenities.contains(amenity) { 1.0 } else { 0.0 });
        }

        for (field, values) in self.categories.iter() {
            let offset = features.len();
            features.extend(types::new_dense_vector(values.len()));

            let value = categorical_value(listing, field);
            if let Ok(position) = values.binary_search_by(|category| category.as_str().cmp(value)) {
                features[offset + position] = 1.0;
            }
        }

        Ok(features)
    }

    pub fn transform(&self, listings: &[Listing]) -> Result<DenseMatrix> {
        let rows = listings.iter()
            .map(|listing| self.encode(listing))
            .collect::<Result<Vec<_>>>()?;

        let matrix = DenseMatrix::from_rows(rows)?;

        if matrix.num_rows() > 0 && matrix.num_columns() != self.dimensions() {
            return Err(RecoError::DimensionMismatch {
                expected: self.dimensions(),
                found: matrix.num_columns(),
            });
        }

        Ok(matrix)
    }
}

/// Dense item x feature matrix, one row per listing in table order.
#[derive(Clone, Debug)]
pub struct FeatureMatrix {
    item_ids: Vec<String>,
    item_dict: FnvHashMap<String, u32>,
    features: DenseMatrix,
    encoder: FeatureEncoder,
}

impl FeatureMatrix {

    pub fn build(listings: &[Listing], amenities: &[String]) -> Result<Self> {

        let start = Instant::now();

        let encoder = FeatureEncoder::fit(listings, amenities)?;
        let features = encoder.transform(listings)?;

        let item_ids: Vec<String> = listings.iter()
            .map(|listing| listing.listing_id.clone())
            .collect();

        let mut item_dict = FnvHashMap::with_capacity_and_hasher(item_ids.len(), Default::default());
        for (index, item_id) in item_ids.iter().enumerate() {
            item_dict.entry(item_id.clone()).or_insert(index as u32);
        }

        info!(
            "Built {}x{} feature matrix in {}ms",
            features.num_rows(),
            features.num_columns(),
            utils::to_millis(start.elapsed()),
        );

        Ok(FeatureMatrix { item_ids, item_dict, features, encoder })
    }

    pub fn num_items(&self) -> usize {
        self.item_ids.len()
    }

    pub fn dimensions(&self) -> usize {
        self.features.num_columns()
    }

    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }

    /// Row of the first listing with this id.
    pub fn item_index(&self, item_id: &str) -> Option<u32> {
        self.item_dict.get(item_id).cloned()
    }

    pub fn features(&self) -> &DenseMatrix {
        &self.features
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Mean feature vector of all catalog rows whose id occurs in `history`. Ids unknown to
    /// the catalog are ignored, but at least one must be known.
    pub fn profile(&self, history: &[String]) -> Result<DenseVector> {

        let wanted: FnvHashSet<&str> = history.iter().map(|item_id| item_id.as_str()).collect();

        let mut profile = types::new_dense_vector(self.dimensions());
        let mut num_matches = 0;

        for (row, item_id) in self.item_ids.iter().enumerate() {
            if wanted.contains(item_id.as_str()) {
                for (sum, value) in profile.iter_mut().zip(self.features.row(row).iter()) {
                    *sum += *value;
                }
                num_matches += 1;
            }
        }

        if num_matches == 0 {
            return Err(RecoError::NoValidHistory(history.len()));
        }

        for sum in profile.iter_mut() {
            *sum /= num_matches as f64;
        }

        Ok(profile)
    }
}
