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

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use fnv::FnvHashSet;
use log::debug;
use serde_derive::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{RecoError, Result};
use crate::features::FeatureMatrix;
use crate::interactions::InteractionMatrix;
use crate::ranking;
use crate::ranking::ScoredItem;
use crate::similarity;
use crate::types::SimilarityMatrix;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Neighbours by shared visitors.
    ItemBased,
    /// Neighbours by shared attributes.
    ContentBased,
}

impl FromStr for Mode {
    type Err = RecoError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "item" | "item_based" | "collaborative" => Ok(Mode::ItemBased),
            "content" | "content_based" => Ok(Mode::ContentBased),
            _ => Err(RecoError::InvalidConfig(format!("unknown mode '{}'", value))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mode::ItemBased => write!(f, "item_based"),
            Mode::ContentBased => write!(f, "content_based"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendation {
    pub item_id: String,
    pub score: f64,
}

/// Anything that turns a user's history into a ranked list of at most `top_n` items.
pub trait Recommend {
    fn recommend(&self, history: &[String], top_n: usize) -> Result<Vec<Recommendation>>;
}

enum Vectors {
    Interactions(InteractionMatrix),
    Features(FeatureMatrix),
}

/// Ranks catalog items by cosine similarity, either over interactions or over features.
///
/// The item x item similarity matrix is computed on first use and then shared read-only by
/// all queries. Building a new `Recommender` is the only way to refresh it.
pub struct Recommender {
    vectors: Vectors,
    batch_size: usize,
    num_threads: usize,
    similarities: OnceLock<SimilarityMatrix>,
}

impl Recommender {

    pub fn item_based(interactions: InteractionMatrix, config: &Config) -> Self {
        Recommender::new(Vectors::Interactions(interactions), config)
    }

    pub fn content_based(features: FeatureMatrix, config: &Config) -> Self {
        Recommender::new(Vectors::Features(features), config)
    }

    fn new(vectors: Vectors, config: &Config) -> Self {
        Recommender {
            vectors,
            batch_size: config.batch_size,
            num_threads: config.num_threads,
            similarities: OnceLock::new(),
        }
    }

    /// Reuses a previously computed item x item similarity matrix.
    pub fn with_similarities(self, similarities: SimilarityMatrix) -> Result<Self> {

        let num_items = self.num_items();

        if similarities.num_rows() != num_items || similarities.num_columns() != num_items {
            return Err(RecoError::DimensionMismatch {
                expected: num_items,
                found: similarities.num_rows(),
            });
        }

        Ok(Recommender { similarities: OnceLock::from(similarities), ..self })
    }

    pub fn mode(&self) -> Mode {
        match self.vectors {
            Vectors::Interactions(_) => Mode::ItemBased,
            Vectors::Features(_) => Mode::ContentBased,
        }
    }

    pub fn num_items(&self) -> usize {
        self.item_ids().len()
    }

    /// Catalog ids by index. Ties in every ranking are broken by this index.
    pub fn item_ids(&self) -> &[String] {
        match &self.vectors {
            Vectors::Interactions(interactions) => interactions.item_ids(),
            Vectors::Features(features) => features.item_ids(),
        }
    }

    pub fn item_index(&self, item_id: &str) -> Option<u32> {
        match &self.vectors {
            Vectors::Interactions(interactions) => interactions.data_dict().item_index(item_id),
            Vectors::Features(features) => features.item_index(item_id),
        }
    }

    /// The item x item similarity matrix, computed on the first call.
    pub fn similarities(&self) -> Result<&SimilarityMatrix> {

        if let Some(similarities) = self.similarities.get() {
            return Ok(similarities);
        }

        let computed = match &self.vectors {
            Vectors::Interactions(interactions) => similarity::compute_similarity(
                &interactions.item_vectors(), self.batch_size, self.num_threads)?,
            Vectors::Features(features) => similarity::compute_similarity(
                features.features(), self.batch_size, self.num_threads)?,
        };

        Ok(self.similarities.get_or_init(|| computed))
    }

    /// The `top_n` items most similar to `item_id`, never including `item_id` itself.
    pub fn similar_items(&self, item_id: &str, top_n: usize) -> Result<Vec<Recommendation>> {

        let query = self.item_index(item_id)
            .ok_or_else(|| RecoError::UnknownItem(item_id.to_owned()))?;

        let similarities = self.similarities()?;
        let item_ids = self.item_ids();

        let candidates = similarities.row(query as usize)
            .iter()
            .enumerate()
            .filter(|(index, _)| item_ids[*index] != item_id)
            .map(|(index, score)| ScoredItem { index: index as u32, score: *score });

        Ok(self.to_recommendations(ranking::top_n(candidates, top_n)))
    }

    fn recommend_by_anchor(&self, history: &[String], top_n: usize) -> Result<Vec<Recommendation>> {

        let anchor = history.iter()
            .find(|item_id| self.item_index(item_id).is_some())
            .ok_or_else(|| RecoError::NoValidHistory(history.len()))?;

        debug!("Recommending neighbours of {}", anchor);

        self.similar_items(anchor, top_n)
    }

    fn recommend_by_profile(
        &self,
        features: &FeatureMatrix,
        history: &[String],
        top_n: usize,
    ) -> Result<Vec<Recommendation>> {

        let profile = features.profile(history)?;
        let scores = similarity::compute_query_similarity(&profile, features.features())?;

        let visited: FnvHashSet<&str> = history.iter().map(|item_id| item_id.as_str()).collect();
        let item_ids = features.item_ids();

        let candidates = scores.iter()
            .enumerate()
            .filter(|(index, _)| !visited.contains(item_ids[*index].as_str()))
            .map(|(index, score)| ScoredItem { index: index as u32, score: *score });

        Ok(self.to_recommendations(ranking::top_n(candidates, top_n)))
    }

    fn to_recommendations(&self, ranked: Vec<ScoredItem>) -> Vec<Recommendation> {
        let item_ids = self.item_ids();
        ranked.into_iter()
            .map(|scored_item| Recommendation {
                item_id: item_ids[scored_item.index as usize].clone(),
                score: scored_item.score,
            })
            .collect()
    }
}

impl Recommend for Recommender {

    /// Item-based: neighbours of the first history item found in the catalog.
    /// Content-based: nearest items to the mean feature vector of the history, excluding
    /// everything in the history.
    fn recommend(&self, history: &[String], top_n: usize) -> Result<Vec<Recommendation>> {
        match &self.vectors {
            Vectors::Interactions(_) => self.recommend_by_anchor(history, top_n),
            Vectors::Features(features) => self.recommend_by_profile(features, history, top_n),
        }
    }
}
