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
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_derive::Serialize;

use crate::catalog::UserHistories;
use crate::config::Config;
use crate::error::Result;
use crate::recommend::{Mode, Recommend, Recommendation};
use crate::utils;

/// Outcome for one sampled user.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvaluationRecord {
    pub user_id: String,
    pub num_train: usize,
    pub num_test: usize,
    pub num_recommendations: usize,
    pub precision: f64,
    pub recall: f64,
}

/// Summary statistics of a metric over all evaluated users.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Distribution {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl Distribution {

    /// `None` for an empty sample. Quartiles interpolate linearly between neighbouring values,
    /// the standard deviation is the sample one (0 for a single value).
    pub fn of(values: &[f64]) -> Option<Self> {

        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;

        let std = if count > 1 {
            let squared_deviations: f64 = sorted.iter().map(|value| (value - mean).powi(2)).sum();
            (squared_deviations / (count - 1) as f64).sqrt()
        } else {
            0.0
        };

        Some(Distribution {
            count,
            mean,
            std,
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }
}

fn quantile(sorted: &[f64], fraction: f64) -> f64 {
    let position = fraction * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub k: usize,
    pub min_history: usize,
    /// Users with enough history to take part.
    pub num_eligible: usize,
    pub num_sampled: usize,
    pub num_evaluated: usize,
    /// Sampled users whose history could not be split into non-empty train and test parts.
    pub num_skipped: usize,
    /// Sampled users whose recommendation failed.
    pub num_failed: usize,
    pub mean_precision: f64,
    pub mean_recall: f64,
    pub precision: Option<Distribution>,
    pub recall: Option<Distribution>,
    pub records: Vec<EvaluationRecord>,
}

/// Share of the `k` slots filled with relevant items.
pub fn precision_at_k(recommended: &[Recommendation], relevant: &FnvHashSet<&str>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    hits(recommended, relevant, k) as f64 / k as f64
}

/// Share of the relevant items found among the first `k` recommendations.
pub fn recall_at_k(recommended: &[Recommendation], relevant: &FnvHashSet<&str>, k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    hits(recommended, relevant, k) as f64 / relevant.len() as f64
}

fn hits(recommended: &[Recommendation], relevant: &FnvHashSet<&str>, k: usize) -> usize {
    let distinct: FnvHashSet<&str> = recommended.iter()
        .take(k)
        .map(|recommendation| recommendation.item_id.as_str())
        .collect();

    distinct.intersection(relevant).count()
}

/// Splits a history into a train prefix of half its length (at least one item) and the
/// remaining test suffix. `None` if either part would be empty.
pub fn split(history: &[String]) -> Option<(&[String], &[String])> {
    let train_size = (history.len() / 2).max(1);
    if history.len() <= train_size {
        return None;
    }
    Some(history.split_at(train_size))
}

/// Offline precision/recall evaluation over a seeded sample of users.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluator {
    k: usize,
    sample_size: usize,
    min_history: usize,
    random_seed: u64,
}

impl Evaluator {

    pub fn new(k: usize, sample_size: usize, min_history: usize, random_seed: u64) -> Self {
        Evaluator { k, sample_size, min_history, random_seed }
    }

    pub fn from_config(config: &Config, mode: Mode) -> Self {
        Evaluator::new(config.k, config.sample_size, config.min_history_for(mode), config.random_seed)
    }

    /// Indices of the sampled users, drawn without replacement from the eligible ones.
    pub fn sample(&self, histories: &UserHistories) -> (usize, Vec<usize>) {
        let eligible = histories.eligible(self.min_history);
        let amount = self.sample_size.min(eligible.len());

        let mut rng = StdRng::seed_from_u64(self.random_seed);
        let sampled: Vec<usize> = eligible.choose_multiple(&mut rng, amount).cloned().collect();

        (eligible.len(), sampled)
    }

    /// `Ok(None)` if the history cannot be split.
    pub fn evaluate_user<R: Recommend + ?Sized>(
        &self,
        recommender: &R,
        user_id: &str,
        history: &[String],
    ) -> Result<Option<EvaluationRecord>> {

        let (train, test) = match split(history) {
            Some(parts) => parts,
            None => return Ok(None),
        };

        let recommended = recommender.recommend(train, self.k)?;
        let relevant: FnvHashSet<&str> = test.iter().map(|item_id| item_id.as_str()).collect();

        Ok(Some(EvaluationRecord {
            user_id: user_id.to_owned(),
            num_train: train.len(),
            num_test: test.len(),
            num_recommendations: recommended.len(),
            precision: precision_at_k(&recommended, &relevant, self.k),
            recall: recall_at_k(&recommended, &relevant, self.k),
        }))
    }

    /// Evaluates every sampled user. Failures of single users are logged and counted, they
    /// never abort the run.
    pub fn evaluate<R: Recommend + ?Sized>(
        &self,
        recommender: &R,
        histories: &UserHistories,
    ) -> EvaluationSummary {

        let start = Instant::now();

        let (num_eligible, sampled) = self.sample(histories);

        if sampled.is_empty() {
            warn!("No user has at least {} visits, nothing to evaluate", self.min_history);
        } else {
            info!("Evaluating {} of {} eligible users at k={}", sampled.len(), num_eligible, self.k);
        }

        let mut records = Vec::with_capacity(sampled.len());
        let mut num_skipped = 0;
        let mut num_failed = 0;

        for (processed, user) in sampled.iter().enumerate() {

            let user_id = histories.user_id(*user);

            match self.evaluate_user(recommender, user_id, histories.history_at(*user)) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {
                    warn!("Skipping user {}, history cannot be split", user_id);
                    num_skipped += 1;
                },
                Err(failure) => {
                    warn!("Could not evaluate user {}: {}", user_id, failure);
                    num_failed += 1;
                },
            }

            if (processed + 1) % 10 == 0 {
                info!("Processed {}/{} users", processed + 1, sampled.len());
            }
        }

        let precisions: Vec<f64> = records.iter().map(|record| record.precision).collect();
        let recalls: Vec<f64> = records.iter().map(|record| record.recall).collect();

        let precision = Distribution::of(&precisions);
        let recall = Distribution::of(&recalls);

        let summary = EvaluationSummary {
            k: self.k,
            min_history: self.min_history,
            num_eligible,
            num_sampled: sampled.len(),
            num_evaluated: records.len(),
            num_skipped,
            num_failed,
            mean_precision: precision.as_ref().map(|d| d.mean).unwrap_or(0.0),
            mean_recall: recall.as_ref().map(|d| d.mean).unwrap_or(0.0),
            precision,
            recall,
            records,
        };

        info!(
            "Evaluated {} users ({} skipped, {} failed) in {}ms: precision@{} {:.4}, recall@{} {:.4}",
            summary.num_evaluated,
            summary.num_skipped,
            summary.num_failed,
            utils::to_millis(start.elapsed()),
            self.k,
            summary.mean_precision,
            self.k,
            summary.mean_recall,
        );

        summary
    }
}
