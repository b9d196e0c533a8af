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

use log::info;

pub mod error;
pub mod types;
pub mod utils;
pub mod config;
pub mod catalog;
pub mod stats;
pub mod interactions;
pub mod features;
pub mod similarity;
pub mod ranking;
pub mod recommend;
pub mod evaluate;
pub mod io;

mod usage_tests;

pub use catalog::{Listing, UserHistories};
pub use config::Config;
pub use error::{RecoError, Result};
pub use evaluate::{EvaluationSummary, Evaluator};
pub use features::FeatureMatrix;
pub use interactions::InteractionMatrix;
pub use recommend::{Mode, Recommend, Recommendation, Recommender};

/// Builds the interaction or feature matrix for `listings` and wraps it into a recommender of
/// the requested mode. Similarities are computed lazily on the first query.
pub fn build_recommender(listings: &[Listing], mode: Mode, config: &Config) -> Result<Recommender> {

    config.validate()?;

    info!("Building {} recommender from {} listings", mode, listings.len());

    let recommender = match mode {
        Mode::ItemBased => {
            let interactions = InteractionMatrix::from_listings(listings, config.min_rating)?;
            Recommender::item_based(interactions, config)
        },
        Mode::ContentBased => {
            let features = FeatureMatrix::build(listings, &config.amenities)?;
            Recommender::content_based(features, config)
        },
    };

    Ok(recommender)
}

/// Builds a recommender on the `train` listings and evaluates it against the visits recorded
/// in the `test` listings.
pub fn train_and_evaluate(
    train: &[Listing],
    test: &[Listing],
    mode: Mode,
    config: &Config,
) -> Result<EvaluationSummary> {

    let recommender = build_recommender(train, mode, config)?;
    let histories = UserHistories::from_listings(test);

    Ok(Evaluator::from_config(config, mode).evaluate(&recommender, &histories))
}
