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

#[cfg(test)]
mod tests {

    use fnv::FnvHashSet;

    use crate::{build_recommender, train_and_evaluate, Config, Listing, Mode, Recommend, UserHistories};
    use crate::evaluate::Evaluator;

    fn listing(id: &str, property_type: &str, price: &str, amenities: &[&str], visitors: &[&str]) -> Listing {
        Listing {
            listing_id: id.to_owned(),
            property_type: property_type.to_owned(),
            room_type: "Entire home/apt".to_owned(),
            city: "Seoul".to_owned(),
            accommodates: 2.0,
            bedrooms: 1.0,
            price: price.to_owned(),
            amenities: amenities.iter().map(|a| a.to_string()).collect::<FnvHashSet<_>>(),
            visitors: visitors.iter().map(|v| v.to_string()).collect(),
            user_ratings: None,
        }
    }

    fn listings() -> Vec<Listing> {
        vec![
            listing("apple", "House", "$100", &["TV"], &["alice", "bob", "dave"]),
            listing("dog", "House", "$110", &["TV"], &["alice", "dave"]),
            listing("pony", "Apartment", "$300", &["Pool"], &["alice", "bob", "charles"]),
            listing("bike", "Apartment", "$280", &["Pool"], &["charles"]),
            listing("kite", "House", "$105", &["TV"], &["alice", "bob", "dave"]),
        ]
    }

    #[test]
    fn programmatic_usage() {

        /* Our input is a table of listings with their attributes and the users who visited
           them. The identifiers used can be strings of arbitrary length and structure. */
        let listings = listings();

        /* The configuration controls list lengths, batching of the similarity computation and
           the evaluation protocol. */
        let config = Config { k: 2, batch_size: 2, num_threads: 2, ..Config::default() };

        /* Item-based recommendations: listings are similar if they share visitors. */
        let collaborative = build_recommender(&listings, Mode::ItemBased, &config).unwrap();

        let similar = collaborative.similar_items("apple", 3).unwrap();
        assert_eq!(similar.len(), 3);
        assert!(similar.iter().all(|r| r.item_id != "apple"));
        assert_eq!(similar[0].item_id, "kite");

        /* Content-based recommendations: listings are similar if they share attributes. A user
           is represented by the mean feature vector of the listings in their history. */
        let content = build_recommender(&listings, Mode::ContentBased, &config).unwrap();

        let history = vec!["apple".to_owned(), "dog".to_owned()];
        let recommended = content.recommend(&history, 2).unwrap();
        assert_eq!(recommended.len(), 2);
        assert_eq!(recommended[0].item_id, "kite");

        /* Finally, we hold out the second half of every user's history and check how much
           of it the recommender retrieves. */
        let summary = train_and_evaluate(&listings, &listings, Mode::ContentBased, &config).unwrap();

        assert_eq!(summary.k, 2);
        assert!(summary.num_evaluated > 0);
        assert!(summary.mean_precision >= 0.0 && summary.mean_precision <= 1.0);
        assert!(summary.mean_recall >= 0.0 && summary.mean_recall <= 1.0);
        assert_eq!(summary.num_evaluated + summary.num_skipped + summary.num_failed,
            summary.num_sampled);
    }

    #[test]
    fn rebuilding_gives_identical_results() {
        let config = Config { num_threads: 1, ..Config::default() };

        for mode in &[Mode::ItemBased, Mode::ContentBased] {
            let first = build_recommender(&listings(), *mode, &config).unwrap();
            let second = build_recommender(&listings(), *mode, &config).unwrap();

            assert_eq!(first.item_ids(), second.item_ids());
            assert_eq!(first.similarities().unwrap(), second.similarities().unwrap());
        }
    }

    #[test]
    fn evaluation_runs_are_reproducible() {
        let config = Config { k: 3, sample_size: 2, ..Config::default() };
        let listings = listings();

        let recommender = build_recommender(&listings, Mode::ItemBased, &config).unwrap();
        let histories = UserHistories::from_listings(&listings);

        // nobody has the five visits item-based evaluation asks for by default
        let evaluator = Evaluator::from_config(&config, Mode::ItemBased);
        let summary = evaluator.evaluate(&recommender, &histories);
        assert_eq!(summary.num_eligible, 0);
        assert_eq!(summary.num_evaluated, 0);

        let evaluator = Evaluator::new(3, 2, 2, config.random_seed);
        let first = evaluator.evaluate(&recommender, &histories);
        let second = evaluator.evaluate(&recommender, &histories);

        assert_eq!(first.num_sampled, 2);
        assert_eq!(first, second);
    }
}
