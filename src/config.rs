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

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::error::{RecoError, Result};
use crate::recommend::Mode;

/// Boolean amenity columns of the listing table, in feature order.
pub const DEFAULT_AMENITIES: &[&str] = &[
    "TV", "Internet", "Shampoo", "Suitable for Events", "Washer / Dryer", "Pool", "Hair Dryer",
    "Smoke Detector", "Cable TV", "Laptop Friendly Workspace", "Cat(s)", "Doorman", "Washer",
    "Heating", "Breakfast", "Safety Card", "Hot Tub", "Pets live on this property",
    "Free Parking on Premises", "Dryer", "Essentials", "Iron", "Wireless Internet", "Dog(s)",
    "Pets Allowed", "Buzzer/Wireless Intercom", "Gym", "24-Hour Check-in", "Fire Extinguisher",
    "Hangers", "Elevator in Building", "Other pet(s)", "Lock on Bedroom Door",
    "Wheelchair Accessible", "Indoor Fireplace", "Smoking Allowed", "Kitchen", "First Aid Kit",
    "Air Conditioning", "Family/Kid Friendly", "Carbon Monoxide Detector",
];

const ITEM_BASED_MIN_HISTORY: usize = 5;
const CONTENT_BASED_MIN_HISTORY: usize = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Length of served recommendation lists.
    pub top_n: usize,
    /// Number of rows per similarity batch, trades memory for speed.
    pub batch_size: usize,
    pub num_threads: usize,
    pub sample_size: usize,
    /// Evaluation cutoff, may differ from `top_n`.
    pub k: usize,
    pub random_seed: u64,
    pub min_history: Option<usize>,
    pub min_rating: Option<f64>,
    pub amenities: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            top_n: 10,
            batch_size: 1000,
            num_threads: num_cpus::get(),
            sample_size: 100,
            k: 10,
            random_seed: 42,
            min_history: None,
            min_rating: None,
            amenities: DEFAULT_AMENITIES.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl Config {

    /// Reads a JSON config file; absent fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: Config = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {

        let positive = [
            ("top_n", self.top_n),
            ("batch_size", self.batch_size),
            ("num_threads", self.num_threads),
            ("sample_size", self.sample_size),
            ("k", self.k),
        ];

        for (name, value) in positive.iter() {
            if *value == 0 {
                return Err(RecoError::InvalidConfig(format!("{} must be a positive integer", name)));
            }
        }

        if let Some(min_rating) = self.min_rating {
            if !min_rating.is_finite() {
                return Err(RecoError::InvalidConfig("min_rating must be finite".to_owned()));
            }
        }

        Ok(())
    }

    /// Number of visits a user needs to take part in an evaluation of the given mode.
    pub fn min_history_for(&self, mode: Mode) -> usize {
        self.min_history.unwrap_or(match mode {
            Mode::ItemBased => ITEM_BASED_MIN_HISTORY,
            Mode::ContentBased => CONTENT_BASED_MIN_HISTORY,
        })
    }
}

#[cfg(test)]
mod tests {

    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.amenities.len(), 41);
        assert_eq!(config.min_history_for(Mode::ItemBased), 5);
        assert_eq!(config.min_history_for(Mode::ContentBased), 2);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let config = Config { batch_size: 0, ..Config::default() };
        match config.validate() {
            Err(RecoError::InvalidConfig(message)) => assert!(message.contains("batch_size")),
            _ => panic!("expected an invalid config"),
        }
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"k\": 4, \"random_seed\": 7, \"min_history\": 3}}").unwrap();

        let config = Config::from_file(file.path()).unwrap();

        assert_eq!(config.k, 4);
        assert_eq!(config.random_seed, 7);
        assert_eq!(config.top_n, 10);
        assert_eq!(config.min_history_for(Mode::ItemBased), 3);
    }
}
