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

use std::io;

use thiserror::Error;

/// Everything that can go wrong while building matrices, ranking items or evaluating.
///
/// Build-time variants (`EmptyDataset`, `MalformedField`, `DimensionMismatch`, `UnknownUser`,
/// `MissingColumn`, `InvalidConfig`) abort the whole build. `UnknownItem` and `NoValidHistory` only concern a
/// single query and are reported back to the caller of that query.
#[derive(Error, Debug)]
pub enum RecoError {
    #[error("No usable data: {0}")]
    EmptyDataset(String),

    #[error("Malformed value {value:?} in field '{field}' of item '{item}'")]
    MalformedField { item: String, field: String, value: String },

    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Unknown item '{0}'")]
    UnknownItem(String),

    #[error("Unknown user '{0}'")]
    UnknownUser(String),

    #[error("None of the {0} historical items exist in the catalog")]
    NoValidHistory(usize),

    #[error("Missing column '{0}' in input table")]
    MissingColumn(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RecoError>;

impl RecoError {

    pub fn malformed_field(item: &str, field: &str, value: &str) -> Self {
        RecoError::MalformedField {
            item: item.to_owned(),
            field: field.to_owned(),
            value: value.to_owned(),
        }
    }

    /// True for errors that are local to one query and must not abort a batch of queries.
    pub fn is_query_error(&self) -> bool {
        match self {
            RecoError::UnknownItem(_) | RecoError::NoValidHistory(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {

    use super::RecoError;

    #[test]
    fn malformed_field_names_item_and_field() {
        let error = RecoError::malformed_field("1234", "price", "$abc");
        let message = error.to_string();

        assert!(message.contains("1234"));
        assert!(message.contains("price"));
        assert!(message.contains("$abc"));
        assert!(!error.is_query_error());
    }

    #[test]
    fn query_errors_are_recoverable() {
        assert!(RecoError::UnknownItem("x".to_owned()).is_query_error());
        assert!(RecoError::NoValidHistory(3).is_query_error());
        assert!(!RecoError::EmptyDataset("nothing".to_owned()).is_query_error());
    }

    #[test]
    fn unknown_users_are_build_errors() {
        let error = RecoError::UnknownUser("u42".to_owned());

        assert_eq!(error.to_string(), "Unknown user 'u42'");
        assert!(!error.is_query_error());
    }
}
