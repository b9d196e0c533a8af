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

use std::time::Duration;

use crate::error::{RecoError, Result};

pub fn to_millis(duration: Duration) -> u64 {
    (duration.as_secs() * 1_000) + (duration.subsec_nanos() / 1_000_000) as u64
}

/// Splits a bracketed list literal such as `['u1', 'u2']` or `[1, 2]` into its elements.
/// Empty cells and `[]` yield no elements.
pub fn parse_list(raw: &str) -> Vec<String> {

    let trimmed = raw.trim();
    let inner = trimmed.strip_prefix('[').unwrap_or(trimmed);
    let inner = inner.strip_suffix(']').unwrap_or(inner);

    inner.split(',')
        .map(|element| element.trim().trim_matches(|c: char| c == '\'' || c == '"').trim())
        .filter(|element| !element.is_empty())
        .map(|element| element.to_owned())
        .collect()
}

pub fn parse_bool(item: &str, field: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "1.0" => Ok(true),
        "false" | "f" | "0" | "no" | "0.0" | "" => Ok(false),
        _ => Err(RecoError::malformed_field(item, field, raw)),
    }
}

pub fn parse_number(item: &str, field: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| RecoError::malformed_field(item, field, raw))
}

#[cfg(test)]
mod tests {

    use std::time::Duration;
    use super::*;

    #[test]
    fn millis() {
        assert_eq!(to_millis(Duration::new(2, 345_000_000)), 2_345);
    }

    #[test]
    fn list_literals() {
        assert_eq!(parse_list("['visitor_1', 'visitor_2']"), vec!["visitor_1", "visitor_2"]);
        assert_eq!(parse_list("[17, 4]"), vec!["17", "4"]);
        assert_eq!(parse_list("[\"a\"]"), vec!["a"]);
        assert!(parse_list("[]").is_empty());
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn booleans() {
        assert!(parse_bool("1", "TV", "True").unwrap());
        assert!(!parse_bool("1", "TV", "0").unwrap());
        assert!(!parse_bool("1", "TV", "").unwrap());
        assert!(parse_bool("1", "TV", "maybe").is_err());
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_number("1", "bedrooms", " 2 ").unwrap(), 2.0);
        assert!(parse_number("1", "bedrooms", "").is_err());
        assert!(parse_number("1", "bedrooms", "NaN").is_err());
    }
}
