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
use std::io;
use std::io::prelude::*;
use std::io::{stdout, BufReader, BufWriter};
use std::path::Path;

use log::{debug, info, warn};
use serde_derive::{Deserialize, Serialize};

use crate::catalog::Listing;
use crate::error::{RecoError, Result};
use crate::evaluate::EvaluationSummary;
use crate::recommend::{Mode, Recommendation, Recommender};
use crate::types::SimilarityMatrix;
use crate::utils;

/// Reads a CSV input file with a header line and comma separation.
pub fn csv_reader<P: AsRef<Path>>(file: P) -> Result<csv::Reader<File>> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(file)?;

    Ok(reader)
}

struct Columns {
    listing_id: usize,
    property_type: usize,
    room_type: usize,
    city: usize,
    accommodates: usize,
    bedrooms: usize,
    price: usize,
    visitors: usize,
    user_ratings: Option<usize>,
    amenities: Vec<(String, usize)>,
}

impl Columns {

    fn locate(headers: &csv::StringRecord, amenities: &[String]) -> Result<Self> {

        let position = |name: &str| headers.iter().position(|header| header.trim() == name);
        let required = |name: &str| position(name)
            .ok_or_else(|| RecoError::MissingColumn(name.to_owned()));

        let mut amenity_columns = Vec::with_capacity(amenities.len());
        for amenity in amenities.iter() {
            match position(amenity) {
                Some(column) => amenity_columns.push((amenity.clone(), column)),
                None => debug!("No column for amenity '{}', treating it as absent", amenity),
            }
        }

        Ok(Columns {
            listing_id: required("listing_id")?,
            property_type: required("property_type")?,
            room_type: required("room_type")?,
            city: required("city")?,
            accommodates: required("accommodates")?,
            bedrooms: required("bedrooms")?,
            price: required("price")?,
            visitors: required("visitors")?,
            user_ratings: position("user_ratings"),
            amenities: amenity_columns,
        })
    }
}

pub fn read_listings<P: AsRef<Path>>(file: P, amenities: &[String]) -> Result<Vec<Listing>> {
    let mut reader = csv_reader(file)?;
    listings_from_csv(&mut reader, amenities)
}

/// Parses the listing table. Visitors and ratings are bracketed list literals, amenities
/// boolean flags in columns named after the amenity.
pub fn listings_from_csv<R: io::Read>(
    reader: &mut csv::Reader<R>,
    amenities: &[String],
) -> Result<Vec<Listing>> {

    let headers = reader.headers()?.clone();
    let columns = Columns::locate(&headers, amenities)?;

    let mut listings = Vec::new();

    for record in reader.records() {
        let record = record?;
        listings.push(parse_listing(&record, &columns)?);
    }

    debug!("Read {} listings", listings.len());

    Ok(listings)
}

fn parse_listing(record: &csv::StringRecord, columns: &Columns) -> Result<Listing> {

    let cell = |column: usize| record.get(column).unwrap_or("");

    let listing_id = cell(columns.listing_id).trim().to_owned();
    let visitors = utils::parse_list(cell(columns.visitors));

    let user_ratings = match columns.user_ratings {
        Some(column) => {
            let raw = cell(column);
            let ratings = utils::parse_list(raw).iter()
                .map(|rating| utils::parse_number(&listing_id, "user_ratings", rating))
                .collect::<Result<Vec<f64>>>()?;

            if ratings.len() != visitors.len() {
                return Err(RecoError::malformed_field(&listing_id, "user_ratings", raw));
            }

            Some(ratings)
        },
        None => None,
    };

    let mut amenities = fnv::FnvHashSet::default();
    for (amenity, column) in columns.amenities.iter() {
        if utils::parse_bool(&listing_id, amenity, cell(*column))? {
            amenities.insert(amenity.clone());
        }
    }

    Ok(Listing {
        accommodates: utils::parse_number(&listing_id, "accommodates", cell(columns.accommodates))?,
        bedrooms: utils::parse_number(&listing_id, "bedrooms", cell(columns.bedrooms))?,
        property_type: cell(columns.property_type).trim().to_owned(),
        room_type: cell(columns.room_type).trim().to_owned(),
        city: cell(columns.city).trim().to_owned(),
        price: cell(columns.price).trim().to_owned(),
        listing_id,
        amenities,
        visitors,
        user_ratings,
    })
}

/// Writes to the file at `path`, or to stdout if no path is given.
pub fn output(path: Option<&str>) -> Result<Box<dyn Write>> {
    let out: Box<dyn Write> = match path {
        Some(path) => Box::new(BufWriter::new(File::create(Path::new(path))?)),
        None => Box::new(stdout()),
    };

    Ok(out)
}

/// Struct used for JSON serialization of recommendations. Field names will be used in JSON.
#[derive(Serialize)]
struct Recommendations<'a> {
    for_query: &'a str,
    recommended_items: &'a [Recommendation],
}

/// Outputs one JSON line with the recommendations for a single item or user.
pub fn write_recommendations(
    out: &mut dyn Write,
    for_query: &str,
    recommended_items: &[Recommendation],
) -> Result<()> {

    let line = serde_json::to_string(&Recommendations { for_query, recommended_items })?;
    writeln!(out, "{}", line)?;

    Ok(())
}

#[derive(Serialize)]
struct Evaluation<'a> {
    mode: Mode,
    summary: &'a EvaluationSummary,
}

pub fn write_evaluation(out: &mut dyn Write, mode: Mode, summary: &EvaluationSummary) -> Result<()> {
    let line = serde_json::to_string(&Evaluation { mode, summary })?;
    writeln!(out, "{}", line)?;
    Ok(())
}

/// A computed similarity matrix together with the mode that produced it and the item ids of
/// its rows and columns.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityArtifact {
    pub mode: Mode,
    pub item_ids: Vec<String>,
    pub similarities: SimilarityMatrix,
}

pub fn write_similarity_matrix<P: AsRef<Path>>(
    path: P,
    mode: Mode,
    item_ids: &[String],
    similarities: &SimilarityMatrix,
) -> Result<()> {

    #[derive(Serialize)]
    struct Borrowed<'a> {
        mode: Mode,
        item_ids: &'a [String],
        similarities: &'a SimilarityMatrix,
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &Borrowed { mode, item_ids, similarities })?;
    writer.flush()?;

    Ok(())
}

pub fn read_similarity_matrix<P: AsRef<Path>>(path: P) -> Result<SimilarityArtifact> {
    let reader = BufReader::new(File::open(path)?);
    let artifact: SimilarityArtifact = serde_json::from_reader(reader)?;

    let similarities = &artifact.similarities;
    let expected = similarities.num_rows() * similarities.num_columns();

    if similarities.values().len() != expected {
        return Err(RecoError::DimensionMismatch { expected, found: similarities.values().len() });
    }

    if artifact.item_ids.len() != similarities.num_rows() {
        return Err(RecoError::DimensionMismatch {
            expected: similarities.num_rows(),
            found: artifact.item_ids.len(),
        });
    }

    Ok(artifact)
}

/// Reuses the similarities stored at `path` if they were computed in the same mode for the same
/// items. Otherwise computes them and stores them there.
pub fn load_or_store_similarities<P: AsRef<Path>>(
    recommender: Recommender,
    path: P,
) -> Result<Recommender> {

    let path = path.as_ref();

    if path.exists() {
        info!("Loading similarities from {}", path.display());
        let artifact = read_similarity_matrix(path)?;

        if artifact.mode != recommender.mode() {
            warn!("Similarities in {} were computed in mode {}, recomputing them", path.display(),
                artifact.mode);
        } else if artifact.item_ids.as_slice() != recommender.item_ids() {
            warn!("Similarities in {} belong to other items, recomputing them", path.display());
        } else {
            return recommender.with_similarities(artifact.similarities);
        }
    }

    info!("Storing similarities in {}", path.display());
    write_similarity_matrix(path, recommender.mode(), recommender.item_ids(),
        recommender.similarities()?)?;

    Ok(recommender)
}
