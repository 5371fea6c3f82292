use std::{fs::File, io::Read, path::Path};

use anyhow::Context;
use serde::de::DeserializeOwned;

use crate::{
    error::AppResult,
    models::{CatalogRow, RatingRow},
};

pub fn read_catalog<R: Read>(reader: R) -> AppResult<Vec<CatalogRow>> {
    read_rows(reader)
}

pub fn read_ratings<R: Read>(reader: R) -> AppResult<Vec<RatingRow>> {
    read_rows(reader)
}

pub fn read_catalog_file(path: &Path) -> AppResult<Vec<CatalogRow>> {
    read_catalog(open(path)?)
}

pub fn read_ratings_file(path: &Path) -> AppResult<Vec<RatingRow>> {
    read_ratings(open(path)?)
}

fn open(path: &Path) -> AppResult<File> {
    Ok(File::open(path).with_context(|| format!("open {}", path.display()))?)
}

fn read_rows<T: DeserializeOwned, R: Read>(reader: R) -> AppResult<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for rec in rdr.deserialize() {
        rows.push(rec?);
    }
    Ok(rows)
}
