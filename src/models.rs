use serde::Deserialize;

/// One row of the movie catalog (`movieId,title,genres`).
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CatalogRow {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub title: String,
    #[serde(default)]
    pub genres: Option<String>,
}

/// One row of the ratings table (`userId,movieId,rating,timestamp`).
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RatingRow {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    pub rating: f64,
    pub timestamp: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedTitle {
    pub title: String,
    pub year: Option<i32>,
}

/// Typed view of a successful metadata lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MovieMetadata {
    pub imdb_id: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub plot: Option<String>,
    pub box_office: Option<i64>,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
}

impl CatalogRow {
    /// Identity used when the API has nothing better to offer.
    pub fn fallback_identity(&self) -> String {
        format!("ML_{}", self.movie_id)
    }
}
