//! Genre and director list parsing.
//!
//! The catalog writes genres as `Action|Adventure`, the metadata API as `Action, Adventure`.
//! Both are flattened into trimmed names and merged with first-occurrence order preserved.

use std::collections::HashSet;

const NO_GENRES: &str = "(no genres listed)";
const NOT_AVAILABLE: &str = "N/A";

pub fn parse_catalog_genres(raw: &str) -> Vec<String> {
    split_names(raw, '|', NO_GENRES)
}

pub fn parse_api_genres(raw: &str) -> Vec<String> {
    split_names(raw, ',', NOT_AVAILABLE)
}

/// Comma separated director names. `N/A` means there are none.
pub fn parse_directors(raw: &str) -> Vec<String> {
    split_names(raw, ',', NOT_AVAILABLE)
}

/// Concatenates `first` then `second`, dropping repeats.
pub fn merge_genres(first: &[String], second: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    first.iter().chain(second).filter(|g| seen.insert(g.as_str())).cloned().collect()
}

/// Splits on `delimiter`, dropping blanks and the source's `none` placeholder.
fn split_names(raw: &str, delimiter: char, none: &str) -> Vec<String> {
    raw.split(delimiter)
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != none)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_sentinel_is_dropped() {
        assert_eq!(
            parse_catalog_genres("Action|Adventure|(no genres listed)"),
            vec!["Action", "Adventure"]
        );
        assert!(parse_catalog_genres("(no genres listed)").is_empty());
    }

    #[test]
    fn single_catalog_genre() {
        assert_eq!(parse_catalog_genres("Comedy"), vec!["Comedy"]);
    }

    #[test]
    fn api_genres_are_comma_separated() {
        assert_eq!(parse_api_genres("Comedy, Action"), vec!["Comedy", "Action"]);
        assert!(parse_api_genres("N/A").is_empty());
        assert!(parse_api_genres("").is_empty());
    }

    #[test]
    fn merge_keeps_first_occurrence_order() {
        let catalog = parse_catalog_genres("Action|Adventure");
        let api = parse_api_genres("Comedy, Action");
        assert_eq!(merge_genres(&catalog, &api), vec!["Action", "Adventure", "Comedy"]);
    }

    #[test]
    fn merge_dedups_within_a_source() {
        let catalog = vec!["Drama".to_string(), "Drama".to_string()];
        assert_eq!(merge_genres(&catalog, &[]), vec!["Drama"]);
    }

    #[test]
    fn directors() {
        assert_eq!(parse_directors("Lana Wachowski, Lilly Wachowski"), vec![
            "Lana Wachowski",
            "Lilly Wachowski"
        ]);
        assert!(parse_directors("N/A").is_empty());
    }

    #[test]
    fn each_source_only_drops_its_own_placeholder() {
        assert_eq!(parse_catalog_genres("N/A|Drama"), vec!["N/A", "Drama"]);
        assert_eq!(parse_directors("(no genres listed), Michael Mann"), vec![
            "(no genres listed)",
            "Michael Mann"
        ]);
    }
}
