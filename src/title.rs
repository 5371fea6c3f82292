use crate::models::ParsedTitle;

/// Splits `"Toy Story (1995)"` into its title and year.
///
/// Anything that doesn't end in a parenthesised integer is returned whole with no year.
pub fn parse_title(raw: &str) -> ParsedTitle {
    split_trailing_year(raw)
        .map(|(title, year)| ParsedTitle { title: title.to_string(), year: Some(year) })
        .unwrap_or_else(|| ParsedTitle { title: raw.to_string(), year: None })
}

fn split_trailing_year(s: &str) -> Option<(&str, i32)> {
    if !s.ends_with(')') {
        return None;
    }
    let inner = s.trim_end_matches(')');
    let open = inner.rfind('(')?;
    let year = inner[open + 1..].trim().parse().ok()?;
    Some((inner[..open].trim(), year))
}
