//! Column-name normalization.
//!
//! Headers exported from other tools often carry invisible characters: a
//! zero-width space glued to a name, or a non-breaking space where a plain
//! one was meant. Both the header offered for selection and the header found
//! on re-read go through the same normalization, so the two can be matched.

/// Zero-width space.
const ZERO_WIDTH_SPACE: char = '\u{200B}';
/// Non-breaking space.
const NO_BREAK_SPACE: char = '\u{00A0}';

/// Normalize one column name.
///
/// Removes zero-width spaces, turns non-breaking spaces into plain spaces,
/// then trims surrounding whitespace. Applying it twice changes nothing.
///
/// ```rust
/// use quarry::normalize_column_name;
///
/// assert_eq!(normalize_column_name(" Name\u{200B}"), "Name");
/// assert_eq!(normalize_column_name("First\u{00A0}Name"), "First Name");
/// ```
#[must_use]
pub fn normalize_column_name(name: &str) -> String {
    name.chars()
        .filter(|&c| c != ZERO_WIDTH_SPACE)
        .map(|c| if c == NO_BREAK_SPACE { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Turn a raw header row into usable column names.
///
/// Blank cells become `Unnamed: <position>`, repeated names get `.1`, `.2`,
/// ... suffixes (the first keeps the bare name), and every name is then
/// normalized.
///
/// ```rust
/// use quarry::normalize_headers;
///
/// let raw = ["id", "", "id", " Name\u{200B}"].map(String::from);
/// assert_eq!(normalize_headers(raw), ["id", "Unnamed: 1", "id.1", "Name"]);
/// ```
pub fn normalize_headers<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen: Vec<String> = Vec::new();

    for (position, name) in raw.into_iter().enumerate() {
        let name = if name.trim().is_empty() {
            format!("Unnamed: {position}")
        } else {
            name
        };

        let mut candidate = name.clone();
        let mut suffix = 0;
        while seen.contains(&candidate) {
            suffix += 1;
            candidate = format!("{name}.{suffix}");
        }
        seen.push(candidate);
    }

    seen.iter().map(|name| normalize_column_name(name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_width_space_removed_anywhere() {
        assert_eq!(normalize_column_name("\u{200B}Na\u{200B}me"), "Name");
    }

    #[test]
    fn test_leading_zero_width_space_then_space() {
        // Removal happens before trimming, so the space is trimmed too.
        assert_eq!(normalize_column_name("\u{200B} Name"), "Name");
    }

    #[test]
    fn test_non_breaking_space_at_edges_is_trimmed() {
        assert_eq!(normalize_column_name("\u{00A0}Total\u{00A0}"), "Total");
    }

    #[test]
    fn test_idempotent() {
        for raw in [" Name\u{200B}", "A\u{00A0}B", "plain", "", "\u{200B}"] {
            let once = normalize_column_name(raw);
            assert_eq!(normalize_column_name(&once), once);
        }
    }

    #[test]
    fn test_triple_duplicates() {
        let raw = ["x", "x", "x"].map(String::from);
        assert_eq!(normalize_headers(raw), ["x", "x.1", "x.2"]);
    }

    #[test]
    fn test_existing_suffix_is_not_reused() {
        let raw = ["x", "x.1", "x"].map(String::from);
        assert_eq!(normalize_headers(raw), ["x", "x.1", "x.2"]);
    }
}
