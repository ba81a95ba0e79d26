//! Case-insensitive substring filter shared by the room, topic and message
//! listings.

/// True when any present field contains `query`, ignoring case.
///
/// The empty query matches every record, including one whose fields are all
/// absent.
pub fn matches<'a, I>(query: &str, fields: I) -> bool
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    if query.is_empty() {
        return true;
    }

    let query = query.to_lowercase();
    fields
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&query))
}

#[cfg(test)]
mod tests {
    use super::matches;

    #[test]
    fn empty_query_matches_everything() {
        assert!(matches("", [None]));
        assert!(matches("", [Some("anything")]));
    }

    #[test]
    fn ignores_case_both_ways() {
        assert!(matches("MATH", [Some("math")]));
        assert!(matches("math", [Some("Discrete MATHEMATICS")]));
        assert!(matches("ÉTÉ", [Some("l'été")]));
    }

    #[test]
    fn any_field_may_match() {
        assert!(matches("help", [Some("Math"), None, Some("homework help")]));
        assert!(!matches("help", [Some("Math"), None, Some("algebra")]));
    }

    #[test]
    fn absent_fields_never_match_a_real_query() {
        assert!(!matches("x", [None, None]));
    }
}
