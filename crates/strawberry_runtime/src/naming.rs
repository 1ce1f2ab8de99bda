//! Name conversion between Rust identifiers and GraphQL names.

/// Converts a snake_case identifier to camelCase.
///
/// The first component is kept as written. Later components are title
/// cased: a letter is uppercased when it follows a non-letter (so
/// `field_1st_place` becomes `field1StPlace`) and lowercased otherwise.
/// Empty components (from repeated underscores) become `_`.
#[must_use]
pub fn to_camel_case(name: &str) -> String {
    let mut parts = name.split('_');
    let mut out = String::with_capacity(name.len());
    if let Some(first) = parts.next() {
        out.push_str(first);
    }
    for part in parts {
        if part.is_empty() {
            out.push('_');
            continue;
        }
        let mut after_letter = false;
        for c in part.chars() {
            if after_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            after_letter = c.is_alphabetic();
        }
    }
    out
}

/// Converts camelCase to snake_case.
#[must_use]
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("first_name"), "firstName");
        assert_eq!(to_camel_case("is_subscription_field"), "isSubscriptionField");
        assert_eq!(to_camel_case("id"), "id");
        assert_eq!(to_camel_case("user_ID"), "userId");
        assert_eq!(to_camel_case("a__b"), "a_B");
        assert_eq!(to_camel_case("trailing_"), "trailing_");
        assert_eq!(to_camel_case("_private"), "Private");
    }

    #[test]
    fn test_to_camel_case_title_cases_after_digits() {
        assert_eq!(to_camel_case("field_1st_place"), "field1StPlace");
        assert_eq!(to_camel_case("top_10"), "top10");
        assert_eq!(to_camel_case("level_2boss"), "level2Boss");
        assert_eq!(to_camel_case("x_y2k"), "xY2K");
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("firstName"), "first_name");
        assert_eq!(to_snake_case("lastName"), "last_name");
        assert_eq!(to_snake_case("id"), "id");
        assert_eq!(to_snake_case("ID"), "i_d");
    }
}
