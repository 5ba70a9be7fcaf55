//! Identifier case helpers used by relation-name guessing, default foreign keys and derived labels.

/// Convert a single identifier from snake_case (or kebab/space separated) to camelCase.
/// e.g. "entry_type" -> "entryType", "country-id" -> "countryId"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' || c == '-' || c == ' ' {
            capitalize_next = !out.is_empty();
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a single identifier from camelCase to snake_case.
/// e.g. "entryType" -> "entry_type", "createdAt" -> "created_at"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
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

/// Human-readable label derived from a field name: underscores become spaces, words are title-cased.
/// e.g. "name_eng" -> "Name Eng"
pub fn headline(s: &str) -> String {
    s.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case() {
        assert_eq!(to_camel_case("entry_type"), "entryType");
        assert_eq!(to_camel_case("country"), "country");
        assert_eq!(to_camel_case("already_camelCase"), "alreadyCamelCase");
        assert_eq!(to_camel_case("_leading"), "leading");
    }

    #[test]
    fn snake_case() {
        assert_eq!(to_snake_case("entryType"), "entry_type");
        assert_eq!(to_snake_case("country"), "country");
    }

    #[test]
    fn headline_words() {
        assert_eq!(headline("name_eng"), "Name Eng");
        assert_eq!(headline("id"), "Id");
        assert_eq!(headline("created__at"), "Created At");
    }
}
