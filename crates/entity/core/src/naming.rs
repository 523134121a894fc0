//! Inflection helpers used to infer related type names and resource names.
//!
//! The rules are deliberately naive: plural relation names are singularized by
//! dropping one trailing `s`, so `activitys` maps to `Activity`. Anything that
//! needs a real plural form passes an explicit singular instead.

/// Converts a CamelCase type name into snake_case.
///
/// Acronym runs stay together: `HTTPRequest` becomes `http_request`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower);
            if boundary {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }

    out
}

/// Converts a snake_case name into CamelCase.
pub fn camel_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Drops a single trailing `s`, if present.
pub fn singularize(name: &str) -> &str {
    name.strip_suffix('s').unwrap_or(name)
}

/// Resource name a type's snapshot is stored under: the type name lower-cased.
pub fn resource_name(type_name: &str) -> String {
    type_name.to_lowercase()
}
