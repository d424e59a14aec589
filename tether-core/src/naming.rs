//! Naming conventions for association keys.

use heck::ToSnakeCase;

/// Separator between namespace segments in model type names.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Underscore a possibly namespaced type name, flattening namespaces with
/// `_`: `Blog::PostComment` becomes `blog_post_comment`.
pub fn underscore(type_name: &str) -> String {
    type_name
        .split(NAMESPACE_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_snake_case())
        .collect::<Vec<_>>()
        .join("_")
}

/// Conventional foreign key for children of `owner_type`.
pub fn default_foreign_key(owner_type: &str) -> String {
    format!("{}_id", underscore(owner_type))
}

/// True for names usable as attribute keys (`[_a-zA-Z]\w*`).
pub fn is_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
