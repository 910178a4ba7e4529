//! Column name codec
//!
//! Display names from the dataset header are turned into stable keys used
//! everywhere else: lowercase, with spaces and hyphens removed.

/// Normalize a display name into a column key
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Look up the display name for a key
///
/// Best effort: the first display name that normalizes to `key` wins, and an
/// unknown key is returned as-is.
pub fn denormalize<'a, I>(key: &str, display_names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    display_names
        .into_iter()
        .find(|name| normalize(name) == key)
        .map(|name| name.to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Normalize `name` and make the key unique against `taken`
///
/// Collisions get a numeric suffix: `sales`, `sales_2`, `sales_3`, ...
pub fn unique_key<F>(name: &str, is_taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    let base = normalize(name);
    let base = if base.is_empty() {
        "column".to_string()
    } else {
        base
    };

    if !is_taken(&base) {
        return base;
    }

    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or(base)
}
