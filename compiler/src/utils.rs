/// JSON-style quoting for names shown in diagnostics.
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("{:?}", text))
}

/// Splits a dotted namespace into its segments.
pub fn namespace_segments(name: &str) -> Vec<String> {
    name.split('.').filter(|s| !s.is_empty()).map(str::to_owned).collect()
}

/// The part of a dotted name after the last dot.
pub fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
