//! Methodology concept lookup.

const CONCEPTS: &[(&str, &str)] = &[
    ("hyperfocus", include_str!("concepts/hyperfocus.md")),
    ("scatterfocus", include_str!("concepts/scatterfocus.md")),
    ("four_quadrants", include_str!("concepts/four_quadrants.md")),
    ("attention_space", include_str!("concepts/attention_space.md")),
    ("meta_awareness", include_str!("concepts/meta_awareness.md")),
];

/// Known concept names, in lookup order.
pub fn concept_names() -> impl Iterator<Item = &'static str> {
    CONCEPTS.iter().map(|(name, _)| *name)
}

/// Explanation for a concept, matched case-insensitively.
pub fn lookup(name: &str) -> Option<&'static str> {
    let name = name.trim().to_ascii_lowercase();
    CONCEPTS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, text)| text.trim())
}

/// Explanation for a concept, or a hint listing the known names.
pub fn explain(name: &str) -> String {
    match lookup(name) {
        Some(text) => text.to_string(),
        None => format!(
            "Concept not found. Try: {}",
            concept_names().collect::<Vec<_>>().join(", ")
        ),
    }
}
