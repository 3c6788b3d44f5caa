//! Display-name and machine-key normalization for catalog entries.

/// Turn a human-entered or snake_case field name into a spaced, title-cased
/// display label: `"net_sales_qty"` → `"Net Sales Qty"`.
pub fn capitalize_words(input: &str) -> String {
    input
        .replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lower-snake-case machine key: `"Net Sales Qty"` → `"net_sales_qty"`.
pub fn to_underscore(input: &str) -> String {
    input
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}
