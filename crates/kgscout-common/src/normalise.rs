//! Identifier normalisation for gene symbols and disease names.
//!
//! Gene symbols are compared in their canonical HGNC-like form: uppercase,
//! with leading/trailing punctuation noise (`*TP53`, `"EGFR",`, `-MYC`)
//! stripped. Internal hyphens and dots survive (`HLA-A`, `NKX2-1`).

/// Normalise a raw gene symbol. Returns `None` when nothing alphanumeric remains.
pub fn normalise_gene_symbol(raw: &str) -> Option<String> {
    let trimmed = raw.trim_matches(|c: char| !c.is_ascii_alphanumeric());
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_ascii_uppercase())
}

/// Lookup key for a disease or pathway name: trimmed, whitespace collapsed,
/// lowercased.
pub fn normalise_name_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Keep only characters that are safe in an artifact file name.
pub fn safe_file_prefix(prefix: &str) -> String {
    prefix
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
