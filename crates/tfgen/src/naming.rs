//! Identifier conversions shared by every generator.

use std::sync::LazyLock;

use convert_case::{Case, Casing};
use regex::Regex;

static IDENTIFIER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("failed to compile identifier regex")
});

// A word is either a capitalized run of lower-case characters or a run of
// capitals (an acronym) followed by one.
static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^[^A-Z]*|[A-Z]*)([A-Z][^A-Z]+|$)").expect("failed to compile word regex")
});

/// Converts an identifier-style name into snake_case.
///
/// Runs of capital letters are treated as one acronym, so `ISCSI` becomes
/// `iscsi` and `AWSElasticBlockStore` becomes `aws_elastic_block_store`.
/// Digits stay attached to the preceding word (`MyInt32` becomes `my_int32`).
pub fn snake_case(name: &str) -> String {
    let name = upper_first(name);
    let words: Vec<&str> = WORD_REGEX
        .captures_iter(&name)
        .flat_map(|captures| [captures.get(1), captures.get(2)])
        .flatten()
        .map(|word| word.as_str())
        .filter(|word| !word.is_empty())
        .collect();

    words.join("_").to_lowercase()
}

/// Upper-cases the first character and leaves the rest untouched.
pub fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Derives the identifier a serialized property name has in generated code.
///
/// `hostIPC` becomes `HostIPC`. Names that are not already camelCase (they
/// contain `_` or `-`) are Pascal-cased instead.
pub fn go_identifier(property: &str) -> String {
    if property.contains(['_', '-']) {
        property.to_case(Case::Pascal)
    } else {
        upper_first(property)
    }
}

/// Returns `true` if `name` can be used as an identifier in generated code.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER_REGEX.is_match(name)
}

/// Quotes `text` as a double-quoted string literal, escaping as needed.
pub fn quote(text: &str) -> String {
    serde_json::Value::String(text.to_owned()).to_string()
}
