//! Format rules for the primary identifier of each document type.
//!
//! Pure pattern checks, no checksums. A mismatch is a classification
//! (`is_valid == false`), never an error.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::schema::{DocumentType, ExtractedFields};

static PAN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").expect("PAN pattern compiles"));

// Either ungrouped, or three groups of four with a single space or hyphen between each.
static AADHAAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-9]{12}|[0-9]{4}[ -][0-9]{4}[ -][0-9]{4})$")
        .expect("Aadhaar pattern compiles")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub is_valid: bool,
    pub normalized_value: Option<String>,
}

impl Validation {
    fn invalid() -> Self {
        Self::default()
    }

    fn valid(normalized: String) -> Self {
        Self {
            is_valid: true,
            normalized_value: Some(normalized),
        }
    }
}

/// Classify the primary identifier of an extracted document.
///
/// Only the primary field is consulted; an unknown or flag value is invalid.
pub fn validate(document_type: DocumentType, extracted: &ExtractedFields) -> Validation {
    match extracted.primary_text() {
        Some(text) => validate_identifier(document_type, text),
        None => Validation::invalid(),
    }
}

pub fn validate_identifier(document_type: DocumentType, raw: &str) -> Validation {
    match document_type {
        DocumentType::Pan => validate_pan(raw),
        DocumentType::Aadhaar => validate_aadhaar(raw),
    }
}

/// Five uppercase letters, four digits, one uppercase letter. Case-sensitive.
pub fn validate_pan(raw: &str) -> Validation {
    let candidate = raw.trim();
    if PAN_PATTERN.is_match(candidate) {
        Validation::valid(candidate.to_string())
    } else {
        Validation::invalid()
    }
}

/// Twelve digits, optionally grouped as `XXXX XXXX XXXX`, `XXXX-XXXX-XXXX`
/// or a mix of the two separators.
/// The normalized value is the bare digit string.
pub fn validate_aadhaar(raw: &str) -> Validation {
    let candidate = raw.trim();
    if !AADHAAR_PATTERN.is_match(candidate) {
        return Validation::invalid();
    }

    let digits: String = candidate.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 12 {
        Validation::valid(digits)
    } else {
        Validation::invalid()
    }
}
