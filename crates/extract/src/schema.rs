use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::UnsupportedDocumentType;
use crate::validator::Validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pan,
    Aadhaar,
}

impl DocumentType {
    pub const ALL: [DocumentType; 2] = [DocumentType::Pan, DocumentType::Aadhaar];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Pan => "pan",
            DocumentType::Aadhaar => "aadhaar",
        }
    }

    /// Field holding the registration number, the only one subject to format validation.
    pub fn primary_field(&self) -> &'static str {
        match self {
            DocumentType::Pan => "pan_number",
            DocumentType::Aadhaar => "aadhaar_number",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = UnsupportedDocumentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pan" => Ok(DocumentType::Pan),
            "aadhaar" => Ok(DocumentType::Aadhaar),
            _ => Err(UnsupportedDocumentType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    FreeText,
    Date,
    BooleanPresence,
}

/// One question asked about a document image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub question: &'static str,
    pub kind: FieldKind,
}

/// Text answer for a single question, after response-shape normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAnswer(String);

impl RawAnswer {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// Coerced value of one extracted field. `Unknown` serializes as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
    Unknown,
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, FieldValue::Unknown)
    }
}

/// Field map for one document, before validation. Holds one entry per catalog field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedFields {
    pub document_type: DocumentType,
    pub fields: BTreeMap<String, FieldValue>,
}

impl ExtractedFields {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn primary_text(&self) -> Option<&str> {
        self.get(self.document_type.primary_field())
            .and_then(FieldValue::as_text)
    }

    pub fn unknown_count(&self) -> usize {
        self.fields.values().filter(|v| v.is_unknown()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    document_type: DocumentType,
    fields: BTreeMap<String, FieldValue>,
    valid: bool,
    normalized_value: Option<String>,
}

impl ExtractionRecord {
    pub fn assemble(extracted: ExtractedFields, validation: Validation) -> Self {
        Self {
            document_type: extracted.document_type,
            fields: extracted.fields,
            valid: validation.is_valid,
            normalized_value: validation.normalized_value,
        }
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn normalized_value(&self) -> Option<&str> {
        self.normalized_value.as_deref()
    }
}
