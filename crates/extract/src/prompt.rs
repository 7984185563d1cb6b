use crate::schema::{DocumentType, FieldKind, FieldSpec};

/// Answer the model is asked to give when a field cannot be read.
pub const NOT_FOUND: &str = "Not Found";

const PAN_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "pan_number",
        question: "What is the PAN number printed on this PAN card? It is a 10-character code of 5 letters, 4 digits and 1 letter, for example ABCDE1234F. Reply with the code only, exactly as printed, or Not Found if it is not clearly visible.",
        kind: FieldKind::FreeText,
    },
    FieldSpec {
        name: "name",
        question: "What is the full name of the cardholder as printed on this PAN card? Reply with the name only, or Not Found if it is not clearly visible.",
        kind: FieldKind::FreeText,
    },
    FieldSpec {
        name: "fathers_name",
        question: "What is the father's name as printed on this PAN card? Reply with the name only, or Not Found if it is not clearly visible.",
        kind: FieldKind::FreeText,
    },
    FieldSpec {
        name: "date_of_birth",
        question: "What is the date of birth printed on this PAN card? Reply in DD/MM/YYYY format, or Not Found if it is not clearly visible.",
        kind: FieldKind::Date,
    },
    FieldSpec {
        name: "signature_present",
        question: "Is a signature present on this PAN card? Answer Yes or No.",
        kind: FieldKind::BooleanPresence,
    },
];

const AADHAAR_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "aadhaar_number",
        question: "What is the 12-digit Aadhaar number printed on this Aadhaar card? Keep the spacing as printed (XXXX XXXX XXXX). Reply with the number only, or Not Found if it is not clearly visible.",
        kind: FieldKind::FreeText,
    },
    FieldSpec {
        name: "name",
        question: "What is the full name of the cardholder as printed on this Aadhaar card? Reply with the name only, or Not Found if it is not clearly visible.",
        kind: FieldKind::FreeText,
    },
    FieldSpec {
        name: "date_of_birth",
        question: "What is the date of birth (DD/MM/YYYY) or year of birth (YYYY) printed on this Aadhaar card? Reply with the date only, or Not Found if it is not clearly visible.",
        kind: FieldKind::Date,
    },
    FieldSpec {
        name: "gender",
        question: "What gender is printed on this Aadhaar card: Male, Female or Other? Reply with one word, or Not Found if it is not clearly visible.",
        kind: FieldKind::FreeText,
    },
    FieldSpec {
        name: "address",
        question: "What is the complete address printed on this Aadhaar card, including street, city, state and PIN code? Reply with the address only, or Not Found if it is not clearly visible.",
        kind: FieldKind::FreeText,
    },
    FieldSpec {
        name: "qr_code_present",
        question: "Is a QR code present on this Aadhaar card? Answer Yes or No.",
        kind: FieldKind::BooleanPresence,
    },
];

/// Ordered questions asked for a document type.
pub fn questions_for(document_type: DocumentType) -> &'static [FieldSpec] {
    match document_type {
        DocumentType::Pan => PAN_FIELDS,
        DocumentType::Aadhaar => AADHAAR_FIELDS,
    }
}
