use crate::utils::prelude::SrcSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerErrorType {
    LeadingZero,
    UnrecognizedCharacter { ch: char },
    UnterminatedString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerError {
    pub error: ScannerErrorType,
    pub location: SrcSpan,
    pub position: (u32, u32),
}

impl ScannerError {
    pub fn details(&self) -> (&'static str, Vec<String>) {
        match self.error {
            ScannerErrorType::LeadingZero => {
                ("Leading zeros in decimal integer literals are not permitted", vec![])
            },
            ScannerErrorType::UnrecognizedCharacter { ch } => {
                ("Unrecognized character", vec![format!("`{ch}` does not start any token")])
            },
            ScannerErrorType::UnterminatedString => {
                ("Missing closing `\"` in string literal", vec![])
            }
        }
    }
}
