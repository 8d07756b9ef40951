//! Clinical code model
//!
//! This module contains the `Code` type, representing a single validated
//! ICD-9 or ICD-10 code, together with the purely syntactic conversions
//! between its short (fixed-width) and decimal (separator) representations.
//!
//! A `Code` can only be obtained through [`Code::parse`] (validating, with a
//! declared system) or [`Code::infer`] (classifying the system once at the
//! boundary). No operation downstream of parsing re-guesses the system or
//! representation.

use crate::error::{ComorbidError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The coding system a code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeSystem {
    /// ICD-9 / ICD-9-CM
    Icd9,
    /// ICD-10 / ICD-10-CM
    Icd10,
}

impl CodeSystem {
    /// Maximum length of a short-form code in this system
    #[must_use]
    pub const fn max_short_len(self) -> usize {
        match self {
            Self::Icd9 => 5,
            Self::Icd10 => 7,
        }
    }

    /// Lowercase name used in reference data files
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Icd9 => "icd9",
            Self::Icd10 => "icd10",
        }
    }
}

impl fmt::Display for CodeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a code string is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    /// Fixed-width form without a separator, e.g. `41071` or `J450`
    Short,
    /// Major and minor parts separated by a dot, e.g. `410.71` or `J45.0`
    Decimal,
}

/// ICD-9 codes fall into three disjoint numbering spaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icd9Category {
    /// Plain numeric codes, majors `001`-`999`
    Numeric,
    /// Supplementary classification, majors `V01`-`V91`
    V,
    /// External causes, majors `E000`-`E999`
    E,
}

impl Icd9Category {
    /// Length of the major (top-level) part for codes in this category
    #[must_use]
    pub const fn major_len(self) -> usize {
        match self {
            Self::Numeric | Self::V => 3,
            Self::E => 4,
        }
    }
}

/// A single validated clinical code
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Code {
    value: String,
    system: CodeSystem,
    representation: Representation,
}

impl Code {
    /// Parse and validate a raw code string for a declared system and
    /// representation.
    ///
    /// Input is trimmed and uppercased. Rejects disallowed characters, a
    /// length outside the bounds for the code's category, and a leading
    /// character inconsistent with the declared system.
    pub fn parse(raw: &str, system: CodeSystem, representation: Representation) -> Result<Self> {
        let value = raw.trim().to_uppercase();
        if value.is_empty() {
            return Err(invalid(raw, "empty code"));
        }

        match representation {
            Representation::Short => {
                if value.contains('.') {
                    return Err(invalid(raw, "short form must not contain a separator"));
                }
                validate_short(&value, system).map_err(|reason| invalid(raw, &reason))?;
            }
            Representation::Decimal => {
                if let Some(dot) = value.find('.') {
                    let major = &value[..dot];
                    let minor = &value[dot + 1..];
                    if minor.is_empty() {
                        return Err(invalid(raw, "trailing separator with no minor part"));
                    }
                    if minor.contains('.') {
                        return Err(invalid(raw, "more than one separator"));
                    }
                    let short = format!("{major}{minor}");
                    validate_short(&short, system).map_err(|reason| invalid(raw, &reason))?;
                    if major.len() != major_len(&short, system) {
                        return Err(invalid(raw, "separator is not at the major/minor boundary"));
                    }
                } else {
                    // A decimal code without a separator must be a bare major.
                    validate_short(&value, system).map_err(|reason| invalid(raw, &reason))?;
                    if value.len() != major_len(&value, system) {
                        return Err(invalid(
                            raw,
                            "decimal form with a minor part requires a separator",
                        ));
                    }
                }
            }
        }

        Ok(Self {
            value,
            system,
            representation,
        })
    }

    /// Classify a bare code string whose system was not declared.
    ///
    /// Called once at the boundary: a leading digit means ICD-9, a leading
    /// letter other than `V`/`E` means ICD-10. `V` and `E` prefixes are valid
    /// in both systems, so they cannot be classified and fail with
    /// [`ComorbidError::AmbiguousInput`].
    pub fn infer(raw: &str) -> Result<Self> {
        let trimmed = raw.trim().to_uppercase();
        let representation = if trimmed.contains('.') {
            Representation::Decimal
        } else {
            Representation::Short
        };
        let system = match trimmed.chars().next() {
            Some(c) if c.is_ascii_digit() => CodeSystem::Icd9,
            Some('V' | 'E') => {
                return Err(ComorbidError::AmbiguousInput {
                    code: raw.trim().to_string(),
                });
            }
            Some(c) if c.is_ascii_uppercase() => CodeSystem::Icd10,
            _ => return Err(invalid(raw, "unrecognized leading character")),
        };
        Self::parse(&trimmed, system, representation)
    }

    /// Construct from a short-form string already known to be valid.
    ///
    /// Used for codes taken back out of a canonical index, which validated
    /// them at build time.
    pub(crate) fn from_short_unchecked(value: String, system: CodeSystem) -> Self {
        Self {
            value,
            system,
            representation: Representation::Short,
        }
    }

    /// The normalized code string, in this code's representation
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The coding system this code belongs to
    #[must_use]
    pub const fn system(&self) -> CodeSystem {
        self.system
    }

    /// The representation this code is written in
    #[must_use]
    pub const fn representation(&self) -> Representation {
        self.representation
    }

    /// Convert to short form. Purely syntactic: removes the separator.
    #[must_use]
    pub fn to_short(&self) -> Self {
        match self.representation {
            Representation::Short => self.clone(),
            Representation::Decimal => Self {
                value: self.value.replace('.', ""),
                system: self.system,
                representation: Representation::Short,
            },
        }
    }

    /// Convert to decimal form. Purely syntactic: inserts the separator at
    /// the major/minor boundary. A bare major gains no separator.
    #[must_use]
    pub fn to_decimal(&self) -> Self {
        match self.representation {
            Representation::Decimal => self.clone(),
            Representation::Short => {
                let ml = major_len(&self.value, self.system);
                let value = if self.value.len() > ml {
                    format!("{}.{}", &self.value[..ml], &self.value[ml..])
                } else {
                    self.value.clone()
                };
                Self {
                    value,
                    system: self.system,
                    representation: Representation::Decimal,
                }
            }
        }
    }

    /// Convert to the given representation
    #[must_use]
    pub fn with_representation(&self, representation: Representation) -> Self {
        match representation {
            Representation::Short => self.to_short(),
            Representation::Decimal => self.to_decimal(),
        }
    }

    /// The short-form string of this code, without allocating when already
    /// short
    #[must_use]
    pub fn short_value(&self) -> String {
        match self.representation {
            Representation::Short => self.value.clone(),
            Representation::Decimal => self.value.replace('.', ""),
        }
    }

    /// The top-level (major) part of this code, as a code of the same system
    #[must_use]
    pub fn major(&self) -> Self {
        let short = self.short_value();
        let ml = major_len(&short, self.system);
        Self {
            value: short[..ml].to_string(),
            system: self.system,
            representation: self.representation,
        }
    }

    /// The minor part of this code's short form (empty for a bare major)
    #[must_use]
    pub fn minor(&self) -> String {
        let short = self.short_value();
        let ml = major_len(&short, self.system);
        short[ml..].to_string()
    }

    /// True if this code is a bare major (no minor part)
    #[must_use]
    pub fn is_major(&self) -> bool {
        let short = self.short_value();
        short.len() == major_len(&short, self.system)
    }

    /// The ICD-9 numbering space this code belongs to; `None` for ICD-10
    #[must_use]
    pub fn icd9_category(&self) -> Option<Icd9Category> {
        match self.system {
            CodeSystem::Icd9 => Some(icd9_category_of(&self.value)),
            CodeSystem::Icd10 => None,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

fn invalid(raw: &str, reason: &str) -> ComorbidError {
    ComorbidError::InvalidCode {
        code: raw.trim().to_string(),
        reason: reason.to_string(),
    }
}

fn icd9_category_of(value: &str) -> Icd9Category {
    match value.as_bytes().first() {
        Some(b'V') => Icd9Category::V,
        Some(b'E') => Icd9Category::E,
        _ => Icd9Category::Numeric,
    }
}

/// Length of the major part of a short-form code string
pub(crate) fn major_len(short: &str, system: CodeSystem) -> usize {
    match system {
        CodeSystem::Icd9 => icd9_category_of(short).major_len(),
        CodeSystem::Icd10 => 3,
    }
}

/// Validate a short-form code string, returning the rejection reason on
/// failure
fn validate_short(value: &str, system: CodeSystem) -> std::result::Result<(), String> {
    match system {
        CodeSystem::Icd9 => validate_icd9_short(value),
        CodeSystem::Icd10 => validate_icd10_short(value),
    }
}

fn validate_icd9_short(value: &str) -> std::result::Result<(), String> {
    let bytes = value.as_bytes();
    let (digits, min_len) = match bytes.first() {
        Some(b'V') => (&bytes[1..], 3),
        Some(b'E') => (&bytes[1..], 4),
        Some(b) if b.is_ascii_digit() => (bytes, 3),
        _ => return Err("ICD-9 codes start with a digit, V or E".to_string()),
    };
    if value.len() < min_len || value.len() > CodeSystem::Icd9.max_short_len() {
        return Err(format!(
            "ICD-9 codes of this category have {min_len} to {} characters",
            CodeSystem::Icd9.max_short_len()
        ));
    }
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err("ICD-9 codes contain only digits after any V/E prefix".to_string());
    }
    Ok(())
}

fn validate_icd10_short(value: &str) -> std::result::Result<(), String> {
    let bytes = value.as_bytes();
    if value.len() < 3 || value.len() > CodeSystem::Icd10.max_short_len() {
        return Err(format!(
            "ICD-10 codes have 3 to {} characters",
            CodeSystem::Icd10.max_short_len()
        ));
    }
    if !bytes[0].is_ascii_uppercase() {
        return Err("ICD-10 codes start with an uppercase letter".to_string());
    }
    if !bytes[1].is_ascii_digit() {
        return Err("the second character of an ICD-10 code is a digit".to_string());
    }
    if !bytes[2..]
        .iter()
        .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
    {
        return Err("ICD-10 codes contain only digits and uppercase letters".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_icd9_numeric() {
        let code = Code::parse("41071", CodeSystem::Icd9, Representation::Short).unwrap();
        assert_eq!(code.as_str(), "41071");
        assert_eq!(code.major().as_str(), "410");
        assert_eq!(code.minor(), "71");
        assert_eq!(code.icd9_category(), Some(Icd9Category::Numeric));
    }

    #[test]
    fn parses_icd9_v_and_e() {
        let v = Code::parse("V43.4", CodeSystem::Icd9, Representation::Decimal).unwrap();
        assert_eq!(v.icd9_category(), Some(Icd9Category::V));
        assert_eq!(v.major().short_value(), "V43");

        let e = Code::parse("E950.1", CodeSystem::Icd9, Representation::Decimal).unwrap();
        assert_eq!(e.icd9_category(), Some(Icd9Category::E));
        assert_eq!(e.major().short_value(), "E950");
        assert_eq!(e.to_short().as_str(), "E9501");
    }

    #[test]
    fn parses_icd10() {
        let code = Code::parse("J45.901", CodeSystem::Icd10, Representation::Decimal).unwrap();
        assert_eq!(code.to_short().as_str(), "J45901");
        assert_eq!(code.major().short_value(), "J45");
        assert!(code.icd9_category().is_none());
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(Code::parse("", CodeSystem::Icd9, Representation::Short).is_err());
        assert!(Code::parse("41", CodeSystem::Icd9, Representation::Short).is_err());
        assert!(Code::parse("410711", CodeSystem::Icd9, Representation::Short).is_err());
        assert!(Code::parse("41.071", CodeSystem::Icd9, Representation::Decimal).is_err());
        assert!(Code::parse("410.", CodeSystem::Icd9, Representation::Decimal).is_err());
        assert!(Code::parse("4107", CodeSystem::Icd9, Representation::Decimal).is_err());
        assert!(Code::parse("A1B", CodeSystem::Icd9, Representation::Short).is_err());
        assert!(Code::parse("1A5", CodeSystem::Icd10, Representation::Short).is_err());
        assert!(Code::parse("AB5", CodeSystem::Icd10, Representation::Short).is_err());
        assert!(Code::parse("J45.0", CodeSystem::Icd10, Representation::Short).is_err());
    }

    #[test]
    fn short_decimal_round_trip() {
        for (raw, system) in [
            ("41071", CodeSystem::Icd9),
            ("410", CodeSystem::Icd9),
            ("V434", CodeSystem::Icd9),
            ("E9501", CodeSystem::Icd9),
            ("J45901", CodeSystem::Icd10),
            ("C4A0", CodeSystem::Icd10),
        ] {
            let short = Code::parse(raw, system, Representation::Short).unwrap();
            assert_eq!(short.to_decimal().to_short(), short, "{raw}");
        }
        for (raw, system) in [
            ("410.71", CodeSystem::Icd9),
            ("V43.4", CodeSystem::Icd9),
            ("E950.1", CodeSystem::Icd9),
            ("J45.901", CodeSystem::Icd10),
        ] {
            let decimal = Code::parse(raw, system, Representation::Decimal).unwrap();
            assert_eq!(decimal.to_short().to_decimal(), decimal, "{raw}");
        }
    }

    #[test]
    fn conversion_preserves_category() {
        let e = Code::parse("E8260", CodeSystem::Icd9, Representation::Short).unwrap();
        assert_eq!(e.to_decimal().as_str(), "E826.0");
        assert_eq!(e.to_decimal().icd9_category(), Some(Icd9Category::E));
    }

    #[test]
    fn infer_classifies_once_at_the_boundary() {
        assert_eq!(Code::infer("410.71").unwrap().system(), CodeSystem::Icd9);
        assert_eq!(Code::infer("j45").unwrap().system(), CodeSystem::Icd10);
        assert!(matches!(
            Code::infer("V43.4"),
            Err(ComorbidError::AmbiguousInput { .. })
        ));
        assert!(matches!(
            Code::infer("E950"),
            Err(ComorbidError::AmbiguousInput { .. })
        ));
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        let code = Code::parse(" j45 ", CodeSystem::Icd10, Representation::Short).unwrap();
        assert_eq!(code.as_str(), "J45");
    }
}
