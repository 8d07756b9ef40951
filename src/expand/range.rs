//! Range expansion
//!
//! Expands a start/end code pair into the inclusive set of codes spanning
//! them. The delicate part is the boundary policy: a non-leaf code at either
//! boundary may imply descendants outside the requested span. By default
//! such ambiguous parents are excluded; policy flags on [`RangeOptions`] let
//! a caller retain them when exact boundary fidelity matters more than
//! avoiding over-inclusion.

use crate::code::{Code, CodeSystem, Icd9Category};
use crate::error::{ComorbidError, Result};
use crate::expand::children::{ExpandMode, children, possible_children};
use crate::hierarchy::HierarchyIndex;
use rustc_hash::FxHashSet;

/// Policy flags for range expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeOptions {
    /// Restrict the result to codes defined in the canonical list
    pub defined: bool,
    /// Drop an ambiguous non-leaf code near the start of the range
    pub exclude_ambiguous_start: bool,
    /// Drop every ambiguous non-leaf code up to and beyond the end of the
    /// range
    pub exclude_ambiguous_end: bool,
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self {
            defined: true,
            exclude_ambiguous_start: true,
            exclude_ambiguous_end: true,
        }
    }
}

/// Expand the inclusive range between two codes.
///
/// Both boundaries must belong to the same coding system and, for ICD-9, to
/// the same numbering space (numeric, V or E). In defined mode the result is
/// seeded with every canonical entry between the boundary positions, unioned
/// with the full descendant set of `end`, then filtered by the
/// ambiguous-boundary policy; the output is in canonical order and keeps the
/// representation of `start`.
pub fn expand_range(
    start: &Code,
    end: &Code,
    index: &HierarchyIndex,
    options: &RangeOptions,
) -> Result<Vec<Code>> {
    check_compatible(start, end)?;
    if !options.defined {
        return possible_range(start, end, options);
    }

    let start_short = start.short_value();
    let end_short = end.short_value();
    let sp = index
        .position_of(&start_short)
        .ok_or(ComorbidError::RangeNotFound { code: start_short })?;
    let ep = index
        .position_of(&end_short)
        .ok_or(ComorbidError::RangeNotFound { code: end_short })?;
    if ep < sp {
        return Err(range_order(start, end));
    }
    if sp == ep {
        return children(start, index, ExpandMode::Defined, false);
    }

    let n = index.len();
    let mut included = vec![false; n];
    for slot in included.iter_mut().take(ep + 1).skip(sp) {
        *slot = true;
    }
    // The descendants of `end` extend past its own canonical position.
    for p in index.block_of(ep) {
        included[p] = true;
    }

    let mut removed = vec![false; n];
    if options.exclude_ambiguous_end {
        // A parent whose descendants are not all in the seed implies codes
        // outside the requested range. The missing descendants can sit far
        // from the parent, so every included position is checked.
        for p in sp..n {
            if included[p] && is_ambiguous(index, p, &included) {
                removed[p] = true;
            }
        }
    } else if options.exclude_ambiguous_start {
        // With end-exclusion off, only the head of the range is checked. No
        // parent has more descendants than the widest block in the list, so
        // that bound limits the lookahead.
        let window = (sp + index.max_block() + 1).min(n);
        for p in sp..window {
            if included[p] && is_ambiguous(index, p, &included) {
                removed[p] = true;
            }
        }
    }

    Ok((0..n)
        .filter(|&p| included[p] && !removed[p])
        .map(|p| index.code_at(p).with_representation(start.representation()))
        .collect())
}

/// Expand the range between two top-level (major) codes, independent of
/// minor-level descendants.
///
/// Enumeration is syntactic: numeric for the three ICD-9 numbering spaces
/// (which cannot be mixed in one range), alphabetic over the third character
/// for ICD-10. With `defined` set, majors absent from the canonical list are
/// dropped, which requires an index.
pub fn expand_major_range(
    start: &Code,
    end: &Code,
    index: Option<&HierarchyIndex>,
    defined: bool,
) -> Result<Vec<Code>> {
    check_compatible(start, end)?;
    for code in [start, end] {
        if !code.is_major() {
            return Err(ComorbidError::InvalidCode {
                code: code.as_str().to_string(),
                reason: "major-range boundaries must be top-level codes".to_string(),
            });
        }
    }

    let start_short = start.short_value();
    let end_short = end.short_value();
    let majors = match start.system() {
        CodeSystem::Icd9 => {
            // Safe: parse validated the category and digits.
            let category = start.icd9_category().unwrap_or(Icd9Category::Numeric);
            icd9_major_seq(&start_short, &end_short, category)
                .ok_or_else(|| range_order(start, end))?
        }
        CodeSystem::Icd10 => {
            if end_short < start_short {
                return Err(range_order(start, end));
            }
            icd10_major_seq(&start_short, &end_short)
        }
    };

    let majors: Vec<String> = match (defined, index) {
        (true, Some(index)) => majors
            .into_iter()
            .filter(|m| index.position_of(m).is_some())
            .collect(),
        (true, None) => {
            return Err(ComorbidError::Unsupported(
                "defined-mode major-range expansion requires a canonical index".to_string(),
            ));
        }
        (false, _) => majors,
    };

    Ok(majors
        .into_iter()
        .map(|m| {
            Code::from_short_unchecked(m, start.system())
                .with_representation(start.representation())
        })
        .collect())
}

/// True if the entry at `p` is a non-leaf whose descendant block is not
/// fully included
fn is_ambiguous(index: &HierarchyIndex, p: usize, included: &[bool]) -> bool {
    let block = index.block_of(p);
    !block.is_empty() && block.into_iter().any(|q| !included[q])
}

fn check_compatible(start: &Code, end: &Code) -> Result<()> {
    if start.system() != end.system() {
        return Err(ComorbidError::VersionMismatch {
            start: start.as_str().to_string(),
            end: end.as_str().to_string(),
        });
    }
    if start.icd9_category() != end.icd9_category() {
        return Err(ComorbidError::CategoryMismatch {
            start: start.as_str().to_string(),
            end: end.as_str().to_string(),
        });
    }
    Ok(())
}

fn range_order(start: &Code, end: &Code) -> ComorbidError {
    ComorbidError::RangeOrder {
        start: start.as_str().to_string(),
        end: end.as_str().to_string(),
    }
}

/// Possible-mode range expansion: every syntactically well-formed code
/// between the boundaries, regardless of any canonical list.
///
/// Supported for ICD-9 only. ICD-10 codes carry up to four trailing
/// qualifier characters, and enumerating every combination across a range is
/// intractable, so that case fails fast instead of attempting it.
pub(crate) fn possible_range(
    start: &Code,
    end: &Code,
    options: &RangeOptions,
) -> Result<Vec<Code>> {
    check_compatible(start, end)?;
    if start.system() == CodeSystem::Icd10 {
        return Err(ComorbidError::Unsupported(
            "possible-mode range expansion is not implemented for ICD-10".to_string(),
        ));
    }

    let start_short = start.short_value();
    let end_short = end.short_value();
    // Within one ICD-9 numbering space, short codes order lexicographically.
    if end_short < start_short && !end_short.starts_with(start_short.as_str()) {
        return Err(range_order(start, end));
    }

    let category = start.icd9_category().unwrap_or(Icd9Category::Numeric);
    let ml = category.major_len();
    let majors = icd9_major_seq(&start_short[..ml], &end_short[..ml], category)
        .ok_or_else(|| range_order(start, end))?;

    let mut shorts = Vec::new();
    for major in majors {
        let major = Code::from_short_unchecked(major, CodeSystem::Icd9);
        for code in possible_children(&major) {
            let value = code.as_str();
            if value >= start_short.as_str()
                && (value <= end_short.as_str() || value.starts_with(end_short.as_str()))
            {
                shorts.push(code.short_value());
            }
        }
    }

    // An ancestor of `start` sorts before it and is never seeded, so only the
    // end boundary can produce ambiguous parents here.
    if options.exclude_ambiguous_end {
        let seeded: FxHashSet<String> = shorts.iter().cloned().collect();
        shorts.retain(|short| {
            let code = Code::from_short_unchecked(short.clone(), CodeSystem::Icd9);
            possible_children(&code)
                .iter()
                .all(|child| seeded.contains(child.as_str()))
        });
    }

    Ok(shorts
        .into_iter()
        .map(|short| {
            Code::from_short_unchecked(short, CodeSystem::Icd9)
                .with_representation(start.representation())
        })
        .collect())
}

/// The syntactic sequence of ICD-9 majors between two bounds, inclusive.
/// `None` when the end precedes the start.
fn icd9_major_seq(start: &str, end: &str, category: Icd9Category) -> Option<Vec<String>> {
    let (prefix, width) = match category {
        Icd9Category::Numeric => ("", 3),
        Icd9Category::V => ("V", 2),
        Icd9Category::E => ("E", 3),
    };
    let digits = |s: &str| s[prefix.len()..].parse::<u32>().ok();
    let lo = digits(start)?;
    let hi = digits(end)?;
    if hi < lo {
        return None;
    }
    Some(
        (lo..=hi)
            .map(|n| format!("{prefix}{n:0width$}"))
            .collect(),
    )
}

/// The syntactic sequence of ICD-10 majors between two bounds, inclusive.
///
/// The third character of an ICD-10 major may be alphabetic, so the range is
/// enumerated over letter-digit-alphanumeric combinations in lexicographic
/// order.
fn icd10_major_seq(start: &str, end: &str) -> Vec<String> {
    const THIRD: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut out = Vec::new();
    for c0 in start.as_bytes()[0]..=end.as_bytes()[0] {
        for c1 in b'0'..=b'9' {
            for &c2 in THIRD {
                // All three bytes are ASCII.
                let major: String = [c0, c1, c2].iter().map(|&b| b as char).collect();
                if major.as_str() >= start && major.as_str() <= end {
                    out.push(major);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Representation;

    fn icd9(raw: &str) -> Code {
        Code::parse(raw, CodeSystem::Icd9, Representation::Short).unwrap()
    }

    fn icd10(raw: &str) -> Code {
        Code::parse(raw, CodeSystem::Icd10, Representation::Short).unwrap()
    }

    #[test]
    fn mixed_numbering_spaces_cannot_span_a_range() {
        let err = expand_major_range(&icd9("V43"), &icd9("441"), None, false).unwrap_err();
        assert!(matches!(err, ComorbidError::CategoryMismatch { .. }));

        let err = expand_major_range(&icd9("E826"), &icd9("V43"), None, false).unwrap_err();
        assert!(matches!(err, ComorbidError::CategoryMismatch { .. }));
    }

    #[test]
    fn mixed_systems_cannot_span_a_range() {
        let err = expand_major_range(&icd9("441"), &icd10("I70"), None, false).unwrap_err();
        assert!(matches!(err, ComorbidError::VersionMismatch { .. }));
    }

    #[test]
    fn icd9_major_range_is_numeric() {
        let majors = expand_major_range(&icd9("100"), &icd9("102"), None, false).unwrap();
        let values: Vec<_> = majors.iter().map(Code::as_str).collect();
        assert_eq!(values, ["100", "101", "102"]);
    }

    #[test]
    fn icd9_v_and_e_major_ranges_keep_their_prefix() {
        let majors = expand_major_range(&icd9("V09"), &icd9("V11"), None, false).unwrap();
        let values: Vec<_> = majors.iter().map(Code::as_str).collect();
        assert_eq!(values, ["V09", "V10", "V11"]);

        let majors = expand_major_range(&icd9("E999"), &icd9("E999"), None, false).unwrap();
        let values: Vec<_> = majors.iter().map(Code::as_str).collect();
        assert_eq!(values, ["E999"]);
    }

    #[test]
    fn icd10_major_range_enumerates_alphabetic_third_character() {
        let majors = expand_major_range(&icd10("C43"), &icd10("C4A"), None, false).unwrap();
        let values: Vec<_> = majors.iter().map(Code::as_str).collect();
        assert_eq!(values, ["C43", "C44", "C45", "C46", "C47", "C48", "C49", "C4A"]);
    }

    #[test]
    fn major_range_rejects_non_major_boundaries() {
        let err = expand_major_range(&icd9("4410"), &icd9("442"), None, false).unwrap_err();
        assert!(matches!(err, ComorbidError::InvalidCode { .. }));
    }

    #[test]
    fn major_range_order_is_checked() {
        let err = expand_major_range(&icd9("102"), &icd9("100"), None, false).unwrap_err();
        assert!(matches!(err, ComorbidError::RangeOrder { .. }));
    }

    #[test]
    fn possible_range_spans_icd9_codes() {
        let codes = expand_range(
            &icd9("4419"),
            &icd9("4420"),
            // The index is unused in possible mode; an empty one keeps the
            // signature honest.
            &crate::hierarchy::HierarchyIndex::build(CodeSystem::Icd9, 2015, Vec::new()).unwrap(),
            &RangeOptions {
                defined: false,
                ..RangeOptions::default()
            },
        )
        .unwrap();
        let values: Vec<_> = codes.iter().map(Code::as_str).collect();
        assert!(values.contains(&"4419"));
        assert!(values.contains(&"44190"));
        assert!(values.contains(&"44199"));
        assert!(values.contains(&"4420"));
        assert!(values.contains(&"44200"));
        assert!(!values.contains(&"442"));
        assert!(!values.contains(&"4421"));
    }

    #[test]
    fn possible_range_is_unsupported_for_icd10() {
        let index = crate::hierarchy::HierarchyIndex::build(CodeSystem::Icd10, 2025, Vec::new())
            .unwrap();
        let err = expand_range(
            &icd10("I70"),
            &icd10("I71"),
            &index,
            &RangeOptions {
                defined: false,
                ..RangeOptions::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ComorbidError::Unsupported(_)));
    }
}
