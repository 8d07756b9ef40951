//! Descendant expansion
//!
//! *Defined* mode walks the contiguous descendant block of a code in its
//! canonical index. *Possible* mode generates every syntactically
//! well-formed descendant from the per-system minor alphabet without
//! consulting any list; it is combinatorial and costly for ICD-10, so prefer
//! defined mode whenever a canonical list is available.

use crate::code::{Code, CodeSystem, Representation};
use crate::error::{ComorbidError, Result};
use crate::hierarchy::HierarchyIndex;
use itertools::Itertools;
use log::warn;

/// Which codes count as children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandMode {
    /// Only codes defined in the canonical list
    Defined,
    /// Every syntactically possible code
    Possible,
}

/// An input dropped from a batch expansion, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedCode {
    /// The dropped code, in short form
    pub code: String,
    /// Why it was dropped
    pub reason: String,
}

/// Result of a batch expansion: the expanded codes together with the inputs
/// that had to be dropped
#[derive(Debug, Clone)]
pub struct Expansion {
    /// Expanded codes, in canonical order, deduplicated
    pub codes: Vec<Code>,
    /// Inputs excluded from the expansion
    pub skipped: Vec<SkippedCode>,
}

/// Expand a single code into its descendant set.
///
/// In defined mode the result is the code itself plus its contiguous
/// descendant block in `index`; a leaf yields only itself. Fails with
/// [`ComorbidError::CodeNotFound`] if the code is not defined.
/// The result keeps the representation of the input code.
pub fn children(
    code: &Code,
    index: &HierarchyIndex,
    mode: ExpandMode,
    leaf_only: bool,
) -> Result<Vec<Code>> {
    match mode {
        ExpandMode::Defined => {
            let positions = defined_positions(code, index)?;
            let codes = positions
                .into_iter()
                .filter(|&p| !leaf_only || index.entry_at(p).leaf)
                .map(|p| index.code_at(p).with_representation(code.representation()))
                .collect();
            Ok(codes)
        }
        ExpandMode::Possible => {
            if leaf_only {
                return Err(ComorbidError::Unsupported(
                    "the billable-only filter requires defined-mode expansion".to_string(),
                ));
            }
            Ok(possible_children(code))
        }
    }
}

/// Expand a batch of codes, dropping any not found in the canonical list.
///
/// Data-quality failures do not abort the batch: missing codes are returned
/// in [`Expansion::skipped`] and reported with one aggregated warning. An
/// entirely unmatched batch yields an empty result, not an error.
pub fn children_batch(
    codes: &[Code],
    index: &HierarchyIndex,
    mode: ExpandMode,
    leaf_only: bool,
) -> Result<Expansion> {
    let mut positions = Vec::new();
    let mut possible = Vec::new();
    let mut skipped = Vec::new();

    for code in codes {
        match mode {
            ExpandMode::Defined => match defined_positions(code, index) {
                Ok(block) => positions.extend(block),
                Err(ComorbidError::CodeNotFound { code }) => skipped.push(SkippedCode {
                    code,
                    reason: "not in canonical list".to_string(),
                }),
                Err(other) => return Err(other),
            },
            ExpandMode::Possible => {
                if leaf_only {
                    return Err(ComorbidError::Unsupported(
                        "the billable-only filter requires defined-mode expansion".to_string(),
                    ));
                }
                possible.extend(possible_children(code));
            }
        }
    }

    if !skipped.is_empty() {
        if positions.is_empty() {
            warn!(
                "none of the {} input codes are in the canonical list; returning an empty expansion",
                codes.len()
            );
        } else {
            warn!(
                "dropped {} of {} input codes not in the canonical list",
                skipped.len(),
                codes.len()
            );
        }
    }

    // As for single-code expansion, the result keeps the representation of
    // the input.
    let representation = codes
        .first()
        .map_or(Representation::Short, Code::representation);
    let codes = match mode {
        ExpandMode::Defined => positions
            .into_iter()
            .sorted_unstable()
            .dedup()
            .filter(|&p| !leaf_only || index.entry_at(p).leaf)
            .map(|p| index.code_at(p).with_representation(representation))
            .collect(),
        ExpandMode::Possible => possible
            .into_iter()
            .sorted_unstable_by(|a, b| a.as_str().cmp(b.as_str()))
            .dedup()
            .collect(),
    };
    Ok(Expansion { codes, skipped })
}

/// Canonical positions of a code and its descendant block
fn defined_positions(code: &Code, index: &HierarchyIndex) -> Result<Vec<usize>> {
    let short = code.short_value();
    let pos = index
        .position_of(&short)
        .ok_or(ComorbidError::CodeNotFound { code: short })?;
    let mut positions = Vec::with_capacity(1 + index.block_of(pos).len());
    positions.push(pos);
    positions.extend(index.block_of(pos));
    Ok(positions)
}

/// Every syntactically possible descendant of a code, including itself.
///
/// Appends each character of the per-position minor alphabet until the
/// maximum short length for the system is reached. No canonical list is
/// consulted. The output is in short form, lexicographically ordered.
#[must_use]
pub fn possible_children(code: &Code) -> Vec<Code> {
    let system = code.system();
    let mut prefix = code.short_value();
    let mut out = Vec::new();
    extend_possible(&mut prefix, system, &mut out);
    out
}

fn extend_possible(prefix: &mut String, system: CodeSystem, out: &mut Vec<Code>) {
    out.push(Code::from_short_unchecked(prefix.clone(), system));
    if prefix.len() >= system.max_short_len() {
        return;
    }
    let last = prefix.len() + 1 == system.max_short_len();
    for &b in minor_alphabet(system, last) {
        prefix.push(b as char);
        extend_possible(prefix, system, out);
        prefix.pop();
    }
}

/// The characters allowed at a minor position.
///
/// ICD-9 minors are purely numeric. ICD-10 interior minor positions allow
/// the `X` placeholder filler; the final (seventh) position also carries
/// alphabetic qualifiers.
fn minor_alphabet(system: CodeSystem, last: bool) -> &'static [u8] {
    match (system, last) {
        (CodeSystem::Icd9, _) => b"0123456789",
        (CodeSystem::Icd10, false) => b"0123456789X",
        (CodeSystem::Icd10, true) => b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    }
}
