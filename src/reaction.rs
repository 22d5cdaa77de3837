//! Reaction records and reaction-SMILES canonicalization.
//!
//! A reaction SMILES is written `A.B>>C`. Canonicalization sorts the
//! structures of each side independently so that the same reaction always
//! has the same text regardless of the order RetroPath2.0 emitted it in.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ReactionError;
use crate::registry::StructureRegistry;

/// Separator between the two sides of a reaction SMILES.
pub const SIDE_SEPARATOR: &str = ">>";

/// Separator between structures on one side.
pub const TOKEN_SEPARATOR: char = '.';

/// Result type for reaction operations.
pub type ReactionResult<T> = std::result::Result<T, ReactionError>;

/// Split a reaction SMILES into its two sides.
pub fn split_sides(text: &str) -> ReactionResult<(&str, &str)> {
    let malformed = || ReactionError::Malformed {
        text: text.to_string(),
    };
    let (left, right) = text.split_once(SIDE_SEPARATOR).ok_or_else(malformed)?;
    if left.is_empty() || right.is_empty() || right.contains(SIDE_SEPARATOR) {
        return Err(malformed());
    }
    Ok((left, right))
}

/// Split one side into its structure tokens.
pub fn side_tokens(side: &str) -> Vec<&str> {
    side.split(TOKEN_SEPARATOR).collect()
}

/// Join two token lists, sorting each side lexicographically.
pub fn canonicalize<L, R>(left: &[L], right: &[R]) -> String
where
    L: AsRef<str>,
    R: AsRef<str>,
{
    let mut left: Vec<&str> = left.iter().map(AsRef::as_ref).collect();
    let mut right: Vec<&str> = right.iter().map(AsRef::as_ref).collect();
    left.sort_unstable();
    right.sort_unstable();
    format!("{}{SIDE_SEPARATOR}{}", left.join("."), right.join("."))
}

/// Canonicalize a reaction SMILES.
pub fn canonicalize_text(text: &str) -> ReactionResult<String> {
    let (left, right) = split_sides(text)?;
    Ok(canonicalize(&side_tokens(left), &side_tokens(right)))
}

/// Swap the two sides of a reaction SMILES without re-sorting.
pub fn reverse(text: &str) -> ReactionResult<String> {
    let (left, right) = split_sides(text)?;
    Ok(format!("{right}{SIDE_SEPARATOR}{left}"))
}

/// Raw reaction fields as read from one transformation group.
#[derive(Debug, Clone, Default)]
pub struct RawReaction {
    pub id: String,
    pub smiles: String,
    pub diameter: u32,
    pub rule_ids: Vec<String>,
    pub ec_numbers: Vec<String>,
    pub score: f64,
    pub iteration: u32,
}

/// One canonicalized reaction occurrence.
///
/// Structure ids are captured by value when the record is built, so any
/// target promotion must happen before.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transformation {
    pub id: String,
    /// Canonical reaction SMILES.
    pub smiles: String,
    /// Consumed structures: uid → coefficient.
    pub left: BTreeMap<String, u32>,
    /// Produced structures: uid → coefficient.
    pub right: BTreeMap<String, u32>,
    pub diameter: u32,
    pub rule_ids: Vec<String>,
    pub ec_numbers: Vec<String>,
    pub score: f64,
    pub iteration: u32,
}

impl Transformation {
    /// Build a record from raw fields, resolving structures through `registry`.
    ///
    /// With `reverse`, the reaction is read right to left before
    /// canonicalization.
    pub fn new(
        raw: RawReaction,
        registry: &StructureRegistry,
        reverse_direction: bool,
    ) -> ReactionResult<Self> {
        let oriented = if reverse_direction {
            reverse(&raw.smiles)?
        } else {
            raw.smiles.clone()
        };
        let smiles = canonicalize_text(&oriented)?;
        let (left_side, right_side) = split_sides(&smiles)?;
        let left = resolve_side(&raw.id, left_side, registry)?;
        let right = resolve_side(&raw.id, right_side, registry)?;

        Ok(Self {
            id: raw.id,
            smiles,
            left,
            right,
            diameter: raw.diameter,
            rule_ids: raw.rule_ids,
            ec_numbers: raw.ec_numbers,
            score: raw.score,
            iteration: raw.iteration,
        })
    }

    /// Primary display label: the first EC number, or the id.
    pub fn label(&self) -> String {
        self.ec_numbers
            .first()
            .cloned()
            .unwrap_or_else(|| self.id.clone())
    }

    /// All display labels: the EC numbers, or the id.
    pub fn labels(&self) -> Vec<String> {
        if self.ec_numbers.is_empty() {
            vec![self.id.clone()]
        } else {
            self.ec_numbers.clone()
        }
    }

    /// Tab-separated text form: id, rule ids, left side, `=`, right side.
    ///
    /// Each side is the `:`-joined, sorted list of `coeff.[label,...]` terms.
    pub fn to_tsv_line(&self, registry: &StructureRegistry, reverse_direction: bool) -> String {
        let side = |uids: &BTreeMap<String, u32>| {
            let mut terms: Vec<String> = uids
                .iter()
                .map(|(uid, coeff)| format!("{coeff}.[{}]", registry.labels_for(uid).join(",")))
                .collect();
            terms.sort();
            terms.join(":")
        };
        let rules: BTreeSet<&str> = self.rule_ids.iter().map(String::as_str).collect();
        let rules = rules.into_iter().collect::<Vec<_>>().join(",");
        let (first, second) = if reverse_direction {
            (side(&self.right), side(&self.left))
        } else {
            (side(&self.left), side(&self.right))
        };
        [self.id.as_str(), &rules, &first, "=", &second].join("\t")
    }
}

fn resolve_side(
    reaction: &str,
    side: &str,
    registry: &StructureRegistry,
) -> ReactionResult<BTreeMap<String, u32>> {
    let mut coefficients = BTreeMap::new();
    for token in side_tokens(side) {
        let uid = registry
            .lookup(token)
            .ok_or_else(|| ReactionError::UnresolvedStructure {
                reaction: reaction.to_string(),
                token: token.to_string(),
            })?;
        *coefficients.entry(uid.to_string()).or_insert(0) += 1;
    }
    Ok(coefficients)
}
