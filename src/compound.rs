//! Chemical structures tracked by the registry.
//!
//! A [`Compound`] is identified by the SMILES string it was first seen with.
//! Everything else (descriptors, external labels, sink/target flags) is
//! annotation gathered while ingesting the results.

use serde::{Deserialize, Serialize};

/// Prefix of MetaNetX compound ids, which sort numerically by suffix.
pub const MNX_PREFIX: &str = "MNXM";

/// Characters reserved by the serialized reaction notation (`1.[A,B]:2.[C]`).
const RESERVED_LABEL_CHARS: [char; 5] = [',', ':', ' ', '[', ']'];

/// Structural descriptors of a compound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptors {
    /// SMILES, canonical once a describer has refreshed it.
    pub smiles: String,
    pub inchi: Option<String>,
    pub inchikey: Option<String>,
}

impl Descriptors {
    pub fn from_smiles(smiles: impl Into<String>) -> Self {
        Self {
            smiles: smiles.into(),
            inchi: None,
            inchikey: None,
        }
    }

    /// Iterate over every descriptor that is set.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.smiles.as_str())
            .chain(self.inchi.as_deref())
            .chain(self.inchikey.as_deref())
    }
}

/// A unique chemical structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compound {
    /// Allocated identifier (`CMPD_...` or, once promoted, `TARGET_...`).
    pub uid: String,
    /// SMILES the compound was registered under; the identity key.
    pub original_smiles: String,
    pub descriptors: Descriptors,
    /// External names, sanitized and deduplicated, in discovery order.
    pub cids: Vec<String>,
    pub is_sink: bool,
    pub is_target: bool,
}

impl Compound {
    pub fn new(uid: impl Into<String>, smiles: impl Into<String>) -> Self {
        let smiles = smiles.into();
        Self {
            uid: uid.into(),
            descriptors: Descriptors::from_smiles(smiles.clone()),
            original_smiles: smiles,
            cids: Vec::new(),
            is_sink: false,
            is_target: false,
        }
    }

    /// Attach an external name. Reserved characters are replaced by `_`;
    /// duplicates (after sanitizing) are ignored.
    pub fn add_cid(&mut self, cid: &str) {
        let cid = sanitize_label(cid);
        if !self.cids.contains(&cid) {
            self.cids.push(cid);
        }
    }

    /// External names in display order, or the uid when none are known.
    pub fn labels(&self) -> Vec<String> {
        if self.cids.is_empty() {
            return vec![self.uid.clone()];
        }
        sort_labels(&self.cids)
    }

    /// Primary display label.
    pub fn label(&self) -> String {
        self.labels()
            .into_iter()
            .next()
            .unwrap_or_else(|| self.uid.clone())
    }
}

/// Replace characters reserved in the reaction notation with `_`.
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if RESERVED_LABEL_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Sort labels for display.
///
/// When every label is a MetaNetX id (`MNXM<n>`) they sort by `n`
/// numerically; otherwise lexicographically.
pub fn sort_labels(labels: &[String]) -> Vec<String> {
    let numeric: Option<Vec<(u64, &String)>> = labels
        .iter()
        .map(|l| {
            l.strip_prefix(MNX_PREFIX)
                .and_then(|n| n.parse::<u64>().ok())
                .map(|n| (n, l))
        })
        .collect();

    match numeric {
        Some(mut keyed) => {
            keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
            keyed.into_iter().map(|(_, l)| l.clone()).collect()
        }
        None => {
            let mut sorted = labels.to_vec();
            sorted.sort();
            sorted
        }
    }
}
