//! Structure registry: bidirectional SMILES ↔ identifier mapping.
//!
//! The [`StructureRegistry`] deduplicates structures by the SMILES they
//! appear under in reaction text and hands out one identifier per distinct
//! structure. It owns its two [`IdAllocator`]s, one for ordinary compounds
//! and one for promoted targets.

use std::collections::{BTreeMap, HashMap};

use crate::compound::{Compound, Descriptors};
use crate::ident::IdAllocator;

/// Default prefix for ordinary compound ids.
pub const COMPOUND_PREFIX: &str = "CMPD";

/// Default prefix for target compound ids.
pub const TARGET_PREFIX: &str = "TARGET";

/// Bidirectional registry mapping SMILES keys to ids and ids to compounds.
pub struct StructureRegistry {
    /// Forward map: uid → Compound (source of truth), ordered by uid.
    compounds: BTreeMap<String, Compound>,
    /// Reverse map: SMILES key → uid.
    key_to_id: HashMap<String, String>,
    compound_ids: IdAllocator,
    target_ids: IdAllocator,
}

impl StructureRegistry {
    /// Create a registry with the default `CMPD` / `TARGET` id spaces.
    pub fn new() -> Self {
        Self::with_allocators(
            IdAllocator::new(COMPOUND_PREFIX),
            IdAllocator::new(TARGET_PREFIX),
        )
    }

    /// Create a registry with explicit allocators.
    pub fn with_allocators(compound_ids: IdAllocator, target_ids: IdAllocator) -> Self {
        Self {
            compounds: BTreeMap::new(),
            key_to_id: HashMap::new(),
            compound_ids,
            target_ids,
        }
    }

    /// Return the id registered for `smiles`, allocating one on first sight.
    pub fn get_or_create(&mut self, smiles: &str) -> String {
        if let Some(uid) = self.key_to_id.get(smiles) {
            return uid.clone();
        }
        let uid = self.compound_ids.next_id();
        self.key_to_id.insert(smiles.to_string(), uid.clone());
        self.compounds
            .insert(uid.clone(), Compound::new(uid.clone(), smiles));
        uid
    }

    /// Look up the id registered for `smiles`.
    pub fn lookup(&self, smiles: &str) -> Option<&str> {
        self.key_to_id.get(smiles).map(String::as_str)
    }

    /// Look up a compound by id.
    pub fn get(&self, uid: &str) -> Option<&Compound> {
        self.compounds.get(uid)
    }

    /// Mark a compound as sink and attach an external label to it.
    ///
    /// Returns `false` if `uid` is unknown.
    pub fn annotate_sink(&mut self, uid: &str, label: &str) -> bool {
        match self.compounds.get_mut(uid) {
            Some(compound) => {
                compound.add_cid(label);
                compound.is_sink = true;
                true
            }
            None => false,
        }
    }

    /// Mark a compound as sink without attaching a label.
    pub fn mark_sink(&mut self, uid: &str) -> bool {
        match self.compounds.get_mut(uid) {
            Some(compound) => {
                compound.is_sink = true;
                true
            }
            None => false,
        }
    }

    /// Promote the compound registered under `smiles` to target status.
    ///
    /// The compound is re-keyed with a fresh id from the target allocator.
    /// Returns the new id, or `None` when the compound is unknown, was
    /// already promoted (the first promotion wins), or the new id is taken.
    pub fn promote_to_target(&mut self, smiles: &str) -> Option<String> {
        let old_uid = self.key_to_id.get(smiles)?.clone();
        if self.compounds.get(&old_uid)?.is_target {
            return None;
        }
        let new_uid = self.target_ids.next_id();
        if !self.rekey(&old_uid, new_uid.clone()) {
            tracing::warn!(uid = %old_uid, target_id = %new_uid, "target id already in use");
            return None;
        }
        Some(new_uid)
    }

    /// Re-key a compound under `new_uid` and flag it as target.
    ///
    /// Returns `false` if `old_uid` is unknown or `new_uid` is taken.
    pub fn rekey(&mut self, old_uid: &str, new_uid: String) -> bool {
        if self.compounds.contains_key(&new_uid) {
            return false;
        }
        let Some(mut compound) = self.compounds.remove(old_uid) else {
            return false;
        };
        compound.uid = new_uid.clone();
        compound.is_target = true;
        self.key_to_id
            .insert(compound.original_smiles.clone(), new_uid.clone());
        self.compounds.insert(new_uid, compound);
        true
    }

    /// Record an InChI seen for the compound, if none is known yet.
    pub fn record_inchi(&mut self, uid: &str, inchi: &str) {
        if inchi.is_empty() {
            return;
        }
        if let Some(compound) = self.compounds.get_mut(uid) {
            compound.descriptors.inchi.get_or_insert_with(|| inchi.to_string());
        }
    }

    /// Replace the descriptors of a compound. The identity key is unchanged.
    pub fn set_descriptors(&mut self, uid: &str, descriptors: Descriptors) -> bool {
        match self.compounds.get_mut(uid) {
            Some(compound) => {
                compound.descriptors = descriptors;
                true
            }
            None => false,
        }
    }

    /// External labels for `uid` in display order, or `[uid]` if it has none.
    pub fn labels_for(&self, uid: &str) -> Vec<String> {
        self.compounds
            .get(uid)
            .map(Compound::labels)
            .unwrap_or_else(|| vec![uid.to_string()])
    }

    /// Iterate over compounds in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Compound> {
        self.compounds.values()
    }

    /// Number of registered compounds.
    pub fn len(&self) -> usize {
        self.compounds.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.compounds.is_empty()
    }
}

impl Default for StructureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StructureRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureRegistry")
            .field("compounds", &self.compounds.len())
            .field("targets", &self.iter().filter(|c| c.is_target).count())
            .finish()
    }
}
