use std::collections::{BTreeMap, HashSet};
use std::fmt;

use kinspace_common::Pose;

use crate::error::CollisionError;
use crate::manager::IsContactAllowedFn;
use crate::object::CollisionObject;

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub object: CollisionObject,
    pub start: Pose,
    pub end: Pose,
}

/// Bookkeeping shared by the reference managers: named objects with poses,
/// the active list, the contact threshold and the allowed-contact filter.
///
/// Objects live in a `BTreeMap` so every listing is sorted and stable.
#[derive(Clone, Default)]
pub(crate) struct ObjectRegistry {
    entries: BTreeMap<String, Entry>,
    active: Vec<String>,
    contact_distance: f64,
    allowed: Option<IsContactAllowedFn>,
}

impl fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("objects", &self.entries.keys().collect::<Vec<_>>())
            .field("active", &self.active)
            .field("contact_distance", &self.contact_distance)
            .field("has_allowed_fn", &self.allowed.is_some())
            .finish()
    }
}

impl ObjectRegistry {
    pub fn add(&mut self, object: CollisionObject) -> Result<(), CollisionError> {
        object.validate()?;
        tracing::trace!(name = %object.name, shapes = object.shapes.len(), "add collision object");
        self.entries.insert(
            object.name.clone(),
            Entry {
                object,
                start: Pose::IDENTITY,
                end: Pose::IDENTITY,
            },
        );
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let removed = self.entries.remove(name).is_some();
        if removed {
            tracing::trace!(name, "remove collision object");
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.object.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.entries.get(name).map(|e| e.object.enabled)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn set_pose(&mut self, name: &str, start: Pose, end: Pose) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) => {
                entry.start = start;
                entry.end = end;
                true
            }
            None => false,
        }
    }

    pub fn set_active(&mut self, names: &[String]) {
        self.active = names.to_vec();
    }

    pub fn active(&self) -> &[String] {
        &self.active
    }

    pub fn set_contact_distance(&mut self, distance: f64) {
        self.contact_distance = distance;
    }

    pub fn contact_distance(&self) -> f64 {
        self.contact_distance
    }

    pub fn set_allowed(&mut self, allowed: Option<IsContactAllowedFn>) {
        self.allowed = allowed;
    }

    pub fn is_allowed(&self, a: &str, b: &str) -> bool {
        self.allowed.as_ref().is_some_and(|f| f(a, b))
    }

    /// Unordered pairs of enabled objects, at least one of them active, that
    /// the allowed-contact filter does not suppress. Pairs are ordered by
    /// name.
    pub fn candidate_pairs(&self) -> Vec<(String, String)> {
        let active: HashSet<&str> = self.active.iter().map(String::as_str).collect();
        let enabled: Vec<&str> = self
            .entries
            .values()
            .filter(|e| e.object.enabled)
            .map(|e| e.object.name.as_str())
            .collect();
        let mut pairs = Vec::new();
        for (i, a) in enabled.iter().enumerate() {
            for b in &enabled[i + 1..] {
                if !active.contains(a) && !active.contains(b) {
                    continue;
                }
                if self.is_allowed(a, b) {
                    continue;
                }
                pairs.push((a.to_string(), b.to_string()));
            }
        }
        pairs
    }
}
