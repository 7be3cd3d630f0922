use std::collections::BTreeMap;
use std::sync::Arc;

use kinspace_collision::IsContactAllowedFn;
use serde::{Deserialize, Serialize};

/// One allowed pair as it appears in serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedCollision {
    pub link1: String,
    pub link2: String,
    pub reason: String,
}

/// Symmetric table of link pairs whose contact is expected and ignored.
///
/// Each pair is stored once under its lexicographically ordered key, so
/// `(a, b)` and `(b, a)` are the same entry and iteration is deterministic.
/// Names are not checked against any tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<AllowedCollision>", into = "Vec<AllowedCollision>")]
pub struct AllowedCollisionMatrix {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

fn ordered<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

impl AllowedCollisionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the pair, overwriting the reason if it is already present.
    pub fn add_allowed_collision(&mut self, a: &str, b: &str, reason: impl Into<String>) {
        let (first, second) = ordered(a, b);
        self.entries
            .entry(first.to_string())
            .or_default()
            .insert(second.to_string(), reason.into());
    }

    /// Remove the pair if present.
    pub fn remove_allowed_collision(&mut self, a: &str, b: &str) {
        let (first, second) = ordered(a, b);
        if let Some(row) = self.entries.get_mut(first) {
            row.remove(second);
            if row.is_empty() {
                self.entries.remove(first);
            }
        }
    }

    pub fn is_collision_allowed(&self, a: &str, b: &str) -> bool {
        self.reason(a, b).is_some()
    }

    pub fn reason(&self, a: &str, b: &str) -> Option<&str> {
        let (first, second) = ordered(a, b);
        self.entries.get(first)?.get(second).map(String::as_str)
    }

    pub fn clear_allowed_collisions(&mut self) {
        self.entries.clear();
    }

    /// Every stored pair as `(first, second, reason)` with `first <= second`.
    pub fn all_allowed_collisions(&self) -> impl Iterator<Item = (&str, &str, &str)> + '_ {
        self.entries.iter().flat_map(|(first, row)| {
            row.iter()
                .map(move |(second, reason)| (first.as_str(), second.as_str(), reason.as_str()))
        })
    }

    /// Number of distinct pairs.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Frozen copy of the table as a contact-allowed predicate. Later edits
    /// to `self` do not reach the returned closure.
    pub fn contact_allowed_fn(&self) -> IsContactAllowedFn {
        let snapshot = self.clone();
        Arc::new(move |a: &str, b: &str| snapshot.is_collision_allowed(a, b))
    }
}

impl From<Vec<AllowedCollision>> for AllowedCollisionMatrix {
    fn from(list: Vec<AllowedCollision>) -> Self {
        let mut acm = Self::new();
        for entry in list {
            acm.add_allowed_collision(&entry.link1, &entry.link2, entry.reason);
        }
        acm
    }
}

impl From<AllowedCollisionMatrix> for Vec<AllowedCollision> {
    fn from(acm: AllowedCollisionMatrix) -> Self {
        acm.all_allowed_collisions()
            .map(|(link1, link2, reason)| AllowedCollision {
                link1: link1.to_string(),
                link2: link2.to_string(),
                reason: reason.to_string(),
            })
            .collect()
    }
}
