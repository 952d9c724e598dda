//! A set of opaque string identifiers with the usual set algebra.
//!
//! Iteration order is unspecified. Callers that need a stable order (printing,
//! writing files) should use [`StringSet::sorted`].

use std::collections::HashSet;
use std::collections::hash_set;
use std::fmt::{Display, Formatter, Result as FmtResult};

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AclError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringSet {
    data: HashSet<String>,
}

impl StringSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from any sequence of items, dropping duplicates.
    pub fn from_slice<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        items.into_iter().map(Into::into).collect()
    }

    /// Add an element. No effect if it is already present.
    pub fn add(&mut self, item: impl Into<String>) {
        self.data.insert(item.into());
    }

    pub fn add_slice<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data.extend(items.into_iter().map(Into::into));
    }

    /// Remove an element if present.
    pub fn discard(&mut self, item: &str) {
        self.data.remove(item);
    }

    /// Remove an element that must be present.
    pub fn remove(&mut self, item: &str) -> Result<(), AclError> {
        if self.data.remove(item) {
            Ok(())
        } else {
            Err(AclError::NotFound(item.to_string()))
        }
    }

    /// Remove and return an arbitrary element, `None` when empty.
    pub fn pop(&mut self) -> Option<String> {
        let item = self.data.iter().next()?.clone();
        self.data.remove(&item);
        Some(item)
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn has(&self, item: &str) -> bool {
        self.data.contains(item)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> hash_set::Iter<'_, String> {
        self.data.iter()
    }

    /// Contents in unspecified order.
    pub fn as_slice(&self) -> Vec<String> {
        self.data.iter().cloned().collect()
    }

    /// Contents in lexical order.
    pub fn sorted(&self) -> Vec<String> {
        self.data.iter().sorted().cloned().collect()
    }

    pub fn union(&self, other: &StringSet) -> StringSet {
        self.data.union(&other.data).cloned().collect()
    }

    pub fn intersection(&self, other: &StringSet) -> StringSet {
        self.data.intersection(&other.data).cloned().collect()
    }

    pub fn difference(&self, other: &StringSet) -> StringSet {
        self.data.difference(&other.data).cloned().collect()
    }

    pub fn symmetric_difference(&self, other: &StringSet) -> StringSet {
        self.data
            .symmetric_difference(&other.data)
            .cloned()
            .collect()
    }

    pub fn union_update(&mut self, other: &StringSet) {
        self.data.extend(other.data.iter().cloned());
    }

    pub fn intersection_update(&mut self, other: &StringSet) {
        self.data.retain(|item| other.has(item));
    }

    pub fn difference_update(&mut self, other: &StringSet) {
        self.data.retain(|item| !other.has(item));
    }

    pub fn symmetric_difference_update(&mut self, other: &StringSet) {
        for item in &other.data {
            if !self.data.remove(item) {
                self.data.insert(item.clone());
            }
        }
    }

    pub fn is_subset(&self, other: &StringSet) -> bool {
        self.data.is_subset(&other.data)
    }

    pub fn is_superset(&self, other: &StringSet) -> bool {
        self.data.is_superset(&other.data)
    }

    pub fn is_disjoint(&self, other: &StringSet) -> bool {
        self.data.is_disjoint(&other.data)
    }

    pub fn equals(&self, other: &StringSet) -> bool {
        self.data == other.data
    }

    /// True if `items` contains exactly this set's elements, ignoring duplicates.
    pub fn equals_slice<S: AsRef<str>>(&self, items: &[S]) -> bool {
        self.equals(&StringSet::from_slice(items.iter().map(|item| item.as_ref())))
    }
}

impl Display for StringSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.sorted().join(","))
    }
}

impl<S: Into<String>> FromIterator<S> for StringSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        StringSet {
            data: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for StringSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.add_slice(iter);
    }
}

impl IntoIterator for StringSet {
    type Item = String;
    type IntoIter = hash_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a> IntoIterator for &'a StringSet {
    type Item = &'a String;
    type IntoIter = hash_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

// Serialized as a sorted array so rendered output is stable.
impl Serialize for StringSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.data.iter().sorted())
    }
}

impl<'de> Deserialize<'de> for StringSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<String>::deserialize(deserializer).map(StringSet::from_slice)
    }
}
