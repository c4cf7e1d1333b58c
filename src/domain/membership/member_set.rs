//! Insertion-ordered set used for both membership indexes

use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored list contained the same entry twice
#[derive(Debug, Error, Clone, PartialEq)]
#[error("duplicate entry in member set: {0}")]
pub struct DuplicateMember(pub String);

/// Ordered set of identifiers.
///
/// Keeps the order entries were inserted in and refuses duplicates, so the
/// uniqueness of forward and reverse index entries holds by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<T>",
    into = "Vec<T>",
    bound(
        serialize = "T: Serialize + Clone",
        deserialize = "T: Deserialize<'de> + Eq + Hash + Clone + std::fmt::Display"
    )
)]
pub struct MemberSet<T>
where
    T: Eq + Hash + Clone,
{
    order: Vec<T>,
    index: HashSet<T>,
}

impl<T> Default for MemberSet<T>
where
    T: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemberSet<T>
where
    T: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            index: HashSet::new(),
        }
    }

    /// Append an entry. Returns false, leaving the set untouched, if it is already present.
    pub fn insert(&mut self, item: T) -> bool {
        if !self.index.insert(item.clone()) {
            return false;
        }
        self.order.push(item);
        true
    }

    pub fn contains(&self, item: &T) -> bool {
        self.index.contains(item)
    }

    /// Remove an entry by moving the last entry into its slot.
    /// O(1) after lookup; does not keep the order of the remainder.
    pub fn swap_remove(&mut self, item: &T) -> bool {
        if !self.index.remove(item) {
            return false;
        }
        if let Some(pos) = self.order.iter().position(|x| x == item) {
            self.order.swap_remove(pos);
        }
        true
    }

    /// Remove an entry, keeping the relative order of the remainder.
    pub fn shift_remove(&mut self, item: &T) -> bool {
        if !self.index.remove(item) {
            return false;
        }
        self.order.retain(|x| x != item);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.order.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.order
    }

    pub fn into_vec(self) -> Vec<T> {
        self.order
    }
}

impl<T> PartialEq for MemberSet<T>
where
    T: Eq + Hash + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
    }
}

impl<T> Eq for MemberSet<T> where T: Eq + Hash + Clone {}

impl<T> TryFrom<Vec<T>> for MemberSet<T>
where
    T: Eq + Hash + Clone + std::fmt::Display,
{
    type Error = DuplicateMember;

    fn try_from(items: Vec<T>) -> Result<Self, Self::Error> {
        let mut set = Self::new();

        for item in items {
            let label = item.to_string();

            if !set.insert(item) {
                return Err(DuplicateMember(label));
            }
        }

        Ok(set)
    }
}

impl<T> From<MemberSet<T>> for Vec<T>
where
    T: Eq + Hash + Clone,
{
    fn from(set: MemberSet<T>) -> Self {
        set.order
    }
}

/// Collecting keeps the first occurrence of each entry.
impl<T> FromIterator<T> for MemberSet<T>
where
    T: Eq + Hash + Clone,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}

impl<'a, T> IntoIterator for &'a MemberSet<T>
where
    T: Eq + Hash + Clone,
{
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}

impl<T> IntoIterator for MemberSet<T>
where
    T: Eq + Hash + Clone,
{
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.into_iter()
    }
}
