use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use itertools::Itertools;

/// Sorted set of column positions.
pub type ColumnSet = BTreeSet<usize>;

/// Position of a node inside a provider tree, as the list of source indexes walked from the
/// root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self(vec![])
    }

    pub fn child(&self, idx: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(idx);
        Self(steps)
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "root")
        } else {
            write!(f, "root/{}", self.0.iter().join("/"))
        }
    }
}

/// Mapping from the column positions of a header before a rewrite to the positions of the
/// rewritten header.
///
/// A `None` entry means the column did not survive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColumnMap {
    entries: Vec<Option<usize>>,
}

impl ColumnMap {
    pub fn identity(len: usize) -> Self {
        Self {
            entries: (0..len).map(Some).collect(),
        }
    }

    /// Creates a map for `old_len` columns where only `kept` survive, renumbered densely in
    /// ascending order.
    pub fn dense<'a, I: IntoIterator<Item = &'a usize>>(old_len: usize, kept: I) -> Self {
        let mut entries = vec![None; old_len];
        for (new, old) in kept.into_iter().sorted().dedup().enumerate() {
            if *old < old_len {
                entries[*old] = Some(new);
            }
        }
        Self { entries }
    }

    pub fn from_entries(entries: Vec<Option<usize>>) -> Self {
        Self { entries }
    }

    pub fn get(&self, old: usize) -> Option<usize> {
        self.entries.get(old).copied().flatten()
    }

    /// Number of columns before the rewrite.
    pub fn old_len(&self) -> usize {
        self.entries.len()
    }

    /// Number of columns that survived.
    pub fn new_len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    pub fn is_identity(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(old, new)| *new == Some(old))
    }

    pub fn surviving(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(old, new)| new.map(|n| (old, n)))
    }

    /// Appends `other` after `self`, shifting the new positions of `other` by `offset`.
    pub fn concat(&self, other: &ColumnMap, offset: usize) -> ColumnMap {
        let entries = self
            .entries
            .iter()
            .copied()
            .chain(other.entries.iter().map(|e| e.map(|n| n + offset)))
            .collect();
        ColumnMap { entries }
    }

    /// Returns the map `old -> other[self[old]]`.
    pub fn then(&self, other: &ColumnMap) -> ColumnMap {
        let entries = self
            .entries
            .iter()
            .map(|e| e.and_then(|mid| other.get(mid)))
            .collect();
        ColumnMap { entries }
    }
}

impl Display for ColumnMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let pairs = self
            .surviving()
            .map(|(old, new)| format!("{}->{}", old, new))
            .join(", ");
        write!(f, "[{}]", pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_map() {
        let map = ColumnMap::dense(5, &[4, 0, 2]);
        assert_eq!(Some(0), map.get(0));
        assert_eq!(None, map.get(1));
        assert_eq!(Some(1), map.get(2));
        assert_eq!(Some(2), map.get(4));
        assert_eq!(3, map.new_len());
        assert!(!map.is_identity());
        assert!(ColumnMap::identity(3).is_identity());
    }

    #[test]
    fn test_concat_and_then() {
        let left = ColumnMap::dense(2, &[1]);
        let right = ColumnMap::identity(2);
        let combined = left.concat(&right, left.new_len());
        assert_eq!("[1->0, 2->1, 3->2]", combined.to_string());

        let narrowed = combined.then(&ColumnMap::dense(3, &[0, 2]));
        assert_eq!("[1->0, 3->1]", narrowed.to_string());
    }

    #[test]
    fn test_node_path_display() {
        assert_eq!("root", NodePath::root().to_string());
        assert_eq!("root/0/1", NodePath::root().child(0).child(1).to_string());
    }
}
