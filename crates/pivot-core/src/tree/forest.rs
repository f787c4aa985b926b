//! Id-keyed index over a flat entry list.
//!
//! Entries are addressed by position; parent/child links are resolved once
//! through an id map. Orphans (parent id not present) become roots. Entries
//! caught in a parent cycle are unreachable from any root and never emitted.

use std::collections::HashMap;

use pivot_types::Entry;

pub(crate) struct Forest<'a> {
    pub entries: Vec<&'a Entry>,
    pub index_by_id: HashMap<&'a str, usize>,
    pub parent: Vec<Option<usize>>,
    /// Children in log order.
    pub children: Vec<Vec<usize>>,
    /// Roots in log order.
    pub roots: Vec<usize>,
}

impl<'a> Forest<'a> {
    pub fn build(forest: &'a [Entry]) -> Self {
        let mut entries: Vec<&'a Entry> = Vec::with_capacity(forest.len());
        let mut index_by_id: HashMap<&'a str, usize> = HashMap::with_capacity(forest.len());

        for entry in forest {
            if index_by_id.contains_key(entry.id.as_str()) {
                tracing::warn!(id = %entry.id, "duplicate entry id; keeping the first occurrence");
                continue;
            }
            index_by_id.insert(entry.id.as_str(), entries.len());
            entries.push(entry);
        }

        let mut parent = vec![None; entries.len()];
        let mut children = vec![Vec::new(); entries.len()];
        let mut roots = Vec::new();

        for (idx, entry) in entries.iter().enumerate() {
            match entry
                .parent_id
                .as_deref()
                .and_then(|pid| index_by_id.get(pid).copied())
            {
                Some(parent_idx) if parent_idx != idx => {
                    parent[idx] = Some(parent_idx);
                    children[parent_idx].push(idx);
                }
                _ => roots.push(idx),
            }
        }

        Self {
            entries,
            index_by_id,
            parent,
            children,
            roots,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn lookup(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    /// Pre-order list of every node reachable from a root.
    pub fn preorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.children[idx].iter().rev().copied());
        }
        order
    }

    /// Per node: does its subtree contain `leaf`? Computed bottom-up by
    /// visiting the pre-order list in reverse.
    pub fn contains_leaf(&self, leaf: Option<usize>) -> Vec<bool> {
        let mut flags = vec![false; self.len()];
        let Some(leaf) = leaf else {
            return flags;
        };
        for idx in self.preorder().into_iter().rev() {
            flags[idx] = idx == leaf || self.children[idx].iter().any(|&child| flags[child]);
        }
        flags
    }

    /// Ids on the path from `leaf` up to its root, following unfiltered parent links.
    pub fn ancestry(&self, leaf: Option<usize>) -> Vec<bool> {
        let mut on_path = vec![false; self.len()];
        let mut current = leaf;
        while let Some(idx) = current {
            if on_path[idx] {
                break;
            }
            on_path[idx] = true;
            current = self.parent[idx];
        }
        on_path
    }
}
