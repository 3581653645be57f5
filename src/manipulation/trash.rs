// Copyright 2024 Ryan McKenzie
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Scoped deferred deletion.
//!
//! Rewriting passes insert nodes they want gone into a [`Trash`] and flush
//! it when iteration is over, so nothing is destroyed mid-traversal. The
//! subsumption rule: when the trash holds both an ancestor and one of its
//! descendants, only the ancestor is destroyed.

use crate::arena::{
    NodeId,
    Tree,
};

#[derive(Default)]
pub struct Trash {
    holder: Vec<NodeId>,
}

impl Trash {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules one node. The node must be detached or a subtree root the
    /// pass is done with.
    pub fn insert(&mut self, node: NodeId) {
        if !self.holder.contains(&node) {
            self.holder.push(node);
        }
    }

    /// Schedules every element of a list slot, detaching each from its
    /// parent first.
    pub fn insert_list(&mut self, tree: &mut Tree, nodes: &[NodeId]) {
        for &node in nodes {
            tree.detach(node);
            self.insert(node);
        }
    }

    /// True when any stored root is `node` or an ancestor of it.
    #[must_use]
    pub fn contains(&self, tree: &Tree, node: NodeId) -> bool {
        self.holder
            .iter()
            .any(|&stored| tree.contains(stored) && tree.is_ancestor(stored, node))
    }

    /// Removes a specific root without deleting it.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if let Some(pos) = self.holder.iter().position(|&n| n == node) {
            self.holder.remove(pos);
            true
        } else {
            false
        }
    }

    /// Forgets everything without deleting anything.
    pub fn reset(&mut self) {
        self.holder.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.holder.is_empty()
    }

    /// Destroys the stored subtrees.
    ///
    /// An entry that is an ancestor of `safe` (the caller's current position
    /// in the tree) is kept for the next clear instead of being freed under
    /// the caller's feet. Entries subsumed by another stored entry are
    /// dropped without a separate free.
    pub fn clear(&mut self, tree: &mut Tree, safe: Option<NodeId>) {
        let entries = std::mem::take(&mut self.holder);
        let mut kept = Vec::new();
        'outer: for (i, &node) in entries.iter().enumerate() {
            if !tree.contains(node) {
                continue;
            }
            if let Some(safe) = safe {
                if tree.is_ancestor(node, safe) {
                    kept.push(node);
                    continue;
                }
            }
            for (j, &other) in entries.iter().enumerate() {
                if i != j && tree.contains(other) && other != node && tree.is_ancestor(other, node)
                {
                    // Subsumed: the ancestor's free covers this one.
                    continue 'outer;
                }
            }
            tree.detach(node);
            tree.free_subtree(node);
        }
        self.holder = kept;
    }
}

impl Drop for Trash {
    fn drop(&mut self) {
        // A pass must clear its trash explicitly; dropping entries silently
        // would leak detached subtrees in the arena.
        debug_assert!(
            self.holder.is_empty(),
            "trash dropped with {} pending entries",
            self.holder.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{
        Expression,
        Identifier,
        IntValue,
        Operator,
    };

    #[test]
    fn subsumption_frees_only_the_ancestor() {
        let mut tree = Tree::new();
        let a = tree.alloc(Identifier::new("a"));
        let b = tree.alloc(IntValue::new(1));
        let expr = tree.alloc(Expression::new(Operator::Plus, a, Some(b)));

        let mut trash = Trash::new();
        trash.insert(b);
        trash.insert(expr);
        assert!(trash.contains(&tree, a)); // via ancestor entry

        trash.clear(&mut tree, None);
        assert!(!tree.contains(expr));
        assert!(!tree.contains(a));
        assert!(!tree.contains(b)); // freed once, as part of the ancestor
        assert!(trash.is_empty());
    }

    #[test]
    fn safe_cursor_entries_survive_the_clear() {
        let mut tree = Tree::new();
        let a = tree.alloc(Identifier::new("a"));
        let b = tree.alloc(IntValue::new(1));
        let expr = tree.alloc(Expression::new(Operator::Plus, a, Some(b)));
        let standalone = tree.alloc(IntValue::new(2));

        let mut trash = Trash::new();
        trash.insert(expr);
        trash.insert(standalone);

        // `a` is inside `expr`, so `expr` must survive this clear.
        trash.clear(&mut tree, Some(a));
        assert!(tree.contains(expr));
        assert!(!tree.contains(standalone));

        trash.clear(&mut tree, None);
        assert!(!tree.contains(expr));
    }

    #[test]
    fn insert_list_detaches_elements() {
        let mut tree = Tree::new();
        let v1 = tree.alloc(IntValue::new(1));
        let v2 = tree.alloc(IntValue::new(2));
        let agg = tree.alloc(crate::nodes::Aggregate {
            alts: Vec::new(),
            others: None,
        });
        // Build a list parent by hand.
        let alt1 = tree.alloc(crate::nodes::AggregateAlt {
            indices: vec![v1],
            value: Some(v2),
        });
        if let crate::nodes::Payload::Aggregate(a) = tree.payload_mut(agg) {
            a.alts.push(alt1);
        }
        tree.relink_children(agg);

        let mut trash = Trash::new();
        let alts = match tree.payload(agg) {
            crate::nodes::Payload::Aggregate(a) => a.alts.clone(),
            _ => unreachable!(),
        };
        trash.insert_list(&mut tree, &alts);
        if let crate::nodes::Payload::Aggregate(a) = tree.payload(agg) {
            assert!(a.alts.is_empty());
        }
        trash.clear(&mut tree, None);
        assert!(!tree.contains(alt1));
        assert!(tree.contains(agg));
    }
}
