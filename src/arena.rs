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

//! Arena storage for AST nodes.
//!
//! Every tree owns a single [`Tree`] arena. Nodes are addressed by [`NodeId`]
//! handles (index plus generation); destroying a node bumps the slot
//! generation so stale handles are detected instead of dangling. Parent
//! back-links are maintained on every attach/detach, which keeps the
//! parent-consistency invariant checkable in O(1).

use crate::nodes::{
    NodeKind,
    Payload,
    Slot as ChildSlot,
};
use nonmax::NonMaxU32;
use rustc_hash::FxHashMap;

/// Handle to a node inside a [`Tree`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeId {
    index: NonMaxU32, // enables niche optimization
    generation: u32,
}

impl NodeId {
    fn new(index: u32, generation: u32) -> Self {
        let index = NonMaxU32::new(index).expect("arena index overflow");
        Self { index, generation }
    }

    fn index(self) -> usize {
        self.index.get() as usize
    }
}

/// Source position attached to a node.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CodeInfo {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// A named metadata entry owning an optional value node.
#[derive(Clone, Debug)]
pub struct Property {
    pub name: String,
    pub value: Option<NodeId>,
}

/// An AST node: common decoration plus the kind-specific payload.
#[derive(Clone, Debug)]
pub struct Node {
    pub payload: Payload,
    pub(crate) parent: Option<NodeId>,
    pub code_info: Option<CodeInfo>,
    pub properties: Vec<Property>,
    pub comments: Vec<String>,
    /// Extra target-language keywords; meaningful on declarations only.
    pub additional_keywords: Vec<String>,
}

impl Node {
    #[must_use]
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            parent: None,
            code_info: None,
            properties: Vec::new(),
            comments: Vec::new(),
            additional_keywords: Vec::new(),
        }
    }
}

struct ArenaSlot {
    generation: u32,
    node: Option<Node>,
}

/// The arena and the tree-level caches.
///
/// A tree is a single logical mutable scope: the arena, the declaration
/// cache, the semantic-type cache and the template instance cache all live
/// here and are invalidated together by the passes that touch them.
#[derive(Default)]
pub struct Tree {
    slots: Vec<ArenaSlot>,
    free: Vec<u32>,
    /// symbol node -> resolved declaration
    pub(crate) decl_cache: FxHashMap<NodeId, NodeId>,
    /// value node -> owned, detached semantic-type subtree
    pub(crate) type_cache: FxHashMap<NodeId, NodeId>,
    /// (templated declaration, argument fingerprint) -> instantiated copy
    pub(crate) instance_cache: FxHashMap<(NodeId, String), NodeId>,
}

impl Tree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a detached node and adopts the children already stored in
    /// its payload and properties.
    ///
    /// Panics if any referenced child is attached elsewhere (double
    /// ownership is corruption, not a recoverable error).
    pub fn alloc(&mut self, payload: impl Into<Payload>) -> NodeId {
        self.alloc_node(Node::new(payload.into()))
    }

    pub fn alloc_node(&mut self, node: Node) -> NodeId {
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                debug_assert!(slot.node.is_none());
                slot.node = Some(node);
                NodeId::new(index, slot.generation)
            }
            None => {
                let index = u32::try_from(self.slots.len()).expect("arena index overflow");
                self.slots.push(ArenaSlot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId::new(index, 0)
            }
        };
        self.adopt_children(id);
        id
    }

    /// True if `id` refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index())
            .is_some_and(|slot| slot.generation == id.generation && slot.node.is_some())
    }

    #[must_use]
    pub fn try_node(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    /// Panics on a stale handle; a dangling `NodeId` in a live tree is
    /// corruption.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        self.try_node(id).expect("stale node handle")
    }

    #[must_use]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        let slot = &mut self.slots[id.index()];
        assert_eq!(slot.generation, id.generation, "stale node handle");
        slot.node.as_mut().expect("stale node handle")
    }

    #[must_use]
    pub fn payload(&self, id: NodeId) -> &Payload {
        &self.node(id).payload
    }

    #[must_use]
    pub fn payload_mut(&mut self, id: NodeId) -> &mut Payload {
        &mut self.node_mut(id).payload
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).payload.kind()
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Number of live nodes. Linear; meant for tests and diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn adopt_children(&mut self, parent: NodeId) {
        let mut children = Vec::new();
        {
            let node = self.node(parent);
            node.payload.for_each_child(&mut |child| children.push(child));
            children.extend(node.properties.iter().filter_map(|p| p.value));
        }
        for child in children {
            let child_node = self.node_mut(child);
            assert!(
                child_node.parent.is_none() || child_node.parent == Some(parent),
                "node is already owned by another parent"
            );
            child_node.parent = Some(parent);
        }
    }

    /// Re-establishes the parent back-links of every child currently stored
    /// in `parent`'s slots. Call after editing a payload's child fields
    /// directly.
    pub fn relink_children(&mut self, parent: NodeId) {
        let mut children = Vec::new();
        {
            let node = self.node(parent);
            node.payload.for_each_child(&mut |child| children.push(child));
            children.extend(node.properties.iter().filter_map(|p| p.value));
        }
        for child in children {
            self.node_mut(child).parent = Some(parent);
        }
    }

    /// Removes `id` from its parent slot, leaving it detached. No-op on a
    /// node without a parent.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let removed = self.node_mut(parent).payload.remove_child_id(id);
        if !removed {
            // Property values are owned outside the payload slots.
            let props = &mut self.node_mut(parent).properties;
            for prop in props.iter_mut() {
                if prop.value == Some(id) {
                    prop.value = None;
                }
            }
        }
        self.node_mut(id).parent = None;
    }

    /// Swaps `new` into the slot currently holding `old`; `old` becomes
    /// detached. Returns false when `old` has no parent.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> bool {
        let Some(parent) = self.parent(old) else {
            return false;
        };
        assert!(
            self.parent(new).is_none(),
            "replacement node is already owned by another parent"
        );
        let swapped = self.node_mut(parent).payload.replace_child_id(old, new);
        if !swapped {
            let props = &mut self.node_mut(parent).properties;
            let mut found = false;
            for prop in props.iter_mut() {
                if prop.value == Some(old) {
                    prop.value = Some(new);
                    found = true;
                    break;
                }
            }
            if !found {
                panic!("parent does not own the node being replaced");
            }
        }
        self.node_mut(old).parent = None;
        self.node_mut(new).parent = Some(parent);
        true
    }

    /// Frees `id` and everything it owns: children, property values and the
    /// cached semantic types of every freed value node. Cache entries keyed
    /// by freed nodes are dropped.
    pub fn free_subtree(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            debug_assert!(
                !self.contains(parent) || !self.owns(parent, id),
                "freeing an attached node; detach it first"
            );
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            {
                let node = self.node(current);
                node.payload.for_each_child(&mut |child| stack.push(child));
                stack.extend(node.properties.iter().filter_map(|p| p.value));
            }
            if let Some(cached) = self.type_cache.remove(&current) {
                stack.push(cached);
            }
            self.decl_cache.remove(&current);
            let slot = &mut self.slots[current.index()];
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index.get());
        }
    }

    fn owns(&self, parent: NodeId, child: NodeId) -> bool {
        let mut found = false;
        self.node(parent)
            .payload
            .for_each_child(&mut |c| found |= c == child);
        found
            || self
                .node(parent)
                .properties
                .iter()
                .any(|p| p.value == Some(child))
    }

    /// True when `ancestor` is `node` or one of its transitive parents.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.try_node(id).and_then(|n| n.parent);
        }
        false
    }

    /// Nearest transitive parent (excluding `id` itself) matching `pred`.
    #[must_use]
    pub fn nearest_parent(
        &self,
        id: NodeId,
        mut pred: impl FnMut(&Payload) -> bool,
    ) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(candidate) = current {
            if pred(&self.node(candidate).payload) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    /// Pre-order listing of the subtree rooted at `id`, in schema order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let mut children = Vec::new();
            self.node(current)
                .payload
                .for_each_child(&mut |child| children.push(child));
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Named child slots of `id` in schema order.
    #[must_use]
    pub fn slots(&self, id: NodeId) -> smallvec::SmallVec<[ChildSlot<'_>; 4]> {
        self.node(id).payload.slots()
    }

    /// Forgets every memoized template instantiation. The instantiated
    /// copies stay in the tree; only the memo entries go. Long-running
    /// consumers call this between passes.
    pub fn flush_instance_cache(&mut self) {
        self.instance_cache.clear();
    }

    /// Verifies the parent-consistency invariant over the subtree at `root`.
    /// Intended for tests and debug assertions.
    pub fn check_parent_links(&self, root: NodeId) -> bool {
        for id in self.descendants(root) {
            let mut ok = true;
            self.node(id).payload.for_each_child(&mut |child| {
                ok &= self.try_node(child).is_some_and(|n| n.parent == Some(id));
            });
            if !ok {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{
        Identifier,
        IntValue,
    };

    #[test]
    fn stale_handles_are_detected() {
        let mut tree = Tree::new();
        let id = tree.alloc(IntValue::new(3));
        assert!(tree.contains(id));
        tree.free_subtree(id);
        assert!(!tree.contains(id));
        assert!(tree.try_node(id).is_none());

        // The slot is reused with a fresh generation.
        let other = tree.alloc(Identifier::new("x"));
        assert!(tree.contains(other));
        assert_ne!(id, other);
        assert!(!tree.contains(id));
    }

    #[test]
    fn alloc_adopts_payload_children() {
        let mut tree = Tree::new();
        let lhs = tree.alloc(Identifier::new("y"));
        let rhs = tree.alloc(IntValue::new(1));
        let assign = tree.alloc(crate::nodes::Assign {
            left: Some(lhs),
            right: Some(rhs),
            delay: None,
        });
        assert_eq!(tree.parent(lhs), Some(assign));
        assert_eq!(tree.parent(rhs), Some(assign));
        assert!(tree.check_parent_links(assign));
    }

    #[test]
    fn replace_preserves_slot_position() {
        let mut tree = Tree::new();
        let lhs = tree.alloc(Identifier::new("y"));
        let rhs = tree.alloc(Identifier::new("a"));
        let assign = tree.alloc(crate::nodes::Assign {
            left: Some(lhs),
            right: Some(rhs),
            delay: None,
        });
        let new_rhs = tree.alloc(IntValue::new(7));
        assert!(tree.replace(rhs, new_rhs));
        let crate::nodes::Payload::Assign(a) = tree.payload(assign) else {
            unreachable!();
        };
        assert_eq!(a.right, Some(new_rhs));
        assert_eq!(tree.parent(new_rhs), Some(assign));
        assert_eq!(tree.parent(rhs), None);
    }
}
