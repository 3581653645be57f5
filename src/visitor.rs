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

//! Guide traversal: the one hot path every pass uses.
//!
//! The walk descends into every child slot in schema order, list slots in
//! index order. A visitor dispatches on the node kind by matching on
//! [`Tree::payload`]; there is no per-kind method table, the tag match *is*
//! the dispatch.
//!
//! Replace-in-place is supported: when [`GuideVisitor::enter`] returns
//! [`VisitAction::Replace`], the framework swaps the replacement into the
//! slot of the visited node and continues from the replacement. List slots
//! are re-read through the tree on every step, so a visitor may also
//! remove or append elements behind the cursor.

use crate::{
    arena::{
        NodeId,
        Tree,
    },
    Result,
};

/// What to do after entering a node.
pub enum VisitAction {
    /// Visit the node's children.
    Descend,
    /// Do not visit the children.
    Skip,
    /// Swap the visited node for the given one (which must be detached) and
    /// continue by visiting the replacement.
    Replace(NodeId),
}

pub trait GuideVisitor {
    /// Called before the children of `id` are visited.
    fn enter(&mut self, tree: &mut Tree, id: NodeId) -> Result<VisitAction> {
        let _ = (tree, id);
        Ok(VisitAction::Descend)
    }

    /// Called after the children of `id` have been visited. Not called for
    /// nodes that were skipped or replaced.
    fn leave(&mut self, tree: &mut Tree, id: NodeId) -> Result<()> {
        let _ = (tree, id);
        Ok(())
    }
}

/// Drives `visitor` over the subtree rooted at `root`.
///
/// Returns the node that finally occupies the root position (different from
/// `root` when the visitor replaced it).
pub fn guide_visit<V: GuideVisitor + ?Sized>(
    visitor: &mut V,
    tree: &mut Tree,
    root: NodeId,
) -> Result<NodeId> {
    let mut current = root;
    loop {
        match visitor.enter(tree, current)? {
            VisitAction::Skip => return Ok(current),
            VisitAction::Replace(replacement) => {
                if tree.parent(current).is_some() {
                    tree.replace(current, replacement);
                }
                current = replacement;
                // Re-enter the replacement: subsequent visits at this slot
                // observe the new node.
            }
            VisitAction::Descend => break,
        }
    }

    visit_children(visitor, tree, current)?;
    visitor.leave(tree, current)?;
    Ok(current)
}

/// Visits the children of `id` without re-entering `id` itself. Useful for
/// visitors that match on a kind and want the default descent afterwards.
pub fn visit_children<V: GuideVisitor + ?Sized>(
    visitor: &mut V,
    tree: &mut Tree,
    id: NodeId,
) -> Result<()> {
    // Snapshot the slot layout: (slot index, position) pairs addressed
    // through the live tree each step, so replacements and removals behind
    // the cursor stay visible.
    let slot_count = tree.node(id).payload.slots().len();
    for slot_index in 0..slot_count {
        let mut position = 0;
        loop {
            let child = {
                let slots = tree.node(id).payload.slots();
                let Some(slot) = slots.get(slot_index) else {
                    break;
                };
                match slot {
                    crate::nodes::Slot::One(_, child) => {
                        if position > 0 {
                            break;
                        }
                        match child {
                            Some(c) => *c,
                            None => break,
                        }
                    }
                    crate::nodes::Slot::List(_, children) => match children.get(position) {
                        Some(c) => *c,
                        None => break,
                    },
                }
            };
            guide_visit(visitor, tree, child)?;
            position += 1;
        }
    }

    // Property values are owned children too.
    let mut prop_index = 0;
    loop {
        let value = {
            let props = &tree.node(id).properties;
            let Some(prop) = props.get(prop_index) else {
                break;
            };
            prop.value
        };
        if let Some(value) = value {
            guide_visit(visitor, tree, value)?;
        }
        prop_index += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{
        Expression,
        Identifier,
        IntValue,
        NodeKind,
        Operator,
        Payload,
    };

    struct Collector {
        kinds: Vec<NodeKind>,
    }

    impl GuideVisitor for Collector {
        fn enter(&mut self, tree: &mut Tree, id: NodeId) -> Result<VisitAction> {
            self.kinds.push(tree.kind(id));
            Ok(VisitAction::Descend)
        }
    }

    struct ReplaceIdentifiers;

    impl GuideVisitor for ReplaceIdentifiers {
        fn enter(&mut self, tree: &mut Tree, id: NodeId) -> Result<VisitAction> {
            if let Payload::Identifier(_) = tree.payload(id) {
                let replacement = tree.alloc(IntValue::new(0));
                return Ok(VisitAction::Replace(replacement));
            }
            Ok(VisitAction::Descend)
        }
    }

    #[test]
    fn descends_in_schema_order() {
        let mut tree = Tree::new();
        let a = tree.alloc(Identifier::new("a"));
        let b = tree.alloc(IntValue::new(1));
        let expr = tree.alloc(Expression::new(Operator::Plus, a, Some(b)));

        let mut collector = Collector { kinds: Vec::new() };
        guide_visit(&mut collector, &mut tree, expr).unwrap();
        assert_eq!(
            collector.kinds,
            [
                NodeKind::Expression,
                NodeKind::Identifier,
                NodeKind::IntValue
            ]
        );
    }

    #[test]
    fn replace_in_place_is_observable() {
        let mut tree = Tree::new();
        let a = tree.alloc(Identifier::new("a"));
        let b = tree.alloc(Identifier::new("b"));
        let expr = tree.alloc(Expression::new(Operator::Plus, a, Some(b)));

        guide_visit(&mut ReplaceIdentifiers, &mut tree, expr).unwrap();
        let Payload::Expression(e) = tree.payload(expr) else {
            unreachable!();
        };
        let op1 = e.op1.unwrap();
        let op2 = e.op2.unwrap();
        assert_eq!(tree.kind(op1), NodeKind::IntValue);
        assert_eq!(tree.kind(op2), NodeKind::IntValue);
        assert!(tree.check_parent_links(expr));
    }
}
