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

//! Deep structural copy with a configurable policy.

use crate::{
    arena::{
        Node,
        NodeId,
        Tree,
    },
    nodes::SlotMut,
};

/// Hook invoked on every `(source, destination)` pair, post-order. Returning
/// `Some(replacement)` discards the fresh copy in favor of the replacement.
pub type CopyHook<'a> = &'a mut dyn FnMut(&mut Tree, NodeId, NodeId) -> Option<NodeId>;

/// Policy for [`copy_subtree`].
#[derive(Default)]
pub struct CopyOptions<'a> {
    /// Copy structural children recursively; a shallow shell otherwise.
    /// Default: true (see [`CopyOptions::default`]).
    pub copy_child_objects: bool,
    /// Copy properties (with their value subtrees). Default: true.
    pub copy_properties: bool,
    /// Copy comments. Default: true.
    pub copy_comments: bool,
    /// Copy source locations. Default: true.
    pub copy_code_infos: bool,
    /// Duplicate cached semantic types onto the copies. Default: false.
    pub copy_semantic_types: bool,
    /// Alias cached declaration targets onto the copies. Default: true.
    pub copy_declarations: bool,
    pub user_hook: Option<CopyHook<'a>>,
}

impl CopyOptions<'_> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            copy_child_objects: true,
            copy_properties: true,
            copy_comments: true,
            copy_code_infos: true,
            copy_semantic_types: false,
            copy_declarations: true,
            user_hook: None,
        }
    }
}

/// Deep-copies the subtree rooted at `src`; the copy is detached.
pub fn copy_subtree(tree: &mut Tree, src: NodeId, opt: &mut CopyOptions<'_>) -> NodeId {
    copy_rec(tree, src, opt)
}

/// Copies a node list element-wise; the copies are detached, in order.
pub fn copy_list(tree: &mut Tree, src: &[NodeId], opt: &mut CopyOptions<'_>) -> Vec<NodeId> {
    src.iter().map(|&id| copy_rec(tree, id, opt)).collect()
}

fn copy_rec(tree: &mut Tree, src: NodeId, opt: &mut CopyOptions<'_>) -> NodeId {
    let (mut payload, code_info, comments, additional_keywords, properties) = {
        let node = tree.node(src);
        (
            node.payload.clone(),
            if opt.copy_code_infos {
                node.code_info.clone()
            } else {
                None
            },
            if opt.copy_comments {
                node.comments.clone()
            } else {
                Vec::new()
            },
            node.additional_keywords.clone(),
            if opt.copy_properties {
                node.properties.clone()
            } else {
                Vec::new()
            },
        )
    };

    // Rewrite the cloned payload's child slots to fresh copies (or empty
    // them for a shallow shell). The recursion happens outside the slot
    // borrow; slot order is deterministic, so a flat queue lines up.
    if opt.copy_child_objects {
        let mut originals: Vec<NodeId> = Vec::new();
        payload.for_each_child(&mut |c| originals.push(c));
        let mut copies = Vec::with_capacity(originals.len());
        for c in originals {
            copies.push(copy_rec(tree, c, opt));
        }
        let mut next = copies.into_iter();
        for slot in payload.slots_mut() {
            match slot {
                SlotMut::One(_, child) => {
                    if child.is_some() {
                        *child = Some(next.next().expect("copy arity mismatch"));
                    }
                }
                SlotMut::List(_, children) => {
                    for child in children.iter_mut() {
                        *child = next.next().expect("copy arity mismatch");
                    }
                }
            }
        }
    } else {
        for slot in payload.slots_mut() {
            match slot {
                SlotMut::One(_, child) => *child = None,
                SlotMut::List(_, children) => children.clear(),
            }
        }
    }

    let mut fresh_properties = Vec::with_capacity(properties.len());
    for prop in properties {
        let value = prop.value.map(|v| copy_rec(tree, v, opt));
        fresh_properties.push(crate::arena::Property {
            name: prop.name,
            value,
        });
    }

    let dst = tree.alloc_node(Node {
        payload,
        parent: None,
        code_info,
        properties: fresh_properties,
        comments,
        additional_keywords,
    });

    if opt.copy_semantic_types {
        if let Some(&cached) = tree.type_cache.get(&src) {
            // Cached types never carry hooks or further caches of interest.
            let mut plain = CopyOptions::new();
            let ty_copy = copy_rec(tree, cached, &mut plain);
            tree.type_cache.insert(dst, ty_copy);
        }
    }
    if opt.copy_declarations {
        if let Some(&target) = tree.decl_cache.get(&src) {
            tree.decl_cache.insert(dst, target);
        }
    }

    if let Some(hook) = opt.user_hook.as_mut() {
        if let Some(replacement) = hook(tree, src, dst) {
            if replacement != dst {
                tree.free_subtree(dst);
                return replacement;
            }
        }
    }

    dst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        nodes::{
            Expression,
            Identifier,
            IntValue,
            Operator,
            Payload,
        },
        structural_equals,
        EqualsOptions,
    };

    #[test]
    fn copy_is_structurally_equal() {
        let mut tree = Tree::new();
        let a = tree.alloc(Identifier::new("a"));
        let b = tree.alloc(IntValue::new(2));
        let expr = tree.alloc(Expression::new(Operator::Plus, a, Some(b)));
        tree.node_mut(expr).comments.push("note".to_owned());

        let copy = copy_subtree(&mut tree, expr, &mut CopyOptions::new());
        assert_ne!(copy, expr);
        let opt = EqualsOptions {
            check_comments: true,
            check_properties: true,
            check_code_infos: true,
            ..EqualsOptions::default()
        };
        assert!(structural_equals(&tree, expr, copy, &opt));
        assert_eq!(tree.parent(copy), None);
        assert!(tree.check_parent_links(copy));
    }

    #[test]
    fn shallow_copy_has_no_children() {
        let mut tree = Tree::new();
        let a = tree.alloc(Identifier::new("a"));
        let b = tree.alloc(IntValue::new(2));
        let expr = tree.alloc(Expression::new(Operator::Plus, a, Some(b)));

        let mut opt = CopyOptions::new();
        opt.copy_child_objects = false;
        let copy = copy_subtree(&mut tree, expr, &mut opt);
        let Payload::Expression(e) = tree.payload(copy) else {
            unreachable!();
        };
        assert!(e.op1.is_none());
        assert!(e.op2.is_none());
    }

    #[test]
    fn user_hook_can_substitute_nodes() {
        let mut tree = Tree::new();
        let a = tree.alloc(Identifier::new("n"));
        let b = tree.alloc(IntValue::new(2));
        let expr = tree.alloc(Expression::new(Operator::Plus, a, Some(b)));

        let mut hook = |tree: &mut Tree, src: NodeId, _dst: NodeId| -> Option<NodeId> {
            if let Payload::Identifier(_) = tree.payload(src) {
                Some(tree.alloc(IntValue::new(16)))
            } else {
                None
            }
        };
        let mut opt = CopyOptions::new();
        opt.user_hook = Some(&mut hook);
        let copy = copy_subtree(&mut tree, expr, &mut opt);
        let Payload::Expression(e) = tree.payload(copy) else {
            unreachable!();
        };
        let Payload::IntValue(v) = tree.payload(e.op1.unwrap()) else {
            panic!("hook did not substitute");
        };
        assert_eq!(v.value, 16);
    }
}
