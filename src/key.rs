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

//! Canonical structural fingerprints.
//!
//! The key renders kinds, scalar attributes and child structure into a
//! stable string, ignoring comments, source locations and property
//! metadata. The template instance cache and the serializers share it.
//!
//! Two structurally equal subtrees always produce the same key. The
//! converse does not hold for the consumer: the instance cache re-checks a
//! key hit with [`structural_equals`](crate::structural_equals) before
//! trusting it.

use crate::{
    arena::{
        NodeId,
        Tree,
    },
    nodes::Slot,
};
use std::fmt::Write as _;

/// Fingerprint of the subtree rooted at `id`.
#[must_use]
pub fn object_key(tree: &Tree, id: NodeId) -> String {
    let mut out = String::new();
    write_key(tree, id, &mut out);
    out
}

/// Fingerprint of an ordered node list, e.g. a template-argument list.
#[must_use]
pub fn list_key(tree: &Tree, ids: &[NodeId]) -> String {
    let mut out = String::new();
    for &id in ids {
        write_key(tree, id, &mut out);
    }
    out
}

fn write_key(tree: &Tree, id: NodeId, out: &mut String) {
    let payload = tree.payload(id);

    // The scalar signature: the payload with child slots emptied. Its Debug
    // form is stable and covers every attribute, including names.
    let mut sig = payload.clone();
    for slot in sig.slots_mut() {
        match slot {
            crate::nodes::SlotMut::One(_, child) => *child = None,
            crate::nodes::SlotMut::List(_, children) => children.clear(),
        }
    }
    let _ = write!(out, "({:?}", sig);

    for slot in payload.slots() {
        match slot {
            Slot::One(name, child) => match child {
                Some(child) => {
                    let _ = write!(out, " {name}=");
                    write_key(tree, *child, out);
                }
                None => {
                    let _ = write!(out, " {name}=-");
                }
            },
            Slot::List(name, children) => {
                let _ = write!(out, " {name}=[");
                for child in children {
                    write_key(tree, *child, out);
                }
                out.push(']');
            }
        }
    }
    out.push(')');
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
    use crate::arena::CodeInfo;

    #[test]
    fn key_ignores_code_info_and_comments() {
        let mut tree = Tree::new();
        let a1 = tree.alloc(Identifier::new("n"));
        let b1 = tree.alloc(IntValue::new(8));
        let e1 = tree.alloc(Expression::new(Operator::Plus, a1, Some(b1)));

        let a2 = tree.alloc(Identifier::new("n"));
        let b2 = tree.alloc(IntValue::new(8));
        let e2 = tree.alloc(Expression::new(Operator::Plus, a2, Some(b2)));
        tree.node_mut(e2).code_info = Some(CodeInfo {
            file: "design.vhd".to_owned(),
            line: 12,
            column: 3,
        });
        tree.node_mut(e2).comments.push("spilled".to_owned());

        assert_eq!(object_key(&tree, e1), object_key(&tree, e2));
    }

    #[test]
    fn key_distinguishes_attributes_and_structure() {
        let mut tree = Tree::new();
        let a = tree.alloc(IntValue::new(8));
        let b = tree.alloc(IntValue::new(9));
        assert_ne!(object_key(&tree, a), object_key(&tree, b));

        let one = tree.alloc(IntValue::new(1));
        let only_op1 = tree.alloc(Expression {
            operator: Operator::Minus,
            op1: Some(one),
            op2: None,
        });
        let with_op2 = {
            let x = tree.alloc(IntValue::new(1));
            let y = tree.alloc(IntValue::new(1));
            tree.alloc(Expression::new(Operator::Minus, x, Some(y)))
        };
        assert_ne!(object_key(&tree, only_op1), object_key(&tree, with_op2));
    }
}
