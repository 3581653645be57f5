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

//! Structural equality over subtrees.

use crate::{
    arena::{
        NodeId,
        Tree,
    },
    nodes::{
        Payload,
        Slot,
    },
};

/// Options controlling what [`structural_equals`] compares.
#[derive(Clone, Copy, Debug)]
pub struct EqualsOptions {
    /// Compare source locations. Default: false.
    pub check_code_infos: bool,
    /// Compare properties (names and value subtrees). Default: false.
    pub check_properties: bool,
    /// Compare comment lists. Default: false.
    pub check_comments: bool,
    /// Distinguish constexpr from non-constexpr types. Default: true.
    pub check_constexpr_flag: bool,
    /// Compare span slots of types. Default: true.
    pub check_spans: bool,
}

impl Default for EqualsOptions {
    fn default() -> Self {
        Self {
            check_code_infos: false,
            check_properties: false,
            check_comments: false,
            check_constexpr_flag: true,
            check_spans: true,
        }
    }
}

/// Payload with every child slot emptied, leaving only the scalar
/// attributes. Presence of children is compared separately, slot by slot.
fn scalar_signature(payload: &Payload, opt: &EqualsOptions) -> Payload {
    let mut sig = payload.clone();
    for slot in sig.slots_mut() {
        match slot {
            crate::nodes::SlotMut::One(_, child) => *child = None,
            crate::nodes::SlotMut::List(_, children) => children.clear(),
        }
    }
    if !opt.check_constexpr_flag {
        sig.set_constexpr(false);
    }
    sig
}

impl Payload {
    /// The constexpr flag of simple types, when the kind carries one.
    #[must_use]
    pub fn constexpr_flag(&self) -> Option<bool> {
        match self {
            Self::Bit(x) => Some(x.constexpr),
            Self::Bool(x) => Some(x.constexpr),
            Self::Char(x) => Some(x.constexpr),
            Self::Int(x) => Some(x.constexpr),
            Self::Real(x) => Some(x.constexpr),
            Self::Bitvector(x) => Some(x.constexpr),
            Self::Signed(x) => Some(x.constexpr),
            Self::Unsigned(x) => Some(x.constexpr),
            Self::String(x) => Some(x.constexpr),
            Self::Time(x) => Some(x.constexpr),
            _ => None,
        }
    }

    pub fn set_constexpr(&mut self, value: bool) {
        match self {
            Self::Bit(x) => x.constexpr = value,
            Self::Bool(x) => x.constexpr = value,
            Self::Char(x) => x.constexpr = value,
            Self::Int(x) => x.constexpr = value,
            Self::Real(x) => x.constexpr = value,
            Self::Bitvector(x) => x.constexpr = value,
            Self::Signed(x) => x.constexpr = value,
            Self::Unsigned(x) => x.constexpr = value,
            Self::String(x) => x.constexpr = value,
            Self::Time(x) => x.constexpr = value,
            _ => {}
        }
    }
}

/// Compares the subtrees rooted at `a` and `b` structurally: same kinds,
/// same scalar attributes, same slot shapes, recursively equal children.
#[must_use]
pub fn structural_equals(tree: &Tree, a: NodeId, b: NodeId, opt: &EqualsOptions) -> bool {
    if a == b {
        return true;
    }
    let node_a = tree.node(a);
    let node_b = tree.node(b);

    if scalar_signature(&node_a.payload, opt) != scalar_signature(&node_b.payload, opt) {
        return false;
    }

    if opt.check_code_infos && node_a.code_info != node_b.code_info {
        return false;
    }
    if opt.check_comments && node_a.comments != node_b.comments {
        return false;
    }
    if opt.check_properties {
        if node_a.properties.len() != node_b.properties.len() {
            return false;
        }
        for (pa, pb) in node_a.properties.iter().zip(&node_b.properties) {
            if pa.name != pb.name {
                return false;
            }
            match (pa.value, pb.value) {
                (None, None) => {}
                (Some(va), Some(vb)) => {
                    if !structural_equals(tree, va, vb, opt) {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }

    let slots_a = node_a.payload.slots();
    let slots_b = node_b.payload.slots();
    debug_assert_eq!(slots_a.len(), slots_b.len());
    for (sa, sb) in slots_a.iter().zip(slots_b.iter()) {
        if !opt.check_spans && sa.name() == "SPAN" {
            continue;
        }
        match (sa, sb) {
            (Slot::One(_, ca), Slot::One(_, cb)) => match (ca, cb) {
                (None, None) => {}
                (Some(ca), Some(cb)) => {
                    if !structural_equals(tree, *ca, *cb, opt) {
                        return false;
                    }
                }
                _ => return false,
            },
            (Slot::List(_, la), Slot::List(_, lb)) => {
                if la.len() != lb.len() {
                    return false;
                }
                for (ca, cb) in la.iter().zip(lb.iter()) {
                    if !structural_equals(tree, *ca, *cb, opt) {
                        return false;
                    }
                }
            }
            _ => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{
        Bitvector,
        Expression,
        Identifier,
        IntValue,
        Operator,
        Payload,
    };

    fn bv(tree: &mut Tree, left: i64, constexpr: bool) -> NodeId {
        let l = tree.alloc(IntValue::new(left));
        let r = tree.alloc(IntValue::new(0));
        let span = tree.alloc(crate::nodes::Range::new(
            crate::nodes::RangeDirection::Downto,
            l,
            r,
        ));
        tree.alloc(Bitvector {
            span: Some(span),
            logic: true,
            resolved: true,
            signed: false,
            constexpr,
            variant: crate::nodes::TypeVariant::Native,
        })
    }

    #[test]
    fn equal_expressions_compare_equal() {
        let mut tree = Tree::new();
        let a1 = tree.alloc(Identifier::new("a"));
        let b1 = tree.alloc(IntValue::new(2));
        let e1 = tree.alloc(Expression::new(Operator::Plus, a1, Some(b1)));

        let a2 = tree.alloc(Identifier::new("a"));
        let b2 = tree.alloc(IntValue::new(2));
        let e2 = tree.alloc(Expression::new(Operator::Plus, a2, Some(b2)));

        assert!(structural_equals(&tree, e1, e2, &EqualsOptions::default()));

        let Payload::Expression(e) = tree.payload_mut(e2) else {
            unreachable!();
        };
        e.operator = Operator::Minus;
        assert!(!structural_equals(&tree, e1, e2, &EqualsOptions::default()));
    }

    #[test]
    fn constexpr_flag_can_be_ignored() {
        let mut tree = Tree::new();
        let t1 = bv(&mut tree, 7, true);
        let t2 = bv(&mut tree, 7, false);
        assert!(!structural_equals(&tree, t1, t2, &EqualsOptions::default()));
        let opt = EqualsOptions {
            check_constexpr_flag: false,
            ..EqualsOptions::default()
        };
        assert!(structural_equals(&tree, t1, t2, &opt));
    }

    #[test]
    fn spans_can_be_ignored() {
        let mut tree = Tree::new();
        let t1 = bv(&mut tree, 7, false);
        let t2 = bv(&mut tree, 15, false);
        assert!(!structural_equals(&tree, t1, t2, &EqualsOptions::default()));
        let opt = EqualsOptions {
            check_spans: false,
            ..EqualsOptions::default()
        };
        assert!(structural_equals(&tree, t1, t2, &opt));
    }
}
