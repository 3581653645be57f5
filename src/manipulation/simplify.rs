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

//! Local constant folding.
//!
//! The passes lean on this after substituting template parameters: bound
//! identifiers collapse to their constants, casts of constants collapse to
//! retyped constants, and constant expressions fold, until range bounds
//! that must be concrete actually are.

use crate::{
    arena::{
        NodeId,
        Tree,
    },
    manipulation::{
        copy_subtree,
        transform_constant,
        CopyOptions,
    },
    nodes::{
        BitvectorValue,
        BoolValue,
        IntValue,
        Operator,
        Payload,
        RealValue,
    },
    resolver::resolve_symbol,
    semantics::LanguageSemantics,
};

#[derive(Clone, Copy, Debug)]
pub struct SimplifyOptions {
    /// Replace identifiers bound to value template parameters by their
    /// (constant) initial values.
    pub simplify_template_parameters: bool,
    /// Fold constant expressions.
    pub simplify_constants: bool,
    /// Collapse casts applied to constants.
    pub simplify_casts: bool,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            simplify_template_parameters: false,
            simplify_constants: true,
            simplify_casts: true,
        }
    }
}

/// Simplifies the subtree at `root` bottom-up. Returns the node occupying
/// the root position afterwards (a fold may replace the root itself).
pub fn simplify(
    tree: &mut Tree,
    root: NodeId,
    sem: &dyn LanguageSemantics,
    opt: &SimplifyOptions,
) -> NodeId {
    simplify_rec(tree, root, sem, opt)
}

fn simplify_rec(
    tree: &mut Tree,
    id: NodeId,
    sem: &dyn LanguageSemantics,
    opt: &SimplifyOptions,
) -> NodeId {
    // Children first; the slot layout is re-read every step because a fold
    // swaps nodes in place.
    let slot_count = tree.node(id).payload.slots().len();
    for slot_index in 0..slot_count {
        let mut position = 0;
        loop {
            let child = {
                let slots = tree.node(id).payload.slots();
                match slots.get(slot_index) {
                    Some(crate::nodes::Slot::One(_, c)) => {
                        if position > 0 {
                            break;
                        }
                        match c {
                            Some(c) => *c,
                            None => break,
                        }
                    }
                    Some(crate::nodes::Slot::List(_, cs)) => match cs.get(position) {
                        Some(c) => *c,
                        None => break,
                    },
                    None => break,
                }
            };
            simplify_rec(tree, child, sem, opt);
            position += 1;
        }
    }

    let Some(folded) = try_fold(tree, id, sem, opt) else {
        return id;
    };
    if tree.parent(id).is_some() {
        tree.replace(id, folded);
        crate::semantics::invalidate_types(tree, id);
        tree.free_subtree(id);
    } else {
        crate::semantics::invalidate_types(tree, id);
        tree.free_subtree(id);
    }
    folded
}

fn try_fold(
    tree: &mut Tree,
    id: NodeId,
    sem: &dyn LanguageSemantics,
    opt: &SimplifyOptions,
) -> Option<NodeId> {
    match tree.payload(id).clone() {
        Payload::Identifier(_) if opt.simplify_template_parameters => {
            let decl = resolve_symbol(tree, id, sem).ok()??;
            let Payload::ValueTp(vtp) = tree.payload(decl) else {
                return None;
            };
            let init = vtp.init?;
            if !tree.payload(init).is_const_value() {
                return None;
            }
            Some(copy_subtree(tree, init, &mut CopyOptions::new()))
        }
        Payload::Cast(cast) if opt.simplify_casts => {
            let (ty, value) = (cast.ty?, cast.value?);
            if !tree.payload(value).is_const_value() {
                return None;
            }
            transform_constant(tree, value, ty, sem, true)
        }
        Payload::Expression(expr) if opt.simplify_constants => {
            fold_expression(tree, &expr)
        }
        _ => None,
    }
}

fn fold_expression(tree: &mut Tree, expr: &crate::nodes::Expression) -> Option<NodeId> {
    let op = expr.operator;
    let op1 = expr.op1?;

    // Unary folds.
    let Some(op2) = expr.op2 else {
        return match (op, tree.payload(op1).clone()) {
            (Operator::Minus, Payload::IntValue(v)) => {
                Some(tree.alloc(IntValue::new(v.value.checked_neg()?)))
            }
            (Operator::Minus, Payload::RealValue(v)) => {
                Some(tree.alloc(RealValue::new(-v.value)))
            }
            (Operator::Plus, Payload::IntValue(v)) => Some(tree.alloc(IntValue::new(v.value))),
            (Operator::Abs, Payload::IntValue(v)) => {
                Some(tree.alloc(IntValue::new(v.value.checked_abs()?)))
            }
            (Operator::Not, Payload::BoolValue(v)) => {
                Some(tree.alloc(BoolValue::new(!v.value)))
            }
            _ => None,
        };
    };

    match (tree.payload(op1).clone(), tree.payload(op2).clone()) {
        (Payload::IntValue(a), Payload::IntValue(b)) => fold_ints(tree, op, a.value, b.value),
        (Payload::RealValue(a), Payload::RealValue(b)) => fold_reals(tree, op, a.value, b.value),
        (Payload::IntValue(a), Payload::RealValue(b)) => {
            fold_reals(tree, op, a.value as f64, b.value)
        }
        (Payload::RealValue(a), Payload::IntValue(b)) => {
            fold_reals(tree, op, a.value, b.value as f64)
        }
        (Payload::BoolValue(a), Payload::BoolValue(b)) => fold_bools(tree, op, a.value, b.value),
        (Payload::BitvectorValue(a), Payload::BitvectorValue(b)) => {
            match op {
                Operator::Concat => {
                    let mut joined = a.value.clone();
                    joined.push_str(&b.value);
                    Some(tree.alloc(BitvectorValue::new(&joined)))
                }
                Operator::Eq | Operator::CaseEq => {
                    Some(tree.alloc(BoolValue::new(a.value == b.value)))
                }
                Operator::Neq | Operator::CaseNeq => {
                    Some(tree.alloc(BoolValue::new(a.value != b.value)))
                }
                _ => None,
            }
        }
        _ => None,
    }
}

fn fold_ints(tree: &mut Tree, op: Operator, a: i64, b: i64) -> Option<NodeId> {
    let int = |tree: &mut Tree, v: i64| Some(tree.alloc(IntValue::new(v)));
    let boolean = |tree: &mut Tree, v: bool| Some(tree.alloc(BoolValue::new(v)));
    match op {
        Operator::Plus => int(tree, a.checked_add(b)?),
        Operator::Minus => int(tree, a.checked_sub(b)?),
        Operator::Mult => int(tree, a.checked_mul(b)?),
        Operator::Div => int(tree, a.checked_div(b)?),
        Operator::Mod => int(tree, a.checked_rem_euclid(b)?),
        Operator::Rem => int(tree, a.checked_rem(b)?),
        Operator::Pow => int(tree, a.checked_pow(u32::try_from(b).ok()?)?),
        Operator::BitAnd => int(tree, a & b),
        Operator::BitOr => int(tree, a | b),
        Operator::BitXor => int(tree, a ^ b),
        Operator::Sll => int(tree, a.checked_shl(u32::try_from(b).ok()?)?),
        Operator::Srl | Operator::Sra => int(tree, a.checked_shr(u32::try_from(b).ok()?)?),
        Operator::Eq | Operator::CaseEq => boolean(tree, a == b),
        Operator::Neq | Operator::CaseNeq => boolean(tree, a != b),
        Operator::Lt => boolean(tree, a < b),
        Operator::Gt => boolean(tree, a > b),
        Operator::Le => boolean(tree, a <= b),
        Operator::Ge => boolean(tree, a >= b),
        _ => None,
    }
}

fn fold_reals(tree: &mut Tree, op: Operator, a: f64, b: f64) -> Option<NodeId> {
    let real = |tree: &mut Tree, v: f64| Some(tree.alloc(RealValue::new(v)));
    let boolean = |tree: &mut Tree, v: bool| Some(tree.alloc(BoolValue::new(v)));
    match op {
        Operator::Plus => real(tree, a + b),
        Operator::Minus => real(tree, a - b),
        Operator::Mult => real(tree, a * b),
        Operator::Div => {
            if b == 0.0 {
                None
            } else {
                real(tree, a / b)
            }
        }
        Operator::Eq | Operator::CaseEq => boolean(tree, a == b),
        Operator::Neq | Operator::CaseNeq => boolean(tree, a != b),
        Operator::Lt => boolean(tree, a < b),
        Operator::Gt => boolean(tree, a > b),
        Operator::Le => boolean(tree, a <= b),
        Operator::Ge => boolean(tree, a >= b),
        _ => None,
    }
}

fn fold_bools(tree: &mut Tree, op: Operator, a: bool, b: bool) -> Option<NodeId> {
    let boolean = |tree: &mut Tree, v: bool| Some(tree.alloc(BoolValue::new(v)));
    match op {
        Operator::And => boolean(tree, a && b),
        Operator::Or => boolean(tree, a || b),
        Operator::Xor => boolean(tree, a ^ b),
        Operator::Eq | Operator::CaseEq => boolean(tree, a == b),
        Operator::Neq | Operator::CaseNeq => boolean(tree, a != b),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        nodes::Expression,
        semantics::HifSemantics,
    };

    #[test]
    fn constant_expressions_fold_bottom_up() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();
        // (2 + 3) * 4
        let two = tree.alloc(IntValue::new(2));
        let three = tree.alloc(IntValue::new(3));
        let sum = tree.alloc(Expression::new(Operator::Plus, two, Some(three)));
        let four = tree.alloc(IntValue::new(4));
        let product = tree.alloc(Expression::new(Operator::Mult, sum, Some(four)));

        let folded = simplify(&mut tree, product, sem, &SimplifyOptions::default());
        let Payload::IntValue(v) = tree.payload(folded) else {
            panic!("expected a folded constant");
        };
        assert_eq!(v.value, 20);
        assert!(!tree.contains(product));
    }

    #[test]
    fn casts_of_constants_collapse() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();
        let value = tree.alloc(IntValue::new(5));
        let span = crate::semantics::typing::make_downto_span(&mut tree, 4);
        let bv_ty = tree.alloc(crate::nodes::Bitvector {
            span: Some(span),
            logic: false,
            resolved: false,
            signed: false,
            constexpr: true,
            variant: crate::nodes::TypeVariant::Native,
        });
        let cast = tree.alloc(crate::nodes::Cast::new(bv_ty, value));
        let folded = simplify(&mut tree, cast, sem, &SimplifyOptions::default());
        let Payload::BitvectorValue(v) = tree.payload(folded) else {
            panic!("expected literal");
        };
        assert_eq!(v.value, "0101");
    }
}
