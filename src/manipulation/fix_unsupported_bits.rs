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

//! Normalization of 9-valued logic literals to what a target semantics
//! accepts.
//!
//! Under a binary target, `U X Z W` become the configured replacement, `L`
//! becomes `0`, `H` becomes `1` and `-` becomes the replacement. Under a
//! 4-valued target, `L→0 H→1 U→X W→X -→X` (unless don't-care is native).
//! Switch/With alternatives whose patterns contain don't-care bits can
//! never match and are removed; equality against a logic literal folds to a
//! constant.

use crate::{
    arena::{
        NodeId,
        Tree,
    },
    manipulation::{
        transform_constant,
        Trash,
    },
    nodes::{
        BitConstant,
        BoolValue,
        NodeKind,
        Operator,
        Payload,
    },
    raise_unique_warning,
    semantics::{
        base_type_of,
        invalidate_types,
        semantic_type_of,
        typing::type_is_logic,
        LanguageSemantics,
    },
    Result,
};

#[derive(Clone, Debug)]
pub struct FixUnsupportedBitsOptions {
    /// Reduce every logic value to plain binary.
    pub only_binary_bits: bool,
    /// Replacement digit for `U X Z W -` under binary reduction.
    pub xz_replace_value: char,
    /// Leave declaration initial values untouched.
    pub skip_initial_values: bool,
}

impl Default for FixUnsupportedBitsOptions {
    fn default() -> Self {
        Self {
            only_binary_bits: false,
            xz_replace_value: '0',
            skip_initial_values: false,
        }
    }
}

/// Rewrites unsupported bits under `root`. `sem` types the current tree;
/// `check_sem` decides which bits the target accepts. Returns whether at
/// least one fix was applied, so a driver can loop to a fixed point.
pub fn fix_unsupported_bits(
    tree: &mut Tree,
    root: NodeId,
    sem: &'static dyn LanguageSemantics,
    check_sem: &'static dyn LanguageSemantics,
    opts: &FixUnsupportedBitsOptions,
) -> Result<bool> {
    if BitConstant::from_char(opts.xz_replace_value).is_none() {
        return Err(crate::Error::Unsupported(
            "replacement value is not a logic digit",
        ));
    }
    let mut fixer = Fixer {
        sem,
        check_sem,
        opts: opts.clone(),
        fixed: false,
        trash: Trash::new(),
    };
    let result = fixer.visit(tree, root);
    fixer.trash.clear(tree, None);
    result?;
    Ok(fixer.fixed)
}

struct Fixer {
    sem: &'static dyn LanguageSemantics,
    check_sem: &'static dyn LanguageSemantics,
    opts: FixUnsupportedBitsOptions,
    fixed: bool,
    trash: Trash,
}

impl Fixer {
    fn has_dont_care(&self) -> bool {
        self.check_sem.semantic_options().lang_has_dont_care
    }

    fn has_9_logic(&self) -> bool {
        self.check_sem.semantic_options().lang_has_9_logic
    }

    fn visit(&mut self, tree: &mut Tree, id: NodeId) -> Result<()> {
        match tree.kind(id) {
            // Standard subtrees are never touched.
            NodeKind::LibraryDef | NodeKind::View if tree.payload(id).is_standard() => {
                return Ok(())
            }
            NodeKind::Expression => {
                if self.simplify_equality(tree, id)? {
                    return Ok(());
                }
            }
            NodeKind::Switch => {
                self.remove_dont_care_alts(tree, id)?;
                let Payload::Switch(s) = tree.payload(id).clone() else {
                    unreachable!();
                };
                if s.alts.is_empty() {
                    // Only the default can ever run; promote it.
                    self.promote_defaults(tree, id);
                    return Ok(());
                }
            }
            NodeKind::With => {
                self.remove_dont_care_alts(tree, id)?;
                let Payload::With(w) = tree.payload(id).clone() else {
                    unreachable!();
                };
                if w.alts.is_empty() {
                    if let Some(default) = w.default {
                        tree.detach(default);
                        tree.replace(id, default);
                    } else {
                        tree.detach(id);
                    }
                    invalidate_types(tree, id);
                    self.trash.insert(id);
                    return Ok(());
                }
            }
            _ => {}
        }

        let mut children = Vec::new();
        tree.node(id)
            .payload
            .for_each_child(&mut |child| children.push(child));
        for child in children {
            if tree.contains(child) {
                self.visit(tree, child)?;
            }
        }

        match tree.kind(id) {
            NodeKind::BitValue => {
                if self.skip_initial_value(tree, id) {
                    return Ok(());
                }
                let Payload::BitValue(b) = tree.payload(id) else {
                    unreachable!();
                };
                let mut s = String::from(b.value.to_char());
                self.fix_logic_values(&mut s);
                let fixed = BitConstant::from_char(s.chars().next().expect("non-empty"))
                    .expect("replacement digit is a valid bit constant");
                if let Payload::BitValue(b) = tree.payload_mut(id) {
                    b.value = fixed;
                }
            }
            NodeKind::BitvectorValue => {
                if self.skip_initial_value(tree, id) {
                    return Ok(());
                }
                let Payload::BitvectorValue(bv) = tree.payload(id) else {
                    unreachable!();
                };
                let mut s = bv.value.clone();
                self.fix_logic_values(&mut s);
                if let Payload::BitvectorValue(bv) = tree.payload_mut(id) {
                    bv.value = s;
                }
            }
            NodeKind::Switch | NodeKind::With => self.fix_case_semantics(tree, id)?,
            _ => {}
        }
        Ok(())
    }

    fn skip_initial_value(&self, tree: &Tree, value: NodeId) -> bool {
        if !self.opts.skip_initial_values {
            return false;
        }
        let Some(parent) = tree.parent(value) else {
            return false;
        };
        tree.payload(parent).is_data_declaration()
            && tree.payload(parent).initial_value() == Some(value)
    }

    fn fix_logic_values(&mut self, s: &mut String) {
        let replacement = self.opts.xz_replace_value;
        let out: String = s
            .chars()
            .map(|c| match c.to_ascii_uppercase() {
                '0' | '1' => c,
                '-' => {
                    if self.has_dont_care() && !self.opts.only_binary_bits {
                        c
                    } else if self.opts.only_binary_bits {
                        raise_unique_warning(&format!(
                            "Found at least one bit value '-' in logic or logic vector. \
                             They are replaced with {replacement}."
                        ));
                        self.fixed = true;
                        replacement
                    } else {
                        raise_unique_warning(
                            "Found at least one bit value '-' in logic or logic vector. \
                             They are replaced with 'X'.",
                        );
                        self.fixed = true;
                        'X'
                    }
                }
                'X' | 'Z' => {
                    if !self.opts.only_binary_bits {
                        c
                    } else {
                        raise_unique_warning(&format!(
                            "Found at least one bit value '{}' in logic or logic vector. \
                             They are replaced with {replacement}.",
                            c.to_ascii_uppercase()
                        ));
                        self.fixed = true;
                        replacement
                    }
                }
                'L' => {
                    if self.has_9_logic() && !self.opts.only_binary_bits {
                        c
                    } else {
                        raise_unique_warning(
                            "Found at least one bit value 'L' in logic or logic vector. \
                             They are replaced with '0'.",
                        );
                        self.fixed = true;
                        '0'
                    }
                }
                'H' => {
                    if self.has_9_logic() && !self.opts.only_binary_bits {
                        c
                    } else {
                        raise_unique_warning(
                            "Found at least one bit value 'H' in logic or logic vector. \
                             They are replaced with '1'.",
                        );
                        self.fixed = true;
                        '1'
                    }
                }
                'U' | 'W' => {
                    if self.has_9_logic() && !self.opts.only_binary_bits {
                        c
                    } else if self.opts.only_binary_bits {
                        raise_unique_warning(&format!(
                            "Found at least one bit value '{}' in logic or logic vector. \
                             They are replaced with {replacement}.",
                            c.to_ascii_uppercase()
                        ));
                        self.fixed = true;
                        replacement
                    } else {
                        raise_unique_warning(&format!(
                            "Found at least one bit value '{}' in logic or logic vector. \
                             They are replaced with 'X'.",
                            c.to_ascii_uppercase()
                        ));
                        self.fixed = true;
                        'X'
                    }
                }
                _ => unreachable!("invalid digit in a logic literal"),
            })
            .collect();
        *s = out;
    }

    /// Equality against a logic literal can never hold once the literal is
    /// reduced to two values: `==`/`===` fold to false, `!==` to true.
    fn simplify_equality(&mut self, tree: &mut Tree, expr: NodeId) -> Result<bool> {
        let Payload::Expression(e) = tree.payload(expr).clone() else {
            unreachable!();
        };
        if !e.operator.is_equality() {
            return Ok(false);
        }
        if self.has_9_logic() && !self.opts.only_binary_bits {
            return Ok(false);
        }
        let (Some(op1), Some(op2)) = (e.op1, e.op2) else {
            return Ok(false);
        };
        if !self.is_logic_const(tree, op1) && !self.is_logic_const(tree, op2) {
            return Ok(false);
        }

        // Sign vectors only fold under full binary reduction.
        let t1 = semantic_type_of(tree, op1, self.sem)?;
        let t2 = semantic_type_of(tree, op2, self.sem)?;
        let involves_sign_vector = [t1, t2].into_iter().flatten().any(|t| {
            matches!(
                tree.payload(t).kind(),
                NodeKind::Signed | NodeKind::Unsigned
            )
        });
        if involves_sign_vector && !self.opts.only_binary_bits {
            return Ok(false);
        }

        let Some(expr_ty) = semantic_type_of(tree, expr, self.sem)? else {
            return Ok(false);
        };

        raise_unique_warning(
            "Found at least one equality expression involving logic bits. \
             It will be replaced with a constant boolean.",
        );

        let folded = e.operator == Operator::CaseNeq;
        let bool_value = tree.alloc(BoolValue::new(folded));
        let constant = transform_constant(tree, bool_value, expr_ty, self.sem, true)
            .unwrap_or(bool_value);
        if constant != bool_value {
            tree.free_subtree(bool_value);
        }
        tree.replace(expr, constant);
        invalidate_types(tree, expr);
        tree.free_subtree(expr);
        self.fixed = true;
        // The folded literal may itself carry bits to fix.
        self.visit(tree, constant)?;
        Ok(true)
    }

    fn is_logic_const(&self, tree: &Tree, value: NodeId) -> bool {
        match tree.payload(value) {
            Payload::BitvectorValue(bv) => {
                if self.opts.only_binary_bits {
                    !bv.is_01()
                } else if self.has_dont_care() {
                    bv.value
                        .to_ascii_uppercase()
                        .contains(['U', 'W', 'L', 'H'])
                } else {
                    bv.value
                        .to_ascii_uppercase()
                        .contains(['-', 'U', 'W', 'L', 'H'])
                }
            }
            Payload::BitValue(b) => {
                if self.opts.only_binary_bits {
                    !b.value.is_01()
                } else if self.has_dont_care() {
                    matches!(
                        b.value,
                        BitConstant::W | BitConstant::L | BitConstant::H | BitConstant::U
                    )
                } else {
                    matches!(
                        b.value,
                        BitConstant::W
                            | BitConstant::L
                            | BitConstant::H
                            | BitConstant::U
                            | BitConstant::DontCare
                    )
                }
            }
            _ => false,
        }
    }

    /// Alternatives whose pattern contains a don't-care can never match
    /// under binary matching.
    fn remove_dont_care_alts(&mut self, tree: &mut Tree, node: NodeId) -> Result<()> {
        if self.has_dont_care() && !self.opts.only_binary_bits {
            return Ok(());
        }
        let alts = match tree.payload(node) {
            Payload::Switch(s) => s.alts.clone(),
            Payload::With(w) => w.alts.clone(),
            _ => return Ok(()),
        };
        let mut alt_trash = Trash::new();
        for alt in alts {
            let conditions = match tree.payload(alt) {
                Payload::SwitchAlt(a) => a.conditions.clone(),
                Payload::WithAlt(a) => a.conditions.clone(),
                _ => continue,
            };
            let mut cond_trash = Trash::new();
            for cond in conditions {
                let has_dont_care_bits = match tree.payload(cond) {
                    Payload::BitValue(b) => b.value == BitConstant::DontCare,
                    Payload::BitvectorValue(bv) => bv.value.contains('-'),
                    _ => false,
                };
                if has_dont_care_bits {
                    tree.detach(cond);
                    cond_trash.insert(cond);
                    self.fixed = true;
                }
            }
            cond_trash.clear(tree, None);
            let now_empty = match tree.payload(alt) {
                Payload::SwitchAlt(a) => a.conditions.is_empty(),
                Payload::WithAlt(a) => a.conditions.is_empty(),
                _ => false,
            };
            if now_empty {
                tree.detach(alt);
                alt_trash.insert(alt);
            }
        }
        alt_trash.clear(tree, None);
        Ok(())
    }

    /// A switch whose alternatives all vanished runs its default
    /// unconditionally; splice the default actions into the parent list.
    fn promote_defaults(&mut self, tree: &mut Tree, switch: NodeId) {
        let parent = tree.parent(switch);
        if let Some(parent) = parent {
            let defaults = match tree.payload(switch) {
                Payload::Switch(s) => s.defaults.clone(),
                _ => Vec::new(),
            };
            for &d in &defaults {
                tree.detach(d);
            }
            let mut spliced = false;
            for slot in tree.node_mut(parent).payload.slots_mut() {
                if let crate::nodes::SlotMut::List(_, children) = slot {
                    if let Some(pos) = children.iter().position(|&c| c == switch) {
                        children.splice(pos..pos, defaults.iter().copied());
                        spliced = true;
                        break;
                    }
                }
            }
            if spliced {
                for &d in &defaults {
                    tree.node_mut(d).parent = Some(parent);
                }
            }
            tree.detach(switch);
        }
        invalidate_types(tree, switch);
        self.trash.insert(switch);
        self.fixed = true;
    }

    fn fix_case_semantics(&mut self, tree: &mut Tree, node: NodeId) -> Result<()> {
        let (condition, case_semantics) = match tree.payload(node) {
            Payload::Switch(s) => (s.condition, s.case_semantics),
            Payload::With(w) => (w.condition, w.case_semantics),
            _ => return Ok(()),
        };
        if case_semantics == crate::nodes::CaseSemantics::Literal {
            return Ok(());
        }
        let Some(condition) = condition else {
            return Ok(());
        };
        let Some(cond_ty) = semantic_type_of(tree, condition, self.sem)? else {
            return Ok(());
        };
        let Some(base) = base_type_of(tree, cond_ty, self.sem) else {
            return Ok(());
        };
        // CASE_X/CASE_Z only make sense over logic discriminators.
        if type_is_logic(tree, base) {
            return Ok(());
        }
        match tree.payload_mut(node) {
            Payload::Switch(s) => s.case_semantics = crate::nodes::CaseSemantics::Literal,
            Payload::With(w) => w.case_semantics = crate::nodes::CaseSemantics::Literal,
            _ => unreachable!(),
        }
        self.fixed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        nodes::{
            BitvectorValue,
            Expression,
            Identifier,
            Variable,
        },
        semantics::{
            HifSemantics,
            VerilogSemantics,
        },
    };

    fn binary_opts() -> FixUnsupportedBitsOptions {
        FixUnsupportedBitsOptions {
            only_binary_bits: true,
            xz_replace_value: '0',
            skip_initial_values: false,
        }
    }

    #[test]
    fn binary_reduction_rewrites_the_literal() {
        let mut tree = Tree::new();
        let value = tree.alloc(BitvectorValue::new("10XZ-"));
        let holder = tree.alloc(crate::nodes::ValueStatement { value: Some(value) });

        let fixed = fix_unsupported_bits(
            &mut tree,
            holder,
            HifSemantics::instance(),
            VerilogSemantics::instance(),
            &binary_opts(),
        )
        .unwrap();
        assert!(fixed);
        let Payload::BitvectorValue(v) = tree.payload(value) else {
            unreachable!();
        };
        assert_eq!(v.value, "10000");
    }

    #[test]
    fn four_valued_targets_keep_x_and_z() {
        let mut tree = Tree::new();
        let value = tree.alloc(BitvectorValue::new("UX01ZWLH"));
        let holder = tree.alloc(crate::nodes::ValueStatement { value: Some(value) });

        let fixed = fix_unsupported_bits(
            &mut tree,
            holder,
            HifSemantics::instance(),
            VerilogSemantics::instance(),
            &FixUnsupportedBitsOptions::default(),
        )
        .unwrap();
        assert!(fixed);
        let Payload::BitvectorValue(v) = tree.payload(value) else {
            unreachable!();
        };
        assert_eq!(v.value, "XX01ZX01");
    }

    #[test]
    fn logic_equality_folds_to_a_constant() {
        let mut tree = Tree::new();
        // x : bv<3>;  (x == "1X0")
        let span = crate::semantics::typing::make_downto_span(&mut tree, 3);
        let ty = tree.alloc(crate::nodes::Bitvector {
            span: Some(span),
            logic: true,
            resolved: true,
            signed: false,
            constexpr: false,
            variant: crate::nodes::TypeVariant::Native,
        });
        let var = tree.alloc(Variable::new("x", Some(ty), None));
        let lit = tree.alloc(BitvectorValue::new("1X0"));
        let sym = tree.alloc(Identifier::new("x"));
        let expr = tree.alloc(Expression::new(Operator::Eq, lit, Some(sym)));
        let stmt = tree.alloc(crate::nodes::ValueStatement { value: Some(expr) });
        let contents = tree.alloc(crate::nodes::Contents {
            name: "behav".to_owned(),
            declarations: vec![var],
            global_actions: vec![stmt],
            ..crate::nodes::Contents::default()
        });

        let fixed = fix_unsupported_bits(
            &mut tree,
            contents,
            HifSemantics::instance(),
            VerilogSemantics::instance(),
            &binary_opts(),
        )
        .unwrap();
        assert!(fixed);
        assert!(!tree.contains(expr));
        let Payload::ValueStatement(vs) = tree.payload(stmt) else {
            unreachable!();
        };
        let replacement = vs.value.unwrap();
        // Folded to a false constant, typed by the original expression.
        match tree.payload(replacement) {
            Payload::BoolValue(b) => assert!(!b.value),
            Payload::BitValue(b) => assert_eq!(b.value, BitConstant::Zero),
            other => panic!("unexpected fold result: {other:?}"),
        }
    }
}
