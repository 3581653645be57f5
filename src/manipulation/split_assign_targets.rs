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

//! Assignment splitting.
//!
//! Breaks up assignments whose left-hand side is a concatenation or a
//! record value, whose target is wider than a configurable bit width, or
//! whose target is an array to unroll; also rewrites port bindings with
//! concatenated actuals and array-typed signal/port arguments to
//! subprograms through support declarations.

use crate::{
    arena::{
        NodeId,
        Tree,
    },
    manipulation::{
        copy_subtree,
        CopyOptions,
        Trash,
    },
    nodes::{
        Assign,
        Bitvector,
        Identifier,
        IntValue,
        Member,
        NodeKind,
        Operator,
        Payload,
        Range,
        RangeDirection,
        Signal,
        Slice,
        TypeVariant,
        Variable,
    },
    semantics::{
        invalidate_types,
        semantic_type_of,
        typing::{
            make_downto_span,
            type_bitwidth,
        },
        LanguageSemantics,
    },
    Error,
    Result,
};

#[derive(Clone, Debug)]
pub struct SplitAssignTargetsOptions {
    /// Skip standard scopes.
    pub skip_standard_declarations: bool,
    /// Split concat targets.
    pub split_concats: bool,
    /// Split record-value targets involved in concats.
    pub split_record_value_concats: bool,
    /// Split vector targets wider than `max_bitwidth`.
    pub split_vectors: bool,
    /// Split integer targets wider than `max_bitwidth`.
    pub split_integers: bool,
    /// Unroll array targets index-wise.
    pub split_arrays: bool,
    /// Rewrite array-typed signal/port actuals of subprogram calls.
    pub remove_signal_port_array_parameters: bool,
    /// Create support signals instead of variables when splitting concats.
    pub create_signals: bool,
    /// Also split port bindings with concatenated actuals.
    pub split_port_assigns: bool,
    /// Chunk size for wide-target splitting.
    pub max_bitwidth: u64,
    /// Maximum unrolling factor for arrays; zero forces unrolling.
    pub unrolling_upper_bound: u64,
}

impl Default for SplitAssignTargetsOptions {
    fn default() -> Self {
        Self {
            skip_standard_declarations: true,
            split_concats: false,
            split_record_value_concats: false,
            split_vectors: false,
            split_integers: false,
            split_arrays: false,
            remove_signal_port_array_parameters: false,
            create_signals: false,
            split_port_assigns: false,
            max_bitwidth: 64,
            unrolling_upper_bound: 0,
        }
    }
}

/// Splits assignments under `root` per the options. Returns whether at
/// least one split happened.
pub fn split_assign_targets(
    tree: &mut Tree,
    root: NodeId,
    sem: &'static dyn LanguageSemantics,
    opt: &SplitAssignTargetsOptions,
) -> Result<bool> {
    let mut splitter = Splitter {
        sem,
        opt: opt.clone(),
        trash: Trash::new(),
        fixed: false,
        counter: 0,
    };
    let result = splitter.run(tree, root);
    splitter.trash.clear(tree, None);
    result?;
    Ok(splitter.fixed)
}

struct Splitter {
    sem: &'static dyn LanguageSemantics,
    opt: SplitAssignTargetsOptions,
    trash: Trash,
    fixed: bool,
    counter: u32,
}

impl Splitter {
    fn run(&mut self, tree: &mut Tree, root: NodeId) -> Result<()> {
        for id in tree.descendants(root) {
            if !tree.contains(id) {
                continue;
            }
            if self.opt.skip_standard_declarations && tree.payload(id).is_standard() {
                continue;
            }
            match tree.kind(id) {
                NodeKind::Assign => self.split_assign(tree, id)?,
                NodeKind::PortAssign if self.opt.split_port_assigns => {
                    self.split_port_assign(tree, id)?;
                }
                NodeKind::ParameterAssign if self.opt.remove_signal_port_array_parameters => {
                    self.fix_array_parameter(tree, id)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn fresh_name(&mut self) -> String {
        self.counter += 1;
        format!("hif_split_{}", self.counter)
    }

    fn split_assign(&mut self, tree: &mut Tree, assign: NodeId) -> Result<()> {
        let Payload::Assign(a) = tree.payload(assign).clone() else {
            unreachable!();
        };
        let (Some(left), Some(_right)) = (a.left, a.right) else {
            return Ok(());
        };

        match tree.kind(left) {
            NodeKind::Expression if self.opt.split_concats => {
                let Payload::Expression(e) = tree.payload(left) else {
                    unreachable!();
                };
                if e.operator == Operator::Concat {
                    return self.split_concat_assign(tree, assign);
                }
            }
            NodeKind::RecordValue if self.opt.split_record_value_concats => {
                return self.split_record_assign(tree, assign);
            }
            _ => {}
        }

        if self.opt.split_vectors || self.opt.split_integers {
            let Some(target_ty) = semantic_type_of(tree, left, self.sem)? else {
                return Ok(());
            };
            let splittable = match tree.kind(target_ty) {
                NodeKind::Bitvector | NodeKind::Signed | NodeKind::Unsigned => {
                    self.opt.split_vectors
                }
                NodeKind::Int => self.opt.split_integers,
                _ => false,
            };
            if splittable {
                if let Some(width) = type_bitwidth(tree, target_ty) {
                    if width > self.opt.max_bitwidth {
                        return self.split_wide_assign(tree, assign, width);
                    }
                }
            }
        }

        if self.opt.split_arrays {
            let Some(target_ty) = semantic_type_of(tree, left, self.sem)? else {
                return Ok(());
            };
            if tree.kind(target_ty) == NodeKind::Array {
                return self.unroll_array_assign(tree, assign, target_ty);
            }
        }

        Ok(())
    }

    /// `{a, b, c} = rhs` becomes `tmp = rhs; a = tmp[hi:lo]; …`, msb-first.
    fn split_concat_assign(&mut self, tree: &mut Tree, assign: NodeId) -> Result<()> {
        let Payload::Assign(a) = tree.payload(assign).clone() else {
            unreachable!();
        };
        let (Some(left), Some(right)) = (a.left, a.right) else {
            return Ok(());
        };

        let mut targets = Vec::new();
        flatten_concat(tree, left, &mut targets);

        let mut widths = Vec::with_capacity(targets.len());
        for &target in &targets {
            let Some(ty) = semantic_type_of(tree, target, self.sem)? else {
                return Ok(());
            };
            let Some(width) = type_bitwidth(tree, ty) else {
                return Ok(());
            };
            widths.push(width);
        }
        let total: u64 = widths.iter().sum();

        let support = self.declare_support_vector(tree, assign, total)?;

        // tmp = rhs
        let right_copy = copy_subtree(tree, right, &mut CopyOptions::new());
        let delay = a
            .delay
            .map(|d| copy_subtree(tree, d, &mut CopyOptions::new()));
        let tmp_ref = tree.alloc(Identifier::new(&support));
        let first = tree.alloc(Assign {
            left: Some(tmp_ref),
            right: Some(right_copy),
            delay,
        });
        self.copy_assign_decoration(tree, assign, first);

        let mut replacements = vec![first];
        let mut hi = total;
        for (&target, &width) in targets.iter().zip(&widths) {
            let lo = hi - width;
            hi = lo;
            let target_copy = copy_subtree(tree, target, &mut CopyOptions::new());
            let prefix = tree.alloc(Identifier::new(&support));
            let left_bound = tree.alloc(IntValue::new((lo + width - 1) as i64));
            let right_bound = tree.alloc(IntValue::new(lo as i64));
            let span = tree.alloc(Range::new(RangeDirection::Downto, left_bound, right_bound));
            let slice = tree.alloc(Slice {
                prefix: Some(prefix),
                span: Some(span),
            });
            let piece = tree.alloc(Assign {
                left: Some(target_copy),
                right: Some(slice),
                delay: None,
            });
            self.copy_assign_decoration(tree, assign, piece);
            replacements.push(piece);
        }

        self.replace_action(tree, assign, &replacements);
        self.fixed = true;
        Ok(())
    }

    /// `(f1, f2) = rhs` splits field by field through a support variable of
    /// the record type.
    fn split_record_assign(&mut self, tree: &mut Tree, assign: NodeId) -> Result<()> {
        let Payload::Assign(a) = tree.payload(assign).clone() else {
            unreachable!();
        };
        let (Some(left), Some(right)) = (a.left, a.right) else {
            return Ok(());
        };
        let Payload::RecordValue(rv) = tree.payload(left).clone() else {
            return Ok(());
        };
        let Some(record_ty) = semantic_type_of(tree, right, self.sem)? else {
            return Ok(());
        };
        let support = self.fresh_name();
        let ty_copy = copy_subtree(tree, record_ty, &mut CopyOptions::new());
        self.insert_support_declaration(tree, assign, &support, ty_copy, false)?;

        let right_copy = copy_subtree(tree, right, &mut CopyOptions::new());
        let tmp_ref = tree.alloc(Identifier::new(&support));
        let first = tree.alloc(Assign {
            left: Some(tmp_ref),
            right: Some(right_copy),
            delay: None,
        });
        self.copy_assign_decoration(tree, assign, first);
        let mut replacements = vec![first];

        for alt in rv.alts {
            let Payload::RecordValueAlt(rva) = tree.payload(alt).clone() else {
                continue;
            };
            let Some(target) = rva.value else { continue };
            let target_copy = copy_subtree(tree, target, &mut CopyOptions::new());
            let prefix = tree.alloc(Identifier::new(&support));
            let field_ref = tree.alloc(crate::nodes::FieldReference {
                prefix: Some(prefix),
                name: rva.name.clone(),
            });
            let piece = tree.alloc(Assign {
                left: Some(target_copy),
                right: Some(field_ref),
                delay: None,
            });
            self.copy_assign_decoration(tree, assign, piece);
            replacements.push(piece);
        }

        self.replace_action(tree, assign, &replacements);
        self.fixed = true;
        Ok(())
    }

    /// A target wider than `max_bitwidth` splits into chunks of exactly
    /// that width, slicing both sides.
    fn split_wide_assign(&mut self, tree: &mut Tree, assign: NodeId, width: u64) -> Result<()> {
        let max = self.opt.max_bitwidth;
        if max == 0 || width % max != 0 {
            // A last chunk narrower than the rest would need padding logic
            // the target languages disagree on.
            return Err(Error::Unsupported(
                "splitting a width that is not a multiple of max_bitwidth",
            ));
        }
        let Payload::Assign(a) = tree.payload(assign).clone() else {
            unreachable!();
        };
        let (Some(left), Some(right)) = (a.left, a.right) else {
            return Ok(());
        };

        let chunks = width / max;
        let mut replacements = Vec::with_capacity(chunks as usize);
        for chunk in 0..chunks {
            let lo = chunk * max;
            let hi = lo + max - 1;
            let mut sliced = Vec::with_capacity(2);
            for side in [left, right] {
                let side_copy = copy_subtree(tree, side, &mut CopyOptions::new());
                let left_bound = tree.alloc(IntValue::new(hi as i64));
                let right_bound = tree.alloc(IntValue::new(lo as i64));
                let span =
                    tree.alloc(Range::new(RangeDirection::Downto, left_bound, right_bound));
                sliced.push(tree.alloc(Slice {
                    prefix: Some(side_copy),
                    span: Some(span),
                }));
            }
            let piece = tree.alloc(Assign {
                left: Some(sliced[0]),
                right: Some(sliced[1]),
                delay: None,
            });
            self.copy_assign_decoration(tree, assign, piece);
            replacements.push(piece);
        }

        self.replace_action(tree, assign, &replacements);
        self.fixed = true;
        Ok(())
    }

    /// Array targets unroll index-wise, casting elements when the source
    /// element type differs.
    fn unroll_array_assign(
        &mut self,
        tree: &mut Tree,
        assign: NodeId,
        target_ty: NodeId,
    ) -> Result<()> {
        let Some(count) = type_bitwidth(tree, target_ty) else {
            return Ok(());
        };
        if self.opt.unrolling_upper_bound != 0 && count > self.opt.unrolling_upper_bound {
            tracing::debug!("array of {count} elements exceeds the unrolling bound");
            return Ok(());
        }
        let Payload::Assign(a) = tree.payload(assign).clone() else {
            unreachable!();
        };
        let (Some(left), Some(right)) = (a.left, a.right) else {
            return Ok(());
        };
        let Payload::Array(target_arr) = tree.payload(target_ty).clone() else {
            return Ok(());
        };

        let source_ty = semantic_type_of(tree, right, self.sem)?;
        let source_elem = source_ty.and_then(|t| match tree.payload(t) {
            Payload::Array(arr) => arr.ty,
            _ => None,
        });
        let needs_cast = match (target_arr.ty, source_elem) {
            (Some(te), Some(se)) => {
                !crate::structural_equals(tree, te, se, &crate::EqualsOptions::default())
            }
            _ => false,
        };

        let mut replacements = Vec::with_capacity(count as usize);
        for index in 0..count {
            let left_copy = copy_subtree(tree, left, &mut CopyOptions::new());
            let left_index = tree.alloc(IntValue::new(index as i64));
            let lhs = tree.alloc(Member {
                prefix: Some(left_copy),
                index: Some(left_index),
            });
            let right_copy = copy_subtree(tree, right, &mut CopyOptions::new());
            let right_index = tree.alloc(IntValue::new(index as i64));
            let element = tree.alloc(Member {
                prefix: Some(right_copy),
                index: Some(right_index),
            });
            let rhs = if needs_cast {
                let elem_ty =
                    copy_subtree(tree, target_arr.ty.expect("checked above"), &mut CopyOptions::new());
                tree.alloc(crate::nodes::Cast::new(elem_ty, element))
            } else {
                element
            };
            let piece = tree.alloc(Assign {
                left: Some(lhs),
                right: Some(rhs),
                delay: None,
            });
            self.copy_assign_decoration(tree, assign, piece);
            replacements.push(piece);
        }

        self.replace_action(tree, assign, &replacements);
        self.fixed = true;
        Ok(())
    }

    /// A port bound to a concatenation binds to a fresh support signal
    /// instead; a continuous assign connects the signal to the concat.
    fn split_port_assign(&mut self, tree: &mut Tree, port_assign: NodeId) -> Result<()> {
        let Payload::PortAssign(pa) = tree.payload(port_assign).clone() else {
            unreachable!();
        };
        let Some(value) = pa.value else {
            return Ok(());
        };
        let is_concat = matches!(
            tree.payload(value),
            Payload::Expression(e) if e.operator == Operator::Concat
        );
        if !is_concat {
            return Ok(());
        }
        let Some(value_ty) = semantic_type_of(tree, value, self.sem)? else {
            return Ok(());
        };
        let Some(width) = type_bitwidth(tree, value_ty) else {
            return Ok(());
        };

        let Some(contents) =
            tree.nearest_parent(port_assign, |p| p.kind() == NodeKind::Contents)
        else {
            return Ok(());
        };

        let support = self.fresh_name();
        let span = make_downto_span(tree, width);
        let sig_ty = tree.alloc(Bitvector {
            span: Some(span),
            logic: true,
            resolved: true,
            signed: false,
            constexpr: false,
            variant: TypeVariant::Native,
        });
        let signal = tree.alloc(Signal {
            name: support.clone(),
            ty: Some(sig_ty),
            init: None,
            standard: false,
            wrapper: true,
        });
        if let Payload::Contents(c) = tree.payload_mut(contents) {
            c.declarations.push(signal);
        }
        tree.node_mut(signal).parent = Some(contents);

        // The port binds to the signal; the concat connects to the signal
        // through a continuous assign.
        let sig_ref = tree.alloc(Identifier::new(&support));
        tree.replace(value, sig_ref);
        invalidate_types(tree, value);
        let sig_ref2 = tree.alloc(Identifier::new(&support));
        let connect = tree.alloc(Assign {
            left: Some(value),
            right: Some(sig_ref2),
            delay: None,
        });
        if let Payload::Contents(c) = tree.payload_mut(contents) {
            c.global_actions.push(connect);
        }
        tree.node_mut(connect).parent = Some(contents);
        self.fixed = true;
        Ok(())
    }

    /// An array-typed signal or port actual is first copied into a support
    /// variable, which is what the subprogram receives.
    fn fix_array_parameter(&mut self, tree: &mut Tree, param_assign: NodeId) -> Result<()> {
        let Payload::ParameterAssign(pa) = tree.payload(param_assign).clone() else {
            unreachable!();
        };
        let Some(value) = pa.value else {
            return Ok(());
        };
        if tree.kind(value) != NodeKind::Identifier {
            return Ok(());
        }
        let Some(decl) = crate::resolver::resolve_symbol(tree, value, self.sem)? else {
            return Ok(());
        };
        if !matches!(tree.kind(decl), NodeKind::Signal | NodeKind::Port) {
            return Ok(());
        }
        let Some(decl_ty) = tree.payload(decl).declared_type() else {
            return Ok(());
        };
        if tree.kind(decl_ty) != NodeKind::Array {
            return Ok(());
        }
        let Some(call) = tree.nearest_parent(param_assign, |p| {
            matches!(
                p.kind(),
                NodeKind::ProcedureCall | NodeKind::FunctionCall
            )
        }) else {
            return Ok(());
        };

        let support = self.fresh_name();
        let ty_copy = copy_subtree(tree, decl_ty, &mut CopyOptions::new());
        self.insert_support_declaration(tree, call, &support, ty_copy, false)?;

        // Copy-in before the call action.
        let value_copy = copy_subtree(tree, value, &mut CopyOptions::new());
        let tmp_ref = tree.alloc(Identifier::new(&support));
        let copy_in = tree.alloc(Assign {
            left: Some(tmp_ref),
            right: Some(value_copy),
            delay: None,
        });
        let action = action_root_of(tree, call).unwrap_or(call);
        insert_action_before(tree, action, copy_in);

        let replacement = tree.alloc(Identifier::new(&support));
        tree.replace(value, replacement);
        invalidate_types(tree, value);
        tree.free_subtree(value);
        self.fixed = true;
        Ok(())
    }

    /// Declares a `bv<width>` support variable (or signal, per option) in
    /// the nearest declaration scope and returns its name.
    fn declare_support_vector(
        &mut self,
        tree: &mut Tree,
        near: NodeId,
        width: u64,
    ) -> Result<String> {
        let name = self.fresh_name();
        let span = make_downto_span(tree, width);
        let ty = tree.alloc(Bitvector {
            span: Some(span),
            logic: true,
            resolved: true,
            signed: false,
            constexpr: false,
            variant: TypeVariant::Native,
        });
        self.insert_support_declaration(tree, near, &name, ty, self.opt.create_signals)?;
        Ok(name)
    }

    fn insert_support_declaration(
        &mut self,
        tree: &mut Tree,
        near: NodeId,
        name: &str,
        ty: NodeId,
        as_signal: bool,
    ) -> Result<()> {
        if as_signal {
            let Some(contents) = tree.nearest_parent(near, |p| p.kind() == NodeKind::Contents)
            else {
                return Err(Error::Unsupported("support signal outside any contents"));
            };
            let signal = tree.alloc(Signal {
                name: name.to_owned(),
                ty: Some(ty),
                init: None,
                standard: false,
                wrapper: true,
            });
            if let Payload::Contents(c) = tree.payload_mut(contents) {
                c.declarations.push(signal);
            }
            tree.node_mut(signal).parent = Some(contents);
            return Ok(());
        }

        let scope = tree
            .nearest_parent(near, |p| {
                matches!(p.kind(), NodeKind::StateTable | NodeKind::Contents)
            })
            .ok_or(Error::Unsupported("support variable outside any scope"))?;
        let variable = tree.alloc(Variable::new(name, Some(ty), None));
        match tree.payload_mut(scope) {
            Payload::StateTable(st) => st.declarations.push(variable),
            Payload::Contents(c) => c.declarations.push(variable),
            _ => unreachable!(),
        }
        tree.node_mut(variable).parent = Some(scope);
        Ok(())
    }

    fn copy_assign_decoration(&self, tree: &mut Tree, from: NodeId, to: NodeId) {
        let (props, code_info) = {
            let node = tree.node(from);
            (node.properties.clone(), node.code_info.clone())
        };
        // Per-target properties of the original assign (e.g. non-blocking)
        // apply to every piece. Property value subtrees need fresh copies.
        for prop in props {
            let value = prop
                .value
                .map(|v| copy_subtree(tree, v, &mut CopyOptions::new()));
            tree.node_mut(to).properties.push(crate::arena::Property {
                name: prop.name,
                value,
            });
            tree.relink_children(to);
        }
        tree.node_mut(to).code_info = code_info;
    }

    /// Swaps `assign` for `replacements` in its parent action list.
    fn replace_action(&mut self, tree: &mut Tree, assign: NodeId, replacements: &[NodeId]) {
        let Some(parent) = tree.parent(assign) else {
            return;
        };
        let mut spliced = false;
        for slot in tree.node_mut(parent).payload.slots_mut() {
            if let crate::nodes::SlotMut::List(_, children) = slot {
                if let Some(pos) = children.iter().position(|&c| c == assign) {
                    children.splice(pos..pos, replacements.iter().copied());
                    spliced = true;
                    break;
                }
            }
        }
        if spliced {
            for &r in replacements {
                tree.node_mut(r).parent = Some(parent);
            }
            tree.detach(assign);
        }
        invalidate_types(tree, assign);
        self.trash.insert(assign);
    }
}

/// Flattens nested concatenations left-to-right (msb first).
fn flatten_concat(tree: &Tree, value: NodeId, out: &mut Vec<NodeId>) {
    if let Payload::Expression(e) = tree.payload(value) {
        if e.operator == Operator::Concat {
            if let Some(op1) = e.op1 {
                flatten_concat(tree, op1, out);
            }
            if let Some(op2) = e.op2 {
                flatten_concat(tree, op2, out);
            }
            return;
        }
    }
    out.push(value);
}

fn action_root_of(tree: &Tree, node: NodeId) -> Option<NodeId> {
    let mut current = node;
    loop {
        let parent = tree.parent(current)?;
        if matches!(
            tree.payload(parent).kind(),
            NodeKind::State | NodeKind::Contents | NodeKind::IfAlt | NodeKind::SwitchAlt
        ) {
            return Some(current);
        }
        current = parent;
    }
}

fn insert_action_before(tree: &mut Tree, anchor: NodeId, action: NodeId) {
    let Some(parent) = tree.parent(anchor) else {
        return;
    };
    for slot in tree.node_mut(parent).payload.slots_mut() {
        if let crate::nodes::SlotMut::List(_, children) = slot {
            if let Some(pos) = children.iter().position(|&c| c == anchor) {
                children.insert(pos, action);
                break;
            }
        }
    }
    tree.node_mut(action).parent = Some(parent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        nodes::{
            Contents,
            Expression,
            State,
            StateTable,
        },
        semantics::HifSemantics,
    };

    /// Builds `{a, b, c} = e` with widths 1, 2, 1 inside a process.
    fn build_concat_assign(tree: &mut Tree) -> (NodeId, NodeId, NodeId) {
        let mk_bv = |tree: &mut Tree, width: u64| {
            let span = make_downto_span(tree, width);
            tree.alloc(Bitvector {
                span: Some(span),
                logic: true,
                resolved: true,
                signed: false,
                constexpr: false,
                variant: TypeVariant::Native,
            })
        };
        let a_ty = mk_bv(tree, 1);
        let a = tree.alloc(Variable::new("a", Some(a_ty), None));
        let b_ty = mk_bv(tree, 2);
        let b = tree.alloc(Variable::new("b", Some(b_ty), None));
        let c_ty = mk_bv(tree, 1);
        let c = tree.alloc(Variable::new("c", Some(c_ty), None));
        let e_ty = mk_bv(tree, 4);
        let e = tree.alloc(Variable::new("e", Some(e_ty), None));

        let a_ref = tree.alloc(Identifier::new("a"));
        let b_ref = tree.alloc(Identifier::new("b"));
        let inner = tree.alloc(Expression::new(Operator::Concat, a_ref, Some(b_ref)));
        let c_ref = tree.alloc(Identifier::new("c"));
        let concat = tree.alloc(Expression::new(Operator::Concat, inner, Some(c_ref)));
        let e_ref = tree.alloc(Identifier::new("e"));
        let assign = tree.alloc(Assign::new(concat, e_ref));

        let state = tree.alloc(State {
            name: "run".to_owned(),
            actions: vec![assign],
        });
        let table = tree.alloc(StateTable {
            name: "proc".to_owned(),
            declarations: vec![a, b, c, e],
            states: vec![state],
            ..StateTable::default()
        });
        let contents = tree.alloc(Contents {
            name: "behav".to_owned(),
            state_tables: vec![table],
            ..Contents::default()
        });
        (contents, state, assign)
    }

    #[test]
    fn concat_lhs_splits_into_slices() {
        let mut tree = Tree::new();
        let (contents, state, assign) = build_concat_assign(&mut tree);
        let opt = SplitAssignTargetsOptions {
            split_concats: true,
            ..SplitAssignTargetsOptions::default()
        };
        let fixed =
            split_assign_targets(&mut tree, contents, HifSemantics::instance(), &opt).unwrap();
        assert!(fixed);
        assert!(!tree.contains(assign));

        let Payload::State(s) = tree.payload(state) else {
            unreachable!();
        };
        // tmp = e; a = tmp[3:3]; b = tmp[2:1]; c = tmp[0:0]
        assert_eq!(s.actions.len(), 4);
        let actions = s.actions.clone();

        let Payload::Assign(first) = tree.payload(actions[0]) else {
            panic!("expected assign");
        };
        let Payload::Identifier(tmp) = tree.payload(first.left.unwrap()) else {
            panic!("expected support variable target");
        };
        assert!(tmp.name.starts_with("hif_split_"));

        let expected = [(3i64, 3i64), (2, 1), (0, 0)];
        for (action, (hi, lo)) in actions[1..].iter().zip(expected) {
            let Payload::Assign(piece) = tree.payload(*action) else {
                panic!("expected assign");
            };
            let Payload::Slice(slice) = tree.payload(piece.right.unwrap()) else {
                panic!("expected slice rhs");
            };
            let Payload::Range(range) = tree.payload(slice.span.unwrap()) else {
                panic!("expected range span");
            };
            let left = crate::semantics::typing::constant_bound(&tree, range.left.unwrap());
            let right = crate::semantics::typing::constant_bound(&tree, range.right.unwrap());
            assert_eq!(left, Some(hi));
            assert_eq!(right, Some(lo));
        }

        // The support variable was declared in the process scope.
        let Payload::Contents(c) = tree.payload(contents) else {
            unreachable!();
        };
        let table = c.state_tables[0];
        let Payload::StateTable(st) = tree.payload(table) else {
            unreachable!();
        };
        assert_eq!(st.declarations.len(), 5);
        assert!(tree.check_parent_links(contents));
    }

    #[test]
    fn wide_targets_split_into_chunks() {
        let mut tree = Tree::new();
        let span = make_downto_span(&mut tree, 128);
        let wide_ty = tree.alloc(Bitvector {
            span: Some(span),
            logic: true,
            resolved: true,
            signed: false,
            constexpr: false,
            variant: TypeVariant::Native,
        });
        let x = tree.alloc(Variable::new("x", Some(wide_ty), None));
        let span2 = make_downto_span(&mut tree, 128);
        let y_ty = tree.alloc(Bitvector {
            span: Some(span2),
            logic: true,
            resolved: true,
            signed: false,
            constexpr: false,
            variant: TypeVariant::Native,
        });
        let y = tree.alloc(Variable::new("y", Some(y_ty), None));
        let x_ref = tree.alloc(Identifier::new("x"));
        let y_ref = tree.alloc(Identifier::new("y"));
        let assign = tree.alloc(Assign::new(x_ref, y_ref));
        let state = tree.alloc(State {
            name: "run".to_owned(),
            actions: vec![assign],
        });
        let table = tree.alloc(StateTable {
            name: "proc".to_owned(),
            declarations: vec![x, y],
            states: vec![state],
            ..StateTable::default()
        });
        let contents = tree.alloc(Contents {
            name: "behav".to_owned(),
            state_tables: vec![table],
            ..Contents::default()
        });

        let opt = SplitAssignTargetsOptions {
            split_vectors: true,
            max_bitwidth: 64,
            ..SplitAssignTargetsOptions::default()
        };
        let fixed =
            split_assign_targets(&mut tree, contents, HifSemantics::instance(), &opt).unwrap();
        assert!(fixed);
        let Payload::State(s) = tree.payload(state) else {
            unreachable!();
        };
        assert_eq!(s.actions.len(), 2);
    }

    #[test]
    fn non_multiple_widths_are_rejected() {
        let mut tree = Tree::new();
        let span = make_downto_span(&mut tree, 100);
        let ty = tree.alloc(Bitvector {
            span: Some(span),
            logic: true,
            resolved: true,
            signed: false,
            constexpr: false,
            variant: TypeVariant::Native,
        });
        let x = tree.alloc(Variable::new("x", Some(ty), None));
        let x_ref = tree.alloc(Identifier::new("x"));
        let x_ref2 = tree.alloc(Identifier::new("x"));
        let assign = tree.alloc(Assign::new(x_ref, x_ref2));
        let state = tree.alloc(State {
            name: "run".to_owned(),
            actions: vec![assign],
        });
        let table = tree.alloc(StateTable {
            name: "proc".to_owned(),
            declarations: vec![x],
            states: vec![state],
            ..StateTable::default()
        });
        let contents = tree.alloc(Contents {
            name: "behav".to_owned(),
            state_tables: vec![table],
            ..Contents::default()
        });

        let opt = SplitAssignTargetsOptions {
            split_vectors: true,
            max_bitwidth: 64,
            ..SplitAssignTargetsOptions::default()
        };
        let err = split_assign_targets(&mut tree, contents, HifSemantics::instance(), &opt);
        assert!(err.is_err());
    }
}
