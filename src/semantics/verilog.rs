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

//! Strict Verilog semantics.
//!
//! The canonical numeric is the 32-bit unsigned logic vector (`reg`). Bit
//! literals map to logic bits, `Int` to 32-bit vectors, `Bool` does not
//! exist, `Real` is limited to 64 bits and to {+, −, ×, ÷, relational,
//! logical, assignment}. A sub-expression embedded in a wider-spanned
//! context is promoted to the context's span.

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
        Bit,
        BitConstant,
        BitValue,
        Bitvector,
        Expression,
        IntValue,
        LanguageId,
        NodeKind,
        Operator,
        Payload,
        RangeDirection,
        RealValue,
        StringValue,
        TimeValue,
        TypeVariant,
    },
    semantics::{
        typing::{
            self,
            base_type_of,
            make_downto_span,
            range_max,
            range_sum,
            semantic_type_of,
            span_bitwidth,
            type_bitwidth,
            type_is_constexpr,
            type_is_logic,
            type_span,
        },
        ExprTypeInfo,
        ForConditionType,
        LanguageSemantics,
        SemanticOptions,
    },
};

pub struct VerilogSemantics {
    options: SemanticOptions,
}

impl VerilogSemantics {
    #[must_use]
    pub fn instance() -> &'static Self {
        static INSTANCE: VerilogSemantics = VerilogSemantics {
            options: SemanticOptions {
                port_in_no_initial_value: false,
                port_out_initial_value: false,
                data_declaration_initial_value: false,
                scoped_type_inside_typedef: false,
                design_unit_unique_view: true,
                for_implicit_index: false,
                for_condition_type: ForConditionType::Expression,
                with_is_not_allowed: true,
                case_is_only_literal: false,
                lang_has_dont_care: true,
                lang_has_9_logic: false,
                wait_with_actions: true,
            },
        };
        &INSTANCE
    }
}

fn copy_ty(tree: &mut Tree, ty: NodeId) -> NodeId {
    copy_subtree(tree, ty, &mut CopyOptions::new())
}

/// The Verilog logic bit.
fn make_verilog_bit(tree: &mut Tree, constexpr: bool) -> NodeId {
    tree.alloc(Bit::new(true, true, constexpr))
}

/// A `reg [width-1:0]` vector: unsigned, packed, logic, resolved.
fn make_register(tree: &mut Tree, width: u64, constexpr: bool, signed: bool) -> NodeId {
    let span = make_downto_span(tree, width);
    tree.alloc(Bitvector {
        span: Some(span),
        logic: true,
        resolved: true,
        signed,
        constexpr,
        variant: TypeVariant::Native,
    })
}

fn make_real64(tree: &mut Tree, constexpr: bool) -> NodeId {
    let span = make_downto_span(tree, 64);
    tree.alloc(crate::nodes::Real {
        span: Some(span),
        constexpr,
        variant: TypeVariant::Native,
    })
}

/// Verilog reals are exactly 64 bits (or unconstrained).
fn check_real(tree: &Tree, real: NodeId) -> bool {
    match type_span(tree, real) {
        Some(span) => span_bitwidth(tree, span) == Some(64),
        None => true,
    }
}

fn permitted_on_reals(op: Operator) -> bool {
    matches!(
        op,
        Operator::Plus | Operator::Minus | Operator::Mult | Operator::Div
    ) || op.is_relational()
        || op.is_logical()
        || op.is_assignment()
}

/// Net declarations default to `Z`, everything else to `X`.
fn is_net_declaration(tree: &Tree, decl: Option<NodeId>) -> bool {
    decl.is_some_and(|d| {
        matches!(
            tree.payload(d).kind(),
            NodeKind::Signal | NodeKind::Port
        )
    })
}

impl LanguageSemantics for VerilogSemantics {
    fn name(&self) -> &'static str {
        "verilog"
    }

    fn semantic_options(&self) -> &SemanticOptions {
        &self.options
    }

    fn operator_result(
        &self,
        tree: &mut Tree,
        op: Operator,
        t1: Option<NodeId>,
        t2: Option<NodeId>,
        source: Option<NodeId>,
    ) -> ExprTypeInfo {
        let Some(t1) = t1 else {
            return ExprTypeInfo::default();
        };
        let mut result = match t2 {
            None => self.unary(tree, op, t1),
            Some(t2) => self.binary(tree, op, t1, t2),
        };

        // Context precision: a sub-expression embedded in a wider context is
        // promoted to the context's span. Concats and assignments keep
        // their own width.
        if op == Operator::Concat || op.is_assignment() || !result.is_allowed() {
            return result;
        }
        let Some(context_span) = self.context_precision(tree, source) else {
            return result;
        };
        let widen = !op.is_logical() && !op.is_bitwise() && !op.is_reduce() && !op.is_relational();
        if widen {
            result.returned_type = result
                .returned_type
                .map(|ty| promote_to_context(tree, ty, context_span));
            result.operation_precision = result
                .operation_precision
                .map(|ty| promote_to_context(tree, ty, context_span));
        }
        result
    }

    fn type_default_value(
        &self,
        tree: &mut Tree,
        ty: NodeId,
        decl: Option<NodeId>,
    ) -> Option<NodeId> {
        let base = base_type_of(tree, ty, self)?;
        let net = is_net_declaration(tree, decl);
        let fill = if net { 'Z' } else { 'X' };
        match tree.payload(base).clone() {
            Payload::Real(_) => {
                let real_ty = make_real64(tree, true);
                Some(tree.alloc(RealValue {
                    value: 0.0,
                    ty: Some(real_ty),
                }))
            }
            // Integers are 32-bit registers underneath.
            Payload::Int(_) => {
                let lit: String = std::iter::repeat(fill).take(32).collect();
                let reg = make_register(tree, 32, true, false);
                Some(tree.alloc(crate::nodes::BitvectorValue {
                    value: lit,
                    ty: Some(reg),
                }))
            }
            Payload::Bit(_) => {
                let bit_ty = make_verilog_bit(tree, true);
                Some(tree.alloc(BitValue {
                    value: if net { BitConstant::Z } else { BitConstant::X },
                    ty: Some(bit_ty),
                }))
            }
            Payload::Time(_) => {
                let ty_copy = copy_ty(tree, base);
                tree.payload_mut(ty_copy).set_constexpr(true);
                Some(tree.alloc(TimeValue {
                    value: 0.0,
                    unit: crate::nodes::TimeUnit::Ns,
                    ty: Some(ty_copy),
                }))
            }
            Payload::Array(a) => {
                let element = self.type_default_value(tree, a.ty?, decl)?;
                Some(tree.alloc(crate::nodes::Aggregate {
                    alts: Vec::new(),
                    others: Some(element),
                }))
            }
            Payload::Bitvector(bv) => match type_bitwidth(tree, base) {
                Some(width) => {
                    let lit: String = std::iter::repeat(fill).take(width as usize).collect();
                    let reg = make_register(tree, width, true, bv.signed);
                    Some(tree.alloc(crate::nodes::BitvectorValue {
                        value: lit,
                        ty: Some(reg),
                    }))
                }
                None => {
                    let bit_ty = make_verilog_bit(tree, true);
                    let bit = tree.alloc(BitValue {
                        value: if net { BitConstant::Z } else { BitConstant::X },
                        ty: Some(bit_ty),
                    });
                    Some(tree.alloc(crate::nodes::Aggregate {
                        alts: Vec::new(),
                        others: Some(bit),
                    }))
                }
            },
            Payload::Record(record) => {
                let mut alts = Vec::with_capacity(record.fields.len());
                for field in record.fields {
                    let name = tree.payload(field).name()?.to_owned();
                    let field_ty = tree.payload(field).declared_type()?;
                    let value = self.type_default_value(tree, field_ty, decl)?;
                    alts.push(tree.alloc(crate::nodes::RecordValueAlt {
                        name,
                        value: Some(value),
                    }));
                }
                Some(tree.alloc(crate::nodes::RecordValue { alts }))
            }
            Payload::String(_) => {
                let string_ty = typing::make_string_type(tree, true);
                Some(tree.alloc(StringValue {
                    value: String::new(),
                    ty: Some(string_ty),
                }))
            }
            Payload::ViewReference(_) | Payload::Event(_) => None,
            _ => None,
        }
    }

    fn map_type(&self, tree: &mut Tree, ty: NodeId) -> Option<NodeId> {
        match tree.payload(ty).clone() {
            // Bool and Char do not exist: both land on the logic bit.
            Payload::Bool(b) => Some(make_verilog_bit(tree, b.constexpr)),
            Payload::Char(c) => Some(make_verilog_bit(tree, c.constexpr)),
            Payload::Bit(b) => Some(make_verilog_bit(tree, b.constexpr)),
            Payload::Int(i) => {
                let width = i
                    .span
                    .and_then(|s| span_bitwidth(tree, s))
                    .unwrap_or(32);
                Some(make_register(tree, width, i.constexpr, i.signed))
            }
            Payload::Bitvector(bv) => {
                let width = bv.span.and_then(|s| span_bitwidth(tree, s))?;
                Some(make_register(tree, width, bv.constexpr, bv.signed))
            }
            Payload::Signed(s) => {
                let width = s.span.and_then(|sp| span_bitwidth(tree, sp))?;
                Some(make_register(tree, width, s.constexpr, true))
            }
            Payload::Unsigned(u) => {
                let width = u.span.and_then(|sp| span_bitwidth(tree, sp))?;
                Some(make_register(tree, width, u.constexpr, false))
            }
            Payload::Real(r) => Some(make_real64(tree, r.constexpr)),
            Payload::String(_) | Payload::Time(_) | Payload::Array(_) => {
                Some(copy_ty(tree, ty))
            }
            Payload::TypeReference(_) => {
                let base = base_type_of(tree, ty, self)?;
                self.map_type(tree, base)
            }
            _ => None,
        }
    }

    fn type_for_constant(&self, tree: &mut Tree, constant: NodeId) -> Option<NodeId> {
        match tree.payload(constant).clone() {
            Payload::IntValue(_) => Some(make_register(tree, 32, true, true)),
            Payload::BitValue(_) | Payload::BoolValue(_) => Some(make_verilog_bit(tree, true)),
            Payload::BitvectorValue(v) => {
                Some(make_register(tree, v.value.len() as u64, true, false))
            }
            Payload::RealValue(_) => Some(make_real64(tree, true)),
            Payload::StringValue(_) => Some(typing::make_string_type(tree, false)),
            Payload::TimeValue(_) => Some(tree.alloc(crate::nodes::Time {
                constexpr: false,
                variant: TypeVariant::Native,
            })),
            // Char constants do not exist in Verilog.
            _ => None,
        }
    }

    fn check_condition(&self, tree: &Tree, ty: NodeId) -> bool {
        // Guards are vectors, integers, bits or 64-bit reals; never Bool.
        match tree.payload(ty).kind() {
            NodeKind::Bitvector | NodeKind::Int | NodeKind::Bit => true,
            NodeKind::Real => check_real(tree, ty),
            _ => false,
        }
    }

    fn explicit_bool_conversion(&self, tree: &mut Tree, value: NodeId) -> Option<NodeId> {
        let ty = semantic_type_of(tree, value, self).ok().flatten()?;
        let base = base_type_of(tree, ty, self)?;
        if !self.check_condition(tree, base) {
            return None;
        }
        match tree.payload(base).kind() {
            // bit --> (bit === '1')
            NodeKind::Bit => {
                let one_ty = make_verilog_bit(tree, true);
                let one = tree.alloc(BitValue {
                    value: BitConstant::One,
                    ty: Some(one_ty),
                });
                let lhs = copy_subtree(tree, value, &mut CopyOptions::new());
                Some(tree.alloc(Expression::new(Operator::CaseEq, lhs, Some(one))))
            }
            // real --> (real !== 0.0)
            NodeKind::Real => {
                let zero = tree.alloc(IntValue::new(0));
                let zero = transform_constant(tree, zero, base, self, true)?;
                let lhs = copy_subtree(tree, value, &mut CopyOptions::new());
                Some(tree.alloc(Expression::new(Operator::CaseNeq, lhs, Some(zero))))
            }
            // vector/integer --> (or_reduce(v) === '1')
            _ => {
                let lhs = copy_subtree(tree, value, &mut CopyOptions::new());
                let reduce = tree.alloc(Expression::new(Operator::OrReduce, lhs, None));
                let one_ty = make_verilog_bit(tree, true);
                let one = tree.alloc(BitValue {
                    value: BitConstant::One,
                    ty: Some(one_ty),
                });
                Some(tree.alloc(Expression::new(Operator::CaseEq, reduce, Some(one))))
            }
        }
    }

    fn explicit_cast(
        &self,
        tree: &mut Tree,
        value: NodeId,
        dst: NodeId,
        src: Option<NodeId>,
    ) -> NodeId {
        // Bools map to bits and bitvectors to logic vectors, so those casts
        // vanish.
        let src_kind = src.map(|s| tree.kind(s));
        let dst_kind = tree.kind(dst);
        let transparent = matches!(
            (dst_kind, src_kind),
            (NodeKind::Bit, Some(NodeKind::Bool | NodeKind::Bit))
                | (NodeKind::Bitvector, Some(NodeKind::Bitvector))
        );
        if transparent {
            return copy_subtree(tree, value, &mut CopyOptions::new());
        }
        let v = copy_subtree(tree, value, &mut CopyOptions::new());
        let t = copy_ty(tree, dst);
        tree.alloc(crate::nodes::Cast::new(t, v))
    }

    fn is_template_allowed_type(&self, tree: &Tree, ty: NodeId) -> bool {
        // Verilog parameters are numeric: strings, records and times have
        // no parameter rendition and get lowered by the elevation pass.
        !matches!(
            tree.payload(ty).kind(),
            NodeKind::String
                | NodeKind::Record
                | NodeKind::Time
                | NodeKind::File
                | NodeKind::Event
                | NodeKind::Pointer
                | NodeKind::Reference
        )
    }

    fn template_allowed_type(&self, tree: &mut Tree, ty: NodeId) -> NodeId {
        if self.is_template_allowed_type(tree, ty) {
            return copy_ty(tree, ty);
        }
        make_register(tree, 32, true, false)
    }

    fn is_type_allowed(&self, tree: &Tree, ty: NodeId) -> bool {
        match tree.payload(ty) {
            Payload::Signed(_)
            | Payload::Unsigned(_)
            | Payload::Bool(_)
            | Payload::Int(_)
            | Payload::Pointer(_)
            | Payload::Reference(_)
            | Payload::Char(_) => false,
            // Only logic resolved bits exist.
            Payload::Bit(b) => b.logic && b.resolved,
            Payload::File(f) => f.ty.is_some_and(|t| {
                matches!(tree.payload(t).kind(), NodeKind::String)
            }),
            payload => variant_is_native(payload),
        }
    }

    fn type_allowed_as_bound(&self, tree: &mut Tree, ty: NodeId) -> Option<NodeId> {
        // Bits and arrays cannot be bounds; anything else becomes an
        // unsigned register of the same width.
        match tree.payload(ty).kind() {
            NodeKind::Bit | NodeKind::Array => None,
            NodeKind::Bitvector if !type_is_logic(tree, ty) => {
                let width = type_bitwidth(tree, ty)?;
                Some(make_register(tree, width, true, false))
            }
            NodeKind::Bitvector => None,
            _ => {
                let width = type_bitwidth(tree, ty).unwrap_or(32);
                Some(make_register(tree, width, true, false))
            }
        }
    }

    fn is_type_allowed_as_case(&self, _tree: &Tree, _ty: NodeId) -> bool {
        // The standard requires a constant expression; every template-legal
        // type qualifies.
        true
    }

    fn is_type_allowed_as_port(&self, tree: &Tree, ty: NodeId) -> bool {
        self.is_type_allowed(tree, ty)
    }

    fn is_cast_allowed(&self, _tree: &Tree, _target: NodeId, _source: NodeId) -> bool {
        false
    }

    fn is_range_direction_allowed(&self, _direction: RangeDirection) -> bool {
        true
    }

    fn is_language_id_allowed(&self, id: LanguageId) -> bool {
        id == LanguageId::Rtl
    }

    fn is_type_allowed_for_const_value(
        &self,
        tree: &mut Tree,
        constant: NodeId,
        syn_type: NodeId,
    ) -> bool {
        let Some(natural) = self.type_for_constant(tree, constant) else {
            return false;
        };
        let opt = crate::EqualsOptions {
            check_constexpr_flag: false,
            check_spans: false,
            ..crate::EqualsOptions::default()
        };
        let equal = crate::structural_equals(tree, natural, syn_type, &opt);
        tree.free_subtree(natural);
        equal
    }
}

/// Lone bits become one-bit registers before the context span lands on
/// them; other results just take the wider span.
fn promote_to_context(tree: &mut Tree, ty: NodeId, context_span: NodeId) -> NodeId {
    let target = if tree.kind(ty) == NodeKind::Bit {
        let constexpr = type_is_constexpr(tree, ty);
        tree.free_subtree(ty);
        make_register(tree, 1, constexpr, false)
    } else {
        ty
    };
    let span_copy = copy_subtree(tree, context_span, &mut CopyOptions::new());
    typing::type_set_span(tree, target, span_copy);
    target
}

fn variant_is_native(payload: &Payload) -> bool {
    match payload {
        Payload::Bitvector(x) => x.variant == TypeVariant::Native,
        Payload::Array(x) => x.variant == TypeVariant::Native,
        Payload::Real(x) => x.variant == TypeVariant::Native,
        Payload::String(x) => x.variant == TypeVariant::Native,
        Payload::Time(x) => x.variant == TypeVariant::Native,
        _ => true,
    }
}

impl VerilogSemantics {
    /// Width of the context the source expression is embedded in: the
    /// target of an enclosing assignment, when it can be typed.
    fn context_precision(&self, tree: &mut Tree, source: Option<NodeId>) -> Option<NodeId> {
        let source = source?;
        let assign = tree.nearest_parent(source, |p| p.kind() == NodeKind::Assign)?;
        let Payload::Assign(a) = tree.payload(assign) else {
            unreachable!();
        };
        let left = a.left?;
        if tree.is_ancestor(left, source) {
            return None;
        }
        let target_ty = semantic_type_of(tree, left, self).ok().flatten()?;
        type_span(tree, target_ty)
    }

    fn unary(&self, tree: &mut Tree, op: Operator, t1: NodeId) -> ExprTypeInfo {
        let kind = tree.kind(t1);
        let constexpr = type_is_constexpr(tree, t1);
        let returned = match kind {
            NodeKind::Bitvector | NodeKind::Array => {
                if op.is_logical() || op.is_reduce() {
                    Some(make_verilog_bit(tree, constexpr))
                } else if matches!(op, Operator::Plus | Operator::Minus | Operator::BitNot) {
                    Some(copy_ty(tree, t1))
                } else {
                    None
                }
            }
            NodeKind::Bit => {
                if op.is_logical() || op.is_reduce() {
                    Some(make_verilog_bit(tree, constexpr))
                } else if matches!(op, Operator::BitNot) {
                    Some(copy_ty(tree, t1))
                } else {
                    None
                }
            }
            NodeKind::Real => {
                if !permitted_on_reals(op) {
                    None
                } else if op.is_logical() {
                    Some(make_verilog_bit(tree, constexpr))
                } else {
                    Some(copy_ty(tree, t1))
                }
            }
            NodeKind::Event => {
                if op == Operator::Deref {
                    Some(tree.alloc(crate::nodes::Event {
                        variant: TypeVariant::Native,
                    }))
                } else {
                    None
                }
            }
            NodeKind::TypeReference => {
                let Some(base) = base_type_of(tree, t1, self) else {
                    return ExprTypeInfo::default();
                };
                return self.unary(tree, op, base);
            }
            _ => None,
        };
        match returned {
            Some(returned) => ExprTypeInfo {
                returned_type: Some(returned),
                operation_precision: Some(copy_ty(tree, t1)),
            },
            None => ExprTypeInfo::default(),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn binary(&self, tree: &mut Tree, op: Operator, t1: NodeId, t2: NodeId) -> ExprTypeInfo {
        use NodeKind as K;

        if tree.kind(t1) == K::TypeReference || tree.kind(t2) == K::TypeReference {
            let b1 = base_type_of(tree, t1, self);
            let b2 = base_type_of(tree, t2, self);
            return match (b1, b2) {
                (Some(b1), Some(b2)) => self.binary(tree, op, b1, b2),
                _ => ExprTypeInfo::default(),
            };
        }

        match (tree.kind(t1), tree.kind(t2)) {
            (K::Bitvector, K::Bitvector) => self.register_pair(tree, op, t1, t2),
            (K::Bit, K::Bit) => {
                if op.is_relational() || op.is_logical() {
                    ExprTypeInfo {
                        returned_type: Some(make_verilog_bit(tree, false)),
                        operation_precision: Some(make_verilog_bit(tree, false)),
                    }
                } else if op == Operator::Concat {
                    ExprTypeInfo {
                        returned_type: Some(make_register(tree, 2, false, false)),
                        operation_precision: Some(make_verilog_bit(tree, false)),
                    }
                } else {
                    ExprTypeInfo {
                        returned_type: Some(make_verilog_bit(tree, false)),
                        operation_precision: Some(make_verilog_bit(tree, false)),
                    }
                }
            }
            (K::Bitvector, K::Bit) | (K::Bit, K::Bitvector) => {
                let bv = if tree.kind(t1) == K::Bitvector { t1 } else { t2 };
                let constexpr = type_is_constexpr(tree, t1) && type_is_constexpr(tree, t2);
                let widened = make_register(tree, 1, constexpr, false);
                let info = if bv == t1 {
                    self.register_pair(tree, op, t1, widened)
                } else {
                    self.register_pair(tree, op, widened, t2)
                };
                tree.free_subtree(widened);
                info
            }
            (K::Real, K::Real) => {
                if !check_real(tree, t1) || !check_real(tree, t2) || !permitted_on_reals(op) {
                    return ExprTypeInfo::default();
                }
                let returned = if op.is_relational() || op.is_logical() {
                    make_verilog_bit(tree, false)
                } else {
                    make_real64(tree, false)
                };
                ExprTypeInfo {
                    returned_type: Some(returned),
                    operation_precision: Some(make_real64(tree, false)),
                }
            }
            (K::Bitvector, K::Real) | (K::Real, K::Bitvector) => {
                let real = if tree.kind(t1) == K::Real { t1 } else { t2 };
                if !check_real(tree, real) {
                    return ExprTypeInfo::default();
                }
                if op.is_assignment() {
                    return ExprTypeInfo {
                        returned_type: Some(copy_ty(tree, t1)),
                        operation_precision: Some(make_real64(tree, false)),
                    };
                }
                if !permitted_on_reals(op) {
                    return ExprTypeInfo::default();
                }
                let returned = if op.is_relational() {
                    make_verilog_bit(tree, false)
                } else {
                    make_real64(tree, false)
                };
                ExprTypeInfo {
                    returned_type: Some(returned),
                    operation_precision: Some(make_real64(tree, false)),
                }
            }
            (K::Bit, K::Real) | (K::Real, K::Bit) => {
                let real = if tree.kind(t1) == K::Real { t1 } else { t2 };
                self.binary(tree, op, real, real)
            }
            (K::String, K::String) => {
                if op.is_assignment() {
                    ExprTypeInfo {
                        returned_type: Some(copy_ty(tree, t1)),
                        operation_precision: Some(copy_ty(tree, t1)),
                    }
                } else {
                    ExprTypeInfo::default()
                }
            }
            // Strings in expressions behave as unsigned 8-bit-per-char
            // constants over a 32-bit register.
            (K::String, K::Bitvector) | (K::Bitvector, K::String) => {
                if op.is_assignment() && tree.kind(t1) == K::String {
                    return ExprTypeInfo {
                        returned_type: Some(copy_ty(tree, t1)),
                        operation_precision: Some(copy_ty(tree, t1)),
                    };
                }
                let bv = if tree.kind(t1) == K::Bitvector { t1 } else { t2 };
                let as_reg = make_register(tree, 32, true, false);
                let info = if bv == t1 {
                    self.register_pair(tree, op, t1, as_reg)
                } else {
                    self.register_pair(tree, op, as_reg, t2)
                };
                tree.free_subtree(as_reg);
                info
            }
            (K::Time, K::Time) => {
                if op.is_assignment() {
                    ExprTypeInfo {
                        returned_type: Some(copy_ty(tree, t1)),
                        operation_precision: Some(copy_ty(tree, t1)),
                    }
                } else {
                    ExprTypeInfo::default()
                }
            }
            (K::Time, K::Real | K::Bitvector) | (K::Real | K::Bitvector, K::Time) => {
                if matches!(op, Operator::Mult | Operator::Div) {
                    let time = tree.alloc(crate::nodes::Time {
                        constexpr: false,
                        variant: TypeVariant::Native,
                    });
                    let precision = tree.alloc(crate::nodes::Time {
                        constexpr: false,
                        variant: TypeVariant::Native,
                    });
                    ExprTypeInfo {
                        returned_type: Some(time),
                        operation_precision: Some(precision),
                    }
                } else {
                    ExprTypeInfo::default()
                }
            }
            (K::Array, K::Array) => {
                // Unpacked arrays only assign element-wise compatible
                // shapes.
                let opt = crate::EqualsOptions {
                    check_constexpr_flag: false,
                    ..crate::EqualsOptions::default()
                };
                if op.is_assignment() && crate::structural_equals(tree, t1, t2, &opt) {
                    ExprTypeInfo {
                        returned_type: Some(copy_ty(tree, t1)),
                        operation_precision: Some(copy_ty(tree, t1)),
                    }
                } else {
                    ExprTypeInfo::default()
                }
            }
            (K::ViewReference, K::ViewReference) => {
                let opt = crate::EqualsOptions::default();
                if op.is_assignment() && crate::structural_equals(tree, t1, t2, &opt) {
                    ExprTypeInfo {
                        returned_type: Some(copy_ty(tree, t1)),
                        operation_precision: Some(copy_ty(tree, t1)),
                    }
                } else {
                    ExprTypeInfo::default()
                }
            }
            // Bool does not exist in Verilog: any Bool operand poisons the
            // operation.
            _ => ExprTypeInfo::default(),
        }
    }

    fn register_pair(&self, tree: &mut Tree, op: Operator, t1: NodeId, t2: NodeId) -> ExprTypeInfo {
        let (Some(span1), Some(span2)) = (type_span(tree, t1), type_span(tree, t2)) else {
            return ExprTypeInfo::default();
        };
        let result_span = if op == Operator::Concat {
            range_sum(tree, span1, span2)
        } else if op.is_assignment() {
            Some(copy_subtree(tree, span1, &mut CopyOptions::new()))
        } else {
            range_max(tree, span1, span2)
        };
        let Some(result_span) = result_span else {
            return ExprTypeInfo::default();
        };
        let signed = typing::type_is_signed(tree, t1) && typing::type_is_signed(tree, t2);
        let constexpr = type_is_constexpr(tree, t1) && type_is_constexpr(tree, t2);
        let precision = tree.alloc(Bitvector {
            span: Some(result_span),
            logic: true,
            resolved: true,
            signed,
            constexpr,
            variant: TypeVariant::Native,
        });
        let returned = if op.is_relational() || op.is_logical() {
            make_verilog_bit(tree, constexpr)
        } else {
            copy_ty(tree, precision)
        };
        ExprTypeInfo {
            returned_type: Some(returned),
            operation_precision: Some(precision),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Bool;

    #[test]
    fn bool_operands_are_rejected() {
        let mut tree = Tree::new();
        let sem = VerilogSemantics::instance();
        let b1 = tree.alloc(Bool::default());
        let b2 = tree.alloc(Bool::default());
        let info = sem.operator_result(&mut tree, Operator::And, Some(b1), Some(b2), None);
        assert!(!info.is_allowed());

        let reg = make_register(&mut tree, 8, false, false);
        let info = sem.operator_result(&mut tree, Operator::Eq, Some(reg), Some(b1), None);
        assert!(!info.is_allowed());
    }

    #[test]
    fn registers_elect_the_max_span() {
        let mut tree = Tree::new();
        let sem = VerilogSemantics::instance();
        let r8 = make_register(&mut tree, 8, false, false);
        let r4 = make_register(&mut tree, 4, false, false);
        let info = sem.operator_result(&mut tree, Operator::Plus, Some(r8), Some(r4), None);
        assert_eq!(type_bitwidth(&tree, info.returned_type.unwrap()), Some(8));

        let info = sem.operator_result(&mut tree, Operator::Concat, Some(r8), Some(r4), None);
        assert_eq!(type_bitwidth(&tree, info.returned_type.unwrap()), Some(12));
    }

    #[test]
    fn reals_are_limited_to_their_operator_subset() {
        let mut tree = Tree::new();
        let sem = VerilogSemantics::instance();
        let real1 = make_real64(&mut tree, false);
        let real2 = make_real64(&mut tree, false);
        let ok = sem.operator_result(&mut tree, Operator::Mult, Some(real1), Some(real2), None);
        assert!(ok.is_allowed());
        let bad = sem.operator_result(&mut tree, Operator::BitAnd, Some(real1), Some(real2), None);
        assert!(!bad.is_allowed());
        let concat =
            sem.operator_result(&mut tree, Operator::Concat, Some(real1), Some(real2), None);
        assert!(!concat.is_allowed());
    }

    #[test]
    fn default_values_use_x_and_z() {
        let mut tree = Tree::new();
        let sem = VerilogSemantics::instance();
        let reg = make_register(&mut tree, 4, false, false);
        let plain = sem.type_default_value(&mut tree, reg, None).unwrap();
        let Payload::BitvectorValue(v) = tree.payload(plain) else {
            panic!("expected literal");
        };
        assert_eq!(v.value, "XXXX");

        let sig_ty = make_register(&mut tree, 4, false, false);
        let net = tree.alloc(crate::nodes::Signal::new("w", Some(sig_ty), None));
        let reg2 = make_register(&mut tree, 4, false, false);
        let wired = sem.type_default_value(&mut tree, reg2, Some(net)).unwrap();
        let Payload::BitvectorValue(v) = tree.payload(wired) else {
            panic!("expected literal");
        };
        assert_eq!(v.value, "ZZZZ");
    }
}
