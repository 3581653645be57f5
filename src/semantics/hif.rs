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

//! The reference semantics: everything representable is allowed.
//!
//! Span rules: arithmetic and bitwise operators on matching-family operands
//! yield the elected span (max of the two when both operands are constexpr,
//! the non-constexpr side's span when only one is); concatenation and
//! multiplication yield the sum. Equality and relational operators yield
//! `Bool`, or a logic `Bit` when either operand is logic.

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
        Bool,
        BoolValue,
        Expression,
        Int,
        IntValue,
        LanguageId,
        NodeKind,
        Operator,
        Payload,
        Pointer,
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

pub struct HifSemantics {
    options: SemanticOptions,
}

impl HifSemantics {
    #[must_use]
    pub fn instance() -> &'static Self {
        static INSTANCE: HifSemantics = HifSemantics {
            options: SemanticOptions {
                port_in_no_initial_value: true,
                port_out_initial_value: true,
                data_declaration_initial_value: true,
                scoped_type_inside_typedef: true,
                design_unit_unique_view: true,
                for_implicit_index: true,
                for_condition_type: ForConditionType::RangeAndExpression,
                with_is_not_allowed: false,
                case_is_only_literal: false,
                lang_has_dont_care: true,
                lang_has_9_logic: true,
                wait_with_actions: true,
            },
        };
        &INSTANCE
    }
}

fn copy_ty(tree: &mut Tree, ty: NodeId) -> NodeId {
    copy_subtree(tree, ty, &mut CopyOptions::new())
}

fn make_bool(tree: &mut Tree, constexpr: bool) -> NodeId {
    tree.alloc(Bool {
        constexpr,
        variant: TypeVariant::Native,
    })
}

fn make_bit(tree: &mut Tree, logic: bool, resolved: bool, constexpr: bool) -> NodeId {
    tree.alloc(Bit::new(logic, resolved, constexpr))
}

/// Equality/relational result: `Bool`, or a logic `Bit` when the operation
/// precision is logic.
fn relational_result(tree: &mut Tree, precision: NodeId) -> NodeId {
    if type_is_logic(tree, precision) {
        let constexpr = type_is_constexpr(tree, precision);
        make_bit(tree, true, true, constexpr)
    } else {
        let constexpr = type_is_constexpr(tree, precision);
        make_bool(tree, constexpr)
    }
}

/// Span election for non-concat arithmetic: constexpr operands defer to
/// non-constexpr ones; two non-constexpr operands must agree on width.
fn elect_span(
    tree: &mut Tree,
    span1: NodeId,
    span2: NodeId,
    constexpr1: bool,
    constexpr2: bool,
) -> Option<NodeId> {
    match (constexpr1, constexpr2) {
        (true, true) => range_max(tree, span1, span2),
        (false, true) => Some(copy_subtree(tree, span1, &mut CopyOptions::new())),
        (true, false) => Some(copy_subtree(tree, span2, &mut CopyOptions::new())),
        (false, false) => {
            match (span_bitwidth(tree, span1), span_bitwidth(tree, span2)) {
                (Some(w1), Some(w2)) if w1 == w2 => {
                    Some(copy_subtree(tree, span1, &mut CopyOptions::new()))
                }
                (Some(_), Some(_)) => None,
                _ => {
                    if crate::structural_equals(
                        tree,
                        span1,
                        span2,
                        &crate::EqualsOptions::default(),
                    ) {
                        Some(copy_subtree(tree, span1, &mut CopyOptions::new()))
                    } else {
                        None
                    }
                }
            }
        }
    }
}

impl LanguageSemantics for HifSemantics {
    fn name(&self) -> &'static str {
        "hif"
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
        _source: Option<NodeId>,
    ) -> ExprTypeInfo {
        let Some(t1) = t1 else {
            return ExprTypeInfo::default();
        };

        // Reference and dereference short-circuit every table.
        if op == Operator::Ref && t2.is_none() {
            let pointee = match tree.payload(t1) {
                Payload::Reference(r) => r.ty.unwrap_or(t1),
                _ => t1,
            };
            let inner = copy_ty(tree, pointee);
            let returned = tree.alloc(Pointer {
                ty: Some(inner),
                variant: TypeVariant::Native,
            });
            return ExprTypeInfo {
                returned_type: Some(returned),
                operation_precision: Some(copy_ty(tree, t1)),
            };
        }
        if op == Operator::Deref && t2.is_none() {
            let inner = match tree.payload(t1) {
                Payload::Pointer(p) => p.ty,
                _ => None,
            };
            if let Some(inner) = inner {
                return ExprTypeInfo {
                    returned_type: Some(copy_ty(tree, inner)),
                    operation_precision: Some(copy_ty(tree, t1)),
                };
            }
            return ExprTypeInfo::default();
        }

        match t2 {
            None => self.unary(tree, op, t1),
            Some(t2) => self.binary(tree, op, t1, t2),
        }
    }

    fn type_default_value(
        &self,
        tree: &mut Tree,
        ty: NodeId,
        decl: Option<NodeId>,
    ) -> Option<NodeId> {
        let base = base_type_of(tree, ty, self)?;
        match tree.payload(base).clone() {
            Payload::Array(a) => {
                let element = self.type_default_value(tree, a.ty?, decl)?;
                Some(tree.alloc(crate::nodes::Aggregate {
                    alts: Vec::new(),
                    others: Some(element),
                }))
            }
            Payload::Bitvector(bv) => {
                let fill = if bv.logic { 'U' } else { '0' };
                match type_bitwidth(tree, base) {
                    Some(width) => {
                        let lit: String =
                            std::iter::repeat(fill).take(width as usize).collect();
                        let ty_copy = copy_ty(tree, base);
                        tree.payload_mut(ty_copy).set_constexpr(true);
                        Some(tree.alloc(crate::nodes::BitvectorValue {
                            value: lit,
                            ty: Some(ty_copy),
                        }))
                    }
                    None => {
                        let bit_ty = make_bit(tree, bv.logic, bv.resolved, true);
                        let bit = tree.alloc(BitValue {
                            value: if bv.logic {
                                BitConstant::U
                            } else {
                                BitConstant::Zero
                            },
                            ty: Some(bit_ty),
                        });
                        Some(tree.alloc(crate::nodes::Aggregate {
                            alts: Vec::new(),
                            others: Some(bit),
                        }))
                    }
                }
            }
            Payload::Signed(_) | Payload::Unsigned(_) => {
                match type_bitwidth(tree, base) {
                    Some(width) => {
                        let lit: String = std::iter::repeat('U').take(width as usize).collect();
                        let ty_copy = copy_ty(tree, base);
                        tree.payload_mut(ty_copy).set_constexpr(true);
                        Some(tree.alloc(crate::nodes::BitvectorValue {
                            value: lit,
                            ty: Some(ty_copy),
                        }))
                    }
                    None => {
                        let bit_ty = make_bit(tree, true, true, true);
                        let bit = tree.alloc(BitValue {
                            value: BitConstant::U,
                            ty: Some(bit_ty),
                        });
                        Some(tree.alloc(crate::nodes::Aggregate {
                            alts: Vec::new(),
                            others: Some(bit),
                        }))
                    }
                }
            }
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
            Payload::Bit(b) => {
                let ty_copy = copy_ty(tree, base);
                tree.payload_mut(ty_copy).set_constexpr(true);
                Some(tree.alloc(BitValue {
                    value: if b.logic {
                        BitConstant::U
                    } else {
                        BitConstant::Zero
                    },
                    ty: Some(ty_copy),
                }))
            }
            Payload::Bool(_) => {
                let ty_copy = copy_ty(tree, base);
                tree.payload_mut(ty_copy).set_constexpr(true);
                Some(tree.alloc(BoolValue {
                    value: false,
                    ty: Some(ty_copy),
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
            Payload::Char(_) => {
                let ty_copy = copy_ty(tree, base);
                tree.payload_mut(ty_copy).set_constexpr(true);
                Some(tree.alloc(crate::nodes::CharValue {
                    value: '\0',
                    ty: Some(ty_copy),
                }))
            }
            Payload::Enum(e) => {
                let first = *e.values.first()?;
                let name = tree.payload(first).name()?.to_owned();
                Some(tree.alloc(crate::nodes::Identifier::new(&name)))
            }
            Payload::Int(_) => {
                let ty_copy = copy_ty(tree, base);
                tree.payload_mut(ty_copy).set_constexpr(true);
                Some(tree.alloc(IntValue {
                    value: 0,
                    ty: Some(ty_copy),
                }))
            }
            Payload::Real(_) => {
                let ty_copy = copy_ty(tree, base);
                tree.payload_mut(ty_copy).set_constexpr(true);
                Some(tree.alloc(RealValue {
                    value: 0.0,
                    ty: Some(ty_copy),
                }))
            }
            Payload::String(_) => {
                let ty_copy = copy_ty(tree, base);
                tree.payload_mut(ty_copy).set_constexpr(true);
                Some(tree.alloc(StringValue {
                    value: String::new(),
                    ty: Some(ty_copy),
                }))
            }
            Payload::File(_) => {
                let string_ty = typing::make_string_type(tree, true);
                let empty = tree.alloc(StringValue {
                    value: String::new(),
                    ty: Some(string_ty),
                });
                let cast_ty = copy_ty(tree, base);
                Some(tree.alloc(crate::nodes::Cast::new(cast_ty, empty)))
            }
            Payload::Pointer(_) => {
                let zero = tree.alloc(IntValue::new(0));
                let cast_ty = copy_ty(tree, base);
                Some(tree.alloc(crate::nodes::Cast::new(cast_ty, zero)))
            }
            Payload::Event(_) | Payload::ViewReference(_) => None,
            _ => None,
        }
    }

    fn map_type(&self, tree: &mut Tree, ty: NodeId) -> Option<NodeId> {
        // HIF maps every type to itself; spanless integers get the default
        // 32-bit span.
        let copy = copy_ty(tree, ty);
        let needs_span = matches!(tree.payload(copy), Payload::Int(i) if i.span.is_none());
        if needs_span {
            let span = make_downto_span(tree, 32);
            typing::type_set_span(tree, copy, span);
        }
        Some(copy)
    }

    fn type_for_constant(&self, tree: &mut Tree, constant: NodeId) -> Option<NodeId> {
        match tree.payload(constant).clone() {
            Payload::IntValue(v) => {
                let width = if i64::from(v.value as i32) == v.value {
                    32
                } else {
                    64
                };
                let span = make_downto_span(tree, width);
                Some(tree.alloc(Int::new(Some(span), true, true)))
            }
            Payload::BoolValue(_) => Some(make_bool(tree, true)),
            Payload::BitValue(v) => {
                let logic = !v.value.is_01();
                Some(make_bit(tree, logic, false, true))
            }
            Payload::BitvectorValue(v) => {
                let logic = !v.is_01();
                let span = make_downto_span(tree, v.value.len() as u64);
                Some(tree.alloc(Bitvector {
                    span: Some(span),
                    logic,
                    resolved: logic,
                    signed: false,
                    constexpr: true,
                    variant: TypeVariant::Native,
                }))
            }
            Payload::RealValue(_) => {
                let span = make_downto_span(tree, 64);
                Some(tree.alloc(crate::nodes::Real {
                    span: Some(span),
                    constexpr: true,
                    variant: TypeVariant::Native,
                }))
            }
            Payload::CharValue(_) => Some(tree.alloc(crate::nodes::Char {
                constexpr: true,
                variant: TypeVariant::Native,
            })),
            Payload::StringValue(_) => Some(typing::make_string_type(tree, true)),
            Payload::TimeValue(_) => Some(tree.alloc(crate::nodes::Time {
                constexpr: true,
                variant: TypeVariant::Native,
            })),
            _ => None,
        }
    }

    fn check_condition(&self, tree: &Tree, ty: NodeId) -> bool {
        matches!(
            tree.payload(ty).kind(),
            NodeKind::Bool
                | NodeKind::Bit
                | NodeKind::Bitvector
                | NodeKind::Int
                | NodeKind::Real
        )
    }

    fn explicit_bool_conversion(&self, tree: &mut Tree, value: NodeId) -> Option<NodeId> {
        let ty = semantic_type_of(tree, value, self).ok().flatten()?;
        let base = base_type_of(tree, ty, self)?;
        match tree.payload(base).kind() {
            NodeKind::Bool => Some(copy_subtree(tree, value, &mut CopyOptions::new())),
            NodeKind::Bit => {
                let logic = type_is_logic(tree, base);
                let one_ty = make_bit(tree, logic, false, true);
                let one = tree.alloc(BitValue {
                    value: BitConstant::One,
                    ty: Some(one_ty),
                });
                let lhs = copy_subtree(tree, value, &mut CopyOptions::new());
                Some(tree.alloc(Expression::new(Operator::Eq, lhs, Some(one))))
            }
            NodeKind::Bitvector | NodeKind::Signed | NodeKind::Unsigned => {
                let lhs = copy_subtree(tree, value, &mut CopyOptions::new());
                let reduced = tree.alloc(Expression::new(Operator::OrReduce, lhs, None));
                let one_ty = make_bit(tree, true, false, true);
                let one = tree.alloc(BitValue {
                    value: BitConstant::One,
                    ty: Some(one_ty),
                });
                Some(tree.alloc(Expression::new(Operator::Eq, reduced, Some(one))))
            }
            NodeKind::Int | NodeKind::Real => {
                let zero = tree.alloc(IntValue::new(0));
                let zero = transform_constant(tree, zero, base, self, true)
                    .unwrap_or_else(|| tree.alloc(IntValue::new(0)));
                let lhs = copy_subtree(tree, value, &mut CopyOptions::new());
                Some(tree.alloc(Expression::new(Operator::Neq, lhs, Some(zero))))
            }
            _ => None,
        }
    }

    fn explicit_cast(
        &self,
        tree: &mut Tree,
        value: NodeId,
        dst: NodeId,
        _src: Option<NodeId>,
    ) -> NodeId {
        let v = copy_subtree(tree, value, &mut CopyOptions::new());
        let t = copy_ty(tree, dst);
        tree.alloc(crate::nodes::Cast::new(t, v))
    }

    fn is_template_allowed_type(&self, _tree: &Tree, _ty: NodeId) -> bool {
        true
    }

    fn template_allowed_type(&self, tree: &mut Tree, ty: NodeId) -> NodeId {
        copy_ty(tree, ty)
    }

    fn is_type_allowed(&self, _tree: &Tree, _ty: NodeId) -> bool {
        true
    }

    fn type_allowed_as_bound(&self, _tree: &mut Tree, _ty: NodeId) -> Option<NodeId> {
        None
    }

    fn is_type_allowed_as_case(&self, _tree: &Tree, _ty: NodeId) -> bool {
        true
    }

    fn is_type_allowed_as_port(&self, _tree: &Tree, _ty: NodeId) -> bool {
        true
    }

    fn is_cast_allowed(&self, _tree: &Tree, _target: NodeId, _source: NodeId) -> bool {
        true
    }

    fn is_range_direction_allowed(&self, _direction: RangeDirection) -> bool {
        true
    }

    fn is_language_id_allowed(&self, _id: LanguageId) -> bool {
        true
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
        let same_family = vector_family(tree.payload(natural).kind())
            == vector_family(tree.payload(syn_type).kind());
        tree.free_subtree(natural);
        same_family
    }
}

/// Vector kinds compare as one family when checking constant typing.
fn vector_family(kind: NodeKind) -> NodeKind {
    match kind {
        NodeKind::Signed | NodeKind::Unsigned => NodeKind::Bitvector,
        other => other,
    }
}

impl HifSemantics {
    fn unary(&self, tree: &mut Tree, op: Operator, t1: NodeId) -> ExprTypeInfo {
        let kind = tree.payload(t1).kind();
        let logic = type_is_logic(tree, t1);
        let constexpr = type_is_constexpr(tree, t1);
        let returned = if op.is_reduce() {
            match kind {
                NodeKind::Bit
                | NodeKind::Bitvector
                | NodeKind::Signed
                | NodeKind::Unsigned => Some(make_bit(tree, logic, false, constexpr)),
                _ => None,
            }
        } else {
            match op {
                Operator::Not => match kind {
                    NodeKind::Bool | NodeKind::Bit => Some(copy_ty(tree, t1)),
                    _ => None,
                },
                Operator::BitNot => match kind {
                    NodeKind::Bit
                    | NodeKind::Bitvector
                    | NodeKind::Signed
                    | NodeKind::Unsigned
                    | NodeKind::Int => Some(copy_ty(tree, t1)),
                    _ => None,
                },
                Operator::Plus | Operator::Minus | Operator::Abs => match kind {
                    NodeKind::Int
                    | NodeKind::Real
                    | NodeKind::Signed
                    | NodeKind::Unsigned
                    | NodeKind::Bitvector
                    | NodeKind::Time => Some(copy_ty(tree, t1)),
                    _ => None,
                },
                _ => None,
            }
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

        // Typerefs delegate to their base types.
        if tree.kind(t1) == K::TypeReference || tree.kind(t2) == K::TypeReference {
            let b1 = base_type_of(tree, t1, self);
            let b2 = base_type_of(tree, t2, self);
            return match (b1, b2) {
                (Some(b1), Some(b2)) => self.binary(tree, op, b1, b2),
                _ => {
                    // Unresolvable references still admit assignment and
                    // equality between structurally identical types.
                    let equal = crate::structural_equals(
                        tree,
                        t1,
                        t2,
                        &crate::EqualsOptions::default(),
                    );
                    if equal && (op.is_equality() || op.is_assignment()) {
                        let precision = copy_ty(tree, t1);
                        let returned = if op.is_assignment() {
                            copy_ty(tree, t1)
                        } else {
                            make_bool(tree, false)
                        };
                        ExprTypeInfo {
                            returned_type: Some(returned),
                            operation_precision: Some(precision),
                        }
                    } else {
                        ExprTypeInfo::default()
                    }
                }
            };
        }

        // Shift amounts must be integral; the shifted type survives.
        if (op.is_shift() || op.is_rotate()) && tree.kind(t2) == K::Int {
            return match tree.kind(t1) {
                K::Bitvector | K::Signed | K::Unsigned | K::Int | K::Array => ExprTypeInfo {
                    returned_type: Some(copy_ty(tree, t1)),
                    operation_precision: Some(copy_ty(tree, t1)),
                },
                _ => ExprTypeInfo::default(),
            };
        }
        if op.is_shift() || op.is_rotate() {
            return ExprTypeInfo::default();
        }

        match (tree.kind(t1), tree.kind(t2)) {
            (K::Bitvector, K::Bitvector) => self.vector_pair(tree, op, t1, t2),
            (K::Signed, K::Signed) | (K::Unsigned, K::Unsigned) => {
                self.vector_pair(tree, op, t1, t2)
            }
            (K::Signed | K::Unsigned, K::Bitvector) | (K::Bitvector, K::Signed | K::Unsigned) => {
                if op == Operator::Concat {
                    self.vector_pair(tree, op, t1, t2)
                } else {
                    ExprTypeInfo::default()
                }
            }
            (K::Bitvector | K::Signed | K::Unsigned, K::Bit) => {
                let widened = self.bit_as_vector(tree, t2, t1);
                let info = self.vector_pair(tree, op, t1, widened);
                tree.free_subtree(widened);
                info
            }
            (K::Bit, K::Bitvector | K::Signed | K::Unsigned) => {
                let widened = self.bit_as_vector(tree, t1, t2);
                let info = self.vector_pair(tree, op, widened, t2);
                tree.free_subtree(widened);
                info
            }
            (K::Bit, K::Bit) => self.bit_pair(tree, op, t1, t2),
            (K::Bool, K::Bool) => {
                if op.is_logical() || op.is_relational() || op.is_assignment() {
                    let constexpr =
                        type_is_constexpr(tree, t1) && type_is_constexpr(tree, t2);
                    ExprTypeInfo {
                        returned_type: Some(make_bool(tree, constexpr)),
                        operation_precision: Some(make_bool(tree, constexpr)),
                    }
                } else {
                    ExprTypeInfo::default()
                }
            }
            (K::Bool, K::Bit) | (K::Bit, K::Bool) => {
                // Bools participate in bit logic as non-logic bits.
                if op.is_logical() || op.is_relational() || op.is_assignment() {
                    let bit_side = if tree.kind(t1) == K::Bit { t1 } else { t2 };
                    self.bit_pair(tree, op, bit_side, bit_side)
                } else {
                    ExprTypeInfo::default()
                }
            }
            (K::Int, K::Int) => self.int_pair(tree, op, t1, t2),
            (K::Real, K::Real) => self.real_pair(tree, op, t1, t2),
            (K::Int, K::Real) => self.real_pair(tree, op, t2, t2),
            (K::Real, K::Int) => self.real_pair(tree, op, t1, t1),
            (K::Bitvector, K::Int) | (K::Int, K::Bitvector) => {
                // Integer constants participate in vector arithmetic at the
                // vector's span.
                let (bv, int) = if tree.kind(t1) == K::Bitvector {
                    (t1, t2)
                } else {
                    (t2, t1)
                };
                if !type_is_constexpr(tree, int) {
                    return ExprTypeInfo::default();
                }
                if op.is_relational() || op.is_assignment() {
                    let precision = copy_ty(tree, bv);
                    let returned = relational_result(tree, precision);
                    ExprTypeInfo {
                        returned_type: Some(returned),
                        operation_precision: Some(precision),
                    }
                } else if op.is_arithmetic() || op.is_bitwise() {
                    ExprTypeInfo {
                        returned_type: Some(copy_ty(tree, bv)),
                        operation_precision: Some(copy_ty(tree, bv)),
                    }
                } else {
                    ExprTypeInfo::default()
                }
            }
            (K::Array, K::Array) => self.array_pair(tree, op, t1, t2),
            (K::String, K::String) => {
                let constexpr = type_is_constexpr(tree, t1) && type_is_constexpr(tree, t2);
                match op {
                    Operator::Concat | Operator::Assign => {
                        let returned = typing::make_string_type(tree, constexpr);
                        ExprTypeInfo {
                            returned_type: Some(returned),
                            operation_precision: Some(typing::make_string_type(tree, constexpr)),
                        }
                    }
                    _ if op.is_relational() => ExprTypeInfo {
                        returned_type: Some(make_bool(tree, constexpr)),
                        operation_precision: Some(typing::make_string_type(tree, constexpr)),
                    },
                    _ => ExprTypeInfo::default(),
                }
            }
            (K::Char, K::Char) => match op {
                Operator::Concat => {
                    let constexpr = type_is_constexpr(tree, t1) && type_is_constexpr(tree, t2);
                    ExprTypeInfo {
                        returned_type: Some(typing::make_string_type(tree, constexpr)),
                        operation_precision: Some(copy_ty(tree, t1)),
                    }
                }
                _ if op.is_relational() || op.is_assignment() => {
                    let precision = copy_ty(tree, t1);
                    let returned = if op.is_assignment() {
                        copy_ty(tree, t1)
                    } else {
                        make_bool(tree, false)
                    };
                    ExprTypeInfo {
                        returned_type: Some(returned),
                        operation_precision: Some(precision),
                    }
                }
                _ => ExprTypeInfo::default(),
            },
            (K::Record, K::Record) => self.record_pair(tree, op, t1, t2),
            (K::Time, K::Time) => match op {
                Operator::Plus | Operator::Minus | Operator::Assign => ExprTypeInfo {
                    returned_type: Some(copy_ty(tree, t1)),
                    operation_precision: Some(copy_ty(tree, t1)),
                },
                _ if op.is_relational() => ExprTypeInfo {
                    returned_type: Some(make_bool(tree, false)),
                    operation_precision: Some(copy_ty(tree, t1)),
                },
                _ => ExprTypeInfo::default(),
            },
            (K::Time, K::Real | K::Int) | (K::Real | K::Int, K::Time) => {
                if matches!(op, Operator::Mult | Operator::Div) {
                    let time = if tree.kind(t1) == K::Time { t1 } else { t2 };
                    ExprTypeInfo {
                        returned_type: Some(copy_ty(tree, time)),
                        operation_precision: Some(copy_ty(tree, time)),
                    }
                } else {
                    ExprTypeInfo::default()
                }
            }
            (K::Enum, K::Enum) => {
                let equal =
                    crate::structural_equals(tree, t1, t2, &crate::EqualsOptions::default());
                if equal && (op.is_equality() || op.is_relational() || op.is_assignment()) {
                    let precision = copy_ty(tree, t1);
                    let returned = if op.is_assignment() {
                        copy_ty(tree, t1)
                    } else {
                        make_bool(tree, false)
                    };
                    ExprTypeInfo {
                        returned_type: Some(returned),
                        operation_precision: Some(precision),
                    }
                } else {
                    ExprTypeInfo::default()
                }
            }
            (K::Pointer, K::Pointer) => {
                if op.is_equality() || op.is_assignment() {
                    let precision = copy_ty(tree, t1);
                    let returned = if op.is_assignment() {
                        copy_ty(tree, t1)
                    } else {
                        make_bool(tree, false)
                    };
                    ExprTypeInfo {
                        returned_type: Some(returned),
                        operation_precision: Some(precision),
                    }
                } else {
                    ExprTypeInfo::default()
                }
            }
            (K::Pointer, K::Int) => {
                if matches!(op, Operator::Plus | Operator::Minus) {
                    ExprTypeInfo {
                        returned_type: Some(copy_ty(tree, t1)),
                        operation_precision: Some(copy_ty(tree, t1)),
                    }
                } else {
                    ExprTypeInfo::default()
                }
            }
            (K::ViewReference, K::ViewReference) => {
                let equal =
                    crate::structural_equals(tree, t1, t2, &crate::EqualsOptions::default());
                if equal && op.is_assignment() {
                    ExprTypeInfo {
                        returned_type: Some(copy_ty(tree, t1)),
                        operation_precision: Some(copy_ty(tree, t1)),
                    }
                } else {
                    ExprTypeInfo::default()
                }
            }
            _ => ExprTypeInfo::default(),
        }
    }

    /// A lone bit widened to a one-element logic vector so the vector
    /// tables apply.
    fn bit_as_vector(&self, tree: &mut Tree, bit: NodeId, _like: NodeId) -> NodeId {
        let Payload::Bit(b) = tree.payload(bit).clone() else {
            unreachable!("bit_as_vector on a non-bit");
        };
        let span = make_downto_span(tree, 1);
        tree.alloc(Bitvector {
            span: Some(span),
            logic: b.logic,
            resolved: b.resolved,
            signed: false,
            constexpr: b.constexpr,
            variant: TypeVariant::Native,
        })
    }

    fn bit_pair(&self, tree: &mut Tree, op: Operator, t1: NodeId, t2: NodeId) -> ExprTypeInfo {
        let (Payload::Bit(b1), Payload::Bit(b2)) =
            (tree.payload(t1).clone(), tree.payload(t2).clone())
        else {
            unreachable!();
        };
        let logic = b1.logic || b2.logic;
        let resolved = b1.resolved || b2.resolved;
        let constexpr = b1.constexpr && b2.constexpr;

        if op == Operator::Concat {
            let span = make_downto_span(tree, 2);
            let returned = tree.alloc(Bitvector {
                span: Some(span),
                logic,
                resolved,
                signed: false,
                constexpr,
                variant: TypeVariant::Native,
            });
            return ExprTypeInfo {
                returned_type: Some(returned),
                operation_precision: Some(make_bit(tree, logic, resolved, constexpr)),
            };
        }

        if op.is_relational() {
            let precision = make_bit(tree, logic, resolved, constexpr);
            let returned = relational_result(tree, precision);
            return ExprTypeInfo {
                returned_type: Some(returned),
                operation_precision: Some(precision),
            };
        }

        if op.is_logical() || op.is_bitwise() || op.is_assignment() || op.is_arithmetic() {
            return ExprTypeInfo {
                returned_type: Some(make_bit(tree, logic, resolved, constexpr)),
                operation_precision: Some(make_bit(tree, logic, resolved, constexpr)),
            };
        }

        ExprTypeInfo::default()
    }

    fn int_pair(&self, tree: &mut Tree, op: Operator, t1: NodeId, t2: NodeId) -> ExprTypeInfo {
        let (Payload::Int(i1), Payload::Int(i2)) =
            (tree.payload(t1).clone(), tree.payload(t2).clone())
        else {
            unreachable!();
        };
        if op.is_logical() {
            return ExprTypeInfo::default();
        }
        let constexpr = i1.constexpr && i2.constexpr;
        // The non-constexpr operand is the reference for sign and span.
        let reference = if i1.constexpr && !i2.constexpr { &i2 } else { &i1 };

        if !i1.constexpr && !i2.constexpr && i1.signed != i2.signed && !op.is_relational() {
            return ExprTypeInfo::default();
        }

        let span = match (i1.span, i2.span) {
            (Some(s1), Some(s2)) => {
                if op == Operator::Concat || op == Operator::Mult {
                    range_sum(tree, s1, s2)
                } else {
                    elect_span(tree, s1, s2, i1.constexpr, i2.constexpr)
                }
            }
            (Some(s), None) | (None, Some(s)) => {
                Some(copy_subtree(tree, s, &mut CopyOptions::new()))
            }
            (None, None) => None,
        };
        if matches!((i1.span, i2.span), (Some(_), Some(_))) && span.is_none() {
            return ExprTypeInfo::default();
        }

        let precision = tree.alloc(Int {
            span,
            signed: reference.signed,
            constexpr,
            variant: TypeVariant::Native,
        });
        let returned = if op.is_relational() {
            make_bool(tree, constexpr)
        } else if op.is_assignment() {
            copy_ty(tree, t1)
        } else {
            copy_ty(tree, precision)
        };
        ExprTypeInfo {
            returned_type: Some(returned),
            operation_precision: Some(precision),
        }
    }

    fn real_pair(&self, tree: &mut Tree, op: Operator, t1: NodeId, t2: NodeId) -> ExprTypeInfo {
        if op.is_logical() || op == Operator::Concat || op.is_bitwise() {
            return ExprTypeInfo::default();
        }
        let constexpr = type_is_constexpr(tree, t1) && type_is_constexpr(tree, t2);
        let precision = match (type_span(tree, t1), type_span(tree, t2)) {
            (Some(s1), Some(s2)) => {
                let span = range_max(tree, s1, s2);
                tree.alloc(crate::nodes::Real {
                    span,
                    constexpr,
                    variant: TypeVariant::Native,
                })
            }
            _ => copy_ty(tree, t1),
        };
        let returned = if op.is_relational() {
            make_bool(tree, constexpr)
        } else {
            copy_ty(tree, precision)
        };
        ExprTypeInfo {
            returned_type: Some(returned),
            operation_precision: Some(precision),
        }
    }

    /// Shared span/flag merging for bitvectors and sign vectors.
    fn vector_pair(&self, tree: &mut Tree, op: Operator, t1: NodeId, t2: NodeId) -> ExprTypeInfo {
        if op.is_logical() {
            return ExprTypeInfo::default();
        }
        let (Some(span1), Some(span2)) = (type_span(tree, t1), type_span(tree, t2)) else {
            return ExprTypeInfo::default();
        };
        let logic1 = type_is_logic(tree, t1);
        let logic2 = type_is_logic(tree, t2);
        let constexpr1 = type_is_constexpr(tree, t1);
        let constexpr2 = type_is_constexpr(tree, t2);
        // Two non-constant operands must agree on logic-ness; a constant
        // adapts to the other side.
        if op != Operator::Concat && logic1 != logic2 && !(constexpr1 || constexpr2) {
            return ExprTypeInfo::default();
        }

        let result_span = if op == Operator::Concat || op == Operator::Mult {
            range_sum(tree, span1, span2)
        } else {
            elect_span(tree, span1, span2, constexpr1, constexpr2)
        };
        let Some(result_span) = result_span else {
            return ExprTypeInfo::default();
        };

        // Sign vectors keep their kind through same-kind operations; mixed
        // pairs and bitvectors produce bitvectors.
        let same_kind = tree.kind(t1) == tree.kind(t2);
        let precision = if same_kind && tree.kind(t1) != NodeKind::Bitvector {
            let p = copy_ty(tree, t1);
            typing::type_set_span(tree, p, result_span);
            p
        } else {
            let resolved = resolved_flag(tree, t1) || resolved_flag(tree, t2);
            let signed = typing::type_is_signed(tree, t1) && typing::type_is_signed(tree, t2);
            tree.alloc(Bitvector {
                span: Some(result_span),
                logic: logic1 || logic2,
                resolved,
                signed,
                constexpr: constexpr1 && constexpr2,
                variant: TypeVariant::Native,
            })
        };

        if op.is_relational() || op.is_assignment() {
            // Spans must agree for comparison and assignment.
            match (span_bitwidth(tree, span1), span_bitwidth(tree, span2)) {
                (Some(w1), Some(w2)) if w1 != w2 => {
                    tree.free_subtree(precision);
                    return ExprTypeInfo::default();
                }
                _ => {}
            }
            let returned = relational_result(tree, precision);
            return ExprTypeInfo {
                returned_type: Some(returned),
                operation_precision: Some(precision),
            };
        }

        ExprTypeInfo {
            returned_type: Some(copy_ty(tree, precision)),
            operation_precision: Some(precision),
        }
    }

    fn array_pair(&self, tree: &mut Tree, op: Operator, t1: NodeId, t2: NodeId) -> ExprTypeInfo {
        if op.is_logical() {
            return ExprTypeInfo::default();
        }
        let (Payload::Array(a1), Payload::Array(a2)) =
            (tree.payload(t1).clone(), tree.payload(t2).clone())
        else {
            unreachable!();
        };
        let (Some(span1), Some(span2)) = (a1.span, a2.span) else {
            return ExprTypeInfo::default();
        };
        let (Some(elem1), Some(elem2)) = (a1.ty, a2.ty) else {
            return ExprTypeInfo::default();
        };

        // Arrays of arrays do not concatenate.
        if op == Operator::Concat
            && (tree.kind(elem1) == NodeKind::Array || tree.kind(elem2) == NodeKind::Array)
        {
            return ExprTypeInfo::default();
        }

        let opt = crate::EqualsOptions {
            check_constexpr_flag: false,
            check_spans: false,
            ..crate::EqualsOptions::default()
        };
        if !crate::structural_equals(tree, elem1, elem2, &opt) {
            return ExprTypeInfo::default();
        }

        let result_span = if op == Operator::Concat || op == Operator::Mult {
            range_sum(tree, span1, span2)
        } else {
            elect_span(
                tree,
                span1,
                span2,
                type_is_constexpr(tree, t1),
                type_is_constexpr(tree, t2),
            )
        };
        let Some(result_span) = result_span else {
            return ExprTypeInfo::default();
        };

        let elem_copy = copy_ty(tree, elem1);
        let precision = tree.alloc(crate::nodes::Array {
            span: Some(result_span),
            ty: Some(elem_copy),
            signed: a1.signed || a2.signed,
            variant: TypeVariant::Native,
        });

        if op.is_relational() || op.is_assignment() {
            let returned = if type_is_logic(tree, elem1) {
                make_bit(tree, true, true, false)
            } else {
                make_bool(tree, false)
            };
            return ExprTypeInfo {
                returned_type: Some(returned),
                operation_precision: Some(precision),
            };
        }

        ExprTypeInfo {
            returned_type: Some(copy_ty(tree, precision)),
            operation_precision: Some(precision),
        }
    }

    fn record_pair(&self, tree: &mut Tree, op: Operator, t1: NodeId, t2: NodeId) -> ExprTypeInfo {
        if !(op.is_equality() || op.is_assignment()) {
            return ExprTypeInfo::default();
        }
        let (Payload::Record(r1), Payload::Record(r2)) =
            (tree.payload(t1).clone(), tree.payload(t2).clone())
        else {
            unreachable!();
        };
        if r1.fields.len() != r2.fields.len() {
            return ExprTypeInfo::default();
        }
        // Records require equal-named field lists and delegate to the
        // fields pairwise.
        for (&f1, &f2) in r1.fields.iter().zip(&r2.fields) {
            let n1 = tree.payload(f1).name().map(str::to_owned);
            let n2 = tree.payload(f2).name().map(str::to_owned);
            if n1 != n2 {
                return ExprTypeInfo::default();
            }
            let (Some(ft1), Some(ft2)) = (
                tree.payload(f1).declared_type(),
                tree.payload(f2).declared_type(),
            ) else {
                return ExprTypeInfo::default();
            };
            let inner = self.binary(tree, op, ft1, ft2);
            let allowed = inner.is_allowed();
            inner.free(tree);
            if !allowed {
                return ExprTypeInfo::default();
            }
        }
        let precision = copy_ty(tree, t1);
        let returned = if op.is_assignment() {
            copy_ty(tree, t1)
        } else {
            make_bool(tree, false)
        };
        ExprTypeInfo {
            returned_type: Some(returned),
            operation_precision: Some(precision),
        }
    }
}

fn resolved_flag(tree: &Tree, ty: NodeId) -> bool {
    match tree.payload(ty) {
        Payload::Bit(b) => b.resolved,
        Payload::Bitvector(bv) => bv.resolved,
        Payload::Signed(_) | Payload::Unsigned(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantics::typing::make_downto_span;

    fn bv(tree: &mut Tree, width: u64, logic: bool, constexpr: bool) -> NodeId {
        let span = make_downto_span(tree, width);
        tree.alloc(Bitvector {
            span: Some(span),
            logic,
            resolved: logic,
            signed: false,
            constexpr,
            variant: TypeVariant::Native,
        })
    }

    #[test]
    fn concat_spans_add() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();
        let t1 = bv(&mut tree, 4, false, false);
        let t2 = bv(&mut tree, 3, false, false);
        let info = sem.operator_result(&mut tree, Operator::Concat, Some(t1), Some(t2), None);
        let ret = info.returned_type.expect("concat is allowed");
        assert_eq!(type_bitwidth(&tree, ret), Some(7));
    }

    #[test]
    fn equality_returns_bool_or_logic_bit() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();

        let t1 = bv(&mut tree, 4, false, false);
        let t2 = bv(&mut tree, 4, false, false);
        let info = sem.operator_result(&mut tree, Operator::Eq, Some(t1), Some(t2), None);
        assert_eq!(
            tree.kind(info.returned_type.unwrap()),
            crate::nodes::NodeKind::Bool
        );

        let l1 = bv(&mut tree, 4, true, false);
        let l2 = bv(&mut tree, 4, true, false);
        let info = sem.operator_result(&mut tree, Operator::Eq, Some(l1), Some(l2), None);
        let ret = info.returned_type.unwrap();
        assert_eq!(tree.kind(ret), crate::nodes::NodeKind::Bit);
        assert!(type_is_logic(&tree, ret));
    }

    #[test]
    fn constexpr_operand_defers_to_the_other_span() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();
        let wide = bv(&mut tree, 8, false, false);
        let narrow_const = bv(&mut tree, 4, false, true);
        let info =
            sem.operator_result(&mut tree, Operator::Plus, Some(wide), Some(narrow_const), None);
        assert_eq!(type_bitwidth(&tree, info.returned_type.unwrap()), Some(8));
    }

    #[test]
    fn mismatched_nonconst_spans_are_rejected() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();
        let t1 = bv(&mut tree, 8, false, false);
        let t2 = bv(&mut tree, 4, false, false);
        let info = sem.operator_result(&mut tree, Operator::Plus, Some(t1), Some(t2), None);
        assert!(!info.is_allowed());
    }

    #[test]
    fn default_values_follow_logic() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();
        let logic_ty = bv(&mut tree, 3, true, false);
        let dv = sem.type_default_value(&mut tree, logic_ty, None).unwrap();
        let Payload::BitvectorValue(v) = tree.payload(dv) else {
            panic!("expected a bitvector literal");
        };
        assert_eq!(v.value, "UUU");

        let plain_ty = bv(&mut tree, 3, false, false);
        let dv = sem.type_default_value(&mut tree, plain_ty, None).unwrap();
        let Payload::BitvectorValue(v) = tree.payload(dv) else {
            panic!("expected a bitvector literal");
        };
        assert_eq!(v.value, "000");
    }
}
