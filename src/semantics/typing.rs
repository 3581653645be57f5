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

//! `semantic_type_of` and the span algebra shared by every semantics.
//!
//! Semantic types are computed lazily and cached on the tree as owned,
//! detached subtrees. If a cached entry exists it equals what the engine
//! would recompute; passes that alter a value's operands or operator call
//! [`invalidate_types`] on the affected subtree.

use crate::{
    arena::{
        NodeId,
        Tree,
    },
    manipulation::{
        copy_subtree,
        CopyOptions,
    },
    nodes::{
        Bit,
        IntValue,
        NodeKind,
        Payload,
        Range,
        RangeDirection,
        Record,
        StringType,
        TypeVariant,
    },
    resolver::{
        resolve_symbol,
        resolve_symbol_strict,
    },
    semantics::LanguageSemantics,
    Error,
    Result,
};
use rustc_hash::FxHashSet;

/// The span slot of a type, when the kind carries one.
#[must_use]
pub fn type_span(tree: &Tree, ty: NodeId) -> Option<NodeId> {
    match tree.payload(ty) {
        Payload::Int(x) => x.span,
        Payload::Real(x) => x.span,
        Payload::Bitvector(x) => x.span,
        Payload::Signed(x) => x.span,
        Payload::Unsigned(x) => x.span,
        Payload::Array(x) => x.span,
        Payload::String(x) => x.span,
        _ => None,
    }
}

/// Replaces the span of `ty`, freeing the previous one. `span` must be
/// detached.
pub fn type_set_span(tree: &mut Tree, ty: NodeId, span: NodeId) {
    let old = match tree.payload_mut(ty) {
        Payload::Int(x) => x.span.replace(span),
        Payload::Real(x) => x.span.replace(span),
        Payload::Bitvector(x) => x.span.replace(span),
        Payload::Signed(x) => x.span.replace(span),
        Payload::Unsigned(x) => x.span.replace(span),
        Payload::Array(x) => x.span.replace(span),
        Payload::String(x) => x.span.replace(span),
        _ => return,
    };
    tree.relink_children(ty);
    if let Some(old) = old {
        tree.node_mut(old).parent = None;
        tree.free_subtree(old);
    }
}

/// Integer value of a constant bound.
#[must_use]
pub fn constant_bound(tree: &Tree, value: NodeId) -> Option<i64> {
    match tree.payload(value) {
        Payload::IntValue(v) => Some(v.value),
        Payload::Cast(c) => constant_bound(tree, c.value?),
        _ => None,
    }
}

/// Bit width of a span with constant bounds: `|left - right| + 1`.
#[must_use]
pub fn span_bitwidth(tree: &Tree, span: NodeId) -> Option<u64> {
    let Payload::Range(r) = tree.payload(span) else {
        return None;
    };
    let left = constant_bound(tree, r.left?)?;
    let right = constant_bound(tree, r.right?)?;
    Some(left.abs_diff(right) + 1)
}

/// Bit width of a type's span.
#[must_use]
pub fn type_bitwidth(tree: &Tree, ty: NodeId) -> Option<u64> {
    match tree.payload(ty) {
        Payload::Bit(_) | Payload::Bool(_) => Some(1),
        _ => span_bitwidth(tree, type_span(tree, ty)?),
    }
}

/// Fresh `[width-1 downto 0]` span.
pub fn make_downto_span(tree: &mut Tree, width: u64) -> NodeId {
    let left = tree.alloc(IntValue::new(i64::try_from(width).unwrap_or(i64::MAX) - 1));
    let right = tree.alloc(IntValue::new(0));
    tree.alloc(Range::new(RangeDirection::Downto, left, right))
}

/// Span whose width is the sum of the two (concatenation, multiplication).
/// `None` when either width cannot be folded.
pub fn range_sum(tree: &mut Tree, a: NodeId, b: NodeId) -> Option<NodeId> {
    let wa = span_bitwidth(tree, a)?;
    let wb = span_bitwidth(tree, b)?;
    Some(make_downto_span(tree, wa + wb))
}

/// The wider of the two spans, copied. Falls back to a structural-equality
/// check when the widths cannot be folded.
pub fn range_max(tree: &mut Tree, a: NodeId, b: NodeId) -> Option<NodeId> {
    match (span_bitwidth(tree, a), span_bitwidth(tree, b)) {
        (Some(wa), Some(wb)) => {
            let chosen = if wa >= wb { a } else { b };
            Some(copy_subtree(tree, chosen, &mut CopyOptions::new()))
        }
        _ => {
            let opt = crate::EqualsOptions::default();
            if crate::structural_equals(tree, a, b, &opt) {
                Some(copy_subtree(tree, a, &mut CopyOptions::new()))
            } else {
                None
            }
        }
    }
}

/// True for logic bits and logic/sign vectors.
#[must_use]
pub fn type_is_logic(tree: &Tree, ty: NodeId) -> bool {
    match tree.payload(ty) {
        Payload::Bit(x) => x.logic,
        Payload::Bitvector(x) => x.logic,
        Payload::Signed(_) | Payload::Unsigned(_) => true,
        Payload::Array(x) => x.ty.is_some_and(|t| type_is_logic(tree, t)),
        _ => false,
    }
}

#[must_use]
pub fn type_is_constexpr(tree: &Tree, ty: NodeId) -> bool {
    tree.payload(ty).constexpr_flag().unwrap_or(false)
}

#[must_use]
pub fn type_is_signed(tree: &Tree, ty: NodeId) -> bool {
    match tree.payload(ty) {
        Payload::Int(x) => x.signed,
        Payload::Bitvector(x) => x.signed,
        Payload::Array(x) => x.signed,
        Payload::Signed(_) => true,
        _ => false,
    }
}

/// Resolves typerefs down to the concrete type they name. Returns `ty`
/// itself for non-reference types. Cycles in typedef chains return `None`.
pub fn base_type_of(tree: &mut Tree, ty: NodeId, sem: &dyn LanguageSemantics) -> Option<NodeId> {
    let mut visited: FxHashSet<NodeId> = FxHashSet::default();
    let mut current = ty;
    loop {
        if !visited.insert(current) {
            return None;
        }
        match tree.kind(current) {
            NodeKind::TypeReference => {
                let decl = resolve_symbol(tree, current, sem).ok()??;
                current = match tree.payload(decl) {
                    Payload::TypeDef(td) => td.ty?,
                    Payload::TypeTp(tp) => tp.ty?,
                    _ => return None,
                };
            }
            _ => return Some(current),
        }
    }
}

/// Drops (and frees) the cached semantic type of every value under `root`.
pub fn invalidate_types(tree: &mut Tree, root: NodeId) {
    for id in tree.descendants(root) {
        if let Some(cached) = tree.type_cache.remove(&id) {
            tree.free_subtree(cached);
        }
    }
}

/// The semantic type of `value` under `sem`, lazily computed and cached.
///
/// `Ok(None)` means the value cannot be typed (e.g. an unresolved symbol
/// during construction); strict callers turn that into
/// [`Error::CannotType`].
pub fn semantic_type_of(
    tree: &mut Tree,
    value: NodeId,
    sem: &dyn LanguageSemantics,
) -> Result<Option<NodeId>> {
    if let Some(&cached) = tree.type_cache.get(&value) {
        if tree.contains(cached) {
            return Ok(Some(cached));
        }
        tree.type_cache.remove(&value);
    }

    let computed = compute_type(tree, value, sem)?;
    if let Some(ty) = computed {
        tree.type_cache.insert(value, ty);
    }
    Ok(computed)
}

/// Strict variant: an untypeable value is an error.
pub fn semantic_type_of_strict(
    tree: &mut Tree,
    value: NodeId,
    sem: &dyn LanguageSemantics,
) -> Result<NodeId> {
    semantic_type_of(tree, value, sem)?
        .ok_or_else(|| Error::CannotType(tree.kind(value).name()))
}

fn copy_type(tree: &mut Tree, ty: NodeId) -> NodeId {
    copy_subtree(tree, ty, &mut CopyOptions::new())
}

fn compute_type(
    tree: &mut Tree,
    value: NodeId,
    sem: &dyn LanguageSemantics,
) -> Result<Option<NodeId>> {
    let payload = tree.payload(value).clone();
    match payload.kind() {
        // Constants: the syntactic type wins; the semantics types bare
        // literals.
        NodeKind::BitValue
        | NodeKind::BitvectorValue
        | NodeKind::BoolValue
        | NodeKind::CharValue
        | NodeKind::IntValue
        | NodeKind::RealValue
        | NodeKind::StringValue
        | NodeKind::TimeValue => {
            let syn = match payload {
                Payload::BitValue(x) => x.ty,
                Payload::BitvectorValue(x) => x.ty,
                Payload::BoolValue(x) => x.ty,
                Payload::CharValue(x) => x.ty,
                Payload::IntValue(x) => x.ty,
                Payload::RealValue(x) => x.ty,
                Payload::StringValue(x) => x.ty,
                Payload::TimeValue(x) => x.ty,
                _ => unreachable!(),
            };
            match syn {
                Some(ty) => Ok(Some(copy_type(tree, ty))),
                None => Ok(sem.type_for_constant(tree, value)),
            }
        }

        NodeKind::Identifier => {
            let Some(decl) = resolve_symbol(tree, value, sem)? else {
                return Ok(None);
            };
            match tree.payload(decl).declared_type() {
                Some(ty) => Ok(Some(copy_type(tree, ty))),
                // Enum members are typed by their enclosing enum typedef.
                None => {
                    if tree.kind(decl) == NodeKind::EnumValue {
                        enum_member_type(tree, decl)
                    } else {
                        Ok(None)
                    }
                }
            }
        }

        NodeKind::FieldReference => {
            let Payload::FieldReference(fr) = payload else {
                unreachable!();
            };
            let name = fr.name.clone();
            let Some(prefix) = fr.prefix else {
                return Ok(None);
            };
            let Some(prefix_ty) = semantic_type_of(tree, prefix, sem)? else {
                return Ok(None);
            };
            let Some(base) = base_type_of(tree, prefix_ty, sem) else {
                return Ok(None);
            };
            let Payload::Record(record) = tree.payload(base) else {
                return Ok(None);
            };
            let field = record
                .fields
                .clone()
                .into_iter()
                .find(|&f| tree.payload(f).name() == Some(name.as_str()));
            match field.and_then(|f| tree.payload(f).declared_type()) {
                Some(ty) => Ok(Some(copy_type(tree, ty))),
                None => Ok(None),
            }
        }

        NodeKind::Member => {
            let Payload::Member(m) = payload else {
                unreachable!();
            };
            let Some(prefix) = m.prefix else {
                return Ok(None);
            };
            let Some(prefix_ty) = semantic_type_of(tree, prefix, sem)? else {
                return Ok(None);
            };
            let Some(base) = base_type_of(tree, prefix_ty, sem) else {
                return Ok(None);
            };
            element_type(tree, base)
        }

        NodeKind::Slice => {
            let Payload::Slice(s) = payload else {
                unreachable!();
            };
            let (Some(prefix), Some(span)) = (s.prefix, s.span) else {
                return Ok(None);
            };
            let Some(prefix_ty) = semantic_type_of(tree, prefix, sem)? else {
                return Ok(None);
            };
            let Some(base) = base_type_of(tree, prefix_ty, sem) else {
                return Ok(None);
            };
            // The slice projects the prefix type onto the slice's span.
            let projected = copy_type(tree, base);
            let span_copy = copy_subtree(tree, span, &mut CopyOptions::new());
            type_set_span(tree, projected, span_copy);
            Ok(Some(projected))
        }

        NodeKind::Expression => {
            let Payload::Expression(e) = payload else {
                unreachable!();
            };
            let (operator, op1, op2) = (e.operator, e.op1, e.op2);
            let Some(op1) = op1 else {
                return Ok(None);
            };
            let Some(t1) = semantic_type_of(tree, op1, sem)? else {
                return Ok(None);
            };
            let t2 = match op2 {
                Some(op2) => match semantic_type_of(tree, op2, sem)? {
                    Some(t2) => Some(t2),
                    None => return Ok(None),
                },
                None => None,
            };
            let info = sem.operator_result(tree, operator, Some(t1), t2, Some(value));
            if let Some(precision) = info.operation_precision {
                tree.free_subtree(precision);
            }
            Ok(info.returned_type)
        }

        NodeKind::Cast => {
            let Payload::Cast(c) = payload else {
                unreachable!();
            };
            match c.ty {
                Some(ty) => Ok(Some(copy_type(tree, ty))),
                None => Ok(None),
            }
        }

        NodeKind::Aggregate => {
            let Payload::Aggregate(a) = payload else {
                unreachable!();
            };
            let element = a
                .others
                .or_else(|| {
                    a.alts.first().and_then(|&alt| match tree.payload(alt) {
                        Payload::AggregateAlt(aa) => aa.value,
                        _ => None,
                    })
                });
            let count = a.alts.len() as u64;
            let Some(element) = element else {
                return Ok(None);
            };
            let Some(elem_ty) = semantic_type_of(tree, element, sem)? else {
                return Ok(None);
            };
            let elem_copy = copy_type(tree, elem_ty);
            let span = make_downto_span(tree, count.max(1));
            Ok(Some(tree.alloc(crate::nodes::Array {
                span: Some(span),
                ty: Some(elem_copy),
                signed: false,
                variant: TypeVariant::Native,
            })))
        }

        NodeKind::RecordValue => {
            let Payload::RecordValue(rv) = payload else {
                unreachable!();
            };
            let alts = rv.alts.clone();
            let mut fields = Vec::with_capacity(alts.len());
            for alt in alts {
                let Payload::RecordValueAlt(rva) = tree.payload(alt) else {
                    continue;
                };
                let name = rva.name.clone();
                let Some(alt_value) = rva.value else {
                    return Ok(None);
                };
                let Some(vt) = semantic_type_of(tree, alt_value, sem)? else {
                    return Ok(None);
                };
                let vt_copy = copy_type(tree, vt);
                fields.push(tree.alloc(crate::nodes::Field::new(&name, Some(vt_copy))));
            }
            Ok(Some(tree.alloc(Record {
                fields,
                packed: false,
                union_: false,
                variant: TypeVariant::Native,
            })))
        }

        NodeKind::When => {
            let Payload::When(w) = payload else {
                unreachable!();
            };
            let first = w.default.or_else(|| {
                w.alts.first().and_then(|&alt| match tree.payload(alt) {
                    Payload::WhenAlt(wa) => wa.value,
                    _ => None,
                })
            });
            match first {
                Some(v) => match semantic_type_of(tree, v, sem)? {
                    Some(t) => Ok(Some(copy_type(tree, t))),
                    None => Ok(None),
                },
                None => Ok(None),
            }
        }

        NodeKind::With => {
            let Payload::With(w) = payload else {
                unreachable!();
            };
            let first = w.default.or_else(|| {
                w.alts.first().and_then(|&alt| match tree.payload(alt) {
                    Payload::WithAlt(wa) => wa.value,
                    _ => None,
                })
            });
            match first {
                Some(v) => match semantic_type_of(tree, v, sem)? {
                    Some(t) => Ok(Some(copy_type(tree, t))),
                    None => Ok(None),
                },
                None => Ok(None),
            }
        }

        NodeKind::FunctionCall => {
            let Some(decl) = resolve_symbol(tree, value, sem)? else {
                return Ok(None);
            };
            let Payload::Function(f) = tree.payload(decl) else {
                return Ok(None);
            };
            match f.return_type {
                Some(rt) => Ok(Some(copy_type(tree, rt))),
                None => Ok(None),
            }
        }

        NodeKind::Instance => {
            let Payload::Instance(inst) = payload else {
                unreachable!();
            };
            match inst.referenced_type {
                Some(rt) => Ok(Some(copy_type(tree, rt))),
                None => Ok(None),
            }
        }

        // A range used as a value (case condition, for iteration) is typed
        // by its left bound.
        NodeKind::Range => {
            let Payload::Range(r) = payload else {
                unreachable!();
            };
            match r.left {
                Some(l) => match semantic_type_of(tree, l, sem)? {
                    Some(t) => Ok(Some(copy_type(tree, t))),
                    None => Ok(None),
                },
                None => Ok(None),
            }
        }

        _ => Ok(None),
    }
}

fn enum_member_type(tree: &mut Tree, member: NodeId) -> Result<Option<NodeId>> {
    // member -> Enum -> TypeDef; the semantic type is a reference to the
    // typedef.
    let Some(enum_ty) = tree.parent(member) else {
        return Ok(None);
    };
    let Some(typedef) = tree.parent(enum_ty) else {
        return Ok(None);
    };
    let Payload::TypeDef(td) = tree.payload(typedef) else {
        return Ok(None);
    };
    let name = td.name.clone();
    let tr = tree.alloc(crate::nodes::TypeReference::new(&name));
    tree.decl_cache.insert(tr, typedef);
    Ok(Some(tr))
}

/// Element type of an indexable type: array element, vector bit, string
/// char, pointer target.
fn element_type(tree: &mut Tree, base: NodeId) -> Result<Option<NodeId>> {
    enum Element {
        Copy(NodeId),
        Bit(Bit),
        Char,
        None,
    }
    let element = match tree.payload(base) {
        Payload::Array(a) => a.ty.map_or(Element::None, Element::Copy),
        Payload::Bitvector(bv) => Element::Bit(Bit::new(bv.logic, bv.resolved, bv.constexpr)),
        Payload::Signed(_) | Payload::Unsigned(_) => Element::Bit(Bit::new(true, true, false)),
        Payload::String(_) => Element::Char,
        Payload::Pointer(p) => p.ty.map_or(Element::None, Element::Copy),
        // Bit selection out of a spanned integer.
        Payload::Int(_) => Element::Bit(Bit::new(false, false, false)),
        _ => Element::None,
    };
    Ok(match element {
        Element::Copy(t) => Some(copy_type(tree, t)),
        Element::Bit(bit) => Some(tree.alloc(bit)),
        Element::Char => Some(tree.alloc(crate::nodes::Char::default())),
        Element::None => None,
    })
}

/// Types every value under `root`, caching as it goes. With `strict`, the
/// first untypeable value aborts, and every call must type-check against
/// its resolved declaration.
pub fn type_tree(
    tree: &mut Tree,
    root: NodeId,
    sem: &dyn LanguageSemantics,
    strict: bool,
) -> Result<()> {
    for id in tree.descendants(root) {
        if strict
            && matches!(
                tree.kind(id),
                NodeKind::FunctionCall | NodeKind::ProcedureCall
            )
        {
            resolve_symbol_strict(tree, id, sem)?;
        }
        if !tree.payload(id).is_value() {
            continue;
        }
        let ty = semantic_type_of(tree, id, sem)?;
        if strict && ty.is_none() {
            return Err(Error::CannotType(tree.kind(id).name()));
        }
    }
    Ok(())
}

pub(crate) fn make_string_type(tree: &mut Tree, constexpr: bool) -> NodeId {
    tree.alloc(StringType {
        span: None,
        constexpr,
        variant: TypeVariant::Native,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        nodes::{
            Bitvector,
            Expression,
            Operator,
        },
        semantics::HifSemantics,
    };

    fn logic_vector(tree: &mut Tree, width: u64) -> NodeId {
        let span = make_downto_span(tree, width);
        tree.alloc(Bitvector {
            span: Some(span),
            logic: true,
            resolved: true,
            signed: false,
            constexpr: false,
            variant: TypeVariant::Native,
        })
    }

    #[test]
    fn span_arithmetic() {
        let mut tree = Tree::new();
        let a = make_downto_span(&mut tree, 4);
        let b = make_downto_span(&mut tree, 3);
        let sum = range_sum(&mut tree, a, b).unwrap();
        assert_eq!(span_bitwidth(&tree, sum), Some(7));
        let max = range_max(&mut tree, a, b).unwrap();
        assert_eq!(span_bitwidth(&tree, max), Some(4));
    }

    #[test]
    fn expression_type_is_cached_and_invalidated() {
        let mut tree = Tree::new();
        let bv_ty = logic_vector(&mut tree, 8);
        let lhs = tree.alloc(crate::nodes::BitvectorValue {
            value: "00000000".to_owned(),
            ty: Some(bv_ty),
        });
        let bv_ty2 = logic_vector(&mut tree, 8);
        let rhs = tree.alloc(crate::nodes::BitvectorValue {
            value: "11111111".to_owned(),
            ty: Some(bv_ty2),
        });
        let expr = tree.alloc(Expression::new(Operator::BitAnd, lhs, Some(rhs)));

        let sem = HifSemantics::instance();
        let ty = semantic_type_of(&mut tree, expr, sem).unwrap().unwrap();
        assert_eq!(tree.kind(ty), NodeKind::Bitvector);
        assert_eq!(type_bitwidth(&tree, ty), Some(8));

        // Cached: same handle comes back.
        let again = semantic_type_of(&mut tree, expr, sem).unwrap().unwrap();
        assert_eq!(ty, again);

        invalidate_types(&mut tree, expr);
        assert!(!tree.contains(ty));
        let fresh = semantic_type_of(&mut tree, expr, sem).unwrap().unwrap();
        assert_eq!(type_bitwidth(&tree, fresh), Some(8));
    }
}
