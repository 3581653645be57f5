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

//! Constant coercion between types.
//!
//! `transform_constant` builds a fresh constant equivalent to the source
//! but typed by the target; `None` means the coercion is not possible and
//! the caller surfaces the failure. Narrowing with `allow_truncation =
//! false` fails; with `true` it succeeds and warns once.

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
        BitConstant,
        BitValue,
        BitvectorValue,
        BoolValue,
        CharValue,
        IntValue,
        NodeKind,
        Payload,
        RealValue,
        StringValue,
        TimeValue,
    },
    raise_unique_warning,
    semantics::{
        typing::{
            base_type_of,
            type_bitwidth,
            type_is_logic,
            type_is_signed,
        },
        LanguageSemantics,
    },
};

/// Converts the constant `cvo` into an equivalent constant of type `to`.
/// The result is a fresh detached node carrying a copy of `to` as its
/// syntactic type.
#[must_use]
pub fn transform_constant(
    tree: &mut Tree,
    cvo: NodeId,
    to: NodeId,
    sem: &dyn LanguageSemantics,
    allow_truncation: bool,
) -> Option<NodeId> {
    let base = base_type_of(tree, to, sem)?;
    let payload = tree.payload(cvo).clone();
    let value = match payload {
        Payload::IntValue(v) => from_int(tree, v.value, base, allow_truncation)?,
        Payload::BoolValue(v) => from_int(tree, i64::from(v.value), base, allow_truncation)?,
        Payload::BitValue(v) => from_bit(tree, v.value, base)?,
        Payload::BitvectorValue(v) => from_bitvector(tree, &v.value, base, allow_truncation)?,
        Payload::RealValue(v) => from_real(tree, v.value, base, allow_truncation)?,
        Payload::CharValue(v) => from_int(tree, i64::from(v.value as u32), base, allow_truncation)?,
        Payload::StringValue(v) => from_string(tree, &v.value, base)?,
        Payload::TimeValue(v) => from_time(tree, v.value, v.unit, base)?,
        _ => return None,
    };
    let ty_copy = copy_subtree(tree, to, &mut CopyOptions::new());
    set_syntactic_type(tree, value, ty_copy);
    Some(value)
}

/// Converts a (possibly composite) value. Aggregates of constant bits
/// render into bitvector literals; record values unpack field-wise;
/// everything else falls back to [`transform_constant`].
#[must_use]
pub fn transform_value(
    tree: &mut Tree,
    vo: NodeId,
    to: NodeId,
    sem: &dyn LanguageSemantics,
    allow_truncation: bool,
) -> Option<NodeId> {
    match tree.payload(vo).clone() {
        Payload::Aggregate(agg) => {
            let base = base_type_of(tree, to, sem)?;
            if tree.kind(base) != NodeKind::Bitvector {
                return None;
            }
            let width = type_bitwidth(tree, base)? as usize;
            let mut digits = vec![None::<char>; width];
            if let Some(others) = agg.others {
                let c = literal_bit_char(tree, others)?;
                digits.iter_mut().for_each(|d| *d = Some(c));
            }
            for alt in agg.alts {
                let Payload::AggregateAlt(aa) = tree.payload(alt).clone() else {
                    return None;
                };
                let c = literal_bit_char(tree, aa.value?)?;
                for index in aa.indices {
                    let i = crate::semantics::typing::constant_bound(tree, index)?;
                    let i = usize::try_from(i).ok()?;
                    if i >= width {
                        return None;
                    }
                    // Literal digit order: leftmost digit is the highest
                    // index.
                    digits[width - 1 - i] = Some(c);
                }
            }
            let literal: Option<String> = digits.into_iter().collect();
            let value = tree.alloc(BitvectorValue::new(&literal?));
            let ty_copy = copy_subtree(tree, to, &mut CopyOptions::new());
            set_syntactic_type(tree, value, ty_copy);
            Some(value)
        }
        Payload::RecordValue(rv) => {
            let base = base_type_of(tree, to, sem)?;
            let Payload::Record(record) = tree.payload(base).clone() else {
                return None;
            };
            if record.fields.len() != rv.alts.len() {
                return None;
            }
            let mut alts = Vec::with_capacity(rv.alts.len());
            for (&alt, &field) in rv.alts.iter().zip(&record.fields) {
                let Payload::RecordValueAlt(rva) = tree.payload(alt).clone() else {
                    return None;
                };
                let field_ty = tree.payload(field).declared_type()?;
                let converted =
                    transform_value(tree, rva.value?, field_ty, sem, allow_truncation)?;
                alts.push(tree.alloc(crate::nodes::RecordValueAlt {
                    name: rva.name,
                    value: Some(converted),
                }));
            }
            Some(tree.alloc(crate::nodes::RecordValue { alts }))
        }
        p if p.is_const_value() => transform_constant(tree, vo, to, sem, allow_truncation),
        _ => None,
    }
}

fn set_syntactic_type(tree: &mut Tree, value: NodeId, ty: NodeId) {
    match tree.payload_mut(value) {
        Payload::BitValue(v) => v.ty = Some(ty),
        Payload::BitvectorValue(v) => v.ty = Some(ty),
        Payload::BoolValue(v) => v.ty = Some(ty),
        Payload::CharValue(v) => v.ty = Some(ty),
        Payload::IntValue(v) => v.ty = Some(ty),
        Payload::RealValue(v) => v.ty = Some(ty),
        Payload::StringValue(v) => v.ty = Some(ty),
        Payload::TimeValue(v) => v.ty = Some(ty),
        _ => unreachable!("syntactic types exist on constants only"),
    }
    tree.relink_children(value);
}

fn literal_bit_char(tree: &Tree, value: NodeId) -> Option<char> {
    match tree.payload(value) {
        Payload::BitValue(b) => Some(b.value.to_char()),
        Payload::BoolValue(b) => Some(if b.value { '1' } else { '0' }),
        Payload::IntValue(v) if v.value == 0 || v.value == 1 => {
            Some(if v.value == 1 { '1' } else { '0' })
        }
        _ => None,
    }
}

fn warn_truncation(what: &str) {
    raise_unique_warning(&format!(
        "Truncating {what} constant while converting to a narrower type."
    ));
}

fn from_int(tree: &mut Tree, value: i64, base: NodeId, allow_truncation: bool) -> Option<NodeId> {
    match tree.payload(base).kind() {
        NodeKind::Int => {
            let width = type_bitwidth(tree, base).unwrap_or(64);
            let signed = type_is_signed(tree, base);
            let fits = fits_in(value, width, signed);
            if !fits {
                if !allow_truncation {
                    return None;
                }
                warn_truncation("integer");
                let truncated = truncate(value, width, signed);
                return Some(tree.alloc(IntValue::new(truncated)));
            }
            Some(tree.alloc(IntValue::new(value)))
        }
        NodeKind::Bitvector | NodeKind::Signed | NodeKind::Unsigned => {
            let width = type_bitwidth(tree, base)? as usize;
            let needed = bits_needed(value);
            if needed > width {
                if !allow_truncation {
                    return None;
                }
                warn_truncation("integer");
            }
            let sign = if value < 0 { '1' } else { '0' };
            let mut literal = String::with_capacity(width);
            for i in (0..width).rev() {
                // Positions beyond the value's width take the sign bit.
                let digit = if i >= 64 {
                    sign
                } else if (value >> i) & 1 == 1 {
                    '1'
                } else {
                    '0'
                };
                literal.push(digit);
            }
            Some(tree.alloc(BitvectorValue::new(&literal)))
        }
        NodeKind::Bit => match value {
            0 => Some(tree.alloc(BitValue::new(BitConstant::Zero))),
            1 => Some(tree.alloc(BitValue::new(BitConstant::One))),
            _ => {
                if !allow_truncation {
                    return None;
                }
                warn_truncation("integer");
                Some(tree.alloc(BitValue::new(BitConstant::One)))
            }
        },
        NodeKind::Bool => Some(tree.alloc(BoolValue::new(value != 0))),
        NodeKind::Real => Some(tree.alloc(RealValue::new(value as f64))),
        NodeKind::Char => {
            let c = u32::try_from(value).ok().and_then(char::from_u32)?;
            Some(tree.alloc(CharValue { value: c, ty: None }))
        }
        NodeKind::String => Some(tree.alloc(StringValue::new(&value.to_string()))),
        NodeKind::Time => Some(tree.alloc(TimeValue {
            value: value as f64,
            unit: crate::nodes::TimeUnit::Ns,
            ty: None,
        })),
        _ => None,
    }
}

fn from_bit(tree: &mut Tree, value: BitConstant, base: NodeId) -> Option<NodeId> {
    match tree.payload(base).kind() {
        NodeKind::Bit => Some(tree.alloc(BitValue::new(value))),
        // Bit-to-bitvector promotion replicates the bit across the span.
        NodeKind::Bitvector | NodeKind::Signed | NodeKind::Unsigned => {
            let width = type_bitwidth(tree, base)? as usize;
            let literal: String = std::iter::repeat(value.to_char()).take(width).collect();
            Some(tree.alloc(BitvectorValue::new(&literal)))
        }
        NodeKind::Bool => match value {
            BitConstant::Zero | BitConstant::L => Some(tree.alloc(BoolValue::new(false))),
            BitConstant::One | BitConstant::H => Some(tree.alloc(BoolValue::new(true))),
            _ => None,
        },
        NodeKind::Int => match value {
            BitConstant::Zero | BitConstant::L => Some(tree.alloc(IntValue::new(0))),
            BitConstant::One | BitConstant::H => Some(tree.alloc(IntValue::new(1))),
            _ => None,
        },
        _ => None,
    }
}

fn from_bitvector(
    tree: &mut Tree,
    value: &str,
    base: NodeId,
    allow_truncation: bool,
) -> Option<NodeId> {
    match tree.payload(base).kind() {
        NodeKind::Bitvector | NodeKind::Signed | NodeKind::Unsigned => {
            let width = type_bitwidth(tree, base)? as usize;
            let resized = resize_literal(tree, value, width, base, allow_truncation)?;
            Some(tree.alloc(BitvectorValue::new(&resized)))
        }
        NodeKind::Bit => {
            if value.len() != 1 && !allow_truncation {
                return None;
            }
            if value.len() != 1 {
                warn_truncation("bitvector");
            }
            let c = value.chars().last()?;
            Some(tree.alloc(BitValue::new(BitConstant::from_char(c)?)))
        }
        NodeKind::Int => {
            if !value.chars().all(|c| c == '0' || c == '1') {
                return None;
            }
            let parsed = i64::from_str_radix(value, 2).ok()?;
            Some(tree.alloc(IntValue::new(parsed)))
        }
        NodeKind::Bool => match value {
            v if v.chars().all(|c| c == '0') => Some(tree.alloc(BoolValue::new(false))),
            v if v.chars().all(|c| c == '0' || c == '1') => {
                Some(tree.alloc(BoolValue::new(v.contains('1'))))
            }
            _ => None,
        },
        _ => None,
    }
}

/// Logic/vector extension: widening pads with zeros (sign bit for signed
/// targets), narrowing drops the most significant digits.
fn resize_literal(
    tree: &Tree,
    value: &str,
    width: usize,
    base: NodeId,
    allow_truncation: bool,
) -> Option<String> {
    use std::cmp::Ordering;
    match value.len().cmp(&width) {
        Ordering::Equal => Some(value.to_owned()),
        Ordering::Less => {
            let pad = if type_is_signed(tree, base) {
                value.chars().next().unwrap_or('0')
            } else if type_is_logic(tree, base) && value.starts_with('Z') {
                'Z'
            } else {
                '0'
            };
            let mut out: String = std::iter::repeat(pad).take(width - value.len()).collect();
            out.push_str(value);
            Some(out)
        }
        Ordering::Greater => {
            if !allow_truncation {
                return None;
            }
            warn_truncation("bitvector");
            Some(value[value.len() - width..].to_owned())
        }
    }
}

fn from_real(tree: &mut Tree, value: f64, base: NodeId, allow_truncation: bool) -> Option<NodeId> {
    match tree.payload(base).kind() {
        NodeKind::Real => Some(tree.alloc(RealValue::new(value))),
        NodeKind::Int => {
            if value.fract() != 0.0 && !allow_truncation {
                return None;
            }
            if value.fract() != 0.0 {
                warn_truncation("real");
            }
            #[allow(clippy::cast_possible_truncation)]
            Some(tree.alloc(IntValue::new(value as i64)))
        }
        NodeKind::Bool => Some(tree.alloc(BoolValue::new(value != 0.0))),
        NodeKind::Time => Some(tree.alloc(TimeValue {
            value,
            unit: crate::nodes::TimeUnit::Ns,
            ty: None,
        })),
        _ => None,
    }
}

fn from_string(tree: &mut Tree, value: &str, base: NodeId) -> Option<NodeId> {
    match tree.payload(base).kind() {
        NodeKind::String => Some(tree.alloc(StringValue::new(value))),
        NodeKind::Char => {
            let mut chars = value.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            Some(tree.alloc(CharValue { value: c, ty: None }))
        }
        _ => None,
    }
}

fn from_time(
    tree: &mut Tree,
    value: f64,
    unit: crate::nodes::TimeUnit,
    base: NodeId,
) -> Option<NodeId> {
    match tree.payload(base).kind() {
        NodeKind::Time => Some(tree.alloc(TimeValue {
            value,
            unit,
            ty: None,
        })),
        NodeKind::Real => Some(tree.alloc(RealValue::new(value))),
        _ => None,
    }
}

fn bits_needed(value: i64) -> usize {
    if value >= 0 {
        (64 - value.leading_zeros()) as usize
    } else {
        (64 - value.leading_ones() + 1) as usize
    }
}

fn fits_in(value: i64, width: u64, signed: bool) -> bool {
    if width >= 64 {
        return true;
    }
    let value = i128::from(value);
    if signed {
        let min = -(1i128 << (width - 1));
        let max = (1i128 << (width - 1)) - 1;
        value >= min && value <= max
    } else {
        value >= 0 && value < (1i128 << width)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(value: i64, width: u64, signed: bool) -> i64 {
    if width >= 64 {
        return value;
    }
    let mask = (1i128 << width) - 1;
    let truncated = i128::from(value) & mask;
    let result = if signed && truncated & (1i128 << (width - 1)) != 0 {
        truncated - (1i128 << width)
    } else {
        truncated
    };
    result as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantics::{
        typing::make_downto_span,
        HifSemantics,
    };

    fn int_type(tree: &mut Tree, width: u64, signed: bool) -> NodeId {
        let span = make_downto_span(tree, width);
        tree.alloc(crate::nodes::Int::new(Some(span), signed, false))
    }

    #[test]
    fn narrowing_respects_the_truncation_flag() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();
        let value = tree.alloc(IntValue::new(300));
        let narrow = int_type(&mut tree, 8, false);

        assert!(transform_constant(&mut tree, value, narrow, sem, false).is_none());

        let truncated = transform_constant(&mut tree, value, narrow, sem, true)
            .expect("truncation allowed");
        let Payload::IntValue(v) = tree.payload(truncated) else {
            panic!("expected int");
        };
        assert_eq!(v.value, 300 & 0xff);
    }

    #[test]
    fn bit_promotes_across_a_vector_span() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();
        let bit = tree.alloc(BitValue::new(BitConstant::One));
        let span = make_downto_span(&mut tree, 4);
        let bv_ty = tree.alloc(crate::nodes::Bitvector {
            span: Some(span),
            logic: false,
            resolved: false,
            signed: false,
            constexpr: false,
            variant: crate::nodes::TypeVariant::Native,
        });
        let out = transform_constant(&mut tree, bit, bv_ty, sem, true).unwrap();
        let Payload::BitvectorValue(v) = tree.payload(out) else {
            panic!("expected bitvector");
        };
        assert_eq!(v.value, "1111");
    }

    #[test]
    fn aggregate_renders_into_a_literal() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();
        // (others => '0', [3] => '1') over bv<4> == "1000"
        let zero_ty = tree.alloc(crate::nodes::Bit::default());
        let zero = tree.alloc(BitValue {
            value: BitConstant::Zero,
            ty: Some(zero_ty),
        });
        let one = tree.alloc(BitValue::new(BitConstant::One));
        let idx = tree.alloc(IntValue::new(3));
        let alt = tree.alloc(crate::nodes::AggregateAlt {
            indices: vec![idx],
            value: Some(one),
        });
        let agg = tree.alloc(crate::nodes::Aggregate {
            alts: vec![alt],
            others: Some(zero),
        });
        let span = make_downto_span(&mut tree, 4);
        let bv_ty = tree.alloc(crate::nodes::Bitvector {
            span: Some(span),
            logic: false,
            resolved: false,
            signed: false,
            constexpr: false,
            variant: crate::nodes::TypeVariant::Native,
        });
        let out = transform_value(&mut tree, agg, bv_ty, sem, true).unwrap();
        let Payload::BitvectorValue(v) = tree.payload(out) else {
            panic!("expected bitvector");
        };
        assert_eq!(v.value, "1000");
    }
}
