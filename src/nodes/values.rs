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

//! Value nodes.
//!
//! Constants carry an optional *syntactic* type slot recording the type the
//! literal was written with; the semantic type of any value is computed by
//! the type engine and cached on the tree, never stored here.

use crate::{
    arena::NodeId,
    nodes::{
        BitConstant,
        CaseSemantics,
        Operator,
        RangeDirection,
        TimeUnit,
    },
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BitValue {
    pub value: BitConstant,
    pub ty: Option<NodeId>,
}

impl BitValue {
    #[must_use]
    pub fn new(value: BitConstant) -> Self {
        Self { value, ty: None }
    }
}

impl_slots!(BitValue { one "TYPE" => ty });

/// Bitvector literal stored as its character spelling, e.g. `"10XZ"`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BitvectorValue {
    pub value: String,
    pub ty: Option<NodeId>,
}

impl BitvectorValue {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
            ty: None,
        }
    }

    /// True when every digit is plain binary.
    #[must_use]
    pub fn is_01(&self) -> bool {
        self.value.chars().all(|c| c == '0' || c == '1')
    }
}

impl_slots!(BitvectorValue { one "TYPE" => ty });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoolValue {
    pub value: bool,
    pub ty: Option<NodeId>,
}

impl BoolValue {
    #[must_use]
    pub fn new(value: bool) -> Self {
        Self { value, ty: None }
    }
}

impl_slots!(BoolValue { one "TYPE" => ty });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CharValue {
    pub value: char,
    pub ty: Option<NodeId>,
}

impl_slots!(CharValue { one "TYPE" => ty });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntValue {
    pub value: i64,
    pub ty: Option<NodeId>,
}

impl IntValue {
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self { value, ty: None }
    }
}

impl_slots!(IntValue { one "TYPE" => ty });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RealValue {
    pub value: f64,
    pub ty: Option<NodeId>,
}

impl RealValue {
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self { value, ty: None }
    }
}

impl_slots!(RealValue { one "TYPE" => ty });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StringValue {
    pub value: String,
    pub ty: Option<NodeId>,
}

impl StringValue {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
            ty: None,
        }
    }
}

impl_slots!(StringValue { one "TYPE" => ty });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeValue {
    pub value: f64,
    pub unit: TimeUnit,
    pub ty: Option<NodeId>,
}

impl_slots!(TimeValue { one "TYPE" => ty });

/// Composite literal: positional/indexed alternatives plus an `others` part.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aggregate {
    pub alts: Vec<NodeId>,
    pub others: Option<NodeId>,
}

impl_slots!(Aggregate { list "ALTS" => alts, one "OTHERS" => others });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordValue {
    pub alts: Vec<NodeId>,
}

impl_slots!(RecordValue { list "ALTS" => alts });

/// Unary or binary operation. `op2` is `None` for unary operators.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expression {
    pub operator: Operator,
    pub op1: Option<NodeId>,
    pub op2: Option<NodeId>,
}

impl Expression {
    #[must_use]
    pub fn new(operator: Operator, op1: NodeId, op2: Option<NodeId>) -> Self {
        Self {
            operator,
            op1: Some(op1),
            op2,
        }
    }
}

impl_slots!(Expression { one "OP1" => op1, one "OP2" => op2 });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cast {
    pub ty: Option<NodeId>,
    pub value: Option<NodeId>,
}

impl Cast {
    #[must_use]
    pub fn new(ty: NodeId, value: NodeId) -> Self {
        Self {
            ty: Some(ty),
            value: Some(value),
        }
    }
}

impl_slots!(Cast { one "TYPE" => ty, one "VALUE" => value });

/// Single-element selection: `prefix[index]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Member {
    pub prefix: Option<NodeId>,
    pub index: Option<NodeId>,
}

impl_slots!(Member { one "PREFIX" => prefix, one "INDEX" => index });

/// Contiguous selection: `prefix[span]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Slice {
    pub prefix: Option<NodeId>,
    pub span: Option<NodeId>,
}

impl_slots!(Slice { one "PREFIX" => prefix, one "SPAN" => span });

/// Field selection through a prefix value: `prefix.name`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldReference {
    pub prefix: Option<NodeId>,
    pub name: String,
}

impl_slots!(FieldReference { one "PREFIX" => prefix });

/// Plain name use; resolves to a data declaration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Identifier {
    pub name: String,
}

impl Identifier {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
        }
    }
}

impl_slots!(Identifier {});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub instance: Option<NodeId>,
    pub parameter_assigns: Vec<NodeId>,
    pub template_assigns: Vec<NodeId>,
}

impl FunctionCall {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }
}

impl_slots!(FunctionCall {
    one "INSTANCE" => instance,
    list "TEMPLATE_PARAMETER_ASSIGNS" => template_assigns,
    list "PARAMETER_ASSIGNS" => parameter_assigns,
});

/// Component instantiation; the referenced type is a `ViewReference`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Instance {
    pub name: String,
    pub referenced_type: Option<NodeId>,
    pub port_assigns: Vec<NodeId>,
    pub initial_value: Option<NodeId>,
}

impl_slots!(Instance {
    one "REFERENCED_TYPE" => referenced_type,
    list "PORT_ASSIGNS" => port_assigns,
    one "INITIAL_VALUE" => initial_value,
});

/// Ternary chain: the first alternative whose condition holds wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct When {
    pub alts: Vec<NodeId>,
    pub default: Option<NodeId>,
    pub logic_ternary: bool,
}

impl_slots!(When { list "ALTS" => alts, one "DEFAULT" => default });

/// Value switch over a discriminator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct With {
    pub condition: Option<NodeId>,
    pub alts: Vec<NodeId>,
    pub default: Option<NodeId>,
    pub case_semantics: CaseSemantics,
}

impl_slots!(With {
    one "CONDITION" => condition,
    list "ALTS" => alts,
    one "DEFAULT" => default,
});

/// Closed bound pair with a direction. Spans of types are ranges; ranges can
/// also appear as values (alt conditions, slice spans, for-loop iterations).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Range {
    pub direction: RangeDirection,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

impl Range {
    #[must_use]
    pub fn new(direction: RangeDirection, left: NodeId, right: NodeId) -> Self {
        Self {
            direction,
            left: Some(left),
            right: Some(right),
        }
    }
}

impl_slots!(Range { one "LEFT" => left, one "RIGHT" => right });
