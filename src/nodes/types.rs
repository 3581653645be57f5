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

//! Type nodes. Span slots hold [`Range`](super::Range) nodes.

use crate::{
    arena::NodeId,
    nodes::TypeVariant,
};

/// Single bit; `logic` selects 9-valued logic over plain binary.
#[derive(Clone, Debug, PartialEq)]
pub struct Bit {
    pub logic: bool,
    pub resolved: bool,
    pub constexpr: bool,
    pub variant: TypeVariant,
}

impl Bit {
    #[must_use]
    pub fn new(logic: bool, resolved: bool, constexpr: bool) -> Self {
        Self {
            logic,
            resolved,
            constexpr,
            variant: TypeVariant::Native,
        }
    }
}

impl Default for Bit {
    fn default() -> Self {
        Self::new(false, false, false)
    }
}

impl_slots!(Bit {});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bool {
    pub constexpr: bool,
    pub variant: TypeVariant,
}

impl_slots!(Bool {});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Char {
    pub constexpr: bool,
    pub variant: TypeVariant,
}

impl_slots!(Char {});

/// Integer with an optional span constraining its bit width.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Int {
    pub span: Option<NodeId>,
    pub signed: bool,
    pub constexpr: bool,
    pub variant: TypeVariant,
}

impl Int {
    #[must_use]
    pub fn new(span: Option<NodeId>, signed: bool, constexpr: bool) -> Self {
        Self {
            span,
            signed,
            constexpr,
            variant: TypeVariant::Native,
        }
    }
}

impl_slots!(Int { one "SPAN" => span });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Real {
    pub span: Option<NodeId>,
    pub constexpr: bool,
    pub variant: TypeVariant,
}

impl_slots!(Real { one "SPAN" => span });

/// Packed vector of bits.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bitvector {
    pub span: Option<NodeId>,
    pub logic: bool,
    pub resolved: bool,
    pub signed: bool,
    pub constexpr: bool,
    pub variant: TypeVariant,
}

impl_slots!(Bitvector { one "SPAN" => span });

/// VHDL `signed` vector.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Signed {
    pub span: Option<NodeId>,
    pub constexpr: bool,
    pub variant: TypeVariant,
}

impl_slots!(Signed { one "SPAN" => span });

/// VHDL `unsigned` vector.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Unsigned {
    pub span: Option<NodeId>,
    pub constexpr: bool,
    pub variant: TypeVariant,
}

impl_slots!(Unsigned { one "SPAN" => span });

/// Array over an index span of an arbitrary element type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Array {
    pub span: Option<NodeId>,
    pub ty: Option<NodeId>,
    pub signed: bool,
    pub variant: TypeVariant,
}

impl_slots!(Array { one "SPAN" => span, one "TYPE" => ty });

/// Ordered field list; `packed` and `union` mirror the source language.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    pub fields: Vec<NodeId>,
    pub packed: bool,
    pub union_: bool,
    pub variant: TypeVariant,
}

impl_slots!(Record { list "FIELDS" => fields });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Enum {
    pub values: Vec<NodeId>,
    pub variant: TypeVariant,
}

impl_slots!(Enum { list "VALUES" => values });

/// Character string. Named to avoid clashing with `std::string::String`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StringType {
    pub span: Option<NodeId>,
    pub constexpr: bool,
    pub variant: TypeVariant,
}

impl_slots!(StringType { one "SPAN" => span });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Time {
    pub constexpr: bool,
    pub variant: TypeVariant,
}

impl_slots!(Time {});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct File {
    pub ty: Option<NodeId>,
    pub variant: TypeVariant,
}

impl_slots!(File { one "TYPE" => ty });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Event {
    pub variant: TypeVariant,
}

impl_slots!(Event {});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pointer {
    pub ty: Option<NodeId>,
    pub variant: TypeVariant,
}

impl_slots!(Pointer { one "TYPE" => ty });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reference {
    pub ty: Option<NodeId>,
    pub variant: TypeVariant,
}

impl_slots!(Reference { one "TYPE" => ty });

/// A type variable or an alias application: a name resolving to a `TypeDef`
/// or `TypeTp`, optionally applied to template arguments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeReference {
    pub name: String,
    pub instance: Option<NodeId>,
    pub template_assigns: Vec<NodeId>,
    pub variant: TypeVariant,
}

impl TypeReference {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }
}

impl_slots!(TypeReference {
    one "INSTANCE" => instance,
    list "TEMPLATE_PARAMETER_ASSIGNS" => template_assigns,
});

/// A reference to a `View` of a `DesignUnit`, usable as a type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewReference {
    pub design_unit: String,
    pub name: String,
    pub instance: Option<NodeId>,
    pub template_assigns: Vec<NodeId>,
    pub variant: TypeVariant,
}

impl ViewReference {
    #[must_use]
    pub fn new(design_unit: &str, name: &str) -> Self {
        Self {
            design_unit: design_unit.to_owned(),
            name: name.to_owned(),
            ..Self::default()
        }
    }
}

impl_slots!(ViewReference {
    one "INSTANCE" => instance,
    list "TEMPLATE_PARAMETER_ASSIGNS" => template_assigns,
});
