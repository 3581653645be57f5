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

//! The closed AST schema.
//!
//! Payload
//! ├── types      (Bit, Bool, …, TypeReference, ViewReference)
//! ├── values     (constants, composites, operations, symbols)
//! ├── actions    (Assign, If, For, …)
//! ├── decls      (Variable, …, View, DesignUnit, System)
//! └── alts       (IfAlt, SwitchAlt, …, PortAssign, …TpAssign)
//!
//! Each kind owns a fixed set of named child slots; [`Payload::slots`]
//! exposes them in schema order, which is the one order traversal, printing
//! and structural comparison all agree on.

use crate::arena::NodeId;
use smallvec::SmallVec;

/// A named child slot, borrowed immutably.
pub enum Slot<'a> {
    One(&'static str, &'a Option<NodeId>),
    List(&'static str, &'a Vec<NodeId>),
}

/// A named child slot, borrowed mutably.
pub(crate) enum SlotMut<'a> {
    One(&'static str, &'a mut Option<NodeId>),
    List(&'static str, &'a mut Vec<NodeId>),
}

impl Slot<'_> {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::One(name, _) | Self::List(name, _) => name,
        }
    }
}

pub(crate) trait ChildSlots {
    fn slots(&self) -> SmallVec<[Slot<'_>; 4]>;
    fn slots_mut(&mut self) -> SmallVec<[SlotMut<'_>; 4]>;
}

macro_rules! impl_slots {
    ($t:ident { $($slot:ident $name:literal => $field:ident),* $(,)? }) => {
        impl crate::nodes::ChildSlots for $t {
            fn slots(&self) -> smallvec::SmallVec<[crate::nodes::Slot<'_>; 4]> {
                smallvec::smallvec![
                    $(impl_slots!(@ref $slot, $name, self.$field),)*
                ]
            }

            fn slots_mut(&mut self) -> smallvec::SmallVec<[crate::nodes::SlotMut<'_>; 4]> {
                smallvec::smallvec![
                    $(impl_slots!(@mut $slot, $name, self.$field),)*
                ]
            }
        }
    };
    (@ref one, $name:literal, $field:expr) => {
        crate::nodes::Slot::One($name, &$field)
    };
    (@ref list, $name:literal, $field:expr) => {
        crate::nodes::Slot::List($name, &$field)
    };
    (@mut one, $name:literal, $field:expr) => {
        crate::nodes::SlotMut::One($name, &mut $field)
    };
    (@mut list, $name:literal, $field:expr) => {
        crate::nodes::SlotMut::List($name, &mut $field)
    };
}

mod actions;
mod alts;
mod decls;
mod enums;
mod types;
mod values;

pub use actions::{
    Assign,
    Break,
    Continue,
    For,
    If,
    Null,
    ProcedureCall,
    Return,
    Switch,
    Transition,
    ValueStatement,
    Wait,
    While,
};
pub use alts::{
    AggregateAlt,
    IfAlt,
    ParameterAssign,
    PortAssign,
    RecordValueAlt,
    SwitchAlt,
    TypeTpAssign,
    ValueTpAssign,
    WhenAlt,
    WithAlt,
};
pub use decls::{
    Alias,
    Const,
    Contents,
    DesignUnit,
    Entity,
    EnumValue,
    Field,
    Function,
    Library,
    LibraryDef,
    Parameter,
    Port,
    Procedure,
    Signal,
    State,
    StateTable,
    System,
    TypeDef,
    TypeTp,
    ValueTp,
    Variable,
    VersionInfo,
    View,
};
pub use enums::{
    BitConstant,
    CaseSemantics,
    LanguageId,
    Operator,
    PortDirection,
    RangeDirection,
    SubProgramKind,
    TimeUnit,
    TypeVariant,
};
pub use types::{
    Array,
    Bit,
    Bitvector,
    Bool,
    Char,
    Enum,
    Event,
    File,
    Int,
    Pointer,
    Real,
    Record,
    Reference,
    Signed,
    StringType,
    Time,
    TypeReference,
    Unsigned,
    ViewReference,
};
pub use values::{
    Aggregate,
    BitValue,
    BitvectorValue,
    BoolValue,
    Cast,
    CharValue,
    Expression,
    FieldReference,
    FunctionCall,
    Identifier,
    Instance,
    IntValue,
    Member,
    Range,
    RealValue,
    RecordValue,
    Slice,
    StringValue,
    TimeValue,
    When,
    With,
};

macro_rules! define_payload {
    ($($kind:ident($t:ident) => $name:literal,)+) => {
        /// The kind-specific data of a node.
        #[derive(Clone, Debug, PartialEq)]
        pub enum Payload {
            $($kind($t),)+
        }

        /// The kind tag alone.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum NodeKind {
            $($kind,)+
        }

        impl NodeKind {
            /// Stable UPPER_SNAKE spelling used by both serializers.
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$kind => $name,)+
                }
            }

            #[must_use]
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$kind),)+
                    _ => None,
                }
            }
        }

        impl Payload {
            #[must_use]
            pub fn kind(&self) -> NodeKind {
                match self {
                    $(Self::$kind(_) => NodeKind::$kind,)+
                }
            }

            /// Named child slots in schema order.
            #[must_use]
            pub fn slots(&self) -> SmallVec<[Slot<'_>; 4]> {
                match self {
                    $(Self::$kind(x) => x.slots(),)+
                }
            }

            pub(crate) fn slots_mut(&mut self) -> SmallVec<[SlotMut<'_>; 4]> {
                match self {
                    $(Self::$kind(x) => x.slots_mut(),)+
                }
            }
        }

        $(
            impl From<$t> for Payload {
                fn from(value: $t) -> Self {
                    Self::$kind(value)
                }
            }
        )+
    };
}

define_payload! {
    // types
    Bit(Bit) => "BIT",
    Bool(Bool) => "BOOL",
    Char(Char) => "CHAR",
    Int(Int) => "INT",
    Real(Real) => "REAL",
    Bitvector(Bitvector) => "BITVECTOR",
    Signed(Signed) => "SIGNED",
    Unsigned(Unsigned) => "UNSIGNED",
    Array(Array) => "ARRAY",
    Record(Record) => "RECORD",
    Enum(Enum) => "ENUM",
    String(StringType) => "STRING",
    Time(Time) => "TIME",
    File(File) => "FILE",
    Event(Event) => "EVENT",
    Pointer(Pointer) => "POINTER",
    Reference(Reference) => "REFERENCE",
    TypeReference(TypeReference) => "TYPE_REFERENCE",
    ViewReference(ViewReference) => "VIEW_REFERENCE",
    // values
    BitValue(BitValue) => "BIT_VALUE",
    BitvectorValue(BitvectorValue) => "BITVECTOR_VALUE",
    BoolValue(BoolValue) => "BOOL_VALUE",
    CharValue(CharValue) => "CHAR_VALUE",
    IntValue(IntValue) => "INT_VALUE",
    RealValue(RealValue) => "REAL_VALUE",
    StringValue(StringValue) => "STRING_VALUE",
    TimeValue(TimeValue) => "TIME_VALUE",
    Aggregate(Aggregate) => "AGGREGATE",
    RecordValue(RecordValue) => "RECORD_VALUE",
    Expression(Expression) => "EXPRESSION",
    Cast(Cast) => "CAST",
    Member(Member) => "MEMBER",
    Slice(Slice) => "SLICE",
    FieldReference(FieldReference) => "FIELD_REFERENCE",
    Identifier(Identifier) => "IDENTIFIER",
    FunctionCall(FunctionCall) => "FUNCTION_CALL",
    Instance(Instance) => "INSTANCE",
    When(When) => "WHEN",
    With(With) => "WITH",
    Range(Range) => "RANGE",
    // actions
    Assign(Assign) => "ASSIGN",
    ProcedureCall(ProcedureCall) => "PROCEDURE_CALL",
    If(If) => "IF",
    For(For) => "FOR",
    While(While) => "WHILE",
    Switch(Switch) => "SWITCH",
    Return(Return) => "RETURN",
    Break(Break) => "BREAK",
    Continue(Continue) => "CONTINUE",
    Null(Null) => "NULL",
    Wait(Wait) => "WAIT",
    ValueStatement(ValueStatement) => "VALUE_STATEMENT",
    Transition(Transition) => "TRANSITION",
    // declarations
    Variable(Variable) => "VARIABLE",
    Signal(Signal) => "SIGNAL",
    Port(Port) => "PORT",
    Const(Const) => "CONST",
    Alias(Alias) => "ALIAS",
    Parameter(Parameter) => "PARAMETER",
    EnumValue(EnumValue) => "ENUM_VALUE",
    Field(Field) => "FIELD",
    TypeDef(TypeDef) => "TYPE_DEF",
    ValueTp(ValueTp) => "VALUE_TP",
    TypeTp(TypeTp) => "TYPE_TP",
    Function(Function) => "FUNCTION",
    Procedure(Procedure) => "PROCEDURE",
    View(View) => "VIEW",
    DesignUnit(DesignUnit) => "DESIGN_UNIT",
    Entity(Entity) => "ENTITY",
    Contents(Contents) => "CONTENTS",
    LibraryDef(LibraryDef) => "LIBRARY_DEF",
    Library(Library) => "LIBRARY",
    StateTable(StateTable) => "STATE_TABLE",
    State(State) => "STATE",
    System(System) => "SYSTEM",
    // alts and assigns
    IfAlt(IfAlt) => "IF_ALT",
    SwitchAlt(SwitchAlt) => "SWITCH_ALT",
    WhenAlt(WhenAlt) => "WHEN_ALT",
    WithAlt(WithAlt) => "WITH_ALT",
    AggregateAlt(AggregateAlt) => "AGGREGATE_ALT",
    RecordValueAlt(RecordValueAlt) => "RECORD_VALUE_ALT",
    PortAssign(PortAssign) => "PORT_ASSIGN",
    ParameterAssign(ParameterAssign) => "PARAMETER_ASSIGN",
    ValueTpAssign(ValueTpAssign) => "VALUE_TP_ASSIGN",
    TypeTpAssign(TypeTpAssign) => "TYPE_TP_ASSIGN",
}

impl Payload {
    pub(crate) fn for_each_child(&self, f: &mut dyn FnMut(NodeId)) {
        for slot in self.slots() {
            match slot {
                Slot::One(_, child) => {
                    if let Some(id) = child {
                        f(*id);
                    }
                }
                Slot::List(_, children) => {
                    for id in children {
                        f(*id);
                    }
                }
            }
        }
    }

    /// Removes `id` from whichever slot holds it. Returns false if no slot
    /// does.
    pub(crate) fn remove_child_id(&mut self, id: NodeId) -> bool {
        for slot in self.slots_mut() {
            match slot {
                SlotMut::One(_, child) => {
                    if *child == Some(id) {
                        *child = None;
                        return true;
                    }
                }
                SlotMut::List(_, children) => {
                    if let Some(pos) = children.iter().position(|&c| c == id) {
                        children.remove(pos);
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Swaps `new` into the slot position currently holding `old`.
    pub(crate) fn replace_child_id(&mut self, old: NodeId, new: NodeId) -> bool {
        for slot in self.slots_mut() {
            match slot {
                SlotMut::One(_, child) => {
                    if *child == Some(old) {
                        *child = Some(new);
                        return true;
                    }
                }
                SlotMut::List(_, children) => {
                    if let Some(pos) = children.iter().position(|&c| c == old) {
                        children[pos] = new;
                        return true;
                    }
                }
            }
        }
        false
    }

    #[must_use]
    pub fn is_type(&self) -> bool {
        matches!(
            self.kind(),
            NodeKind::Bit
                | NodeKind::Bool
                | NodeKind::Char
                | NodeKind::Int
                | NodeKind::Real
                | NodeKind::Bitvector
                | NodeKind::Signed
                | NodeKind::Unsigned
                | NodeKind::Array
                | NodeKind::Record
                | NodeKind::Enum
                | NodeKind::String
                | NodeKind::Time
                | NodeKind::File
                | NodeKind::Event
                | NodeKind::Pointer
                | NodeKind::Reference
                | NodeKind::TypeReference
                | NodeKind::ViewReference
        )
    }

    #[must_use]
    pub fn is_value(&self) -> bool {
        matches!(
            self.kind(),
            NodeKind::BitValue
                | NodeKind::BitvectorValue
                | NodeKind::BoolValue
                | NodeKind::CharValue
                | NodeKind::IntValue
                | NodeKind::RealValue
                | NodeKind::StringValue
                | NodeKind::TimeValue
                | NodeKind::Aggregate
                | NodeKind::RecordValue
                | NodeKind::Expression
                | NodeKind::Cast
                | NodeKind::Member
                | NodeKind::Slice
                | NodeKind::FieldReference
                | NodeKind::Identifier
                | NodeKind::FunctionCall
                | NodeKind::Instance
                | NodeKind::When
                | NodeKind::With
                | NodeKind::Range
        )
    }

    #[must_use]
    pub fn is_const_value(&self) -> bool {
        matches!(
            self.kind(),
            NodeKind::BitValue
                | NodeKind::BitvectorValue
                | NodeKind::BoolValue
                | NodeKind::CharValue
                | NodeKind::IntValue
                | NodeKind::RealValue
                | NodeKind::StringValue
                | NodeKind::TimeValue
        )
    }

    #[must_use]
    pub fn is_declaration(&self) -> bool {
        matches!(
            self.kind(),
            NodeKind::Variable
                | NodeKind::Signal
                | NodeKind::Port
                | NodeKind::Const
                | NodeKind::Alias
                | NodeKind::Parameter
                | NodeKind::EnumValue
                | NodeKind::Field
                | NodeKind::TypeDef
                | NodeKind::ValueTp
                | NodeKind::TypeTp
                | NodeKind::Function
                | NodeKind::Procedure
                | NodeKind::View
                | NodeKind::DesignUnit
                | NodeKind::Entity
                | NodeKind::Contents
                | NodeKind::LibraryDef
                | NodeKind::StateTable
                | NodeKind::State
                | NodeKind::System
        )
    }

    /// Data declarations: a name, a declared type, an optional initial value.
    #[must_use]
    pub fn is_data_declaration(&self) -> bool {
        matches!(
            self.kind(),
            NodeKind::Variable
                | NodeKind::Signal
                | NodeKind::Port
                | NodeKind::Const
                | NodeKind::Alias
                | NodeKind::Parameter
                | NodeKind::EnumValue
                | NodeKind::Field
                | NodeKind::ValueTp
        )
    }

    /// Symbols are non-owning references resolved by name through the
    /// declaration resolver.
    #[must_use]
    pub fn is_symbol(&self) -> bool {
        matches!(
            self.kind(),
            NodeKind::Identifier
                | NodeKind::FieldReference
                | NodeKind::FunctionCall
                | NodeKind::ProcedureCall
                | NodeKind::Instance
                | NodeKind::TypeReference
                | NodeKind::ViewReference
                | NodeKind::Library
                | NodeKind::PortAssign
                | NodeKind::ParameterAssign
                | NodeKind::ValueTpAssign
                | NodeKind::TypeTpAssign
        )
    }

    /// Scopes the declaration resolver walks outward through.
    #[must_use]
    pub fn is_scope(&self) -> bool {
        matches!(
            self.kind(),
            NodeKind::StateTable
                | NodeKind::Function
                | NodeKind::Procedure
                | NodeKind::View
                | NodeKind::Entity
                | NodeKind::Contents
                | NodeKind::For
                | NodeKind::LibraryDef
                | NodeKind::System
        )
    }

    /// The declared name, for kinds that carry one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Variable(x) => Some(&x.name),
            Self::Signal(x) => Some(&x.name),
            Self::Port(x) => Some(&x.name),
            Self::Const(x) => Some(&x.name),
            Self::Alias(x) => Some(&x.name),
            Self::Parameter(x) => Some(&x.name),
            Self::EnumValue(x) => Some(&x.name),
            Self::Field(x) => Some(&x.name),
            Self::TypeDef(x) => Some(&x.name),
            Self::ValueTp(x) => Some(&x.name),
            Self::TypeTp(x) => Some(&x.name),
            Self::Function(x) => Some(&x.name),
            Self::Procedure(x) => Some(&x.name),
            Self::View(x) => Some(&x.name),
            Self::DesignUnit(x) => Some(&x.name),
            Self::Entity(x) => Some(&x.name),
            Self::Contents(x) => Some(&x.name),
            Self::LibraryDef(x) => Some(&x.name),
            Self::Library(x) => Some(&x.name),
            Self::StateTable(x) => Some(&x.name),
            Self::State(x) => Some(&x.name),
            Self::System(x) => Some(&x.name),
            Self::Identifier(x) => Some(&x.name),
            Self::FieldReference(x) => Some(&x.name),
            Self::FunctionCall(x) => Some(&x.name),
            Self::ProcedureCall(x) => Some(&x.name),
            Self::Instance(x) => Some(&x.name),
            Self::TypeReference(x) => Some(&x.name),
            Self::ViewReference(x) => Some(&x.name),
            Self::PortAssign(x) => Some(&x.name),
            Self::ParameterAssign(x) => Some(&x.name),
            Self::ValueTpAssign(x) => Some(&x.name),
            Self::TypeTpAssign(x) => Some(&x.name),
            _ => None,
        }
    }

    pub fn set_name(&mut self, name: &str) {
        let target = match self {
            Self::Variable(x) => &mut x.name,
            Self::Signal(x) => &mut x.name,
            Self::Port(x) => &mut x.name,
            Self::Const(x) => &mut x.name,
            Self::Alias(x) => &mut x.name,
            Self::Parameter(x) => &mut x.name,
            Self::EnumValue(x) => &mut x.name,
            Self::Field(x) => &mut x.name,
            Self::TypeDef(x) => &mut x.name,
            Self::ValueTp(x) => &mut x.name,
            Self::TypeTp(x) => &mut x.name,
            Self::Function(x) => &mut x.name,
            Self::Procedure(x) => &mut x.name,
            Self::View(x) => &mut x.name,
            Self::DesignUnit(x) => &mut x.name,
            Self::Entity(x) => &mut x.name,
            Self::Contents(x) => &mut x.name,
            Self::LibraryDef(x) => &mut x.name,
            Self::Library(x) => &mut x.name,
            Self::StateTable(x) => &mut x.name,
            Self::State(x) => &mut x.name,
            Self::System(x) => &mut x.name,
            Self::Identifier(x) => &mut x.name,
            Self::FieldReference(x) => &mut x.name,
            Self::FunctionCall(x) => &mut x.name,
            Self::ProcedureCall(x) => &mut x.name,
            Self::Instance(x) => &mut x.name,
            Self::TypeReference(x) => &mut x.name,
            Self::ViewReference(x) => &mut x.name,
            Self::PortAssign(x) => &mut x.name,
            Self::ParameterAssign(x) => &mut x.name,
            Self::ValueTpAssign(x) => &mut x.name,
            Self::TypeTpAssign(x) => &mut x.name,
            _ => return,
        };
        *target = name.to_owned();
    }

    /// The declared type slot of a data declaration.
    #[must_use]
    pub fn declared_type(&self) -> Option<NodeId> {
        match self {
            Self::Variable(x) => x.ty,
            Self::Signal(x) => x.ty,
            Self::Port(x) => x.ty,
            Self::Const(x) => x.ty,
            Self::Alias(x) => x.ty,
            Self::Parameter(x) => x.ty,
            Self::EnumValue(x) => x.ty,
            Self::Field(x) => x.ty,
            Self::ValueTp(x) => x.ty,
            Self::TypeDef(x) => x.ty,
            _ => None,
        }
    }

    /// The initial-value slot of a data declaration.
    #[must_use]
    pub fn initial_value(&self) -> Option<NodeId> {
        match self {
            Self::Variable(x) => x.init,
            Self::Signal(x) => x.init,
            Self::Port(x) => x.init,
            Self::Const(x) => x.init,
            Self::Alias(x) => x.init,
            Self::Parameter(x) => x.init,
            Self::EnumValue(x) => x.init,
            Self::Field(x) => x.init,
            Self::ValueTp(x) => x.init,
            _ => None,
        }
    }

    /// Whether this declaration belongs to a standard-library subtree.
    #[must_use]
    pub fn is_standard(&self) -> bool {
        match self {
            Self::Variable(x) => x.standard,
            Self::Signal(x) => x.standard,
            Self::Const(x) => x.standard,
            Self::Alias(x) => x.standard,
            Self::TypeDef(x) => x.standard,
            Self::Function(x) => x.standard,
            Self::Procedure(x) => x.standard,
            Self::View(x) => x.standard,
            Self::LibraryDef(x) => x.standard,
            Self::Library(x) => x.standard,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in [
            NodeKind::Bitvector,
            NodeKind::TypeReference,
            NodeKind::ValueTpAssign,
            NodeKind::System,
            NodeKind::String,
        ] {
            assert_eq!(NodeKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(NodeKind::from_name("NOT_A_KIND"), None);
    }

    #[test]
    fn slot_schema_is_stable() {
        let with = With {
            condition: None,
            alts: Vec::new(),
            default: None,
            case_semantics: CaseSemantics::Literal,
        };
        let payload = Payload::from(with);
        let names: Vec<_> = payload.slots().iter().map(Slot::name).collect();
        assert_eq!(names, ["CONDITION", "ALTS", "DEFAULT"]);
    }
}
