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

//! Declaration nodes.
//!
//! Data declarations share the `(name, ty, init)` shape; compound scopes own
//! their member lists. `System` is the root of a complete design.

use crate::{
    arena::NodeId,
    nodes::{
        LanguageId,
        PortDirection,
        SubProgramKind,
    },
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: Option<NodeId>,
    pub init: Option<NodeId>,
    pub standard: bool,
}

impl Variable {
    #[must_use]
    pub fn new(name: &str, ty: Option<NodeId>, init: Option<NodeId>) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            init,
            standard: false,
        }
    }
}

impl_slots!(Variable { one "TYPE" => ty, one "VALUE" => init });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Signal {
    pub name: String,
    pub ty: Option<NodeId>,
    pub init: Option<NodeId>,
    pub standard: bool,
    /// Signals introduced by fixes rather than by the source design.
    pub wrapper: bool,
}

impl Signal {
    #[must_use]
    pub fn new(name: &str, ty: Option<NodeId>, init: Option<NodeId>) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            init,
            standard: false,
            wrapper: false,
        }
    }
}

impl_slots!(Signal { one "TYPE" => ty, one "VALUE" => init });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Port {
    pub name: String,
    pub direction: PortDirection,
    pub ty: Option<NodeId>,
    pub init: Option<NodeId>,
    pub wrapper: bool,
}

impl Port {
    #[must_use]
    pub fn new(name: &str, direction: PortDirection, ty: Option<NodeId>) -> Self {
        Self {
            name: name.to_owned(),
            direction,
            ty,
            init: None,
            wrapper: false,
        }
    }
}

impl_slots!(Port { one "TYPE" => ty, one "VALUE" => init });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Const {
    pub name: String,
    pub ty: Option<NodeId>,
    pub init: Option<NodeId>,
    pub standard: bool,
    /// Distinguishes a per-instance constant from a shared one.
    pub instance: bool,
}

impl Const {
    #[must_use]
    pub fn new(name: &str, ty: Option<NodeId>, init: Option<NodeId>) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            init,
            standard: false,
            instance: true,
        }
    }
}

impl_slots!(Const { one "TYPE" => ty, one "VALUE" => init });

/// Alternate name for the value stored in `init`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Alias {
    pub name: String,
    pub ty: Option<NodeId>,
    pub init: Option<NodeId>,
    pub standard: bool,
}

impl_slots!(Alias { one "TYPE" => ty, one "VALUE" => init });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub direction: PortDirection,
    pub ty: Option<NodeId>,
    pub init: Option<NodeId>,
}

impl Parameter {
    #[must_use]
    pub fn new(name: &str, ty: Option<NodeId>) -> Self {
        Self {
            name: name.to_owned(),
            direction: PortDirection::In,
            ty,
            init: None,
        }
    }
}

impl_slots!(Parameter { one "TYPE" => ty, one "VALUE" => init });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnumValue {
    pub name: String,
    pub ty: Option<NodeId>,
    pub init: Option<NodeId>,
}

impl EnumValue {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ty: None,
            init: None,
        }
    }
}

impl_slots!(EnumValue { one "TYPE" => ty, one "VALUE" => init });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Option<NodeId>,
    pub init: Option<NodeId>,
}

impl Field {
    #[must_use]
    pub fn new(name: &str, ty: Option<NodeId>) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            init: None,
        }
    }
}

impl_slots!(Field { one "TYPE" => ty, one "VALUE" => init });

/// Named type, possibly templated. `opaque` hides the definition from
/// base-type resolution.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub ty: Option<NodeId>,
    pub template_parameters: Vec<NodeId>,
    pub opaque: bool,
    pub external: bool,
    pub standard: bool,
}

impl_slots!(TypeDef {
    list "TEMPLATE_PARAMETERS" => template_parameters,
    one "TYPE" => ty,
});

/// Value template parameter. When `compile_time_constant` is set, every
/// argument bound to it must fold to a constant under the target semantics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueTp {
    pub name: String,
    pub ty: Option<NodeId>,
    pub init: Option<NodeId>,
    pub compile_time_constant: bool,
}

impl ValueTp {
    #[must_use]
    pub fn new(name: &str, ty: Option<NodeId>, init: Option<NodeId>) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            init,
            compile_time_constant: true,
        }
    }
}

impl_slots!(ValueTp { one "TYPE" => ty, one "VALUE" => init });

/// Type template parameter; `ty` is the default argument.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeTp {
    pub name: String,
    pub ty: Option<NodeId>,
}

impl_slots!(TypeTp { one "TYPE" => ty });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Function {
    pub name: String,
    pub kind: SubProgramKind,
    pub standard: bool,
    pub template_parameters: Vec<NodeId>,
    pub parameters: Vec<NodeId>,
    pub return_type: Option<NodeId>,
    pub state_table: Option<NodeId>,
}

impl_slots!(Function {
    list "TEMPLATE_PARAMETERS" => template_parameters,
    list "PARAMETERS" => parameters,
    one "RETURN_TYPE" => return_type,
    one "STATE_TABLE" => state_table,
});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Procedure {
    pub name: String,
    pub kind: SubProgramKind,
    pub standard: bool,
    pub template_parameters: Vec<NodeId>,
    pub parameters: Vec<NodeId>,
    pub state_table: Option<NodeId>,
}

impl_slots!(Procedure {
    list "TEMPLATE_PARAMETERS" => template_parameters,
    list "PARAMETERS" => parameters,
    one "STATE_TABLE" => state_table,
});

/// One implementation of a design unit: interface (`entity`) plus body
/// (`contents`), with its own declarations and template parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct View {
    pub name: String,
    pub language_id: LanguageId,
    pub standard: bool,
    pub template_parameters: Vec<NodeId>,
    pub libraries: Vec<NodeId>,
    pub declarations: Vec<NodeId>,
    pub entity: Option<NodeId>,
    pub contents: Option<NodeId>,
}

impl_slots!(View {
    list "TEMPLATE_PARAMETERS" => template_parameters,
    list "LIBRARIES" => libraries,
    list "DECLARATIONS" => declarations,
    one "ENTITY" => entity,
    one "CONTENTS" => contents,
});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DesignUnit {
    pub name: String,
    pub views: Vec<NodeId>,
}

impl DesignUnit {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            views: Vec::new(),
        }
    }
}

impl_slots!(DesignUnit { list "VIEWS" => views });

/// The interface of a view: generic parameters and ports.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entity {
    pub name: String,
    pub parameters: Vec<NodeId>,
    pub ports: Vec<NodeId>,
}

impl_slots!(Entity { list "PARAMETERS" => parameters, list "PORTS" => ports });

/// The body of a view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contents {
    pub name: String,
    pub libraries: Vec<NodeId>,
    pub declarations: Vec<NodeId>,
    pub instances: Vec<NodeId>,
    pub state_tables: Vec<NodeId>,
    pub global_actions: Vec<NodeId>,
}

impl_slots!(Contents {
    list "LIBRARIES" => libraries,
    list "DECLARATIONS" => declarations,
    list "INSTANCES" => instances,
    list "STATE_TABLES" => state_tables,
    list "GLOBAL_ACTIONS" => global_actions,
});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LibraryDef {
    pub name: String,
    pub language_id: LanguageId,
    pub standard: bool,
    pub libraries: Vec<NodeId>,
    pub declarations: Vec<NodeId>,
}

impl_slots!(LibraryDef {
    list "LIBRARIES" => libraries,
    list "DECLARATIONS" => declarations,
});

/// A use of a library definition; a symbol, not an owning declaration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Library {
    pub name: String,
    pub filename: String,
    pub instance: Option<NodeId>,
    pub standard: bool,
    pub system: bool,
}

impl_slots!(Library { one "INSTANCE" => instance });

/// A process: sensitivity plus either plain states or a full machine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateTable {
    pub name: String,
    pub standard: bool,
    pub dont_initialize: bool,
    pub declarations: Vec<NodeId>,
    pub sensitivity: Vec<NodeId>,
    pub sensitivity_pos: Vec<NodeId>,
    pub sensitivity_neg: Vec<NodeId>,
    pub states: Vec<NodeId>,
}

impl_slots!(StateTable {
    list "DECLARATIONS" => declarations,
    list "SENSITIVITY" => sensitivity,
    list "SENSITIVITY_POS" => sensitivity_pos,
    list "SENSITIVITY_NEG" => sensitivity_neg,
    list "STATES" => states,
});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct State {
    pub name: String,
    pub actions: Vec<NodeId>,
}

impl State {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            actions: Vec::new(),
        }
    }
}

impl_slots!(State { list "ACTIONS" => actions });

/// Version stamp written into the root before serialization.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VersionInfo {
    pub release: String,
    pub tool: String,
    pub generation_date: String,
    pub format_version_major: u32,
    pub format_version_minor: u32,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            release: String::new(),
            tool: String::new(),
            generation_date: String::new(),
            format_version_major: 7,
            format_version_minor: 0,
        }
    }
}

/// Root of a complete design.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct System {
    pub name: String,
    pub language_id: LanguageId,
    pub version_info: VersionInfo,
    pub libraries: Vec<NodeId>,
    pub library_defs: Vec<NodeId>,
    pub declarations: Vec<NodeId>,
    pub design_units: Vec<NodeId>,
    pub actions: Vec<NodeId>,
}

impl System {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }
}

impl_slots!(System {
    list "LIBRARIES" => libraries,
    list "LIBRARY_DEFS" => library_defs,
    list "DECLARATIONS" => declarations,
    list "DESIGN_UNITS" => design_units,
    list "ACTIONS" => actions,
});
