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

//! Alternative nodes of multi-branch constructs and the by-name binding
//! nodes of call and instantiation sites.

use crate::{
    arena::NodeId,
    nodes::PortDirection,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IfAlt {
    pub condition: Option<NodeId>,
    pub actions: Vec<NodeId>,
}

impl_slots!(IfAlt { one "CONDITION" => condition, list "ACTIONS" => actions });

/// A `Switch` case: one or more matching conditions (values or ranges).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SwitchAlt {
    pub conditions: Vec<NodeId>,
    pub actions: Vec<NodeId>,
}

impl_slots!(SwitchAlt { list "CONDITIONS" => conditions, list "ACTIONS" => actions });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WhenAlt {
    pub condition: Option<NodeId>,
    pub value: Option<NodeId>,
}

impl_slots!(WhenAlt { one "CONDITION" => condition, one "VALUE" => value });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct WithAlt {
    pub conditions: Vec<NodeId>,
    pub value: Option<NodeId>,
}

impl_slots!(WithAlt { list "CONDITIONS" => conditions, one "VALUE" => value });

/// Indexed part of an `Aggregate`; indices may be values or ranges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregateAlt {
    pub indices: Vec<NodeId>,
    pub value: Option<NodeId>,
}

impl_slots!(AggregateAlt { list "INDICES" => indices, one "VALUE" => value });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordValueAlt {
    pub name: String,
    pub value: Option<NodeId>,
}

impl_slots!(RecordValueAlt { one "VALUE" => value });

/// Binds a port by name at an instantiation site. The `ty` slot records the
/// bound type when the binding needs an explicit conversion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PortAssign {
    pub name: String,
    pub direction: PortDirection,
    pub value: Option<NodeId>,
    pub ty: Option<NodeId>,
}

impl_slots!(PortAssign { one "VALUE" => value, one "TYPE" => ty });

/// Binds a subprogram parameter by name at a call site.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterAssign {
    pub name: String,
    pub direction: PortDirection,
    pub value: Option<NodeId>,
}

impl ParameterAssign {
    #[must_use]
    pub fn new(name: &str, value: NodeId) -> Self {
        Self {
            name: name.to_owned(),
            direction: PortDirection::None,
            value: Some(value),
        }
    }
}

impl_slots!(ParameterAssign { one "VALUE" => value });

/// Binds a value template parameter by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueTpAssign {
    pub name: String,
    pub value: Option<NodeId>,
}

impl ValueTpAssign {
    #[must_use]
    pub fn new(name: &str, value: NodeId) -> Self {
        Self {
            name: name.to_owned(),
            value: Some(value),
        }
    }
}

impl_slots!(ValueTpAssign { one "VALUE" => value });

/// Binds a type template parameter by name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeTpAssign {
    pub name: String,
    pub ty: Option<NodeId>,
}

impl_slots!(TypeTpAssign { one "TYPE" => ty });
