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

//! Action nodes: the statements of a process body.

use crate::{
    arena::NodeId,
    nodes::CaseSemantics,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assign {
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    /// Intra-assignment delay, when the source language has one.
    pub delay: Option<NodeId>,
}

impl Assign {
    #[must_use]
    pub fn new(left: NodeId, right: NodeId) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
            delay: None,
        }
    }
}

impl_slots!(Assign {
    one "LEFT_HAND_SIDE" => left,
    one "RIGHT_HAND_SIDE" => right,
    one "DELAY" => delay,
});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcedureCall {
    pub name: String,
    pub instance: Option<NodeId>,
    pub parameter_assigns: Vec<NodeId>,
    pub template_assigns: Vec<NodeId>,
}

impl ProcedureCall {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }
}

impl_slots!(ProcedureCall {
    one "INSTANCE" => instance,
    list "TEMPLATE_PARAMETER_ASSIGNS" => template_assigns,
    list "PARAMETER_ASSIGNS" => parameter_assigns,
});

/// `If` holds its branches as `IfAlt`s; `defaults` is the else body.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct If {
    pub alts: Vec<NodeId>,
    pub defaults: Vec<NodeId>,
}

impl_slots!(If { list "ALTS" => alts, list "DEFAULTS" => defaults });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct For {
    pub label: String,
    pub init_declarations: Vec<NodeId>,
    pub init_values: Vec<NodeId>,
    pub condition: Option<NodeId>,
    pub step_actions: Vec<NodeId>,
    pub for_actions: Vec<NodeId>,
}

impl_slots!(For {
    list "INIT_DECLARATIONS" => init_declarations,
    list "INIT_VALUES" => init_values,
    one "CONDITION" => condition,
    list "STEP_ACTIONS" => step_actions,
    list "FOR_ACTIONS" => for_actions,
});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct While {
    pub label: String,
    pub condition: Option<NodeId>,
    pub actions: Vec<NodeId>,
    pub do_while: bool,
}

impl_slots!(While { one "CONDITION" => condition, list "ACTIONS" => actions });

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Switch {
    pub condition: Option<NodeId>,
    pub alts: Vec<NodeId>,
    pub defaults: Vec<NodeId>,
    pub case_semantics: CaseSemantics,
}

impl_slots!(Switch {
    one "CONDITION" => condition,
    list "ALTS" => alts,
    list "DEFAULTS" => defaults,
});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Return {
    pub value: Option<NodeId>,
}

impl_slots!(Return { one "VALUE" => value });

/// Break out of the loop labelled `name` (innermost when empty).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Break {
    pub name: String,
}

impl_slots!(Break {});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Continue {
    pub name: String,
}

impl_slots!(Continue {});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Null;

impl_slots!(Null {});

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Wait {
    pub condition: Option<NodeId>,
    pub time: Option<NodeId>,
    pub repetitions: Option<NodeId>,
    pub sensitivity: Vec<NodeId>,
    pub actions: Vec<NodeId>,
}

impl_slots!(Wait {
    one "CONDITION" => condition,
    one "TIME" => time,
    one "REPETITIONS" => repetitions,
    list "SENSITIVITY" => sensitivity,
    list "ACTIONS" => actions,
});

/// A value evaluated for its side effects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueStatement {
    pub value: Option<NodeId>,
}

impl_slots!(ValueStatement { one "VALUE" => value });

/// Edge of a state machine inside a `StateTable`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transition {
    pub source: String,
    pub destination: String,
    pub enabling_labels: Vec<NodeId>,
    pub enabling: Vec<NodeId>,
    pub updates: Vec<NodeId>,
}

impl_slots!(Transition {
    list "ENABLING_LABELS" => enabling_labels,
    list "ENABLING" => enabling,
    list "UPDATES" => updates,
});
