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

//! Per-language semantics.
//!
//! A [`LanguageSemantics`] answers three questions over the AST: what is
//! the type of this value, what does an operator applied to these operand
//! types return (and at which precision), and what is the default value of
//! a type. [`HifSemantics`] is the permissive reference; [`VerilogSemantics`]
//! is strict.
//!
//! "Operation not allowed" is an empty [`ExprTypeInfo`], never an error;
//! the caller decides whether to coerce or to surface a diagnostic.

mod hif;
mod precision;
pub mod typing;
mod verilog;

pub use hif::HifSemantics;
pub use precision::{
    analyze_precision_type,
    switch_precision_type,
    with_precision_type,
    AnalyzeParams,
};
pub use typing::{
    base_type_of,
    invalidate_types,
    semantic_type_of,
    type_tree,
};
pub use verilog::VerilogSemantics;

use crate::{
    arena::{
        NodeId,
        Tree,
    },
    nodes::{
        LanguageId,
        Operator,
        RangeDirection,
    },
};

/// Result of typing an operator application: the type the expression
/// evaluates to, and the precision the operation is carried out at. Both
/// are owned, detached subtrees in the tree's arena. Empty = not allowed.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExprTypeInfo {
    pub returned_type: Option<NodeId>,
    pub operation_precision: Option<NodeId>,
}

impl ExprTypeInfo {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.returned_type.is_some()
    }

    /// Frees both subtrees; call when discarding an intermediate analysis.
    pub fn free(self, tree: &mut Tree) {
        if let Some(t) = self.returned_type {
            tree.free_subtree(t);
        }
        if let Some(t) = self.operation_precision {
            tree.free_subtree(t);
        }
    }
}

/// What a `For` condition may be in the language.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ForConditionType {
    Expression,
    Range,
    RangeAndExpression,
}

/// Static flags describing the scope rules of a language.
#[derive(Clone, Debug)]
pub struct SemanticOptions {
    /// Input ports must not carry initial values.
    pub port_in_no_initial_value: bool,
    /// Output ports may carry initial values.
    pub port_out_initial_value: bool,
    /// Data declarations may carry initial values.
    pub data_declaration_initial_value: bool,
    /// Scoped types may nest inside typedefs.
    pub scoped_type_inside_typedef: bool,
    /// Design units are restricted to a single view.
    pub design_unit_unique_view: bool,
    /// For loops may declare their index implicitly.
    pub for_implicit_index: bool,
    pub for_condition_type: ForConditionType,
    /// `With` (value switch) has no native rendition.
    pub with_is_not_allowed: bool,
    /// Case expressions must be literals.
    pub case_is_only_literal: bool,
    /// The language has a don't-care bit value.
    pub lang_has_dont_care: bool,
    /// The language has the full 9-valued logic alphabet.
    pub lang_has_9_logic: bool,
    /// Waits may carry action bodies.
    pub wait_with_actions: bool,
}

/// The capability every concrete semantics provides.
pub trait LanguageSemantics {
    fn name(&self) -> &'static str;

    fn semantic_options(&self) -> &SemanticOptions;

    /// Types `op` applied to operands of types `t1` (and `t2` for binary
    /// operators). `source` is the originating node, used for
    /// context-precision propagation where the language defines it.
    fn operator_result(
        &self,
        tree: &mut Tree,
        op: Operator,
        t1: Option<NodeId>,
        t2: Option<NodeId>,
        source: Option<NodeId>,
    ) -> ExprTypeInfo;

    /// Constructs the canonical initial value of `ty`, or `None` when the
    /// type has none (events, foreign views).
    fn type_default_value(
        &self,
        tree: &mut Tree,
        ty: NodeId,
        decl: Option<NodeId>,
    ) -> Option<NodeId>;

    /// Lowers `ty` into the language's allowed subset. Returns a fresh
    /// subtree.
    fn map_type(&self, tree: &mut Tree, ty: NodeId) -> Option<NodeId>;

    /// Lowers an operator similarly. Identity for both shipped semantics.
    fn map_operator(&self, op: Operator) -> Operator {
        op
    }

    /// Assigns a type to a literal constant. Fresh subtree.
    fn type_for_constant(&self, tree: &mut Tree, constant: NodeId) -> Option<NodeId>;

    /// Whether a value of type `ty` is a legal boolean guard.
    fn check_condition(&self, tree: &Tree, ty: NodeId) -> bool;

    /// Wraps `value` in the language-legal boolean conversion. `None` when
    /// the value cannot be used as a guard at all.
    fn explicit_bool_conversion(&self, tree: &mut Tree, value: NodeId) -> Option<NodeId>;

    /// Wraps a *copy* of `value` in a language-legal cast to `dst`.
    fn explicit_cast(
        &self,
        tree: &mut Tree,
        value: NodeId,
        dst: NodeId,
        src: Option<NodeId>,
    ) -> NodeId;

    /// Whether `ty` may type a compile-time template parameter.
    fn is_template_allowed_type(&self, tree: &Tree, ty: NodeId) -> bool;

    /// Coerces `ty` to a template-legal type. Fresh subtree.
    fn template_allowed_type(&self, tree: &mut Tree, ty: NodeId) -> NodeId;

    fn is_type_allowed(&self, tree: &Tree, ty: NodeId) -> bool;

    /// `None` when `ty` is already a legal range bound type; otherwise the
    /// type bounds must be cast to. Fresh subtree.
    fn type_allowed_as_bound(&self, tree: &mut Tree, ty: NodeId) -> Option<NodeId>;

    fn is_type_allowed_as_case(&self, tree: &Tree, ty: NodeId) -> bool;

    fn is_type_allowed_as_port(&self, tree: &Tree, ty: NodeId) -> bool;

    fn is_cast_allowed(&self, tree: &Tree, target: NodeId, source: NodeId) -> bool;

    fn is_range_direction_allowed(&self, direction: RangeDirection) -> bool;

    fn is_language_id_allowed(&self, id: LanguageId) -> bool;

    /// Whether the syntactic type recorded on a constant is acceptable.
    fn is_type_allowed_for_const_value(
        &self,
        tree: &mut Tree,
        constant: NodeId,
        syn_type: NodeId,
    ) -> bool;
}
