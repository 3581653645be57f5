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

//! Common precision over multi-alternative constructs.
//!
//! For `Switch`, `With` and aggregates the discriminator and every alt
//! condition must agree on a type. The computation reduces the collected
//! operand types pairwise under the case-equality operator, carrying the
//! operation precision (not the returned type) as the accumulator.

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
        NodeKind,
        Operator,
        Payload,
    },
    semantics::{
        semantic_type_of,
        LanguageSemantics,
    },
    Result,
};

/// Input to [`analyze_precision_type`]. The operation is always the case
/// equality; it is recorded only for diagnostics.
pub struct AnalyzeParams {
    pub operation: Operator,
    pub operand_types: Vec<NodeId>,
    pub starting_obj: Option<NodeId>,
}

/// Reduces `params.operand_types` to the common precision, or `None` when
/// some pair does not admit the case equality.
pub fn analyze_precision_type(
    tree: &mut Tree,
    params: &AnalyzeParams,
    sem: &dyn LanguageSemantics,
) -> Option<NodeId> {
    debug_assert!(
        matches!(params.operation, Operator::Eq | Operator::CaseEq),
        "precision analysis is defined over equality only"
    );
    let mut types = params.operand_types.iter().copied();
    let first = types.next()?;
    let mut current = copy_subtree(tree, first, &mut CopyOptions::new());

    for next in types {
        let info = sem.operator_result(
            tree,
            Operator::CaseEq,
            Some(current),
            Some(next),
            params.starting_obj,
        );
        tree.free_subtree(current);
        let Some(returned) = info.returned_type else {
            if let Some(p) = info.operation_precision {
                tree.free_subtree(p);
            }
            return None;
        };
        tree.free_subtree(returned);
        current = info.operation_precision?;
    }

    Some(current)
}

/// The common precision of a `With`'s discriminator and alt conditions.
pub fn with_precision_type(
    tree: &mut Tree,
    with: NodeId,
    sem: &dyn LanguageSemantics,
) -> Result<Option<NodeId>> {
    let Payload::With(w) = tree.payload(with).clone() else {
        return Ok(None);
    };
    alt_precision(tree, w.condition, &w.alts, NodeKind::WithAlt, sem, with)
}

/// The common precision of a `Switch`'s discriminator and alt conditions.
pub fn switch_precision_type(
    tree: &mut Tree,
    switch: NodeId,
    sem: &dyn LanguageSemantics,
) -> Result<Option<NodeId>> {
    let Payload::Switch(s) = tree.payload(switch).clone() else {
        return Ok(None);
    };
    alt_precision(tree, s.condition, &s.alts, NodeKind::SwitchAlt, sem, switch)
}

fn alt_precision(
    tree: &mut Tree,
    condition: Option<NodeId>,
    alts: &[NodeId],
    alt_kind: NodeKind,
    sem: &dyn LanguageSemantics,
    source: NodeId,
) -> Result<Option<NodeId>> {
    let mut operand_types = Vec::new();

    for &alt in alts {
        if tree.kind(alt) != alt_kind {
            continue;
        }
        let conditions = match tree.payload(alt) {
            Payload::WithAlt(a) => a.conditions.clone(),
            Payload::SwitchAlt(a) => a.conditions.clone(),
            _ => continue,
        };
        for cond in conditions {
            // Range conditions contribute both of their bounds.
            if let Payload::Range(r) = tree.payload(cond).clone() {
                for bound in [r.left, r.right].into_iter().flatten() {
                    let Some(ty) = semantic_type_of(tree, bound, sem)? else {
                        return Ok(None);
                    };
                    operand_types.push(ty);
                }
                continue;
            }
            let Some(ty) = semantic_type_of(tree, cond, sem)? else {
                return Ok(None);
            };
            operand_types.push(ty);
        }
    }

    if let Some(condition) = condition {
        let Some(ty) = semantic_type_of(tree, condition, sem)? else {
            return Ok(None);
        };
        operand_types.push(ty);
    }

    let params = AnalyzeParams {
        operation: Operator::CaseEq,
        operand_types,
        starting_obj: Some(source),
    };
    Ok(analyze_precision_type(tree, &params, sem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        nodes::{
            BitvectorValue,
            Identifier,
            SwitchAlt,
            Variable,
        },
        semantics::{
            typing::{
                make_downto_span,
                type_bitwidth,
            },
            HifSemantics,
        },
    };

    #[test]
    fn switch_precision_covers_condition_and_alts() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();

        // switch (x) { case "0000": ...; case "1111": ... }
        let span = make_downto_span(&mut tree, 4);
        let ty = tree.alloc(crate::nodes::Bitvector {
            span: Some(span),
            logic: true,
            resolved: true,
            signed: false,
            constexpr: false,
            variant: crate::nodes::TypeVariant::Native,
        });
        let var = tree.alloc(Variable::new("x", Some(ty), None));
        let cond = tree.alloc(Identifier::new("x"));
        let c1 = tree.alloc(BitvectorValue::new("0000"));
        let c2 = tree.alloc(BitvectorValue::new("1111"));
        let alt1 = tree.alloc(SwitchAlt {
            conditions: vec![c1],
            actions: Vec::new(),
        });
        let alt2 = tree.alloc(SwitchAlt {
            conditions: vec![c2],
            actions: Vec::new(),
        });
        let switch = tree.alloc(crate::nodes::Switch {
            condition: Some(cond),
            alts: vec![alt1, alt2],
            defaults: Vec::new(),
            case_semantics: crate::nodes::CaseSemantics::Literal,
        });
        let state = tree.alloc(crate::nodes::State {
            name: "s".to_owned(),
            actions: vec![switch],
        });
        let table = tree.alloc(crate::nodes::StateTable {
            name: "p".to_owned(),
            declarations: vec![var],
            states: vec![state],
            ..crate::nodes::StateTable::default()
        });
        let _ = table;

        let precision = switch_precision_type(&mut tree, switch, sem)
            .unwrap()
            .expect("alts and condition agree");
        assert_eq!(type_bitwidth(&tree, precision), Some(4));
    }
}
