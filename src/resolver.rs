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

//! Name → declaration resolution.
//!
//! Resolution walks outward from a symbol through its enclosing scopes
//! (state tables, subprograms, views/entities, library definitions, system)
//! and finally through the visible library definitions. Overload resolution
//! for calls selects the candidate whose parameter types admit the actual
//! argument types under the semantics' assignment rule. The answer is
//! memoized on the tree; passes that move, rename, shadow or delete
//! declarations must call [`invalidate_declarations`] on the affected
//! subtree, after which resolution happens lazily again.

use crate::{
    arena::{
        NodeId,
        Tree,
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
    Error,
    Result,
};

/// Resolves `symbol` to its declaration under `sem`.
///
/// `Ok(None)` means *not found*; the caller decides whether that is fatal
/// (strict mode, see [`resolve_symbol_strict`]) or tolerable (during
/// construction). An ambiguous overload set is always an error.
pub fn resolve_symbol(
    tree: &mut Tree,
    symbol: NodeId,
    sem: &dyn LanguageSemantics,
) -> Result<Option<NodeId>> {
    if let Some(&cached) = tree.decl_cache.get(&symbol) {
        // Stale entries are possible after passes free declarations; the
        // generation check catches them and triggers re-resolution.
        if tree.contains(cached) {
            return Ok(Some(cached));
        }
        tree.decl_cache.remove(&symbol);
    }

    let resolved = match tree.kind(symbol) {
        NodeKind::Identifier => resolve_identifier(tree, symbol)?,
        NodeKind::FunctionCall => resolve_call(tree, symbol, NodeKind::Function, sem)?,
        NodeKind::ProcedureCall => resolve_call(tree, symbol, NodeKind::Procedure, sem)?,
        NodeKind::TypeReference => resolve_type_reference(tree, symbol)?,
        NodeKind::ViewReference => resolve_view_reference(tree, symbol)?,
        NodeKind::Instance => resolve_instance(tree, symbol, sem)?,
        NodeKind::Library => resolve_library(tree, symbol),
        NodeKind::PortAssign => resolve_port_assign(tree, symbol, sem)?,
        NodeKind::ParameterAssign => resolve_referenced_assign(tree, symbol, false, sem)?,
        NodeKind::ValueTpAssign | NodeKind::TypeTpAssign => {
            resolve_referenced_assign(tree, symbol, true, sem)?
        }
        // Field references resolve through the prefix type; the type engine
        // performs that projection itself.
        NodeKind::FieldReference => None,
        _ => None,
    };

    if let Some(decl) = resolved {
        tree.decl_cache.insert(symbol, decl);
    }
    Ok(resolved)
}

/// Strict-mode resolution: *not found* is fatal, and a call whose resolved
/// declaration does not admit the actual argument types under the
/// semantics' assignment rule is a type mismatch.
pub fn resolve_symbol_strict(
    tree: &mut Tree,
    symbol: NodeId,
    sem: &dyn LanguageSemantics,
) -> Result<NodeId> {
    let name = tree
        .payload(symbol)
        .name()
        .map(str::to_owned)
        .unwrap_or_default();
    let Some(decl) = resolve_symbol(tree, symbol, sem)? else {
        return Err(Error::DeclarationNotFound(name));
    };
    if matches!(
        tree.kind(symbol),
        NodeKind::FunctionCall | NodeKind::ProcedureCall
    ) && !admits_call_arguments(tree, symbol, decl, sem)?
    {
        return Err(Error::DeclarationTypeMismatch(name));
    }
    Ok(decl)
}

/// Drops the memoized declaration of every symbol in the subtree at `root`.
pub fn invalidate_declarations(tree: &mut Tree, root: NodeId) {
    for id in tree.descendants(root) {
        tree.decl_cache.remove(&id);
    }
}

/// All symbols under `root` that resolve to `decl`.
pub fn collect_references(
    tree: &mut Tree,
    decl: NodeId,
    root: NodeId,
    sem: &dyn LanguageSemantics,
) -> Result<Vec<NodeId>> {
    let name = tree
        .payload(decl)
        .name()
        .map(str::to_owned)
        .unwrap_or_default();
    let mut out = Vec::new();
    for id in tree.descendants(root) {
        if id == decl {
            continue;
        }
        let payload = tree.payload(id);
        if !payload.is_symbol() {
            continue;
        }
        if payload.name() != Some(name.as_str()) {
            continue;
        }
        if resolve_symbol(tree, id, sem)? == Some(decl) {
            out.push(id);
        }
    }
    Ok(out)
}

/// The declaration names directly visible in `scope`, including template
/// parameters, subprogram parameters and entity ports where applicable.
fn scope_declarations(tree: &Tree, scope: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    match tree.payload(scope) {
        Payload::StateTable(x) => out.extend(&x.declarations),
        Payload::Function(x) => {
            out.extend(&x.template_parameters);
            out.extend(&x.parameters);
        }
        Payload::Procedure(x) => {
            out.extend(&x.template_parameters);
            out.extend(&x.parameters);
        }
        Payload::View(x) => {
            out.extend(&x.template_parameters);
            out.extend(&x.declarations);
            if let Some(entity) = x.entity {
                if let Payload::Entity(e) = tree.payload(entity) {
                    out.extend(&e.parameters);
                    out.extend(&e.ports);
                }
            }
        }
        Payload::Entity(x) => {
            out.extend(&x.parameters);
            out.extend(&x.ports);
        }
        Payload::Contents(x) => out.extend(&x.declarations),
        Payload::For(x) => out.extend(&x.init_declarations),
        Payload::LibraryDef(x) => out.extend(&x.declarations),
        Payload::System(x) => out.extend(&x.declarations),
        _ => {}
    }
    out
}

fn enclosing_scopes(tree: &Tree, from: NodeId) -> Vec<NodeId> {
    let mut scopes = Vec::new();
    let mut current = Some(from);
    while let Some(id) = current {
        if tree.payload(id).is_scope() {
            scopes.push(id);
        }
        current = tree.parent(id);
    }
    scopes
}

fn system_of(tree: &Tree, from: NodeId) -> Option<NodeId> {
    let mut current = Some(from);
    while let Some(id) = current {
        if tree.kind(id) == NodeKind::System {
            return Some(id);
        }
        current = tree.parent(id);
    }
    None
}

/// Enum members are declared inside the `Enum` type of a `TypeDef`; a plain
/// identifier can name them from the surrounding scope.
fn enum_member_in(tree: &Tree, decl: NodeId, name: &str) -> Option<NodeId> {
    let Payload::TypeDef(td) = tree.payload(decl) else {
        return None;
    };
    let Payload::Enum(e) = tree.payload(td.ty?) else {
        return None;
    };
    e.values
        .iter()
        .copied()
        .find(|&v| tree.payload(v).name() == Some(name))
}

fn resolve_identifier(tree: &mut Tree, symbol: NodeId) -> Result<Option<NodeId>> {
    let Payload::Identifier(ident) = tree.payload(symbol) else {
        unreachable!("resolve_identifier on a non-identifier");
    };
    let name = ident.name.clone();

    for scope in enclosing_scopes(tree, symbol) {
        for decl in scope_declarations(tree, scope) {
            let payload = tree.payload(decl);
            if payload.is_data_declaration() && payload.name() == Some(name.as_str()) {
                return Ok(Some(decl));
            }
            if let Some(member) = enum_member_in(tree, decl, &name) {
                return Ok(Some(member));
            }
        }
    }

    // Library scope: declarations of every library definition of the system.
    if let Some(system) = system_of(tree, symbol) {
        let Payload::System(sys) = tree.payload(system) else {
            unreachable!();
        };
        for libdef in sys.library_defs.clone() {
            let Payload::LibraryDef(ld) = tree.payload(libdef) else {
                continue;
            };
            for decl in ld.declarations.clone() {
                let payload = tree.payload(decl);
                if payload.is_data_declaration() && payload.name() == Some(name.as_str()) {
                    return Ok(Some(decl));
                }
                if let Some(member) = enum_member_in(tree, decl, &name) {
                    return Ok(Some(member));
                }
            }
        }
    }

    Ok(None)
}

/// The call's arguments in binding order: the binding name (empty for
/// positional association) and the argument value.
fn call_arguments(tree: &Tree, call: NodeId) -> Vec<(String, Option<NodeId>)> {
    let assigns = match tree.payload(call) {
        Payload::FunctionCall(c) => &c.parameter_assigns,
        Payload::ProcedureCall(c) => &c.parameter_assigns,
        _ => return Vec::new(),
    };
    assigns
        .iter()
        .filter_map(|&a| match tree.payload(a) {
            Payload::ParameterAssign(pa) => Some((pa.name.clone(), pa.value)),
            _ => None,
        })
        .collect()
}

/// Whether every argument of `call` is admitted by the corresponding
/// parameter of `decl` under the semantics' assignment rule. Arguments and
/// parameters that cannot be typed yet are tolerated; only a computed
/// `operator_result(op_assign, …)` rejection counts as a mismatch.
fn admits_call_arguments(
    tree: &mut Tree,
    call: NodeId,
    decl: NodeId,
    sem: &dyn LanguageSemantics,
) -> Result<bool> {
    let params: Vec<NodeId> = match tree.payload(decl) {
        Payload::Function(f) => f.parameters.clone(),
        Payload::Procedure(p) => p.parameters.clone(),
        _ => return Ok(true),
    };

    for (position, (binding, value)) in call_arguments(tree, call).into_iter().enumerate() {
        let param = if binding.is_empty() {
            params.get(position).copied()
        } else {
            params
                .iter()
                .copied()
                .find(|&p| tree.payload(p).name() == Some(binding.as_str()))
        };
        let Some(param) = param else {
            return Ok(false);
        };
        let Some(param_ty) = tree.payload(param).declared_type() else {
            continue;
        };
        let Some(value) = value else {
            continue;
        };
        let Some(arg_ty) = semantic_type_of(tree, value, sem)? else {
            continue;
        };
        let info = sem.operator_result(tree, Operator::Assign, Some(param_ty), Some(arg_ty), None);
        let allowed = info.is_allowed();
        info.free(tree);
        if !allowed {
            return Ok(false);
        }
    }
    Ok(true)
}

/// A call is applicable to a candidate when every named argument matches a
/// parameter and no more arguments are given than parameters exist. When
/// several candidates of a scope pass that filter, the overload is decided
/// by the assignment rule: only candidates whose every parameter admits the
/// corresponding argument type survive. More than one survivor is
/// ambiguous.
fn resolve_call(
    tree: &mut Tree,
    symbol: NodeId,
    kind: NodeKind,
    sem: &dyn LanguageSemantics,
) -> Result<Option<NodeId>> {
    let (name, arg_names, arg_count) = {
        let (name, assigns) = match tree.payload(symbol) {
            Payload::FunctionCall(c) => (c.name.clone(), c.parameter_assigns.clone()),
            Payload::ProcedureCall(c) => (c.name.clone(), c.parameter_assigns.clone()),
            _ => unreachable!("resolve_call on a non-call"),
        };
        let mut names = Vec::new();
        for assign in &assigns {
            if let Payload::ParameterAssign(pa) = tree.payload(*assign) {
                if !pa.name.is_empty() {
                    names.push(pa.name.clone());
                }
            }
        }
        (name, names, assigns.len())
    };

    let mut scope_chain = enclosing_scopes(tree, symbol);
    if let Some(system) = system_of(tree, symbol) {
        let Payload::System(sys) = tree.payload(system) else {
            unreachable!();
        };
        scope_chain.extend(sys.library_defs.clone());
    }

    for scope in scope_chain {
        let mut applicable = Vec::new();
        for decl in scope_declarations(tree, scope) {
            if tree.kind(decl) != kind && tree.kind(decl) != NodeKind::Function {
                continue;
            }
            if tree.payload(decl).name() != Some(name.as_str()) {
                continue;
            }
            let params: Vec<NodeId> = match tree.payload(decl) {
                Payload::Function(f) => f.parameters.clone(),
                Payload::Procedure(p) => p.parameters.clone(),
                _ => continue,
            };
            if arg_count > params.len() {
                continue;
            }
            let param_names: Vec<String> = params
                .iter()
                .filter_map(|&p| tree.payload(p).name().map(str::to_owned))
                .collect();
            if arg_names
                .iter()
                .all(|n| param_names.iter().any(|p| p == n))
            {
                applicable.push(decl);
            }
        }

        // A lone candidate wins without type checks; resolution stays
        // tolerant while the tree is still under construction.
        match applicable.len() {
            0 => continue,
            1 => return Ok(Some(applicable[0])),
            _ => {}
        }

        let mut compatible = Vec::new();
        for &decl in &applicable {
            if admits_call_arguments(tree, symbol, decl, sem)? {
                compatible.push(decl);
            }
        }
        match compatible.len() {
            // Nothing type-checks here; an outer scope may still hold the
            // intended declaration.
            0 => continue,
            1 => return Ok(Some(compatible[0])),
            _ => return Err(Error::AmbiguousDeclaration(name)),
        }
    }

    Ok(None)
}

fn resolve_type_reference(tree: &mut Tree, symbol: NodeId) -> Result<Option<NodeId>> {
    let Payload::TypeReference(tr) = tree.payload(symbol) else {
        unreachable!();
    };
    let name = tr.name.clone();

    let mut scope_chain = enclosing_scopes(tree, symbol);
    if let Some(system) = system_of(tree, symbol) {
        let Payload::System(sys) = tree.payload(system) else {
            unreachable!();
        };
        scope_chain.extend(sys.library_defs.clone());
    }

    for scope in scope_chain {
        for decl in scope_declarations(tree, scope) {
            let payload = tree.payload(decl);
            if matches!(payload.kind(), NodeKind::TypeDef | NodeKind::TypeTp)
                && payload.name() == Some(name.as_str())
            {
                return Ok(Some(decl));
            }
        }
    }
    Ok(None)
}

fn resolve_view_reference(tree: &mut Tree, symbol: NodeId) -> Result<Option<NodeId>> {
    let Payload::ViewReference(vr) = tree.payload(symbol) else {
        unreachable!();
    };
    let unit_name = vr.design_unit.clone();
    let view_name = vr.name.clone();

    let Some(system) = system_of(tree, symbol) else {
        return Ok(None);
    };
    let Payload::System(sys) = tree.payload(system) else {
        unreachable!();
    };
    for unit in sys.design_units.clone() {
        let Payload::DesignUnit(du) = tree.payload(unit) else {
            continue;
        };
        if du.name != unit_name {
            continue;
        }
        let views = du.views.clone();
        if view_name.is_empty() {
            if views.len() == 1 {
                return Ok(Some(views[0]));
            }
            return Err(Error::AmbiguousDeclaration(unit_name));
        }
        for view in views {
            if tree.payload(view).name() == Some(view_name.as_str()) {
                return Ok(Some(view));
            }
        }
    }
    Ok(None)
}

fn resolve_instance(
    tree: &mut Tree,
    symbol: NodeId,
    sem: &dyn LanguageSemantics,
) -> Result<Option<NodeId>> {
    let Payload::Instance(inst) = tree.payload(symbol) else {
        unreachable!();
    };
    match inst.referenced_type {
        Some(vr) if tree.kind(vr) == NodeKind::ViewReference => resolve_symbol(tree, vr, sem),
        _ => Ok(None),
    }
}

fn resolve_library(tree: &mut Tree, symbol: NodeId) -> Option<NodeId> {
    let Payload::Library(lib) = tree.payload(symbol) else {
        unreachable!();
    };
    let name = lib.name.clone();
    let system = system_of(tree, symbol)?;
    let Payload::System(sys) = tree.payload(system) else {
        unreachable!();
    };
    sys.library_defs
        .clone()
        .into_iter()
        .find(|&ld| tree.payload(ld).name() == Some(name.as_str()))
}

fn resolve_port_assign(
    tree: &mut Tree,
    symbol: NodeId,
    sem: &dyn LanguageSemantics,
) -> Result<Option<NodeId>> {
    let Payload::PortAssign(pa) = tree.payload(symbol) else {
        unreachable!();
    };
    let name = pa.name.clone();
    let Some(instance) = tree.nearest_parent(symbol, |p| p.kind() == NodeKind::Instance) else {
        return Ok(None);
    };
    let Some(view) = resolve_symbol(tree, instance, sem)? else {
        return Ok(None);
    };
    let Payload::View(v) = tree.payload(view) else {
        return Ok(None);
    };
    let Some(entity) = v.entity else {
        return Ok(None);
    };
    let Payload::Entity(e) = tree.payload(entity) else {
        return Ok(None);
    };
    Ok(e.ports
        .clone()
        .into_iter()
        .find(|&p| tree.payload(p).name() == Some(name.as_str())))
}

/// `ParameterAssign` resolves against the called subprogram's parameters;
/// `ValueTpAssign`/`TypeTpAssign` (`template` = true) against the template
/// parameters of whatever declaration the enclosing reference names.
fn resolve_referenced_assign(
    tree: &mut Tree,
    symbol: NodeId,
    template: bool,
    sem: &dyn LanguageSemantics,
) -> Result<Option<NodeId>> {
    let name = tree
        .payload(symbol)
        .name()
        .map(str::to_owned)
        .unwrap_or_default();
    let Some(site) = tree.nearest_parent(symbol, |p| {
        matches!(
            p.kind(),
            NodeKind::FunctionCall
                | NodeKind::ProcedureCall
                | NodeKind::TypeReference
                | NodeKind::ViewReference
        )
    }) else {
        return Ok(None);
    };
    let Some(decl) = resolve_symbol(tree, site, sem)? else {
        return Ok(None);
    };
    let pool: Vec<NodeId> = match tree.payload(decl) {
        Payload::Function(f) => {
            if template {
                f.template_parameters.clone()
            } else {
                f.parameters.clone()
            }
        }
        Payload::Procedure(p) => {
            if template {
                p.template_parameters.clone()
            } else {
                p.parameters.clone()
            }
        }
        Payload::View(v) => v.template_parameters.clone(),
        Payload::TypeDef(td) => td.template_parameters.clone(),
        _ => return Ok(None),
    };
    Ok(pool
        .into_iter()
        .find(|&p| tree.payload(p).name() == Some(name.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        nodes::{
            Contents,
            Function,
            FunctionCall,
            Identifier,
            IntValue,
            Parameter,
            ParameterAssign,
            RealValue,
            Variable,
        },
        semantics::HifSemantics,
    };

    #[test]
    fn identifier_resolves_through_scopes_and_memoizes() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();
        let ty = tree.alloc(crate::nodes::Int::default());
        let init = tree.alloc(IntValue::new(0));
        let var = tree.alloc(Variable::new("x", Some(ty), Some(init)));
        let use_site = tree.alloc(Identifier::new("x"));
        let value_stmt = tree.alloc(crate::nodes::ValueStatement {
            value: Some(use_site),
        });
        let _contents = tree.alloc(Contents {
            name: "behav".to_owned(),
            declarations: vec![var],
            global_actions: vec![value_stmt],
            ..Contents::default()
        });

        assert_eq!(resolve_symbol(&mut tree, use_site, sem).unwrap(), Some(var));
        // Second lookup is served by the cache.
        assert!(tree.decl_cache.contains_key(&use_site));
        assert_eq!(resolve_symbol(&mut tree, use_site, sem).unwrap(), Some(var));

        invalidate_declarations(&mut tree, value_stmt);
        assert!(!tree.decl_cache.contains_key(&use_site));
        assert_eq!(resolve_symbol(&mut tree, use_site, sem).unwrap(), Some(var));
    }

    #[test]
    fn inner_declarations_shadow_outer_ones() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();
        let outer_var = tree.alloc(Variable::new("x", None, None));
        let inner_var = tree.alloc(Variable::new("x", None, None));
        let use_site = tree.alloc(Identifier::new("x"));
        let stmt = tree.alloc(crate::nodes::ValueStatement {
            value: Some(use_site),
        });
        let state = tree.alloc(crate::nodes::State {
            name: "run".to_owned(),
            actions: vec![stmt],
        });
        let table = tree.alloc(crate::nodes::StateTable {
            name: "proc".to_owned(),
            declarations: vec![inner_var],
            states: vec![state],
            ..crate::nodes::StateTable::default()
        });
        let _contents = tree.alloc(Contents {
            name: "behav".to_owned(),
            declarations: vec![outer_var],
            state_tables: vec![table],
            ..Contents::default()
        });

        assert_eq!(
            resolve_symbol(&mut tree, use_site, sem).unwrap(),
            Some(inner_var)
        );
    }

    /// Two `f` overloads in one scope, told apart only by parameter type:
    /// `f(Real)` and `f(Time)`. An `Int` argument is admitted by the real
    /// overload (integers promote to reals) but not by the time one.
    fn build_overloads(tree: &mut Tree) -> (NodeId, NodeId, NodeId) {
        let real_ty = tree.alloc(crate::nodes::Real::default());
        let real_param = tree.alloc(Parameter::new("v", Some(real_ty)));
        let f_real = tree.alloc(Function {
            name: "f".to_owned(),
            parameters: vec![real_param],
            ..Function::default()
        });

        let time_ty = tree.alloc(crate::nodes::Time::default());
        let time_param = tree.alloc(Parameter::new("v", Some(time_ty)));
        let f_time = tree.alloc(Function {
            name: "f".to_owned(),
            parameters: vec![time_param],
            ..Function::default()
        });

        let arg_value = tree.alloc(IntValue::new(3));
        let arg = tree.alloc(ParameterAssign::new("v", arg_value));
        let call = tree.alloc(FunctionCall {
            name: "f".to_owned(),
            parameter_assigns: vec![arg],
            ..FunctionCall::default()
        });
        let stmt = tree.alloc(crate::nodes::ValueStatement { value: Some(call) });
        let _contents = tree.alloc(Contents {
            name: "behav".to_owned(),
            declarations: vec![f_real, f_time],
            global_actions: vec![stmt],
            ..Contents::default()
        });
        (call, f_real, f_time)
    }

    #[test]
    fn overloads_are_decided_by_the_assignment_rule() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();
        let (call, f_real, _f_time) = build_overloads(&mut tree);

        assert_eq!(resolve_symbol(&mut tree, call, sem).unwrap(), Some(f_real));
    }

    #[test]
    fn same_type_overloads_stay_ambiguous() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();

        // Two identical f(Real) declarations: the assignment rule admits
        // both, so the call cannot be resolved.
        let real_ty1 = tree.alloc(crate::nodes::Real::default());
        let p1 = tree.alloc(Parameter::new("v", Some(real_ty1)));
        let f1 = tree.alloc(Function {
            name: "f".to_owned(),
            parameters: vec![p1],
            ..Function::default()
        });
        let real_ty2 = tree.alloc(crate::nodes::Real::default());
        let p2 = tree.alloc(Parameter::new("v", Some(real_ty2)));
        let f2 = tree.alloc(Function {
            name: "f".to_owned(),
            parameters: vec![p2],
            ..Function::default()
        });
        let arg_value = tree.alloc(RealValue::new(1.0));
        let arg = tree.alloc(ParameterAssign::new("v", arg_value));
        let call = tree.alloc(FunctionCall {
            name: "f".to_owned(),
            parameter_assigns: vec![arg],
            ..FunctionCall::default()
        });
        let stmt = tree.alloc(crate::nodes::ValueStatement { value: Some(call) });
        let _contents = tree.alloc(Contents {
            name: "behav".to_owned(),
            declarations: vec![f1, f2],
            global_actions: vec![stmt],
            ..Contents::default()
        });

        let err = resolve_symbol(&mut tree, call, sem);
        assert!(matches!(err, Err(Error::AmbiguousDeclaration(_))));
    }

    #[test]
    fn strict_resolution_surfaces_argument_type_mismatches() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();

        // A lone f(Time) candidate resolves tolerantly, but an Int argument
        // does not satisfy the assignment rule in strict mode.
        let time_ty = tree.alloc(crate::nodes::Time::default());
        let param = tree.alloc(Parameter::new("v", Some(time_ty)));
        let f = tree.alloc(Function {
            name: "f".to_owned(),
            parameters: vec![param],
            ..Function::default()
        });
        let arg_value = tree.alloc(IntValue::new(3));
        let arg = tree.alloc(ParameterAssign::new("v", arg_value));
        let call = tree.alloc(FunctionCall {
            name: "f".to_owned(),
            parameter_assigns: vec![arg],
            ..FunctionCall::default()
        });
        let stmt = tree.alloc(crate::nodes::ValueStatement { value: Some(call) });
        let _contents = tree.alloc(Contents {
            name: "behav".to_owned(),
            declarations: vec![f],
            global_actions: vec![stmt],
            ..Contents::default()
        });

        assert_eq!(resolve_symbol(&mut tree, call, sem).unwrap(), Some(f));
        let err = resolve_symbol_strict(&mut tree, call, sem);
        assert!(matches!(err, Err(Error::DeclarationTypeMismatch(_))));

        let missing = tree.alloc(Identifier::new("nowhere"));
        let err = resolve_symbol_strict(&mut tree, missing, sem);
        assert!(matches!(err, Err(Error::DeclarationNotFound(_))));
    }
}
