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

//! Template instantiation.
//!
//! Every templated declaration (`View`, `Function`, `Procedure`, `TypeDef`)
//! is instantiated at every use site that supplies template arguments. The
//! instance cache keyed by (declaration, argument fingerprint) guarantees
//! one copy per distinct argument tuple; fingerprint hits are re-verified
//! with structural equality. After the pass the tree is template-free.

use crate::{
    arena::{
        NodeId,
        Tree,
    },
    key::list_key,
    manipulation::{
        copy_subtree,
        simplify,
        CopyOptions,
        SimplifyOptions,
        Trash,
    },
    nodes::{
        DesignUnit,
        NodeKind,
        Payload,
    },
    resolver::{
        collect_references,
        invalidate_declarations,
        resolve_symbol,
    },
    semantics::{
        invalidate_types,
        semantic_type_of,
        LanguageSemantics,
    },
    Error,
    Result,
};
use rustc_hash::FxHashSet;

#[derive(Clone, Debug)]
pub struct ResolveTemplatesOptions {
    /// Name of the entry view; discovered (an uninstantiated view) when
    /// absent.
    pub top_level: Option<String>,
    pub remove_instantiated_views: bool,
    pub remove_instantiated_sub_programs: bool,
    pub remove_instantiated_type_defs: bool,
    /// Drop templated declarations that end up with no references at all.
    pub remove_unreferenced: bool,
    /// After instantiation, re-walk the tree checking that every range
    /// bound of a declaration type folds to a constant, inserting casts on
    /// assigns that no longer type.
    pub check_bounds: bool,
}

impl Default for ResolveTemplatesOptions {
    fn default() -> Self {
        Self {
            top_level: None,
            remove_instantiated_views: true,
            remove_instantiated_sub_programs: true,
            remove_instantiated_type_defs: true,
            remove_unreferenced: false,
            check_bounds: false,
        }
    }
}

/// Instantiates every templated declaration reachable in `system`. Returns
/// whether anything was instantiated. Idempotent on a template-free tree.
pub fn resolve_templates(
    tree: &mut Tree,
    system: NodeId,
    sem: &'static dyn LanguageSemantics,
    opt: &ResolveTemplatesOptions,
) -> Result<bool> {
    let mut ctx = Resolver {
        sem,
        opt: opt.clone(),
        trash: Trash::new(),
        instantiated: Vec::new(),
        touched_units: Vec::new(),
        cached_args: Vec::new(),
        fixed: false,
        counter: 0,
    };

    let result = ctx.run_to_fixed_point(tree, system);
    let fixed = ctx.fixed;
    ctx.trash.clear(tree, None);
    result?;

    if opt.check_bounds {
        check_constant_bounds(tree, system, sem)?;
    }
    Ok(fixed)
}

struct Resolver {
    sem: &'static dyn LanguageSemantics,
    opt: ResolveTemplatesOptions,
    trash: Trash,
    /// Originals that were instantiated and are candidates for removal.
    instantiated: Vec<NodeId>,
    /// Design units whose views were instantiated; emptied units vanish.
    touched_units: Vec<NodeId>,
    /// Copies of the argument lists behind each cache entry, for the
    /// equality re-check on fingerprint hits.
    cached_args: Vec<((NodeId, String), Vec<NodeId>)>,
    fixed: bool,
    counter: u32,
}

impl Resolver {
    /// Inner templates surface only once their enclosing declaration has
    /// been copied, so iterate to a fixed point. The bound is generous; a
    /// cycle of templated declarations referencing each other is broken by
    /// the instance cache.
    fn run_to_fixed_point(&mut self, tree: &mut Tree, system: NodeId) -> Result<()> {
        let mut guard = 0;
        loop {
            let changed = self.run_once(tree, system)?;
            if !changed {
                break;
            }
            guard += 1;
            if guard > 64 {
                return Err(Error::Unsupported(
                    "unbounded recursive template instantiation",
                ));
            }
        }
        self.cleanup(tree, system)
    }

    fn run_once(&mut self, tree: &mut Tree, system: NodeId) -> Result<bool> {
        let templated = self.templated_declarations(tree, system);
        let top = self.top_view(tree, system);
        let mut changed = false;

        for decl in templated {
            if !tree.contains(decl) {
                continue;
            }
            if Some(decl) == top {
                // The entry view keeps its defaults: bind each parameter to
                // its initial value and drop the list.
                changed |= self.flatten_top(tree, decl)?;
                continue;
            }
            let references = collect_references(tree, decl, system, self.sem)?;
            if references.is_empty() {
                if self.opt.remove_unreferenced {
                    tree.detach(decl);
                    self.trash.insert(decl);
                    self.fixed = true;
                }
                continue;
            }
            for reference in references {
                if !tree.contains(reference) {
                    continue;
                }
                let args = template_arguments(tree, reference);
                if args.is_empty() {
                    continue;
                }
                let copy = self.instantiate(tree, decl, &args, system)?;
                self.rewrite_reference(tree, reference, copy)?;
                self.remember_original(tree, decl);
                changed = true;
                self.fixed = true;
            }
        }
        Ok(changed)
    }

    fn templated_declarations(&self, tree: &Tree, system: NodeId) -> Vec<NodeId> {
        tree.descendants(system)
            .into_iter()
            .filter(|&id| {
                if tree.payload(id).is_standard() {
                    return false;
                }
                match tree.payload(id) {
                    Payload::View(v) => !v.template_parameters.is_empty(),
                    Payload::Function(f) => !f.template_parameters.is_empty(),
                    Payload::Procedure(p) => !p.template_parameters.is_empty(),
                    Payload::TypeDef(td) => !td.template_parameters.is_empty(),
                    _ => false,
                }
            })
            .collect()
    }

    fn top_view(&self, tree: &mut Tree, system: NodeId) -> Option<NodeId> {
        let Payload::System(sys) = tree.payload(system) else {
            return None;
        };
        let units = sys.design_units.clone();
        if let Some(name) = &self.opt.top_level {
            let name = name.clone();
            for unit in units {
                let Payload::DesignUnit(du) = tree.payload(unit) else {
                    continue;
                };
                if du.name == name {
                    return du.views.first().copied();
                }
            }
            return None;
        }
        // Discovery: the first view no instance refers to.
        let mut referenced: FxHashSet<NodeId> = FxHashSet::default();
        for id in tree.descendants(system) {
            if tree.kind(id) == NodeKind::ViewReference {
                if let Ok(Some(view)) = resolve_symbol(tree, id, self.sem) {
                    referenced.insert(view);
                }
            }
        }
        let Payload::System(sys) = tree.payload(system) else {
            return None;
        };
        for unit in sys.design_units.clone() {
            let Payload::DesignUnit(du) = tree.payload(unit) else {
                continue;
            };
            for view in du.views.clone() {
                if !referenced.contains(&view) {
                    return Some(view);
                }
            }
        }
        None
    }

    /// The top view cannot be instantiated from outside; its parameters
    /// collapse to their defaults.
    fn flatten_top(&mut self, tree: &mut Tree, view: NodeId) -> Result<bool> {
        let Payload::View(v) = tree.payload(view).clone() else {
            return Ok(false);
        };
        if v.template_parameters.is_empty() {
            return Ok(false);
        }
        let opt = SimplifyOptions {
            simplify_template_parameters: true,
            ..SimplifyOptions::default()
        };
        simplify(tree, view, self.sem, &opt);
        let params = match tree.payload(view) {
            Payload::View(v) => v.template_parameters.clone(),
            _ => Vec::new(),
        };
        self.trash.insert_list(tree, &params);
        invalidate_declarations(tree, view);
        invalidate_types(tree, view);
        self.fixed = true;
        Ok(true)
    }

    fn instantiate(
        &mut self,
        tree: &mut Tree,
        decl: NodeId,
        args: &[NodeId],
        system: NodeId,
    ) -> Result<NodeId> {
        let fingerprint = list_key(tree, args);
        let key = (decl, fingerprint.clone());
        if let Some(&cached) = tree.instance_cache.get(&key) {
            // A fingerprint hit is only trusted after an exact structural
            // comparison against the arguments the entry was built from;
            // the string form alone is not an identity.
            if tree.contains(cached) && self.cache_hit_matches(tree, &key, args) {
                return Ok(cached);
            }
            tree.instance_cache.remove(&key);
        }

        self.counter += 1;
        let n = self.counter;

        let copy = match tree.kind(decl) {
            NodeKind::View => self.instantiate_view(tree, decl, args, system, n)?,
            NodeKind::Function | NodeKind::Procedure => {
                self.instantiate_subprogram(tree, decl, args, n)?
            }
            NodeKind::TypeDef => self.instantiate_typedef(tree, decl, args, n)?,
            other => return Err(Error::Unsupported(other.name())),
        };

        let arg_copies: Vec<NodeId> = args
            .iter()
            .map(|&a| copy_subtree(tree, a, &mut CopyOptions::new()))
            .collect();
        self.cached_args.push((key.clone(), arg_copies));
        tree.instance_cache.insert(key, copy);
        Ok(copy)
    }

    fn cache_hit_matches(&self, tree: &Tree, key: &(NodeId, String), args: &[NodeId]) -> bool {
        let Some((_, stored)) = self.cached_args.iter().find(|(k, _)| k == key) else {
            return false;
        };
        stored.len() == args.len()
            && stored.iter().zip(args).all(|(&s, &a)| {
                tree.contains(s)
                    && crate::structural_equals(tree, s, a, &crate::EqualsOptions::default())
            })
    }

    fn instantiate_view(
        &mut self,
        tree: &mut Tree,
        view: NodeId,
        args: &[NodeId],
        system: NodeId,
        n: u32,
    ) -> Result<NodeId> {
        let unit = tree
            .parent(view)
            .ok_or(Error::Unsupported("detached templated view"))?;
        let unit_name = tree
            .payload(unit)
            .name()
            .unwrap_or_default()
            .to_owned();

        let view_copy = copy_subtree(tree, view, &mut CopyOptions::new());
        self.bind_and_flatten(tree, view_copy, args)?;

        // The instantiated view lands in a fresh design unit next to the
        // original's.
        let mangled = mangle(&unit_name, n);
        let new_unit = tree.alloc(DesignUnit {
            name: mangled,
            views: vec![view_copy],
        });
        tree.relink_children(new_unit);
        if let Payload::System(sys) = tree.payload_mut(system) {
            let pos = sys
                .design_units
                .iter()
                .position(|&u| u == unit)
                .map_or(sys.design_units.len(), |p| p + 1);
            sys.design_units.insert(pos, new_unit);
        }
        tree.node_mut(new_unit).parent = Some(system);
        self.touched_units.push(unit);
        Ok(view_copy)
    }

    fn instantiate_subprogram(
        &mut self,
        tree: &mut Tree,
        decl: NodeId,
        args: &[NodeId],
        n: u32,
    ) -> Result<NodeId> {
        let copy = copy_subtree(tree, decl, &mut CopyOptions::new());
        self.bind_and_flatten(tree, copy, args)?;
        let name = tree.payload(decl).name().unwrap_or_default().to_owned();
        tree.payload_mut(copy).set_name(&mangle(&name, n));
        insert_sibling_after(tree, decl, copy);
        Ok(copy)
    }

    fn instantiate_typedef(
        &mut self,
        tree: &mut Tree,
        decl: NodeId,
        args: &[NodeId],
        n: u32,
    ) -> Result<NodeId> {
        let copy = copy_subtree(tree, decl, &mut CopyOptions::new());
        self.bind_and_flatten(tree, copy, args)?;
        let name = tree.payload(decl).name().unwrap_or_default().to_owned();
        tree.payload_mut(copy).set_name(&mangle(&name, n));
        insert_sibling_after(tree, decl, copy);
        Ok(copy)
    }

    /// Binds the use site's arguments onto the copy's template parameters,
    /// substitutes them throughout the body, then removes the parameter
    /// list.
    fn bind_and_flatten(&mut self, tree: &mut Tree, copy: NodeId, args: &[NodeId]) -> Result<()> {
        let params: Vec<NodeId> = match tree.payload(copy) {
            Payload::View(v) => v.template_parameters.clone(),
            Payload::Function(f) => f.template_parameters.clone(),
            Payload::Procedure(p) => p.template_parameters.clone(),
            Payload::TypeDef(td) => td.template_parameters.clone(),
            _ => Vec::new(),
        };

        for &arg in args {
            let arg_name = tree.payload(arg).name().unwrap_or_default().to_owned();
            let Some(&param) = params
                .iter()
                .find(|&&p| tree.payload(p).name() == Some(arg_name.as_str()))
            else {
                return Err(Error::DeclarationNotFound(arg_name));
            };
            match tree.payload(arg).clone() {
                Payload::ValueTpAssign(a) => {
                    let Some(value) = a.value else { continue };
                    let bound = copy_subtree(tree, value, &mut CopyOptions::new());
                    let old = match tree.payload_mut(param) {
                        Payload::ValueTp(vtp) => vtp.init.replace(bound),
                        _ => None,
                    };
                    tree.relink_children(param);
                    if let Some(old) = old {
                        tree.node_mut(old).parent = None;
                        tree.free_subtree(old);
                    }
                }
                Payload::TypeTpAssign(a) => {
                    let Some(ty) = a.ty else { continue };
                    let bound = copy_subtree(tree, ty, &mut CopyOptions::new());
                    let old = match tree.payload_mut(param) {
                        Payload::TypeTp(tp) => tp.ty.replace(bound),
                        _ => None,
                    };
                    tree.relink_children(param);
                    if let Some(old) = old {
                        tree.node_mut(old).parent = None;
                        tree.free_subtree(old);
                    }
                }
                _ => {}
            }
        }

        invalidate_declarations(tree, copy);
        invalidate_types(tree, copy);

        // Value parameters substitute through the simplifier; type
        // parameters substitute by rewriting the typerefs that name them.
        substitute_type_parameters(tree, copy, &params);
        let opt = SimplifyOptions {
            simplify_template_parameters: true,
            ..SimplifyOptions::default()
        };
        simplify(tree, copy, self.sem, &opt);

        let params: Vec<NodeId> = match tree.payload(copy) {
            Payload::View(v) => v.template_parameters.clone(),
            Payload::Function(f) => f.template_parameters.clone(),
            Payload::Procedure(p) => p.template_parameters.clone(),
            Payload::TypeDef(td) => td.template_parameters.clone(),
            _ => Vec::new(),
        };
        self.trash.insert_list(tree, &params);
        invalidate_declarations(tree, copy);
        invalidate_types(tree, copy);
        Ok(())
    }

    /// Points the use site at the instantiated copy and drops its argument
    /// list.
    fn rewrite_reference(&mut self, tree: &mut Tree, reference: NodeId, copy: NodeId) -> Result<()> {
        let copy_name = tree.payload(copy).name().unwrap_or_default().to_owned();
        let args = template_arguments(tree, reference);
        self.trash.insert_list(tree, &args);

        match tree.payload_mut(reference) {
            Payload::ViewReference(vr) => {
                // The copy lives inside a fresh design unit; the reference
                // names the unit.
                vr.template_assigns.clear();
                vr.design_unit = String::new();
            }
            Payload::FunctionCall(fc) => {
                fc.template_assigns.clear();
                fc.name = copy_name.clone();
            }
            Payload::ProcedureCall(pc) => {
                pc.template_assigns.clear();
                pc.name = copy_name.clone();
            }
            Payload::TypeReference(tr) => {
                tr.template_assigns.clear();
                tr.name = copy_name.clone();
            }
            _ => return Err(Error::Unsupported("template reference kind")),
        }
        if tree.kind(reference) == NodeKind::ViewReference {
            let unit = tree
                .parent(copy)
                .ok_or(Error::Unsupported("instantiated view without a unit"))?;
            let unit_name = tree.payload(unit).name().unwrap_or_default().to_owned();
            if let Payload::ViewReference(vr) = tree.payload_mut(reference) {
                vr.design_unit = unit_name;
            }
        }

        invalidate_declarations(tree, reference);
        tree.decl_cache.insert(reference, copy);
        invalidate_types(tree, reference);
        Ok(())
    }

    fn remember_original(&mut self, tree: &Tree, decl: NodeId) {
        let removes = match tree.kind(decl) {
            NodeKind::View => self.opt.remove_instantiated_views,
            NodeKind::Function | NodeKind::Procedure => {
                self.opt.remove_instantiated_sub_programs
            }
            NodeKind::TypeDef => self.opt.remove_instantiated_type_defs,
            _ => false,
        };
        if removes && !self.instantiated.contains(&decl) {
            self.instantiated.push(decl);
            if tree.kind(decl) == NodeKind::View {
                if let Some(unit) = tree.parent(decl) {
                    self.touched_units.push(unit);
                }
            }
        }
    }

    /// Removes originals with no remaining references, then design units
    /// left without views.
    fn cleanup(&mut self, tree: &mut Tree, system: NodeId) -> Result<()> {
        for (_, copies) in std::mem::take(&mut self.cached_args) {
            for copy in copies {
                if tree.contains(copy) {
                    tree.free_subtree(copy);
                }
            }
        }
        for decl in std::mem::take(&mut self.instantiated) {
            if !tree.contains(decl) {
                continue;
            }
            let refs = collect_references(tree, decl, system, self.sem)?;
            if refs.is_empty() {
                tree.detach(decl);
                self.trash.insert(decl);
            }
        }
        self.trash.clear(tree, None);

        for unit in std::mem::take(&mut self.touched_units) {
            if !tree.contains(unit) {
                continue;
            }
            let Payload::DesignUnit(du) = tree.payload(unit) else {
                continue;
            };
            if du.views.is_empty() {
                tree.detach(unit);
                tree.free_subtree(unit);
            }
        }
        Ok(())
    }
}

fn mangle(name: &str, n: u32) -> String {
    if n == 1 {
        format!("{name}_inst")
    } else {
        format!("{name}_inst{n}")
    }
}

fn template_arguments(tree: &Tree, reference: NodeId) -> Vec<NodeId> {
    match tree.payload(reference) {
        Payload::ViewReference(vr) => vr.template_assigns.clone(),
        Payload::FunctionCall(fc) => fc.template_assigns.clone(),
        Payload::ProcedureCall(pc) => pc.template_assigns.clone(),
        Payload::TypeReference(tr) => tr.template_assigns.clone(),
        _ => Vec::new(),
    }
}

/// Replaces `TypeReference`s naming a bound `TypeTp` with the bound type.
fn substitute_type_parameters(tree: &mut Tree, root: NodeId, params: &[NodeId]) {
    let bindings: Vec<(String, NodeId)> = params
        .iter()
        .filter_map(|&p| match tree.payload(p) {
            Payload::TypeTp(tp) => {
                tp.ty.map(|ty| (tp.name.clone(), ty))
            }
            _ => None,
        })
        .collect();
    if bindings.is_empty() {
        return;
    }
    for id in tree.descendants(root) {
        if !tree.contains(id) || tree.kind(id) != NodeKind::TypeReference {
            continue;
        }
        let Payload::TypeReference(tr) = tree.payload(id) else {
            continue;
        };
        let Some((_, bound)) = bindings.iter().find(|(n, _)| *n == tr.name) else {
            continue;
        };
        if tree.is_ancestor(*bound, id) {
            continue;
        }
        let substitute = copy_subtree(tree, *bound, &mut CopyOptions::new());
        if tree.parent(id).is_some() {
            tree.replace(id, substitute);
            tree.free_subtree(id);
        }
    }
}

/// Inserts `copy` right after `original` in whatever declaration list holds
/// it.
fn insert_sibling_after(tree: &mut Tree, original: NodeId, copy: NodeId) {
    let Some(parent) = tree.parent(original) else {
        return;
    };
    for slot in tree.node_mut(parent).payload.slots_mut() {
        if let crate::nodes::SlotMut::List(_, children) = slot {
            if let Some(pos) = children.iter().position(|&c| c == original) {
                children.insert(pos + 1, copy);
                break;
            }
        }
    }
    tree.node_mut(copy).parent = Some(parent);
}

/// Post-instantiation validation: every span bound of a declaration's type
/// must fold to a constant; assigns that stopped typing get a cast.
fn check_constant_bounds(
    tree: &mut Tree,
    root: NodeId,
    sem: &'static dyn LanguageSemantics,
) -> Result<()> {
    for id in tree.descendants(root) {
        if !tree.contains(id) {
            continue;
        }
        match tree.payload(id).clone() {
            payload if payload.is_data_declaration() => {
                let Some(ty) = payload.declared_type() else {
                    continue;
                };
                let Some(span) = crate::semantics::typing::type_span(tree, ty) else {
                    continue;
                };
                let Payload::Range(r) = tree.payload(span).clone() else {
                    continue;
                };
                for bound in [r.left, r.right].into_iter().flatten() {
                    let simplified = simplify(tree, bound, sem, &SimplifyOptions {
                        simplify_template_parameters: true,
                        ..SimplifyOptions::default()
                    });
                    if !tree.payload(simplified).is_const_value() {
                        return Err(Error::NonConstantBound);
                    }
                }
            }
            Payload::Assign(a) => {
                let (Some(left), Some(right)) = (a.left, a.right) else {
                    continue;
                };
                let Some(tl) = semantic_type_of(tree, left, sem)? else {
                    continue;
                };
                let Some(tr) = semantic_type_of(tree, right, sem)? else {
                    continue;
                };
                let info = sem.operator_result(
                    tree,
                    crate::nodes::Operator::Assign,
                    Some(tl),
                    Some(tr),
                    Some(id),
                );
                if info.is_allowed() {
                    info.free(tree);
                    continue;
                }
                let cast = sem.explicit_cast(tree, right, tl, Some(tr));
                tree.replace(right, cast);
                invalidate_types(tree, right);
                tree.free_subtree(right);
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        nodes::{
            Contents,
            Entity,
            Identifier,
            Instance,
            IntValue,
            Signal,
            System,
            ValueTp,
            ValueTpAssign,
            View,
            ViewReference,
        },
        semantics::HifSemantics,
    };

    /// Builds: DesignUnit V { View beh<ValueTP n = 8> { Contents { Signal s
    /// : bv; Variable width = n } } }, plus a top view instantiating V with
    /// n = 16.
    fn build_design(tree: &mut Tree) -> (NodeId, NodeId, NodeId) {
        let n_init = tree.alloc(IntValue::new(8));
        let n_ty = tree.alloc(crate::nodes::Int::new(None, true, true));
        let vtp = tree.alloc(ValueTp::new("n", Some(n_ty), Some(n_init)));

        let n_use = tree.alloc(Identifier::new("n"));
        let width_var = tree.alloc(crate::nodes::Variable::new("width", None, Some(n_use)));
        let sig = tree.alloc(Signal::new("s", None, None));
        let contents = tree.alloc(Contents {
            name: "behav".to_owned(),
            declarations: vec![width_var, sig],
            ..Contents::default()
        });
        let entity = tree.alloc(Entity {
            name: "beh".to_owned(),
            ..Entity::default()
        });
        let view = tree.alloc(View {
            name: "beh".to_owned(),
            template_parameters: vec![vtp],
            entity: Some(entity),
            contents: Some(contents),
            ..View::default()
        });
        let unit = tree.alloc(DesignUnit {
            name: "V".to_owned(),
            views: vec![view],
        });

        // Top view with an instance of V binding n = 16.
        let arg_value = tree.alloc(IntValue::new(16));
        let arg = tree.alloc(ValueTpAssign::new("n", arg_value));
        let viewref = tree.alloc(ViewReference {
            design_unit: "V".to_owned(),
            name: "beh".to_owned(),
            instance: None,
            template_assigns: vec![arg],
            variant: crate::nodes::TypeVariant::Native,
        });
        let instance = tree.alloc(Instance {
            name: "u0".to_owned(),
            referenced_type: Some(viewref),
            port_assigns: Vec::new(),
            initial_value: None,
        });
        let top_contents = tree.alloc(Contents {
            name: "top_behav".to_owned(),
            instances: vec![instance],
            ..Contents::default()
        });
        let top_view = tree.alloc(View {
            name: "rtl".to_owned(),
            contents: Some(top_contents),
            ..View::default()
        });
        let top_unit = tree.alloc(DesignUnit {
            name: "top".to_owned(),
            views: vec![top_view],
        });

        let system = tree.alloc(System {
            name: "sys".to_owned(),
            design_units: vec![unit, top_unit],
            ..System::default()
        });
        (system, view, viewref)
    }

    #[test]
    fn view_instantiation_copies_and_substitutes() {
        let mut tree = Tree::new();
        let (system, view, viewref) = build_design(&mut tree);
        let sem = HifSemantics::instance();

        let fixed = resolve_templates(
            &mut tree,
            system,
            sem,
            &ResolveTemplatesOptions::default(),
        )
        .unwrap();
        assert!(fixed);

        // The original templated view is gone.
        assert!(!tree.contains(view));

        // The reference now targets the fresh unit.
        let Payload::ViewReference(vr) = tree.payload(viewref) else {
            unreachable!();
        };
        assert!(vr.template_assigns.is_empty());
        assert_eq!(vr.design_unit, "V_inst");

        // Inside the copy, `n` collapsed to 16 and the parameter list is
        // gone.
        let copy = resolve_symbol(&mut tree, viewref, sem)
            .unwrap()
            .expect("resolves");
        let Payload::View(v) = tree.payload(copy).clone() else {
            unreachable!();
        };
        assert!(v.template_parameters.is_empty());
        let contents = v.contents.unwrap();
        let Payload::Contents(c) = tree.payload(contents) else {
            unreachable!();
        };
        let width_var = c.declarations[0];
        let init = tree.payload(width_var).initial_value().unwrap();
        let Payload::IntValue(value) = tree.payload(init) else {
            panic!("template parameter was not substituted");
        };
        assert_eq!(value.value, 16);

        // Running again on the template-free tree changes nothing.
        let fixed_again = resolve_templates(
            &mut tree,
            system,
            sem,
            &ResolveTemplatesOptions::default(),
        )
        .unwrap();
        assert!(!fixed_again);
    }
}
