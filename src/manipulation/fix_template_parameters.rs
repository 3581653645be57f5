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

//! Template-parameter elevation.
//!
//! Some declarations the source treated as ordinary constants or parameters
//! occur where the target language requires a template parameter or a
//! define: range bounds of types, template-argument lists, value-template
//! initializers, case conditions. This pass elevates them, in phases:
//!
//! 1. force view-level value template parameters to non-compile-time-
//!    constant (standard libraries excepted), so elevation stays minimal;
//! 2. move offending `Const`/`Variable`/`Parameter` declarations onto the
//!    nearest subprogram or view as value template parameters, or mark them
//!    as defines when they live at library/system scope;
//! 3. fix the reference sites (`ParameterAssign` becomes `ValueTpAssign`;
//!    String-, Record- and Time-typed parameters get their dedicated
//!    lowering; everything else not representable gets a cast);
//! 4. apply the same lowering to the elevated declarations themselves;
//! 5. fill missing defaults once a defaulted parameter appears;
//! 6. re-type assigns and initial values broken by the elevation;
//! 7. simplify elevated initializers that depend on other elevated
//!    parameters;
//! 8. collapse the introduced casts and folds.
//!
//! Caches are flushed between phases.

use crate::{
    arena::{
        NodeId,
        Property,
        Tree,
    },
    manipulation::{
        copy_subtree,
        simplify,
        CopyOptions,
        SimplifyOptions,
        Trash,
    },
    nodes::{
        EnumValue,
        Identifier,
        IntValue,
        NodeKind,
        Payload,
        StringValue,
        TypeDef,
        TypeReference,
        ValueTp,
        ValueTpAssign,
    },
    raise_unique_warning,
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

/// Property marking a declaration turned into a `#define`-style constant.
pub const PROPERTY_DEFINE: &str = "hif_define";

/// Name of the enum collecting the string literals of elevated string
/// parameters.
const STRING_NAMES_ENUM: &str = "hif_string_names";

#[derive(Clone, Copy)]
pub struct FixTemplateOptions {
    /// Semantics used for representability checks; the tree semantics when
    /// absent.
    pub check_sem: Option<&'static dyn LanguageSemantics>,
    /// Mark elevated declarations constexpr.
    pub set_constexpr: bool,
    /// Also rewrite declarations inside standard libraries.
    pub fix_standard_declarations: bool,
}

impl Default for FixTemplateOptions {
    fn default() -> Self {
        Self {
            check_sem: None,
            set_constexpr: false,
            fix_standard_declarations: false,
        }
    }
}

pub fn fix_template_parameters(
    tree: &mut Tree,
    system: NodeId,
    sem: &'static dyn LanguageSemantics,
    opt: &FixTemplateOptions,
) -> Result<()> {
    let check_sem = opt.check_sem.unwrap_or(sem);
    let mut pass = Elevator {
        sem,
        check_sem,
        opt: *opt,
        trash: Trash::new(),
        elevated: Vec::new(),
    };

    let result = pass.run_phases(tree, system);
    pass.trash.clear(tree, None);
    result
}

struct Elevator {
    sem: &'static dyn LanguageSemantics,
    check_sem: &'static dyn LanguageSemantics,
    opt: FixTemplateOptions,
    trash: Trash,
    /// (elevated parameter, kind of the original declaration).
    elevated: Vec<(NodeId, NodeKind)>,
}

fn flush_caches(tree: &mut Tree, root: NodeId) {
    invalidate_declarations(tree, root);
    invalidate_types(tree, root);
}

impl Elevator {
    fn run_phases(&mut self, tree: &mut Tree, system: NodeId) -> Result<()> {
        self.preserve_ctc(tree, system);
        flush_caches(tree, system);

        self.move_phase(tree, system)?;
        flush_caches(tree, system);

        self.fix_references(tree, system)?;
        flush_caches(tree, system);

        self.fix_elevated_declarations(tree, system)?;
        flush_caches(tree, system);

        self.fill_defaults(tree, system)?;
        flush_caches(tree, system);

        self.fix_assignment_types(tree, system)?;
        flush_caches(tree, system);

        self.fix_vtp_initial_values(tree, system)?;
        flush_caches(tree, system);

        simplify(tree, system, self.sem, &SimplifyOptions::default());
        Ok(())
    }

    fn skip_standard(&self, tree: &Tree, id: NodeId) -> bool {
        !self.opt.fix_standard_declarations && tree.payload(id).is_standard()
    }

    /// Phase 1. Arguments to view-level parameters need not be compile-time
    /// constants in general; forcing the flag off here keeps the move phase
    /// from elevating everything that flows into an instantiation.
    fn preserve_ctc(&mut self, tree: &mut Tree, system: NodeId) {
        for id in tree.descendants(system) {
            if tree.kind(id) != NodeKind::View || self.skip_standard(tree, id) {
                continue;
            }
            let params = match tree.payload(id) {
                Payload::View(v) => v.template_parameters.clone(),
                _ => continue,
            };
            for param in params {
                if let Payload::ValueTp(vtp) = tree.payload_mut(param) {
                    vtp.compile_time_constant = false;
                }
            }
        }
    }

    /// Phase 2. Walks the tree; each identifier sitting in a bad scope whose
    /// declaration is an ordinary constant, variable or parameter gets its
    /// declaration elevated (or marked as a define at library/system
    /// scope). The new parameter's initializer may itself contain bad-scope
    /// symbols, so iterate until nothing moves.
    fn move_phase(&mut self, tree: &mut Tree, system: NodeId) -> Result<()> {
        loop {
            let mut moved = false;
            for id in tree.descendants(system) {
                if !tree.contains(id) || tree.kind(id) != NodeKind::Identifier {
                    continue;
                }
                if !in_bad_scope(tree, id) {
                    continue;
                }
                let Some(decl) = resolve_symbol(tree, id, self.sem)? else {
                    continue;
                };
                if !matches!(
                    tree.kind(decl),
                    NodeKind::Const | NodeKind::Variable | NodeKind::Parameter
                ) {
                    continue;
                }
                if self.skip_standard(tree, decl) {
                    continue;
                }
                // A declaration elevated earlier in this sweep is already
                // detached; stale cache hits must not elevate it twice.
                if tree.parent(decl).is_none() {
                    continue;
                }
                moved |= self.elevate(tree, decl)?;
            }
            if !moved {
                return Ok(());
            }
            flush_caches(tree, system);
        }
    }

    fn elevate(&mut self, tree: &mut Tree, decl: NodeId) -> Result<bool> {
        let target = tree.nearest_parent(decl, |p| {
            matches!(
                p.kind(),
                NodeKind::Function | NodeKind::Procedure | NodeKind::View
            )
        });
        let Some(target) = target else {
            return Ok(self.make_define(tree, decl));
        };

        let original_kind = tree.kind(decl);
        let name = tree.payload(decl).name().unwrap_or_default().to_owned();
        let ty = tree
            .payload(decl)
            .declared_type()
            .map(|t| copy_subtree(tree, t, &mut CopyOptions::new()));
        let init = tree
            .payload(decl)
            .initial_value()
            .map(|v| copy_subtree(tree, v, &mut CopyOptions::new()));

        if let (true, Some(ty)) = (self.opt.set_constexpr, ty) {
            tree.payload_mut(ty).set_constexpr(true);
        }

        let vtp = tree.alloc(ValueTp {
            name: name.clone(),
            ty,
            init,
            compile_time_constant: true,
        });

        // Ordering: elevated parameters go after any existing template
        // parameter and before the following plain parameters.
        match tree.payload_mut(target) {
            Payload::Function(f) => f.template_parameters.push(vtp),
            Payload::Procedure(p) => p.template_parameters.push(vtp),
            Payload::View(v) => v.template_parameters.push(vtp),
            _ => unreachable!("elevation targets are subprograms and views"),
        }
        tree.node_mut(vtp).parent = Some(target);

        tree.detach(decl);
        self.trash.insert(decl);
        self.elevated.push((vtp, original_kind));
        tracing::debug!("elevated `{name}` to a value template parameter");
        Ok(true)
    }

    /// Library- and system-scope constants have no enclosing view to hang a
    /// parameter on; they become define-style constants instead.
    fn make_define(&mut self, tree: &mut Tree, decl: NodeId) -> bool {
        let already = tree
            .node(decl)
            .properties
            .iter()
            .any(|p| p.name == PROPERTY_DEFINE);
        if already {
            return false;
        }
        tree.node_mut(decl).properties.push(Property {
            name: PROPERTY_DEFINE.to_owned(),
            value: None,
        });
        true
    }

    /// Phase 3.
    fn fix_references(&mut self, tree: &mut Tree, system: NodeId) -> Result<()> {
        for index in 0..self.elevated.len() {
            let (vtp, original_kind) = self.elevated[index];
            if !tree.contains(vtp) {
                continue;
            }

            // Parameters that became template parameters: their call-site
            // bindings move from the parameter list to the template list.
            if original_kind == NodeKind::Parameter {
                self.rebind_parameter_assigns(tree, vtp, system)?;
            }

            let Some(ty) = tree.payload(vtp).declared_type() else {
                continue;
            };
            if self.check_sem.is_template_allowed_type(tree, ty) {
                continue;
            }
            match tree.kind(ty) {
                NodeKind::String => self.lower_string_references(tree, vtp, system)?,
                NodeKind::Record => self.lower_record_references(tree, vtp, system)?,
                NodeKind::Time => self.lower_time_references(tree, vtp, system)?,
                _ => self.cast_references(tree, vtp, system)?,
            }
        }
        Ok(())
    }

    fn rebind_parameter_assigns(
        &mut self,
        tree: &mut Tree,
        vtp: NodeId,
        system: NodeId,
    ) -> Result<()> {
        let name = tree.payload(vtp).name().unwrap_or_default().to_owned();
        for id in tree.descendants(system) {
            if !tree.contains(id) || tree.kind(id) != NodeKind::ParameterAssign {
                continue;
            }
            let Payload::ParameterAssign(pa) = tree.payload(id).clone() else {
                continue;
            };
            if pa.name != name {
                continue;
            }
            let Some(call) = tree.nearest_parent(id, |p| {
                matches!(
                    p.kind(),
                    NodeKind::FunctionCall | NodeKind::ProcedureCall
                )
            }) else {
                continue;
            };
            // Only calls whose callee actually owns the elevated parameter.
            let Some(callee) = resolve_symbol(tree, call, self.sem)? else {
                continue;
            };
            let owns = match tree.payload(callee) {
                Payload::Function(f) => f.template_parameters.contains(&vtp),
                Payload::Procedure(p) => p.template_parameters.contains(&vtp),
                _ => false,
            };
            if !owns {
                continue;
            }
            let value = pa.value.map(|v| {
                tree.detach(v);
                v
            });
            tree.detach(id);
            self.trash.insert(id);
            let tpa = tree.alloc(ValueTpAssign {
                name: name.clone(),
                value,
            });
            match tree.payload_mut(call) {
                Payload::FunctionCall(fc) => fc.template_assigns.push(tpa),
                Payload::ProcedureCall(pc) => pc.template_assigns.push(tpa),
                _ => unreachable!(),
            }
            tree.node_mut(tpa).parent = Some(call);
        }
        Ok(())
    }

    /// String parameters lower to an enum whose members are the distinct
    /// literal values in play; references name the member directly.
    fn lower_string_references(
        &mut self,
        tree: &mut Tree,
        vtp: NodeId,
        system: NodeId,
    ) -> Result<()> {
        let init = tree.payload(vtp).initial_value();
        let literal = init.and_then(|v| match tree.payload(v) {
            Payload::StringValue(s) => Some(s.value.clone()),
            _ => None,
        });
        let Some(literal) = literal else {
            return Err(Error::Unsupported(
                "string template parameter without a literal value",
            ));
        };
        let member_name = mangle_literal(&literal);
        let enum_typedef = self.string_names_enum(tree, system);
        self.add_enum_member(tree, enum_typedef, &member_name);

        let references = collect_references(tree, vtp, system, self.sem)?;
        for reference in references {
            let substitute = tree.alloc(Identifier::new(&member_name));
            tree.replace(reference, substitute);
            invalidate_types(tree, reference);
            tree.free_subtree(reference);
        }
        Ok(())
    }

    fn string_names_enum(&mut self, tree: &mut Tree, system: NodeId) -> NodeId {
        let Payload::System(sys) = tree.payload(system) else {
            unreachable!("elevation runs on a system root");
        };
        let existing = sys.declarations.clone().into_iter().find(|&d| {
            tree.kind(d) == NodeKind::TypeDef
                && tree.payload(d).name() == Some(STRING_NAMES_ENUM)
        });
        if let Some(found) = existing {
            return found;
        }
        let enum_ty = tree.alloc(crate::nodes::Enum::default());
        let typedef = tree.alloc(TypeDef {
            name: STRING_NAMES_ENUM.to_owned(),
            ty: Some(enum_ty),
            ..TypeDef::default()
        });
        if let Payload::System(sys) = tree.payload_mut(system) {
            sys.declarations.push(typedef);
        }
        tree.node_mut(typedef).parent = Some(system);
        typedef
    }

    fn add_enum_member(&mut self, tree: &mut Tree, typedef: NodeId, member: &str) {
        let Payload::TypeDef(td) = tree.payload(typedef) else {
            return;
        };
        let Some(enum_ty) = td.ty else {
            return;
        };
        let Payload::Enum(e) = tree.payload(enum_ty) else {
            return;
        };
        let exists = e
            .values
            .iter()
            .any(|&v| tree.payload(v).name() == Some(member));
        if exists {
            return;
        }
        let value = tree.alloc(EnumValue::new(member));
        if let Payload::Enum(e) = tree.payload_mut(enum_ty) {
            e.values.push(value);
        }
        tree.node_mut(value).parent = Some(enum_ty);
    }

    /// Record parameters unpack into one parameter per field; references
    /// re-pack the fields into a record value.
    fn lower_record_references(
        &mut self,
        tree: &mut Tree,
        vtp: NodeId,
        system: NodeId,
    ) -> Result<()> {
        let Payload::ValueTp(v) = tree.payload(vtp).clone() else {
            unreachable!();
        };
        let Some(record_ty) = v.ty else {
            return Ok(());
        };
        let Payload::Record(record) = tree.payload(record_ty).clone() else {
            return Ok(());
        };
        let init_alts: Vec<(String, NodeId)> = match v.init.map(|i| tree.payload(i).clone()) {
            Some(Payload::RecordValue(rv)) => rv
                .alts
                .iter()
                .filter_map(|&alt| match tree.payload(alt) {
                    Payload::RecordValueAlt(a) => {
                        a.value.map(|value| (a.name.clone(), value))
                    }
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        let mut field_params: Vec<(String, NodeId)> = Vec::new();
        for &field in &record.fields {
            let field_name = tree.payload(field).name().unwrap_or_default().to_owned();
            let param_name = format!("{}_{field_name}", v.name);
            let field_ty = tree
                .payload(field)
                .declared_type()
                .map(|t| copy_subtree(tree, t, &mut CopyOptions::new()));
            let field_init = init_alts
                .iter()
                .find(|(n, _)| *n == field_name)
                .map(|&(_, value)| copy_subtree(tree, value, &mut CopyOptions::new()));
            let param = tree.alloc(ValueTp {
                name: param_name.clone(),
                ty: field_ty,
                init: field_init,
                compile_time_constant: true,
            });
            field_params.push((field_name, param));
        }

        // The unpacked parameters replace the record parameter in place.
        let Some(owner) = tree.parent(vtp) else {
            return Ok(());
        };
        for slot in tree.node_mut(owner).payload.slots_mut() {
            if let crate::nodes::SlotMut::List(_, children) = slot {
                if let Some(pos) = children.iter().position(|&c| c == vtp) {
                    children.splice(pos..pos, field_params.iter().map(|&(_, p)| p));
                    break;
                }
            }
        }
        for &(_, p) in &field_params {
            tree.node_mut(p).parent = Some(owner);
        }

        let references = collect_references(tree, vtp, system, self.sem)?;
        for reference in references {
            let mut alts = Vec::with_capacity(field_params.len());
            for (field_name, param) in &field_params {
                let param_name = tree.payload(*param).name().unwrap_or_default().to_owned();
                let ident = tree.alloc(Identifier::new(&param_name));
                alts.push(tree.alloc(crate::nodes::RecordValueAlt {
                    name: field_name.clone(),
                    value: Some(ident),
                }));
            }
            let packed = tree.alloc(crate::nodes::RecordValue { alts });
            tree.replace(reference, packed);
            invalidate_types(tree, reference);
            tree.free_subtree(reference);
        }

        tree.detach(vtp);
        self.trash.insert(vtp);
        Ok(())
    }

    /// Time parameters split into a `(value, unit)` pair; references cast
    /// the re-packed pair back to a time.
    fn lower_time_references(
        &mut self,
        tree: &mut Tree,
        vtp: NodeId,
        system: NodeId,
    ) -> Result<()> {
        let Payload::ValueTp(v) = tree.payload(vtp).clone() else {
            unreachable!();
        };
        let (amount, unit) = match v.init.map(|i| tree.payload(i).clone()) {
            Some(Payload::TimeValue(tv)) => (tv.value, tv.unit),
            _ => {
                return Err(Error::Unsupported(
                    "time template parameter without a literal value",
                ))
            }
        };

        #[allow(clippy::cast_possible_truncation)]
        let int_init = tree.alloc(IntValue::new(amount as i64));
        let int_ty = tree.alloc(crate::nodes::Int::new(None, true, true));
        let value_param = tree.alloc(ValueTp {
            name: format!("{}_value", v.name),
            ty: Some(int_ty),
            init: Some(int_init),
            compile_time_constant: true,
        });
        let unit_init = tree.alloc(StringValue::new(unit.name()));
        let unit_ty = tree.alloc(crate::nodes::StringType::default());
        let unit_param = tree.alloc(ValueTp {
            name: format!("{}_unit", v.name),
            ty: Some(unit_ty),
            init: Some(unit_init),
            compile_time_constant: true,
        });

        let Some(owner) = tree.parent(vtp) else {
            return Ok(());
        };
        for slot in tree.node_mut(owner).payload.slots_mut() {
            if let crate::nodes::SlotMut::List(_, children) = slot {
                if let Some(pos) = children.iter().position(|&c| c == vtp) {
                    children.splice(pos..pos, [value_param, unit_param]);
                    break;
                }
            }
        }
        tree.node_mut(value_param).parent = Some(owner);
        tree.node_mut(unit_param).parent = Some(owner);

        let value_name = format!("{}_value", v.name);
        let unit_name = format!("{}_unit", v.name);
        let references = collect_references(tree, vtp, system, self.sem)?;
        for reference in references {
            let value_ident = tree.alloc(Identifier::new(&value_name));
            let unit_ident = tree.alloc(Identifier::new(&unit_name));
            let value_alt = tree.alloc(crate::nodes::RecordValueAlt {
                name: "value".to_owned(),
                value: Some(value_ident),
            });
            let unit_alt = tree.alloc(crate::nodes::RecordValueAlt {
                name: "unit".to_owned(),
                value: Some(unit_ident),
            });
            let pair = tree.alloc(crate::nodes::RecordValue {
                alts: vec![value_alt, unit_alt],
            });
            let time_ty = tree.alloc(crate::nodes::Time::default());
            let cast = tree.alloc(crate::nodes::Cast::new(time_ty, pair));
            tree.replace(reference, cast);
            invalidate_types(tree, reference);
            tree.free_subtree(reference);
        }

        tree.detach(vtp);
        self.trash.insert(vtp);
        Ok(())
    }

    /// The fallback lowering: references keep naming the parameter but are
    /// wrapped in an explicit cast to the originally declared type.
    fn cast_references(&mut self, tree: &mut Tree, vtp: NodeId, system: NodeId) -> Result<()> {
        let Some(original_ty) = tree.payload(vtp).declared_type() else {
            return Ok(());
        };
        let original_ty = copy_subtree(tree, original_ty, &mut CopyOptions::new());
        let name = tree_name(tree, vtp);
        let references = collect_references(tree, vtp, system, self.sem)?;
        for reference in references {
            let ty_copy = copy_subtree(tree, original_ty, &mut CopyOptions::new());
            let placeholder = tree.alloc(Identifier::new(&name));
            let cast = tree.alloc(crate::nodes::Cast::new(ty_copy, placeholder));
            tree.replace(reference, cast);
            invalidate_types(tree, reference);
            tree.free_subtree(reference);
        }
        tree.free_subtree(original_ty);
        Ok(())
    }

    /// Phase 4: the elevated declaration's own type and initializer get the
    /// template-legal rendition.
    fn fix_elevated_declarations(&mut self, tree: &mut Tree, system: NodeId) -> Result<()> {
        for index in 0..self.elevated.len() {
            let (vtp, _) = self.elevated[index];
            if !tree.contains(vtp) {
                continue;
            }
            let Some(ty) = tree.payload(vtp).declared_type() else {
                continue;
            };
            if self.check_sem.is_template_allowed_type(tree, ty) {
                continue;
            }
            match tree.kind(ty) {
                NodeKind::String => {
                    // The parameter now holds the enum member.
                    let enum_typedef = self.string_names_enum(tree, system);
                    let literal = tree
                        .payload(vtp)
                        .initial_value()
                        .and_then(|v| match tree.payload(v) {
                            Payload::StringValue(s) => Some(s.value.clone()),
                            _ => None,
                        });
                    let Some(literal) = literal else { continue };
                    let member = mangle_literal(&literal);
                    self.add_enum_member(tree, enum_typedef, &member);

                    let new_ty = tree.alloc(TypeReference::new(STRING_NAMES_ENUM));
                    let new_init = tree.alloc(Identifier::new(&member));
                    let (old_ty, old_init) = match tree.payload_mut(vtp) {
                        Payload::ValueTp(v) => {
                            (v.ty.replace(new_ty), v.init.replace(new_init))
                        }
                        _ => (None, None),
                    };
                    tree.relink_children(vtp);
                    for old in [old_ty, old_init].into_iter().flatten() {
                        tree.node_mut(old).parent = None;
                        tree.free_subtree(old);
                    }
                }
                // Record and Time parameters were replaced wholesale in
                // phase 3.
                NodeKind::Record | NodeKind::Time => {}
                _ => {
                    let legal = self.check_sem.template_allowed_type(tree, ty);
                    let old = match tree.payload_mut(vtp) {
                        Payload::ValueTp(v) => v.ty.replace(legal),
                        _ => None,
                    };
                    tree.relink_children(vtp);
                    if let Some(old) = old {
                        tree.node_mut(old).parent = None;
                        tree.free_subtree(old);
                    }
                }
            }
        }
        Ok(())
    }

    /// Phase 5: `[p0, p1, p2=x, p3]` is not expressible; once a default
    /// appears every following parameter needs one too.
    fn fill_defaults(&mut self, tree: &mut Tree, system: NodeId) -> Result<()> {
        for id in tree.descendants(system) {
            let params = match tree.payload(id) {
                Payload::View(v) => v.template_parameters.clone(),
                Payload::Function(f) => f.template_parameters.clone(),
                Payload::Procedure(p) => p.template_parameters.clone(),
                Payload::TypeDef(td) => td.template_parameters.clone(),
                _ => continue,
            };
            let mut defaults_started = false;
            for param in params {
                let has_default = match tree.payload(param) {
                    Payload::ValueTp(v) => v.init.is_some(),
                    Payload::TypeTp(t) => t.ty.is_some(),
                    _ => true,
                };
                if has_default {
                    defaults_started = true;
                    continue;
                }
                if !defaults_started {
                    continue;
                }
                match tree.payload(param).clone() {
                    Payload::ValueTp(v) => {
                        let default = v
                            .ty
                            .and_then(|ty| self.sem.type_default_value(tree, ty, Some(param)));
                        let Some(default) = default else {
                            return Err(Error::Unsupported(
                                "template parameter without a computable default",
                            ));
                        };
                        if let Payload::ValueTp(v) = tree.payload_mut(param) {
                            v.init = Some(default);
                        }
                        tree.relink_children(param);
                    }
                    Payload::TypeTp(_) => {
                        // Untyped type parameters take an arbitrary default.
                        let int_ty = tree.alloc(crate::nodes::Int::new(None, true, false));
                        if let Payload::TypeTp(t) = tree.payload_mut(param) {
                            t.ty = Some(int_ty);
                        }
                        tree.relink_children(param);
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Phase 6: elevation may have broken existing assigns and initial
    /// values; anything that no longer types gets a cast to the target.
    fn fix_assignment_types(&mut self, tree: &mut Tree, system: NodeId) -> Result<()> {
        for id in tree.descendants(system) {
            if !tree.contains(id) {
                continue;
            }
            let pair = match tree.payload(id) {
                Payload::Assign(a) => a.left.zip(a.right),
                payload if payload.is_data_declaration() => {
                    payload.declared_type().zip(payload.initial_value())
                }
                _ => None,
            };
            let Some((target, source)) = pair else {
                continue;
            };
            let target_ty = if tree.payload(target).is_type() {
                Some(target)
            } else {
                semantic_type_of(tree, target, self.sem)?
            };
            let Some(target_ty) = target_ty else {
                continue;
            };
            let Some(source_ty) = semantic_type_of(tree, source, self.sem)? else {
                continue;
            };
            let info = self.sem.operator_result(
                tree,
                crate::nodes::Operator::Assign,
                Some(target_ty),
                Some(source_ty),
                Some(id),
            );
            if info.is_allowed() {
                info.free(tree);
                continue;
            }
            let cast = self
                .sem
                .explicit_cast(tree, source, target_ty, Some(source_ty));
            tree.replace(source, cast);
            invalidate_types(tree, source);
            tree.free_subtree(source);
        }
        Ok(())
    }

    /// Phase 7: initializers of elevated parameters that referenced other
    /// elevated parameters are simplified to constants.
    fn fix_vtp_initial_values(&mut self, tree: &mut Tree, system: NodeId) -> Result<()> {
        for id in tree.descendants(system) {
            if tree.kind(id) != NodeKind::ValueTp {
                continue;
            }
            let Some(init) = tree.payload(id).initial_value() else {
                continue;
            };
            if tree.payload(init).is_const_value() {
                continue;
            }
            let opt = SimplifyOptions {
                simplify_template_parameters: true,
                ..SimplifyOptions::default()
            };
            let folded = simplify(tree, init, self.sem, &opt);
            if tree.payload(folded).is_const_value() {
                raise_unique_warning(
                    "Simplified at least one template-parameter initial value to a constant.",
                );
            }
        }
        Ok(())
    }
}

fn tree_name(tree: &Tree, id: NodeId) -> String {
    tree.payload(id).name().unwrap_or_default().to_owned()
}

/// Mangles a string literal into an identifier-legal enum member name.
fn mangle_literal(literal: &str) -> String {
    if literal.is_empty() {
        return "hif_empty_string".to_owned();
    }
    let mut out = String::with_capacity(literal.len());
    for c in literal.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// True when `id` sits in a context whose contents must be constants:
/// range bounds of type spans, template-argument values, value-template
/// initializers, case-alternative conditions.
fn in_bad_scope(tree: &Tree, id: NodeId) -> bool {
    let mut child = id;
    let mut current = tree.parent(id);
    while let Some(node) = current {
        match tree.payload(node) {
            // A range directly under a type is a span whose bounds must be
            // constants.
            Payload::Range(_) => {
                if tree
                    .parent(node)
                    .is_some_and(|p| tree.payload(p).is_type())
                {
                    return true;
                }
            }
            Payload::ValueTpAssign(_) | Payload::TypeTpAssign(_) => return true,
            Payload::ValueTp(v) => {
                if v.init == Some(child) || descends_through(tree, v.init, child) {
                    return true;
                }
            }
            Payload::SwitchAlt(a) => {
                if a.conditions.contains(&child) {
                    return true;
                }
            }
            Payload::WithAlt(a) => {
                if a.conditions.contains(&child) {
                    return true;
                }
            }
            // Statement boundaries end the interesting contexts.
            payload if payload.is_declaration() && payload.kind() != NodeKind::Field => {}
            _ => {}
        }
        child = node;
        current = tree.parent(node);
    }
    false
}

fn descends_through(tree: &Tree, slot: Option<NodeId>, node: NodeId) -> bool {
    slot.is_some_and(|s| tree.is_ancestor(s, node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        nodes::{
            Bitvector,
            Const,
            Contents,
            Range,
            RangeDirection,
            Signal,
            System,
            TypeVariant,
            Variable,
            View,
        },
        semantics::{
            HifSemantics,
            VerilogSemantics,
        },
    };

    /// System { DesignUnit du { View rtl { Const W = 4; Signal s :
    /// bv[W-1 downto 0] } } }
    fn build(tree: &mut Tree) -> (NodeId, NodeId, NodeId) {
        let w_init = tree.alloc(IntValue::new(4));
        let w_ty = tree.alloc(crate::nodes::Int::new(None, true, true));
        let w = tree.alloc(Const::new("W", Some(w_ty), Some(w_init)));

        let w_use = tree.alloc(Identifier::new("W"));
        let one = tree.alloc(IntValue::new(1));
        let left = tree.alloc(crate::nodes::Expression::new(
            crate::nodes::Operator::Minus,
            w_use,
            Some(one),
        ));
        let right = tree.alloc(IntValue::new(0));
        let span = tree.alloc(Range::new(RangeDirection::Downto, left, right));
        let sig_ty = tree.alloc(Bitvector {
            span: Some(span),
            logic: true,
            resolved: true,
            signed: false,
            constexpr: false,
            variant: TypeVariant::Native,
        });
        let sig = tree.alloc(Signal::new("s", Some(sig_ty), None));

        let contents = tree.alloc(Contents {
            name: "behav".to_owned(),
            declarations: vec![w, sig],
            ..Contents::default()
        });
        let view = tree.alloc(View {
            name: "rtl".to_owned(),
            contents: Some(contents),
            ..View::default()
        });
        let unit = tree.alloc(crate::nodes::DesignUnit {
            name: "du".to_owned(),
            views: vec![view],
        });
        let system = tree.alloc(System {
            name: "sys".to_owned(),
            design_units: vec![unit],
            ..System::default()
        });
        (system, view, w)
    }

    #[test]
    fn range_bound_constants_are_elevated() {
        let mut tree = Tree::new();
        let (system, view, w) = build(&mut tree);

        fix_template_parameters(
            &mut tree,
            system,
            HifSemantics::instance(),
            &FixTemplateOptions::default(),
        )
        .unwrap();

        // The constant is gone; the view gained a value template parameter
        // of the same name.
        assert!(!tree.contains(w));
        let Payload::View(v) = tree.payload(view) else {
            unreachable!();
        };
        assert_eq!(v.template_parameters.len(), 1);
        let param = v.template_parameters[0];
        let Payload::ValueTp(vtp) = tree.payload(param) else {
            panic!("expected a value template parameter");
        };
        assert_eq!(vtp.name, "W");
        assert!(vtp.compile_time_constant);
        assert!(tree.check_parent_links(system));
    }

    #[test]
    fn string_constants_lower_to_the_names_enum() {
        let mut tree = Tree::new();

        // Const s : String = "foo" used as a range bound.
        let s_init = tree.alloc(StringValue::new("foo"));
        let s_ty = tree.alloc(crate::nodes::StringType::default());
        let s = tree.alloc(Const::new("s", Some(s_ty), Some(s_init)));

        let s_use = tree.alloc(Identifier::new("s"));
        let zero = tree.alloc(IntValue::new(0));
        let span = tree.alloc(Range::new(RangeDirection::Downto, s_use, zero));
        let arr_elem = tree.alloc(crate::nodes::Bit::default());
        let arr_ty = tree.alloc(crate::nodes::Array {
            span: Some(span),
            ty: Some(arr_elem),
            signed: false,
            variant: TypeVariant::Native,
        });
        let var = tree.alloc(Variable::new("mem", Some(arr_ty), None));

        let contents = tree.alloc(Contents {
            name: "behav".to_owned(),
            declarations: vec![s, var],
            ..Contents::default()
        });
        let view = tree.alloc(View {
            name: "rtl".to_owned(),
            contents: Some(contents),
            ..View::default()
        });
        let unit = tree.alloc(crate::nodes::DesignUnit {
            name: "du".to_owned(),
            views: vec![view],
        });
        let system = tree.alloc(System {
            name: "sys".to_owned(),
            design_units: vec![unit],
            ..System::default()
        });

        let opt = FixTemplateOptions {
            check_sem: Some(VerilogSemantics::instance()),
            ..FixTemplateOptions::default()
        };
        fix_template_parameters(&mut tree, system, HifSemantics::instance(), &opt).unwrap();

        // The enum typedef exists at system scope with the literal member.
        let Payload::System(sys) = tree.payload(system) else {
            unreachable!();
        };
        let typedef = sys
            .declarations
            .iter()
            .copied()
            .find(|&d| tree.payload(d).name() == Some(STRING_NAMES_ENUM))
            .expect("enum typedef was created");
        let Payload::TypeDef(td) = tree.payload(typedef) else {
            unreachable!();
        };
        let Payload::Enum(e) = tree.payload(td.ty.unwrap()) else {
            unreachable!();
        };
        let members: Vec<_> = e
            .values
            .iter()
            .map(|&v| tree.payload(v).name().unwrap().to_owned())
            .collect();
        assert_eq!(members, ["foo"]);

        // The elevated parameter is typed by the enum.
        let Payload::View(v) = tree.payload(view) else {
            unreachable!();
        };
        let param = v.template_parameters[0];
        let Payload::ValueTp(vtp) = tree.payload(param) else {
            unreachable!();
        };
        let Payload::TypeReference(tr) = tree.payload(vtp.ty.unwrap()) else {
            panic!("parameter type was not lowered to the enum");
        };
        assert_eq!(tr.name, STRING_NAMES_ENUM);
        let Payload::Identifier(init) = tree.payload(vtp.init.unwrap()) else {
            panic!("initializer was not lowered to the member");
        };
        assert_eq!(init.name, "foo");
    }
}
