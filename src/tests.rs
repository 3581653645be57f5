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

//! End-to-end scenarios over complete little designs.

use crate::{
    manipulation::{
        copy_subtree,
        expand_aliases,
        fix_unsupported_bits,
        CopyOptions,
        FixUnsupportedBitsOptions,
    },
    nodes::*,
    printer::{
        parse_xml,
        print_hif,
        print_xml,
        read_file,
        write_file,
        PrintOptions,
        ReadOptions,
    },
    semantics::{
        invalidate_types,
        semantic_type_of,
        typing::make_downto_span,
        HifSemantics,
        VerilogSemantics,
    },
    structural_equals,
    EqualsOptions,
    NodeId,
    Tree,
};

fn logic_vector(tree: &mut Tree, width: u64) -> NodeId {
    let span = make_downto_span(tree, width);
    tree.alloc(Bitvector {
        span: Some(span),
        logic: true,
        resolved: true,
        signed: false,
        constexpr: false,
        variant: TypeVariant::Native,
    })
}

/// A small but complete design: one unit, one view, a process assigning an
/// expression over two signals.
fn build_system(tree: &mut Tree) -> NodeId {
    let a_ty = logic_vector(tree, 8);
    let a = tree.alloc(Signal::new("a", Some(a_ty), None));
    let b_ty = logic_vector(tree, 8);
    let b = tree.alloc(Signal::new("b", Some(b_ty), None));
    let q_ty = logic_vector(tree, 8);
    let q = tree.alloc(Port::new("q", PortDirection::Out, Some(q_ty)));

    let a_ref = tree.alloc(Identifier::new("a"));
    let b_ref = tree.alloc(Identifier::new("b"));
    let sum = tree.alloc(Expression::new(Operator::BitAnd, a_ref, Some(b_ref)));
    let q_ref = tree.alloc(Identifier::new("q"));
    let assign = tree.alloc(Assign::new(q_ref, sum));

    let state = tree.alloc(State {
        name: "run".to_owned(),
        actions: vec![assign],
    });
    let sens = tree.alloc(Identifier::new("a"));
    let table = tree.alloc(StateTable {
        name: "update".to_owned(),
        sensitivity: vec![sens],
        states: vec![state],
        ..StateTable::default()
    });
    let contents = tree.alloc(Contents {
        name: "behav".to_owned(),
        declarations: vec![a, b],
        state_tables: vec![table],
        ..Contents::default()
    });
    let entity = tree.alloc(Entity {
        name: "rtl".to_owned(),
        ports: vec![q],
        ..Entity::default()
    });
    let view = tree.alloc(View {
        name: "rtl".to_owned(),
        entity: Some(entity),
        contents: Some(contents),
        ..View::default()
    });
    let unit = tree.alloc(DesignUnit {
        name: "adder".to_owned(),
        views: vec![view],
    });
    tree.alloc(System {
        name: "design".to_owned(),
        design_units: vec![unit],
        ..System::default()
    })
}

#[test]
fn xml_round_trip_preserves_a_whole_system() {
    let mut tree = Tree::new();
    let system = build_system(&mut tree);

    let mut out = Vec::new();
    print_xml(&tree, system, &mut out, &PrintOptions::default()).unwrap();
    let xml = String::from_utf8(out).unwrap();

    let mut reloaded = Tree::new();
    let parsed = parse_xml(&mut reloaded, &xml, &ReadOptions::default()).unwrap();

    // Compare through the canonical fingerprint: separate arenas, same
    // structure.
    assert_eq!(
        crate::object_key(&tree, system),
        crate::object_key(&reloaded, parsed)
    );
    assert!(reloaded.check_parent_links(parsed));
}

#[test]
fn text_printing_is_stable_across_an_xml_round_trip() {
    let mut tree = Tree::new();
    let system = build_system(&mut tree);

    let mut text_before = Vec::new();
    print_hif(&tree, system, &mut text_before, &PrintOptions::default()).unwrap();

    let mut xml = Vec::new();
    print_xml(&tree, system, &mut xml, &PrintOptions::default()).unwrap();
    let mut reloaded = Tree::new();
    let parsed = parse_xml(
        &mut reloaded,
        &String::from_utf8(xml).unwrap(),
        &ReadOptions::default(),
    )
    .unwrap();

    let mut text_after = Vec::new();
    print_hif(&reloaded, parsed, &mut text_after, &PrintOptions::default()).unwrap();
    assert_eq!(
        String::from_utf8(text_before).unwrap(),
        String::from_utf8(text_after).unwrap()
    );
}

#[test]
fn files_round_trip_through_disk() {
    let mut tree = Tree::new();
    let system = build_system(&mut tree);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("design");
    let written = write_file(&mut tree, system, &path, true, &PrintOptions::default()).unwrap();
    assert!(written.to_string_lossy().ends_with(".hif.xml"));

    // Version info was stamped before writing.
    let Payload::System(sys) = tree.payload(system) else {
        unreachable!();
    };
    assert_eq!(sys.version_info.tool, "hif");
    assert!(!sys.version_info.generation_date.is_empty());

    let (reloaded, parsed) = read_file(&written, &ReadOptions::default()).unwrap();
    assert_eq!(
        crate::object_key(&tree, system),
        crate::object_key(&reloaded, parsed)
    );
}

#[test]
fn semantic_type_cache_is_sound() {
    let mut tree = Tree::new();
    let system = build_system(&mut tree);
    let sem = HifSemantics::instance();

    // Find the expression inside the process.
    let expr = tree
        .descendants(system)
        .into_iter()
        .find(|&id| tree.kind(id) == NodeKind::Expression)
        .unwrap();

    let cached = semantic_type_of(&mut tree, expr, sem).unwrap().unwrap();
    let snapshot = copy_subtree(&mut tree, cached, &mut CopyOptions::new());

    invalidate_types(&mut tree, system);
    assert!(!tree.contains(cached));

    let recomputed = semantic_type_of(&mut tree, expr, sem).unwrap().unwrap();
    assert!(structural_equals(
        &tree,
        snapshot,
        recomputed,
        &EqualsOptions::default()
    ));
}

#[test]
fn copy_with_default_policy_is_structural_identity() {
    let mut tree = Tree::new();
    let system = build_system(&mut tree);
    tree.node_mut(system).comments.push("top".to_owned());

    let copy = copy_subtree(&mut tree, system, &mut CopyOptions::new());
    let full = EqualsOptions {
        check_code_infos: true,
        check_properties: true,
        check_comments: true,
        ..EqualsOptions::default()
    };
    assert!(structural_equals(&tree, system, copy, &full));

    // With properties stripped, only the structure must match.
    let mut stripped_opt = CopyOptions::new();
    stripped_opt.copy_properties = false;
    stripped_opt.copy_comments = false;
    let stripped = copy_subtree(&mut tree, system, &mut stripped_opt);
    assert!(!structural_equals(&tree, system, stripped, &full));
    assert!(structural_equals(
        &tree,
        system,
        stripped,
        &EqualsOptions::default()
    ));
}

#[test]
fn alias_expansion_is_idempotent_on_a_system() {
    let mut tree = Tree::new();
    let system = build_system(&mut tree);
    let sem = HifSemantics::instance();

    // Add: Alias mask = a & b; Assign q = mask;
    let a_ref = tree.alloc(Identifier::new("a"));
    let b_ref = tree.alloc(Identifier::new("b"));
    let expr = tree.alloc(Expression::new(Operator::BitAnd, a_ref, Some(b_ref)));
    let alias = tree.alloc(Alias {
        name: "mask".to_owned(),
        ty: None,
        init: Some(expr),
        standard: false,
    });
    let q_ref = tree.alloc(Identifier::new("q"));
    let mask_ref = tree.alloc(Identifier::new("mask"));
    let assign = tree.alloc(Assign::new(q_ref, mask_ref));

    let contents = tree
        .descendants(system)
        .into_iter()
        .find(|&id| tree.kind(id) == NodeKind::Contents)
        .unwrap();
    if let Payload::Contents(c) = tree.payload_mut(contents) {
        c.declarations.push(alias);
        c.global_actions.push(assign);
    }
    tree.relink_children(contents);

    expand_aliases(&mut tree, system, sem).unwrap();
    assert!(!tree.contains(alias));
    let Payload::Assign(a) = tree.payload(assign) else {
        unreachable!();
    };
    assert_eq!(tree.kind(a.right.unwrap()), NodeKind::Expression);

    let before = crate::object_key(&tree, system);
    expand_aliases(&mut tree, system, sem).unwrap();
    assert_eq!(before, crate::object_key(&tree, system));
}

#[test]
fn unsupported_bits_scenario_from_binary_target() {
    let mut tree = Tree::new();
    let value = tree.alloc(BitvectorValue::new("U10XZ"));
    let holder = tree.alloc(ValueStatement { value: Some(value) });

    let opts = FixUnsupportedBitsOptions {
        only_binary_bits: true,
        xz_replace_value: '0',
        skip_initial_values: false,
    };
    let fixed = fix_unsupported_bits(
        &mut tree,
        holder,
        HifSemantics::instance(),
        VerilogSemantics::instance(),
        &opts,
    )
    .unwrap();
    assert!(fixed);
    let Payload::BitvectorValue(v) = tree.payload(value) else {
        unreachable!();
    };
    assert_eq!(v.value, "01000");
}

#[test]
fn no_double_ownership_across_a_whole_build() {
    let mut tree = Tree::new();
    let system = build_system(&mut tree);

    // Every live node is referenced by at most one parent slot.
    let mut seen = std::collections::HashSet::new();
    for id in tree.descendants(system) {
        let mut children = Vec::new();
        tree.node(id).payload.for_each_child(&mut |c| children.push(c));
        for child in children {
            assert!(seen.insert(child), "node owned by two slots");
        }
    }
    assert!(tree.check_parent_links(system));
}
