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

//! Alias expansion: every reference to an `Alias` is replaced by a deep
//! copy of the alias's value, then the alias declarations are deleted.

use crate::{
    arena::{
        NodeId,
        Tree,
    },
    manipulation::{
        copy_subtree,
        CopyOptions,
        Trash,
    },
    nodes::NodeKind,
    resolver::collect_references,
    semantics::{
        invalidate_types,
        LanguageSemantics,
    },
    Result,
};

/// Expands all aliases under `root`. Idempotent: a tree without aliases is
/// left untouched.
pub fn expand_aliases(
    tree: &mut Tree,
    root: NodeId,
    sem: &dyn LanguageSemantics,
) -> Result<()> {
    let aliases: Vec<NodeId> = tree
        .descendants(root)
        .into_iter()
        .filter(|&id| tree.kind(id) == NodeKind::Alias)
        .collect();

    let mut trash = Trash::new();
    let result = expand_all(tree, root, aliases, &mut trash, sem);
    trash.clear(tree, None);
    result
}

fn expand_all(
    tree: &mut Tree,
    root: NodeId,
    aliases: Vec<NodeId>,
    trash: &mut Trash,
    sem: &dyn LanguageSemantics,
) -> Result<()> {
    for alias in aliases {
        let value = tree.payload(alias).initial_value();
        let Some(value) = value else {
            tracing::debug!("skipping alias without a value");
            continue;
        };

        let search_root = tree
            .nearest_parent(alias, crate::nodes::Payload::is_scope)
            .unwrap_or(root);
        let references = collect_references(tree, alias, search_root, sem)?;
        for reference in references {
            let substitute = copy_subtree(tree, value, &mut CopyOptions::new());
            tree.replace(reference, substitute);
            invalidate_types(tree, reference);
            tree.free_subtree(reference);
        }

        tree.detach(alias);
        trash.insert(alias);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        nodes::{
            Alias,
            Assign,
            Contents,
            Expression,
            Identifier,
            IntValue,
            Operator,
            Payload,
        },
        semantics::HifSemantics,
        structural_equals,
        EqualsOptions,
    };

    #[test]
    fn references_are_substituted_and_the_alias_removed() {
        let mut tree = Tree::new();
        let sem = HifSemantics::instance();

        // Contents { Alias a = x + 1; Assign { lhs = y, rhs = a } }
        let x = tree.alloc(Identifier::new("x"));
        let one = tree.alloc(IntValue::new(1));
        let expr = tree.alloc(Expression::new(Operator::Plus, x, Some(one)));
        let alias = tree.alloc(Alias {
            name: "a".to_owned(),
            ty: None,
            init: Some(expr),
            standard: false,
        });
        let lhs = tree.alloc(Identifier::new("y"));
        let rhs = tree.alloc(Identifier::new("a"));
        let assign = tree.alloc(Assign::new(lhs, rhs));
        let contents = tree.alloc(Contents {
            name: "behav".to_owned(),
            declarations: vec![alias],
            global_actions: vec![assign],
            ..Contents::default()
        });

        expand_aliases(&mut tree, contents, sem).unwrap();

        assert!(!tree.contains(alias));
        assert!(!tree.contains(rhs));
        let Payload::Assign(a) = tree.payload(assign) else {
            unreachable!();
        };
        let new_rhs = a.right.unwrap();
        let Payload::Expression(e) = tree.payload(new_rhs) else {
            panic!("reference was not substituted by the alias value");
        };
        assert_eq!(e.operator, Operator::Plus);

        // The substituted value is a copy, not the original subtree.
        assert!(!tree.contains(expr));
        assert!(tree.check_parent_links(contents));

        // Idempotence.
        let before = crate::object_key(&tree, contents);
        expand_aliases(&mut tree, contents, sem).unwrap();
        assert_eq!(before, crate::object_key(&tree, contents));
        let _ = structural_equals(&tree, assign, assign, &EqualsOptions::default());
    }
}
