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

//! The XML HIF form.
//!
//! One element per node kind, one attribute per scalar, one wrapper element
//! per child slot. Code info becomes a `<CODE_INFO>` child; properties,
//! comments and additional keywords get their list wrappers. Output is
//! pretty-printed with `\n` line endings.
//!
//! A `Range` that is the span of a type appears inside the type's `<SPAN>`
//! wrapper, while a range sitting in a list slot opens its own element
//! directly; both shapes come out of the same slot scheme and the parser
//! accepts both. (Historical rendering detail, kept for byte fidelity.)

use crate::{
    arena::{
        NodeId,
        Tree,
    },
    nodes::Slot,
    printer::{
        scalar_attributes,
        skip_standard,
        AttrValue,
        PrintOptions,
    },
    Result,
};
use quick_xml::escape::escape;
use std::io::Write;

/// Prints the subtree at `root` as XML HIF.
pub fn print_xml(
    tree: &Tree,
    root: NodeId,
    out: &mut impl Write,
    opt: &PrintOptions,
) -> Result<()> {
    writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    let mut printer = XmlPrinter { tree, opt };
    printer.print_node(out, root, 0)?;
    Ok(())
}

struct XmlPrinter<'a> {
    tree: &'a Tree,
    opt: &'a PrintOptions,
}

impl XmlPrinter<'_> {
    fn indent(&self, out: &mut impl Write, depth: usize) -> Result<()> {
        for _ in 0..depth {
            write!(out, "  ")?;
        }
        Ok(())
    }

    fn print_node(&mut self, out: &mut impl Write, id: NodeId, depth: usize) -> Result<()> {
        let node = self.tree.node(id);
        let kind = node.payload.kind().name();

        self.indent(out, depth)?;
        write!(out, "<{kind}")?;
        if let Some(name) = node.payload.name() {
            write!(out, " NAME=\"{}\"", escape(name))?;
        }
        for (attr_name, value) in scalar_attributes(&node.payload) {
            match value {
                AttrValue::Flag(v) => write!(out, " {attr_name}=\"{v}\"")?,
                AttrValue::Text(v) => write!(out, " {attr_name}=\"{}\"", escape(v.as_str()))?,
            }
        }

        let has_children = node.payload.slots().iter().any(|slot| match slot {
            Slot::One(_, child) => child.is_some(),
            Slot::List(_, children) => !children.is_empty(),
        }) || (self.opt.print_code_infos && node.code_info.is_some())
            || (self.opt.print_properties && !node.properties.is_empty())
            || (self.opt.print_comments && !node.comments.is_empty())
            || (self.opt.print_additional_keywords && !node.additional_keywords.is_empty());

        if !has_children {
            writeln!(out, "/>")?;
            return Ok(());
        }
        writeln!(out, ">")?;

        for slot in node.payload.slots() {
            match slot {
                Slot::One(slot_name, child) => {
                    let Some(child) = child else { continue };
                    self.indent(out, depth + 1)?;
                    writeln!(out, "<{slot_name}>")?;
                    self.print_node(out, *child, depth + 2)?;
                    self.indent(out, depth + 1)?;
                    writeln!(out, "</{slot_name}>")?;
                }
                Slot::List(slot_name, children) => {
                    let visible: Vec<NodeId> = children
                        .iter()
                        .copied()
                        .filter(|&c| !skip_standard(self.tree, c, self.opt))
                        .collect();
                    if visible.is_empty() {
                        continue;
                    }
                    self.indent(out, depth + 1)?;
                    writeln!(out, "<{slot_name}>")?;
                    for child in visible {
                        self.print_node(out, child, depth + 2)?;
                    }
                    self.indent(out, depth + 1)?;
                    writeln!(out, "</{slot_name}>")?;
                }
            }
        }

        if self.opt.print_code_infos {
            if let Some(info) = &node.code_info {
                self.indent(out, depth + 1)?;
                writeln!(
                    out,
                    "<CODE_INFO file=\"{}\" line_number=\"{}\" column_number=\"{}\"/>",
                    escape(info.file.as_str()),
                    info.line,
                    info.column
                )?;
            }
        }

        if self.opt.print_properties && !node.properties.is_empty() {
            self.indent(out, depth + 1)?;
            writeln!(out, "<PROPERTIES>")?;
            for prop in &node.properties {
                self.indent(out, depth + 2)?;
                if let Some(value) = prop.value {
                    writeln!(out, "<PROPERTY name=\"{}\">", escape(prop.name.as_str()))?;
                    self.indent(out, depth + 3)?;
                    writeln!(out, "<VALUE>")?;
                    self.print_node(out, value, depth + 4)?;
                    self.indent(out, depth + 3)?;
                    writeln!(out, "</VALUE>")?;
                    self.indent(out, depth + 2)?;
                    writeln!(out, "</PROPERTY>")?;
                } else {
                    writeln!(out, "<PROPERTY name=\"{}\"/>", escape(prop.name.as_str()))?;
                }
            }
            self.indent(out, depth + 1)?;
            writeln!(out, "</PROPERTIES>")?;
        }

        if self.opt.print_comments && !node.comments.is_empty() {
            self.indent(out, depth + 1)?;
            writeln!(out, "<COMMENTS>")?;
            for comment in &node.comments {
                self.indent(out, depth + 2)?;
                writeln!(out, "<COMMENT text=\"{}\"/>", escape(comment.as_str()))?;
            }
            self.indent(out, depth + 1)?;
            writeln!(out, "</COMMENTS>")?;
        }

        if self.opt.print_additional_keywords && !node.additional_keywords.is_empty() {
            self.indent(out, depth + 1)?;
            writeln!(out, "<ADDITIONAL_KEYWORDS>")?;
            for keyword in &node.additional_keywords {
                self.indent(out, depth + 2)?;
                writeln!(
                    out,
                    "<ADDITIONAL_KEYWORD name=\"{}\"/>",
                    escape(keyword.as_str())
                )?;
            }
            self.indent(out, depth + 1)?;
            writeln!(out, "</ADDITIONAL_KEYWORDS>")?;
        }

        self.indent(out, depth)?;
        writeln!(out, "</{kind}>")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{
        Assign,
        Identifier,
        IntValue,
    };

    #[test]
    fn elements_nest_by_slot() {
        let mut tree = Tree::new();
        let lhs = tree.alloc(Identifier::new("y"));
        let rhs = tree.alloc(IntValue::new(1));
        let assign = tree.alloc(Assign::new(lhs, rhs));

        let mut out = Vec::new();
        print_xml(&tree, assign, &mut out, &PrintOptions::default()).unwrap();
        let xml = String::from_utf8(out).unwrap();
        assert!(xml.contains("<ASSIGN>"));
        assert!(xml.contains("<LEFT_HAND_SIDE>"));
        assert!(xml.contains("<IDENTIFIER NAME=\"y\"/>"));
        assert!(xml.contains("<INT_VALUE VALUE=\"1\"/>"));
        assert!(xml.ends_with("</ASSIGN>\n"));
    }

    #[test]
    fn properties_and_comments_have_wrappers() {
        let mut tree = Tree::new();
        let value = tree.alloc(IntValue::new(3));
        let ident = tree.alloc(Identifier::new("x"));
        tree.node_mut(ident).properties.push(crate::arena::Property {
            name: "weight".to_owned(),
            value: Some(value),
        });
        tree.relink_children(ident);
        tree.node_mut(ident).comments.push("driver".to_owned());

        let mut out = Vec::new();
        print_xml(&tree, ident, &mut out, &PrintOptions::default()).unwrap();
        let xml = String::from_utf8(out).unwrap();
        assert!(xml.contains("<PROPERTIES>"));
        assert!(xml.contains("<PROPERTY name=\"weight\">"));
        assert!(xml.contains("<VALUE>"));
        assert!(xml.contains("<COMMENT text=\"driver\"/>"));
    }
}
