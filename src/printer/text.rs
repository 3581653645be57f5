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

//! The textual HIF form.
//!
//! Each node prints as `(KIND [NAME] [attr]* children*)` with two-space
//! indentation; list slots are wrapped `{:NAME … }:NAME`; ranges print
//! their bounds infix around the direction; scopes repeat their kind and
//! name after the closing parenthesis.

use crate::{
    arena::{
        NodeId,
        Tree,
    },
    nodes::{
        NodeKind,
        Payload,
        Slot,
    },
    printer::{
        scalar_attributes,
        skip_standard,
        AttrValue,
        PrintOptions,
    },
    Result,
};
use std::io::Write;

/// Prints the subtree at `root` in the textual HIF form.
pub fn print_hif(
    tree: &Tree,
    root: NodeId,
    out: &mut impl Write,
    opt: &PrintOptions,
) -> Result<()> {
    let mut printer = TextPrinter { tree, opt };
    printer.print_node(out, root, 0)?;
    writeln!(out)?;
    Ok(())
}

struct TextPrinter<'a> {
    tree: &'a Tree,
    opt: &'a PrintOptions,
}

/// Kinds that repeat `//KIND name` after their closing parenthesis.
fn prints_end_tag(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::System
            | NodeKind::LibraryDef
            | NodeKind::DesignUnit
            | NodeKind::View
            | NodeKind::Contents
            | NodeKind::StateTable
            | NodeKind::Function
            | NodeKind::Procedure
    )
}

impl TextPrinter<'_> {
    fn indent(&self, out: &mut impl Write, depth: usize) -> Result<()> {
        for _ in 0..depth {
            write!(out, "  ")?;
        }
        Ok(())
    }

    fn print_node(&mut self, out: &mut impl Write, id: NodeId, depth: usize) -> Result<()> {
        let node = self.tree.node(id);

        if self.opt.print_comments {
            for comment in &node.comments {
                self.indent(out, depth)?;
                writeln!(out, "// {comment}")?;
            }
        }

        self.indent(out, depth)?;
        let kind = node.payload.kind();
        write!(out, "({}", kind.name())?;
        if let Some(name) = node.payload.name() {
            if !name.is_empty() {
                write!(out, " {name}")?;
            }
        }

        // Literals print in their source spelling rather than as a VALUE
        // attribute: bits quoted in single quotes, vectors and strings in
        // double quotes, numbers bare.
        let literal_kind = match &node.payload {
            Payload::BitValue(x) => {
                write!(out, " '{}'", x.value.to_char())?;
                true
            }
            Payload::CharValue(x) => {
                write!(out, " '{}'", x.value)?;
                true
            }
            Payload::BitvectorValue(x) => {
                write!(out, " \"{}\"", x.value)?;
                true
            }
            Payload::StringValue(x) => {
                write!(out, " \"{}\"", x.value)?;
                true
            }
            Payload::IntValue(x) => {
                write!(out, " {}", x.value)?;
                true
            }
            Payload::RealValue(x) => {
                write!(out, " {:?}", x.value)?;
                true
            }
            Payload::BoolValue(x) => {
                write!(out, " {}", x.value)?;
                true
            }
            Payload::TimeValue(x) => {
                write!(out, " {:?}", x.value)?;
                false // the unit still prints as an attribute
            }
            _ => false,
        };

        for (attr_name, value) in scalar_attributes(&node.payload) {
            // The direction of a range prints infix between the bounds.
            if attr_name == "DIRECTION" && kind == NodeKind::Range {
                continue;
            }
            if attr_name == "VALUE" && (literal_kind || kind == NodeKind::TimeValue) {
                continue;
            }
            match value {
                AttrValue::Flag(true) => write!(out, " [{attr_name}]")?,
                AttrValue::Flag(false) => {}
                AttrValue::Text(v) => write!(out, " [{attr_name}: {v}]")?,
            }
        }

        if self.opt.print_code_infos {
            if let Some(info) = &node.code_info {
                write!(out, " [CODE_INFO: {}:{}:{}]", info.file, info.line, info.column)?;
            }
        }
        if self.opt.print_additional_keywords {
            for keyword in &node.additional_keywords {
                write!(out, " [KEYWORD: {keyword}]")?;
            }
        }

        // Ranges print infix: (RANGE (left) downto (right)).
        if let Payload::Range(range) = &node.payload {
            let direction = range.direction;
            if let Some(left) = range.left {
                writeln!(out)?;
                self.print_node(out, left, depth + 1)?;
            }
            writeln!(out)?;
            self.indent(out, depth + 1)?;
            write!(out, "{}", direction.name())?;
            if let Some(right) = range.right {
                writeln!(out)?;
                self.print_node(out, right, depth + 1)?;
            }
            self.print_properties(out, id, depth)?;
            write!(out, ")")?;
            return Ok(());
        }

        for slot in node.payload.slots() {
            match slot {
                Slot::One(slot_name, child) => {
                    let Some(child) = child else { continue };
                    writeln!(out)?;
                    self.indent(out, depth + 1)?;
                    writeln!(out, ":{slot_name}")?;
                    self.print_node(out, *child, depth + 1)?;
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
                    writeln!(out)?;
                    self.indent(out, depth + 1)?;
                    if self.opt.print_summary {
                        write!(
                            out,
                            "{{:{slot_name} <<List of {} element(s) omitted in summary>> }}:{slot_name}",
                            visible.len()
                        )?;
                        continue;
                    }
                    write!(out, "{{:{slot_name}")?;
                    for child in visible {
                        writeln!(out)?;
                        self.print_node(out, child, depth + 2)?;
                    }
                    writeln!(out)?;
                    self.indent(out, depth + 1)?;
                    write!(out, "}}:{slot_name}")?;
                }
            }
        }

        self.print_properties(out, id, depth)?;

        write!(out, ")")?;
        if prints_end_tag(kind) {
            write!(out, "//{}", kind.name())?;
            if let Some(name) = self.tree.payload(id).name() {
                if !name.is_empty() {
                    write!(out, " {name}")?;
                }
            }
        }
        Ok(())
    }

    fn print_properties(&mut self, out: &mut impl Write, id: NodeId, depth: usize) -> Result<()> {
        if !self.opt.print_properties {
            return Ok(());
        }
        let node = self.tree.node(id);
        if node.properties.is_empty() {
            return Ok(());
        }
        writeln!(out)?;
        self.indent(out, depth + 1)?;
        write!(out, "{{:PROPERTIES")?;
        for prop in &node.properties {
            writeln!(out)?;
            self.indent(out, depth + 2)?;
            write!(out, "(PROPERTY {}", prop.name)?;
            if let Some(value) = prop.value {
                writeln!(out)?;
                self.print_node(out, value, depth + 3)?;
            }
            write!(out, ")")?;
        }
        writeln!(out)?;
        self.indent(out, depth + 1)?;
        write!(out, "}}:PROPERTIES")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{
        Assign,
        BitvectorValue,
        Expression,
        Identifier,
        IntValue,
        Operator,
        Range,
        RangeDirection,
    };

    fn render(tree: &Tree, root: NodeId, opt: &PrintOptions) -> String {
        let mut out = Vec::new();
        print_hif(tree, root, &mut out, opt).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn nodes_print_kind_attributes_and_children() {
        let mut tree = Tree::new();
        let lhs = tree.alloc(Identifier::new("y"));
        let a = tree.alloc(Identifier::new("a"));
        let one = tree.alloc(IntValue::new(1));
        let sum = tree.alloc(Expression::new(Operator::Plus, a, Some(one)));
        let assign = tree.alloc(Assign::new(lhs, sum));

        let text = render(&tree, assign, &PrintOptions::default());
        assert!(text.starts_with("(ASSIGN"));
        assert!(text.contains("(IDENTIFIER y)"));
        assert!(text.contains("[OPERATOR: plus]"));
        assert!(text.contains("(INT_VALUE 1)"));
        assert!(text.contains(":LEFT_HAND_SIDE"));
    }

    #[test]
    fn ranges_print_infix() {
        let mut tree = Tree::new();
        let left = tree.alloc(IntValue::new(7));
        let right = tree.alloc(IntValue::new(0));
        let range = tree.alloc(Range::new(RangeDirection::Downto, left, right));
        let text = render(&tree, range, &PrintOptions::default());
        let downto_pos = text.find("downto").unwrap();
        let left_pos = text.find("(INT_VALUE 7)").unwrap();
        let right_pos = text.find("(INT_VALUE 0)").unwrap();
        assert!(left_pos < downto_pos && downto_pos < right_pos);
    }

    #[test]
    fn summary_mode_elides_list_bodies() {
        let mut tree = Tree::new();
        let v1 = tree.alloc(BitvectorValue::new("01"));
        let alt = tree.alloc(crate::nodes::AggregateAlt {
            indices: Vec::new(),
            value: Some(v1),
        });
        let agg = tree.alloc(crate::nodes::Aggregate {
            alts: vec![alt],
            others: None,
        });
        let opt = PrintOptions {
            print_summary: true,
            ..PrintOptions::default()
        };
        let text = render(&tree, agg, &opt);
        assert!(text.contains("<<List of 1 element(s) omitted in summary>>"));
        assert!(!text.contains("AGGREGATE_ALT"));
    }
}
