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

//! Strict parser for the XML HIF form.
//!
//! Element and attribute names must match the writer's spelling exactly;
//! unknown names are fatal. Declaration resolution is not performed here;
//! symbols re-resolve lazily once the tree is loaded.

use crate::{
    arena::{
        CodeInfo,
        Node,
        NodeId,
        Property,
        Tree,
    },
    nodes::{
        NodeKind,
        Payload,
        SlotMut,
    },
    printer::{
        set_scalar_attribute,
        skip_standard,
        PrintOptions,
        ReadOptions,
    },
    Error,
    Result,
};
use quick_xml::{
    events::{
        BytesStart,
        Event,
    },
    Reader,
};

/// Parses one XML HIF document into `tree`, returning the root node.
pub fn parse_xml(tree: &mut Tree, input: &str, opt: &ReadOptions) -> Result<NodeId> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut parser = Parser {
        tree,
        stack: Vec::new(),
        root: None,
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => parser.open(&e, false)?,
            Event::Empty(e) => parser.open(&e, true)?,
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                parser.close(&name)?;
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Text(t) => {
                let content = t.unescape()?;
                if !content.trim().is_empty() {
                    return Err(Error::Parse(format!(
                        "unexpected text content `{}`",
                        content.trim()
                    )));
                }
            }
            Event::Eof => break,
            _ => {
                return Err(Error::Parse("unexpected XML content".to_owned()));
            }
        }
    }

    let root = parser
        .root
        .ok_or_else(|| Error::Parse("document contains no node".to_owned()))?;
    if !opt.load_standard_library {
        strip_standard_libraries(tree, root);
    }
    Ok(root)
}

enum Frame {
    /// A node element under construction.
    Node(Node),
    /// A child-slot wrapper of the node frame below it.
    Slot(String),
    Properties,
    Property(Property),
    PropertyValue,
    Comments,
    Keywords,
}

struct Parser<'t> {
    tree: &'t mut Tree,
    stack: Vec<Frame>,
    root: Option<NodeId>,
}

impl Parser<'_> {
    fn open(&mut self, element: &BytesStart<'_>, empty: bool) -> Result<()> {
        let name = String::from_utf8_lossy(element.name().as_ref()).into_owned();

        // Structural wrappers first.
        match name.as_str() {
            "CODE_INFO" => {
                self.read_code_info(element)?;
                if !empty {
                    self.stack.push(Frame::Slot("CODE_INFO".to_owned()));
                }
                return Ok(());
            }
            "PROPERTIES" => {
                self.stack.push(Frame::Properties);
                if empty {
                    self.stack.pop();
                }
                return Ok(());
            }
            "PROPERTY" => {
                let mut prop = Property {
                    name: String::new(),
                    value: None,
                };
                for attr in element.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr.unescape_value()?.into_owned();
                    if key == "name" {
                        prop.name = value;
                    } else {
                        return Err(Error::UnknownAttribute {
                            element: name,
                            attribute: key,
                        });
                    }
                }
                if empty {
                    self.finish_property(prop)?;
                } else {
                    self.stack.push(Frame::Property(prop));
                }
                return Ok(());
            }
            "VALUE" if matches!(self.stack.last(), Some(Frame::Property(_))) => {
                self.stack.push(Frame::PropertyValue);
                if empty {
                    self.stack.pop();
                }
                return Ok(());
            }
            "COMMENTS" => {
                self.stack.push(Frame::Comments);
                if empty {
                    self.stack.pop();
                }
                return Ok(());
            }
            "COMMENT" => {
                let text = self.single_attribute(element, "text")?;
                self.nearest_node()?.comments.push(text);
                if !empty {
                    self.stack.push(Frame::Slot("COMMENT".to_owned()));
                }
                return Ok(());
            }
            "ADDITIONAL_KEYWORDS" => {
                self.stack.push(Frame::Keywords);
                if empty {
                    self.stack.pop();
                }
                return Ok(());
            }
            "ADDITIONAL_KEYWORD" => {
                let keyword = self.single_attribute(element, "name")?;
                self.nearest_node()?.additional_keywords.push(keyword);
                if !empty {
                    self.stack.push(Frame::Slot("ADDITIONAL_KEYWORD".to_owned()));
                }
                return Ok(());
            }
            _ => {}
        }

        // A child-slot wrapper sits directly under a node element; node
        // elements sit under wrappers, property values or the root. That
        // nesting disambiguates wrapper names that coincide with kind names
        // (ENTITY, CONTENTS, STATE_TABLE).
        let wrapper_here = match self.stack.last() {
            Some(Frame::Node(node)) => node
                .payload
                .slots()
                .iter()
                .any(|slot| slot.name() == name),
            _ => false,
        };
        if wrapper_here {
            if !empty {
                self.stack.push(Frame::Slot(name));
            }
            return Ok(());
        }

        // Otherwise it must be a node element.
        if let Some(kind) = NodeKind::from_name(&name) {
            let mut node = Node::new(default_payload(kind));
            for attr in element.attributes() {
                let attr = attr.map_err(quick_xml::Error::from)?;
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = attr.unescape_value()?.into_owned();
                set_scalar_attribute(&mut node.payload, &key, &value)?;
            }
            if empty {
                self.finish_node(node)?;
            } else {
                self.stack.push(Frame::Node(node));
            }
            return Ok(());
        }

        Err(Error::UnknownKind(name))
    }

    fn close(&mut self, name: &str) -> Result<()> {
        match self.stack.pop() {
            Some(Frame::Node(node)) => {
                debug_assert_eq!(node.payload.kind().name(), name);
                self.finish_node(node)
            }
            Some(Frame::Property(prop)) => self.finish_property(prop),
            Some(
                Frame::Slot(_) | Frame::Properties | Frame::PropertyValue | Frame::Comments
                | Frame::Keywords,
            ) => Ok(()),
            None => Err(Error::Parse(format!("unbalanced closing tag `{name}`"))),
        }
    }

    /// A completed node lands in the slot wrapper, property value or root
    /// position below it.
    fn finish_node(&mut self, node: Node) -> Result<()> {
        enum Position {
            Slot(String),
            PropertyValue,
            Root,
            Invalid,
        }
        let position = match self.stack.last() {
            Some(Frame::Slot(slot_name)) => Position::Slot(slot_name.clone()),
            Some(Frame::PropertyValue) => Position::PropertyValue,
            None => Position::Root,
            _ => Position::Invalid,
        };

        let id = self.tree.alloc_node(node);
        match position {
            Position::Slot(slot_name) => {
                let parent = self
                    .stack
                    .iter_mut()
                    .rev()
                    .find_map(|f| match f {
                        Frame::Node(n) => Some(n),
                        _ => None,
                    })
                    .ok_or_else(|| {
                        Error::Parse(format!("slot `{slot_name}` outside any node"))
                    })?;
                place_in_slot(parent, &slot_name, id)
            }
            Position::PropertyValue => {
                let property = self.stack.iter_mut().rev().find_map(|f| match f {
                    Frame::Property(p) => Some(p),
                    _ => None,
                });
                match property {
                    Some(p) => {
                        p.value = Some(id);
                        Ok(())
                    }
                    None => Err(Error::Parse("VALUE outside any property".to_owned())),
                }
            }
            Position::Root => {
                if self.root.is_some() {
                    return Err(Error::Parse("multiple root nodes".to_owned()));
                }
                self.root = Some(id);
                Ok(())
            }
            Position::Invalid => Err(Error::Parse(format!(
                "node `{}` in an invalid position",
                self.tree.kind(id).name()
            ))),
        }
    }

    fn finish_property(&mut self, prop: Property) -> Result<()> {
        self.nearest_node()?.properties.push(prop);
        Ok(())
    }

    fn nearest_node(&mut self) -> Result<&mut Node> {
        self.stack
            .iter_mut()
            .rev()
            .find_map(|f| match f {
                Frame::Node(n) => Some(n),
                _ => None,
            })
            .ok_or_else(|| Error::Parse("decoration outside any node".to_owned()))
    }

    fn read_code_info(&mut self, element: &BytesStart<'_>) -> Result<()> {
        let mut info = CodeInfo::default();
        for attr in element.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            match key.as_str() {
                "file" => info.file = value,
                "line_number" => {
                    info.line = value
                        .parse()
                        .map_err(|_| Error::Parse(format!("bad line number `{value}`")))?;
                }
                "column_number" => {
                    info.column = value
                        .parse()
                        .map_err(|_| Error::Parse(format!("bad column number `{value}`")))?;
                }
                other => {
                    return Err(Error::UnknownAttribute {
                        element: "CODE_INFO".to_owned(),
                        attribute: other.to_owned(),
                    })
                }
            }
        }
        self.nearest_node()?.code_info = Some(info);
        Ok(())
    }

    fn single_attribute(&self, element: &BytesStart<'_>, expected: &str) -> Result<String> {
        let mut found = None;
        for attr in element.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            if key == expected {
                found = Some(value);
            } else {
                return Err(Error::UnknownAttribute {
                    element: String::from_utf8_lossy(element.name().as_ref()).into_owned(),
                    attribute: key,
                });
            }
        }
        found.ok_or_else(|| Error::Parse(format!("missing attribute `{expected}`")))
    }
}

fn place_in_slot(node: &mut Node, slot_name: &str, child: NodeId) -> Result<()> {
    for slot in node.payload.slots_mut() {
        match slot {
            SlotMut::One(name, target) if name == slot_name => {
                if target.is_some() {
                    return Err(Error::Parse(format!(
                        "slot `{slot_name}` holds more than one child"
                    )));
                }
                *target = Some(child);
                return Ok(());
            }
            SlotMut::List(name, children) if name == slot_name => {
                children.push(child);
                return Ok(());
            }
            _ => {}
        }
    }
    Err(Error::Parse(format!(
        "no slot `{slot_name}` on `{}`",
        node.payload.kind().name()
    )))
}

/// Fresh payload of the given kind; attributes and children fill it in.
fn default_payload(kind: NodeKind) -> Payload {
    use crate::nodes as n;
    match kind {
        NodeKind::Bit => n::Bit::default().into(),
        NodeKind::Bool => n::Bool::default().into(),
        NodeKind::Char => n::Char::default().into(),
        NodeKind::Int => n::Int::default().into(),
        NodeKind::Real => n::Real::default().into(),
        NodeKind::Bitvector => n::Bitvector::default().into(),
        NodeKind::Signed => n::Signed::default().into(),
        NodeKind::Unsigned => n::Unsigned::default().into(),
        NodeKind::Array => n::Array::default().into(),
        NodeKind::Record => n::Record::default().into(),
        NodeKind::Enum => n::Enum::default().into(),
        NodeKind::String => n::StringType::default().into(),
        NodeKind::Time => n::Time::default().into(),
        NodeKind::File => n::File::default().into(),
        NodeKind::Event => n::Event::default().into(),
        NodeKind::Pointer => n::Pointer::default().into(),
        NodeKind::Reference => n::Reference::default().into(),
        NodeKind::TypeReference => n::TypeReference::default().into(),
        NodeKind::ViewReference => n::ViewReference::default().into(),
        NodeKind::BitValue => n::BitValue::default().into(),
        NodeKind::BitvectorValue => n::BitvectorValue::default().into(),
        NodeKind::BoolValue => n::BoolValue::default().into(),
        NodeKind::CharValue => n::CharValue::default().into(),
        NodeKind::IntValue => n::IntValue::default().into(),
        NodeKind::RealValue => n::RealValue::default().into(),
        NodeKind::StringValue => n::StringValue::default().into(),
        NodeKind::TimeValue => n::TimeValue::default().into(),
        NodeKind::Aggregate => n::Aggregate::default().into(),
        NodeKind::RecordValue => n::RecordValue::default().into(),
        NodeKind::Expression => n::Expression::default().into(),
        NodeKind::Cast => n::Cast::default().into(),
        NodeKind::Member => n::Member::default().into(),
        NodeKind::Slice => n::Slice::default().into(),
        NodeKind::FieldReference => n::FieldReference::default().into(),
        NodeKind::Identifier => n::Identifier::default().into(),
        NodeKind::FunctionCall => n::FunctionCall::default().into(),
        NodeKind::Instance => n::Instance::default().into(),
        NodeKind::When => n::When::default().into(),
        NodeKind::With => n::With::default().into(),
        NodeKind::Range => n::Range::default().into(),
        NodeKind::Assign => n::Assign::default().into(),
        NodeKind::ProcedureCall => n::ProcedureCall::default().into(),
        NodeKind::If => n::If::default().into(),
        NodeKind::For => n::For::default().into(),
        NodeKind::While => n::While::default().into(),
        NodeKind::Switch => n::Switch::default().into(),
        NodeKind::Return => n::Return::default().into(),
        NodeKind::Break => n::Break::default().into(),
        NodeKind::Continue => n::Continue::default().into(),
        NodeKind::Null => n::Null.into(),
        NodeKind::Wait => n::Wait::default().into(),
        NodeKind::ValueStatement => n::ValueStatement::default().into(),
        NodeKind::Transition => n::Transition::default().into(),
        NodeKind::Variable => n::Variable::default().into(),
        NodeKind::Signal => n::Signal::default().into(),
        NodeKind::Port => n::Port::default().into(),
        NodeKind::Const => n::Const::default().into(),
        NodeKind::Alias => n::Alias::default().into(),
        NodeKind::Parameter => n::Parameter::default().into(),
        NodeKind::EnumValue => n::EnumValue::default().into(),
        NodeKind::Field => n::Field::default().into(),
        NodeKind::TypeDef => n::TypeDef::default().into(),
        NodeKind::ValueTp => n::ValueTp::default().into(),
        NodeKind::TypeTp => n::TypeTp::default().into(),
        NodeKind::Function => n::Function::default().into(),
        NodeKind::Procedure => n::Procedure::default().into(),
        NodeKind::View => n::View::default().into(),
        NodeKind::DesignUnit => n::DesignUnit::default().into(),
        NodeKind::Entity => n::Entity::default().into(),
        NodeKind::Contents => n::Contents::default().into(),
        NodeKind::LibraryDef => n::LibraryDef::default().into(),
        NodeKind::Library => n::Library::default().into(),
        NodeKind::StateTable => n::StateTable::default().into(),
        NodeKind::State => n::State::default().into(),
        NodeKind::System => n::System::default().into(),
        NodeKind::IfAlt => n::IfAlt::default().into(),
        NodeKind::SwitchAlt => n::SwitchAlt::default().into(),
        NodeKind::WhenAlt => n::WhenAlt::default().into(),
        NodeKind::WithAlt => n::WithAlt::default().into(),
        NodeKind::AggregateAlt => n::AggregateAlt::default().into(),
        NodeKind::RecordValueAlt => n::RecordValueAlt::default().into(),
        NodeKind::PortAssign => n::PortAssign::default().into(),
        NodeKind::ParameterAssign => n::ParameterAssign::default().into(),
        NodeKind::ValueTpAssign => n::ValueTpAssign::default().into(),
        NodeKind::TypeTpAssign => n::TypeTpAssign::default().into(),
    }
}

fn strip_standard_libraries(tree: &mut Tree, root: NodeId) {
    let opt = PrintOptions::default();
    let standard: Vec<NodeId> = tree
        .descendants(root)
        .into_iter()
        .filter(|&id| id != root && skip_standard(tree, id, &opt))
        .collect();
    for id in standard {
        if tree.contains(id) {
            tree.detach(id);
            tree.free_subtree(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        printer::print_xml,
        structural_equals,
        EqualsOptions,
    };

    #[test]
    fn xml_round_trips_structurally() {
        let mut tree = Tree::new();
        let lhs = tree.alloc(crate::nodes::Identifier::new("y"));
        let a = tree.alloc(crate::nodes::Identifier::new("a"));
        let one = tree.alloc(crate::nodes::IntValue::new(1));
        let sum = tree.alloc(crate::nodes::Expression::new(
            crate::nodes::Operator::Plus,
            a,
            Some(one),
        ));
        let assign = tree.alloc(crate::nodes::Assign::new(lhs, sum));
        tree.node_mut(assign).comments.push("latch".to_owned());
        tree.node_mut(assign).code_info = Some(CodeInfo {
            file: "a.vhd".to_owned(),
            line: 3,
            column: 9,
        });

        let mut out = Vec::new();
        let opt = PrintOptions {
            print_code_infos: true,
            ..PrintOptions::default()
        };
        print_xml(&tree, assign, &mut out, &opt).unwrap();
        let xml = String::from_utf8(out).unwrap();

        let parsed = parse_xml(&mut tree, &xml, &ReadOptions::default()).unwrap();
        let eq = EqualsOptions {
            check_code_infos: true,
            check_comments: true,
            check_properties: true,
            ..EqualsOptions::default()
        };
        assert!(structural_equals(&tree, assign, parsed, &eq));
    }

    #[test]
    fn unknown_elements_and_attributes_are_fatal() {
        let mut tree = Tree::new();
        let err = parse_xml(&mut tree, "<NOT_A_KIND/>", &ReadOptions::default());
        assert!(matches!(err, Err(Error::UnknownKind(_))));

        let err = parse_xml(
            &mut tree,
            "<IDENTIFIER NAME=\"x\" BOGUS=\"1\"/>",
            &ReadOptions::default(),
        );
        assert!(matches!(err, Err(Error::UnknownAttribute { .. })));
    }
}
