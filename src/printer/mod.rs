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

//! The textual and XML serializers, the XML parser and the file plumbing.
//!
//! Both serializers share one scalar-attribute table per node kind, so the
//! spellings stay identical between the two forms and the parser inverts
//! them exactly.

mod text;
mod xml;
mod xml_parser;

pub use text::print_hif;
pub use xml::print_xml;
pub use xml_parser::parse_xml;

use crate::{
    arena::{
        NodeId,
        Tree,
    },
    nodes::{
        BitConstant,
        CaseSemantics,
        LanguageId,
        NodeKind,
        Operator,
        Payload,
        PortDirection,
        RangeDirection,
        SubProgramKind,
        TimeUnit,
        TypeVariant,
    },
    semantics::{
        HifSemantics,
        LanguageSemantics,
    },
    Error,
    Result,
};
use std::{
    fs,
    io::Write,
    path::{
        Path,
        PathBuf,
    },
    sync::atomic::{
        AtomicU32,
        Ordering,
    },
};

/// Options shared by both serializers.
pub struct PrintOptions {
    pub print_comments: bool,
    /// Elide list contents, printing only their sizes.
    pub print_summary: bool,
    pub print_code_infos: bool,
    pub print_properties: bool,
    pub print_additional_keywords: bool,
    /// Include standard-library subtrees.
    pub print_standard_libraries: bool,
    /// Append to the output file instead of truncating it.
    pub append_mode: bool,
    /// The active semantics; affects standard-library filtering.
    pub sem: &'static dyn LanguageSemantics,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            print_comments: true,
            print_summary: false,
            print_code_infos: false,
            print_properties: true,
            print_additional_keywords: true,
            print_standard_libraries: false,
            append_mode: false,
            sem: HifSemantics::instance(),
        }
    }
}

/// Options for [`read_file`] / [`parse_xml`].
pub struct ReadOptions {
    /// Keep standard-library subtrees while loading.
    pub load_standard_library: bool,
    pub sem: &'static dyn LanguageSemantics,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            load_standard_library: true,
            sem: HifSemantics::instance(),
        }
    }
}

/// A scalar attribute as both serializers see it.
pub(crate) enum AttrValue {
    Flag(bool),
    Text(String),
}

pub(crate) type Attr = (&'static str, AttrValue);

fn flag(name: &'static str, value: bool) -> Attr {
    (name, AttrValue::Flag(value))
}

fn text(name: &'static str, value: impl Into<String>) -> Attr {
    (name, AttrValue::Text(value.into()))
}

fn variant_attr(out: &mut Vec<Attr>, variant: TypeVariant) {
    if variant != TypeVariant::Native {
        out.push(text("TYPE_VARIANT", variant.name()));
    }
}

/// The scalar attributes of a node in stable order, excluding its name.
pub(crate) fn scalar_attributes(payload: &Payload) -> Vec<Attr> {
    let mut out = Vec::new();
    match payload {
        Payload::Bit(x) => {
            out.push(flag("LOGIC", x.logic));
            out.push(flag("RESOLVED", x.resolved));
            out.push(flag("CONSTEXPR", x.constexpr));
            variant_attr(&mut out, x.variant);
        }
        Payload::Bool(x) => {
            out.push(flag("CONSTEXPR", x.constexpr));
            variant_attr(&mut out, x.variant);
        }
        Payload::Char(x) => {
            out.push(flag("CONSTEXPR", x.constexpr));
            variant_attr(&mut out, x.variant);
        }
        Payload::Int(x) => {
            out.push(flag("SIGNED", x.signed));
            out.push(flag("CONSTEXPR", x.constexpr));
            variant_attr(&mut out, x.variant);
        }
        Payload::Real(x) => {
            out.push(flag("CONSTEXPR", x.constexpr));
            variant_attr(&mut out, x.variant);
        }
        Payload::Bitvector(x) => {
            out.push(flag("LOGIC", x.logic));
            out.push(flag("RESOLVED", x.resolved));
            out.push(flag("SIGNED", x.signed));
            out.push(flag("CONSTEXPR", x.constexpr));
            variant_attr(&mut out, x.variant);
        }
        Payload::Signed(x) => {
            out.push(flag("CONSTEXPR", x.constexpr));
            variant_attr(&mut out, x.variant);
        }
        Payload::Unsigned(x) => {
            out.push(flag("CONSTEXPR", x.constexpr));
            variant_attr(&mut out, x.variant);
        }
        Payload::Array(x) => {
            out.push(flag("SIGNED", x.signed));
            variant_attr(&mut out, x.variant);
        }
        Payload::Record(x) => {
            out.push(flag("PACKED", x.packed));
            out.push(flag("UNION", x.union_));
            variant_attr(&mut out, x.variant);
        }
        Payload::Enum(x) => variant_attr(&mut out, x.variant),
        Payload::String(x) => {
            out.push(flag("CONSTEXPR", x.constexpr));
            variant_attr(&mut out, x.variant);
        }
        Payload::Time(x) => {
            out.push(flag("CONSTEXPR", x.constexpr));
            variant_attr(&mut out, x.variant);
        }
        Payload::File(x) => variant_attr(&mut out, x.variant),
        Payload::Event(x) => variant_attr(&mut out, x.variant),
        Payload::Pointer(x) => variant_attr(&mut out, x.variant),
        Payload::Reference(x) => variant_attr(&mut out, x.variant),
        Payload::TypeReference(x) => variant_attr(&mut out, x.variant),
        Payload::ViewReference(x) => {
            out.push(text("DESIGN_UNIT", x.design_unit.clone()));
            variant_attr(&mut out, x.variant);
        }

        Payload::BitValue(x) => out.push(text("VALUE", x.value.to_char())),
        Payload::BitvectorValue(x) => out.push(text("VALUE", x.value.clone())),
        Payload::BoolValue(x) => out.push(text("VALUE", x.value.to_string())),
        Payload::CharValue(x) => out.push(text("VALUE", x.value)),
        Payload::IntValue(x) => out.push(text("VALUE", x.value.to_string())),
        Payload::RealValue(x) => out.push(text("VALUE", format!("{:?}", x.value))),
        Payload::StringValue(x) => out.push(text("VALUE", x.value.clone())),
        Payload::TimeValue(x) => {
            out.push(text("VALUE", format!("{:?}", x.value)));
            out.push(text("UNIT", x.unit.name()));
        }
        Payload::Expression(x) => out.push(text("OPERATOR", x.operator.name())),
        Payload::When(x) => out.push(flag("LOGIC_TERNARY", x.logic_ternary)),
        Payload::With(x) => out.push(text("CASE_SEMANTICS", x.case_semantics.name())),
        Payload::Range(x) => out.push(text("DIRECTION", x.direction.name())),

        Payload::For(x) => {
            if !x.label.is_empty() {
                out.push(text("LABEL", x.label.clone()));
            }
        }
        Payload::While(x) => {
            if !x.label.is_empty() {
                out.push(text("LABEL", x.label.clone()));
            }
            out.push(flag("DO_WHILE", x.do_while));
        }
        Payload::Switch(x) => out.push(text("CASE_SEMANTICS", x.case_semantics.name())),
        Payload::Break(x) => {
            if !x.name.is_empty() {
                out.push(text("LABEL", x.name.clone()));
            }
        }
        Payload::Continue(x) => {
            if !x.name.is_empty() {
                out.push(text("LABEL", x.name.clone()));
            }
        }
        Payload::Transition(x) => {
            out.push(text("SOURCE", x.source.clone()));
            out.push(text("DESTINATION", x.destination.clone()));
        }

        Payload::Variable(x) => out.push(flag("STANDARD", x.standard)),
        Payload::Signal(x) => {
            out.push(flag("STANDARD", x.standard));
            out.push(flag("WRAPPER", x.wrapper));
        }
        Payload::Port(x) => {
            out.push(text("DIRECTION", x.direction.name()));
            out.push(flag("WRAPPER", x.wrapper));
        }
        Payload::Const(x) => {
            out.push(flag("STANDARD", x.standard));
            out.push(flag("INSTANCE", x.instance));
        }
        Payload::Alias(x) => out.push(flag("STANDARD", x.standard)),
        Payload::Parameter(x) => out.push(text("DIRECTION", x.direction.name())),
        Payload::TypeDef(x) => {
            out.push(flag("OPAQUE", x.opaque));
            out.push(flag("EXTERNAL", x.external));
            out.push(flag("STANDARD", x.standard));
        }
        Payload::ValueTp(x) => {
            out.push(flag("COMPILE_TIME_CONSTANT", x.compile_time_constant));
        }
        Payload::Function(x) => {
            out.push(text("KIND", x.kind.name()));
            out.push(flag("STANDARD", x.standard));
        }
        Payload::Procedure(x) => {
            out.push(text("KIND", x.kind.name()));
            out.push(flag("STANDARD", x.standard));
        }
        Payload::View(x) => {
            out.push(text("LANGUAGE_ID", x.language_id.name()));
            out.push(flag("STANDARD", x.standard));
        }
        Payload::LibraryDef(x) => {
            out.push(text("LANGUAGE_ID", x.language_id.name()));
            out.push(flag("STANDARD", x.standard));
        }
        Payload::Library(x) => {
            if !x.filename.is_empty() {
                out.push(text("FILENAME", x.filename.clone()));
            }
            out.push(flag("STANDARD", x.standard));
            out.push(flag("SYSTEM", x.system));
        }
        Payload::StateTable(x) => {
            out.push(flag("STANDARD", x.standard));
            out.push(flag("DONT_INITIALIZE", x.dont_initialize));
        }
        Payload::System(x) => {
            out.push(text("LANGUAGE_ID", x.language_id.name()));
            out.push(text("RELEASE", x.version_info.release.clone()));
            out.push(text("TOOL", x.version_info.tool.clone()));
            out.push(text(
                "GENERATION_DATE",
                x.version_info.generation_date.clone(),
            ));
            out.push(text(
                "FORMAT_VERSION",
                format!(
                    "{}.{}",
                    x.version_info.format_version_major, x.version_info.format_version_minor
                ),
            ));
        }

        Payload::PortAssign(x) => out.push(text("DIRECTION", x.direction.name())),
        Payload::ParameterAssign(x) => out.push(text("DIRECTION", x.direction.name())),

        _ => {}
    }
    out
}

fn bad_attr_value(name: &str, value: &str) -> Error {
    Error::Parse(format!("bad value `{value}` for attribute `{name}`"))
}

/// Inverse of [`scalar_attributes`], used by the XML parser. Unknown
/// attribute names are an error; the format is strict.
pub(crate) fn set_scalar_attribute(
    payload: &mut Payload,
    name: &str,
    value: &str,
) -> Result<()> {
    let parse_flag = |v: &str| -> Result<bool> {
        match v {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(bad_attr_value(name, v)),
        }
    };

    if name == "NAME" {
        payload.set_name(value);
        return Ok(());
    }

    let handled = match (&mut *payload, name) {
        (Payload::Bit(x), "LOGIC") => {
            x.logic = parse_flag(value)?;
            true
        }
        (Payload::Bit(x), "RESOLVED") => {
            x.resolved = parse_flag(value)?;
            true
        }
        (Payload::Bitvector(x), "LOGIC") => {
            x.logic = parse_flag(value)?;
            true
        }
        (Payload::Bitvector(x), "RESOLVED") => {
            x.resolved = parse_flag(value)?;
            true
        }
        (Payload::Bitvector(x), "SIGNED") => {
            x.signed = parse_flag(value)?;
            true
        }
        (Payload::Int(x), "SIGNED") => {
            x.signed = parse_flag(value)?;
            true
        }
        (Payload::Array(x), "SIGNED") => {
            x.signed = parse_flag(value)?;
            true
        }
        (Payload::Record(x), "PACKED") => {
            x.packed = parse_flag(value)?;
            true
        }
        (Payload::Record(x), "UNION") => {
            x.union_ = parse_flag(value)?;
            true
        }
        (Payload::ViewReference(x), "DESIGN_UNIT") => {
            x.design_unit = value.to_owned();
            true
        }
        (Payload::BitValue(x), "VALUE") => {
            let c = value.chars().next().ok_or_else(|| bad_attr_value(name, value))?;
            x.value = BitConstant::from_char(c).ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        (Payload::BitvectorValue(x), "VALUE") => {
            x.value = value.to_owned();
            true
        }
        (Payload::BoolValue(x), "VALUE") => {
            x.value = parse_flag(value)?;
            true
        }
        (Payload::CharValue(x), "VALUE") => {
            x.value = value.chars().next().ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        (Payload::IntValue(x), "VALUE") => {
            x.value = value.parse().map_err(|_| bad_attr_value(name, value))?;
            true
        }
        (Payload::RealValue(x), "VALUE") => {
            x.value = value.parse().map_err(|_| bad_attr_value(name, value))?;
            true
        }
        (Payload::StringValue(x), "VALUE") => {
            x.value = value.to_owned();
            true
        }
        (Payload::TimeValue(x), "VALUE") => {
            x.value = value.parse().map_err(|_| bad_attr_value(name, value))?;
            true
        }
        (Payload::TimeValue(x), "UNIT") => {
            x.unit = TimeUnit::from_name(value).ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        (Payload::Expression(x), "OPERATOR") => {
            x.operator = Operator::from_name(value).ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        (Payload::When(x), "LOGIC_TERNARY") => {
            x.logic_ternary = parse_flag(value)?;
            true
        }
        (Payload::With(x), "CASE_SEMANTICS") => {
            x.case_semantics = CaseSemantics::from_name(value).ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        (Payload::Switch(x), "CASE_SEMANTICS") => {
            x.case_semantics = CaseSemantics::from_name(value).ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        (Payload::Range(x), "DIRECTION") => {
            x.direction = RangeDirection::from_name(value).ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        (Payload::For(x), "LABEL") => {
            x.label = value.to_owned();
            true
        }
        (Payload::While(x), "LABEL") => {
            x.label = value.to_owned();
            true
        }
        (Payload::While(x), "DO_WHILE") => {
            x.do_while = parse_flag(value)?;
            true
        }
        (Payload::Break(x), "LABEL") => {
            x.name = value.to_owned();
            true
        }
        (Payload::Continue(x), "LABEL") => {
            x.name = value.to_owned();
            true
        }
        (Payload::Transition(x), "SOURCE") => {
            x.source = value.to_owned();
            true
        }
        (Payload::Transition(x), "DESTINATION") => {
            x.destination = value.to_owned();
            true
        }
        (Payload::Signal(x), "WRAPPER") => {
            x.wrapper = parse_flag(value)?;
            true
        }
        (Payload::Port(x), "DIRECTION") => {
            x.direction = PortDirection::from_name(value).ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        (Payload::Port(x), "WRAPPER") => {
            x.wrapper = parse_flag(value)?;
            true
        }
        (Payload::Const(x), "INSTANCE") => {
            x.instance = parse_flag(value)?;
            true
        }
        (Payload::Parameter(x), "DIRECTION") => {
            x.direction = PortDirection::from_name(value).ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        (Payload::TypeDef(x), "OPAQUE") => {
            x.opaque = parse_flag(value)?;
            true
        }
        (Payload::TypeDef(x), "EXTERNAL") => {
            x.external = parse_flag(value)?;
            true
        }
        (Payload::ValueTp(x), "COMPILE_TIME_CONSTANT") => {
            x.compile_time_constant = parse_flag(value)?;
            true
        }
        (Payload::Function(x), "KIND") => {
            x.kind = SubProgramKind::from_name(value).ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        (Payload::Procedure(x), "KIND") => {
            x.kind = SubProgramKind::from_name(value).ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        (Payload::View(x), "LANGUAGE_ID") => {
            x.language_id = LanguageId::from_name(value).ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        (Payload::LibraryDef(x), "LANGUAGE_ID") => {
            x.language_id = LanguageId::from_name(value).ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        (Payload::Library(x), "FILENAME") => {
            x.filename = value.to_owned();
            true
        }
        (Payload::Library(x), "SYSTEM") => {
            x.system = parse_flag(value)?;
            true
        }
        (Payload::StateTable(x), "DONT_INITIALIZE") => {
            x.dont_initialize = parse_flag(value)?;
            true
        }
        (Payload::System(x), "LANGUAGE_ID") => {
            x.language_id = LanguageId::from_name(value).ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        (Payload::System(x), "RELEASE") => {
            x.version_info.release = value.to_owned();
            true
        }
        (Payload::System(x), "TOOL") => {
            x.version_info.tool = value.to_owned();
            true
        }
        (Payload::System(x), "GENERATION_DATE") => {
            x.version_info.generation_date = value.to_owned();
            true
        }
        (Payload::System(x), "FORMAT_VERSION") => {
            let (major, minor) = value.split_once('.').ok_or_else(|| bad_attr_value(name, value))?;
            x.version_info.format_version_major = major.parse().map_err(|_| bad_attr_value(name, value))?;
            x.version_info.format_version_minor = minor.parse().map_err(|_| bad_attr_value(name, value))?;
            true
        }
        (Payload::PortAssign(x), "DIRECTION") => {
            x.direction = PortDirection::from_name(value).ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        (Payload::ParameterAssign(x), "DIRECTION") => {
            x.direction = PortDirection::from_name(value).ok_or_else(|| bad_attr_value(name, value))?;
            true
        }
        _ => set_common_attribute(payload, name, value, &parse_flag)?,
    };

    if handled {
        Ok(())
    } else {
        Err(Error::UnknownAttribute {
            element: payload.kind().name().to_owned(),
            attribute: name.to_owned(),
        })
    }
}

/// Flags shared by families (CONSTEXPR, STANDARD, TYPE_VARIANT).
fn set_common_attribute(
    payload: &mut Payload,
    name: &str,
    value: &str,
    parse_flag: &dyn Fn(&str) -> Result<bool>,
) -> Result<bool> {
    match name {
        "CONSTEXPR" => {
            if payload.constexpr_flag().is_none() {
                return Ok(false);
            }
            payload.set_constexpr(parse_flag(value)?);
            Ok(true)
        }
        "STANDARD" => {
            let ok = match payload {
                Payload::Variable(x) => {
                    x.standard = parse_flag(value)?;
                    true
                }
                Payload::Signal(x) => {
                    x.standard = parse_flag(value)?;
                    true
                }
                Payload::Const(x) => {
                    x.standard = parse_flag(value)?;
                    true
                }
                Payload::Alias(x) => {
                    x.standard = parse_flag(value)?;
                    true
                }
                Payload::TypeDef(x) => {
                    x.standard = parse_flag(value)?;
                    true
                }
                Payload::Function(x) => {
                    x.standard = parse_flag(value)?;
                    true
                }
                Payload::Procedure(x) => {
                    x.standard = parse_flag(value)?;
                    true
                }
                Payload::View(x) => {
                    x.standard = parse_flag(value)?;
                    true
                }
                Payload::LibraryDef(x) => {
                    x.standard = parse_flag(value)?;
                    true
                }
                Payload::Library(x) => {
                    x.standard = parse_flag(value)?;
                    true
                }
                Payload::StateTable(x) => {
                    x.standard = parse_flag(value)?;
                    true
                }
                _ => false,
            };
            Ok(ok)
        }
        "TYPE_VARIANT" => {
            let variant = TypeVariant::from_name(value)
                .ok_or_else(|| Error::Parse(format!("bad type variant `{value}`")))?;
            let ok = match payload {
                Payload::Bit(x) => {
                    x.variant = variant;
                    true
                }
                Payload::Bool(x) => {
                    x.variant = variant;
                    true
                }
                Payload::Char(x) => {
                    x.variant = variant;
                    true
                }
                Payload::Int(x) => {
                    x.variant = variant;
                    true
                }
                Payload::Real(x) => {
                    x.variant = variant;
                    true
                }
                Payload::Bitvector(x) => {
                    x.variant = variant;
                    true
                }
                Payload::Signed(x) => {
                    x.variant = variant;
                    true
                }
                Payload::Unsigned(x) => {
                    x.variant = variant;
                    true
                }
                Payload::Array(x) => {
                    x.variant = variant;
                    true
                }
                Payload::Record(x) => {
                    x.variant = variant;
                    true
                }
                Payload::Enum(x) => {
                    x.variant = variant;
                    true
                }
                Payload::String(x) => {
                    x.variant = variant;
                    true
                }
                Payload::Time(x) => {
                    x.variant = variant;
                    true
                }
                Payload::File(x) => {
                    x.variant = variant;
                    true
                }
                Payload::Event(x) => {
                    x.variant = variant;
                    true
                }
                Payload::Pointer(x) => {
                    x.variant = variant;
                    true
                }
                Payload::Reference(x) => {
                    x.variant = variant;
                    true
                }
                Payload::TypeReference(x) => {
                    x.variant = variant;
                    true
                }
                Payload::ViewReference(x) => {
                    x.variant = variant;
                    true
                }
                _ => false,
            };
            Ok(ok)
        }
        _ => Ok(false),
    }
}

/// Whether a subtree belongs to a standard library and should be elided.
pub(crate) fn skip_standard(tree: &Tree, id: NodeId, opt: &PrintOptions) -> bool {
    if opt.print_standard_libraries {
        return false;
    }
    matches!(
        tree.kind(id),
        NodeKind::LibraryDef | NodeKind::View
    ) && tree.payload(id).is_standard()
}

static FILE_ID: AtomicU32 = AtomicU32::new(0);

/// Stamps version info into a `System` root prior to writing.
fn stamp_version(tree: &mut Tree, root: NodeId) {
    if let Payload::System(sys) = tree.payload_mut(root) {
        let defaults = crate::nodes::VersionInfo::default();
        sys.version_info.tool = "hif".to_owned();
        sys.version_info.generation_date =
            chrono::Local::now().format("%H:%M:%S%.6f").to_string();
        sys.version_info.format_version_major = defaults.format_version_major;
        sys.version_info.format_version_minor = defaults.format_version_minor;
    }
}

/// Writes `root` to `filename`, appending the `.hif` / `.hif.xml`
/// extension when missing and creating parent directories.
pub fn write_file(
    tree: &mut Tree,
    root: NodeId,
    filename: impl AsRef<Path>,
    xml_format: bool,
    opt: &PrintOptions,
) -> Result<PathBuf> {
    let extension = if xml_format { ".hif.xml" } else { ".hif" };
    let mut path = filename.as_ref().as_os_str().to_owned();
    if !filename
        .as_ref()
        .to_string_lossy()
        .ends_with(extension)
    {
        path.push(extension);
    }
    let path = PathBuf::from(path);
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }

    stamp_version(tree, root);

    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(opt.append_mode)
        .truncate(!opt.append_mode)
        .open(&path)?;
    if xml_format {
        print_xml(tree, root, &mut file, opt)?;
    } else {
        print_hif(tree, root, &mut file, opt)?;
    }
    file.flush()?;
    Ok(path)
}

/// Debug writer: a timestamped, uniquely numbered file under
/// `debug_out_files/` (or `custom_path`).
pub fn write_unique_file(
    tree: &mut Tree,
    root: NodeId,
    filename: &str,
    custom_path: Option<&Path>,
    xml_format: bool,
    opt: &PrintOptions,
) -> Result<PathBuf> {
    let id = FILE_ID.fetch_add(1, Ordering::Relaxed);
    let stamp = chrono::Local::now().format("%H:%M:%S%.6f");
    let dir = match custom_path {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from("debug_out_files"),
    };
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{filename}_{stamp}_{id}"));
    let written = write_file(tree, root, &path, xml_format, opt)?;
    tracing::debug!("written file {}", written.display());
    Ok(written)
}

/// Reads an XML HIF file into a fresh tree.
pub fn read_file(path: impl AsRef<Path>, opt: &ReadOptions) -> Result<(Tree, NodeId)> {
    let contents = fs::read_to_string(path)?;
    let mut tree = Tree::new();
    let root = parse_xml(&mut tree, &contents, opt)?;
    Ok((tree, root))
}
