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

#![doc = include_str!("../README.md")]
#![warn(clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::struct_field_names,
    clippy::too_many_lines
)]

pub mod arena;
mod equality;
mod key;
pub mod manipulation;
pub mod nodes;
pub mod printer;
mod resolver;
pub mod semantics;
mod visitor;

#[cfg(test)]
mod tests;

pub use crate::{
    arena::{
        CodeInfo,
        Node,
        NodeId,
        Property,
        Tree,
    },
    equality::{
        structural_equals,
        EqualsOptions,
    },
    key::object_key,
    resolver::{
        collect_references,
        invalidate_declarations,
        resolve_symbol,
        resolve_symbol_strict,
    },
    visitor::{
        guide_visit,
        GuideVisitor,
        VisitAction,
    },
};
use once_cell::sync::Lazy;
use std::{
    collections::HashSet,
    io,
    sync::Mutex,
};

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("declaration not found for symbol `{0}`")]
    DeclarationNotFound(String),

    #[error("ambiguous declaration for symbol `{0}`")]
    AmbiguousDeclaration(String),

    #[error("resolved declaration for `{0}` does not type-check against the use site")]
    DeclarationTypeMismatch(String),

    #[error("cannot compute the semantic type of a {0} node")]
    CannotType(&'static str),

    #[error("a range bound is required to be constant but could not be folded")]
    NonConstantBound,

    #[error("cannot coerce a {from} constant to a {to} type")]
    ConstantCoercion {
        from: &'static str,
        to: &'static str,
    },

    #[error("stale node handle")]
    StaleHandle,

    #[error("printing of {0} nodes is not supported by this format")]
    UnsupportedPrint(&'static str),

    #[error("{0} is not supported by this transformation")]
    Unsupported(&'static str),

    #[error("malformed input: {0}")]
    Parse(String),

    #[error("unknown node kind `{0}`")]
    UnknownKind(String),

    #[error("unknown attribute `{attribute}` on element `{element}`")]
    UnknownAttribute {
        element: String,
        attribute: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

static RAISED_WARNINGS: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Emits `message` as a warning at most once per process.
///
/// The passes use this for per-fix-kind diagnostics that would otherwise be
/// repeated for every matching node.
pub(crate) fn raise_unique_warning(message: &str) {
    let mut raised = RAISED_WARNINGS.lock().expect("warning set poisoned");
    if raised.insert(message.to_owned()) {
        tracing::warn!("{message}");
    }
}
