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

//! Tree-rewriting passes.
//!
//! Every pass preserves the typing invariants: it flushes the declaration
//! and semantic-type caches for whatever it touches, defers destruction
//! through a [`Trash`], and either succeeds (reporting through an
//! `is_fixed`-style boolean whether it changed anything) or fails with a
//! diagnostic pointing at the offending node.

mod copy;
mod expand_aliases;
mod fix_template_parameters;
mod fix_unsupported_bits;
mod resolve_templates;
mod simplify;
mod split_assign_targets;
mod transform_constant;
mod trash;

pub use copy::{
    copy_list,
    copy_subtree,
    CopyHook,
    CopyOptions,
};
pub use expand_aliases::expand_aliases;
pub use fix_template_parameters::{
    fix_template_parameters,
    FixTemplateOptions,
};
pub use fix_unsupported_bits::{
    fix_unsupported_bits,
    FixUnsupportedBitsOptions,
};
pub use resolve_templates::{
    resolve_templates,
    ResolveTemplatesOptions,
};
pub use simplify::{
    simplify,
    SimplifyOptions,
};
pub use split_assign_targets::{
    split_assign_targets,
    SplitAssignTargetsOptions,
};
pub use transform_constant::{
    transform_constant,
    transform_value,
};
pub use trash::Trash;
