// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod error;
mod plan;
mod rules;
mod session;
mod tree;

pub use error::StripError;
pub use plan::StripPlan;
pub use rules::{Rule, StripperBuilder};
pub use session::Session;
pub use tree::{
    Annotation, AnnotationType, AnnotationValue, BootstrapArg, ClassNode, FieldNode, Handle, Insn,
    Member, MethodNode, TypeAnnotation, TypeUseTarget,
};

#[cfg(feature = "arc")]
pub use std::sync::Arc as Rc;
#[cfg(not(feature = "arc"))]
pub use std::rc::Rc;

#[cfg(test)]
mod tests;
