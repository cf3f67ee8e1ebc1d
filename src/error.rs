// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::Rc;

use thiserror::Error;

/// Errors surfaced by a stripping session. All are fatal to the session;
/// none are retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StripError {
    #[error("session already ran its discovery pass; compile a new session from the builder to strip another class")]
    SessionReused,

    #[error("{op} requires the discovery pass to have run first")]
    SessionNotDiscovered { op: &'static str },

    #[error("cannot strip superclass {super_name} from class {class}; only implemented interfaces may be removed")]
    SuperclassStrip {
        class: Rc<str>,
        super_name: Rc<str>,
    },

    #[error("type annotation targets implements-clause entry {index}, but the class declares {count} interfaces")]
    InterfaceIndexOutOfBounds { index: usize, count: usize },

    #[error("cannot finalize plan with {count} unresolved lambda checks; run the lambda resolution pass until none remain")]
    UnresolvedLambdas { count: usize },
}
