// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared fixture builders for stripping tests.

use crate::tree::{METAFACTORY_DESC, METAFACTORY_NAME, METAFACTORY_OWNER};
use crate::*;

pub fn client_only() -> AnnotationType {
    AnnotationType::from_internal_name("demo/ClientOnly")
}

pub fn server_only() -> AnnotationType {
    AnnotationType::from_internal_name("demo/ServerOnly")
}

/// The two-environment rule set used across the test suite, mirroring a
/// typical client/server build with a per-use `stripLambdas` override.
pub fn factory() -> StripperBuilder {
    StripperBuilder::new()
        .rule_with_override("client", client_only(), "stripLambdas")
        .rule_with_override("server", server_only(), "stripLambdas")
}

pub fn marked(desc: AnnotationType) -> Annotation {
    Annotation::new(desc, true)
}

pub fn marked_with(desc: AnnotationType, key: &str, value: bool) -> Annotation {
    let mut annotation = Annotation::new(desc, true);
    annotation
        .values
        .push((Rc::from(key), AnnotationValue::Bool(value)));
    annotation
}

pub fn field(name: &str, desc: &str, annotations: Vec<Annotation>) -> FieldNode {
    FieldNode {
        access: 0x0002, // private
        name: Rc::from(name),
        desc: Rc::from(desc),
        signature: None,
        annotations,
    }
}

pub fn method(name: &str, desc: &str, annotations: Vec<Annotation>) -> MethodNode {
    method_with_code(name, desc, annotations, Vec::new())
}

pub fn method_with_code(
    name: &str,
    desc: &str,
    annotations: Vec<Annotation>,
    instructions: Vec<Insn>,
) -> MethodNode {
    MethodNode {
        access: 0x0001, // public
        name: Rc::from(name),
        desc: Rc::from(desc),
        signature: None,
        exceptions: Vec::new(),
        annotations,
        instructions,
    }
}

/// A lambda-creation call site whose implementation method lives in `owner`.
pub fn lambda_site(owner: &str, name: &str, desc: &str) -> Insn {
    Insn::InvokeDynamic {
        name: Rc::from("run"),
        desc: Rc::from("()Ljava/lang/Runnable;"),
        bootstrap: Handle::invokestatic(METAFACTORY_OWNER, METAFACTORY_NAME, METAFACTORY_DESC),
        args: vec![
            BootstrapArg::MethodType(Rc::from("()V")),
            BootstrapArg::Handle(Handle::invokestatic(owner, name, desc)),
            BootstrapArg::MethodType(Rc::from("()V")),
        ],
    }
}

pub fn put_field(owner: &str, name: &str, desc: &str) -> Insn {
    Insn::PutField {
        owner: Rc::from(owner),
        name: Rc::from(name),
        desc: Rc::from(desc),
    }
}

pub fn put_static(owner: &str, name: &str, desc: &str) -> Insn {
    Insn::PutStatic {
        owner: Rc::from(owner),
        name: Rc::from(name),
        desc: Rc::from(desc),
    }
}

pub fn class(name: &str) -> ClassNode {
    ClassNode {
        version: 52,
        access: 0x0021, // public super
        name: Rc::from(name),
        signature: None,
        super_name: Some(Rc::from("java/lang/Object")),
        interfaces: None,
        annotations: Vec::new(),
        type_annotations: Vec::new(),
        fields: Vec::new(),
        methods: Vec::new(),
    }
}

pub fn implemented(mut class: ClassNode, interfaces: &[&str]) -> ClassNode {
    class.interfaces = Some(interfaces.iter().map(|i| Rc::from(*i)).collect());
    class
}
