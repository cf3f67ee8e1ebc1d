// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::Rc;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal name of the class hosting the lambda-creation bootstrap method.
pub(crate) const METAFACTORY_OWNER: &str = "java/lang/invoke/LambdaMetafactory";
pub(crate) const METAFACTORY_NAME: &str = "metafactory";
pub(crate) const METAFACTORY_DESC: &str =
    "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodHandle;Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/CallSite;";

/// Handle kind for `invokestatic` method references.
pub(crate) const H_INVOKESTATIC: u8 = 6;

/// Identity of an annotation type, keyed by its type descriptor
/// (`Lcom/example/ClientOnly;`). Equality is structural, so the same
/// annotation decoded from different classes compares equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationType(Rc<str>);

impl AnnotationType {
    /// From a type descriptor such as `Ldemo/ClientOnly;`.
    pub fn from_descriptor(desc: &str) -> Self {
        Self(Rc::from(desc))
    }

    /// From an internal name such as `demo/ClientOnly`.
    pub fn from_internal_name(name: &str) -> Self {
        Self(Rc::from(format!("L{name};").as_str()))
    }

    pub fn descriptor(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A member identity: name plus full descriptor. Two members are the same
/// only if both match, which keeps method overloads distinct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Member {
    pub name: Rc<str>,
    pub desc: Rc<str>,
}

impl Member {
    pub fn new(name: &str, desc: &str) -> Self {
        Self {
            name: Rc::from(name),
            desc: Rc::from(desc),
        }
    }

    /// Long and double values occupy two operand-stack slots.
    pub fn is_wide(&self) -> bool {
        matches!(&*self.desc, "J" | "D")
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.desc.starts_with('(') {
            write!(f, "{}{}", self.name, self.desc)
        } else {
            write!(f, "{}:{}", self.name, self.desc)
        }
    }
}

/// A decoded annotation value. The engine only ever interprets `Bool`
/// (for per-use lambda-stripping overrides); everything else passes through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnnotationValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
}

impl AnnotationValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnotationValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// An annotation usage on a class, field, or method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub desc: AnnotationType,
    pub visible: bool,
    pub values: Vec<(Rc<str>, AnnotationValue)>,
}

impl Annotation {
    pub fn new(desc: AnnotationType, visible: bool) -> Self {
        Self {
            desc,
            visible,
            values: Vec::new(),
        }
    }

    /// The value supplied for the named annotation element, if any.
    pub fn value(&self, name: &str) -> Option<&AnnotationValue> {
        self.values
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| v)
    }
}

/// Structural slot a type-use annotation is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeUseTarget {
    /// The extends clause of the class declaration.
    Superclass,
    /// Entry at this index of the implements clause.
    Interface(usize),
    /// Any other type-use position; never a strip target.
    Other,
}

/// An annotation attached to a type use rather than a declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAnnotation {
    pub target: TypeUseTarget,
    pub desc: AnnotationType,
    pub visible: bool,
}

/// A method-handle constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
    pub tag: u8,
    pub owner: Rc<str>,
    pub name: Rc<str>,
    pub desc: Rc<str>,
}

impl Handle {
    pub fn invokestatic(owner: &str, name: &str, desc: &str) -> Self {
        Self {
            tag: H_INVOKESTATIC,
            owner: Rc::from(owner),
            name: Rc::from(name),
            desc: Rc::from(desc),
        }
    }

    /// True for the fixed bootstrap identity used by lambda-creation sites.
    pub(crate) fn is_lambda_metafactory(&self) -> bool {
        self.tag == H_INVOKESTATIC
            && &*self.name == METAFACTORY_NAME
            && &*self.owner == METAFACTORY_OWNER
            && &*self.desc == METAFACTORY_DESC
    }
}

/// A static bootstrap argument of a dynamic call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BootstrapArg {
    Handle(Handle),
    MethodType(Rc<str>),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(Rc<str>),
}

/// One element of a decoded instruction stream. Only the shapes the stripper
/// inspects or emits are modeled; everything else is `Opaque` and carried
/// through untouched (operand fidelity is the external codec's concern).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Insn {
    /// Write to an instance field; pops a value and an object reference.
    PutField {
        owner: Rc<str>,
        name: Rc<str>,
        desc: Rc<str>,
    },
    /// Write to a static field; pops a value.
    PutStatic {
        owner: Rc<str>,
        name: Rc<str>,
        desc: Rc<str>,
    },
    /// Dynamic call site resolved through a bootstrap method at first use.
    InvokeDynamic {
        name: Rc<str>,
        desc: Rc<str>,
        bootstrap: Handle,
        args: Vec<BootstrapArg>,
    },
    /// Discard the top stack slot.
    Pop,
    /// Discard the top two stack slots.
    Pop2,
    Nop,
    /// Any other decoded instruction, carried through unmodified.
    Opaque { opcode: u8 },
}

impl Insn {
    /// The implementation-method handle when this instruction is a
    /// lambda-creation call site: the bootstrap handle must be the
    /// metafactory, with exactly three static arguments of which the second
    /// is a handle naming the implementation method.
    pub(crate) fn lambda_impl_handle(&self) -> Option<&Handle> {
        let Insn::InvokeDynamic {
            bootstrap, args, ..
        } = self
        else {
            return None;
        };
        if args.len() != 3 || !bootstrap.is_lambda_metafactory() {
            return None;
        }
        match &args[1] {
            BootstrapArg::Handle(h) => Some(h),
            _ => None,
        }
    }
}

/// A decoded field declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
    pub access: u32,
    pub name: Rc<str>,
    pub desc: Rc<str>,
    pub signature: Option<Rc<str>>,
    pub annotations: Vec<Annotation>,
}

impl FieldNode {
    pub fn member(&self) -> Member {
        Member {
            name: self.name.clone(),
            desc: self.desc.clone(),
        }
    }
}

/// A decoded method declaration with its instruction stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodNode {
    pub access: u32,
    pub name: Rc<str>,
    pub desc: Rc<str>,
    pub signature: Option<Rc<str>>,
    pub exceptions: Vec<Rc<str>>,
    pub annotations: Vec<Annotation>,
    pub instructions: Vec<Insn>,
}

impl MethodNode {
    pub fn member(&self) -> Member {
        Member {
            name: self.name.clone(),
            desc: self.desc.clone(),
        }
    }

    /// Constructors and the static initializer, the only places the rewrite
    /// pass patches field writes.
    pub fn is_initializer(&self) -> bool {
        matches!(&*self.name, "<init>" | "<clinit>")
    }
}

/// One class's declarations as produced by an external decoder and consumed
/// by an external encoder after stripping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassNode {
    pub version: u32,
    pub access: u32,
    pub name: Rc<str>,
    pub signature: Option<Rc<str>>,
    pub super_name: Option<Rc<str>>,
    /// `None` means "no implements clause"; the distinction from an empty
    /// list is significant in the underlying format and preserved verbatim.
    pub interfaces: Option<Vec<Rc<str>>>,
    pub annotations: Vec<Annotation>,
    pub type_annotations: Vec<TypeAnnotation>,
    pub fields: Vec<FieldNode>,
    pub methods: Vec<MethodNode>,
}

impl ClassNode {
    /// Decode a class tree from its JSON interchange form.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Encode this class tree into its JSON interchange form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
