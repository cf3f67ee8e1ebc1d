// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::tree::{AnnotationType, ClassNode, Insn, Member, MethodNode};
use crate::Rc;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The finalized, immutable decision of what to remove from one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripPlan {
    entire_class: bool,
    fields: BTreeSet<Member>,
    methods: BTreeSet<Member>,
    interfaces: BTreeSet<Rc<str>>,
    markers: BTreeSet<AnnotationType>,
}

impl StripPlan {
    pub(crate) fn new(
        entire_class: bool,
        fields: BTreeSet<Member>,
        methods: BTreeSet<Member>,
        interfaces: BTreeSet<Rc<str>>,
        markers: BTreeSet<AnnotationType>,
    ) -> Self {
        Self {
            entire_class,
            fields,
            methods,
            interfaces,
            markers,
        }
    }

    /// True when applying the plan would change nothing; callers can skip
    /// re-encoding such classes.
    pub fn is_empty(&self) -> bool {
        !self.entire_class
            && self.fields.is_empty()
            && self.methods.is_empty()
            && self.interfaces.is_empty()
    }

    /// Whether the class carried a class-level marker for another
    /// environment and must be dropped in its entirety.
    pub fn strips_entire_class(&self) -> bool {
        self.entire_class
    }

    pub fn fields(&self) -> &BTreeSet<Member> {
        &self.fields
    }

    pub fn methods(&self) -> &BTreeSet<Member> {
        &self.methods
    }

    pub fn interfaces(&self) -> &BTreeSet<Rc<str>> {
        &self.interfaces
    }

    /// The marker annotation identities that were in play for the session.
    pub fn markers(&self) -> &BTreeSet<AnnotationType> {
        &self.markers
    }

    /// Filter/rewrite pass: produce the corrected tree, or `None` when the
    /// whole class is dropped and nothing must be emitted for it.
    pub fn apply(&self, class: &ClassNode) -> Option<ClassNode> {
        if self.entire_class {
            return None;
        }

        let interfaces = match (&class.interfaces, self.interfaces.is_empty()) {
            (Some(list), false) => {
                let kept: Vec<Rc<str>> = list
                    .iter()
                    .filter(|i| !self.interfaces.contains(i.as_ref()))
                    .cloned()
                    .collect();
                if kept.len() == list.len() {
                    Some(kept)
                } else if kept.is_empty() {
                    // All entries removed: collapse to absence, not to an
                    // empty implements clause.
                    None
                } else {
                    Some(kept)
                }
            }
            _ => class.interfaces.clone(),
        };

        // Marker type annotations are elided outright; after interface
        // removal they could reference a structural slot that no longer
        // exists.
        let type_annotations = class
            .type_annotations
            .iter()
            .filter(|ta| !self.markers.contains(&ta.desc))
            .cloned()
            .collect();

        let fields = class
            .fields
            .iter()
            .filter(|field| !self.fields.contains(&field.member()))
            .cloned()
            .collect();

        let methods = class
            .methods
            .iter()
            .filter(|method| !self.methods.contains(&method.member()))
            .map(|method| self.rewrite_method(&class.name, method))
            .collect();

        Some(ClassNode {
            version: class.version,
            access: class.access,
            name: class.name.clone(),
            signature: class.signature.clone(),
            super_name: class.super_name.clone(),
            interfaces,
            annotations: class.annotations.clone(),
            type_annotations,
            fields,
            methods,
        })
    }

    /// Field assignment is conventionally confined to constructors and the
    /// static initializer; only those bodies are patched. A write to a
    /// stripped field anywhere else is an input-contract violation handled
    /// upstream.
    fn rewrite_method(&self, class_name: &str, method: &MethodNode) -> MethodNode {
        if self.fields.is_empty() || !method.is_initializer() {
            return method.clone();
        }
        let mut instructions = Vec::with_capacity(method.instructions.len());
        for insn in &method.instructions {
            match self.rewrite_field_write(class_name, insn) {
                Some(replacement) => instructions.extend(replacement),
                None => instructions.push(insn.clone()),
            }
        }
        MethodNode {
            instructions,
            ..method.clone()
        }
    }

    /// Replaces an elided field write with stack-balancing discards: the
    /// value operand just computed (two slots for long/double), then the
    /// object reference for instance writes. Side effects that produced the
    /// value still execute; only the assignment itself disappears.
    fn rewrite_field_write(&self, class_name: &str, insn: &Insn) -> Option<[Insn; 3]> {
        let (owner, name, desc, instance) = match insn {
            Insn::PutField { owner, name, desc } => (owner, name, desc, true),
            Insn::PutStatic { owner, name, desc } => (owner, name, desc, false),
            _ => return None,
        };
        if **owner != *class_name {
            return None;
        }
        let member = Member::new(name, desc);
        if !self.fields.contains(&member) {
            return None;
        }
        Some([
            if member.is_wide() { Insn::Pop2 } else { Insn::Pop },
            if instance { Insn::Pop } else { Insn::Nop },
            Insn::Nop,
        ])
    }
}
