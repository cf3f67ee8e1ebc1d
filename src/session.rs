// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::StripError;
use crate::plan::StripPlan;
use crate::rules::Rule;
use crate::tree::{Annotation, AnnotationType, ClassNode, Member, TypeUseTarget};
use crate::Rc;

use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Fresh,
    Discovered,
}

/// A single-use stripping session bound to one active rule map.
///
/// Passes run in order: [`discover`](Self::discover) walks the class tree
/// once and decides what must be removed; while
/// [`needs_lambda_resolution`](Self::needs_lambda_resolution) reports true,
/// [`resolve_lambdas`](Self::resolve_lambdas) walks the method bodies to pick
/// up lambda-implementation methods owned by stripped methods; finally
/// [`finalize_plan`](Self::finalize_plan) yields the immutable [`StripPlan`].
///
/// A session holds no shared state and is never walked twice; to strip
/// another class, compile a new session from the builder.
#[derive(Debug)]
pub struct Session {
    rules: BTreeMap<AnnotationType, Rule>,
    state: SessionState,

    // Snapshot of the class header, captured at the start of discovery.
    class_name: Option<Rc<str>>,
    super_name: Option<Rc<str>>,
    interfaces: Vec<Rc<str>>,

    strip_entire_class: bool,
    strip_fields: BTreeSet<Member>,
    strip_methods: BTreeSet<Member>,
    strip_interfaces: BTreeSet<Rc<str>>,
    pending_lambdas: BTreeMap<Member, Rule>,
}

impl Session {
    pub(crate) fn new(rules: BTreeMap<AnnotationType, Rule>) -> Self {
        Self {
            rules,
            state: SessionState::Fresh,
            class_name: None,
            super_name: None,
            interfaces: Vec::new(),
            strip_entire_class: false,
            strip_fields: BTreeSet::new(),
            strip_methods: BTreeSet::new(),
            strip_interfaces: BTreeSet::new(),
            pending_lambdas: BTreeMap::new(),
        }
    }

    /// Discovery pass: one walk over the class tree deciding which members
    /// must go.
    ///
    /// Member-level decisions are still computed when a class-level marker
    /// sets the whole-class flag, so the resulting plan stays inspectable
    /// even for classes that end up dropped entirely.
    pub fn discover(&mut self, class: &ClassNode) -> Result<(), StripError> {
        if self.state != SessionState::Fresh {
            return Err(StripError::SessionReused);
        }
        self.class_name = Some(class.name.clone());
        self.super_name = class.super_name.clone();
        self.interfaces = class.interfaces.clone().unwrap_or_default();

        for annotation in &class.annotations {
            if self.rules.contains_key(&annotation.desc) {
                self.strip_entire_class = true;
            }
        }

        for type_annotation in &class.type_annotations {
            if !self.rules.contains_key(&type_annotation.desc) {
                continue;
            }
            match type_annotation.target {
                TypeUseTarget::Superclass => {
                    return Err(StripError::SuperclassStrip {
                        class: class.name.clone(),
                        super_name: self
                            .super_name
                            .clone()
                            .unwrap_or_else(|| Rc::from("java/lang/Object")),
                    });
                }
                TypeUseTarget::Interface(index) => {
                    let interface = self.interfaces.get(index).ok_or(
                        StripError::InterfaceIndexOutOfBounds {
                            index,
                            count: self.interfaces.len(),
                        },
                    )?;
                    self.strip_interfaces.insert(interface.clone());
                }
                TypeUseTarget::Other => {}
            }
        }

        for field in &class.fields {
            for annotation in &field.annotations {
                if self.rules.contains_key(&annotation.desc) {
                    self.strip_fields.insert(field.member());
                }
            }
        }

        for method in &class.methods {
            for annotation in &method.annotations {
                let Some(rule) = self.rules.get(&annotation.desc) else {
                    continue;
                };
                let member = method.member();
                if strip_lambdas_for(rule, annotation) {
                    self.pending_lambdas.insert(member.clone(), rule.clone());
                }
                self.strip_methods.insert(member);
            }
        }

        self.state = SessionState::Discovered;
        Ok(())
    }

    /// True when method-level rules requested lambda stripping and the
    /// implementation methods have not been resolved yet.
    pub fn needs_lambda_resolution(&self) -> Result<bool, StripError> {
        if self.state == SessionState::Fresh {
            return Err(StripError::SessionNotDiscovered {
                op: "needs_lambda_resolution",
            });
        }
        Ok(!self.pending_lambdas.is_empty())
    }

    /// Lambda resolution pass: one walk over every method body, resolving
    /// pending lambda checks into additional methods to strip.
    ///
    /// Each invocation resolves one level of lambda nesting. Newly stripped
    /// implementation methods re-enter the pending set so that a further
    /// invocation picks up lambdas nested inside them; callers iterate:
    ///
    /// ```ignore
    /// while session.needs_lambda_resolution()? {
    ///     session.resolve_lambdas(&class)?;
    /// }
    /// ```
    pub fn resolve_lambdas(&mut self, class: &ClassNode) -> Result<(), StripError> {
        if self.state == SessionState::Fresh {
            return Err(StripError::SessionNotDiscovered {
                op: "resolve_lambdas",
            });
        }

        let mut to_strip: BTreeMap<Member, Rule> = BTreeMap::new();
        let mut keep: BTreeSet<Member> = BTreeSet::new();

        for method in &class.methods {
            // Walking a method consumes its pending check; call sites in a
            // pending method feed the strip candidates, call sites in any
            // retained method feed the keep set.
            let origin = self.pending_lambdas.remove(&method.member());
            for insn in &method.instructions {
                let Some(handle) = insn.lambda_impl_handle() else {
                    continue;
                };
                if *handle.owner != *class.name {
                    continue;
                }
                let target = Member::new(&handle.name, &handle.desc);
                match &origin {
                    Some(rule) => {
                        to_strip.insert(target, rule.clone());
                    }
                    None => {
                        keep.insert(target);
                    }
                }
            }
        }

        // An implementation method still reachable from a retained call site
        // must survive, even when a stripped method also targets it.
        for member in &keep {
            to_strip.remove(member);
        }

        for (member, rule) in to_strip {
            self.strip_methods.insert(member.clone());
            self.pending_lambdas.insert(member, rule);
        }
        Ok(())
    }

    /// Assemble the immutable strip plan.
    ///
    /// Valid only once every pending lambda check has been resolved; the
    /// session stays borrowable for diagnostics afterwards.
    pub fn finalize_plan(&self) -> Result<StripPlan, StripError> {
        if self.state == SessionState::Fresh {
            return Err(StripError::SessionNotDiscovered {
                op: "finalize_plan",
            });
        }
        if !self.pending_lambdas.is_empty() {
            return Err(StripError::UnresolvedLambdas {
                count: self.pending_lambdas.len(),
            });
        }
        Ok(StripPlan::new(
            self.strip_entire_class,
            self.strip_fields.clone(),
            self.strip_methods.clone(),
            self.strip_interfaces.clone(),
            self.rules.keys().cloned().collect(),
        ))
    }
}

/// An explicit boolean on the annotation usage wins over the rule default.
fn strip_lambdas_for(rule: &Rule, annotation: &Annotation) -> bool {
    if let Some(key) = rule.lambda_override_key() {
        if let Some(value) = annotation.value(key).and_then(|v| v.as_bool()) {
            return value;
        }
    }
    rule.default_strip_lambdas()
}
