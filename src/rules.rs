// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::session::Session;
use crate::tree::AnnotationType;
use crate::Rc;

use std::collections::BTreeMap;

/// One marker annotation's stripping semantics: the environment that
/// exclusively owns members carrying the marker, an optional annotation
/// element letting a single usage override lambda stripping, and the policy
/// applied when no override is supplied.
#[derive(Debug, Clone)]
pub struct Rule {
    environment: Rc<str>,
    marker: AnnotationType,
    lambda_override_key: Option<Rc<str>>,
    default_strip_lambdas: bool,
}

impl Rule {
    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn marker(&self) -> &AnnotationType {
        &self.marker
    }

    pub(crate) fn lambda_override_key(&self) -> Option<&str> {
        self.lambda_override_key.as_deref()
    }

    pub(crate) fn default_strip_lambdas(&self) -> bool {
        self.default_strip_lambdas
    }
}

/// Accumulates stripping rules and stamps out single-use sessions.
///
/// Once configured, the builder is immutable and may be shared across
/// threads; every [`compile`](Self::compile) call produces an independent
/// session, so many classes can be stripped in parallel.
#[derive(Debug, Clone)]
pub struct StripperBuilder {
    rules: Vec<Rule>,
    default_strip_lambdas: bool,
}

impl Default for StripperBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StripperBuilder {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            default_strip_lambdas: true,
        }
    }

    /// Register a marker annotation whose members belong exclusively to
    /// `environment`.
    pub fn rule(mut self, environment: &str, marker: AnnotationType) -> Self {
        self.push_rule(environment, marker, None);
        self
    }

    /// Like [`rule`](Self::rule), but a boolean annotation element named
    /// `key` on an individual usage overrides the lambda-stripping default.
    pub fn rule_with_override(
        mut self,
        environment: &str,
        marker: AnnotationType,
        key: &str,
    ) -> Self {
        self.push_rule(environment, marker, Some(key));
        self
    }

    /// Lambda-stripping policy captured by rules added after this call.
    pub fn default_strip_lambdas(mut self, value: bool) -> Self {
        self.default_strip_lambdas = value;
        self
    }

    fn push_rule(&mut self, environment: &str, marker: AnnotationType, key: Option<&str>) {
        self.rules.push(Rule {
            environment: Rc::from(environment),
            marker,
            lambda_override_key: key.map(Rc::from),
            default_strip_lambdas: self.default_strip_lambdas,
        });
    }

    /// Compile the active rule map for one target environment and return a
    /// fresh single-use session.
    ///
    /// Rules owned by `environment` are excluded: a marker declares code
    /// exclusive to its environment, so building for that environment keeps
    /// the code and every other build strips it.
    pub fn compile(&self, environment: &str) -> Session {
        let active: BTreeMap<AnnotationType, Rule> = self
            .rules
            .iter()
            .filter(|rule| &*rule.environment != environment)
            .map(|rule| (rule.marker.clone(), rule.clone()))
            .collect();
        Session::new(active)
    }
}
