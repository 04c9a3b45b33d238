//! Rule catalog: register, then freeze
//!
//! The catalog is built once and is immutable afterwards. Registration order
//! is evaluation order, which makes `evaluate` deterministic.

use crate::config::Thresholds;
use crate::document::PageDocument;
use crate::rules::{
    accessibility, aeo, content, headings, meta, performance, security, social, trust, Capability,
    Finding, Rule, RuleError,
};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Collects rules before the catalog is frozen
#[derive(Debug, Default)]
pub struct RuleCatalogBuilder {
    rules: Vec<Rule>,
    ids: HashSet<&'static str>,
}

impl RuleCatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule at the end of the evaluation order
    pub fn register(&mut self, rule: Rule) -> Result<&mut Self, RuleError> {
        if !self.ids.insert(rule.id) {
            return Err(RuleError::DuplicateId(rule.id.to_string()));
        }
        self.rules.push(rule);
        Ok(self)
    }

    /// Adds a family of rules, skipping ids that are already taken
    pub fn register_all(&mut self, rules: &[Rule]) -> &mut Self {
        for rule in rules {
            if let Err(e) = self.register(*rule) {
                tracing::warn!("Skipping rule registration: {}", e);
            }
        }
        self
    }

    pub fn freeze(self) -> RuleCatalog {
        RuleCatalog { rules: self.rules }
    }
}

/// Immutable, ordered set of rules
#[derive(Debug)]
pub struct RuleCatalog {
    rules: Vec<Rule>,
}

impl RuleCatalog {
    pub fn builder() -> RuleCatalogBuilder {
        RuleCatalogBuilder::new()
    }

    /// Catalog holding every built-in rule
    pub fn builtin() -> Self {
        let mut builder = Self::builder();
        builder
            .register_all(meta::RULES)
            .register_all(headings::RULES)
            .register_all(accessibility::RULES)
            .register_all(social::RULES)
            .register_all(performance::RULES)
            .register_all(security::RULES)
            .register_all(content::RULES)
            .register_all(trust::RULES)
            .register_all(aeo::RULES);
        builder.freeze()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Rules that read the given part of the document
    pub fn rules_reading(&self, capability: Capability) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |rule| rule.reads(capability))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs every rule in registration order
    ///
    /// A rule that returns an error or panics is replaced by a single
    /// `RULE_EVALUATION_ERROR` finding; the remaining rules still run.
    pub fn evaluate(&self, doc: &PageDocument, thresholds: &Thresholds) -> Vec<Finding> {
        let mut findings = Vec::new();

        for rule in &self.rules {
            let outcome = catch_unwind(AssertUnwindSafe(|| rule.run(doc, thresholds)))
                .unwrap_or_else(|panic| {
                    Err(RuleError::Panicked {
                        rule_id: rule.id.to_string(),
                        reason: panic_message(panic.as_ref()),
                    })
                });

            match outcome {
                Ok(mut hits) => {
                    if !hits.is_empty() {
                        tracing::trace!("{} fired {} time(s) on {}", rule.id, hits.len(), doc.url);
                    }
                    findings.append(&mut hits);
                }
                Err(e) => {
                    tracing::warn!("Rule evaluation failed on {}: {}", doc.url, e);
                    findings.push(Finding::rule_error(&e));
                }
            }
        }

        findings
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

static DEFAULT_CATALOG: Lazy<RuleCatalog> = Lazy::new(RuleCatalog::builtin);

/// The process-wide built-in catalog
pub fn default_catalog() -> &'static RuleCatalog {
    &DEFAULT_CATALOG
}

/// Evaluates a document against the built-in catalog
pub fn evaluate(doc: &PageDocument, thresholds: &Thresholds) -> Vec<Finding> {
    default_catalog().evaluate(doc, thresholds)
}
