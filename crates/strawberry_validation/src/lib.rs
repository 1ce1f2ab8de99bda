//! Validation for GraphQL executable documents.
//!
//! Rules implement [`ValidationRule`] and report diagnostics through a
//! [`ValidationContext`]. The schema runs its configured rules on every
//! request before execution.

pub mod context;
pub mod depth_limit;
pub mod rules;

use std::sync::Arc;

pub use context::ValidationContext;
pub use depth_limit::{depth_limit_validator, DepthCallback, DepthLimitValidator, IgnoreRule};
pub use rules::default_rules;

use strawberry_core::{DiagnosticBag, Interner};
use strawberry_syntax::Document;

/// A validation rule run against a parsed document.
pub trait ValidationRule: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Checks the document, reporting problems on the context.
    fn validate(&self, ctx: &mut ValidationContext<'_, '_>);
}

/// Runs `rules` in order over `document`.
pub fn validate(
    document: &Document<'_>,
    interner: &Interner,
    rules: &[Arc<dyn ValidationRule>],
) -> DiagnosticBag {
    let mut ctx = ValidationContext::new(document, interner);
    for rule in rules {
        let _span = tracing::trace_span!("validation_rule", rule = rule.name()).entered();
        rule.validate(&mut ctx);
    }
    ctx.into_diagnostics()
}
