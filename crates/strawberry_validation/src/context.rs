//! State shared by validation rules.

use rustc_hash::FxHashMap;
use strawberry_core::{Diagnostic, DiagnosticBag, Interner, Span, Text};
use strawberry_syntax::{Document, FragmentDefinition};

/// Context handed to each [`ValidationRule`](crate::ValidationRule).
pub struct ValidationContext<'d, 'a> {
    document: &'d Document<'a>,
    interner: &'d Interner,
    fragments: FxHashMap<Text, &'d FragmentDefinition<'a>>,
    diagnostics: DiagnosticBag,
}

impl<'d, 'a> ValidationContext<'d, 'a> {
    /// Creates a context for `document`.
    pub fn new(document: &'d Document<'a>, interner: &'d Interner) -> Self {
        let fragments = document
            .fragments()
            .map(|fragment| (fragment.name.value, fragment))
            .collect();
        Self {
            document,
            interner,
            fragments,
            diagnostics: DiagnosticBag::new(),
        }
    }

    /// Returns the document being validated.
    #[must_use]
    pub fn document(&self) -> &'d Document<'a> {
        self.document
    }

    /// Returns the interner the document was parsed with.
    #[must_use]
    pub fn interner(&self) -> &'d Interner {
        self.interner
    }

    /// Looks up a fragment definition by name. With duplicate names the
    /// last definition wins.
    #[must_use]
    pub fn fragment(&self, name: Text) -> Option<&'d FragmentDefinition<'a>> {
        self.fragments.get(&name).copied()
    }

    /// Resolves an interned name to a string.
    #[must_use]
    pub fn name(&self, text: Text) -> String {
        self.interner.get(text)
    }

    /// Reports a diagnostic.
    pub fn report_error(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.add(diagnostic);
    }

    /// Reports an error with a single label.
    pub fn report(&mut self, code: &str, message: impl Into<String>, span: Span) {
        let message = message.into();
        self.diagnostics
            .add(Diagnostic::error(code, message.clone()).with_span(span, message));
    }

    /// Returns the diagnostics reported so far.
    #[must_use]
    pub fn diagnostics(&self) -> &DiagnosticBag {
        &self.diagnostics
    }

    /// Consumes the context, returning its diagnostics.
    #[must_use]
    pub fn into_diagnostics(self) -> DiagnosticBag {
        self.diagnostics
    }
}
