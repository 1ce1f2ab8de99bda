//! Query depth limiting.
//!
//! Measures how deeply each query and mutation nests its fields and
//! reports operations that go past a maximum. Depth counts non-leaf
//! fields: `{ user { pets { name } } }` has depth 2.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use rustc_hash::FxHashSet;
use strawberry_core::{diagnostics::codes, DiagnosticBag, Interner, Span, Text};
use strawberry_syntax::{
    Document, FieldSelection, FragmentDefinition, FragmentSpread, InlineFragment,
    OperationDefinition, Selection, SelectionSet,
};

use crate::{ValidationContext, ValidationRule};

/// Receives the depth of every operation, keyed by operation name.
pub type DepthCallback = Arc<dyn Fn(&IndexMap<String, usize>) + Send + Sync>;

/// Operations without a name are reported under this key.
pub const ANONYMOUS_OPERATION: &str = "anonymous";

/// Decides whether a field is skipped by the depth count.
///
/// An ignored field counts as depth 0 and its children are not visited.
#[derive(Clone)]
pub enum IgnoreRule {
    /// Exact field name.
    Name(String),
    /// Regular expression that must match at the start of the field name.
    Pattern(Regex),
    /// Arbitrary predicate over the field name.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl IgnoreRule {
    /// Creates a predicate rule.
    pub fn predicate(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    /// Returns true if the rule ignores `field_name`.
    #[must_use]
    pub fn matches(&self, field_name: &str) -> bool {
        match self {
            Self::Name(name) => name == field_name,
            Self::Pattern(pattern) => pattern.find(field_name).is_some_and(|m| m.start() == 0),
            Self::Predicate(predicate) => predicate(field_name),
        }
    }
}

impl fmt::Debug for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for IgnoreRule {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for IgnoreRule {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Regex> for IgnoreRule {
    fn from(pattern: Regex) -> Self {
        Self::Pattern(pattern)
    }
}

/// Creates a validator limiting operations to `max_depth` levels.
///
/// ```
/// use strawberry_validation::{depth_limit_validator, IgnoreRule};
///
/// let rule = depth_limit_validator(10)
///     .ignore("pageInfo")
///     .ignore(regex::Regex::new("^internal").unwrap())
///     .ignore(IgnoreRule::predicate(|name| name.ends_with("Debug")));
/// assert_eq!(rule.max_depth(), 10);
/// ```
#[must_use]
pub fn depth_limit_validator(max_depth: usize) -> DepthLimitValidator {
    DepthLimitValidator::new(max_depth)
}

/// Validation rule rejecting operations nested deeper than a maximum.
#[derive(Clone)]
pub struct DepthLimitValidator {
    max_depth: usize,
    ignore: Vec<IgnoreRule>,
    callback: Option<DepthCallback>,
}

impl fmt::Debug for DepthLimitValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DepthLimitValidator")
            .field("max_depth", &self.max_depth)
            .field("ignore", &self.ignore)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl DepthLimitValidator {
    /// Creates a validator with no ignore rules and no callback.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            ignore: Vec::new(),
            callback: None,
        }
    }

    /// Adds an ignore rule.
    #[must_use]
    pub fn ignore(mut self, rule: impl Into<IgnoreRule>) -> Self {
        self.ignore.push(rule.into());
        self
    }

    /// Sets the callback invoked with the depth of every operation each
    /// time the rule runs, even when the limit is exceeded.
    #[must_use]
    pub fn callback(mut self, f: impl Fn(&IndexMap<String, usize>) + Send + Sync + 'static) -> Self {
        self.callback = Some(Arc::new(f));
        self
    }

    /// Returns the configured maximum depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Computes the depth of every query and mutation in `document`.
    ///
    /// Operations are keyed by name, anonymous ones by `"anonymous"`; a
    /// later operation with the same key replaces an earlier one.
    pub fn measure(
        &self,
        document: &Document<'_>,
        interner: &Interner,
    ) -> (IndexMap<String, usize>, DiagnosticBag) {
        let fragments = get_fragments(document);
        let operations = get_queries_and_mutations(document, interner);

        let mut diagnostics = DiagnosticBag::new();
        let mut depths = IndexMap::with_capacity(operations.len());

        for (name, &operation) in &operations {
            let mut walker = DepthWalker {
                fragments: &fragments,
                interner,
                max_depth: self.max_depth,
                ignore: &self.ignore,
                operation_name: name,
                expanding: FxHashSet::default(),
                diagnostics: &mut diagnostics,
            };
            let depth = walker.determine_depth(Node::Operation(operation), 0);
            tracing::debug!(operation = %name, depth, max_depth = self.max_depth, "measured operation depth");
            depths.insert(name.clone(), depth);
        }

        (depths, diagnostics)
    }
}

impl ValidationRule for DepthLimitValidator {
    fn name(&self) -> &'static str {
        "DepthLimit"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_, '_>) {
        let (depths, diagnostics) = self.measure(ctx.document(), ctx.interner());
        for diagnostic in diagnostics {
            ctx.report_error(diagnostic);
        }
        if let Some(callback) = &self.callback {
            callback(&depths);
        }
    }
}

/// Collects fragment definitions by name; the last of duplicates wins.
pub fn get_fragments<'d, 'a>(
    document: &'d Document<'a>,
) -> IndexMap<Text, &'d FragmentDefinition<'a>> {
    document
        .fragments()
        .map(|fragment| (fragment.name.value, fragment))
        .collect()
}

/// Collects operations by name. Subscriptions are included as well; they
/// are measured the same way.
pub fn get_queries_and_mutations<'d, 'a>(
    document: &'d Document<'a>,
    interner: &Interner,
) -> IndexMap<String, &'d OperationDefinition<'a>> {
    document
        .operations()
        .map(|operation| {
            let name = operation
                .name
                .map_or_else(|| ANONYMOUS_OPERATION.to_string(), |name| interner.get(name.value));
            (name, operation)
        })
        .collect()
}

#[derive(Clone, Copy)]
enum Node<'n, 'a> {
    Field(&'n FieldSelection<'a>),
    Spread(&'n FragmentSpread<'a>),
    Inline(&'n InlineFragment<'a>),
    Fragment(&'n FragmentDefinition<'a>),
    Operation(&'n OperationDefinition<'a>),
}

impl Node<'_, '_> {
    fn span(self) -> Span {
        match self {
            Self::Field(field) => field.span,
            Self::Spread(spread) => spread.span,
            Self::Inline(fragment) => fragment.span,
            Self::Fragment(fragment) => fragment.span,
            Self::Operation(operation) => operation.span,
        }
    }
}

impl<'n, 'a> From<&'n Selection<'a>> for Node<'n, 'a> {
    fn from(selection: &'n Selection<'a>) -> Self {
        match selection {
            Selection::Field(field) => Self::Field(field),
            Selection::FragmentSpread(spread) => Self::Spread(spread),
            Selection::InlineFragment(fragment) => Self::Inline(fragment),
        }
    }
}

struct DepthWalker<'w, 'd, 'a> {
    fragments: &'w IndexMap<Text, &'d FragmentDefinition<'a>>,
    interner: &'w Interner,
    max_depth: usize,
    ignore: &'w [IgnoreRule],
    operation_name: &'w str,
    /// Fragments being expanded, with the depth they were entered at.
    expanding: FxHashSet<(Text, usize)>,
    diagnostics: &'w mut DiagnosticBag,
}

impl<'d, 'a> DepthWalker<'_, 'd, 'a> {
    fn determine_depth(&mut self, node: Node<'d, 'a>, depth_so_far: usize) -> usize {
        if depth_so_far > self.max_depth {
            let message = format!(
                "'{}' exceeds maximum operation depth of {}",
                self.operation_name, self.max_depth
            );
            self.diagnostics.error(
                codes::EXCEEDS_MAX_DEPTH,
                message,
                node.span(),
                format!("nested {depth_so_far} levels deep"),
            );
            return depth_so_far;
        }

        match node {
            Node::Field(field) => {
                let name = self.interner.get(field.name.value);
                let Some(selection_set) = &field.selection_set else {
                    return 0;
                };
                if name.starts_with("__") || self.is_ignored(&name) {
                    return 0;
                }
                1 + self.max_over(selection_set, depth_so_far + 1)
            }
            Node::Spread(spread) => {
                let Some(fragment) = self.fragments.get(&spread.name.value).copied() else {
                    return 0;
                };
                // Re-entering a fragment at the same depth means a cycle with
                // no field in between; it adds nothing.
                let key = (spread.name.value, depth_so_far);
                if !self.expanding.insert(key) {
                    return 0;
                }
                let depth = self.determine_depth(Node::Fragment(fragment), depth_so_far);
                self.expanding.remove(&key);
                depth
            }
            Node::Inline(fragment) => self.max_over(&fragment.selection_set, depth_so_far),
            Node::Fragment(fragment) => self.max_over(&fragment.selection_set, depth_so_far),
            Node::Operation(operation) => self.max_over(&operation.selection_set, depth_so_far),
        }
    }

    fn max_over(&mut self, selection_set: &'d SelectionSet<'a>, depth_so_far: usize) -> usize {
        selection_set
            .selections
            .iter()
            .map(|selection| self.determine_depth(selection.into(), depth_so_far))
            .max()
            .unwrap_or(0)
    }

    fn is_ignored(&self, field_name: &str) -> bool {
        self.ignore.iter().any(|rule| rule.matches(field_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strawberry_syntax::parse;

    fn depths(source: &str, validator: &DepthLimitValidator) -> (IndexMap<String, usize>, DiagnosticBag) {
        let interner = Interner::new();
        let result = parse(source, &interner);
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        validator.measure(&result.document, &interner)
    }

    #[test]
    fn test_leaf_fields_count_zero() {
        let (depths, diagnostics) = depths("{ version }", &depth_limit_validator(0));
        assert_eq!(depths["anonymous"], 0);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_nested_fields() {
        let source = "query Deep { user { pets { owner { name } } } }";
        let (depths, diagnostics) = depths(source, &depth_limit_validator(10));
        assert_eq!(depths["Deep"], 3);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_exceeding_reports_at_offending_node() {
        let source = "query Deep { user { pets { owner { name } } } }";
        let (depths, diagnostics) = depths(source, &depth_limit_validator(1));

        let errors: Vec<_> = diagnostics.iter().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].title, "'Deep' exceeds maximum operation depth of 1");
        assert_eq!(errors[0].code, codes::EXCEEDS_MAX_DEPTH);
        // `owner` is visited at depth 2 and reports it; the parents add 1 each.
        assert_eq!(depths["Deep"], 4);
        let span = errors[0].primary_span().unwrap();
        assert_eq!(span.slice(source).map(|s| s.starts_with("owner")), Some(true));
    }

    #[test]
    fn test_fragments_and_inline_fragments_do_not_add_depth() {
        let source = r"
            query Q { user { ...UserFields ... on User { friends { id } } } }
            fragment UserFields on User { pets { owner { id } } }
        ";
        let (depths, _) = depths(source, &depth_limit_validator(10));
        assert_eq!(depths["Q"], 3);
    }

    #[test]
    fn test_introspection_and_ignored_fields() {
        let source = r"
            query Q {
                __schema { types { fields { name } } }
                pageInfo { cursor { value { raw } } }
                internalStats { rows { cells { value } } }
                debugTree { a { b { c } } }
                user { id }
            }
        ";
        let validator = depth_limit_validator(1)
            .ignore("pageInfo")
            .ignore(Regex::new("internal").unwrap())
            .ignore(IgnoreRule::predicate(|name| name.starts_with("debug")));
        let (depths, diagnostics) = depths(source, &validator);
        assert!(diagnostics.is_empty());
        assert_eq!(depths["Q"], 1);
    }

    #[test]
    fn test_pattern_must_match_at_start() {
        let rule = IgnoreRule::from(Regex::new("Stats").unwrap());
        assert!(rule.matches("Stats"));
        assert!(rule.matches("StatsByDay"));
        assert!(!rule.matches("internalStats"));
    }

    #[test]
    fn test_operation_keys() {
        let source = r"
            { a { b } }
            query Named { a { b { c } } }
            mutation Named { a }
        ";
        let (depths, _) = depths(source, &depth_limit_validator(10));
        assert_eq!(depths.len(), 2);
        assert_eq!(depths["anonymous"], 1);
        // The mutation replaced the query of the same name.
        assert_eq!(depths["Named"], 0);
    }

    #[test]
    fn test_unknown_and_cyclic_fragments_count_zero() {
        let source = r"
            query Q { user { ...Missing ...A } }
            fragment A on User { ...B }
            fragment B on User { ...A }
        ";
        let (depths, diagnostics) = depths(source, &depth_limit_validator(5));
        assert_eq!(depths["Q"], 1);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_self_nesting_fragment_stops_at_limit() {
        let source = r"
            query Q { user { ...Friends } }
            fragment Friends on User { friends { ...Friends } }
        ";
        let (_, diagnostics) = depths(source, &depth_limit_validator(3));
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn test_callback_receives_depths() {
        use std::sync::Mutex;

        let seen = Arc::new(Mutex::new(IndexMap::new()));
        let sink = Arc::clone(&seen);
        let validator = depth_limit_validator(1).callback(move |depths| {
            *sink.lock().unwrap() = depths.clone();
        });

        let interner = Interner::new();
        let result = parse("query A { a { b { c } } } query B { x }", &interner);
        let diagnostics = crate::validate(
            &result.document,
            &interner,
            &[Arc::new(validator) as Arc<dyn ValidationRule>],
        );

        assert_eq!(diagnostics.error_count(), 1);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.get("A"), Some(&4));
        assert_eq!(seen.get("B"), Some(&0));
    }
}
