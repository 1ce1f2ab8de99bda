//! Document-level rules that need no schema.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use strawberry_core::{diagnostics::codes, Span, Text};
use strawberry_syntax::{Definition, Directive, Name, Selection, SelectionSet, Value};

use crate::{ValidationContext, ValidationRule};

/// Returns the rules every schema runs before its own.
#[must_use]
pub fn default_rules() -> Vec<Arc<dyn ValidationRule>> {
    vec![
        Arc::new(ExecutableDefinitions),
        Arc::new(UniqueOperationNames),
        Arc::new(LoneAnonymousOperation),
        Arc::new(KnownFragmentNames),
        Arc::new(NoFragmentCycles),
        Arc::new(NoUndefinedVariables),
    ]
}

/// Calls `f` with every fragment spread under `selection_set`.
fn for_each_spread(selection_set: &SelectionSet<'_>, f: &mut impl FnMut(Text, Span)) {
    for selection in &selection_set.selections {
        match selection {
            Selection::Field(field) => {
                if let Some(selection_set) = &field.selection_set {
                    for_each_spread(selection_set, f);
                }
            }
            Selection::FragmentSpread(spread) => f(spread.name.value, spread.name.span),
            Selection::InlineFragment(fragment) => for_each_spread(&fragment.selection_set, f),
        }
    }
}

/// Executable documents contain only operations and fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutableDefinitions;

impl ValidationRule for ExecutableDefinitions {
    fn name(&self) -> &'static str {
        "ExecutableDefinitions"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_, '_>) {
        for definition in &ctx.document().definitions {
            let (label, span) = match definition {
                Definition::Operation(_) | Definition::Fragment(_) => continue,
                Definition::Schema(schema) => ("schema".to_string(), schema.span),
                Definition::Directive(directive) => (
                    format!("'{}'", ctx.name(directive.name.value)),
                    directive.span,
                ),
                Definition::Type(ty) => (format!("'{}'", ctx.name(ty.name().value)), ty.span()),
            };
            ctx.report(
                codes::NON_EXECUTABLE_DEFINITION,
                format!("The {label} definition is not executable."),
                span,
            );
        }
    }
}

/// Named operations have distinct names.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueOperationNames;

impl ValidationRule for UniqueOperationNames {
    fn name(&self) -> &'static str {
        "UniqueOperationNames"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_, '_>) {
        let mut seen = FxHashSet::default();
        for operation in ctx.document().operations() {
            let Some(name) = operation.name else {
                continue;
            };
            if !seen.insert(name.value) {
                let message = format!(
                    "There can be only one operation named '{}'.",
                    ctx.name(name.value)
                );
                ctx.report(codes::DUPLICATE_OPERATION, message, name.span);
            }
        }
    }
}

/// An anonymous operation must be the only operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoneAnonymousOperation;

impl ValidationRule for LoneAnonymousOperation {
    fn name(&self) -> &'static str {
        "LoneAnonymousOperation"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_, '_>) {
        let count = ctx.document().operations().count();
        if count < 2 {
            return;
        }
        for operation in ctx.document().operations() {
            if operation.name.is_none() {
                ctx.report(
                    codes::ANONYMOUS_OPERATION,
                    "This anonymous operation must be the only defined operation.",
                    operation.span,
                );
            }
        }
    }
}

/// Fragment spreads refer to defined fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownFragmentNames;

impl ValidationRule for KnownFragmentNames {
    fn name(&self) -> &'static str {
        "KnownFragmentNames"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_, '_>) {
        let mut unknown = Vec::new();
        for definition in &ctx.document().definitions {
            let selection_set = match definition {
                Definition::Operation(operation) => &operation.selection_set,
                Definition::Fragment(fragment) => &fragment.selection_set,
                _ => continue,
            };
            for_each_spread(selection_set, &mut |name, span| {
                if ctx.fragment(name).is_none() {
                    unknown.push((name, span));
                }
            });
        }
        for (name, span) in unknown {
            let message = format!("Unknown fragment '{}'.", ctx.name(name));
            ctx.report(codes::UNKNOWN_FRAGMENT, message, span);
        }
    }
}

/// Fragments do not spread themselves, directly or through others.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFragmentCycles;

impl ValidationRule for NoFragmentCycles {
    fn name(&self) -> &'static str {
        "NoFragmentCycles"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_, '_>) {
        let mut edges: FxHashMap<Text, Vec<(Text, Span)>> = FxHashMap::default();
        for fragment in ctx.document().fragments() {
            let mut spreads = Vec::new();
            for_each_spread(&fragment.selection_set, &mut |name, span| spreads.push((name, span)));
            edges.insert(fragment.name.value, spreads);
        }

        let mut reported = FxHashSet::default();
        let mut cycles = Vec::new();
        for fragment in ctx.document().fragments() {
            let start = fragment.name.value;
            let mut stack = vec![start];
            let mut visited = FxHashSet::default();
            while let Some(current) = stack.pop() {
                for &(next, span) in edges.get(&current).map(Vec::as_slice).unwrap_or_default() {
                    if next == start {
                        if reported.insert(start) {
                            cycles.push((start, span));
                        }
                    } else if visited.insert(next) {
                        stack.push(next);
                    }
                }
            }
        }

        for (name, span) in cycles {
            let message = format!("Cannot spread fragment '{}' within itself.", ctx.name(name));
            ctx.report(codes::RECURSIVE_FRAGMENT, message, span);
        }
    }
}

/// Variables used in an operation are declared by it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUndefinedVariables;

impl NoUndefinedVariables {
    fn value_uses(value: &Value<'_>, used: &mut Vec<Name>) {
        match value {
            Value::Variable(name) => used.push(*name),
            Value::List(items, _) => {
                for item in items {
                    Self::value_uses(item, used);
                }
            }
            Value::Object(fields, _) => {
                for (_, value) in fields {
                    Self::value_uses(value, used);
                }
            }
            _ => {}
        }
    }

    fn directive_uses(directives: &[Directive<'_>], used: &mut Vec<Name>) {
        for directive in directives {
            for argument in &directive.arguments {
                Self::value_uses(&argument.value, used);
            }
        }
    }

    /// Collects uses under `selection_set`, following each spread once.
    fn selection_uses(
        ctx: &ValidationContext<'_, '_>,
        selection_set: &SelectionSet<'_>,
        visited: &mut FxHashSet<Text>,
        used: &mut Vec<Name>,
    ) {
        for selection in &selection_set.selections {
            Self::directive_uses(selection.directives(), used);
            match selection {
                Selection::Field(field) => {
                    for argument in &field.arguments {
                        Self::value_uses(&argument.value, used);
                    }
                    if let Some(selection_set) = &field.selection_set {
                        Self::selection_uses(ctx, selection_set, visited, used);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    if !visited.insert(spread.name.value) {
                        continue;
                    }
                    if let Some(fragment) = ctx.fragment(spread.name.value) {
                        Self::directive_uses(&fragment.directives, used);
                        Self::selection_uses(ctx, &fragment.selection_set, visited, used);
                    }
                }
                Selection::InlineFragment(fragment) => {
                    Self::selection_uses(ctx, &fragment.selection_set, visited, used);
                }
            }
        }
    }
}

impl ValidationRule for NoUndefinedVariables {
    fn name(&self) -> &'static str {
        "NoUndefinedVariables"
    }

    fn validate(&self, ctx: &mut ValidationContext<'_, '_>) {
        let mut undefined = Vec::new();
        for operation in ctx.document().operations() {
            let defined: FxHashSet<Text> = operation
                .variables
                .iter()
                .map(|variable| variable.name.value)
                .collect();
            let mut used = Vec::new();
            Self::directive_uses(&operation.directives, &mut used);
            let mut visited = FxHashSet::default();
            Self::selection_uses(ctx, &operation.selection_set, &mut visited, &mut used);
            undefined.extend(
                used.into_iter()
                    .filter(|variable| !defined.contains(&variable.value))
                    .map(|variable| (variable, operation.name)),
            );
        }

        for (variable, operation) in undefined {
            let message = match operation {
                Some(operation) => format!(
                    "Variable '${}' is not defined by operation '{}'.",
                    ctx.name(variable.value),
                    ctx.name(operation.value)
                ),
                None => format!("Variable '${}' is not defined.", ctx.name(variable.value)),
            };
            ctx.report(codes::UNDEFINED_VARIABLE, message, variable.span);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strawberry_core::Interner;
    use strawberry_syntax::parse;

    fn run(source: &str) -> Vec<(String, String)> {
        let interner = Interner::new();
        let result = parse(source, &interner);
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        crate::validate(&result.document, &interner, &default_rules())
            .into_iter()
            .map(|d| (d.code, d.title))
            .collect()
    }

    #[test]
    fn test_valid_document() {
        let source = r"
            query A { user { ...F } }
            query B { user { id } }
            fragment F on User { id }
        ";
        assert!(run(source).is_empty());
    }

    #[test]
    fn test_type_definitions_are_not_executable() {
        let errors = run("type Query { a: Int } { a }");
        assert_eq!(
            errors,
            vec![(
                codes::NON_EXECUTABLE_DEFINITION.to_string(),
                "The 'Query' definition is not executable.".to_string()
            )]
        );
    }

    #[test]
    fn test_duplicate_operation_names() {
        let errors = run("query A { a } query A { b }");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, codes::DUPLICATE_OPERATION);
    }

    #[test]
    fn test_lone_anonymous_operation() {
        let errors = run("{ a } query B { b }");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, codes::ANONYMOUS_OPERATION);
    }

    #[test]
    fn test_unknown_fragment() {
        let errors = run("{ user { ...Missing } }");
        assert_eq!(
            errors,
            vec![(
                codes::UNKNOWN_FRAGMENT.to_string(),
                "Unknown fragment 'Missing'.".to_string()
            )]
        );
    }

    #[test]
    fn test_undefined_variables() {
        let source = r"
            query Find($id: ID) { user(id: $id) { ...F } }
            query Lost { user(id: $id, filter: { tags: [$tag] }) @include(if: $show) { id } }
            fragment F on User { friends(first: $first) { id } }
        ";
        assert_eq!(
            run(source),
            vec![
                (
                    codes::UNDEFINED_VARIABLE.to_string(),
                    "Variable '$first' is not defined by operation 'Find'.".to_string()
                ),
                (
                    codes::UNDEFINED_VARIABLE.to_string(),
                    "Variable '$show' is not defined by operation 'Lost'.".to_string()
                ),
                (
                    codes::UNDEFINED_VARIABLE.to_string(),
                    "Variable '$id' is not defined by operation 'Lost'.".to_string()
                ),
                (
                    codes::UNDEFINED_VARIABLE.to_string(),
                    "Variable '$tag' is not defined by operation 'Lost'.".to_string()
                ),
            ]
        );

        let anonymous = run("{ user(id: $id) { id } }");
        assert_eq!(
            anonymous,
            vec![(
                codes::UNDEFINED_VARIABLE.to_string(),
                "Variable '$id' is not defined.".to_string()
            )]
        );
        assert!(run("query ($id: ID) { user(id: $id) { id } }").is_empty());
    }

    #[test]
    fn test_undefined_variables_in_recursive_fragments() {
        let source = r"
            query Q($a: Int) { ...A }
            fragment A on Query { f(a: $a) ...A }
        ";
        let errors: Vec<_> = run(source)
            .into_iter()
            .filter(|(code, _)| code == codes::UNDEFINED_VARIABLE)
            .collect();
        assert!(errors.is_empty());
    }

    #[test]
    fn test_fragment_cycles() {
        let source = r"
            { user { ...A } }
            fragment A on User { friends { ...B } }
            fragment B on User { ...A }
            fragment C on User { ...C }
        ";
        let mut cycles: Vec<_> = run(source)
            .into_iter()
            .filter(|(code, _)| code == codes::RECURSIVE_FRAGMENT)
            .map(|(_, title)| title)
            .collect();
        cycles.sort();
        assert_eq!(
            cycles,
            vec![
                "Cannot spread fragment 'A' within itself.",
                "Cannot spread fragment 'B' within itself.",
                "Cannot spread fragment 'C' within itself.",
            ]
        );
    }
}
