//! Recursive descent parser for GraphQL.

use std::borrow::Cow;

use crate::ast::*;
use crate::lexer::{block_string_value, unescape_string, Lexer};
use crate::token::{DirectiveLocation, Token, TokenKind};
use strawberry_core::{diagnostics::codes, DiagnosticBag, Interner, Span, Text};

/// Parser for GraphQL documents.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    /// End offset of the last consumed token.
    prev_end: u32,
    diagnostics: DiagnosticBag,
}

/// Result of parsing.
pub struct ParseResult<'a> {
    pub document: Document<'a>,
    pub diagnostics: DiagnosticBag,
}

impl ParseResult<'_> {
    /// Returns true if parsing reported any error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Parses a source string into a document.
///
/// Parsing never fails outright: syntax errors are reported in the
/// returned diagnostics and the parser recovers at the next token.
pub fn parse<'a>(source: &'a str, interner: &'a Interner) -> ParseResult<'a> {
    let mut parser = Parser::new(source, interner);
    let document = parser.parse_document();
    ParseResult {
        document,
        diagnostics: parser.diagnostics,
    }
}

impl<'a> Parser<'a> {
    /// Creates a new parser.
    pub fn new(source: &'a str, interner: &'a Interner) -> Self {
        let mut parser = Self {
            lexer: Lexer::new(source, interner),
            current: Token::new(TokenKind::Eof, Span::empty(0)),
            prev_end: 0,
            diagnostics: DiagnosticBag::new(),
        };
        parser.advance();
        parser.prev_end = 0;
        parser
    }

    #[inline]
    fn at(&self) -> TokenKind {
        self.current.kind
    }

    #[inline]
    fn at_kind(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    #[inline]
    fn at_eof(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    /// Advances to the next token, reporting lexical errors on the way.
    fn advance(&mut self) {
        self.prev_end = self.current.span.end;
        loop {
            self.current = self.lexer.next_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let text = self.lexer.span_text(self.current.span);
            let (code, title) = if text.starts_with('"') {
                (codes::UNTERMINATED_STRING, "unterminated string")
            } else if text.starts_with(|c: char| c == '-' || c.is_ascii_digit()) {
                (codes::INVALID_SYNTAX, "invalid number")
            } else {
                (codes::INVALID_SYNTAX, "unexpected character")
            };
            self.diagnostics
                .error(code, title, self.current.span, format!("found `{text}`"));
        }
    }

    /// Expects a specific token kind.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.at_kind(kind) {
            self.advance();
            true
        } else {
            self.error_expected(kind.as_str());
            false
        }
    }

    /// Consumes the token if it has the given kind.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at_kind(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current_text(&self) -> &'a str {
        self.lexer.span_text(self.current.span)
    }

    fn intern_current(&self) -> Text {
        self.lexer.intern_span(self.current.span)
    }

    #[inline]
    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.prev_end.max(start))
    }

    fn error(&mut self, message: &str) {
        let code = if self.at_eof() {
            codes::UNEXPECTED_EOF
        } else {
            codes::INVALID_SYNTAX
        };
        self.diagnostics
            .error(code, message, self.current.span, message.to_string());
    }

    fn error_expected(&mut self, expected: &str) {
        let found = self.describe_current();
        let code = if self.at_eof() {
            codes::UNEXPECTED_EOF
        } else {
            codes::UNEXPECTED_TOKEN
        };
        self.diagnostics.error(
            code,
            format!("expected {expected}, found {found}"),
            self.current.span,
            format!("expected {expected}"),
        );
    }

    fn describe_current(&self) -> String {
        match self.at() {
            TokenKind::Eof => "end of input".to_string(),
            kind if kind.is_name() => format!("name `{}`", self.current_text()),
            TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::StringLiteral
            | TokenKind::BlockStringLiteral => format!("`{}`", self.current_text()),
            kind => format!("`{kind}`"),
        }
    }

    /// Parses a document.
    pub fn parse_document(&mut self) -> Document<'a> {
        let start = self.current.span.start;
        let mut definitions = Vec::new();

        if self.at_eof() {
            self.error("expected definition, found end of input");
        }

        while !self.at_eof() {
            if let Some(def) = self.parse_definition() {
                definitions.push(def);
            } else {
                // Recovery: skip to next definition
                self.advance();
            }
        }

        Document {
            definitions,
            span: Span::new(start, self.current.span.end),
        }
    }

    fn parse_definition(&mut self) -> Option<Definition<'a>> {
        let description = self.try_parse_description();

        match self.at() {
            TokenKind::Schema => Some(Definition::Schema(
                self.parse_schema_definition(description),
            )),
            TokenKind::Scalar => Some(Definition::Type(TypeDefinition::Scalar(
                self.parse_scalar_type(description),
            ))),
            TokenKind::Type => Some(Definition::Type(TypeDefinition::Object(
                self.parse_object_type(description),
            ))),
            TokenKind::Interface => Some(Definition::Type(TypeDefinition::Interface(
                self.parse_interface_type(description),
            ))),
            TokenKind::Union => Some(Definition::Type(TypeDefinition::Union(
                self.parse_union_type(description),
            ))),
            TokenKind::Enum => Some(Definition::Type(TypeDefinition::Enum(
                self.parse_enum_type(description),
            ))),
            TokenKind::Input => Some(Definition::Type(TypeDefinition::InputObject(
                self.parse_input_object_type(description),
            ))),
            TokenKind::Directive => Some(Definition::Directive(
                self.parse_directive_definition(description),
            )),
            TokenKind::Query
            | TokenKind::Mutation
            | TokenKind::Subscription
            | TokenKind::LBrace => {
                if let Some(description) = description {
                    self.diagnostics.error(
                        codes::INVALID_SYNTAX,
                        "operations cannot have descriptions",
                        description.span,
                        "remove this description",
                    );
                }
                Some(Definition::Operation(self.parse_operation()))
            }
            TokenKind::Fragment => Some(Definition::Fragment(self.parse_fragment_definition())),
            TokenKind::Extend => {
                self.error("type system extensions are not supported");
                None
            }
            _ => {
                self.error_expected("definition");
                None
            }
        }
    }

    fn try_parse_description(&mut self) -> Option<Description<'a>> {
        let block = match self.at() {
            TokenKind::StringLiteral => false,
            TokenKind::BlockStringLiteral => true,
            _ => return None,
        };
        let span = self.current.span;
        let value = self.string_value();
        self.advance();
        Some(Description::new(value, block, span))
    }

    /// Decodes the current string or block string token.
    fn string_value(&mut self) -> Cow<'a, str> {
        let text = self.current_text();
        if self.at_kind(TokenKind::BlockStringLiteral) {
            return block_string_value(&text[3..text.len() - 3]);
        }
        let raw = &text[1..text.len() - 1];
        match unescape_string(raw) {
            Some(value) => value,
            None => {
                self.diagnostics.error(
                    codes::INVALID_SYNTAX,
                    "invalid escape sequence",
                    self.current.span,
                    "supported escapes are \\\" \\\\ \\/ \\b \\f \\n \\r \\t and \\uXXXX",
                );
                Cow::Borrowed(raw)
            }
        }
    }

    /// Parses a name. Keywords are valid names.
    fn parse_name(&mut self) -> Name {
        let span = self.current.span;
        if self.at().is_name() {
            let value = self.intern_current();
            self.advance();
            Name::new(value, span)
        } else {
            self.error_expected("name");
            let value = self.lexer.intern_span(Span::empty(span.start));
            if !self.at_eof() {
                self.advance();
            }
            Name::new(value, span)
        }
    }

    fn parse_schema_definition(
        &mut self,
        description: Option<Description<'a>>,
    ) -> SchemaDefinition<'a> {
        let start = description.as_ref().map_or(self.current.span.start, |d| d.span.start);
        self.advance(); // schema

        let directives = self.parse_directives(true);
        self.expect(TokenKind::LBrace);

        let mut operations = Vec::new();
        while !self.at_kind(TokenKind::RBrace) && !self.at_eof() {
            let op_start = self.current.span.start;
            let operation = match self.at() {
                TokenKind::Query => OperationType::Query,
                TokenKind::Mutation => OperationType::Mutation,
                TokenKind::Subscription => OperationType::Subscription,
                _ => {
                    self.error_expected("operation type");
                    self.advance();
                    continue;
                }
            };
            self.advance();
            self.expect(TokenKind::Colon);
            let type_name = self.parse_name();
            operations.push(OperationTypeDefinition {
                operation,
                type_name,
                span: self.span_from(op_start),
            });
        }
        self.expect(TokenKind::RBrace);

        SchemaDefinition {
            description,
            directives,
            operations,
            span: self.span_from(start),
        }
    }

    fn parse_scalar_type(
        &mut self,
        description: Option<Description<'a>>,
    ) -> ScalarTypeDefinition<'a> {
        let start = description.as_ref().map_or(self.current.span.start, |d| d.span.start);
        self.advance(); // scalar

        let name = self.parse_name();
        let directives = self.parse_directives(true);

        ScalarTypeDefinition {
            description,
            name,
            directives,
            span: self.span_from(start),
        }
    }

    fn parse_object_type(
        &mut self,
        description: Option<Description<'a>>,
    ) -> ObjectTypeDefinition<'a> {
        let start = description.as_ref().map_or(self.current.span.start, |d| d.span.start);
        self.advance(); // type

        let name = self.parse_name();
        let implements = self.parse_implements();
        let directives = self.parse_directives(true);
        let fields = self.parse_fields_definition();

        ObjectTypeDefinition {
            description,
            name,
            implements,
            directives,
            fields,
            span: self.span_from(start),
        }
    }

    fn parse_interface_type(
        &mut self,
        description: Option<Description<'a>>,
    ) -> InterfaceTypeDefinition<'a> {
        let start = description.as_ref().map_or(self.current.span.start, |d| d.span.start);
        self.advance(); // interface

        let name = self.parse_name();
        let implements = self.parse_implements();
        let directives = self.parse_directives(true);
        let fields = self.parse_fields_definition();

        InterfaceTypeDefinition {
            description,
            name,
            implements,
            directives,
            fields,
            span: self.span_from(start),
        }
    }

    fn parse_union_type(
        &mut self,
        description: Option<Description<'a>>,
    ) -> UnionTypeDefinition<'a> {
        let start = description.as_ref().map_or(self.current.span.start, |d| d.span.start);
        self.advance(); // union

        let name = self.parse_name();
        let directives = self.parse_directives(true);

        let mut members = Vec::new();
        if self.eat(TokenKind::Eq) {
            self.eat(TokenKind::Pipe);
            loop {
                members.push(self.parse_name());
                if !self.eat(TokenKind::Pipe) {
                    break;
                }
            }
        }

        UnionTypeDefinition {
            description,
            name,
            directives,
            members,
            span: self.span_from(start),
        }
    }

    fn parse_enum_type(&mut self, description: Option<Description<'a>>) -> EnumTypeDefinition<'a> {
        let start = description.as_ref().map_or(self.current.span.start, |d| d.span.start);
        self.advance(); // enum

        let name = self.parse_name();
        let directives = self.parse_directives(true);

        let mut values = Vec::new();
        if self.eat(TokenKind::LBrace) {
            while !self.at_kind(TokenKind::RBrace) && !self.at_eof() {
                let value_start = self.current.span.start;
                let description = self.try_parse_description();
                if matches!(
                    self.at(),
                    TokenKind::True | TokenKind::False | TokenKind::Null
                ) {
                    self.error("enum values cannot be named true, false or null");
                }
                let name = self.parse_name();
                let directives = self.parse_directives(true);
                values.push(EnumValueDefinition {
                    description,
                    name,
                    directives,
                    span: self.span_from(value_start),
                });
            }
            self.expect(TokenKind::RBrace);
        }

        EnumTypeDefinition {
            description,
            name,
            directives,
            values,
            span: self.span_from(start),
        }
    }

    fn parse_input_object_type(
        &mut self,
        description: Option<Description<'a>>,
    ) -> InputObjectTypeDefinition<'a> {
        let start = description.as_ref().map_or(self.current.span.start, |d| d.span.start);
        self.advance(); // input

        let name = self.parse_name();
        let directives = self.parse_directives(true);

        let fields = if self.eat(TokenKind::LBrace) {
            let fields = self.parse_input_value_definitions(TokenKind::RBrace);
            self.expect(TokenKind::RBrace);
            fields
        } else {
            Vec::new()
        };

        InputObjectTypeDefinition {
            description,
            name,
            directives,
            fields,
            span: self.span_from(start),
        }
    }

    fn parse_directive_definition(
        &mut self,
        description: Option<Description<'a>>,
    ) -> DirectiveDefinition<'a> {
        let start = description.as_ref().map_or(self.current.span.start, |d| d.span.start);
        self.advance(); // directive
        self.expect(TokenKind::At);

        let name = self.parse_name();
        let arguments = self.parse_arguments_definition();
        let repeatable = self.eat(TokenKind::Repeatable);
        self.expect(TokenKind::On);

        let mut locations = Vec::new();
        self.eat(TokenKind::Pipe);
        loop {
            let span = self.current.span;
            let text = self.current_text();
            let location = self.at().is_name().then(|| DirectiveLocation::parse(text)).flatten();
            match location {
                Some(location) => {
                    locations.push(location);
                    self.advance();
                }
                None => {
                    self.diagnostics.error(
                        codes::INVALID_SYNTAX,
                        format!("unknown directive location `{text}`"),
                        span,
                        "expected a location such as FIELD or OBJECT",
                    );
                    if !self.at_eof() {
                        self.advance();
                    }
                }
            }
            if !self.eat(TokenKind::Pipe) {
                break;
            }
        }

        DirectiveDefinition {
            description,
            name,
            arguments,
            repeatable,
            locations,
            span: self.span_from(start),
        }
    }

    fn parse_implements(&mut self) -> Vec<Name> {
        let mut interfaces = Vec::new();
        if self.eat(TokenKind::Implements) {
            self.eat(TokenKind::Amp);
            loop {
                interfaces.push(self.parse_name());
                if !self.eat(TokenKind::Amp) {
                    break;
                }
            }
        }
        interfaces
    }

    fn parse_fields_definition(&mut self) -> Vec<FieldDefinition<'a>> {
        let mut fields = Vec::new();
        if !self.eat(TokenKind::LBrace) {
            return fields;
        }
        while !self.at_kind(TokenKind::RBrace) && !self.at_eof() {
            let description = self.try_parse_description();
            fields.push(self.parse_field_definition(description));
        }
        self.expect(TokenKind::RBrace);
        fields
    }

    fn parse_field_definition(
        &mut self,
        description: Option<Description<'a>>,
    ) -> FieldDefinition<'a> {
        let start = description.as_ref().map_or(self.current.span.start, |d| d.span.start);
        let name = self.parse_name();
        let arguments = self.parse_arguments_definition();

        self.expect(TokenKind::Colon);
        let ty = self.parse_type();
        let directives = self.parse_directives(true);

        FieldDefinition {
            description,
            name,
            arguments,
            ty,
            directives,
            span: self.span_from(start),
        }
    }

    fn parse_arguments_definition(&mut self) -> Vec<InputValueDefinition<'a>> {
        if !self.eat(TokenKind::LParen) {
            return Vec::new();
        }
        let args = self.parse_input_value_definitions(TokenKind::RParen);
        self.expect(TokenKind::RParen);
        args
    }

    fn parse_input_value_definitions(&mut self, end: TokenKind) -> Vec<InputValueDefinition<'a>> {
        let mut values = Vec::new();
        while !self.at_kind(end) && !self.at_eof() {
            let description = self.try_parse_description();
            values.push(self.parse_input_value_definition(description));
        }
        values
    }

    fn parse_input_value_definition(
        &mut self,
        description: Option<Description<'a>>,
    ) -> InputValueDefinition<'a> {
        let start = description.as_ref().map_or(self.current.span.start, |d| d.span.start);
        let name = self.parse_name();
        self.expect(TokenKind::Colon);
        let ty = self.parse_type();

        let default_value = if self.eat(TokenKind::Eq) {
            Some(self.parse_value(true))
        } else {
            None
        };

        let directives = self.parse_directives(true);

        InputValueDefinition {
            description,
            name,
            ty,
            default_value,
            directives,
            span: self.span_from(start),
        }
    }

    /// Parses a type reference: `Name`, `[Type]`, or either followed by `!`.
    fn parse_type(&mut self) -> Type {
        let start = self.current.span.start;

        let ty = if self.eat(TokenKind::LBracket) {
            let inner = self.parse_type();
            self.expect(TokenKind::RBracket);
            Type::List(Box::new(inner), self.span_from(start))
        } else {
            Type::Named(self.parse_name())
        };

        if self.eat(TokenKind::Bang) {
            Type::NonNull(Box::new(ty), self.span_from(start))
        } else {
            ty
        }
    }

    fn parse_directives(&mut self, const_only: bool) -> Vec<Directive<'a>> {
        let mut directives = Vec::new();
        while self.at_kind(TokenKind::At) {
            directives.push(self.parse_directive(const_only));
        }
        directives
    }

    fn parse_directive(&mut self, const_only: bool) -> Directive<'a> {
        let start = self.current.span.start;
        self.advance(); // @

        let name = self.parse_name();
        let arguments = self.parse_arguments(const_only);

        Directive {
            name,
            arguments,
            span: self.span_from(start),
        }
    }

    fn parse_arguments(&mut self, const_only: bool) -> Vec<Argument<'a>> {
        let mut args = Vec::new();
        if !self.eat(TokenKind::LParen) {
            return args;
        }
        while !self.at_kind(TokenKind::RParen) && !self.at_eof() {
            let start = self.current.span.start;
            let name = self.parse_name();
            self.expect(TokenKind::Colon);
            let value = self.parse_value(const_only);
            args.push(Argument {
                name,
                value,
                span: self.span_from(start),
            });
        }
        self.expect(TokenKind::RParen);
        args
    }

    /// Parses a value. Variables are rejected when `const_only` is set.
    fn parse_value(&mut self, const_only: bool) -> Value<'a> {
        let start = self.current.span.start;

        match self.at() {
            TokenKind::Dollar => {
                if const_only {
                    self.error("variables are not allowed in constant values");
                }
                self.advance();
                let name = self.parse_name();
                Value::Variable(Name::new(name.value, self.span_from(start)))
            }
            TokenKind::IntLiteral => {
                let value = if let Ok(value) = self.current_text().parse() {
                    value
                } else {
                    self.error("integer literal is out of range");
                    0
                };
                self.advance();
                Value::Int(value, self.span_from(start))
            }
            TokenKind::FloatLiteral => {
                let value = self.current_text().parse().unwrap_or(0.0);
                self.advance();
                Value::Float(value, self.span_from(start))
            }
            TokenKind::StringLiteral | TokenKind::BlockStringLiteral => {
                let value = self.string_value();
                self.advance();
                Value::String(value, self.span_from(start))
            }
            TokenKind::True => {
                self.advance();
                Value::Boolean(true, self.span_from(start))
            }
            TokenKind::False => {
                self.advance();
                Value::Boolean(false, self.span_from(start))
            }
            TokenKind::Null => {
                self.advance();
                Value::Null(self.span_from(start))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut values = Vec::new();
                while !self.at_kind(TokenKind::RBracket) && !self.at_eof() {
                    values.push(self.parse_value(const_only));
                }
                self.expect(TokenKind::RBracket);
                Value::List(values, self.span_from(start))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut fields = Vec::new();
                while !self.at_kind(TokenKind::RBrace) && !self.at_eof() {
                    let name = self.parse_name();
                    self.expect(TokenKind::Colon);
                    let value = self.parse_value(const_only);
                    fields.push((name, value));
                }
                self.expect(TokenKind::RBrace);
                Value::Object(fields, self.span_from(start))
            }
            kind if kind.is_name() => Value::Enum(self.parse_name()),
            _ => {
                self.error_expected("value");
                if !self.at_eof() {
                    self.advance();
                }
                Value::Null(self.span_from(start))
            }
        }
    }

    fn parse_operation(&mut self) -> OperationDefinition<'a> {
        let start = self.current.span.start;

        if self.at_kind(TokenKind::LBrace) {
            let selection_set = self.parse_selection_set();
            return OperationDefinition {
                operation: OperationType::Query,
                name: None,
                variables: Vec::new(),
                directives: Vec::new(),
                selection_set,
                span: self.span_from(start),
            };
        }

        let operation = match self.at() {
            TokenKind::Mutation => OperationType::Mutation,
            TokenKind::Subscription => OperationType::Subscription,
            _ => OperationType::Query,
        };
        self.advance();

        let name = if self.at().is_name() {
            Some(self.parse_name())
        } else {
            None
        };

        let variables = self.parse_variable_definitions();
        let directives = self.parse_directives(false);
        let selection_set = self.parse_selection_set();

        OperationDefinition {
            operation,
            name,
            variables,
            directives,
            selection_set,
            span: self.span_from(start),
        }
    }

    fn parse_variable_definitions(&mut self) -> Vec<VariableDefinition<'a>> {
        let mut vars = Vec::new();
        if !self.eat(TokenKind::LParen) {
            return vars;
        }
        while !self.at_kind(TokenKind::RParen) && !self.at_eof() {
            let start = self.current.span.start;
            self.expect(TokenKind::Dollar);
            let name = self.parse_name();
            self.expect(TokenKind::Colon);
            let ty = self.parse_type();

            let default_value = if self.eat(TokenKind::Eq) {
                Some(self.parse_value(true))
            } else {
                None
            };
            let directives = self.parse_directives(true);

            vars.push(VariableDefinition {
                name,
                ty,
                default_value,
                directives,
                span: self.span_from(start),
            });
        }
        self.expect(TokenKind::RParen);
        vars
    }

    fn parse_fragment_definition(&mut self) -> FragmentDefinition<'a> {
        let start = self.current.span.start;
        self.advance(); // fragment

        if self.at_kind(TokenKind::On) {
            self.error("fragments cannot be named `on`");
        }
        let name = self.parse_name();
        self.expect(TokenKind::On);
        let type_condition = self.parse_name();
        let directives = self.parse_directives(false);
        let selection_set = self.parse_selection_set();

        FragmentDefinition {
            name,
            type_condition,
            directives,
            selection_set,
            span: self.span_from(start),
        }
    }

    fn parse_selection_set(&mut self) -> SelectionSet<'a> {
        let start = self.current.span.start;
        self.expect(TokenKind::LBrace);

        let mut selections = Vec::new();
        if self.at_kind(TokenKind::RBrace) {
            self.error_expected("selection");
        }
        while !self.at_kind(TokenKind::RBrace) && !self.at_eof() {
            selections.push(self.parse_selection());
        }
        self.expect(TokenKind::RBrace);

        SelectionSet {
            selections,
            span: self.span_from(start),
        }
    }

    fn parse_selection(&mut self) -> Selection<'a> {
        let start = self.current.span.start;
        if !self.eat(TokenKind::Spread) {
            return Selection::Field(self.parse_field_selection());
        }

        if self.eat(TokenKind::On) {
            let type_condition = Some(self.parse_name());
            let directives = self.parse_directives(false);
            let selection_set = self.parse_selection_set();
            Selection::InlineFragment(InlineFragment {
                type_condition,
                directives,
                selection_set,
                span: self.span_from(start),
            })
        } else if self.at_kind(TokenKind::LBrace) || self.at_kind(TokenKind::At) {
            let directives = self.parse_directives(false);
            let selection_set = self.parse_selection_set();
            Selection::InlineFragment(InlineFragment {
                type_condition: None,
                directives,
                selection_set,
                span: self.span_from(start),
            })
        } else {
            let name = self.parse_name();
            let directives = self.parse_directives(false);
            Selection::FragmentSpread(FragmentSpread {
                name,
                directives,
                span: self.span_from(start),
            })
        }
    }

    fn parse_field_selection(&mut self) -> FieldSelection<'a> {
        let start = self.current.span.start;

        let first_name = self.parse_name();
        let (alias, name) = if self.eat(TokenKind::Colon) {
            (Some(first_name), self.parse_name())
        } else {
            (None, first_name)
        };

        let arguments = self.parse_arguments(false);
        let directives = self.parse_directives(false);

        let selection_set = if self.at_kind(TokenKind::LBrace) {
            Some(self.parse_selection_set())
        } else {
            None
        };

        FieldSelection {
            alias,
            name,
            arguments,
            directives,
            selection_set,
            span: self.span_from(start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_operation<'r, 'a>(result: &'r ParseResult<'a>) -> &'r OperationDefinition<'a> {
        result.document.operations().next().unwrap()
    }

    #[test]
    fn test_parse_anonymous_query() {
        let interner = Interner::new();
        let result = parse("{ user(id: 4) { id name } }", &interner);
        assert!(!result.has_errors());

        let op = first_operation(&result);
        assert_eq!(op.operation, OperationType::Query);
        assert!(op.name.is_none());

        let Selection::Field(user) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        assert!(interner.is(user.name.value, "user"));
        assert_eq!(user.arguments.len(), 1);
        assert!(matches!(user.arguments[0].value, Value::Int(4, _)));
        assert_eq!(user.selection_set.as_ref().unwrap().selections.len(), 2);
    }

    #[test]
    fn test_parse_named_operation_with_variables() {
        let interner = Interner::new();
        let source = r#"
            query GetUser($id: ID!, $withPets: Boolean = false) @cached {
                me: user(id: $id) {
                    name
                    pets @include(if: $withPets) { name }
                }
            }
        "#;
        let result = parse(source, &interner);
        assert!(!result.has_errors());

        let op = first_operation(&result);
        assert!(interner.is(op.name.unwrap().value, "GetUser"));
        assert_eq!(op.variables.len(), 2);
        assert!(op.variables[0].ty.is_non_null());
        assert!(matches!(
            op.variables[1].default_value,
            Some(Value::Boolean(false, _))
        ));
        assert_eq!(op.directives.len(), 1);

        let Selection::Field(me) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        assert!(interner.is(me.response_key().value, "me"));
        assert!(interner.is(me.name.value, "user"));
        assert_eq!(me.span.slice(source).map(|s| s.starts_with("me: user")), Some(true));
    }

    #[test]
    fn test_parse_fragments() {
        let interner = Interner::new();
        let source = r"
            query { node { ...NodeFields ... on User { email } ... @skip(if: true) { id } } }
            fragment NodeFields on Node { id }
        ";
        let result = parse(source, &interner);
        assert!(!result.has_errors());

        let op = first_operation(&result);
        let Selection::Field(node) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        let selections = &node.selection_set.as_ref().unwrap().selections;
        assert!(matches!(selections[0], Selection::FragmentSpread(_)));
        assert!(matches!(
            &selections[1],
            Selection::InlineFragment(InlineFragment { type_condition: Some(_), .. })
        ));
        assert!(matches!(
            &selections[2],
            Selection::InlineFragment(InlineFragment { type_condition: None, .. })
        ));

        let fragment = result.document.fragments().next().unwrap();
        assert!(interner.is(fragment.type_condition.value, "Node"));
    }

    #[test]
    fn test_keywords_are_names() {
        let interner = Interner::new();
        let result = parse("{ type query fragment: on }", &interner);
        assert!(!result.has_errors());
        assert_eq!(first_operation(&result).selection_set.selections.len(), 3);
    }

    #[test]
    fn test_parse_sdl() {
        let interner = Interner::new();
        let source = r#"
            schema { query: Root }

            """
            Something with an id.
            """
            interface Node { id: ID! }

            "A user."
            type User implements Node & Named @key(fields: "id") {
                id: ID!
                name(upper: Boolean = false): String @deprecated(reason: "use fullName")
                friends: [User!]!
            }

            union SearchResult = | User | Post
            enum Role { ADMIN "regular" USER }
            input Filter { role: Role = USER, limit: Int }
            scalar Date
            directive @cached(ttl: Int) repeatable on FIELD | QUERY
        "#;
        let result = parse(source, &interner);
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        assert!(result.document.has_type_system_definitions());
        assert_eq!(result.document.definitions.len(), 8);

        let Definition::Type(TypeDefinition::Interface(node)) = &result.document.definitions[1]
        else {
            panic!("expected interface");
        };
        assert_eq!(
            node.description.as_ref().map(|d| &*d.value),
            Some("Something with an id.")
        );

        let Definition::Type(TypeDefinition::Object(user)) = &result.document.definitions[2] else {
            panic!("expected object");
        };
        assert_eq!(user.implements.len(), 2);
        assert_eq!(user.fields.len(), 3);
        assert_eq!(user.fields[1].arguments.len(), 1);
        assert!(interner.is(user.fields[2].ty.named().value, "User"));
        assert!(matches!(&user.fields[2].ty, Type::NonNull(inner, _) if matches!(**inner, Type::List(..))));

        let Definition::Type(TypeDefinition::Union(union)) = &result.document.definitions[3] else {
            panic!("expected union");
        };
        assert_eq!(union.members.len(), 2);

        let Definition::Type(TypeDefinition::Enum(role)) = &result.document.definitions[4] else {
            panic!("expected enum");
        };
        assert_eq!(role.values.len(), 2);
        assert!(role.values[1].description.is_some());

        let Definition::Directive(cached) = &result.document.definitions[7] else {
            panic!("expected directive");
        };
        assert!(cached.repeatable);
        assert_eq!(
            cached.locations,
            vec![DirectiveLocation::Field, DirectiveLocation::Query]
        );
    }

    #[test]
    fn test_string_values_are_unescaped() {
        let interner = Interner::new();
        let result = parse(r#"{ greet(msg: "line\nnext", raw: "plain") }"#, &interner);
        assert!(!result.has_errors());

        let Selection::Field(greet) = &first_operation(&result).selection_set.selections[0] else {
            panic!("expected field");
        };
        let Value::String(msg, _) = &greet.arguments[0].value else {
            panic!("expected string");
        };
        assert_eq!(msg, "line\nnext");
        assert!(matches!(&greet.arguments[1].value, Value::String(Cow::Borrowed("plain"), _)));
    }

    #[test]
    fn test_missing_brace_is_reported() {
        let interner = Interner::new();
        let result = parse("{ user { id }", &interner);
        assert!(result.has_errors());
        let diag = result.diagnostics.iter().next().unwrap();
        assert_eq!(diag.code, codes::UNEXPECTED_EOF);
        assert_eq!(diag.title, "expected }, found end of input");
    }

    #[test]
    fn test_unterminated_string() {
        let interner = Interner::new();
        let result = parse("{ user(name: \"oops) { id } }", &interner);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.code == codes::UNTERMINATED_STRING));
    }

    #[test]
    fn test_variables_rejected_in_const_values() {
        let interner = Interner::new();
        let result = parse("query ($a: Int = $b) { a }", &interner);
        assert!(result.has_errors());
    }

    #[test]
    fn test_empty_document() {
        let interner = Interner::new();
        let result = parse("  # only a comment\n", &interner);
        assert!(result.has_errors());
        assert!(result.document.definitions.is_empty());
    }

    #[test]
    fn test_recovers_from_garbage() {
        let interner = Interner::new();
        let result = parse("} ) { ok }", &interner);
        assert!(result.has_errors());
        assert_eq!(result.document.operations().count(), 1);
    }
}
