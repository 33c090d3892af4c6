//! Recursive descent over declarations.
//!
//! The parser writes straight into the model. Every written type becomes a source reference
//! scoped to the declaration it appears in; nothing is looked up while parsing.

use jmodel_types::names::{join_qualified, WILDCARD_NAME};
use jmodel_types::{
    Annotation, CodeModel, Modifiers, OperationId, TypeCategory, TypeId, TypeVarOwner, UnitId,
};

use crate::lexer::{Token, TokenKind};
use crate::{ParseError, TextRange};

pub(crate) struct ParsedUnit {
    pub(crate) unit: UnitId,
    pub(crate) types: Vec<TypeId>,
    pub(crate) errors: Vec<ParseError>,
}

/// A record component: name and declared type.
type Component = (String, TypeId);

pub(crate) struct Parser<'a, 'm> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    model: &'m mut CodeModel,
    unit: Option<UnitId>,
    package: Option<String>,
    errors: Vec<ParseError>,
}

impl<'a, 'm> Parser<'a, 'm> {
    pub(crate) fn new(text: &'a str, tokens: Vec<Token>, model: &'m mut CodeModel) -> Self {
        Self {
            text,
            tokens,
            pos: 0,
            model,
            unit: None,
            package: None,
            errors: Vec::new(),
        }
    }

    pub(crate) fn parse_compilation_unit(mut self) -> ParsedUnit {
        let package = self.parse_package();
        let unit = self.model.create_unit(package.as_deref());
        self.unit = Some(unit);
        self.package = package;

        while self.at_word("import") {
            self.parse_import(unit);
        }

        let mut types = Vec::new();
        while !self.at(TokenKind::Eof) {
            let before = self.pos;
            if self.eat(TokenKind::Semi) {
                continue;
            }
            if self.at(TokenKind::RBrace) {
                self.error_here("unmatched `}`");
                self.bump();
                continue;
            }
            if self.at_word("import") {
                self.error_here("imports must precede type declarations");
                self.parse_import(unit);
                continue;
            }

            let modifiers = self.parse_modifiers();
            match self.at_type_keyword() {
                Some(category) => {
                    if let Some(ty) = self.parse_type_declaration(None, modifiers, category) {
                        types.push(ty);
                    }
                }
                None => {
                    self.error_here("expected a type declaration");
                    self.recover_member();
                }
            }
            if self.pos == before {
                self.bump();
            }
        }

        ParsedUnit {
            unit,
            types,
            errors: self.errors,
        }
    }

    fn parse_package(&mut self) -> Option<String> {
        let start = self.pos;
        self.skip_annotations();
        if !self.at_word("package") {
            self.pos = start;
            return None;
        }
        self.bump();
        let name = self.parse_dotted_name();
        self.expect(TokenKind::Semi, "`;` after the package name");
        name
    }

    fn parse_import(&mut self, unit: UnitId) {
        self.bump();
        let is_static = self.eat_word("static");
        let Some(name) = self.parse_dotted_name() else {
            self.recover_member();
            return;
        };
        let mut on_demand = false;
        if self.at(TokenKind::Dot) && self.nth(1) == TokenKind::Op && self.nth_text(1) == "*" {
            self.bump();
            self.bump();
            on_demand = true;
        }
        self.expect(TokenKind::Semi, "`;` after the import");
        self.model.add_import(unit, &name, on_demand, is_static);
    }

    fn parse_type_declaration(
        &mut self,
        outer: Option<TypeId>,
        modifiers: Modifiers,
        category: TypeCategory,
    ) -> Option<TypeId> {
        if category == TypeCategory::Annotation {
            self.bump();
        }
        self.bump();

        let name_range = self.current().range;
        let Some(name) = self.expect_ident("a type name") else {
            self.recover_member();
            return None;
        };
        let declared = match outer {
            None => {
                let qualified = join_qualified(self.package.as_deref(), name);
                self.model.declare_type(&qualified, category, self.unit)
            }
            Some(outer) => self.model.declare_nested_type(outer, name, category),
        };
        let Some(ty) = self.check(name_range, declared) else {
            self.recover_member();
            return None;
        };
        let updated = self.model.set_modifiers(ty, modifiers);
        self.check(name_range, updated);

        let scope = TypeVarOwner::Type(ty);
        if self.at(TokenKind::Lt) {
            self.parse_type_params(scope);
        }
        let components = if category == TypeCategory::Record {
            self.parse_record_header(ty)
        } else {
            Vec::new()
        };
        if self.eat_word("extends") {
            self.parse_super_types(ty);
        }
        if self.eat_word("implements") {
            self.parse_super_types(ty);
        }
        if self.eat_word("permits") {
            // Permitted subclasses are not modeled.
            while self.parse_dotted_name().is_some() && self.eat(TokenKind::Comma) {}
        }

        if !self.expect(TokenKind::LBrace, "`{` to open the type body") {
            self.recover_member();
            return Some(ty);
        }
        self.parse_body(ty, category, &components);
        self.expect(TokenKind::RBrace, "`}` to close the type body");
        Some(ty)
    }

    fn parse_record_header(&mut self, ty: TypeId) -> Vec<Component> {
        let mut components = Vec::new();
        if !self.expect(TokenKind::LParen, "`(` to open the record header") {
            return components;
        }
        let scope = Some(TypeVarOwner::Type(ty));
        if self.eat(TokenKind::RParen) {
            return components;
        }
        loop {
            self.parse_modifiers();
            let Some(component_type) = self.parse_type(scope) else {
                break;
            };
            if self.eat(TokenKind::Ellipsis) {
                let updated = self.model.source_inc_array_count(component_type);
                self.check(self.previous_range(), updated);
            }
            let range = self.current().range;
            let Some(name) = self.expect_ident("a record component name") else {
                break;
            };
            let created = self.model.add_field(ty, name, component_type);
            if let Some(field) = self.check(range, created) {
                let updated = self
                    .model
                    .set_field_modifiers(field, Modifiers::PRIVATE | Modifiers::FINAL);
                self.check(range, updated);
            }
            components.push((name.to_string(), component_type));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.skip_to_closing(TokenKind::RParen, "`)` to close the record header");
        components
    }

    fn parse_super_types(&mut self, ty: TypeId) {
        let scope = Some(TypeVarOwner::Type(ty));
        loop {
            let range = self.current().range;
            let Some(super_type) = self.parse_type(scope) else {
                return;
            };
            let added = self.model.add_super_type(ty, super_type);
            self.check(range, added);
            if !self.eat(TokenKind::Comma) {
                return;
            }
        }
    }

    /// `<A, B extends X & Y>`; each bound after the first becomes a composed part.
    fn parse_type_params(&mut self, owner: TypeVarOwner) {
        self.bump();
        loop {
            self.skip_annotations();
            let range = self.current().range;
            let Some(name) = self.expect_ident("a type parameter name") else {
                break;
            };
            let added = self.model.add_type_var(owner, name);
            let var = self.check(range, added);
            if self.eat_word("extends") {
                let bound = self.parse_bound(owner);
                if let (Some(var), Some(bound)) = (var, bound) {
                    let updated = self.model.set_type_var_bound(var, Some(bound));
                    self.check(range, updated);
                }
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.skip_to_closing(TokenKind::Gt, "`>` to close the type parameters");
    }

    fn parse_bound(&mut self, owner: TypeVarOwner) -> Option<TypeId> {
        let first = self.parse_type(Some(owner))?;
        while self.eat(TokenKind::Amp) {
            let range = self.current().range;
            if let Some(part) = self.parse_type(Some(owner)) {
                let updated = self.model.source_add_composed_type(first, part);
                self.check(range, updated);
            }
        }
        Some(first)
    }

    /// A type use: annotations, a (dotted) name or `?` with its bound, type arguments and
    /// array dimensions. A plain block comment in front of it becomes the reference's comment.
    fn parse_type(&mut self, scope: Option<TypeVarOwner>) -> Option<TypeId> {
        let first = self.current().clone();
        let comment = first
            .comment
            .map(|range| self.slice(range).trim().to_string())
            .filter(|comment| !comment.is_empty());
        let mut annotations = Vec::new();
        while self.at(TokenKind::At) && !self.nth_is_word(1, "interface") {
            annotations.extend(self.parse_annotation());
        }

        let reference = if self.eat(TokenKind::Question) {
            let wildcard = self.model.create_source_ref(WILDCARD_NAME, scope, self.unit);
            if self.eat_word("extends") {
                if let Some(bound) = self.parse_type(scope) {
                    let updated = self.model.source_set_extends_bound(wildcard, bound);
                    self.check(first.range, updated);
                }
            } else if self.eat_word("super") {
                if let Some(bound) = self.parse_type(scope) {
                    let updated = self.model.source_set_super_bound(wildcard, bound);
                    self.check(first.range, updated);
                }
            }
            wildcard
        } else {
            let name = self.parse_type_name()?;
            let reference = self.model.create_source_ref(&name, scope, self.unit);
            if self.at(TokenKind::Lt) {
                self.parse_type_arguments(reference, scope);
            }
            reference
        };

        while self.at(TokenKind::LBracket) && self.nth(1) == TokenKind::RBracket {
            self.bump();
            self.bump();
            let updated = self.model.source_inc_array_count(reference);
            self.check(first.range, updated);
        }
        if comment.is_some() {
            let updated = self.model.source_set_comment(reference, comment);
            self.check(first.range, updated);
        }
        for annotation in annotations {
            let updated = self.model.source_add_annotation(reference, annotation);
            self.check(first.range, updated);
        }
        Some(reference)
    }

    /// `a.b.C`, stopping before a receiver's `.this`.
    fn parse_type_name(&mut self) -> Option<String> {
        let mut name = self.expect_ident("a type")?.to_string();
        while self.at(TokenKind::Dot)
            && self.nth(1) == TokenKind::Ident
            && !self.nth_is_word(1, "this")
        {
            self.bump();
            name.push('.');
            name.push_str(self.bump_text());
        }
        Some(name)
    }

    fn parse_type_arguments(&mut self, reference: TypeId, scope: Option<TypeVarOwner>) {
        let open = self.current().range;
        self.bump();
        if self.eat(TokenKind::Gt) {
            let updated = self.model.source_mark_diamond(reference);
            self.check(open, updated);
            return;
        }
        loop {
            let range = self.current().range;
            let Some(argument) = self.parse_type(scope) else {
                break;
            };
            let updated = self.model.source_add_type_argument(reference, argument);
            self.check(range, updated);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Gt, "`>` to close the type arguments");
    }

    fn parse_body(&mut self, ty: TypeId, category: TypeCategory, components: &[Component]) {
        if category == TypeCategory::Enum {
            self.parse_enum_constants(ty);
        }
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let before = self.pos;
            self.parse_member(ty, category, components);
            if self.pos == before {
                self.error_here("unexpected token in a type body");
                self.bump();
            }
        }
    }

    fn parse_enum_constants(&mut self, ty: TypeId) {
        loop {
            self.skip_annotations();
            let is_constant = self.at(TokenKind::Ident)
                && matches!(
                    self.nth(1),
                    TokenKind::Comma
                        | TokenKind::Semi
                        | TokenKind::RBrace
                        | TokenKind::LParen
                        | TokenKind::LBrace
                );
            if !is_constant {
                break;
            }
            let range = self.current().range;
            let name = self.bump_text();
            let created = self.model.add_field(ty, name, ty);
            if let Some(field) = self.check(range, created) {
                let updated = self.model.set_field_modifiers(
                    field,
                    Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL,
                );
                self.check(range, updated);
            }
            if self.at(TokenKind::LParen) {
                self.skip_balanced(TokenKind::LParen, TokenKind::RParen);
            }
            if self.at(TokenKind::LBrace) {
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if !self.eat(TokenKind::Semi) && !self.at(TokenKind::RBrace) {
            self.error_here("expected `;` after the enum constants");
        }
    }

    fn parse_member(&mut self, ty: TypeId, category: TypeCategory, components: &[Component]) {
        if self.eat(TokenKind::Semi) {
            return;
        }
        if self.at(TokenKind::LBrace) {
            self.parse_initializer(ty, false);
            return;
        }
        if self.at_word("static") && self.nth(1) == TokenKind::LBrace {
            self.bump();
            self.parse_initializer(ty, true);
            return;
        }

        let modifiers = self.parse_modifiers();
        if let Some(nested) = self.at_type_keyword() {
            self.parse_type_declaration(Some(ty), modifiers, nested);
            return;
        }

        // Generic methods and constructors: the parameters are parsed once the operation
        // exists, so their scope is the operation.
        let type_params = if self.at(TokenKind::Lt) {
            let start = self.pos;
            match self.index_after(start, TokenKind::Lt, TokenKind::Gt) {
                Some(after) => self.pos = after,
                None => {
                    self.error_here("unclosed type parameter list");
                    self.recover_member();
                    return;
                }
            }
            Some(start)
        } else {
            None
        };

        let simple_name = self
            .model
            .raw(ty)
            .map(|raw| raw.name().to_string())
            .unwrap_or_default();
        if self.at(TokenKind::Ident) && self.nth_text(0) == simple_name {
            match self.nth(1) {
                TokenKind::LParen => {
                    self.parse_constructor(ty, modifiers, type_params, &[]);
                    return;
                }
                TokenKind::LBrace if category == TypeCategory::Record => {
                    self.parse_constructor(ty, modifiers, type_params, components);
                    return;
                }
                _ => {}
            }
        }

        // Decide between a method and fields before creating any reference.
        let Some(name_index) = self.scan_type(self.pos) else {
            self.error_here("expected a member declaration");
            self.recover_member();
            return;
        };
        let is_method = self.kind_at(name_index) == TokenKind::Ident
            && self.kind_at(name_index + 1) == TokenKind::LParen;
        if is_method {
            self.parse_method(ty, modifiers, type_params, name_index);
        } else if type_params.is_some() {
            self.error_here("type parameters are only allowed on methods and constructors");
            self.recover_member();
        } else {
            self.parse_fields(ty, modifiers);
        }
    }

    fn parse_initializer(&mut self, ty: TypeId, is_static: bool) {
        let range = self.current().range;
        let Some(body) = self.block_text() else {
            return;
        };
        let existing = self.model.raw(ty).and_then(|raw| {
            if is_static {
                raw.static_initializer()
            } else {
                raw.instance_initializer()
            }
        });
        let body = match existing {
            Some(previous) => format!("{previous}\n{body}"),
            None => body,
        };
        let updated = if is_static {
            self.model.set_static_initializer(ty, Some(body))
        } else {
            self.model.set_instance_initializer(ty, Some(body))
        };
        self.check(range, updated);
    }

    fn parse_fields(&mut self, ty: TypeId, modifiers: Modifiers) {
        let Some(field_type) = self.parse_type(Some(TypeVarOwner::Type(ty))) else {
            self.recover_member();
            return;
        };
        loop {
            let range = self.current().range;
            let Some(name) = self.expect_ident("a field name") else {
                self.recover_member();
                return;
            };
            let mut declared = field_type;
            while self.at(TokenKind::LBracket) && self.nth(1) == TokenKind::RBracket {
                self.bump();
                self.bump();
                declared = self.model.create_array(declared);
            }
            let created = self.model.add_field(ty, name, declared);
            let field = self.check(range, created);
            if let Some(field) = field {
                let updated = self.model.set_field_modifiers(field, modifiers);
                self.check(range, updated);
            }
            if self.eat(TokenKind::Eq) {
                let initializer = self.capture_expression();
                if let Some(field) = field {
                    let updated = self.model.set_field_initializer(field, Some(initializer));
                    self.check(range, updated);
                }
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::Semi, "`;` after the field declaration");
    }

    fn parse_method(
        &mut self,
        ty: TypeId,
        modifiers: Modifiers,
        type_params: Option<usize>,
        name_index: usize,
    ) {
        let name_range = self.tokens[name_index].range;
        let name = self.slice(name_range);
        let created = self.model.add_method(ty, name);
        let Some(op) = self.check(name_range, created) else {
            self.recover_member();
            return;
        };
        let updated = self.model.set_operation_modifiers(op, modifiers);
        self.check(name_range, updated);

        let scope = TypeVarOwner::Operation(op);
        self.parse_deferred_type_params(type_params, scope);

        let mut return_type = None;
        if self.at_word("void") && name_index == self.pos + 1 {
            self.bump();
        } else {
            return_type = self.parse_type(Some(scope));
            let updated = self.model.set_return_type(op, return_type);
            self.check(name_range, updated);
        }
        self.pos = name_index + 1;

        self.parse_parameters(op, scope);
        while self.at(TokenKind::LBracket) && self.nth(1) == TokenKind::RBracket {
            self.bump();
            self.bump();
            if let Some(return_type) = return_type {
                let updated = self.model.source_inc_array_count(return_type);
                self.check(name_range, updated);
            }
        }
        self.parse_throws(op, scope);
        if self.eat_word("default") {
            // Annotation member default value.
            self.capture_expression();
        }
        self.finish_operation();
    }

    /// A constructor, or a record's compact canonical constructor when `components` is not
    /// empty.
    fn parse_constructor(
        &mut self,
        ty: TypeId,
        modifiers: Modifiers,
        type_params: Option<usize>,
        components: &[Component],
    ) {
        let name_range = self.current().range;
        let created = self.model.add_constructor(ty);
        let Some(op) = self.check(name_range, created) else {
            self.recover_member();
            return;
        };
        let updated = self.model.set_operation_modifiers(op, modifiers);
        self.check(name_range, updated);

        let scope = TypeVarOwner::Operation(op);
        self.parse_deferred_type_params(type_params, scope);
        self.bump();

        if self.at(TokenKind::LParen) {
            self.parse_parameters(op, scope);
            self.parse_throws(op, scope);
        } else {
            for (name, component_type) in components {
                let added = self.model.add_parameter(op, name, *component_type, false);
                self.check(name_range, added);
            }
        }
        self.finish_operation();
    }

    fn parse_deferred_type_params(&mut self, start: Option<usize>, scope: TypeVarOwner) {
        if let Some(start) = start {
            let resume = self.pos;
            self.pos = start;
            self.parse_type_params(scope);
            self.pos = resume;
        }
    }

    fn parse_parameters(&mut self, op: OperationId, scope: TypeVarOwner) {
        if !self.expect(TokenKind::LParen, "`(` to open the parameter list") {
            return;
        }
        if self.eat(TokenKind::RParen) {
            return;
        }
        loop {
            self.parse_modifiers();
            let Some(param_type) = self.parse_type(Some(scope)) else {
                break;
            };
            let varargs = self.eat(TokenKind::Ellipsis);
            if varargs {
                let updated = self.model.source_inc_array_count(param_type);
                self.check(self.previous_range(), updated);
            }

            if self.eat_word("this") {
                // Receiver parameter.
            } else if self.at(TokenKind::Dot) && self.nth_is_word(1, "this") {
                self.bump();
                self.bump();
            } else {
                let range = self.current().range;
                let Some(name) = self.expect_ident("a parameter name") else {
                    break;
                };
                while self.at(TokenKind::LBracket) && self.nth(1) == TokenKind::RBracket {
                    self.bump();
                    self.bump();
                    let updated = self.model.source_inc_array_count(param_type);
                    self.check(range, updated);
                }
                let added = self.model.add_parameter(op, name, param_type, varargs);
                self.check(range, added);
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.skip_to_closing(TokenKind::RParen, "`)` to close the parameter list");
    }

    fn parse_throws(&mut self, op: OperationId, scope: TypeVarOwner) {
        if !self.eat_word("throws") {
            return;
        }
        loop {
            let range = self.current().range;
            let Some(thrown) = self.parse_type(Some(scope)) else {
                return;
            };
            let added = self.model.add_thrown_type(op, thrown);
            self.check(range, added);
            if !self.eat(TokenKind::Comma) {
                return;
            }
        }
    }

    /// A body (skipped) or `;`.
    fn finish_operation(&mut self) {
        if self.at(TokenKind::LBrace) {
            self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
        } else if !self.eat(TokenKind::Semi) {
            self.error_here("expected `;` or a method body");
            self.recover_member();
        }
    }

    fn parse_modifiers(&mut self) -> Modifiers {
        let mut modifiers = Modifiers::empty();
        loop {
            if self.at(TokenKind::At) && !self.nth_is_word(1, "interface") {
                self.parse_annotation();
                continue;
            }
            if !self.at(TokenKind::Ident) {
                break;
            }
            if self.at_word("non")
                && self.nth(1) == TokenKind::Op
                && self.nth_text(1) == "-"
                && self.nth_is_word(2, "sealed")
            {
                self.bump();
                self.bump();
                self.bump();
                modifiers |= Modifiers::NON_SEALED;
                continue;
            }
            match Modifiers::from_keyword(self.nth_text(0)) {
                Some(flag) => {
                    self.bump();
                    modifiers |= flag;
                }
                None => break,
            }
        }
        modifiers
    }

    fn skip_annotations(&mut self) {
        while self.at(TokenKind::At) && !self.nth_is_word(1, "interface") {
            self.parse_annotation();
        }
    }

    fn parse_annotation(&mut self) -> Option<Annotation> {
        self.bump();
        let name = self.parse_dotted_name()?;
        if !self.at(TokenKind::LParen) {
            return Some(Annotation::new(name));
        }
        let open = self.current().range;
        let close = self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
        let arguments = self.text[open.end as usize..close.start as usize].trim();
        Some(Annotation::with_arguments(name, arguments))
    }

    fn parse_dotted_name(&mut self) -> Option<String> {
        let mut name = self.expect_ident("a name")?.to_string();
        while self.at(TokenKind::Dot) && self.nth(1) == TokenKind::Ident {
            self.bump();
            name.push('.');
            name.push_str(self.bump_text());
        }
        Some(name)
    }

    fn at_type_keyword(&self) -> Option<TypeCategory> {
        match self.nth(0) {
            TokenKind::At if self.nth_is_word(1, "interface") => Some(TypeCategory::Annotation),
            TokenKind::Ident => match self.nth_text(0) {
                "class" => Some(TypeCategory::Class),
                "interface" => Some(TypeCategory::Interface),
                "enum" => Some(TypeCategory::Enum),
                "record"
                    if self.nth(1) == TokenKind::Ident
                        && matches!(self.nth(2), TokenKind::LParen | TokenKind::Lt) =>
                {
                    Some(TypeCategory::Record)
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Index of the token after the type starting at `start`, without consuming anything.
    fn scan_type(&self, start: usize) -> Option<usize> {
        let mut i = start;
        while self.kind_at(i) == TokenKind::At {
            i += 1;
            if self.kind_at(i) != TokenKind::Ident {
                return None;
            }
            i += 1;
            while self.kind_at(i) == TokenKind::Dot && self.kind_at(i + 1) == TokenKind::Ident {
                i += 2;
            }
            if self.kind_at(i) == TokenKind::LParen {
                i = self.index_after(i, TokenKind::LParen, TokenKind::RParen)?;
            }
        }
        if self.kind_at(i) != TokenKind::Ident {
            return None;
        }
        i += 1;
        loop {
            match self.kind_at(i) {
                TokenKind::Dot if self.kind_at(i + 1) == TokenKind::Ident => i += 2,
                TokenKind::Lt => i = self.index_after(i, TokenKind::Lt, TokenKind::Gt)?,
                _ => break,
            }
        }
        while self.kind_at(i) == TokenKind::LBracket && self.kind_at(i + 1) == TokenKind::RBracket {
            i += 2;
        }
        Some(i)
    }

    /// Index after the token closing the `open` at `start`. Statement punctuation inside angle
    /// brackets means they were not brackets after all.
    fn index_after(&self, start: usize, open: TokenKind, close: TokenKind) -> Option<usize> {
        let mut depth = 0usize;
        let mut i = start;
        loop {
            let kind = self.kind_at(i);
            match kind {
                TokenKind::Eof => return None,
                TokenKind::Semi | TokenKind::LBrace | TokenKind::RBrace
                    if open == TokenKind::Lt =>
                {
                    return None
                }
                _ if kind == open => depth += 1,
                _ if kind == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    /// Consume a balanced `open ... close` group; returns the range of the closing token.
    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) -> Option<TextRange> {
        let start = self.current().range;
        match self.index_after(self.pos, open, close) {
            Some(after) => {
                self.pos = after;
                Some(self.tokens[after - 1].range)
            }
            None => {
                self.error_at(start, format!("unclosed `{}`", self.slice(start)));
                self.pos = self.tokens.len() - 1;
                None
            }
        }
    }

    /// Text between a balanced pair of braces, trimmed.
    fn block_text(&mut self) -> Option<String> {
        let open = self.current().range;
        let close = self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
        Some(
            self.text[open.end as usize..close.start as usize]
                .trim()
                .to_string(),
        )
    }

    /// Source text up to the next top-level `,` or `;`. A `<` glued to the preceding
    /// identifier opens type arguments, so `Map<K, V>` does not end the expression.
    fn capture_expression(&mut self) -> String {
        let start = self.current().range.start;
        let mut end = start;
        let mut depth = 0usize;
        let mut angles = 0usize;
        loop {
            match self.nth(0) {
                TokenKind::Eof => break,
                TokenKind::Semi if depth == 0 => break,
                TokenKind::Comma if depth == 0 && angles == 0 => break,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace if depth == 0 => break,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth -= 1,
                TokenKind::Lt if self.opens_type_arguments() => angles += 1,
                TokenKind::Gt if angles > 0 => angles -= 1,
                _ => {}
            }
            end = self.current().range.end;
            self.bump();
        }
        self.text[start as usize..end as usize].trim().to_string()
    }

    fn opens_type_arguments(&self) -> bool {
        let Some(previous) = self.pos.checked_sub(1).map(|i| &self.tokens[i]) else {
            return false;
        };
        previous.kind == TokenKind::Ident
            && previous.range.end == self.current().range.start
            && matches!(
                self.nth(1),
                TokenKind::Ident | TokenKind::Question | TokenKind::Gt | TokenKind::At
            )
    }

    /// Skip to the end of the current member: past a `;` or a braced block, or up to the `}`
    /// closing the enclosing body.
    fn recover_member(&mut self) {
        loop {
            match self.nth(0) {
                TokenKind::Eof | TokenKind::RBrace => return,
                TokenKind::Semi => {
                    self.bump();
                    return;
                }
                TokenKind::LBrace => {
                    self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                    return;
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Expect `close`; on anything else report it and skip ahead to it on the same declaration.
    fn skip_to_closing(&mut self, close: TokenKind, what: &str) {
        if self.eat(close) {
            return;
        }
        self.error_here(format!("expected {what}"));
        while !matches!(
            self.nth(0),
            TokenKind::Eof | TokenKind::LBrace | TokenKind::RBrace | TokenKind::Semi
        ) {
            let kind = self.nth(0);
            self.bump();
            if kind == close {
                return;
            }
        }
    }

    fn check<T>(&mut self, range: TextRange, result: jmodel_types::Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.errors.push(ParseError::new(err.to_string(), range));
                None
            }
        }
    }

    fn kind_at(&self, index: usize) -> TokenKind {
        self.tokens
            .get(index)
            .map_or(TokenKind::Eof, |token| token.kind)
    }

    fn nth(&self, n: usize) -> TokenKind {
        self.kind_at(self.pos + n)
    }

    fn nth_text(&self, n: usize) -> &'a str {
        match self.tokens.get(self.pos + n) {
            Some(token) => self.slice(token.range),
            None => "",
        }
    }

    fn nth_is_word(&self, n: usize, word: &str) -> bool {
        self.nth(n) == TokenKind::Ident && self.nth_text(n) == word
    }

    fn current(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn previous_range(&self) -> TextRange {
        match self.pos.checked_sub(1) {
            Some(i) => self.tokens[i].range,
            None => self.current().range,
        }
    }

    fn slice(&self, range: TextRange) -> &'a str {
        let text: &'a str = self.text;
        &text[range.start as usize..range.end as usize]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.nth(0) == kind
    }

    fn at_word(&self, word: &str) -> bool {
        self.nth_is_word(0, word)
    }

    fn bump(&mut self) {
        if self.nth(0) != TokenKind::Eof {
            self.pos += 1;
        }
    }

    fn bump_text(&mut self) -> &'a str {
        let text = self.nth_text(0);
        self.bump();
        text
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if self.at_word(word) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error_here(format!("expected {what}"));
            false
        }
    }

    fn expect_ident(&mut self, what: &str) -> Option<&'a str> {
        if self.at(TokenKind::Ident) {
            Some(self.bump_text())
        } else {
            self.error_here(format!("expected {what}"));
            None
        }
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let range = self.current().range;
        self.error_at(range, message);
    }

    fn error_at(&mut self, range: TextRange, message: impl Into<String>) {
        self.errors.push(ParseError::new(message, range));
    }
}
