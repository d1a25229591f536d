/// Declaration parsing.
///
/// This chunk covers everything with a name that the analyzer cares about:
/// - `namespace` and file-level `use` imports
/// - Class-like declarations (`class`, `interface`, `trait`, `enum`) and their members
/// - Free functions, parameter lists, return types and attributes
impl Parser {
    // ========================================================================
    // Namespaces and imports
    // ========================================================================

    /// Parse a `namespace` declaration (the keyword is the current token).
    fn namespace_decl(&mut self) -> Result<Spanned<Statement>, SyntaxError> {
        let start = self.advance().span;

        let name = match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        };

        if self.check_punct(PunctuationId::LBrace) {
            self.advance();
            let body = self.statement_list(StmtEnd::Brace)?;
            let end = self.expect_punct(PunctuationId::RBrace, "Expected '}' to close namespace")?;
            return Ok(Spanned::new(
                Statement::Namespace(NamespaceDecl { name, body: Some(body) }),
                start.merge(end),
            ));
        }

        if name.is_none() {
            return Err(self.error_here("Expected namespace name or '{'"));
        }
        self.expect_terminator()?;
        Ok(Spanned::new(
            Statement::Namespace(NamespaceDecl { name, body: None }),
            start.merge(self.previous_span()),
        ))
    }

    /// Parse `use A\B [as C], D;`, `use function ...;` and group uses `use A\{B, C as D};`.
    fn use_decl(&mut self) -> Result<Spanned<Statement>, SyntaxError> {
        let start = self.advance().span;

        // `use function` / `use const` import the same way for our purposes.
        if self.check_keyword(KeywordId::Function) || self.check_keyword(KeywordId::Const) {
            self.advance();
        }

        let mut imports = Vec::new();
        loop {
            let name = self.expect_ident("Expected name after 'use'")?;
            if self.check_punct(PunctuationId::Backslash) && self.peek_next().kind.is_punctuation(PunctuationId::LBrace) {
                self.advance();
                self.advance();
                loop {
                    let member = self.expect_ident("Expected name in group use")?;
                    let alias = self.use_alias()?;
                    imports.push(UseImport {
                        name: format!("{}\\{}", name, member),
                        alias,
                    });
                    if !self.match_punct(PunctuationId::Comma) || self.check_punct(PunctuationId::RBrace) {
                        break;
                    }
                }
                self.expect_punct(PunctuationId::RBrace, "Expected '}' to close group use")?;
            } else {
                let alias = self.use_alias()?;
                imports.push(UseImport { name, alias });
            }

            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }

        self.expect_terminator()?;
        Ok(Spanned::new(
            Statement::Use(UseDecl { imports }),
            start.merge(self.previous_span()),
        ))
    }

    fn use_alias(&mut self) -> Result<Option<String>, SyntaxError> {
        if self.match_keyword(KeywordId::As) {
            Ok(Some(self.expect_ident("Expected alias after 'as'")?))
        } else {
            Ok(None)
        }
    }

    // ========================================================================
    // Attributes and type hints
    // ========================================================================

    /// Parse consecutive `#[...]` groups and return the attribute names they contain.
    fn attributes(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut names = Vec::new();
        while matches!(self.peek().kind, TokenKind::AttributeStart) {
            let start = self.advance().span;
            let mut expect_name = true;
            loop {
                match self.peek().kind.clone() {
                    TokenKind::Eof => {
                        return Err(SyntaxError::new("Unexpected end of file: unclosed attribute", start));
                    }
                    TokenKind::Punctuation(PunctuationId::RBracket) => {
                        self.advance();
                        break;
                    }
                    TokenKind::Punctuation(PunctuationId::LParen | PunctuationId::LBracket) => {
                        self.skip_balanced()?;
                    }
                    TokenKind::Punctuation(PunctuationId::Comma) => {
                        self.advance();
                        expect_name = true;
                    }
                    TokenKind::Ident(name) if expect_name => {
                        self.advance();
                        names.push(name.trim_start_matches('\\').to_string());
                        expect_name = false;
                    }
                    _ => {
                        self.advance();
                    }
                }
            }
        }
        Ok(names)
    }

    /// Collect a type hint (`?int`, `A|B`, `(A&B)|null`, `static`) into its spelling.
    ///
    /// Stops at the first token that cannot be part of a type. A `&` directly followed by a
    /// variable or `...` is a by-reference marker, not an intersection.
    fn type_hint(&mut self) -> Option<String> {
        let mut text = String::new();
        loop {
            let kind = self.peek().kind.clone();
            let part = match &kind {
                TokenKind::Ident(_) | TokenKind::Keyword(KeywordId::Static) => spelling(&kind),
                TokenKind::Punctuation(PunctuationId::Question) => "?".to_string(),
                TokenKind::Operator(op) if op == "|" => "|".to_string(),
                // DNF group: `(A&B)|null`.
                TokenKind::Punctuation(PunctuationId::LParen)
                    if matches!(self.peek_next().kind, TokenKind::Ident(_)) =>
                {
                    "(".to_string()
                }
                TokenKind::Punctuation(PunctuationId::RParen) if text.contains('(') && !balanced(&text) => {
                    ")".to_string()
                }
                TokenKind::Punctuation(PunctuationId::Amp) => {
                    if matches!(
                        self.peek_next().kind,
                        TokenKind::Variable(_) | TokenKind::Punctuation(PunctuationId::Ellipsis)
                    ) {
                        break;
                    }
                    "&".to_string()
                }
                _ => break,
            };
            text.push_str(&part);
            self.advance();
        }

        if text.is_empty() { None } else { Some(text) }
    }

    // ========================================================================
    // Functions and parameters
    // ========================================================================

    /// Parse a parenthesised parameter list.
    fn param_list(&mut self) -> Result<Vec<Param>, SyntaxError> {
        self.expect_punct(PunctuationId::LParen, "Expected '(' to start parameter list")?;
        let mut params = Vec::new();

        while !self.check_punct(PunctuationId::RParen) {
            self.attributes()?;

            let mut promoted = None;
            loop {
                match self.peek().kind {
                    TokenKind::Keyword(KeywordId::Public) => promoted = Some(Visibility::Public),
                    TokenKind::Keyword(KeywordId::Protected) => promoted = Some(Visibility::Protected),
                    TokenKind::Keyword(KeywordId::Private) => promoted = Some(Visibility::Private),
                    TokenKind::Keyword(KeywordId::Readonly) => {
                        promoted.get_or_insert(Visibility::Public);
                    }
                    _ => break,
                }
                self.advance();
            }

            let type_hint = self.type_hint();
            let by_ref = self.match_punct(PunctuationId::Amp);
            let variadic = self.match_punct(PunctuationId::Ellipsis);

            let name = match &self.peek().kind {
                TokenKind::Variable(name) => {
                    let name = name.clone();
                    self.advance();
                    name
                }
                _ => return Err(self.error_here("Expected parameter name")),
            };

            let has_default = if self.match_punct(PunctuationId::Eq) {
                let default = self.skip_until_terminator(|k| k.is_punctuation(PunctuationId::Comma));
                if default.is_none() {
                    return Err(self.error_here("Expected default value after '='"));
                }
                true
            } else {
                false
            };

            params.push(Param {
                name,
                type_hint,
                has_default,
                variadic,
                by_ref,
                promoted,
            });

            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }

        self.expect_punct(PunctuationId::RParen, "Expected ')' to close parameter list")?;
        Ok(params)
    }

    /// Optional `: type` after a parameter list.
    fn return_type(&mut self) -> Result<Option<String>, SyntaxError> {
        if !self.match_punct(PunctuationId::Colon) {
            return Ok(None);
        }
        match self.type_hint() {
            Some(ty) => Ok(Some(ty)),
            None => Err(self.error_here("Expected return type after ':'")),
        }
    }

    /// Parse a `{ ... }` body and return its statements.
    fn block_body(&mut self, what: &str) -> Result<(Vec<Spanned<Statement>>, Span), SyntaxError> {
        self.expect_punct(PunctuationId::LBrace, &format!("Expected '{{' to start {}", what))?;
        let body = self.statement_list(StmtEnd::Brace)?;
        let end = self.expect_punct(PunctuationId::RBrace, &format!("Expected '}}' to close {}", what))?;
        Ok((body, end))
    }

    /// Parse a named function declaration (the `function` keyword is the current token).
    fn function_decl(&mut self, doc_comment: Option<String>) -> Result<Spanned<Statement>, SyntaxError> {
        let start = self.advance().span;
        let by_ref = self.match_punct(PunctuationId::Amp);
        let name = self.expect_ident("Expected function name")?;
        let params = self.param_list()?;
        let return_type = self.return_type()?;
        let (body, end) = self.block_body("function body")?;

        Ok(Spanned::new(
            Statement::Function(FunctionDecl {
                name,
                by_ref,
                params,
                return_type,
                doc_comment,
                body,
            }),
            start.merge(end),
        ))
    }

    // ========================================================================
    // Classes
    // ========================================================================

    /// Parse a class-like declaration starting at its modifiers (attributes already consumed).
    fn class_decl(
        &mut self,
        doc_comment: Option<String>,
        attributes: Vec<String>,
    ) -> Result<Spanned<Statement>, SyntaxError> {
        let start = self.peek().span;
        let (mut is_abstract, mut is_final, mut is_readonly) = (false, false, false);
        loop {
            if self.match_keyword(KeywordId::Abstract) {
                is_abstract = true;
            } else if self.match_keyword(KeywordId::Final) {
                is_final = true;
            } else if self.match_keyword(KeywordId::Readonly) {
                is_readonly = true;
            } else {
                break;
            }
        }

        let kind = match self.peek().kind {
            TokenKind::Keyword(KeywordId::Class) => ClassKind::Class,
            TokenKind::Keyword(KeywordId::Interface) => ClassKind::Interface,
            TokenKind::Keyword(KeywordId::Trait) => ClassKind::Trait,
            TokenKind::Keyword(KeywordId::Enum) => ClassKind::Enum,
            _ => return Err(self.error_here("Expected 'class', 'interface', 'trait' or 'enum'")),
        };
        self.advance();

        let name = self.expect_ident("Expected class name")?;
        if name.contains('\\') {
            return Err(SyntaxError::new(
                format!("Class name '{}' must not be qualified", name),
                self.previous_span(),
            ));
        }

        // Backed enum: `enum Suit: string`.
        if kind == ClassKind::Enum && self.match_punct(PunctuationId::Colon) && self.type_hint().is_none() {
            return Err(self.error_here("Expected backing type after ':'"));
        }

        let extends = if self.match_keyword(KeywordId::Extends) {
            self.name_list("Expected parent name after 'extends'")?
        } else {
            Vec::new()
        };
        let implements = if self.match_keyword(KeywordId::Implements) {
            self.name_list("Expected interface name after 'implements'")?
        } else {
            Vec::new()
        };

        self.expect_punct(PunctuationId::LBrace, "Expected '{' to start class body")?;
        let mut members = Vec::new();
        while !self.check_punct(PunctuationId::RBrace) {
            if self.is_at_end() {
                return Err(self.error_here("Expected '}' to close class body"));
            }
            if let Some(member) = self.class_member()? {
                members.push(member);
            }
        }
        let end = self.advance().span;

        Ok(Spanned::new(
            Statement::Class(ClassDecl {
                kind,
                name,
                is_abstract,
                is_final,
                is_readonly,
                extends,
                implements,
                doc_comment,
                attributes,
                members,
            }),
            start.merge(end),
        ))
    }

    fn name_list(&mut self, msg: &str) -> Result<Vec<Name>, SyntaxError> {
        let mut names = vec![self.expect_ident(msg)?];
        while self.match_punct(PunctuationId::Comma) {
            names.push(self.expect_ident(msg)?);
        }
        Ok(names)
    }

    /// Parse one class member. Returns `None` for a stray `;`.
    fn class_member(&mut self) -> Result<Option<Spanned<ClassMember>>, SyntaxError> {
        if self.match_punct(PunctuationId::Semicolon) {
            return Ok(None);
        }

        let start_index = self.pos;
        let start = self.peek().span;
        let doc_comment = self.doc_at(start_index);
        let attributes = self.attributes()?;

        if self.match_keyword(KeywordId::Use) {
            let traits = self.name_list("Expected trait name after 'use'")?;
            if self.check_punct(PunctuationId::LBrace) {
                // Conflict resolution block: `use A, B { A::x insteadof B; }`.
                self.skip_balanced()?;
            } else {
                self.expect_terminator()?;
            }
            return Ok(Some(Spanned::new(ClassMember::TraitUse(traits), start.merge(self.previous_span()))));
        }

        if self.match_keyword(KeywordId::Case) {
            let name = match self.peek().kind.clone() {
                TokenKind::Ident(name) => name,
                TokenKind::Keyword(id) => id.as_str().to_string(),
                _ => return Err(self.error_here("Expected enum case name")),
            };
            self.advance();
            if self.match_punct(PunctuationId::Eq)
                && self.skip_until_terminator(|k| k.is_punctuation(PunctuationId::Semicolon)).is_none()
            {
                return Err(self.error_here("Expected value after '='"));
            }
            self.expect_terminator()?;
            return Ok(Some(Spanned::new(ClassMember::EnumCase(name), start.merge(self.previous_span()))));
        }

        // Modifiers, in any order.
        let mut visibility = None;
        let (mut is_static, mut is_abstract, mut is_final, mut saw_modifier) = (false, false, false, false);
        loop {
            match self.peek().kind {
                TokenKind::Keyword(KeywordId::Public) => visibility = Some(Visibility::Public),
                TokenKind::Keyword(KeywordId::Protected) => visibility = Some(Visibility::Protected),
                TokenKind::Keyword(KeywordId::Private) => visibility = Some(Visibility::Private),
                TokenKind::Keyword(KeywordId::Static) => is_static = true,
                TokenKind::Keyword(KeywordId::Abstract) => is_abstract = true,
                TokenKind::Keyword(KeywordId::Final) => is_final = true,
                TokenKind::Keyword(KeywordId::Readonly | KeywordId::Var) => {}
                _ => break,
            }
            saw_modifier = true;
            self.advance();
        }

        if self.match_keyword(KeywordId::Const) {
            let names = self.const_names()?;
            return Ok(Some(Spanned::new(ClassMember::Constant(names), start.merge(self.previous_span()))));
        }

        if self.check_keyword(KeywordId::Function) {
            self.advance();
            let by_ref = self.match_punct(PunctuationId::Amp);
            let name = match self.peek().kind.clone() {
                TokenKind::Ident(name) if !name.contains('\\') => name,
                // Reserved words are valid method names.
                TokenKind::Keyword(id) => id.as_str().to_string(),
                _ => return Err(self.error_here("Expected method name")),
            };
            self.advance();
            let params = self.param_list()?;
            let return_type = self.return_type()?;

            let (body, end) = if self.check_punct(PunctuationId::LBrace) {
                let (body, end) = self.block_body("method body")?;
                (Some(body), end)
            } else if self.match_punct(PunctuationId::Semicolon) {
                (None, self.previous_span())
            } else {
                return Err(self.error_here("Expected method body or ';'"));
            };

            let method = MethodDecl {
                name,
                visibility: visibility.unwrap_or_default(),
                is_static,
                is_abstract,
                is_final,
                by_ref,
                params,
                return_type,
                doc_comment,
                attributes,
                body,
            };
            let span = start.merge(end);
            return Ok(Some(Spanned::new(ClassMember::Method(Spanned::new(method, span)), span)));
        }

        // Property: `[modifiers] [type] $a [= x], $b;`
        let type_hint = self.type_hint();
        if !saw_modifier && type_hint.is_none() {
            return Err(self.error_here("Unexpected token in class body"));
        }
        let names = self.property_names()?;
        Ok(Some(Spanned::new(
            ClassMember::Property(PropertyDecl {
                visibility: visibility.unwrap_or_default(),
                is_static,
                names,
            }),
            start.merge(self.previous_span()),
        )))
    }

    /// `[type] A = 1, B = 2;` after `const`; returns the constant names.
    fn const_names(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut names = Vec::new();
        loop {
            // Typed constants: the name is the identifier right before `=`.
            let mut name = None;
            while !self.check_punct(PunctuationId::Eq) {
                match self.peek().kind.clone() {
                    TokenKind::Ident(ident) => name = Some(ident),
                    TokenKind::Keyword(id) => name = Some(id.as_str().to_string()),
                    TokenKind::Punctuation(PunctuationId::Question) | TokenKind::Operator(_) => {}
                    _ => return Err(self.error_here("Expected constant name")),
                }
                self.advance();
            }
            let Some(name) = name else {
                return Err(self.error_here("Expected constant name"));
            };
            self.advance();
            let stop = |k: &TokenKind| {
                k.is_punctuation(PunctuationId::Comma) || k.is_punctuation(PunctuationId::Semicolon)
            };
            if self.skip_until_terminator(stop).is_none() {
                return Err(self.error_here("Expected constant value"));
            }
            names.push(name);
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_terminator()?;
        Ok(names)
    }

    /// `$a [= x], $b [{ hooks }];` after a property's modifiers and type.
    fn property_names(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut names = Vec::new();
        loop {
            match self.peek().kind.clone() {
                TokenKind::Variable(name) => {
                    self.advance();
                    names.push(name);
                }
                _ => return Err(self.error_here("Expected property name")),
            }
            if self.match_punct(PunctuationId::Eq) {
                let stop = |k: &TokenKind| {
                    k.is_punctuation(PunctuationId::Comma) || k.is_punctuation(PunctuationId::Semicolon)
                };
                if self.skip_until_terminator(stop).is_none() {
                    return Err(self.error_here("Expected default value after '='"));
                }
            }
            if self.check_punct(PunctuationId::LBrace) {
                // Property hooks end the declaration without a `;`.
                self.skip_balanced()?;
                return Ok(names);
            }
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_terminator()?;
        Ok(names)
    }
}

/// Whether every `(` in a partially built type spelling has been closed.
fn balanced(text: &str) -> bool {
    text.matches('(').count() == text.matches(')').count()
}
