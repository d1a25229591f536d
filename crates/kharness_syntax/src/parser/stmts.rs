/// Statement parsing.
///
/// Declarations are dispatched to the `decl` chunk. Control-flow statements keep their nested
/// bodies (both brace and alternative `:` ... `endif;` syntax); conditions and every other
/// expression are consumed as opaque balanced runs.
impl Parser {
    // ========================================================================
    // Statement lists
    // ========================================================================

    /// Parse statements until `end` is reached. The terminator itself is not consumed.
    fn statement_list(&mut self, end: StmtEnd) -> Result<Vec<Spanned<Statement>>, SyntaxError> {
        let mut statements = Vec::new();
        loop {
            let done = match end {
                StmtEnd::Eof => self.is_at_end(),
                StmtEnd::Brace => self.check_punct(PunctuationId::RBrace),
                StmtEnd::Keywords(ids) => ids.iter().any(|id| self.check_keyword(*id)),
            };
            if done {
                return Ok(statements);
            }
            if self.is_at_end() {
                let expected = match end {
                    StmtEnd::Brace => "'}'".to_string(),
                    StmtEnd::Keywords(ids) => format!("'{}'", ids.last().map(|id| id.as_str()).unwrap_or("end")),
                    StmtEnd::Eof => "end of file".to_string(),
                };
                return Err(self.error_here(&format!("Expected {}", expected)));
            }

            let stmt = self.statement()?;
            if !matches!(stmt.node, Statement::Nop) {
                statements.push(stmt);
            }
        }
    }

    /// Parse a single statement.
    fn statement(&mut self) -> Result<Spanned<Statement>, SyntaxError> {
        let start = self.peek().span;
        let start_index = self.pos;

        match self.peek().kind.clone() {
            TokenKind::OpenTag | TokenKind::CloseTag | TokenKind::Punctuation(PunctuationId::Semicolon) => {
                self.advance();
                Ok(Spanned::new(Statement::Nop, start))
            }
            TokenKind::InlineHtml(text) => {
                self.advance();
                Ok(Spanned::new(Statement::InlineHtml(text), start))
            }
            TokenKind::AttributeStart => {
                let doc = self.doc_at(start_index);
                let attributes = self.attributes()?;
                if self.check_keyword(KeywordId::Function) {
                    self.function_decl(doc)
                } else if self.starts_class() {
                    self.class_decl(doc, attributes)
                } else {
                    // Attributes on a closure or arrow function inside an expression.
                    self.expression_statement(start)
                }
            }
            TokenKind::Punctuation(PunctuationId::LBrace) => {
                self.advance();
                let body = self.statement_list(StmtEnd::Brace)?;
                let end = self.expect_punct(PunctuationId::RBrace, "Expected '}' to close block")?;
                Ok(Spanned::new(Statement::Block(body), start.merge(end)))
            }
            TokenKind::Keyword(id) => self.keyword_statement(id, start, start_index),
            _ => self.expression_statement(start),
        }
    }

    fn keyword_statement(&mut self, id: KeywordId, start: Span, start_index: usize) -> Result<Spanned<Statement>, SyntaxError> {
        match id {
            // `namespace\foo()` is a relative name inside an expression.
            KeywordId::Namespace if !self.next_is_relative_name() => self.namespace_decl(),
            KeywordId::Use => self.use_decl(),
            KeywordId::Function if self.next_is_function_name() => {
                let doc = self.doc_at(start_index);
                self.function_decl(doc)
            }
            KeywordId::Abstract | KeywordId::Final | KeywordId::Class | KeywordId::Interface | KeywordId::Trait
                if self.starts_class() =>
            {
                let doc = self.doc_at(start_index);
                self.class_decl(doc, Vec::new())
            }
            KeywordId::Readonly | KeywordId::Enum if self.starts_class() => {
                let doc = self.doc_at(start_index);
                self.class_decl(doc, Vec::new())
            }
            KeywordId::If => self.if_statement(start),
            KeywordId::While => self.loop_statement("while", KeywordId::EndWhile, start),
            KeywordId::For => self.loop_statement("for", KeywordId::EndFor, start),
            KeywordId::Foreach => self.loop_statement("foreach", KeywordId::EndForeach, start),
            KeywordId::Declare => self.declare_statement(start),
            KeywordId::Switch => self.switch_statement(start),
            KeywordId::Do => self.do_statement(start),
            KeywordId::Try => self.try_statement(start),
            KeywordId::Abstract
            | KeywordId::Final
            | KeywordId::Case
            | KeywordId::Default
            | KeywordId::Else
            | KeywordId::ElseIf
            | KeywordId::EndDeclare
            | KeywordId::EndFor
            | KeywordId::EndForeach
            | KeywordId::EndIf
            | KeywordId::EndSwitch
            | KeywordId::EndWhile
            | KeywordId::Catch
            | KeywordId::Finally
            | KeywordId::Extends
            | KeywordId::Implements
            | KeywordId::Interface
            | KeywordId::Trait
            | KeywordId::Class => Err(self.error_here("Unexpected keyword at start of statement")),
            _ => self.expression_statement(start),
        }
    }

    /// Whether the tokens ahead form a class-like declaration header.
    fn starts_class(&self) -> bool {
        let mut index = self.pos;
        while let Some(token) = self.tokens.get(index) {
            match token.kind {
                TokenKind::Keyword(KeywordId::Abstract | KeywordId::Final | KeywordId::Readonly) => index += 1,
                TokenKind::Keyword(KeywordId::Class | KeywordId::Interface | KeywordId::Trait) => return true,
                // `enum` is a soft keyword: only a declaration when a name follows.
                TokenKind::Keyword(KeywordId::Enum) => {
                    return matches!(self.tokens.get(index + 1).map(|t| &t.kind), Some(TokenKind::Ident(_)));
                }
                _ => return false,
            }
        }
        false
    }

    fn next_is_function_name(&self) -> bool {
        match &self.peek_next().kind {
            TokenKind::Ident(_) => true,
            TokenKind::Punctuation(PunctuationId::Amp) => {
                matches!(self.tokens.get(self.pos + 2).map(|t| &t.kind), Some(TokenKind::Ident(_)))
            }
            _ => false,
        }
    }

    fn next_is_relative_name(&self) -> bool {
        matches!(&self.peek_next().kind, TokenKind::Ident(name) if name.starts_with('\\'))
    }

    // ========================================================================
    // Expressions (opaque)
    // ========================================================================

    /// Consume an expression statement up to its terminator.
    fn expression_statement(&mut self, start: Span) -> Result<Spanned<Statement>, SyntaxError> {
        let span = self.skip_until_terminator(|k| {
            k.is_punctuation(PunctuationId::Semicolon) || matches!(k, TokenKind::CloseTag)
        });
        let Some(span) = span else {
            return Err(self.error_here("Expected statement"));
        };
        self.expect_terminator()?;
        Ok(Spanned::new(Statement::Expression(span), start.merge(span)))
    }

    /// Consume a parenthesised condition or header: `( ... )`.
    fn paren_header(&mut self, keyword: &str) -> Result<(), SyntaxError> {
        if !self.check_punct(PunctuationId::LParen) {
            return Err(self.error_here(&format!("Expected '(' after '{}'", keyword)));
        }
        self.skip_balanced()?;
        Ok(())
    }

    // ========================================================================
    // Control flow
    // ========================================================================

    /// Body of a control statement: a single statement, or `:` ... `<end keyword>` alternative
    /// syntax. Returns the statements and whether the alternative syntax was used.
    fn control_body(&mut self, alt_end: &'static [KeywordId]) -> Result<(Vec<Spanned<Statement>>, bool), SyntaxError> {
        if self.match_punct(PunctuationId::Colon) {
            let body = self.statement_list(StmtEnd::Keywords(alt_end))?;
            return Ok((body, true));
        }
        let stmt = self.statement()?;
        let body = match stmt.node {
            Statement::Block(inner) => inner,
            Statement::Nop => Vec::new(),
            _ => vec![stmt],
        };
        Ok((body, false))
    }

    /// Consume `endxxx;` closing an alternative-syntax block.
    fn alt_end(&mut self, keyword: KeywordId) -> Result<Span, SyntaxError> {
        if !self.match_keyword(keyword) {
            return Err(self.error_here(&format!("Expected '{}'", keyword.as_str())));
        }
        self.expect_terminator()?;
        Ok(self.previous_span())
    }

    fn control(&self, keyword: &str, bodies: Vec<Vec<Spanned<Statement>>>, span: Span) -> Spanned<Statement> {
        Spanned::new(
            Statement::Control(ControlStmt {
                keyword: keyword.to_string(),
                bodies,
            }),
            span,
        )
    }

    fn if_statement(&mut self, start: Span) -> Result<Spanned<Statement>, SyntaxError> {
        const ALT_END: &[KeywordId] = &[KeywordId::ElseIf, KeywordId::Else, KeywordId::EndIf];

        self.advance();
        self.paren_header("if")?;
        let (body, alt) = self.control_body(ALT_END)?;
        let mut bodies = vec![body];

        loop {
            if self.check_keyword(KeywordId::ElseIf) {
                self.advance();
                self.paren_header("elseif")?;
                let (body, _) = self.control_body(ALT_END)?;
                bodies.push(body);
            } else if self.check_keyword(KeywordId::Else) {
                self.advance();
                if alt {
                    if !self.match_punct(PunctuationId::Colon) {
                        return Err(self.error_here("Expected ':' after 'else'"));
                    }
                    bodies.push(self.statement_list(StmtEnd::Keywords(&[KeywordId::EndIf]))?);
                } else {
                    // `else if (...)` nests a whole if statement.
                    let (body, _) = self.control_body(ALT_END)?;
                    bodies.push(body);
                }
                break;
            } else {
                break;
            }
        }

        let end = if alt { self.alt_end(KeywordId::EndIf)? } else { self.previous_span() };
        Ok(self.control("if", bodies, start.merge(end)))
    }

    fn loop_statement(&mut self, keyword: &'static str, end_keyword: KeywordId, start: Span) -> Result<Spanned<Statement>, SyntaxError> {
        self.advance();
        self.paren_header(keyword)?;
        let alt_end: &'static [KeywordId] = match end_keyword {
            KeywordId::EndWhile => &[KeywordId::EndWhile],
            KeywordId::EndFor => &[KeywordId::EndFor],
            _ => &[KeywordId::EndForeach],
        };
        let (body, alt) = self.control_body(alt_end)?;
        let end = if alt { self.alt_end(end_keyword)? } else { self.previous_span() };
        Ok(self.control(keyword, vec![body], start.merge(end)))
    }

    fn declare_statement(&mut self, start: Span) -> Result<Spanned<Statement>, SyntaxError> {
        self.advance();
        self.paren_header("declare")?;
        if self.check_punct(PunctuationId::Semicolon) || matches!(self.peek().kind, TokenKind::CloseTag) {
            self.expect_terminator()?;
            return Ok(self.control("declare", Vec::new(), start.merge(self.previous_span())));
        }
        let (body, alt) = self.control_body(&[KeywordId::EndDeclare])?;
        let end = if alt { self.alt_end(KeywordId::EndDeclare)? } else { self.previous_span() };
        Ok(self.control("declare", vec![body], start.merge(end)))
    }

    fn do_statement(&mut self, start: Span) -> Result<Spanned<Statement>, SyntaxError> {
        self.advance();
        let stmt = self.statement()?;
        let body = match stmt.node {
            Statement::Block(inner) => inner,
            _ => vec![stmt],
        };
        if !self.match_keyword(KeywordId::While) {
            return Err(self.error_here("Expected 'while' after do body"));
        }
        self.paren_header("while")?;
        self.expect_terminator()?;
        Ok(self.control("do", vec![body], start.merge(self.previous_span())))
    }

    fn try_statement(&mut self, start: Span) -> Result<Spanned<Statement>, SyntaxError> {
        self.advance();
        let (body, mut end) = self.block_body("try block")?;
        let mut bodies = vec![body];

        let mut handlers = 0;
        while self.match_keyword(KeywordId::Catch) {
            self.paren_header("catch")?;
            let (body, block_end) = self.block_body("catch block")?;
            bodies.push(body);
            end = block_end;
            handlers += 1;
        }
        if self.match_keyword(KeywordId::Finally) {
            let (body, block_end) = self.block_body("finally block")?;
            bodies.push(body);
            end = block_end;
            handlers += 1;
        }
        if handlers == 0 {
            return Err(self.error_here("Expected 'catch' or 'finally' after try block"));
        }

        Ok(self.control("try", bodies, start.merge(end)))
    }

    fn switch_statement(&mut self, start: Span) -> Result<Spanned<Statement>, SyntaxError> {
        self.advance();
        self.paren_header("switch")?;

        let alt = if self.match_punct(PunctuationId::Colon) {
            true
        } else {
            self.expect_punct(PunctuationId::LBrace, "Expected '{' to start switch body")?;
            false
        };

        let mut body = Vec::new();
        loop {
            let done = if alt {
                self.check_keyword(KeywordId::EndSwitch)
            } else {
                self.check_punct(PunctuationId::RBrace)
            };
            if done {
                break;
            }
            if self.is_at_end() {
                return Err(self.error_here(if alt { "Expected 'endswitch'" } else { "Expected '}' to close switch" }));
            }

            if self.match_keyword(KeywordId::Case) {
                let label = |k: &TokenKind| {
                    k.is_punctuation(PunctuationId::Colon) || k.is_punctuation(PunctuationId::Semicolon)
                };
                if self.skip_until_terminator(label).is_none() {
                    return Err(self.error_here("Expected case value"));
                }
                self.switch_label_end()?;
            } else if self.match_keyword(KeywordId::Default) {
                self.switch_label_end()?;
            } else {
                let stmt = self.statement()?;
                if !matches!(stmt.node, Statement::Nop) {
                    body.push(stmt);
                }
            }
        }

        let end = if alt {
            self.alt_end(KeywordId::EndSwitch)?
        } else {
            self.advance().span
        };
        Ok(self.control("switch", vec![body], start.merge(end)))
    }

    fn switch_label_end(&mut self) -> Result<(), SyntaxError> {
        if self.match_punct(PunctuationId::Colon) || self.match_punct(PunctuationId::Semicolon) {
            Ok(())
        } else {
            Err(self.error_here("Expected ':' after case label"))
        }
    }
}
