//! Parser for Go declarations
//!
//! Recursive descent over the token stream, with Pratt parsing for the
//! constant expressions on the right of `=`. Only `package`, `type` and
//! `const` are parsed in full; `import`, `var` and `func` are skipped by
//! bracket balancing.
//!
//! Comments are pulled out of the token stream up front and re-attached to
//! specs by line position, following Go's rules: a doc comment is the group
//! of own-line comments ending on the line just above, a line comment starts
//! on the spec's last line after its code.

use crate::frontend::ast::*;
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result, Span};

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    comments: Vec<Comment>,
    pos: usize,
}

impl Parser {
    /// Create a new parser from a lexer
    pub fn new(mut lexer: Lexer) -> Self {
        Self::from_tokens(lexer.tokenize())
    }

    /// Create a parser from pre-tokenized input
    pub fn from_tokens(all: Vec<Token>) -> Self {
        let mut tokens = Vec::with_capacity(all.len());
        let mut comments = Vec::new();
        let mut last_code_line = None;

        for token in all {
            match token.kind {
                TokenKind::Comment(text) => comments.push(Comment {
                    text,
                    own_line: last_code_line != Some(token.span.line),
                    span: token.span,
                }),
                TokenKind::Newline => tokens.push(token),
                _ => {
                    last_code_line = Some(token.span.end_line);
                    tokens.push(token);
                }
            }
        }

        if tokens.is_empty() {
            tokens.push(Token::eof(Span::dummy()));
        }

        Self { tokens, comments, pos: 0 }
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| &t.kind)
    }

    fn previous_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn unexpected(&self, expected: &str) -> Error {
        let token = self.current();
        match &token.kind {
            TokenKind::Unterminated(what) => Error::UnterminatedLiteral { what: *what, span: token.span },
            kind => Error::UnexpectedToken {
                expected: expected.to_string(),
                got: kind.to_string(),
                span: token.span,
            },
        }
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.current_kind(), TokenKind::Newline | TokenKind::Semicolon) {
            self.advance();
        }
    }

    /// Consume the newline or `;` ending a declaration
    fn expect_terminator(&mut self) -> Result<()> {
        match self.current_kind() {
            TokenKind::Newline | TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    /// Inside `( ... )`: a spec ends at a newline, `;` or the closing paren
    fn expect_group_separator(&mut self) -> Result<()> {
        match self.current_kind() {
            TokenKind::Newline | TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenKind::RParen => Ok(()),
            _ => Err(self.unexpected("end of line or `)`")),
        }
    }

    // ==================== Comment Association ====================

    /// Own-line comments ending on the line directly above `start`
    fn doc_comment(&self, start: Span) -> Option<CommentGroup> {
        let end = self.comments.partition_point(|c| c.span.end <= start.start);
        let mut group = Vec::new();
        let mut next_line = start.line;

        for comment in self.comments[..end].iter().rev() {
            if !comment.own_line || comment.span.end_line + 1 != next_line {
                break;
            }
            group.push(comment.clone());
            next_line = comment.span.line;
        }

        if group.is_empty() {
            return None;
        }
        group.reverse();
        Some(CommentGroup { comments: group })
    }

    /// Comments trailing code on the last line of `span`
    fn line_comment(&self, span: Span) -> Option<CommentGroup> {
        let begin = self.comments.partition_point(|c| c.span.start < span.end);
        let comments: Vec<Comment> = self.comments[begin..]
            .iter()
            .take_while(|c| !c.own_line && c.span.line == span.end_line)
            .cloned()
            .collect();

        if comments.is_empty() {
            None
        } else {
            Some(CommentGroup { comments })
        }
    }

    // ==================== Parsing Methods ====================

    /// Parse a complete source file
    pub fn parse_file(&mut self) -> Result<SourceFile> {
        self.skip_newlines();
        self.expect(TokenKind::Package)?;
        let package = self.parse_ident()?;
        self.expect_terminator()?;

        let mut decls = Vec::new();
        loop {
            self.skip_newlines();
            if self.is_at_end() {
                break;
            }
            decls.push(self.parse_decl()?);
        }

        Ok(SourceFile { package, decls })
    }

    /// Parse a top-level declaration
    fn parse_decl(&mut self) -> Result<Decl> {
        match self.current_kind() {
            TokenKind::Type => Ok(Decl::Type(self.parse_type_decl()?)),
            TokenKind::Const => Ok(Decl::Const(self.parse_const_decl()?)),
            TokenKind::Import | TokenKind::Var | TokenKind::Func => Ok(Decl::Other(self.skip_decl()?)),
            _ => Err(self.unexpected("declaration (import, type, const, var, func)")),
        }
    }

    /// Skip a declaration the generator does not care about
    fn skip_decl(&mut self) -> Result<Span> {
        let start = self.advance().span;
        let mut depth = 0usize;

        loop {
            match self.current_kind() {
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => {
                    if depth == 0 {
                        return Err(self.unexpected("balanced brackets"));
                    }
                    depth -= 1;
                }
                TokenKind::Newline | TokenKind::Semicolon if depth == 0 => break,
                TokenKind::Eof => {
                    if depth > 0 {
                        return Err(self.unexpected("closing bracket"));
                    }
                    break;
                }
                TokenKind::Unterminated(_) => return Err(self.unexpected("")),
                _ => {}
            }
            self.advance();
        }

        let span = start.merge(&self.previous_span());
        self.expect_terminator()?;
        Ok(span)
    }

    /// Skip a type expression, stopping before a terminator or an unmatched `)`
    fn skip_type_expr(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.current_kind() {
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => depth += 1,
                TokenKind::RParen if depth == 0 => return Ok(()),
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => {
                    if depth == 0 {
                        return Err(self.unexpected("type"));
                    }
                    depth -= 1;
                }
                TokenKind::Newline | TokenKind::Semicolon if depth == 0 => return Ok(()),
                TokenKind::Eof => {
                    return if depth == 0 { Ok(()) } else { Err(self.unexpected("closing bracket")) };
                }
                TokenKind::Unterminated(_) => return Err(self.unexpected("")),
                _ => {}
            }
            self.advance();
        }
    }

    /// Parse `type x T` or `type ( ... )`
    fn parse_type_decl(&mut self) -> Result<TypeDecl> {
        let keyword = self.expect(TokenKind::Type)?;
        let doc = self.doc_comment(keyword.span);
        let mut specs = Vec::new();

        if self.consume(&TokenKind::LParen) {
            loop {
                self.skip_newlines();
                if self.check(&TokenKind::RParen) || self.is_at_end() {
                    break;
                }
                specs.push(self.parse_type_spec()?);
                self.expect_group_separator()?;
            }
            self.expect(TokenKind::RParen)?;
        } else {
            specs.push(self.parse_type_spec()?);
        }

        self.expect_terminator()?;
        Ok(TypeDecl { doc, specs })
    }

    fn parse_type_spec(&mut self) -> Result<TypeSpec> {
        let start = self.current().span;
        let doc = self.doc_comment(start);
        let name = self.parse_ident()?;

        // Type parameters rule out a plain underlying name
        let generic = self.check(&TokenKind::LBracket);
        let alias = !generic && self.consume(&TokenKind::Eq);

        let underlying = if !generic && self.is_plain_type_name() {
            Some(self.parse_qualified_ident()?)
        } else {
            self.skip_type_expr()?;
            None
        };

        Ok(TypeSpec {
            name,
            underlying,
            alias,
            doc,
            span: start.merge(&self.previous_span()),
        })
    }

    /// `int`, `pkg.Name` followed by the end of the spec
    fn is_plain_type_name(&self) -> bool {
        if !matches!(self.current_kind(), TokenKind::Ident(_)) {
            return false;
        }
        let mut offset = 1;
        while matches!(self.tokens.get(self.pos + offset).map(|t| &t.kind), Some(TokenKind::Dot))
            && matches!(self.tokens.get(self.pos + offset + 1).map(|t| &t.kind), Some(TokenKind::Ident(_)))
        {
            offset += 2;
        }
        self.tokens
            .get(self.pos + offset)
            .map_or(true, |t| t.kind.is_terminator() || t.kind == TokenKind::RParen)
    }

    /// Parse `const x T = v` or `const ( ... )`
    fn parse_const_decl(&mut self) -> Result<ConstDecl> {
        let keyword = self.expect(TokenKind::Const)?;
        let mut specs = Vec::new();
        let grouped = self.consume(&TokenKind::LParen);

        if grouped {
            loop {
                self.skip_newlines();
                if self.check(&TokenKind::RParen) || self.is_at_end() {
                    break;
                }
                specs.push(self.parse_value_spec()?);
                self.expect_group_separator()?;
            }
            self.expect(TokenKind::RParen)?;
        } else {
            specs.push(self.parse_value_spec()?);
        }

        let span = keyword.span.merge(&self.previous_span());
        self.expect_terminator()?;
        Ok(ConstDecl { specs, grouped, span })
    }

    /// Parse `a, b T = x, y`
    fn parse_value_spec(&mut self) -> Result<ValueSpec> {
        let start = self.current().span;
        let doc = self.doc_comment(start);

        let mut names = vec![self.parse_ident()?];
        while self.consume(&TokenKind::Comma) {
            names.push(self.parse_ident()?);
        }

        let ty = if matches!(self.current_kind(), TokenKind::Ident(_)) {
            Some(self.parse_qualified_ident()?)
        } else {
            None
        };

        let mut values = Vec::new();
        if self.consume(&TokenKind::Eq) {
            self.skip_newlines_in_expr();
            values.push(self.parse_expr()?);
            while self.consume(&TokenKind::Comma) {
                self.skip_newlines_in_expr();
                values.push(self.parse_expr()?);
            }
        }

        let span = start.merge(&self.previous_span());
        let comment = self.line_comment(span);

        Ok(ValueSpec { names, ty, values, doc, comment })
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Ident::new(name, token.span))
            }
            TokenKind::Unterminated(_) => Err(self.unexpected("identifier")),
            _ => Err(Error::ExpectedIdent { span: token.span }),
        }
    }

    /// Parse `name` or `pkg.name`
    fn parse_qualified_ident(&mut self) -> Result<Ident> {
        let mut ident = self.parse_ident()?;
        while self.check(&TokenKind::Dot) && matches!(self.peek_kind(), Some(TokenKind::Ident(_))) {
            self.advance();
            let part = self.parse_ident()?;
            ident = Ident::new(format!("{}.{}", ident.name, part.name), ident.span.merge(&part.span));
        }
        Ok(ident)
    }

    /// No automatic semicolon follows an operator, `(` or `,`
    fn skip_newlines_in_expr(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    // ==================== Expression Parsing (Pratt) ====================

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    /// Parse expression with binding power (Pratt parsing)
    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op_token = self.current().clone();
            let Some(bp) = op_token.kind.binary_precedence() else {
                break;
            };

            if bp < min_bp {
                break;
            }

            self.advance();
            self.skip_newlines_in_expr();
            let op = Self::token_to_binop(&op_token.kind)?;
            let right = self.parse_expr_bp(bp + 1)?;
            let span = left.span().merge(&right.span());

            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            };
        }

        Ok(left)
    }

    fn token_to_binop(kind: &TokenKind) -> Result<BinOp> {
        Ok(match kind {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Percent => BinOp::Mod,
            TokenKind::And => BinOp::BitAnd,
            TokenKind::Or => BinOp::BitOr,
            TokenKind::Caret => BinOp::BitXor,
            TokenKind::AndNot => BinOp::AndNot,
            TokenKind::Shl => BinOp::Shl,
            TokenKind::Shr => BinOp::Shr,
            TokenKind::EqEq => BinOp::Eq,
            TokenKind::Ne => BinOp::Ne,
            TokenKind::Lt => BinOp::Lt,
            TokenKind::Le => BinOp::Le,
            TokenKind::Gt => BinOp::Gt,
            TokenKind::Ge => BinOp::Ge,
            TokenKind::AndAnd => BinOp::And,
            TokenKind::OrOr => BinOp::Or,
            other => {
                return Err(Error::UnexpectedToken {
                    expected: "binary operator".to_string(),
                    got: other.to_string(),
                    span: Span::dummy(),
                })
            }
        })
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let token = self.current().clone();
        let op = match token.kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Caret => UnaryOp::BitNot,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        let span = token.span.merge(&operand.span());
        Ok(Expr::Unary { op, operand: Box::new(operand), span })
    }

    /// Calls and conversions after a primary expression
    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;

        while self.consume(&TokenKind::LParen) {
            let mut args = Vec::new();
            loop {
                self.skip_newlines_in_expr();
                if self.check(&TokenKind::RParen) {
                    break;
                }
                args.push(self.parse_expr()?);
                self.skip_newlines_in_expr();
                if !self.consume(&TokenKind::Comma) {
                    break;
                }
            }
            let close = self.expect(TokenKind::RParen)?;
            let span = expr.span().merge(&close.span);
            expr = Expr::Call { callee: Box::new(expr), args, span };
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.current().clone();

        let expr = match &token.kind {
            TokenKind::IntLit(n) => Expr::Int(*n, token.span),
            TokenKind::BigIntLit(text) => Expr::BigInt(text.clone(), token.span),
            TokenKind::FloatLit(n) => Expr::Float(*n, token.span),
            TokenKind::StringLit(s) => Expr::Str(s.clone(), token.span),
            TokenKind::CharLit(c) => Expr::Char(*c, token.span),
            TokenKind::Ident(_) => return Ok(Expr::Ident(self.parse_qualified_ident()?)),
            TokenKind::LParen => {
                self.advance();
                self.skip_newlines_in_expr();
                let inner = self.parse_expr()?;
                self.skip_newlines_in_expr();
                let close = self.expect(TokenKind::RParen)?;
                return Ok(Expr::Paren(Box::new(inner), token.span.merge(&close.span)));
            }
            TokenKind::Unterminated(what) => {
                return Err(Error::UnterminatedLiteral { what: *what, span: token.span });
            }
            _ => return Err(Error::ExpectedExpr { span: token.span }),
        };

        self.advance();
        Ok(expr)
    }
}

/// Lex and parse a Go source file
pub fn parse_source(source: &str) -> Result<SourceFile> {
    Parser::new(Lexer::new(source)).parse_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> SourceFile {
        parse_source(source).unwrap()
    }

    fn const_decl(file: &SourceFile, index: usize) -> &ConstDecl {
        file.decls
            .iter()
            .filter_map(|d| match d {
                Decl::Const(c) => Some(c),
                _ => None,
            })
            .nth(index)
            .unwrap()
    }

    #[test]
    fn test_package_and_type() {
        let file = parse("package main\n\n// goenums: -json\ntype status int\n");

        assert_eq!(file.package.name, "main");
        let Decl::Type(decl) = &file.decls[0] else {
            panic!("expected type declaration");
        };
        assert_eq!(decl.specs[0].name.name, "status");
        assert_eq!(decl.specs[0].underlying.as_ref().map(|i| i.name.as_str()), Some("int"));
        assert_eq!(decl.doc.as_ref().unwrap().text(), " goenums: -json");
    }

    #[test]
    fn test_struct_type_has_no_underlying_name() {
        let file = parse("package p\ntype point struct {\n\tx int\n\ty int\n}\ntype id = pkg.ID\n");

        let Decl::Type(first) = &file.decls[0] else { panic!() };
        assert!(first.specs[0].underlying.is_none());
        let Decl::Type(second) = &file.decls[1] else { panic!() };
        assert!(second.specs[0].alias);
        assert_eq!(second.specs[0].underlying.as_ref().unwrap().name, "pkg.ID");
    }

    #[test]
    fn test_const_block_specs() {
        let file = parse(
            "package p\n\nconst (\n\t// queued\n\t// tag: slow\n\tpending status = iota // first\n\n\trunning\n\ta, b = 1, 2\n)\n",
        );
        let block = const_decl(&file, 0);

        assert!(block.grouped);
        assert_eq!(block.specs.len(), 3);

        let pending = &block.specs[0];
        assert_eq!(pending.names[0].name, "pending");
        assert_eq!(pending.ty.as_ref().unwrap().name, "status");
        assert!(matches!(pending.values[0], Expr::Ident(ref i) if i.name == "iota"));
        assert_eq!(pending.comment_text(), " queued\n tag: slow\n first");

        let running = &block.specs[1];
        assert!(running.ty.is_none());
        assert!(running.values.is_empty());
        assert!(running.doc.is_none());
        assert!(running.comment.is_none());

        let pair = &block.specs[2];
        assert_eq!(pair.names.len(), 2);
        assert!(matches!(pair.values[1], Expr::Int(2, _)));
    }

    #[test]
    fn test_blank_line_breaks_doc() {
        let file = parse("package p\nconst (\n\t// banner\n\n\t// doc\n\tx t = 1\n)\n");
        let spec = &const_decl(&file, 0).specs[0];

        assert_eq!(spec.doc.as_ref().unwrap().text(), " doc");
    }

    #[test]
    fn test_trailing_comment_is_not_next_doc() {
        let file = parse("package p\nconst (\n\ta t = 0 // invalid\n\tb t = 1\n)\n");
        let specs = &const_decl(&file, 0).specs;

        assert_eq!(specs[0].comment_text(), " invalid");
        assert!(specs[1].doc.is_none());
        assert_eq!(specs[1].comment_text(), "");
    }

    #[test]
    fn test_expressions() {
        let file = parse("package p\nconst (\n\ta t = 1 << iota\n\tb t = -(2 + 3) * 4\n\tc t = t(7)\n)\n");
        let specs = &const_decl(&file, 0).specs;

        assert!(matches!(
            specs[0].values[0],
            Expr::Binary { op: BinOp::Shl, .. }
        ));
        let Expr::Binary { op: BinOp::Mul, left, .. } = &specs[1].values[0] else {
            panic!("expected multiplication");
        };
        assert!(matches!(**left, Expr::Unary { op: UnaryOp::Neg, .. }));
        assert!(matches!(specs[2].values[0], Expr::Call { ref args, .. } if args.len() == 1));
    }

    #[test]
    fn test_skips_funcs_vars_imports() {
        let file = parse(
            "package p\n\nimport (\n\t\"fmt\"\n)\n\nvar x = map[string]int{\n\t\"a\": 1,\n}\n\nfunc f() {\n\tfmt.Println(`}`)\n}\n\nconst k t = 3\n",
        );

        assert_eq!(file.decls.len(), 4);
        assert!(matches!(file.decls[0], Decl::Other(_)));
        assert!(matches!(file.decls[2], Decl::Other(_)));
        let block = const_decl(&file, 0);
        assert!(!block.grouped);
        assert_eq!(block.specs[0].names[0].name, "k");
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(
            parse_source("const x = 1\n"),
            Err(Error::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse_source("package p\nconst (\n\tx t = \n)\n"),
            Err(Error::ExpectedExpr { .. })
        ));
        assert!(matches!(
            parse_source("package p\nconst (\n\t= 3\n)\n"),
            Err(Error::ExpectedIdent { .. })
        ));
        assert!(matches!(
            parse_source("package p\nfunc f() {\n"),
            Err(Error::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse_source("package p\nconst s = \"open\n"),
            Err(Error::UnterminatedLiteral { .. })
        ));
    }
}
