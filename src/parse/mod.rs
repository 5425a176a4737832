/**
 * Copyright 2022 - Jahred Love
 *
 * Redistribution and use in source and binary forms, with or without modification,
 * are permitted provided that the following conditions are met:
 *
 * 1. Redistributions of source code must retain the above copyright notice, this
 * list of conditions and the following disclaimer.
 *
 * 2. Redistributions in binary form must reproduce the above copyright notice, this
 * list of conditions and the following disclaimer in the documentation and/or other
 * materials provided with the distribution.
 *
 * 3. Neither the name of the copyright holder nor the names of its contributors may
 * be used to endorse or promote products derived from this software without specific
 * prior written permission.
 *
 * THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS “AS IS” AND
 * ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE IMPLIED
 * WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE DISCLAIMED.
 * IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT,
 * INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT
 * NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
 * PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
 * WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE)
 * ARISING IN ANY WAY OUT OF THE USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE
 * POSSIBILITY OF SUCH DAMAGE.
 */

mod decl;
mod expr;
mod stmt;

use std::collections::VecDeque;

use crate::ast::{Item, Loc, TypeSpec};
use crate::debug;
use crate::error::{DiagLog, ErrorClass};
use crate::lex::Lexer;
use crate::token::{Token, TokenKind};

/// Recursive-descent parser over a lazily filled token deque. One token of
/// lookahead past the current token (LL(2)) is all the grammar needs, but
/// `peek_at` lexes forward arbitrarily.
pub struct Parser<'a> {
    lx: Lexer<'a>,
    buf: VecDeque<Token>,
    pub log: DiagLog,
    seen_decl: bool,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            lx: Lexer::new(src),
            buf: VecDeque::new(),
            log: DiagLog::new(),
            seen_decl: false,
        }
    }

    // ---- token buffer --------------------------------------------------

    fn fill(&mut self, n: usize) {
        while self.buf.len() <= n {
            let t = self.lx.next_token();
            self.buf.push_back(t);
        }
    }

    /// Remove and return the front token, lexing when the buffer is empty.
    pub fn next(&mut self) -> Token {
        self.fill(0);
        self.buf.pop_front().unwrap()
    }

    /// Current token without consuming it.
    pub fn peek(&mut self) -> &Token {
        self.fill(0);
        &self.buf[0]
    }

    /// Token at offset `k` from the front, lexing forward as needed.
    pub fn peek_at(&mut self, k: usize) -> &Token {
        self.fill(k);
        &self.buf[k]
    }

    /// Return a consumed token to the front of the stream.
    pub fn put_back(&mut self, tok: Token) {
        self.buf.push_front(tok);
    }

    // ---- helpers -------------------------------------------------------

    pub fn at(&mut self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    pub fn eat(&mut self, kind: &TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.next())
        } else {
            None
        }
    }

    /// Consume a token of the wanted kind or log a syntax error (without
    /// consuming the offending token).
    pub fn expect(&mut self, kind: &TokenKind, what: &str) -> Option<Token> {
        if self.at(kind) {
            Some(self.next())
        } else {
            let found = self.peek().clone();
            self.syntax_err(
                found.loc(),
                format!("expected {}, found {}", what, found.describe()),
            );
            None
        }
    }

    pub fn syntax_err(&mut self, loc: Loc, msg: impl Into<String>) {
        self.log.error(ErrorClass::Syntax, loc, msg);
    }

    /// Report the current token as unusable. Unknown bytes surface here as
    /// lexical errors; everything else is a syntax error.
    pub fn err_at_current(&mut self, msg: &str) {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Unknown(b) => {
                let shown = if b.is_ascii_graphic() {
                    format!("'{}'", b as char)
                } else {
                    format!("0x{:02x}", b)
                };
                self.log.error(
                    ErrorClass::Lexical,
                    tok.loc(),
                    format!("unrecognised character {}", shown),
                );
            }
            _ => {
                self.syntax_err(tok.loc(), format!("{}, found {}", msg, tok.describe()));
            }
        }
    }

    /// Parse a type keyword. Logs and returns None on anything else.
    pub fn parse_type_spec(&mut self) -> Option<(TypeSpec, Token)> {
        let tok = self.peek().clone();
        let spec = match tok.kind {
            TokenKind::KwInt => TypeSpec::Int,
            TokenKind::KwFloat => TypeSpec::Float,
            TokenKind::KwBool => TypeSpec::Bool,
            TokenKind::KwVoid => TypeSpec::Void,
            _ => {
                self.syntax_err(
                    tok.loc(),
                    format!(
                        "expected 'int', 'float', 'bool' or 'void', found {}",
                        tok.describe()
                    ),
                );
                return None;
            }
        };
        self.next();
        Some((spec, tok))
    }

    /// Skip to a likely declaration boundary after a syntax error: past the
    /// next `;`, past a balanced `}`, or up to the next declaration keyword.
    fn sync_top_level(&mut self) {
        let mut depth = 0i32;
        loop {
            if self.peek().is_eof() {
                return;
            }
            if depth == 0
                && (self.peek().is_type_keyword()
                    || matches!(self.peek().kind, TokenKind::KwExtern))
            {
                return;
            }
            let t = self.next();
            match t.kind {
                TokenKind::Semicolon if depth == 0 => return,
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    if depth <= 1 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
    }

    /// Produce the next top-level declaration, or None at end of input.
    /// Broken declarations are skipped after logging; the caller lowers each
    /// returned item immediately.
    pub fn parse_top_level(&mut self) -> Option<Item> {
        loop {
            if self.peek().is_eof() {
                return None;
            }

            if self.at(&TokenKind::KwExtern) {
                if self.seen_decl {
                    let loc = self.peek().loc();
                    self.syntax_err(loc, "extern declarations must precede all other declarations");
                }
                match decl::parse_extern(self) {
                    Some(proto) => {
                        debug::parser(&format!("parsed extern declaration '{}'", proto.name));
                        return Some(Item::Extern(proto));
                    }
                    None => {
                        self.sync_top_level();
                        continue;
                    }
                }
            }

            if self.peek().is_type_keyword() {
                self.seen_decl = true;
                match decl::parse_decl(self) {
                    Some(item) => {
                        debug::parser(&format!("parsed top-level declaration '{}'", item.name()));
                        return Some(item);
                    }
                    None => {
                        self.sync_top_level();
                        continue;
                    }
                }
            }

            // Not a declaration starter. Report it, consume it so the loop
            // advances, and carry on.
            self.err_at_current("expected 'extern', 'int', 'float', 'bool' or 'void' at top level");
            self.next();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinOp, ExprKind, UnOp};

    fn parse_expression(src: &str) -> (Option<crate::ast::Expr>, DiagLog) {
        let mut p = Parser::new(src);
        let e = expr::parse_expr(&mut p);
        (e, p.log)
    }

    #[test]
    fn token_buffer_next_peek_put_back() {
        let mut p = Parser::new("a b c");
        assert_eq!(p.peek().lexeme, "a");
        assert_eq!(p.peek_at(1).lexeme, "b");
        assert_eq!(p.peek_at(2).lexeme, "c");
        let a = p.next();
        assert_eq!(a.lexeme, "a");
        assert_eq!(p.peek().lexeme, "b");
        p.put_back(a);
        assert_eq!(p.peek().lexeme, "a");
        assert_eq!(p.peek_at(3).kind, TokenKind::Eof);
    }

    #[test]
    fn peek_is_unbounded_and_sticks_at_eof() {
        let mut p = Parser::new("x");
        assert_eq!(p.peek_at(7).kind, TokenKind::Eof);
        assert_eq!(p.peek_at(2).kind, TokenKind::Eof);
    }

    #[test]
    fn ll2_assignment_requires_eq_after_ident() {
        let (e, log) = parse_expression("x = 1");
        assert!(!log.has_errors());
        assert!(matches!(e.unwrap().kind, ExprKind::Assign { .. }));

        let (e, log) = parse_expression("x + 1");
        assert!(!log.has_errors());
        assert!(matches!(e.unwrap().kind, ExprKind::Binary { .. }));

        let (e, log) = parse_expression("x == 1");
        assert!(!log.has_errors());
        match e.unwrap().kind {
            ExprKind::Binary { op, .. } => assert_eq!(op, BinOp::Eq),
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn nested_assignment_is_right_associative() {
        let (e, log) = parse_expression("a = b = 1");
        assert!(!log.has_errors());
        match e.unwrap().kind {
            ExprKind::Assign { name, value } => {
                assert_eq!(name, "a");
                assert!(matches!(value.kind, ExprKind::Assign { .. }));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn array_access_promotes_to_array_assignment() {
        let (e, log) = parse_expression("a[i] = 3");
        assert!(!log.has_errors());
        match e.unwrap().kind {
            ExprKind::ArrayAssign { target, .. } => {
                assert!(target.is_array_access());
            }
            other => panic!("expected array assignment, got {:?}", other),
        }
    }

    #[test]
    fn precedence_ladder_shape() {
        // a || b && c == d < e + f * g
        // parses as a || (b && (c == (d < (e + (f * g)))))
        let (e, log) = parse_expression("a || b && c == d < e + f * g");
        assert!(!log.has_errors());
        let e = e.unwrap();
        let (op, rhs) = match e.kind {
            ExprKind::Binary { op, rhs, .. } => (op, rhs),
            other => panic!("{:?}", other),
        };
        assert_eq!(op, BinOp::Or);
        let (op, rhs) = match rhs.kind {
            ExprKind::Binary { op, rhs, .. } => (op, rhs),
            other => panic!("{:?}", other),
        };
        assert_eq!(op, BinOp::And);
        let (op, rhs) = match rhs.kind {
            ExprKind::Binary { op, rhs, .. } => (op, rhs),
            other => panic!("{:?}", other),
        };
        assert_eq!(op, BinOp::Eq);
        let (op, rhs) = match rhs.kind {
            ExprKind::Binary { op, rhs, .. } => (op, rhs),
            other => panic!("{:?}", other),
        };
        assert_eq!(op, BinOp::Lt);
        let (op, rhs) = match rhs.kind {
            ExprKind::Binary { op, rhs, .. } => (op, rhs),
            other => panic!("{:?}", other),
        };
        assert_eq!(op, BinOp::Add);
        let op = match rhs.kind {
            ExprKind::Binary { op, .. } => op,
            other => panic!("{:?}", other),
        };
        assert_eq!(op, BinOp::Mul);
    }

    #[test]
    fn same_level_operators_are_left_associative() {
        // a - b - c parses as (a - b) - c
        let (e, log) = parse_expression("a - b - c");
        assert!(!log.has_errors());
        match e.unwrap().kind {
            ExprKind::Binary { op, lhs, rhs } => {
                assert_eq!(op, BinOp::Sub);
                assert!(matches!(lhs.kind, ExprKind::Binary { op: BinOp::Sub, .. }));
                assert!(matches!(rhs.kind, ExprKind::Var(_)));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn unary_is_right_associative_by_recursion() {
        // -!x parses as -(!x)
        let (e, log) = parse_expression("-!x");
        assert!(!log.has_errors());
        match e.unwrap().kind {
            ExprKind::Unary { op, operand } => {
                assert_eq!(op, UnOp::Neg);
                match operand.kind {
                    ExprKind::Unary { op, .. } => assert_eq!(op, UnOp::Not),
                    other => panic!("{:?}", other),
                }
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn call_and_subscript_parse_from_primary() {
        let (e, log) = parse_expression("f(1, g(2), a[3])");
        assert!(!log.has_errors());
        match e.unwrap().kind {
            ExprKind::Call { callee, args } => {
                assert_eq!(callee, "f");
                assert_eq!(args.len(), 3);
                assert!(matches!(args[1].kind, ExprKind::Call { .. }));
                assert!(matches!(args[2].kind, ExprKind::ArrayIndex { .. }));
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn four_dimensional_access_is_rejected() {
        let (_, log) = parse_expression("a[1][2][3][4]");
        assert!(log.has_errors());
        let msg = log.iter().next().unwrap().message.clone();
        assert!(msg.contains("3 dimensions"), "{msg}");
    }

    #[test]
    fn unknown_byte_is_a_lexical_error() {
        let (_, log) = parse_expression("@");
        assert!(log.has_errors());
        let d = log.iter().next().unwrap();
        assert_eq!(d.class, ErrorClass::Lexical);
        assert!(d.message.contains("unrecognised character"), "{}", d.message);
    }

    // ---- declarations --------------------------------------------------

    fn parse_items(src: &str) -> (Vec<Item>, DiagLog) {
        let mut p = Parser::new(src);
        let mut items = Vec::new();
        while let Some(item) = p.parse_top_level() {
            items.push(item);
        }
        (items, p.log)
    }

    #[test]
    fn extern_parses_into_a_prototype() {
        let (items, log) = parse_items("extern float pow2(float x);");
        assert!(!log.has_errors());
        assert_eq!(items.len(), 1);
        match &items[0] {
            Item::Extern(proto) => {
                assert_eq!(proto.name, "pow2");
                assert_eq!(proto.ret, TypeSpec::Float);
                assert_eq!(proto.params.len(), 1);
                assert_eq!(proto.params[0].name, "x");
            }
            other => panic!("expected extern, got {:?}", other),
        }
    }

    #[test]
    fn void_parameter_list_means_no_parameters() {
        let (items, log) = parse_items("int f(void) { return 0; }");
        assert!(!log.has_errors());
        match &items[0] {
            Item::Function(def) => assert!(def.proto.params.is_empty()),
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn prototype_and_definition_are_distinct_items() {
        let (items, log) = parse_items("int f(int a);\nint f(int a) { return a; }");
        assert!(!log.has_errors());
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Item::Proto(_)));
        assert!(matches!(items[1], Item::Function(_)));
    }

    #[test]
    fn global_variable_and_array_items() {
        let (items, log) = parse_items("int g;\nfloat m[4][2];");
        assert!(!log.has_errors());
        assert!(matches!(items[0], Item::GlobalVar { .. }));
        match &items[1] {
            Item::GlobalArray { dims, ty, .. } => {
                assert_eq!(dims, &vec![4, 2]);
                assert_eq!(*ty, TypeSpec::Float);
            }
            other => panic!("expected global array, got {:?}", other),
        }
    }

    #[test]
    fn array_parameter_keeps_inner_dimensions_after_decay() {
        let (items, log) = parse_items("int f(int a[10][5]) { return 0; }");
        assert!(!log.has_errors());
        match &items[0] {
            Item::Function(def) => {
                let p = &def.proto.params[0];
                assert!(p.is_array());
                assert_eq!(p.inner_dims(), vec![5]);
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn unsized_array_parameter_is_accepted() {
        let (items, log) = parse_items("int f(int a[]) { return 0; }");
        assert!(!log.has_errors());
        match &items[0] {
            Item::Function(def) => {
                assert!(def.proto.params[0].is_array());
                assert!(def.proto.params[0].inner_dims().is_empty());
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn void_global_variable_is_rejected() {
        let (_, log) = parse_items("void g;\nint main() { return 0; }");
        assert!(log.has_errors());
        let msg = &log.iter().next().unwrap().message;
        assert!(msg.contains("'void'"), "{msg}");
    }

    #[test]
    fn while_body_can_be_a_bare_statement() {
        let (items, log) = parse_items("int main() { int i; while (i < 3) i = i + 1; return i; }");
        assert!(!log.has_errors());
        match &items[0] {
            Item::Function(def) => match &def.body.stmts[0] {
                crate::ast::Stmt::While { body, .. } => {
                    assert!(matches!(**body, crate::ast::Stmt::Expr(_)));
                }
                other => panic!("expected while, got {:?}", other),
            },
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn block_separates_declarations_from_statements() {
        let (items, log) = parse_items("int main() { int a; float b; a = 1; return a; }");
        assert!(!log.has_errors());
        match &items[0] {
            Item::Function(def) => {
                assert_eq!(def.body.decls.len(), 2);
                assert_eq!(def.body.stmts.len(), 2);
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn broken_declaration_is_skipped_and_parsing_resumes() {
        let (items, log) = parse_items("int 5;\nint main() { return 0; }");
        assert!(log.has_errors());
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Item::Function(_)));
    }
}
