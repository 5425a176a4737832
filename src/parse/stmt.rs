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

// Statement and block parsing.

use crate::ast::{Block, LocalDecl, Stmt, TypeSpec};
use crate::debug;
use crate::token::TokenKind;

use super::{decl, Parser};

// block ::= "{" local_decls stmt_list "}"
pub fn parse_block(p: &mut Parser) -> Option<Block> {
    p.expect(&TokenKind::LBrace, "'{'")?;

    let mut decls: Vec<LocalDecl> = Vec::new();
    while p.peek().is_type_keyword() {
        match parse_local_decl(p) {
            Some(d) => decls.push(d),
            None => sync_stmt(p),
        }
    }

    let mut stmts: Vec<Stmt> = Vec::new();
    loop {
        if p.at(&TokenKind::RBrace) {
            p.next();
            break;
        }
        if p.peek().is_eof() {
            let loc = p.peek().loc();
            p.syntax_err(loc, "expected '}' to close block, found end of file");
            return None;
        }
        if p.peek().is_type_keyword() {
            // Declarations after the first statement; report and keep going
            // so the rest of the block still parses.
            let loc = p.peek().loc();
            p.syntax_err(loc, "local declarations must precede statements in a block");
            match parse_local_decl(p) {
                Some(d) => decls.push(d),
                None => sync_stmt(p),
            }
            continue;
        }
        match parse_stmt(p) {
            Some(s) => stmts.push(s),
            None => sync_stmt(p),
        }
    }

    Some(Block { decls, stmts })
}

// local_decl ::= var_type IDENT (";" | "[" dims "]" ";")
fn parse_local_decl(p: &mut Parser) -> Option<LocalDecl> {
    let (ty, ty_tok) = p.parse_type_spec()?;
    if ty == TypeSpec::Void {
        p.syntax_err(ty_tok.loc(), "cannot declare a variable of type 'void'");
        return None;
    }
    let name_tok = p.expect(&TokenKind::Ident(String::new()), "identifier")?;
    let name = name_tok.ident().to_string();

    let dims = if p.at(&TokenKind::LBracket) {
        decl::parse_dims(p)?
    } else {
        Vec::new()
    };

    p.expect(&TokenKind::Semicolon, "';' after declaration")?;
    Some(LocalDecl {
        name,
        ty,
        dims,
        loc: name_tok.loc(),
    })
}

// stmt ::= expr_stmt | block | if_stmt | while_stmt | return_stmt
pub fn parse_stmt(p: &mut Parser) -> Option<Stmt> {
    let tok = p.peek().clone();
    match tok.kind {
        TokenKind::Semicolon => {
            // Stricter than C: an empty statement is rejected. Consume the
            // semicolon so parsing cannot loop on it.
            p.next();
            p.syntax_err(
                tok.loc(),
                "unexpected semicolon - empty statements are not allowed",
            );
            None
        }
        TokenKind::LBrace => parse_block(p).map(Stmt::Block),
        TokenKind::KwIf => parse_if_stmt(p),
        TokenKind::KwWhile => parse_while_stmt(p),
        TokenKind::KwReturn => parse_return_stmt(p),
        _ => parse_expr_stmt(p),
    }
}

// expr_stmt ::= expr ";"
fn parse_expr_stmt(p: &mut Parser) -> Option<Stmt> {
    let e = super::expr::parse_expr(p)?;
    if p.at(&TokenKind::Semicolon) {
        p.next();
        Some(Stmt::Expr(e))
    } else {
        // Missing terminator: report it and consume the offending token so
        // the statement loop makes progress.
        let bad = p.next();
        p.syntax_err(
            bad.loc(),
            format!(
                "expected ';' to end expression statement, found {}",
                bad.describe()
            ),
        );
        None
    }
}

// if_stmt ::= "if" "(" expr ")" block ("else" block)?
fn parse_if_stmt(p: &mut Parser) -> Option<Stmt> {
    let if_tok = p.next(); // 'if'
    debug::parser_at("parsing if statement", if_tok.line, if_tok.col);
    p.expect(&TokenKind::LParen, "'(' after 'if'")?;
    let cond = super::expr::parse_expr(p)?;

    let mut bad = false;
    if cond.is_assignment() {
        p.syntax_err(
            cond.loc,
            "assignment in condition is not allowed - use comparison (==) instead",
        );
        bad = true;
    }

    p.expect(&TokenKind::RParen, "')' after condition")?;
    if !p.at(&TokenKind::LBrace) {
        let loc = p.peek().loc();
        p.syntax_err(loc, "expected '{' to start then block of if statement");
        return None;
    }
    let then_block = parse_block(p)?;

    let else_block = if p.eat(&TokenKind::KwElse).is_some() {
        if !p.at(&TokenKind::LBrace) {
            let loc = p.peek().loc();
            p.syntax_err(loc, "expected '{' to start else block of if-else statement");
            return None;
        }
        Some(parse_block(p)?)
    } else {
        None
    };

    if bad {
        return None;
    }
    Some(Stmt::If {
        cond,
        then_block,
        else_block,
        loc: if_tok.loc(),
    })
}

// while_stmt ::= "while" "(" expr ")" stmt
fn parse_while_stmt(p: &mut Parser) -> Option<Stmt> {
    let while_tok = p.next(); // 'while'
    debug::parser_at("parsing while statement", while_tok.line, while_tok.col);
    p.expect(&TokenKind::LParen, "'(' after 'while'")?;
    let cond = super::expr::parse_expr(p)?;

    let mut bad = false;
    if cond.is_assignment() {
        p.syntax_err(
            cond.loc,
            "assignment in condition is not allowed - use comparison (==) instead",
        );
        bad = true;
    }

    p.expect(&TokenKind::RParen, "')' after condition")?;
    let body = parse_stmt(p)?;

    if bad {
        return None;
    }
    Some(Stmt::While {
        cond,
        body: Box::new(body),
        loc: while_tok.loc(),
    })
}

// return_stmt ::= "return" expr? ";"
fn parse_return_stmt(p: &mut Parser) -> Option<Stmt> {
    let ret_tok = p.next(); // 'return'
    debug::parser_at("parsing return statement", ret_tok.line, ret_tok.col);
    if p.eat(&TokenKind::Semicolon).is_some() {
        return Some(Stmt::Return {
            value: None,
            loc: ret_tok.loc(),
        });
    }
    let value = super::expr::parse_expr(p)?;
    if p.at(&TokenKind::Semicolon) {
        p.next();
        Some(Stmt::Return {
            value: Some(value),
            loc: ret_tok.loc(),
        })
    } else {
        let bad = p.next();
        p.syntax_err(
            bad.loc(),
            format!("expected ';' after return value, found {}", bad.describe()),
        );
        None
    }
}

/// Recover inside a block: skip to just past the next `;`, or stop before a
/// `}` / declaration keyword / EOF.
fn sync_stmt(p: &mut Parser) {
    loop {
        if p.peek().is_eof() || p.at(&TokenKind::RBrace) || p.peek().is_type_keyword() {
            return;
        }
        let t = p.next();
        if matches!(t.kind, TokenKind::Semicolon) {
            return;
        }
    }
}
