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

// Expression parsing: LL(2) assignment disambiguation on top of a
// left-associative precedence ladder.

use crate::ast::{BinOp, Expr, ExprKind, UnOp};
use crate::debug;
use crate::token::TokenKind;

use super::Parser;

/// expr ::= IDENT "=" expr | array_access "=" expr | or_expr
///
/// When the current token is an identifier, one extra token of lookahead
/// decides assignment vs. expression. An `or_expr` that turns out to be a
/// subscript followed by `=` is promoted to an array assignment.
pub fn parse_expr(p: &mut Parser) -> Option<Expr> {
    if matches!(p.peek().kind, TokenKind::Ident(_))
        && matches!(p.peek_at(1).kind, TokenKind::Assign)
    {
        let name_tok = p.next();
        let name = name_tok.ident().to_string();
        debug::parser_at(
            &format!("parsing assignment to variable '{}'", name),
            name_tok.line,
            name_tok.col,
        );
        p.next(); // '='
        let value = parse_expr(p)?;
        return Some(Expr::new(
            ExprKind::Assign {
                name,
                value: Box::new(value),
            },
            name_tok.loc(),
        ));
    }

    let lhs = parse_or_expr(p)?;
    if lhs.is_array_access() && p.at(&TokenKind::Assign) {
        p.next(); // '='
        let loc = lhs.loc;
        let value = parse_expr(p)?;
        return Some(Expr::new(
            ExprKind::ArrayAssign {
                target: Box::new(lhs),
                value: Box::new(value),
            },
            loc,
        ));
    }
    Some(lhs)
}

fn parse_or_expr(p: &mut Parser) -> Option<Expr> {
    let mut e = parse_and_expr(p)?;
    loop {
        if p.eat(&TokenKind::PipePipe).is_some() {
            let rhs = parse_and_expr(p)?;
            let loc = e.loc;
            e = Expr::new(
                ExprKind::Binary {
                    op: BinOp::Or,
                    lhs: Box::new(e),
                    rhs: Box::new(rhs),
                },
                loc,
            );
        } else {
            break;
        }
    }
    Some(e)
}

fn parse_and_expr(p: &mut Parser) -> Option<Expr> {
    let mut e = parse_eq_expr(p)?;
    loop {
        if p.eat(&TokenKind::AmpAmp).is_some() {
            let rhs = parse_eq_expr(p)?;
            let loc = e.loc;
            e = Expr::new(
                ExprKind::Binary {
                    op: BinOp::And,
                    lhs: Box::new(e),
                    rhs: Box::new(rhs),
                },
                loc,
            );
        } else {
            break;
        }
    }
    Some(e)
}

fn parse_eq_expr(p: &mut Parser) -> Option<Expr> {
    let mut e = parse_rel_expr(p)?;
    loop {
        let op = if p.eat(&TokenKind::EqEq).is_some() {
            BinOp::Eq
        } else if p.eat(&TokenKind::NotEq).is_some() {
            BinOp::Ne
        } else {
            break;
        };
        let rhs = parse_rel_expr(p)?;
        let loc = e.loc;
        e = Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(e),
                rhs: Box::new(rhs),
            },
            loc,
        );
    }
    Some(e)
}

fn parse_rel_expr(p: &mut Parser) -> Option<Expr> {
    let mut e = parse_add_expr(p)?;
    loop {
        let op = if p.eat(&TokenKind::Le).is_some() {
            BinOp::Le
        } else if p.eat(&TokenKind::Ge).is_some() {
            BinOp::Ge
        } else if p.eat(&TokenKind::Lt).is_some() {
            BinOp::Lt
        } else if p.eat(&TokenKind::Gt).is_some() {
            BinOp::Gt
        } else {
            break;
        };
        let rhs = parse_add_expr(p)?;
        let loc = e.loc;
        e = Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(e),
                rhs: Box::new(rhs),
            },
            loc,
        );
    }
    Some(e)
}

fn parse_add_expr(p: &mut Parser) -> Option<Expr> {
    let mut e = parse_mul_expr(p)?;
    loop {
        let op = if p.eat(&TokenKind::Plus).is_some() {
            BinOp::Add
        } else if p.eat(&TokenKind::Minus).is_some() {
            BinOp::Sub
        } else {
            break;
        };
        let rhs = parse_mul_expr(p)?;
        let loc = e.loc;
        e = Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(e),
                rhs: Box::new(rhs),
            },
            loc,
        );
    }
    Some(e)
}

fn parse_mul_expr(p: &mut Parser) -> Option<Expr> {
    let mut e = parse_unary_expr(p)?;
    loop {
        let op = if p.eat(&TokenKind::Star).is_some() {
            BinOp::Mul
        } else if p.eat(&TokenKind::Slash).is_some() {
            BinOp::Div
        } else if p.eat(&TokenKind::Percent).is_some() {
            BinOp::Mod
        } else {
            break;
        };
        let rhs = parse_unary_expr(p)?;
        let loc = e.loc;
        e = Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(e),
                rhs: Box::new(rhs),
            },
            loc,
        );
    }
    Some(e)
}

// unary_expr ::= "-" unary_expr | "!" unary_expr | primary_expr
fn parse_unary_expr(p: &mut Parser) -> Option<Expr> {
    if let Some(tok) = p.eat(&TokenKind::Minus) {
        let operand = parse_unary_expr(p)?;
        return Some(Expr::new(
            ExprKind::Unary {
                op: UnOp::Neg,
                operand: Box::new(operand),
            },
            tok.loc(),
        ));
    }
    if let Some(tok) = p.eat(&TokenKind::Not) {
        let operand = parse_unary_expr(p)?;
        return Some(Expr::new(
            ExprKind::Unary {
                op: UnOp::Not,
                operand: Box::new(operand),
            },
            tok.loc(),
        ));
    }
    parse_primary(p)
}

// primary ::= "(" expr ")" | IDENT ("(" args ")")? | array_access | literal
fn parse_primary(p: &mut Parser) -> Option<Expr> {
    let tok = p.peek().clone();
    match &tok.kind {
        TokenKind::LParen => {
            p.next();
            let e = parse_expr(p)?;
            p.expect(&TokenKind::RParen, "')'")?;
            Some(e)
        }
        TokenKind::Ident(_) => {
            let name_tok = p.next();
            let name = name_tok.ident().to_string();

            if p.at(&TokenKind::LParen) {
                p.next(); // '('
                let args = parse_call_args(p)?;
                p.expect(&TokenKind::RParen, "')' after arguments")?;
                return Some(Expr::new(
                    ExprKind::Call { callee: name, args },
                    name_tok.loc(),
                ));
            }

            if p.at(&TokenKind::LBracket) {
                let indices = parse_subscripts(p)?;
                return Some(Expr::new(
                    ExprKind::ArrayIndex { name, indices },
                    name_tok.loc(),
                ));
            }

            Some(Expr::new(ExprKind::Var(name), name_tok.loc()))
        }
        TokenKind::IntLit(_) => {
            let t = p.next();
            Some(Expr::new(ExprKind::IntLit(t.int_val()), t.loc()))
        }
        TokenKind::FloatLit(_) => {
            let t = p.next();
            Some(Expr::new(ExprKind::FloatLit(t.float_val()), t.loc()))
        }
        TokenKind::BoolLit(_) => {
            let t = p.next();
            Some(Expr::new(ExprKind::BoolLit(t.bool_val()), t.loc()))
        }
        _ => {
            p.err_at_current("expected expression");
            None
        }
    }
}

fn parse_call_args(p: &mut Parser) -> Option<Vec<Expr>> {
    let mut args = Vec::new();
    if p.at(&TokenKind::RParen) {
        return Some(args);
    }
    args.push(parse_expr(p)?);
    while p.eat(&TokenKind::Comma).is_some() {
        args.push(parse_expr(p)?);
    }
    Some(args)
}

// array_access ::= IDENT "[" expr "]" ("[" expr "]")? ("[" expr "]")?
fn parse_subscripts(p: &mut Parser) -> Option<Vec<Expr>> {
    let mut indices = Vec::new();
    while p.at(&TokenKind::LBracket) {
        if indices.len() == 3 {
            let loc = p.peek().loc();
            p.syntax_err(loc, "arrays with more than 3 dimensions are not supported");
            return None;
        }
        p.next(); // '['
        let idx = parse_expr(p)?;
        indices.push(idx);
        p.expect(&TokenKind::RBracket, "']' after array index")?;
    }
    Some(indices)
}
