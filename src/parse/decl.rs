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

// Top-level declarations: externs, globals, prototypes and functions.

use crate::ast::{FnDef, FnProto, Item, Param, TypeSpec};
use crate::token::TokenKind;

use super::{stmt, Parser};

// extern ::= "extern" type IDENT "(" params ")" ";"
pub fn parse_extern(p: &mut Parser) -> Option<FnProto> {
    p.next(); // 'extern'
    let (ret, _) = p.parse_type_spec()?;
    let name_tok = p.expect(
        &TokenKind::Ident(String::new()),
        "identifier in extern declaration",
    )?;
    let name = name_tok.ident().to_string();

    p.expect(&TokenKind::LParen, "'(' in extern function declaration")?;
    let params = parse_params(p)?;
    p.expect(&TokenKind::RParen, "')' closing extern function declaration")?;
    p.expect(&TokenKind::Semicolon, "';' ending extern function declaration")?;

    Some(FnProto {
        name,
        ret,
        params,
        loc: name_tok.loc(),
    })
}

// decl ::= type IDENT (";" | "[" dims "]" ";" | "(" params ")" (block | ";"))
pub fn parse_decl(p: &mut Parser) -> Option<Item> {
    let (ty, ty_tok) = p.parse_type_spec()?;
    let name_tok = p.expect(&TokenKind::Ident(String::new()), "identifier")?;
    let name = name_tok.ident().to_string();

    let tok = p.peek().clone();
    match tok.kind {
        TokenKind::Semicolon => {
            p.next();
            if ty == TypeSpec::Void {
                p.syntax_err(
                    ty_tok.loc(),
                    "cannot have variable declaration with type 'void'",
                );
                return None;
            }
            Some(Item::GlobalVar {
                name,
                ty,
                loc: name_tok.loc(),
            })
        }
        TokenKind::LBracket => {
            let dims = parse_dims(p)?;
            p.expect(&TokenKind::Semicolon, "';' after array declaration")?;
            if ty == TypeSpec::Void {
                p.syntax_err(
                    ty_tok.loc(),
                    "cannot have array declaration with type 'void'",
                );
                return None;
            }
            Some(Item::GlobalArray {
                name,
                ty,
                dims,
                loc: name_tok.loc(),
            })
        }
        TokenKind::LParen => {
            p.next(); // '('
            let params = parse_params(p)?;
            p.expect(&TokenKind::RParen, "')' in function declaration")?;

            let proto = FnProto {
                name,
                ret: ty,
                params,
                loc: name_tok.loc(),
            };

            if p.eat(&TokenKind::Semicolon).is_some() {
                // Forward declaration; the body may follow later.
                return Some(Item::Proto(proto));
            }

            if !p.at(&TokenKind::LBrace) {
                let loc = p.peek().loc();
                p.syntax_err(loc, "expected '{' or ';' after function declaration");
                return None;
            }
            let body = stmt::parse_block(p)?;
            Some(Item::Function(FnDef { proto, body }))
        }
        _ => {
            p.syntax_err(
                tok.loc(),
                format!(
                    "expected ';', '[' or '(' after declared name, found {}",
                    tok.describe()
                ),
            );
            None
        }
    }
}

// params ::= "void" | param ("," param)* | ε
pub fn parse_params(p: &mut Parser) -> Option<Vec<Param>> {
    let mut params = Vec::new();

    if p.at(&TokenKind::RParen) {
        return Some(params);
    }
    if p.at(&TokenKind::KwVoid) && matches!(p.peek_at(1).kind, TokenKind::RParen) {
        p.next(); // 'void'
        return Some(params);
    }

    params.push(parse_param(p)?);
    while p.eat(&TokenKind::Comma).is_some() {
        params.push(parse_param(p)?);
    }
    Some(params)
}

// param ::= type IDENT ("[" INT_LIT? "]")*
fn parse_param(p: &mut Parser) -> Option<Param> {
    let (ty, ty_tok) = p.parse_type_spec()?;
    if ty == TypeSpec::Void {
        p.syntax_err(ty_tok.loc(), "parameter cannot have type 'void'");
        return None;
    }
    let name_tok = p.expect(
        &TokenKind::Ident(String::new()),
        "identifier in parameter declaration",
    )?;
    let name = name_tok.ident().to_string();

    // Array brackets decay to a pointer; sizes are optional here and the
    // leading one is discarded either way.
    let mut dims: Vec<Option<i32>> = Vec::new();
    while p.at(&TokenKind::LBracket) {
        if dims.len() == 3 {
            let loc = p.peek().loc();
            p.syntax_err(loc, "arrays with more than 3 dimensions are not supported");
            return None;
        }
        p.next(); // '['
        let size = if p.at(&TokenKind::IntLit(0)) {
            let t = p.next();
            Some(t.int_val())
        } else {
            None
        };
        dims.push(size);
        p.expect(&TokenKind::RBracket, "']' in parameter array declaration")?;
    }

    Some(Param {
        name,
        ty,
        dims,
        loc: name_tok.loc(),
    })
}

// dims ::= "[" INT_LIT "]" ("[" INT_LIT "]"){0,2}
// Each dimension must be an integer literal greater than zero.
pub fn parse_dims(p: &mut Parser) -> Option<Vec<i32>> {
    let mut dims = Vec::new();
    while p.at(&TokenKind::LBracket) {
        if dims.len() == 3 {
            let loc = p.peek().loc();
            p.syntax_err(loc, "arrays with more than 3 dimensions are not supported");
            return None;
        }
        p.next(); // '['
        let size_tok = p.expect(
            &TokenKind::IntLit(0),
            "integer literal for array dimension size",
        )?;
        let size = size_tok.int_val();
        if size <= 0 {
            p.syntax_err(size_tok.loc(), "array dimension must be greater than 0");
            return None;
        }
        dims.push(size);
        p.expect(&TokenKind::RBracket, "']' after array dimension")?;
    }
    Some(dims)
}
