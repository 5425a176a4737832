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

use crate::ast::Loc;
use crate::error::internal_error;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Literals
    IntLit(i32),
    FloatLit(f32),
    BoolLit(bool),

    // Identifiers and keywords (keywords are distinguished by kind)
    Ident(String),
    KwInt,
    KwFloat,
    KwBool,
    KwVoid,
    KwExtern,
    KwIf,
    KwElse,
    KwWhile,
    KwReturn,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Assign, // =
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Not,

    // Multi-character operators
    EqEq,  // ==
    NotEq, // !=
    Lt,
    Le, // <=
    Gt,
    Ge,       // >=
    AmpAmp,   // &&
    PipePipe, // ||

    Eof,

    /// A byte the lexer does not recognise, carried through so the parser can
    /// report it where it is encountered.
    Unknown(u8),
}

#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
    /// Column of the first character of the lexeme, 1-based.
    pub col: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32, col: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            col,
        }
    }

    pub fn loc(&self) -> Loc {
        Loc {
            line: self.line,
            col: self.col,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// True for the keywords that can start a declaration.
    pub fn is_type_keyword(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::KwInt | TokenKind::KwFloat | TokenKind::KwBool | TokenKind::KwVoid
        )
    }

    /// Get the string for an identifier token.
    pub fn ident(&self) -> &str {
        match &self.kind {
            TokenKind::Ident(s) => s,
            _ => internal_error("ident() called on wrong token kind"),
        }
    }

    pub fn int_val(&self) -> i32 {
        match self.kind {
            TokenKind::IntLit(v) => v,
            _ => internal_error("int_val() called on wrong token kind"),
        }
    }

    pub fn float_val(&self) -> f32 {
        match self.kind {
            TokenKind::FloatLit(v) => v,
            _ => internal_error("float_val() called on wrong token kind"),
        }
    }

    pub fn bool_val(&self) -> bool {
        match self.kind {
            TokenKind::BoolLit(v) => v,
            _ => internal_error("bool_val() called on wrong token kind"),
        }
    }

    /// Human-readable token description for diagnostics.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Unknown(b) => {
                if b.is_ascii_graphic() {
                    format!("'{}'", *b as char)
                } else {
                    format!("byte 0x{:02x}", b)
                }
            }
            _ => format!("'{}'", self.lexeme),
        }
    }
}
