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

use crate::token::{Token, TokenKind};

const KEYWORDS: &[(&str, TokenKind)] = &[
    ("int", TokenKind::KwInt),
    ("float", TokenKind::KwFloat),
    ("bool", TokenKind::KwBool),
    ("void", TokenKind::KwVoid),
    ("extern", TokenKind::KwExtern),
    ("if", TokenKind::KwIf),
    ("else", TokenKind::KwElse),
    ("while", TokenKind::KwWhile),
    ("return", TokenKind::KwReturn),
    ("true", TokenKind::BoolLit(true)),
    ("false", TokenKind::BoolLit(false)),
];

pub struct Lexer<'a> {
    src: &'a [u8],
    i: usize,
    line: u32,
    col: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            i: 0,
            line: 1,
            col: 1,
        }
    }

    fn eof(&self) -> bool {
        self.i >= self.src.len()
    }

    fn peek_byte(&self) -> Option<u8> {
        self.src.get(self.i).copied()
    }

    fn peek_byte_at(&self, k: usize) -> Option<u8> {
        self.src.get(self.i + k).copied()
    }

    fn bump_byte(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.i += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            while let Some(b) = self.peek_byte() {
                if b == b' ' || b == b'\t' || b == b'\n' || b == b'\r' {
                    self.bump_byte();
                } else {
                    break;
                }
            }

            // Line comment: // ... \n
            if self.peek_byte() == Some(b'/') && self.peek_byte_at(1) == Some(b'/') {
                self.bump_byte();
                self.bump_byte();
                while let Some(b) = self.peek_byte() {
                    if b == b'\n' || b == b'\r' {
                        break;
                    }
                    self.bump_byte();
                }
                continue;
            }

            break;
        }
    }

    fn is_ident_start(b: u8) -> bool {
        b == b'_' || b.is_ascii_alphabetic()
    }

    fn is_ident_continue(b: u8) -> bool {
        b == b'_' || b.is_ascii_alphanumeric()
    }

    fn lex_ident_or_kw(&mut self, line: u32, col: u32) -> Token {
        let mut s = String::new();
        while let Some(b) = self.peek_byte() {
            if !Self::is_ident_continue(b) {
                break;
            }
            s.push(b as char);
            self.bump_byte();
        }
        for (kw, kind) in KEYWORDS {
            if s == *kw {
                return Token::new(kind.clone(), s, line, col);
            }
        }
        Token::new(TokenKind::Ident(s.clone()), s, line, col)
    }

    // number ::= [0-9]+ | [0-9]+ "." [0-9]* | "." [0-9]*
    // A '.' with no trailing digit still lexes as a float literal.
    fn lex_number(&mut self, line: u32, col: u32) -> Token {
        let mut s = String::new();
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_digit() {
                s.push(b as char);
                self.bump_byte();
            } else {
                break;
            }
        }
        if self.peek_byte() == Some(b'.') {
            s.push('.');
            self.bump_byte();
            while let Some(b) = self.peek_byte() {
                if b.is_ascii_digit() {
                    s.push(b as char);
                    self.bump_byte();
                } else {
                    break;
                }
            }
            let v: f32 = s.parse().unwrap_or(0.0);
            return Token::new(TokenKind::FloatLit(v), s, line, col);
        }
        let v: i32 = s.parse().unwrap_or(i32::MAX);
        Token::new(TokenKind::IntLit(v), s, line, col)
    }

    /// Produce the next token. Total: never fails, and returns `Eof` forever
    /// once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_ws_and_comments();
        let (line, col) = (self.line, self.col);

        let b = match self.peek_byte() {
            Some(b) => b,
            None => return Token::new(TokenKind::Eof, "", line, col),
        };

        if Self::is_ident_start(b) {
            return self.lex_ident_or_kw(line, col);
        }
        if b.is_ascii_digit() || b == b'.' {
            return self.lex_number(line, col);
        }

        // Single-byte punctuation.
        let single = |kind: TokenKind, lexeme: &str| Token::new(kind, lexeme, line, col);
        match b {
            b'(' => {
                self.bump_byte();
                single(TokenKind::LParen, "(")
            }
            b')' => {
                self.bump_byte();
                single(TokenKind::RParen, ")")
            }
            b'{' => {
                self.bump_byte();
                single(TokenKind::LBrace, "{")
            }
            b'}' => {
                self.bump_byte();
                single(TokenKind::RBrace, "}")
            }
            b'[' => {
                self.bump_byte();
                single(TokenKind::LBracket, "[")
            }
            b']' => {
                self.bump_byte();
                single(TokenKind::RBracket, "]")
            }
            b';' => {
                self.bump_byte();
                single(TokenKind::Semicolon, ";")
            }
            b',' => {
                self.bump_byte();
                single(TokenKind::Comma, ",")
            }
            b'+' => {
                self.bump_byte();
                single(TokenKind::Plus, "+")
            }
            b'-' => {
                self.bump_byte();
                single(TokenKind::Minus, "-")
            }
            b'*' => {
                self.bump_byte();
                single(TokenKind::Star, "*")
            }
            b'%' => {
                self.bump_byte();
                single(TokenKind::Percent, "%")
            }
            // '/' here is always division: comments were consumed above.
            b'/' => {
                self.bump_byte();
                single(TokenKind::Slash, "/")
            }
            b'=' => {
                self.bump_byte();
                if self.peek_byte() == Some(b'=') {
                    self.bump_byte();
                    single(TokenKind::EqEq, "==")
                } else {
                    single(TokenKind::Assign, "=")
                }
            }
            b'!' => {
                self.bump_byte();
                if self.peek_byte() == Some(b'=') {
                    self.bump_byte();
                    single(TokenKind::NotEq, "!=")
                } else {
                    single(TokenKind::Not, "!")
                }
            }
            b'<' => {
                self.bump_byte();
                if self.peek_byte() == Some(b'=') {
                    self.bump_byte();
                    single(TokenKind::Le, "<=")
                } else {
                    single(TokenKind::Lt, "<")
                }
            }
            b'>' => {
                self.bump_byte();
                if self.peek_byte() == Some(b'=') {
                    self.bump_byte();
                    single(TokenKind::Ge, ">=")
                } else {
                    single(TokenKind::Gt, ">")
                }
            }
            b'&' => {
                self.bump_byte();
                if self.peek_byte() == Some(b'&') {
                    self.bump_byte();
                    single(TokenKind::AmpAmp, "&&")
                } else {
                    single(TokenKind::Unknown(b'&'), "&")
                }
            }
            b'|' => {
                self.bump_byte();
                if self.peek_byte() == Some(b'|') {
                    self.bump_byte();
                    single(TokenKind::PipePipe, "||")
                } else {
                    single(TokenKind::Unknown(b'|'), "|")
                }
            }
            _ => {
                // An unexpected byte becomes a token of its own; the parser
                // reports it where it turns up.
                self.bump_byte();
                Token::new(
                    TokenKind::Unknown(b),
                    String::from(b as char),
                    line,
                    col,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(src: &str) -> Vec<Token> {
        let mut lx = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let t = lx.next_token();
            let eof = t.is_eof();
            out.push(t);
            if eof {
                break;
            }
        }
        out
    }

    #[test]
    fn lex_simple_program() {
        let toks = lex_all("int main() { return 0; }");
        assert!(matches!(toks[0].kind, TokenKind::KwInt));
        assert!(matches!(toks[1].kind, TokenKind::Ident(_)));
        assert!(matches!(toks[2].kind, TokenKind::LParen));
        assert!(matches!(toks.last().unwrap().kind, TokenKind::Eof));
    }

    #[test]
    fn lex_keywords_and_bool_literals() {
        let toks = lex_all("extern if else while return true false bool void float");
        assert!(matches!(toks[0].kind, TokenKind::KwExtern));
        assert!(matches!(toks[1].kind, TokenKind::KwIf));
        assert!(matches!(toks[2].kind, TokenKind::KwElse));
        assert!(matches!(toks[3].kind, TokenKind::KwWhile));
        assert!(matches!(toks[4].kind, TokenKind::KwReturn));
        assert_eq!(toks[5].kind, TokenKind::BoolLit(true));
        assert_eq!(toks[6].kind, TokenKind::BoolLit(false));
        assert!(matches!(toks[7].kind, TokenKind::KwBool));
        assert!(matches!(toks[8].kind, TokenKind::KwVoid));
        assert!(matches!(toks[9].kind, TokenKind::KwFloat));
    }

    #[test]
    fn lex_maximal_munch_operators() {
        let toks = lex_all("== = != ! <= < >= > && ||");
        let kinds: Vec<&TokenKind> = toks.iter().map(|t| &t.kind).collect();
        assert!(matches!(kinds[0], TokenKind::EqEq));
        assert!(matches!(kinds[1], TokenKind::Assign));
        assert!(matches!(kinds[2], TokenKind::NotEq));
        assert!(matches!(kinds[3], TokenKind::Not));
        assert!(matches!(kinds[4], TokenKind::Le));
        assert!(matches!(kinds[5], TokenKind::Lt));
        assert!(matches!(kinds[6], TokenKind::Ge));
        assert!(matches!(kinds[7], TokenKind::Gt));
        assert!(matches!(kinds[8], TokenKind::AmpAmp));
        assert!(matches!(kinds[9], TokenKind::PipePipe));
    }

    #[test]
    fn lex_numbers() {
        let toks = lex_all("42 3.14 .5 7. 0");
        assert_eq!(toks[0].kind, TokenKind::IntLit(42));
        assert_eq!(toks[1].kind, TokenKind::FloatLit(3.14));
        assert_eq!(toks[2].kind, TokenKind::FloatLit(0.5));
        assert_eq!(toks[3].kind, TokenKind::FloatLit(7.0));
        assert_eq!(toks[4].kind, TokenKind::IntLit(0));
    }

    #[test]
    fn dot_alone_is_a_float_literal() {
        let toks = lex_all(".");
        assert!(matches!(toks[0].kind, TokenKind::FloatLit(_)));
        assert_eq!(toks[0].lexeme, ".");
    }

    #[test]
    fn lex_skips_line_comments() {
        let toks = lex_all("int x; // comment with ; and ==\nfloat y;");
        let kinds: Vec<&TokenKind> = toks.iter().map(|t| &t.kind).collect();
        assert!(matches!(kinds[0], TokenKind::KwInt));
        assert!(matches!(kinds[3], TokenKind::KwFloat));
    }

    #[test]
    fn slash_without_slash_is_division() {
        let toks = lex_all("a / b");
        assert!(matches!(toks[1].kind, TokenKind::Slash));
    }

    #[test]
    fn line_and_column_tracking() {
        let toks = lex_all("int x;\n  y = 1;");
        assert_eq!((toks[0].line, toks[0].col), (1, 1)); // int
        assert_eq!((toks[1].line, toks[1].col), (1, 5)); // x
        assert_eq!((toks[2].line, toks[2].col), (1, 6)); // ;
        assert_eq!((toks[3].line, toks[3].col), (2, 3)); // y
        assert_eq!((toks[4].line, toks[4].col), (2, 5)); // =
    }

    #[test]
    fn column_points_at_first_character_of_lexeme() {
        let toks = lex_all("abc <= 12");
        assert_eq!(toks[0].col, 1);
        assert_eq!(toks[1].col, 5);
        assert_eq!(toks[2].col, 8);
    }

    #[test]
    fn unknown_bytes_become_tokens_and_lexing_terminates() {
        let toks = lex_all("int @ $ x # 1");
        assert!(toks
            .iter()
            .any(|t| matches!(t.kind, TokenKind::Unknown(b'@'))));
        assert!(toks
            .iter()
            .any(|t| matches!(t.kind, TokenKind::Unknown(b'$'))));
        assert!(toks
            .iter()
            .any(|t| matches!(t.kind, TokenKind::Unknown(b'#'))));
        assert!(matches!(toks.last().unwrap().kind, TokenKind::Eof));
    }

    #[test]
    fn lone_ampersand_and_pipe_are_unknown() {
        let toks = lex_all("a & b | c");
        assert!(matches!(toks[1].kind, TokenKind::Unknown(b'&')));
        assert!(matches!(toks[3].kind, TokenKind::Unknown(b'|')));
    }

    #[test]
    fn eof_is_sticky() {
        let mut lx = Lexer::new("x");
        assert!(matches!(lx.next_token().kind, TokenKind::Ident(_)));
        assert!(lx.next_token().is_eof());
        assert!(lx.next_token().is_eof());
        assert!(lx.next_token().is_eof());
    }

    #[test]
    fn lexer_is_total_on_arbitrary_bytes() {
        let src = "\u{7f}\t\r\n\\\"'~`^?:@";
        let toks = lex_all(src);
        assert!(matches!(toks.last().unwrap().kind, TokenKind::Eof));
    }
}
