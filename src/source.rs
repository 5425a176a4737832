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

/// Source code for a file, split into lines for diagnostic echo.
pub struct Source<'a> {
    pub text: &'a str,
    line_starts: Vec<usize>, // byte offsets
}

impl<'a> Source<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0usize];
        for (i, b) in text.as_bytes().iter().enumerate() {
            if *b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { text, line_starts }
    }

    /// Get the text for a 1-based line, without its terminator.
    pub fn line_text(&self, line_1: usize) -> Option<&'a str> {
        if line_1 == 0 || line_1 > self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line_1 - 1];
        let end = self
            .line_starts
            .get(line_1)
            .copied()
            .unwrap_or(self.text.len());
        let mut end2 = end;
        if end2 > start && self.text.as_bytes()[end2 - 1] == b'\n' {
            end2 -= 1;
            if end2 > start && self.text.as_bytes()[end2 - 1] == b'\r' {
                end2 -= 1;
            }
        }
        Some(&self.text[start..end2])
    }

    /// Padding that aligns a caret under a 1-based column. Tabs in the echoed
    /// line are preserved so the caret stays roughly aligned.
    pub fn caret_pad(line: &str, col_1: usize) -> String {
        let mut out = String::new();
        let mut cur = 1usize;
        for ch in line.chars() {
            if cur >= col_1 {
                break;
            }
            out.push(if ch == '\t' { '\t' } else { ' ' });
            cur += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_text_strips_terminators() {
        let s = Source::new("one\ntwo\r\nthree");
        assert_eq!(s.line_text(1), Some("one"));
        assert_eq!(s.line_text(2), Some("two"));
        assert_eq!(s.line_text(3), Some("three"));
        assert_eq!(s.line_text(4), None);
        assert_eq!(s.line_text(0), None);
    }

    #[test]
    fn caret_pad_alignment() {
        assert_eq!(Source::caret_pad("abcdef", 4), "   ");
        assert_eq!(Source::caret_pad("\tx", 2), "\t");
        assert_eq!(Source::caret_pad("x", 1), "");
    }
}
