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

// Compilation orchestration: parsing and lowering are interleaved, one
// top-level declaration at a time.

use crate::ast::Loc;
use crate::debug;
use crate::error::{DiagLog, ErrorClass};
use crate::ir;
use crate::lower;
use crate::parse::Parser;
use crate::symtab::SymbolTable;

pub struct CompileResult {
    pub module: ir::Module,
    pub log: DiagLog,
}

impl CompileResult {
    pub fn succeeded(&self) -> bool {
        !self.log.has_errors()
    }
}

/// Compile one source file into an IR module. Diagnostics accumulate; the
/// module is only meaningful when the log stayed empty.
pub fn compile(src: &str, path: &str) -> CompileResult {
    debug::user("starting lexical analysis / parsing");

    let mut parser = Parser::new(src);
    let mut module = ir::Module::new("mini-c", path);
    let mut sym = SymbolTable::new();

    // Parsing and lowering proceed declaration by declaration: each item is
    // handed to lowering before the next one is parsed.
    while let Some(item) = parser.parse_top_level() {
        lower::lower_item(&item, &mut module, &mut sym, &mut parser.log);
    }
    debug::user("parsing finished");

    let mut log = parser.log;

    // A whole program needs an entry point; only checked when the
    // declarations themselves were clean.
    if !log.has_errors() && module.get_function("main").is_none() {
        log.error_with(
            ErrorClass::Semantic,
            Loc::none(),
            "program must have a 'main' function",
            Some("entry point 'main' is required".to_string()),
            None,
        );
    }

    debug::user("code generation finished");
    CompileResult { module, log }
}
