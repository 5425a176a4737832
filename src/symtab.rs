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

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::ast::Loc;
use crate::debug;
use crate::ir::Val;
use crate::types::SemType;

/// A variable binding: its semantic type plus the IR handle of its storage
/// (a global address or an entry-block alloca).
#[derive(Clone, Debug)]
pub struct VarSymbol {
    pub ty: SemType,
    pub ptr: Val,
}

#[derive(Clone, Debug)]
pub struct FuncSig {
    pub ret: SemType,
    pub params: Vec<SemType>,
    pub loc: Loc,
}

/// Entry of the typed symbol index, kept for diagnostics.
#[derive(Clone, Debug)]
pub struct SymbolInfo {
    pub type_name: String,
    pub is_global: bool,
    pub loc: Loc,
}

/// Shadow-stack record for one lexical block: the prior binding of every name
/// the block re-bound, plus the set of names declared directly in the block.
#[derive(Debug, Default)]
pub struct BlockScope {
    saved: Vec<(String, Option<VarSymbol>)>,
    declared: HashSet<String>,
}

impl BlockScope {
    pub fn declares(&self, name: &str) -> bool {
        self.declared.contains(name)
    }
}

/// Compile-wide symbol state: global variables, module functions, and the
/// flat local frame of the function currently being lowered.
#[derive(Debug, Default)]
pub struct SymbolTable {
    globals: IndexMap<String, VarSymbol>,
    functions: IndexMap<String, FuncSig>,
    locals: HashMap<String, VarSymbol>,
    params: HashSet<String>,
    info: HashMap<String, SymbolInfo>,
}

pub enum Resolved<'a> {
    Local(&'a VarSymbol),
    Global(&'a VarSymbol),
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- globals -------------------------------------------------------

    pub fn has_global(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }

    pub fn declare_global(&mut self, name: &str, sym: VarSymbol, loc: Loc) {
        self.info.insert(
            name.to_string(),
            SymbolInfo {
                type_name: sym.ty.to_string(),
                is_global: true,
                loc,
            },
        );
        self.globals.insert(name.to_string(), sym);
    }

    // ---- functions -----------------------------------------------------

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn function(&self, name: &str) -> Option<&FuncSig> {
        self.functions.get(name)
    }

    pub fn declare_function(&mut self, name: &str, sig: FuncSig) {
        self.functions.insert(name.to_string(), sig);
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(|s| s.as_str())
    }

    // ---- per-function locals ------------------------------------------

    /// Clear the local frame for a new function body.
    pub fn enter_function(&mut self) {
        self.locals.clear();
        self.params.clear();
    }

    /// Drop all locals when the function body is done.
    pub fn exit_function(&mut self) {
        for name in self.locals.keys() {
            self.info.remove(name);
        }
        self.locals.clear();
        self.params.clear();
    }

    pub fn declare_param(&mut self, name: &str, sym: VarSymbol, loc: Loc) {
        self.info.insert(
            name.to_string(),
            SymbolInfo {
                type_name: sym.ty.to_string(),
                is_global: false,
                loc,
            },
        );
        self.params.insert(name.to_string());
        self.locals.insert(name.to_string(), sym);
    }

    pub fn is_parameter(&self, name: &str) -> bool {
        self.params.contains(name)
    }

    pub fn enter_block(&mut self) -> BlockScope {
        BlockScope::default()
    }

    /// Bind a local, saving any shadowed outer binding in the scope record.
    pub fn declare_local(&mut self, scope: &mut BlockScope, name: &str, sym: VarSymbol, loc: Loc) {
        let old = self.locals.insert(name.to_string(), sym.clone());
        scope.saved.push((name.to_string(), old));
        scope.declared.insert(name.to_string());
        self.info.insert(
            name.to_string(),
            SymbolInfo {
                type_name: sym.ty.to_string(),
                is_global: false,
                loc,
            },
        );
    }

    /// Restore the bindings the block shadowed and drop the ones it created.
    pub fn exit_block(&mut self, scope: BlockScope) {
        for (name, old) in scope.saved.into_iter().rev() {
            match old {
                Some(sym) => {
                    self.locals.insert(name, sym);
                }
                None => {
                    self.locals.remove(&name);
                    self.info.remove(&name);
                }
            }
        }
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.locals.contains_key(name)
    }

    /// Resolve a name: innermost local binding first, then globals.
    pub fn resolve(&self, name: &str) -> Option<Resolved<'_>> {
        if let Some(sym) = self.locals.get(name) {
            return Some(Resolved::Local(sym));
        }
        if let Some(sym) = self.globals.get(name) {
            return Some(Resolved::Global(sym));
        }
        None
    }

    /// Names visible as variables, for "did you mean" suggestions.
    pub fn visible_var_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.locals.keys().cloned().collect();
        names.extend(self.globals.keys().cloned());
        names
    }

    pub fn live_local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.locals.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn symbol_info(&self, name: &str) -> Option<&SymbolInfo> {
        self.info.get(name)
    }

    /// Verbose-level dump of the typed symbol index.
    pub fn dump(&self) {
        debug::verbose("symbol table:");
        for (name, info) in &self.info {
            debug::verbose(&format!(
                "  {} : {} ({})",
                name,
                info.type_name,
                if info.is_global { "global" } else { "local" }
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_sym(tag: i32) -> VarSymbol {
        VarSymbol {
            ty: SemType::Int,
            ptr: Val::I32(tag), // stand-in handle for tests
        }
    }

    #[test]
    fn resolution_prefers_innermost_local() {
        let mut t = SymbolTable::new();
        t.declare_global("x", int_sym(1), Loc::none());
        t.enter_function();
        let mut scope = t.enter_block();
        t.declare_local(&mut scope, "x", int_sym(2), Loc::none());
        match t.resolve("x") {
            Some(Resolved::Local(sym)) => assert_eq!(sym.ptr, Val::I32(2)),
            _ => panic!("expected local binding"),
        }
        t.exit_block(scope);
        match t.resolve("x") {
            Some(Resolved::Global(sym)) => assert_eq!(sym.ptr, Val::I32(1)),
            _ => panic!("expected global binding after block exit"),
        }
    }

    #[test]
    fn block_exit_restores_pre_entry_locals() {
        let mut t = SymbolTable::new();
        t.enter_function();
        let mut outer = t.enter_block();
        t.declare_local(&mut outer, "a", int_sym(1), Loc::none());
        let before = t.live_local_names();

        let mut inner = t.enter_block();
        t.declare_local(&mut inner, "a", int_sym(2), Loc::none());
        t.declare_local(&mut inner, "b", int_sym(3), Loc::none());
        assert!(t.has_local("b"));
        t.exit_block(inner);

        assert_eq!(t.live_local_names(), before);
        match t.resolve("a") {
            Some(Resolved::Local(sym)) => assert_eq!(sym.ptr, Val::I32(1)),
            _ => panic!("outer binding should be restored"),
        }
    }

    #[test]
    fn same_block_redeclaration_is_detectable() {
        let mut t = SymbolTable::new();
        t.enter_function();
        let mut scope = t.enter_block();
        t.declare_local(&mut scope, "v", int_sym(1), Loc::none());
        assert!(scope.declares("v"));
        assert!(!scope.declares("w"));
    }

    #[test]
    fn parameters_are_tracked() {
        let mut t = SymbolTable::new();
        t.enter_function();
        t.declare_param("n", int_sym(1), Loc::none());
        assert!(t.is_parameter("n"));
        assert!(t.has_local("n"));
        t.exit_function();
        assert!(!t.is_parameter("n"));
        assert!(!t.has_local("n"));
    }

    #[test]
    fn functions_and_globals_are_separate_maps() {
        let mut t = SymbolTable::new();
        t.declare_function(
            "f",
            FuncSig {
                ret: SemType::Int,
                params: vec![SemType::Int],
                loc: Loc::none(),
            },
        );
        assert!(t.has_function("f"));
        assert!(!t.has_global("f"));
        assert!(t.resolve("f").is_none());
        let names: Vec<&str> = t.function_names().collect();
        assert_eq!(names, vec!["f"]);
    }
}
