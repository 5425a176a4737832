#![allow(dead_code)]

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

// In-memory LLVM-flavoured IR. The lowering stage populates a Module through
// the Builder; ir_codegen renders it as a textual .ll file.

use std::collections::HashMap;
use std::fmt;

use crate::error::internal_error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

#[derive(Clone, Debug, PartialEq)]
pub enum Ty {
    Void,
    I1,
    I32,
    F32,
    /// Opaque pointer.
    Ptr,
    Array(Box<Ty>, u64),
}

impl Ty {
    pub fn array(elem: Ty, n: u64) -> Ty {
        Ty::Array(Box::new(elem), n)
    }

    /// Build a nested array type from dimensions in source order
    /// (outermost first): `[d0 x [d1 x ... elem]]`.
    pub fn nested_array(elem: Ty, dims: &[i32]) -> Ty {
        let mut ty = elem;
        for d in dims.iter().rev() {
            ty = Ty::array(ty, *d as u64);
        }
        ty
    }

    pub fn zero_value(&self) -> Option<Val> {
        match self {
            Ty::I1 => Some(Val::I1(false)),
            Ty::I32 => Some(Val::I32(0)),
            Ty::F32 => Some(Val::F32(0.0)),
            _ => None,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Void => write!(f, "void"),
            Ty::I1 => write!(f, "i1"),
            Ty::I32 => write!(f, "i32"),
            Ty::F32 => write!(f, "float"),
            Ty::Ptr => write!(f, "ptr"),
            Ty::Array(elem, n) => write!(f, "[{} x {}]", n, elem),
        }
    }
}

/// An operand: a constant, a local SSA value, or a global address.
#[derive(Clone, Debug, PartialEq)]
pub enum Val {
    I1(bool),
    I32(i32),
    F32(f32),
    Local(ValueId),
    Global(String),
}

impl Val {
    pub fn is_const_zero(&self) -> bool {
        match self {
            Val::I32(v) => *v == 0,
            Val::F32(v) => *v == 0.0,
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    SDiv,
    SRem,
    FAdd,
    FSub,
    FMul,
    FDiv,
    Xor,
}

impl BinOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::SDiv => "sdiv",
            BinOp::SRem => "srem",
            BinOp::FAdd => "fadd",
            BinOp::FSub => "fsub",
            BinOp::FMul => "fmul",
            BinOp::FDiv => "fdiv",
            BinOp::Xor => "xor",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ICmpPred {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

impl ICmpPred {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            ICmpPred::Eq => "eq",
            ICmpPred::Ne => "ne",
            ICmpPred::Slt => "slt",
            ICmpPred::Sle => "sle",
            ICmpPred::Sgt => "sgt",
            ICmpPred::Sge => "sge",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FCmpPred {
    Oeq,
    One,
    Olt,
    Ole,
    Ogt,
    Oge,
}

impl FCmpPred {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            FCmpPred::Oeq => "oeq",
            FCmpPred::One => "one",
            FCmpPred::Olt => "olt",
            FCmpPred::Ole => "ole",
            FCmpPred::Ogt => "ogt",
            FCmpPred::Oge => "oge",
        }
    }
}

#[derive(Clone, Debug)]
pub enum Insn {
    Alloca {
        dst: ValueId,
        ty: Ty,
    },
    Load {
        dst: ValueId,
        ty: Ty,
        ptr: Val,
    },
    Store {
        ty: Ty,
        val: Val,
        ptr: Val,
    },
    Bin {
        dst: ValueId,
        op: BinOp,
        ty: Ty,
        lhs: Val,
        rhs: Val,
    },
    FNeg {
        dst: ValueId,
        val: Val,
    },
    ICmp {
        dst: ValueId,
        pred: ICmpPred,
        ty: Ty,
        lhs: Val,
        rhs: Val,
    },
    FCmp {
        dst: ValueId,
        pred: FCmpPred,
        lhs: Val,
        rhs: Val,
    },
    ZExt {
        dst: ValueId,
        from: Ty,
        val: Val,
        to: Ty,
    },
    SIToFP {
        dst: ValueId,
        from: Ty,
        val: Val,
        to: Ty,
    },
    FPToSI {
        dst: ValueId,
        from: Ty,
        val: Val,
        to: Ty,
    },
    Gep {
        dst: ValueId,
        base_ty: Ty,
        ptr: Val,
        indices: Vec<Val>,
    },
    Call {
        dst: Option<ValueId>,
        ret: Ty,
        callee: String,
        args: Vec<(Ty, Val)>,
    },
    Phi {
        dst: ValueId,
        ty: Ty,
        incomings: Vec<(Val, BlockId)>,
    },
}

impl Insn {
    pub fn def(&self) -> Option<ValueId> {
        match self {
            Insn::Alloca { dst, .. }
            | Insn::Load { dst, .. }
            | Insn::Bin { dst, .. }
            | Insn::FNeg { dst, .. }
            | Insn::ICmp { dst, .. }
            | Insn::FCmp { dst, .. }
            | Insn::ZExt { dst, .. }
            | Insn::SIToFP { dst, .. }
            | Insn::FPToSI { dst, .. }
            | Insn::Gep { dst, .. }
            | Insn::Phi { dst, .. } => Some(*dst),
            Insn::Call { dst, .. } => *dst,
            Insn::Store { .. } => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Term {
    Br {
        target: BlockId,
    },
    CondBr {
        cond: Val,
        then_tgt: BlockId,
        else_tgt: BlockId,
    },
    Ret {
        ty: Ty,
        val: Option<Val>,
    },
}

#[derive(Clone, Debug)]
pub struct BlockData {
    pub label: String,
    pub insns: Vec<Insn>,
    pub term: Option<Term>,
}

#[derive(Clone, Debug)]
pub struct ValueDef {
    pub name: String,
    pub ty: Ty,
}

#[derive(Clone, Debug)]
pub struct Function {
    pub name: String,
    pub ret: Ty,
    /// Parameter values; indices into `values`.
    pub params: Vec<ValueId>,
    pub blocks: Vec<BlockData>,
    pub values: Vec<ValueDef>,
    /// True for a `declare` with no body (externs and pending prototypes).
    pub is_decl: bool,
}

impl Function {
    pub fn value(&self, id: ValueId) -> &ValueDef {
        &self.values[id.0 as usize]
    }

    pub fn block(&self, id: BlockId) -> &BlockData {
        &self.blocks[id.0 as usize]
    }

    /// Structural checks mirroring the builder contract: every block carries
    /// exactly one terminator, branch targets exist, and return types match
    /// the function signature.
    pub fn verify(&self) -> Result<(), String> {
        if self.is_decl {
            return Ok(());
        }
        for (i, b) in self.blocks.iter().enumerate() {
            let term = match &b.term {
                Some(t) => t,
                None => {
                    return Err(format!(
                        "function '{}': block '{}' (#{}) has no terminator",
                        self.name, b.label, i
                    ))
                }
            };
            let check_target = |t: BlockId| -> Result<(), String> {
                if t.0 as usize >= self.blocks.len() {
                    return Err(format!(
                        "function '{}': block '{}' branches to missing block #{}",
                        self.name, b.label, t.0
                    ));
                }
                Ok(())
            };
            match term {
                Term::Br { target } => check_target(*target)?,
                Term::CondBr {
                    then_tgt, else_tgt, ..
                } => {
                    check_target(*then_tgt)?;
                    check_target(*else_tgt)?;
                }
                Term::Ret { ty, val } => {
                    if *ty != self.ret {
                        return Err(format!(
                            "function '{}': return of type {} in function returning {}",
                            self.name, ty, self.ret
                        ));
                    }
                    match (&self.ret, val) {
                        (Ty::Void, Some(_)) => {
                            return Err(format!(
                                "function '{}': void return carries a value",
                                self.name
                            ))
                        }
                        (Ty::Void, None) => {}
                        (_, None) => {
                            return Err(format!(
                                "function '{}': non-void return carries no value",
                                self.name
                            ))
                        }
                        (_, Some(_)) => {}
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct GlobalVar {
    pub name: String,
    pub ty: Ty,
}

#[derive(Clone, Debug)]
pub struct Module {
    pub name: String,
    pub source_file: String,
    pub globals: Vec<GlobalVar>,
    pub funcs: Vec<Function>,
}

impl Module {
    pub fn new(name: impl Into<String>, source_file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_file: source_file.into(),
            globals: Vec::new(),
            funcs: Vec::new(),
        }
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.funcs.iter().find(|f| f.name == name)
    }

    pub fn add_global(&mut self, name: impl Into<String>, ty: Ty) {
        self.globals.push(GlobalVar {
            name: name.into(),
            ty,
        });
    }

    /// Add a `declare` for an extern or forward prototype. A declaration that
    /// already exists is left alone.
    pub fn declare_function(&mut self, name: &str, ret: Ty, param_tys: Vec<(String, Ty)>) {
        if self.get_function(name).is_some() {
            return;
        }
        let mut values = Vec::new();
        let mut params = Vec::new();
        for (i, (pname, pty)) in param_tys.into_iter().enumerate() {
            values.push(ValueDef {
                name: pname,
                ty: pty,
            });
            params.push(ValueId(i as u32));
        }
        self.funcs.push(Function {
            name: name.to_string(),
            ret,
            params,
            blocks: Vec::new(),
            values,
            is_decl: true,
        });
    }

    /// Install a finished definition, replacing a prior `declare` of the same
    /// name if present.
    pub fn define_function(&mut self, func: Function) {
        if let Some(slot) = self
            .funcs
            .iter_mut()
            .find(|f| f.name == func.name && f.is_decl)
        {
            *slot = func;
        } else {
            self.funcs.push(func);
        }
    }
}

/// Builds one function, one block at a time, in the style of an LLVM
/// IRBuilder: create blocks, set the insertion point, emit instructions.
/// Emitting into a terminated block is a builder-contract violation.
#[derive(Debug)]
pub struct Builder {
    pub func: Function,
    cur: BlockId,
    names: HashMap<String, u32>,
}

impl Builder {
    pub fn new(name: &str, ret: Ty, params: Vec<(String, Ty)>) -> Self {
        let mut b = Builder {
            func: Function {
                name: name.to_string(),
                ret,
                params: Vec::new(),
                blocks: Vec::new(),
                values: Vec::new(),
                is_decl: false,
            },
            cur: BlockId(0),
            names: HashMap::new(),
        };
        for (pname, pty) in params {
            let id = b.new_value(&pname, pty);
            b.func.params.push(id);
        }
        let entry = b.new_block("entry");
        b.cur = entry;
        b
    }

    /// Uniquify a name hint within the function. Values and labels share the
    /// `%` namespace in textual IR, so one counter serves both.
    fn fresh(&mut self, hint: &str) -> String {
        let n = self.names.entry(hint.to_string()).or_insert(0);
        let name = if *n == 0 {
            hint.to_string()
        } else {
            format!("{}{}", hint, n)
        };
        *n += 1;
        name
    }

    fn new_value(&mut self, hint: &str, ty: Ty) -> ValueId {
        let name = self.fresh(hint);
        let id = ValueId(self.func.values.len() as u32);
        self.func.values.push(ValueDef { name, ty });
        id
    }

    pub fn param(&self, i: usize) -> Val {
        Val::Local(self.func.params[i])
    }

    pub fn new_block(&mut self, hint: &str) -> BlockId {
        let label = self.fresh(hint);
        let id = BlockId(self.func.blocks.len() as u32);
        self.func.blocks.push(BlockData {
            label,
            insns: Vec::new(),
            term: None,
        });
        id
    }

    pub fn set_block(&mut self, b: BlockId) {
        self.cur = b;
    }

    pub fn cur_block(&self) -> BlockId {
        self.cur
    }

    /// True while the insertion block has no terminator yet.
    pub fn is_open(&self) -> bool {
        self.func.blocks[self.cur.0 as usize].term.is_none()
    }

    fn push(&mut self, insn: Insn) {
        if !self.is_open() {
            internal_error("instruction emitted after block terminator");
        }
        self.func.blocks[self.cur.0 as usize].insns.push(insn);
    }

    pub fn terminate(&mut self, term: Term) {
        if !self.is_open() {
            internal_error("second terminator emitted into basic block");
        }
        self.func.blocks[self.cur.0 as usize].term = Some(term);
    }

    /// Allocate in the entry block regardless of the insertion point, so
    /// every alloca dominates all uses.
    pub fn entry_alloca(&mut self, hint: &str, ty: Ty) -> Val {
        let dst = self.new_value(hint, Ty::Ptr);
        self.func.blocks[0].insns.push(Insn::Alloca { dst, ty });
        Val::Local(dst)
    }

    pub fn load(&mut self, ty: Ty, ptr: Val, hint: &str) -> Val {
        let dst = self.new_value(hint, ty.clone());
        self.push(Insn::Load { dst, ty, ptr });
        Val::Local(dst)
    }

    pub fn store(&mut self, ty: Ty, val: Val, ptr: Val) {
        self.push(Insn::Store { ty, val, ptr });
    }

    pub fn bin(&mut self, op: BinOp, ty: Ty, lhs: Val, rhs: Val, hint: &str) -> Val {
        let dst = self.new_value(hint, ty.clone());
        self.push(Insn::Bin {
            dst,
            op,
            ty,
            lhs,
            rhs,
        });
        Val::Local(dst)
    }

    pub fn fneg(&mut self, val: Val, hint: &str) -> Val {
        let dst = self.new_value(hint, Ty::F32);
        self.push(Insn::FNeg { dst, val });
        Val::Local(dst)
    }

    pub fn icmp(&mut self, pred: ICmpPred, ty: Ty, lhs: Val, rhs: Val, hint: &str) -> Val {
        let dst = self.new_value(hint, Ty::I1);
        self.push(Insn::ICmp {
            dst,
            pred,
            ty,
            lhs,
            rhs,
        });
        Val::Local(dst)
    }

    pub fn fcmp(&mut self, pred: FCmpPred, lhs: Val, rhs: Val, hint: &str) -> Val {
        let dst = self.new_value(hint, Ty::I1);
        self.push(Insn::FCmp {
            dst,
            pred,
            lhs,
            rhs,
        });
        Val::Local(dst)
    }

    pub fn zext(&mut self, from: Ty, val: Val, to: Ty, hint: &str) -> Val {
        let dst = self.new_value(hint, to.clone());
        self.push(Insn::ZExt { dst, from, val, to });
        Val::Local(dst)
    }

    pub fn sitofp(&mut self, from: Ty, val: Val, to: Ty, hint: &str) -> Val {
        let dst = self.new_value(hint, to.clone());
        self.push(Insn::SIToFP { dst, from, val, to });
        Val::Local(dst)
    }

    pub fn fptosi(&mut self, from: Ty, val: Val, to: Ty, hint: &str) -> Val {
        let dst = self.new_value(hint, to.clone());
        self.push(Insn::FPToSI { dst, from, val, to });
        Val::Local(dst)
    }

    pub fn gep(&mut self, base_ty: Ty, ptr: Val, indices: Vec<Val>, hint: &str) -> Val {
        let dst = self.new_value(hint, Ty::Ptr);
        self.push(Insn::Gep {
            dst,
            base_ty,
            ptr,
            indices,
        });
        Val::Local(dst)
    }

    pub fn call(&mut self, ret: Ty, callee: &str, args: Vec<(Ty, Val)>, hint: &str) -> Option<Val> {
        let dst = if ret == Ty::Void {
            None
        } else {
            Some(self.new_value(hint, ret.clone()))
        };
        self.push(Insn::Call {
            dst,
            ret,
            callee: callee.to_string(),
            args,
        });
        dst.map(Val::Local)
    }

    pub fn phi(&mut self, ty: Ty, incomings: Vec<(Val, BlockId)>, hint: &str) -> Val {
        let dst = self.new_value(hint, ty.clone());
        self.push(Insn::Phi { dst, ty, incomings });
        Val::Local(dst)
    }

    pub fn br(&mut self, target: BlockId) {
        self.terminate(Term::Br { target });
    }

    pub fn cond_br(&mut self, cond: Val, then_tgt: BlockId, else_tgt: BlockId) {
        self.terminate(Term::CondBr {
            cond,
            then_tgt,
            else_tgt,
        });
    }

    pub fn ret(&mut self, ty: Ty, val: Option<Val>) {
        self.terminate(Term::Ret { ty, val });
    }

    pub fn finish(self) -> Function {
        self.func
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_creates_entry_block_first() {
        let b = Builder::new("f", Ty::I32, vec![("n".to_string(), Ty::I32)]);
        assert_eq!(b.func.blocks.len(), 1);
        assert_eq!(b.func.blocks[0].label, "entry");
        assert!(b.is_open());
    }

    #[test]
    fn fresh_names_are_uniquified() {
        let mut b = Builder::new("f", Ty::Void, vec![]);
        let t0 = b.new_block("then");
        let t1 = b.new_block("then");
        assert_eq!(b.func.block(t0).label, "then");
        assert_eq!(b.func.block(t1).label, "then1");
    }

    #[test]
    fn param_name_collision_is_uniquified_for_allocas() {
        let mut b = Builder::new("f", Ty::Void, vec![("n".to_string(), Ty::I32)]);
        let a = b.entry_alloca("n", Ty::I32);
        match a {
            Val::Local(id) => assert_eq!(b.func.value(id).name, "n1"),
            _ => panic!("expected local"),
        }
    }

    #[test]
    fn entry_alloca_lands_in_entry_block() {
        let mut b = Builder::new("f", Ty::Void, vec![]);
        let body = b.new_block("body");
        b.br(body);
        b.set_block(body);
        b.entry_alloca("x", Ty::I32);
        assert!(matches!(b.func.blocks[0].insns[0], Insn::Alloca { .. }));
        assert!(b.func.blocks[1].insns.is_empty());
    }

    #[test]
    fn terminator_closes_block() {
        let mut b = Builder::new("f", Ty::Void, vec![]);
        assert!(b.is_open());
        b.ret(Ty::Void, None);
        assert!(!b.is_open());
    }

    #[test]
    fn verify_accepts_well_formed_function() {
        let mut b = Builder::new("f", Ty::I32, vec![]);
        b.ret(Ty::I32, Some(Val::I32(0)));
        let f = b.finish();
        assert!(f.verify().is_ok());
    }

    #[test]
    fn verify_rejects_missing_terminator() {
        let b = Builder::new("f", Ty::I32, vec![]);
        let f = b.finish();
        let err = f.verify().unwrap_err();
        assert!(err.contains("no terminator"), "{err}");
    }

    #[test]
    fn verify_rejects_return_type_mismatch() {
        let mut b = Builder::new("f", Ty::I32, vec![]);
        b.ret(Ty::F32, Some(Val::F32(0.0)));
        let f = b.finish();
        assert!(f.verify().is_err());
    }

    #[test]
    fn define_replaces_prior_declare() {
        let mut m = Module::new("m", "t.c");
        m.declare_function("f", Ty::I32, vec![("n".to_string(), Ty::I32)]);
        assert!(m.get_function("f").unwrap().is_decl);

        let mut b = Builder::new("f", Ty::I32, vec![("n".to_string(), Ty::I32)]);
        b.ret(Ty::I32, Some(Val::I32(1)));
        m.define_function(b.finish());

        assert_eq!(m.funcs.len(), 1);
        assert!(!m.get_function("f").unwrap().is_decl);
    }

    #[test]
    fn nested_array_type_orders_dimensions_outermost_first() {
        let ty = Ty::nested_array(Ty::I32, &[10, 5]);
        assert_eq!(ty.to_string(), "[10 x [5 x i32]]");
    }

    #[test]
    fn conversion_instructions_define_their_destination() {
        let mut b = Builder::new("f", Ty::I32, vec![]);
        let widened = b.sitofp(Ty::I32, Val::I32(3), Ty::F32, "itof");
        let truncated = b.fptosi(Ty::F32, widened, Ty::I32, "ftoi");
        b.ret(Ty::I32, Some(truncated.clone()));
        let f = b.finish();

        let defs: Vec<Option<ValueId>> = f.blocks[0].insns.iter().map(|i| i.def()).collect();
        assert_eq!(defs.len(), 2);
        assert!(defs.iter().all(|d| d.is_some()));
        match truncated {
            Val::Local(id) => assert_eq!(f.value(id).name, "ftoi"),
            _ => panic!("expected local"),
        }
        assert!(f.verify().is_ok());
    }

    #[test]
    fn stores_define_nothing() {
        let mut b = Builder::new("f", Ty::Void, vec![]);
        let slot = b.entry_alloca("x", Ty::I32);
        b.store(Ty::I32, Val::I32(1), slot);
        b.ret(Ty::Void, None);
        let f = b.finish();
        let last = f.blocks[0].insns.last().unwrap();
        assert!(last.def().is_none());
    }
}
