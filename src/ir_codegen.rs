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

// Textual LLVM-IR emission from the populated module.

use std::fmt::Write;

use itertools::Itertools;

use crate::ir::{Function, Insn, Module, Term, Ty, Val};

/// Render a whole module as a textual .ll file.
pub fn emit_module(m: &Module) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "; ModuleID = '{}'", m.name);
    let _ = writeln!(out, "source_filename = \"{}\"", m.source_file);

    if !m.globals.is_empty() {
        out.push('\n');
        for g in &m.globals {
            match &g.ty {
                Ty::Array(..) => {
                    let _ = writeln!(out, "@{} = global {} zeroinitializer", g.name, g.ty);
                }
                ty => {
                    let _ = writeln!(out, "@{} = global {} {}", g.name, ty, const_zero_text(ty));
                }
            }
        }
    }

    for f in m.funcs.iter().filter(|f| f.is_decl) {
        out.push('\n');
        let params = f
            .params
            .iter()
            .map(|&p| f.value(p).ty.to_string())
            .join(", ");
        let _ = writeln!(out, "declare {} @{}({})", f.ret, f.name, params);
    }

    for f in m.funcs.iter().filter(|f| !f.is_decl) {
        out.push('\n');
        emit_function(&mut out, f);
    }

    out
}

fn const_zero_text(ty: &Ty) -> &'static str {
    match ty {
        Ty::I1 => "false",
        Ty::F32 => "0x0000000000000000",
        _ => "0",
    }
}

fn emit_function(out: &mut String, f: &Function) {
    let params = f
        .params
        .iter()
        .map(|&p| {
            let v = f.value(p);
            format!("{} %{}", v.ty, v.name)
        })
        .join(", ");
    let _ = writeln!(out, "define {} @{}({}) {{", f.ret, f.name, params);
    for (i, b) in f.blocks.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}:", b.label);
        for insn in &b.insns {
            emit_insn(out, f, insn);
        }
        if let Some(term) = &b.term {
            emit_term(out, f, term);
        }
    }
    let _ = writeln!(out, "}}");
}

fn val_text(f: &Function, v: &Val) -> String {
    match v {
        Val::I1(true) => "true".to_string(),
        Val::I1(false) => "false".to_string(),
        Val::I32(n) => n.to_string(),
        Val::F32(x) => float_text(*x),
        Val::Local(id) => format!("%{}", f.value(*id).name),
        Val::Global(name) => format!("@{}", name),
    }
}

/// Float constants print as the 64-bit hex form of the value widened to
/// double, which is always exact for an f32.
pub fn float_text(x: f32) -> String {
    format!("0x{:016X}", (x as f64).to_bits())
}

fn emit_insn(out: &mut String, f: &Function, insn: &Insn) {
    match insn {
        Insn::Alloca { dst, ty } => {
            let _ = writeln!(out, "  %{} = alloca {}", f.value(*dst).name, ty);
        }
        Insn::Load { dst, ty, ptr } => {
            let _ = writeln!(
                out,
                "  %{} = load {}, ptr {}",
                f.value(*dst).name,
                ty,
                val_text(f, ptr)
            );
        }
        Insn::Store { ty, val, ptr } => {
            let _ = writeln!(
                out,
                "  store {} {}, ptr {}",
                ty,
                val_text(f, val),
                val_text(f, ptr)
            );
        }
        Insn::Bin {
            dst,
            op,
            ty,
            lhs,
            rhs,
        } => {
            let _ = writeln!(
                out,
                "  %{} = {} {} {}, {}",
                f.value(*dst).name,
                op.mnemonic(),
                ty,
                val_text(f, lhs),
                val_text(f, rhs)
            );
        }
        Insn::FNeg { dst, val } => {
            let _ = writeln!(
                out,
                "  %{} = fneg float {}",
                f.value(*dst).name,
                val_text(f, val)
            );
        }
        Insn::ICmp {
            dst,
            pred,
            ty,
            lhs,
            rhs,
        } => {
            let _ = writeln!(
                out,
                "  %{} = icmp {} {} {}, {}",
                f.value(*dst).name,
                pred.mnemonic(),
                ty,
                val_text(f, lhs),
                val_text(f, rhs)
            );
        }
        Insn::FCmp {
            dst,
            pred,
            lhs,
            rhs,
        } => {
            let _ = writeln!(
                out,
                "  %{} = fcmp {} float {}, {}",
                f.value(*dst).name,
                pred.mnemonic(),
                val_text(f, lhs),
                val_text(f, rhs)
            );
        }
        Insn::ZExt { dst, from, val, to } => {
            let _ = writeln!(
                out,
                "  %{} = zext {} {} to {}",
                f.value(*dst).name,
                from,
                val_text(f, val),
                to
            );
        }
        Insn::SIToFP { dst, from, val, to } => {
            let _ = writeln!(
                out,
                "  %{} = sitofp {} {} to {}",
                f.value(*dst).name,
                from,
                val_text(f, val),
                to
            );
        }
        Insn::FPToSI { dst, from, val, to } => {
            let _ = writeln!(
                out,
                "  %{} = fptosi {} {} to {}",
                f.value(*dst).name,
                from,
                val_text(f, val),
                to
            );
        }
        Insn::Gep {
            dst,
            base_ty,
            ptr,
            indices,
        } => {
            let idx = indices
                .iter()
                .map(|v| format!("i32 {}", val_text(f, v)))
                .join(", ");
            let _ = writeln!(
                out,
                "  %{} = getelementptr inbounds {}, ptr {}, {}",
                f.value(*dst).name,
                base_ty,
                val_text(f, ptr),
                idx
            );
        }
        Insn::Call {
            dst,
            ret,
            callee,
            args,
        } => {
            let args_s = args
                .iter()
                .map(|(ty, v)| format!("{} {}", ty, val_text(f, v)))
                .join(", ");
            match dst {
                Some(d) => {
                    let _ = writeln!(
                        out,
                        "  %{} = call {} @{}({})",
                        f.value(*d).name,
                        ret,
                        callee,
                        args_s
                    );
                }
                None => {
                    let _ = writeln!(out, "  call {} @{}({})", ret, callee, args_s);
                }
            }
        }
        Insn::Phi { dst, ty, incomings } => {
            let inc = incomings
                .iter()
                .map(|(v, b)| format!("[ {}, %{} ]", val_text(f, v), f.block(*b).label))
                .join(", ");
            let _ = writeln!(out, "  %{} = phi {} {}", f.value(*dst).name, ty, inc);
        }
    }
}

fn emit_term(out: &mut String, f: &Function, term: &Term) {
    match term {
        Term::Br { target } => {
            let _ = writeln!(out, "  br label %{}", f.block(*target).label);
        }
        Term::CondBr {
            cond,
            then_tgt,
            else_tgt,
        } => {
            let _ = writeln!(
                out,
                "  br i1 {}, label %{}, label %{}",
                val_text(f, cond),
                f.block(*then_tgt).label,
                f.block(*else_tgt).label
            );
        }
        Term::Ret { ty, val } => match val {
            Some(v) => {
                let _ = writeln!(out, "  ret {} {}", ty, val_text(f, v));
            }
            None => {
                let _ = writeln!(out, "  ret void");
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinOp, Builder, ICmpPred};

    #[test]
    fn float_constants_use_double_hex_form() {
        assert_eq!(float_text(1.0), "0x3FF0000000000000");
        assert_eq!(float_text(0.0), "0x0000000000000000");
    }

    #[test]
    fn emits_globals_and_declares() {
        let mut m = Module::new("mini-c", "t.c");
        m.add_global("g", Ty::I32);
        m.add_global("arr", Ty::nested_array(Ty::I32, &[10, 5]));
        m.declare_function("print_int", Ty::I32, vec![("x".to_string(), Ty::I32)]);

        let text = emit_module(&m);
        assert!(text.contains("; ModuleID = 'mini-c'"), "{text}");
        assert!(text.contains("@g = global i32 0"), "{text}");
        assert!(
            text.contains("@arr = global [10 x [5 x i32]] zeroinitializer"),
            "{text}"
        );
        assert!(text.contains("declare i32 @print_int(i32)"), "{text}");
    }

    #[test]
    fn emits_a_small_function_body() {
        let mut m = Module::new("mini-c", "t.c");
        let mut b = Builder::new("main", Ty::I32, vec![]);
        let x = b.entry_alloca("x", Ty::I32);
        b.store(Ty::I32, Val::I32(3), x.clone());
        let v = b.load(Ty::I32, x, "x");
        let s = b.bin(BinOp::Add, Ty::I32, v.clone(), Val::I32(4), "add");
        let c = b.icmp(ICmpPred::Slt, Ty::I32, v, Val::I32(9), "cmp");
        let then_b = b.new_block("then");
        let cont = b.new_block("ifcont");
        b.cond_br(c, then_b, cont);
        b.set_block(then_b);
        b.br(cont);
        b.set_block(cont);
        b.ret(Ty::I32, Some(s));
        m.define_function(b.finish());

        let text = emit_module(&m);
        assert!(text.contains("define i32 @main() {"), "{text}");
        assert!(text.contains("entry:"), "{text}");
        assert!(text.contains("%x = alloca i32"), "{text}");
        assert!(text.contains("store i32 3, ptr %x"), "{text}");
        assert!(text.contains("%x1 = load i32, ptr %x"), "{text}");
        assert!(text.contains("%add = add i32 %x1, 4"), "{text}");
        assert!(text.contains("%cmp = icmp slt i32 %x1, 9"), "{text}");
        assert!(
            text.contains("br i1 %cmp, label %then, label %ifcont"),
            "{text}"
        );
        assert!(text.contains("ret i32 %add"), "{text}");
    }

    #[test]
    fn gep_prints_leading_zero_and_indices() {
        let mut b = Builder::new("f", Ty::Void, vec![]);
        let arr = b.entry_alloca("arr", Ty::nested_array(Ty::I32, &[10, 5]));
        let i = b.load(Ty::I32, arr.clone(), "i");
        let g = b.gep(
            Ty::nested_array(Ty::I32, &[10, 5]),
            arr,
            vec![Val::I32(0), i.clone(), i],
            "arrayidx",
        );
        b.store(Ty::I32, Val::I32(1), g);
        b.ret(Ty::Void, None);

        let mut m = Module::new("m", "t.c");
        m.define_function(b.finish());
        let text = emit_module(&m);
        assert!(
            text.contains(
                "%arrayidx = getelementptr inbounds [10 x [5 x i32]], ptr %arr, i32 0, i32 %i, i32 %i"
            ),
            "{text}"
        );
    }

    #[test]
    fn phi_prints_incoming_blocks() {
        let mut b = Builder::new("f", Ty::I1, vec![]);
        let rhs = b.new_block("and_rhs");
        let join = b.new_block("and_join");
        b.cond_br(Val::I1(true), rhs, join);
        b.set_block(rhs);
        b.br(join);
        b.set_block(join);
        let entry = crate::ir::BlockId(0);
        let p = b.phi(
            Ty::I1,
            vec![(Val::I1(false), entry), (Val::I1(true), rhs)],
            "and",
        );
        b.ret(Ty::I1, Some(p));

        let mut m = Module::new("m", "t.c");
        m.define_function(b.finish());
        let text = emit_module(&m);
        assert!(
            text.contains("%and = phi i1 [ false, %entry ], [ true, %and_rhs ]"),
            "{text}"
        );
    }
}
