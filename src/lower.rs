// Semantic checking and lowering. Each top-level declaration is lowered as
// soon as the parser produces it; expression lowering returns the produced
// value together with its semantic type, and every error is logged before
// returning "no value" so the enclosing declaration aborts cleanly.

use crate::ast::{
    BinOp, Block, Expr, ExprKind, FnDef, FnProto, Item, LocalDecl, Loc, Param, Stmt, UnOp,
};
use crate::debug;
use crate::error::{closest_match, internal_error, DiagLog, ErrorClass};
use crate::ir::{self, BinOp as IrBin, Builder, FCmpPred, ICmpPred, Ty, Val};
use crate::symtab::{FuncSig, Resolved, SymbolTable, VarSymbol};
use crate::types::{is_narrowing, SemType};

pub struct LowerCtx<'a> {
    pub module: &'a mut ir::Module,
    pub sym: &'a mut SymbolTable,
    pub log: &'a mut DiagLog,
    cur_ret: SemType,
    cur_fn: String,
}

impl<'a> LowerCtx<'a> {
    fn scope_err(&mut self, loc: Loc, msg: impl Into<String>) {
        self.log.error(ErrorClass::Scope, loc, msg);
    }

    fn type_err(&mut self, loc: Loc, msg: impl Into<String>) {
        self.log.error(ErrorClass::Type, loc, msg);
    }

    fn type_err_with(&mut self, loc: Loc, msg: impl Into<String>, context: String) {
        self.log
            .error_with(ErrorClass::Type, loc, msg, Some(context), None);
    }

    fn semantic_err_with(&mut self, loc: Loc, msg: impl Into<String>, context: String) {
        self.log
            .error_with(ErrorClass::Semantic, loc, msg, Some(context), None);
    }
}

/// IR type of a semantic type as it appears in registers, allocas and
/// signatures. Declared arrays map to nested array types; decayed parameters
/// are opaque pointers.
fn ir_type(sem: &SemType) -> Ty {
    match sem {
        SemType::Int => Ty::I32,
        SemType::Float => Ty::F32,
        SemType::Bool => Ty::I1,
        SemType::Void => Ty::Void,
        SemType::Array(elem, dims) => Ty::nested_array(ir_type(elem), dims),
        SemType::Pointer(..) => Ty::Ptr,
    }
}

fn param_sem_type(p: &Param) -> SemType {
    if p.is_array() {
        SemType::Pointer(Box::new(SemType::scalar(p.ty)), p.inner_dims())
    } else {
        SemType::scalar(p.ty)
    }
}

/// Lower one top-level declaration into the module.
pub fn lower_item(item: &Item, module: &mut ir::Module, sym: &mut SymbolTable, log: &mut DiagLog) {
    let mut ctx = LowerCtx {
        module,
        sym,
        log,
        cur_ret: SemType::Void,
        cur_fn: String::new(),
    };
    match item {
        Item::Extern(proto) | Item::Proto(proto) => {
            declare_function(proto, &mut ctx);
        }
        Item::Function(def) => {
            lower_function(def, &mut ctx);
        }
        Item::GlobalVar { name, ty, loc } => {
            lower_global_var(name, SemType::scalar(*ty), *loc, &mut ctx);
        }
        Item::GlobalArray {
            name,
            ty,
            dims,
            loc,
        } => {
            let sem = SemType::Array(Box::new(SemType::scalar(*ty)), dims.clone());
            lower_global_var(name, sem, *loc, &mut ctx);
        }
    }
}

fn lower_global_var(name: &str, sem: SemType, loc: Loc, ctx: &mut LowerCtx) {
    debug::codegen(&format!("generating global variable '{}'", name));
    if ctx.sym.has_global(name) {
        ctx.scope_err(loc, format!("redeclaration of global variable '{}'", name));
        return;
    }
    if ctx.sym.has_function(name) {
        ctx.log.error_with(
            ErrorClass::Scope,
            loc,
            format!("global variable '{}' conflicts with function name", name),
            Some("cannot use a function name as a variable name".to_string()),
            None,
        );
        return;
    }
    ctx.module.add_global(name, ir_type(&sem));
    ctx.sym.declare_global(
        name,
        VarSymbol {
            ty: sem,
            ptr: Val::Global(name.to_string()),
        },
        loc,
    );
}

/// Register a function signature and its IR declaration. Returns false when
/// the name clashes with an incompatible prior declaration or a variable.
fn declare_function(proto: &FnProto, ctx: &mut LowerCtx) -> bool {
    let sig = FuncSig {
        ret: SemType::scalar(proto.ret),
        params: proto.params.iter().map(param_sem_type).collect(),
        loc: proto.loc,
    };

    if let Some(existing) = ctx.sym.function(&proto.name) {
        if existing.ret != sig.ret || existing.params != sig.params {
            ctx.scope_err(
                proto.loc,
                format!(
                    "conflicting declaration of function '{}' - signature differs from previous declaration",
                    proto.name
                ),
            );
            return false;
        }
        return true;
    }
    if ctx.sym.has_global(&proto.name) {
        ctx.log.error_with(
            ErrorClass::Scope,
            proto.loc,
            format!("function '{}' conflicts with variable name", proto.name),
            Some("cannot use a variable name as a function name".to_string()),
            None,
        );
        return false;
    }

    let ir_params: Vec<(String, Ty)> = proto
        .params
        .iter()
        .map(|p| (p.name.clone(), ir_type(&param_sem_type(p))))
        .collect();
    ctx.module
        .declare_function(&proto.name, ir_type(&sig.ret), ir_params);
    ctx.sym.declare_function(&proto.name, sig);
    true
}

fn lower_function(def: &FnDef, ctx: &mut LowerCtx) {
    let proto = &def.proto;
    debug::codegen(&format!("generating function '{}'", proto.name));

    if let Some(f) = ctx.module.get_function(&proto.name) {
        if !f.is_decl {
            ctx.scope_err(
                proto.loc,
                format!("redefinition of function '{}'", proto.name),
            );
            return;
        }
    }
    if !declare_function(proto, ctx) {
        return;
    }

    // Parameter names must be unique before any of them is bound.
    let mut seen: Vec<&str> = Vec::new();
    for p in &proto.params {
        if seen.contains(&p.name.as_str()) {
            ctx.scope_err(
                p.loc,
                format!(
                    "duplicate parameter name '{}' in function '{}'",
                    p.name, proto.name
                ),
            );
            return;
        }
        seen.push(&p.name);
    }

    ctx.sym.enter_function();
    ctx.cur_ret = SemType::scalar(proto.ret);
    ctx.cur_fn = proto.name.clone();

    let ir_params: Vec<(String, Ty)> = proto
        .params
        .iter()
        .map(|p| (p.name.clone(), ir_type(&param_sem_type(p))))
        .collect();
    let mut b = Builder::new(&proto.name, ir_type(&ctx.cur_ret), ir_params);

    // Parameters are stored into fresh entry-block allocas and registered as
    // locals before the body is lowered.
    for (i, p) in proto.params.iter().enumerate() {
        let sem = param_sem_type(p);
        let ty = ir_type(&sem);
        let slot = b.entry_alloca(&p.name, ty.clone());
        b.store(ty, b.param(i), slot.clone());
        ctx.sym.declare_param(
            &p.name,
            VarSymbol {
                ty: sem,
                ptr: slot,
            },
            p.loc,
        );
    }

    let ok = lower_block(&def.body, ctx, &mut b).is_some();

    if ok {
        // A body that falls through gets a synthesised return of the zero of
        // the declared return type.
        if b.is_open() {
            match &ctx.cur_ret {
                SemType::Void => b.ret(Ty::Void, None),
                ret => {
                    let ty = ir_type(ret);
                    let zero = ty.zero_value();
                    b.ret(ty, zero);
                }
            }
        }
        let func = b.finish();
        if let Err(msg) = func.verify() {
            internal_error(&msg);
        }
        ctx.module.define_function(func);
        if debug::level() >= debug::Level::Verbose {
            ctx.sym.dump();
        }
    }

    ctx.sym.exit_function();
    ctx.cur_ret = SemType::Void;
    ctx.cur_fn.clear();
}

fn lower_block(blk: &Block, ctx: &mut LowerCtx, b: &mut Builder) -> Option<()> {
    let mut scope = ctx.sym.enter_block();
    let mut ok = true;

    for d in &blk.decls {
        if lower_local_decl(d, ctx, b, &mut scope).is_none() {
            ok = false;
            break;
        }
    }
    if ok {
        for s in &blk.stmts {
            ensure_open(b);
            if lower_stmt(s, ctx, b).is_none() {
                ok = false;
                break;
            }
        }
    }

    ctx.sym.exit_block(scope);
    if ok {
        Some(())
    } else {
        None
    }
}

fn lower_local_decl(
    d: &LocalDecl,
    ctx: &mut LowerCtx,
    b: &mut Builder,
    scope: &mut crate::symtab::BlockScope,
) -> Option<()> {
    debug::codegen(&format!("declaring local '{}' : {}", d.name, d.ty.name()));

    if scope.declares(&d.name) {
        ctx.scope_err(
            d.loc,
            format!("redeclaration of variable '{}' in same scope", d.name),
        );
        return None;
    }
    if ctx.sym.is_parameter(&d.name) {
        ctx.scope_err(
            d.loc,
            format!("local variable '{}' shadows function parameter", d.name),
        );
        return None;
    }
    if ctx.sym.has_function(&d.name) {
        ctx.log.error_with(
            ErrorClass::Scope,
            d.loc,
            format!("variable '{}' conflicts with function name", d.name),
            Some("cannot use a function name as a variable name".to_string()),
            None,
        );
        return None;
    }
    if ctx.sym.has_local(&d.name) {
        debug::verbose(&format!("'{}' shadows a binding from an outer scope", d.name));
    } else if ctx.sym.has_global(&d.name) {
        debug::verbose(&format!("'{}' shadows a global variable", d.name));
    }

    if d.is_array() {
        let sem = SemType::Array(Box::new(SemType::scalar(d.ty)), d.dims.clone());
        let slot = b.entry_alloca(&d.name, ir_type(&sem));
        ctx.sym.declare_local(
            scope,
            &d.name,
            VarSymbol {
                ty: sem,
                ptr: slot,
            },
            d.loc,
        );
    } else {
        let sem = SemType::scalar(d.ty);
        let ty = ir_type(&sem);
        let slot = b.entry_alloca(&d.name, ty.clone());
        // Local scalars start out zeroed.
        if let Some(zero) = ty.zero_value() {
            b.store(ty, zero, slot.clone());
        }
        ctx.sym.declare_local(
            scope,
            &d.name,
            VarSymbol {
                ty: sem,
                ptr: slot,
            },
            d.loc,
        );
    }
    Some(())
}

/// Statements after a `return` land in a fresh unreachable block rather than
/// being emitted past a terminator.
fn ensure_open(b: &mut Builder) {
    if !b.is_open() {
        let dead = b.new_block("afterret");
        b.set_block(dead);
    }
}

fn lower_stmt(s: &Stmt, ctx: &mut LowerCtx, b: &mut Builder) -> Option<()> {
    match s {
        Stmt::Expr(e) => {
            lower_expr(e, ctx, b)?;
            Some(())
        }
        Stmt::Block(blk) => lower_block(blk, ctx, b),
        Stmt::If {
            cond,
            then_block,
            else_block,
            ..
        } => {
            let (cv, ct) = lower_expr(cond, ctx, b)?;
            let cb = to_bool(cv, &ct, cond.loc, ctx, b)?;

            let then_bb = b.new_block("then");
            let else_bb = else_block.as_ref().map(|_| b.new_block("else"));
            let merge = b.new_block("ifcont");

            b.cond_br(cb, then_bb, else_bb.unwrap_or(merge));

            b.set_block(then_bb);
            lower_block(then_block, ctx, b)?;
            if b.is_open() {
                b.br(merge);
            }

            if let (Some(else_bb), Some(else_block)) = (else_bb, else_block) {
                b.set_block(else_bb);
                lower_block(else_block, ctx, b)?;
                if b.is_open() {
                    b.br(merge);
                }
            }

            b.set_block(merge);
            Some(())
        }
        Stmt::While { cond, body, .. } => {
            let header = b.new_block("loop");
            let body_bb = b.new_block("body");
            let exit = b.new_block("afterloop");

            b.br(header);

            b.set_block(header);
            let (cv, ct) = lower_expr(cond, ctx, b)?;
            let cb = to_bool(cv, &ct, cond.loc, ctx, b)?;
            b.cond_br(cb, body_bb, exit);

            b.set_block(body_bb);
            lower_stmt(body, ctx, b)?;
            if b.is_open() {
                b.br(header);
            }

            b.set_block(exit);
            Some(())
        }
        Stmt::Return { value, loc } => lower_return(value.as_ref(), *loc, ctx, b),
    }
}

fn lower_return(value: Option<&Expr>, loc: Loc, ctx: &mut LowerCtx, b: &mut Builder) -> Option<()> {
    match value {
        Some(e) => {
            if ctx.cur_ret == SemType::Void {
                let fn_name = ctx.cur_fn.clone();
                ctx.semantic_err_with(
                    loc,
                    format!("void function '{}' returns a value", fn_name),
                    "remove the return value or change the return type".to_string(),
                );
                return None;
            }
            let (v, t) = lower_expr(e, ctx, b)?;
            let ret = ctx.cur_ret.clone();
            let v = if t == ret {
                v
            } else if is_narrowing(&t, &ret) {
                let fn_name = ctx.cur_fn.clone();
                ctx.type_err_with(
                    e.loc,
                    format!(
                        "return type mismatch in function '{}' - narrowing conversion not allowed",
                        fn_name
                    ),
                    format!("from: {}  to: {}", t, ret),
                );
                return None;
            } else {
                cast_widen(v, &t, &ret, "return value", e.loc, ctx, b)?
            };
            b.ret(ir_type(&ret), Some(v));
            Some(())
        }
        None => {
            if ctx.cur_ret != SemType::Void {
                let fn_name = ctx.cur_fn.clone();
                let ret = ctx.cur_ret.clone();
                ctx.semantic_err_with(
                    loc,
                    format!("non-void function '{}' returns no value", fn_name),
                    format!("function returns {}", ret),
                );
                return None;
            }
            b.ret(Ty::Void, None);
            Some(())
        }
    }
}

fn lower_expr(e: &Expr, ctx: &mut LowerCtx, b: &mut Builder) -> Option<(Val, SemType)> {
    match &e.kind {
        ExprKind::IntLit(v) => Some((Val::I32(*v), SemType::Int)),
        ExprKind::FloatLit(v) => Some((Val::F32(*v), SemType::Float)),
        ExprKind::BoolLit(v) => Some((Val::I1(*v), SemType::Bool)),
        ExprKind::Var(name) => lower_var_ref(name, e.loc, ctx, b),
        ExprKind::Unary { op, operand } => lower_unary(*op, operand, e.loc, ctx, b),
        ExprKind::Binary { op, lhs, rhs } => match op {
            BinOp::And => lower_and(lhs, rhs, e.loc, ctx, b),
            BinOp::Or => lower_or(lhs, rhs, e.loc, ctx, b),
            _ => lower_binary(*op, lhs, rhs, e.loc, ctx, b),
        },
        ExprKind::Call { callee, args } => lower_call(callee, args, e.loc, ctx, b),
        ExprKind::Assign { name, value } => lower_assign(name, value, e.loc, ctx, b),
        ExprKind::ArrayIndex { name, indices } => {
            let (ptr, elem) = lower_array_address(name, indices, e.loc, ctx, b)?;
            let v = b.load(ir_type(&elem), ptr, "arrayelem");
            Some((v, elem))
        }
        ExprKind::ArrayAssign { target, value } => {
            let (name, indices) = match &target.kind {
                ExprKind::ArrayIndex { name, indices } => (name, indices),
                _ => internal_error("array assignment target is not a subscript"),
            };
            debug::codegen(&format!("generating array assignment to '{}'", name));
            let (v, vt) = lower_expr(value, ctx, b)?;
            let (ptr, elem) = lower_array_address(name, indices, target.loc, ctx, b)?;
            let v = cast_store_value(v, &vt, &elem, "array assignment", value.loc, ctx, b)?;
            b.store(ir_type(&elem), v.clone(), ptr);
            Some((v, elem))
        }
    }
}

fn lower_var_ref(name: &str, loc: Loc, ctx: &mut LowerCtx, b: &mut Builder) -> Option<(Val, SemType)> {
    let sym = match ctx.sym.resolve(name) {
        Some(Resolved::Local(s)) | Some(Resolved::Global(s)) => s.clone(),
        None => {
            if ctx.sym.has_function(name) {
                ctx.scope_err(loc, format!("'{}' is a function, not a variable", name));
            } else {
                report_unknown_variable(name, loc, ctx);
            }
            return None;
        }
    };
    if sym.ty.is_array_like() {
        ctx.type_err_with(
            loc,
            format!("array '{}' cannot be used as a value", name),
            format!("subscript it; '{}' has type: {}", name, sym.ty),
        );
        return None;
    }
    let v = b.load(ir_type(&sym.ty), sym.ptr.clone(), name);
    Some((v, sym.ty))
}

fn report_unknown_variable(name: &str, loc: Loc, ctx: &mut LowerCtx) {
    let names = ctx.sym.visible_var_names();
    let suggestion = closest_match(name, names.iter().map(|s| s.as_str()));
    let context = suggestion
        .as_ref()
        .and_then(|s| {
            ctx.sym.symbol_info(s).map(|info| {
                format!("'{}' declared at {} with type {}", s, info.loc, info.type_name)
            })
        })
        .or_else(|| {
            if ctx.cur_fn.is_empty() {
                None
            } else {
                Some(format!("in function '{}'", ctx.cur_fn))
            }
        });
    ctx.log.error_with(
        ErrorClass::Scope,
        loc,
        format!("undefined variable '{}'", name),
        context,
        suggestion,
    );
}

fn lower_unary(
    op: UnOp,
    operand: &Expr,
    loc: Loc,
    ctx: &mut LowerCtx,
    b: &mut Builder,
) -> Option<(Val, SemType)> {
    debug::codegen(&format!("generating unary expression '{}'", op.symbol()));
    let (v, t) = lower_expr(operand, ctx, b)?;
    match op {
        UnOp::Neg => {
            if !t.is_numeric() {
                ctx.type_err_with(
                    loc,
                    "unary operator '-' requires a numeric operand".to_string(),
                    format!("got: {}", t),
                );
                return None;
            }
            match t {
                SemType::Float => Some((b.fneg(v, "fneg"), SemType::Float)),
                _ => Some((
                    b.bin(IrBin::Sub, Ty::I32, Val::I32(0), v, "neg"),
                    SemType::Int,
                )),
            }
        }
        UnOp::Not => {
            let bv = to_bool(v, &t, operand.loc, ctx, b)?;
            Some((
                b.bin(IrBin::Xor, Ty::I1, bv, Val::I1(true), "not"),
                SemType::Bool,
            ))
        }
    }
}

fn lower_binary(
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    loc: Loc,
    ctx: &mut LowerCtx,
    b: &mut Builder,
) -> Option<(Val, SemType)> {
    debug::codegen(&format!("generating binary expression '{}'", op.symbol()));
    let (lv, lt) = lower_expr(lhs, ctx, b)?;
    let (rv, rt) = lower_expr(rhs, ctx, b)?;

    if lt == SemType::Void || rt == SemType::Void {
        ctx.type_err(loc, "void value used in an expression");
        return None;
    }

    if op.is_arithmetic() {
        if lt == SemType::Bool || rt == SemType::Bool {
            ctx.type_err_with(
                loc,
                format!(
                    "arithmetic operator '{}' requires numeric operands (int or float), not bool",
                    op.symbol()
                ),
                format!("LHS: {}, RHS: {}", lt, rt),
            );
            return None;
        }
        if lt != rt {
            ctx.type_err_with(
                loc,
                format!(
                    "binary operator '{}' requires operands of the same type",
                    op.symbol()
                ),
                format!("cannot mix int and float; LHS: {}, RHS: {}", lt, rt),
            );
            return None;
        }
        if op == BinOp::Mod && lt == SemType::Float {
            ctx.type_err_with(
                loc,
                "modulo operator '%' requires integer operands".to_string(),
                format!("got: {}", lt),
            );
            return None;
        }
        if (op == BinOp::Div || op == BinOp::Mod) && rv.is_const_zero() {
            let what = if op == BinOp::Div { "division" } else { "modulo" };
            ctx.semantic_err_with(
                rhs.loc,
                format!("{} by zero detected", what),
                "constant zero divisor is not allowed".to_string(),
            );
            return None;
        }

        let is_float = lt == SemType::Float;
        let (ir_op, hint) = match (op, is_float) {
            (BinOp::Add, false) => (IrBin::Add, "add"),
            (BinOp::Add, true) => (IrBin::FAdd, "fadd"),
            (BinOp::Sub, false) => (IrBin::Sub, "sub"),
            (BinOp::Sub, true) => (IrBin::FSub, "fsub"),
            (BinOp::Mul, false) => (IrBin::Mul, "mul"),
            (BinOp::Mul, true) => (IrBin::FMul, "fmul"),
            (BinOp::Div, false) => (IrBin::SDiv, "sdiv"),
            (BinOp::Div, true) => (IrBin::FDiv, "fdiv"),
            (BinOp::Mod, false) => (IrBin::SRem, "mod"),
            _ => internal_error("unexpected arithmetic operator"),
        };
        let ty = if is_float { Ty::F32 } else { Ty::I32 };
        let out = b.bin(ir_op, ty, lv, rv, hint);
        return Some((out, lt));
    }

    if op.is_comparison() {
        let (lv, rv, common) = promote_operands(lv, lt, rv, rt, ctx, b);
        let out = match common {
            SemType::Float => {
                let (pred, hint) = match op {
                    BinOp::Lt => (FCmpPred::Olt, "flt"),
                    BinOp::Le => (FCmpPred::Ole, "fle"),
                    BinOp::Gt => (FCmpPred::Ogt, "fgt"),
                    BinOp::Ge => (FCmpPred::Oge, "fge"),
                    BinOp::Eq => (FCmpPred::Oeq, "feq"),
                    BinOp::Ne => (FCmpPred::One, "fne"),
                    _ => internal_error("unexpected comparison operator"),
                };
                b.fcmp(pred, lv, rv, hint)
            }
            common => {
                let ty = ir_type(&common);
                let (pred, hint) = match op {
                    BinOp::Lt => (ICmpPred::Slt, "lt"),
                    BinOp::Le => (ICmpPred::Sle, "le"),
                    BinOp::Gt => (ICmpPred::Sgt, "gt"),
                    BinOp::Ge => (ICmpPred::Sge, "ge"),
                    BinOp::Eq => (ICmpPred::Eq, "eq"),
                    BinOp::Ne => (ICmpPred::Ne, "ne"),
                    _ => internal_error("unexpected comparison operator"),
                };
                b.icmp(pred, ty, lv, rv, hint)
            }
        };
        return Some((out, SemType::Bool));
    }

    internal_error("logical operator reached lower_binary")
}

/// Promote two scalar operands to their common type along the widening
/// chain. Used by comparisons, where mixing is allowed.
fn promote_operands(
    lv: Val,
    lt: SemType,
    rv: Val,
    rt: SemType,
    _ctx: &mut LowerCtx,
    b: &mut Builder,
) -> (Val, Val, SemType) {
    if lt == rt {
        return (lv, rv, lt);
    }
    debug::verbose(&format!("promoting operands: {} / {}", lt, rt));
    match (&lt, &rt) {
        (SemType::Float, SemType::Int) => {
            let rv = b.sitofp(Ty::I32, rv, Ty::F32, "itof");
            (lv, rv, SemType::Float)
        }
        (SemType::Int, SemType::Float) => {
            let lv = b.sitofp(Ty::I32, lv, Ty::F32, "itof");
            (lv, rv, SemType::Float)
        }
        (SemType::Int, SemType::Bool) => {
            let rv = b.zext(Ty::I1, rv, Ty::I32, "btoi");
            (lv, rv, SemType::Int)
        }
        (SemType::Bool, SemType::Int) => {
            let lv = b.zext(Ty::I1, lv, Ty::I32, "btoi");
            (lv, rv, SemType::Int)
        }
        (SemType::Float, SemType::Bool) => {
            let rv = b.zext(Ty::I1, rv, Ty::I32, "btoi");
            let rv = b.sitofp(Ty::I32, rv, Ty::F32, "itof");
            (lv, rv, SemType::Float)
        }
        (SemType::Bool, SemType::Float) => {
            let lv = b.zext(Ty::I1, lv, Ty::I32, "btoi");
            let lv = b.sitofp(Ty::I32, lv, Ty::F32, "itof");
            (lv, rv, SemType::Float)
        }
        _ => (lv, rv, lt),
    }
}

// Short-circuit '&&': the right operand only evaluates when the left was
// true; a phi join yields the result.
fn lower_and(
    lhs: &Expr,
    rhs: &Expr,
    _loc: Loc,
    ctx: &mut LowerCtx,
    b: &mut Builder,
) -> Option<(Val, SemType)> {
    let (lv, lt) = lower_expr(lhs, ctx, b)?;
    let la = to_bool(lv, &lt, lhs.loc, ctx, b)?;

    let rhs_b = b.new_block("and_rhs");
    let short_b = b.new_block("and_short");
    let join_b = b.new_block("and_join");

    b.cond_br(la.clone(), rhs_b, short_b);

    b.set_block(short_b);
    b.br(join_b);

    b.set_block(rhs_b);
    let (rv, rt) = lower_expr(rhs, ctx, b)?;
    let ra = to_bool(rv, &rt, rhs.loc, ctx, b)?;
    let rhs_end = b.cur_block();
    b.br(join_b);

    b.set_block(join_b);
    let out = b.phi(Ty::I1, vec![(la, short_b), (ra, rhs_end)], "and");
    Some((out, SemType::Bool))
}

// Short-circuit '||': the right operand only evaluates when the left was
// false.
fn lower_or(
    lhs: &Expr,
    rhs: &Expr,
    _loc: Loc,
    ctx: &mut LowerCtx,
    b: &mut Builder,
) -> Option<(Val, SemType)> {
    let (lv, lt) = lower_expr(lhs, ctx, b)?;
    let la = to_bool(lv, &lt, lhs.loc, ctx, b)?;

    let short_b = b.new_block("or_short");
    let rhs_b = b.new_block("or_rhs");
    let join_b = b.new_block("or_join");

    b.cond_br(la.clone(), short_b, rhs_b);

    b.set_block(short_b);
    b.br(join_b);

    b.set_block(rhs_b);
    let (rv, rt) = lower_expr(rhs, ctx, b)?;
    let ra = to_bool(rv, &rt, rhs.loc, ctx, b)?;
    let rhs_end = b.cur_block();
    b.br(join_b);

    b.set_block(join_b);
    let out = b.phi(Ty::I1, vec![(la, short_b), (ra, rhs_end)], "or");
    Some((out, SemType::Bool))
}

fn lower_call(
    callee: &str,
    args: &[Expr],
    loc: Loc,
    ctx: &mut LowerCtx,
    b: &mut Builder,
) -> Option<(Val, SemType)> {
    debug::codegen(&format!("generating call to '{}'", callee));
    let sig = match ctx.sym.function(callee) {
        Some(sig) => sig.clone(),
        None => {
            let names: Vec<String> = ctx.sym.function_names().map(|s| s.to_string()).collect();
            let suggestion = closest_match(callee, names.iter().map(|s| s.as_str()));
            ctx.log.error_with(
                ErrorClass::Scope,
                loc,
                format!("call to undefined function '{}'", callee),
                None,
                suggestion,
            );
            return None;
        }
    };

    if args.len() != sig.params.len() {
        ctx.type_err_with(
            loc,
            format!(
                "function '{}' expects {} argument(s), {} given",
                callee,
                sig.params.len(),
                args.len()
            ),
            format!("declared at {}", sig.loc),
        );
        return None;
    }

    let mut lowered: Vec<(Ty, Val)> = Vec::with_capacity(args.len());
    for (i, (arg, pty)) in args.iter().zip(sig.params.iter()).enumerate() {
        let (av, at) = lower_expr(arg, ctx, b)?;
        let av = cast_store_value(
            av,
            &at,
            pty,
            &format!("function call argument {}", i + 1),
            arg.loc,
            ctx,
            b,
        )?;
        lowered.push((ir_type(pty), av));
    }

    let ret_ty = ir_type(&sig.ret);
    match b.call(ret_ty, callee, lowered, "calltmp") {
        Some(v) => Some((v, sig.ret)),
        None => Some((Val::I32(0), SemType::Void)),
    }
}

fn lower_assign(
    name: &str,
    value: &Expr,
    loc: Loc,
    ctx: &mut LowerCtx,
    b: &mut Builder,
) -> Option<(Val, SemType)> {
    debug::codegen(&format!("generating assignment to '{}'", name));
    let (v, vt) = lower_expr(value, ctx, b)?;

    let sym = match ctx.sym.resolve(name) {
        Some(Resolved::Local(s)) | Some(Resolved::Global(s)) => s.clone(),
        None => {
            if ctx.sym.has_function(name) {
                ctx.scope_err(loc, format!("'{}' is a function, not a variable", name));
            } else {
                report_unknown_variable(name, loc, ctx);
            }
            return None;
        }
    };
    if !sym.ty.is_scalar() {
        ctx.type_err_with(
            loc,
            format!("cannot assign to array '{}' without a subscript", name),
            format!("'{}' has type: {}", name, sym.ty),
        );
        return None;
    }

    let v = cast_store_value(v, &vt, &sym.ty, "assignment", value.loc, ctx, b)?;
    b.store(ir_type(&sym.ty), v.clone(), sym.ptr.clone());
    Some((v, sym.ty))
}

/// Compute the element pointer for a subscripted name. Direct arrays get a
/// single GEP with a leading constant 0; decayed parameters load their base
/// pointer first and chain one GEP per subscript.
fn lower_array_address(
    name: &str,
    indices: &[Expr],
    loc: Loc,
    ctx: &mut LowerCtx,
    b: &mut Builder,
) -> Option<(Val, SemType)> {
    debug::codegen(&format!("generating array access to '{}'", name));
    let sym = match ctx.sym.resolve(name) {
        Some(Resolved::Local(s)) | Some(Resolved::Global(s)) => s.clone(),
        None => {
            report_unknown_variable(name, loc, ctx);
            return None;
        }
    };

    match &sym.ty {
        SemType::Array(elem, dims) => {
            if indices.len() != dims.len() {
                ctx.type_err_with(
                    loc,
                    format!(
                        "array dimension mismatch for '{}': array has {} dimension(s), but accessed with {} index/indices",
                        name,
                        dims.len(),
                        indices.len()
                    ),
                    format!("array type: {}", sym.ty),
                );
                return None;
            }
            let mut gep_indices = vec![Val::I32(0)];
            for idx in indices {
                gep_indices.push(lower_index(idx, name, ctx, b)?);
            }
            let base_ty = Ty::nested_array(ir_type(elem), dims);
            let ptr = b.gep(base_ty, sym.ptr.clone(), gep_indices, "arrayidx");
            Some((ptr, (**elem).clone()))
        }
        SemType::Pointer(elem, inner) => {
            // Sizes are not tracked statically past the inner dimensions, so
            // no count check applies here.
            let base = b.load(Ty::Ptr, sym.ptr.clone(), &format!("{}_ptr", name));
            let mut idx_vals = Vec::with_capacity(indices.len());
            for idx in indices {
                idx_vals.push(lower_index(idx, name, ctx, b)?);
            }
            if idx_vals.len() == 1 {
                let ptr = b.gep(ir_type(elem), base, idx_vals, "arrayidx");
                return Some((ptr, (**elem).clone()));
            }
            // One GEP per subscript: the first walks whole inner rows, the
            // rest walk elements.
            let row_ty = Ty::nested_array(ir_type(elem), inner);
            let mut cur = base;
            for (i, idx) in idx_vals.into_iter().enumerate() {
                let step_ty = if i == 0 { row_ty.clone() } else { ir_type(elem) };
                cur = b.gep(step_ty, cur, vec![idx], "arrayidx");
            }
            Some((cur, (**elem).clone()))
        }
        _ => {
            ctx.type_err_with(
                loc,
                "subscript operator [] requires an array or pointer type, got a scalar".to_string(),
                format!("variable '{}' has type: {}", name, sym.ty),
            );
            None
        }
    }
}

/// Lower one subscript expression: must be int; bool widens, float is
/// rejected.
fn lower_index(idx: &Expr, array_name: &str, ctx: &mut LowerCtx, b: &mut Builder) -> Option<Val> {
    let (v, t) = lower_expr(idx, ctx, b)?;
    match t {
        SemType::Int => Some(v),
        SemType::Bool => {
            debug::verbose("converting bool index to int");
            Some(b.zext(Ty::I1, v, Ty::I32, "booltoint"))
        }
        SemType::Float => {
            ctx.type_err_with(
                idx.loc,
                "array index must be integer type, not float".to_string(),
                format!("index for array '{}'", array_name),
            );
            None
        }
        other => {
            ctx.type_err_with(
                idx.loc,
                "array index must be integer type".to_string(),
                format!("got: {}", other),
            );
            None
        }
    }
}

/// Coerce a value to a bool for conditions and logical operators. `int` and
/// `float` compare against zero; anything else is a type error.
fn to_bool(v: Val, t: &SemType, loc: Loc, ctx: &mut LowerCtx, b: &mut Builder) -> Option<Val> {
    match t {
        SemType::Bool => Some(v),
        SemType::Int => {
            debug::verbose("converting int to bool");
            Some(b.icmp(ICmpPred::Ne, Ty::I32, v, Val::I32(0), "tobool"))
        }
        SemType::Float => {
            debug::verbose("converting float to bool");
            Some(b.fcmp(FCmpPred::One, v, Val::F32(0.0), "tobool"))
        }
        other => {
            ctx.type_err_with(
                loc,
                format!("cannot convert {} to bool", other),
                "conditions take int, float or bool".to_string(),
            );
            None
        }
    }
}

/// Widen a value to a storage target type (assignment RHS, call argument,
/// return value, array element store). Narrowing is rejected here.
fn cast_store_value(
    v: Val,
    from: &SemType,
    to: &SemType,
    context: &str,
    loc: Loc,
    ctx: &mut LowerCtx,
    b: &mut Builder,
) -> Option<Val> {
    if from == to {
        return Some(v);
    }
    if is_narrowing(from, to) {
        ctx.type_err_with(
            loc,
            format!("narrowing conversion not allowed in {}", context),
            format!("from: {}  to: {}", from, to),
        );
        return None;
    }
    cast_widen(v, from, to, context, loc, ctx, b)
}

fn cast_widen(
    v: Val,
    from: &SemType,
    to: &SemType,
    context: &str,
    loc: Loc,
    ctx: &mut LowerCtx,
    b: &mut Builder,
) -> Option<Val> {
    debug::verbose(&format!("type conversion needed: {} -> {}", from, to));
    match (from, to) {
        (SemType::Int, SemType::Float) => Some(b.sitofp(Ty::I32, v, Ty::F32, "itof")),
        (SemType::Bool, SemType::Int) => Some(b.zext(Ty::I1, v, Ty::I32, "btoi")),
        (SemType::Bool, SemType::Float) => {
            let as_int = b.zext(Ty::I1, v, Ty::I32, "btoi");
            Some(b.sitofp(Ty::I32, as_int, Ty::F32, "itof"))
        }
        _ => {
            ctx.type_err_with(
                loc,
                format!("cannot convert between types in {}", context),
                format!("from: {}  to: {}", from, to),
            );
            None
        }
    }
}
