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

use std::fmt;

/// Source location of a token or node (1-based line and column).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Loc {
    pub line: u32,
    pub col: u32,
}

impl Loc {
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Location for module-level diagnostics with no precise position.
    pub fn none() -> Self {
        Self { line: 0, col: 0 }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A type as written in the source. Resolution to a semantic type (including
/// array and decayed-pointer shapes) happens in `types`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeSpec {
    Int,
    Float,
    Bool,
    Void,
}

impl TypeSpec {
    pub fn name(&self) -> &'static str {
        match self {
            TypeSpec::Int => "int",
            TypeSpec::Float => "float",
            TypeSpec::Bool => "bool",
            TypeSpec::Void => "void",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Neg, // -
    Not, // !
}

impl UnOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq | BinOp::Ne
        )
    }
}

#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: Loc,
}

impl Expr {
    pub fn new(kind: ExprKind, loc: Loc) -> Self {
        Self { kind, loc }
    }

    /// True for variable and array assignments. Used by the parser to reject
    /// assignments in `if`/`while` conditions.
    pub fn is_assignment(&self) -> bool {
        matches!(self.kind, ExprKind::Assign { .. } | ExprKind::ArrayAssign { .. })
    }

    /// True for a subscript expression; the parser promotes one to an array
    /// assignment when it is followed by `=`.
    pub fn is_array_access(&self) -> bool {
        matches!(self.kind, ExprKind::ArrayIndex { .. })
    }
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    IntLit(i32),
    FloatLit(f32),
    BoolLit(bool),
    Var(String),
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    Assign {
        name: String,
        value: Box<Expr>,
    },
    /// `name[i]`, `name[i][j]` or `name[i][j][k]`.
    ArrayIndex {
        name: String,
        indices: Vec<Expr>,
    },
    /// `name[i]... = value`. The target is always an `ArrayIndex`.
    ArrayAssign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
}

#[derive(Clone, Debug)]
pub enum Stmt {
    Expr(Expr),
    Block(Block),
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
        loc: Loc,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        loc: Loc,
    },
    Return {
        value: Option<Expr>,
        loc: Loc,
    },
}

/// `{ local_decls stmt_list }`. Local declarations precede all statements.
#[derive(Clone, Debug)]
pub struct Block {
    pub decls: Vec<LocalDecl>,
    pub stmts: Vec<Stmt>,
}

/// A local variable or array declaration. `dims` is empty for scalars;
/// otherwise it holds 1 to 3 sizes, outermost first.
#[derive(Clone, Debug)]
pub struct LocalDecl {
    pub name: String,
    pub ty: TypeSpec,
    pub dims: Vec<i32>,
    pub loc: Loc,
}

impl LocalDecl {
    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }
}

/// A function parameter. `dims` records array brackets in source order; sizes
/// are optional in parameter position (`int a[]` is allowed). The leading
/// dimension is discarded by decay.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub ty: TypeSpec,
    pub dims: Vec<Option<i32>>,
    pub loc: Loc,
}

impl Param {
    pub fn is_array(&self) -> bool {
        !self.dims.is_empty()
    }

    /// The dimensions kept after decay (everything but the first).
    pub fn inner_dims(&self) -> Vec<i32> {
        self.dims.iter().skip(1).map(|d| d.unwrap_or(0)).collect()
    }
}

#[derive(Clone, Debug)]
pub struct FnProto {
    pub name: String,
    pub ret: TypeSpec,
    pub params: Vec<Param>,
    pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct FnDef {
    pub proto: FnProto,
    pub body: Block,
}

/// One top-level declaration, handed to lowering as soon as it is parsed.
#[derive(Clone, Debug)]
pub enum Item {
    /// `extern type IDENT ( params ) ;`
    Extern(FnProto),
    /// `type IDENT ( params ) ;` forward declaration.
    Proto(FnProto),
    Function(FnDef),
    GlobalVar {
        name: String,
        ty: TypeSpec,
        loc: Loc,
    },
    GlobalArray {
        name: String,
        ty: TypeSpec,
        dims: Vec<i32>,
        loc: Loc,
    },
}

impl Item {
    pub fn name(&self) -> &str {
        match self {
            Item::Extern(p) | Item::Proto(p) => &p.name,
            Item::Function(f) => &f.proto.name,
            Item::GlobalVar { name, .. } | Item::GlobalArray { name, .. } => name,
        }
    }
}
