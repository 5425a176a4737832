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

use crate::ast::TypeSpec;

/// Semantic type of a name or expression.
///
/// Expressions only ever carry the scalar variants (or `Void` for a call to a
/// void function). `Array` is the type of a declared array variable;
/// `Pointer` is the type of an array parameter after decay, keeping the inner
/// (non-leading) dimensions for multi-dimensional addressing.
#[derive(Clone, Debug, PartialEq)]
pub enum SemType {
    Int,
    Float,
    Bool,
    Void,
    Array(Box<SemType>, Vec<i32>),
    Pointer(Box<SemType>, Vec<i32>),
}

impl SemType {
    pub fn scalar(spec: TypeSpec) -> SemType {
        match spec {
            TypeSpec::Int => SemType::Int,
            TypeSpec::Float => SemType::Float,
            TypeSpec::Bool => SemType::Bool,
            TypeSpec::Void => SemType::Void,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, SemType::Int | SemType::Float | SemType::Bool)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SemType::Int | SemType::Float)
    }

    pub fn is_array_like(&self) -> bool {
        matches!(self, SemType::Array(..) | SemType::Pointer(..))
    }
}

impl fmt::Display for SemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemType::Int => write!(f, "int"),
            SemType::Float => write!(f, "float"),
            SemType::Bool => write!(f, "bool"),
            SemType::Void => write!(f, "void"),
            SemType::Array(elem, dims) => {
                write!(f, "{}", elem)?;
                for d in dims {
                    write!(f, "[{}]", d)?;
                }
                Ok(())
            }
            SemType::Pointer(elem, inner) => {
                write!(f, "{}*", elem)?;
                for d in inner {
                    write!(f, "[{}]", d)?;
                }
                Ok(())
            }
        }
    }
}

/// Lossless conversions along `bool -> int -> float`, in that direction only.
pub fn is_widening(from: &SemType, to: &SemType) -> bool {
    matches!(
        (from, to),
        (SemType::Int, SemType::Float)
            | (SemType::Bool, SemType::Int)
            | (SemType::Bool, SemType::Float)
    )
}

/// Conversions going against the widening chain. These are never applied
/// implicitly; conditions get a dedicated to-bool coercion instead.
pub fn is_narrowing(from: &SemType, to: &SemType) -> bool {
    matches!(
        (from, to),
        (SemType::Float, SemType::Int)
            | (SemType::Int, SemType::Bool)
            | (SemType::Float, SemType::Bool)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_chain_is_directional() {
        assert!(is_widening(&SemType::Bool, &SemType::Int));
        assert!(is_widening(&SemType::Bool, &SemType::Float));
        assert!(is_widening(&SemType::Int, &SemType::Float));

        assert!(!is_widening(&SemType::Int, &SemType::Bool));
        assert!(!is_widening(&SemType::Float, &SemType::Int));
        assert!(!is_widening(&SemType::Float, &SemType::Bool));
        assert!(!is_widening(&SemType::Int, &SemType::Int));
    }

    #[test]
    fn narrowing_is_the_reverse_chain() {
        assert!(is_narrowing(&SemType::Float, &SemType::Int));
        assert!(is_narrowing(&SemType::Int, &SemType::Bool));
        assert!(is_narrowing(&SemType::Float, &SemType::Bool));

        assert!(!is_narrowing(&SemType::Bool, &SemType::Int));
        assert!(!is_narrowing(&SemType::Int, &SemType::Float));
        assert!(!is_narrowing(&SemType::Int, &SemType::Int));
    }

    #[test]
    fn type_strings_for_diagnostics() {
        assert_eq!(SemType::Int.to_string(), "int");
        let arr = SemType::Array(Box::new(SemType::Int), vec![10, 5]);
        assert_eq!(arr.to_string(), "int[10][5]");
        let ptr = SemType::Pointer(Box::new(SemType::Float), vec![5]);
        assert_eq!(ptr.to_string(), "float*[5]");
    }
}
