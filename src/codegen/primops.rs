//! Primitive-operator registry.
//!
//! Two independent symbol tables keyed by the Scheme operator name:
//! numeric (binary `+ - * =`, unary `zero?`) and string
//! (`string-append`, `string=?`). Each entry yields the tag of the
//! result value and a one-line C++ template over already-lowered
//! operand identifiers. Primitives are computed inline at the call
//! site instead of going through closure dispatch.

use super::{CodegenError, Result};

/// Tag of a runtime value in the emitted program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTag {
    Num,
    Lam,
    Str,
}

impl ValueTag {
    /// The emitted enumerator name.
    pub fn as_cpp(self) -> &'static str {
        match self {
            ValueTag::Num => "NUM",
            ValueTag::Lam => "LAM",
            ValueTag::Str => "STR",
        }
    }
}

/// Numeric table: maps an operator to its C++ infix spelling.
fn num_binary(op: &str) -> Option<&'static str> {
    match op {
        "+" => Some("+"),
        "-" => Some("-"),
        "*" => Some("*"),
        "=" => Some("=="),
        _ => None,
    }
}

/// Numeric unary table: maps an operator to a postfix comparison.
fn num_unary(op: &str) -> Option<&'static str> {
    match op {
        "zero?" => Some("== 0"),
        _ => None,
    }
}

fn in_num_table(op: &str) -> bool {
    num_binary(op).is_some() || num_unary(op).is_some()
}

fn in_str_table(op: &str) -> bool {
    matches!(op, "string-append" | "string=?")
}

/// True if `name` is recognized by either primitive table.
pub fn is_primop(name: &str) -> bool {
    in_num_table(name) || in_str_table(name)
}

/// Instantiate a primitive over lowered operand identifiers.
///
/// Returns the tag of the result stored in `dst` and the operation
/// text. Fails if the operator is absent from both tables, or if the
/// operand count does not match the table the operator lives in.
pub fn apply_primop(op: &str, dst: &str, args: &[&str]) -> Result<(ValueTag, String)> {
    if in_num_table(op) {
        apply_num(op, dst, args)
    } else if in_str_table(op) {
        apply_str(op, dst, args)
    } else {
        Err(CodegenError::UnknownPrimitive(op.to_string()))
    }
}

fn apply_num(op: &str, dst: &str, args: &[&str]) -> Result<(ValueTag, String)> {
    match args {
        [lhs] => {
            let spelled = num_unary(op).ok_or_else(|| CodegenError::PrimitiveArity {
                op: op.to_string(),
                got: 1,
            })?;
            Ok((
                ValueTag::Num,
                format!("{}->num = {}->num {};", dst, lhs, spelled),
            ))
        }
        [lhs, rhs] => {
            let spelled = num_binary(op).ok_or_else(|| CodegenError::PrimitiveArity {
                op: op.to_string(),
                got: 2,
            })?;
            Ok((
                ValueTag::Num,
                format!("{}->num = {}->num {} {}->num;", dst, lhs, spelled, rhs),
            ))
        }
        _ => Err(CodegenError::PrimitiveArity {
            op: op.to_string(),
            got: args.len(),
        }),
    }
}

fn apply_str(op: &str, dst: &str, args: &[&str]) -> Result<(ValueTag, String)> {
    let (lhs, rhs) = match args {
        [lhs, rhs] => (lhs, rhs),
        // no unary entries in the string table
        _ => {
            return Err(CodegenError::PrimitiveArity {
                op: op.to_string(),
                got: args.len(),
            })
        }
    };
    match op {
        "string-append" => Ok((
            ValueTag::Str,
            format!(
                "{dst}->str = std::make_shared<std::string>(*{lhs}->str);\n{dst}->str->append(*{rhs}->str);",
                dst = dst,
                lhs = lhs,
                rhs = rhs
            ),
        )),
        // inequality test, result is a number
        "string=?" => Ok((
            ValueTag::Num,
            format!(
                "{}->num = {}->str->compare(*{}->str) != 0;",
                dst, lhs, rhs
            ),
        )),
        _ => Err(CodegenError::UnknownPrimitive(op.to_string())),
    }
}
