//! Value Inference Engine
//!
//! Resolves the effective value of every constant in a `const` declaration
//! using Go's rules: `iota` counts value specs from zero, a spec without
//! type and values repeats the previous spec, and constant expressions are
//! folded over the members declared before them.

use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use crate::frontend::ast::{BinOp, ConstDecl, Expr, Ident, UnaryOp, ValueSpec};
use crate::utils::{Error, Result};

/// Where a member's value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Integer (or rune) literal written directly
    Literal,
    /// Bare `iota`, or no expression at all
    Counter,
    /// Constant expression folded at generation time
    Expression,
    /// Expression the engine cannot fold; the counter stands in
    Fallback,
}

/// One member of a const declaration with its resolved value
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConst {
    pub ident: Ident,
    /// Declared type, inherited when the spec repeats the previous one
    pub ty: Option<String>,
    pub value: i64,
    pub source: ValueSource,
    /// Index of the value spec that declares the member
    pub spec: usize,
}

/// Resolve every member of a const declaration in declaration order.
pub fn resolve(decl: &ConstDecl) -> Result<Vec<ResolvedConst>> {
    let mut resolved = Vec::new();
    let mut env: HashMap<String, i64> = HashMap::new();
    let mut counter: i64 = -1;
    let mut previous: Option<&ValueSpec> = None;

    for (index, spec) in decl.specs.iter().enumerate() {
        counter += 1;

        // Implicit repetition: `b` after `a T = iota` means `b T = iota`
        let repeated = spec.ty.is_none() && spec.values.is_empty();
        let (ty, values) = match previous {
            Some(prev) if repeated => (prev.ty.as_ref(), prev.values.as_slice()),
            _ => (spec.ty.as_ref(), spec.values.as_slice()),
        };
        if !repeated {
            previous = Some(spec);
        }

        for (i, ident) in spec.names.iter().enumerate() {
            let (value, source) = match values.get(i) {
                None => (counter, ValueSource::Counter),
                Some(expr) => resolve_expr(expr, counter, &env, &ident.name)?,
            };

            if source != ValueSource::Fallback {
                env.insert(ident.name.clone(), value);
            }
            resolved.push(ResolvedConst {
                ident: ident.clone(),
                ty: ty.map(|t| t.name.clone()),
                value,
                source,
                spec: index,
            });
        }
    }

    Ok(resolved)
}

fn resolve_expr(
    expr: &Expr,
    iota: i64,
    env: &HashMap<String, i64>,
    name: &str,
) -> Result<(i64, ValueSource)> {
    match expr {
        Expr::Int(n, _) => Ok((*n, ValueSource::Literal)),
        Expr::Char(c, _) => Ok((*c as i64, ValueSource::Literal)),
        Expr::BigInt(text, span) => Err(Error::IntegerOutOfRange {
            text: text.clone(),
            span: *span,
        }),
        Expr::Ident(ident) if ident.name == "iota" => Ok((iota, ValueSource::Counter)),
        Expr::Unary { op: UnaryOp::Neg, operand, span } => match operand.as_ref() {
            Expr::Int(..) => match eval(expr, iota, env) {
                Some(value) => Ok((value, ValueSource::Literal)),
                None => Ok((iota, ValueSource::Fallback)),
            },
            // The magnitude of i64::MIN does not fit in an i64 on its own
            Expr::BigInt(text, _) if text.replace('_', "") == "9223372036854775808" => {
                Ok((i64::MIN, ValueSource::Literal))
            }
            Expr::BigInt(text, _) => Err(Error::IntegerOutOfRange {
                text: format!("-{}", text),
                span: *span,
            }),
            _ => Ok(fold(expr, iota, env, name)),
        },
        _ => Ok(fold(expr, iota, env, name)),
    }
}

/// Value of a constant expression, or the counter when it cannot be folded
fn fold(expr: &Expr, iota: i64, env: &HashMap<String, i64>, name: &str) -> (i64, ValueSource) {
    match eval(expr, iota, env) {
        Some(value) => (value, ValueSource::Expression),
        None => {
            debug!(
                "line {}: cannot fold the value of `{}`, using counter {}",
                expr.span().line,
                name,
                iota
            );
            (iota, ValueSource::Fallback)
        }
    }
}

/// Fold a constant integer expression. `None` when the expression is not an
/// integer constant the engine understands or the arithmetic overflows.
pub fn eval(expr: &Expr, iota: i64, env: &HashMap<String, i64>) -> Option<i64> {
    match expr {
        Expr::Int(n, _) => Some(*n),
        Expr::Char(c, _) => Some(*c as i64),
        Expr::Float(f, _) => {
            // `1e3` is an integer constant in Go
            if f.fract() == 0.0 && f.abs() < 9.2e18 {
                Some(*f as i64)
            } else {
                None
            }
        }
        Expr::BigInt(..) | Expr::Str(..) => None,
        Expr::Ident(ident) if ident.name == "iota" => Some(iota),
        Expr::Ident(ident) => env.get(&ident.name).copied(),
        Expr::Paren(inner, _) => eval(inner, iota, env),
        Expr::Unary { op, operand, .. } => {
            let value = eval(operand, iota, env)?;
            match op {
                UnaryOp::Neg => value.checked_neg(),
                UnaryOp::Plus => Some(value),
                UnaryOp::BitNot => Some(!value),
                UnaryOp::Not => None,
            }
        }
        Expr::Binary { left, op, right, .. } => {
            let l = eval(left, iota, env)?;
            let r = eval(right, iota, env)?;
            eval_binary(*op, l, r)
        }
        Expr::Call { callee, args, .. } => {
            let [arg] = args.as_slice() else {
                return None;
            };
            match (callee.as_ref(), arg) {
                (Expr::Ident(f), Expr::Str(s, _)) if f.name == "len" => i64::try_from(s.len()).ok(),
                // Conversion `T(x)`
                (Expr::Ident(_), _) => eval(arg, iota, env),
                _ => None,
            }
        }
    }
}

fn eval_binary(op: BinOp, l: i64, r: i64) -> Option<i64> {
    match op {
        BinOp::Add => l.checked_add(r),
        BinOp::Sub => l.checked_sub(r),
        BinOp::Mul => l.checked_mul(r),
        BinOp::Div => l.checked_div(r),
        BinOp::Mod => l.checked_rem(r),
        BinOp::BitAnd => Some(l & r),
        BinOp::BitOr => Some(l | r),
        BinOp::BitXor => Some(l ^ r),
        BinOp::AndNot => Some(l & !r),
        BinOp::Shl => {
            let shift = u32::try_from(r).ok()?;
            if shift >= 63 {
                return if l == 0 { Some(0) } else { None };
            }
            l.checked_mul(1i64 << shift)
        }
        BinOp::Shr => {
            let shift = u32::try_from(r).ok()?;
            Some(if shift >= 64 { if l < 0 { -1 } else { 0 } } else { l >> shift })
        }
        // Comparisons and logic produce booleans
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::And
        | BinOp::Or => None,
    }
}
