//! Free-variable ("hole") analysis.
//!
//! One post-order traversal over the CPS tree computes, per lambda
//! node, the ordered set of identifiers it must capture from its
//! defining environment. A single running set of currently-free names
//! is threaded through the whole walk: a variable reference adds its
//! name (unless it names a primitive operator), and a lambda records
//! the running set minus its own parameters as its holes, then strips
//! those parameters from the set; they are bound for everything above
//! this point.
//!
//! Resolution is purely name-based; see the precondition on
//! [`crate::ast::Lambda`] about parameter-name reuse.

use std::collections::HashMap;

use crate::ast::{Expr, Ident};

use super::lift::HALT_NAME;
use super::primops::is_primop;

/// Lambda name → ordered hole names, first free occurrence first.
pub type HoleMap = HashMap<Ident, Vec<Ident>>;

/// Compute the hole set of every lambda in `root`.
///
/// Infallible: `Expr` is a closed enum, so the "unrecognized node
/// kind" failure the original design guarded against cannot arise.
pub fn compute_holes(root: &Expr) -> HoleMap {
    let mut map = HoleMap::new();
    let mut running: Vec<Ident> = Vec::new();
    walk(root, &mut running, &mut map);
    map
}

fn walk(expr: &Expr, running: &mut Vec<Ident>, map: &mut HoleMap) {
    match expr {
        Expr::Var(name) => {
            if !is_primop(name) && !running.contains(name) {
                running.push(name.clone());
            }
        }
        Expr::Num(_) | Expr::Bool(_) | Expr::Str(_) | Expr::Void => {}
        Expr::Lam(lam) => {
            walk(&lam.body, running, map);
            let holes = if lam.name == HALT_NAME {
                // the halt continuation is zero-capture by definition
                Vec::new()
            } else {
                running
                    .iter()
                    .filter(|name| !lam.params.contains(name))
                    .cloned()
                    .collect()
            };
            map.insert(lam.name.clone(), holes);
            running.retain(|name| !lam.params.contains(name));
        }
        Expr::App { func, args } => {
            for arg in args {
                walk(arg, running, map);
            }
            walk(func, running, map);
        }
        Expr::If {
            cond,
            then_exp,
            else_exp,
        } => {
            walk(cond, running, map);
            walk(then_exp, running, map);
            walk(else_exp, running, map);
        }
        Expr::LetRec { bindings, body } => {
            for (_, value) in bindings {
                walk(value, running, map);
            }
            walk(body, running, map);
        }
        // transparent pass-throughs; the lowerer rejects these later
        Expr::Seq(exps) => {
            for e in exps {
                walk(e, running, map);
            }
        }
        Expr::Assign { value, .. } => walk(value, running, map),
        Expr::AssignThen {
            value, then_exp, ..
        } => {
            walk(value, running, map);
            walk(then_exp, running, map);
        }
    }
}
