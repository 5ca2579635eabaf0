//! Expression lowering.
//!
//! The central recursive transform: every CPS expression becomes a
//! [`Fragment`]: a value identifier plus an ordered list of
//! declaration/operation pairs. Fragments compose by concatenation
//! only: a parent appends its children's steps in evaluation order and
//! then its own pair, never re-deriving a child's side effects. The
//! emitter later splits the list into all declarations followed by all
//! operations, which is what lets a recursive-binding block's slots be
//! declared by name before the operations that materialize (or
//! capture) them run.

use crate::ast::{Expr, Ident, Lambda, NameGen};

use super::holes::compute_holes;
use super::lift::LambdaLifter;
use super::primops::{apply_primop, is_primop};
use super::{CodegenError, Result};

/// One declaration/operation pair. Either side may be empty.
#[derive(Debug, Clone, Default)]
pub struct Step {
    pub decl: String,
    pub op: String,
}

/// A lowered expression: steps whose last effect leaves the computed
/// value in `value`.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub value: Ident,
    pub steps: Vec<Step>,
}

impl Fragment {
    /// A fragment with no side effects, e.g. a variable reference.
    pub fn value_only(value: impl Into<Ident>) -> Fragment {
        Fragment {
            value: value.into(),
            steps: Vec::new(),
        }
    }

    /// Split into (all declarations, all operations), each joined with
    /// newlines and with empty entries dropped.
    pub fn decls_ops(&self) -> (String, String) {
        let decls: Vec<&str> = self
            .steps
            .iter()
            .filter(|s| !s.decl.is_empty())
            .map(|s| s.decl.as_str())
            .collect();
        let ops: Vec<&str> = self
            .steps
            .iter()
            .filter(|s| !s.op.is_empty())
            .map(|s| s.op.as_str())
            .collect();
        (decls.join("\n"), ops.join("\n"))
    }
}

/// Declare a fresh tagged-value slot.
fn declare(var: &str) -> String {
    format!("SCHEMETYPE_T {}(new schemetype_t);", var)
}

/// One-step fragment for a literal: declare the slot, set its tag,
/// then set its payload.
fn literal(tmp: Ident, tag: &str, payload: String) -> Fragment {
    let step = Step {
        decl: declare(&tmp),
        op: format!("{}->type = {};\n{}", tmp, tag, payload),
    };
    Fragment {
        value: tmp,
        steps: vec![step],
    }
}

/// Escape a Scheme string payload into a C++ string literal body, so
/// the emitted program reproduces it verbatim.
fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

fn kind_name(expr: &Expr) -> &'static str {
    match expr {
        Expr::Var(_) => "variable",
        Expr::Num(_) => "number literal",
        Expr::Bool(_) => "boolean literal",
        Expr::Str(_) => "string literal",
        Expr::Void => "void literal",
        Expr::Lam(_) => "lambda",
        Expr::App { .. } => "application",
        Expr::If { .. } => "conditional",
        Expr::LetRec { .. } => "letrec",
        Expr::Seq(_) => "begin",
        Expr::Assign { .. } => "set!",
        Expr::AssignThen { .. } => "set!-with-continuation",
    }
}

/// Lowering context for one compilation: the fresh-name counter and
/// the lambda lifter (which owns the hole map and the memo table).
#[derive(Debug)]
pub struct Lowerer {
    names: NameGen,
    pub lift: LambdaLifter,
}

impl Lowerer {
    /// Analyze `root` for holes and set up an empty lifter.
    pub fn new(root: &Expr) -> Lowerer {
        let holes = compute_holes(root);
        Lowerer {
            names: NameGen::new(),
            lift: LambdaLifter::new(holes),
        }
    }

    /// Lower one expression. Any unsupported construct aborts the
    /// whole lowering; partial output is meaningless.
    pub fn lower(&mut self, expr: &Expr) -> Result<Fragment> {
        match expr {
            Expr::Var(name) => Ok(Fragment::value_only(name.clone())),

            Expr::Num(n) => {
                let tmp = self.names.fresh("__num_");
                let payload = format!("{}->num = {};", tmp, n);
                Ok(literal(tmp, "NUM", payload))
            }
            Expr::Bool(b) => {
                let tmp = self.names.fresh("__bool_");
                let payload = format!("{}->num = {};", tmp, if *b { 1 } else { 0 });
                Ok(literal(tmp, "NUM", payload))
            }
            Expr::Str(s) => {
                let tmp = self.names.fresh("__str_");
                let payload = format!(
                    "{}->str = std::make_shared<std::string>(\"{}\");",
                    tmp,
                    escape_str(s)
                );
                Ok(literal(tmp, "STR", payload))
            }

            Expr::Void => Err(CodegenError::Unsupported("void literal")),

            Expr::Lam(lam) => self.lower_lambda(lam),
            Expr::App { func, args } => self.lower_app(func, args),
            Expr::If {
                cond,
                then_exp,
                else_exp,
            } => self.lower_if(cond, then_exp, else_exp),
            Expr::LetRec { bindings, body } => self.lower_letrec(bindings, body),

            Expr::Seq(_) => Err(CodegenError::Unsupported("begin")),
            Expr::Assign { .. } => Err(CodegenError::Unsupported("set!")),
            Expr::AssignThen { .. } => {
                Err(CodegenError::Unsupported("set!-with-continuation"))
            }
        }
    }

    /// Lambda: look up (or create) the lifted definition, then allocate
    /// a closure slot constructed from the definition's holes, read
    /// from the already-bound outer names. This is where
    /// capture-by-reference happens.
    fn lower_lambda(&mut self, lam: &Lambda) -> Result<Fragment> {
        if !self.lift.contains(&lam.name) {
            let body = self.lower(&lam.body)?;
            self.lift.define(lam, &body);
        }
        let (class, hole_args) = {
            let def = self.lift.get(&lam.name).expect("just defined");
            (def.name.clone(), def.holes.join(", "))
        };
        let tmp = self.names.fresh("__lam_");
        let step = Step {
            decl: declare(&tmp),
            op: format!(
                "{tmp}->type = LAM;\n{tmp}->lam = LAMBDA_T(new {class}({holes}));",
                tmp = tmp,
                class = class,
                holes = hole_args
            ),
        };
        Ok(Fragment {
            value: tmp,
            steps: vec![step],
        })
    }

    /// Application. Argument steps first, in order, then the callee's.
    /// A primitive callee computes inline and then invokes the last
    /// argument (the continuation, per the CPS convention) with the
    /// result; a plain variable callee is invoked with all arguments.
    /// Either way the produced value is a deferred computation, not a
    /// performed call.
    fn lower_app(&mut self, func: &Expr, args: &[Expr]) -> Result<Fragment> {
        let mut steps = Vec::new();
        let mut arg_vals = Vec::new();
        for arg in args {
            let frag = self.lower(arg)?;
            arg_vals.push(frag.value.clone());
            steps.extend(frag.steps);
        }
        let func_frag = self.lower(func)?;
        steps.extend(func_frag.steps);

        let ret = self.names.fresh("__ret_");
        match func {
            Expr::Var(name) if is_primop(name) => {
                if arg_vals.is_empty() {
                    return Err(CodegenError::PrimitiveArity {
                        op: name.clone(),
                        got: 0,
                    });
                }
                let cont = arg_vals.last().unwrap().clone();
                let operands: Vec<&str> = arg_vals[..arg_vals.len() - 1]
                    .iter()
                    .map(String::as_str)
                    .collect();
                let prim = self.names.fresh("__prim_");
                let (tag, body) = apply_primop(name, &prim, &operands)?;
                steps.push(Step {
                    decl: format!("{}\nTHUNK_T {}(nullptr);", declare(&prim), ret),
                    op: format!(
                        "{prim}->type = {tag};\n{body}\n{ret} = THUNK_T(new thunk_t({cont}->lam, {{{prim}}}));",
                        prim = prim,
                        tag = tag.as_cpp(),
                        body = body,
                        ret = ret,
                        cont = cont
                    ),
                });
            }
            Expr::Var(_) => {
                steps.push(Step {
                    decl: format!("THUNK_T {}(nullptr);", ret),
                    op: format!(
                        "{} = THUNK_T(new thunk_t({}->lam, {{{}}}));",
                        ret,
                        func_frag.value,
                        arg_vals.join(", ")
                    ),
                });
            }
            other => return Err(CodegenError::UncallableTarget(kind_name(other).into())),
        }
        Ok(Fragment { value: ret, steps })
    }

    /// Conditional: branch on the condition's numeric truthiness. Each
    /// arm replays its own declarations and operations inside the
    /// branch and moves its value into one shared fresh slot.
    fn lower_if(&mut self, cond: &Expr, then_exp: &Expr, else_exp: &Expr) -> Result<Fragment> {
        let cond_frag = self.lower(cond)?;
        let mut steps = cond_frag.steps;

        let then_frag = self.lower(then_exp)?;
        let else_frag = self.lower(else_exp)?;
        let (then_decls, then_ops) = then_frag.decls_ops();
        let (else_decls, else_ops) = else_frag.decls_ops();

        let ret = self.names.fresh("__ret_");
        let mut op = String::new();
        op.push_str(&format!("if ({}->num) {{\n", cond_frag.value));
        for part in [&then_decls, &then_ops] {
            if !part.is_empty() {
                op.push_str(part);
                op.push('\n');
            }
        }
        op.push_str(&format!("{} = std::move({});\n", ret, then_frag.value));
        op.push_str("}\nelse {\n");
        for part in [&else_decls, &else_ops] {
            if !part.is_empty() {
                op.push_str(part);
                op.push('\n');
            }
        }
        op.push_str(&format!("{} = std::move({});\n", ret, else_frag.value));
        op.push('}');

        steps.push(Step {
            decl: format!("THUNK_T {}(nullptr);", ret),
            op,
        });
        Ok(Fragment { value: ret, steps })
    }

    /// Recursive-binding block. Each binding gets a slot declared under
    /// its own name and then filled by copying the lowered value's
    /// contents into the pre-declared cell. Because all declarations
    /// precede all operations in the emitted text, a closure lifted
    /// from an earlier (or later) binding can capture any binding's
    /// slot by name; the contents materialize before any of those
    /// closures can run.
    fn lower_letrec(&mut self, bindings: &[(Ident, Expr)], body: &Expr) -> Result<Fragment> {
        let mut steps = Vec::new();
        for (name, value) in bindings {
            let frag = self.lower(value)?;
            let val = frag.value.clone();
            steps.extend(frag.steps);
            steps.push(Step {
                decl: declare(name),
                op: format!("*{} = *{};", name, val),
            });
        }
        let body_frag = self.lower(body)?;
        steps.extend(body_frag.steps);
        Ok(Fragment {
            value: body_frag.value,
            steps,
        })
    }
}
