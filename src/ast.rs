//! CPS-form expression trees consumed by the backend.
//!
//! The tree arrives already in continuation-passing style: every call
//! site carries an explicit continuation as its last argument, so no
//! expression ever "returns" in the ordinary sense. The parser and the
//! CPS transform that produce this shape live upstream; this crate only
//! consumes it.
//!
//! Every `Lambda` carries a globally unique name assigned at
//! construction time. That name doubles as the node's identity: the
//! hole map and the lifter's memo table are both keyed on it.

use std::fmt;

pub type Ident = String;

/// A CPS-form expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Variable reference
    Var(Ident),
    /// Number literal
    Num(i64),
    /// Boolean literal
    Bool(bool),
    /// String literal
    Str(String),
    /// Void literal (recognized, rejected by the lowerer)
    Void,
    /// Anonymous function
    Lam(Lambda),
    /// Application; by CPS convention the last argument of a primitive
    /// or tail call is the continuation
    App { func: Box<Expr>, args: Vec<Expr> },
    /// Conditional on numeric truthiness
    If {
        cond: Box<Expr>,
        then_exp: Box<Expr>,
        else_exp: Box<Expr>,
    },
    /// Recursive-binding block; later (and forward) bindings may be
    /// captured by earlier lambdas
    LetRec {
        bindings: Vec<(Ident, Expr)>,
        body: Box<Expr>,
    },
    /// Sequence (recognized, rejected by the lowerer)
    Seq(Vec<Expr>),
    /// Assignment (recognized, rejected by the lowerer)
    Assign { name: Ident, value: Box<Expr> },
    /// Assignment followed by a continuation expression (recognized,
    /// rejected by the lowerer)
    AssignThen {
        name: Ident,
        value: Box<Expr>,
        then_exp: Box<Expr>,
    },
}

/// A lambda node: ordered formals plus one body expression.
///
/// Precondition inherited from the upstream CPS transform: parameter
/// names are not reused with different bindings across nested lambdas.
/// Hole resolution is name-based, so reusing a parameter name for two
/// logically different variables would silently misattribute captures.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    /// Globally unique name; becomes the generated class name
    pub name: Ident,
    pub params: Vec<Ident>,
    pub body: Box<Expr>,
}

impl Expr {
    pub fn var(name: impl Into<Ident>) -> Expr {
        Expr::Var(name.into())
    }

    pub fn num(n: i64) -> Expr {
        Expr::Num(n)
    }

    pub fn str(s: impl Into<String>) -> Expr {
        Expr::Str(s.into())
    }

    pub fn app(func: Expr, args: Vec<Expr>) -> Expr {
        Expr::App {
            func: Box::new(func),
            args,
        }
    }

    pub fn if_(cond: Expr, then_exp: Expr, else_exp: Expr) -> Expr {
        Expr::If {
            cond: Box::new(cond),
            then_exp: Box::new(then_exp),
            else_exp: Box::new(else_exp),
        }
    }

    pub fn letrec(bindings: Vec<(Ident, Expr)>, body: Expr) -> Expr {
        Expr::LetRec {
            bindings,
            body: Box::new(body),
        }
    }

    pub fn lam(name: impl Into<Ident>, params: Vec<Ident>, body: Expr) -> Expr {
        Expr::Lam(Lambda {
            name: name.into(),
            params,
            body: Box::new(body),
        })
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Num(n) => write!(f, "{}", n),
            Expr::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Expr::Str(s) => write!(f, "{:?}", s),
            Expr::Void => write!(f, "#void"),
            Expr::Lam(lam) => {
                write!(f, "(lambda ({}) {})", lam.params.join(" "), lam.body)
            }
            Expr::App { func, args } => {
                write!(f, "({}", func)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
            Expr::If {
                cond,
                then_exp,
                else_exp,
            } => write!(f, "(if {} {} {})", cond, then_exp, else_exp),
            Expr::LetRec { bindings, body } => {
                write!(f, "(letrec (")?;
                for (name, value) in bindings {
                    write!(f, "({} {})", name, value)?;
                }
                write!(f, ") {})", body)
            }
            Expr::Seq(exps) => {
                write!(f, "(begin")?;
                for e in exps {
                    write!(f, " {}", e)?;
                }
                write!(f, ")")
            }
            Expr::Assign { name, value } => write!(f, "(set! {} {})", name, value),
            Expr::AssignThen {
                name,
                value,
                then_exp,
            } => write!(f, "(set-then! {} {} {})", name, value, then_exp),
        }
    }
}

/// Fresh-name service.
///
/// Produces identifiers like `__num_0`, `__lam_3`. State is local to
/// one compilation; a fresh generator always restarts at zero, which
/// keeps emitted names deterministic for a given input tree.
#[derive(Debug, Default)]
pub struct NameGen {
    counter: u32,
}

impl NameGen {
    pub fn new() -> Self {
        NameGen::default()
    }

    /// Return `{prefix}{n}` for the next unused `n`.
    pub fn fresh(&mut self, prefix: &str) -> Ident {
        let name = format!("{}{}", prefix, self.counter);
        self.counter += 1;
        name
    }
}
