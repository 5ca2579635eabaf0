//! Lambda lifting.
//!
//! Each distinct lambda node becomes one named C++ class deriving from
//! the shared closure base `lambda_t`. The class constructor takes the
//! lambda's holes (stored as private fields) and its call operator
//! takes the formals and runs the lowered body. Definitions are
//! memoized by lambda name and kept in first-encounter order.
//!
//! The lifter also owns the shared base declaration: one virtual call
//! signature per arity in the observed `[min, max]` range (arities
//! never used inside that range still get a signature, because the
//! base must be callable uniformly), each defaulting to an
//! arity-mismatch diagnostic that terminates the generated program.
//!
//! The halt continuation is pre-registered at construction, which both
//! makes it available as a ready-made definition and guarantees the
//! observed-arity set is never empty.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

use crate::ast::{Expr, Ident, Lambda};

use super::holes::HoleMap;
use super::lower::Fragment;

/// Reserved name of the halt continuation's lifted class.
pub const HALT_NAME: &str = "__halt";

const HALT_ARG: &str = "__halt_v";

/// Build the halt continuation as a ready-made AST fragment: a fixed,
/// zero-capture lambda of arity one, usable wherever a program's
/// outermost continuation is required. Its body is never lowered; the
/// lifter carries a canned definition under [`HALT_NAME`].
pub fn halt() -> Expr {
    Expr::lam(HALT_NAME, vec![HALT_ARG.into()], Expr::Void)
}

/// One generated callable definition.
#[derive(Debug, Clone)]
pub struct LiftedLambda {
    pub name: Ident,
    /// Captured-hole identifiers, in hole-map order; these are the
    /// constructor parameters and must match the construction site
    pub holes: Vec<Ident>,
    pub arity: usize,
    /// Class declaration text
    pub decl: String,
    /// Call-operator definition text
    pub op: String,
}

/// Memoizing lambda-to-class converter.
#[derive(Debug)]
pub struct LambdaLifter {
    holes: HoleMap,
    defs: Vec<LiftedLambda>,
    index: HashMap<Ident, usize>,
    arities: BTreeSet<usize>,
}

impl LambdaLifter {
    pub fn new(holes: HoleMap) -> Self {
        let mut lifter = LambdaLifter {
            holes,
            defs: Vec::new(),
            index: HashMap::new(),
            arities: BTreeSet::new(),
        };
        lifter.register(halt_definition());
        lifter
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&LiftedLambda> {
        self.index.get(name).map(|&i| &self.defs[i])
    }

    /// The hole set recorded for a lambda name (empty if the analyzer
    /// saw none).
    fn holes_of(&self, name: &str) -> Vec<Ident> {
        self.holes.get(name).cloned().unwrap_or_default()
    }

    /// Record a definition for `lam` from its lowered body. The caller
    /// checks [`contains`](Self::contains) first; lowering a body twice
    /// for the same name would waste fresh temporaries.
    pub fn define(&mut self, lam: &Lambda, body: &Fragment) -> &LiftedLambda {
        let holes = self.holes_of(&lam.name);
        let (body_decls, body_ops) = body.decls_ops();

        let ctor_params = holes
            .iter()
            .map(|h| format!("SCHEMETYPE_T {}", h))
            .collect::<Vec<_>>()
            .join(", ");
        let ctor_inits = holes
            .iter()
            .map(|h| format!("{0}({0})", h))
            .collect::<Vec<_>>()
            .join(", ");
        let apply_params = lam
            .params
            .iter()
            .map(|p| format!("SCHEMETYPE_T {}", p))
            .collect::<Vec<_>>()
            .join(", ");

        let mut decl = String::new();
        writeln!(decl, "class {} : public lambda_t {{", lam.name).unwrap();
        writeln!(decl, " public:").unwrap();
        if holes.is_empty() {
            writeln!(decl, "  {}() {{ }}", lam.name).unwrap();
        } else {
            writeln!(decl, "  {}({}) : {} {{ }}", lam.name, ctor_params, ctor_inits).unwrap();
        }
        writeln!(
            decl,
            "  THUNK_T operator()({}) const override;",
            apply_params
        )
        .unwrap();
        if !holes.is_empty() {
            writeln!(decl, " private:").unwrap();
            for hole in &holes {
                writeln!(decl, "  SCHEMETYPE_T {};", hole).unwrap();
            }
        }
        writeln!(decl, "}};").unwrap();

        let mut op = String::new();
        writeln!(
            op,
            "THUNK_T {}::operator()({}) const {{",
            lam.name, apply_params
        )
        .unwrap();
        if !body_decls.is_empty() {
            writeln!(op, "{}", body_decls).unwrap();
        }
        if !body_ops.is_empty() {
            writeln!(op, "{}", body_ops).unwrap();
        }
        writeln!(op, "return {};", body.value).unwrap();
        writeln!(op, "}}").unwrap();

        self.register(LiftedLambda {
            name: lam.name.clone(),
            holes,
            arity: lam.params.len(),
            decl,
            op,
        });
        self.defs.last().unwrap()
    }

    fn register(&mut self, def: LiftedLambda) {
        self.arities.insert(def.arity);
        self.index.insert(def.name.clone(), self.defs.len());
        self.defs.push(def);
    }

    /// Smallest and largest observed arity. Never empty: the halt
    /// continuation is pre-registered with arity one.
    pub fn arity_range(&self) -> (usize, usize) {
        let min = *self.arities.first().unwrap();
        let max = *self.arities.last().unwrap();
        (min, max)
    }

    /// The shared base-callable declaration plus every generated
    /// definition's declaration, and separately every definition's
    /// operation text, in first-encountered order.
    pub fn decls_and_ops(&self) -> (String, String) {
        let (min, max) = self.arity_range();

        let mut decls = String::new();
        writeln!(decls, "class lambda_t {{").unwrap();
        writeln!(decls, " public:").unwrap();
        writeln!(decls, "  virtual ~lambda_t() {{ }}").unwrap();
        for arity in min..=max {
            let sig = vec!["SCHEMETYPE_T"; arity].join(", ");
            writeln!(decls, "  virtual THUNK_T operator()({}) const;", sig).unwrap();
        }
        writeln!(decls, "}};").unwrap();

        let mut ops = String::new();
        for arity in min..=max {
            let sig = (0..arity)
                .map(|i| format!("SCHEMETYPE_T _{}", i))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(ops, "THUNK_T lambda_t::operator()({}) const {{", sig).unwrap();
            writeln!(
                ops,
                "printf(\"error: lambda called with an improper number of arguments\\n\");"
            )
            .unwrap();
            writeln!(ops, "exit(-1);").unwrap();
            writeln!(ops, "return THUNK_T(nullptr);").unwrap();
            writeln!(ops, "}}").unwrap();
        }

        for def in &self.defs {
            decls.push_str(&def.decl);
            ops.push_str(&def.op);
        }
        (decls, ops)
    }
}

/// Canned definition of the halt continuation: print the argument
/// according to its tag and terminate the process, non-zero status
/// exactly when the tag is unrecognized.
fn halt_definition() -> LiftedLambda {
    let decl = format!(
        "class {name} : public lambda_t {{\n\
         \x20public:\n\
         \x20 {name}() {{ }}\n\
         \x20 THUNK_T operator()(SCHEMETYPE_T {arg}) const override;\n\
         }};\n",
        name = HALT_NAME,
        arg = HALT_ARG
    );
    let op = format!(
        "THUNK_T {name}::operator()(SCHEMETYPE_T {arg}) const {{\n\
         int retval = 0;\n\
         switch ({arg}->type) {{\n\
         \x20case NUM:\n\
         printf(\"%ld\\n\", {arg}->num);\n\
         break;\n\
         \x20case LAM:\n\
         printf(\"you want to return a lambda?! really?!\\n\");\n\
         break;\n\
         \x20case STR:\n\
         printf(\"%s\\n\", {arg}->str->c_str());\n\
         break;\n\
         \x20default:\n\
         printf(\"error: unrecognized value tag\\n\");\n\
         retval = -1;\n\
         }}\n\
         exit(retval);\n\
         return THUNK_T(nullptr);\n\
         }}\n",
        name = HALT_NAME,
        arg = HALT_ARG
    );
    LiftedLambda {
        name: HALT_NAME.into(),
        holes: Vec::new(),
        arity: 1,
        decl,
        op,
    }
}
