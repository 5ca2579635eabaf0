//! Property-based tests for capture analysis and code emission
//!
//! These tests verify structural invariants over randomly generated
//! CPS trees drawn from the supported grammar:
//! - Every lambda in a tree receives a capture entry
//! - Captured holes never include the lambda's own parameters or
//!   primitive-operator names
//! - Any supported tree lowers and emits without error, and every
//!   lambda in it gets a generated class
//! - Pretty-printing only rewrites leading whitespace

use proptest::prelude::*;

use gossan::ast::{Expr, Ident, Lambda};
use gossan::{compute_holes, emit_cpp, is_primop, reindent};

// ============================================================================
// Tree Generators
// ============================================================================

const VAR_POOL: &[&str] = &["a", "b", "c", "k", "x", "y"];

fn arb_var() -> BoxedStrategy<Expr> {
    proptest::sample::select(VAR_POOL.to_vec())
        .prop_map(Expr::var)
        .boxed()
}

fn arb_param() -> BoxedStrategy<Ident> {
    proptest::sample::select(VAR_POOL.to_vec())
        .prop_map(str::to_owned)
        .boxed()
}

fn arb_leaf() -> BoxedStrategy<Expr> {
    prop_oneof![
        any::<i64>().prop_map(Expr::num),
        any::<bool>().prop_map(Expr::Bool),
        "[a-z ]{0,8}".prop_map(Expr::str),
        arb_var(),
    ]
    .boxed()
}

/// Generate a tree from the supported grammar. Applications of the
/// primitive operators always carry the operand count their table
/// expects plus a trailing continuation, and generic calls keep a
/// plain variable in callee position, so every generated tree lowers
/// cleanly.
fn arb_expr(depth: usize) -> BoxedStrategy<Expr> {
    if depth == 0 {
        return arb_leaf();
    }
    prop_oneof![
        // Leaves, weighted higher to keep trees small
        3 => arb_leaf(),

        // Closure call over a pool variable
        2 => (arb_var(), prop::collection::vec(arb_expr(depth - 1), 0..=3))
            .prop_map(|(f, args)| Expr::app(f, args)),

        // Binary numeric primitive, continuation last
        1 => (arb_expr(depth - 1), arb_expr(depth - 1), arb_var())
            .prop_map(|(a, b, k)| Expr::app(Expr::var("+"), vec![a, b, k])),

        // Unary numeric primitive
        1 => (arb_expr(depth - 1), arb_var())
            .prop_map(|(a, k)| Expr::app(Expr::var("zero?"), vec![a, k])),

        // String primitive
        1 => (arb_expr(depth - 1), arb_expr(depth - 1), arb_var())
            .prop_map(|(a, b, k)| Expr::app(Expr::var("string-append"), vec![a, b, k])),

        // Conditional
        1 => (arb_expr(depth - 1), arb_expr(depth - 1), arb_expr(depth - 1))
            .prop_map(|(c, t, e)| Expr::if_(c, t, e)),

        // Lambda; the placeholder name is replaced by `uniquify`
        1 => (prop::collection::vec(arb_param(), 0..=2), arb_expr(depth - 1))
            .prop_map(|(params, body)| Expr::lam("placeholder", params, body)),

        // Single-binding recursive block
        1 => (arb_expr(depth - 1), arb_expr(depth - 1))
            .prop_map(|(value, body)| Expr::letrec(vec![("r".into(), value)], body)),
    ]
    .boxed()
}

/// Rename every lambda by depth-first position so class names come out
/// globally unique, as the upstream transform guarantees.
fn uniquify(expr: &mut Expr, counter: &mut usize) {
    match expr {
        Expr::Lam(lam) => {
            lam.name = format!("gen{}", *counter);
            *counter += 1;
            uniquify(&mut lam.body, counter);
        }
        Expr::App { func, args } => {
            uniquify(func, counter);
            for arg in args {
                uniquify(arg, counter);
            }
        }
        Expr::If {
            cond,
            then_exp,
            else_exp,
        } => {
            uniquify(cond, counter);
            uniquify(then_exp, counter);
            uniquify(else_exp, counter);
        }
        Expr::LetRec { bindings, body } => {
            for (_, value) in bindings {
                uniquify(value, counter);
            }
            uniquify(body, counter);
        }
        _ => {}
    }
}

fn arb_program() -> BoxedStrategy<Expr> {
    arb_expr(3)
        .prop_map(|mut tree| {
            let mut counter = 0;
            uniquify(&mut tree, &mut counter);
            tree
        })
        .boxed()
}

fn collect_lambdas<'a>(expr: &'a Expr, out: &mut Vec<&'a Lambda>) {
    match expr {
        Expr::Lam(lam) => {
            out.push(lam);
            collect_lambdas(&lam.body, out);
        }
        Expr::App { func, args } => {
            collect_lambdas(func, out);
            for arg in args {
                collect_lambdas(arg, out);
            }
        }
        Expr::If {
            cond,
            then_exp,
            else_exp,
        } => {
            collect_lambdas(cond, out);
            collect_lambdas(then_exp, out);
            collect_lambdas(else_exp, out);
        }
        Expr::LetRec { bindings, body } => {
            for (_, value) in bindings {
                collect_lambdas(value, out);
            }
            collect_lambdas(body, out);
        }
        _ => {}
    }
}

// ============================================================================
// Capture Analysis Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every lambda in the tree gets an entry in the capture map
    #[test]
    fn every_lambda_is_analyzed(tree in arb_program()) {
        let holes = compute_holes(&tree);
        let mut lams = Vec::new();
        collect_lambdas(&tree, &mut lams);
        for lam in lams {
            prop_assert!(
                holes.contains_key(&lam.name),
                "lambda {} has no capture entry",
                lam.name
            );
        }
    }

    /// A lambda never captures its own parameters, and primitive
    /// operator names never count as free variables
    #[test]
    fn holes_exclude_params_and_primitives(tree in arb_program()) {
        let holes = compute_holes(&tree);
        let mut lams = Vec::new();
        collect_lambdas(&tree, &mut lams);
        for lam in lams {
            let captured = &holes[&lam.name];
            for hole in captured {
                prop_assert!(
                    !lam.params.contains(hole),
                    "lambda {} captures its own parameter {}",
                    lam.name,
                    hole
                );
                prop_assert!(
                    !is_primop(hole),
                    "lambda {} captures primitive {}",
                    lam.name,
                    hole
                );
            }
        }
    }

    /// No capture list mentions the same variable twice
    #[test]
    fn holes_are_duplicate_free(tree in arb_program()) {
        let holes = compute_holes(&tree);
        for (name, captured) in &holes {
            let mut seen = std::collections::HashSet::new();
            for hole in captured {
                prop_assert!(
                    seen.insert(hole),
                    "lambda {} lists {} twice",
                    name,
                    hole
                );
            }
        }
    }
}

// ============================================================================
// Emission Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Every supported tree lowers and emits without error, and each
    /// of its lambdas turns into a generated class
    #[test]
    fn supported_trees_emit_a_class_per_lambda(tree in arb_program()) {
        let code = emit_cpp(&tree);
        prop_assert!(code.is_ok(), "emission failed: {:?}", code.as_ref().err());
        let code = code.unwrap();
        prop_assert!(code.contains("class __halt : public lambda_t"));

        let mut lams = Vec::new();
        collect_lambdas(&tree, &mut lams);
        for lam in lams {
            prop_assert!(
                code.contains(&format!("class {} : public lambda_t", lam.name)),
                "no class generated for lambda {}",
                lam.name
            );
        }
    }

    /// Pretty-printing rewrites indentation only; line content is
    /// untouched
    #[test]
    fn reindent_preserves_line_content(tree in arb_program()) {
        let code = emit_cpp(&tree).unwrap();
        let pretty = reindent(&code, 2);
        let raw_lines: Vec<&str> = code.lines().map(str::trim).collect();
        let pretty_lines: Vec<&str> = pretty.lines().map(str::trim).collect();
        prop_assert_eq!(raw_lines, pretty_lines);
    }
}
