//! Program assembly.
//!
//! Wraps the generated declarations and operations in the fixed
//! runtime boilerplate and produces one self-contained C++ translation
//! unit. Output structure, in order: type-tag enumeration; forward
//! declarations and pointer aliases; closure base declaration and the
//! generated class declarations; the tagged-value type; the deferred
//! computation type; the generated operation bodies; the entry point
//! with the trampoline loop.
//!
//! ## Runtime contract
//!
//! A `schemetype_t` is a tagged value over {number, closure, string};
//! ownership is shared-pointer reference counting, so a closure can be
//! captured by several other closures at once (mutual recursion). A
//! `thunk_t` wraps the next closure to invoke *plus its already-bound
//! arguments*; a call site in tail position constructs a thunk instead
//! of performing the call, and `main` forces thunks in a loop until
//! the halt continuation exits the process. Native stack depth stays
//! O(1) no matter how many tail calls the program performs.

use std::fmt::Write;

use crate::ast::Expr;

use super::lower::Lowerer;
use super::pretty::reindent;
use super::Result;

/// Emit a complete C++ program for a CPS-form tree.
///
/// Pure function of the tree; all compile-time failures abort with no
/// partial output.
pub fn emit_cpp(root: &Expr) -> Result<String> {
    let mut lowerer = Lowerer::new(root);
    let main = lowerer.lower(root)?;

    let (main_decls, main_ops) = main.decls_ops();
    let (lambda_decls, lambda_ops) = lowerer.lift.decls_and_ops();
    let (min_arity, max_arity) = lowerer.lift.arity_range();

    let mut out = String::new();
    out.push_str("#include <cstdio>\n");
    out.push_str("#include <cstdlib>\n");
    out.push_str("#include <memory>\n");
    out.push_str("#include <string>\n");
    out.push_str("#include <vector>\n");
    out.push_str("enum type_t { NUM, LAM, STR };\n");

    banner(&mut out, "forward decls");
    out.push_str("class lambda_t;\n");
    out.push_str("class schemetype_t;\n");
    out.push_str("class thunk_t;\n");
    out.push_str("#define LAMBDA_T std::shared_ptr<lambda_t>\n");
    out.push_str("#define SCHEMETYPE_T std::shared_ptr<schemetype_t>\n");
    out.push_str("#define THUNK_T std::unique_ptr<thunk_t>\n");

    banner(&mut out, "lambda_t decl");
    out.push_str(&lambda_decls);

    banner(&mut out, "schemetype_t decl");
    out.push_str("class schemetype_t {\n");
    out.push_str(" public:\n");
    out.push_str("  type_t type;\n");
    out.push_str("  long num;\n");
    out.push_str("  LAMBDA_T lam;\n");
    out.push_str("  std::shared_ptr<std::string> str;\n");
    out.push_str("};\n");

    banner(&mut out, "thunk_t decl");
    out.push_str("class thunk_t {\n");
    out.push_str(" public:\n");
    out.push_str("  thunk_t(LAMBDA_T next, std::vector<SCHEMETYPE_T> args);\n");
    out.push_str("  THUNK_T operator()() const;\n");
    out.push_str(" private:\n");
    out.push_str("  LAMBDA_T next;\n");
    out.push_str("  std::vector<SCHEMETYPE_T> args;\n");
    out.push_str("};\n");

    banner(&mut out, "lambda_t impl");
    out.push_str(&lambda_ops);

    banner(&mut out, "thunk_t impl");
    out.push_str(
        "thunk_t::thunk_t(LAMBDA_T next, std::vector<SCHEMETYPE_T> args) : next(next), args(std::move(args)) { }\n",
    );
    out.push_str("THUNK_T thunk_t::operator()() const {\n");
    out.push_str("switch (args.size()) {\n");
    for arity in min_arity..=max_arity {
        let forwarded = (0..arity)
            .map(|i| format!("args[{}]", i))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, " case {}:", arity).unwrap();
        writeln!(out, "return (*next)({});", forwarded).unwrap();
    }
    out.push_str(" default:\n");
    out.push_str(
        "printf(\"error: lambda called with an improper number of arguments\\n\");\n",
    );
    out.push_str("exit(-1);\n");
    out.push_str("}\n");
    out.push_str("}\n");

    banner(&mut out, "main");
    out.push_str("int main() {\n");
    if !main_decls.is_empty() {
        out.push_str(&main_decls);
        out.push('\n');
    }
    if !main_ops.is_empty() {
        out.push_str(&main_ops);
        out.push('\n');
    }
    out.push_str("// trampoline\n");
    out.push_str("while (true) {\n");
    writeln!(out, "{0} = std::move((*{0})());", main.value).unwrap();
    out.push_str("}\n");
    out.push_str("return 0;\n");
    out.push_str("}\n");

    Ok(out)
}

/// [`emit_cpp`] followed by the cosmetic re-indentation pass.
pub fn compile(root: &Expr) -> Result<String> {
    Ok(reindent(&emit_cpp(root)?, 2))
}

fn banner(out: &mut String, title: &str) {
    let dashes = "-".repeat(97usize.saturating_sub(title.len() + 4));
    writeln!(out, "// {} {}", title, dashes).unwrap();
}
