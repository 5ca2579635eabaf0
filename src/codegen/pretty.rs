//! Cosmetic re-indentation of the emitted C++.
//!
//! Purely textual: tracks brace depth line by line and dedents the
//! `case`/`default`/`public`/`private` label keywords by half a step.
//! A no-op on program semantics.

const TERMINATORS: [char; 3] = [' ', '\t', ':'];

fn is_label(line: &str) -> bool {
    for keyword in ["case", "public", "private", "default"] {
        if let Some(rest) = line.strip_prefix(keyword) {
            if rest.chars().next().is_some_and(|c| TERMINATORS.contains(&c)) {
                return true;
            }
        }
    }
    false
}

/// Re-indent `code` with `nspace` spaces per brace level.
pub fn reindent(code: &str, nspace: usize) -> String {
    let unindent = nspace / 2;
    let mut indent: usize = 0;
    let mut out = Vec::new();

    for raw in code.lines() {
        let line = raw.trim();
        let mut rest = line;
        if line.starts_with('}') {
            indent = indent.saturating_sub(1);
            rest = &line[1..];
        }

        let width = if is_label(line) {
            (nspace * indent).saturating_sub(unindent)
        } else {
            nspace * indent
        };
        if line.is_empty() {
            out.push(String::new());
        } else {
            out.push(format!("{}{}", " ".repeat(width), line));
        }

        for c in rest.chars() {
            match c {
                '{' => indent += 1,
                '}' => indent = indent.saturating_sub(1),
                _ => {}
            }
        }
    }
    out.join("\n")
}
