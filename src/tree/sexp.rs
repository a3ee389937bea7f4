//! S-expression rendering.
//!
//! Only named nodes are rendered; anonymous tokens are left out. Missing
//! nodes are always rendered, as `(MISSING name)` for named symbols and
//! `(MISSING "text")` for literals.

use super::Node;

impl Node {
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        write_node(self, &mut out);
        out
    }
}

fn write_node(node: &Node, out: &mut String) {
    if node.is_missing() {
        out.push_str("(MISSING ");
        if node.is_named() {
            out.push_str(node.kind());
        } else {
            out.push('"');
            out.push_str(&node.kind().escape_default().to_string());
            out.push('"');
        }
        out.push(')');
        return;
    }

    out.push('(');
    if node.is_named() {
        out.push_str(node.kind());
    } else {
        out.push('"');
        out.push_str(&node.kind().escape_default().to_string());
        out.push('"');
    }
    for child in node.children().iter() {
        if child.is_named() || child.is_missing() {
            out.push(' ');
            write_node(child, out);
        }
    }
    out.push(')');
}
