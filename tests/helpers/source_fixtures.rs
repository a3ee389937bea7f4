//! Common source fixtures for tests.

// Python-like
pub const PY_FUNCTION: &str = "def foo():\n  bar()";

pub const PY_NESTED: &str = r#"def outer(a, b):
  x = a
  def inner():
    call(x, b)
  inner()
y = 1 + 2 * 3
"#;

pub const PY_COMMENTED: &str = "# leading\nx = 1 # trailing\n";

pub const PY_MISSING_PAREN: &str = "def foo(:\n  bar()\n";

// JavaScript-like
pub const JS_FUNCTION: &str = "function foo() {\n  bar();\n}";

pub const JS_PROGRAM: &str = r#"function add(a, b) {
  return a + b;
}
// entry point
if (ready) {
  console.log(add(1, 2));
} else
  retry();
"#;

pub const JS_UNCLOSED_BLOCK: &str = "function foo() {\n  bar();\n";

pub const JS_STRAY_CHARACTER: &str = "a(); # b();";

pub const JS_MISSING_SEMICOLON: &str = "a()\nb();";
