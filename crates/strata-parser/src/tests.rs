//! Unit tests for strata-parser

use crate::*;
use strata_core::Identity;

fn method_keys(module: &strata_core::ModuleEntry, class: &str) -> Vec<String> {
    module.classes[class].methods.keys().cloned().collect()
}

#[test]
fn test_static_method_signature_and_body_hash() {
    let module = parse_module("Foo.js", "class Foo { static bar(x) { return x; } }").unwrap();

    assert_eq!(module.classes.len(), 1);
    let foo = &module.classes["Foo"];
    assert_eq!(foo.superclass, None);
    assert_eq!(method_keys(&module, "Foo"), vec!["static,bar"]);

    let bar = &foo.methods["static,bar"];
    assert_eq!(bar.bare_name, "bar");
    assert_eq!(bar.attributes, vec!["static"]);
    assert_eq!(bar.parameters, "x");
    assert_eq!(bar.body_text, "{ return x; }");
    assert_eq!(bar.body_hash, Identity::body("{ return x; }"));
}

#[test]
fn test_closing_brace_inside_string_is_not_structural() {
    let module = parse_module("A.js", r#"class A { m() { return "}"; } }"#).unwrap();
    let m = &module.classes["A"].methods["m"];
    assert_eq!(m.body_text, r#"{ return "}"; }"#);
}

#[test]
fn test_member_forms() {
    let source = r#"
export default class Point extends Shape {
  #x = 0;
  static origin = new Point(0, 0)
  constructor(x) { super(); this.#x = x; }
  get x() { return this.#x; }
  set x(value) { this.#x = value; }
  static async *walk() { yield 1; }
  [Symbol.iterator]() { return [].values(); }
  'quoted'() {}
}
"#;
    let module = parse_module("shapes/Point.js", source).unwrap();
    let point = &module.classes["Point"];

    assert_eq!(point.superclass.as_deref(), Some("Shape"));
    assert_eq!(
        method_keys(&module, "Point"),
        vec![
            "[Symbol.iterator]",
            "constructor",
            "get,x",
            "quoted",
            "set,x",
            "static,async,walk",
        ]
    );
    assert_eq!(point.methods["set,x"].parameters, "value");
    assert_eq!(point.methods["static,async,walk"].attributes, vec!["static", "async"]);
}

#[test]
fn test_fields_without_semicolons_and_static_blocks() {
    let source = "
class Counter {
  count = 0
  label
  handle = (e) => { this.count += e; }
  static { Counter.ready = true; }
  increment() { this.count++; }
}
";
    let module = parse_module("Counter.js", source).unwrap();
    assert_eq!(method_keys(&module, "Counter"), vec!["increment"]);
    assert!(module.classes["Counter"].methods["increment"].attributes.is_empty());
}

#[test]
fn test_comments_between_members() {
    let source = "class C { /* } */ a() {} // }\n b() /* ok */ {} }";
    let module = parse_module("C.js", source).unwrap();
    assert_eq!(method_keys(&module, "C"), vec!["a", "b"]);
    assert_eq!(module.classes["C"].methods["b"].body_text, "{}");
}

#[test]
fn test_regex_and_template_bodies() {
    let source = r#"
class R {
  test(s) { return /}/.test(s) && a / b > 1; }
  render() { return `<ul>${this.items.map(i => `{${i}}`)}</ul>`; }
}
"#;
    let module = parse_module("R.js", source).unwrap();
    assert_eq!(method_keys(&module, "R"), vec!["render", "test"]);
    assert!(module.classes["R"].methods["test"].body_text.contains("/}/"));
}

#[test]
fn test_nested_class_discovery() {
    let source = "
function make() {
  class Inner { run() {} }
  return Inner;
}
const Anon = class { skip() {} };
class Outer {
  build() { class Hidden {} return Hidden; }
}
";
    let module = parse_module("nested.js", source).unwrap();
    let names: Vec<_> = module.classes.keys().cloned().collect();
    assert_eq!(names, vec!["Inner", "Outer"]);
    assert_eq!(method_keys(&module, "Outer"), vec!["build"]);
}

#[test]
fn test_imports_are_resolved() {
    let source = r#"
import Base from './base.js';
import { a, b } from "../lib/util.js";
import * as ns from 'pkg';
import './side-effect.js';
const lazy = () => import('./lazy.js');
console.log(import.meta.url);
"#;
    let module = parse_module("src/app/main.js", source).unwrap();
    assert_eq!(
        module.imports,
        vec![
            "src/app/base.js",
            "src/lib/util.js",
            "pkg",
            "src/app/side-effect.js",
            "src/app/lazy.js",
        ]
    );
    assert!(module.classes.is_empty());
}

#[test]
fn test_dynamic_imports_inside_class_bodies() {
    let source = "
class A { load() { return import('./b.js'); } }
function f() { return import('./c.js'); }
";
    let module = parse_module("src/a.js", source).unwrap();
    assert_eq!(module.imports, vec!["src/b.js", "src/c.js"]);
    assert_eq!(method_keys(&module, "A"), vec!["load"]);
}

#[test]
fn test_parenthesized_superclass() {
    let module = parse_module("a.js", "class Foo extends (Base) { m() {} }").unwrap();
    assert_eq!(module.classes["Foo"].superclass, None);
    assert_eq!(method_keys(&module, "Foo"), vec!["m"]);

    let module = parse_module("a.js", "class Foo extends mixin(Base) { m() {} }").unwrap();
    assert_eq!(module.classes["Foo"].superclass.as_deref(), Some("mixin"));
}

#[test]
fn test_malformed_declarations() {
    let err = parse_module("A.js", "class A { m() }").unwrap_err();
    assert!(matches!(err, ParseError::MalformedMethod { ref class, .. } if class == "A"));

    let err = parse_module("A.js", "\n\nclass A {\n  (x) {}\n}").unwrap_err();
    assert!(matches!(err, ParseError::MalformedMethod { line: 4, .. }));

    let err = parse_module("A.js", "class A { m() x {} }").unwrap_err();
    assert!(matches!(err, ParseError::MalformedMethod { .. }));

    let err = parse_module("B.js", "let x = 1;\nclass B").unwrap_err();
    assert_eq!(err.line(), 2);
    assert!(matches!(err, ParseError::MalformedClass { .. }));
}

#[test]
fn test_structural_errors_propagate() {
    assert!(matches!(
        parse_module("A.js", "class A { m() { }"),
        Err(ParseError::UnmatchedOpen { bracket: Bracket::Curly, line: 1, .. })
    ));
    assert!(matches!(
        parse_module("A.js", "class A { m() { ) }"),
        Err(ParseError::BracketMismatch { .. })
    ));
    assert!(matches!(
        parse_module("A.js", "const s = 'a\nb';"),
        Err(ParseError::Lex { .. })
    ));
}

#[test]
fn test_reparse_is_stable() {
    let source = "class Foo extends Bar { a() { one(); } b() { two(); } }";
    let first = parse_module("Foo.js", source).unwrap();
    let second = parse_module("Foo.js", source).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_file_without_classes_is_empty() {
    let module = parse_module("util.js", "export function add(a, b) { return a + b; }").unwrap();
    assert!(module.classes.is_empty());
    assert_eq!(module.method_count(), 0);
}
