use rox::ast::Stmt;
use rox::error::LoxError;
use rox::parser::Parser;
use rox::resolver::{Resolutions, Resolver};
use rox::scanner::Scanner;

fn parse(source: &str) -> Vec<Stmt> {
    let (tokens, errors) = Scanner::new(source.as_bytes()).scan_all();
    assert!(errors.is_empty(), "lex errors: {:?}", errors);
    Parser::new(tokens).parse().expect("source should parse")
}

fn resolve(source: &str) -> Result<Resolutions, Vec<LoxError>> {
    Resolver::new().resolve(&parse(source))
}

fn resolve_errors(source: &str) -> Vec<String> {
    match resolve(source) {
        Ok(_) => panic!("expected resolve errors for {:?}", source),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    }
}

fn distances(source: &str) -> Vec<usize> {
    let mut distances: Vec<usize> = resolve(source).unwrap().into_values().collect();
    distances.sort_unstable();
    distances
}

#[test]
fn resolving_twice_gives_the_same_table() {
    let statements = parse(
        "fun make() { var n = 0; fun inc() { n = n + 1; return n; } return inc; }
         var counter = make();
         print counter();",
    );

    let first = Resolver::new().resolve(&statements).unwrap();
    let second = Resolver::new().resolve(&statements).unwrap();

    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn globals_are_left_out_of_the_table() {
    assert!(resolve("var g = 1; print g; g = 2; fun f() { return g; }")
        .unwrap()
        .is_empty());
}

#[test]
fn block_distance_counts_frames_outward() {
    assert_eq!(distances("{ var a = 1; { print a; } }"), vec![1]);
    assert_eq!(distances("{ var a = 1; print a; }"), vec![0]);
    assert_eq!(distances("{ var a = 1; { { a = 2; } } }"), vec![2]);
}

#[test]
fn parameters_and_closures() {
    // x from its own body, n from the closure two frames out (inc body, make
    // body) for both the read and the write.
    assert_eq!(distances("fun f(x) { return x; }"), vec![0]);
    assert_eq!(
        distances("fun make() { var n = 0; fun inc() { n = n + 1; } }"),
        vec![1, 1]
    );
}

#[test]
fn this_and_super_resolve_to_hidden_scopes() {
    // Inside a method body: `this` is one frame out and `super` two.
    let table = distances(
        "class A { m() {} }
         class B < A { m() { this; super.m(); } }",
    );
    assert_eq!(table, vec![1, 2]);
}

#[test]
fn redeclaration_in_local_scope() {
    assert_eq!(
        resolve_errors("{ var a = 1; var a = 2; }"),
        vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
    );

    // Redeclaring a global is allowed.
    assert!(resolve("var a = 1; var a = 2;").is_ok());
}

#[test]
fn local_read_in_own_initializer() {
    assert_eq!(
        resolve_errors("var a = 1; { var a = a; }"),
        vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
    );
}

#[test]
fn misplaced_return() {
    assert_eq!(
        resolve_errors("return 1;"),
        vec!["[line 1] Error at 'return': Can't return from top-level code."]
    );
    assert_eq!(
        resolve_errors("class A { init() { return 1; } }"),
        vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
    );

    // A bare return is fine in an initializer.
    assert!(resolve("class A { init() { return; } }").is_ok());
}

#[test]
fn misplaced_this_and_super() {
    assert_eq!(
        resolve_errors("print this;"),
        vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
    );
    assert_eq!(
        resolve_errors("fun f() { super.m(); }"),
        vec!["[line 1] Error at 'super': Can't use 'super' outside of a class."]
    );
    assert_eq!(
        resolve_errors("class A { m() { super.m(); } }"),
        vec!["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
    );
}

#[test]
fn class_inheriting_from_itself() {
    assert_eq!(
        resolve_errors("class Oops < Oops {}"),
        vec!["[line 1] Error at 'Oops': A class can't inherit from itself."]
    );
}

#[test]
fn all_errors_are_collected() {
    let errors = resolve_errors("return 1;\nprint this;\n{ var b; var b; }");

    assert_eq!(
        errors,
        vec![
            "[line 1] Error at 'return': Can't return from top-level code.",
            "[line 2] Error at 'this': Can't use 'this' outside of a class.",
            "[line 3] Error at 'b': Already a variable with this name in this scope.",
        ]
    );
}
