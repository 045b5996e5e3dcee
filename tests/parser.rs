use std::collections::HashSet;

use rox::ast::{Expr, ExprId, ExprKind, Stmt};
use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::parser::Parser;
use rox::scanner::Scanner;

fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
    let (tokens, errors) = Scanner::new(source.as_bytes()).scan_all();
    assert!(errors.is_empty(), "lex errors: {:?}", errors);
    Parser::new(tokens).parse()
}

fn print_expression(source: &str) -> String {
    let (tokens, _) = Scanner::new(source.as_bytes()).scan_all();
    let expr = Parser::new(tokens).parse_expression().unwrap();
    AstPrinter::print(&expr)
}

fn collect_ids(expr: &Expr, ids: &mut Vec<ExprId>) {
    ids.push(expr.id);

    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Variable(_) | ExprKind::This(_) => {}
        ExprKind::Super { .. } => {}
        ExprKind::Grouping(inner) | ExprKind::Unary { right: inner, .. } => {
            collect_ids(inner, ids)
        }
        ExprKind::Assign { value, .. } => collect_ids(value, ids),
        ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
            collect_ids(left, ids);
            collect_ids(right, ids);
        }
        ExprKind::Call {
            callee, arguments, ..
        } => {
            collect_ids(callee, ids);
            for arg in arguments {
                collect_ids(arg, ids);
            }
        }
        ExprKind::Get { object, .. } => collect_ids(object, ids),
        ExprKind::Set { object, value, .. } => {
            collect_ids(object, ids);
            collect_ids(value, ids);
        }
    }
}

#[test]
fn prints_expressions_in_prefix_form() {
    assert_eq!(print_expression("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
    assert_eq!(print_expression("-(4.5) == !nil"), "(== (- (group 4.5)) (! nil))");
    assert_eq!(print_expression("a or b and c"), "(or a (and b c))");
    assert_eq!(print_expression("x = y = 1"), "(= x (= y 1.0))");
    assert_eq!(print_expression("f(1, \"s\")(g)"), "(call (call f 1.0 s) g)");
    assert_eq!(print_expression("a.b.c = this"), "(.= (. a b) c this)");
    assert_eq!(print_expression("super.run"), "(super run)");
}

#[test]
fn identical_expressions_get_distinct_ids() {
    let statements = parse("print a; print a; print a + a;").unwrap();

    let mut ids = Vec::new();
    for stmt in &statements {
        let Stmt::Print(expr) = stmt else {
            panic!("expected print, got {:?}", stmt);
        };
        collect_ids(expr, &mut ids);
    }

    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(ids.len(), 5);
    assert_eq!(unique.len(), 5);
}

#[test]
fn starting_id_carries_over_between_parsers() {
    let (tokens, _) = Scanner::new(b"a; b;").scan_all();
    let mut first = Parser::new(tokens);
    first.parse().unwrap();
    let next = first.next_id();
    assert_eq!(next, ExprId(2));

    let (tokens, _) = Scanner::new(b"c;").scan_all();
    let mut second = Parser::starting_at(tokens, next);
    let statements = second.parse().unwrap();

    let Stmt::Expression(expr) = &statements[0] else {
        panic!("expected expression statement");
    };
    assert_eq!(expr.id, ExprId(2));
    assert_eq!(second.next_id(), ExprId(3));
}

#[test]
fn for_loop_is_lowered_to_while() {
    let statements = parse("for (var i = 0; i < 3; i = i + 1) print i;").unwrap();
    assert_eq!(statements.len(), 1);

    let Stmt::Block(outer) = &statements[0] else {
        panic!("expected block, got {:?}", statements[0]);
    };
    assert!(matches!(outer[0], Stmt::Var { .. }));

    let Stmt::While { body, .. } = &outer[1] else {
        panic!("expected while, got {:?}", outer[1]);
    };
    let Stmt::Block(inner) = body.as_ref() else {
        panic!("expected block body");
    };
    assert!(matches!(inner[0], Stmt::Print(_)));
    assert!(matches!(inner[1], Stmt::Expression(_)));
}

#[test]
fn for_loop_without_clauses_loops_on_true() {
    let statements = parse("for (;;) print 1;").unwrap();

    let Stmt::While { condition, .. } = &statements[0] else {
        panic!("expected a bare while, got {:?}", statements[0]);
    };
    assert_eq!(AstPrinter::print(condition), "true");
}

#[test]
fn class_with_superclass() {
    let statements = parse("class B < A { init(x) {} go() { return super.go(); } }").unwrap();

    let Stmt::Class(class) = &statements[0] else {
        panic!("expected class");
    };
    assert_eq!(class.name.lexeme, "B");
    assert!(matches!(
        class.superclass.as_ref().map(|e| &e.kind),
        Some(ExprKind::Variable(name)) if name.lexeme == "A"
    ));
    let names: Vec<_> = class.methods.iter().map(|m| m.name.lexeme.as_str()).collect();
    assert_eq!(names, vec!["init", "go"]);
    assert_eq!(class.methods[0].params.len(), 1);
}

#[test]
fn reports_every_syntax_error() {
    let errors = parse("var = 1;\nprint (1;\nprint 2;").unwrap_err();

    let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    assert_eq!(
        rendered,
        vec![
            "[line 1] Error at '=': Expected variable name",
            "[line 2] Error at ';': Expected ')' after expression",
        ]
    );
}

#[test]
fn error_at_end_of_input() {
    let errors = parse("print 1").unwrap_err();
    assert_eq!(
        errors[0].to_string(),
        "[line 1] Error at end: Expected ';' after value"
    );
}

#[test]
fn invalid_assignment_target() {
    let errors = parse("1 + 2 = 3;").unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "[line 1] Error at '=': Invalid assignment target"
    );
}
