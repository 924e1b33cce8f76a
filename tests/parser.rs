use pretty_assertions::assert_eq;

use rox::ast_printer::AstPrinter;
use rox::expr::{Expr, LiteralValue};
use rox::parser::Parser;
use rox::stmt::Stmt;

fn expression(source: &str) -> Expr {
    let tokens = rox::scan(source).unwrap();
    Parser::new(tokens).parse_expression().unwrap()
}

fn program(source: &str) -> Vec<Stmt> {
    rox::parse(source).unwrap_or_else(|errors| {
        panic!(
            "parse failed: {:?}",
            errors.iter().map(ToString::to_string).collect::<Vec<_>>()
        )
    })
}

fn parse_errors(source: &str) -> Vec<String> {
    match rox::parse(source) {
        Ok(_) => panic!("parse unexpectedly succeeded"),
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    }
}

#[test]
fn precedence_and_grouping() {
    assert_eq!(
        AstPrinter::print(&expression("-123 * (45.67) + 2 >= 1 == !false")),
        "(== (>= (+ (* (- 123.0) (group 45.67)) 2.0) 1.0) (! false))"
    );
}

#[test]
fn logical_operators_bind_looser_than_equality() {
    assert_eq!(
        AstPrinter::print(&expression("a or b and c == d")),
        "(or a (and b (== c d)))"
    );
}

#[test]
fn calls_properties_and_assignment() {
    assert_eq!(
        AstPrinter::print(&expression("a.b(1, \"s\").c = d = nil")),
        "(= (. (call (. a b) 1.0 s) c) (= d nil))"
    );
    assert_eq!(AstPrinter::print(&expression("super.cook")), "(super cook)");
}

#[test]
fn identical_expressions_are_distinct_nodes() {
    let stmts = program("a; a;");

    let ids: Vec<_> = stmts
        .iter()
        .map(|stmt| match stmt {
            Stmt::Expression(Expr::Variable { id, .. }) => *id,
            other => panic!("unexpected statement {:?}", other),
        })
        .collect();

    assert_ne!(ids[0], ids[1]);
}

#[test]
fn for_loop_is_lowered_to_while() {
    let stmts = program("for (var i = 0; i < 3; i = i + 1) print i;");

    let [Stmt::Block(outer)] = stmts.as_slice() else {
        panic!("expected one block, got {:?}", stmts);
    };
    assert!(matches!(outer[0], Stmt::Var { .. }));

    let Stmt::While { body, .. } = &outer[1] else {
        panic!("expected while, got {:?}", outer[1]);
    };
    let Stmt::Block(inner) = body.as_ref() else {
        panic!("expected block body, got {:?}", body);
    };
    assert!(matches!(inner[0], Stmt::Print(_)));
    assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
}

#[test]
fn for_loop_without_clauses_loops_on_true() {
    let stmts = program("for (;;) print 1;");

    let [Stmt::While { condition, .. }] = stmts.as_slice() else {
        panic!("expected a bare while, got {:?}", stmts);
    };
    assert!(matches!(
        condition,
        Expr::Literal {
            value: LiteralValue::True,
            line: 1
        }
    ));
}

#[test]
fn class_with_superclass_and_methods() {
    let stmts = program("class B < A { init(x) { this.x = x; } get() { return this.x; } }");

    let [Stmt::Class {
        name,
        superclass,
        methods,
    }] = stmts.as_slice()
    else {
        panic!("expected a class, got {:?}", stmts);
    };

    assert_eq!(name.lexeme, "B");
    assert!(matches!(superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));
    let names: Vec<&str> = methods.iter().map(|m| m.name.lexeme.as_str()).collect();
    assert_eq!(names, vec!["init", "get"]);
    assert_eq!(methods[0].params.len(), 1);
}

#[test]
fn reports_every_syntax_error() {
    assert_eq!(
        parse_errors("var = 1;\nprint (2;\nvar ok = 3;"),
        vec![
            "[line 1] Error at '=': Expected variable name",
            "[line 2] Error at ';': Expected ')' after expression",
        ]
    );
}

#[test]
fn invalid_assignment_target() {
    assert_eq!(
        parse_errors("1 + 2 = 3;"),
        vec!["[line 1] Error at '=': Invalid assignment target"]
    );
}

#[test]
fn missing_semicolon_at_end() {
    assert_eq!(
        parse_errors("print 1"),
        vec!["[line 1] Error at end: Expected ';' after value"]
    );
}

#[test]
fn ast_serializes_to_json() {
    let json = serde_json::to_value(expression("1 + x")).unwrap();

    assert_eq!(json["Binary"]["operator"]["lexeme"], "+");
    assert_eq!(json["Binary"]["left"]["Literal"]["value"]["Number"], 1.0);
    assert_eq!(json["Binary"]["right"]["Variable"]["name"]["lexeme"], "x");
}

#[test]
fn literals_keep_their_line() {
    assert_eq!(expression("\n\n42").line(), 3);
    assert_eq!(expression("\n(\"text\")").line(), 2);
}

fn printed(source: &str) -> String {
    AstPrinter::print_program(&program(source))
}

#[test]
fn prints_simple_statements() {
    assert_eq!(
        printed("var a; var b = 1; print a + b; a = 2;"),
        "(var a)\n(var b = 1.0)\n(print (+ a b))\n(; (= a 2.0))"
    );
}

#[test]
fn prints_control_flow() {
    assert_eq!(
        printed("if (a) print 1; else { print 2; } while (b) b = false;"),
        "(if-else a (print 1.0) (block (print 2.0)))\n(while b (; (= b false)))"
    );
    assert_eq!(printed("if (a) {}"), "(if a (block))");
}

#[test]
fn prints_functions_and_classes() {
    assert_eq!(
        printed("fun add(a, b) { return a + b; } fun noop() { return; }"),
        "(fun add(a b) (return (+ a b)))\n(fun noop() (return))"
    );
    assert_eq!(
        printed("class B < A { init(x) { this.x = x; } }"),
        "(class B < A (fun init(x) (; (= (. this x) x))))"
    );
}

#[test]
fn deep_nesting_parses_and_prints() {
    let depth = 50_000;
    let source = format!("{}print 1;{}", "{".repeat(depth), "}".repeat(depth));

    let printed = printed(&source);

    assert!(printed.starts_with("(block (block "));
    assert_eq!(printed.matches("(block").count(), depth);
}
