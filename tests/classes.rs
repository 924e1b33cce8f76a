mod common;

use pretty_assertions::assert_eq;

use common::{errors, output, runtime_error};
use rox::error::RuntimeErrorKind;

#[test]
fn fields_and_methods() {
    assert_eq!(
        output(
            "class Bagel { eat() { print \"Crunch crunch crunch!\"; } }\n\
             var bagel = Bagel();\n\
             bagel.topping = \"seeds\";\n\
             print bagel.topping;\n\
             bagel.eat();\n\
             print bagel;"
        ),
        vec!["seeds", "Crunch crunch crunch!", "Bagel instance"]
    );
}

#[test]
fn methods_bind_this() {
    assert_eq!(
        output(
            "class Cake {\n\
               taste() { print \"The \" + this.flavor + \" cake is delicious!\"; }\n\
             }\n\
             var cake = Cake();\n\
             cake.flavor = \"German chocolate\";\n\
             var taste = cake.taste;\n\
             cake.flavor = \"lemon\";\n\
             taste();"
        ),
        vec!["The lemon cake is delicious!"]
    );
}

#[test]
fn initializer_sets_up_state_and_returns_instance() {
    assert_eq!(
        output(
            "class Point {\n\
               init(x, y) { this.x = x; this.y = y; }\n\
               sum() { return this.x + this.y; }\n\
             }\n\
             var p = Point(1, 2);\n\
             print p.sum();\n\
             print p.init(10, 20);\n\
             print p.x;"
        ),
        vec!["3", "Point instance", "10"]
    );
}

#[test]
fn bare_return_in_initializer_still_yields_instance() {
    assert_eq!(
        output(
            "class Early {\n\
               init(stop) { this.a = 1; if (stop) return; this.a = 2; }\n\
             }\n\
             print Early(true).a;\n\
             print Early(false).a;\n\
             var e = Early(true);\n\
             print e.init(false) == e;"
        ),
        vec!["1", "2", "true"]
    );
}

#[test]
fn returning_a_value_from_initializer_is_rejected() {
    assert_eq!(
        errors("class Bad {\n  init() { return 1; }\n}"),
        vec!["[line 2] Error at 'return': Can't return a value from an initializer."]
    );
}

#[test]
fn class_arity_follows_init() {
    let err = runtime_error("class P { init(a) {} }\nP();");
    assert_eq!(err.kind, RuntimeErrorKind::ArityMismatch);
    assert_eq!(err.to_string(), "Expected 1 arguments but got 0.\n[line 2]");

    let err = runtime_error("class Q {}\nQ(1);");
    assert_eq!(err.message, "Expected 0 arguments but got 1.");
}

#[test]
fn fields_shadow_methods() {
    assert_eq!(
        output(
            "class Box { label() { return \"method\"; } }\n\
             var b = Box();\n\
             print b.label();\n\
             fun replacement() { return \"field\"; }\n\
             b.label = replacement;\n\
             print b.label();"
        ),
        vec!["method", "field"]
    );
}

#[test]
fn inherited_methods() {
    assert_eq!(
        output(
            "class Doughnut { cook() { print \"Fry until golden brown.\"; } }\n\
             class BostonCream < Doughnut {}\n\
             BostonCream().cook();"
        ),
        vec!["Fry until golden brown."]
    );
}

#[test]
fn super_calls_bind_this_to_the_subclass_instance() {
    assert_eq!(
        output(
            "class A {\n\
               method() { print \"A method\"; }\n\
               describe() { return \"A sees \" + this.name; }\n\
             }\n\
             class B < A {\n\
               method() { print \"B method\"; }\n\
               test() { super.method(); }\n\
               describe() { return \"B then \" + super.describe(); }\n\
             }\n\
             class C < B {}\n\
             var c = C();\n\
             c.name = \"c\";\n\
             c.test();\n\
             print c.describe();"
        ),
        vec!["A method", "B then A sees c"]
    );
}

#[test]
fn super_resolves_statically_not_by_receiver() {
    assert_eq!(
        output(
            "class Base { say() { return \"base\"; } }\n\
             class Mid < Base { say() { return \"mid/\" + super.say(); } }\n\
             class Leaf < Mid { say() { return \"leaf/\" + super.say(); } }\n\
             print Leaf().say();"
        ),
        vec!["leaf/mid/base"]
    );
}

#[test]
fn inherited_initializer() {
    assert_eq!(
        output(
            "class Named { init(name) { this.name = name; } }\n\
             class Pet < Named {}\n\
             print Pet(\"rex\").name;"
        ),
        vec!["rex"]
    );
}

#[test]
fn undefined_property() {
    let err = runtime_error("class E {}\nprint E().missing;");
    assert_eq!(err.kind, RuntimeErrorKind::UndefinedProperty);
    assert_eq!(err.to_string(), "Undefined property 'missing'.\n[line 2]");

    let err = runtime_error("class E {}\nclass F < E { m() { return super.nope; } }\nF().m();");
    assert_eq!(err.kind, RuntimeErrorKind::UndefinedProperty);
    assert_eq!(err.message, "Undefined property 'nope'.");
}

#[test]
fn only_instances_have_properties() {
    let err = runtime_error("var n = 1;\nprint n.x;");
    assert_eq!(err.kind, RuntimeErrorKind::Type);
    assert_eq!(err.message, "Only instances have properties.");

    let err = runtime_error("\"s\".field = 1;");
    assert_eq!(err.message, "Only instances have fields.");
}

#[test]
fn superclass_must_be_a_class() {
    let err = runtime_error("var NotAClass = \"nope\";\nclass Sub < NotAClass {}");

    assert_eq!(err.kind, RuntimeErrorKind::Type);
    assert_eq!(err.to_string(), "Superclass must be a class.\n[line 2]");
}

#[test]
fn instances_compare_by_identity() {
    assert_eq!(
        output(
            "class K {}\n\
             var a = K(); var b = K(); var c = a;\n\
             print a == b; print a == c; print K == K;"
        ),
        vec!["false", "true", "true"]
    );
}
