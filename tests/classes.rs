use rox::session::{Outcome, Session, EXIT_RUNTIME_ERROR};

fn run(source: &str) -> (String, Outcome) {
    let mut session = Session::with_output(Vec::new());
    let outcome = session.run(source.as_bytes());
    let output = String::from_utf8(session.into_output()).unwrap();
    (output, outcome)
}

fn output_of(source: &str) -> String {
    let (output, outcome) = run(source);
    assert!(outcome.is_success(), "unexpected failure: {:?}", outcome);
    output
}

fn runtime_error(source: &str) -> String {
    let (_, outcome) = run(source);
    assert_eq!(outcome.exit_code(), EXIT_RUNTIME_ERROR, "{:?}", outcome);
    outcome.diagnostics()[0].to_string()
}

#[test]
fn classes_and_instances_print_by_name() {
    assert_eq!(
        output_of("class Bagel {} print Bagel; print Bagel();"),
        "Bagel\nBagel instance\n"
    );
}

#[test]
fn fields_are_created_on_assignment() {
    assert_eq!(
        output_of(
            "class Bag {}
             var b = Bag();
             b.apples = 1;
             b.apples = b.apples + 1;
             print b.apples;
             print b.pears = \"set\";"
        ),
        "2\nset\n"
    );
}

#[test]
fn fields_shadow_methods() {
    assert_eq!(
        output_of(
            "class M { f() { return \"method\"; } }
             var m = M();
             print m.f();
             m.f = \"field\";
             print m.f;"
        ),
        "method\nfield\n"
    );
}

#[test]
fn initializer_always_yields_the_instance() {
    assert_eq!(
        output_of(
            "class Point {
               init(x) {
                 this.x = x;
                 if (x > 10) return;
                 this.small = true;
               }
             }
             var p = Point(3);
             print p.x;
             print p.small;
             var q = Point(30);
             print q;
             print q.init(4) == q;
             print q.x;"
        ),
        "3\ntrue\nPoint instance\ntrue\n4\n"
    );
}

#[test]
fn bound_methods_remember_this() {
    assert_eq!(
        output_of(
            "class Greeter {
               init(name) { this.name = name; }
               greet() { print \"hi \" + this.name; }
             }
             var greet = Greeter(\"ada\").greet;
             greet();"
        ),
        "hi ada\n"
    );
}

#[test]
fn methods_can_refer_to_their_own_class() {
    assert_eq!(
        output_of(
            "class Node { make() { return Node(); } }
             print Node().make();"
        ),
        "Node instance\n"
    );
}

#[test]
fn inherited_methods_and_initializers() {
    assert_eq!(
        output_of(
            "class A {
               init(v) { this.v = v; }
               show() { print this.v; }
             }
             class B < A {}
             B(7).show();"
        ),
        "7\n"
    );
}

#[test]
fn super_runs_the_parent_method_on_the_same_instance() {
    assert_eq!(
        output_of(
            "class Base {
               describe() { return \"I am \" + this.name(); }
               name() { return \"base\"; }
             }
             class Derived < Base {
               name() { return \"derived\"; }
               describe() { return super.describe() + \"!\"; }
             }
             print Derived().describe();"
        ),
        "I am derived!\n"
    );
}

#[test]
fn super_is_bound_lexically() {
    // C inherits test() from B; `super` inside it still means A.
    assert_eq!(
        output_of(
            "class A { method() { print \"A method\"; } }
             class B < A {
               method() { print \"B method\"; }
               test() { super.method(); }
             }
             class C < B {}
             C().test();"
        ),
        "A method\n"
    );
}

#[test]
fn super_init_chain() {
    assert_eq!(
        output_of(
            "class A { init(v) { this.v = v; } }
             class B < A { init() { super.init(\"from B\"); } }
             print B().v;"
        ),
        "from B\n"
    );
}

#[test]
fn class_call_arity_comes_from_init() {
    assert_eq!(
        runtime_error("class P { init(a, b) {} }\nP(1);"),
        "Expected 2 arguments but got 1.\n[line 2]"
    );
    assert_eq!(
        runtime_error("class Q {}\nQ(1);"),
        "Expected 0 arguments but got 1.\n[line 2]"
    );
}

#[test]
fn undefined_property() {
    assert_eq!(
        runtime_error("class E {}\nE().missing;"),
        "Undefined property 'missing'.\n[line 2]"
    );
    assert_eq!(
        runtime_error("class A {} class B < A { m() { return super.nope(); } }\nB().m();"),
        "Undefined property 'nope'.\n[line 1]"
    );
}

#[test]
fn superclass_must_be_a_class() {
    assert_eq!(
        runtime_error("var NotClass = \"nope\";\nclass Sub < NotClass {}"),
        "Superclass must be a class.\n[line 2]"
    );
}

#[test]
fn only_instances_have_properties() {
    assert_eq!(
        runtime_error("var s = \"str\";\nprint s.length;"),
        "Only instances have properties.\n[line 2]"
    );
    assert_eq!(
        runtime_error("var n = 4;\nn.x = 1;"),
        "Only instances have fields.\n[line 2]"
    );
}

#[test]
fn instances_compare_by_identity() {
    assert_eq!(
        output_of(
            "class A {}
             var a = A();
             var same = a;
             print a == same;
             print a == A();"
        ),
        "true\nfalse\n"
    );
}
