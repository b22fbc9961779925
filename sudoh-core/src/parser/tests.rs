use super::*;
use crate::lexer::tokenize;

fn transpile(source: &str) -> Result<String, SyntaxError> {
    let mut parser = Parser::new(tokenize(source)?);
    parser.begin()?;
    parser.parse_include_list()?;
    parser.parse_program()?;
    Ok(parser.finish(true))
}

fn compile_ok(source: &str) -> String {
    transpile(source).unwrap_or_else(|e| panic!("{source:?} failed: {e} at {:?}", e.position))
}

fn compile_err(source: &str) -> SyntaxError {
    match transpile(source) {
        Ok(out) => panic!("{source:?} unexpectedly compiled to:\n{out}"),
        Err(e) => e,
    }
}

/// Expected output of a file without routines or includes.
fn program(lines: &[&str]) -> String {
    let mut out = String::from("\nint main()\n{\n");
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("}\n");
    out
}

#[test]
fn assignment_of_sum() {
    assert_eq!(
        compile_ok("x <- 1 + 2"),
        program(&["\tvar _x = var(1) + var(2);"])
    );
}

#[test]
fn if_else_emits_pair_of_blocks() {
    let out = compile_ok("if true then\n\tx <- 1\nelse\n\tx <- 2");
    assert_eq!(
        out,
        program(&[
            "\tif (var(true))",
            "\t{",
            "\t\tvar _x = var(1);",
            "\t}",
            "\telse",
            "\t{",
            "\t\tvar _x = var(2);",
            "\t}",
        ])
    );
}

#[test]
fn numeric_condition_is_a_type_error() {
    let err = compile_err("if 1 then\n\tx <- 1\nelse\n\tx <- 2");
    assert_eq!(err.category, ErrorCategory::Type);
    assert!(err.message.contains("boolean"), "{}", err.message);
    assert_eq!(err.position, Position::new(1, 3));
}

#[test]
fn loop_conditions_must_be_boolean() {
    let cases = [
        ("while 1 do\n\tprint(1)", Position::new(1, 6), "number"),
        ("until \"a\" do\n\tprint(1)", Position::new(1, 6), "string"),
        ("repeat\n\tx <- 1\nuntil 3", Position::new(3, 21), "number"),
        ("repeat\n\tx <- 1\nwhile [1]", Position::new(3, 21), "list"),
    ];
    for (source, position, found) in cases {
        let err = compile_err(source);
        assert_eq!(err.category, ErrorCategory::Type, "{source:?}");
        assert_eq!(
            err.message,
            format!("expected expression of type (boolean) but found '{found}'"),
            "{source:?}"
        );
        assert_eq!(err.position, position, "{source:?}");
    }
}

#[test]
fn undeclared_name_in_routine_body_is_reported_at_the_name() {
    let err = compile_err("function f(a, b)\n\treturn a + b + c");
    assert_eq!(err.category, ErrorCategory::Name);
    assert_eq!(err.message, "use of undeclared variable 'c'");
    assert_eq!(err.position, Position::new(2, 33));
}

#[test]
fn forward_call_with_wrong_arity_fails_at_validation() {
    let err = compile_err("x <- g(1, 2)\nfunction g(a)\n\treturn a");
    assert_eq!(err.category, ErrorCategory::Name);
    assert!(err.message.contains("expects 1"), "{}", err.message);
    assert!(err.message.contains("called with 2"), "{}", err.message);
    assert_eq!(err.position, Position::new(1, 5));
}

#[test]
fn forward_call_with_matching_arity_compiles() {
    let out = compile_ok("x <- g(1, 2)\nfunction g(a, b)\n\treturn a * b");
    assert!(out.contains("\tvar _x = f_g(var(1), var(2));\n"), "{out}");
}

#[test]
fn for_each_over_number_is_rejected() {
    let err = compile_err("for each e in 5 do\n\tprint(e)");
    assert_eq!(err.category, ErrorCategory::Type);
    assert!(
        err.message.contains("(string | list | map)"),
        "{}",
        err.message
    );
}

#[test]
fn list_and_map_literals_keep_order() {
    assert_eq!(
        compile_ok("xs <- [1, 2, 3]"),
        program(&["\tvar _xs = var(List{ var(1), var(2), var(3) });"])
    );
    assert_eq!(
        compile_ok("m <- { \"a\" <- 1, \"b\" <- 2 }"),
        program(&[
            "\tvar _m = var(Map{ { var(std::string(\"a\")), var(1) }, { var(std::string(\"b\")), var(2) } });"
        ])
    );
    assert_eq!(
        compile_ok("xs <- []"),
        program(&["\tvar _xs = var(List{  });"])
    );
}

#[test]
fn malformed_map_entry_is_rejected() {
    let err = compile_err("m <- { \"a\", 1 }");
    assert_eq!(err.message, "map entry must be of form <key> <- <value>");
}

#[test]
fn routine_goes_to_routine_region() {
    let out = compile_ok("function f(a, b)\n\treturn a + b\nx <- f(1, 2)");
    assert_eq!(
        out,
        "\nvar f_f(var _a, var _b)\n{\n\treturn _a + _b;\n}\n\n\
         int main()\n{\n\tvar _x = f_f(var(1), var(2));\n}\n"
    );
}

#[test]
fn routine_without_trailing_return_returns_null() {
    let out = compile_ok("function hello()\n\tprint(\"hi\")");
    assert!(
        out.starts_with(
            "\nvar f_hello()\n{\n\tf_print(var(std::string(\"hi\")));\n\treturn null;\n}\n\n"
        ),
        "{out}"
    );
}

#[test]
fn bare_return_yields_null() {
    let out = compile_ok("function f()\n\treturn");
    assert!(out.contains("\treturn null;\n}\n"), "{out}");
    assert!(!out.contains("return null;\n\treturn null;"), "{out}");
}

#[test]
fn else_if_chain() {
    let out = compile_ok(
        "x <- 1\nif x = 1 then\n\tprint(x)\nelse if x = 2 then\n\tprint(x)\nelse\n\tprint(x)",
    );
    assert_eq!(
        out,
        program(&[
            "\tvar _x = var(1);",
            "\tif (_x == var(1))",
            "\t{",
            "\t\tf_print(_x);",
            "\t}",
            "\telse if (_x == var(2))",
            "\t{",
            "\t\tf_print(_x);",
            "\t}",
            "\telse",
            "\t{",
            "\t\tf_print(_x);",
            "\t}",
        ])
    );
}

#[test]
fn else_must_come_last_and_only_once() {
    let err = compile_err("if true then\n\tx <- 1\nelse\n\tx <- 2\nelse\n\tx <- 3");
    assert_eq!(err.message, "multiple 'else' blocks not allowed");

    let err = compile_err("if true then\n\tx <- 1\nelse\n\tx <- 2\nelse if false then\n\tx <- 3");
    assert_eq!(
        err.message,
        "'else' block cannot be followed by 'else if' block"
    );
}

#[test]
fn while_and_until_loops() {
    let out = compile_ok("n <- 3\nwhile n > 0 do\n\tn <- n - 1\nuntil n = 3 do\n\tn <- n + 1");
    assert_eq!(
        out,
        program(&[
            "\tvar _n = var(3);",
            "\twhile (_n > var(0))",
            "\t{",
            "\t\t_n -= var(1);",
            "\t}",
            "\twhile (!(_n == var(3)))",
            "\t{",
            "\t\t_n += var(1);",
            "\t}",
        ])
    );
}

#[test]
fn repeat_block_takes_trailing_condition() {
    let out = compile_ok("n <- 0\nrepeat\n\tn <- n + 1\nuntil n = 3");
    assert_eq!(
        out,
        program(&[
            "\tvar _n = var(0);",
            "\tdo",
            "\t{",
            "\t\t_n += var(1);",
            "\t}",
            "\twhile (!(_n == var(3)));",
        ])
    );

    let err = compile_err("n <- 0\nrepeat\n\tn <- 1\nprint(n)");
    assert_eq!(
        err.message,
        "expected 'while' or 'until' condition after 'repeat' block"
    );
}

#[test]
fn counting_loops() {
    let out = compile_ok("for i <- 1 to 10 do\n\tprint(i)\nfor j <- 10 down to 1 do\n\tprint(j)");
    assert_eq!(
        out,
        program(&[
            "\tfor (var _i = var(1); _i <= var(10); _i += var(1))",
            "\t{",
            "\t\tf_print(_i);",
            "\t}",
            "\tfor (var _j = var(10); _j >= var(1); _j -= var(1))",
            "\t{",
            "\t\tf_print(_j);",
            "\t}",
        ])
    );
}

#[test]
fn loop_variable_is_scoped_to_its_block() {
    let err = compile_err("for i <- 1 to 3 do\n\tprint(i)\nprint(i)");
    assert_eq!(err.message, "use of undeclared variable 'i'");
    assert_eq!(err.position.line, 3);
}

#[test]
fn for_each_loop() {
    let out = compile_ok("for each c in \"abc\" do\n\tprint(c)");
    assert_eq!(
        out,
        program(&[
            "\tfor (var _c : var(std::string(\"abc\")))",
            "\t{",
            "\t\tf_print(_c);",
            "\t}",
        ])
    );

    let err = compile_err("c <- 1\nfor each c in [1] do\n\tprint(c)");
    assert_eq!(err.category, ErrorCategory::Name);
    assert_eq!(
        err.message,
        "'for each' iteration variable must be a new variable"
    );
}

#[test]
fn loop_bounds_must_be_numbers() {
    let err = compile_err("for i <- \"a\" to 3 do\n\tprint(i)");
    assert_eq!(err.category, ErrorCategory::Type);
}

#[test]
fn break_and_return_need_an_enclosing_capability() {
    let err = compile_err("break");
    assert_eq!(err.message, "'break' is only allowed inside a loop");

    let err = compile_err("if true then\n\tcontinue");
    assert_eq!(err.message, "'continue' is only allowed inside a loop");

    let err = compile_err("return 1");
    assert_eq!(err.message, "'return' is only allowed inside a function");

    // a routine body does not inherit the loop capability
    let err = compile_err("function f()\n\tbreak");
    assert_eq!(err.message, "'break' is only allowed inside a loop");
}

#[test]
fn break_inside_loop_inside_routine() {
    let out = compile_ok(
        "function f(n)\n\twhile n > 0 do\n\t\tn <- n - 1\n\t\tif n = 3 then\n\t\t\tbreak\n\treturn n",
    );
    assert!(out.contains("\t\t\tbreak;\n"), "{out}");
    assert!(out.contains("\treturn _n;\n}\n\n"), "{out}");
}

#[test]
fn global_is_invisible_inside_routine() {
    let err = compile_err("x <- 1\nfunction f()\n\treturn x");
    assert_eq!(err.message, "use of undeclared variable 'x'");

    // assigning it declares a fresh local instead
    let out = compile_ok("x <- 1\nfunction f()\n\tx <- 2\n\treturn x");
    assert!(out.contains("\tvar _x = var(2);\n"), "{out}");
}

#[test]
fn branch_variable_is_invisible_after_block() {
    let err = compile_err("if true then\n\ty <- 1\nprint(y)");
    assert_eq!(err.category, ErrorCategory::Name);
    assert_eq!(err.position, Position::new(3, 27));
}

#[test]
fn new_variable_is_not_visible_in_its_own_initializer() {
    let err = compile_err("x <- x + 1");
    assert_eq!(err.message, "use of undeclared variable 'x'");
}

#[test]
fn indentation_errors() {
    let err = compile_err("x <- 1\n\ty <- 2");
    assert_eq!(err.message, "illegal attempt to increase indentation level");

    let err = compile_err("if true then\n\t\tx <- 1");
    assert_eq!(err.message, "illegal attempt to increase indentation level");

    let err = compile_err("if true then\nx <- 1");
    assert_eq!(err.message, "empty block not allowed");

    let err = compile_err("if true then");
    assert_eq!(err.message, "empty block not allowed");

    let err = compile_err("\tx <- 1");
    assert_eq!(err.message, "base scope must not be indented");
}

#[test]
fn compound_assignment_only_for_single_trailing_term() {
    let out = compile_ok("x <- 0\nx <- x + 1\nx <- x * 2 + 1\nx <- x - (x + 1)");
    assert_eq!(
        out,
        program(&[
            "\tvar _x = var(0);",
            "\t_x += var(1);",
            "\t_x = _x * var(2) + var(1);",
            "\t_x -= (_x + var(1));",
        ])
    );
}

#[test]
fn indexing_reads_with_at_and_writes_with_brackets() {
    let out = compile_ok("xs <- [1, 2]\nxs[0] <- xs[1]\nxs[1] <- xs[1] * 3");
    assert_eq!(
        out,
        program(&[
            "\tvar _xs = var(List{ var(1), var(2) });",
            "\t_xs[var(0)] = _xs.at(var(1));",
            "\t_xs[var(1)] *= var(3);",
        ])
    );

    let err = compile_err("ys[0] <- 1");
    assert_eq!(err.category, ErrorCategory::Name);
    assert!(err.message.starts_with("cannot index into undeclared variable"));
}

#[test]
fn literal_terms() {
    let out = compile_ok("s <- \"hi\" + -1.5\nb <- not (true or false)\nn <- null");
    assert_eq!(
        out,
        program(&[
            "\tvar _s = var(std::string(\"hi\")) + var(-1.5);",
            "\tvar _b = !((var(true) || var(false)));",
            "\tvar _n = null;",
        ])
    );
}

#[test]
fn operator_mismatch_points_at_operator() {
    let err = compile_err("x <- 1 + true");
    assert_eq!(err.category, ErrorCategory::Type);
    assert_eq!(
        err.message,
        "binary operator '+' cannot be applied to types 'number' and 'boolean'"
    );
    assert_eq!(err.position, Position::new(1, 7));
}

#[test]
fn multiline_expression_needs_deeper_continuation() {
    assert_eq!(
        compile_ok("xs <- [1,\n\t2]"),
        program(&["\tvar _xs = var(List{ var(1), var(2) });"])
    );

    let err = compile_err("xs <- [1,\n2]");
    assert!(err.message.starts_with("indentation of following lines"));
}

#[test]
fn routine_header_rules() {
    let err = compile_err("function f(a, a)\n\treturn a");
    assert_eq!(err.category, ErrorCategory::Name);

    let err = compile_err("function f()\n\treturn 1\nfunction f()\n\treturn 2");
    assert!(err.message.contains("already been defined"), "{}", err.message);

    let err = compile_err("function print(x)\n\treturn x");
    assert!(err.message.ends_with("is a built-in I/O routine"), "{}", err.message);

    let err = compile_err("function f()\n\tfunction g()\n\t\treturn 1");
    assert_eq!(err.message, "nested function illegal");

    let err = compile_err("if true then\n\tfunction g()\n\t\treturn 1");
    assert_eq!(err.message, "functions must be declared at the top level");

    let err = compile_err("function while()\n\treturn 1");
    assert_eq!(err.message, "invalid function name");
}

#[test]
fn statements_must_end_their_line() {
    let err = compile_err("x <- 1 y <- 2");
    assert_eq!(
        err.message,
        "each statement must be on a new line; expected end of line"
    );

    let err = compile_err("then");
    assert_eq!(err.message, "invalid line");
}

#[test]
fn include_list_is_only_legal_first() {
    let tokens = tokenize("including lib, util\nx <- 1").expect("tokenize");
    let mut parser = Parser::new(tokens);
    parser.begin().expect("begin");
    let includes = parser.parse_include_list().expect("includes");
    let names: Vec<_> = includes.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["lib", "util"]);
    assert_eq!(includes[1].position, Position::new(1, 15));

    let err = compile_err("x <- 1\nincluding lib");
    assert_eq!(
        err.message,
        "'including' must be on the first line of the file"
    );
}

#[test]
fn imported_routines_are_callable() {
    let tokens = tokenize("including lib\nx <- helper(1)").expect("tokenize");
    let mut parser = Parser::new(tokens);
    parser.begin().expect("begin");
    let includes = parser.parse_include_list().expect("includes");
    parser
        .import_routines(&[RoutineSignature::new("helper", 1)], includes[0].position)
        .expect("import");
    parser.add_include("lib");
    parser.parse_program().expect("program");
    assert_eq!(
        parser.finish(true),
        "#include \"_lib.h\"\n\nint main()\n{\n\tvar _x = f_helper(var(1));\n}\n"
    );
}

#[test]
fn library_output_drops_main() {
    let mut parser = Parser::new(tokenize("function f()\n\treturn 1\nprint(f())").expect("tokenize"));
    parser.begin().expect("begin");
    parser.parse_program().expect("program");
    assert_eq!(parser.finish(false), "\nvar f_f()\n{\n\treturn var(1);\n}\n\n");
    assert_eq!(parser.defined_routines(), [RoutineSignature::new("f", 0)]);
}

#[test]
fn block_context_capabilities() {
    let top = BlockContext::default();
    let looped = top.with(Some(Capability::Loop));
    assert!(looped.in_loop && !looped.in_routine);
    let routine = looped.with(Some(Capability::Routine));
    assert!(!routine.in_loop && routine.in_routine);
    assert_eq!(routine.with(None), routine);
}
