use super::{syntax_error, tree};
use crate::node::{Node, NodeKind};
use crate::{ErrorCategory, ParseError, ParseOptions, Parser, Registry, parse_tree};

fn operation(node: &Node) -> &crate::Operation {
    match node {
        Node::Operation(operation) => operation,
        other => panic!("expected an operation, got {}", other.kind()),
    }
}

#[test]
fn test_empty_input_has_no_tree() {
    for text in ["", " ", " \t\n "] {
        assert_eq!(parse_tree(text, ParseOptions::default()), Ok(None));
    }
}

#[test]
fn test_single_values() {
    assert_eq!(tree("42").kind(), NodeKind::Number);
    assert_eq!(tree("'text'").kind(), NodeKind::String);
    assert_eq!(tree("name").kind(), NodeKind::FieldReference);
    assert_eq!(tree("{my field}").kind(), NodeKind::FieldReference);
    assert_eq!(tree("  7  ").kind(), NodeKind::Number);
}

#[test]
fn test_precedence() {
    let root = tree("1+2*3");
    let plus = operation(&root);
    assert_eq!(plus.symbol(), "+");
    assert_eq!(plus.left().value(), "1");
    assert_eq!(operation(plus.right()).symbol(), "*");

    let root = tree("1*2+3");
    let plus = operation(&root);
    assert_eq!(plus.symbol(), "+");
    assert_eq!(operation(plus.left()).symbol(), "*");
    assert_eq!(plus.right().value(), "3");

    let root = tree("1=2&3");
    let equals = operation(&root);
    assert_eq!(equals.symbol(), "=");
    assert_eq!(operation(equals.right()).symbol(), "&");
}

#[test]
fn test_left_associativity() {
    let root = tree("1+2+3");
    let outer = operation(&root);
    assert_eq!(outer.right().value(), "3");
    let inner = operation(outer.left());
    assert_eq!((inner.left().value(), inner.right().value()), ("1", "2"));

    let root = tree("8/4*2");
    let outer = operation(&root);
    assert_eq!(outer.symbol(), "*");
    assert_eq!(operation(outer.left()).symbol(), "/");
}

#[test]
fn test_enclosed_expressions_keep_their_text() {
    let root = tree("(1)");
    assert_eq!(root.kind(), NodeKind::EnclosedExpression);
    assert_eq!(root.value(), "1");
    assert_eq!((root.start(), root.end()), (1, 2));
    assert_eq!((root.outer_start(), root.outer_end()), (0, 3));

    let root = tree("((1))");
    assert_eq!(root.kind(), NodeKind::EnclosedExpression);
    assert_eq!(root.value(), "(1)");

    let root = tree("((0) * (0))");
    assert_eq!(root.kind(), NodeKind::EnclosedExpression);
    assert_eq!(root.value(), "(0) * (0)");
    assert_eq!(root.render(), "((0) * (0))");
}

#[test]
fn test_parentheses_override_precedence() {
    let root = tree("(1+2)*3");
    let times = operation(&root);
    assert_eq!(times.symbol(), "*");
    assert_eq!(times.left().kind(), NodeKind::EnclosedExpression);
}

#[test]
fn test_modifiers() {
    let root = tree("-1");
    assert_eq!(root.kind(), NodeKind::Modifier);

    let root = tree("1 - -2");
    let minus = operation(&root);
    assert_eq!(minus.left().value(), "1");
    assert_eq!(minus.right().kind(), NodeKind::Modifier);

    let root = tree("SUM(1, -2)");
    let Node::FunctionCall(call) = &root else {
        panic!("expected a call");
    };
    assert_eq!(call.args()[1].kind(), NodeKind::Modifier);
}

#[test]
fn test_function_calls() {
    let root = tree("IF(a, SUM(1, 2), 'no')");
    let Node::FunctionCall(call) = &root else {
        panic!("expected a call, got {}", root.kind());
    };
    assert_eq!(call.name(), "IF");
    let kinds: Vec<NodeKind> = call.args().iter().map(|arg| arg.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::FieldReference,
            NodeKind::FunctionCall,
            NodeKind::String
        ]
    );

    let root = tree("NOW()");
    let Node::FunctionCall(call) = &root else {
        panic!("expected a call");
    };
    assert!(call.args().is_empty());
}

#[test]
fn test_calls_inside_operations() {
    let root = tree("1 + NOT(2) + 3");
    let outer = operation(&root);
    let inner = operation(outer.left());
    assert_eq!(inner.right().kind(), NodeKind::FunctionCall);
}

#[test]
fn test_remove_space() {
    let text = "IF( a , SUM( 1 ,{b c} ) , - 2 * ( 3 ) )";
    let with = tree(text);
    assert!(with.walk().any(Node::is_space));

    let without = parse_tree(
        text,
        ParseOptions {
            remove_space: true,
            ..ParseOptions::default()
        },
    )
    .unwrap()
    .unwrap();
    assert!(!without.walk().any(Node::is_space));
    assert_eq!(without.kind(), NodeKind::FunctionCall);

    let Node::FunctionCall(call) = &without else {
        panic!("expected a call");
    };
    assert_eq!(call.name(), "IF");
    assert_eq!(call.args().len(), 3);
}

#[test]
fn test_syntax_errors() {
    let cases: &[(&str, NodeKind, usize, &str)] = &[
        (
            "foo(,)",
            NodeKind::ArgumentSeparator,
            4,
            "expected an expression to the left and right of separator to exist",
        ),
        (
            "foo(,3)",
            NodeKind::ArgumentSeparator,
            4,
            "expected an expression to the left and right of separator to exist",
        ),
        (
            "foo(1,,3)",
            NodeKind::ArgumentSeparator,
            5,
            "expected an expression to the right of separator, but got argumentSeparator",
        ),
        (
            "foo(2,)",
            NodeKind::ArgumentSeparator,
            5,
            "expected an expression to the left and right of separator to exist",
        ),
        (
            "(1,2)",
            NodeKind::Group,
            1,
            "Expected an argument list to be preceded by a reference, but got nothing instead",
        ),
        (
            "1+()",
            NodeKind::Group,
            3,
            "Expected an argument list to be preceded by a reference, but got operator instead",
        ),
        ("foo(1,2)s", NodeKind::Reference, 8, "Unexpected node reference"),
        ("f o(1,2)", NodeKind::Reference, 2, "Unexpected node reference"),
        ("&3", NodeKind::Number, 1, "Unexpected node number"),
        ("1+", NodeKind::Operator, 1, "Unexpected node operator"),
        (
            "1,2",
            NodeKind::DelimitedExpressionList,
            0,
            "Expected to find an expression, got delimitedExpressionList instead",
        ),
        (
            "(*3)",
            NodeKind::EnclosedExpression,
            1,
            "Invalid enclosed expression",
        ),
    ];

    for &(text, node, position, message) in cases {
        let err = syntax_error(text);
        assert_eq!(err.category, ErrorCategory::Syntax, "{text}");
        assert_eq!(err.node, node, "{text}");
        assert_eq!(err.position, position, "{text}");
        assert_eq!(err.message, message, "{text}");
    }
}

#[test]
fn test_syntax_error_display() {
    let err = syntax_error("foo(,)");
    assert_eq!(
        err.to_string(),
        "Syntax error while parsing argumentSeparator node at position 4: \
         expected an expression to the left and right of separator to exist"
    );
}

#[test]
fn test_tokenize_errors_pass_through() {
    let err = parse_tree("'open", ParseOptions::default()).unwrap_err();
    assert!(matches!(err, ParseError::Tokenize(_)));
    assert_eq!(err.position(), Some(0));
}

#[test]
fn test_iteration_bound_is_internal_error() {
    let err = Parser::default()
        .max_iterations(1)
        .parse_tree("1+2+3")
        .unwrap_err();
    let ParseError::Syntax(err) = err else {
        panic!("expected a syntax error, got {err:?}");
    };
    assert!(err.is_internal());
    assert!(err.to_string().starts_with("Internal error while parsing"));

    assert!(
        Parser::default()
            .max_iterations(64)
            .parse_tree("1+2+3")
            .unwrap()
            .is_some()
    );
}

#[test]
fn test_zero_iteration_bound_still_settles() {
    let parser = Parser::default().max_iterations(0);
    assert_eq!(parser.parse_tree(""), Ok(None));
    assert_eq!(parser.parse_tree("  "), Ok(None));
    assert_eq!(parser.parse_tree("7").unwrap().unwrap().kind(), NodeKind::Number);
}

#[test]
fn test_deep_parentheses() {
    let depth = crate::tokenizer::MAX_NESTING_DEPTH;
    let root = tree(&format!("{}1{}", "(".repeat(depth), ")".repeat(depth)));
    assert_eq!(root.kind(), NodeKind::EnclosedExpression);
    assert_eq!((root.outer_start(), root.outer_end()), (0, 2 * depth + 1));

    let text = format!("{}1{}", "(".repeat(1000), ")".repeat(1000));
    let err = parse_tree(&text, ParseOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        ParseError::Tokenize(crate::TokenizeError::TooDeep { .. })
    ));
    assert_eq!(err.position(), Some(depth));
}

#[test]
fn test_long_chain() {
    let text = vec!["1"; 3000].join("+");
    let root = tree(&text);
    let outer = operation(&root);
    assert_eq!(outer.symbol(), "+");
    assert_eq!((root.start(), root.end()), (0, text.len()));
}

#[test]
fn test_custom_registry() {
    let registry = Registry::new(["MAX"], ["^", "-"]).unwrap();
    let parser = Parser::new(&registry);
    let root = parser.parse_tree("MAX(2 ^ 3, -1)").unwrap().unwrap();
    assert_eq!(root.kind(), NodeKind::FunctionCall);

    assert!(parser.parse_tree("1 + 2").is_err());
}
