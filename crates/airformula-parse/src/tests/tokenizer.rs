use crate::node::{Node, NodeKind};
use crate::tokenizer::{Context, Pattern, Role, tokenize};
use crate::{Registry, TokenizeError, Tokenizer};

fn kinds(members: &[Node]) -> Vec<NodeKind> {
    members.iter().map(Node::kind).collect()
}

fn spans(members: &[Node]) -> Vec<(usize, usize)> {
    members.iter().map(|m| (m.start(), m.end())).collect()
}

#[test]
fn test_flat_members() {
    let root = tokenize("1 + foo").unwrap();
    assert_eq!(
        kinds(&root.members),
        vec![
            NodeKind::Number,
            NodeKind::Space,
            NodeKind::Operator,
            NodeKind::Space,
            NodeKind::Reference,
        ]
    );
    assert_eq!(spans(&root.members), vec![(0, 1), (1, 2), (2, 3), (3, 4), (4, 7)]);
    assert_eq!((root.start, root.end), (0, 7));
    assert_eq!(root.value, "1 + foo");
}

#[test]
fn test_numbers_and_references() {
    let err = tokenize("12.5 a_1 3.").unwrap_err();
    // "3." leaves a lone dot that no pattern accepts
    assert_eq!(err.position(), 10);

    let root = tokenize("12.5+a_1").unwrap();
    let values: Vec<&str> = root.members.iter().map(Node::value).collect();
    assert_eq!(values, vec!["12.5", "+", "a_1"]);
}

#[test]
fn test_longest_operator_wins() {
    let root = tokenize("1<=2!=3").unwrap();
    let operators: Vec<&str> = root
        .members
        .iter()
        .filter(|m| m.is_operator())
        .map(Node::value)
        .collect();
    assert_eq!(operators, vec!["<=", "!="]);
}

#[test]
fn test_braced_reference_and_group() {
    let root = tokenize("{my field}+(1)").unwrap();
    assert_eq!(
        kinds(&root.members),
        vec![NodeKind::Reference, NodeKind::Operator, NodeKind::Group]
    );

    let field = &root.members[0];
    assert!(field.is_braced_reference());
    assert_eq!(field.value(), "my field");
    assert_eq!((field.start(), field.end()), (1, 9));
    assert_eq!((field.outer_start(), field.outer_end()), (0, 10));

    let group = &root.members[2];
    assert_eq!((group.start(), group.end()), (12, 13));
    assert_eq!(kinds(group.members()), vec![NodeKind::Number]);
    let enclosure = group.enclosure().unwrap();
    assert_eq!(enclosure.opener.kind, NodeKind::OpenParenthesis);
    assert_eq!(enclosure.closer.kind, NodeKind::CloseParenthesis);
}

#[test]
fn test_nested_groups_render_their_text() {
    let root = tokenize("(a(b))").unwrap();
    assert_eq!(root.members.len(), 1);
    assert_eq!(root.members[0].value(), "a(b)");
    assert_eq!(root.members[0].render(), "(a(b))");
}

#[test]
fn test_strings_keep_raw_content() {
    let root = tokenize(r#"'it\'s' "say \"hi\"" "a\\b" 'c\d'"#).unwrap();
    let strings: Vec<&str> = root
        .members
        .iter()
        .filter(|m| m.kind() == NodeKind::String)
        .map(Node::value)
        .collect();
    assert_eq!(strings, vec![r#"it\'s"#, r#"say \"hi\""#, r#"a\\b"#, r#"c\d"#]);

    let first = &root.members[0];
    assert_eq!((first.start(), first.end()), (1, 6));
    assert_eq!(first.enclosure().unwrap().opener.kind, NodeKind::QuoteMark);
}

#[test]
fn test_other_quote_is_plain_text() {
    let root = tokenize(r#""it's" 'say "hi"'"#).unwrap();
    assert_eq!(root.members[0].value(), "it's");
    assert_eq!(root.members[2].value(), r#"say "hi""#);
}

#[test]
fn test_empty_string_and_braces() {
    let root = tokenize("''{}").unwrap();
    assert_eq!(root.members[0].value(), "");
    assert_eq!(root.members[1].value(), "");
    assert_eq!(root.members[1].kind(), NodeKind::Reference);
}

#[test]
fn test_unclosed_quote() {
    let err = tokenize("\"unterminated").unwrap_err();
    assert_eq!(
        err,
        TokenizeError::Unclosed {
            context: Context::DoubleQuoted,
            opener: "\"".to_string(),
            position: 0,
        }
    );
    assert_eq!(
        err.to_string(),
        "Unclosed double-quoted string, with `\"` at position 0"
    );
}

#[test]
fn test_unclosed_reports_innermost_context() {
    let err = tokenize("SUM(1, (2").unwrap_err();
    assert_eq!(
        err,
        TokenizeError::Unclosed {
            context: Context::Parenthesized,
            opener: "(".to_string(),
            position: 7,
        }
    );
}

#[test]
fn test_nesting_depth_is_bounded() {
    let depth = crate::tokenizer::MAX_NESTING_DEPTH;
    let deepest = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    assert!(tokenize(&deepest).is_ok());

    let too_deep = format!("{}1{}", "(".repeat(1000), ")".repeat(1000));
    let err = tokenize(&too_deep).unwrap_err();
    assert_eq!(
        err,
        TokenizeError::TooDeep {
            position: depth,
            limit: depth,
        }
    );
    assert_eq!(err.position(), depth);

    // quotes and braces open a level too
    let quoted = format!("{}'a'{}", "(".repeat(depth), ")".repeat(depth));
    assert!(matches!(
        tokenize(&quoted),
        Err(TokenizeError::TooDeep { .. })
    ));
}

#[test]
fn test_unexpected_closing() {
    let err = tokenize("1)").unwrap_err();
    assert_eq!(
        err,
        TokenizeError::UnexpectedClosing {
            token: ")".to_string(),
            position: 1,
        }
    );
}

#[test]
fn test_unexpected_character_lists_legal_patterns() {
    let err = tokenize("1 # 2").unwrap_err();
    match &err {
        TokenizeError::UnexpectedCharacter {
            position,
            found,
            context,
            expected,
        } => {
            assert_eq!(*position, 2);
            assert_eq!(*found, '#');
            assert_eq!(*context, Context::Root);
            assert_eq!(expected.as_slice(), Context::Root.patterns());
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("expected opening double quote"));

    // a closing brace outside a braced reference is not a closer
    let err = tokenize("a}").unwrap_err();
    assert!(matches!(
        err,
        TokenizeError::UnexpectedCharacter { position: 1, .. }
    ));
}

#[test]
fn test_registry_drives_operators() {
    let registry = Registry::new(["IF"], ["<>", "^"]).unwrap();
    let root = Tokenizer::new("1<>2^3", &registry).tokenize().unwrap();
    let operators: Vec<&str> = root
        .members
        .iter()
        .filter(|m| m.is_operator())
        .map(Node::value)
        .collect();
    assert_eq!(operators, vec!["<>", "^"]);

    assert!(Tokenizer::new("1+2", &registry).tokenize().is_err());
}

#[test]
fn test_unicode_spaces_and_offsets() {
    let root = tokenize("1\u{3000}+ 2").unwrap();
    assert_eq!(root.members[1].kind(), NodeKind::Space);
    assert_eq!(spans(&root.members)[1], (1, 4));
    assert_eq!(root.value, "1\u{3000}+ 2");
}

#[test]
fn test_pattern_tables() {
    let contexts = [
        Context::Root,
        Context::Parenthesized,
        Context::DoubleQuoted,
        Context::SingleQuoted,
        Context::Braced,
    ];
    for context in contexts {
        let patterns = context.patterns();
        let opens = patterns
            .iter()
            .filter(|p| matches!(p.role(), Role::Open(_)))
            .count();
        let closes = patterns
            .iter()
            .filter(|p| matches!(p.role(), Role::Close))
            .count();
        let members = patterns
            .iter()
            .filter(|p| matches!(p.role(), Role::Member(_)))
            .count();
        match context {
            Context::Root | Context::Parenthesized => {
                assert_eq!(opens, 4);
                assert_eq!(members, 5);
            }
            _ => {
                assert_eq!(opens, 0, "{context} cannot open contexts");
                assert_eq!(members, 0, "{context} holds content only");
            }
        }
        assert_eq!(closes, 1, "{context} has exactly one closer");
    }
    assert_eq!(Context::Braced.patterns()[0], Pattern::CloseBrace);
}

#[test]
fn test_value_round_trips() {
    for text in [
        "",
        "   ",
        "IF(AND(name='Robert',age>={minimum age}+10),TRUE(),'x')",
        "  1 +\t( 2 *  3 ) ",
        r#"CONCATENATE("a\"b", 'c\'d', {e f})"#,
        "((((1))))",
    ] {
        let root = tokenize(text).unwrap();
        assert_eq!(root.value, text);
        assert_eq!(Node::Group(root).render(), text);
    }
}
