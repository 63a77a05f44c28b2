use airformula_parse::{Node, ParseOptions, Token, parse_tree, tokenize};

#[test]
fn integration_render_roundtrip_and_coverage() {
    let formulas = [
        "1 + 2",
        "IF(AND(name='Robert',age>={minimum age}+10),TRUE(),'x')",
        r#"CONCATENATE("say \"hi\"", 'it\'s', "a\\b")"#,
        "  ( ( 1 ) )  ",
        "{}''\"\"()",
        "NOT( - {a b} != 3.25 )",
    ];

    for formula in formulas {
        let root = Node::Group(tokenize(formula).unwrap());
        assert_eq!(root.render(), formula);
        assert_full_span_coverage(formula, &root);
    }
}

#[test]
fn integration_parsed_tree_keeps_source_text() {
    let formulas = [
        "1 + 2 * 3",
        "IF(AND(name='Robert',age>={minimum age}+10),TRUE(),'x')",
        "((0) * (0))",
        "SUM( 1 , -2 , {x} )",
    ];

    for formula in formulas {
        let tree = parse_tree(formula, ParseOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(tree.render(), formula.trim());
    }
}

#[test]
fn integration_property_like_random_coverage() {
    let alphabet = [
        '(', ')', '{', '}', '+', '-', '*', '/', '&', '<', '>', '=', '!', ',', '.', 'a', 'B', '1',
        '2', '_', '\'', '"', '\\', ' ', '\n',
    ];

    let mut state = 0x5EED_F00D_u64;
    for _ in 0..256 {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;

        let len = ((state % 24) as usize) + 1;
        let mut formula = String::with_capacity(len);
        let mut cursor = state;
        for _ in 0..len {
            cursor ^= cursor << 5;
            cursor ^= cursor >> 3;
            cursor ^= cursor << 7;
            formula.push(alphabet[(cursor as usize) % alphabet.len()]);
        }

        match tokenize(&formula) {
            Ok(tree) => {
                let root = Node::Group(tree);
                assert_eq!(root.render(), formula);
                assert_full_span_coverage(&formula, &root);
            }
            Err(err) => assert!(err.position() <= formula.len(), "{formula:?}: {err}"),
        }
    }
}

fn token_spans(token: &Token, spans: &mut Vec<(usize, usize)>) {
    match &token.enclosure {
        Some(enclosure) => {
            spans.push((enclosure.opener.start, enclosure.opener.end));
            spans.push((token.start, token.end));
            spans.push((enclosure.closer.start, enclosure.closer.end));
        }
        None => spans.push((token.start, token.end)),
    }
}

fn assert_full_span_coverage(formula: &str, root: &Node) {
    let mut spans = Vec::new();
    for node in root.walk() {
        match node {
            Node::Token(token) => token_spans(token, &mut spans),
            Node::Group(group) => {
                if let Some(enclosure) = &group.enclosure {
                    spans.push((enclosure.opener.start, enclosure.opener.end));
                    spans.push((enclosure.closer.start, enclosure.closer.end));
                }
            }
            other => panic!("unexpected {} node in a token tree", other.kind()),
        }
    }

    let mut covered = vec![false; formula.len()];
    for (start, end) in spans {
        assert!(start <= end, "invalid span order {start}..{end}");
        assert!(end <= formula.len(), "span out of bounds {start}..{end}");
        for idx in start..end {
            assert!(!covered[idx], "overlap at {idx} for formula {formula:?}");
            covered[idx] = true;
        }
    }
    assert!(covered.iter().all(|covered| *covered), "gap in {formula:?}");
}
