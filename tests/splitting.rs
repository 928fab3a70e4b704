//! Factory line-splitting and budget enforcement tests.

use slirc_grammar::emit::WireEncode;
use slirc_grammar::{
    BuildError, FactoryConfig, MessageFactory, Retention, Symbol, Token, TokenPool,
};

fn rendered_lines(chain: &Token) -> Vec<String> {
    chain
        .siblings()
        .map(|t| String::from_utf8(t.span().to_bytes().to_vec()).unwrap())
        .collect()
}

#[test]
fn test_spaceless_wall_of_text_is_unsplittable() {
    let mut factory = MessageFactory::new();
    factory.source_prefix("nick!user@host").unwrap();
    factory.verb("PRIVMSG").unwrap();
    factory.parameter("#chan").unwrap();
    let wall: String = std::iter::repeat('a').take(900).collect();
    assert_eq!(
        factory.parameter(&wall),
        Err(BuildError::UnsplittableParameter { limit: 512 })
    );
}

#[test]
fn test_spaced_text_splits_and_reassembles() {
    let mut factory = MessageFactory::new();
    let mut pool = TokenPool::new();
    factory.source_prefix("nick!user@host").unwrap();
    factory.verb("PRIVMSG").unwrap();
    factory.parameter("#chan").unwrap();

    // 900 'a' characters with embedded spaces: 100 words of 8 chars.
    let words: Vec<String> = (0..100).map(|_| "aaaaaaaa".to_string()).collect();
    let text = words.join(" ");
    assert!(text.len() >= 890);
    factory.parameter(&text).unwrap();

    let chain = factory.construct_message(&mut pool).unwrap();
    let lines = rendered_lines(&chain);
    assert!(lines.len() >= 2, "must split: got {} line(s)", lines.len());

    let mut fragments = Vec::new();
    for line in &lines {
        assert!(line.len() <= 512, "line over budget: {}", line.len());
        let body = line.strip_suffix("\r\n").expect("CRLF terminated");
        assert!(
            body.starts_with(":nick!user@host PRIVMSG "),
            "source and verb repeat on {body:?}"
        );
        let tail = body.split_once(" PRIVMSG ").unwrap().1;
        let tail = tail.strip_prefix("#chan ").unwrap_or(tail);
        fragments.push(tail.strip_prefix(':').unwrap_or(tail).to_string());
    }
    assert_eq!(fragments.join(" "), text, "fragments reassemble");
}

#[test]
fn test_sixteen_parameters_make_two_lines() {
    let mut factory = MessageFactory::new();
    let mut pool = TokenPool::new();
    factory.source_prefix("srv.example.net").unwrap();
    factory.verb("FOO").unwrap();
    for i in 0..16 {
        factory.parameter(&format!("p{i}")).unwrap();
    }
    let chain = factory.construct_message(&mut pool).unwrap();
    let lines = rendered_lines(&chain);
    assert_eq!(lines.len(), 2);
    for i in 0..15 {
        assert!(lines[0].contains(&format!(" p{i}")), "p{i} on first line");
    }
    assert_eq!(lines[1], ":srv.example.net FOO p15\r\n");
    // Each physical message stays within the parameter cap.
    for line in &chain.siblings().collect::<Vec<_>>() {
        let params = line
            .children()
            .filter(|t| matches!(t.tag(), Symbol::MIDDLE | Symbol::TRAILING))
            .count();
        assert!(params <= 15);
    }
}

#[test]
fn test_retention_can_drop_source() {
    let mut factory = MessageFactory::with_config(FactoryConfig {
        retention: Retention {
            keep_source: false,
            keep_tags: false,
            keep_params: 0,
        },
        ..FactoryConfig::default()
    });
    let mut pool = TokenPool::new();
    factory.tag("label", Some("x")).unwrap();
    factory.source_prefix("nick").unwrap();
    factory.verb("CMD").unwrap();
    for i in 0..16 {
        factory.parameter(&format!("p{i}")).unwrap();
    }
    let chain = factory.construct_message(&mut pool).unwrap();
    let lines = rendered_lines(&chain);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("@label=x :nick CMD "));
    assert_eq!(lines[1], "CMD p15\r\n");
}

#[test]
fn test_custom_line_budget() {
    let mut factory = MessageFactory::with_config(FactoryConfig {
        max_line_len: 64,
        ..FactoryConfig::default()
    });
    let mut pool = TokenPool::new();
    factory.verb("PRIVMSG").unwrap();
    factory.parameter("#c").unwrap();
    factory
        .parameter("words spread over a few short lines of text")
        .unwrap();
    let chain = factory.construct_message(&mut pool).unwrap();
    for line in rendered_lines(&chain) {
        assert!(line.len() <= 64, "line over custom budget: {line:?}");
    }
}

#[test]
fn test_tags_do_not_count_by_default() {
    // A near-budget body plus a large tag block: legal because tags have
    // their own allowance.
    let mut factory = MessageFactory::new();
    let mut pool = TokenPool::new();
    factory.tag("big", Some(&"v".repeat(2000))).unwrap();
    factory.verb("PRIVMSG").unwrap();
    factory.parameter("#chan").unwrap();
    factory.parameter(&"b".repeat(480)).unwrap();
    let chain = factory.construct_message(&mut pool).unwrap();
    let lines = rendered_lines(&chain);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].len() > 512, "tag block rides above the line budget");
}

#[test]
fn test_tags_count_when_configured() {
    let mut factory = MessageFactory::with_config(FactoryConfig {
        tags_count_toward_line: true,
        ..FactoryConfig::default()
    });
    factory.tag("pad", Some(&"v".repeat(400))).unwrap();
    factory.verb("PRIVMSG").unwrap();
    factory.parameter("#chan").unwrap();
    // The tag block now eats line budget: ~400 tag bytes + 480 body bytes
    // cannot fit, and the parameter has no spaces to split at.
    assert!(matches!(
        factory.parameter(&"b".repeat(480)),
        Err(BuildError::UnsplittableParameter { .. })
    ));
}

#[test]
fn test_oversized_tag_block_is_fatal_not_split() {
    let mut factory = MessageFactory::new();
    factory.tag("a", Some(&"v".repeat(8000))).unwrap();
    assert!(matches!(
        factory.tag("b", Some(&"w".repeat(300))),
        Err(BuildError::TagBudgetExceeded { .. })
    ));
}

#[test]
fn test_split_lines_reparse_cleanly() {
    let mut factory = MessageFactory::new();
    let mut pool = TokenPool::new();
    factory.tag("msgid", Some("xyz")).unwrap();
    factory.source_prefix("nick!u@h").unwrap();
    factory.verb("PRIVMSG").unwrap();
    factory.parameter("#chan").unwrap();
    let text = (0..150)
        .map(|i| format!("token{i}"))
        .collect::<Vec<_>>()
        .join(" ");
    factory.parameter(&text).unwrap();
    let chain = factory.construct_message(&mut pool).unwrap();

    let wire = chain.to_wire_bytes();
    let mut cur = slirc_grammar::ByteCursor::copy_from_slice(&wire);
    let parsed = slirc_grammar::try_parse(&mut cur, &mut pool);
    assert!(parsed.ok(), "diagnostics: {:?}", parsed.diagnostics);
    assert_eq!(parsed.len(), chain.siblings().count());
}
