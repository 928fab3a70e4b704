//! Round-trip tests between the factory and the grammar.
//!
//! Constructed messages must re-parse to the same semantic fields (verb,
//! source, tags, parameters), excluding pool identity; parsed messages must
//! emit bytes that re-parse identically.

use slirc_grammar::emit::WireEncode;
use slirc_grammar::{ByteCursor, MessageFactory, Symbol, Token, TokenPool};

/// Semantic fields extracted from a parsed message tree.
#[derive(Debug, PartialEq, Eq)]
struct Fields {
    tags: Vec<(String, Option<String>)>,
    source: Option<String>,
    verb: String,
    params: Vec<String>,
}

fn extract(msg: &Token) -> Fields {
    let tags = msg
        .all_of(Symbol::TAG)
        .map(|tag| {
            // Look only at this tag's own children; a tree walk from `tag`
            // would continue into the following tags.
            let key = tag
                .children()
                .find(|t| t.tag() == Symbol::TAG_KEY)
                .map(Token::to_text)
                .unwrap_or_default();
            let value = tag
                .children()
                .find(|t| t.tag() == Symbol::TAG_VALUE)
                .map(Token::to_text);
            (key, value)
        })
        .collect();
    Fields {
        tags,
        source: msg.first_of(Symbol::SOURCE).map(Token::to_text),
        verb: msg
            .first_of(Symbol::VERB)
            .map(Token::to_text)
            .unwrap_or_default(),
        params: msg
            .children()
            .filter(|t| matches!(t.tag(), Symbol::MIDDLE | Symbol::TRAILING))
            .map(Token::to_text)
            .collect(),
    }
}

fn parse_one(bytes: &[u8]) -> Fields {
    let mut cur = ByteCursor::copy_from_slice(bytes);
    let mut pool = TokenPool::new();
    let parsed = slirc_grammar::try_parse(&mut cur, &mut pool);
    assert!(parsed.ok(), "diagnostics: {:?}", parsed.diagnostics);
    let msg = parsed.messages.as_ref().expect("one message");
    assert!(msg.next().is_none());
    extract(msg)
}

#[test]
fn test_constructed_message_reparses() {
    let mut factory = MessageFactory::new();
    let mut pool = TokenPool::new();
    factory.tag("time", Some("2023-01-01T00:00:00Z")).unwrap();
    factory.tag("msgid", Some("abc123")).unwrap();
    factory.source_prefix("nick!user@host").unwrap();
    factory.verb("PRIVMSG").unwrap();
    factory.parameter("#channel").unwrap();
    factory.parameter("Hello, world!").unwrap();
    let lines = factory.construct_message(&mut pool).unwrap();

    let fields = parse_one(&lines.to_wire_bytes());
    assert_eq!(
        fields,
        Fields {
            tags: vec![
                ("time".into(), Some("2023-01-01T00:00:00Z".into())),
                ("msgid".into(), Some("abc123".into())),
            ],
            source: Some("nick!user@host".into()),
            verb: "PRIVMSG".into(),
            params: vec!["#channel".into(), "Hello, world!".into()],
        }
    );
}

#[test]
fn test_tag_values_with_specials_round_trip() {
    let mut factory = MessageFactory::new();
    let mut pool = TokenPool::new();
    factory
        .tag("note", Some("semi;colon and space\r\nand\\slash"))
        .unwrap();
    factory.verb("TAGMSG").unwrap();
    factory.parameter("#chan").unwrap();
    let lines = factory.construct_message(&mut pool).unwrap();

    let fields = parse_one(&lines.to_wire_bytes());
    assert_eq!(
        fields.tags,
        [(
            "note".into(),
            Some("semi;colon and space\r\nand\\slash".into())
        )]
    );
}

#[test]
fn test_parse_emit_parse_is_stable() {
    let raws: &[&str] = &[
        "PING :irc.example.com",
        ":nick!user@host PRIVMSG #channel :Hello, world!",
        "@time=2023-01-01T00:00:00.000Z;msgid=abc :n!u@h PRIVMSG #c :Tagged",
        ":server 001 nickname :Welcome to the IRC Network",
        ":server MODE #channel +o nick",
        "PRIVMSG #channel :",
        "USER guest 0 * :Real Name",
    ];
    for raw in raws {
        let mut cur = ByteCursor::copy_from_slice(raw.as_bytes());
        let mut pool = TokenPool::new();
        let parsed = slirc_grammar::try_parse(&mut cur, &mut pool);
        // No terminator: the line is remainder, not a message.
        assert!(parsed.is_empty());

        let line = format!("{raw}\r\n");
        let first = parse_one(line.as_bytes());

        let mut cur = ByteCursor::copy_from_slice(line.as_bytes());
        let mut pool = TokenPool::new();
        let reparsed = slirc_grammar::try_parse(&mut cur, &mut pool);
        let emitted = reparsed.messages.as_ref().unwrap().to_wire_bytes();
        let second = parse_one(&emitted);
        assert_eq!(first, second, "unstable round trip for {raw}");
    }
}

#[test]
fn test_empty_trailing_parameter_preserved() {
    let fields = parse_one(b"PRIVMSG #channel :\r\n");
    assert_eq!(fields.params, ["#channel", ""]);

    let mut factory = MessageFactory::new();
    let mut pool = TokenPool::new();
    factory.verb("PRIVMSG").unwrap();
    factory.parameter("#channel").unwrap();
    factory.parameter("").unwrap();
    let lines = factory.construct_message(&mut pool).unwrap();
    assert_eq!(
        parse_one(&lines.to_wire_bytes()).params,
        ["#channel", ""]
    );
}

#[test]
fn test_unicode_content_round_trips() {
    let fields = parse_one(":nick!u@h PRIVMSG #chan :héllo wörld 🎉\r\n".as_bytes());
    assert_eq!(fields.params[1], "héllo wörld 🎉");
}

#[test]
fn test_pool_reclaims_tree_nodes_exactly_once() {
    let mut cur =
        ByteCursor::copy_from_slice(b"@a=1;b=2 :n!u@h PRIVMSG #c :hello there\r\nPING :x\r\n");
    let mut pool = TokenPool::new();
    let parsed = slirc_grammar::try_parse(&mut cur, &mut pool);
    assert!(parsed.ok());

    let chain = parsed.messages.expect("messages");
    // walk() covers both trees: the sibling chain and every descendant.
    let node_count = chain.walk().count();
    let pooled_before = pool.len();
    pool.release(chain);
    // Every node of both trees entered the pool exactly once.
    assert_eq!(pool.len(), pooled_before + node_count);
}

#[test]
fn test_streaming_remainder() {
    let mut cur = ByteCursor::copy_from_slice(b"PING :one\r\nPRIVMSG #chan :par");
    let mut pool = TokenPool::new();
    let parsed = slirc_grammar::try_parse(&mut cur, &mut pool);
    assert!(parsed.ok());
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed.remainder, 11);

    // Feeding the rest of the line completes the message.
    cur.push_chunk(bytes::Bytes::from_static(b"tial words\r\n"));
    let parsed = slirc_grammar::try_parse(&mut cur, &mut pool);
    assert!(parsed.ok());
    let msg = parsed.messages.as_ref().unwrap();
    assert_eq!(extract(msg).params, ["#chan", "partial words"]);
}

#[test]
fn test_malformed_line_is_diagnosed_not_fatal() {
    let mut cur = ByteCursor::copy_from_slice(b":bad source only\x00junk\r\nPING :ok\r\n");
    let mut pool = TokenPool::new();
    let parsed = slirc_grammar::try_parse(&mut cur, &mut pool);
    assert!(!parsed.ok());
    assert_eq!(parsed.diagnostics.len(), 1);
    // The healthy line after the malformed one still parsed.
    assert_eq!(parsed.len(), 1);
}
