//! End-to-end tests for phrase queries and highlight rendering
//!
//! Stores one fixture document, queries it through the predicate surface
//! and checks the serialized output with highlighting on and off.

use textgram::{
    DocId, Engine, HighlightMatches, IndexConfig, IndexKind, MatchSet, NgramOptions, NodeAccess,
    NodeRef, QName, Serializer,
};

const XML: &str = "<root>   <para>some paragraph with <hi>mixed</hi> content.</para>   \
                   <para>another paragraph with <note><hi>nested</hi> inner</note> elements.</para>   \
                   <para>a third paragraph with <term>term</term>.</para>   \
                   <para>double match double match</para></root>";

const MATCH_START: &str = "<tg:match xmlns:tg=\"http://textgram.dev/ns/match\">";
const MATCH_END: &str = "</tg:match>";

/// Store the fixture under a configuration declaring the given scopes
fn store_fixture(scopes: &[&str]) -> (Engine, DocId) {
    let decls: Vec<_> = scopes
        .iter()
        .map(|s| (QName::local(*s), IndexKind::Ngram))
        .collect();
    let (config, errors) = IndexConfig::load(IndexKind::None, NgramOptions::default(), decls);
    assert!(errors.is_empty());
    let mut engine = Engine::new(config);
    let mut txn = engine.begin();
    let doc = engine.store_document(&txn, XML).unwrap();
    txn.commit();
    (engine, doc)
}

fn single_owner(matches: &MatchSet) -> NodeRef {
    let owners = matches.owners();
    assert_eq!(owners.len(), 1);
    owners[0]
}

fn render(engine: &Engine, node: NodeRef, matches: &MatchSet) -> String {
    engine
        .serialize(node, matches, HighlightMatches::Elements)
        .unwrap()
}

#[test]
fn nested_content() {
    let (engine, doc) = store_fixture(&["para", "term"]);
    let paras = engine.elements_by_name(doc, "para");
    assert_eq!(paras.len(), 4);

    let matches = engine.evaluate(&paras, "mixed");
    let owner = single_owner(&matches);
    assert_eq!(
        render(&engine, owner, &matches),
        format!(
            "<para>some paragraph with <hi>{}mixed{}</hi> content.</para>",
            MATCH_START, MATCH_END
        )
    );

    let matches = engine.evaluate(&paras, "content");
    let owner = single_owner(&matches);
    assert_eq!(
        render(&engine, owner, &matches),
        format!(
            "<para>some paragraph with <hi>mixed</hi> {}content{}.</para>",
            MATCH_START, MATCH_END
        )
    );

    let matches = engine.evaluate(&paras, "nested");
    let owner = single_owner(&matches);
    assert_eq!(
        render(&engine, owner, &matches),
        format!(
            "<para>another paragraph with <note><hi>{}nested{}</hi> inner</note> elements.</para>",
            MATCH_START, MATCH_END
        )
    );

    // Two predicates against the same paragraph: both match sets render
    // in one pass without merging into each other
    let mut matches = engine.evaluate(&paras, "content");
    matches.merge(engine.evaluate(&paras, "mixed"));
    let owner = single_owner(&matches);
    assert_eq!(
        render(&engine, owner, &matches),
        format!(
            "<para>some paragraph with <hi>{m}mixed{e}</hi> {m}content{e}.</para>",
            m = MATCH_START,
            e = MATCH_END
        )
    );
}

#[test]
fn match_in_parent() {
    let (engine, doc) = store_fixture(&["para", "term"]);
    let paras = engine.elements_by_name(doc, "para");
    let matches = engine.evaluate(&paras, "mixed");
    assert_eq!(matches.len(), 1);

    // Serializing a child of the matched paragraph still renders the
    // marker: highlighting keys on the covered text nodes
    let hi = engine.elements_by_name(doc, "hi")[0];
    assert_eq!(
        render(&engine, hi, &matches),
        format!("<hi>{}mixed{}</hi>", MATCH_START, MATCH_END)
    );
}

#[test]
fn match_in_ancestor() {
    let (engine, doc) = store_fixture(&["para", "term"]);
    let paras = engine.elements_by_name(doc, "para");
    let matches = engine.evaluate(&paras, "nested");
    assert_eq!(matches.len(), 1);

    let note = engine.elements_by_name(doc, "note")[0];
    assert_eq!(
        render(&engine, note, &matches),
        format!(
            "<note><hi>{}nested{}</hi> inner</note>",
            MATCH_START, MATCH_END
        )
    );

    let nested_hi = engine.elements_by_name(doc, "hi")[1];
    assert_eq!(
        render(&engine, nested_hi, &matches),
        format!("<hi>{}nested{}</hi>", MATCH_START, MATCH_END)
    );
}

#[test]
fn nested_index() {
    let (engine, doc) = store_fixture(&["para", "term"]);
    let terms = engine.elements_by_name(doc, "term");
    let matches = engine.evaluate(&terms, "term");
    assert_eq!(matches.len(), 1);
    let term = single_owner(&matches);

    let expected = format!(
        "<para>a third paragraph with <term>{}term{}</term>.</para>",
        MATCH_START, MATCH_END
    );
    // Rendered the same from the term's parent paragraph
    let para = engine.store().parent(term).unwrap();
    assert_eq!(render(&engine, para, &matches), expected);
}

#[test]
fn nested_scope_duplication() {
    // The paragraph's own logical text includes the nested term's text,
    // so a phrase crossing into the term matches on the paragraph too
    let (engine, doc) = store_fixture(&["para", "term"]);
    let paras = engine.elements_by_name(doc, "para");
    let matches = engine.evaluate(&paras, "with term");
    let owner = single_owner(&matches);
    assert_eq!(
        render(&engine, owner, &matches),
        format!(
            "<para>a third paragraph {m}with {e}<term>{m}term{e}</term>.</para>",
            m = MATCH_START,
            e = MATCH_END
        )
    );
}

#[test]
fn mixed_content_queries() {
    let (engine, doc) = store_fixture(&["para", "term"]);
    let paras = engine.elements_by_name(doc, "para");

    let matches = engine.evaluate(&paras, "mixed content");
    let owner = single_owner(&matches);
    assert_eq!(
        render(&engine, owner, &matches),
        format!(
            "<para>some paragraph with <hi>{m}mixed{e}</hi>{m} content{e}.</para>",
            m = MATCH_START,
            e = MATCH_END
        )
    );

    let matches = engine.evaluate(&paras, "with mixed content");
    let owner = single_owner(&matches);
    assert_eq!(
        render(&engine, owner, &matches),
        format!(
            "<para>some paragraph {m}with {e}<hi>{m}mixed{e}</hi>{m} content{e}.</para>",
            m = MATCH_START,
            e = MATCH_END
        )
    );

    let matches = engine.evaluate(&paras, "with nested");
    let owner = single_owner(&matches);
    assert_eq!(
        render(&engine, owner, &matches),
        format!(
            "<para>another paragraph {m}with {e}<note><hi>{m}nested{e}</hi> inner</note> elements.</para>",
            m = MATCH_START,
            e = MATCH_END
        )
    );

    let matches = engine.evaluate(&paras, "with nested inner elements");
    let owner = single_owner(&matches);
    assert_eq!(
        render(&engine, owner, &matches),
        format!(
            "<para>another paragraph {m}with {e}<note><hi>{m}nested{e}</hi>{m} inner{e}</note>{m} elements{e}.</para>",
            m = MATCH_START,
            e = MATCH_END
        )
    );
}

#[test]
fn index_on_inner_element() {
    let (engine, doc) = store_fixture(&["note"]);
    let notes = engine.elements_by_name(doc, "note");
    let matches = engine.evaluate(&notes, "nested inner");
    assert_eq!(matches.len(), 1);
    let note = single_owner(&matches);

    // Walking to the note's parent paragraph retrieves the same match
    let para = engine.store().parent(note).unwrap();
    assert_eq!(
        render(&engine, para, &matches),
        format!(
            "<para>another paragraph with <note><hi>{m}nested{e}</hi>{m} inner{e}</note> elements.</para>",
            m = MATCH_START,
            e = MATCH_END
        )
    );

    // The paragraphs themselves have no enclosing indexed scope here
    let paras = engine.elements_by_name(doc, "para");
    assert!(engine.evaluate(&paras, "nested inner").is_empty());
}

#[test]
fn double_match() {
    let (engine, doc) = store_fixture(&["para", "term"]);
    let paras = engine.elements_by_name(doc, "para");
    let matches = engine.evaluate(&paras, "double match");
    assert_eq!(matches.len(), 2);
    let owner = single_owner(&matches);
    assert_eq!(
        render(&engine, owner, &matches),
        format!(
            "<para>{m}double match{e} {m}double match{e}</para>",
            m = MATCH_START,
            e = MATCH_END
        )
    );
}

#[test]
fn highlighting_off_reproduces_document() {
    let (engine, doc) = store_fixture(&["para", "term"]);
    let paras = engine.elements_by_name(doc, "para");
    let matches = engine.evaluate(&paras, "mixed");
    assert!(!matches.is_empty());

    let owner = single_owner(&matches);
    let out = engine
        .serialize(owner, &matches, HighlightMatches::Off)
        .unwrap();
    assert_eq!(
        out,
        "<para>some paragraph with <hi>mixed</hi> content.</para>"
    );

    // The whole document reproduces byte for byte
    let root = engine.root(doc).unwrap();
    let out = engine
        .serialize(root, &MatchSet::new(), HighlightMatches::Off)
        .unwrap();
    assert_eq!(out, XML);
}

#[test]
fn idempotent_rebuild() {
    let (mut engine, doc) = store_fixture(&["para", "term"]);
    let snapshot = engine.postings().clone();
    assert!(!snapshot.is_empty());

    let mut txn = engine.begin();
    engine.reindex_document(&txn, doc).unwrap();
    txn.commit();
    assert_eq!(*engine.postings(), snapshot);

    // And again, through the subtree path
    let term = engine.elements_by_name(doc, "term")[0];
    let txn = engine.begin();
    engine.reindex_subtree(&txn, term).unwrap();
    assert_eq!(*engine.postings(), snapshot);
}

#[test]
fn stacked_listeners_render_in_one_pass() {
    let (engine, doc) = store_fixture(&["para", "term"]);
    let paras = engine.elements_by_name(doc, "para");
    let mixed = engine.evaluate(&paras, "mixed");
    let content = engine.evaluate(&paras, "content");
    let owner = single_owner(&mixed);

    let mut serializer = Serializer::new(engine.store());
    serializer.push_filter(Box::new(textgram::MatchListener::new(engine.store(), &mixed)));
    serializer.push_filter(Box::new(textgram::MatchListener::new(
        engine.store(),
        &content,
    )));
    let stacked = serializer.serialize(owner).unwrap();

    let mut merged = mixed;
    merged.merge(content);
    assert_eq!(stacked, render(&engine, owner, &merged));
    assert_eq!(
        stacked,
        format!(
            "<para>some paragraph with <hi>{m}mixed{e}</hi> {m}content{e}.</para>",
            m = MATCH_START,
            e = MATCH_END
        )
    );
}

#[test]
fn round_trip_slice_equals_phrase() {
    // Re-collecting the scope text and slicing at the attributed range
    // yields exactly the queried phrase
    let (engine, doc) = store_fixture(&["para", "term"]);
    let paras = engine.elements_by_name(doc, "para");
    for phrase in ["mixed", "mixed content", "with nested inner elements", "double match"] {
        let matches = engine.evaluate(&paras, phrase);
        assert!(!matches.is_empty(), "no match for '{}'", phrase);
        for m in matches.iter() {
            let joined: String = m
                .spans
                .iter()
                .map(|s| {
                    let text = engine.store().text(s.node).unwrap();
                    text.chars().skip(s.start).take(s.end - s.start).collect::<String>()
                })
                .collect();
            assert_eq!(joined, phrase);
        }
    }
}

#[test]
fn evaluate_many_matches_sequential_results() {
    let (engine, doc) = store_fixture(&["para", "term"]);
    let paras = engine.elements_by_name(doc, "para");
    let phrases = ["mixed", "nested", "double match", "absent phrase"];
    let many = engine.evaluate_many(&paras, &phrases);
    assert_eq!(many.len(), phrases.len());
    for (phrase, result) in phrases.iter().zip(&many) {
        assert_eq!(*result, engine.evaluate(&paras, phrase), "phrase '{}'", phrase);
    }
}
