use uipattern_core::types::{Pattern, RetrievalMethod};
use uipattern_text::index::weighted_document;
use uipattern_text::LexicalRetriever;

fn corpus() -> Vec<Pattern> {
    serde_json::from_str(
        r#"[
        {"id": "shadcn-button", "name": "Button", "category": "form",
         "description": "Displays a button or a component that looks like a button.",
         "metadata": {"props": [{"name": "variant"}, {"name": "size"}, {"name": "asChild"}],
                      "variants": ["default", "primary", "secondary", "ghost"],
                      "a11y": ["aria-label"]}},
        {"id": "shadcn-card", "name": "Card", "category": "layout",
         "description": "Displays a card with header, content, and footer.",
         "metadata": {"props": [{"name": "className"}], "variants": []}},
        {"id": "shadcn-badge", "name": "Badge", "category": "display",
         "description": "Displays a badge.",
         "metadata": {"props": [{"name": "variant"}], "variants": ["default", "outline"]}}
    ]"#,
    )
    .unwrap()
}

#[test]
fn weighted_document_repeats_fields() {
    let button = &corpus()[0];
    let doc = weighted_document(button);
    assert!(doc.starts_with("Button Button Button form form variant size asChild variant default primary secondary ghost default primary Displays"));
    assert_eq!(weighted_document(&corpus()[1]), "Card Card Card layout layout className Displays a card with header, content, and footer.");
}

#[test]
fn button_query_ranks_button_first() {
    let retriever = LexicalRetriever::build(&corpus()).expect("build");
    let hits = retriever.search("button button button variant size primary", 10).expect("search");

    assert_eq!(hits.len(), 3, "every document is scored");
    assert_eq!(hits[0].id, "shadcn-button");
    assert_eq!(hits[0].source, RetrievalMethod::Lexical);
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    let card = hits.iter().find(|h| h.id == "shadcn-card").unwrap();
    assert_eq!(card.score, 0.0, "no shared terms scores zero");
}

#[test]
fn camel_case_props_match_split_query_terms() {
    let retriever = LexicalRetriever::build(&corpus()).expect("build");
    let hits = retriever.search("as child", 1).expect("search");
    assert_eq!(hits[0].id, "shadcn-button");
    assert!(hits[0].score > 0.0);

    let hits = retriever.search("class-name", 1).expect("search");
    assert_eq!(hits[0].id, "shadcn-card");
}

#[test]
fn results_truncate_and_break_ties_by_id() {
    let retriever = LexicalRetriever::build(&corpus()).expect("build");
    let hits = retriever.search("", 2).expect("search");
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.score == 0.0));
    assert_eq!(hits[0].id, "shadcn-badge");
    assert_eq!(hits[1].id, "shadcn-button");
}

#[test]
fn repeated_searches_are_identical() {
    let retriever = LexicalRetriever::build(&corpus()).expect("build");
    let a = retriever.search("variant default", 3).unwrap();
    let b = retriever.search("variant default", 3).unwrap();
    assert_eq!(a, b);
}

#[test]
fn empty_corpus_and_zero_k_return_nothing() {
    let empty = LexicalRetriever::build(&[]).expect("build empty");
    assert!(empty.is_empty());
    assert!(empty.search("button", 5).unwrap().is_empty());

    let retriever = LexicalRetriever::build(&corpus()).expect("build");
    assert!(retriever.search("button", 0).unwrap().is_empty());
}
