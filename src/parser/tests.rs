use super::*;
use crate::builder::GrammarBuilder;
use crate::expr::{format_expr, ExprId};
use crate::grammar::Symbol;
use crate::test_utils::{
    ambiguous_grammar, cat_grammar, coercion_grammar, field_grammar, fid_of, prefix_grammar,
};

fn feed_all<'g>(state: ParseState<'g>, tokens: &[&str]) -> Option<ParseState<'g>> {
    tokens.iter().try_fold(state, |s, t| s.feed(t))
}

fn trees(grammar: &Grammar, state: &ParseState<'_>) -> Vec<String> {
    let exprs = ExprStore::new();
    state
        .results(&exprs)
        .map(|e| format_expr(e, &exprs, grammar.symbols()).unwrap())
        .collect()
}

fn parse_sentence(grammar: &Grammar, lang: &str, sentence: &str) -> Vec<String> {
    let parser = Parser::new(grammar, lang).unwrap();
    let start = parser.parse("S", 0).unwrap();
    let tokens: Vec<&str> = sentence.split_whitespace().collect();
    match feed_all(start, &tokens) {
        Some(state) => trees(grammar, &state),
        None => Vec::new(),
    }
}

#[test]
fn simple_sentence_has_one_tree() {
    let grammar = cat_grammar();
    assert_eq!(
        parse_sentence(&grammar, "ZooEng", "the cat sleeps"),
        vec!["Pred TheCat Sleeps"]
    );
}

#[test]
fn prefix_is_not_complete() {
    let grammar = cat_grammar();
    let parser = Parser::new(&grammar, "ZooEng").unwrap();
    let state = feed_all(parser.parse("S", 0).unwrap(), &["the", "cat"]).unwrap();
    assert_eq!(state.position(), 2);
    assert!(!state.is_complete());
    assert_eq!(trees(&grammar, &state), Vec::<String>::new());
    assert_eq!(state.expected_tokens(), vec!["sleeps"]);
}

#[test]
fn parser_accepts_language_code() {
    let grammar = cat_grammar();
    let parser = Parser::new(&grammar, "en").unwrap();
    assert_eq!(parser.concrete().language(), Some("en"));
}

#[test]
fn unexpected_tokens_yield_no_state() {
    let grammar = cat_grammar();
    let parser = Parser::new(&grammar, "ZooEng").unwrap();
    let start = parser.parse("S", 0).unwrap();

    // Known to the grammar, but nothing waits for it here.
    assert!(start.feed("sleeps").is_none());
    // Never seen by the grammar at all.
    assert!(start.feed("dog").is_none());
    assert!(start.feed("the").is_some());
}

#[test]
fn states_are_persistent() {
    let grammar = cat_grammar();
    let parser = Parser::new(&grammar, "ZooEng").unwrap();
    let after_the = parser.parse("S", 0).unwrap().feed("the").unwrap();

    let first = feed_all(after_the.clone(), &["cat", "sleeps"]).unwrap();
    let second = feed_all(after_the.clone(), &["cat", "sleeps"]).unwrap();

    assert_eq!(trees(&grammar, &first), trees(&grammar, &second));
    assert_eq!(after_the.position(), 1);
    assert_eq!(after_the.expected_tokens(), vec!["cat"]);
    assert_eq!(first.tokens(), vec!["the", "cat", "sleeps"]);
}

#[test]
fn feeding_the_newest_state_extends_the_shared_chart() {
    let grammar = cat_grammar();
    let parser = Parser::new(&grammar, "ZooEng").unwrap();
    let start = parser.parse("S", 0).unwrap();
    let the = start.feed("the").unwrap();
    let cat = the.feed("cat").unwrap();
    assert!(Rc::ptr_eq(&start.chart, &cat.chart));
    assert_eq!(cat.chart.borrow().len(), 3);

    // `the` already has a successor, so this one copies its prefix.
    let again = the.feed("cat").unwrap();
    assert!(!Rc::ptr_eq(&again.chart, &cat.chart));
    assert!(Rc::ptr_eq(&again.chart.borrow()[1], &cat.chart.borrow()[1]));

    let done = cat.feed("sleeps").unwrap();
    let other = again.feed("sleeps").unwrap();
    assert_eq!(trees(&grammar, &done), trees(&grammar, &other));
    assert_eq!(done.tokens(), vec!["the", "cat", "sleeps"]);
    assert_eq!(other.tokens(), vec!["the", "cat", "sleeps"]);

    // Older states still see only their own prefix.
    assert_eq!(the.position(), 1);
    assert_eq!(the.tokens(), vec!["the"]);
    assert_eq!(the.expected_tokens(), vec!["cat"]);
    let late = done.completed()[0];
    assert!(the.category(late).is_none());
    assert!(the.productions(late).is_none());
}

#[test]
fn each_results_call_starts_over() {
    let grammar = ambiguous_grammar();
    let parser = Parser::new(&grammar, "ZooEng").unwrap();
    let state = feed_all(parser.parse("S", 0).unwrap(), &["the", "cat", "sleeps"]).unwrap();
    let exprs = ExprStore::new();

    let mut first = state.results(&exprs);
    let head = first.next().unwrap();
    let rest: Vec<ExprId> = first.collect();
    assert_eq!(rest.len(), 1);
    assert_ne!(rest[0], head);

    let again: Vec<ExprId> = state.results(&exprs).collect();
    assert_eq!(again, vec![head, rest[0]]);
}

#[test]
fn each_matching_item_scans_once() {
    let grammar = ambiguous_grammar();
    let parser = Parser::new(&grammar, "ZooEng").unwrap();
    let start = parser.parse("S", 0).unwrap();
    assert_eq!(start.waiting("the"), 2);
    assert_eq!(start.waiting("cat"), 0);

    let after_the = start.feed("the").unwrap();
    assert_eq!(after_the.waiting("cat"), 2);
    assert_eq!(after_the.waiting("the"), 0);
}

#[test]
fn equal_predictions_share_one_category() {
    let grammar = ambiguous_grammar();
    let np = fid_of(&grammar, "ZooEng", "NP");
    let parser = Parser::new(&grammar, "ZooEng").unwrap();
    let state = feed_all(parser.parse("S", 0).unwrap(), &["the", "cat"]).unwrap();

    let nps: Vec<ChartCategory> = state
        .categories()
        .into_iter()
        .filter(|c| c.cat == CatRef::Grammar(np))
        .collect();
    assert_eq!(nps.len(), 1, "both nouns pack into one category");
    assert_eq!(nps[0].n_productions, 2);
    assert_eq!(nps[0].field, 0);

    let done = state.feed("sleeps").unwrap();
    assert_eq!(done.completed().len(), 1);
    let s = done.completed()[0];
    let prods = done.productions(s).unwrap();
    assert_eq!(prods.len(), 2);
    // Both realizations of Pred point at the very same packed noun phrase.
    let np_args: Vec<CatRef> = prods
        .iter()
        .map(|p| match p {
            ChartProduction::Apply { args, .. } => args[0],
            ChartProduction::Coerce(c) => *c,
        })
        .collect();
    assert_eq!(np_args[0], np_args[1]);
    assert_eq!(np_args[0], CatRef::Chart(nps[0].id));
}

#[test]
fn ambiguous_forest_yields_each_tree_once() {
    let grammar = ambiguous_grammar();
    let mut got = parse_sentence(&grammar, "ZooEng", "the cat sleeps");
    got.sort();
    assert_eq!(got, vec!["Pred Feline Sleeps", "Pred TheCat Sleeps"]);
}

#[test]
fn synthetic_ids_decrease() {
    let grammar = cat_grammar();
    let parser = Parser::new(&grammar, "ZooEng").unwrap();
    let mut state = parser.parse("S", 0).unwrap();
    let mut fids = Vec::new();
    for token in ["the", "cat", "sleeps"] {
        state = state.feed(token).unwrap();
        fids.extend(state.categories().into_iter().map(|c| c.fid.0));
    }
    assert!(!fids.is_empty());
    assert!(fids.iter().all(|&f| f <= FId::FIRST_SYNTHETIC));
    assert!(fids.windows(2).all(|w| w[0] > w[1]));
}

#[test]
fn discontinuous_fields_are_parsed() {
    let grammar = field_grammar();
    assert_eq!(
        parse_sentence(&grammar, "VerbsEng", "gives it up"),
        vec!["Pred Give"]
    );
    assert!(parse_sentence(&grammar, "VerbsEng", "gives it").is_empty());
    assert!(parse_sentence(&grammar, "VerbsEng", "up it gives").is_empty());
}

#[test]
fn unrealized_arguments_become_metas() {
    let grammar = field_grammar();
    assert_eq!(
        parse_sentence(&grammar, "VerbsEng", "hush"),
        vec!["Silent ?0"]
    );
}

#[test]
fn literal_symbols_stall() {
    let grammar = field_grammar();
    let parser = Parser::new(&grammar, "VerbsEng").unwrap();
    let after_say = parser.parse("S", 0).unwrap().feed("say").unwrap();
    assert!(after_say.expected_tokens().is_empty());
    assert!(!after_say.is_complete());
}

#[test]
fn coercions_are_followed() {
    let chain = coercion_grammar();
    assert_eq!(
        parse_sentence(&chain.grammar, "ChainCnc", "leaf"),
        vec!["Wrap Leaf"]
    );
}

#[test]
fn prefix_forms_are_all_scannable() {
    let grammar = prefix_grammar();
    let parser = Parser::new(&grammar, "FruitEng").unwrap();
    assert_eq!(
        parser.parse("S", 0).unwrap().expected_tokens(),
        vec!["a", "an"]
    );
    assert_eq!(
        parse_sentence(&grammar, "FruitEng", "an apple"),
        vec!["Indef Apple"]
    );
    assert_eq!(
        parse_sentence(&grammar, "FruitEng", "a pear"),
        vec!["Indef Pear"]
    );
}

#[test]
fn cyclic_branches_are_skipped() {
    let mut g = GrammarBuilder::new("Loop");
    g.cat("S", &[]).fun("X", &[], "S");
    let mut cnc = g.concrete("LoopCnc");
    let s = cnc.cnccat("S", 1, &["s"])[0];
    let x = cnc.tokens(&["x"]);
    let x = cnc.fun_seqs("X", vec![vec![x]]);
    cnc.apply(s, x, &[]).coerce(s, s);
    g.add_concrete(cnc);
    let grammar = g.finish().unwrap();

    assert_eq!(parse_sentence(&grammar, "LoopCnc", "x"), vec!["X"]);
}

#[test]
fn left_recursion_terminates() {
    let mut g = GrammarBuilder::new("Rep");
    g.cat("S", &[]).fun("One", &[], "S").fun("Many", &["S"], "S");
    let mut cnc = g.concrete("RepCnc");
    let s = cnc.cnccat("S", 1, &["s"])[0];
    let a = cnc.tokens(&["a"]);
    let one = cnc.fun_seqs("One", vec![vec![a.clone()]]);
    let many = cnc.fun_seqs("Many", vec![vec![Symbol::cat(0, 0), a]]);
    cnc.apply(s, one, &[]).apply(s, many, &[s]);
    g.add_concrete(cnc);
    let grammar = g.finish().unwrap();

    assert_eq!(
        parse_sentence(&grammar, "RepCnc", "a a a"),
        vec!["Many (Many One)"]
    );
}

#[test]
fn null_production_set_predicts_nothing() {
    let mut g = GrammarBuilder::new("Gap");
    g.cat("S", &[]);
    let mut cnc = g.concrete("GapCnc");
    cnc.cnccat("S", 1, &["s"]);
    g.add_concrete(cnc);
    let grammar = g.finish().unwrap();

    let parser = Parser::new(&grammar, "GapCnc").unwrap();
    let state = parser.parse("S", 0).unwrap();
    assert!(state.expected_tokens().is_empty());
    assert!(!state.is_complete());
}

#[test]
fn parse_rejects_bad_requests() {
    let grammar = field_grammar();
    assert_eq!(
        Parser::new(&grammar, "VerbsFre").err(),
        Some(ParseError::UnknownLanguage("VerbsFre".into()))
    );
    let parser = Parser::new(&grammar, "VerbsEng").unwrap();
    assert_eq!(
        parser.parse("NP", 0).err(),
        Some(ParseError::UnknownCategory("NP".into()))
    );
    assert_eq!(
        parser.parse("V", 2).err(),
        Some(ParseError::FieldOutOfRange {
            cat: "V".into(),
            field: 2,
            n_fields: 2
        })
    );
}

#[test]
fn fields_can_be_named_by_label() {
    let grammar = field_grammar();
    let parser = Parser::new(&grammar, "VerbsEng").unwrap();
    let state = parser.parse_label("V", "post").unwrap();
    assert_eq!(state.expected_tokens(), vec!["up"]);
    let done = state.feed("up").unwrap();
    assert_eq!(trees(&grammar, &done), vec!["Give"]);
}

#[cfg(feature = "tracing")]
#[test]
fn metrics_are_shared_with_states() {
    let grammar = cat_grammar();
    let metrics = Arc::new(Metrics::new());
    let parser = Parser::new(&grammar, "ZooEng")
        .unwrap()
        .with_metrics(Arc::clone(&metrics));
    let state = feed_all(parser.parse("S", 0).unwrap(), &["the", "cat", "sleeps"]).unwrap();
    assert!(state.feed("again").is_none());
    let exprs = ExprStore::new();
    assert_eq!(state.results(&exprs).count(), 1);

    let report = metrics.report();
    assert_eq!(report.scans, 3);
    assert_eq!(report.rejected_tokens, 1);
    assert_eq!(report.parse_trees, 1);
    assert_eq!(report.synthetic_categories, 3);
}
