use crate::builder::GrammarBuilder;
use crate::grammar::{FId, Grammar, Symbol};

/// Instance of the first instance of a concrete category.
pub(crate) fn fid_of(grammar: &Grammar, lang: &str, cat: &str) -> FId {
    let cnc = grammar.concrete(lang).expect("concrete syntax");
    let id = grammar.symbols().get(cat).expect("category name");
    cnc.cnccat(id).expect("concrete category").ccats[0]
}

/// S -> NP VP, NP -> "the" "cat", VP -> "sleeps".
pub(crate) fn cat_grammar() -> Grammar {
    let mut g = GrammarBuilder::new("Zoo");
    g.flag("startcat", "S")
        .cat("S", &[])
        .cat("NP", &[])
        .cat("VP", &[])
        .fun("Pred", &["NP", "VP"], "S")
        .fun("TheCat", &[], "NP")
        .fun("Sleeps", &[], "VP");

    let mut eng = g.concrete("ZooEng");
    eng.flag("language", "en");
    let s = eng.cnccat("S", 1, &["s"])[0];
    let np = eng.cnccat("NP", 1, &["s"])[0];
    let vp = eng.cnccat("VP", 1, &["s"])[0];

    let pred = eng.fun_seqs("Pred", vec![vec![Symbol::cat(0, 0), Symbol::cat(1, 0)]]);
    let the_cat = eng.tokens(&["the", "cat"]);
    let the_cat = eng.fun_seqs("TheCat", vec![vec![the_cat]]);
    let sleeps = eng.tokens(&["sleeps"]);
    let sleeps = eng.fun_seqs("Sleeps", vec![vec![sleeps]]);

    eng.apply(s, pred, &[np, vp])
        .apply(np, the_cat, &[])
        .apply(vp, sleeps, &[]);
    g.add_concrete(eng);
    g.finish().expect("cat grammar")
}

/// Two abstract nouns spelled the same, and two concrete realizations of
/// `Pred` over identical argument instances.
pub(crate) fn ambiguous_grammar() -> Grammar {
    let mut g = GrammarBuilder::new("Zoo");
    g.flag("startcat", "S")
        .cat("S", &[])
        .cat("NP", &[])
        .cat("VP", &[])
        .fun("Pred", &["NP", "VP"], "S")
        .fun("TheCat", &[], "NP")
        .fun("Feline", &[], "NP")
        .fun("Sleeps", &[], "VP");

    let mut eng = g.concrete("ZooEng");
    let s = eng.cnccat("S", 1, &["s"])[0];
    let np = eng.cnccat("NP", 1, &["s"])[0];
    let vp = eng.cnccat("VP", 1, &["s"])[0];

    let pred_a = eng.fun_seqs("Pred", vec![vec![Symbol::cat(0, 0), Symbol::cat(1, 0)]]);
    let pred_b = eng.fun_seqs("Pred", vec![vec![Symbol::cat(0, 0), Symbol::cat(1, 0)]]);
    let the_cat = eng.tokens(&["the", "cat"]);
    let the_cat_fun = eng.fun_seqs("TheCat", vec![vec![the_cat.clone()]]);
    let feline = eng.fun_seqs("Feline", vec![vec![the_cat]]);
    let sleeps = eng.tokens(&["sleeps"]);
    let sleeps = eng.fun_seqs("Sleeps", vec![vec![sleeps]]);

    eng.apply(s, pred_a, &[np, vp])
        .apply(s, pred_b, &[np, vp])
        .apply(np, the_cat_fun, &[])
        .apply(np, feline, &[])
        .apply(vp, sleeps, &[]);
    g.add_concrete(eng);
    g.finish().expect("ambiguous grammar")
}

/// Instances of the coercion chain in [`coercion_grammar`].
pub(crate) struct CoercionChain {
    pub grammar: Grammar,
    pub a: FId,
    pub b: FId,
    pub c: FId,
}

/// `Leaf` lives in instance A; B coerces A and C coerces B. `Wrap`
/// only accepts an argument in C.
pub(crate) fn coercion_grammar() -> CoercionChain {
    let mut g = GrammarBuilder::new("Chain");
    g.flag("startcat", "S")
        .cat("S", &[])
        .cat("X", &[])
        .fun("Leaf", &[], "X")
        .fun("Wrap", &["X"], "S");

    let mut cnc = g.concrete("ChainCnc");
    let s = cnc.cnccat("S", 1, &["s"])[0];
    let a = cnc.cnccat("X", 1, &["s"])[0];
    let b = cnc.coercion(&[a]);
    let c = cnc.coercion(&[b]);

    let leaf = cnc.tokens(&["leaf"]);
    let leaf = cnc.fun_seqs("Leaf", vec![vec![leaf]]);
    let wrap = cnc.fun_seqs("Wrap", vec![vec![Symbol::cat(0, 0)]]);
    cnc.apply(a, leaf, &[]).apply(s, wrap, &[c]);
    g.add_concrete(cnc);

    CoercionChain {
        grammar: g.finish().expect("coercion grammar"),
        a,
        b,
        c,
    }
}

const VOWELS: [&str; 5] = ["a", "e", "i", "o", "u"];

/// Indefinite article chosen by the following word.
pub(crate) fn prefix_grammar() -> Grammar {
    let mut g = GrammarBuilder::new("Fruit");
    g.flag("startcat", "S")
        .cat("S", &[])
        .cat("N", &[])
        .fun("Indef", &["N"], "S")
        .fun("Apple", &[], "N")
        .fun("Pear", &[], "N");

    let mut eng = g.concrete("FruitEng");
    let s = eng.cnccat("S", 1, &["s"])[0];
    let n = eng.cnccat("N", 1, &["s"])[0];

    let article = eng.prefix(&["a"], &[(&["an"][..], &VOWELS[..])]);
    let indef = eng.fun_seqs("Indef", vec![vec![article, Symbol::cat(0, 0)]]);
    let apple = eng.tokens(&["apple"]);
    let apple = eng.fun_seqs("Apple", vec![vec![apple]]);
    let pear = eng.tokens(&["pear"]);
    let pear = eng.fun_seqs("Pear", vec![vec![pear]]);

    eng.apply(s, indef, &[n]).apply(n, apple, &[]).apply(n, pear, &[]);
    g.add_concrete(eng);
    g.finish().expect("prefix grammar")
}

/// A two-field verb realized discontinuously, a function that drops its
/// argument, and one taking a string literal.
///
/// - `Pred Give` is "gives it up"
/// - `Silent v` is "hush"
/// - `Say s` is "say" followed by the literal
pub(crate) fn field_grammar() -> Grammar {
    let mut g = GrammarBuilder::new("Verbs");
    g.flag("startcat", "S")
        .cat("S", &[])
        .cat("V", &[])
        .cat("String", &[])
        .fun("Pred", &["V"], "S")
        .fun("Silent", &["V"], "S")
        .fun("Say", &["String"], "S")
        .fun("Give", &[], "V");

    let mut eng = g.concrete("VerbsEng");
    eng.flag("language", "en");
    let s = eng.cnccat("S", 1, &["s"])[0];
    let v = eng.cnccat("V", 1, &["pre", "post"])[0];

    let it = eng.tokens(&["it"]);
    let pred = eng.fun_seqs("Pred", vec![vec![Symbol::cat(0, 0), it, Symbol::cat(0, 1)]]);
    let hush = eng.tokens(&["hush"]);
    let silent = eng.fun_seqs("Silent", vec![vec![hush]]);
    let say = eng.tokens(&["say"]);
    let say = eng.fun_seqs("Say", vec![vec![say, Symbol::lit(0, 0)]]);
    let gives = eng.tokens(&["gives"]);
    let up = eng.tokens(&["up"]);
    let give = eng.fun_seqs("Give", vec![vec![gives], vec![up]]);

    eng.apply(s, pred, &[v])
        .apply(s, silent, &[v])
        .apply(s, say, &[FId::STRING])
        .apply(v, give, &[]);
    g.add_concrete(eng);
    g.finish().expect("field grammar")
}
