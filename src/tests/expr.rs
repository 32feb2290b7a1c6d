use super::*;
use smallvec::smallvec;

fn setup() -> (SymbolStore, ExprStore) {
    (SymbolStore::new(), ExprStore::new())
}

#[test]
fn structurally_equal_trees_share_id() {
    let (symbols, exprs) = setup();
    let f = symbols.intern("Pred");
    let a = symbols.intern("TheCat");
    let a1 = exprs.app0(a);
    let a2 = exprs.app0(a);
    assert_eq!(a1, a2);
    let t1 = exprs.app(f, smallvec![a1]);
    let t2 = exprs.app(f, smallvec![a2]);
    assert_eq!(t1, t2);
    assert_eq!(exprs.len(), 2);
}

#[test]
fn literals_and_metas_are_interned() {
    let (_, exprs) = setup();
    assert_eq!(exprs.int(3), exprs.int(3));
    assert_ne!(exprs.int(3), exprs.float(3.0));
    assert_eq!(exprs.str("x"), exprs.lit(Literal::Str("x".into())));
    assert_eq!(exprs.meta(0), exprs.meta(0));
    assert_eq!(exprs.resolve(exprs.meta(2)), Some(Expr::Meta(2)));
}

#[test]
fn format_uses_minimal_parentheses() {
    let (symbols, exprs) = setup();
    let pred = symbols.intern("Pred");
    let mod_ = symbols.intern("Mod");
    let big = symbols.intern("Big");
    let cat = symbols.intern("Cat");
    let sleeps = symbols.intern("Sleeps");
    let np = exprs.app(mod_, smallvec![exprs.app0(big), exprs.app0(cat)]);
    let s = exprs.app(pred, smallvec![np, exprs.app0(sleeps)]);
    assert_eq!(
        format_expr(s, &exprs, &symbols).unwrap(),
        "Pred (Mod Big Cat) Sleeps"
    );
}

#[test]
fn format_literals_and_metas() {
    let (symbols, exprs) = setup();
    let say = symbols.intern("Say");
    let t = exprs.app(
        say,
        smallvec![exprs.str("a \"b\""), exprs.int(-4), exprs.float(2.0), exprs.meta(1)],
    );
    assert_eq!(
        format_expr(t, &exprs, &symbols).unwrap(),
        r#"Say "a \"b\"" (-4) 2.0 ?1"#
    );
}

#[test]
fn parse_reads_back_formatted_trees() {
    let (symbols, exprs) = setup();
    for text in [
        "Pred (Mod Big Cat) Sleeps",
        r#"Say "hello world""#,
        "Num 42",
        "Num (-7)",
        "Measure 1.5",
        "Silent ?0",
        "Zero",
    ] {
        let id = parse_expr(text, &exprs, &symbols).unwrap();
        assert_eq!(format_expr(id, &exprs, &symbols).unwrap(), text);
    }
}

#[test]
fn parse_accepts_trailing_semicolon_and_bare_meta() {
    let (symbols, exprs) = setup();
    let with = parse_expr("Pred TheCat Sleeps ;", &exprs, &symbols).unwrap();
    let without = parse_expr("  Pred TheCat Sleeps", &exprs, &symbols).unwrap();
    assert_eq!(with, without);
    assert_eq!(parse_expr("?", &exprs, &symbols).unwrap(), exprs.meta(0));
}

#[test]
fn parse_errors_carry_offsets() {
    let (symbols, exprs) = setup();
    let err = parse_expr("Pred (TheCat", &exprs, &symbols).unwrap_err();
    assert_eq!(err.offset, 12);

    let err = parse_expr("Pred ;;", &exprs, &symbols).unwrap_err();
    assert_eq!(err.offset, 6);

    let err = parse_expr(r#"Say "open"#, &exprs, &symbols).unwrap_err();
    assert_eq!(err.offset, 4);

    assert!(parse_expr("3 Four", &exprs, &symbols).is_err());
    assert!(parse_expr("", &exprs, &symbols).is_err());
}
