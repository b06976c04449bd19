use lembar::{
    ColumnSelection, EqualityPredicate, QueryDescriptor, QueryMode,
    planner::{error::PlannerError, parser::SqlParser},
};

fn parse(sql: &str) -> Result<QueryDescriptor, PlannerError> {
    SqlParser::new().parse_sql(sql)
}

#[test]
fn test_count_star() {
    let descriptor = parse("SELECT COUNT(*) FROM apples").unwrap();
    assert_eq!(descriptor, QueryDescriptor::count("apples"));

    let lower = parse("select count(*) from apples").unwrap();
    assert_eq!(lower.mode, QueryMode::Count);
}

#[test]
fn test_count_only_accepts_a_star_argument() {
    for sql in [
        "SELECT COUNT(name) FROM apples",
        "SELECT COUNT(DISTINCT color) FROM apples",
        "SELECT COUNT() FROM apples",
    ] {
        assert!(
            matches!(parse(sql), Err(PlannerError::UnsupportedExpression(_))),
            "{sql} should be rejected"
        );
    }
}

#[test]
fn test_select_named_columns_keeps_order() {
    let descriptor = parse("SELECT color, Name FROM apples").unwrap();
    assert_eq!(descriptor.mode, QueryMode::Select);
    assert_eq!(descriptor.table, "apples");
    assert_eq!(descriptor.columns, ColumnSelection::named(["color", "name"]));
    assert!(descriptor.predicate.is_none());
}

#[test]
fn test_select_wildcard() {
    let descriptor = parse("SELECT * FROM apples").unwrap();
    assert_eq!(descriptor.columns, ColumnSelection::all());
}

#[test]
fn test_where_with_string_literal() {
    let descriptor = parse("SELECT name FROM apples WHERE color = 'Red'").unwrap();
    assert_eq!(
        descriptor,
        QueryDescriptor::select("apples", ColumnSelection::named(["name"]))
            .with_predicate(EqualityPredicate::new("color", "Red"))
    );
}

#[test]
fn test_where_literal_forms() {
    let number = parse("SELECT name FROM people WHERE id = 2").unwrap();
    assert_eq!(number.predicate, Some(EqualityPredicate::new("id", "2")));

    let negative = parse("SELECT name FROM people WHERE (id = -3)").unwrap();
    assert_eq!(negative.predicate, Some(EqualityPredicate::new("id", "-3")));

    let double_quoted = parse("SELECT name FROM apples WHERE color = \"Light Green\"").unwrap();
    assert_eq!(
        double_quoted.predicate,
        Some(EqualityPredicate::new("color", "Light Green"))
    );
}

#[test]
fn test_rejects_unsupported_shapes() {
    assert!(parse("SELECT a FROM t1 JOIN t2 ON t1.a = t2.a").is_err());
    assert!(parse("SELECT a FROM t1, t2").is_err());
    assert!(parse("SELECT a FROM t WHERE a = 'x' OR b = 'y'").is_err());
    assert!(parse("SELECT a FROM t WHERE a > 1").is_err());
    assert!(parse("SELECT COUNT(*), a FROM t").is_err());
    assert!(matches!(
        parse("DELETE FROM t"),
        Err(PlannerError::UnsupportedStatement(_))
    ));
    assert!(matches!(
        parse("SELECT a FROM t; SELECT b FROM t"),
        Err(PlannerError::InvalidQuery(_))
    ));
    assert!(matches!(
        parse("SELEKT a FROM t"),
        Err(PlannerError::SqlParser(_))
    ));
}

#[test]
fn test_descriptor_json_form() {
    let json = r#"{
        "table": "apples",
        "columns": ["name"],
        "predicate": {"column": "color", "literal": "Red"},
        "mode": "Select"
    }"#;
    let descriptor = QueryDescriptor::from_json(json).unwrap();
    assert_eq!(
        descriptor,
        parse("SELECT name FROM apples WHERE color = 'Red'").unwrap()
    );

    let count = QueryDescriptor::from_json(r#"{"table":"apples","columns":"*","mode":"Count"}"#)
        .unwrap();
    assert_eq!(count, QueryDescriptor::count("apples"));

    let written = serde_json::to_string(&QueryDescriptor::count("apples")).unwrap();
    assert!(written.contains(r#""columns":"*""#));

    let bad_columns = r#"{"table":"apples","columns":"name","mode":"Count"}"#;
    assert!(QueryDescriptor::from_json(bad_columns).is_err());
}
