use pretty_assertions::assert_eq;
use sqlcompose::prelude::*;
use sqlcompose::transpiler::sql::mysql::MysqlGenerator;
use sqlcompose::transpiler::sql::sqlite::SqliteGenerator;
use std::collections::HashMap;

#[test]
fn test_simple_select() {
    let mut select = Select::select("table").unwrap();
    select.add_column(all_columns()).unwrap();
    assert_eq!(select.build(&SqliteGenerator), "SELECT * FROM \"table\"");
}

#[test]
fn test_join_using() {
    let mut select = Select::select("t1").unwrap();
    select.inner_join_using("t2", None, ["c1", "c2"]).unwrap();
    assert_eq!(
        select.build(&MysqlGenerator),
        "SELECT * FROM `t1` INNER JOIN `t2` USING ( `c1`, `c2` )"
    );
}

#[test]
fn test_parameterized_literal() {
    let mut select = Select::select("t").unwrap();
    select.and_where(col("c").equals(lit(5))).unwrap();
    assert_eq!(
        select.build(&SqliteGenerator),
        "SELECT * FROM \"t\" WHERE \"c\" = :dbph"
    );
    assert_eq!(
        select.argument_map(),
        HashMap::from([(":dbph".to_string(), Value::Int(5))])
    );
}

#[test]
fn test_offset_needs_limit() {
    let mut select = Select::select("t").unwrap();
    select.offset(5);
    assert_eq!(select.build(&SqliteGenerator), "SELECT * FROM \"t\"");
    select.limit(1);
    assert_eq!(
        select.build(&SqliteGenerator),
        "SELECT * FROM \"t\" LIMIT 1 OFFSET 5"
    );
}

#[test]
fn test_idempotent_rendering_across_dialects() {
    let mut select = Select::select_as("orders", "o").unwrap();
    select
        .add_column_as(sum(table_col("o", "total")), "spent")
        .unwrap()
        .add_column(table_col("o", "user_id"))
        .unwrap();
    select
        .and_where(table_col("o", "status").not_equals(lit("void")))
        .unwrap();
    select.group_by(table_col("o", "user_id")).unwrap();
    select.and_having(sum(table_col("o", "total")).gt(lit(100))).unwrap();
    select.order_by(col("spent"), "DESC").unwrap();

    for dialect in [Dialect::MySQL, Dialect::SQLite, Dialect::Postgres, Dialect::Canonical] {
        assert_eq!(
            select.to_sql_with_dialect(dialect),
            select.to_sql_with_dialect(dialect)
        );
    }
    assert_eq!(
        select.to_sql_with_dialect(Dialect::Postgres),
        "SELECT SUM(\"o\".\"total\") AS \"spent\", \"o\".\"user_id\" FROM \"orders\" AS \"o\" \
         WHERE \"o\".\"status\" <> :dbph GROUP BY \"o\".\"user_id\" \
         HAVING SUM(\"o\".\"total\") > :dbph2 ORDER BY \"spent\" DESC"
    );
    assert_eq!(
        select.arguments(),
        vec![
            (":dbph".to_string(), Value::from("void")),
            (":dbph2".to_string(), Value::Int(100)),
        ]
    );
}

#[test]
fn test_alias_uniqueness() {
    let mut select = Select::select("t").unwrap();
    let names: Vec<String> = (0..5)
        .map(|i| select.add_unique_column(lit(i), "col").unwrap())
        .collect();
    assert_eq!(names, vec!["col", "col2", "col3", "col4", "col5"]);
}

#[test]
fn test_chain_flattening() {
    let conditions: Vec<Expression> = (0..6).map(|i| col(&format!("c{}", i)).equals(lit(i))).collect();
    let chain = all_of(conditions.clone()).unwrap();
    let flat: Vec<Expression> = chain.into_array();
    assert_eq!(flat, conditions);

    let mut infix = Infix::new(col("a"), ChainOp::And, col("b"));
    infix.add_many_to_sequence(vec![col("c"), col("d")]);
    infix.add_to_sequence(col("e").or(col("f")));
    let operands: Vec<&Expression> = infix.to_array();
    assert_eq!(operands.len(), 5);
    assert_eq!(operands[4], &col("e").or(col("f")));
}

#[test]
fn test_duplicate_alias_detection() {
    let mut select = Select::select("t").unwrap();
    select.add_column_as(col("a"), "x").unwrap();
    let err = select.add_column_as(col("b"), "x").unwrap_err();
    assert!(matches!(
        err,
        SqlError::DuplicateAlias { kind: AliasKind::Column, ref name } if name == "x"
    ));
    assert_eq!(err.to_string(), "Duplicate column alias: 'x'");
}

#[test]
fn test_errors_leave_builder_untouched() {
    let mut select = Select::select("t").unwrap();
    select.and_where(col("a").equals(lit(1))).unwrap();
    let before = select.build(&SqliteGenerator);

    assert!(select.and_where(table_col("nope", "a").equals(lit(2))).is_err());
    assert!(select.and_where(col("a").equals(lit(f64::INFINITY))).is_err());
    assert!(select.order_by(col("a"), "asc").is_err());

    assert_eq!(select.build(&SqliteGenerator), before);
    assert_eq!(select.arguments().len(), 1);
}
