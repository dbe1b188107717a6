use pretty_assertions::assert_eq;
use sqlcompose::prelude::*;
use sqlcompose::schema::{Catalog, Column, ColumnType, MemoryStore, SchemaStore, Size, Table};
use std::rc::Rc;

fn accounts() -> Table {
    Table::new(
        "accounts",
        vec![
            Column::new("id", ColumnType::integer(Size::Big)).not_null(),
            Column::new("flags", ColumnType::integer(Size::Tiny)).with_default(0),
            Column::new("balance", ColumnType::numeric(12, 2).unwrap()),
            Column::new("opened", ColumnType::Date),
        ],
    )
}

#[test]
fn test_size_mapping_divergence() {
    let tiny = ColumnType::integer(Size::Tiny);
    assert_eq!(
        Dialect::MySQL.generator().build_type(&tiny).unwrap(),
        "TINYINT"
    );
    assert_eq!(
        Dialect::SQLite.generator().build_type(&tiny).unwrap(),
        "INTEGER"
    );
}

#[test]
fn test_create_table_mysql() {
    let sql = Dialect::MySQL
        .generator()
        .build_create_table(&accounts())
        .unwrap();
    assert_eq!(
        sql,
        "CREATE TABLE `accounts` (`id` BIGINT NOT NULL, `flags` TINYINT DEFAULT 0, \
         `balance` DECIMAL(12, 2), `opened` DATE)"
    );
}

#[test]
fn test_catalog_caches_tables() {
    let store = Rc::new(MemoryStore::new().with_table("bank", accounts()));
    let mut catalog = Catalog::new(Dialect::Postgres, store.clone() as Rc<dyn SchemaStore>);

    let db = catalog.database("bank").unwrap();
    assert_eq!(db.list_tables(), &["accounts".to_string()]);
    assert!(db.has_table_by_name("accounts").unwrap());
    assert_eq!(db.table_by_name("accounts").unwrap().columns.len(), 4);
    assert_eq!(store.table_loads(), 1);

    assert_eq!(db.drop_table("accounts").unwrap(), "DROP TABLE \"accounts\"");
    assert!(db.list_tables().is_empty());
}

#[test]
fn test_column_literal_in_select() {
    let table = accounts();
    let balance = table.column("balance").unwrap();
    let mut select = Select::select(&table).unwrap();
    select
        .and_where(Expression::from(table.column_name("balance").unwrap()).ge(balance.literal(10.5).unwrap()))
        .unwrap();
    assert_eq!(
        select.to_sql_with_dialect(Dialect::SQLite),
        "SELECT * FROM \"accounts\" WHERE \"accounts\".\"balance\" >= :dbph"
    );

    let opened = table.column("opened").unwrap();
    assert!(opened.literal("2024-13-01").is_err());
    assert!(table.column("missing").is_err());
}
