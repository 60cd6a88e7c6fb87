use anyhow::Result;
use log::debug;
use rusqlite::types::Value as DbValue;
use rusqlite::{params, params_from_iter, Connection, Transaction};

use crate::api::category::{Category, GetCategoryRequest, PatchCategoryRequest};
use crate::db::sql::{Select, Update, Value};
use crate::db::types::CreateCategoryParams;

use super::convert_values;

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS category (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL,
    description TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    update_time INTEGER NOT NULL
);
"#;

pub fn create_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLE_SQL)?;
    Ok(())
}

pub fn create(tx: &Transaction, params: CreateCategoryParams) -> Result<u64> {
    let sql = r#"
    INSERT INTO category (name, description, is_active, update_time)
    VALUES (?, ?, 1, ?)
    "#;
    debug!("Database create_category: {sql}, {params:?}");
    tx.execute(
        sql,
        params![params.name, params.description, params.update_time],
    )?;

    Ok(tx.last_insert_rowid() as u64)
}

pub fn update(tx: &Transaction, patch: PatchCategoryRequest, update_time: u64) -> Result<()> {
    let mut update = Update::new("category");

    if let Some(name) = patch.name {
        update.add_field("name", Value::Text(name));
    }
    if let Some(description) = patch.description {
        update.add_field("description", Value::Text(description));
    }
    if let Some(is_active) = patch.is_active {
        update.add_field("is_active", Value::Bool(is_active));
    }

    update.add_field("update_time", Value::Integer(update_time));

    update.add_where("id = ?", Value::Integer(patch.id));

    let (sql, values) = update.build();
    if sql.is_empty() {
        return Ok(());
    }
    let values = convert_values(values);

    debug!("Database update_category: {sql}, {values:?}");
    tx.execute(&sql, params_from_iter(values.iter()))?;

    Ok(())
}

pub fn delete(tx: &Transaction, id: u64) -> Result<()> {
    let sql = "DELETE FROM category WHERE id = ?";
    debug!("Database delete_category: {sql}, {id}");
    tx.execute(sql, params![id])?;
    Ok(())
}

pub fn has(tx: &Transaction, id: u64) -> Result<bool> {
    debug!("Database has_category: {id}");
    let req = GetCategoryRequest {
        id: Some(id),
        ..Default::default()
    };
    let count = count_categories(tx, req)?;
    Ok(count > 0)
}

pub fn has_name(tx: &Transaction, name: &str) -> Result<bool> {
    let mut select = Select::count("category");
    select.add_where("name = ?", Value::Text(String::from(name)));

    let (sql, values) = select.build();
    let values = convert_values(values);

    debug!("Database has_category_name: {sql}, {name}");
    let mut stmt = tx.prepare(&sql)?;
    let count: i64 = stmt.query_row(params_from_iter(values), |row| row.get(0))?;
    Ok(count > 0)
}

pub fn count_categories(tx: &Transaction, req: GetCategoryRequest) -> Result<u64> {
    let (sql, values) = build_select_sql(true, req);
    debug!("Database count_categories: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;
    let count: i64 = stmt.query_row(params_from_iter(values.iter()), |row| row.get(0))?;

    Ok(count as u64)
}

pub fn get_categories(tx: &Transaction, req: GetCategoryRequest) -> Result<Vec<Category>> {
    let (sql, values) = build_select_sql(false, req);
    debug!("Database get_categories: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;
    let categories = stmt
        .query_map(params_from_iter(values), |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                is_active: row.get(3)?,
                update_time: row.get(4)?,
            })
        })?
        .map(|r| r.unwrap())
        .collect::<Vec<_>>();

    Ok(categories)
}

fn build_select_sql(count: bool, req: GetCategoryRequest) -> (String, Vec<DbValue>) {
    let mut select = if count {
        Select::count("category")
    } else {
        Select::new(
            vec!["id", "name", "description", "is_active", "update_time"],
            "category",
        )
    };

    if let Some(id) = req.id {
        select.add_where("id = ?", Value::Integer(id));
    }

    select.set_query(req.query, "name");

    select.add_order_by("name ASC");

    let (sql, values) = select.build();
    let values = convert_values(values);

    (sql, values)
}
