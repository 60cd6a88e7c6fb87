use anyhow::Result;
use log::debug;
use rusqlite::types::Value as DbValue;
use rusqlite::{params, params_from_iter, Connection, Transaction};

use crate::api::comment::{Comment, GetCommentRequest};
use crate::db::sql::{Select, Update, Value};
use crate::db::types::CreateCommentParams;
use crate::moderation::Visibility;

use super::convert_values;

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS comment (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL,
    author_id INTEGER NOT NULL,
    content TEXT NOT NULL,
    is_active INTEGER NOT NULL,
    last_updated_by INTEGER NOT NULL,
    create_time INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_comment_post ON comment(post_id);
"#;

pub fn create_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLE_SQL)?;
    Ok(())
}

pub fn create(tx: &Transaction, params: CreateCommentParams) -> Result<u64> {
    let sql = r#"
    INSERT INTO comment (post_id, author_id, content, is_active, last_updated_by, create_time)
    VALUES (?, ?, ?, ?, ?, ?)
    "#;
    debug!("Database create_comment: {sql}, post: {}", params.post_id);
    tx.execute(
        sql,
        params![
            params.post_id,
            params.author_id,
            params.content,
            params.is_active,
            params.author_id,
            params.create_time,
        ],
    )?;

    Ok(tx.last_insert_rowid() as u64)
}

pub fn get(tx: &Transaction, id: u64) -> Result<Comment> {
    let mut select = comment_select();
    select.add_where("id = ?", Value::Integer(id));

    let (sql, values) = select.build();
    let values = convert_values(values);

    debug!("Database get_comment: {sql}, {id}");
    let mut stmt = tx.prepare(&sql)?;
    let comment = stmt.query_row(params_from_iter(values), convert_row)?;

    Ok(comment)
}

pub fn has(tx: &Transaction, id: u64) -> Result<bool> {
    debug!("Database has_comment: {id}");
    let req = GetCommentRequest {
        id: Some(id),
        ..Default::default()
    };
    let count = count_comments(tx, req, Visibility::All)?;
    Ok(count > 0)
}

pub fn set_active(tx: &Transaction, id: u64, is_active: bool, updated_by: u64) -> Result<()> {
    let mut update = Update::new("comment");
    update.add_field("is_active", Value::Bool(is_active));
    update.add_field("last_updated_by", Value::Integer(updated_by));
    update.add_where("id = ?", Value::Integer(id));

    let (sql, values) = update.build();
    let values = convert_values(values);

    debug!("Database set_comment_active: {sql}, {values:?}");
    tx.execute(&sql, params_from_iter(values.iter()))?;

    Ok(())
}

pub fn delete(tx: &Transaction, id: u64) -> Result<()> {
    let sql = "DELETE FROM comment WHERE id = ?";
    debug!("Database delete_comment: {sql}, {id}");
    tx.execute(sql, params![id])?;
    Ok(())
}

/// Removes every comment under a post, returning the affected count. Used
/// when the post itself is deleted.
pub fn delete_post_comments(tx: &Transaction, post_id: u64) -> Result<u64> {
    let sql = "DELETE FROM comment WHERE post_id = ?";
    debug!("Database delete_post_comments: {sql}, {post_id}");
    let count = tx.execute(sql, params![post_id])?;
    Ok(count as u64)
}

pub fn count_comments(
    tx: &Transaction,
    req: GetCommentRequest,
    visibility: Visibility,
) -> Result<u64> {
    let (sql, values) = build_select_sql(true, req, visibility);
    debug!("Database count_comments: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;
    let count: i64 = stmt.query_row(params_from_iter(values.iter()), |row| row.get(0))?;

    Ok(count as u64)
}

pub fn get_comments(
    tx: &Transaction,
    req: GetCommentRequest,
    visibility: Visibility,
) -> Result<Vec<Comment>> {
    let (sql, values) = build_select_sql(false, req, visibility);
    debug!("Database get_comments: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;
    let comments = stmt
        .query_map(params_from_iter(values), convert_row)?
        .map(|r| r.unwrap())
        .collect::<Vec<_>>();

    Ok(comments)
}

fn comment_select() -> Select {
    Select::new(
        vec![
            "id",
            "post_id",
            "author_id",
            "content",
            "is_active",
            "last_updated_by",
            "create_time",
        ],
        "comment",
    )
}

fn convert_row(row: &rusqlite::Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        content: row.get(3)?,
        is_active: row.get(4)?,
        last_updated_by: row.get(5)?,
        create_time: row.get(6)?,
    })
}

fn build_select_sql(
    count: bool,
    req: GetCommentRequest,
    visibility: Visibility,
) -> (String, Vec<DbValue>) {
    let mut select = if count {
        Select::count("comment")
    } else {
        comment_select()
    };

    if let Some(id) = req.id {
        select.add_where("id = ?", Value::Integer(id));
    }
    if let Some(post_id) = req.post_id {
        select.add_where("post_id = ?", Value::Integer(post_id));
    }

    match visibility {
        Visibility::All => {}
        Visibility::ActiveOrAuthor(reader_id) => select.add_where_raw(
            "(is_active = ? OR author_id = ?)",
            vec![Value::Bool(true), Value::Integer(reader_id)],
        ),
        Visibility::ActiveOnly => select.add_where("is_active = ?", Value::Bool(true)),
    }

    select.set_query(req.query, "content");

    select.add_order_by("create_time ASC");

    let (sql, values) = select.build();
    let values = convert_values(values);

    (sql, values)
}
