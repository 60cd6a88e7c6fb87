use anyhow::Result;
use log::debug;
use rusqlite::types::Value as DbValue;
use rusqlite::{params, params_from_iter, Connection, Transaction};

use crate::api::post::{GetPostRequest, PatchPostRequest, Post};
use crate::db::sql::{Select, Update, Value};
use crate::db::types::CreatePostParams;

use super::convert_values;

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS post (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    category_id INTEGER NOT NULL,
    author_id INTEGER NOT NULL,
    image TEXT,
    create_time INTEGER NOT NULL,
    update_time INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_post_author ON post(author_id);
CREATE INDEX IF NOT EXISTS idx_post_category ON post(category_id);
"#;

pub fn create_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLE_SQL)?;
    Ok(())
}

pub fn create(tx: &Transaction, params: CreatePostParams) -> Result<u64> {
    let sql = r#"
    INSERT INTO post (title, content, category_id, author_id, image, create_time, update_time)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    "#;
    debug!("Database create_post: {sql}, title: {}", params.post.title);
    tx.execute(
        sql,
        params![
            params.post.title,
            params.post.content,
            params.post.category_id,
            params.author_id,
            params.post.image,
            params.create_time,
            params.create_time,
        ],
    )?;

    Ok(tx.last_insert_rowid() as u64)
}

pub fn update(tx: &Transaction, patch: PatchPostRequest, update_time: u64) -> Result<()> {
    let mut update = Update::new("post");

    if let Some(title) = patch.title {
        update.add_field("title", Value::Text(title));
    }
    if let Some(content) = patch.content {
        update.add_field("content", Value::Text(content));
    }
    if let Some(category_id) = patch.category_id {
        update.add_field("category_id", Value::Integer(category_id));
    }

    update.add_field("update_time", Value::Integer(update_time));

    update.add_where("id = ?", Value::Integer(patch.id));

    let (sql, values) = update.build();
    if sql.is_empty() {
        return Ok(());
    }
    let values = convert_values(values);

    debug!("Database update_post: {sql}");
    tx.execute(&sql, params_from_iter(values.iter()))?;

    Ok(())
}

pub fn delete(tx: &Transaction, id: u64) -> Result<()> {
    let sql = "DELETE FROM post WHERE id = ?";
    debug!("Database delete_post: {sql}, {id}");
    tx.execute(sql, params![id])?;
    Ok(())
}

pub fn has(tx: &Transaction, id: u64) -> Result<bool> {
    debug!("Database has_post: {id}");
    let req = GetPostRequest {
        id: Some(id),
        ..Default::default()
    };
    let count = count_posts(tx, req)?;
    Ok(count > 0)
}

pub fn get(tx: &Transaction, id: u64) -> Result<Post> {
    let mut select = post_select();
    select.add_where("id = ?", Value::Integer(id));

    let (sql, values) = select.build();
    let values = convert_values(values);

    debug!("Database get_post: {sql}, {id}");
    let mut stmt = tx.prepare(&sql)?;
    let post = stmt.query_row(params_from_iter(values), convert_row)?;

    Ok(post)
}

pub fn count_posts(tx: &Transaction, req: GetPostRequest) -> Result<u64> {
    let (sql, values) = build_select_sql(true, req);
    debug!("Database count_posts: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;
    let count: i64 = stmt.query_row(params_from_iter(values.iter()), |row| row.get(0))?;

    Ok(count as u64)
}

pub fn get_posts(tx: &Transaction, req: GetPostRequest) -> Result<Vec<Post>> {
    let (sql, values) = build_select_sql(false, req);
    debug!("Database get_posts: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;
    let posts = stmt
        .query_map(params_from_iter(values), convert_row)?
        .map(|r| r.unwrap())
        .collect::<Vec<_>>();

    Ok(posts)
}

fn post_select() -> Select {
    Select::new(
        vec![
            "id",
            "title",
            "content",
            "category_id",
            "author_id",
            "image",
            "create_time",
            "update_time",
        ],
        "post",
    )
}

fn convert_row(row: &rusqlite::Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        category_id: row.get(3)?,
        author_id: row.get(4)?,
        image: row.get(5)?,
        create_time: row.get(6)?,
        update_time: row.get(7)?,
    })
}

fn build_select_sql(count: bool, req: GetPostRequest) -> (String, Vec<DbValue>) {
    let mut select = if count {
        Select::count("post")
    } else {
        post_select()
    };

    if let Some(id) = req.id {
        select.add_where("id = ?", Value::Integer(id));
    }
    if let Some(author_id) = req.author_id {
        select.add_where("author_id = ?", Value::Integer(author_id));
    }
    if let Some(category_id) = req.category_id {
        select.add_where("category_id = ?", Value::Integer(category_id));
    }

    select.set_query(req.query, "title");

    select.add_order_by("update_time DESC");

    let (sql, values) = select.build();
    let values = convert_values(values);

    (sql, values)
}
