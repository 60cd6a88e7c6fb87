use anyhow::Result;
use log::debug;
use rusqlite::types::Value as DbValue;
use rusqlite::{params, params_from_iter, Connection, Transaction};

use crate::api::user::{GetUserRequest, User};
use crate::db::sql::{Select, Update, Value};
use crate::db::types::{CreateUserParams, UpdateUserParams, UserAuth};
use crate::roles;

use super::convert_values;

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS user (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    password TEXT NOT NULL,
    salt TEXT NOT NULL,
    roles TEXT NOT NULL,
    create_time INTEGER NOT NULL,
    update_time INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_user_email ON user(email);
"#;

pub fn create_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLE_SQL)?;
    Ok(())
}

pub fn create(tx: &Transaction, params: CreateUserParams) -> Result<u64> {
    let sql = r#"
    INSERT INTO user (name, email, password, salt, roles, create_time, update_time)
    VALUES (?, ?, ?, ?, ?, ?, ?)
    "#;
    debug!("Database create_user: {sql}, name: {}", params.name);
    tx.execute(
        sql,
        params![
            params.name,
            params.email,
            params.password,
            params.salt,
            params.roles,
            params.create_time,
            params.create_time,
        ],
    )?;

    Ok(tx.last_insert_rowid() as u64)
}

pub fn update(tx: &Transaction, params: UpdateUserParams) -> Result<()> {
    let mut update = Update::new("user");

    update.add_field("name", Value::Text(params.name));
    update.add_field("email", Value::Text(params.email));
    if let Some((password, salt)) = params.password {
        update.add_field("password", Value::Text(password));
        update.add_field("salt", Value::Text(salt));
    }
    update.add_field("update_time", Value::Integer(params.update_time));

    update.add_where("id = ?", Value::Integer(params.id));

    let (sql, values) = update.build();
    let values = convert_values(values);

    debug!("Database update_user: {sql}");
    tx.execute(&sql, params_from_iter(values.iter()))?;

    Ok(())
}

pub fn has_email(tx: &Transaction, email: &str) -> Result<bool> {
    let mut select = Select::count("user");
    select.add_where("email = ?", Value::Text(String::from(email)));

    let (sql, values) = select.build();
    let values = convert_values(values);

    debug!("Database has_user_email: {sql}, {email}");
    let mut stmt = tx.prepare(&sql)?;
    let count: i64 = stmt.query_row(params_from_iter(values), |row| row.get(0))?;
    Ok(count > 0)
}

pub fn get_auth(tx: &Transaction, email: &str) -> Result<UserAuth> {
    let mut select = Select::new(
        vec!["id", "name", "email", "password", "salt", "roles"],
        "user",
    );
    select.add_where("email = ?", Value::Text(String::from(email)));

    let (sql, values) = select.build();
    let values = convert_values(values);

    debug!("Database get_user_auth: {sql}, {email}");
    let mut stmt = tx.prepare(&sql)?;
    let auth = stmt.query_row(params_from_iter(values), |row| {
        Ok(UserAuth {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            salt: row.get(4)?,
            roles: row.get(5)?,
        })
    })?;

    Ok(auth)
}

pub fn get(tx: &Transaction, id: u64) -> Result<User> {
    let mut select = user_select();
    select.add_where("id = ?", Value::Integer(id));

    let (sql, values) = select.build();
    let values = convert_values(values);

    debug!("Database get_user: {sql}, {id}");
    let mut stmt = tx.prepare(&sql)?;
    let user = stmt.query_row(params_from_iter(values), convert_row)?;

    Ok(user)
}

pub fn count_users(tx: &Transaction, req: GetUserRequest) -> Result<u64> {
    let (sql, values) = build_select_sql(true, req);
    debug!("Database count_users: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;
    let count: i64 = stmt.query_row(params_from_iter(values.iter()), |row| row.get(0))?;

    Ok(count as u64)
}

pub fn get_users(tx: &Transaction, req: GetUserRequest) -> Result<Vec<User>> {
    let (sql, values) = build_select_sql(false, req);
    debug!("Database get_users: {sql}, {values:?}");

    let mut stmt = tx.prepare(&sql)?;
    let users = stmt
        .query_map(params_from_iter(values), convert_row)?
        .map(|r| r.unwrap())
        .collect::<Vec<_>>();

    Ok(users)
}

fn user_select() -> Select {
    Select::new(vec!["id", "name", "email", "roles", "update_time"], "user")
}

fn convert_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let roles: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        roles: roles::parse_roles(&roles).unwrap_or_default(),
        update_time: row.get(4)?,
    })
}

fn build_select_sql(count: bool, req: GetUserRequest) -> (String, Vec<DbValue>) {
    let mut select = if count {
        Select::count("user")
    } else {
        user_select()
    };

    if let Some(id) = req.id {
        select.add_where("id = ?", Value::Integer(id));
    }

    select.set_query(req.query, "name");

    select.add_order_by("update_time DESC");

    let (sql, values) = select.build();
    let values = convert_values(values);

    (sql, values)
}
