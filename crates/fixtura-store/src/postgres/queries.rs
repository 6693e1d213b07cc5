use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::errors::{Result, StoreError};

const UNIQUE_VIOLATION: &str = "23505";

pub fn db_error(err: sqlx::Error) -> StoreError {
    StoreError::Db(err.to_string())
}

pub async fn create_table(pool: &PgPool, table: &str) -> Result<()> {
    let sql = format!(
        r#"create table if not exists "{table}" (id uuid primary key, doc jsonb not null)"#
    );
    sqlx::query(&sql).execute(pool).await.map_err(db_error)?;
    Ok(())
}

/// `to_regclass` returns null for a missing relation instead of raising.
pub async fn table_exists(pool: &PgPool, table: &str) -> Result<bool> {
    sqlx::query_scalar::<_, bool>("select to_regclass($1) is not null")
        .bind(quoted(table))
        .fetch_one(pool)
        .await
        .map_err(db_error)
}

pub async fn insert_documents(pool: &PgPool, table: &str, rows: &[(Uuid, Value)]) -> Result<()> {
    let sql = format!(r#"insert into "{table}" (id, doc) values ($1, $2)"#);
    let mut tx = pool.begin().await.map_err(db_error)?;
    for (id, doc) in rows {
        sqlx::query(&sql)
            .bind(id)
            .bind(Json(doc))
            .execute(&mut *tx)
            .await
            .map_err(|err| insert_error(err, table, id))?;
    }
    tx.commit().await.map_err(db_error)?;
    Ok(())
}

pub async fn delete_documents(pool: &PgPool, table: &str, ids: &[Uuid]) -> Result<u64> {
    let sql = format!(r#"delete from "{table}" where id = any($1)"#);
    let result = sqlx::query(&sql)
        .bind(ids)
        .execute(pool)
        .await
        .map_err(db_error)?;
    Ok(result.rows_affected())
}

pub async fn count_documents(pool: &PgPool, table: &str, ids: &[Uuid]) -> Result<u64> {
    let sql = format!(r#"select count(*) from "{table}" where id = any($1)"#);
    let count = sqlx::query_scalar::<_, i64>(&sql)
        .bind(ids)
        .fetch_one(pool)
        .await
        .map_err(db_error)?;
    Ok(count.max(0) as u64)
}

fn quoted(table: &str) -> String {
    format!(r#""{table}""#)
}

fn insert_error(err: sqlx::Error, table: &str, id: &Uuid) -> StoreError {
    let duplicate = err
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION);
    if duplicate {
        StoreError::DuplicateId {
            collection: table.to_string(),
            id: id.to_string(),
        }
    } else {
        db_error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_names_keep_their_case() {
        assert_eq!(quoted("User"), r#""User""#);
        assert_eq!(quoted("tags"), r#""tags""#);
    }
}
