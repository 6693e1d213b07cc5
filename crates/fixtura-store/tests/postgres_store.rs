use std::env;

use anyhow::{Context, Result};
use serde_json::{Value, json};

use fixtura_store::{DocumentStore, PostgresStore, StoreError};

fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .ok()
}

fn document(value: Value) -> fixtura_core::Record {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn round_trips_documents_through_postgres() -> Result<()> {
    let Some(url) = database_url() else {
        eprintln!("skipping: set TEST_DATABASE_URL or DATABASE_URL to run Postgres tests");
        return Ok(());
    };
    let store = PostgresStore::connect(&url)
        .await
        .context("connecting to Postgres")?;
    let collection = format!("fixtura_it_{}", uuid::Uuid::new_v4().simple());

    let given = store.new_id();
    let ids = store
        .insert(
            &collection,
            vec![
                document(json!({"_id": given.clone(), "name": "first"})),
                document(json!({"name": "second"})),
            ],
        )
        .await?;
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], given);
    assert!(ids.iter().all(|id| store.is_native_id(id)));
    assert_eq!(store.count(&collection, &ids).await?, 2);

    let duplicate = store
        .insert(&collection, vec![document(json!({"_id": given}))])
        .await;
    assert!(matches!(duplicate, Err(StoreError::DuplicateId { .. })));

    assert_eq!(store.remove(&collection, &ids).await?, 2);
    assert_eq!(store.remove(&collection, &ids).await?, 0);
    assert_eq!(store.count(&collection, &ids).await?, 0);

    sqlx::query(&format!(r#"drop table if exists "{collection}""#))
        .execute(store.pool())
        .await?;
    Ok(())
}

#[tokio::test]
async fn lookups_on_unwritten_collections_do_not_create_tables() -> Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let store = PostgresStore::connect(&url).await?;
    let collection = format!("fixtura_it_{}", uuid::Uuid::new_v4().simple());
    let ids = vec![store.new_id()];

    assert_eq!(store.count(&collection, &ids).await?, 0);
    assert_eq!(store.remove(&collection, &ids).await?, 0);

    let exists: bool = sqlx::query_scalar("select to_regclass($1) is not null")
        .bind(format!(r#""{collection}""#))
        .fetch_one(store.pool())
        .await?;
    assert!(!exists, "count/remove must not create {collection}");
    Ok(())
}

#[tokio::test]
async fn rejects_unsafe_collection_names() -> Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let store = PostgresStore::connect(&url).await?;

    let result = store.insert("users; drop table x", Vec::new()).await;
    assert!(matches!(result, Err(StoreError::InvalidCollection(_))));
    Ok(())
}
