use sqlx::AnyPool;

pub async fn migrate(pool: &AnyPool) -> anyhow::Result<()> {
    // Latest line per sport; no history.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS sportlines (
  sport TEXT PRIMARY KEY,
  value DOUBLE PRECISION NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
