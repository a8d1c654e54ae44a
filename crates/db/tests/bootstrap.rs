use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_bootstrap(pool: PgPool) {
    gigboard_db::health_check(&pool).await.unwrap();

    let rows: Vec<(i16, String)> =
        sqlx::query_as("SELECT id, name FROM show_statuses ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    let names: Vec<(i16, &str)> = rows.iter().map(|(id, n)| (*id, n.as_str())).collect();
    assert_eq!(
        names,
        [(1, "pending"), (2, "approved"), (3, "rejected"), (4, "private")]
    );
}

/// All `id` columns must be bigint (entity tables) or smallint (lookup tables).
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_all_pks_are_correct_type(pool: PgPool) {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name, data_type
         FROM information_schema.columns
         WHERE column_name = 'id'
           AND table_schema = 'public'
           AND table_name != '_sqlx_migrations'
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!rows.is_empty());
    for (table, data_type) in &rows {
        assert!(
            data_type == "bigint" || data_type == "smallint",
            "Table {table}.id should be bigint or smallint, got {data_type}"
        );
    }
}

/// The provenance key must be enforced by a named unique constraint.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_source_event_constraint_exists(pool: PgPool) {
    let found: Option<(String,)> = sqlx::query_as(
        "SELECT constraint_name
         FROM information_schema.table_constraints
         WHERE table_name = 'shows'
           AND constraint_type = 'UNIQUE'
           AND constraint_name = 'uq_shows_source_event'",
    )
    .fetch_optional(&pool)
    .await
    .unwrap();
    assert!(found.is_some());
}
