//! Embedded SQL migration, executed at boot.

use diesel_async::AsyncPgConnection;
use diesel_async::SimpleAsyncConnection;

/// SQL migration for the release-management tables.
///
/// The UNIQUE index on publishes (commit, environment) is load-bearing: it is
/// what makes duplicate suppression in the admission engine race-free. The
/// admission insert runs ON CONFLICT DO NOTHING against it and falls back to
/// classifying the row that won.
pub const MIGRATION_SQL: &str = r#"
-- ================================================================
-- Release-management tables
-- ================================================================

CREATE TABLE IF NOT EXISTS users (
    id              BIGSERIAL PRIMARY KEY,
    user_name       VARCHAR(255) NOT NULL UNIQUE,
    user_avatar     VARCHAR(512) NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS apps (
    id              BIGSERIAL PRIMARY KEY,
    app_name        VARCHAR(255) NOT NULL UNIQUE,
    description     TEXT NOT NULL DEFAULT '',
    app_logo        VARCHAR(512) NOT NULL DEFAULT '',
    repository      VARCHAR(255) NOT NULL UNIQUE,
    version         VARCHAR(64) NOT NULL DEFAULT '',
    daily_address   VARCHAR(512) NOT NULL DEFAULT '',
    online_address  VARCHAR(512) NOT NULL DEFAULT '',
    page_prefix     VARCHAR(255) NOT NULL DEFAULT '/webapp/publish',
    port            BIGINT,
    publish_type    VARCHAR(16) NOT NULL,
    product_type    VARCHAR(16) NOT NULL,
    progressing_iteration_count INTEGER NOT NULL DEFAULT 0,
    creator_id      BIGINT NOT NULL REFERENCES users(id),
    create_time     TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_apps_repository ON apps (repository);
CREATE INDEX IF NOT EXISTS idx_apps_created ON apps (create_time DESC);

CREATE TABLE IF NOT EXISTS iterations (
    id              BIGSERIAL PRIMARY KEY,
    app_id          BIGINT NOT NULL REFERENCES apps(id) ON DELETE CASCADE,
    iteration_name  VARCHAR(255) NOT NULL,
    branch          VARCHAR(255) NOT NULL,
    version         VARCHAR(64) NOT NULL,
    create_time     TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_iterations_app ON iterations (app_id);
CREATE INDEX IF NOT EXISTS idx_iterations_branch ON iterations (app_id, branch);

CREATE TABLE IF NOT EXISTS members (
    id              BIGSERIAL PRIMARY KEY,
    app_id          BIGINT NOT NULL REFERENCES apps(id) ON DELETE CASCADE,
    user_id         BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    role            VARCHAR(16) NOT NULL,
    join_time       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    expired_time    TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_members_app ON members (app_id);
CREATE INDEX IF NOT EXISTS idx_members_user ON members (user_id);

CREATE TABLE IF NOT EXISTS publish_logs (
    id              BIGSERIAL PRIMARY KEY,
    content         TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS reviews (
    id              BIGSERIAL PRIMARY KEY,
    review_status   VARCHAR(16) NOT NULL,
    fail_reason     TEXT
);

CREATE TABLE IF NOT EXISTS publishes (
    id              BIGSERIAL PRIMARY KEY,
    app_id          BIGINT NOT NULL REFERENCES apps(id) ON DELETE CASCADE,
    iteration_id    BIGINT NOT NULL REFERENCES iterations(id),
    publisher_id    BIGINT NOT NULL REFERENCES users(id),
    commit          VARCHAR(64) NOT NULL,
    environment     VARCHAR(16) NOT NULL,
    status          VARCHAR(16) NOT NULL,
    log_id          BIGINT NOT NULL REFERENCES publish_logs(id),
    review_id       BIGINT REFERENCES reviews(id),
    create_time     TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_publishes_commit_env
    ON publishes (commit, environment);
CREATE INDEX IF NOT EXISTS idx_publishes_app ON publishes (app_id);
CREATE INDEX IF NOT EXISTS idx_publishes_created ON publishes (create_time DESC);
"#;

/// Run the embedded migration.
pub async fn run_migration(conn: &mut AsyncPgConnection) -> anyhow::Result<()> {
    conn.batch_execute(MIGRATION_SQL)
        .await
        .map_err(|e| anyhow::anyhow!("migration failed: {e}"))?;
    Ok(())
}
