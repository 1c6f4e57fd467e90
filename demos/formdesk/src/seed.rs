use sqlx::SqlitePool;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    admin_id INTEGER,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    deleted_at TIMESTAMP
);
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    name TEXT,
    role TEXT NOT NULL DEFAULT 'user',
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    project_id INTEGER REFERENCES projects(id)
);
CREATE TABLE IF NOT EXISTS forms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT 0,
    description TEXT,
    type TEXT NOT NULL DEFAULT 'project',
    admin_id INTEGER,
    approval_flow TEXT,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS form_fields (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    label TEXT NOT NULL,
    key TEXT NOT NULL,
    placeholder TEXT,
    type TEXT NOT NULL,
    required BOOLEAN NOT NULL DEFAULT 0,
    options TEXT,
    length INTEGER,
    "order" INTEGER NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    form_id INTEGER REFERENCES forms(id) ON DELETE CASCADE
);
CREATE TABLE IF NOT EXISTS form_submissions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    is_check BOOLEAN NOT NULL DEFAULT 0,
    answers TEXT NOT NULL,
    score INTEGER DEFAULT 0,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    user_id INTEGER REFERENCES users(id) ON DELETE CASCADE
);
CREATE TABLE IF NOT EXISTS assets (
    id TEXT PRIMARY KEY,
    filename TEXT NOT NULL,
    url TEXT NOT NULL,
    type TEXT DEFAULT 'other',
    category TEXT NOT NULL,
    mime_type TEXT,
    size INTEGER,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    deleted_at TIMESTAMP,
    user_id INTEGER REFERENCES users(id) ON DELETE SET NULL
);
"#;

const SEED: &str = r#"
INSERT INTO projects (id, name, admin_id, created_at) VALUES
    (1, 'Alpha', 1, '2024-01-01 09:00:00'),
    (2, 'Beta', 2, '2024-01-02 09:00:00'),
    (3, 'Legacy', NULL, '2023-06-01 09:00:00');
UPDATE projects SET deleted_at = '2024-02-01 00:00:00' WHERE id = 3;

INSERT INTO users (id, email, name, role, created_at, project_id) VALUES
    (1, 'alice@formdesk.io', 'Alice', 'admin', '2024-01-03 10:00:00', 1),
    (2, 'bob@formdesk.io', 'Bob', 'user', '2024-01-04 10:00:00', 1),
    (3, 'carol@formdesk.io', 'Carol', 'user', '2024-01-05 10:00:00', 2),
    (4, 'dave@formdesk.io', NULL, 'user', '2024-01-06 10:00:00', NULL);

INSERT INTO forms (id, title, is_active, description, type, admin_id, created_at) VALUES
    (1, 'Onboarding', 1, 'New member questionnaire', 'project', 1, '2024-01-07 08:00:00'),
    (2, 'Exit survey', 0, NULL, 'hr', 2, '2024-01-08 08:00:00');

INSERT INTO form_fields (id, label, key, placeholder, type, required, options, length, "order", form_id) VALUES
    (1, 'Full name', 'full_name', 'Jane Doe', 'text', 1, NULL, 120, 1, 1),
    (2, 'Team', 'team', NULL, 'select', 1, '["design","engineering","ops"]', NULL, 2, 1),
    (3, 'Reason', 'reason', NULL, 'textarea', 0, NULL, 500, 1, 2);

INSERT INTO form_submissions (id, is_check, answers, score, created_at, user_id) VALUES
    (1, 1, '{"full_name":"Alice","team":"engineering"}', 8, '2024-01-09 12:00:00', 1),
    (2, 0, '{"full_name":"Bob","team":"design"}', 5, '2024-01-10 12:00:00', 2);

INSERT INTO assets (id, filename, url, type, category, mime_type, size, created_at, user_id) VALUES
    ('6f1c2a8e-3b7d-4c1e-9a55-0d6b7e2f4a10', 'avatar.png', '/uploads/avatar.png', 'image', 'profile', 'image/png', 2048, '2024-01-11 07:00:00', 1),
    ('b3e9d4c2-7a61-4f0b-8e2d-5c9a1f3e7b22', 'contract.pdf', '/uploads/contract.pdf', 'document', 'hr', 'application/pdf', 40960, '2024-01-12 07:00:00', 3);
"#;

/// Create the tables if they are missing.
pub async fn bootstrap(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    tracing::info!("schema ready");
    Ok(())
}

/// Insert demo rows into an empty database.
pub async fn seed(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let (users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if users > 0 {
        tracing::debug!(users, "database already seeded");
        return Ok(());
    }
    sqlx::raw_sql(SEED).execute(pool).await?;
    tracing::info!("seed data inserted");
    Ok(())
}
