//! Database schema definitions for RustFit.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Workouts table
CREATE TABLE IF NOT EXISTS workouts (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    performed_at TEXT NOT NULL,
    duration_seconds INTEGER NOT NULL,
    rpe INTEGER,
    notes TEXT,
    payload_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_workouts_user_performed ON workouts(user_id, performed_at);
CREATE INDEX IF NOT EXISTS idx_workouts_performed ON workouts(performed_at);

-- Goals table
CREATE TABLE IF NOT EXISTS goals (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    goal_type TEXT NOT NULL,
    target REAL NOT NULL,
    unit TEXT NOT NULL,
    start_at TEXT NOT NULL,
    end_at TEXT NOT NULL,
    current_value REAL NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'active',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_goals_user_id ON goals(user_id);

-- Badge definitions (seeded from the compiled registry)
CREATE TABLE IF NOT EXISTS badge_definitions (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    rarity TEXT NOT NULL,
    version INTEGER NOT NULL
);

-- Badge awards, at most one per user and badge
CREATE TABLE IF NOT EXISTS badge_awards (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    badge_id TEXT NOT NULL REFERENCES badge_definitions(id),
    earned_at TEXT NOT NULL,
    UNIQUE(user_id, badge_id)
);

CREATE INDEX IF NOT EXISTS idx_badge_awards_user_id ON badge_awards(user_id);

-- Personal records, one row per user and record type
CREATE TABLE IF NOT EXISTS personal_records (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    category TEXT NOT NULL,
    record_type TEXT NOT NULL,
    value REAL NOT NULL,
    unit TEXT NOT NULL,
    achieved_at TEXT NOT NULL,
    previous_value REAL,
    improvement_percent REAL,
    source_workout_id TEXT,
    updated_at TEXT NOT NULL,
    UNIQUE(user_id, record_type)
);

-- Follow graph
CREATE TABLE IF NOT EXISTS follows (
    follower_id TEXT NOT NULL,
    followee_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(follower_id, followee_id)
);

-- Challenges table
CREATE TABLE IF NOT EXISTS challenges (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    metric TEXT NOT NULL,
    target REAL NOT NULL,
    start_at TEXT NOT NULL,
    end_at TEXT NOT NULL,
    created_by TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Challenge participants
CREATE TABLE IF NOT EXISTS challenge_participants (
    id TEXT PRIMARY KEY,
    challenge_id TEXT NOT NULL REFERENCES challenges(id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    joined_at TEXT NOT NULL,
    progress REAL NOT NULL DEFAULT 0,
    progress_reached_at TEXT,
    completed_at TEXT,
    synced_at TEXT NOT NULL,
    UNIQUE(challenge_id, user_id)
);

-- Training plans (weeks stored as JSON)
CREATE TABLE IF NOT EXISTS training_plans (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    plan_type TEXT NOT NULL,
    difficulty TEXT NOT NULL,
    duration_weeks INTEGER NOT NULL,
    start_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    current_week INTEGER NOT NULL DEFAULT 1,
    progress_percentage INTEGER NOT NULL DEFAULT 0,
    weeks_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_training_plans_user_id ON training_plans(user_id);
"#;

/// SQL for schema version tracking (migrations)
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;
