//! SQL schema for the Taller SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- ── Directory ──────────────────────────────────────────────────────────────

CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,        -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- Only the SHA-256 digest of a bearer token is stored.
CREATE TABLE IF NOT EXISTS auth_sessions (
    token_digest TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at   TEXT NOT NULL,
    expires_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    id         TEXT PRIMARY KEY,
    email      TEXT NOT NULL,
    full_name  TEXT,
    phone      TEXT,
    role       TEXT,                    -- 'super_admin' | 'tallerista' | 'staff' | NULL
    country    TEXT,
    city       TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sedes (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    slug          TEXT NOT NULL,
    address       TEXT,
    city          TEXT,
    country       TEXT,
    contact_email TEXT,
    contact_phone TEXT,
    owner_id      TEXT,
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sede_members (
    id         TEXT PRIMARY KEY,
    sede_id    TEXT NOT NULL REFERENCES sedes(id),
    user_id    TEXT NOT NULL,
    role       TEXT NOT NULL DEFAULT 'staff',
    joined_at  TEXT NOT NULL,
    UNIQUE (sede_id, user_id)
);

-- ── Studio ─────────────────────────────────────────────────────────────────
-- Every studio table carries sede_id; all queries filter on it.

CREATE TABLE IF NOT EXISTS students (
    id                TEXT PRIMARY KEY,
    sede_id           TEXT NOT NULL REFERENCES sedes(id),
    name              TEXT NOT NULL,
    surname           TEXT,
    email             TEXT,
    phone             TEXT NOT NULL DEFAULT '',
    phone_country     TEXT,
    birth_day         INTEGER,
    birth_month       INTEGER,
    birth_year        INTEGER,
    classes_remaining INTEGER NOT NULL DEFAULT 0,
    status            TEXT NOT NULL DEFAULT 'new',
    payment_method    TEXT,
    notes             TEXT,
    observations      TEXT,
    price             REAL,
    class_type        TEXT,
    expiry_date       TEXT,             -- YYYY-MM-DD
    created_at        TEXT NOT NULL
);

-- Rewritten wholesale on every assigned-class edit; rowid keeps list order.
CREATE TABLE IF NOT EXISTS student_assigned_classes (
    id         TEXT PRIMARY KEY,
    sede_id    TEXT NOT NULL REFERENCES sedes(id),
    student_id TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
    date       TEXT NOT NULL,
    start_time TEXT NOT NULL,           -- HH:MM
    end_time   TEXT NOT NULL,
    status     TEXT NOT NULL DEFAULT 'pending'
);

CREATE TABLE IF NOT EXISTS teachers (
    id        TEXT PRIMARY KEY,
    sede_id   TEXT NOT NULL REFERENCES sedes(id),
    name      TEXT NOT NULL,
    surname   TEXT,
    email     TEXT,
    phone     TEXT,
    specialty TEXT,
    notes     TEXT
);

-- No uniqueness on the schedule: two sessions may share a slot.
CREATE TABLE IF NOT EXISTS sessions (
    id                    TEXT PRIMARY KEY,
    sede_id               TEXT NOT NULL REFERENCES sedes(id),
    date                  TEXT NOT NULL,
    start_time            TEXT NOT NULL,
    end_time              TEXT NOT NULL,
    class_type            TEXT NOT NULL,
    teacher_id            TEXT REFERENCES teachers(id) ON DELETE SET NULL,
    teacher_substitute_id TEXT REFERENCES teachers(id) ON DELETE SET NULL,
    completed_at          TEXT,
    workshop_name         TEXT,
    private_reason        TEXT,
    created_at            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS session_students (
    id           TEXT PRIMARY KEY,
    sede_id      TEXT NOT NULL REFERENCES sedes(id),
    session_id   TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    student_id   TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
    student_name TEXT NOT NULL,         -- upper-cased full name
    attendance   TEXT NOT NULL DEFAULT 'pending',
    UNIQUE (session_id, student_id)
);

CREATE TABLE IF NOT EXISTS pieces (
    id               TEXT PRIMARY KEY,
    sede_id          TEXT NOT NULL REFERENCES sedes(id),
    student_id       TEXT REFERENCES students(id) ON DELETE SET NULL,
    owner_name       TEXT NOT NULL,
    description      TEXT NOT NULL,
    status           TEXT NOT NULL DEFAULT '1era_quema',
    glaze_type       TEXT,
    delivery_date    TEXT,
    notes            TEXT,
    extra_commentary TEXT
);

CREATE TABLE IF NOT EXISTS gift_cards (
    id               TEXT PRIMARY KEY,
    sede_id          TEXT NOT NULL REFERENCES sedes(id),
    buyer            TEXT NOT NULL,
    recipient        TEXT NOT NULL,
    num_classes      INTEGER NOT NULL,
    type             TEXT NOT NULL,
    scheduled_date   TEXT,
    created_at       TEXT NOT NULL,
    extra_commentary TEXT
);

CREATE TABLE IF NOT EXISTS inventory_items (
    id               TEXT PRIMARY KEY,
    sede_id          TEXT NOT NULL REFERENCES sedes(id),
    category         TEXT NOT NULL,
    name             TEXT NOT NULL,
    code             TEXT NOT NULL,
    unit             TEXT NOT NULL DEFAULT '',
    current_quantity REAL NOT NULL DEFAULT 0,
    min_quantity     REAL,
    location         TEXT,
    supplier         TEXT,
    supplier_code    TEXT,
    cost_per_unit    REAL,
    notes            TEXT,
    status           TEXT NOT NULL DEFAULT 'active',
    details          TEXT NOT NULL DEFAULT '{}',   -- JSON ItemDetails
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

-- Append-only. Notes and resulting stock live inside `reason`.
CREATE TABLE IF NOT EXISTS inventory_movements (
    id                TEXT PRIMARY KEY,
    sede_id           TEXT NOT NULL REFERENCES sedes(id),
    inventory_item_id TEXT NOT NULL REFERENCES inventory_items(id),
    type              TEXT NOT NULL,    -- 'in' | 'out' | 'adjust'
    quantity          REAL,
    reason            TEXT NOT NULL,
    created_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS payments (
    id         TEXT PRIMARY KEY,
    sede_id    TEXT NOT NULL REFERENCES sedes(id),
    student_id TEXT REFERENCES students(id) ON DELETE SET NULL,
    amount     REAL NOT NULL,
    method     TEXT,
    paid_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS students_sede_idx       ON students(sede_id);
CREATE INDEX IF NOT EXISTS assigned_student_idx    ON student_assigned_classes(student_id);
CREATE INDEX IF NOT EXISTS sessions_slot_idx       ON sessions(sede_id, date, start_time);
CREATE INDEX IF NOT EXISTS roster_session_idx      ON session_students(session_id);
CREATE INDEX IF NOT EXISTS items_sede_idx          ON inventory_items(sede_id);
CREATE INDEX IF NOT EXISTS movements_item_idx      ON inventory_movements(inventory_item_id);
CREATE INDEX IF NOT EXISTS sedes_owner_idx         ON sedes(owner_id);
CREATE INDEX IF NOT EXISTS auth_sessions_user_idx  ON auth_sessions(user_id);

PRAGMA user_version = 1;
";
