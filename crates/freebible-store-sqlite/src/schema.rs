//! SQL schema for the FreeBible SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Column names must match the descriptors in `freebible_core`; the store
/// builds its statements from those.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS bible_versions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    code        TEXT NOT NULL UNIQUE,   -- UUID v4, immutable
    language    TEXT NOT NULL,          -- 'PT' | 'EN'
    label       TEXT,
    created_at  TEXT NOT NULL,          -- ISO 8601 UTC
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT,                   -- NULL while visible
    is_active   INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS books (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    bible_version_id  INTEGER NOT NULL REFERENCES bible_versions(id) ON DELETE CASCADE,
    code              TEXT NOT NULL,    -- canonical book code, e.g. 'GN'
    testament         TEXT NOT NULL,    -- 'V' | 'N'
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    deleted_at        TEXT,
    is_active         INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS chapters (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    book_id     INTEGER NOT NULL REFERENCES books(id) ON DELETE CASCADE,
    author      TEXT,
    number      INTEGER NOT NULL CHECK (number > 0),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS verses (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    chapter_id  INTEGER NOT NULL REFERENCES chapters(id) ON DELETE CASCADE,
    number      INTEGER NOT NULL CHECK (number > 0),
    text        TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS users (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    code               TEXT NOT NULL UNIQUE,
    email              TEXT NOT NULL UNIQUE,
    password_hash      TEXT NOT NULL,   -- argon2 PHC string
    employee_number    INTEGER NOT NULL UNIQUE,
    name               TEXT NOT NULL,
    collaborator_name  TEXT NOT NULL,
    special_need       TEXT,
    marital_status     TEXT,
    phone              TEXT,
    nationality        TEXT,
    sex                TEXT,
    race               TEXT,
    is_staff           INTEGER NOT NULL DEFAULT 0,
    is_superuser       INTEGER NOT NULL DEFAULT 0,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL,
    deleted_at         TEXT,
    is_active          INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS books_version_idx  ON books(bible_version_id);
CREATE INDEX IF NOT EXISTS chapters_book_idx  ON chapters(book_id);
CREATE INDEX IF NOT EXISTS verses_chapter_idx ON verses(chapter_id);

PRAGMA user_version = 1;
";
