//! SQL schema for the KARA SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.
//!
//! There are no foreign keys between collections: each table behaves like an
//! independent document collection, and cross-collection consistency is the
//! job of the workflows layered on top.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS membership_requests (
    request_id            TEXT PRIMARY KEY,
    matricule             TEXT,
    identity              TEXT NOT NULL,   -- JSON RequestIdentity
    address               TEXT,            -- JSON Address or NULL
    company               TEXT,            -- JSON CompanyInfo or NULL
    documents             TEXT NOT NULL,   -- JSON IdentityDocuments
    status                TEXT NOT NULL DEFAULT 'pending',
    is_paid               INTEGER NOT NULL DEFAULT 0,
    -- Owned by the write trigger.
    normalized_email      TEXT,
    normalized_doc_number TEXT,
    is_duplicate          INTEGER NOT NULL DEFAULT 0,
    duplicate_group_ids   TEXT NOT NULL DEFAULT '[]',
    approved_by           TEXT,
    approved_at           TEXT,
    created_at            TEXT NOT NULL,
    updated_at            TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS requests_email_idx ON membership_requests(normalized_email);
CREATE INDEX IF NOT EXISTS requests_doc_idx   ON membership_requests(normalized_doc_number);

-- (match_type, match_value) is looked up, not constrained: two concurrent
-- triggers may each insert a group for the same key.
CREATE TABLE IF NOT EXISTS duplicate_groups (
    group_id      TEXT PRIMARY KEY,
    match_type    TEXT NOT NULL,     -- 'phone' | 'email' | 'identityDocument'
    match_value   TEXT NOT NULL,
    request_ids   TEXT NOT NULL,     -- JSON array of unique request ids
    request_count INTEGER NOT NULL,
    detected_at   TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    resolved_at   TEXT,
    resolved_by   TEXT
);

CREATE INDEX IF NOT EXISTS groups_key_idx ON duplicate_groups(match_type, match_value);

-- Member documents are stored whole, keyed by matricule.
CREATE TABLE IF NOT EXISTS users (
    matricule  TEXT PRIMARY KEY,
    request_id TEXT NOT NULL,
    body       TEXT NOT NULL,          -- JSON Member
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subscriptions (
    subscription_id  TEXT PRIMARY KEY,
    member_id        TEXT NOT NULL,
    membership_type  TEXT NOT NULL,
    start_date       TEXT NOT NULL,
    end_date         TEXT NOT NULL,
    status           TEXT NOT NULL,
    adhesion_pdf_url TEXT NOT NULL,
    created_by       TEXT NOT NULL,
    created_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS subscriptions_member_idx ON subscriptions(member_id);

CREATE TABLE IF NOT EXISTS documents (
    document_id   TEXT PRIMARY KEY,
    member_id     TEXT NOT NULL,
    request_id    TEXT NOT NULL,
    document_type TEXT NOT NULL,
    format        TEXT NOT NULL,
    url           TEXT NOT NULL,
    created_by    TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS documents_member_idx ON documents(member_id);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    kind            TEXT NOT NULL,
    title           TEXT NOT NULL,
    message         TEXT NOT NULL,
    member_id       TEXT,
    request_id      TEXT,
    is_read         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);

-- Identity-provider accounts. Only argon2 PHC strings are stored.
CREATE TABLE IF NOT EXISTS accounts (
    uid           TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,   -- lower-cased
    password_hash TEXT NOT NULL,
    role          TEXT,
    created_at    TEXT NOT NULL
);

PRAGMA user_version = 1;
";
