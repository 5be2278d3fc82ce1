//! SQL schema for the garb SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS profiles (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    display_name  TEXT NOT NULL,
    password_hash TEXT,             -- argon2 PHC string; NULL = cannot sign in
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS garments (
    garment_id TEXT PRIMARY KEY,
    owner_id   TEXT NOT NULL REFERENCES profiles(user_id),
    name       TEXT NOT NULL,
    color      TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS outfits (
    outfit_id   TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL REFERENCES profiles(user_id),
    name        TEXT NOT NULL,
    description TEXT,
    created_at  TEXT NOT NULL
);

-- Garment membership of an outfit. `position` preserves assembly order;
-- reads sort by it. garment_id carries no foreign key: garments may be
-- deleted out from under an outfit and the outfit must stay readable.
CREATE TABLE IF NOT EXISTS outfit_garments (
    outfit_id  TEXT NOT NULL REFERENCES outfits(outfit_id) ON DELETE CASCADE,
    garment_id TEXT NOT NULL,
    slot       TEXT NOT NULL,       -- 'top' | 'bottom' | 'footwear' | 'other'
    position   INTEGER NOT NULL,
    PRIMARY KEY (outfit_id, position)
);

CREATE TABLE IF NOT EXISTS challenges (
    challenge_id TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL,
    starts_at    TEXT NOT NULL,
    ends_at      TEXT NOT NULL,
    created_by   TEXT REFERENCES profiles(user_id),  -- NULL = system-created
    created_at   TEXT NOT NULL
);

-- One entry per user per challenge. The UNIQUE constraint backs up the
-- insert path's pre-check. outfit_id carries no foreign key: outfits may be
-- deleted after entry, and reads skip such participations.
CREATE TABLE IF NOT EXISTS participations (
    participation_id TEXT PRIMARY KEY,
    challenge_id     TEXT NOT NULL REFERENCES challenges(challenge_id),
    user_id          TEXT NOT NULL REFERENCES profiles(user_id),
    outfit_id        TEXT NOT NULL,
    created_at       TEXT NOT NULL,
    UNIQUE (challenge_id, user_id)
);

-- One unified vote relation; challenge_id is NULL for standalone outfit
-- votes. Plain UNIQUE treats NULLs as distinct, so per-target uniqueness
-- lives in the expression index below.
CREATE TABLE IF NOT EXISTS votes (
    vote_id      TEXT PRIMARY KEY,
    voter_id     TEXT NOT NULL REFERENCES profiles(user_id),
    outfit_id    TEXT NOT NULL,
    challenge_id TEXT,
    direction    TEXT NOT NULL,     -- 'up' | 'down'
    cast_at      TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS votes_identity_idx
    ON votes(voter_id, outfit_id, COALESCE(challenge_id, ''));

-- element_id carries no foreign key: favorites are weak references and must
-- survive deletion of their target.
CREATE TABLE IF NOT EXISTS favorites (
    favorite_id TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES profiles(user_id),
    kind        TEXT NOT NULL,      -- 'garment' | 'outfit' | 'user'
    element_id  TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (user_id, kind, element_id)
);

CREATE INDEX IF NOT EXISTS votes_target_idx
    ON votes(outfit_id, challenge_id);
CREATE INDEX IF NOT EXISTS participations_challenge_idx
    ON participations(challenge_id);
CREATE INDEX IF NOT EXISTS favorites_user_idx
    ON favorites(user_id);

PRAGMA user_version = 1;
";
