use rusqlite::Connection;

pub mod tables {
    pub const ARTISTS: &str = "artists";
    pub const ALBUMS: &str = "albums";
    pub const SONGS: &str = "songs";
    pub const ALBUM_SONG: &str = "album_song";

    #[cfg(test)]
    pub const ALL_TABLES: &[&str] = &[ARTISTS, ALBUMS, SONGS, ALBUM_SONG];
}

pub mod columns {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const TITLE: &str = "title";
    pub const ARTIST_ID: &str = "artist_id";
    pub const RELEASE_YEAR: &str = "release_year";
    pub const ALBUM_ID: &str = "album_id";
    pub const SONG_ID: &str = "song_id";
    pub const TRACK_NUMBER: &str = "track_number";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
}

pub use columns::*;
pub use tables::*;

// AUTOINCREMENT keeps ids of deleted rows from being handed out again.
const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS artists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS albums (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    artist_id INTEGER NOT NULL REFERENCES artists (id) ON DELETE RESTRICT,
    release_year INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS albums_artist_id ON albums (artist_id);

CREATE TABLE IF NOT EXISTS songs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS album_song (
    album_id INTEGER NOT NULL REFERENCES albums (id) ON DELETE CASCADE,
    song_id INTEGER NOT NULL REFERENCES songs (id) ON DELETE CASCADE,
    track_number INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (album_id, song_id)
);

CREATE INDEX IF NOT EXISTS album_song_song_id ON album_song (song_id);
"#;

pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}
