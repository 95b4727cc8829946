use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::{
    config,
    domain::{
        album::Album,
        artist::Artist,
        id::{AlbumId, ArtistId, SongId},
        song::{AlbumSong, Song},
    },
    storage::{
        db,
        error::StorageError,
        schema::{columns, tables},
    },
};

use columns::*;
use tables::*;

/// Main structure that implements all storage logic.
///
/// Entity operations live in `artists`, `albums`, `songs` and `association`.
pub struct Storage {
    pub(crate) db: rusqlite::Connection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogCounts {
    pub artists: usize,
    pub albums: usize,
    pub songs: usize,
    /// rows in the album/song association
    pub tracks: usize,
}

impl Storage {
    /// when called, opens a data base connection
    pub fn new(db_config: &config::Database) -> Result<Self, StorageError> {
        let db = db::open(db_config)?;
        Ok(Self::from_existing_conn(db))
    }

    pub fn from_existing_conn(db: rusqlite::Connection) -> Self {
        Self { db }
    }

    /// number of rows per table
    pub fn counts(&mut self) -> Result<CatalogCounts, StorageError> {
        let tx = self.db.transaction()?;
        let counts = CatalogCounts {
            artists: count_rows(&tx, ARTISTS)?,
            albums: count_rows(&tx, ALBUMS)?,
            songs: count_rows(&tx, SONGS)?,
            tracks: count_rows(&tx, ALBUM_SONG)?,
        };
        tx.commit()?;
        Ok(counts)
    }
}

fn count_rows(conn: &Connection, table: &str) -> Result<usize, StorageError> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    usize::try_from(count).map_err(|e| {
        StorageError::Internal(anyhow::anyhow!(
            "Strange conversion error to usize after select count: {e}"
        ))
    })
}

// --------------------------------------------------
// Column lists and row mappers shared by the entity modules.
// Mappers read `offset..` so joined rows can carry several entities.
// --------------------------------------------------

pub(super) fn artist_columns(alias: &str) -> String {
    format!("{alias}.{ID}, {alias}.{NAME}, {alias}.{CREATED_AT}, {alias}.{UPDATED_AT}")
}

pub(super) fn artist_from_row(row: &Row, offset: usize) -> rusqlite::Result<Artist> {
    Ok(Artist {
        id: ArtistId(row.get(offset)?),
        name: row.get(offset + 1)?,
        created_at: row.get(offset + 2)?,
        updated_at: row.get(offset + 3)?,
    })
}

pub(super) fn album_columns(alias: &str) -> String {
    format!(
        "{alias}.{ID}, {alias}.{TITLE}, {alias}.{ARTIST_ID}, {alias}.{RELEASE_YEAR}, \
         {alias}.{CREATED_AT}, {alias}.{UPDATED_AT}"
    )
}

pub(super) const ALBUM_WIDTH: usize = 6;

pub(super) fn album_from_row(row: &Row, offset: usize) -> rusqlite::Result<Album> {
    Ok(Album {
        id: AlbumId(row.get(offset)?),
        title: row.get(offset + 1)?,
        artist_id: ArtistId(row.get(offset + 2)?),
        release_year: row.get(offset + 3)?,
        created_at: row.get(offset + 4)?,
        updated_at: row.get(offset + 5)?,
    })
}

pub(super) fn song_columns(alias: &str) -> String {
    format!("{alias}.{ID}, {alias}.{TITLE}, {alias}.{CREATED_AT}, {alias}.{UPDATED_AT}")
}

pub(super) const SONG_WIDTH: usize = 4;

pub(super) fn song_from_row(row: &Row, offset: usize) -> rusqlite::Result<Song> {
    Ok(Song {
        id: SongId(row.get(offset)?),
        title: row.get(offset + 1)?,
        created_at: row.get(offset + 2)?,
        updated_at: row.get(offset + 3)?,
    })
}

pub(super) fn pivot_columns(alias: &str) -> String {
    format!("{alias}.{ALBUM_ID}, {alias}.{SONG_ID}, {alias}.{TRACK_NUMBER}")
}

pub(super) fn pivot_from_row(row: &Row, offset: usize) -> rusqlite::Result<AlbumSong> {
    Ok(AlbumSong {
        album_id: AlbumId(row.get(offset)?),
        song_id: SongId(row.get(offset + 1)?),
        track_number: row.get(offset + 2)?,
    })
}

// --------------------------------------------------
// Single-row lookups, usable on a connection or inside a transaction
// --------------------------------------------------

pub(super) fn find_artist(conn: &Connection, id: ArtistId) -> rusqlite::Result<Option<Artist>> {
    conn.query_row(
        &format!("SELECT {} FROM {ARTISTS} a WHERE a.{ID} = ?1", artist_columns("a")),
        params![id.0],
        |row| artist_from_row(row, 0),
    )
    .optional()
}

pub(super) fn find_album(conn: &Connection, id: AlbumId) -> rusqlite::Result<Option<Album>> {
    conn.query_row(
        &format!("SELECT {} FROM {ALBUMS} al WHERE al.{ID} = ?1", album_columns("al")),
        params![id.0],
        |row| album_from_row(row, 0),
    )
    .optional()
}

pub(super) fn find_song(conn: &Connection, id: SongId) -> rusqlite::Result<Option<Song>> {
    conn.query_row(
        &format!("SELECT {} FROM {SONGS} s WHERE s.{ID} = ?1", song_columns("s")),
        params![id.0],
        |row| song_from_row(row, 0),
    )
    .optional()
}

pub(super) fn artist_exists(conn: &Connection, id: ArtistId) -> rusqlite::Result<bool> {
    conn.query_row(
        &format!("SELECT EXISTS (SELECT 1 FROM {ARTISTS} WHERE {ID} = ?1)"),
        params![id.0],
        |row| row.get(0),
    )
}
