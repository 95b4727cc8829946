use std::collections::HashMap;

use rusqlite::{Connection, params};

use crate::{
    domain::{
        id::SongId,
        song::{Song, SongAlbum, SongWithAlbums},
    },
    storage::{
        db,
        error::StorageError,
        operations::{
            ALBUM_WIDTH, Storage, album_columns, album_from_row, find_song, pivot_columns,
            pivot_from_row, song_columns, song_from_row,
        },
        schema::{columns::*, tables::*},
    },
    validation::SongPayload,
};

impl Storage {
    /// All songs, each with the albums it appears on
    pub fn list_songs(&mut self) -> Result<Vec<SongWithAlbums>, StorageError> {
        let tx = self.db.transaction()?;

        let (songs, appearances) = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM {SONGS} s ORDER BY s.{ID}",
                song_columns("s")
            ))?;
            let songs = stmt
                .query_map([], |row| song_from_row(row, 0))?
                .collect::<Result<Vec<_>, _>>()?;

            (songs, song_albums(&tx, None)?)
        };

        tx.commit()?;

        let mut by_song: HashMap<SongId, Vec<SongAlbum>> = HashMap::new();
        for appearance in appearances {
            by_song
                .entry(appearance.pivot.song_id)
                .or_default()
                .push(appearance);
        }

        Ok(songs
            .into_iter()
            .map(|song| SongWithAlbums {
                albums: by_song.remove(&song.id).unwrap_or_default(),
                song,
            })
            .collect())
    }

    pub fn get_song(&mut self, id: SongId) -> Result<SongWithAlbums, StorageError> {
        let tx = self.db.transaction()?;

        let song = find_song(&tx, id)?.ok_or(StorageError::SongNotFound(id))?;
        let albums = song_albums(&tx, Some(id))?;

        tx.commit()?;
        Ok(SongWithAlbums { song, albums })
    }

    pub fn create_song(&mut self, payload: SongPayload) -> Result<Song, StorageError> {
        let now = db::now();

        self.db.execute(
            &format!(
                "INSERT INTO {SONGS} ({TITLE}, {CREATED_AT}, {UPDATED_AT}) VALUES (?1, ?2, ?2)"
            ),
            params![payload.title, now],
        )?;
        let id = SongId(self.db.last_insert_rowid());
        log::debug!("created song {id}");

        Ok(Song {
            id,
            title: payload.title,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_song(&mut self, id: SongId, payload: SongPayload) -> Result<Song, StorageError> {
        let tx = self.db.transaction()?;

        let changed = tx.execute(
            &format!("UPDATE {SONGS} SET {TITLE} = ?1, {UPDATED_AT} = ?2 WHERE {ID} = ?3"),
            params![payload.title, db::now(), id.0],
        )?;
        if changed == 0 {
            return Err(StorageError::SongNotFound(id));
        }
        let song = find_song(&tx, id)?.ok_or(StorageError::SongNotFound(id))?;

        tx.commit()?;
        Ok(song)
    }

    /// Removes the song and every album association it had
    pub fn delete_song(&mut self, id: SongId) -> Result<(), StorageError> {
        let deleted = self.db.execute(
            &format!("DELETE FROM {SONGS} WHERE {ID} = ?1"),
            params![id.0],
        )?;
        if deleted == 0 {
            return Err(StorageError::SongNotFound(id));
        }
        log::debug!("deleted song {id}");
        Ok(())
    }
}

/// albums with their association rows, for one song or for all songs
fn song_albums(conn: &Connection, song: Option<SongId>) -> rusqlite::Result<Vec<SongAlbum>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {}, {} FROM {ALBUM_SONG} p JOIN {ALBUMS} al ON al.{ID} = p.{ALBUM_ID} \
         WHERE ?1 IS NULL OR p.{SONG_ID} = ?1 ORDER BY al.{ID}",
        album_columns("al"),
        pivot_columns("p")
    ))?;
    let albums = stmt
        .query_map(params![song.map(|s| s.0)], |row| {
            Ok(SongAlbum {
                album: album_from_row(row, 0)?,
                pivot: pivot_from_row(row, ALBUM_WIDTH)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(albums)
}
