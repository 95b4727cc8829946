use rusqlite::params;

use crate::{
    domain::{
        album::{Album, AlbumTrack, AlbumWithArtist},
        id::AlbumId,
    },
    storage::{
        db,
        error::StorageError,
        operations::{
            ALBUM_WIDTH, SONG_WIDTH, Storage, album_columns, album_from_row, artist_columns,
            artist_exists, artist_from_row, find_album, pivot_columns, pivot_from_row,
            song_columns, song_from_row,
        },
        schema::{columns::*, tables::*},
    },
    validation::AlbumPayload,
};

impl Storage {
    /// All albums, each with its artist
    pub fn list_albums(&mut self) -> Result<Vec<AlbumWithArtist>, StorageError> {
        let mut stmt = self.db.prepare(&format!(
            "SELECT {}, {} FROM {ALBUMS} al JOIN {ARTISTS} a ON a.{ID} = al.{ARTIST_ID} \
             ORDER BY al.{ID}",
            album_columns("al"),
            artist_columns("a")
        ))?;

        let albums = stmt
            .query_map([], |row| {
                Ok(AlbumWithArtist {
                    album: album_from_row(row, 0)?,
                    artist: artist_from_row(row, ALBUM_WIDTH)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(albums)
    }

    pub fn get_album(&mut self, id: AlbumId) -> Result<AlbumWithArtist, StorageError> {
        let album = self
            .db
            .query_row(
                &format!(
                    "SELECT {}, {} FROM {ALBUMS} al JOIN {ARTISTS} a ON a.{ID} = al.{ARTIST_ID} \
                     WHERE al.{ID} = ?1",
                    album_columns("al"),
                    artist_columns("a")
                ),
                params![id.0],
                |row| {
                    Ok(AlbumWithArtist {
                        album: album_from_row(row, 0)?,
                        artist: artist_from_row(row, ALBUM_WIDTH)?,
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StorageError::AlbumNotFound(id),
                e => StorageError::Database(e),
            })?;

        Ok(album)
    }

    /// Track list of the album, ordered by track number
    pub fn songs_by_album(&mut self, id: AlbumId) -> Result<Vec<AlbumTrack>, StorageError> {
        let tx = self.db.transaction()?;

        if find_album(&tx, id)?.is_none() {
            return Err(StorageError::AlbumNotFound(id));
        }

        let tracks = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {}, {} FROM {ALBUM_SONG} p JOIN {SONGS} s ON s.{ID} = p.{SONG_ID} \
                 WHERE p.{ALBUM_ID} = ?1 ORDER BY p.{TRACK_NUMBER}, s.{ID}",
                song_columns("s"),
                pivot_columns("p")
            ))?;
            let tracks = stmt
                .query_map(params![id.0], |row| {
                    Ok(AlbumTrack {
                        song: song_from_row(row, 0)?,
                        pivot: pivot_from_row(row, SONG_WIDTH)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            tracks
        };

        tx.commit()?;
        Ok(tracks)
    }

    /// Inserts the album after checking that its artist exists
    pub fn create_album(&mut self, payload: AlbumPayload) -> Result<Album, StorageError> {
        let now = db::now();
        let tx = self.db.transaction()?;

        if !artist_exists(&tx, payload.artist_id)? {
            return Err(StorageError::ArtistNotFound(payload.artist_id));
        }

        tx.execute(
            &format!(
                "INSERT INTO {ALBUMS} ({TITLE}, {ARTIST_ID}, {RELEASE_YEAR}, {CREATED_AT}, {UPDATED_AT}) \
                 VALUES (?1, ?2, ?3, ?4, ?4)"
            ),
            params![payload.title, payload.artist_id.0, payload.release_year, now],
        )?;
        let id = AlbumId(tx.last_insert_rowid());

        tx.commit()?;
        log::debug!("created album {id} for artist {}", payload.artist_id);

        Ok(Album {
            id,
            title: payload.title,
            artist_id: payload.artist_id,
            release_year: payload.release_year,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces every editable field of the album.
    ///
    /// A missing album is reported before a missing artist.
    pub fn update_album(
        &mut self,
        id: AlbumId,
        payload: AlbumPayload,
    ) -> Result<Album, StorageError> {
        let tx = self.db.transaction()?;

        if find_album(&tx, id)?.is_none() {
            return Err(StorageError::AlbumNotFound(id));
        }
        if !artist_exists(&tx, payload.artist_id)? {
            return Err(StorageError::ArtistNotFound(payload.artist_id));
        }

        tx.execute(
            &format!(
                "UPDATE {ALBUMS} SET {TITLE} = ?1, {ARTIST_ID} = ?2, {RELEASE_YEAR} = ?3, \
                 {UPDATED_AT} = ?4 WHERE {ID} = ?5"
            ),
            params![
                payload.title,
                payload.artist_id.0,
                payload.release_year,
                db::now(),
                id.0
            ],
        )?;
        let album = find_album(&tx, id)?.ok_or(StorageError::AlbumNotFound(id))?;

        tx.commit()?;
        Ok(album)
    }

    /// Removes the album together with its track list rows
    pub fn delete_album(&mut self, id: AlbumId) -> Result<(), StorageError> {
        let deleted = self.db.execute(
            &format!("DELETE FROM {ALBUMS} WHERE {ID} = ?1"),
            params![id.0],
        )?;
        if deleted == 0 {
            return Err(StorageError::AlbumNotFound(id));
        }
        log::debug!("deleted album {id}");
        Ok(())
    }
}
