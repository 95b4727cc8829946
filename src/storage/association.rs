//! Attaching songs to albums.
//!
//! The existence checks and the insert share one transaction, so a song or
//! album deleted concurrently can never leave a dangling association row.

use rusqlite::params;

use crate::{
    domain::{album::Album, id::SongId},
    storage::{
        db,
        error::StorageError,
        operations::{Storage, find_album, find_song},
        schema::{columns::*, tables::*},
    },
    validation::AttachPayload,
};

impl Storage {
    /// Puts the song on the album under the given track number.
    ///
    /// A song can be on an album only once: attaching it again fails with
    /// `AlreadyAttached` and keeps the existing track number.
    pub fn attach_song_to_album(
        &mut self,
        song_id: SongId,
        payload: AttachPayload,
    ) -> Result<Album, StorageError> {
        let album_id = payload.album_id;
        let tx = self.db.transaction()?;

        if find_song(&tx, song_id)?.is_none() {
            return Err(StorageError::SongNotFound(song_id));
        }
        let album = find_album(&tx, album_id)?.ok_or(StorageError::AlbumNotFound(album_id))?;

        let attached: bool = tx.query_row(
            &format!(
                "SELECT EXISTS (SELECT 1 FROM {ALBUM_SONG} WHERE {ALBUM_ID} = ?1 AND {SONG_ID} = ?2)"
            ),
            params![album_id.0, song_id.0],
            |row| row.get(0),
        )?;
        if attached {
            return Err(StorageError::AlreadyAttached {
                song: song_id,
                album: album_id,
            });
        }

        tx.execute(
            &format!(
                "INSERT INTO {ALBUM_SONG} ({ALBUM_ID}, {SONG_ID}, {TRACK_NUMBER}, {CREATED_AT}, {UPDATED_AT}) \
                 VALUES (?1, ?2, ?3, ?4, ?4)"
            ),
            params![album_id.0, song_id.0, payload.track_number, db::now()],
        )?;

        tx.commit()?;
        log::info!(
            "attached song {song_id} to album {album_id} as track {}",
            payload.track_number
        );

        Ok(album)
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::params;

    use crate::{
        domain::id::{AlbumId, SongId},
        storage::{
            error::StorageError,
            operations::{
                Storage,
                tests::{album, artist, setup_storage, song},
            },
            schema::*,
        },
        validation::AttachPayload,
    };

    fn track_rows(storage: &Storage) -> Vec<(i64, i64, u32)> {
        storage
            .db
            .prepare(&format!(
                "SELECT {ALBUM_ID}, {SONG_ID}, {TRACK_NUMBER} FROM {ALBUM_SONG}"
            ))
            .unwrap()
            .query_map(params![], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    fn attach(album_id: AlbumId, track_number: u32) -> AttachPayload {
        AttachPayload {
            album_id,
            track_number,
        }
    }

    #[test]
    fn test_attach_creates_one_row() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let beatles = storage.create_artist(artist("The Beatles"))?;
        let abbey_road = storage.create_album(album("Abbey Road", beatles.id, 1969))?;
        let come_together = storage.create_song(song("Come Together"))?;

        let returned = storage.attach_song_to_album(come_together.id, attach(abbey_road.id, 1))?;

        assert_eq!(returned, abbey_road);
        assert_eq!(track_rows(&storage), vec![(1, 1, 1)]);

        Ok(())
    }

    #[test]
    fn test_attach_twice_is_rejected() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let beatles = storage.create_artist(artist("The Beatles"))?;
        let abbey_road = storage.create_album(album("Abbey Road", beatles.id, 1969))?;
        let come_together = storage.create_song(song("Come Together"))?;

        storage.attach_song_to_album(come_together.id, attach(abbey_road.id, 1))?;

        // same pair, same or different track number: both refused
        for track_number in [1, 5] {
            let err = storage
                .attach_song_to_album(come_together.id, attach(abbey_road.id, track_number))
                .unwrap_err();
            assert!(matches!(err, StorageError::AlreadyAttached { .. }));
            assert!(err.is_conflict());
        }

        assert_eq!(track_rows(&storage), vec![(1, 1, 1)]);

        Ok(())
    }

    #[test]
    fn test_song_can_be_on_many_albums_and_track_numbers_may_repeat() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let beatles = storage.create_artist(artist("The Beatles"))?;
        let abbey_road = storage.create_album(album("Abbey Road", beatles.id, 1969))?;
        let one = storage.create_album(album("1", beatles.id, 2000))?;
        let come_together = storage.create_song(song("Come Together"))?;
        let something = storage.create_song(song("Something"))?;

        storage.attach_song_to_album(come_together.id, attach(abbey_road.id, 1))?;
        storage.attach_song_to_album(come_together.id, attach(one.id, 26))?;
        storage.attach_song_to_album(something.id, attach(abbey_road.id, 1))?;

        assert_eq!(track_rows(&storage).len(), 3);
        assert_eq!(storage.songs_by_album(abbey_road.id)?.len(), 2);

        Ok(())
    }

    #[test]
    fn test_attach_missing_song_or_album_creates_nothing() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let beatles = storage.create_artist(artist("The Beatles"))?;
        let abbey_road = storage.create_album(album("Abbey Road", beatles.id, 1969))?;
        let come_together = storage.create_song(song("Come Together"))?;

        let err = storage
            .attach_song_to_album(SongId(77), attach(abbey_road.id, 1))
            .unwrap_err();
        assert!(matches!(err, StorageError::SongNotFound(SongId(77))));

        let err = storage
            .attach_song_to_album(come_together.id, attach(AlbumId(88), 1))
            .unwrap_err();
        assert!(matches!(err, StorageError::AlbumNotFound(AlbumId(88))));

        assert!(track_rows(&storage).is_empty());

        Ok(())
    }

    #[test]
    fn test_missing_song_reported_before_missing_album() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let err = storage
            .attach_song_to_album(SongId(1), attach(AlbumId(1), 1))
            .unwrap_err();
        assert!(matches!(err, StorageError::SongNotFound(..)));

        Ok(())
    }
}
