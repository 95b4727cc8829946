use std::collections::HashMap;

use rusqlite::{Connection, params};

use crate::{
    domain::{
        album::Album,
        artist::{Artist, ArtistWithAlbums},
        id::ArtistId,
    },
    storage::{
        db,
        error::StorageError,
        operations::{
            Storage, album_columns, album_from_row, artist_columns, artist_from_row,
            artist_exists, find_artist,
        },
        schema::{columns::*, tables::*},
    },
    validation::ArtistPayload,
};

impl Storage {
    /// All artists, each with the albums it owns
    pub fn list_artists(&mut self) -> Result<Vec<ArtistWithAlbums>, StorageError> {
        let tx = self.db.transaction()?;

        let (artists, albums) = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM {ARTISTS} a ORDER BY a.{ID}",
                artist_columns("a")
            ))?;
            let artists = stmt
                .query_map([], |row| artist_from_row(row, 0))?
                .collect::<Result<Vec<_>, _>>()?;

            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM {ALBUMS} al ORDER BY al.{ID}",
                album_columns("al")
            ))?;
            let albums = stmt
                .query_map([], |row| album_from_row(row, 0))?
                .collect::<Result<Vec<_>, _>>()?;

            (artists, albums)
        };

        tx.commit()?;

        let mut by_artist: HashMap<ArtistId, Vec<Album>> = HashMap::new();
        for album in albums {
            by_artist.entry(album.artist_id).or_default().push(album);
        }

        Ok(artists
            .into_iter()
            .map(|artist| ArtistWithAlbums {
                albums: by_artist.remove(&artist.id).unwrap_or_default(),
                artist,
            })
            .collect())
    }

    pub fn get_artist(&mut self, id: ArtistId) -> Result<ArtistWithAlbums, StorageError> {
        let tx = self.db.transaction()?;

        let artist = find_artist(&tx, id)?.ok_or(StorageError::ArtistNotFound(id))?;
        let albums = albums_of(&tx, id)?;

        tx.commit()?;
        Ok(ArtistWithAlbums { artist, albums })
    }

    /// Albums owned by the artist, fails if the artist does not exist
    pub fn albums_by_artist(&mut self, id: ArtistId) -> Result<Vec<Album>, StorageError> {
        let tx = self.db.transaction()?;

        if !artist_exists(&tx, id)? {
            return Err(StorageError::ArtistNotFound(id));
        }
        let albums = albums_of(&tx, id)?;

        tx.commit()?;
        Ok(albums)
    }

    pub fn create_artist(&mut self, payload: ArtistPayload) -> Result<Artist, StorageError> {
        let now = db::now();

        self.db.execute(
            &format!(
                "INSERT INTO {ARTISTS} ({NAME}, {CREATED_AT}, {UPDATED_AT}) VALUES (?1, ?2, ?2)"
            ),
            params![payload.name, now],
        )?;
        let id = ArtistId(self.db.last_insert_rowid());
        log::debug!("created artist {id}");

        Ok(Artist {
            id,
            name: payload.name,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the artist's editable fields
    pub fn update_artist(
        &mut self,
        id: ArtistId,
        payload: ArtistPayload,
    ) -> Result<Artist, StorageError> {
        let tx = self.db.transaction()?;

        let changed = tx.execute(
            &format!("UPDATE {ARTISTS} SET {NAME} = ?1, {UPDATED_AT} = ?2 WHERE {ID} = ?3"),
            params![payload.name, db::now(), id.0],
        )?;
        if changed == 0 {
            return Err(StorageError::ArtistNotFound(id));
        }
        let artist = find_artist(&tx, id)?.ok_or(StorageError::ArtistNotFound(id))?;

        tx.commit()?;
        Ok(artist)
    }

    /// Removes the artist.
    ///
    /// An artist that still owns albums is kept and `ArtistHasAlbums` is returned.
    pub fn delete_artist(&mut self, id: ArtistId) -> Result<(), StorageError> {
        let tx = self.db.transaction()?;

        if !artist_exists(&tx, id)? {
            return Err(StorageError::ArtistNotFound(id));
        }

        let albums: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM {ALBUMS} WHERE {ARTIST_ID} = ?1"),
            params![id.0],
            |row| row.get(0),
        )?;
        if albums > 0 {
            return Err(StorageError::ArtistHasAlbums {
                artist: id,
                albums: albums as usize,
            });
        }

        tx.execute(
            &format!("DELETE FROM {ARTISTS} WHERE {ID} = ?1"),
            params![id.0],
        )?;

        tx.commit()?;
        log::debug!("deleted artist {id}");
        Ok(())
    }
}

fn albums_of(conn: &Connection, id: ArtistId) -> rusqlite::Result<Vec<Album>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {ALBUMS} al WHERE al.{ARTIST_ID} = ?1 ORDER BY al.{ID}",
        album_columns("al")
    ))?;
    let albums = stmt
        .query_map(params![id.0], |row| album_from_row(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(albums)
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::id::ArtistId,
        storage::{
            error::StorageError,
            operations::tests::{album, artist, backdate, setup_storage},
            schema::tables::ARTISTS,
        },
    };

    #[test]
    fn test_create_then_get_artist() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let created = storage.create_artist(artist("The Beatles"))?;
        assert_eq!(created.id, ArtistId(1));

        let fetched = storage.get_artist(created.id)?;
        assert_eq!(fetched.artist, created);
        assert!(fetched.albums.is_empty());

        Ok(())
    }

    #[test]
    fn test_list_artists_empty_store() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;
        assert!(storage.list_artists()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_list_artists_includes_their_albums() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let beatles = storage.create_artist(artist("The Beatles"))?;
        let stones = storage.create_artist(artist("The Rolling Stones"))?;
        storage.create_album(album("Abbey Road", beatles.id, 1969))?;
        storage.create_album(album("Sticky Fingers", stones.id, 1971))?;
        storage.create_album(album("Let It Be", beatles.id, 1970))?;

        let artists = storage.list_artists()?;
        assert_eq!(artists.len(), 2);

        let titles = |i: usize| {
            artists[i]
                .albums
                .iter()
                .map(|a| a.title.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(artists[0].artist.name, "The Beatles");
        assert_eq!(titles(0), vec!["Abbey Road", "Let It Be"]);
        assert_eq!(titles(1), vec!["Sticky Fingers"]);

        Ok(())
    }

    #[test]
    fn test_update_artist_replaces_name() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let created = storage.create_artist(artist("Beatles"))?;
        let past = backdate(&storage, ARTISTS, created.id.0)?;
        let updated = storage.update_artist(created.id, artist("The Beatles"))?;

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "The Beatles");
        assert_eq!(updated.created_at, past);
        assert!(updated.updated_at > past);
        assert_eq!(storage.get_artist(created.id)?.artist.name, "The Beatles");

        Ok(())
    }

    #[test]
    fn test_update_missing_artist() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let err = storage
            .update_artist(ArtistId(42), artist("Nobody"))
            .unwrap_err();
        assert!(matches!(err, StorageError::ArtistNotFound(ArtistId(42))));

        Ok(())
    }

    #[test]
    fn test_delete_artist() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let created = storage.create_artist(artist("Nico"))?;
        storage.delete_artist(created.id)?;

        let err = storage.get_artist(created.id).unwrap_err();
        assert!(matches!(err, StorageError::ArtistNotFound(..)));

        let err = storage.delete_artist(created.id).unwrap_err();
        assert!(matches!(err, StorageError::ArtistNotFound(..)));

        Ok(())
    }

    #[test]
    fn test_delete_artist_with_albums_is_restricted() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let beatles = storage.create_artist(artist("The Beatles"))?;
        storage.create_album(album("Abbey Road", beatles.id, 1969))?;

        let err = storage.delete_artist(beatles.id).unwrap_err();
        assert!(matches!(
            err,
            StorageError::ArtistHasAlbums { albums: 1, .. }
        ));

        let still_there = storage.get_artist(beatles.id)?;
        assert_eq!(still_there.albums.len(), 1);

        Ok(())
    }

    #[test]
    fn test_ids_are_not_reused() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let first = storage.create_artist(artist("First"))?;
        storage.delete_artist(first.id)?;
        let second = storage.create_artist(artist("Second"))?;

        assert_ne!(first.id, second.id);

        Ok(())
    }

    #[test]
    fn test_albums_by_artist() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let beatles = storage.create_artist(artist("The Beatles"))?;
        let nico = storage.create_artist(artist("Nico"))?;
        storage.create_album(album("Abbey Road", beatles.id, 1969))?;

        assert_eq!(storage.albums_by_artist(beatles.id)?.len(), 1);
        assert!(storage.albums_by_artist(nico.id)?.is_empty());

        let err = storage.albums_by_artist(ArtistId(99)).unwrap_err();
        assert!(err.is_not_found());

        Ok(())
    }
}
