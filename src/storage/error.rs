use thiserror::Error;

use crate::domain::id::{AlbumId, ArtistId, SongId};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("artist {0} not found")]
    ArtistNotFound(ArtistId),

    #[error("album {0} not found")]
    AlbumNotFound(AlbumId),

    #[error("song {0} not found")]
    SongNotFound(SongId),

    #[error("song {song} is already on album {album}")]
    AlreadyAttached { song: SongId, album: AlbumId },

    #[error("artist {artist} still owns {albums} album(s)")]
    ArtistHasAlbums { artist: ArtistId, albums: usize },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::ArtistNotFound(_)
                | StorageError::AlbumNotFound(_)
                | StorageError::SongNotFound(_)
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StorageError::AlreadyAttached { .. } | StorageError::ArtistHasAlbums { .. }
        )
    }
}
