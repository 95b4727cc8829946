use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    album::Album,
    id::{AlbumId, SongId},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Association row linking a song to an album.
///
/// At most one row exists per (album, song) pair.
/// Track numbers are neither unique nor contiguous within an album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSong {
    pub album_id: AlbumId,
    pub song_id: SongId,
    pub track_number: u32,
}

/// Album seen from a song, with the association row attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongAlbum {
    #[serde(flatten)]
    pub album: Album,
    pub pivot: AlbumSong,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongWithAlbums {
    #[serde(flatten)]
    pub song: Song,
    pub albums: Vec<SongAlbum>,
}
