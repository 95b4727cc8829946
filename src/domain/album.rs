use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    artist::Artist,
    id::{AlbumId, ArtistId},
    song::{AlbumSong, Song},
};

/// An album, always owned by exactly one artist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    pub artist_id: ArtistId,
    pub release_year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumWithArtist {
    #[serde(flatten)]
    pub album: Album,
    pub artist: Artist,
}

/// A song as it appears on one album's track list.
///
/// `pivot` carries the association row, so the track number travels with the song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumTrack {
    #[serde(flatten)]
    pub song: Song,
    pub pivot: AlbumSong,
}
