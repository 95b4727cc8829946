pub mod album;
pub mod artist;
pub mod id;
pub mod song;
