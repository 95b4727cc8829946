mod albums;
mod artists;
mod association;
pub mod db;
pub mod error;
pub mod operations;
pub(crate) mod schema;
mod songs;
