use anyhow::anyhow;
use log::info;
use rouille::{Request, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    config::HttpConfig,
    domain::{
        album::Album,
        id::{AlbumId, ArtistId, SongId},
    },
    http::error::ApiError,
    storage::{error::StorageError, operations::Storage},
    validation::{validate_album, validate_artist, validate_attach, validate_song},
};

const SONG_ADDED: &str = "Song added to album successfully.";

pub struct HttpServer {
    storage: Arc<Mutex<Storage>>,
    pub config: HttpConfig,
}

impl HttpServer {
    pub fn new(storage: Storage, config: HttpConfig) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            config,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let prefix = self
            .config
            .path_prefix
            .as_deref()
            .map(|p| p.trim_end_matches('/'))
            .filter(|p| !p.is_empty());

        // remove_prefix asserts on the raw url, so a percent-encoded prefix must not reach it
        let result = match prefix {
            Some(prefix) if !request.raw_url().starts_with(prefix) => Err(Self::no_route(request)),
            Some(prefix) => match request.remove_prefix(prefix) {
                Some(inner) => self.route(&inner),
                None => Err(Self::no_route(request)),
            },
            None => self.route(request),
        };

        let response = result.unwrap_or_else(ApiError::into_response);
        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn no_route(request: &Request) -> ApiError {
        ApiError::NotFound(format!("no route for {} {}", request.method(), request.url()))
    }

    fn route(&self, request: &Request) -> Result<Response, ApiError> {
        rouille::router!(request,
            (GET) ["/artists"] => { self.list_artists() },
            (GET) ["/artists/{id}", id: i64] => { self.get_artist(ArtistId(id)) },
            (GET) ["/artists/{id}/albums", id: i64] => { self.albums_by_artist(ArtistId(id)) },
            (POST) ["/artists"] => { self.create_artist(request) },
            (PUT) ["/artists/{id}", id: i64] => { self.update_artist(ArtistId(id), request) },
            (DELETE) ["/artists/{id}", id: i64] => { self.delete_artist(ArtistId(id)) },

            (GET) ["/albums"] => { self.list_albums() },
            (GET) ["/albums/{id}", id: i64] => { self.get_album(AlbumId(id)) },
            (GET) ["/albums/{id}/songs", id: i64] => { self.songs_by_album(AlbumId(id)) },
            (POST) ["/albums"] => { self.create_album(request) },
            (PUT) ["/albums/{id}", id: i64] => { self.update_album(AlbumId(id), request) },
            (DELETE) ["/albums/{id}", id: i64] => { self.delete_album(AlbumId(id)) },

            (GET) ["/songs"] => { self.list_songs() },
            (GET) ["/songs/{id}", id: i64] => { self.get_song(SongId(id)) },
            (POST) ["/songs"] => { self.create_song(request) },
            (PUT) ["/songs/{id}", id: i64] => { self.update_song(SongId(id), request) },
            (DELETE) ["/songs/{id}", id: i64] => { self.delete_song(SongId(id)) },
            (POST) ["/songs/{id}/add-to-album", id: i64] => {
                self.attach_song_to_album(SongId(id), request)
            },

            _ => Err(Self::no_route(request))
        )
    }

    // --------------------------------------------------
    // Artists
    // --------------------------------------------------

    fn list_artists(&self) -> Result<Response, ApiError> {
        let artists = self.lock()?.list_artists()?;
        Ok(Response::json(&artists))
    }

    fn get_artist(&self, id: ArtistId) -> Result<Response, ApiError> {
        let artist = self.lock()?.get_artist(id)?;
        Ok(Response::json(&artist))
    }

    fn albums_by_artist(&self, id: ArtistId) -> Result<Response, ApiError> {
        let albums = self.lock()?.albums_by_artist(id)?;
        Ok(Response::json(&albums))
    }

    fn create_artist(&self, request: &Request) -> Result<Response, ApiError> {
        let payload = validate_artist(&Self::json_body(request)?)?;
        let artist = self.lock()?.create_artist(payload)?;
        Ok(Response::json(&artist).with_status_code(201))
    }

    fn update_artist(&self, id: ArtistId, request: &Request) -> Result<Response, ApiError> {
        let payload = validate_artist(&Self::json_body(request)?)?;
        let artist = self.lock()?.update_artist(id, payload)?;
        Ok(Response::json(&artist))
    }

    fn delete_artist(&self, id: ArtistId) -> Result<Response, ApiError> {
        self.lock()?.delete_artist(id)?;
        Ok(Response::empty_204())
    }

    // --------------------------------------------------
    // Albums
    // --------------------------------------------------

    fn list_albums(&self) -> Result<Response, ApiError> {
        let albums = self.lock()?.list_albums()?;
        Ok(Response::json(&albums))
    }

    fn get_album(&self, id: AlbumId) -> Result<Response, ApiError> {
        let album = self.lock()?.get_album(id)?;
        Ok(Response::json(&album))
    }

    fn songs_by_album(&self, id: AlbumId) -> Result<Response, ApiError> {
        let tracks = self.lock()?.songs_by_album(id)?;
        Ok(Response::json(&tracks))
    }

    fn create_album(&self, request: &Request) -> Result<Response, ApiError> {
        let payload = validate_album(&Self::json_body(request)?)?;
        let album = self.lock()?.create_album(payload)?;
        Ok(Response::json(&album).with_status_code(201))
    }

    fn update_album(&self, id: AlbumId, request: &Request) -> Result<Response, ApiError> {
        let payload = validate_album(&Self::json_body(request)?)?;
        let album = self.lock()?.update_album(id, payload)?;
        Ok(Response::json(&album))
    }

    fn delete_album(&self, id: AlbumId) -> Result<Response, ApiError> {
        self.lock()?.delete_album(id)?;
        Ok(Response::empty_204())
    }

    // --------------------------------------------------
    // Songs
    // --------------------------------------------------

    fn list_songs(&self) -> Result<Response, ApiError> {
        let songs = self.lock()?.list_songs()?;
        Ok(Response::json(&songs))
    }

    fn get_song(&self, id: SongId) -> Result<Response, ApiError> {
        let song = self.lock()?.get_song(id)?;
        Ok(Response::json(&song))
    }

    fn create_song(&self, request: &Request) -> Result<Response, ApiError> {
        let payload = validate_song(&Self::json_body(request)?)?;
        let song = self.lock()?.create_song(payload)?;
        Ok(Response::json(&song).with_status_code(201))
    }

    fn update_song(&self, id: SongId, request: &Request) -> Result<Response, ApiError> {
        let payload = validate_song(&Self::json_body(request)?)?;
        let song = self.lock()?.update_song(id, payload)?;
        Ok(Response::json(&song))
    }

    fn delete_song(&self, id: SongId) -> Result<Response, ApiError> {
        self.lock()?.delete_song(id)?;
        Ok(Response::empty_204())
    }

    fn attach_song_to_album(&self, id: SongId, request: &Request) -> Result<Response, ApiError> {
        let payload = validate_attach(&Self::json_body(request)?)?;
        let album = self.lock()?.attach_song_to_album(id, payload)?;
        Ok(Response::json(&AttachResponse {
            message: SONG_ADDED.to_string(),
            album,
        }))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Storage>, ApiError> {
        self.storage.lock().map_err(|e| {
            ApiError::from(StorageError::Internal(anyhow!(
                "Could not access catalog storage under lock: {e}"
            )))
        })
    }

    /// raw JSON body; shape checks are left to the validators
    fn json_body(request: &Request) -> Result<Value, ApiError> {
        rouille::input::json_input::<Value>(request)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
    }
}

#[derive(Serialize, Deserialize)]
struct AttachResponse {
    message: String,
    album: Album,
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
