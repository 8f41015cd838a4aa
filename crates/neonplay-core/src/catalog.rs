//! Metadata catalog client
//!
//! Free-text song search against an iTunes-style search endpoint. The
//! provider is a black box: one GET per query, JSON back, mapped to [`Track`].

use std::time::Duration;

use serde::{ Deserialize, Serialize };
use thiserror::Error;

use crate::model::Track;


const DEFAULT_BASE_URL: &str = "https://itunes.apple.com";
const USER_AGENT: &str = concat!( "neonplay/", env!( "CARGO_PKG_VERSION" ) );


/// Errors from a catalog request.
#[derive( Debug, Error )]
pub enum CatalogError {
    #[error( "Empty search query" )]
    EmptyQuery,

    #[error( "Network error: {0}" )]
    Network( String ),

    #[error( "Catalog returned status {0}" )]
    Status( u16 ),

    #[error( "Parse error: {0}" )]
    Parse( String ),
}


/// Catalog settings.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
#[serde( default )]
pub struct CatalogConfig {
    pub base_url: String,
    /// Maximum results per query
    pub limit: u32,
    /// Edge length requested for cover art, in pixels
    pub artwork_size: u32,
    pub timeout_secs: u64,
}


impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            limit: 40,
            artwork_size: 600,
            timeout_secs: 15,
        }
    }
}


#[derive( Debug, Deserialize )]
#[serde( rename_all = "camelCase" )]
struct SearchResponse {
    #[serde( default )]
    results: Vec<SearchResult>,
}


#[derive( Debug, Deserialize )]
#[serde( rename_all = "camelCase" )]
struct SearchResult {
    track_id: Option<u64>,
    track_name: Option<String>,
    artist_name: Option<String>,
    collection_name: Option<String>,
    artwork_url100: Option<String>,
    preview_url: Option<String>,
    track_time_millis: Option<u64>,
}


impl SearchResult {
    fn into_track( self, artwork_size: u32 ) -> Option<Track> {
        let id = self.track_id?;
        let size = format!( "{0}x{0}", artwork_size );
        Some( Track {
            id: id.to_string(),
            title: self.track_name.unwrap_or_default(),
            artist: self.artist_name.unwrap_or_default(),
            album: self.collection_name.unwrap_or_default(),
            cover_url: self.artwork_url100
                .map( |url| url.replace( "100x100", &size ) )
                .unwrap_or_default(),
            audio_url: self.preview_url.filter( |url| !url.is_empty() ),
            duration_seconds: self.track_time_millis.unwrap_or( 0 ) as f64 / 1000.0,
        })
    }
}


/// Parses a search response body into tracks, skipping entries without an id.
pub fn parse_results( body: &str, artwork_size: u32 ) -> Result<Vec<Track>, CatalogError> {
    let response: SearchResponse = serde_json::from_str( body )
        .map_err( |e| CatalogError::Parse( e.to_string() ) )?;
    Ok( response.results
        .into_iter()
        .filter_map( |r| r.into_track( artwork_size ) )
        .collect() )
}


/// Async catalog client.
#[derive( Debug, Clone )]
pub struct Catalog {
    http: reqwest::Client,
    config: CatalogConfig,
}


impl Catalog {
    pub fn new( config: CatalogConfig ) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .user_agent( USER_AGENT )
            .timeout( Duration::from_secs( config.timeout_secs ) )
            .build()
            .map_err( |e| CatalogError::Network( e.to_string() ) )?;
        Ok( Self { http, config } )
    }


    pub fn config( &self ) -> &CatalogConfig {
        &self.config
    }


    /// Full request URL for a query.
    pub fn search_url( &self, query: &str ) -> String {
        format!(
            "{}/search?term={}&media=music&entity=song&limit={}",
            self.config.base_url.trim_end_matches( '/' ),
            urlencoding::encode( query.trim() ),
            self.config.limit
        )
    }


    /// Searches for songs matching `query`.
    pub async fn search( &self, query: &str ) -> Result<Vec<Track>, CatalogError> {
        if query.trim().is_empty() {
            return Err( CatalogError::EmptyQuery );
        }

        let url = self.search_url( query );
        tracing::debug!( url = %url, "Querying catalog" );

        let response = self.http
            .get( &url )
            .send()
            .await
            .map_err( |e| CatalogError::Network( e.to_string() ) )?;

        let status = response.status();
        if !status.is_success() {
            return Err( CatalogError::Status( status.as_u16() ) );
        }

        let body = response
            .text()
            .await
            .map_err( |e| CatalogError::Network( e.to_string() ) )?;
        let tracks = parse_results( &body, self.config.artwork_size )?;

        tracing::info!( query = %query.trim(), count = tracks.len(), "Catalog search complete" );
        Ok( tracks )
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    const BODY: &str = r#"{
        "resultCount": 3,
        "results": [
            {
                "trackId": 1440818839,
                "trackName": "Blinding Lights",
                "artistName": "The Weeknd",
                "collectionName": "After Hours",
                "artworkUrl100": "https://is1.test/image/100x100bb.jpg",
                "previewUrl": "https://audio.test/preview.m4a",
                "trackTimeMillis": 200040
            },
            {
                "trackName": "No id",
                "artistName": "Nobody"
            },
            {
                "trackId": 7,
                "trackName": "No preview",
                "artistName": "Someone",
                "previewUrl": null
            }
        ]
    }"#;


    #[test]
    fn test_parse_maps_fields() {
        let tracks = parse_results( BODY, 600 ).unwrap();
        assert_eq!( tracks.len(), 2 );

        let track = &tracks[ 0 ];
        assert_eq!( track.id, "1440818839" );
        assert_eq!( track.title, "Blinding Lights" );
        assert_eq!( track.album, "After Hours" );
        assert_eq!( track.cover_url, "https://is1.test/image/600x600bb.jpg" );
        assert_eq!( track.audio_url.as_deref(), Some( "https://audio.test/preview.m4a" ) );
        assert_eq!( track.duration_seconds, 200.04 );
    }


    #[test]
    fn test_parse_keeps_tracks_without_preview() {
        let tracks = parse_results( BODY, 600 ).unwrap();
        assert_eq!( tracks[ 1 ].audio_url, None );
        assert_eq!( tracks[ 1 ].duration_seconds, 0.0 );
    }


    #[test]
    fn test_parse_rejects_malformed_body() {
        assert!( matches!( parse_results( "<html>", 600 ), Err( CatalogError::Parse( _ ) ) ) );
        assert!( parse_results( "{}", 600 ).unwrap().is_empty() );
    }


    #[test]
    fn test_search_url_encodes_query() {
        let catalog = Catalog::new( CatalogConfig::default() ).unwrap();
        assert_eq!(
            catalog.search_url( " Daft Punk " ),
            "https://itunes.apple.com/search?term=Daft%20Punk&media=music&entity=song&limit=40"
        );
    }


    #[tokio::test]
    async fn test_blank_query_rejected_without_request() {
        let config = CatalogConfig { base_url: "http://127.0.0.1:9".into(), ..Default::default() };
        let catalog = Catalog::new( config ).unwrap();
        assert!( matches!( catalog.search( "   " ).await, Err( CatalogError::EmptyQuery ) ) );
    }
}
