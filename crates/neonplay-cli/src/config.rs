//! Application config
//!
//! App-wide options: where the catalog lives, what the home feed searches
//! for, and which audio backend plays. Per-user preferences live in the
//! session bundle instead.

use std::fs;
use std::path::{ Path, PathBuf };

use neonplay_core::{ CatalogConfig, DEFAULT_HOME_QUERIES };
use serde::{ Deserialize, Serialize };


/// Audio backend selection.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize )]
#[serde( rename_all = "lowercase" )]
pub enum BackendKind {
    /// Stream previews to the sound card
    #[default]
    Stream,
    /// Clock-driven playback with no audio
    Simulated,
}


/// Application config.
#[derive( Debug, Clone, Serialize, Deserialize )]
#[serde( default )]
pub struct Config {
    pub catalog: CatalogConfig,

    /// Queries the home feed picks from at random
    pub home_queries: Vec<String>,

    /// Drop catalog replies that arrive after a newer request was issued
    pub discard_stale_responses: bool,

    pub backend: BackendKind,

    /// Download timeout for preview audio, in seconds
    pub audio_timeout_secs: u64,
}


impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            home_queries: DEFAULT_HOME_QUERIES.iter().map( |q| q.to_string() ).collect(),
            discard_stale_responses: true,
            backend: BackendKind::default(),
            audio_timeout_secs: 20,
        }
    }
}


impl Config {
    /// Returns the default path of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map( |p| p.join( "neonplay" ).join( "config.json" ) )
    }


    /// Loads config from `path`, or returns defaults if missing or unreadable.
    pub fn load( path: Option<&Path> ) -> Self {
        let path = match path.map( Path::to_path_buf ).or_else( Self::default_path ) {
            Some( p ) => p,
            None => return Self::default(),
        };

        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string( &path ) {
            Ok( contents ) => serde_json::from_str( &contents ).unwrap_or_else( |e| {
                tracing::warn!( "Ignoring invalid config {}: {}", path.display(), e );
                Self::default()
            }),
            Err( e ) => {
                tracing::warn!( "Failed to read config: {}", e );
                Self::default()
            }
        }
    }


    /// Saves config to `path` as pretty JSON.
    pub fn save( &self, path: &Path ) {
        // Create parent directory if needed
        if let Some( parent ) = path.parent() {
            if !parent.exists() {
                if let Err( e ) = fs::create_dir_all( parent ) {
                    tracing::warn!( "Failed to create config directory: {}", e );
                    return;
                }
            }
        }

        match serde_json::to_string_pretty( self ) {
            Ok( json ) => {
                if let Err( e ) = fs::write( path, json ) {
                    tracing::warn!( "Failed to save config: {}", e );
                }
            }
            Err( e ) => {
                tracing::warn!( "Failed to serialize config: {}", e );
            }
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = serde_json::from_str( r#"{ "backend": "simulated" }"# ).unwrap();
        assert_eq!( config.backend, BackendKind::Simulated );
        assert_eq!( config.catalog.limit, 40 );
        assert!( config.discard_stale_responses );
        assert_eq!( config.home_queries.len(), 8 );
    }


    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load( Some( Path::new( "/nonexistent/neonplay/config.json" ) ) );
        assert_eq!( config.catalog.artwork_size, 600 );
    }
}
