//! Domain types shared by every part of the engine
//!
//! Tracks, playlists, identities, per-user settings, and the session bundle
//! that is persisted for each identity.

use serde::{ Deserialize, Serialize };


/// Identifier of the distinguished guest identity.
pub const GUEST_ID: &str = "guest";

/// Volume a freshly initialised bundle starts with.
pub const DEFAULT_VOLUME: f32 = 0.5;

/// Background colour of a freshly initialised bundle.
pub const DEFAULT_BACKGROUND: &str = "#050505";

/// Selectable background presets (id, CSS value).
pub const BACKGROUND_PRESETS: &[( &str, &str )] = &[
    ( "deep", "#050505" ),
    ( "gradient-1", "linear-gradient(to bottom right, #050505, #0a1a0a)" ),
    ( "gradient-2", "linear-gradient(to bottom right, #000000, #1a0505)" ),
    ( "gradient-3", "linear-gradient(to bottom right, #000000, #051a1a)" ),
];


/// A single playable song with its preview locator.
///
/// Immutable once fetched; identity is `id`.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
#[serde( rename_all = "camelCase" )]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    #[serde( default )]
    pub cover_url: String,
    /// Preview locator; absent or expired locators fail at the transport.
    #[serde( default )]
    pub audio_url: Option<String>,
    #[serde( rename = "duration", default )]
    pub duration_seconds: f64,
}


/// A named, ordered, duplicate-free list of tracks.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
#[serde( rename_all = "camelCase" )]
pub struct Playlist {
    pub id: String,
    pub name: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub created_at: i64,
    #[serde( rename = "songs", default )]
    pub tracks: Vec<Track>,
}


impl Playlist {
    /// Returns true if a track with this id is already in the playlist.
    pub fn contains( &self, track_id: &str ) -> bool {
        self.tracks.iter().any( |t| t.id == track_id )
    }
}


/// Public profile of a user (never carries credentials).
#[derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize )]
#[serde( rename_all = "camelCase" )]
pub struct Identity {
    pub id: String,
    #[serde( rename = "username" )]
    pub display_name: String,
    #[serde( rename = "avatarUrl", default )]
    pub avatar_ref: Option<String>,
}


impl Identity {
    /// The anonymous session identity.
    pub fn guest() -> Self {
        Self {
            id: GUEST_ID.to_string(),
            display_name: "Guest".to_string(),
            avatar_ref: Some( avatar_url( GUEST_ID ) ),
        }
    }


    /// Returns true for the anonymous session identity.
    pub fn is_guest( &self ) -> bool {
        self.id == GUEST_ID
    }
}


/// Builds the generated avatar locator for a seed (usually the username).
pub fn avatar_url( seed: &str ) -> String {
    format!(
        "https://api.dicebear.com/7.x/avataaars/svg?seed={}",
        urlencoding::encode( seed )
    )
}


/// Colour scheme variant.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize )]
#[serde( rename_all = "kebab-case" )]
pub enum Theme {
    #[default]
    DeepNeon,
    LightNeon,
}


/// Interface language tag.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize )]
#[serde( rename_all = "lowercase" )]
pub enum Language {
    #[default]
    Az,
    En,
    Tr,
    Ru,
}


impl Language {
    /// Parses a two-letter language tag.
    pub fn from_tag( tag: &str ) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "az" => Some( Language::Az ),
            "en" => Some( Language::En ),
            "tr" => Some( Language::Tr ),
            "ru" => Some( Language::Ru ),
            _ => None,
        }
    }


    pub fn tag( &self ) -> &'static str {
        match self {
            Language::Az => "az",
            Language::En => "en",
            Language::Tr => "tr",
            Language::Ru => "ru",
        }
    }
}


/// Per-user preferences stored inside the bundle.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
#[serde( default )]
pub struct Settings {
    pub theme: Theme,
    pub language: Language,
    /// Output volume in `[0, 1]`.
    pub volume: f32,
    pub background: String,
}


impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            language: Language::default(),
            volume: DEFAULT_VOLUME,
            background: DEFAULT_BACKGROUND.to_string(),
        }
    }
}


/// Everything persisted for one identity.
#[derive( Debug, Clone, PartialEq, Serialize, Deserialize )]
#[serde( rename_all = "camelCase" )]
pub struct SessionBundle {
    #[serde( rename = "userId" )]
    pub owner_id: String,
    /// Favourites, unique by id, kept in insertion order for display.
    #[serde( default )]
    pub library: Vec<Track>,
    #[serde( default )]
    pub playlists: Vec<Playlist>,
    #[serde( default )]
    pub settings: Settings,
}


impl SessionBundle {
    /// Creates an empty bundle with default settings.
    pub fn empty( owner_id: impl Into<String> ) -> Self {
        Self {
            owner_id: owner_id.into(),
            library: Vec::new(),
            playlists: Vec::new(),
            settings: Settings::default(),
        }
    }


    /// Returns true if the track is in the library.
    pub fn in_library( &self, track_id: &str ) -> bool {
        self.library.iter().any( |t| t.id == track_id )
    }


    /// Looks up a playlist by id.
    pub fn playlist( &self, playlist_id: &str ) -> Option<&Playlist> {
        self.playlists.iter().find( |p| p.id == playlist_id )
    }
}


#[cfg( test )]
pub( crate ) mod fixtures {
    use super::Track;


    /// Builds a track with a preview locator derived from its id.
    pub fn track( id: &str ) -> Track {
        Track {
            id: id.to_string(),
            title: format!( "Title {}", id ),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            cover_url: String::new(),
            audio_url: Some( format!( "https://audio.test/{}.m4a", id ) ),
            duration_seconds: 30.0,
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_guest_identity() {
        let guest = Identity::guest();
        assert!( guest.is_guest() );
        assert_eq!( guest.display_name, "Guest" );
    }


    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!( settings.volume, 0.5 );
        assert_eq!( settings.theme, Theme::DeepNeon );
        assert_eq!( settings.language, Language::Az );
        assert_eq!( settings.background, "#050505" );
    }


    #[test]
    fn test_bundle_json_field_names() {
        let mut bundle = SessionBundle::empty( "user_1" );
        bundle.library.push( fixtures::track( "7" ) );
        let json = serde_json::to_value( &bundle ).unwrap();

        assert_eq!( json[ "userId" ], "user_1" );
        assert_eq!( json[ "library" ][ 0 ][ "audioUrl" ], "https://audio.test/7.m4a" );
        assert_eq!( json[ "library" ][ 0 ][ "duration" ], 30.0 );
        assert_eq!( json[ "settings" ][ "theme" ], "deep-neon" );
    }


    #[test]
    fn test_bundle_missing_sections_default() {
        let bundle: SessionBundle = serde_json::from_str( r#"{ "userId": "u" }"# ).unwrap();
        assert!( bundle.library.is_empty() );
        assert!( bundle.playlists.is_empty() );
        assert_eq!( bundle.settings.volume, 0.5 );
    }


    #[test]
    fn test_language_tags() {
        assert_eq!( Language::from_tag( "EN" ), Some( Language::En ) );
        assert_eq!( Language::from_tag( "xx" ), None );
        assert_eq!( Language::Ru.tag(), "ru" );
    }
}
