//! Library and playlist mutations
//!
//! Operations on a [`SessionBundle`] that keep the collection invariants:
//! the library is unique by track id, and a track appears at most once per
//! playlist, in insertion order. Persisting and view consistency are the
//! engine's concern.

use chrono::Utc;
use thiserror::Error;

use crate::model::{ Playlist, SessionBundle, Track };


/// Errors from collection operations.
#[derive( Debug, Error, PartialEq, Eq )]
pub enum CollectionError {
    #[error( "Playlist name cannot be empty" )]
    EmptyName,

    #[error( "No active session" )]
    NoSession,
}


impl SessionBundle {
    /// Adds the track to the library if absent, removes it if present.
    ///
    /// Returns true if the track is in the library afterwards.
    pub fn toggle_favorite( &mut self, track: &Track ) -> bool {
        if let Some( pos ) = self.library.iter().position( |t| t.id == track.id ) {
            self.library.remove( pos );
            false
        } else {
            self.library.push( track.clone() );
            true
        }
    }


    /// Appends a new empty playlist and returns its id.
    pub fn create_playlist( &mut self, name: &str ) -> Result<String, CollectionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err( CollectionError::EmptyName );
        }

        let id = uuid::Uuid::new_v4().simple().to_string();
        self.playlists.push( Playlist {
            id: id.clone(),
            name: name.to_string(),
            created_at: Utc::now().timestamp_millis(),
            tracks: Vec::new(),
        });
        Ok( id )
    }


    /// Removes a playlist. Returns false if no playlist has this id.
    pub fn delete_playlist( &mut self, playlist_id: &str ) -> bool {
        let before = self.playlists.len();
        self.playlists.retain( |p| p.id != playlist_id );
        self.playlists.len() != before
    }


    /// Appends the track unless the playlist already holds its id.
    ///
    /// Returns true if the playlist changed.
    pub fn add_track_to_playlist( &mut self, playlist_id: &str, track: &Track ) -> bool {
        match self.playlists.iter_mut().find( |p| p.id == playlist_id ) {
            Some( playlist ) if !playlist.contains( &track.id ) => {
                playlist.tracks.push( track.clone() );
                true
            }
            _ => false,
        }
    }


    /// Removes the track with `track_id` from the playlist.
    ///
    /// Returns true if the playlist changed.
    pub fn remove_track_from_playlist( &mut self, playlist_id: &str, track_id: &str ) -> bool {
        match self.playlists.iter_mut().find( |p| p.id == playlist_id ) {
            Some( playlist ) => {
                let before = playlist.tracks.len();
                playlist.tracks.retain( |t| t.id != track_id );
                playlist.tracks.len() != before
            }
            None => false,
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::model::fixtures::track;


    fn library_ids( bundle: &SessionBundle ) -> Vec<String> {
        bundle.library.iter().map( |t| t.id.clone() ).collect()
    }


    #[test]
    fn test_toggle_favorite_twice_restores_library() {
        let mut bundle = SessionBundle::empty( "u" );
        bundle.toggle_favorite( &track( "1" ) );
        let before = library_ids( &bundle );

        assert!( bundle.toggle_favorite( &track( "2" ) ) );
        assert!( !bundle.toggle_favorite( &track( "2" ) ) );
        assert_eq!( library_ids( &bundle ), before );
    }


    #[test]
    fn test_toggle_favorite_matches_by_id() {
        let mut bundle = SessionBundle::empty( "u" );
        bundle.toggle_favorite( &track( "1" ) );

        let mut renamed = track( "1" );
        renamed.title = "Different title".to_string();
        assert!( !bundle.toggle_favorite( &renamed ) );
        assert!( bundle.library.is_empty() );
    }


    #[test]
    fn test_create_playlist_rejects_blank_name() {
        let mut bundle = SessionBundle::empty( "u" );
        assert_eq!( bundle.create_playlist( "   " ), Err( CollectionError::EmptyName ) );
        assert!( bundle.playlists.is_empty() );
    }


    #[test]
    fn test_create_playlist_generates_unique_ids() {
        let mut bundle = SessionBundle::empty( "u" );
        let a = bundle.create_playlist( "Dance" ).unwrap();
        let b = bundle.create_playlist( "Dance" ).unwrap();

        assert_ne!( a, b );
        assert_eq!( bundle.playlists.len(), 2 );
        assert!( bundle.playlists[ 0 ].tracks.is_empty() );
        assert_eq!( bundle.playlists[ 1 ].name, "Dance" );
    }


    #[test]
    fn test_add_track_is_idempotent() {
        let mut bundle = SessionBundle::empty( "u" );
        let id = bundle.create_playlist( "Mix" ).unwrap();

        assert!( bundle.add_track_to_playlist( &id, &track( "1" ) ) );
        let once = bundle.playlist( &id ).unwrap().tracks.clone();
        assert!( !bundle.add_track_to_playlist( &id, &track( "1" ) ) );
        assert_eq!( bundle.playlist( &id ).unwrap().tracks, once );
    }


    #[test]
    fn test_remove_after_add_restores_playlist() {
        let mut bundle = SessionBundle::empty( "u" );
        let id = bundle.create_playlist( "Mix" ).unwrap();
        bundle.add_track_to_playlist( &id, &track( "1" ) );
        let before = bundle.playlist( &id ).unwrap().tracks.clone();

        bundle.add_track_to_playlist( &id, &track( "2" ) );
        assert!( bundle.remove_track_from_playlist( &id, "2" ) );
        assert_eq!( bundle.playlist( &id ).unwrap().tracks, before );
    }


    #[test]
    fn test_insertion_order_is_kept() {
        let mut bundle = SessionBundle::empty( "u" );
        let id = bundle.create_playlist( "Mix" ).unwrap();
        for t in [ "3", "1", "2" ] {
            bundle.add_track_to_playlist( &id, &track( t ) );
        }

        let ids: Vec<_> = bundle.playlist( &id ).unwrap().tracks.iter().map( |t| t.id.as_str() ).collect();
        assert_eq!( ids, vec![ "3", "1", "2" ] );
    }


    #[test]
    fn test_unknown_playlist_is_noop() {
        let mut bundle = SessionBundle::empty( "u" );
        assert!( !bundle.add_track_to_playlist( "missing", &track( "1" ) ) );
        assert!( !bundle.remove_track_from_playlist( "missing", "1" ) );
        assert!( !bundle.delete_playlist( "missing" ) );
    }
}
