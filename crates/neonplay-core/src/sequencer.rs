//! Playback sequencing
//!
//! Decides what plays after the active track ends, from whichever browsing
//! context is current at that moment. No wraparound, no repeat.

use crate::model::{ SessionBundle, Track };


/// Browsing context.
#[derive( Debug, Clone, PartialEq, Eq, Default )]
pub enum View {
    #[default]
    Home,
    Search,
    Library,
    Playlists,
    /// An open playlist, by id. The tracks are always read from the live bundle.
    PlaylistDetail( String ),
    Settings,
}


impl View {
    pub fn label( &self ) -> &'static str {
        match self {
            View::Home => "Home",
            View::Search => "Search",
            View::Library => "Library",
            View::Playlists | View::PlaylistDetail( _ ) => "Playlists",
            View::Settings => "Settings",
        }
    }


    /// Id of the open playlist, if any.
    pub fn open_playlist( &self ) -> Option<&str> {
        match self {
            View::PlaylistDetail( id ) => Some( id ),
            _ => None,
        }
    }
}


/// Outcome of end-of-track resolution.
#[derive( Debug, Clone, PartialEq )]
pub enum Advance {
    /// Play this track next.
    Play( Track ),
    /// Active track was last or is not in the list; playback stops.
    Stop,
    /// Nothing to decide: empty list or no active track.
    Nothing,
}


/// The ordered track list a view implies.
///
/// Views without a list of their own fall back to the home feed.
pub fn context_tracks<'a>(
    view: &View,
    home: &'a [Track],
    results: &'a [Track],
    bundle: Option<&'a SessionBundle>,
) -> &'a [Track] {
    match view {
        View::Search => results,
        View::Library => bundle.map_or( &[], |b| b.library.as_slice() ),
        View::PlaylistDetail( id ) => bundle
            .and_then( |b| b.playlist( id ) )
            .map_or( &[], |p| p.tracks.as_slice() ),
        View::Home | View::Playlists | View::Settings => home,
    }
}


/// Resolves the successor of `active` in `list`.
pub fn next_after( list: &[Track], active: Option<&Track> ) -> Advance {
    let Some( active ) = active else {
        return Advance::Nothing;
    };
    if list.is_empty() {
        return Advance::Nothing;
    }

    match list.iter().position( |t| t.id == active.id ) {
        Some( index ) => list.get( index + 1 ).cloned().map_or( Advance::Stop, Advance::Play ),
        None => Advance::Stop,
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::model::fixtures::track;


    fn abc() -> Vec<Track> {
        vec![ track( "a" ), track( "b" ), track( "c" ) ]
    }


    #[test]
    fn test_successor_is_next_in_order() {
        assert_eq!( next_after( &abc(), Some( &track( "b" ) ) ), Advance::Play( track( "c" ) ) );
    }


    #[test]
    fn test_last_track_stops() {
        assert_eq!( next_after( &abc(), Some( &track( "c" ) ) ), Advance::Stop );
    }


    #[test]
    fn test_missing_active_track_stops() {
        assert_eq!( next_after( &abc(), Some( &track( "z" ) ) ), Advance::Stop );
    }


    #[test]
    fn test_empty_list_or_no_active_is_noop() {
        assert_eq!( next_after( &[], Some( &track( "a" ) ) ), Advance::Nothing );
        assert_eq!( next_after( &abc(), None ), Advance::Nothing );
    }


    #[test]
    fn test_context_lists() {
        let mut bundle = SessionBundle::empty( "u1" );
        bundle.library.push( track( "lib" ) );
        let home = vec![ track( "h" ) ];
        let results = vec![ track( "r" ) ];

        let ids = |view: View| -> Vec<String> {
            context_tracks( &view, &home, &results, Some( &bundle ) )
                .iter()
                .map( |t| t.id.clone() )
                .collect()
        };
        assert_eq!( ids( View::Home ), vec![ "h" ] );
        assert_eq!( ids( View::Search ), vec![ "r" ] );
        assert_eq!( ids( View::Library ), vec![ "lib" ] );
        assert_eq!( ids( View::Settings ), vec![ "h" ] );
        assert!( ids( View::PlaylistDetail( "missing".into() ) ).is_empty() );
    }
}
