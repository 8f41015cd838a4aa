//! Playback and session engine
//!
//! The single owner of session, transport, feed, and playback state. Front
//! ends call its methods from one thread and drain [`EngineEvent`]s to learn
//! what changed; nothing here knows about rendering.

use crate::accounts::{ self, AuthError };
use crate::catalog::CatalogError;
use crate::collections::CollectionError;
use crate::feed::{ Feed, FeedRequest, FeedTarget };
use crate::model::{ Identity, Language, SessionBundle, Theme, Track };
use crate::sequencer::{ self, Advance, View };
use crate::session::{ BundleOrigin, SessionStore };
use crate::store::KeyValueStore;
use crate::transport::{ AudioBackend, Transport, TransportError, TransportEvent };


/// What the front end shows about playback.
#[derive( Debug, Clone, PartialEq, Default )]
pub struct PlaybackState {
    pub active_track: Option<Track>,
    pub is_playing: bool,
    pub position: f64,
    pub duration: f64,
    pub view: View,
}


/// Change notifications.
#[derive( Debug, Clone, PartialEq )]
pub enum EngineEvent {
    SessionActivated { identity: Identity, origin: BundleOrigin },
    SessionDeactivated,
    /// The bundle changed; it has been persisted unless the session is a guest.
    BundleCommitted,
    TrackChanged( Option<Track> ),
    PlaybackStateChanged { playing: bool },
    Progress { position: f64, duration: f64 },
    ViewChanged( View ),
    FeedUpdated( FeedTarget ),
    /// Non-fatal failure worth telling the user about.
    Error( String ),
}


pub struct Engine<S: KeyValueStore, B: AudioBackend> {
    session: SessionStore<S>,
    transport: Transport<B>,
    feed: Feed,
    playback: PlaybackState,
    events: Vec<EngineEvent>,
    /// End of track seen while absorbing transport events; handled by `tick`
    end_pending: bool,
    /// The current binding's end has already been acted on
    end_handled: bool,
}


impl<S: KeyValueStore, B: AudioBackend> Engine<S, B> {
    pub fn new( store: S, backend: B, feed: Feed ) -> Self {
        Self {
            session: SessionStore::new( store ),
            transport: Transport::new( backend ),
            feed,
            playback: PlaybackState::default(),
            events: Vec::new(),
            end_pending: false,
            end_handled: false,
        }
    }


    // Session and accounts

    /// Registers a user and activates it. Returns the home refresh to run.
    pub fn register( &mut self, username: &str, password: &str ) -> Result<Option<FeedRequest>, AuthError> {
        let identity = accounts::register( self.session.store_mut(), username, password )?;
        Ok( self.activate( identity ) )
    }


    /// Logs a user in and activates it. Returns the home refresh to run.
    pub fn login( &mut self, username: &str, password: &str ) -> Result<Option<FeedRequest>, AuthError> {
        let identity = accounts::login( self.session.store_mut(), username, password )?;
        Ok( self.activate( identity ) )
    }


    /// Starts a guest session, which is never persisted.
    pub fn guest( &mut self ) -> Option<FeedRequest> {
        self.activate( Identity::guest() )
    }


    /// Activates the identity remembered from a previous run, if any.
    ///
    /// Returns None when nobody is remembered.
    pub fn restore( &mut self ) -> Option<Option<FeedRequest>> {
        let identity = accounts::restore( self.session.store() )?;
        Some( self.activate( identity ) )
    }


    /// Makes `identity` active, loads its bundle, and starts a home refresh.
    pub fn activate( &mut self, identity: Identity ) -> Option<FeedRequest> {
        let origin = self.session.activate( identity.clone() );
        self.transport.set_volume( self.session.bundle().settings.volume );
        self.events.push( EngineEvent::SessionActivated { identity, origin } );
        self.begin_home()
    }


    /// Ends the session: stops playback, forgets the remembered identity,
    /// and clears the in-memory bundle. Persisted bundles stay.
    pub fn logout( &mut self ) {
        self.transport.stop();
        self.transport.tick();
        self.end_pending = false;

        if let Err( e ) = accounts::forget( self.session.store_mut() ) {
            tracing::warn!( "Failed to forget active user: {}", e );
        }
        self.session.deactivate();

        if self.playback.active_track.is_some() {
            self.events.push( EngineEvent::TrackChanged( None ) );
        }
        let view_changed = self.playback.view != View::Home;
        self.playback = PlaybackState::default();
        if view_changed {
            self.events.push( EngineEvent::ViewChanged( View::Home ) );
        }
        self.events.push( EngineEvent::SessionDeactivated );
    }


    // Playback

    /// Selects `track` and starts it.
    ///
    /// The selection sticks even when the track cannot play.
    pub fn play_now( &mut self, track: Track ) -> Result<(), TransportError> {
        tracing::info!( "Playing {} - {} ({})", track.artist, track.title, track.id );
        let url = track.audio_url.clone();
        self.playback.active_track = Some( track.clone() );
        self.events.push( EngineEvent::TrackChanged( Some( track ) ) );
        self.end_pending = false;

        let result = match url.as_deref() {
            Some( url ) => self.transport.load( url ).and_then( |_| self.transport.play() ),
            None => {
                self.transport.stop();
                Err( TransportError::NoResource )
            }
        };
        if let Err( ref e ) = result {
            self.events.push( EngineEvent::Error( e.to_string() ) );
        }
        self.absorb_transport_events();
        result
    }


    /// Auto-advance after the active track ended.
    pub fn handle_track_ended( &mut self ) {
        let list = sequencer::context_tracks(
            &self.playback.view,
            self.feed.home(),
            self.feed.results(),
            self.session.is_active().then( || self.session.bundle() ),
        );

        match sequencer::next_after( list, self.playback.active_track.as_ref() ) {
            Advance::Play( track ) => {
                let _ = self.play_now( track );
            }
            Advance::Stop => {
                tracing::info!( "End of {} list, stopping", self.playback.view.label() );
                if self.transport.is_playing() {
                    let _ = self.transport.pause();
                }
                self.absorb_transport_events();
            }
            Advance::Nothing => tracing::debug!( "Track ended with nothing to advance to" ),
        }
    }


    /// Skips to the next track of the current context.
    pub fn next( &mut self ) {
        self.handle_track_ended();
    }


    /// Drives the transport; call this regularly from the event loop.
    ///
    /// Advances once per binding, on the transport's end event or on a
    /// stopped head sitting at the duration, whichever is seen first.
    pub fn tick( &mut self ) {
        self.absorb_transport_events();
        let at_end = std::mem::take( &mut self.end_pending ) || self.transport.reached_end();
        if at_end && !self.end_handled {
            self.end_handled = true;
            self.handle_track_ended();
        }
    }


    /// Resumes playback, restarting the active track if nothing is bound.
    pub fn play( &mut self ) -> Result<(), TransportError> {
        if self.transport.resource().is_none() {
            return match self.playback.active_track.clone() {
                Some( track ) => self.play_now( track ),
                None => Err( TransportError::NoResource ),
            };
        }
        let result = self.transport.play();
        self.report( result )
    }


    pub fn pause( &mut self ) -> Result<(), TransportError> {
        let result = self.transport.pause();
        self.report( result )
    }


    /// Pauses if playing, plays otherwise.
    pub fn toggle_play( &mut self ) -> Result<(), TransportError> {
        if self.transport.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }


    pub fn seek( &mut self, seconds: f64 ) -> Result<(), TransportError> {
        let result = self.transport.seek( seconds );
        self.report( result )
    }


    pub fn skip( &mut self, delta: f64 ) -> Result<(), TransportError> {
        let result = self.transport.skip( delta );
        self.report( result )
    }


    /// Releases the audio resource. The active track stays selected.
    pub fn stop( &mut self ) {
        self.transport.stop();
        self.end_pending = false;
        self.absorb_transport_events();
    }


    // Collections

    /// Adds or removes `track` from the library. Returns true if now a favourite.
    pub fn toggle_favorite( &mut self, track: &Track ) -> Result<bool, CollectionError> {
        self.mutate( |b| b.toggle_favorite( track ) )
    }


    /// Creates a playlist and returns its id.
    pub fn create_playlist( &mut self, name: &str ) -> Result<String, CollectionError> {
        if name.trim().is_empty() {
            return Err( CollectionError::EmptyName );
        }
        self.mutate( |b| b.create_playlist( name ) )?
    }


    /// Deletes a playlist, leaving its detail view if it was open.
    pub fn delete_playlist( &mut self, playlist_id: &str ) -> Result<bool, CollectionError> {
        let removed = self.mutate( |b| b.delete_playlist( playlist_id ) )?;
        if self.playback.view.open_playlist() == Some( playlist_id ) {
            self.navigate( View::Playlists );
        }
        Ok( removed )
    }


    pub fn add_track_to_playlist( &mut self, playlist_id: &str, track: &Track ) -> Result<bool, CollectionError> {
        self.mutate( |b| b.add_track_to_playlist( playlist_id, track ) )
    }


    /// Removes a track from a playlist. An open detail view reads the live
    /// bundle, so it reflects the removal at once.
    pub fn remove_track_from_playlist( &mut self, playlist_id: &str, track_id: &str ) -> Result<bool, CollectionError> {
        self.mutate( |b| b.remove_track_from_playlist( playlist_id, track_id ) )
    }


    // Settings

    /// Sets the volume, applying it to the transport at once.
    pub fn set_volume( &mut self, volume: f32 ) -> Result<(), CollectionError> {
        let volume = volume.clamp( 0.0, 1.0 );
        self.mutate( |b| b.settings.volume = volume )?;
        self.transport.set_volume( volume );
        Ok(())
    }


    pub fn set_theme( &mut self, theme: Theme ) -> Result<(), CollectionError> {
        self.mutate( |b| b.settings.theme = theme )
    }


    pub fn set_language( &mut self, language: Language ) -> Result<(), CollectionError> {
        self.mutate( |b| b.settings.language = language )
    }


    pub fn set_background( &mut self, background: &str ) -> Result<(), CollectionError> {
        self.mutate( |b| b.settings.background = background.to_string() )
    }


    // Views

    /// Switches the browsing context. Playback is not affected.
    pub fn navigate( &mut self, view: View ) {
        if self.playback.view != view {
            tracing::debug!( "View {:?} -> {:?}", self.playback.view, view );
            self.playback.view = view.clone();
            self.events.push( EngineEvent::ViewChanged( view ) );
        }
    }


    /// Opens a playlist's detail view. Returns false if it does not exist.
    pub fn open_playlist( &mut self, playlist_id: &str ) -> bool {
        if self.session.bundle().playlist( playlist_id ).is_none() {
            return false;
        }
        self.navigate( View::PlaylistDetail( playlist_id.to_string() ) );
        true
    }


    /// Ordered tracks of the current browsing context.
    pub fn context_tracks( &self ) -> &[Track] {
        sequencer::context_tracks(
            &self.playback.view,
            self.feed.home(),
            self.feed.results(),
            self.session.is_active().then( || self.session.bundle() ),
        )
    }


    // Feed

    pub fn begin_home( &mut self ) -> Option<FeedRequest> {
        self.feed.begin_home()
    }


    pub fn begin_search( &mut self, query: &str ) -> Option<FeedRequest> {
        self.feed.begin( FeedTarget::Search, query )
    }


    /// Hands a finished catalog request back.
    pub fn finish_request( &mut self, request: &FeedRequest, outcome: Result<Vec<Track>, CatalogError> ) {
        let failure = outcome.as_ref().err().map( |e| e.to_string() );
        if self.feed.finish( request, outcome ) {
            self.events.push( EngineEvent::FeedUpdated( request.target ) );
        } else if let Some( message ) = failure {
            self.events.push( EngineEvent::Error( message ) );
        }
    }


    // Accessors

    pub fn drain_events( &mut self ) -> Vec<EngineEvent> {
        std::mem::take( &mut self.events )
    }


    pub fn identity( &self ) -> Option<&Identity> {
        self.session.identity()
    }


    pub fn bundle( &self ) -> &SessionBundle {
        self.session.bundle()
    }


    pub fn playback( &self ) -> &PlaybackState {
        &self.playback
    }


    pub fn view( &self ) -> &View {
        &self.playback.view
    }


    pub fn feed( &self ) -> &Feed {
        &self.feed
    }


    pub fn is_loading( &self ) -> bool {
        self.feed.is_loading()
    }


    pub fn transport( &self ) -> &Transport<B> {
        &self.transport
    }


    pub fn backend_mut( &mut self ) -> &mut B {
        self.transport.backend_mut()
    }


    pub fn store( &self ) -> &S {
        self.session.store()
    }


    fn mutate<R>( &mut self, f: impl FnOnce( &mut SessionBundle ) -> R ) -> Result<R, CollectionError> {
        let result = self.session.mutate( f ).ok_or( CollectionError::NoSession )?;
        self.events.push( EngineEvent::BundleCommitted );
        Ok( result )
    }


    fn report( &mut self, result: Result<(), TransportError> ) -> Result<(), TransportError> {
        if let Err( ref e ) = result {
            self.events.push( EngineEvent::Error( e.to_string() ) );
        }
        self.absorb_transport_events();
        result
    }


    fn absorb_transport_events( &mut self ) {
        for event in self.transport.tick() {
            match event {
                TransportEvent::StateChanged( _ ) => {}
                TransportEvent::Loaded { duration } => self.playback.duration = duration,
                TransportEvent::Progress { position, duration } => {
                    self.playback.position = position;
                    self.playback.duration = duration;
                    self.events.push( EngineEvent::Progress { position, duration } );
                }
                TransportEvent::Ended => self.end_pending = true,
                TransportEvent::Failed( message ) => self.events.push( EngineEvent::Error( message ) ),
            }
        }

        if !self.transport.reached_end() {
            self.end_handled = false;
        }
        self.playback.position = self.transport.position();
        self.playback.duration = self.transport.duration();
        let playing = self.transport.is_playing();
        if playing != self.playback.is_playing {
            self.playback.is_playing = playing;
            self.events.push( EngineEvent::PlaybackStateChanged { playing } );
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::model::fixtures::track;
    use crate::simulated::SimulatedBackend;
    use crate::store::{ bundle_key, MemoryStore, USERS_KEY };
    use crate::transport::TransportState;


    type TestEngine = Engine<MemoryStore, SimulatedBackend>;


    fn engine() -> TestEngine {
        Engine::new( MemoryStore::new(), SimulatedBackend::manual(), Feed::default() )
    }


    fn logged_in() -> TestEngine {
        let mut engine = engine();
        engine.register( "ayla", "pw" ).unwrap();
        engine
    }


    /// Playlist [a, b, c] open in the detail view.
    fn with_open_playlist( tracks: &[&str] ) -> ( TestEngine, String ) {
        let mut engine = logged_in();
        let id = engine.create_playlist( "Mix" ).unwrap();
        for t in tracks {
            engine.add_track_to_playlist( &id, &track( t ) ).unwrap();
        }
        assert!( engine.open_playlist( &id ) );
        ( engine, id )
    }


    fn finish_track( engine: &mut TestEngine ) {
        engine.backend_mut().advance( 31.0 );
        engine.tick();
    }


    #[test]
    fn test_ended_advances_to_successor() {
        let ( mut engine, _ ) = with_open_playlist( &[ "a", "b", "c" ] );
        engine.play_now( track( "b" ) ).unwrap();
        assert!( engine.playback().is_playing );

        finish_track( &mut engine );
        assert_eq!( engine.playback().active_track, Some( track( "c" ) ) );
        assert!( engine.playback().is_playing );
        assert_eq!( engine.backend_mut().bound(), Some( "https://audio.test/c.m4a" ) );
    }


    #[test]
    fn test_ended_on_last_track_stops() {
        let ( mut engine, _ ) = with_open_playlist( &[ "a", "b", "c" ] );
        engine.play_now( track( "c" ) ).unwrap();

        finish_track( &mut engine );
        assert_eq!( engine.playback().active_track, Some( track( "c" ) ) );
        assert!( !engine.playback().is_playing );
        assert_eq!( engine.transport().state(), TransportState::Ended );
    }


    #[test]
    fn test_ended_with_empty_context_is_noop() {
        let ( mut engine, _ ) = with_open_playlist( &[] );
        engine.play_now( track( "a" ) ).unwrap();
        let opens = engine.backend_mut().opens();

        finish_track( &mut engine );
        assert_eq!( engine.playback().active_track, Some( track( "a" ) ) );
        assert!( !engine.playback().is_playing );
        assert_eq!( engine.backend_mut().opens(), opens );
    }


    #[test]
    fn test_stopped_at_end_advances_once() {
        let ( mut engine, _ ) = with_open_playlist( &[ "a", "b" ] );
        engine.play_now( track( "a" ) ).unwrap();
        engine.pause().unwrap();
        engine.seek( 30.0 ).unwrap();

        engine.tick();
        assert_eq!( engine.playback().active_track, Some( track( "b" ) ) );
        assert!( engine.playback().is_playing );
    }


    #[test]
    fn test_end_is_handled_once_per_binding() {
        let ( mut engine, id ) = with_open_playlist( &[ "a", "b" ] );
        engine.play_now( track( "b" ) ).unwrap();
        finish_track( &mut engine );
        assert_eq!( engine.transport().state(), TransportState::Ended );

        // A successor appearing later does not replay the old end
        engine.add_track_to_playlist( &id, &track( "c" ) ).unwrap();
        let opens = engine.backend_mut().opens();
        engine.tick();
        engine.tick();
        assert_eq!( engine.playback().active_track, Some( track( "b" ) ) );
        assert_eq!( engine.backend_mut().opens(), opens );
    }


    #[test]
    fn test_transport_failure_stops_without_retry() {
        let mut engine = logged_in();
        engine.play_now( track( "a" ) ).unwrap();
        engine.backend_mut().advance( 3.0 );
        engine.tick();
        engine.drain_events();

        engine.backend_mut().report_failure( "connection reset" );
        engine.tick();
        assert!( !engine.playback().is_playing );
        let events = engine.drain_events();
        assert!( events.contains( &EngineEvent::Error( "connection reset".into() ) ) );
        assert!( events.contains( &EngineEvent::PlaybackStateChanged { playing: false } ) );

        assert!( matches!( engine.play(), Err( TransportError::Start( _ ) ) ) );
        assert!( !engine.playback().is_playing );
        assert_eq!( engine.backend_mut().opens(), 1 );
    }


    #[test]
    fn test_navigation_does_not_interrupt_playback() {
        let ( mut engine, _ ) = with_open_playlist( &[ "a", "b" ] );
        engine.play_now( track( "a" ) ).unwrap();

        engine.navigate( View::Library );
        assert!( engine.playback().is_playing );
        assert_eq!( engine.playback().active_track, Some( track( "a" ) ) );

        // The library is empty, so the next list has nothing to offer
        finish_track( &mut engine );
        assert_eq!( engine.playback().active_track, Some( track( "a" ) ) );
    }


    #[test]
    fn test_play_now_without_locator_still_selects() {
        let mut engine = logged_in();
        let mut silent = track( "s" );
        silent.audio_url = None;

        assert_eq!( engine.play_now( silent.clone() ), Err( TransportError::NoResource ) );
        assert_eq!( engine.playback().active_track, Some( silent ) );
        assert!( !engine.playback().is_playing );
        assert!( engine.drain_events().iter().any( |e| matches!( e, EngineEvent::Error( _ ) ) ) );
    }


    #[test]
    fn test_switching_tracks_keeps_one_resource() {
        let mut engine = logged_in();
        engine.play_now( track( "a" ) ).unwrap();
        engine.play_now( track( "b" ) ).unwrap();

        assert_eq!( engine.backend_mut().bound(), Some( "https://audio.test/b.m4a" ) );
        assert_eq!( engine.playback().position, 0.0 );
    }


    #[test]
    fn test_seek_clamps() {
        let mut engine = logged_in();
        engine.play_now( track( "a" ) ).unwrap();

        engine.seek( -5.0 ).unwrap();
        assert_eq!( engine.playback().position, 0.0 );
        engine.seek( 40.0 ).unwrap();
        assert_eq!( engine.playback().position, 30.0 );
    }


    #[test]
    fn test_toggle_play() {
        let mut engine = logged_in();
        assert_eq!( engine.toggle_play(), Err( TransportError::NoResource ) );

        engine.play_now( track( "a" ) ).unwrap();
        engine.toggle_play().unwrap();
        assert!( !engine.playback().is_playing );
        engine.toggle_play().unwrap();
        assert!( engine.playback().is_playing );
    }


    #[test]
    fn test_play_after_stop_restarts_active_track() {
        let mut engine = logged_in();
        engine.play_now( track( "a" ) ).unwrap();
        engine.stop();
        assert!( !engine.playback().is_playing );

        engine.play().unwrap();
        assert!( engine.playback().is_playing );
        assert_eq!( engine.backend_mut().opens(), 2 );
    }


    #[test]
    fn test_fresh_activation_uses_baseline_volume() {
        let mut engine = logged_in();
        engine.set_volume( 0.9 ).unwrap();
        engine.logout();

        engine.register( "new", "pw" ).unwrap();
        assert!( engine.bundle().library.is_empty() );
        assert!( engine.bundle().playlists.is_empty() );
        assert_eq!( engine.bundle().settings.volume, 0.5 );
        assert_eq!( engine.transport().volume(), 0.5 );
    }


    #[test]
    fn test_bundle_survives_logout_and_login() {
        let mut engine = logged_in();
        engine.toggle_favorite( &track( "a" ) ).unwrap();
        engine.set_volume( 0.2 ).unwrap();
        engine.logout();
        assert!( engine.identity().is_none() );

        engine.login( "ayla", "pw" ).unwrap();
        assert!( engine.bundle().in_library( "a" ) );
        assert_eq!( engine.bundle().settings.volume, 0.2 );
    }


    #[test]
    fn test_restore_remembered_identity() {
        let mut engine = logged_in();
        let store = engine.store().clone();

        let mut next = Engine::new( store, SimulatedBackend::manual(), Feed::default() );
        assert!( next.restore().is_some() );
        assert_eq!( next.identity().map( |i| i.display_name.as_str() ), Some( "ayla" ) );

        next.logout();
        let mut after = Engine::new( next.store().clone(), SimulatedBackend::manual(), Feed::default() );
        assert!( after.restore().is_none() );
    }


    #[test]
    fn test_activation_starts_home_refresh() {
        let mut engine = engine();
        let request = engine.guest().unwrap();
        assert_eq!( request.target, FeedTarget::Home );
        assert!( engine.is_loading() );

        engine.finish_request( &request, Ok( vec![ track( "h" ) ] ) );
        assert!( !engine.is_loading() );
        assert_eq!( engine.context_tracks(), &[ track( "h" ) ] );
    }


    #[test]
    fn test_failed_request_clears_loading() {
        let mut engine = logged_in();
        let request = engine.begin_search( "x" ).unwrap();
        engine.drain_events();

        engine.finish_request( &request, Err( CatalogError::Status( 503 ) ) );
        assert!( !engine.is_loading() );
        assert!( matches!( engine.drain_events().as_slice(), [ EngineEvent::Error( _ ) ] ) );
    }


    #[test]
    fn test_guest_is_never_persisted() {
        let mut engine = engine();
        engine.guest();
        engine.toggle_favorite( &track( "a" ) ).unwrap();
        engine.create_playlist( "Mine" ).unwrap();

        assert!( engine.bundle().in_library( "a" ) );
        assert!( engine.store().is_empty() );
    }


    #[test]
    fn test_mutations_commit() {
        let mut engine = logged_in();
        engine.toggle_favorite( &track( "a" ) ).unwrap();

        let id = engine.identity().unwrap().id.clone();
        let raw = engine.store().get( &bundle_key( &id ) ).unwrap().unwrap();
        assert!( raw.contains( "\"a\"" ) );
        assert!( engine.drain_events().contains( &EngineEvent::BundleCommitted ) );
    }


    #[test]
    fn test_collections_need_session() {
        let mut engine = engine();
        assert_eq!( engine.toggle_favorite( &track( "a" ) ), Err( CollectionError::NoSession ) );
        assert_eq!( engine.create_playlist( "x" ), Err( CollectionError::NoSession ) );
    }


    #[test]
    fn test_empty_playlist_name_rejected() {
        let mut engine = logged_in();
        assert_eq!( engine.create_playlist( "   " ), Err( CollectionError::EmptyName ) );
        assert!( engine.bundle().playlists.is_empty() );
    }


    #[test]
    fn test_deleting_open_playlist_leaves_detail_view() {
        let ( mut engine, id ) = with_open_playlist( &[ "a" ] );
        assert_eq!( engine.view(), &View::PlaylistDetail( id.clone() ) );

        assert!( engine.delete_playlist( &id ).unwrap() );
        assert_eq!( engine.view(), &View::Playlists );
    }


    #[test]
    fn test_deleting_other_playlist_keeps_view() {
        let ( mut engine, id ) = with_open_playlist( &[ "a" ] );
        let other = engine.create_playlist( "Other" ).unwrap();

        engine.delete_playlist( &other ).unwrap();
        assert_eq!( engine.view(), &View::PlaylistDetail( id ) );
    }


    #[test]
    fn test_open_view_reflects_removal() {
        let ( mut engine, id ) = with_open_playlist( &[ "a", "b" ] );
        engine.remove_track_from_playlist( &id, "a" ).unwrap();
        assert_eq!( engine.context_tracks(), &[ track( "b" ) ] );
    }


    #[test]
    fn test_duplicate_registration_writes_nothing() {
        let mut engine = logged_in();
        let before = engine.store().get( USERS_KEY ).unwrap();

        assert!( matches!( engine.register( "ayla", "other" ), Err( AuthError::UserExists ) ) );
        assert_eq!( engine.store().get( USERS_KEY ).unwrap(), before );
    }


    #[test]
    fn test_logout_resets_playback() {
        let ( mut engine, _ ) = with_open_playlist( &[ "a" ] );
        engine.play_now( track( "a" ) ).unwrap();
        engine.logout();

        assert_eq!( engine.playback(), &PlaybackState::default() );
        assert_eq!( engine.transport().state(), TransportState::Idle );
        assert!( engine.drain_events().contains( &EngineEvent::SessionDeactivated ) );
    }


    #[test]
    fn test_volume_without_session_changes_nothing() {
        let mut engine = engine();
        assert_eq!( engine.set_volume( 0.3 ), Err( CollectionError::NoSession ) );
        assert_eq!( engine.transport().volume(), 1.0 );
    }


    #[test]
    fn test_volume_applies_to_bound_resource() {
        let mut engine = logged_in();
        engine.play_now( track( "a" ) ).unwrap();
        engine.set_volume( 1.4 ).unwrap();

        assert_eq!( engine.backend_mut().volume(), 1.0 );
        assert_eq!( engine.bundle().settings.volume, 1.0 );
    }
}
