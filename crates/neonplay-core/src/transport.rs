//! Transport controller
//!
//! Owns the single audio resource and its play/pause/seek/skip semantics.
//! The platform side lives behind [`AudioBackend`]; this module is the state
//! machine on top of it:
//!
//! `Idle -> Loading -> Ready <-> Playing <-> Paused -> Ended`
//!
//! `load` from any state tears down and restarts at `Loading`. `Ended` only
//! leaves through a new `load`.

use thiserror::Error;


/// Errors that can occur while driving the transport. None are fatal.
#[derive( Debug, Error, Clone, PartialEq )]
pub enum TransportError {
    #[error( "No resource bound" )]
    NoResource,

    #[error( "Invalid resource locator: {0}" )]
    InvalidResource( String ),

    #[error( "Playback could not start: {0}" )]
    Start( String ),

    #[error( "Seek failed: {0}" )]
    Seek( String ),
}


/// Transport state.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub enum TransportState {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
}


/// Discrete events a backend reports from its platform resource.
#[derive( Debug, Clone, PartialEq )]
pub enum BackendEvent {
    /// Duration became known after binding.
    Loaded { duration: f64 },
    /// Playback head moved.
    Position( f64 ),
    /// Playback reached the end of the resource.
    Ended,
    /// Network or decoding failure after the resource was bound.
    Failed( String ),
}


/// Events surfaced to the owner of the transport.
#[derive( Debug, Clone, PartialEq )]
pub enum TransportEvent {
    StateChanged( TransportState ),
    Loaded { duration: f64 },
    Progress { position: f64, duration: f64 },
    Ended,
    Failed( String ),
}


/// A platform audio resource.
///
/// Implementations hold at most one resource; `open` replaces whatever was
/// bound before.
pub trait AudioBackend {
    fn open( &mut self, url: &str ) -> Result<(), TransportError>;

    fn start( &mut self ) -> Result<(), TransportError>;

    fn pause( &mut self );

    fn seek( &mut self, seconds: f64 ) -> Result<(), TransportError>;

    fn set_volume( &mut self, volume: f32 );

    fn close( &mut self );

    /// Drains events produced since the last poll.
    fn poll( &mut self ) -> Vec<BackendEvent>;
}


impl<B: AudioBackend + ?Sized> AudioBackend for Box<B> {
    fn open( &mut self, url: &str ) -> Result<(), TransportError> {
        ( **self ).open( url )
    }

    fn start( &mut self ) -> Result<(), TransportError> {
        ( **self ).start()
    }

    fn pause( &mut self ) {
        ( **self ).pause()
    }

    fn seek( &mut self, seconds: f64 ) -> Result<(), TransportError> {
        ( **self ).seek( seconds )
    }

    fn set_volume( &mut self, volume: f32 ) {
        ( **self ).set_volume( volume )
    }

    fn close( &mut self ) {
        ( **self ).close()
    }

    fn poll( &mut self ) -> Vec<BackendEvent> {
        ( **self ).poll()
    }
}


/// The transport controller.
pub struct Transport<B: AudioBackend> {
    backend: B,
    state: TransportState,
    resource: Option<String>,
    position: f64,
    duration: f64,
    /// Volume in `[0, 1]`, re-applied to every newly bound resource
    volume: f32,
    /// Set when `play` arrives while the resource is still loading
    play_requested: bool,
    pending: Vec<TransportEvent>,
}


impl<B: AudioBackend> Transport<B> {
    /// Creates an idle transport.
    pub fn new( backend: B ) -> Self {
        Self {
            backend,
            state: TransportState::Idle,
            resource: None,
            position: 0.0,
            duration: 0.0,
            volume: 1.0,
            play_requested: false,
            pending: Vec::new(),
        }
    }


    /// Binds `url`, tearing down any previous resource.
    ///
    /// Requesting the resource that is already bound is a no-op, unless it
    /// has ended.
    pub fn load( &mut self, url: &str ) -> Result<(), TransportError> {
        if self.resource.as_deref() == Some( url ) && self.state != TransportState::Ended {
            tracing::debug!( "Resource already bound: {}", url );
            return Ok(());
        }

        if self.resource.take().is_some() {
            self.backend.close();
        }
        self.position = 0.0;
        self.duration = 0.0;
        self.play_requested = false;

        if let Err( e ) = self.backend.open( url ) {
            tracing::warn!( "Failed to bind {}: {}", url, e );
            self.set_state( TransportState::Idle );
            return Err( e );
        }

        tracing::info!( "Bound resource: {}", url );
        self.backend.set_volume( self.volume );
        self.resource = Some( url.to_string() );
        self.set_state( TransportState::Loading );
        Ok(())
    }


    /// Begins or resumes playback.
    ///
    /// On failure the transport stays not-playing and the error is returned
    /// to the caller; nothing is retried.
    pub fn play( &mut self ) -> Result<(), TransportError> {
        let url = self.resource.clone().ok_or( TransportError::NoResource )?;

        if self.state == TransportState::Ended {
            self.load( &url )?;
        }
        if self.state == TransportState::Playing {
            return Ok(());
        }

        if let Err( e ) = self.backend.start() {
            tracing::warn!( "Playback failed for {}: {}", url, e );
            self.play_requested = false;
            self.pending.push( TransportEvent::Failed( e.to_string() ) );
            return Err( e );
        }

        if self.state == TransportState::Loading {
            self.play_requested = true;
        } else {
            self.set_state( TransportState::Playing );
        }
        Ok(())
    }


    /// Suspends playback.
    pub fn pause( &mut self ) -> Result<(), TransportError> {
        if self.resource.is_none() {
            return Err( TransportError::NoResource );
        }

        self.backend.pause();
        self.play_requested = false;
        if self.state == TransportState::Playing {
            self.set_state( TransportState::Paused );
        }
        Ok(())
    }


    /// Moves the playback head to `target` seconds, clamped to the track.
    ///
    /// Playback continues if it was playing. After the end, a seek back into
    /// the track rebinds the resource and leaves it ready at `target`.
    pub fn seek( &mut self, target: f64 ) -> Result<(), TransportError> {
        let url = self.resource.clone().ok_or( TransportError::NoResource )?;

        let target = self.clamp_position( target );
        if self.state == TransportState::Ended {
            if target >= self.duration {
                return Ok(());
            }
            self.load( &url )?;
        }

        self.backend.seek( target )?;
        self.position = target;
        self.pending.push( TransportEvent::Progress { position: self.position, duration: self.duration } );
        Ok(())
    }


    /// Relative seek; same bounds as [`Transport::seek`].
    pub fn skip( &mut self, delta: f64 ) -> Result<(), TransportError> {
        self.seek( self.position + delta )
    }


    /// Releases the resource and returns to `Idle`.
    pub fn stop( &mut self ) {
        if self.resource.take().is_some() {
            self.backend.close();
            tracing::info!( "Transport stopped" );
        }
        self.position = 0.0;
        self.duration = 0.0;
        self.play_requested = false;
        self.set_state( TransportState::Idle );
    }


    /// Sets the volume, applied immediately to the bound resource.
    pub fn set_volume( &mut self, volume: f32 ) {
        self.volume = volume.clamp( 0.0, 1.0 );
        if self.resource.is_some() {
            self.backend.set_volume( self.volume );
        }
    }


    /// Processes backend events and returns what changed since the last call.
    pub fn tick( &mut self ) -> Vec<TransportEvent> {
        for event in self.backend.poll() {
            match event {
                BackendEvent::Loaded { duration } => {
                    if duration.is_finite() && duration > 0.0 {
                        self.duration = duration;
                    }
                    self.pending.push( TransportEvent::Loaded { duration: self.duration } );
                    if self.state == TransportState::Loading {
                        let next = if self.play_requested {
                            TransportState::Playing
                        } else {
                            TransportState::Ready
                        };
                        self.play_requested = false;
                        self.set_state( next );
                    }
                }
                BackendEvent::Position( position ) => {
                    // Only forward movement while playing; seeks reset explicitly
                    if self.state == TransportState::Playing && position >= self.position {
                        self.position = self.clamp_position( position );
                        self.pending.push( TransportEvent::Progress {
                            position: self.position,
                            duration: self.duration,
                        });
                    }
                }
                BackendEvent::Ended => {
                    if self.resource.is_some() && self.state != TransportState::Ended {
                        if self.duration > 0.0 {
                            self.position = self.duration;
                        }
                        self.set_state( TransportState::Ended );
                        self.pending.push( TransportEvent::Ended );
                    }
                }
                BackendEvent::Failed( message ) => {
                    tracing::warn!( "Transport failure: {}", message );
                    self.play_requested = false;
                    match self.state {
                        TransportState::Playing => self.set_state( TransportState::Paused ),
                        TransportState::Loading => self.set_state( TransportState::Ready ),
                        _ => {}
                    }
                    self.pending.push( TransportEvent::Failed( message ) );
                }
            }
        }

        std::mem::take( &mut self.pending )
    }


    /// Current state.
    pub fn state( &self ) -> TransportState {
        self.state
    }


    pub fn is_playing( &self ) -> bool {
        self.state == TransportState::Playing
    }


    /// True when playback has stopped at or past a known, positive duration.
    pub fn reached_end( &self ) -> bool {
        !self.is_playing() && self.duration > 0.0 && self.position >= self.duration
    }


    /// Playback position in seconds.
    pub fn position( &self ) -> f64 {
        self.position
    }


    /// Duration in seconds; 0 until known.
    pub fn duration( &self ) -> f64 {
        self.duration
    }


    pub fn volume( &self ) -> f32 {
        self.volume
    }


    /// Locator of the bound resource.
    pub fn resource( &self ) -> Option<&str> {
        self.resource.as_deref()
    }


    pub fn backend( &self ) -> &B {
        &self.backend
    }


    pub fn backend_mut( &mut self ) -> &mut B {
        &mut self.backend
    }


    fn clamp_position( &self, position: f64 ) -> f64 {
        let position = position.max( 0.0 );
        if self.duration > 0.0 {
            position.min( self.duration )
        } else {
            position
        }
    }


    fn set_state( &mut self, state: TransportState ) {
        if self.state != state {
            tracing::debug!( "Transport {:?} -> {:?}", self.state, state );
            self.state = state;
            self.pending.push( TransportEvent::StateChanged( state ) );
        }
    }
}


impl<B: AudioBackend> Drop for Transport<B> {
    fn drop( &mut self ) {
        if self.resource.is_some() {
            self.backend.close();
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::simulated::SimulatedBackend;


    fn loaded( url: &str ) -> Transport<SimulatedBackend> {
        let mut transport = Transport::new( SimulatedBackend::manual() );
        transport.load( url ).unwrap();
        transport.tick();
        transport
    }


    #[test]
    fn test_load_then_ready() {
        let mut transport = Transport::new( SimulatedBackend::manual() );
        assert_eq!( transport.state(), TransportState::Idle );

        transport.load( "https://a.test/1.m4a" ).unwrap();
        assert_eq!( transport.state(), TransportState::Loading );

        let events = transport.tick();
        assert!( events.contains( &TransportEvent::Loaded { duration: 30.0 } ) );
        assert_eq!( transport.state(), TransportState::Ready );
        assert_eq!( transport.duration(), 30.0 );
    }


    #[test]
    fn test_play_while_loading_starts_when_loaded() {
        let mut transport = Transport::new( SimulatedBackend::manual() );
        transport.load( "https://a.test/1.m4a" ).unwrap();
        transport.play().unwrap();
        assert!( !transport.is_playing() );

        transport.tick();
        assert!( transport.is_playing() );
    }


    #[test]
    fn test_load_same_resource_is_idempotent() {
        let mut transport = loaded( "https://a.test/1.m4a" );
        transport.play().unwrap();
        transport.backend_mut().advance( 5.0 );
        transport.tick();

        transport.load( "https://a.test/1.m4a" ).unwrap();
        assert!( transport.is_playing() );
        assert_eq!( transport.position(), 5.0 );
        assert_eq!( transport.backend().opens(), 1 );
    }


    #[test]
    fn test_load_other_resource_replaces_binding() {
        let mut transport = loaded( "https://a.test/1.m4a" );
        transport.play().unwrap();
        transport.backend_mut().advance( 5.0 );
        transport.tick();

        transport.load( "https://a.test/2.m4a" ).unwrap();
        assert_eq!( transport.state(), TransportState::Loading );
        assert_eq!( transport.position(), 0.0 );
        assert_eq!( transport.backend().bound(), Some( "https://a.test/2.m4a" ) );
        assert_eq!( transport.backend().opens(), 2 );
    }


    #[test]
    fn test_play_without_resource_fails() {
        let mut transport = Transport::new( SimulatedBackend::manual() );
        assert_eq!( transport.play(), Err( TransportError::NoResource ) );
        assert!( !transport.is_playing() );
    }


    #[test]
    fn test_play_failure_keeps_not_playing() {
        let mut transport = Transport::new( SimulatedBackend::manual().failing( "https://a.test/bad.m4a" ) );
        transport.load( "https://a.test/bad.m4a" ).unwrap();
        transport.tick();

        assert!( matches!( transport.play(), Err( TransportError::Start( _ ) ) ) );
        assert!( !transport.is_playing() );
        assert!( matches!( transport.tick().as_slice(), [ TransportEvent::Failed( _ ) ] ) );
    }


    #[test]
    fn test_pause_and_resume() {
        let mut transport = loaded( "https://a.test/1.m4a" );
        transport.play().unwrap();
        transport.pause().unwrap();
        assert_eq!( transport.state(), TransportState::Paused );

        transport.play().unwrap();
        assert_eq!( transport.state(), TransportState::Playing );
    }


    #[test]
    fn test_seek_clamps_to_bounds() {
        let mut transport = loaded( "https://a.test/1.m4a" );

        transport.seek( -5.0 ).unwrap();
        assert_eq!( transport.position(), 0.0 );

        transport.seek( 40.0 ).unwrap();
        assert_eq!( transport.position(), 30.0 );
    }


    #[test]
    fn test_seek_keeps_playing() {
        let mut transport = loaded( "https://a.test/1.m4a" );
        transport.play().unwrap();
        transport.seek( 12.0 ).unwrap();

        assert!( transport.is_playing() );
        assert_eq!( transport.backend().position(), 12.0 );
    }


    #[test]
    fn test_skip_is_relative_and_clamped() {
        let mut transport = loaded( "https://a.test/1.m4a" );
        transport.seek( 20.0 ).unwrap();
        transport.skip( -10.0 ).unwrap();
        assert_eq!( transport.position(), 10.0 );

        transport.skip( 100.0 ).unwrap();
        assert_eq!( transport.position(), 30.0 );
        transport.skip( -100.0 ).unwrap();
        assert_eq!( transport.position(), 0.0 );
    }


    #[test]
    fn test_position_is_monotonic_while_playing() {
        let mut transport = loaded( "https://a.test/1.m4a" );
        transport.play().unwrap();
        transport.backend_mut().advance( 4.0 );
        transport.tick();
        transport.backend_mut().report_position( 2.0 );
        transport.tick();

        assert_eq!( transport.position(), 4.0 );
    }


    #[test]
    fn test_end_of_track() {
        let mut transport = loaded( "https://a.test/1.m4a" );
        transport.play().unwrap();
        transport.backend_mut().advance( 31.0 );

        let events = transport.tick();
        assert!( events.contains( &TransportEvent::Ended ) );
        assert_eq!( transport.state(), TransportState::Ended );
        assert!( transport.reached_end() );
    }


    #[test]
    fn test_play_after_end_reloads() {
        let mut transport = loaded( "https://a.test/1.m4a" );
        transport.play().unwrap();
        transport.backend_mut().advance( 31.0 );
        transport.tick();

        transport.play().unwrap();
        assert_eq!( transport.state(), TransportState::Loading );
        transport.tick();
        assert!( transport.is_playing() );
        assert_eq!( transport.position(), 0.0 );
    }


    #[test]
    fn test_seek_after_end_rebinds() {
        let mut transport = loaded( "https://a.test/1.m4a" );
        transport.play().unwrap();
        transport.backend_mut().advance( 31.0 );
        transport.tick();

        transport.seek( 10.0 ).unwrap();
        assert_eq!( transport.state(), TransportState::Loading );
        assert_eq!( transport.backend().opens(), 2 );
        assert_eq!( transport.position(), 10.0 );

        transport.tick();
        assert_eq!( transport.state(), TransportState::Ready );
        transport.play().unwrap();
        assert!( transport.is_playing() );
        assert_eq!( transport.backend().position(), 10.0 );
    }


    #[test]
    fn test_seek_to_end_after_end_stays_ended() {
        let mut transport = loaded( "https://a.test/1.m4a" );
        transport.play().unwrap();
        transport.backend_mut().advance( 31.0 );
        transport.tick();

        transport.skip( 5.0 ).unwrap();
        assert_eq!( transport.state(), TransportState::Ended );
        assert_eq!( transport.backend().opens(), 1 );
    }


    #[test]
    fn test_failure_while_playing_pauses_and_blocks_restart() {
        let mut transport = loaded( "https://a.test/1.m4a" );
        transport.play().unwrap();
        transport.backend_mut().advance( 3.0 );
        transport.tick();

        transport.backend_mut().report_failure( "connection reset" );
        let events = transport.tick();
        assert!( events.contains( &TransportEvent::Failed( "connection reset".into() ) ) );
        assert_eq!( transport.state(), TransportState::Paused );
        assert!( !transport.is_playing() );

        assert!( matches!( transport.play(), Err( TransportError::Start( _ ) ) ) );
        assert!( !transport.is_playing() );
        assert_eq!( transport.backend().opens(), 1 );
    }


    #[test]
    fn test_failure_before_play_blocks_start() {
        let mut transport = Transport::new( SimulatedBackend::manual() );
        transport.load( "https://a.test/1.m4a" ).unwrap();
        transport.backend_mut().report_failure( "connection refused" );
        transport.tick();
        assert_eq!( transport.state(), TransportState::Ready );

        assert!( matches!( transport.play(), Err( TransportError::Start( _ ) ) ) );
        assert_eq!( transport.state(), TransportState::Ready );
    }


    #[test]
    fn test_volume_reapplied_to_new_resource() {
        let mut transport = loaded( "https://a.test/1.m4a" );
        transport.set_volume( 0.3 );
        assert_eq!( transport.backend().volume(), 0.3 );

        transport.load( "https://a.test/2.m4a" ).unwrap();
        assert_eq!( transport.backend().volume(), 0.3 );
    }


    #[test]
    fn test_invalid_locator_leaves_idle() {
        let mut transport = Transport::new( SimulatedBackend::manual() );
        assert!( matches!( transport.load( "" ), Err( TransportError::InvalidResource( _ ) ) ) );
        assert_eq!( transport.state(), TransportState::Idle );
        assert!( transport.resource().is_none() );
    }


    #[test]
    fn test_stop_releases_resource() {
        let mut transport = loaded( "https://a.test/1.m4a" );
        transport.play().unwrap();
        transport.stop();

        assert_eq!( transport.state(), TransportState::Idle );
        assert!( transport.backend().bound().is_none() );
    }
}
