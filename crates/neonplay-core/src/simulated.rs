//! Clock-driven audio backend
//!
//! Behaves like a real resource without touching the network or the sound
//! card: it "loads" instantly, advances its playback head with a clock, and
//! ends when it reaches the duration. Used by `--simulate` and by tests.

use std::collections::{ HashMap, HashSet };
use std::time::Instant;

use crate::transport::{ AudioBackend, BackendEvent, TransportError };


/// Length of a catalog preview clip.
pub const PREVIEW_SECONDS: f64 = 30.0;


#[derive( Debug, Clone, Copy, PartialEq, Eq )]
enum Clock {
    /// Time only moves through [`SimulatedBackend::advance`].
    Manual,
    /// Time follows the wall clock between polls.
    Realtime,
}


#[derive( Debug )]
struct Bound {
    url: String,
    position: f64,
    duration: f64,
    playing: bool,
    volume: f32,
    /// Failed; cannot start again until rebound
    dead: bool,
}


/// Simulated audio resource.
#[derive( Debug )]
pub struct SimulatedBackend {
    clock: Clock,
    last_poll: Instant,
    default_duration: f64,
    durations: HashMap<String, f64>,
    failing: HashSet<String>,
    bound: Option<Bound>,
    events: Vec<BackendEvent>,
    opens: usize,
}


impl SimulatedBackend {
    /// A backend whose clock only moves when told to.
    pub fn manual() -> Self {
        Self::with_clock( Clock::Manual )
    }


    /// A backend that follows the wall clock.
    pub fn realtime() -> Self {
        Self::with_clock( Clock::Realtime )
    }


    fn with_clock( clock: Clock ) -> Self {
        Self {
            clock,
            last_poll: Instant::now(),
            default_duration: PREVIEW_SECONDS,
            durations: HashMap::new(),
            failing: HashSet::new(),
            bound: None,
            events: Vec::new(),
            opens: 0,
        }
    }


    /// Overrides the duration reported for one locator.
    pub fn with_duration( mut self, url: &str, seconds: f64 ) -> Self {
        self.durations.insert( url.to_string(), seconds );
        self
    }


    /// Makes playback of `url` fail to start.
    pub fn failing( mut self, url: &str ) -> Self {
        self.failing.insert( url.to_string() );
        self
    }


    /// Moves the playback head forward by `seconds` if playing.
    pub fn advance( &mut self, seconds: f64 ) {
        let Some( bound ) = self.bound.as_mut() else {
            return;
        };
        if !bound.playing {
            return;
        }

        bound.position = ( bound.position + seconds ).min( bound.duration );
        self.events.push( BackendEvent::Position( bound.position ) );
        if bound.position >= bound.duration {
            bound.playing = false;
            self.events.push( BackendEvent::Ended );
        }
    }


    /// Injects a raw position report.
    pub fn report_position( &mut self, seconds: f64 ) {
        self.events.push( BackendEvent::Position( seconds ) );
    }


    /// Injects a failure of the bound resource. It stays dead until the
    /// next `open`.
    pub fn report_failure( &mut self, message: &str ) {
        if let Some( bound ) = self.bound.as_mut() {
            bound.playing = false;
            bound.dead = true;
        }
        self.events.push( BackendEvent::Failed( message.to_string() ) );
    }


    /// Locator of the bound resource.
    pub fn bound( &self ) -> Option<&str> {
        self.bound.as_ref().map( |b| b.url.as_str() )
    }


    pub fn is_playing( &self ) -> bool {
        self.bound.as_ref().is_some_and( |b| b.playing )
    }


    pub fn position( &self ) -> f64 {
        self.bound.as_ref().map( |b| b.position ).unwrap_or( 0.0 )
    }


    pub fn volume( &self ) -> f32 {
        self.bound.as_ref().map( |b| b.volume ).unwrap_or( 0.0 )
    }


    /// Number of resources bound so far.
    pub fn opens( &self ) -> usize {
        self.opens
    }
}


impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::realtime()
    }
}


impl AudioBackend for SimulatedBackend {
    fn open( &mut self, url: &str ) -> Result<(), TransportError> {
        if !url.contains( "://" ) {
            return Err( TransportError::InvalidResource( url.to_string() ) );
        }

        let duration = self.durations.get( url ).copied().unwrap_or( self.default_duration );
        self.bound = Some( Bound {
            url: url.to_string(),
            position: 0.0,
            duration,
            playing: false,
            volume: 1.0,
            dead: false,
        });
        self.events.clear();
        self.events.push( BackendEvent::Loaded { duration } );
        self.opens += 1;
        Ok(())
    }


    fn start( &mut self ) -> Result<(), TransportError> {
        let bound = self.bound.as_mut().ok_or( TransportError::NoResource )?;
        if self.failing.contains( &bound.url ) {
            return Err( TransportError::Start( format!( "cannot decode {}", bound.url ) ) );
        }
        if bound.dead {
            return Err( TransportError::Start( format!( "{} has failed", bound.url ) ) );
        }
        bound.playing = true;
        self.last_poll = Instant::now();
        Ok(())
    }


    fn pause( &mut self ) {
        if let Some( bound ) = self.bound.as_mut() {
            bound.playing = false;
        }
    }


    fn seek( &mut self, seconds: f64 ) -> Result<(), TransportError> {
        let bound = self.bound.as_mut().ok_or( TransportError::NoResource )?;
        bound.position = seconds.clamp( 0.0, bound.duration );
        Ok(())
    }


    fn set_volume( &mut self, volume: f32 ) {
        if let Some( bound ) = self.bound.as_mut() {
            bound.volume = volume;
        }
    }


    fn close( &mut self ) {
        self.bound = None;
        self.events.clear();
    }


    fn poll( &mut self ) -> Vec<BackendEvent> {
        if self.clock == Clock::Realtime {
            let now = Instant::now();
            let elapsed = now.duration_since( self.last_poll ).as_secs_f64();
            self.last_poll = now;
            self.advance( elapsed );
        }
        std::mem::take( &mut self.events )
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_open_reports_duration() {
        let mut backend = SimulatedBackend::manual().with_duration( "https://a.test/x", 12.0 );
        backend.open( "https://a.test/x" ).unwrap();
        assert_eq!( backend.poll(), vec![ BackendEvent::Loaded { duration: 12.0 } ] );
    }


    #[test]
    fn test_advance_only_while_playing() {
        let mut backend = SimulatedBackend::manual();
        backend.open( "https://a.test/x" ).unwrap();
        backend.poll();

        backend.advance( 3.0 );
        assert_eq!( backend.position(), 0.0 );

        backend.start().unwrap();
        backend.advance( 3.0 );
        assert_eq!( backend.poll(), vec![ BackendEvent::Position( 3.0 ) ] );
    }


    #[test]
    fn test_failed_resource_cannot_start_until_reopened() {
        let mut backend = SimulatedBackend::manual();
        backend.open( "https://a.test/x" ).unwrap();
        backend.start().unwrap();
        backend.report_failure( "reset" );
        assert!( !backend.is_playing() );
        assert!( matches!( backend.start(), Err( TransportError::Start( _ ) ) ) );

        backend.open( "https://a.test/x" ).unwrap();
        backend.start().unwrap();
        assert!( backend.is_playing() );
    }


    #[test]
    fn test_close_drops_pending_events() {
        let mut backend = SimulatedBackend::manual();
        backend.open( "https://a.test/x" ).unwrap();
        backend.close();
        assert!( backend.poll().is_empty() );
        assert!( backend.bound().is_none() );
    }
}
