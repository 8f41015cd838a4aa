//! Network stream backend
//!
//! Plays preview clips from their HTTP locators. Each bound resource gets a
//! worker thread that downloads the clip, decodes it, resamples when the
//! device rate differs, and feeds the output device. The main loop only sees
//! atomics and an event channel.

use std::sync::atomic::{ AtomicBool, AtomicU32, AtomicU64, Ordering };
use std::sync::mpsc::{ self, Receiver, Sender };
use std::sync::{ Arc, Mutex, PoisonError };
use std::thread::{ self, JoinHandle };
use std::time::Duration;

use rubato::{ FastFixedOut, PolynomialDegree, Resampler };

use crate::decoder::{ extension_hint, Decoder };
use crate::output::{ AudioOutput, SampleQueue };
use crate::transport::{ AudioBackend, BackendEvent, TransportError };


/// Default download timeout for a preview clip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs( 20 );


/// Converts planar samples to interleaved.
/// [[L0, L1, ...], [R0, R1, ...]] -> [L0, R0, L1, R1, ...]
fn interleave( channels: &[Vec<f32>] ) -> Vec<f32> {
    let frames = channels.first().map_or( 0, Vec::len );
    let mut out = Vec::with_capacity( frames * channels.len() );
    for f in 0..frames {
        out.extend( channels.iter().map( |ch| ch[ f ] ) );
    }
    out
}


/// Sample rate conversion for interleaved input; pass-through when the
/// rates already match.
struct RateConverter {
    resampler: Option<FastFixedOut<f32>>,
    pending: Vec<Vec<f32>>,
}


impl RateConverter {
    fn new( from: u32, to: u32, channels: usize ) -> Result<Self, String> {
        let resampler = if from != to {
            tracing::info!( "Resampling: {} Hz -> {} Hz", from, to );
            let resampler = FastFixedOut::<f32>::new(
                to as f64 / from as f64,
                2.0,
                PolynomialDegree::Cubic,
                1024,
                channels,
            ).map_err( |e| format!( "Failed to create resampler: {}", e ) )?;
            Some( resampler )
        } else {
            None
        };

        Ok( Self {
            resampler,
            pending: vec![ Vec::new(); channels ],
        })
    }


    fn process( &mut self, samples: Vec<f32> ) -> Vec<f32> {
        let Some( resampler ) = self.resampler.as_mut() else {
            return samples;
        };

        let channels = self.pending.len();
        for frame in samples.chunks( channels ) {
            for ( ch, sample ) in frame.iter().enumerate() {
                self.pending[ ch ].push( *sample );
            }
        }

        let mut out = Vec::new();
        while self.pending.first().map_or( 0, Vec::len ) >= resampler.input_frames_next() {
            let needed = resampler.input_frames_next();
            let chunk: Vec<Vec<f32>> = self.pending
                .iter_mut()
                .map( |ch| ch.drain( ..needed ).collect() )
                .collect();
            match resampler.process( &chunk, None ) {
                Ok( planar ) => out.extend( interleave( &planar ) ),
                Err( e ) => {
                    tracing::error!( "Resample error: {}", e );
                    break;
                }
            }
        }
        out
    }


    fn flush( &mut self ) -> Vec<f32> {
        let Some( resampler ) = self.resampler.as_mut() else {
            return Vec::new();
        };
        if self.pending.first().map_or( true, Vec::is_empty ) {
            return Vec::new();
        }

        let result = resampler.process_partial( Some( self.pending.as_slice() ), None );
        self.pending.iter_mut().for_each( Vec::clear );
        match result {
            Ok( planar ) => interleave( &planar ),
            Err( e ) => {
                tracing::error!( "Final resample error: {}", e );
                Vec::new()
            }
        }
    }


    fn reset( &mut self ) {
        self.pending.iter_mut().for_each( Vec::clear );
        if let Some( resampler ) = self.resampler.as_mut() {
            resampler.reset();
        }
    }
}


/// State shared between a backend and its worker thread.
struct Control {
    stop: AtomicBool,
    playing: AtomicBool,
    /// f32 bits
    volume: AtomicU32,
    seek_to: Mutex<Option<f64>>,
    /// Source frames decoded so far
    frames: AtomicU64,
    /// Source sample rate; 0 until the clip is decoded
    sample_rate: AtomicU32,
    /// Set before the worker touches the output device
    device: AtomicBool,
    /// Set once the worker has returned, for whatever reason
    exited: AtomicBool,
}


impl Control {
    fn new( volume: f32 ) -> Self {
        Self {
            stop: AtomicBool::new( false ),
            playing: AtomicBool::new( false ),
            volume: AtomicU32::new( volume.to_bits() ),
            seek_to: Mutex::new( None ),
            frames: AtomicU64::new( 0 ),
            sample_rate: AtomicU32::new( 0 ),
            device: AtomicBool::new( false ),
            exited: AtomicBool::new( false ),
        }
    }


    fn take_seek( &self ) -> Option<f64> {
        self.seek_to.lock().unwrap_or_else( PoisonError::into_inner ).take()
    }


    fn position( &self ) -> Option<f64> {
        let rate = self.sample_rate.load( Ordering::Relaxed );
        ( rate > 0 ).then( || self.frames.load( Ordering::Relaxed ) as f64 / rate as f64 )
    }
}


struct Worker {
    control: Arc<Control>,
    events: Receiver<BackendEvent>,
    thread: Option<JoinHandle<()>>,
}


/// Backend that streams preview clips over HTTP to the default device.
pub struct StreamBackend {
    timeout: Duration,
    volume: f32,
    worker: Option<Worker>,
}


impl StreamBackend {
    pub fn new( timeout: Duration ) -> Self {
        Self {
            timeout,
            volume: 1.0,
            worker: None,
        }
    }


    fn run( url: String, timeout: Duration, control: Arc<Control>, events: Sender<BackendEvent> ) {
        let result = Self::stream( &url, timeout, &control, &events );
        control.exited.store( true, Ordering::SeqCst );
        if let Err( message ) = result {
            tracing::warn!( "Stream failed for {}: {}", url, message );
            let _ = events.send( BackendEvent::Failed( message ) );
        }
        tracing::debug!( "Stream worker exiting: {}", url );
    }


    fn download( url: &str, timeout: Duration ) -> Result<Vec<u8>, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout( timeout )
            .build()
            .map_err( |e| e.to_string() )?;
        let response = client
            .get( url )
            .send()
            .and_then( |r| r.error_for_status() )
            .map_err( |e| format!( "Download failed: {}", e ) )?;
        let bytes = response.bytes().map_err( |e| format!( "Download failed: {}", e ) )?;
        Ok( bytes.to_vec() )
    }


    fn stream(
        url: &str,
        timeout: Duration,
        control: &Control,
        events: &Sender<BackendEvent>,
    ) -> Result<(), String> {
        let bytes = Self::download( url, timeout )?;
        let mut decoder = Decoder::from_bytes( bytes, extension_hint( url ) )
            .map_err( |e| e.to_string() )?;
        let channels = decoder.channels();
        let source_rate = decoder.sample_rate();

        // Pairs with `close`: either it sees `device` and joins, or we see `stop`
        control.device.store( true, Ordering::SeqCst );
        if control.stop.load( Ordering::SeqCst ) {
            return Ok(());
        }
        let ( output, queue ) = AudioOutput::open( source_rate, channels as u16 )
            .map_err( |e| e.to_string() )?;
        output.play().map_err( |e| e.to_string() )?;
        let mut converter = RateConverter::new( source_rate, output.sample_rate(), channels )?;

        control.sample_rate.store( source_rate, Ordering::Relaxed );
        let _ = events.send( BackendEvent::Loaded { duration: decoder.duration().unwrap_or( 0.0 ) } );

        // Keep about 50ms decoded ahead of the device
        let target_buffer = source_rate as usize * channels / 20;
        let mut draining = false;
        let mut finished = false;

        loop {
            if control.stop.load( Ordering::Relaxed ) {
                return Ok(());
            }

            queue.set_volume( f32::from_bits( control.volume.load( Ordering::Relaxed ) ) );
            let playing = control.playing.load( Ordering::Relaxed );
            queue.set_paused( !playing );

            if let Some( position ) = control.take_seek() {
                match decoder.seek( position ) {
                    Ok(()) => {
                        queue.clear();
                        converter.reset();
                        control.frames.store( ( position * source_rate as f64 ) as u64, Ordering::Relaxed );
                        draining = false;
                        finished = false;
                    }
                    Err( e ) => tracing::warn!( "Seek failed: {}", e ),
                }
            }

            if draining {
                if queue.is_empty() {
                    draining = false;
                    finished = true;
                    tracing::info!( "Reached end of clip: {}", url );
                    let _ = events.send( BackendEvent::Ended );
                } else {
                    thread::sleep( Duration::from_millis( 10 ) );
                }
                continue;
            }

            if finished || !playing {
                thread::sleep( Duration::from_millis( 10 ) );
                continue;
            }

            if queue.len() > target_buffer {
                thread::sleep( Duration::from_millis( 5 ) );
                continue;
            }

            match decoder.decode_next() {
                Ok( Some( samples ) ) => {
                    let frames = samples.len() / channels.max( 1 );
                    control.frames.fetch_add( frames as u64, Ordering::Relaxed );
                    let converted = converter.process( samples );
                    Self::push_all( &queue, &converted, control );
                }
                Ok( None ) => {
                    let tail = converter.flush();
                    Self::push_all( &queue, &tail, control );
                    draining = true;
                }
                Err( e ) => return Err( e.to_string() ),
            }
        }
    }


    fn push_all( queue: &SampleQueue, samples: &[f32], control: &Control ) {
        let mut offset = 0;
        while offset < samples.len() && !control.stop.load( Ordering::Relaxed ) {
            let pushed = queue.push( &samples[ offset.. ] );
            offset += pushed;
            if pushed == 0 {
                thread::sleep( Duration::from_millis( 5 ) );
            }
        }
    }
}


impl Default for StreamBackend {
    fn default() -> Self {
        Self::new( DEFAULT_TIMEOUT )
    }
}


impl AudioBackend for StreamBackend {
    fn open( &mut self, url: &str ) -> Result<(), TransportError> {
        if !( url.starts_with( "http://" ) || url.starts_with( "https://" ) ) {
            return Err( TransportError::InvalidResource( url.to_string() ) );
        }
        self.close();

        let control = Arc::new( Control::new( self.volume ) );
        let ( tx, rx ) = mpsc::channel();

        let worker_control = Arc::clone( &control );
        let worker_url = url.to_string();
        let timeout = self.timeout;
        let thread = thread::Builder::new()
            .name( "neonplay-stream".into() )
            .spawn( move || Self::run( worker_url, timeout, worker_control, tx ) )
            .map_err( |e| TransportError::Start( e.to_string() ) )?;

        self.worker = Some( Worker {
            control,
            events: rx,
            thread: Some( thread ),
        });
        Ok(())
    }


    fn start( &mut self ) -> Result<(), TransportError> {
        let worker = self.worker.as_ref().ok_or( TransportError::NoResource )?;
        if worker.control.exited.load( Ordering::SeqCst ) {
            return Err( TransportError::Start( "stream is no longer available".into() ) );
        }
        worker.control.playing.store( true, Ordering::Relaxed );
        Ok(())
    }


    fn pause( &mut self ) {
        if let Some( worker ) = self.worker.as_ref() {
            worker.control.playing.store( false, Ordering::Relaxed );
        }
    }


    fn seek( &mut self, seconds: f64 ) -> Result<(), TransportError> {
        let worker = self.worker.as_ref().ok_or( TransportError::NoResource )?;
        *worker.control.seek_to.lock().unwrap_or_else( PoisonError::into_inner ) = Some( seconds );

        let rate = worker.control.sample_rate.load( Ordering::Relaxed );
        worker.control.frames.store( ( seconds * rate as f64 ) as u64, Ordering::Relaxed );
        Ok(())
    }


    fn set_volume( &mut self, volume: f32 ) {
        self.volume = volume;
        if let Some( worker ) = self.worker.as_ref() {
            worker.control.volume.store( volume.to_bits(), Ordering::Relaxed );
        }
    }


    fn close( &mut self ) {
        let Some( mut worker ) = self.worker.take() else {
            return;
        };
        worker.control.stop.store( true, Ordering::SeqCst );

        // A worker that has not reached the device exits on its own once the
        // download returns; one that has is joined so its stream is gone.
        if worker.control.device.load( Ordering::SeqCst ) {
            if let Some( thread ) = worker.thread.take() {
                let _ = thread.join();
            }
        }
    }


    fn poll( &mut self ) -> Vec<BackendEvent> {
        let Some( worker ) = self.worker.as_ref() else {
            return Vec::new();
        };

        let mut events = Vec::new();
        if worker.control.playing.load( Ordering::Relaxed ) {
            if let Some( position ) = worker.control.position() {
                events.push( BackendEvent::Position( position ) );
            }
        }
        events.extend( worker.events.try_iter() );
        events
    }
}


impl Drop for StreamBackend {
    fn drop( &mut self ) {
        self.close();
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_interleave() {
        let planar = vec![ vec![ 1.0, 2.0 ], vec![ 3.0, 4.0 ] ];
        assert_eq!( interleave( &planar ), vec![ 1.0, 3.0, 2.0, 4.0 ] );
        assert!( interleave( &[] ).is_empty() );
    }


    #[test]
    fn test_converter_passthrough_at_same_rate() {
        let mut converter = RateConverter::new( 44100, 44100, 2 ).unwrap();
        assert_eq!( converter.process( vec![ 0.1, 0.2 ] ), vec![ 0.1, 0.2 ] );
        assert!( converter.flush().is_empty() );
    }


    fn worker( control: &Arc<Control>, thread: Option<JoinHandle<()>> ) -> Worker {
        let ( _tx, rx ) = mpsc::channel();
        Worker {
            control: Arc::clone( control ),
            events: rx,
            thread,
        }
    }


    #[test]
    fn test_start_fails_after_worker_exit() {
        let control = Arc::new( Control::new( 1.0 ) );
        let mut backend = StreamBackend::default();
        backend.worker = Some( worker( &control, None ) );
        backend.start().unwrap();

        control.exited.store( true, Ordering::SeqCst );
        backend.pause();
        assert!( matches!( backend.start(), Err( TransportError::Start( _ ) ) ) );
        assert!( !control.playing.load( Ordering::SeqCst ) );
    }


    #[test]
    fn test_close_joins_worker_holding_device() {
        let control = Arc::new( Control::new( 1.0 ) );
        let done = Arc::new( AtomicBool::new( false ) );

        let thread_control = Arc::clone( &control );
        let thread_done = Arc::clone( &done );
        let thread = thread::spawn( move || {
            thread_control.device.store( true, Ordering::SeqCst );
            while !thread_control.stop.load( Ordering::SeqCst ) {
                thread::sleep( Duration::from_millis( 1 ) );
            }
            thread::sleep( Duration::from_millis( 20 ) );
            thread_done.store( true, Ordering::SeqCst );
        });
        while !control.device.load( Ordering::SeqCst ) {
            thread::sleep( Duration::from_millis( 1 ) );
        }

        let mut backend = StreamBackend::default();
        backend.worker = Some( worker( &control, Some( thread ) ) );
        backend.close();
        assert!( done.load( Ordering::SeqCst ) );
    }


    #[test]
    fn test_rejects_non_http_locator() {
        let mut backend = StreamBackend::default();
        assert!( matches!( backend.open( "file:///tmp/a.m4a" ), Err( TransportError::InvalidResource( _ ) ) ) );
        assert!( matches!( backend.start(), Err( TransportError::NoResource ) ) );
    }
}
