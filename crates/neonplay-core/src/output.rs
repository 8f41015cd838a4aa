//! Audio output via cpal
//!
//! Sends decoded PCM samples to the default output device. The stream is
//! created and dropped on the stream worker thread, so it never crosses
//! threads.

use std::collections::VecDeque;
use std::sync::atomic::{ AtomicBool, AtomicU32, Ordering };
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };

use cpal::traits::{ DeviceTrait, HostTrait, StreamTrait };
use thiserror::Error;


/// Errors that can occur with audio output.
#[derive( Debug, Error )]
pub enum OutputError {
    #[error( "No output device available" )]
    NoDevice,

    #[error( "Failed to get stream config: {0}" )]
    StreamConfig( String ),

    #[error( "Failed to build output stream: {0}" )]
    BuildStream( String ),

    #[error( "Failed to play stream: {0}" )]
    PlayStream( String ),
}


/// Samples shared between the decoder (producer) and the device callback
/// (consumer). Converts channel layout on the way out and applies volume.
pub struct SampleQueue {
    samples: Mutex<VecDeque<f32>>,
    capacity: usize,
    paused: AtomicBool,
    /// f32 bits
    volume: AtomicU32,
    source_channels: usize,
    output_channels: usize,
}


impl SampleQueue {
    pub fn new( capacity: usize, source_channels: u16, output_channels: u16 ) -> Self {
        Self {
            samples: Mutex::new( VecDeque::with_capacity( capacity ) ),
            capacity,
            paused: AtomicBool::new( true ),
            volume: AtomicU32::new( 1.0_f32.to_bits() ),
            source_channels: source_channels.max( 1 ) as usize,
            output_channels: output_channels.max( 1 ) as usize,
        }
    }


    fn lock( &self ) -> MutexGuard<'_, VecDeque<f32>> {
        self.samples.lock().unwrap_or_else( PoisonError::into_inner )
    }


    /// Queues as many samples as fit; returns how many were taken.
    pub fn push( &self, samples: &[f32] ) -> usize {
        let mut queue = self.lock();
        let room = self.capacity.saturating_sub( queue.len() );
        let count = samples.len().min( room );
        queue.extend( samples[ ..count ].iter().copied() );
        count
    }


    /// Fills `output` with device frames. Missing frames and pauses are silence.
    pub fn pop( &self, output: &mut [f32] ) {
        output.fill( 0.0 );
        if self.paused.load( Ordering::Relaxed ) {
            return;
        }

        let volume = self.volume();
        let src = self.source_channels;
        let out = self.output_channels;
        let mut queue = self.lock();

        let frames = ( output.len() / out ).min( queue.len() / src );
        let mut frame_buf = Vec::with_capacity( src );
        for frame in output.chunks_exact_mut( out ).take( frames ) {
            frame_buf.clear();
            frame_buf.extend( queue.drain( ..src ) );

            if src == 2 && out == 1 {
                frame[ 0 ] = ( frame_buf[ 0 ] + frame_buf[ 1 ] ) * 0.5 * volume;
                continue;
            }
            for ( ch, sample ) in frame.iter_mut().enumerate() {
                // Extra device channels repeat the last source channel
                *sample = frame_buf[ ch.min( src - 1 ) ] * volume;
            }
        }
    }


    pub fn len( &self ) -> usize {
        self.lock().len()
    }


    pub fn is_empty( &self ) -> bool {
        self.lock().is_empty()
    }


    pub fn clear( &self ) {
        self.lock().clear();
    }


    pub fn set_paused( &self, paused: bool ) {
        self.paused.store( paused, Ordering::Relaxed );
    }


    pub fn set_volume( &self, volume: f32 ) {
        self.volume.store( volume.to_bits(), Ordering::Relaxed );
    }


    pub fn volume( &self ) -> f32 {
        f32::from_bits( self.volume.load( Ordering::Relaxed ) )
    }
}


/// Output stream on the default device.
///
/// Not Send: keep it on the thread that created it.
pub struct AudioOutput {
    stream: cpal::Stream,
    sample_rate: u32,
}


impl AudioOutput {
    /// Opens the default device, preferring a config at the source rate.
    ///
    /// Returns the output and the queue the caller should feed.
    pub fn open(
        source_sample_rate: u32,
        source_channels: u16,
    ) -> Result<( Self, Arc<SampleQueue> ), OutputError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or( OutputError::NoDevice )?;
        tracing::info!( "Using output device: {:?}", device.name() );

        let supported: Vec<_> = device
            .supported_output_configs()
            .map_err( |e| OutputError::StreamConfig( e.to_string() ) )?
            .collect();
        let supports_rate = |c: &cpal::SupportedStreamConfigRange| {
            c.min_sample_rate().0 <= source_sample_rate && c.max_sample_rate().0 >= source_sample_rate
        };

        // Exact layout first, then any layout at our rate, then the device default
        let config = match supported
            .iter()
            .find( |c| c.channels() == source_channels && supports_rate( *c ) )
            .or_else( || supported.iter().find( |c| supports_rate( *c ) ) )
        {
            Some( range ) => range.clone()
                .with_sample_rate( cpal::SampleRate( source_sample_rate ) )
                .config(),
            None => device
                .default_output_config()
                .map_err( |e| OutputError::StreamConfig( e.to_string() ) )?
                .config(),
        };

        tracing::info!(
            "Audio output config: {} Hz, {} channels",
            config.sample_rate.0,
            config.channels
        );

        // About half a second of source audio
        let capacity = source_sample_rate as usize * source_channels as usize / 2;
        let queue = Arc::new( SampleQueue::new( capacity, source_channels, config.channels ) );
        let consumer = Arc::clone( &queue );

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| consumer.pop( data ),
                |err| tracing::error!( "Audio output error: {}", err ),
                None,
            )
            .map_err( |e| OutputError::BuildStream( e.to_string() ) )?;

        Ok(( Self { stream, sample_rate: config.sample_rate.0 }, queue ))
    }


    pub fn play( &self ) -> Result<(), OutputError> {
        self.stream.play().map_err( |e| OutputError::PlayStream( e.to_string() ) )
    }


    /// The device sample rate actually in use.
    pub fn sample_rate( &self ) -> u32 {
        self.sample_rate
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_paused_queue_outputs_silence() {
        let queue = SampleQueue::new( 16, 2, 2 );
        queue.push( &[ 0.5; 8 ] );

        let mut out = [ 1.0; 4 ];
        queue.pop( &mut out );
        assert_eq!( out, [ 0.0; 4 ] );
        assert_eq!( queue.len(), 8 );
    }


    #[test]
    fn test_push_respects_capacity() {
        let queue = SampleQueue::new( 4, 2, 2 );
        assert_eq!( queue.push( &[ 0.1; 6 ] ), 4 );
        assert_eq!( queue.push( &[ 0.1; 2 ] ), 0 );
    }


    #[test]
    fn test_mono_to_stereo_with_volume() {
        let queue = SampleQueue::new( 16, 1, 2 );
        queue.set_paused( false );
        queue.set_volume( 0.5 );
        queue.push( &[ 1.0, 0.5 ] );

        let mut out = [ 9.0; 6 ];
        queue.pop( &mut out );
        assert_eq!( out, [ 0.5, 0.5, 0.25, 0.25, 0.0, 0.0 ] );
        assert!( queue.is_empty() );
    }


    #[test]
    fn test_stereo_to_mono_mixdown() {
        let queue = SampleQueue::new( 16, 2, 1 );
        queue.set_paused( false );
        queue.push( &[ 1.0, 0.0, 0.5, 0.5 ] );

        let mut out = [ 0.0; 2 ];
        queue.pop( &mut out );
        assert_eq!( out, [ 0.5, 0.5 ] );
    }
}
