//! Audio decoding via Symphonia
//!
//! Decodes a downloaded preview clip held in memory into interleaved f32
//! samples.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{ Decoder as SymphoniaDecoder, DecoderOptions, CODEC_TYPE_NULL };
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{ FormatOptions, FormatReader, SeekMode, SeekTo };
use symphonia::core::io::{ MediaSourceStream, MediaSourceStreamOptions };
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::Time;
use thiserror::Error;


/// Errors that can occur during decoding.
#[derive( Debug, Error )]
pub enum DecoderError {
    #[error( "Unsupported format" )]
    UnsupportedFormat,

    #[error( "No audio tracks found" )]
    NoAudioTrack,

    #[error( "Decoder creation failed: {0}" )]
    DecoderCreation( String ),

    #[error( "Decode error: {0}" )]
    Decode( String ),

    #[error( "Seek error: {0}" )]
    Seek( String ),
}


/// Audio decoder over an in-memory clip.
pub struct Decoder {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn SymphoniaDecoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
    sample_buf: Option<SampleBuffer<f32>>,
    duration: Option<f64>,
}


/// Guesses a container extension from a resource locator, ignoring the query.
pub fn extension_hint( url: &str ) -> Option<&str> {
    let path = url.split( [ '?', '#' ] ).next()?;
    let name = path.rsplit( '/' ).next()?;
    let ( _, ext ) = name.rsplit_once( '.' )?;
    if ext.is_empty() || ext.len() > 5 {
        None
    } else {
        Some( ext )
    }
}


impl Decoder {
    /// Probes and opens an encoded clip.
    pub fn from_bytes( bytes: Vec<u8>, extension: Option<&str> ) -> Result<Self, DecoderError> {
        let mss = MediaSourceStream::new(
            Box::new( Cursor::new( bytes ) ),
            MediaSourceStreamOptions::default(),
        );

        let mut hint = Hint::new();
        if let Some( ext ) = extension {
            hint.with_extension( ext );
        }

        let probed = symphonia::default::get_probe()
            .format( &hint, mss, &FormatOptions::default(), &MetadataOptions::default() )
            .map_err( |_| DecoderError::UnsupportedFormat )?;
        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find( |t| t.codec_params.codec != CODEC_TYPE_NULL )
            .ok_or( DecoderError::NoAudioTrack )?;

        let track_id = track.id;
        let codec_params = &track.codec_params;
        let sample_rate = codec_params.sample_rate.unwrap_or( 44100 );
        let channels = codec_params.channels.map( |c| c.count() ).unwrap_or( 2 );
        let duration = codec_params.n_frames.map( |frames| frames as f64 / sample_rate as f64 );

        tracing::info!(
            "Opened clip: {} Hz, {} channels, duration: {:?}s",
            sample_rate,
            channels,
            duration
        );

        let decoder = symphonia::default::get_codecs()
            .make( codec_params, &DecoderOptions::default() )
            .map_err( |e| DecoderError::DecoderCreation( e.to_string() ) )?;

        Ok( Self {
            format_reader,
            decoder,
            track_id,
            sample_rate,
            channels,
            sample_buf: None,
            duration,
        })
    }


    pub fn sample_rate( &self ) -> u32 {
        self.sample_rate
    }


    pub fn channels( &self ) -> usize {
        self.channels
    }


    /// Duration in seconds, if the container declares it.
    pub fn duration( &self ) -> Option<f64> {
        self.duration
    }


    /// Decodes the next packet into interleaved samples.
    ///
    /// Returns None at end of stream.
    pub fn decode_next( &mut self ) -> Result<Option<Vec<f32>>, DecoderError> {
        loop {
            let packet = match self.format_reader.next_packet() {
                Ok( packet ) => packet,
                Err( SymphoniaError::IoError( ref e ) )
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok( None );
                }
                Err( e ) => return Err( DecoderError::Decode( e.to_string() ) ),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode( &packet ) {
                Ok( decoded ) => decoded,
                // Corrupt packet, skip it
                Err( SymphoniaError::DecodeError( _ ) ) => continue,
                Err( e ) => return Err( DecoderError::Decode( e.to_string() ) ),
            };

            let spec = *decoded.spec();
            let frames = decoded.frames();
            let buf = match self.sample_buf.take() {
                Some( buf ) if buf.capacity() >= frames => buf,
                _ => SampleBuffer::new( frames as u64, spec ),
            };
            let buf = self.sample_buf.insert( buf );
            buf.copy_interleaved_ref( decoded );

            return Ok( Some( buf.samples().to_vec() ) );
        }
    }


    /// Seeks to a position in seconds.
    pub fn seek( &mut self, position_secs: f64 ) -> Result<(), DecoderError> {
        let seek_to = SeekTo::Time {
            time: Time::from( position_secs ),
            track_id: Some( self.track_id ),
        };

        self.format_reader
            .seek( SeekMode::Accurate, seek_to )
            .map_err( |e| DecoderError::Seek( e.to_string() ) )?;
        self.decoder.reset();
        Ok(())
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_extension_hint() {
        assert_eq!( extension_hint( "https://a.test/p/clip.m4a" ), Some( "m4a" ) );
        assert_eq!( extension_hint( "https://a.test/p/clip.mp3?token=1.2" ), Some( "mp3" ) );
        assert_eq!( extension_hint( "https://a.test/p/clip" ), None );
    }


    #[test]
    fn test_garbage_is_unsupported() {
        let result = Decoder::from_bytes( vec![ 0u8; 64 ], Some( "m4a" ) );
        assert!( matches!( result, Err( DecoderError::UnsupportedFormat ) ) );
    }
}
