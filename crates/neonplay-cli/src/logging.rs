//! Log setup
//!
//! The TUI owns the terminal, so logs go to `neonplay.log` in the data
//! directory. `RUST_LOG` overrides the default filter.

use std::fs::{ self, OpenOptions };
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{ layer::SubscriberExt, util::SubscriberInitExt, EnvFilter };


const DEFAULT_FILTER: &str = "neonplay=info,neonplay_core=info,warn";


/// Installs the global subscriber writing to `<dir>/neonplay.log`.
pub fn init( dir: &Path ) -> anyhow::Result<()> {
    fs::create_dir_all( dir )?;
    let file = OpenOptions::new()
        .create( true )
        .append( true )
        .open( dir.join( "neonplay.log" ) )?;

    tracing_subscriber::registry()
        .with( EnvFilter::try_from_default_env().unwrap_or_else( |_| DEFAULT_FILTER.into() ) )
        .with( tracing_subscriber::fmt::layer()
            .with_ansi( false )
            .with_writer( Mutex::new( file ) ) )
        .try_init()?;
    Ok(())
}
