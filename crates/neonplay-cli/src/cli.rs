//! Command-line argument parsing for neonplay.

use std::path::PathBuf;

use clap::Parser;


/// neonplay - a terminal music player for catalog previews.
#[derive( Parser, Debug )]
#[command( name = "neonplay" )]
#[command( version, about, long_about = None )]
pub struct Args {
    /// Directory holding accounts and session data.
    #[arg( short, long )]
    pub data_dir: Option<PathBuf>,

    /// Config file to use instead of the default location.
    #[arg( short, long )]
    pub config: Option<PathBuf>,

    /// Skip the login prompt and start a guest session.
    #[arg( short, long )]
    pub guest: bool,

    /// Use the simulated audio backend instead of the sound card.
    #[arg( short, long )]
    pub simulate: bool,

    /// Keep all data in memory; nothing is written to disk.
    #[arg( short, long )]
    pub memory: bool,
}
