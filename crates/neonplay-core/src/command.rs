//! Slash command parsing.
//!
//! Commands are typed at the prompt as `/name args`. Track and playlist
//! arguments are 1-based positions in the list currently on screen.

use std::time::Duration;

use thiserror::Error;

use crate::model::{ Language, Theme };


/// Errors that can occur during command parsing or execution.
#[derive( Debug, Error )]
pub enum CommandError {
    #[error( "Unknown command: {0}" )]
    Unknown( String ),

    #[error( "Invalid argument: {0}" )]
    InvalidArgument( String ),

    #[error( "Missing argument: {0}" )]
    MissingArgument( String ),

    #[error( "Execution failed: {0}" )]
    ExecutionFailed( String ),
}


/// Parsed slash command.
#[derive( Debug, Clone, PartialEq )]
pub enum Command {
    // Account commands
    Register { username: String, password: String },
    Login { username: String, password: String },
    Guest,
    Logout,

    // Navigation commands
    Search { term: String },
    Home,
    Library,
    Playlists,
    Open { playlist: usize },
    Settings,

    // Playback commands
    Play { track: usize },
    Pause,
    Toggle,
    Stop,
    Next,
    Seek { position: Duration },
    Skip { seconds: i64 },

    // Collection commands
    Fav { track: Option<usize> },
    New { name: String },
    Delete { playlist: usize },
    AddTo { playlist: usize, track: Option<usize> },
    Remove { track: usize },

    // Settings commands
    Volume { level: u32 },
    Theme { theme: Theme },
    Lang { language: Language },
    Background { value: String },

    Help,
    Quit,
}


impl Command {
    /// Parses a command string (without the leading `/`).
    pub fn parse( input: &str ) -> Result<Self, CommandError> {
        let input = input.trim();
        let mut parts = input.splitn( 2, ' ' );
        let cmd = parts.next().unwrap_or( "" ).to_lowercase();
        let args = parts.next().map( |s| s.trim() ).filter( |s| !s.is_empty() );

        match cmd.as_str() {
            // Account commands
            "register" | "signup" => {
                let ( username, password ) = credentials( args )?;
                Ok( Command::Register { username, password } )
            }
            "login" => {
                let ( username, password ) = credentials( args )?;
                Ok( Command::Login { username, password } )
            }
            "guest" => Ok( Command::Guest ),
            "logout" => Ok( Command::Logout ),

            // Navigation commands
            "search" | "find" | "?" => {
                let term = args
                    .ok_or_else( || CommandError::MissingArgument( "search term".into() ) )?;
                Ok( Command::Search { term: term.to_string() } )
            }
            "home" | "~" => Ok( Command::Home ),
            "library" | "lib" => Ok( Command::Library ),
            "playlists" | "pl" => Ok( Command::Playlists ),
            "open" | "o" => Ok( Command::Open { playlist: position( args, "playlist number" )? } ),
            "settings" | "set" => Ok( Command::Settings ),

            // Playback commands
            "play" | "p" => Ok( Command::Play { track: position( args, "track number" )? } ),
            "pause" | "pa" => Ok( Command::Pause ),
            "toggle" | "t" => Ok( Command::Toggle ),
            "stop" | "st" => Ok( Command::Stop ),
            "next" | "n" => Ok( Command::Next ),
            "seek" | "sk" => {
                let time_str = args
                    .ok_or_else( || CommandError::MissingArgument( "time position".into() ) )?;
                Ok( Command::Seek { position: parse_time( time_str )? } )
            }
            "skip" => {
                let delta = args
                    .ok_or_else( || CommandError::MissingArgument( "seconds".into() ) )?;
                let seconds = delta.trim_start_matches( '+' ).parse()
                    .map_err( |_| CommandError::InvalidArgument( format!( "Invalid seconds: {}", delta ) ) )?;
                Ok( Command::Skip { seconds } )
            }

            // Collection commands
            "fav" | "f" | "like" => {
                let track = args.map( |_| position( args, "track number" ) ).transpose()?;
                Ok( Command::Fav { track } )
            }
            "new" | "mk" => {
                let name = args
                    .ok_or_else( || CommandError::MissingArgument( "playlist name".into() ) )?;
                Ok( Command::New { name: name.to_string() } )
            }
            "delete" | "del" => Ok( Command::Delete { playlist: position( args, "playlist number" )? } ),
            "addto" | "add" => {
                let args = args
                    .ok_or_else( || CommandError::MissingArgument( "playlist number".into() ) )?;
                let mut words = args.split_whitespace();
                let playlist = position( words.next(), "playlist number" )?;
                let track = words.next().map( |w| position( Some( w ), "track number" ) ).transpose()?;
                Ok( Command::AddTo { playlist, track } )
            }
            "remove" | "rm" => Ok( Command::Remove { track: position( args, "track number" )? } ),

            // Settings commands
            "vol" | "volume" => {
                let level = args
                    .ok_or_else( || CommandError::MissingArgument( "volume level".into() ) )?;
                let level: u32 = level.parse()
                    .map_err( |_| CommandError::InvalidArgument( format!( "Invalid volume: {}", level ) ) )?;
                Ok( Command::Volume { level: level.min( 100 ) } )
            }
            "theme" => {
                let theme = match args.map( str::to_lowercase ).as_deref() {
                    Some( "deep" | "dark" ) => Theme::DeepNeon,
                    Some( "light" ) => Theme::LightNeon,
                    Some( other ) => return Err( CommandError::InvalidArgument(
                        format!( "Invalid theme: '{}'. Use 'deep' or 'light'", other )
                    )),
                    None => return Err( CommandError::MissingArgument( "theme".into() ) ),
                };
                Ok( Command::Theme { theme } )
            }
            "lang" | "language" => {
                let tag = args
                    .ok_or_else( || CommandError::MissingArgument( "language".into() ) )?;
                let language = Language::from_tag( tag ).ok_or_else( || CommandError::InvalidArgument(
                    format!( "Invalid language: '{}'. Use az, en, tr, or ru", tag )
                ))?;
                Ok( Command::Lang { language } )
            }
            "bg" | "background" => {
                let value = args
                    .ok_or_else( || CommandError::MissingArgument( "background".into() ) )?;
                Ok( Command::Background { value: value.to_string() } )
            }

            "help" | "h" => Ok( Command::Help ),
            "quit" | "q" | "exit" => Ok( Command::Quit ),

            "" => Err( CommandError::Unknown( "empty command".into() ) ),
            other => Err( CommandError::Unknown( other.to_string() ) ),
        }
    }


    /// Returns a brief description of the command for help text.
    pub fn description( &self ) -> &'static str {
        match self {
            Command::Register { .. } => "Create an account",
            Command::Login { .. } => "Log in",
            Command::Guest => "Continue as guest",
            Command::Logout => "Log out",
            Command::Search { .. } => "Search the catalog",
            Command::Home => "Show home feed",
            Command::Library => "Show favourites",
            Command::Playlists => "Show playlists",
            Command::Open { .. } => "Open a playlist",
            Command::Settings => "Show settings",
            Command::Play { .. } => "Play a track",
            Command::Pause => "Pause playback",
            Command::Toggle => "Toggle play/pause",
            Command::Stop => "Stop playback",
            Command::Next => "Next track",
            Command::Seek { .. } => "Seek to position",
            Command::Skip { .. } => "Skip forward/back",
            Command::Fav { .. } => "Toggle favourite",
            Command::New { .. } => "Create playlist",
            Command::Delete { .. } => "Delete playlist",
            Command::AddTo { .. } => "Add track to playlist",
            Command::Remove { .. } => "Remove track from open playlist",
            Command::Volume { .. } => "Set volume (0-100)",
            Command::Theme { .. } => "Set theme",
            Command::Lang { .. } => "Set language",
            Command::Background { .. } => "Set background",
            Command::Help => "Show help",
            Command::Quit => "Quit application",
        }
    }
}


fn credentials( args: Option<&str> ) -> Result<( String, String ), CommandError> {
    let mut words = args.unwrap_or( "" ).split_whitespace();
    let username = words.next()
        .ok_or_else( || CommandError::MissingArgument( "username".into() ) )?;
    let password = words.next()
        .ok_or_else( || CommandError::MissingArgument( "password".into() ) )?;
    Ok(( username.to_string(), password.to_string() ))
}


/// Parses a 1-based list position.
fn position( arg: Option<&str>, what: &str ) -> Result<usize, CommandError> {
    let arg = arg.ok_or_else( || CommandError::MissingArgument( what.into() ) )?;
    match arg.parse::<usize>() {
        Ok( n ) if n > 0 => Ok( n ),
        _ => Err( CommandError::InvalidArgument( format!( "Invalid {}: {}", what, arg ) ) ),
    }
}


/// Parses a time string like "1:30" or "90" into a Duration.
fn parse_time( s: &str ) -> Result<Duration, CommandError> {
    let s = s.trim();

    if let Some(( min, sec )) = s.split_once( ':' ) {
        let minutes: u64 = min.parse()
            .map_err( |_| CommandError::InvalidArgument( format!( "Invalid minutes: {}", min ) ) )?;
        let seconds: u64 = sec.parse()
            .map_err( |_| CommandError::InvalidArgument( format!( "Invalid seconds: {}", sec ) ) )?;
        let total = minutes.checked_mul( 60 )
            .and_then( |m| m.checked_add( seconds ) )
            .ok_or_else( || CommandError::InvalidArgument( format!( "Time out of range: {}", s ) ) )?;
        Ok( Duration::from_secs( total ) )
    } else {
        let seconds: u64 = s.parse()
            .map_err( |_| CommandError::InvalidArgument( format!( "Invalid time: {}", s ) ) )?;
        Ok( Duration::from_secs( seconds ) )
    }
}


/// Returns help text listing all available commands.
pub fn help_text() -> &'static str {
    r#"Account Commands:
  /register <user> <pass>   Create an account
  /login <user> <pass>      Log in
  /guest                    Continue as guest
  /logout                   Log out

Navigation Commands:
  /search <term>  Search the catalog     [/]
  /home           Home feed              [1]
  /library        Favourites             [2]
  /playlists      Playlists              [3]
  /open <n>       Open playlist n
  /settings       Settings               [4]

Playback Commands:
  /play <n>       Play track n           [Enter]
  /pause          Pause playback
  /toggle         Play/pause             [Space]
  /stop           Stop playback
  /next           Next track             [n]
  /seek <time>    Seek to position (e.g., 0:15)
  /skip <secs>    Skip by seconds (e.g., -10) [Left/Right]

Collection Commands:
  /fav [n]              Toggle favourite      [f]
  /new <name>           Create playlist
  /delete <n>           Delete playlist n
  /addto <p> [n]        Add track n to playlist p
  /remove <n>           Remove track n from open playlist

Settings Commands:
  /vol <0-100>    Set volume             [+/-]
  /theme <deep|light>
  /lang <az|en|tr|ru>
  /bg <value>     Background colour or preset name
  /help           Show this help         [?]
  /quit           Exit neonplay          [q]"#
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_parse_login() {
        let cmd = Command::parse( "login ayla secret" ).unwrap();
        assert_eq!( cmd, Command::Login { username: "ayla".into(), password: "secret".into() } );
    }


    #[test]
    fn test_parse_login_missing_password() {
        let result = Command::parse( "login ayla" );
        assert!( matches!( result, Err( CommandError::MissingArgument( _ ) ) ) );
    }


    #[test]
    fn test_parse_seek() {
        let cmd = Command::parse( "seek 0:15" ).unwrap();
        assert_eq!( cmd, Command::Seek { position: Duration::from_secs( 15 ) } );
    }


    #[test]
    fn test_parse_seek_seconds() {
        let cmd = Command::parse( "seek 45" ).unwrap();
        assert_eq!( cmd, Command::Seek { position: Duration::from_secs( 45 ) } );
    }


    #[test]
    fn test_parse_seek_out_of_range() {
        assert!( matches!(
            Command::parse( "seek 999999999999999999:00" ),
            Err( CommandError::InvalidArgument( _ ) )
        ));
        assert!( matches!(
            Command::parse( "seek 307445734561825860:59" ),
            Err( CommandError::InvalidArgument( _ ) )
        ));
    }


    #[test]
    fn test_parse_skip_signed() {
        assert_eq!( Command::parse( "skip -10" ).unwrap(), Command::Skip { seconds: -10 } );
        assert_eq!( Command::parse( "skip +5" ).unwrap(), Command::Skip { seconds: 5 } );
    }


    #[test]
    fn test_parse_fav_optional_track() {
        assert_eq!( Command::parse( "fav" ).unwrap(), Command::Fav { track: None } );
        assert_eq!( Command::parse( "fav 3" ).unwrap(), Command::Fav { track: Some( 3 ) } );
    }


    #[test]
    fn test_parse_addto() {
        assert_eq!( Command::parse( "addto 2 5" ).unwrap(), Command::AddTo { playlist: 2, track: Some( 5 ) } );
        assert_eq!( Command::parse( "addto 1" ).unwrap(), Command::AddTo { playlist: 1, track: None } );
    }


    #[test]
    fn test_parse_new_keeps_spaces() {
        let cmd = Command::parse( "new Road Trip" ).unwrap();
        assert_eq!( cmd, Command::New { name: "Road Trip".into() } );
    }


    #[test]
    fn test_parse_positions_are_one_based() {
        assert!( matches!( Command::parse( "play 0" ), Err( CommandError::InvalidArgument( _ ) ) ) );
        assert!( matches!( Command::parse( "play" ), Err( CommandError::MissingArgument( _ ) ) ) );
        assert_eq!( Command::parse( "p 4" ).unwrap(), Command::Play { track: 4 } );
    }


    #[test]
    fn test_parse_settings_values() {
        assert_eq!( Command::parse( "vol 150" ).unwrap(), Command::Volume { level: 100 } );
        assert_eq!( Command::parse( "theme light" ).unwrap(), Command::Theme { theme: Theme::LightNeon } );
        assert_eq!( Command::parse( "lang TR" ).unwrap(), Command::Lang { language: Language::Tr } );
        assert!( matches!( Command::parse( "lang de" ), Err( CommandError::InvalidArgument( _ ) ) ) );
    }


    #[test]
    fn test_parse_unknown() {
        let result = Command::parse( "foobar" );
        assert!( matches!( result, Err( CommandError::Unknown( _ ) ) ) );
    }


    #[test]
    fn test_parse_missing_arg() {
        let result = Command::parse( "search" );
        assert!( matches!( result, Err( CommandError::MissingArgument( _ ) ) ) );
    }
}
