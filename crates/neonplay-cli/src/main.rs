//! neonplay CLI - terminal front end for catalog previews

mod cli;
mod config;
mod input;
mod logging;
mod view;

use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{ Duration, Instant };

use anyhow::{ anyhow, Result };
use clap::Parser;
use crossterm::{
    event::{ self, Event, KeyCode, KeyEventKind, KeyModifiers },
    terminal::{ disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen },
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{ Block, Borders, List, ListItem, ListState, Paragraph, Wrap },
};

use cli::Args;
use config::{ BackendKind, Config };
use input::{ InputBuffer, InputMode };
use view::Tab;

use neonplay_core::{
    command,
    model::BACKGROUND_PRESETS,
    AudioBackend, Catalog, CatalogError, Command, Engine, EngineEvent, Feed, FeedRequest,
    FileStore, KeyValueStore, Language, MemoryStore, SimulatedBackend, StreamBackend, Theme,
    Track, View,
};


type AppEngine = Engine<Box<dyn KeyValueStore>, Box<dyn AudioBackend>>;
type FeedReply = ( FeedRequest, Result<Vec<Track>, CatalogError> );

const SKIP_SECONDS: f64 = 5.0;
const VOLUME_STEP: f32 = 0.05;


/// Application state.
struct App {
    engine: AppEngine,
    should_quit: bool,

    // Catalog requests run on the runtime and report back over the channel
    catalog: Catalog,
    runtime: tokio::runtime::Runtime,
    feed_tx: mpsc::Sender<FeedReply>,
    feed_rx: mpsc::Receiver<FeedReply>,

    // View state
    list_state: ListState,
    show_help: bool,
    help_scroll: u16,

    // Input state
    input_mode: InputMode,
    input_buffer: InputBuffer,

    // Status message (shown in status bar)
    status_message: Option<String>,
    status_clear_at: Option<Instant>,
}


impl App {
    /// Creates a new App instance.
    fn new( args: &Args, config: &Config, data_dir: PathBuf ) -> Result<Self> {
        let store: Box<dyn KeyValueStore> = if args.memory {
            Box::new( MemoryStore::new() )
        } else {
            Box::new( FileStore::new( data_dir ) )
        };

        let backend: Box<dyn AudioBackend> = if args.simulate || config.backend == BackendKind::Simulated {
            tracing::info!( "Using simulated audio backend" );
            Box::new( SimulatedBackend::realtime() )
        } else {
            Box::new( StreamBackend::new( Duration::from_secs( config.audio_timeout_secs ) ) )
        };

        let feed = Feed::new( config.home_queries.clone(), config.discard_stale_responses );
        let catalog = Catalog::new( config.catalog.clone() )?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads( 2 )
            .enable_all()
            .build()?;
        let ( feed_tx, feed_rx ) = mpsc::channel();

        Ok( Self {
            engine: Engine::new( store, backend, feed ),
            should_quit: false,
            catalog,
            runtime,
            feed_tx,
            feed_rx,
            list_state: ListState::default(),
            show_help: false,
            help_scroll: 0,
            input_mode: InputMode::Normal,
            input_buffer: InputBuffer::new(),
            status_message: None,
            status_clear_at: None,
        })
    }


    /// Signs in from the command line flags or the remembered identity.
    fn start_session( &mut self, guest: bool ) {
        if guest {
            let request = self.engine.guest();
            self.spawn_request( request );
            return;
        }

        match self.engine.restore() {
            Some( request ) => self.spawn_request( request ),
            None => self.set_status( "Sign in: /login <user> <pass>, /register <user> <pass>, or /guest" ),
        }
    }


    /// Sets a status message that auto-clears after a delay.
    fn set_status( &mut self, msg: impl Into<String> ) {
        self.status_message = Some( msg.into() );
        self.status_clear_at = Some( Instant::now() + Duration::from_secs( 4 ) );
    }


    /// Runs a catalog request in the background.
    fn spawn_request( &mut self, request: Option<FeedRequest> ) {
        let Some( request ) = request else {
            return;
        };

        let catalog = self.catalog.clone();
        let tx = self.feed_tx.clone();
        self.runtime.spawn( async move {
            let result = catalog.search( &request.query ).await;
            let _ = tx.send(( request, result ));
        });
    }


    /// Updates app state: finished requests, transport progress, engine events.
    fn tick( &mut self ) {
        // Clear expired status messages
        if let Some( clear_at ) = self.status_clear_at {
            if Instant::now() >= clear_at {
                self.status_message = None;
                self.status_clear_at = None;
            }
        }

        while let Ok(( request, result )) = self.feed_rx.try_recv() {
            self.engine.finish_request( &request, result );
        }

        self.engine.tick();

        for event in self.engine.drain_events() {
            match event {
                EngineEvent::SessionActivated { identity, .. } => {
                    self.set_status( format!( "Signed in as {}", identity.display_name ) );
                }
                EngineEvent::SessionDeactivated => self.set_status( "Logged out" ),
                EngineEvent::ViewChanged( _ ) | EngineEvent::FeedUpdated( _ ) => self.reset_selection(),
                EngineEvent::BundleCommitted => self.clamp_selection(),
                EngineEvent::Error( message ) => self.set_status( format!( "Error: {}", message ) ),
                EngineEvent::TrackChanged( _ )
                | EngineEvent::PlaybackStateChanged { .. }
                | EngineEvent::Progress { .. } => {}
            }
        }
    }


    // Lists

    /// Tracks shown in the current view, if it shows tracks.
    fn visible_tracks( &self ) -> Option<&[Track]> {
        match self.engine.view() {
            View::Playlists | View::Settings => None,
            _ => Some( self.engine.context_tracks() ),
        }
    }


    fn list_len( &self ) -> usize {
        match self.engine.view() {
            View::Playlists => self.engine.bundle().playlists.len(),
            View::Settings => 0,
            _ => self.engine.context_tracks().len(),
        }
    }


    fn reset_selection( &mut self ) {
        let selected = ( self.list_len() > 0 ).then_some( 0 );
        self.list_state = ListState::default().with_selected( selected );
    }


    fn clamp_selection( &mut self ) {
        let len = self.list_len();
        match self.list_state.selected() {
            _ if len == 0 => self.list_state.select( None ),
            Some( i ) if i >= len => self.list_state.select( Some( len - 1 ) ),
            None => self.list_state.select( Some( 0 ) ),
            Some( _ ) => {}
        }
    }


    fn select_next( &mut self ) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let i = self.list_state.selected().map_or( 0, |i| ( i + 1 ).min( len - 1 ) );
        self.list_state.select( Some( i ) );
    }


    fn select_previous( &mut self ) {
        let i = self.list_state.selected().map_or( 0, |i| i.saturating_sub( 1 ) );
        if self.list_len() > 0 {
            self.list_state.select( Some( i ) );
        }
    }


    fn selected_track( &self ) -> Option<Track> {
        let index = self.list_state.selected()?;
        self.visible_tracks()?.get( index ).cloned()
    }


    /// Track at a 1-based position of the visible list.
    fn track_at( &self, position: usize ) -> Result<Track> {
        self.visible_tracks()
            .and_then( |tracks| tracks.get( position - 1 ) )
            .cloned()
            .ok_or_else( || anyhow!( "No track #{} in this view", position ) )
    }


    /// Track at a position, or the selected/active one when none is given.
    fn track_or_current( &self, position: Option<usize> ) -> Result<Track> {
        match position {
            Some( n ) => self.track_at( n ),
            None => self.selected_track()
                .or_else( || self.engine.playback().active_track.clone() )
                .ok_or_else( || anyhow!( "No track selected" ) ),
        }
    }


    /// Playlist id at a 1-based position.
    fn playlist_at( &self, position: usize ) -> Result<String> {
        self.engine.bundle().playlists
            .get( position - 1 )
            .map( |p| p.id.clone() )
            .ok_or_else( || anyhow!( "No playlist #{}", position ) )
    }


    // Input

    fn handle_key( &mut self, code: KeyCode, modifiers: KeyModifiers ) {
        match self.input_mode {
            InputMode::Normal => self.handle_normal_key( code, modifiers ),
            InputMode::Command | InputMode::Search => self.handle_prompt_key( code ),
        }
    }


    fn handle_normal_key( &mut self, code: KeyCode, modifiers: KeyModifiers ) {
        if self.show_help {
            self.handle_help_key( code );
            return;
        }

        let tab = Tab::of( self.engine.view() );
        match code {
            KeyCode::Char( 'c' ) if modifiers.contains( KeyModifiers::CONTROL ) => self.should_quit = true,
            KeyCode::Char( 'q' ) => self.should_quit = true,
            KeyCode::Char( '/' ) => self.open_prompt( InputMode::Command ),
            KeyCode::Char( 's' ) => {
                self.engine.navigate( View::Search );
                self.open_prompt( InputMode::Search );
            }
            KeyCode::Char( '?' ) => self.show_help = true,
            KeyCode::Tab => self.engine.navigate( tab.next_tab().view() ),
            KeyCode::BackTab => self.engine.navigate( tab.prev_tab().view() ),
            KeyCode::Char( c @ '1'..='5' ) => {
                let index = c as usize - '1' as usize;
                self.engine.navigate( Tab::ALL[ index ].view() );
            }
            KeyCode::Up | KeyCode::Char( 'k' ) => self.select_previous(),
            KeyCode::Down | KeyCode::Char( 'j' ) => self.select_next(),
            KeyCode::Enter => self.activate_selected(),
            KeyCode::Char( ' ' ) => {
                // Failures arrive as engine events
                let _ = self.engine.toggle_play();
            }
            KeyCode::Char( 'n' ) => self.engine.next(),
            KeyCode::Left => {
                let _ = self.engine.skip( -SKIP_SECONDS );
            }
            KeyCode::Right => {
                let _ = self.engine.skip( SKIP_SECONDS );
            }
            KeyCode::Char( '+' ) | KeyCode::Char( '=' ) => self.nudge_volume( VOLUME_STEP ),
            KeyCode::Char( '-' ) => self.nudge_volume( -VOLUME_STEP ),
            KeyCode::Char( 'f' ) => self.report( |app| app.toggle_favorite( None ) ),
            KeyCode::Char( 'r' ) => {
                let request = self.engine.begin_home();
                self.spawn_request( request );
            }
            KeyCode::Char( 'x' ) | KeyCode::Delete => self.report( App::delete_selected ),
            KeyCode::Esc | KeyCode::Backspace => {
                if matches!( self.engine.view(), View::PlaylistDetail( _ ) ) {
                    self.engine.navigate( View::Playlists );
                }
            }
            _ => {}
        }
    }


    fn handle_help_key( &mut self, code: KeyCode ) {
        match code {
            KeyCode::Up | KeyCode::Char( 'k' ) => self.help_scroll = self.help_scroll.saturating_sub( 1 ),
            KeyCode::Down | KeyCode::Char( 'j' ) => self.help_scroll = self.help_scroll.saturating_add( 1 ),
            KeyCode::Char( 'q' ) => self.should_quit = true,
            _ => {
                self.show_help = false;
                self.help_scroll = 0;
            }
        }
    }


    fn handle_prompt_key( &mut self, code: KeyCode ) {
        match code {
            KeyCode::Enter => {
                let input = self.input_buffer.take();
                let mode = self.input_mode;
                self.input_mode = InputMode::Normal;
                match mode {
                    InputMode::Command => self.execute_command( &input ),
                    InputMode::Search => self.report( |app| app.run_command( Command::Search { term: input } ) ),
                    InputMode::Normal => {}
                }
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.input_buffer.clear();
            }
            KeyCode::Backspace => {
                if self.input_buffer.is_empty() {
                    self.input_mode = InputMode::Normal;
                } else {
                    self.input_buffer.backspace();
                }
            }
            KeyCode::Delete => self.input_buffer.delete(),
            KeyCode::Left => self.input_buffer.move_left(),
            KeyCode::Right => self.input_buffer.move_right(),
            KeyCode::Home => self.input_buffer.move_home(),
            KeyCode::End => self.input_buffer.move_end(),
            KeyCode::Char( c ) => self.input_buffer.insert( c ),
            _ => {}
        }
    }


    fn open_prompt( &mut self, mode: InputMode ) {
        self.input_mode = mode;
        self.input_buffer.clear();
    }


    /// Enter: play a track, or open a playlist from the listing.
    fn activate_selected( &mut self ) {
        if *self.engine.view() == View::Playlists {
            if let Some( i ) = self.list_state.selected() {
                self.report( |app| app.run_command( Command::Open { playlist: i + 1 } ) );
            }
            return;
        }
        if let Some( track ) = self.selected_track() {
            let _ = self.engine.play_now( track );
        }
    }


    fn delete_selected( &mut self ) -> Result<()> {
        let Some( i ) = self.list_state.selected() else {
            return Ok(());
        };
        match self.engine.view() {
            View::Playlists => self.run_command( Command::Delete { playlist: i + 1 } ),
            View::PlaylistDetail( _ ) => self.run_command( Command::Remove { track: i + 1 } ),
            _ => Ok(()),
        }
    }


    fn nudge_volume( &mut self, delta: f32 ) {
        let volume = self.engine.transport().volume() + delta;
        self.report( |app| Ok( app.engine.set_volume( volume )? ) );
    }


    fn toggle_favorite( &mut self, position: Option<usize> ) -> Result<()> {
        let track = self.track_or_current( position )?;
        let added = self.engine.toggle_favorite( &track )?;
        let verb = if added { "Added to" } else { "Removed from" };
        self.set_status( format!( "{} favourites: {}", verb, track.title ) );
        Ok(())
    }


    /// Runs `f`, showing any error in the status bar.
    fn report( &mut self, f: impl FnOnce( &mut App ) -> Result<()> ) {
        if let Err( e ) = f( self ) {
            self.set_status( format!( "Error: {}", e ) );
        }
    }


    fn execute_command( &mut self, input: &str ) {
        match Command::parse( input ) {
            Ok( cmd ) => self.report( |app| app.run_command( cmd ) ),
            Err( e ) => self.set_status( format!( "{}", e ) ),
        }
    }


    fn run_command( &mut self, cmd: Command ) -> Result<()> {
        match cmd {
            // Account commands
            Command::Register { username, password } => {
                let request = self.engine.register( &username, &password )?;
                self.spawn_request( request );
            }
            Command::Login { username, password } => {
                let request = self.engine.login( &username, &password )?;
                self.spawn_request( request );
            }
            Command::Guest => {
                let request = self.engine.guest();
                self.spawn_request( request );
            }
            Command::Logout => self.engine.logout(),

            // Navigation commands
            Command::Search { term } => {
                self.engine.navigate( View::Search );
                let request = self.engine.begin_search( &term )
                    .ok_or_else( || anyhow!( "Search term is empty" ) )?;
                self.set_status( format!( "Searching for '{}'...", request.query ) );
                self.spawn_request( Some( request ) );
            }
            Command::Home => self.engine.navigate( View::Home ),
            Command::Library => self.engine.navigate( View::Library ),
            Command::Playlists => self.engine.navigate( View::Playlists ),
            Command::Open { playlist } => {
                let id = self.playlist_at( playlist )?;
                self.engine.open_playlist( &id );
            }
            Command::Settings => self.engine.navigate( View::Settings ),

            // Playback commands
            Command::Play { track } => {
                let track = self.track_at( track )?;
                // Failures arrive as engine events
                let _ = self.engine.play_now( track );
            }
            Command::Pause => self.engine.pause()?,
            Command::Toggle => self.engine.toggle_play()?,
            Command::Stop => self.engine.stop(),
            Command::Next => self.engine.next(),
            Command::Seek { position } => self.engine.seek( position.as_secs_f64() )?,
            Command::Skip { seconds } => self.engine.skip( seconds as f64 )?,

            // Collection commands
            Command::Fav { track } => self.toggle_favorite( track )?,
            Command::New { name } => {
                self.engine.create_playlist( &name )?;
                self.set_status( format!( "Created playlist '{}'", name.trim() ) );
            }
            Command::Delete { playlist } => {
                let id = self.playlist_at( playlist )?;
                self.engine.delete_playlist( &id )?;
                self.set_status( "Playlist deleted" );
            }
            Command::AddTo { playlist, track } => {
                let id = self.playlist_at( playlist )?;
                let track = self.track_or_current( track )?;
                if self.engine.add_track_to_playlist( &id, &track )? {
                    self.set_status( format!( "Added '{}'", track.title ) );
                } else {
                    self.set_status( "Already in playlist" );
                }
            }
            Command::Remove { track } => {
                let id = self.engine.view().open_playlist()
                    .map( str::to_string )
                    .ok_or_else( || anyhow!( "Open a playlist first" ) )?;
                let track = self.track_at( track )?;
                self.engine.remove_track_from_playlist( &id, &track.id )?;
            }

            // Settings commands
            Command::Volume { level } => self.engine.set_volume( level as f32 / 100.0 )?,
            Command::Theme { theme } => self.engine.set_theme( theme )?,
            Command::Lang { language } => self.engine.set_language( language )?,
            Command::Background { value } => {
                let background = BACKGROUND_PRESETS
                    .iter()
                    .find( |( name, _ )| name.eq_ignore_ascii_case( &value ) )
                    .map_or( value.as_str(), |( _, css )| css );
                self.engine.set_background( background )?;
            }

            Command::Help => self.show_help = true,
            Command::Quit => self.should_quit = true,
        }
        Ok(())
    }


    fn accent( &self ) -> Color {
        match self.engine.bundle().settings.theme {
            Theme::DeepNeon => Color::Magenta,
            Theme::LightNeon => Color::Cyan,
        }
    }
}


fn main() -> Result<()> {
    let args = Args::parse();

    let data_dir = args.data_dir.clone()
        .or_else( FileStore::default_dir )
        .unwrap_or_else( || PathBuf::from( ".neonplay" ) );
    if let Err( e ) = logging::init( &data_dir ) {
        eprintln!( "Logging disabled: {}", e );
    }

    let config = Config::load( args.config.as_deref() );
    if args.config.is_none() {
        if let Some( path ) = Config::default_path().filter( |p| !p.exists() ) {
            config.save( &path );
        }
    }
    tracing::info!( "Starting neonplay, data in {}", data_dir.display() );

    // Create app
    let mut app = App::new( &args, &config, data_dir )?;
    app.start_session( args.guest );

    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute( EnterAlternateScreen )?;
    let mut terminal = Terminal::new( CrosstermBackend::new( io::stdout() ) )?;

    let result = run( &mut terminal, &mut app );

    // Cleanup
    disable_raw_mode()?;
    io::stdout().execute( LeaveAlternateScreen )?;
    tracing::info!( "Exiting neonplay" );

    result
}


/// Main loop.
fn run( terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App ) -> Result<()> {
    loop {
        // Update state
        app.tick();

        // Draw UI
        terminal.draw( |frame| draw_ui( frame, app ) )?;

        // Handle events with timeout
        if event::poll( Duration::from_millis( 100 ) )? {
            if let Event::Key( key ) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key( key.code, key.modifiers );
                }
            }
        }

        if app.should_quit {
            app.engine.stop();
            return Ok(());
        }
    }
}


/// Formats seconds as M:SS.
fn format_time( seconds: f64 ) -> String {
    let secs = seconds.max( 0.0 ) as u64;
    format!( "{}:{:02}", secs / 60, secs % 60 )
}


/// Draws the main UI.
fn draw_ui( frame: &mut Frame, app: &mut App ) {
    let area = frame.area();

    // Create layout
    let chunks = Layout::default()
        .direction( Direction::Vertical )
        .constraints([
            Constraint::Length( 2 ),  // Header
            Constraint::Min( 0 ),     // Main content
            Constraint::Length( 5 ),  // Now playing
            Constraint::Length( 1 ),  // Status bar
        ])
        .split( area );

    // Header with view indicator and user
    let tab = Tab::of( app.engine.view() );
    let user = app.engine.identity()
        .map( |i| i.display_name.clone() )
        .unwrap_or_else( || "not signed in".to_string() );
    let loading = if app.engine.is_loading() { "  [loading]" } else { "" };
    let header = Paragraph::new( format!( "  NEONPLAY - {}{}    {}", tab.title(), loading, user ) )
        .style( Style::default().fg( app.accent() ).bold() )
        .block( Block::default().borders( Borders::BOTTOM ) );
    frame.render_widget( header, chunks[0] );

    // Main content area based on view
    if app.show_help {
        draw_help( frame, app, chunks[1] );
    } else if app.engine.identity().is_none() {
        draw_welcome( frame, app, chunks[1] );
    } else {
        match app.engine.view().clone() {
            View::Playlists => draw_playlists( frame, app, chunks[1] ),
            View::Settings => draw_settings( frame, app, chunks[1] ),
            view => draw_tracks( frame, app, &view, chunks[1] ),
        }
    }

    // Now playing
    draw_now_playing( frame, app, chunks[2] );

    // Status bar
    draw_status_bar( frame, app, chunks[3] );
}


fn draw_welcome( frame: &mut Frame, app: &App, area: Rect ) {
    let lines = vec![
        Line::from( "" ),
        Line::from( Span::styled( "  Welcome to neonplay", Style::default().fg( app.accent() ).bold() ) ),
        Line::from( "" ),
        Line::from( "  /login <user> <pass>      sign in" ),
        Line::from( "  /register <user> <pass>   create an account" ),
        Line::from( "  /guest                    continue without saving" ),
    ];
    let welcome = Paragraph::new( lines )
        .block( Block::default().borders( Borders::ALL ) );
    frame.render_widget( welcome, area );
}


fn draw_tracks( frame: &mut Frame, app: &mut App, view: &View, area: Rect ) {
    let active_id = app.engine.playback().active_track.as_ref().map( |t| t.id.clone() );
    let bundle = app.engine.bundle();
    let tracks = app.engine.context_tracks();

    let items: Vec<ListItem> = tracks
        .iter()
        .enumerate()
        .map( |( i, track )| {
            let marker = if active_id.as_deref() == Some( track.id.as_str() ) { ">" } else { " " };
            let heart = if bundle.in_library( &track.id ) { "*" } else { " " };
            let preview = if track.audio_url.is_some() { "" } else { "  (no preview)" };
            ListItem::new( format!(
                "{}{:>3}. {} {} - {}  [{}]{}",
                marker,
                i + 1,
                heart,
                track.title,
                track.artist,
                format_time( track.duration_seconds ),
                preview
            ))
        })
        .collect();

    let title = match view {
        View::Search => match app.engine.feed().last_query() {
            Some( query ) => format!( " Results for '{}' ({}) ", query, tracks.len() ),
            None => " Search [s] ".to_string(),
        },
        View::Library => format!( " Favourites ({}) ", tracks.len() ),
        View::PlaylistDetail( id ) => match bundle.playlist( id ) {
            Some( playlist ) => format!( " {} ({}) [Esc] Back ", playlist.name, tracks.len() ),
            None => " Playlist ".to_string(),
        },
        _ => format!( " Discover ({}) ", tracks.len() ),
    };

    let list = List::new( items )
        .block( Block::default().title( title ).borders( Borders::ALL ) )
        .highlight_style( Style::default().bg( Color::DarkGray ) )
        .highlight_symbol( ">> " );

    frame.render_stateful_widget( list, area, &mut app.list_state );
}


fn draw_playlists( frame: &mut Frame, app: &mut App, area: Rect ) {
    let items: Vec<ListItem> = app.engine.bundle().playlists
        .iter()
        .enumerate()
        .map( |( i, playlist )| {
            ListItem::new( format!( "{:>3}. {}  ({} tracks)", i + 1, playlist.name, playlist.tracks.len() ) )
        })
        .collect();

    let title = if items.is_empty() {
        " Playlists - create one with /new <name> "
    } else {
        " Playlists "
    };
    let list = List::new( items )
        .block( Block::default().title( title ).borders( Borders::ALL ) )
        .highlight_style( Style::default().bg( Color::DarkGray ) )
        .highlight_symbol( ">> " );

    frame.render_stateful_widget( list, area, &mut app.list_state );
}


fn draw_settings( frame: &mut Frame, app: &App, area: Rect ) {
    let settings = &app.engine.bundle().settings;
    let theme = match settings.theme {
        Theme::DeepNeon => "Deep Neon",
        Theme::LightNeon => "Light Neon",
    };
    let language = match settings.language {
        Language::Az => "Azərbaycan",
        Language::En => "English",
        Language::Tr => "Türkçe",
        Language::Ru => "Русский",
    };

    let rows = [
        ( "Theme", theme.to_string(), "/theme <deep|light>" ),
        ( "Language", language.to_string(), "/lang <az|en|tr|ru>" ),
        ( "Volume", format!( "{}%", ( settings.volume * 100.0 ).round() as i32 ), "/vol <0-100>  [+/-]" ),
        ( "Background", settings.background.clone(), "/bg <value|preset>" ),
    ];

    let items: Vec<ListItem> = rows
        .iter()
        .map( |( name, value, hint )| {
            ListItem::new( Line::from( vec![
                Span::styled( format!( " {:<12}", name ), Style::default().fg( Color::White ) ),
                Span::styled( format!( "{:<28}", value ), Style::default().fg( app.accent() ).bold() ),
                Span::styled( hint.to_string(), Style::default().fg( Color::DarkGray ) ),
            ]))
        })
        .collect();

    let list = List::new( items )
        .block(
            Block::default()
                .title( " Settings " )
                .borders( Borders::ALL )
                .border_style( Style::default().fg( app.accent() ) )
        );

    frame.render_widget( list, area );
}


fn draw_help( frame: &mut Frame, app: &mut App, area: Rect ) {
    let help = Paragraph::new( command::help_text() )
        .block( Block::default().title( " Help [any key] Close " ).borders( Borders::ALL ) )
        .wrap( Wrap { trim: false } )
        .scroll(( app.help_scroll, 0 ));
    frame.render_widget( help, area );
}


fn draw_now_playing( frame: &mut Frame, app: &App, area: Rect ) {
    let playback = app.engine.playback();
    let state_str = if playback.is_playing { ">" } else { "||" };

    let ( title, artist_album ) = match playback.active_track {
        Some( ref track ) => ( track.title.clone(), format!( "{} - {}", track.artist, track.album ) ),
        None => ( "No track".to_string(), String::new() ),
    };

    // Calculate progress bar
    let progress_width = 20;
    let progress = if playback.duration > 0.0 {
        ( playback.position / playback.duration ).clamp( 0.0, 1.0 )
    } else {
        0.0
    };
    let filled = ( progress * progress_width as f64 ).round() as usize;
    let bar = format!(
        "[{}{}]",
        "█".repeat( filled ),
        "░".repeat( progress_width - filled )
    );

    let mut lines = vec![
        Line::from( Span::styled( format!( " {} {} ", state_str, title ), Style::default().bold() ) ),
    ];

    // Only add artist/album line if there's content
    if !artist_album.is_empty() {
        lines.push( Line::from( Span::styled( format!( "   {} ", artist_album ), Style::default().fg( Color::Gray ) ) ) );
    }

    let vol_pct = ( app.engine.transport().volume() * 100.0 ).round() as i32;
    let vol_str = if vol_pct == 0 { "muted".to_string() } else { format!( "vol {}%", vol_pct ) };
    lines.push( Line::from( format!(
        " {} {} / {}  {} ",
        bar,
        format_time( playback.position ),
        format_time( playback.duration ),
        vol_str
    )));

    let now_playing = Paragraph::new( lines )
        .block( Block::default().title( " Now Playing " ).borders( Borders::ALL ) );

    frame.render_widget( now_playing, area );
}


fn draw_status_bar( frame: &mut Frame, app: &App, area: Rect ) {
    let ( text, style ) = match app.input_mode {
        InputMode::Command | InputMode::Search => (
            format!( "{}{}", app.input_mode.prefix(), app.input_buffer.content() ),
            Style::default().fg( Color::Yellow ),
        ),
        InputMode::Normal => {
            if let Some( ref msg ) = app.status_message {
                ( msg.clone(), Style::default().fg( Color::Green ) )
            } else {
                let hint = match app.engine.view() {
                    View::Playlists => " [/]Cmd [Tab]Views [Enter]Open [x]Delete [?]Help [q]Quit ",
                    View::PlaylistDetail( _ ) => " [/]Cmd [Enter]Play [x]Remove [f]Fav [Esc]Back [?]Help ",
                    View::Settings => " [/]Cmd [Tab]Views [+/-]Volume [?]Help [q]Quit ",
                    _ => " [/]Cmd [s]Search [Tab]Views [Enter]Play [Space]Pause [n]Next [f]Fav [?]Help [q]Quit ",
                };
                ( hint.to_string(), Style::default().fg( Color::DarkGray ) )
            }
        }
    };

    let status = Paragraph::new( text ).style( style );
    frame.render_widget( status, area );

    // Show cursor at the prompt
    if app.input_mode != InputMode::Normal {
        let cursor_x = area.x
            + app.input_mode.prefix().chars().count() as u16
            + app.input_buffer.cursor_char_pos() as u16;
        frame.set_cursor_position(( cursor_x, area.y ));
    }
}
