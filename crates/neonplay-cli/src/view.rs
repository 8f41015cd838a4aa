//! Tab management for the TUI.
//!
//! Tabs are the screen-level layout; the engine's [`View`] is the browsing
//! context. Every tab maps onto one view, except that the playlists tab also
//! covers an open playlist.

use neonplay_core::View;


/// Top-level tab.
#[derive( Debug, Clone, Copy, PartialEq, Eq, Default )]
pub enum Tab {
    #[default]
    Home,
    Search,
    Library,
    Playlists,
    Settings,
}


impl Tab {
    pub const ALL: [Tab; 5] = [ Tab::Home, Tab::Search, Tab::Library, Tab::Playlists, Tab::Settings ];


    /// The tab showing `view`.
    pub fn of( view: &View ) -> Self {
        match view {
            View::Home => Tab::Home,
            View::Search => Tab::Search,
            View::Library => Tab::Library,
            View::Playlists | View::PlaylistDetail( _ ) => Tab::Playlists,
            View::Settings => Tab::Settings,
        }
    }


    /// The view to switch to when this tab is picked.
    pub fn view( self ) -> View {
        match self {
            Tab::Home => View::Home,
            Tab::Search => View::Search,
            Tab::Library => View::Library,
            Tab::Playlists => View::Playlists,
            Tab::Settings => View::Settings,
        }
    }


    /// Returns the next tab in order.
    pub fn next_tab( self ) -> Self {
        match self {
            Tab::Home => Tab::Search,
            Tab::Search => Tab::Library,
            Tab::Library => Tab::Playlists,
            Tab::Playlists => Tab::Settings,
            Tab::Settings => Tab::Home,
        }
    }


    /// Returns the previous tab in order.
    pub fn prev_tab( self ) -> Self {
        match self {
            Tab::Home => Tab::Settings,
            Tab::Search => Tab::Home,
            Tab::Library => Tab::Search,
            Tab::Playlists => Tab::Library,
            Tab::Settings => Tab::Playlists,
        }
    }


    pub fn title( self ) -> &'static str {
        match self {
            Tab::Home => "HOME",
            Tab::Search => "SEARCH",
            Tab::Library => "LIBRARY",
            Tab::Playlists => "PLAYLISTS",
            Tab::Settings => "SETTINGS",
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_open_playlist_belongs_to_playlists_tab() {
        assert_eq!( Tab::of( &View::PlaylistDetail( "p1".into() ) ), Tab::Playlists );
    }


    #[test]
    fn test_tab_cycle() {
        let mut tab = Tab::Home;
        for _ in 0..Tab::ALL.len() {
            assert_eq!( tab.next_tab().prev_tab(), tab );
            assert_eq!( Tab::of( &tab.view() ), tab );
            tab = tab.next_tab();
        }
        assert_eq!( tab, Tab::Home );
    }
}
