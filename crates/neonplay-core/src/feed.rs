//! Home feed and search results
//!
//! Holds the two catalog-backed track lists and the in-flight bookkeeping for
//! the requests that fill them. The network call itself happens elsewhere;
//! callers `begin` a request, run it however they like, and hand the outcome
//! back to `finish`.

use crate::catalog::CatalogError;
use crate::model::Track;


/// Queries the home feed picks from.
pub const DEFAULT_HOME_QUERIES: &[&str] = &[
    "The Weeknd",
    "Dua Lipa",
    "Imagine Dragons",
    "Röya",
    "Miri Yusif",
    "Arctic Monkeys",
    "Daft Punk",
    "Kavinsky",
];


/// Which list a request fills.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum FeedTarget {
    Home,
    Search,
}


/// Ticket for one outstanding catalog request.
#[derive( Debug, Clone, PartialEq, Eq )]
pub struct FeedRequest {
    pub target: FeedTarget,
    pub query: String,
    seq: u64,
}


/// Catalog-backed track lists.
#[derive( Debug )]
pub struct Feed {
    home: Vec<Track>,
    results: Vec<Track>,
    last_query: Option<String>,
    in_flight: usize,
    next_seq: u64,
    latest_home: u64,
    latest_search: u64,
    home_queries: Vec<String>,
    discard_stale: bool,
}


impl Feed {
    pub fn new( home_queries: Vec<String>, discard_stale: bool ) -> Self {
        Self {
            home: Vec::new(),
            results: Vec::new(),
            last_query: None,
            in_flight: 0,
            next_seq: 1,
            latest_home: 0,
            latest_search: 0,
            home_queries,
            discard_stale,
        }
    }


    /// Registers a request. Blank queries are refused.
    pub fn begin( &mut self, target: FeedTarget, query: &str ) -> Option<FeedRequest> {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!( "Ignoring blank {:?} query", target );
            return None;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        match target {
            FeedTarget::Home => self.latest_home = seq,
            FeedTarget::Search => {
                self.latest_search = seq;
                self.last_query = Some( query.to_string() );
            }
        }
        self.in_flight += 1;

        tracing::debug!( "Feed request #{} {:?}: {}", seq, target, query );
        Some( FeedRequest { target, query: query.to_string(), seq } )
    }


    /// Starts a home refresh with a randomly picked query.
    pub fn begin_home( &mut self ) -> Option<FeedRequest> {
        let query = self.pick_home_query()?;
        self.begin( FeedTarget::Home, &query )
    }


    /// Completes a request. The in-flight count always drops, whatever the
    /// outcome. Returns true if the result replaced its target list.
    pub fn finish( &mut self, request: &FeedRequest, outcome: Result<Vec<Track>, CatalogError> ) -> bool {
        self.in_flight = self.in_flight.saturating_sub( 1 );

        let tracks = match outcome {
            Ok( tracks ) => tracks,
            Err( e ) => {
                tracing::warn!( "Catalog request for '{}' failed: {}", request.query, e );
                return false;
            }
        };

        let latest = match request.target {
            FeedTarget::Home => self.latest_home,
            FeedTarget::Search => self.latest_search,
        };
        if self.discard_stale && request.seq < latest {
            tracing::info!(
                "Discarding stale {:?} reply #{} (latest #{})",
                request.target,
                request.seq,
                latest
            );
            return false;
        }

        match request.target {
            FeedTarget::Home => self.home = tracks,
            FeedTarget::Search => self.results = tracks,
        }
        true
    }


    pub fn is_loading( &self ) -> bool {
        self.in_flight > 0
    }


    pub fn home( &self ) -> &[Track] {
        &self.home
    }


    pub fn results( &self ) -> &[Track] {
        &self.results
    }


    /// Most recently issued search query.
    pub fn last_query( &self ) -> Option<&str> {
        self.last_query.as_deref()
    }


    /// Picks one of the home queries at random.
    pub fn pick_home_query( &self ) -> Option<String> {
        use std::collections::hash_map::RandomState;
        use std::hash::{ BuildHasher, Hasher };

        if self.home_queries.is_empty() {
            return None;
        }
        let mut h = RandomState::new().build_hasher();
        h.write_u64( self.next_seq );
        let index = h.finish() as usize % self.home_queries.len();
        Some( self.home_queries[ index ].clone() )
    }
}


impl Default for Feed {
    fn default() -> Self {
        Self::new( DEFAULT_HOME_QUERIES.iter().map( |q| q.to_string() ).collect(), true )
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::model::fixtures::track;


    #[test]
    fn test_success_fills_target_and_clears_loading() {
        let mut feed = Feed::default();
        let request = feed.begin( FeedTarget::Search, "daft punk" ).unwrap();
        assert!( feed.is_loading() );

        assert!( feed.finish( &request, Ok( vec![ track( "a" ) ] ) ) );
        assert!( !feed.is_loading() );
        assert_eq!( feed.results().len(), 1 );
        assert!( feed.home().is_empty() );
        assert_eq!( feed.last_query(), Some( "daft punk" ) );
    }


    #[test]
    fn test_failure_clears_loading_and_keeps_list() {
        let mut feed = Feed::default();
        let first = feed.begin( FeedTarget::Search, "a" ).unwrap();
        feed.finish( &first, Ok( vec![ track( "a" ) ] ) );

        let second = feed.begin( FeedTarget::Search, "b" ).unwrap();
        assert!( !feed.finish( &second, Err( CatalogError::Status( 500 ) ) ) );
        assert!( !feed.is_loading() );
        assert_eq!( feed.results()[ 0 ].id, "a" );
    }


    #[test]
    fn test_blank_query_not_issued() {
        let mut feed = Feed::default();
        assert!( feed.begin( FeedTarget::Search, "  " ).is_none() );
        assert!( !feed.is_loading() );
    }


    #[test]
    fn test_stale_reply_discarded() {
        let mut feed = Feed::default();
        let slow = feed.begin( FeedTarget::Search, "slow" ).unwrap();
        let fast = feed.begin( FeedTarget::Search, "fast" ).unwrap();

        assert!( feed.finish( &fast, Ok( vec![ track( "fast" ) ] ) ) );
        assert!( !feed.finish( &slow, Ok( vec![ track( "slow" ) ] ) ) );
        assert_eq!( feed.results()[ 0 ].id, "fast" );
        assert!( !feed.is_loading() );
    }


    #[test]
    fn test_last_reply_wins_when_not_discarding() {
        let mut feed = Feed::new( vec![ "x".into() ], false );
        let slow = feed.begin( FeedTarget::Search, "slow" ).unwrap();
        let fast = feed.begin( FeedTarget::Search, "fast" ).unwrap();

        feed.finish( &fast, Ok( vec![ track( "fast" ) ] ) );
        assert!( feed.finish( &slow, Ok( vec![ track( "slow" ) ] ) ) );
        assert_eq!( feed.results()[ 0 ].id, "slow" );
    }


    #[test]
    fn test_home_and_search_do_not_supersede_each_other() {
        let mut feed = Feed::default();
        let home = feed.begin_home().unwrap();
        let search = feed.begin( FeedTarget::Search, "q" ).unwrap();

        feed.finish( &search, Ok( vec![ track( "s" ) ] ) );
        assert!( feed.finish( &home, Ok( vec![ track( "h" ) ] ) ) );
        assert_eq!( feed.home()[ 0 ].id, "h" );
        assert!( DEFAULT_HOME_QUERIES.contains( &home.query.as_str() ) );
    }


    #[test]
    fn test_no_home_queries() {
        let mut feed = Feed::new( Vec::new(), true );
        assert!( feed.begin_home().is_none() );
    }
}
