//! neonplay core - playback and session-state engine
//!
//! Owns the single audio transport, the per-user session bundle (library,
//! playlists, settings) and the sequencing that decides what plays next.
//! Front ends drive an [`Engine`] and render from its state and events.

pub mod accounts;
pub mod catalog;
pub mod collections;
pub mod command;
pub mod decoder;
pub mod engine;
pub mod feed;
pub mod model;
pub mod output;
pub mod sequencer;
pub mod session;
pub mod simulated;
pub mod store;
pub mod stream;
pub mod transport;

pub use accounts::AuthError;
pub use catalog::{ Catalog, CatalogConfig, CatalogError };
pub use collections::CollectionError;
pub use command::{ Command, CommandError };
pub use engine::{ Engine, EngineEvent, PlaybackState };
pub use feed::{ Feed, FeedRequest, FeedTarget, DEFAULT_HOME_QUERIES };
pub use model::{ Identity, Language, Playlist, SessionBundle, Settings, Theme, Track };
pub use sequencer::View;
pub use session::{ BundleOrigin, SessionStore };
pub use simulated::SimulatedBackend;
pub use store::{ FileStore, KeyValueStore, MemoryStore, StoreError };
pub use stream::StreamBackend;
pub use transport::{ AudioBackend, Transport, TransportError, TransportState };
