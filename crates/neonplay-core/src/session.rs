//! Session store
//!
//! Holds the active identity and exclusively owns its in-memory bundle. Every
//! mutation goes through [`SessionStore::mutate`], which commits the full bundle
//! to the key-value medium unless the session is a guest.

use crate::model::{ Identity, SessionBundle };
use crate::store::{ bundle_key, KeyValueStore, StoreError };


/// How a bundle came to be in memory after activation.
#[derive( Debug, Clone, Copy, PartialEq, Eq )]
pub enum BundleOrigin {
    /// A persisted bundle was read in full.
    Restored,
    /// No usable bundle existed; defaults were used.
    Fresh,
}


/// Owner of the active identity and its session bundle.
pub struct SessionStore<S: KeyValueStore> {
    store: S,
    identity: Option<Identity>,
    bundle: SessionBundle,
}


impl<S: KeyValueStore> SessionStore<S> {
    /// Creates an inactive session store on top of a key-value medium.
    pub fn new( store: S ) -> Self {
        Self {
            store,
            identity: None,
            bundle: SessionBundle::empty( "" ),
        }
    }


    /// Makes `identity` the active one and loads its bundle.
    ///
    /// A missing, unreadable, or corrupt bundle yields an empty one with
    /// default settings (volume 0.5), whatever was in memory before.
    pub fn activate( &mut self, identity: Identity ) -> BundleOrigin {
        let ( bundle, origin ) = if identity.is_guest() {
            ( SessionBundle::empty( identity.id.clone() ), BundleOrigin::Fresh )
        } else {
            match self.read_bundle( &identity.id ) {
                Some( mut bundle ) => {
                    bundle.owner_id = identity.id.clone();
                    bundle.settings.volume = bundle.settings.volume.clamp( 0.0, 1.0 );
                    ( bundle, BundleOrigin::Restored )
                }
                None => ( SessionBundle::empty( identity.id.clone() ), BundleOrigin::Fresh ),
            }
        };

        tracing::info!(
            "Activated session for {} ({:?}): {} favourites, {} playlists",
            identity.id,
            origin,
            bundle.library.len(),
            bundle.playlists.len()
        );

        self.bundle = bundle;
        self.identity = Some( identity );
        origin
    }


    /// Drops the in-memory session. Persisted data is left untouched.
    pub fn deactivate( &mut self ) {
        if let Some( identity ) = self.identity.take() {
            tracing::info!( "Deactivated session for {}", identity.id );
        }
        self.bundle = SessionBundle::empty( "" );
    }


    /// Writes the current bundle under the active identity's key.
    ///
    /// Returns Ok(false) when nothing was written (no identity, or guest).
    pub fn commit( &mut self ) -> Result<bool, StoreError> {
        let identity = match self.identity {
            Some( ref identity ) if !identity.is_guest() => identity,
            _ => return Ok( false ),
        };

        let json = serde_json::to_string( &self.bundle )?;
        self.store.set( &bundle_key( &identity.id ), &json )?;
        tracing::debug!( "Committed bundle for {}", identity.id );
        Ok( true )
    }


    /// Applies `f` to the active bundle and commits it.
    ///
    /// Returns None without calling `f` when no identity is active.
    pub fn mutate<R>( &mut self, f: impl FnOnce( &mut SessionBundle ) -> R ) -> Option<R> {
        self.identity.as_ref()?;

        let result = f( &mut self.bundle );
        if let Err( e ) = self.commit() {
            tracing::warn!( "Failed to commit session bundle: {}", e );
        }
        Some( result )
    }


    /// The active identity, if any.
    pub fn identity( &self ) -> Option<&Identity> {
        self.identity.as_ref()
    }


    pub fn is_active( &self ) -> bool {
        self.identity.is_some()
    }


    /// Read-only view of the in-memory bundle.
    pub fn bundle( &self ) -> &SessionBundle {
        &self.bundle
    }


    /// The underlying key-value medium.
    pub fn store( &self ) -> &S {
        &self.store
    }


    pub fn store_mut( &mut self ) -> &mut S {
        &mut self.store
    }


    fn read_bundle( &self, identity_id: &str ) -> Option<SessionBundle> {
        let raw = match self.store.get( &bundle_key( identity_id ) ) {
            Ok( Some( raw ) ) => raw,
            Ok( None ) => return None,
            Err( e ) => {
                tracing::warn!( "Failed to read bundle for {}: {}", identity_id, e );
                return None;
            }
        };

        match serde_json::from_str( &raw ) {
            Ok( bundle ) => Some( bundle ),
            Err( e ) => {
                tracing::warn!( "Ignoring corrupt bundle for {}: {}", identity_id, e );
                None
            }
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::model::fixtures::track;
    use crate::store::MemoryStore;


    fn user( id: &str ) -> Identity {
        Identity {
            id: id.to_string(),
            display_name: id.to_string(),
            avatar_ref: None,
        }
    }


    #[test]
    fn test_activate_without_bundle_uses_defaults() {
        let mut session = SessionStore::new( MemoryStore::new() );
        session.activate( user( "a" ) );
        session.mutate( |b| b.settings.volume = 0.9 );

        let origin = session.activate( user( "b" ) );
        assert_eq!( origin, BundleOrigin::Fresh );
        assert!( session.bundle().library.is_empty() );
        assert!( session.bundle().playlists.is_empty() );
        assert_eq!( session.bundle().settings.volume, 0.5 );
    }


    #[test]
    fn test_mutation_is_committed_and_restored() {
        let mut session = SessionStore::new( MemoryStore::new() );
        session.activate( user( "a" ) );
        session.mutate( |b| b.library.push( track( "1" ) ) );
        session.deactivate();
        assert!( session.bundle().library.is_empty() );

        let origin = session.activate( user( "a" ) );
        assert_eq!( origin, BundleOrigin::Restored );
        assert_eq!( session.bundle().library.len(), 1 );
    }


    #[test]
    fn test_deactivate_keeps_persisted_bundle() {
        let mut session = SessionStore::new( MemoryStore::new() );
        session.activate( user( "a" ) );
        session.mutate( |b| b.settings.volume = 0.2 );
        session.deactivate();

        assert!( !session.is_active() );
        assert!( session.store().get( &bundle_key( "a" ) ).unwrap().is_some() );
    }


    #[test]
    fn test_guest_is_never_committed() {
        let mut session = SessionStore::new( MemoryStore::new() );
        session.activate( Identity::guest() );
        session.mutate( |b| b.library.push( track( "1" ) ) );

        assert_eq!( session.bundle().library.len(), 1 );
        assert!( session.store().is_empty() );
        assert_eq!( session.commit().unwrap(), false );
    }


    #[test]
    fn test_corrupt_bundle_falls_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.set( &bundle_key( "a" ), "{ not json" ).unwrap();
        let mut session = SessionStore::new( store );

        assert_eq!( session.activate( user( "a" ) ), BundleOrigin::Fresh );
        assert_eq!( session.bundle().settings.volume, 0.5 );
    }


    #[test]
    fn test_switching_identity_never_overwrites_previous_bundle() {
        let mut session = SessionStore::new( MemoryStore::new() );
        session.activate( user( "a" ) );
        session.mutate( |b| b.library.push( track( "1" ) ) );

        session.activate( user( "b" ) );
        session.mutate( |b| b.library.push( track( "2" ) ) );

        session.activate( user( "a" ) );
        let ids: Vec<_> = session.bundle().library.iter().map( |t| t.id.as_str() ).collect();
        assert_eq!( ids, vec![ "1" ] );
    }


    #[test]
    fn test_mutate_without_identity_is_refused() {
        let mut session = SessionStore::new( MemoryStore::new() );
        assert!( session.mutate( |b| b.library.push( track( "1" ) ) ).is_none() );
        assert!( session.bundle().library.is_empty() );
    }
}
