//! Local account registry
//!
//! Credentials are a plain `username -> record` mapping kept under a single
//! key. There is no security here, only a data contract.

use std::collections::BTreeMap;

use serde::{ Deserialize, Serialize };
use thiserror::Error;

use crate::model::{ avatar_url, Identity };
use crate::store::{ KeyValueStore, StoreError, ACTIVE_USER_KEY, USERS_KEY };


/// Validation failures surfaced to whoever initiated the request.
#[derive( Debug, Error )]
pub enum AuthError {
    #[error( "Please fill all fields" )]
    EmptyFields,

    #[error( "User already exists" )]
    UserExists,

    #[error( "User not found" )]
    UserNotFound,

    #[error( "Incorrect password" )]
    WrongPassword,

    #[error( "Storage error: {0}" )]
    Store( #[from] StoreError ),
}


/// Stored credential record: the public profile plus the password.
#[derive( Debug, Clone, Serialize, Deserialize )]
struct CredentialRecord {
    #[serde( flatten )]
    identity: Identity,
    password: String,
}


type CredentialMap = BTreeMap<String, CredentialRecord>;


/// Registers a new user and remembers it as the active identity.
///
/// Fails with [`AuthError::UserExists`] without writing anything if the
/// username is taken.
pub fn register<S: KeyValueStore>(
    store: &mut S,
    username: &str,
    password: &str,
) -> Result<Identity, AuthError> {
    validate( username, password )?;

    let mut users = read_users( store )?;
    if users.contains_key( username ) {
        return Err( AuthError::UserExists );
    }

    let identity = Identity {
        id: format!( "user_{}", uuid::Uuid::new_v4().simple() ),
        display_name: username.to_string(),
        avatar_ref: Some( avatar_url( username ) ),
    };

    users.insert( username.to_string(), CredentialRecord {
        identity: identity.clone(),
        password: password.to_string(),
    });
    store.set( USERS_KEY, &serde_json::to_string( &users ).map_err( StoreError::from )? )?;
    remember( store, &identity )?;

    tracing::info!( "Registered user {} as {}", username, identity.id );
    Ok( identity )
}


/// Checks credentials and remembers the identity on success.
pub fn login<S: KeyValueStore>(
    store: &mut S,
    username: &str,
    password: &str,
) -> Result<Identity, AuthError> {
    validate( username, password )?;

    let users = read_users( store )?;
    let record = users.get( username ).ok_or( AuthError::UserNotFound )?;
    if record.password != password {
        return Err( AuthError::WrongPassword );
    }

    let identity = record.identity.clone();
    remember( store, &identity )?;
    tracing::info!( "Logged in as {}", identity.id );
    Ok( identity )
}


/// Returns the remembered identity from a previous run, if any.
pub fn restore<S: KeyValueStore>( store: &S ) -> Option<Identity> {
    let raw = store.get( ACTIVE_USER_KEY ).ok()??;
    match serde_json::from_str::<Identity>( &raw ) {
        Ok( identity ) if !identity.is_guest() => Some( identity ),
        Ok( _ ) => None,
        Err( e ) => {
            tracing::warn!( "Ignoring corrupt active user record: {}", e );
            None
        }
    }
}


/// Stores the public profile of `identity` as the one to restore next run.
/// Guests are never remembered.
pub fn remember<S: KeyValueStore>( store: &mut S, identity: &Identity ) -> Result<(), StoreError> {
    if identity.is_guest() {
        return Ok(());
    }
    store.set( ACTIVE_USER_KEY, &serde_json::to_string( identity )? )
}


/// Clears the remembered identity.
pub fn forget<S: KeyValueStore>( store: &mut S ) -> Result<(), StoreError> {
    store.remove( ACTIVE_USER_KEY )
}


fn validate( username: &str, password: &str ) -> Result<(), AuthError> {
    if username.trim().is_empty() || password.trim().is_empty() {
        return Err( AuthError::EmptyFields );
    }
    Ok(())
}


fn read_users<S: KeyValueStore>( store: &S ) -> Result<CredentialMap, AuthError> {
    let raw = match store.get( USERS_KEY )? {
        Some( raw ) => raw,
        None => return Ok( CredentialMap::new() ),
    };

    // Unreadable credentials are an error rather than an empty map, so a
    // later write cannot wipe the existing accounts
    serde_json::from_str( &raw ).map_err( |e| {
        tracing::error!( "Credential mapping unreadable: {}", e );
        AuthError::Store( StoreError::from( e ) )
    })
}


#[cfg( test )]
mod tests {
    use super::*;
    use crate::store::MemoryStore;


    #[test]
    fn test_register_then_login() {
        let mut store = MemoryStore::new();
        let registered = register( &mut store, "ayla", "secret" ).unwrap();
        assert!( registered.id.starts_with( "user_" ) );

        let logged_in = login( &mut store, "ayla", "secret" ).unwrap();
        assert_eq!( logged_in, registered );
    }


    #[test]
    fn test_register_existing_fails_without_write() {
        let mut store = MemoryStore::new();
        register( &mut store, "ayla", "secret" ).unwrap();
        let before = store.clone();

        let result = register( &mut store, "ayla", "other" );
        assert!( matches!( result, Err( AuthError::UserExists ) ) );
        assert_eq!( store.get( USERS_KEY ).unwrap(), before.get( USERS_KEY ).unwrap() );
        assert_eq!( store.get( ACTIVE_USER_KEY ).unwrap(), before.get( ACTIVE_USER_KEY ).unwrap() );
    }


    #[test]
    fn test_corrupt_credentials_are_not_overwritten() {
        let mut store = MemoryStore::new();
        store.set( USERS_KEY, "{not json" ).unwrap();

        assert!( matches!( register( &mut store, "ayla", "secret" ), Err( AuthError::Store( _ ) ) ) );
        assert!( matches!( login( &mut store, "ayla", "secret" ), Err( AuthError::Store( _ ) ) ) );
        assert_eq!( store.get( USERS_KEY ).unwrap().as_deref(), Some( "{not json" ) );
        assert_eq!( store.get( ACTIVE_USER_KEY ).unwrap(), None );
    }


    #[test]
    fn test_empty_fields() {
        let mut store = MemoryStore::new();
        assert!( matches!( register( &mut store, "  ", "x" ), Err( AuthError::EmptyFields ) ) );
        assert!( matches!( login( &mut store, "a", "" ), Err( AuthError::EmptyFields ) ) );
        assert!( store.is_empty() );
    }


    #[test]
    fn test_login_failures() {
        let mut store = MemoryStore::new();
        register( &mut store, "ayla", "secret" ).unwrap();
        forget( &mut store ).unwrap();

        assert!( matches!( login( &mut store, "nobody", "x" ), Err( AuthError::UserNotFound ) ) );
        assert!( matches!( login( &mut store, "ayla", "wrong" ), Err( AuthError::WrongPassword ) ) );
        assert!( restore( &store ).is_none() );
    }


    #[test]
    fn test_restore_strips_password() {
        let mut store = MemoryStore::new();
        let identity = register( &mut store, "ayla", "secret" ).unwrap();

        let raw = store.get( ACTIVE_USER_KEY ).unwrap().unwrap();
        assert!( !raw.contains( "secret" ) );
        assert_eq!( restore( &store ), Some( identity ) );
    }


    #[test]
    fn test_guest_is_not_remembered() {
        let mut store = MemoryStore::new();
        remember( &mut store, &Identity::guest() ).unwrap();
        assert!( restore( &store ).is_none() );
        assert!( store.is_empty() );
    }
}
