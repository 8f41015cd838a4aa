//! Persistent key-value medium
//!
//! The engine only needs string get/set/remove. `FileStore` keeps one file per
//! key under a data directory; `MemoryStore` lives for the runtime only.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{ Path, PathBuf };

use thiserror::Error;


/// Key holding the `username -> credentials` mapping.
pub const USERS_KEY: &str = "neonplay_users";

/// Key holding the public profile of the remembered identity.
pub const ACTIVE_USER_KEY: &str = "neonplay_active_user";


/// Key holding the session bundle of one identity.
pub fn bundle_key( identity_id: &str ) -> String {
    format!( "neonplay_data_{}", identity_id )
}


/// Errors from the key-value medium.
#[derive( Debug, Error )]
pub enum StoreError {
    #[error( "IO error: {0}" )]
    Io( #[from] std::io::Error ),

    #[error( "Serialization error: {0}" )]
    Serialize( #[from] serde_json::Error ),

    #[error( "Invalid key: {0}" )]
    InvalidKey( String ),
}


/// String key-value storage.
pub trait KeyValueStore {
    fn get( &self, key: &str ) -> Result<Option<String>, StoreError>;

    fn set( &mut self, key: &str, value: &str ) -> Result<(), StoreError>;

    fn remove( &mut self, key: &str ) -> Result<(), StoreError>;
}


impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get( &self, key: &str ) -> Result<Option<String>, StoreError> {
        ( **self ).get( key )
    }

    fn set( &mut self, key: &str, value: &str ) -> Result<(), StoreError> {
        ( **self ).set( key, value )
    }

    fn remove( &mut self, key: &str ) -> Result<(), StoreError> {
        ( **self ).remove( key )
    }
}


/// In-memory store; nothing survives the process.
#[derive( Debug, Default, Clone )]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}


impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }


    /// Number of stored keys.
    pub fn len( &self ) -> usize {
        self.entries.len()
    }


    pub fn is_empty( &self ) -> bool {
        self.entries.is_empty()
    }
}


impl KeyValueStore for MemoryStore {
    fn get( &self, key: &str ) -> Result<Option<String>, StoreError> {
        Ok( self.entries.get( key ).cloned() )
    }


    fn set( &mut self, key: &str, value: &str ) -> Result<(), StoreError> {
        self.entries.insert( key.to_string(), value.to_string() );
        Ok(())
    }


    fn remove( &mut self, key: &str ) -> Result<(), StoreError> {
        self.entries.remove( key );
        Ok(())
    }
}


/// Directory-backed store, one `<key>.json` file per key.
#[derive( Debug, Clone )]
pub struct FileStore {
    dir: PathBuf,
}


impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new( dir: impl Into<PathBuf> ) -> Self {
        Self { dir: dir.into() }
    }


    /// Default data directory (`~/.local/share/neonplay` on Linux).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map( |d| d.join( "neonplay" ) )
    }


    pub fn dir( &self ) -> &Path {
        &self.dir
    }


    fn path_for( &self, key: &str ) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key.chars().all( |c| c.is_ascii_alphanumeric() || c == '_' || c == '-' );
        if !valid {
            return Err( StoreError::InvalidKey( key.to_string() ) );
        }
        Ok( self.dir.join( format!( "{}.json", key ) ) )
    }
}


impl KeyValueStore for FileStore {
    fn get( &self, key: &str ) -> Result<Option<String>, StoreError> {
        let path = self.path_for( key )?;
        match fs::read_to_string( &path ) {
            Ok( contents ) => Ok( Some( contents ) ),
            Err( e ) if e.kind() == ErrorKind::NotFound => Ok( None ),
            Err( e ) => Err( StoreError::Io( e ) ),
        }
    }


    fn set( &mut self, key: &str, value: &str ) -> Result<(), StoreError> {
        let path = self.path_for( key )?;
        fs::create_dir_all( &self.dir )?;

        // Write beside the target then rename, so a crash never leaves half a bundle
        let tmp = path.with_extension( "json.tmp" );
        fs::write( &tmp, value )?;
        fs::rename( &tmp, &path )?;
        Ok(())
    }


    fn remove( &mut self, key: &str ) -> Result<(), StoreError> {
        let path = self.path_for( key )?;
        match fs::remove_file( &path ) {
            Ok(()) => Ok(()),
            Err( e ) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err( e ) => Err( StoreError::Io( e ) ),
        }
    }
}


#[cfg( test )]
mod tests {
    use super::*;


    #[test]
    fn test_memory_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!( store.get( "a" ).unwrap(), None );
        store.set( "a", "1" ).unwrap();
        assert_eq!( store.get( "a" ).unwrap().as_deref(), Some( "1" ) );
        store.remove( "a" ).unwrap();
        assert!( store.is_empty() );
    }


    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new( dir.path().join( "data" ) );
        store.set( &bundle_key( "user_1" ), "{}" ).unwrap();

        let reopened = FileStore::new( dir.path().join( "data" ) );
        assert_eq!( reopened.get( "neonplay_data_user_1" ).unwrap().as_deref(), Some( "{}" ) );
        assert_eq!( reopened.get( USERS_KEY ).unwrap(), None );
    }


    #[test]
    fn test_file_store_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new( dir.path() );
        assert!( store.remove( ACTIVE_USER_KEY ).is_ok() );
    }


    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new( dir.path() );
        let result = store.set( "../escape", "x" );
        assert!( matches!( result, Err( StoreError::InvalidKey( _ ) ) ) );
    }
}
