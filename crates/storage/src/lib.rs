//! Object-storage backends for the content engine.
//!
//! The [`ObjectBackend`] trait is the minimal capability surface the
//! engine needs from an object store: put/get/head/delete/list/copy plus
//! version listing on versioned keys. Three implementations ship here:
//! [`S3Backend`] for any S3-API-compatible store, [`MemoryBackend`] for
//! tests and embedded use, and [`NoopBackend`] for hosts booted without
//! storage credentials.

pub mod backend;
pub mod error;
pub mod memory;
pub mod noop;
pub mod s3;

pub use backend::{
    BodyReader, CopyResult, MetadataDirective, ObjectBackend, ObjectEntry, ObjectInfo,
    ObjectStream, PutPayload, PutResult, VersionEntry,
};
pub use error::{Result, StorageError};
pub use memory::MemoryBackend;
pub use noop::NoopBackend;
pub use s3::{S3Backend, S3Config};
