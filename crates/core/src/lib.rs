//! gd-core: Core library for the gd drive client
//!
//! This crate provides the core functionality for gd, including:
//! - Path resolution from slash paths to remote object ids
//! - Tree enumeration for remote and local trees
//! - Query evaluation over enumerated trees
//! - Upload and download with per-item conflict policy
//! - Configuration and parent management
//!
//! This crate is independent of any specific drive API. Backends implement
//! [`RemoteStore`]; [`MemoryStore`] is a complete in-process implementation.

pub mod config;
pub mod enumerate;
pub mod error;
pub mod memory;
pub mod ops;
pub mod parent;
pub mod path;
pub mod query;
pub mod resolver;
pub mod sync;
pub mod traits;

pub use config::{Config, ConfigManager};
pub use enumerate::{Depth, Entry, TreeListing, enumerate_local, enumerate_remote};
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use ops::{RemovedObject, WorkingDir, change_dir, make_dir, remove};
pub use parent::{Parent, ParentManager};
pub use path::DrivePath;
pub use query::{Query, find};
pub use resolver::{IdChain, RenderedPath, Resolver, Terminal};
pub use sync::{
    Action, CancelFlag, ConflictResolver, Decision, FixedPolicy, SyncEngine, SyncObserver,
    SyncReport, TransferPolicy,
};
pub use traits::{ObjectKind, RemoteObject, RemoteStore, TypeFilter, UploadTarget};
