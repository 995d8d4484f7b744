//! Resolver module
//!
//! This module contains the manifest resolution pipeline: core types,
//! configuration, HTTP access, decoding, key file parsing, source selection,
//! content retrieval and descriptor assembly.

pub mod core;
pub mod config;
pub mod http;
pub mod decode;
pub mod keyfile;
pub mod tree;
pub mod sources;
pub mod content;
pub mod assemble;
pub mod orchestrator;

// Re-export main types for convenience
pub use orchestrator::ManifestResolver;
pub use self::core::{
    AppId, AssemblyResult, DepotId, DepotKeys, EntryKind, EntryOutcome, EntryRole, ErrorKind, FileOperation,
    ManifestTree, ProgressCallback, ProgressEvent, ResolveError, Result, SourceRepository, TreeEntry,
    TreeReference, KEY_FILE_NAME, MANIFEST_SUFFIX,
};
pub use config::ResolverConfig;
pub use http::{Fetcher, HttpClient};
pub use decode::decode_content;
pub use keyfile::{parse_key_file, KeyFileError, KeyValue};
pub use tree::{fetch_tree, filter_entries};
pub use sources::{first_success, Fallback, SourceSelector};
pub use content::ContentResolver;
pub use assemble::build_script;
