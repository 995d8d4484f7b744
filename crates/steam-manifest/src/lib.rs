//! Steam manifest resolver
//!
//! This library resolves a Steam AppID to the depot manifests and decryption
//! keys published in community manifest repositories, and writes them out
//! together with a descriptor script for the content loading tool.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use steam_manifest::{AppId, ManifestResolver, ProgressEvent, ResolverConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> steam_manifest::Result<()> {
//! // Configuration from MANIFEST_* variables (and .env), or defaults
//! let config = ResolverConfig::from_env()?;
//!
//! // Set up progress callback (optional)
//! let resolver = ManifestResolver::new(config)?.with_progress(Arc::new(|event| match event {
//!     ProgressEvent::RepositoryStarted { repository } => println!("Trying {}", repository),
//!     ProgressEvent::EntrySaved { path, size } => println!("Saved {} ({} bytes)", path, size),
//!     _ => {}
//! }));
//!
//! let result = resolver.resolve(AppId(348970)).await?;
//! println!("Descriptor written to {}", result.descriptor_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Output
//!
//! For AppID `<id>` the resolver creates `[<id>]/` under the output root,
//! holding every `<depot>_<manifest>.manifest` file and `<id>.lua`:
//!
//! ```text
//! addappid(<id>)
//! addappid(<depot>,0,"<key>")
//! setManifestid(<depot>,"<manifest>")
//! ```
//!
//! Repositories are tried in priority order; if all of them fail the output
//! directory is removed again and the combined error is returned.

pub mod resolver;
pub mod search;

// Re-export commonly used types for convenience
pub use resolver::{
    AppId, AssemblyResult, ErrorKind, Fetcher, HttpClient, ManifestResolver, ProgressCallback,
    ProgressEvent, ResolveError, ResolverConfig, Result,
};
pub use search::{AppSelector, GameInfo, GameSearch};
