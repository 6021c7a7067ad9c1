//! # Container registry core
//!
//! Storage and composition for a Docker compatible registry, below the HTTP
//! routing layer.
//!
//! ## Features
//!
//! - Content addressed blob storage with digest verification
//! - Resumable upload sessions
//! - Manifest and tag storage with cursor pagination
//! - Read-through proxying of upstream registries
//! - Composition of several registries behind one [`Docker`] interface
//!
//! ## Example
//!
//! ```no_run
//! use registry_core::{Content, Digest, Docker, RegistryBuilder};
//! use storage::MemoryStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let upstream = api_client::ApiClient::new("https://registry-1.docker.io/".parse()?);
//! let registry = RegistryBuilder::new(MemoryStorage::new().into())
//!     .proxy(upstream)
//!     .build();
//!
//! let repo = registry.repo(&"library/alpine".into());
//! let digest = Digest::of(b"layer");
//! repo.layers().put(Content::from("layer"), &digest).await?;
//! # Ok(())
//! # }
//! ```

mod api;
mod blob;
mod catalog;
pub mod composite;
mod config;
mod content;
mod digest;
mod docker;
mod error;
pub mod local;
mod manifest;
mod name;
mod page;
pub mod proxy;
mod tags;

pub use api::{Registry, RegistryBuilder};
pub use blob::{Blob, BlobRef, Layers};
pub use catalog::Catalog;
pub use config::{ProxyConfig, RegistryConfig};
pub use content::Content;
pub use digest::Digest;
pub use docker::{Docker, Repo};
pub use error::{RegistryError, RegistryResult};
pub use manifest::{
    DOCKER_MANIFEST_LIST, DOCKER_MANIFEST_V1, DOCKER_MANIFEST_V2, MANIFEST_MEDIA_TYPES, Manifest,
    Manifests, OCI_INDEX, OCI_MANIFEST,
};
pub use name::{ManifestRef, RepoName, Tag};
pub use page::Limit;
pub use tags::Tags;
