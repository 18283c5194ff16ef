pub mod catalog;
pub mod error;
pub mod fetcher;
pub mod installer;
pub mod job;
pub mod registry;
pub mod remover;
pub mod verifier;

pub use catalog::{Catalog, load_catalog};
pub use fetcher::{Fetcher, HttpFetcher};
pub use installer::install;
pub use job::{DownloadJob, JobEvent, JobStatus, Pipeline, VerifyPolicy};
pub use registry::{FsRegistry, InstalledExtension, Registry, list_installed};
pub use remover::remove_extension;
