pub mod artifact;
pub mod client;
pub mod hasher;

pub use artifact::{FetchedArtifact, SingleArtifact};
pub use client::{Downloader, StagedFile};
pub use hasher::{file_matches, sha1_bytes, sha1_file};
