// ─── mcstage Core ───
// Fetch, verify and stage the files of a Minecraft version.
//
// Architecture:
//   core/
//     downloader/ — SHA-1 hashing, single-file downloads, sidecar artifacts
//     assets/     — Asset index, dedup plan, concurrent sync engine
//     version/    — Mojang manifest + version descriptor
//     extract     — Client jar extraction
//     settings    — User configuration
//     stager      — Per-version workflows

pub mod assets;
pub mod downloader;
pub mod error;
pub mod extract;
pub mod http;
pub mod settings;
pub mod stager;
pub mod version;
