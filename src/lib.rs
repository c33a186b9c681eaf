// Library root
// -----------
// The `alice` binary (`main.rs`) is a thin wrapper over these modules.
//
// Module responsibilities:
// - `config`: JSON key-value store for API key, server URL and developer
//   identity, plus the per-invocation `Settings` snapshot.
// - `archive`: zips a project tree into a temporary file, skipping
//   dependency and build directories.
// - `cleanup`: removes the temporary archive when the run is interrupted.
// - `api`: uploads the archive to the analysis service and classifies
//   the response.
// - `model`: the analysis result returned by the service.
// - `report`: renders the result and decides the exit code.
// - `ui`: spinner, interactive prompts and colour handling.
// - `cli` / `commands`: argument parsing and the verb dispatcher.
pub mod api;
pub mod archive;
pub mod cleanup;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod report;
pub mod ui;
