pub mod common;
mod agent_server;
mod chain_resolution;
mod metadata_and_uri;
