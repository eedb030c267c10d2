// fluxforge-api: Async Rust client for the FluxForge gateway REST API

pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientConfig, PortalClient};
pub use error::Error;
