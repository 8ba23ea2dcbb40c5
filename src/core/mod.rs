// src/core/mod.rs
//! Backend access and artifact storage

pub mod downloads;
pub mod gateway;
pub mod service_client;

pub use downloads::{ArtifactError, ArtifactKind, ArtifactSaver};
pub use gateway::{AnalysisGateway, GatewayError, GatewayResult};
pub use service_client::ServiceClient;
