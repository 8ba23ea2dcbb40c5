//! Client for a resume analysis backend: submit a resume for a target role,
//! browse past analyses and save the generated artifacts.

pub mod cli;
pub mod config;
pub mod core;
pub mod display;
pub mod environment;
pub mod history;
pub mod input;
pub mod session;
pub mod types;
pub mod utils;
pub mod workflow;

pub use config::ClientConfig;
pub use crate::core::{AnalysisGateway, ArtifactKind, ArtifactSaver, GatewayError, ServiceClient};
pub use input::{AnalysisRequest, InputForm, InputMode, ResumeContent, ResumeFile};
pub use session::{Identity, StaticIdentity, TokenIdentity, User};
pub use workflow::{AnalysisWorkflow, WorkflowState};
