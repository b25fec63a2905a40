//! Booth render gateway.
//!
//! One POST endpoint turns a company theme into exhibition booth renders:
//! the prompt is validated, spliced into the active [`TemplateProfile`],
//! sent to the OpenAI image API once, and the payloads come back as data URIs.
pub mod config;
pub mod cors;
pub mod error;
pub mod gateway;
pub mod models;
pub mod openai;
pub mod profile;
pub mod routes;

pub use config::Config;
pub use cors::OriginPolicy;
pub use error::GatewayError;
pub use gateway::ImageGateway;
pub use openai::{ImageProvider, OpenAiClient};
pub use profile::TemplateProfile;
