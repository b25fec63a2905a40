//! Env-driven configuration, read once at startup.
//!
//! `main` loads `.env` through `dotenv` first; everything here only looks at
//! the process environment (or a lookup function in tests).
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;

use crate::cors::{OriginPolicy, OriginPolicyError, OriginRule};
use crate::openai::{DEFAULT_API_BASE, DEFAULT_IMAGE_MODEL};
use crate::profile::{ProfileError, TemplateProfile};

pub const DEFAULT_PROFILE: &str = "booth-preview";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,
    #[error("invalid {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Origin(#[from] OriginPolicyError),
    #[error("failed to read template file {path}: {source}")]
    TemplateFile { path: String, source: std::io::Error },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_base: String,
    pub image_model: String,
    pub profile: TemplateProfile,
    pub origin_policy: OriginPolicy,
    pub addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = get("OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;
        let api_base = get("OPENAI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let image_model = get("OPENAI_IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string());

        let profile_name = get("GATEWAY_PROFILE").unwrap_or_else(|| DEFAULT_PROFILE.to_string());
        let mut profile = TemplateProfile::preset(profile_name.trim())?;
        if let Some(path) = get("GATEWAY_TEMPLATE_FILE") {
            let text = std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::TemplateFile { path: path.clone(), source })?;
            profile = profile.with_template(text.trim_end())?;
        }

        let rule: OriginRule = get("CORS_POLICY").unwrap_or_default().parse()?;
        let allow_missing_origin = match get("CORS_ALLOW_NO_ORIGIN") {
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid { var: "CORS_ALLOW_NO_ORIGIN", value: v })?,
            None => true,
        };

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let ip: IpAddr = host.parse().map_err(|_| ConfigError::Invalid { var: "HOST", value: host.clone() })?;
        let port = match get("PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::Invalid { var: "PORT", value: p })?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            api_key,
            api_base,
            image_model,
            profile,
            origin_policy: OriginPolicy::new(rule, allow_missing_origin),
            addr: SocketAddr::new(ip, port),
        })
    }

    /// First few characters of the key, for startup logs.
    pub fn api_key_hint(&self) -> &str {
        let end = self.api_key.char_indices().nth(8).map(|(i, _)| i).unwrap_or(self.api_key.len());
        &self.api_key[..end]
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::QualityTier;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test-123456789")])).unwrap();
        assert_eq!(cfg.api_base, "https://api.openai.com/v1");
        assert_eq!(cfg.image_model, "gpt-image-1");
        assert_eq!(cfg.profile.name(), "booth-preview");
        assert_eq!(cfg.origin_policy, OriginPolicy::permissive());
        assert_eq!(cfg.addr, "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.api_key_hint(), "sk-test-");
    }

    #[test]
    fn missing_key_is_an_error() {
        assert!(matches!(Config::from_lookup(lookup(&[])), Err(ConfigError::MissingApiKey)));
        assert!(matches!(Config::from_lookup(lookup(&[("OPENAI_API_KEY", " ")])), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn overrides() {
        let cfg = Config::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "k"),
            ("GATEWAY_PROFILE", "booth-single"),
            ("CORS_POLICY", "domains:codesandbox.io,csb.app"),
            ("CORS_ALLOW_NO_ORIGIN", "false"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
        ]))
        .unwrap();
        assert_eq!(cfg.profile.quality(), QualityTier::Medium);
        assert_eq!(
            cfg.origin_policy,
            OriginPolicy::new(OriginRule::Domains(vec!["codesandbox.io".into(), "csb.app".into()]), false)
        );
        assert_eq!(cfg.addr.port(), 8080);
        assert_eq!(cfg.api_key_hint(), "k");
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "k"), ("PORT", "http")])).unwrap_err();
        assert_eq!(err.to_string(), "invalid PORT: 'http'");
        let err = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "k"), ("GATEWAY_PROFILE", "poster")])).unwrap_err();
        assert!(matches!(err, ConfigError::Profile(ProfileError::UnknownPreset(_))));
        let err = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "k"), ("CORS_POLICY", "glob:*")])).unwrap_err();
        assert!(matches!(err, ConfigError::Origin(_)));
        let err = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "k"), ("GATEWAY_TEMPLATE_FILE", "/nonexistent/brief.txt")])).unwrap_err();
        assert!(matches!(err, ConfigError::TemplateFile { .. }));
    }
}
