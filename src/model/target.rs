//! Monitored endpoint definition

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{TargetId, UserId};
use crate::config::ConfigError;

/// Scheme used to reach a target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

/// HTTP method used for the probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Head => "HEAD",
        }
    }
}

/// A user-registered endpoint to probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub user_id: UserId,
    pub name: String,
    /// Host and path, without scheme
    pub url: String,
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_expected_status")]
    pub expected_status_code: u16,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_check_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    10
}

fn default_expected_status() -> u16 {
    200
}

fn default_active() -> bool {
    true
}

impl Target {
    /// Create an active HTTPS GET target expecting 200
    pub fn new(id: TargetId, user_id: UserId, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            user_id,
            name: name.into(),
            url: url.into(),
            protocol: Protocol::default(),
            method: HttpMethod::default(),
            check_interval_secs: default_check_interval(),
            timeout_secs: default_timeout(),
            expected_status_code: default_expected_status(),
            is_active: true,
        }
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_expected_status(mut self, status: u16) -> Self {
        self.expected_status_code = status;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Full request URL, `{protocol}://{url}`
    pub fn request_url(&self) -> String {
        format!("{}://{}", self.protocol.as_str(), self.url)
    }

    /// Probe deadline
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject targets the checker cannot probe as configured
    pub fn validate(&self) -> Result<(), ConfigError> {
        static SCHEME: OnceLock<Regex> = OnceLock::new();
        let scheme = SCHEME.get_or_init(|| {
            Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("scheme pattern is valid")
        });

        if self.url.trim().is_empty() {
            return Err(ConfigError::InvalidTarget {
                id: self.id,
                reason: "url is empty".to_string(),
            });
        }
        if scheme.is_match(&self.url) {
            return Err(ConfigError::InvalidTarget {
                id: self.id,
                reason: format!("url '{}' must not include a scheme", self.url),
            });
        }
        if self.check_interval_secs == 0 {
            return Err(ConfigError::InvalidTarget {
                id: self.id,
                reason: "check interval must be positive".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTarget {
                id: self.id,
                reason: "timeout must be positive".to_string(),
            });
        }
        Ok(())
    }
}
