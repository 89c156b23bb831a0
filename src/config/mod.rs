use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub webhook: WebhookConfig,
    pub parser: ParserConfig,
    pub tenancy: TenancyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// Single designated platform-operator email. Unset disables the
    /// super-admin escalation path entirely.
    pub super_admin_email: Option<String>,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret expected in the x-zapier-secret header. Unset means
    /// the webhook endpoint refuses everything with 503.
    pub zapier_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    /// Domain used when deriving tenant mailbox addresses.
    pub mailbox_domain: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SUPER_ADMIN_EMAIL") {
            self.security.super_admin_email = non_empty(v);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Webhook overrides
        if let Ok(v) = env::var("ZAPIER_WEBHOOK_SECRET") {
            self.webhook.zapier_secret = non_empty(v);
        }

        // Email parser overrides
        if let Ok(v) = env::var("OPENAI_API_KEY") {
            self.parser.api_key = non_empty(v);
        }
        if let Ok(v) = env::var("EMAIL_PARSER_BASE_URL") {
            self.parser.base_url = v;
        }
        if let Ok(v) = env::var("EMAIL_PARSER_MODEL") {
            self.parser.model = v;
        }
        if let Ok(v) = env::var("EMAIL_PARSER_TIMEOUT_SECS") {
            self.parser.timeout_secs = v.parse().unwrap_or(self.parser.timeout_secs);
        }

        // Tenancy overrides
        if let Ok(v) = env::var("TENANT_MAILBOX_DOMAIN") {
            self.tenancy.mailbox_domain = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
                super_admin_email: None,
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            webhook: WebhookConfig { zapier_secret: None },
            parser: ParserConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 30,
            },
            tenancy: TenancyConfig {
                mailbox_domain: "inbound.localhost".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                super_admin_email: None,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            webhook: WebhookConfig { zapier_secret: None },
            parser: ParserConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 20,
            },
            tenancy: TenancyConfig {
                mailbox_domain: "inbound.staging.example.com".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                super_admin_email: None,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            webhook: WebhookConfig { zapier_secret: None },
            parser: ParserConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 20,
            },
            tenancy: TenancyConfig {
                mailbox_domain: "inbound.example.com".to_string(),
            },
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.max_connections, 10);
        assert!(config.security.super_admin_email.is_none());
        assert!(config.webhook.zapier_secret.is_none());
        assert_eq!(config.parser.model, "gpt-4o-mini");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.security.jwt_expiry_hours, 4);
        assert_eq!(config.database.max_connections, 50);
    }

    #[test]
    fn test_non_empty_filters_blank_values() {
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty(String::new()), None);
        assert_eq!(
            non_empty(" ops@example.com ".to_string()),
            Some("ops@example.com".to_string())
        );
    }
}
