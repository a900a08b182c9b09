use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub recommendations: RecommendationsConfig,
    pub email: EmailConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file, or ":memory:" for a throwaway store
    pub database_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsConfig {
    pub enabled: bool,
    pub api_base: String,
    /// Environment variable holding the bearer token
    #[serde(default = "default_ai_key_env")]
    pub api_key_env: String,
    pub model: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub from_address: String,
    /// HTTP mail API endpoint. Messages are only logged when unset.
    pub api_url: Option<String>,
    #[serde(default = "default_mail_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

fn default_ai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_mail_key_env() -> String {
    "MAIL_API_KEY".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 3000,
            },
            storage: StorageConfig {
                database_path: "/var/lib/ecoviz/ecoviz.db".to_string(),
            },
            recommendations: RecommendationsConfig {
                enabled: false,
                api_base: "https://api.openai.com/v1".to_string(),
                api_key_env: default_ai_key_env(),
                model: "gpt-3.5-turbo".to_string(),
                timeout_seconds: default_timeout_seconds(),
            },
            email: EmailConfig {
                from_address: "noreply@ecoviz.app".to_string(),
                api_url: None,
                api_key_env: default_mail_key_env(),
                timeout_seconds: default_timeout_seconds(),
            },
            logging: None,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Applies `PORT` from the environment, as the hosted deployments set it.
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {port}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.recommendations.enabled {
            url::Url::parse(&self.recommendations.api_base).with_context(|| {
                format!(
                    "recommendations.api_base is not a valid URL: {}",
                    self.recommendations.api_base
                )
            })?;
            if self.recommendations.model.trim().is_empty() {
                bail!("recommendations.model must not be empty");
            }
        }

        if let Some(api_url) = &self.email.api_url {
            url::Url::parse(api_url)
                .with_context(|| format!("email.api_url is not a valid URL: {api_url}"))?;
        }

        if !crate::mailer::is_valid_email(&self.email.from_address) {
            bail!(
                "email.from_address is not a valid address: {}",
                self.email.from_address
            );
        }

        if self.storage.database_path.trim().is_empty() {
            bail!("storage.database_path must not be empty");
        }

        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }
}
