use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    storage: Storage,
    cache: Cache,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config: AppConfig = Config::builder()
            .set_default("storage.bucket", "tracker-website")?
            .set_default("storage.key", "locations.json")?
            .set_default("storage.region", "eu-central-1")?
            .set_default("cache.enabled", false)?
            .set_default("cache.cache_control", "no-cache")?
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("config_local").required(false))
            .add_source(Environment::with_prefix("LOCATION_LOG").prefix_separator("_").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.enabled && self.cache.distribution_id().is_none() {
            return Err(ConfigError::Message("cache.distribution_id must be set when cache.enabled is true".to_string()));
        }
        Ok(())
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    bucket: String,
    key: String,
    region: String,
    endpoint: Option<String>,
}

impl Storage {
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref().filter(|endpoint| !endpoint.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct Cache {
    enabled: bool,
    distribution_id: Option<String>,
    cache_control: String,
}

impl Cache {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn distribution_id(&self) -> Option<&str> {
        self.distribution_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn cache_control(&self) -> &str {
        &self.cache_control
    }
}

#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn new() -> Self {
        AppConfigBuilder {
            config: AppConfig {
                storage: Storage {
                    bucket: "tracker-website".to_string(),
                    key: "locations.json".to_string(),
                    region: "eu-central-1".to_string(),
                    endpoint: None,
                },
                cache: Cache {
                    enabled: false,
                    distribution_id: None,
                    cache_control: "no-cache".to_string(),
                },
            },
        }
    }

    pub fn storage_endpoint(mut self, endpoint: String) -> Self {
        self.config.storage.endpoint = Some(endpoint);
        self
    }

    pub fn cache(mut self, distribution_id: Option<&str>) -> Self {
        self.config.cache.enabled = true;
        self.config.cache.distribution_id = distribution_id.map(str::to_string);
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
