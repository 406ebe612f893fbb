use std::time::Duration;

use expiremap_common::{ConfigError, DEFAULT_REAP_INTERVAL, DEFAULT_TTL};

/// Parâmetros fixados na construção do store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Cadência da varredura de entradas expiradas.
    pub reap_interval: Duration,
    /// TTL aplicado quando a escrita não informa um.
    pub default_ttl: Duration,
}

impl StoreConfig {
    pub fn new(reap_interval: Duration, default_ttl: Duration) -> Self {
        Self {
            reap_interval,
            default_ttl,
        }
    }

    pub fn with_reap_interval(mut self, reap_interval: Duration) -> Self {
        self.reap_interval = reap_interval;
        self
    }

    pub fn with_default_ttl(mut self, default_ttl: Duration) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    /// Rejeita intervalo de limpeza ou TTL padrão nulos.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reap_interval.is_zero() {
            return Err(ConfigError::ZeroReapInterval);
        }
        if self.default_ttl.is_zero() {
            return Err(ConfigError::ZeroDefaultTtl);
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REAP_INTERVAL, DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_one_minute_each() {
        let config = StoreConfig::default();
        assert_eq!(config.reap_interval, Duration::from_secs(60));
        assert_eq!(config.default_ttl, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = StoreConfig::default()
            .with_reap_interval(Duration::from_millis(5))
            .with_default_ttl(Duration::from_secs(3600));
        assert_eq!(
            config,
            StoreConfig::new(Duration::from_millis(5), Duration::from_secs(3600))
        );
    }

    #[test]
    fn zero_reap_interval_rejected() {
        let config = StoreConfig::default().with_reap_interval(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroReapInterval));
    }

    #[test]
    fn zero_default_ttl_rejected() {
        let config = StoreConfig::default().with_default_ttl(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroDefaultTtl));
    }
}
