//! Service configuration.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{KeyType, SecurityLevel};
use crate::errors::ConfigError;
use crate::triggers::DataTriggerConfig;

/// Configuration of the [`BatchValidator`](super::BatchValidator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// System contracts that get built-in data triggers.
    pub triggers: DataTriggerConfig,
    /// Accepted distance of document timestamps from the block time.
    pub timestamp_window_ms: u64,
    /// Key types allowed to sign transitions.
    pub allowed_key_types: Vec<KeyType>,
    /// Security levels allowed to sign transitions.
    pub allowed_security_levels: Vec<SecurityLevel>,
    /// Maximum unique indices per document type of a new contract.
    pub max_unique_indices: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            triggers: DataTriggerConfig::default(),
            timestamp_window_ms: 300_000, // 5 minutes
            allowed_key_types: vec![KeyType::EcdsaSecp256k1, KeyType::EcdsaHash160],
            allowed_security_levels: vec![SecurityLevel::Critical, SecurityLevel::High],
            max_unique_indices: 3,
        }
    }
}

impl ServiceConfig {
    /// Parses a JSON config; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings no node could run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name_service) = &self.triggers.name_service {
            if name_service.contract_id.is_zero() {
                return Err(ConfigError::ZeroIdentifier {
                    binding: "name_service.contract_id",
                });
            }
            if name_service.top_level_identity.is_zero() {
                return Err(ConfigError::ZeroIdentifier {
                    binding: "name_service.top_level_identity",
                });
            }
        }
        if let Some(contacts) = &self.triggers.contacts {
            if contacts.contract_id.is_zero() {
                return Err(ConfigError::ZeroIdentifier {
                    binding: "contacts.contract_id",
                });
            }
        }
        if self.timestamp_window_ms == 0 {
            return Err(ConfigError::ZeroTimestampWindow);
        }
        if self.allowed_key_types.is_empty() {
            return Err(ConfigError::EmptyAllowList("allowed_key_types"));
        }
        if self.allowed_security_levels.is_empty() {
            return Err(ConfigError::EmptyAllowList("allowed_security_levels"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Identifier;
    use crate::triggers::{ContactsTriggerConfig, NameServiceTriggerConfig};

    #[test]
    fn test_default_config_is_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timestamp_window_ms, 300_000);
        assert_eq!(config.max_unique_indices, 3);
        assert!(config.triggers.name_service.is_none());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let contract = Identifier::new([7; 32]);
        let json = format!(
            r#"{{
                "timestamp_window_ms": 1000,
                "triggers": {{ "contacts": {{ "contract_id": "{}" }} }}
            }}"#,
            contract.to_hex()
        );
        let config = ServiceConfig::from_json(&json).unwrap();
        assert_eq!(config.timestamp_window_ms, 1000);
        assert_eq!(
            config.triggers.contacts,
            Some(ContactsTriggerConfig {
                contract_id: contract
            })
        );
        assert_eq!(config.allowed_key_types, ServiceConfig::default().allowed_key_types);
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            ServiceConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));

        let config = ServiceConfig {
            timestamp_window_ms: 0,
            ..ServiceConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimestampWindow));

        let config = ServiceConfig {
            allowed_security_levels: Vec::new(),
            ..ServiceConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyAllowList("allowed_security_levels"))
        );

        let mut config = ServiceConfig::default();
        config.triggers.name_service = Some(NameServiceTriggerConfig {
            contract_id: Identifier::new([1; 32]),
            top_level_identity: Identifier::ZERO,
        });
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroIdentifier {
                binding: "name_service.top_level_identity"
            })
        );
    }
}
