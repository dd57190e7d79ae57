use serde::{Deserialize, Serialize};

/// Settings shared by every conversion pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Layers whose name starts with this prefix are treated as operating on flat
    /// `[batch, features]` data rather than `[batch, channels, height, width]` maps.
    ///
    /// This picks flat batch-norm over spatial batch-norm, and expands a 1-D scale blob to
    /// rank 2 instead of rank 4.
    pub flat_name_prefix: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            flat_name_prefix: "fc".to_string(),
        }
    }
}

impl ConverterConfig {
    /// Whether `name` follows the flat naming convention.
    pub fn is_flat(&self, name: &str) -> bool {
        !self.flat_name_prefix.is_empty() && name.starts_with(&self.flat_name_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prefix_is_fc() {
        let config = ConverterConfig::default();

        assert!(config.is_flat("fc7_bn"));
        assert!(!config.is_flat("conv1_bn"));
    }

    #[test]
    fn empty_prefix_matches_nothing() {
        let config = ConverterConfig {
            flat_name_prefix: String::new(),
        };

        assert!(!config.is_flat("fc7"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ConverterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ConverterConfig::default());

        let config: ConverterConfig =
            serde_json::from_str(r#"{"flat_name_prefix": "ip"}"#).unwrap();
        assert!(config.is_flat("ip1"));
    }
}
