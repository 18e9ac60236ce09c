use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Recognized options of the validation layer.
///
/// Every flag defaults to the standard behaviour when absent. Overrides name
/// entries of the engine's class catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtValConfig {
    pub deactivate_empty_string_interpretation: bool,
    pub deactivate_additional_group_validation_annotations: bool,
    pub activate_multiple_violation_messages_per_field: bool,
    pub custom_validation_exception_interceptor: Option<String>,
    pub custom_component_meta_data_extractor: Option<String>,
    /// Package prefix searched for convention-named strategies and transformers.
    pub custom_base_package: Option<String>,
    /// Annotation key -> validation strategy name.
    pub validation_strategies: HashMap<String, String>,
    /// Validation strategy name -> metadata transformer name.
    pub meta_data_transformers: HashMap<String, String>,
}

impl ExtValConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("extval")
    }

    /// Defaults, then `<base_name>.toml` if present, then `EXTVAL_*` variables.
    pub fn load_from(base_name: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&ExtValConfig::default())?);

        if Path::new(&format!("{}.toml", base_name)).exists() {
            builder = builder.add_source(File::with_name(base_name));
        }

        builder = builder.add_source(
            Environment::with_prefix("EXTVAL")
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let extval_config: ExtValConfig = config.try_deserialize()?;

        extval_config.validate()?;

        Ok(extval_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let named_overrides = [
            ("custom_validation_exception_interceptor", &self.custom_validation_exception_interceptor),
            ("custom_component_meta_data_extractor", &self.custom_component_meta_data_extractor),
            ("custom_base_package", &self.custom_base_package),
        ];

        for (option, value) in named_overrides {
            if matches!(value, Some(name) if name.trim().is_empty()) {
                return Err(ConfigError::Message(format!("{} cannot be blank", option)));
            }
        }

        for (key, name) in self.validation_strategies.iter().chain(self.meta_data_transformers.iter()) {
            if key.trim().is_empty() || name.trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "Override mapping '{}' -> '{}' must name both sides",
                    key, name
                )));
            }
        }

        Ok(())
    }

    /// Configured strategy name for an annotation key.
    ///
    /// The `config` crate lowercases table keys read from files and the
    /// environment, so keys are compared ignoring ASCII case.
    pub fn strategy_override(&self, annotation_key: &str) -> Option<&str> {
        lookup_ignoring_case(&self.validation_strategies, annotation_key)
    }

    /// Configured transformer name for a strategy name.
    pub fn transformer_override(&self, strategy_name: &str) -> Option<&str> {
        lookup_ignoring_case(&self.meta_data_transformers, strategy_name)
    }

    pub fn interpret_empty_string_as_null(&self) -> bool {
        !self.deactivate_empty_string_interpretation
    }

    pub fn use_standard_group_sequences(&self) -> bool {
        self.deactivate_additional_group_validation_annotations
    }
}

fn lookup_ignoring_case<'a>(overrides: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    overrides
        .get(key)
        .or_else(|| {
            overrides
                .iter()
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                .map(|(_, name)| name)
        })
        .map(String::as_str)
}
