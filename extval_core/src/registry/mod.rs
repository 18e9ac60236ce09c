//! Name-based plugin resolution
//!
//! Every pluggable role (strategies, transformers, exception interceptors)
//! is resolved through a [`MappingRegistry`]: custom mappers first, then the
//! configured mappings, then naming conventions, then the built-in table.

pub mod catalog;
pub mod mapper;

pub use catalog::{ClassCatalog, Factory};
pub use mapper::{FixedName, MappingRegistry, NameMapper};

use crate::config::ExtValConfig;
use crate::interceptor::hooks::{DefaultValidationExceptionInterceptor, ValidationExceptionInterceptor};
use crate::metadata::transformer::default_transformer_name;
use crate::metadata::MetaDataTransformer;
use crate::models::types::simple_name;
use crate::models::ComponentIdentity;
use crate::strategy::{default_strategy_name, ValidationStrategy};
use std::sync::Arc;

pub type StrategyRegistry = MappingRegistry<str, dyn ValidationStrategy>;
pub type TransformerRegistry = MappingRegistry<dyn ValidationStrategy, dyn MetaDataTransformer>;
pub type ExceptionInterceptorRegistry = MappingRegistry<ComponentIdentity, dyn ValidationExceptionInterceptor>;

/// Annotation key -> strategy.
pub fn strategy_registry(
    config: &ExtValConfig,
    catalog: ClassCatalog<dyn ValidationStrategy>,
    custom: &[Arc<dyn NameMapper<str>>],
) -> StrategyRegistry {
    let mut registry = MappingRegistry::new("validation_strategy", catalog);
    for mapper in custom {
        registry.push_mapper(Arc::clone(mapper));
    }

    let configured = config.clone();
    registry.add_mapper(move |key: &str| configured.strategy_override(key).map(str::to_string));

    if let Some(package) = config.custom_base_package.clone() {
        registry.add_mapper(move |key: &str| Some(format!("{}.{}ValidationStrategy", package, simple_name(key))));
    }

    registry.add_mapper(|key: &str| default_strategy_name(key).map(str::to_string));
    registry
}

/// Strategy -> transformer.
pub fn transformer_registry(
    config: &ExtValConfig,
    catalog: ClassCatalog<dyn MetaDataTransformer>,
    custom: &[Arc<dyn NameMapper<dyn ValidationStrategy>>],
) -> TransformerRegistry {
    let mut registry = MappingRegistry::new("meta_data_transformer", catalog);
    for mapper in custom {
        registry.push_mapper(Arc::clone(mapper));
    }

    let configured = config.clone();
    registry.add_mapper(move |strategy: &(dyn ValidationStrategy + 'static)| {
        configured.transformer_override(strategy.name()).map(str::to_string)
    });

    if let Some(package) = config.custom_base_package.clone() {
        registry.add_mapper(move |strategy: &(dyn ValidationStrategy + 'static)| {
            let name = simple_name(strategy.name());
            let stem = name
                .strip_suffix("ValidationStrategy")
                .or_else(|| name.strip_suffix("Strategy"))
                .unwrap_or(name);
            Some(format!("{}.{}MetaDataTransformer", package, stem))
        });
    }

    registry.add_mapper(|strategy: &(dyn ValidationStrategy + 'static)| {
        default_transformer_name(strategy.name()).map(str::to_string)
    });
    registry
}

/// Component -> after-throwing interceptor.
pub fn exception_interceptor_registry(
    config: &ExtValConfig,
    catalog: ClassCatalog<dyn ValidationExceptionInterceptor>,
) -> ExceptionInterceptorRegistry {
    let mut registry = MappingRegistry::new("validation_exception_interceptor", catalog);

    if let Some(custom) = config.custom_validation_exception_interceptor.clone() {
        registry.add_mapper(FixedName(custom));
    }
    registry.add_mapper(FixedName(DefaultValidationExceptionInterceptor::NAME.to_string()));
    registry
}
