//! Core library of the metadata-driven validation layer.
//!
//! Constraints declared on bean properties are discovered through a type
//! model, turned into abstract metadata, applied to input components when
//! they render and enforced when their values are submitted.

pub mod beanval;
pub mod config;
pub mod el;
pub mod error;
pub mod initializer;
pub mod interceptor;
pub mod metadata;
pub mod models;
pub mod property;
pub mod registry;
pub mod request;
pub mod strategy;

pub use beanval::{
    ConstraintEngine, ConstraintViolation, DefaultConstraintEngine, ModelValidationEntry, ModelValidationFailure,
};
pub use config::ExtValConfig;
pub use el::{ExpressionEvaluator, ScopeExpressionEvaluator, ValueBindingExpression};
pub use error::{ExtValError, Result};
pub use initializer::ComponentInitializer;
pub use interceptor::{
    Converter, ProcessedInformationRecorder, PropertyValidationInterceptor, ValidationExceptionInterceptor,
    ValidationFailure, ValidationInterceptor, ValidationOutcome,
};
pub use metadata::{MetaData, MetaDataExtractor, MetaDataTransformer};
pub use models::{Bean, InputComponent, TypeModel, Value};
pub use request::RequestContext;
pub use strategy::ValidationStrategy;

use interceptor::hooks::{DefaultProcessedInformationRecorder, DefaultValidationExceptionInterceptor};
use metadata::DefaultComponentMetaDataExtractor;
use models::ComponentIdentity;
use property::{MetaDataEntry, PropertyInformation};
use registry::{ClassCatalog, ExceptionInterceptorRegistry, NameMapper, StrategyRegistry, TransformerRegistry};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Owns configuration, type model, plugin registries and hooks.
///
/// Built once and shared; everything request scoped lives in a
/// [`RequestContext`].
pub struct ExtValEngine {
    config: ExtValConfig,
    type_model: Arc<TypeModel>,
    evaluator: Arc<dyn ExpressionEvaluator>,
    constraint_engine: Arc<dyn ConstraintEngine>,
    strategies: StrategyRegistry,
    transformers: TransformerRegistry,
    exception_interceptors: ExceptionInterceptorRegistry,
    extractor: Arc<dyn MetaDataExtractor>,
    initializers: Vec<Arc<dyn ComponentInitializer>>,
    property_interceptors: Vec<Arc<dyn PropertyValidationInterceptor>>,
    recorders: Vec<Arc<dyn ProcessedInformationRecorder>>,
}

impl ExtValEngine {
    pub fn builder() -> ExtValEngineBuilder {
        ExtValEngineBuilder::new()
    }

    pub fn config(&self) -> &ExtValConfig {
        &self.config
    }

    pub fn type_model(&self) -> &TypeModel {
        &self.type_model
    }

    pub fn evaluator(&self) -> &dyn ExpressionEvaluator {
        self.evaluator.as_ref()
    }

    pub fn constraint_engine(&self) -> &dyn ConstraintEngine {
        self.constraint_engine.as_ref()
    }

    pub fn component_extractor(&self) -> &dyn MetaDataExtractor {
        self.extractor.as_ref()
    }

    pub fn initializers(&self) -> &[Arc<dyn ComponentInitializer>] {
        &self.initializers
    }

    pub fn property_interceptors(&self) -> &[Arc<dyn PropertyValidationInterceptor>] {
        &self.property_interceptors
    }

    pub fn recorders(&self) -> &[Arc<dyn ProcessedInformationRecorder>] {
        &self.recorders
    }

    /// Strategy for an annotation key.
    pub fn strategy_for(&self, annotation_key: &str) -> Option<Arc<dyn ValidationStrategy>> {
        self.strategies.resolve(annotation_key, annotation_key)
    }

    pub fn transformer_for(&self, strategy: &(dyn ValidationStrategy + 'static)) -> Option<Arc<dyn MetaDataTransformer>> {
        self.transformers.resolve(strategy.name(), strategy)
    }

    pub fn exception_interceptor_for(&self, identity: &ComponentIdentity) -> Option<Arc<dyn ValidationExceptionInterceptor>> {
        self.exception_interceptors.resolve(&identity.component_type, identity)
    }

    /// Metadata of one entry; `None` when no transformer applies or it fails.
    pub fn transform(
        &self,
        ctx: &RequestContext,
        strategy: &(dyn ValidationStrategy + 'static),
        entry: &MetaDataEntry,
    ) -> Option<MetaData> {
        let Some(transformer) = self.transformer_for(strategy) else {
            trace!(strategy = strategy.name(), "No metadata transformer");
            return None;
        };
        match transformer.convert_meta_data(self, ctx, entry) {
            Ok(meta_data) => Some(meta_data),
            Err(err) => {
                warn!(transformer = transformer.name(), key = entry.key(), error = %err, "Metadata transformation failed");
                None
            }
        }
    }

    /// Merged metadata of all annotation entries of a property.
    pub fn meta_data_for(&self, ctx: &RequestContext, information: &PropertyInformation) -> MetaData {
        let mut meta_data = MetaData::new();
        for entry in information.entries() {
            let Some(strategy) = self.strategy_for(entry.key()) else {
                continue;
            };
            if let Some(converted) = self.transform(ctx, strategy.as_ref(), entry) {
                metadata::merge_meta_data(&mut meta_data, converted);
            }
        }
        meta_data
    }

    /// Render phase: configures the component from its constraints.
    pub fn init_component(&self, ctx: &mut RequestContext, component: &mut InputComponent) -> MetaData {
        ValidationInterceptor::new(self).init_component(ctx, component)
    }

    /// Apply phase: converts and validates a submitted value.
    pub fn process_validation(&self, ctx: &mut RequestContext, component: &InputComponent, submitted: &str) -> ValidationOutcome {
        ValidationInterceptor::new(self).process_validation(ctx, component, submitted)
    }

    /// Runs the model validations queued during the apply phase.
    pub fn process_model_validation(&self, ctx: &mut RequestContext) -> Vec<ModelValidationFailure> {
        beanval::process_model_validation(self, ctx)
    }
}

pub struct ExtValEngineBuilder {
    config: ExtValConfig,
    type_model: TypeModel,
    evaluator: Option<Arc<dyn ExpressionEvaluator>>,
    constraint_engine: Option<Arc<dyn ConstraintEngine>>,
    strategies: ClassCatalog<dyn ValidationStrategy>,
    transformers: ClassCatalog<dyn MetaDataTransformer>,
    exception_interceptors: ClassCatalog<dyn ValidationExceptionInterceptor>,
    extractors: ClassCatalog<dyn MetaDataExtractor>,
    strategy_mappers: Vec<Arc<dyn NameMapper<str>>>,
    transformer_mappers: Vec<Arc<dyn NameMapper<dyn ValidationStrategy>>>,
    initializers: Vec<Arc<dyn ComponentInitializer>>,
    property_interceptors: Vec<Arc<dyn PropertyValidationInterceptor>>,
    recorders: Vec<Arc<dyn ProcessedInformationRecorder>>,
}

impl ExtValEngineBuilder {
    pub fn new() -> Self {
        let mut strategies = ClassCatalog::new();
        strategy::register_defaults(&mut strategies);

        let mut transformers = ClassCatalog::new();
        metadata::transformer::register_defaults(&mut transformers);

        let mut exception_interceptors: ClassCatalog<dyn ValidationExceptionInterceptor> = ClassCatalog::new();
        exception_interceptors.register(DefaultValidationExceptionInterceptor::NAME, || {
            Ok(Arc::new(DefaultValidationExceptionInterceptor) as Arc<dyn ValidationExceptionInterceptor>)
        });

        let mut extractors: ClassCatalog<dyn MetaDataExtractor> = ClassCatalog::new();
        extractors.register(DefaultComponentMetaDataExtractor::NAME, || {
            Ok(Arc::new(DefaultComponentMetaDataExtractor::new()) as Arc<dyn MetaDataExtractor>)
        });

        Self {
            config: ExtValConfig::default(),
            type_model: TypeModel::new(),
            evaluator: None,
            constraint_engine: None,
            strategies,
            transformers,
            exception_interceptors,
            extractors,
            strategy_mappers: Vec::new(),
            transformer_mappers: Vec::new(),
            initializers: initializer::default_initializers(),
            property_interceptors: Vec::new(),
            recorders: vec![Arc::new(DefaultProcessedInformationRecorder)],
        }
    }

    pub fn with_config(mut self, config: ExtValConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_type_model(mut self, type_model: TypeModel) -> Self {
        self.type_model = type_model;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Replaces the built-in constraint engine.
    pub fn with_constraint_engine(mut self, constraint_engine: Arc<dyn ConstraintEngine>) -> Self {
        self.constraint_engine = Some(constraint_engine);
        self
    }

    pub fn register_strategy<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn ValidationStrategy>> + Send + Sync + 'static,
    {
        self.strategies.register(name, factory);
        self
    }

    pub fn register_transformer<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn MetaDataTransformer>> + Send + Sync + 'static,
    {
        self.transformers.register(name, factory);
        self
    }

    pub fn register_exception_interceptor<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn ValidationExceptionInterceptor>> + Send + Sync + 'static,
    {
        self.exception_interceptors.register(name, factory);
        self
    }

    pub fn register_extractor<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn MetaDataExtractor>> + Send + Sync + 'static,
    {
        self.extractors.register(name, factory);
        self
    }

    /// Consulted before configured and built-in strategy names.
    pub fn add_strategy_mapper(mut self, mapper: impl NameMapper<str> + 'static) -> Self {
        self.strategy_mappers.push(Arc::new(mapper));
        self
    }

    /// Consulted before configured and built-in transformer names.
    pub fn add_transformer_mapper(mut self, mapper: impl NameMapper<dyn ValidationStrategy> + 'static) -> Self {
        self.transformer_mappers.push(Arc::new(mapper));
        self
    }

    pub fn add_initializer(mut self, initializer: Arc<dyn ComponentInitializer>) -> Self {
        self.initializers.push(initializer);
        self
    }

    pub fn add_property_interceptor(mut self, interceptor: Arc<dyn PropertyValidationInterceptor>) -> Self {
        self.property_interceptors.push(interceptor);
        self
    }

    pub fn add_recorder(mut self, recorder: Arc<dyn ProcessedInformationRecorder>) -> Self {
        self.recorders.push(recorder);
        self
    }

    pub fn build(self) -> ExtValEngine {
        let type_model = Arc::new(self.type_model);
        let constraint_engine = self
            .constraint_engine
            .unwrap_or_else(|| Arc::new(DefaultConstraintEngine::new(Arc::clone(&type_model))));
        let evaluator = self
            .evaluator
            .unwrap_or_else(|| Arc::new(ScopeExpressionEvaluator::new()));

        let extractor: Arc<dyn MetaDataExtractor> = match &self.config.custom_component_meta_data_extractor {
            Some(name) => self.extractors.instantiate(name).unwrap_or_else(|err| {
                warn!(name = %name, error = %err, "Custom metadata extractor unavailable, using default");
                Arc::new(DefaultComponentMetaDataExtractor::new())
            }),
            None => Arc::new(DefaultComponentMetaDataExtractor::new()),
        };

        let strategies = registry::strategy_registry(&self.config, self.strategies, &self.strategy_mappers);
        let transformers = registry::transformer_registry(&self.config, self.transformers, &self.transformer_mappers);
        let exception_interceptors = registry::exception_interceptor_registry(&self.config, self.exception_interceptors);

        debug!(
            types = type_model.len(),
            initializers = self.initializers.len(),
            "Validation engine built"
        );

        ExtValEngine {
            config: self.config,
            type_model,
            evaluator,
            constraint_engine,
            strategies,
            transformers,
            exception_interceptors,
            extractor,
            initializers: self.initializers,
            property_interceptors: self.property_interceptors,
            recorders: self.recorders,
        }
    }
}

impl Default for ExtValEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
