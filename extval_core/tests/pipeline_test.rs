use extval_core::{
    beanval::ConstraintViolation,
    config::ExtValConfig,
    interceptor::{IntegerConverter, PropertyValidationInterceptor, ValidationExceptionInterceptor},
    metadata::keys,
    models::{
        annotation::{BeanValidation, JoinValidation, Length, LongRange, ModelValidation, Required},
        Bean, ComponentIdentity, ConstraintDescriptor, ConstraintKind, InputComponent, NativeValidator,
        PropertyDescriptor, TypeDescriptor, TypeModel, UserMessage, Value,
    },
    property::{PropertyInformation, CONSTRAINT_VIOLATIONS},
    ExtValEngine, RequestContext, ValidationOutcome,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

fn person_model() -> TypeModel {
    TypeModel::new()
        .with(
            TypeDescriptor::class("Person")
                .property(
                    PropertyDescriptor::new("name")
                        .on_field(Required::default())
                        .on_field(Length { minimum: 2, maximum: 20, message: None }),
                )
                .property(PropertyDescriptor::new("age").on_field(LongRange {
                    minimum: 1,
                    maximum: 100,
                    message: None,
                }))
                .property(
                    PropertyDescriptor::new("email")
                        .on_field(ConstraintDescriptor::new(ConstraintKind::Email))
                        .on_field(ConstraintDescriptor::new(ConstraintKind::Size { min: 0, max: 10 })),
                )
                .property(
                    PropertyDescriptor::new("nickname")
                        .on_field(ConstraintDescriptor::new(ConstraintKind::Size { min: 2, max: 10 }).in_groups(&["Detailed"]))
                        .on_field(BeanValidation {
                            view_ids: vec!["/detail.xhtml".to_string()],
                            use_groups: vec!["Detailed".to_string()],
                            ..Default::default()
                        }),
                )
                .property(
                    PropertyDescriptor::new("title")
                        .on_field(ConstraintDescriptor::new(ConstraintKind::Size { min: 3, max: 10 }).in_groups(&["Detailed"]))
                        .on_field(BeanValidation {
                            use_groups: vec!["Detailed".to_string()],
                            ..Default::default()
                        }),
                )
                .property(
                    PropertyDescriptor::new("code")
                        .on_field(ConstraintDescriptor::new(ConstraintKind::Size { min: 3, max: 10 }).in_groups(&["Strict"])),
                )
                .property(PropertyDescriptor::new("middle").on_field(ConstraintDescriptor::new(ConstraintKind::NotNull)))
                .property(PropertyDescriptor::new("alias").on_field(JoinValidation {
                    value: vec!["name".to_string()],
                })),
        )
        .with(
            TypeDescriptor::class("Registration")
                .annotated(ConstraintDescriptor::new(ConstraintKind::Equal {
                    properties: vec!["email".to_string(), "confirmation".to_string()],
                }))
                .property(PropertyDescriptor::new("email").on_field(BeanValidation {
                    model_validation: ModelValidation {
                        is_active: true,
                        ..Default::default()
                    },
                    ..Default::default()
                }))
                .property(PropertyDescriptor::new("confirmation")),
        )
}

fn engine() -> ExtValEngine {
    ExtValEngine::builder().with_type_model(person_model()).build()
}

fn request(view: &str) -> RequestContext {
    RequestContext::new(view).with_bean("person", Bean::new("Person").with("name", "Ada"))
}

#[test]
fn test_range_metadata_configures_component() {
    let engine = engine();
    let mut ctx = request("/edit.xhtml");
    let mut component = InputComponent::new("form:age").bound_to("#{person.age}");

    let meta_data = engine.init_component(&mut ctx, &mut component);

    assert_eq!(meta_data.get(keys::RANGE_MIN), Some(&json!(1)));
    assert_eq!(meta_data.get(keys::RANGE_MAX), Some(&json!(100)));
    assert_eq!(meta_data.get(keys::WEAK_REQUIRED), Some(&json!(true)));
    assert!(component.is_required());
    assert!(component.required.is_none());
    assert!(component
        .all_validators()
        .any(|validator| *validator == NativeValidator::LongRange { minimum: Some(1), maximum: Some(100) }));
}

#[test]
fn test_repeated_rendering_creates_no_duplicate_validators() {
    let engine = engine();
    let mut ctx = request("/edit.xhtml");
    let mut component = InputComponent::new("form:name").bound_to("#{person.name}");

    engine.init_component(&mut ctx, &mut component);
    let first: Vec<NativeValidator> = component.all_validators().cloned().collect();
    engine.init_component(&mut ctx, &mut component);
    let second: Vec<NativeValidator> = component.all_validators().cloned().collect();

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(component.required, Some(true));
    assert_eq!(component.attributes.get("maxlength"), Some(&json!(20)));
}

#[test]
fn test_one_violated_constraint_gives_one_failure() {
    let engine = engine();
    let mut ctx = request("/edit.xhtml");
    let component = InputComponent::new("form:name").bound_to("#{person.name}").labeled("Name");

    let outcome = engine.process_validation(&mut ctx, &component, "A");

    let failure = outcome.failure().expect("Length should be violated");
    assert_eq!(failure.message.summary, "Name: Value must be between 2 and 20 characters");
    assert_eq!(failure.violations.len(), 1);
    assert!(failure.additional_messages.is_empty());
    assert_eq!(ctx.messages_for("form:name").count(), 1);

    assert!(engine.process_validation(&mut ctx, &component, "Ada").is_valid());
}

#[test]
fn test_unlabeled_component_reports_plain_message() {
    let engine = engine();
    let mut ctx = request("/edit.xhtml");
    let component = InputComponent::new("form:name").bound_to("#{person.name}");

    let outcome = engine.process_validation(&mut ctx, &component, "");
    assert_eq!(outcome.failure().unwrap().message.summary, "Value is required");
}

#[test]
fn test_group_controller_applies_only_to_its_view() {
    let engine = engine();
    let component = InputComponent::new("form:nickname").bound_to("#{person.nickname}");

    let mut detail = request("/detail.xhtml");
    let outcome = engine.process_validation(&mut detail, &component, "x");
    assert_eq!(outcome.failure().unwrap().message.summary, "size must be between 2 and 10");

    let mut list = request("/list.xhtml");
    assert!(engine.process_validation(&mut list, &component, "x").is_valid());

    let title = InputComponent::new("form:title").bound_to("#{person.title}");
    for view in ["/detail.xhtml", "/list.xhtml"] {
        let mut ctx = request(view);
        assert!(!engine.process_validation(&mut ctx, &title, "ab").is_valid());
    }
}

#[test]
fn test_application_groups_survive_until_validation() {
    let engine = engine();
    let component = InputComponent::new("form:code").bound_to("#{person.code}");

    let mut relaxed = request("/edit.xhtml");
    assert!(engine.process_validation(&mut relaxed, &component, "x").is_valid());

    let mut strict = request("/edit.xhtml");
    strict.bean_validation_mut().add_group("Strict", "/edit.xhtml", "form:code");
    let mut rendered = component.clone();
    engine.init_component(&mut strict, &mut rendered);

    let outcome = engine.process_validation(&mut strict, &component, "x");
    assert_eq!(outcome.failure().unwrap().message.summary, "size must be between 3 and 10");
    assert_eq!(strict.bean_validation().groups("/edit.xhtml", "form:code"), vec!["Strict"]);
}

#[test]
fn test_multiple_violation_messages() {
    let config = ExtValConfig {
        activate_multiple_violation_messages_per_field: true,
        ..Default::default()
    };
    let multi = ExtValEngine::builder().with_config(config).with_type_model(person_model()).build();
    let mut ctx = request("/edit.xhtml");
    let component = InputComponent::new("form:email").bound_to("#{person.email}");

    let outcome = multi.process_validation(&mut ctx, &component, "this-is-not-an-email");
    let failure = outcome.failure().unwrap();

    assert_eq!(failure.message.summary, "not a well-formed email address");
    assert_eq!(failure.additional_messages, vec![UserMessage::error("size must be between 0 and 10")]);
    assert_eq!(ctx.messages_for("form:email").count(), 2);

    let single = engine();
    let mut ctx = request("/edit.xhtml");
    let outcome = single.process_validation(&mut ctx, &component, "this-is-not-an-email");
    assert!(outcome.failure().unwrap().additional_messages.is_empty());
}

#[test]
fn test_empty_string_interpretation() {
    let component = InputComponent::new("form:middle").bound_to("#{person.middle}");

    let engine = engine();
    let mut ctx = request("/edit.xhtml");
    let outcome = engine.process_validation(&mut ctx, &component, "");
    assert_eq!(outcome.failure().unwrap().message.summary, "may not be null");

    let config = ExtValConfig {
        deactivate_empty_string_interpretation: true,
        ..Default::default()
    };
    let engine = ExtValEngine::builder().with_config(config).with_type_model(person_model()).build();
    let mut ctx = request("/edit.xhtml");
    assert!(engine.process_validation(&mut ctx, &component, "").is_valid());
}

#[test]
fn test_conversion_failure() {
    let engine = engine();
    let mut ctx = request("/edit.xhtml");
    let component = InputComponent::new("form:age")
        .bound_to("#{person.age}")
        .labeled("Age")
        .with_converter(Arc::new(IntegerConverter));

    let outcome = engine.process_validation(&mut ctx, &component, "abc");
    let failure = outcome.failure().unwrap();
    assert_eq!(failure.message.summary, "Age: 'abc' is not a whole number");
    assert!(failure.violations.is_empty());

    let outcome = engine.process_validation(&mut ctx, &component, "101");
    assert_eq!(
        outcome.failure().unwrap().message.summary,
        "Age: Value must be between 1 and 100"
    );
    assert_eq!(ctx.processed_input("person.age"), Some(&Value::Integer(101)));
}

#[test]
fn test_join_validation_borrows_constraints() {
    let engine = engine();
    let mut ctx = request("/edit.xhtml");
    let mut component = InputComponent::new("form:alias").bound_to("#{person.alias}");

    let meta_data = engine.init_component(&mut ctx, &mut component);
    assert_eq!(meta_data.get(keys::MAX_LENGTH), Some(&json!(20)));
    assert_eq!(component.required, Some(true));

    let outcome = engine.process_validation(&mut ctx, &component, "A");
    assert_eq!(
        outcome.failure().unwrap().message.summary,
        "Value must be between 2 and 20 characters"
    );
}

#[test]
fn test_model_validation_after_field_validation() {
    let engine = engine();
    let registration = Bean::new("Registration")
        .with("email", "a@b.at")
        .with("confirmation", "x@y.at");
    let mut ctx = RequestContext::new("/register.xhtml").with_bean("registration", registration);
    let component = InputComponent::new("form:email")
        .bound_to("#{registration.email}")
        .labeled("E-Mail");

    assert!(engine.process_validation(&mut ctx, &component, "a@b.at").is_valid());
    assert!(ctx.bean_validation().has_model_validation_entries("/register.xhtml"));

    let failures = engine.process_model_validation(&mut ctx);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].failure.message.summary, "E-Mail: email, confirmation must be equal");
    assert!(!ctx.bean_validation().has_model_validation_entries("/register.xhtml"));
}

#[test]
fn test_unresolvable_component_is_skipped() {
    let engine = engine();
    let mut ctx = RequestContext::new("/edit.xhtml");
    let mut component = InputComponent::new("form:name").bound_to("#{missing.name}");

    assert!(engine.init_component(&mut ctx, &mut component).is_empty());
    assert!(component.all_validators().next().is_none());
    assert!(engine.process_validation(&mut ctx, &component, "").is_valid());

    let mut unknown = InputComponent::new("form:x").bound_to("#{person.unknown}");
    let mut ctx = request("/edit.xhtml");
    assert!(engine.init_component(&mut ctx, &mut unknown).is_empty());
}

struct SilentInterceptor;

impl ValidationExceptionInterceptor for SilentInterceptor {
    fn after_throwing(&self, _: &ComponentIdentity, _: &[ConstraintViolation], _: &mut UserMessage) -> bool {
        false
    }
}

#[test]
fn test_custom_exception_interceptor_can_suppress() {
    let config = ExtValConfig {
        custom_validation_exception_interceptor: Some("acme.SilentInterceptor".to_string()),
        ..Default::default()
    };
    let engine = ExtValEngine::builder()
        .with_config(config)
        .with_type_model(person_model())
        .register_exception_interceptor("acme.SilentInterceptor", || {
            Ok(Arc::new(SilentInterceptor) as Arc<dyn ValidationExceptionInterceptor>)
        })
        .build();
    let mut ctx = request("/edit.xhtml");
    let component = InputComponent::new("form:name").bound_to("#{person.name}");

    assert!(engine.process_validation(&mut ctx, &component, "A").is_valid());
    assert!(ctx.messages().is_empty());
}

#[derive(Default)]
struct RecordingInterceptor {
    skip: bool,
    seen: Mutex<Vec<usize>>,
}

impl PropertyValidationInterceptor for RecordingInterceptor {
    fn before_validation(
        &self,
        _ctx: &mut RequestContext,
        _component: &InputComponent,
        _value: &Value,
        _information: &PropertyInformation,
    ) -> bool {
        !self.skip
    }

    fn after_validation(
        &self,
        _ctx: &mut RequestContext,
        _component: &InputComponent,
        _value: &Value,
        information: &PropertyInformation,
    ) {
        let stored = information
            .information::<Vec<ConstraintViolation>>(CONSTRAINT_VIOLATIONS)
            .map(Vec::len)
            .unwrap_or(0);
        self.seen.lock().push(stored);
    }
}

#[test]
fn test_property_interceptors_wrap_validation() {
    let recording = Arc::new(RecordingInterceptor::default());
    let engine = ExtValEngine::builder()
        .with_type_model(person_model())
        .add_property_interceptor(recording.clone())
        .build();
    let component = InputComponent::new("form:name").bound_to("#{person.name}");

    let mut ctx = request("/edit.xhtml");
    assert!(!engine.process_validation(&mut ctx, &component, "A").is_valid());
    assert!(engine.process_validation(&mut ctx, &component, "Ada").is_valid());
    assert_eq!(*recording.seen.lock(), vec![1, 0]);

    let skipping = Arc::new(RecordingInterceptor {
        skip: true,
        ..Default::default()
    });
    let engine = ExtValEngine::builder()
        .with_type_model(person_model())
        .add_property_interceptor(skipping.clone())
        .build();
    let mut ctx = request("/edit.xhtml");
    assert!(engine.process_validation(&mut ctx, &component, "A").is_valid());
    assert_eq!(*skipping.seen.lock(), vec![0]);
}

#[test]
fn test_outcome_serializes() {
    let engine = engine();
    let mut ctx = request("/edit.xhtml");
    let component = InputComponent::new("form:name").bound_to("#{person.name}");

    let outcome = engine.process_validation(&mut ctx, &component, "A");
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["outcome"], "failed");
    assert_eq!(json["client_id"], "form:name");

    assert_eq!(serde_json::to_value(ValidationOutcome::Valid).unwrap()["outcome"], "valid");
}
