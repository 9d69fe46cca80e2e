/// Property-based tests using proptest
/// Tests invariants that should hold for all valid loan applications
use loan_default_api::artifact::{Classifier, Label, LoadedArtifact};
use loan_default_api::errors::PredictionError;
use loan_default_api::forest::ForestPipeline;
use loan_default_api::frame::FeatureFrame;
use loan_default_api::models::{Decision, LoanApplication, FEATURE_NAMES};
use loan_default_api::services::InferenceService;
use loan_default_api::validation::{categorical, decimal};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::sync::Arc;

struct StubClassifier(Label);

impl Classifier for StubClassifier {
    fn predict(&self, _frame: &FeatureFrame) -> Result<Vec<Label>, PredictionError> {
        Ok(vec![self.0])
    }
}

fn bundled_forest() -> Arc<ForestPipeline> {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("ML_artifact/RFC_pipeline.json");
    let bytes = std::fs::read(path).unwrap();
    Arc::new(ForestPipeline::from_json_slice(&bytes).unwrap())
}

fn token() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec!["EN", "ET", "OWNER", "TENANT", "0", "1", "A", "HR"])
            .prop_map(str::to_string),
        "\\PC{0,12}",
    ]
}

fn number() -> impl Strategy<Value = f64> {
    prop_oneof![-1.0e9..1.0e9f64, Just(0.0), Just(-0.0)]
}

/// Arbitrary valid application bodies, categoricals first.
fn application_body() -> impl Strategy<Value = Value> {
    (
        prop::collection::vec(token(), 4),
        prop::collection::vec(number(), 14),
    )
        .prop_map(|(tokens, numbers)| {
            let mut body = Map::new();
            let mut tokens = tokens.into_iter();
            let mut numbers = numbers.into_iter();
            for name in FEATURE_NAMES {
                let value = match name {
                    "LanguageCode" | "HomeOwnershipType" | "Restructured" | "Rating" => {
                        json!(tokens.next().unwrap())
                    }
                    _ => json!(numbers.next().unwrap()),
                };
                body.insert(name.to_string(), value);
            }
            Value::Object(body)
        })
}

// Property: every valid application classifies, and the answer is stable
proptest! {
    #[test]
    fn valid_applications_always_classify(body in application_body()) {
        let record = LoanApplication::from_json(&body);
        prop_assert!(record.is_ok());

        let service = InferenceService::with_artifact(LoadedArtifact::in_memory(bundled_forest(), "bundled"));
        let first = service.classify(record.clone().unwrap());
        prop_assert!(matches!(first, Ok(Decision::NotDefaulted) | Ok(Decision::Defaulted)));
        prop_assert_eq!(service.classify(record.unwrap()), first);
    }

    #[test]
    fn only_label_zero_maps_to_not_defaulted(label in any::<i64>(), body in application_body()) {
        let service = InferenceService::with_artifact(LoadedArtifact::in_memory(
            Arc::new(StubClassifier(label)),
            "stub",
        ));
        let decision = service.classify(LoanApplication::from_json(&body).unwrap()).unwrap();
        if label == 0 {
            prop_assert_eq!(decision, Decision::NotDefaulted);
        } else {
            prop_assert_eq!(decision, Decision::Defaulted);
        }
    }

    #[test]
    fn dropping_any_field_is_a_schema_error(body in application_body(), index in 0usize..18) {
        let mut body = body;
        let field = FEATURE_NAMES[index];
        body.as_object_mut().unwrap().remove(field);

        let err = LoanApplication::from_json(&body).unwrap_err();
        prop_assert!(err.mentions(field));
        prop_assert_eq!(err.issues.len(), 1);
    }
}

// Property: coercion never panics
proptest! {
    #[test]
    fn decimal_coercion_never_panics(raw in "\\PC*") {
        let _ = decimal(&json!(raw));
    }

    #[test]
    fn categorical_coercion_accepts_any_string(raw in "\\PC*") {
        let parsed = categorical(&json!(raw.clone()));
        prop_assert_eq!(parsed.map(|t| t.into_inner()), Some(raw));
    }

    #[test]
    fn finite_numbers_round_trip_through_strings(value in -1.0e12..1.0e12f64) {
        prop_assert_eq!(decimal(&json!(value.to_string())), Some(value));
    }
}
