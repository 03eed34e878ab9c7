//! Preprocessor chain runner.

use tracing::debug;

use crate::domain::{Payload, RequestError, Stage, validate};
use crate::typed::PreprocessorSpec;

/// Run `chain` in order over `payload`.
///
/// Each stage is validated against its own signature before it is called and
/// receives only the fields it declares. Its output replaces the working
/// payload. An empty chain returns `payload` unchanged.
pub fn run_chain(chain: &[PreprocessorSpec], payload: Payload) -> Result<Payload, RequestError> {
    let mut working = payload;
    for spec in chain {
        let stage = Stage::Preprocessor(spec.name().to_string());
        let args = validate(&working, spec.signature(), &stage)?;

        working = spec.call(args).map_err(|e| RequestError::PreprocessFailed {
            preprocessor: spec.name().to_string(),
            reason: e.to_string(),
        })?;
        debug!(preprocessor = spec.name(), fields = working.len(), "preprocessed payload");
    }
    Ok(working)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::preprocessor::fixtures::{NonEmpty, NumberToText, TwoTimes};
    use serde_json::{Value, json};
    use std::sync::atomic::Ordering;

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn empty_chain_returns_payload_unchanged() {
        let input = payload(json!({"a": 1, "b": "x"}));
        assert_eq!(run_chain(&[], input.clone()).unwrap(), input);
    }

    #[test]
    fn output_replaces_the_payload() {
        let chain = vec![PreprocessorSpec::new(NumberToText::default()).unwrap()];
        let out = run_chain(&chain, payload(json!({"number": 1, "other": true}))).unwrap();
        assert_eq!(Value::Object(out), json!({"text": "1"}));
    }

    #[test]
    fn stages_run_in_registration_order() {
        let chain = vec![
            PreprocessorSpec::new(NumberToText::default()).unwrap(),
            PreprocessorSpec::new(TwoTimes).unwrap(),
        ];
        let out = run_chain(&chain, payload(json!({"number": 12}))).unwrap();
        assert_eq!(out["text"], "1212");
    }

    #[test]
    fn missing_input_fails_before_the_call() {
        let pre = NumberToText::default();
        let calls = pre.calls.clone();
        let chain = vec![PreprocessorSpec::new(pre).unwrap()];

        let err = run_chain(&chain, Payload::new()).unwrap_err();
        assert_eq!(
            err,
            RequestError::MissingField {
                stage: Stage::Preprocessor("number_to_text".into()),
                field: "number".into(),
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn wrong_input_type_is_attributed_to_the_stage() {
        let chain = vec![PreprocessorSpec::new(TwoTimes).unwrap()];
        let err = run_chain(&chain, payload(json!({"text": 1}))).unwrap_err();
        assert_eq!(err.title(), "Invalid type");
        assert_eq!(err.stage(), Some(&Stage::Preprocessor("two_times".into())));
    }

    #[test]
    fn second_stage_sees_only_first_stage_output() {
        // number_to_text drops "keep", so non_empty still finds "text" but
        // a stage needing "keep" would not.
        let chain = vec![
            PreprocessorSpec::new(NumberToText::default()).unwrap(),
            PreprocessorSpec::new(NonEmpty).unwrap(),
        ];
        let out = run_chain(&chain, payload(json!({"number": 3, "keep": "x"}))).unwrap();
        assert!(!out.contains_key("keep"));
    }

    #[test]
    fn rejection_surfaces_as_preprocess_failed() {
        let chain = vec![PreprocessorSpec::new(NonEmpty).unwrap()];
        let err = run_chain(&chain, payload(json!({"text": ""}))).unwrap_err();
        assert_eq!(err.title(), "Preprocess failed");
        assert!(err.description().contains("non_empty"));
    }
}
