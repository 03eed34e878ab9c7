//! Validator: checks a payload against a signature.

use super::errors::{RequestError, Stage};
use super::payload::Payload;
use super::signature::TaskSignature;

/// Check presence and exact type of every field in `signature`, in
/// declaration order, and return the payload restricted to those fields.
///
/// Fields not named by the signature are ignored and dropped from the result.
pub fn validate(
    payload: &Payload,
    signature: &TaskSignature,
    stage: &Stage,
) -> Result<Payload, RequestError> {
    let mut validated = Payload::new();
    for param in signature.params() {
        let value = payload
            .get(&param.name)
            .ok_or_else(|| RequestError::MissingField {
                stage: stage.clone(),
                field: param.name.clone(),
            })?;

        if !param.ty.matches(value) {
            return Err(RequestError::InvalidType {
                stage: stage.clone(),
                field: param.name.clone(),
                expected: param.ty,
            });
        }

        validated.insert(param.name.clone(), value.clone());
    }
    Ok(validated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParamType;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn text_and_number() -> TaskSignature {
        TaskSignature::from_params(&[("text", ParamType::Str), ("number", ParamType::Int)]).unwrap()
    }

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn empty_message_is_missing_field() {
        let err = validate(&Payload::new(), &text_and_number(), &Stage::Task).unwrap_err();
        assert!(matches!(err, RequestError::MissingField { ref field, .. } if field == "text"));
        assert_eq!(err.title(), "Missing required filed");
    }

    #[rstest]
    #[case::text_is_int(json!({"text": 1, "number": 1}), "text")]
    #[case::number_is_string(json!({"text": "a", "number": "1"}), "number")]
    #[case::number_is_float(json!({"text": "a", "number": 1.0}), "number")]
    fn wrong_type_is_invalid_type(#[case] body: Value, #[case] bad_field: &str) {
        let err = validate(&payload(body), &text_and_number(), &Stage::Task).unwrap_err();
        assert!(matches!(err, RequestError::InvalidType { ref field, .. } if field == bad_field));
        assert_eq!(err.title(), "Invalid type");
    }

    #[test]
    fn valid_payload_is_restricted_to_signature() {
        let body = payload(json!({"text": "a", "number": 1, "extra": true}));
        let validated = validate(&body, &text_and_number(), &Stage::Task).unwrap();

        assert_eq!(Value::Object(validated), json!({"text": "a", "number": 1}));
    }

    #[test]
    fn stage_is_carried_into_the_error() {
        let stage = Stage::Preprocessor("two_times".into());
        let err = validate(&Payload::new(), &text_and_number(), &stage).unwrap_err();
        assert_eq!(err.stage(), Some(&stage));
    }

    #[test]
    fn whole_number_with_fraction_is_a_float() {
        let signature = TaskSignature::from_params(&[("ratio", ParamType::Float)]).unwrap();
        let message = crate::domain::parse_message(br#"{"message": {"ratio": 3.0}}"#).unwrap();
        assert!(validate(&message, &signature, &Stage::Task).is_ok());

        let message = crate::domain::parse_message(br#"{"message": {"ratio": 3}}"#).unwrap();
        assert_eq!(
            validate(&message, &signature, &Stage::Task).unwrap_err().title(),
            "Invalid type"
        );
    }

    #[test]
    fn empty_signature_accepts_anything() {
        let body = payload(json!({"whatever": 1}));
        let validated = validate(&body, &TaskSignature::default(), &Stage::Task).unwrap();
        assert!(validated.is_empty());
    }
}
