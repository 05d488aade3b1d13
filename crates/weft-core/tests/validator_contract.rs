//! Validators behind the shared async contract.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use futures::executor::block_on;
use proptest::prelude::*;
use weft_core::{
    validator_fn, AcceptAll, BoxedValidator, ErrorCategory, FieldErrors, Schema, SchemaError,
    SchemaValidator, SyncValidator, ValidatorFault,
};

#[derive(Clone, Debug, PartialEq)]
struct Address {
    street: String,
    postcode: String,
}

fn address_schema() -> Schema<Address> {
    Schema::new()
        .ensure("street", "required", |a: &Address| !a.street.trim().is_empty())
        .ensure("postcode", "required", |a: &Address| !a.postcode.is_empty())
        .ensure("postcode", "must be 5 digits", |a: &Address| {
            a.postcode.len() == 5 && a.postcode.chars().all(|c| c.is_ascii_digit())
        })
        .normalize(|a: &Address| Address {
            street: a.street.trim().to_string(),
            postcode: a.postcode.clone(),
        })
}

#[test]
fn test_boxed_validators_are_interchangeable() {
    let validators: Vec<BoxedValidator<Address>> = vec![
        Arc::new(address_schema()),
        Arc::new(AcceptAll),
        Arc::new(validator_fn(|_: &Address| {
            Err(ValidatorFault::internal("schema service unavailable").into())
        })),
    ];
    let candidate = Address {
        street: "  Main St ".to_string(),
        postcode: "12345".to_string(),
    };

    let outcomes: Vec<_> = validators
        .iter()
        .map(|v| block_on(v.validate(&candidate)))
        .collect();

    assert_eq!(outcomes[0].as_ref().unwrap().street, "Main St");
    assert_eq!(outcomes[1].as_ref().unwrap(), &candidate);
    let fault = outcomes[2].as_ref().unwrap_err();
    assert_eq!(fault.category(), ErrorCategory::Operation);
    assert!(fault.clone().into_field_errors().root_message().is_some());
}

#[test]
fn test_first_failing_rule_per_field_wins() {
    let rejected = address_schema()
        .validate_sync(&Address {
            street: String::new(),
            postcode: String::new(),
        })
        .unwrap_err();

    let SchemaError::Invalid(errors) = rejected else {
        panic!("expected field errors");
    };
    assert_eq!(errors.get("street"), Some("required"));
    assert_eq!(errors.get("postcode"), Some("required"));
    assert_eq!(errors.len(), 2);
}

proptest! {
    /// `validate_sync` accepts exactly when `check` reports nothing.
    #[test]
    fn check_and_validate_agree(street in "[ a-z]{0,8}", postcode in "[0-9a]{0,6}") {
        let schema = address_schema();
        let candidate = Address { street, postcode };
        let errors = schema.check(&candidate);
        match schema.validate_sync(&candidate) {
            Ok(normalized) => {
                prop_assert!(errors.is_empty());
                prop_assert_eq!(normalized.street, candidate.street.trim());
            }
            Err(rejection) => {
                prop_assert_eq!(rejection.category(), ErrorCategory::Input);
                prop_assert_eq!(rejection.into_field_errors(), errors);
            }
        }
    }

    /// Validation is deterministic for a given candidate.
    #[test]
    fn validation_is_pure(street in "[ a-z]{0,8}", postcode in "[0-9]{0,6}") {
        let schema = address_schema();
        let candidate = Address { street, postcode };
        let first: Result<Address, FieldErrors> =
            schema.validate_sync(&candidate).map_err(SchemaError::into_field_errors);
        let second: Result<Address, FieldErrors> =
            block_on(SchemaValidator::validate(&schema, &candidate))
                .map_err(SchemaError::into_field_errors);
        prop_assert_eq!(first, second);
    }
}
