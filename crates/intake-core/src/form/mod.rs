//! Form engine: conditional visibility, required-field validation, and the
//! derived age value. Pure functions over the current field values, no I/O.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::error::{Error, Result};
use crate::models::{FieldDefinition, FieldType, FieldValue, Schema};

/// Field name carrying the date of birth in `YYYY-MM-DD` form
const DOB_FIELD: &str = "dob";
/// Field name the derived age is written to
const AGE_FIELD: &str = "age";

/// Whether a field is currently shown, given the raw form values.
///
/// Only one level of dependency is supported: the conditional inspects the
/// dependee's raw value even when the dependee is itself hidden, which can
/// leave a stale match. That is the shipped behavior and callers rely on it.
#[must_use]
pub fn is_visible(field: &FieldDefinition, values: &BTreeMap<String, FieldValue>) -> bool {
    let Some(conditional) = &field.conditional else {
        return true;
    };

    let matches = values.get(&conditional.field) == Some(&conditional.value);
    if conditional.negate {
        !matches
    } else {
        matches
    }
}

/// Labels of required, currently-visible fields with no value, in schema
/// order. Hidden required fields are exempt.
#[must_use]
pub fn missing_required(schema: &Schema, values: &BTreeMap<String, FieldValue>) -> Vec<String> {
    schema
        .elements
        .iter()
        .filter(|field| field.required && is_visible(field, values))
        .filter(|field| values.get(&field.name).map_or(true, FieldValue::is_empty))
        .map(|field| field.label.clone())
        .collect()
}

/// Reject a submission that misses required fields
pub fn validate(schema: &Schema, values: &BTreeMap<String, FieldValue>) -> Result<()> {
    let missing = missing_required(schema, values);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(missing))
    }
}

/// Whole-year age at `today` for the given birth date
#[must_use]
pub fn compute_age(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if today.month() < birth.month()
        || (today.month() == birth.month() && today.day() < birth.day())
    {
        age -= 1;
    }
    age
}

/// Fill in the derived `age` field when the schema has a date-typed `dob`
/// field, its value parses, and no explicit age was entered.
pub fn derive_age(schema: &Schema, values: &mut BTreeMap<String, FieldValue>, today: NaiveDate) {
    let has_dob_field = schema
        .elements
        .iter()
        .any(|field| field.name == DOB_FIELD && field.field_type == FieldType::Date);
    if !has_dob_field {
        return;
    }

    let has_age = values.get(AGE_FIELD).is_some_and(|value| !value.is_empty());
    if has_age {
        return;
    }

    let Some(FieldValue::Text(raw)) = values.get(DOB_FIELD) else {
        return;
    };
    let Ok(birth) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") else {
        return;
    };

    values.insert(
        AGE_FIELD.to_string(),
        FieldValue::Number(f64::from(compute_age(birth, today))),
    );
}

/// Validate the form values and attach derived fields, producing the final
/// field map ready for persistence. No persistence happens on failure.
pub fn prepare_submission(
    schema: &Schema,
    mut values: BTreeMap<String, FieldValue>,
    today: NaiveDate,
) -> Result<BTreeMap<String, FieldValue>> {
    validate(schema, &values)?;
    derive_age(schema, &mut values, today);
    Ok(values)
}
