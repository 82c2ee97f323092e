//! Form schema model

use serde::{Deserialize, Serialize};

use super::record::FieldValue;

/// Input type of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Boolean,
    Select,
    Textarea,
}

/// Predicate making a field's visibility depend on another field's value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditional {
    /// Name of the field whose value is inspected
    pub field: String,
    /// Value to compare against
    pub value: FieldValue,
    /// When true, the field is visible on a mismatch instead of a match
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub negate: bool,
}

/// One element of a form schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Unique name within the schema; key into a record's field map
    pub name: String,
    /// Human-readable label shown to the user and in validation messages
    pub label: String,
    /// Input type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether a visible field must carry a value at submission
    #[serde(default)]
    pub required: bool,
    /// Choices for `select` fields, in render order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Optional visibility rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<Conditional>,
}

impl FieldDefinition {
    /// Plain field with no options or conditional
    #[must_use]
    pub fn new(name: &str, label: &str, field_type: FieldType, required: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            field_type,
            required,
            options: Vec::new(),
            conditional: None,
        }
    }

    /// Attach select options
    #[must_use]
    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(ToString::to_string).collect();
        self
    }

    /// Attach a visibility rule
    #[must_use]
    pub fn with_conditional(mut self, field: &str, value: FieldValue, negate: bool) -> Self {
        self.conditional = Some(Conditional {
            field: field.to_string(),
            value,
            negate,
        });
        self
    }
}

/// An ordered, versioned list of field definitions.
///
/// Element order is meaningful (render order) and preserved through cache
/// round-trips. The embedded default schema carries no version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    pub elements: Vec<FieldDefinition>,
}

impl Schema {
    /// The built-in fallback schema used when neither the remote service nor
    /// the local cache can provide one.
    #[must_use]
    pub fn default_embedded() -> Self {
        use FieldType::{Boolean, Date, Number, Select, Text, Textarea};

        Self {
            version: None,
            elements: vec![
                FieldDefinition::new("firstName", "First Name", Text, true),
                FieldDefinition::new("lastName", "Last Name", Text, true),
                FieldDefinition::new("dob", "Date of Birth", Date, false),
                FieldDefinition::new("gender", "Gender", Select, false)
                    .with_options(&["Male", "Female"]),
                FieldDefinition::new("phone", "Phone Number", Text, false),
                FieldDefinition::new("address", "Address", Textarea, false),
                FieldDefinition::new("baptized", "Baptized?", Boolean, false),
                FieldDefinition::new("waterBaptized", "Water Baptism?", Boolean, false)
                    .with_conditional("baptized", FieldValue::Bool(true), false),
                FieldDefinition::new("holyGhostBaptized", "Holy Ghost Baptism?", Boolean, false)
                    .with_conditional("baptized", FieldValue::Bool(true), false),
                FieldDefinition::new("presidingElder", "Presiding Elder Name", Text, false),
                FieldDefinition::new("working", "Working?", Boolean, false),
                FieldDefinition::new("occupation", "Occupation Category", Text, false)
                    .with_conditional("working", FieldValue::Bool(true), false),
                FieldDefinition::new("maritalStatus", "Marital Status", Select, false)
                    .with_options(&["Single", "Married", "Divorced", "Widowed"]),
                FieldDefinition::new("childrenCount", "Number of Children", Number, false)
                    .with_conditional("maritalStatus", FieldValue::Text("Single".into()), true),
                FieldDefinition::new("ministry", "Ministry/Department", Select, false)
                    .with_options(&["Choir", "Ushering", "Youth", "Prayer", "Other"]),
                FieldDefinition::new("joinedDate", "Date Joined Church", Date, false),
                FieldDefinition::new("prayerRequests", "Prayer Requests", Textarea, false),
            ],
        }
    }
}
