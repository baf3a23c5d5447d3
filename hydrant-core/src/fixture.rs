use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a fixture.
///
/// New ids are UUID v4 strings, but any string read back from storage is
/// accepted as-is so that older collections keep their ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureId(String);

impl FixtureId {
    pub(crate) fn generate() -> Self {
        FixtureId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FixtureId {
    fn from(s: &str) -> Self {
        FixtureId(s.to_string())
    }
}

impl From<String> for FixtureId {
    fn from(s: String) -> Self {
        FixtureId(s)
    }
}

impl fmt::Display for FixtureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The kinds of fixture a household can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixtureType {
    #[serde(rename = "Kitchen Sink")]
    KitchenSink,
    #[serde(rename = "Bathroom Sink")]
    BathroomSink,
    #[serde(rename = "Toilet")]
    Toilet,
    #[serde(rename = "Shower")]
    Shower,
    #[serde(rename = "Dishwasher")]
    Dishwasher,
    #[serde(rename = "Washing Machine")]
    WashingMachine,
}

impl FixtureType {
    pub const ALL: [FixtureType; 6] = [
        FixtureType::KitchenSink,
        FixtureType::BathroomSink,
        FixtureType::Toilet,
        FixtureType::Shower,
        FixtureType::Dishwasher,
        FixtureType::WashingMachine,
    ];

    /// Human-readable label, identical to the persisted form.
    pub fn label(self) -> &'static str {
        match self {
            FixtureType::KitchenSink => "Kitchen Sink",
            FixtureType::BathroomSink => "Bathroom Sink",
            FixtureType::Toilet => "Toilet",
            FixtureType::Shower => "Shower",
            FixtureType::Dishwasher => "Dishwasher",
            FixtureType::WashingMachine => "Washing Machine",
        }
    }

    /// Device name used for this kind of fixture in the usage datasets.
    pub fn device_slug(self) -> &'static str {
        match self {
            FixtureType::KitchenSink => "kitchen_sink",
            FixtureType::BathroomSink => "bathroom_sink",
            FixtureType::Toilet => "toilet",
            FixtureType::Shower => "shower",
            FixtureType::Dishwasher => "dishwasher",
            FixtureType::WashingMachine => "washing_machine",
        }
    }
}

impl fmt::Display for FixtureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FixtureType {
    type Err = ValidationError;

    /// Accepts the label ("Washing Machine") or the device slug ("washing_machine"),
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FixtureType::ALL
            .into_iter()
            .find(|t| {
                t.label().eq_ignore_ascii_case(wanted) || t.device_slug().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ValidationError::UnknownType(s.to_string()))
    }
}

/// Rejection of a create/update payload. Nothing is mutated or written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("fixture {0} must not be empty")]
    EmptyField(&'static str),
    #[error("unknown fixture type {0:?}")]
    UnknownType(String),
}

/// The user-editable part of a fixture: everything except its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureFields {
    pub name: String,
    #[serde(rename = "type")]
    pub fixture_type: FixtureType,
    pub location: String,
}

impl FixtureFields {
    pub fn new(
        name: impl Into<String>,
        fixture_type: FixtureType,
        location: impl Into<String>,
    ) -> Self {
        FixtureFields {
            name: name.into(),
            fixture_type,
            location: location.into(),
        }
    }

    /// Checks that no free-text field is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        if self.location.trim().is_empty() {
            return Err(ValidationError::EmptyField("location"));
        }
        Ok(())
    }
}

/// A user-declared water fixture as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    id: FixtureId,
    pub name: String,
    #[serde(rename = "type")]
    pub fixture_type: FixtureType,
    pub location: String,
}

impl Fixture {
    pub(crate) fn new(id: FixtureId, fields: FixtureFields) -> Self {
        Fixture {
            id,
            name: fields.name,
            fixture_type: fields.fixture_type,
            location: fields.location,
        }
    }

    pub fn id(&self) -> &FixtureId {
        &self.id
    }

    /// Returns a copy of the editable fields, e.g. to prefill an edit form.
    pub fn fields(&self) -> FixtureFields {
        FixtureFields {
            name: self.name.clone(),
            fixture_type: self.fixture_type,
            location: self.location.clone(),
        }
    }

    pub(crate) fn apply(&mut self, fields: FixtureFields) {
        self.name = fields.name;
        self.fixture_type = fields.fixture_type;
        self.location = fields.location;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_type_parses_labels_and_slugs() {
        assert_eq!("Kitchen Sink".parse::<FixtureType>().unwrap(), FixtureType::KitchenSink);
        assert_eq!("washing_machine".parse::<FixtureType>().unwrap(), FixtureType::WashingMachine);
        assert_eq!(" toilet ".parse::<FixtureType>().unwrap(), FixtureType::Toilet);
        assert_eq!(
            "Bathtub".parse::<FixtureType>().unwrap_err(),
            ValidationError::UnknownType("Bathtub".to_string())
        );
    }

    #[test]
    fn fixture_type_serializes_as_label() {
        let json = serde_json::to_string(&FixtureType::BathroomSink).unwrap();
        assert_eq!(json, "\"Bathroom Sink\"");

        for t in FixtureType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.label()));
        }
    }

    #[test]
    fn fixture_json_shape() {
        let fixture = Fixture::new(
            FixtureId::from("1712345678901"),
            FixtureFields::new("Master Bathroom Sink", FixtureType::BathroomSink, "Second Floor"),
        );

        let value = serde_json::to_value(&fixture).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "1712345678901",
                "name": "Master Bathroom Sink",
                "type": "Bathroom Sink",
                "location": "Second Floor",
            })
        );
    }

    #[test]
    fn validate_rejects_blank_fields() {
        let blank_name = FixtureFields::new("  ", FixtureType::Shower, "Upstairs");
        assert_eq!(blank_name.validate(), Err(ValidationError::EmptyField("name")));

        let blank_location = FixtureFields::new("Shower", FixtureType::Shower, "");
        assert_eq!(blank_location.validate(), Err(ValidationError::EmptyField("location")));

        let ok = FixtureFields::new("Shower", FixtureType::Shower, "Upstairs");
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(FixtureId::generate(), FixtureId::generate());
    }
}
