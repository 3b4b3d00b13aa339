use chrono::{DateTime, Utc};

use crate::{
    const_config::car::CAR_FIELD_MAX_LENGTH,
    errors::{ConversionError, ErrorBody},
    id::DbId,
};

/// A car note as stored by the server
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct Car {
    pub id: DbId,
    /// Owner of the note
    pub user: DbId,
    pub brand: String,
    pub model: String,
    pub motor: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// The fields of a car a user is able to set
#[derive(Debug, Default, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct CarFields {
    pub brand: String,
    pub model: String,
    pub motor: String,
}

/// Distinct values available to filter the car list by
#[derive(Debug, Default, serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq)]
pub struct CarFilterOptions {
    pub brands: Vec<String>,
    pub motors: Vec<String>,
}

impl From<&Car> for CarFields {
    fn from(value: &Car) -> Self {
        Self {
            brand: value.brand.clone(),
            model: value.model.clone(),
            motor: value.motor.clone(),
        }
    }
}

impl CarFields {
    pub fn new<S: Into<String>>(brand: S, model: S, motor: S) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            motor: motor.into(),
        }
    }

    /// Checks the same constraints the server enforces so obvious mistakes
    /// are reported without a round trip
    pub fn validate(&self) -> Result<(), ErrorBody> {
        let mut errors = ErrorBody::Empty;
        for (name, value) in [
            ("brand", &self.brand),
            ("model", &self.model),
            ("motor", &self.motor),
        ] {
            if let Err(e) = validate_field(value) {
                errors.push_field_error(name, field_error_message(&e));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Returns true if any field differs from the car passed
    pub fn differs_from(&self, car: &Car) -> bool {
        self != &CarFields::from(car)
    }
}

fn validate_field(value: &str) -> Result<(), ConversionError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConversionError::Empty);
    }
    let actual = value.chars().count();
    if actual > CAR_FIELD_MAX_LENGTH {
        return Err(ConversionError::MaxExceeded {
            max: CAR_FIELD_MAX_LENGTH,
            actual,
        });
    }
    Ok(())
}

fn field_error_message(err: &ConversionError) -> String {
    match err {
        ConversionError::Empty => "This field may not be blank.".to_string(),
        ConversionError::MaxExceeded { max, .. } => {
            format!("Ensure this field has no more than {max} characters.")
        }
    }
}
