//! Tour template form validation.
//!
//! Field rules are declared with `validator` and reported per field so the
//! editor can show them inline. Day titles are checked per position
//! (`days[2].title`). A valid form is converted into a [`ValidatedTour`] with
//! a parsed price and renumbered days.

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::error::{CoreError, FieldErrors};
use crate::itinerary::{renumber_days, Day};

/// Maximum length of a single tag.
pub const MAX_TAG_LENGTH: usize = 40;

/// The tour editor form as submitted.
///
/// `price` arrives as text exactly as typed.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TourForm {
    #[validate(length(
        min = 3,
        max = 120,
        message = "Tour name must be between 3 and 120 characters"
    ))]
    pub name: String,

    #[validate(length(
        min = 10,
        max = 5000,
        message = "Overview must be between 10 and 5000 characters"
    ))]
    pub overview: String,

    #[validate(custom(function = "validate_price_text"))]
    pub price: String,

    #[validate(length(min = 1, message = "At least one day is required"))]
    #[serde(default)]
    pub days: Vec<Day>,

    #[validate(
        length(min = 1, message = "At least one tag is required"),
        custom(function = "validate_tags")
    )]
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A tour form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTour {
    pub name: String,
    pub overview: String,
    pub price: f64,
    pub tags: Vec<String>,
    pub days: Vec<Day>,
}

/// Parse a price typed into the form. Must be a finite number >= 0.
pub fn parse_price(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

fn validate_price_text(value: &str) -> Result<(), ValidationError> {
    if parse_price(value).is_some() {
        return Ok(());
    }
    let mut err = ValidationError::new("price");
    err.message = Some("Price must be a non-negative number".into());
    Err(err)
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags
        .iter()
        .any(|t| t.trim().is_empty() || t.trim().chars().count() > MAX_TAG_LENGTH)
    {
        let mut err = ValidationError::new("tags");
        err.message = Some("Tags must be non-empty and at most 40 characters".into());
        return Err(err);
    }
    Ok(())
}

impl TourForm {
    /// The form with surrounding whitespace removed from its text fields.
    ///
    /// Length rules apply to what is stored, so they run on this.
    pub fn trimmed(&self) -> TourForm {
        TourForm {
            name: self.name.trim().to_string(),
            overview: self.overview.trim().to_string(),
            price: self.price.trim().to_string(),
            days: self.days.clone(),
            tags: self.tags.clone(),
        }
    }

    /// Run every rule and collect the messages per field.
    pub fn field_errors(&self) -> FieldErrors {
        let mut out = FieldErrors::new();

        if let Err(errors) = self.trimmed().validate() {
            for (field, errs) in errors.field_errors() {
                for e in errs.iter() {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{field} is invalid ({})", e.code));
                    out.add(field.to_string(), message);
                }
            }
        }

        for (i, day) in self.days.iter().enumerate() {
            if day.title.trim().is_empty() {
                out.add(format!("days[{i}].title"), format!("Day {} needs a title", i + 1));
            }
        }

        out
    }

    /// Validate and convert into a [`ValidatedTour`].
    ///
    /// Days are renumbered `1..=N` in submission order; tags are trimmed and
    /// de-duplicated.
    pub fn into_validated(self) -> Result<ValidatedTour, CoreError> {
        self.field_errors().into_result()?;

        let price = parse_price(&self.price)
            .ok_or_else(|| CoreError::Validation("Price must be a non-negative number".into()))?;

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            let tag = tag.trim().to_string();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let mut days = self.days;
        renumber_days(&mut days);

        Ok(ValidatedTour {
            name: self.name.trim().to_string(),
            overview: self.overview.trim().to_string(),
            price,
            tags,
            days,
        })
    }
}
