//! Proposal pricing rows, extras, and the derived total.
//!
//! The total is never stored; it is recomputed from the rows and the
//! selected extras whenever it is displayed. Single currency throughout.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum number of pricing rows per proposal.
pub const MAX_PRICING_ROWS: usize = 50;

/// Maximum number of extras per proposal.
pub const MAX_EXTRAS: usize = 100;

/// One traveler type at a unit price, e.g. "Adult x 2 @ 500".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRow {
    pub traveler_type: String,
    pub unit_price: f64,
    pub count: i32,
}

impl PricingRow {
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.count)
    }
}

/// An optional add-on the client may select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extra {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub selected: bool,
}

/// `sum(unit_price * count)` over rows plus `sum(price)` over selected extras.
pub fn total_price(rows: &[PricingRow], extras: &[Extra]) -> f64 {
    let rows_total: f64 = rows.iter().map(PricingRow::subtotal).sum();
    let extras_total: f64 = extras.iter().filter(|e| e.selected).map(|e| e.price).sum();
    rows_total + extras_total
}

/// Whole currency units for display (truncates, no rounding).
pub fn display_price(total: f64) -> i64 {
    total.trunc() as i64
}

fn ensure_non_negative(value: f64, label: &str) -> Result<(), CoreError> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::Validation(format!(
            "{label} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

pub fn validate_pricing_row(row: &PricingRow) -> Result<(), CoreError> {
    if row.traveler_type.trim().is_empty() {
        return Err(CoreError::Validation(
            "Pricing row traveler type must not be empty".to_string(),
        ));
    }
    ensure_non_negative(row.unit_price, "Pricing row unit price")?;
    if row.count < 0 {
        return Err(CoreError::Validation(format!(
            "Pricing row count must not be negative, got {}",
            row.count
        )));
    }
    Ok(())
}

pub fn validate_extra(extra: &Extra) -> Result<(), CoreError> {
    if extra.name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Extra name must not be empty".to_string(),
        ));
    }
    ensure_non_negative(extra.price, "Extra price")
}

/// Validate a full pricing sheet.
pub fn validate_pricing(rows: &[PricingRow], extras: &[Extra]) -> Result<(), CoreError> {
    if rows.len() > MAX_PRICING_ROWS {
        return Err(CoreError::Validation(format!(
            "At most {MAX_PRICING_ROWS} pricing rows are allowed, got {}",
            rows.len()
        )));
    }
    if extras.len() > MAX_EXTRAS {
        return Err(CoreError::Validation(format!(
            "At most {MAX_EXTRAS} extras are allowed, got {}",
            extras.len()
        )));
    }
    rows.iter().try_for_each(validate_pricing_row)?;
    extras.iter().try_for_each(validate_extra)
}
