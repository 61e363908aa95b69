//! The itinerary aggregate shared by proposals, tour templates and themes.
//!
//! A proposal owns its days; each day owns its activities, accommodations
//! and meals record. Nothing inside an itinerary is shared across proposals,
//! so the whole tree can be validated and renumbered in memory before it is
//! written.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::pricing::{total_price, validate_pricing, Extra, PricingRow};
use crate::types::DbId;

/// Maximum number of days in a single itinerary.
pub const MAX_DAYS: usize = 120;

/// Maximum activities per day.
pub const MAX_ACTIVITIES_PER_DAY: usize = 30;

// ---------------------------------------------------------------------------
// Moments
// ---------------------------------------------------------------------------

/// Time-of-day bucket an activity is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Moment {
    EarlyMorning,
    Morning,
    Midday,
    Afternoon,
    Evening,
    Night,
    FullDay,
}

const VALID_MOMENTS: &[&str] = &[
    "early_morning",
    "morning",
    "midday",
    "afternoon",
    "evening",
    "night",
    "full_day",
];

impl Moment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EarlyMorning => "early_morning",
            Self::Morning => "morning",
            Self::Midday => "midday",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
            Self::FullDay => "full_day",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "early_morning" => Ok(Self::EarlyMorning),
            "morning" => Ok(Self::Morning),
            "midday" => Ok(Self::Midday),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            "night" => Ok(Self::Night),
            "full_day" => Ok(Self::FullDay),
            _ => Err(CoreError::Validation(format!(
                "Invalid moment '{s}'. Must be one of: {}",
                VALID_MOMENTS.join(", ")
            ))),
        }
    }

    /// Human label used by the themes.
    pub fn label(&self) -> &'static str {
        match self {
            Self::EarlyMorning => "Early morning",
            Self::Morning => "Morning",
            Self::Midday => "Midday",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::Night => "Night",
            Self::FullDay => "Full day",
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub moment: Moment,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Which meals are included on a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Meals {
    pub breakfast: bool,
    pub lunch: bool,
    pub dinner: bool,
}

impl Meals {
    pub fn count(&self) -> usize {
        [self.breakfast, self.lunch, self.dinner]
            .iter()
            .filter(|m| **m)
            .count()
    }

    /// Short code such as `"B, L"`; empty when nothing is included.
    pub fn short_code(&self) -> String {
        let mut parts = Vec::new();
        if self.breakfast {
            parts.push("B");
        }
        if self.lunch {
            parts.push("L");
        }
        if self.dinner {
            parts.push("D");
        }
        parts.join(", ")
    }
}

/// A park or location a day is spent at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationRef {
    pub id: Option<DbId>,
    pub name: String,
}

/// A lodge or hotel used on a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationRef {
    pub id: Option<DbId>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    /// Assigned by position on save; payloads may omit it.
    #[serde(default)]
    pub day_number: i32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub destination: Option<DestinationRef>,
    #[serde(default)]
    pub accommodations: Vec<AccommodationRef>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub meals: Meals,
}

impl Day {
    /// Activities ordered by moment, keeping insertion order within a moment.
    pub fn activities_by_moment(&self) -> Vec<&Activity> {
        let mut sorted: Vec<&Activity> = self.activities.iter().collect();
        sorted.sort_by_key(|a| a.moment);
        sorted
    }
}

/// The data contract every theme renders.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItineraryData {
    pub title: String,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub days: Vec<Day>,
    #[serde(default)]
    pub pricing_rows: Vec<PricingRow>,
    #[serde(default)]
    pub extras: Vec<Extra>,
}

impl ItineraryData {
    pub fn total_price(&self) -> f64 {
        total_price(&self.pricing_rows, &self.extras)
    }

    /// Distinct destination names in day order.
    pub fn destinations(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for name in self
            .days
            .iter()
            .filter_map(|d| d.destination.as_ref().map(|dest| dest.name.as_str()))
        {
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        seen
    }
}

// ---------------------------------------------------------------------------
// Numbering and validation
// ---------------------------------------------------------------------------

/// Assign `day_number = index + 1`, ignoring whatever the form submitted.
pub fn renumber_days(days: &mut [Day]) {
    for (i, day) in days.iter_mut().enumerate() {
        day.day_number = i as i32 + 1;
    }
}

/// Day numbers must be exactly `1..=N` in order.
pub fn validate_day_numbers(days: &[Day]) -> Result<(), CoreError> {
    for (i, day) in days.iter().enumerate() {
        let expected = i as i32 + 1;
        if day.day_number != expected {
            return Err(CoreError::Validation(format!(
                "Day numbers must be contiguous from 1: position {} has day {} (expected {expected})",
                i + 1,
                day.day_number
            )));
        }
    }
    Ok(())
}

pub fn validate_day(day: &Day) -> Result<(), CoreError> {
    if day.title.trim().is_empty() {
        return Err(CoreError::Validation(format!(
            "Day {} must have a title",
            day.day_number
        )));
    }
    if day.activities.len() > MAX_ACTIVITIES_PER_DAY {
        return Err(CoreError::Validation(format!(
            "Day {} has {} activities, maximum is {MAX_ACTIVITIES_PER_DAY}",
            day.day_number,
            day.activities.len()
        )));
    }
    if let Some(activity) = day.activities.iter().find(|a| a.name.trim().is_empty()) {
        return Err(CoreError::Validation(format!(
            "Day {} has an activity without a name ({})",
            day.day_number,
            activity.moment.as_str()
        )));
    }
    Ok(())
}

/// Validate the whole aggregate before it is persisted.
pub fn validate_itinerary(data: &ItineraryData) -> Result<(), CoreError> {
    if data.days.len() > MAX_DAYS {
        return Err(CoreError::Validation(format!(
            "Itinerary has {} days, maximum is {MAX_DAYS}",
            data.days.len()
        )));
    }
    validate_day_numbers(&data.days)?;
    data.days.iter().try_for_each(validate_day)?;
    validate_pricing(&data.pricing_rows, &data.extras)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: i32, title: &str) -> Day {
        Day {
            day_number: n,
            title: title.into(),
            description: None,
            destination: None,
            accommodations: vec![],
            activities: vec![],
            meals: Meals::default(),
        }
    }

    fn activity(name: &str, moment: Moment) -> Activity {
        Activity {
            name: name.into(),
            moment,
            is_optional: false,
            description: None,
        }
    }

    #[test]
    fn renumber_assigns_index_plus_one() {
        let mut days = vec![day(7, "a"), day(7, "b"), day(-2, "c"), day(1, "d")];
        renumber_days(&mut days);
        let numbers: Vec<i32> = days.iter().map(|d| d.day_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert!(validate_day_numbers(&days).is_ok());
    }

    #[test]
    fn day_without_number_deserializes_and_renumbers() {
        let mut days: Vec<Day> =
            serde_json::from_str(r#"[{"title":"Arrival"},{"title":"Game drive","day_number":7}]"#)
                .unwrap();
        assert_eq!(days[0].day_number, 0);
        renumber_days(&mut days);
        let numbers: Vec<i32> = days.iter().map(|d| d.day_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn gaps_and_duplicates_rejected() {
        assert!(validate_day_numbers(&[day(1, "a"), day(3, "b")]).is_err());
        assert!(validate_day_numbers(&[day(1, "a"), day(1, "b")]).is_err());
        assert!(validate_day_numbers(&[]).is_ok());
    }

    #[test]
    fn day_requires_title() {
        let err = validate_day(&day(2, "  ")).unwrap_err();
        assert!(err.to_string().contains("Day 2 must have a title"));
    }

    #[test]
    fn activities_sorted_by_moment_stably() {
        let mut d = day(1, "Arrival");
        d.activities = vec![
            activity("Dinner", Moment::Evening),
            activity("Game drive", Moment::Morning),
            activity("Sundowner", Moment::Evening),
            activity("Pickup", Moment::EarlyMorning),
        ];
        let names: Vec<&str> = d.activities_by_moment().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Pickup", "Game drive", "Dinner", "Sundowner"]);
    }

    #[test]
    fn moment_round_trip() {
        for s in VALID_MOMENTS {
            assert_eq!(Moment::from_str(s).unwrap().as_str(), *s);
        }
        assert!(Moment::from_str("brunch").is_err());
    }

    #[test]
    fn meals_short_code() {
        let meals = Meals {
            breakfast: true,
            lunch: false,
            dinner: true,
        };
        assert_eq!(meals.short_code(), "B, D");
        assert_eq!(meals.count(), 2);
        assert_eq!(Meals::default().short_code(), "");
    }

    #[test]
    fn destinations_are_distinct_in_order() {
        let mut data = ItineraryData {
            title: "Safari".into(),
            days: vec![day(1, "a"), day(2, "b"), day(3, "c")],
            ..Default::default()
        };
        let serengeti = DestinationRef {
            id: None,
            name: "Serengeti".into(),
        };
        data.days[0].destination = Some(serengeti.clone());
        data.days[1].destination = Some(DestinationRef {
            id: Some(4),
            name: "Ngorongoro".into(),
        });
        data.days[2].destination = Some(serengeti);
        assert_eq!(data.destinations(), vec!["Serengeti", "Ngorongoro"]);
    }

    #[test]
    fn validate_itinerary_checks_pricing() {
        let data = ItineraryData {
            title: "t".into(),
            days: vec![day(1, "a")],
            pricing_rows: vec![PricingRow {
                traveler_type: "Adult".into(),
                unit_price: 10.0,
                count: -1,
            }],
            ..Default::default()
        };
        assert!(validate_itinerary(&data).is_err());
    }
}
