//! Itinerary presentation themes.
//!
//! Every theme consumes the same [`ItineraryData`] and produces an outline
//! of [`Section`]s; the view layer only decides how sections look. A
//! [`ThemeId`] selects the layout, there is no shared base behaviour.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::itinerary::{Day, ItineraryData};
use crate::pricing::display_price;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeId {
    #[default]
    Classic,
    Compact,
    Journal,
}

impl ThemeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Compact => "compact",
            Self::Journal => "journal",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "classic" => Ok(Self::Classic),
            "compact" => Ok(Self::Compact),
            "journal" => Ok(Self::Journal),
            _ => Err(CoreError::Validation(format!(
                "Invalid theme '{s}'. Must be one of: classic, compact, journal"
            ))),
        }
    }

    /// The layout implementing this theme.
    pub fn layout(&self) -> &'static dyn ItineraryLayout {
        match self {
            Self::Classic => &ClassicLayout,
            Self::Compact => &CompactLayout,
            Self::Journal => &JournalLayout,
        }
    }
}

/// One block of a rendered itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub heading: String,
    pub lines: Vec<String>,
}

impl Section {
    fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            lines: Vec::new(),
        }
    }
}

pub trait ItineraryLayout: Sync {
    fn sections(&self, data: &ItineraryData) -> Vec<Section>;
}

/// Render `data` with the theme selected by `theme`.
pub fn render(theme: ThemeId, data: &ItineraryData) -> Vec<Section> {
    theme.layout().sections(data)
}

fn pricing_section(data: &ItineraryData) -> Section {
    let mut section = Section::new("Pricing");
    for row in &data.pricing_rows {
        section.lines.push(format!(
            "{} x {} @ {}",
            row.traveler_type,
            row.count,
            display_price(row.unit_price)
        ));
    }
    for extra in data.extras.iter().filter(|e| e.selected) {
        section
            .lines
            .push(format!("{} (extra) {}", extra.name, display_price(extra.price)));
    }
    section
        .lines
        .push(format!("Total {}", display_price(data.total_price())));
    section
}

fn stay_line(day: &Day) -> Option<String> {
    if day.accommodations.is_empty() {
        return None;
    }
    let names: Vec<&str> = day.accommodations.iter().map(|a| a.name.as_str()).collect();
    Some(format!("Stay: {}", names.join(" / ")))
}

/// One section per day with activities grouped by moment.
pub struct ClassicLayout;

impl ItineraryLayout for ClassicLayout {
    fn sections(&self, data: &ItineraryData) -> Vec<Section> {
        let mut out = Vec::with_capacity(data.days.len() + 1);
        for day in &data.days {
            let mut section = Section::new(format!("Day {}: {}", day.day_number, day.title));
            if let Some(dest) = &day.destination {
                section.lines.push(format!("Destination: {}", dest.name));
            }
            for activity in day.activities_by_moment() {
                let optional = if activity.is_optional { " (optional)" } else { "" };
                section
                    .lines
                    .push(format!("{}: {}{optional}", activity.moment.label(), activity.name));
            }
            if let Some(stay) = stay_line(day) {
                section.lines.push(stay);
            }
            let meals = day.meals.short_code();
            if !meals.is_empty() {
                section.lines.push(format!("Meals: {meals}"));
            }
            out.push(section);
        }
        out.push(pricing_section(data));
        out
    }
}

/// A single overview table: one line per day, optional activities omitted.
pub struct CompactLayout;

impl ItineraryLayout for CompactLayout {
    fn sections(&self, data: &ItineraryData) -> Vec<Section> {
        let mut overview = Section::new(data.title.clone());
        for day in &data.days {
            let place = day
                .destination
                .as_ref()
                .map(|d| d.name.as_str())
                .unwrap_or("-");
            let included: Vec<&str> = day
                .activities
                .iter()
                .filter(|a| !a.is_optional)
                .map(|a| a.name.as_str())
                .collect();
            overview.lines.push(format!(
                "{} | {} | {}",
                day.day_number,
                place,
                included.join(", ")
            ));
        }
        vec![overview, pricing_section(data)]
    }
}

/// Consecutive days at the same destination grouped into one chapter.
pub struct JournalLayout;

impl ItineraryLayout for JournalLayout {
    fn sections(&self, data: &ItineraryData) -> Vec<Section> {
        let mut out: Vec<Section> = Vec::new();
        let mut current: Option<(Option<&str>, Section)> = None;

        for day in &data.days {
            let place = day.destination.as_ref().map(|d| d.name.as_str());
            let same_place = matches!(&current, Some((p, _)) if *p == place);
            if !same_place {
                if let Some((_, section)) = current.take() {
                    out.push(section);
                }
                let heading = place.unwrap_or("On the road").to_string();
                current = Some((place, Section::new(heading)));
            }
            if let Some((_, section)) = current.as_mut() {
                section
                    .lines
                    .push(format!("Day {}: {}", day.day_number, day.title));
                if let Some(description) = day.description.as_deref().filter(|d| !d.is_empty()) {
                    section.lines.push(description.to_string());
                }
            }
        }

        if let Some((_, section)) = current {
            out.push(section);
        }
        out.push(pricing_section(data));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::itinerary::{AccommodationRef, Activity, DestinationRef, Meals, Moment};
    use crate::pricing::{Extra, PricingRow};

    fn sample() -> ItineraryData {
        let dest = |name: &str| {
            Some(DestinationRef {
                id: None,
                name: name.into(),
            })
        };
        let day = |n: i32, title: &str, place: Option<DestinationRef>| Day {
            day_number: n,
            title: title.into(),
            description: None,
            destination: place,
            accommodations: vec![],
            activities: vec![],
            meals: Meals::default(),
        };

        let mut first = day(1, "Arrival", dest("Arusha"));
        first.activities = vec![
            Activity {
                name: "Coffee tour".into(),
                moment: Moment::Afternoon,
                is_optional: true,
                description: None,
            },
            Activity {
                name: "Airport pickup".into(),
                moment: Moment::Morning,
                is_optional: false,
                description: None,
            },
        ];
        first.accommodations = vec![AccommodationRef {
            id: None,
            name: "Lake Duluti Lodge".into(),
        }];
        first.meals.dinner = true;

        ItineraryData {
            title: "Northern Circuit".into(),
            client_name: None,
            days: vec![
                first,
                day(2, "Game drive", dest("Serengeti")),
                day(3, "Migration", dest("Serengeti")),
            ],
            pricing_rows: vec![PricingRow {
                traveler_type: "Adult".into(),
                unit_price: 500.0,
                count: 2,
            }],
            extras: vec![Extra {
                name: "Balloon".into(),
                price: 100.0,
                selected: true,
            }],
        }
    }

    #[test]
    fn classic_has_one_section_per_day_plus_pricing() {
        let sections = render(ThemeId::Classic, &sample());
        assert_eq!(sections.len(), 4);
        assert_eq!(sections[0].heading, "Day 1: Arrival");
        assert_eq!(sections[0].lines[1], "Morning: Airport pickup");
        assert_eq!(sections[0].lines[2], "Afternoon: Coffee tour (optional)");
        assert!(sections[0].lines.contains(&"Meals: D".to_string()));
        assert_eq!(sections[3].lines.last().unwrap(), "Total 1100");
    }

    #[test]
    fn compact_omits_optional_activities() {
        let sections = render(ThemeId::Compact, &sample());
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].lines[0], "1 | Arusha | Airport pickup");
    }

    #[test]
    fn journal_groups_consecutive_destinations() {
        let sections = render(ThemeId::Journal, &sample());
        let headings: Vec<&str> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["Arusha", "Serengeti", "Pricing"]);
        assert_eq!(sections[1].lines.len(), 2);
    }

    #[test]
    fn theme_id_round_trip() {
        for id in [ThemeId::Classic, ThemeId::Compact, ThemeId::Journal] {
            assert_eq!(ThemeId::from_str(id.as_str()).unwrap(), id);
        }
        assert!(ThemeId::from_str("brutalist").is_err());
    }
}
