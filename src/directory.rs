use std::{fmt, str::FromStr};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    favorites::Favorites,
    hours::{WEEK, WeeklyHours, weekday_name},
    traits::{Document, DocumentStore},
};

/// Collection holding one document per building.
pub const LOCATIONS: &str = "locations";

// ==================== Building Types ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuildingType {
    Library,
    Gym,
    Academic,
    Dining,
    Cafe,
    Convenience,
    #[default]
    #[serde(other)]
    Other,
}

impl BuildingType {
    pub fn emoji(&self) -> &'static str {
        match self {
            BuildingType::Library => "📚",
            BuildingType::Gym => "🏋️",
            BuildingType::Academic => "🎓",
            BuildingType::Dining => "🥪",
            BuildingType::Cafe => "☕",
            BuildingType::Convenience => "🛍️",
            BuildingType::Other => "🏠",
        }
    }
}

impl fmt::Display for BuildingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ==================== Building ====================

/// A campus building as stored in the `locations` collection.
///
/// Every field is optional in the stored document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Building {
    pub id: String,
    pub name: String,
    pub address: String,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "type")]
    pub kind: BuildingType,
    pub hours: WeeklyHours,
    pub tags: Vec<String>,
}

impl Building {
    /// Build from a stored document; the document id wins over any `id` field.
    pub fn from_document(doc: Document) -> Result<Self> {
        let mut building: Building = serde_json::from_value(doc.data)
            .with_context(|| format!("Invalid building document {}", doc.id))?;
        building.id = doc.id;
        Ok(building)
    }

    pub fn is_open_at(&self, at: &NaiveDateTime) -> bool {
        self.hours.is_open(at)
    }

    pub fn today_hours(&self, day: Weekday) -> &str {
        self.hours.label_for(day)
    }

    pub fn maps_url(&self) -> String {
        format!(
            "https://www.google.com/maps/search/?api=1&query={},{}",
            self.lat, self.lng
        )
    }
}

/// Monday to Sunday with each day's display label.
pub fn weekly_schedule(hours: &WeeklyHours) -> Vec<(&'static str, &str)> {
    WEEK.iter()
        .map(|day| (weekday_name(*day), hours.label_for(*day)))
        .collect()
}

// ==================== Loading ====================

pub fn load_buildings<S: DocumentStore + ?Sized>(store: &S) -> Result<Vec<Building>> {
    let docs = store
        .list(LOCATIONS)
        .context("Failed to list buildings")?;

    let mut buildings = Vec::with_capacity(docs.len());
    for doc in docs {
        match Building::from_document(doc) {
            Ok(building) => buildings.push(building),
            Err(e) => tracing::warn!("Skipping building: {:#}", e),
        }
    }
    buildings.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(buildings)
}

pub fn load_building<S: DocumentStore + ?Sized>(store: &S, id: &str) -> Result<Option<Building>> {
    store
        .get(LOCATIONS, id)
        .with_context(|| format!("Failed to read building {id}"))?
        .map(Building::from_document)
        .transpose()
}

/// Write buildings under their own ids, replacing existing documents.
pub fn import_buildings<S: DocumentStore + ?Sized>(
    store: &S,
    buildings: &[Building],
) -> Result<usize> {
    for building in buildings {
        if building.id.is_empty() {
            anyhow::bail!("Building {:?} has no id", building.name);
        }
        let record = serde_json::to_value(building).context("Failed to serialize building")?;
        store
            .set(LOCATIONS, &building.id, record)
            .with_context(|| format!("Failed to store building {}", building.id))?;
    }
    Ok(buildings.len())
}

// ==================== Filtering ====================

/// Which buildings to show by open status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status filter {0:?} (expected all, open or closed)")]
pub struct ParseStatusFilterError(String);

impl FromStr for StatusFilter {
    type Err = ParseStatusFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "open" => Ok(StatusFilter::Open),
            "closed" => Ok(StatusFilter::Closed),
            _ => Err(ParseStatusFilterError(s.to_string())),
        }
    }
}

impl StatusFilter {
    fn accepts(self, open: bool) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Open => open,
            StatusFilter::Closed => !open,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DirectoryQuery {
    pub search: String,
    pub status: StatusFilter,
    pub favorites_only: bool,
}

/// A building as listed at a given instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<'a> {
    pub building: &'a Building,
    pub open: bool,
    pub today: &'a str,
    pub favorite: bool,
}

pub fn filter_buildings<'a>(
    buildings: &'a [Building],
    query: &DirectoryQuery,
    favorites: &Favorites,
    at: &NaiveDateTime,
) -> Vec<Listing<'a>> {
    let needle = query.search.trim().to_lowercase();
    let today = at.weekday();

    buildings
        .iter()
        .filter(|b| needle.is_empty() || b.name.to_lowercase().contains(&needle))
        .map(|b| Listing {
            building: b,
            open: b.is_open_at(at),
            today: b.today_hours(today),
            favorite: favorites.contains(&b.name),
        })
        .filter(|l| !query.favorites_only || l.favorite)
        .filter(|l| query.status.accepts(l.open))
        .collect()
}
