use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Budget {
    #[default]
    Economy,
    #[serde(rename = "Mid-range")]
    MidRange,
    Luxury,
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Budget::Economy => "Economy",
            Budget::MidRange => "Mid-range",
            Budget::Luxury => "Luxury",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Priority {
    #[default]
    Function,
    Aesthetics,
    Balance,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Function => "Function",
            Priority::Aesthetics => "Aesthetics",
            Priority::Balance => "Balance",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Scenario {
    #[default]
    #[serde(rename = "Real Estate Development")]
    RealEstateDevelopment,
    #[serde(rename = "Home Renovation")]
    HomeRenovation,
    #[serde(rename = "Architectural Firm")]
    ArchitecturalFirm,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Scenario::RealEstateDevelopment => "Real Estate Development",
            Scenario::HomeRenovation => "Home Renovation",
            Scenario::ArchitecturalFirm => "Architectural Firm",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RoomType {
    #[default]
    Bedroom,
    Bathroom,
    Kitchen,
    #[serde(rename = "Living Room")]
    LivingRoom,
    #[serde(rename = "Dining Room")]
    DiningRoom,
    Office,
    Garage,
    Other,
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RoomType::Bedroom => "Bedroom",
            RoomType::Bathroom => "Bathroom",
            RoomType::Kitchen => "Kitchen",
            RoomType::LivingRoom => "Living Room",
            RoomType::DiningRoom => "Dining Room",
            RoomType::Office => "Office",
            RoomType::Garage => "Garage",
            RoomType::Other => "Other",
        };
        f.write_str(label)
    }
}

/// One customized room. Fields stay free text; sizes are not parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RoomDetail {
    #[serde(default)]
    pub room_type: RoomType,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub features: String,
}

impl RoomDetail {
    fn summary(&self) -> String {
        format!(
            "{} ({}, {}): {}",
            self.room_type, self.size, self.style, self.features
        )
    }
}

/// A room plus its deferred-deletion flag. Keeping the flag on the entry
/// itself means the flag list can never drift out of step with the rooms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomEntry {
    pub detail: RoomDetail,
    #[serde(default)]
    pub marked_for_removal: bool,
}

/// Editable room list. Deletions are flagged while the form is open and only
/// applied at submission time via [`RoomPlanner::commit`].
#[derive(Debug, Clone, Default)]
pub struct RoomPlanner {
    entries: Vec<RoomEntry>,
}

impl RoomPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_raw(rooms: &[RoomEntry]) -> Self {
        Self {
            entries: rooms.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RoomEntry] {
        &self.entries
    }

    /// Append a room with the default type and empty fields. Returns the
    /// index of the new entry.
    pub fn add(&mut self) -> usize {
        self.entries.push(RoomEntry {
            detail: RoomDetail::default(),
            marked_for_removal: false,
        });
        self.entries.len() - 1
    }

    /// In-place field access while the form is open.
    pub fn detail_mut(&mut self, index: usize) -> Option<&mut RoomDetail> {
        self.entries.get_mut(index).map(|e| &mut e.detail)
    }

    /// Flag or unflag an entry for removal. Returns false for an index out
    /// of range.
    pub fn mark_for_removal(&mut self, index: usize, marked: bool) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.marked_for_removal = marked;
                true
            }
            None => false,
        }
    }

    /// Apply flagged deletions (highest index first, so earlier removals do
    /// not shift later ones) and yield the surviving rooms.
    pub fn commit(mut self) -> Vec<RoomDetail> {
        let marked: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.marked_for_removal)
            .map(|(i, _)| i)
            .collect();
        for index in marked.into_iter().rev() {
            self.entries.remove(index);
        }
        self.entries.into_iter().map(|e| e.detail).collect()
    }
}

/// Raw form payload as the host submits it. Everything beyond the three
/// required text fields is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawFields {
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub rooms: String,
    #[serde(default)]
    pub budget: Budget,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub scenario: Scenario,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub extras: Option<String>,
    #[serde(default)]
    pub room_details: Vec<RoomEntry>,
}

/// Everything one submission carries, immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceDescriptor {
    pub style: String,
    pub size: String,
    pub room_count: String,
    pub budget: Budget,
    pub priority: Priority,
    pub scenario: Scenario,
    pub amenities: Vec<String>,
    pub extras: Option<String>,
    pub rooms: Vec<RoomDetail>,
}

impl PreferenceDescriptor {
    /// Flattened preference string, used in both the prompt and the cache
    /// key. Absent optionals are omitted entirely.
    pub fn flattened_preferences(&self) -> String {
        let mut s = format!(
            "Budget: {}, Priority: {}, Scenario: {}",
            self.budget, self.priority, self.scenario
        );
        if let Some(extras) = &self.extras {
            s.push_str(", Extras: ");
            s.push_str(extras);
        }
        if !self.amenities.is_empty() {
            s.push_str(", Amenities: ");
            s.push_str(&self.amenities.join(", "));
        }
        if !self.rooms.is_empty() {
            let summaries: Vec<String> = self.rooms.iter().map(|r| r.summary()).collect();
            s.push_str(", Rooms: ");
            s.push_str(&summaries.join("; "));
        }
        s
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey(format!(
            "{}_{}_{}_{}",
            self.style,
            self.size,
            self.room_count,
            self.flattened_preferences()
        ))
    }

    /// Free-text query for the live image search: every field the user
    /// filled in, concatenated.
    pub fn image_query(&self) -> String {
        let mut parts = vec![
            self.style.clone(),
            self.size.clone(),
            self.room_count.clone(),
        ];
        if let Some(extras) = &self.extras {
            parts.push(extras.clone());
        }
        parts.extend(self.amenities.iter().cloned());
        parts.extend(self.rooms.iter().map(|r| r.summary()));
        parts.retain(|p| !p.trim().is_empty());
        parts.join(" ")
    }

    /// Name of the downloadable Markdown artifact.
    pub fn download_file_name(&self) -> String {
        format!("{}_home_design.md", self.style)
    }
}

/// Deterministic key for the design request cache. Identical input tuples
/// always produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate the raw fields and build the descriptor. Required fields are
/// style, size and rooms; all missing ones are reported together and no
/// upstream call happens. Flagged room deletions are applied here, at
/// submission time.
pub fn aggregate(raw: &RawFields) -> Result<PreferenceDescriptor, ValidationError> {
    let mut missing = Vec::new();
    if raw.style.trim().is_empty() {
        missing.push("style");
    }
    if raw.size.trim().is_empty() {
        missing.push("size");
    }
    if raw.rooms.trim().is_empty() {
        missing.push("rooms");
    }
    if !missing.is_empty() {
        return Err(ValidationError { missing });
    }

    let extras = raw
        .extras
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string);

    Ok(PreferenceDescriptor {
        style: raw.style.clone(),
        size: raw.size.clone(),
        room_count: raw.rooms.clone(),
        budget: raw.budget,
        priority: raw.priority,
        scenario: raw.scenario,
        amenities: raw.amenities.clone(),
        extras,
        rooms: RoomPlanner::from_raw(&raw.room_details).commit(),
    })
}

/// Where the Markdown of a [`DesignResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DesignSource {
    Upstream,
    Cache,
    Fallback,
}

/// Markdown design plan handed back to the host. The markdown is never
/// empty: the fallback template fills it when the upstream fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignResult {
    pub markdown: String,
    pub source: DesignSource,
}

/// Ordered list of illustration URLs, at most three. Empty is a valid
/// terminal state; the host supplies its own fallback image then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ImageSet {
    urls: Vec<String>,
}

pub const MAX_IMAGES: usize = 3;

impl ImageSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_urls(mut urls: Vec<String>) -> Self {
        urls.truncate(MAX_IMAGES);
        Self { urls }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
