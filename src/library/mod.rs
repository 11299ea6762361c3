// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Dance library: styles, moves and the local music collection.
//!
//! This module provides the data model shared by the trainer and a
//! YAML-backed [`Library`] that implements the read-only catalogue
//! traits a training session consumes.

mod defaults;

use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Difficulty level of a move or track, ordered from easiest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        };
        f.write_str(label)
    }
}

impl Level {
    /// Label shown to trainees
    pub fn label(&self) -> &'static str {
        match self {
            Level::Beginner => "Начинающий",
            Level::Intermediate => "Средний",
            Level::Advanced => "Профи",
        }
    }
}

impl FromStr for Level {
    type Err = LibraryError;

    /// Accepts the English name or the trainee label, in any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        [Level::Beginner, Level::Intermediate, Level::Advanced]
            .into_iter()
            .find(|level| {
                level.to_string().to_lowercase() == wanted || level.label().to_lowercase() == wanted
            })
            .ok_or_else(|| LibraryError::UnknownLevel(s.to_string()))
    }
}

/// Order of a filtered move list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveSort {
    /// Alphabetical, ignoring case
    #[default]
    Name,
    /// Easiest first, alphabetical within a level
    Level,
}

impl FromStr for MoveSort {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(MoveSort::Name),
            "level" => Ok(MoveSort::Level),
            _ => Err(LibraryError::UnknownSort(s.to_string())),
        }
    }
}

/// Selects and orders the moves of a style for browsing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoveFilter {
    /// Only moves of this level
    pub level: Option<Level>,
    /// Only moves whose name contains this text, ignoring case
    pub query: Option<String>,
    pub sort: MoveSort,
}

impl MoveFilter {
    pub fn matches(&self, mv: &Move) -> bool {
        if self.level.is_some_and(|level| level != mv.level) {
            return false;
        }
        match &self.query {
            Some(query) => mv.name.to_lowercase().contains(&query.to_lowercase()),
            None => true,
        }
    }

    fn compare(&self, a: &Move, b: &Move) -> Ordering {
        let by_name = || a.name.to_lowercase().cmp(&b.name.to_lowercase());
        match self.sort {
            MoveSort::Name => by_name(),
            MoveSort::Level => a.level.cmp(&b.level).then_with(by_name),
        }
    }
}

/// A single figure within a dance style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    /// Unique identifier
    pub id: String,
    /// Name announced by the trainer
    pub name: String,
    /// Difficulty level
    #[serde(default)]
    pub level: Level,
    /// Optional free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional reference to a demo video or image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,
}

impl Move {
    /// Create a move with no description or media
    pub fn new(id: impl Into<String>, name: impl Into<String>, level: Level) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
            description: None,
            media_ref: None,
        }
    }
}

/// A dance style and its ordered list of moves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DanceStyle {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub moves: Vec<Move>,
}

impl DanceStyle {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            moves: Vec::new(),
        }
    }

    /// Whether the style can be used for a training session
    pub fn is_trainable(&self) -> bool {
        !self.moves.is_empty()
    }

    /// Moves passing `filter`, in the filter's order
    pub fn filtered_moves(&self, filter: &MoveFilter) -> Vec<&Move> {
        let mut moves: Vec<&Move> = self.moves.iter().filter(|mv| filter.matches(mv)).collect();
        moves.sort_by(|a, b| filter.compare(a, b));
        moves
    }
}

/// Where a track's audio lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AudioSource {
    /// Local audio file
    File(PathBuf),
}

impl AudioSource {
    pub fn path(&self) -> &Path {
        match self {
            AudioSource::File(path) => path,
        }
    }
}

/// A background music track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Id of the style this track is meant for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    pub source: AudioSource,
}

/// Read access to dance styles
pub trait StyleCatalog: Send + Sync {
    fn style(&self, id: &str) -> Option<DanceStyle>;
}

/// Read access to music tracks
pub trait TrackCatalog: Send + Sync {
    fn track(&self, id: &str) -> Option<Track>;
}

/// Library editing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LibraryError {
    #[error("a style with id '{0}' already exists")]
    DuplicateStyle(String),
    #[error("style '{0}' not found")]
    StyleNotFound(String),
    #[error("a move with id '{move_id}' already exists in style '{style_id}'")]
    DuplicateMove { style_id: String, move_id: String },
    #[error("move '{move_id}' not found in style '{style_id}'")]
    MoveNotFound { style_id: String, move_id: String },
    #[error("a track with id '{0}' already exists")]
    DuplicateTrack(String),
    #[error("track '{0}' not found")]
    TrackNotFound(String),
    #[error("name must not be empty")]
    EmptyName,
    #[error("unknown level '{0}' (expected beginner, intermediate or advanced)")]
    UnknownLevel(String),
    #[error("unknown sort order '{0}' (expected name or level)")]
    UnknownSort(String),
}

/// Styles and tracks, persisted as a single YAML document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    styles: Vec<DanceStyle>,
    #[serde(default)]
    tracks: Vec<Track>,
}

impl Default for Library {
    /// The built-in catalogue used before the user has saved anything
    fn default() -> Self {
        Self {
            styles: defaults::initial_styles(),
            tracks: Vec::new(),
        }
    }
}

impl Library {
    /// An empty library with no styles or tracks
    pub fn empty() -> Self {
        Self {
            styles: Vec::new(),
            tracks: Vec::new(),
        }
    }

    /// Load a library from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read library file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Load a library, falling back to the built-in catalogue when the file is missing
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            tracing::info!(path = ?path.as_ref(), "library file not found, using built-in styles");
            Ok(Self::default())
        }
    }

    /// Parse a library from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse library YAML")
    }

    /// Serialize to a YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize library to YAML")
    }

    /// Save the library to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write library file: {:?}", path.as_ref()))
    }

    pub fn styles(&self) -> &[DanceStyle] {
        &self.styles
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn add_style(&mut self, style: DanceStyle) -> Result<(), LibraryError> {
        if self.styles.iter().any(|s| s.id == style.id) {
            return Err(LibraryError::DuplicateStyle(style.id));
        }
        self.styles.push(style);
        Ok(())
    }

    /// Append a move to the end of a style's move list
    pub fn add_move(&mut self, style_id: &str, mv: Move) -> Result<(), LibraryError> {
        let style = self
            .styles
            .iter_mut()
            .find(|s| s.id == style_id)
            .ok_or_else(|| LibraryError::StyleNotFound(style_id.to_string()))?;

        if style.moves.iter().any(|m| m.id == mv.id) {
            return Err(LibraryError::DuplicateMove {
                style_id: style_id.to_string(),
                move_id: mv.id,
            });
        }
        style.moves.push(mv);
        Ok(())
    }

    pub fn remove_move(&mut self, style_id: &str, move_id: &str) -> Result<Move, LibraryError> {
        let style = self
            .styles
            .iter_mut()
            .find(|s| s.id == style_id)
            .ok_or_else(|| LibraryError::StyleNotFound(style_id.to_string()))?;

        let index = style
            .moves
            .iter()
            .position(|m| m.id == move_id)
            .ok_or_else(|| LibraryError::MoveNotFound {
                style_id: style_id.to_string(),
                move_id: move_id.to_string(),
            })?;
        Ok(style.moves.remove(index))
    }

    pub fn add_track(&mut self, track: Track) -> Result<(), LibraryError> {
        if self.tracks.iter().any(|t| t.id == track.id) {
            return Err(LibraryError::DuplicateTrack(track.id));
        }
        self.tracks.push(track);
        Ok(())
    }

    pub fn remove_track(&mut self, track_id: &str) -> Result<Track, LibraryError> {
        let index = self
            .tracks
            .iter()
            .position(|t| t.id == track_id)
            .ok_or_else(|| LibraryError::TrackNotFound(track_id.to_string()))?;
        Ok(self.tracks.remove(index))
    }

    /// Add an empty style, deriving its id from the name. Returns the id.
    pub fn add_style_named(&mut self, name: &str) -> Result<String, LibraryError> {
        let name = non_empty(name)?;
        let id = unique_id(&slug(name, "style"), |id| self.styles.iter().any(|s| s.id == id));
        self.add_style(DanceStyle::new(id.clone(), name))?;
        Ok(id)
    }

    /// Add a move to a style, deriving its id from the name. Returns the id.
    pub fn add_move_named(
        &mut self,
        style_id: &str,
        name: &str,
        level: Level,
    ) -> Result<String, LibraryError> {
        let name = non_empty(name)?;
        let style = self
            .styles
            .iter()
            .find(|s| s.id == style_id)
            .ok_or_else(|| LibraryError::StyleNotFound(style_id.to_string()))?;
        let id = unique_id(&slug(name, "move"), |id| style.moves.iter().any(|m| m.id == id));
        self.add_move(style_id, Move::new(id.clone(), name, level))?;
        Ok(id)
    }

    /// Add a track for a local audio file, titled after the file name. Returns the id.
    pub fn add_track_file(&mut self, path: &Path) -> Result<String, LibraryError> {
        let title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let title = non_empty(&title)?.to_string();
        let id = unique_id(&slug(&title, "track"), |id| self.tracks.iter().any(|t| t.id == id));
        self.add_track(Track {
            id: id.clone(),
            title,
            artist: None,
            style: None,
            level: None,
            source: AudioSource::File(path.to_path_buf()),
        })?;
        Ok(id)
    }
}

fn non_empty(name: &str) -> Result<&str, LibraryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LibraryError::EmptyName);
    }
    Ok(name)
}

/// Lowercase id made of the name's letters and digits joined by dashes
fn slug(name: &str, fallback: &str) -> String {
    let slug = name
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// `base`, or `base-2`, `base-3`... for the first id not taken
fn unique_id(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|id| !taken(id))
        .unwrap_or_else(|| base.to_string())
}

impl StyleCatalog for Library {
    fn style(&self, id: &str) -> Option<DanceStyle> {
        self.styles.iter().find(|s| s.id == id).cloned()
    }
}

impl TrackCatalog for Library {
    fn track(&self, id: &str) -> Option<Track> {
        self.tracks.iter().find(|t| t.id == id).cloned()
    }
}
