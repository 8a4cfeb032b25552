//! Static game configuration: teams, content selection, mode, clock, scoring.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::constants::{
    DEFAULT_CORRECT_POINTS, DEFAULT_SKIP_PENALTY, DEFAULT_TURN_SECONDS, DEFAULT_WORD_COUNT,
    DEFAULT_WRONG_PENALTY, MAX_TEAMS, MAX_TURN_SECONDS, MAX_WORD_COUNT, MIN_TURN_SECONDS,
    ROUND_COUNT,
};

/// The guessing rule in force for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundKind {
    Describe,
    OneWord,
    Mime,
    Draw,
}

impl RoundKind {
    /// Round kinds in play order; the position is the round index.
    pub const ALL: [Self; ROUND_COUNT] = [Self::Describe, Self::OneWord, Self::Mime, Self::Draw];

    #[must_use]
    pub fn from_index(round: usize) -> Option<Self> {
        Self::ALL.get(round).copied()
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Describe => "describe",
            Self::OneWord => "one_word",
            Self::Mime => "mime",
            Self::Draw => "draw",
        }
    }

    #[must_use]
    pub const fn is_available(self, mode: GameMode) -> bool {
        match (self, mode) {
            (Self::Describe | Self::Mime, _) => true,
            (Self::OneWord, GameMode::Classic | GameMode::Drawing) => true,
            (Self::Draw, GameMode::Drawing) => true,
            (Self::OneWord, GameMode::Quick) | (Self::Draw, GameMode::Classic | GameMode::Quick) => {
                false
            }
        }
    }
}

impl fmt::Display for RoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which rounds a game plays.
///
/// * `Classic`: describe, one word, mime.
/// * `Drawing`: classic plus a final drawing round.
/// * `Quick`: describe and mime only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Classic,
    Drawing,
    Quick,
}

impl GameMode {
    pub const ALL: [Self; 3] = [Self::Classic, Self::Drawing, Self::Quick];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Drawing => "drawing",
            Self::Quick => "quick",
        }
    }

    #[must_use]
    pub fn is_round_available(self, round: usize) -> bool {
        RoundKind::from_index(round).is_some_and(|kind| kind.is_available(self))
    }

    /// Number of leading round buckets that count toward a team's score.
    #[must_use]
    pub fn relevant_rounds(self) -> usize {
        (0..ROUND_COUNT)
            .rev()
            .find(|&round| self.is_round_available(round))
            .map_or(0, |last| last + 1)
    }

    #[must_use]
    pub fn first_round(self) -> usize {
        self.next_round_from(0).unwrap_or(0)
    }

    /// First available round index at or after `start`.
    #[must_use]
    pub fn next_round_from(self, start: usize) -> Option<usize> {
        (start..ROUND_COUNT).find(|&round| self.is_round_available(round))
    }

    #[must_use]
    pub fn round_count(self) -> usize {
        (0..ROUND_COUNT)
            .filter(|&round| self.is_round_available(round))
            .count()
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classic" => Ok(Self::Classic),
            "drawing" => Ok(Self::Drawing),
            "quick" => Ok(Self::Quick),
            _ => Err(()),
        }
    }
}

/// Content difficulty; a setting admits every term at or below its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn admits(self, term: Self) -> bool {
        term <= self
    }
}

/// Errors raised when settings violate their invariants.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("at least one team is required")]
    NoTeams,
    #[error("at most {max} teams are supported (got {count})")]
    TooManyTeams { count: usize, max: usize },
    #[error("team name at position {index} is empty")]
    EmptyTeamName { index: usize },
    #[error("team name '{name}' is used more than once")]
    DuplicateTeamName { name: String },
    #[error("turn length must be between {min} and {max} seconds (got {value})")]
    TurnSeconds { min: u32, max: u32, value: u32 },
    #[error("word count must be between 1 and {max} (got {value})")]
    WordCount { max: usize, value: usize },
    #[error("at least one category must be selected")]
    NoCategories,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "Settings::default_team_names")]
    pub team_names: Vec<String>,
    #[serde(default = "Settings::default_categories")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default = "Settings::default_turn_seconds")]
    pub turn_seconds: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "Settings::default_word_count")]
    pub word_count: usize,
    #[serde(default = "Settings::default_correct_points")]
    pub correct_points: u32,
    #[serde(default = "Settings::default_wrong_penalty")]
    pub wrong_penalty: u32,
    #[serde(default = "Settings::default_skip_penalty")]
    pub skip_penalty: u32,
    /// Defer every penalty until `reveal_pending_penalties`.
    #[serde(default)]
    pub hardcore: bool,
    /// Reorder the pool whenever a new round starts.
    #[serde(default)]
    pub reshuffle_each_round: bool,
    /// Turn a wrong guess into a penalty card for the guessing team, playable
    /// after this many of its own turns.
    #[serde(default)]
    pub penalty_card_delay: Option<u32>,
    /// Hit streak that unlocks the slot reward interstitial.
    #[serde(default)]
    pub slot_reward_streak: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            team_names: Self::default_team_names(),
            categories: Self::default_categories(),
            mode: GameMode::default(),
            turn_seconds: Self::default_turn_seconds(),
            difficulty: Difficulty::default(),
            word_count: Self::default_word_count(),
            correct_points: Self::default_correct_points(),
            wrong_penalty: Self::default_wrong_penalty(),
            skip_penalty: Self::default_skip_penalty(),
            hardcore: false,
            reshuffle_each_round: false,
            penalty_card_delay: None,
            slot_reward_streak: None,
        }
    }
}

impl Settings {
    fn default_team_names() -> Vec<String> {
        vec![String::from("Team 1"), String::from("Team 2")]
    }

    fn default_categories() -> Vec<String> {
        vec![
            String::from("animals"),
            String::from("food"),
            String::from("movies"),
            String::from("actions"),
        ]
    }

    const fn default_turn_seconds() -> u32 {
        DEFAULT_TURN_SECONDS
    }

    const fn default_word_count() -> usize {
        DEFAULT_WORD_COUNT
    }

    const fn default_correct_points() -> u32 {
        DEFAULT_CORRECT_POINTS
    }

    const fn default_wrong_penalty() -> u32 {
        DEFAULT_WRONG_PENALTY
    }

    const fn default_skip_penalty() -> u32 {
        DEFAULT_SKIP_PENALTY
    }

    /// Parse settings from JSON without validating them.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into settings.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse and validate settings in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or any invariant is violated.
    pub fn load(json: &str) -> Result<Self, SettingsError> {
        let settings = Self::from_json(json)?;
        settings.validate()?;
        Ok(settings)
    }

    #[must_use]
    pub fn with_teams<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.team_names = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    /// Penalties are deferred in hardcore games.
    #[must_use]
    pub const fn defers_penalties(&self) -> bool {
        self.hardcore
    }

    /// Check every invariant the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.team_names.is_empty() {
            return Err(SettingsError::NoTeams);
        }
        if self.team_names.len() > MAX_TEAMS {
            return Err(SettingsError::TooManyTeams {
                count: self.team_names.len(),
                max: MAX_TEAMS,
            });
        }
        let mut seen = HashSet::new();
        for (index, name) in self.team_names.iter().enumerate() {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(SettingsError::EmptyTeamName { index });
            }
            if !seen.insert(trimmed.to_lowercase()) {
                return Err(SettingsError::DuplicateTeamName {
                    name: trimmed.to_string(),
                });
            }
        }
        if !(MIN_TURN_SECONDS..=MAX_TURN_SECONDS).contains(&self.turn_seconds) {
            return Err(SettingsError::TurnSeconds {
                min: MIN_TURN_SECONDS,
                max: MAX_TURN_SECONDS,
                value: self.turn_seconds,
            });
        }
        if self.word_count == 0 || self.word_count > MAX_WORD_COUNT {
            return Err(SettingsError::WordCount {
                max: MAX_WORD_COUNT,
                value: self.word_count,
            });
        }
        if self.categories.is_empty() {
            return Err(SettingsError::NoCategories);
        }
        Ok(())
    }
}
