//! Charades Game Engine
//!
//! Platform-agnostic turn and round engine for a team charades party game.
//! Term selection, team rotation, round progression and scoring live here;
//! rendering, audio, the wall clock and persistence belong to the host.

pub mod constants;
pub mod content;
pub mod numbers;
pub mod perks;
pub mod seed;
pub mod session;
pub mod settings;
pub mod state;
pub mod team;
pub mod term;
pub mod timer;

// Re-export commonly used types
pub use constants::ROUND_COUNT;
pub use content::{CatalogTerm, Category, CategoryCatalog, ContentError, ContentProvider};
pub use perks::{PerkEffect, PerkOutcome, apply_perk_effect};
pub use session::{GameSession, GuessOutcome, TurnSignal};
pub use settings::{Difficulty, GameMode, RoundKind, Settings, SettingsError};
pub use state::{EngineError, GamePhase, TurnState};
pub use team::{Team, TeamId};
pub use term::Term;
pub use timer::{ManualTimer, TimeoutCallback, TurnTimer};

use anyhow::Context;

/// Main game engine for creating game instances
pub struct GameEngine<P>
where
    P: ContentProvider,
{
    provider: P,
}

impl<P> GameEngine<P>
where
    P: ContentProvider,
{
    /// Create a new game engine drawing its term pools from `provider`
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Build a `Setup`-phase state for `settings`, with the pool drawn from
    /// the content provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the pool cannot be
    /// loaded.
    pub fn create_state(&self, settings: &Settings, seed: u64) -> anyhow::Result<TurnState> {
        settings.validate().context("invalid game settings")?;
        let terms = self
            .provider
            .load_terms(settings, seed)
            .with_context(|| format!("failed to load terms for seed {seed}"))?;
        log::info!(
            "created game with {} terms for {} teams",
            terms.len(),
            settings.team_names.len()
        );
        Ok(TurnState::new(settings, terms, seed))
    }

    /// Construct a new session binding a fresh state to a manual timer.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the pool cannot be
    /// loaded.
    pub fn create_session(&self, settings: &Settings, seed: u64) -> anyhow::Result<GameSession> {
        let state = self.create_state(settings, seed)?;
        Ok(GameSession::with_timer(state, ManualTimer::new()))
    }

    /// Parse settings from JSON, then build a session from them.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, fails validation, or the
    /// pool cannot be loaded.
    pub fn create_session_from_json(&self, json: &str, seed: u64) -> anyhow::Result<GameSession> {
        let settings = Settings::load(json).context("failed to load game settings")?;
        self.create_session(&settings, seed)
    }
}

impl GameEngine<CategoryCatalog> {
    /// Engine backed by the bundled category catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled catalog cannot be parsed.
    pub fn with_bundled_catalog() -> anyhow::Result<Self> {
        let catalog = CategoryCatalog::load_from_static().context("bundled catalog is invalid")?;
        Ok(Self::new(catalog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct FixtureProvider;

    impl ContentProvider for FixtureProvider {
        type Error = Infallible;

        fn load_terms(&self, settings: &Settings, _seed: u64) -> Result<Vec<Term>, Self::Error> {
            Ok((0..settings.word_count)
                .map(|i| Term::new(format!("term-{i}")))
                .collect())
        }
    }

    #[test]
    fn engine_creates_playable_session() {
        let engine = GameEngine::new(FixtureProvider);
        let settings = Settings {
            word_count: 5,
            ..Settings::default()
        };
        let mut session = engine.create_session(&settings, 0xABCD).unwrap();
        assert_eq!(session.state().phase(), GamePhase::Setup);
        assert_eq!(session.state().terms().len(), 5);
        assert!(matches!(
            session.begin().unwrap(),
            TurnSignal::Continue { term: 0 }
        ));
        assert_eq!(session.state().seed(), 0xABCD);
    }

    #[test]
    fn invalid_settings_are_rejected_with_context() {
        let engine = GameEngine::new(FixtureProvider);
        let settings = Settings {
            team_names: Vec::new(),
            ..Settings::default()
        };
        let err = engine.create_state(&settings, 1).unwrap_err();
        assert!(err.to_string().contains("invalid game settings"));
        assert!(matches!(
            err.downcast_ref::<SettingsError>(),
            Some(SettingsError::NoTeams)
        ));
    }

    #[test]
    fn bundled_catalog_engine_honours_word_count() {
        let engine = GameEngine::with_bundled_catalog().unwrap();
        let session = engine
            .create_session_from_json(r#"{"team_names":["Reds","Blues","Greens"],"word_count":12}"#, 4)
            .unwrap();
        assert_eq!(session.state().terms().len(), 12);
        assert_eq!(session.state().teams().len(), 3);
    }

    #[test]
    fn unknown_category_surfaces_content_error() {
        let engine = GameEngine::with_bundled_catalog().unwrap();
        let settings = Settings {
            categories: vec!["does-not-exist".to_string()],
            ..Settings::default()
        };
        let err = engine.create_state(&settings, 1).unwrap_err();
        assert!(err.downcast_ref::<ContentError>().is_some());
    }
}
