//! Centralized rules and tuning constants for the charades engine.
//!
//! Round layout, scoring defaults, and timer bounds live here so the state
//! machine and the settings loader agree on the same numbers.

// Round layout -------------------------------------------------------------
/// Number of round slots tracked per term and per team.
pub const ROUND_COUNT: usize = 4;

// Turn clock ---------------------------------------------------------------
pub(crate) const DEFAULT_TURN_SECONDS: u32 = 60;
pub(crate) const MIN_TURN_SECONDS: u32 = 5;
pub(crate) const MAX_TURN_SECONDS: u32 = 600;

// Pool sizing --------------------------------------------------------------
pub(crate) const DEFAULT_WORD_COUNT: usize = 40;
pub(crate) const MAX_WORD_COUNT: usize = 500;
pub(crate) const MAX_TEAMS: usize = 12;

// Scoring ------------------------------------------------------------------
pub(crate) const DEFAULT_CORRECT_POINTS: u32 = 1;
pub(crate) const DEFAULT_WRONG_PENALTY: u32 = 1;
pub(crate) const DEFAULT_SKIP_PENALTY: u32 = 0;

// Selection ----------------------------------------------------------------
/// Multiplier on pool size bounding every cyclic selection scan.
pub(crate) const SCAN_BOUND_FACTOR: usize = 2;

// Seeding ------------------------------------------------------------------
pub(crate) const SHUFFLE_DOMAIN: &[u8; 8] = b"CHRD-SHF";
pub(crate) const POOL_DOMAIN: &[u8; 8] = b"CHRD-POL";
