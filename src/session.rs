//! Session context: what outlives a single round.
//!
//! The session remembers the base configuration, the high score of the primary
//! snake and the single mode leaderboard. Persistence goes through a
//! [ScoreStore]; store failures are logged and never reach the round.
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::{Features, Mode, RoundConfig};
use crate::error::{ConfigError, StoreError};
use crate::round::{Round, RoundSummary};

/// Most entries kept on the leaderboard
pub const LEADERBOARD_SIZE: usize = 10;

/// Longest name kept on the leaderboard, in characters
pub const MAX_NAME_LEN: usize = 10;

const DEFAULT_NAME: &str = "player";

/// One leaderboard line
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    #[allow(missing_docs)]
    pub name: String,
    #[allow(missing_docs)]
    pub score: u32,
}

/// Best scores, highest first
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
}

impl Leaderboard {
    #[allow(missing_docs)]
    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// checks if `score` would make it onto the board
    pub fn qualifies(&self, score: u32) -> bool {
        if score == 0 {
            return false;
        }
        match self.entries.last() {
            Some(last) if self.entries.len() >= LEADERBOARD_SIZE => score > last.score,
            _ => true,
        }
    }

    /// Adds an entry and keeps the best [LEADERBOARD_SIZE]. Equal scores keep
    /// their arrival order. Returns the rank (0 based) if the entry stayed.
    pub fn insert(&mut self, name: &str, score: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let name = sanitize_name(name);
        let rank = self
            .entries
            .iter()
            .position(|e| e.score < score)
            .unwrap_or(self.entries.len());
        self.entries.insert(rank, ScoreEntry { name, score });
        self.entries.truncate(LEADERBOARD_SIZE);
        Some(rank)
    }

    /// re-sorts and truncates entries that came from outside
    fn normalize(&mut self) {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(LEADERBOARD_SIZE);
    }
}

fn sanitize_name(name: &str) -> String {
    let name: String = name.trim().chars().take(MAX_NAME_LEN).collect();
    if name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        name
    }
}

/// Everything a [ScoreStore] persists
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Scores {
    #[allow(missing_docs)]
    pub high_score: u32,
    #[allow(missing_docs)]
    pub leaderboard: Leaderboard,
}

/// Persistence boundary for scores
pub trait ScoreStore {
    /// reads the stored scores; a store that was never written yields defaults
    fn load(&self) -> Result<Scores, StoreError>;
    #[allow(missing_docs)]
    fn save(&self, scores: &Scores) -> Result<(), StoreError>;
}

/// Keeps scores in a json file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[allow(missing_docs)]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    #[allow(missing_docs)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for JsonFileStore {
    fn load(&self) -> Result<Scores, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Scores::default()),
            Err(e) => return Err(e.into()),
        };
        let mut scores: Scores = serde_json::from_str(&contents)?;
        scores.leaderboard.normalize();
        Ok(scores)
    }

    fn save(&self, scores: &Scores) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(scores)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// State shared by consecutive rounds
#[derive(Debug, Clone)]
pub struct Session {
    base: RoundConfig,
    scores: Scores,
}

impl Session {
    /// A session with no recorded scores. `base` supplies everything
    /// [Session::init_round] does not pick: grid, timings, tuning and seed.
    pub fn new(base: RoundConfig) -> Self {
        Session {
            base,
            scores: Scores::default(),
        }
    }

    /// A session starting from the scores in `store`, or from nothing when
    /// the store cannot be read.
    pub fn restore<S: ScoreStore>(base: RoundConfig, store: &S) -> Self {
        let scores = match store.load() {
            Ok(scores) => scores,
            Err(e) => {
                warn!(error = %e, "could not load scores, starting fresh");
                Scores::default()
            }
        };
        Session { base, scores }
    }

    /// Writes the scores to `store`. Failures are logged and reported as
    /// `false`; they never affect the session.
    pub fn persist<S: ScoreStore>(&self, store: &S) -> bool {
        match store.save(&self.scores) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "could not save scores");
                false
            }
        }
    }

    /// Starts a round with a human primary snake and `snake_count - 1` AI
    /// opponents on the base configuration.
    pub fn init_round(
        &self,
        mode: Mode,
        features: Features,
        snake_count: usize,
    ) -> Result<Round, ConfigError> {
        let lineup = RoundConfig::for_mode(mode, features, snake_count);
        let config = RoundConfig {
            mode,
            features,
            controllers: lineup.controllers,
            ..self.base.clone()
        };
        Round::new(config)
    }

    /// checks if the round's primary score earns a leaderboard entry
    pub fn qualifies(&self, summary: &RoundSummary) -> bool {
        summary.mode == Mode::Single && self.scores.leaderboard.qualifies(summary.primary_score)
    }

    /// Books a finished round: raises the high score and, for single mode
    /// rounds that qualify, adds `name` to the leaderboard. Returns the
    /// leaderboard rank when an entry was added.
    pub fn record(&mut self, summary: &RoundSummary, name: &str) -> Option<usize> {
        if summary.primary_score > self.scores.high_score {
            debug!(score = summary.primary_score, "new high score");
            self.scores.high_score = summary.primary_score;
        }
        if !self.qualifies(summary) {
            return None;
        }
        self.scores.leaderboard.insert(name, summary.primary_score)
    }

    #[allow(missing_docs)]
    pub fn high_score(&self) -> u32 {
        self.scores.high_score
    }

    #[allow(missing_docs)]
    pub fn leaderboard(&self) -> &Leaderboard {
        &self.scores.leaderboard
    }

    #[allow(missing_docs)]
    pub fn scores(&self) -> &Scores {
        &self.scores
    }

    #[allow(missing_docs)]
    pub fn base_config(&self) -> &RoundConfig {
        &self.base
    }
}
