//! Round configuration.
//!
//! Everything here is consumed verbatim by [crate::round::Round::new]. The
//! defaults reproduce the arcade game: a 30x30 bounded grid, a 150ms base
//! tick, 20 obstacles and a 60 second time limit when those features are on.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ConfigError;
use crate::grid::{Grid, Position};
use crate::types::Controller;

/// Length of every snake at round start
pub const INITIAL_SNAKE_LENGTH: usize = 3;

/// Most snakes a round can hold, one per spawn point
pub const MAX_SNAKES: usize = 4;

/// Longest grid side a round accepts
pub const MAX_GRID_SIDE: u32 = 1024;

/// How many snakes play and who wins
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// one snake, the round ends when it dies
    Single,
    /// a human against one AI snake
    VersusAi,
    /// a human against up to three AI snakes
    Multi,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Single => write!(f, "single"),
            Mode::VersusAi => write!(f, "versus_ai"),
            Mode::Multi => write!(f, "multi"),
        }
    }
}

impl Mode {
    fn snake_count_range(&self) -> (usize, usize) {
        match self {
            Mode::Single => (1, 1),
            Mode::VersusAi => (2, 2),
            Mode::Multi => (2, MAX_SNAKES),
        }
    }
}

/// Optional rule variants, the "difficulty" picked before a round
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct Features {
    /// edges wrap around instead of killing
    pub no_boundary: bool,
    /// static obstacle cells are placed at round start
    pub obstacles: bool,
    /// the round ends when a countdown reaches zero
    pub time_limit: bool,
}

/// Score bonus for normal food eaten by a snake longer than `longer_than`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LengthBonus {
    #[allow(missing_docs)]
    pub longer_than: usize,
    #[allow(missing_docs)]
    pub bonus: u32,
}

/// Tick interval multiplier once the primary snake is longer than `longer_than`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SpeedTier {
    #[allow(missing_docs)]
    pub longer_than: usize,
    #[allow(missing_docs)]
    pub factor: f64,
}

/// Empirically tuned constants. Tiers are checked in order, first match wins.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Tuning {
    /// eats closer together than this keep a combo going
    pub combo_window_ms: f64,
    /// combo count at which the combo bonus starts
    pub combo_threshold: u32,
    #[allow(missing_docs)]
    pub combo_bonus: u32,
    /// awarded to a human snake when another snake runs into it
    pub kill_bonus: u32,
    #[allow(missing_docs)]
    pub length_bonuses: Vec<LengthBonus>,
    /// duration granted by invincible food
    pub invincible_ms: f64,
    #[allow(missing_docs)]
    pub speed_tiers: Vec<SpeedTier>,
    /// how far the head may roam before the stuck timer resets
    pub stuck_radius: f64,
    /// time spent inside the radius before the AI starts exploring
    pub stuck_threshold_ms: f64,
    /// random picks tried before settling for an unchecked exploration target
    pub exploration_attempts: u32,
    /// exploring stops once the head is this close to the target
    pub arrival_distance: f64,
    /// maximum cells counted by one survival flood fill
    pub flood_fill_cap: usize,
    /// chance per tick of topping up food when below target
    pub food_spawn_chance: f64,
    #[allow(missing_docs)]
    pub food_spawn_attempts: u32,
    #[allow(missing_docs)]
    pub obstacle_attempts: u32,
    /// obstacles keep out of the square of this half-width around spawns
    pub obstacle_clearance: i32,
    /// time added to the accumulator by a speed boost
    pub boost_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            combo_window_ms: 4000.0,
            combo_threshold: 3,
            combo_bonus: 5,
            kill_bonus: 50,
            length_bonuses: vec![
                LengthBonus {
                    longer_than: 20,
                    bonus: 20,
                },
                LengthBonus {
                    longer_than: 10,
                    bonus: 10,
                },
            ],
            invincible_ms: 5000.0,
            speed_tiers: vec![
                SpeedTier {
                    longer_than: 20,
                    factor: 0.6,
                },
                SpeedTier {
                    longer_than: 10,
                    factor: 0.8,
                },
            ],
            stuck_radius: 5.0,
            stuck_threshold_ms: 10_000.0,
            exploration_attempts: 20,
            arrival_distance: 2.0,
            flood_fill_cap: 100,
            food_spawn_chance: 0.2,
            food_spawn_attempts: 100,
            obstacle_attempts: 100,
            obstacle_clearance: 5,
            boost_ms: 50.0,
        }
    }
}

impl Tuning {
    /// bonus for eating normal food at `length`
    pub fn length_bonus(&self, length: usize) -> u32 {
        self.length_bonuses
            .iter()
            .find(|tier| length > tier.longer_than)
            .map(|tier| tier.bonus)
            .unwrap_or(0)
    }

    /// multiplier applied to the base tick for a primary snake of `length`
    pub fn speed_factor(&self, length: usize) -> f64 {
        self.speed_tiers
            .iter()
            .find(|tier| length > tier.longer_than)
            .map(|tier| tier.factor)
            .unwrap_or(1.0)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("combo_window_ms", self.combo_window_ms),
            ("stuck_radius", self.stuck_radius),
            ("stuck_threshold_ms", self.stuck_threshold_ms),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Tuning { name, value });
            }
        }
        if !(0.0..=1.0).contains(&self.food_spawn_chance) {
            return Err(ConfigError::Tuning {
                name: "food_spawn_chance",
                value: self.food_spawn_chance,
            });
        }
        if self.invincible_ms < 0.0 {
            return Err(ConfigError::Tuning {
                name: "invincible_ms",
                value: self.invincible_ms,
            });
        }
        if let Some(tier) = self
            .speed_tiers
            .iter()
            .find(|tier| !(tier.factor > 0.0))
        {
            return Err(ConfigError::Tuning {
                name: "speed_tiers.factor",
                value: tier.factor,
            });
        }
        Ok(())
    }
}

/// Everything needed to start a round
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RoundConfig {
    #[allow(missing_docs)]
    pub mode: Mode,
    #[allow(missing_docs)]
    pub features: Features,
    #[allow(missing_docs)]
    pub cols: u32,
    #[allow(missing_docs)]
    pub rows: u32,
    /// one entry per snake, index 0 is the primary snake
    pub controllers: Vec<Controller>,
    /// tick interval before any speed tier applies
    pub base_tick_ms: f64,
    /// countdown length when the time limit feature is on
    pub time_limit_ms: f64,
    /// obstacles placed when the obstacle feature is on
    pub obstacle_count: usize,
    /// active food the spawner tops up to
    pub food_target: usize,
    /// most logic ticks one `Round::tick` call may run
    pub max_catch_up_ticks: u32,
    /// fixes the random stream, for replays and tests
    pub seed: Option<u64>,
    #[allow(missing_docs)]
    pub tuning: Tuning,
}

impl Default for RoundConfig {
    fn default() -> Self {
        RoundConfig {
            mode: Mode::Single,
            features: Features::default(),
            cols: 30,
            rows: 30,
            controllers: vec![Controller::Human],
            base_tick_ms: 150.0,
            time_limit_ms: 60_000.0,
            obstacle_count: 20,
            food_target: 5,
            max_catch_up_ticks: 5,
            seed: None,
            tuning: Tuning::default(),
        }
    }
}

impl RoundConfig {
    /// The standard line-up for a mode: a human primary snake and AI opponents
    pub fn for_mode(mode: Mode, features: Features, snake_count: usize) -> Self {
        let controllers = (0..snake_count)
            .map(|i| {
                if i == 0 {
                    Controller::Human
                } else {
                    Controller::Ai
                }
            })
            .collect();
        RoundConfig {
            mode,
            features,
            controllers,
            ..Default::default()
        }
    }

    /// parses a config from json, missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: RoundConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// the grid this config plays on
    pub fn grid(&self) -> Grid {
        Grid::new(self.cols, self.rows, self.features.no_boundary)
    }

    /// head position of each snake at round start; bodies extend downwards
    pub fn spawn_points(&self) -> Vec<Position> {
        let (cols, rows) = (self.cols as i32, self.rows as i32);
        let player = Position::new(5, 5);
        let order = match self.mode {
            Mode::Single | Mode::VersusAi => vec![
                player,
                Position::new(cols - 5, rows - 5),
                Position::new(cols - 6, 6),
                Position::new(6, rows - 6),
            ],
            Mode::Multi => vec![
                player,
                Position::new(cols - 6, 6),
                Position::new(6, rows - 6),
                Position::new(cols - 5, rows - 5),
            ],
        };
        order.into_iter().take(self.controllers.len()).collect()
    }

    /// rejects configs a round could not start from
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cols == 0 || self.rows == 0 {
            return Err(ConfigError::EmptyGrid {
                cols: self.cols,
                rows: self.rows,
            });
        }
        if self.cols > MAX_GRID_SIDE || self.rows > MAX_GRID_SIDE {
            return Err(ConfigError::GridTooLarge {
                cols: self.cols,
                rows: self.rows,
                max: MAX_GRID_SIDE,
            });
        }
        let count = self.controllers.len();
        if count == 0 {
            return Err(ConfigError::NoSnakes);
        }
        let (min, max) = self.mode.snake_count_range();
        if count < min || count > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{}..={}", min, max)
            };
            return Err(ConfigError::SnakeCountForMode {
                mode: self.mode.to_string(),
                expected,
                actual: count,
            });
        }
        if !(self.base_tick_ms > 0.0) {
            return Err(ConfigError::TickInterval(self.base_tick_ms));
        }
        if self.features.time_limit && !(self.time_limit_ms > 0.0) {
            return Err(ConfigError::TimeLimit(self.time_limit_ms));
        }
        self.tuning.validate()?;

        let grid = self.grid();
        let spawns = self.spawn_points();
        for (index, head) in spawns.iter().enumerate() {
            let tail = Position::new(head.x, head.y + INITIAL_SNAKE_LENGTH as i32 - 1);
            if !grid.contains(*head) || !grid.contains(tail) {
                return Err(ConfigError::SpawnOutOfBounds {
                    index,
                    cols: self.cols,
                    rows: self.rows,
                });
            }
        }
        for (first, a) in spawns.iter().enumerate() {
            for (second, b) in spawns.iter().enumerate().skip(first + 1) {
                let overlapping =
                    a.x == b.x && (a.y - b.y).abs() < INITIAL_SNAKE_LENGTH as i32;
                if overlapping {
                    return Err(ConfigError::OverlappingSpawns { first, second });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RoundConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.spawn_points(), vec![Position::new(5, 5)]);
    }

    #[test]
    fn test_for_mode_lineups() {
        let config = RoundConfig::for_mode(Mode::Multi, Features::default(), 3);
        assert_eq!(
            config.controllers,
            vec![Controller::Human, Controller::Ai, Controller::Ai]
        );
        assert_eq!(
            config.spawn_points(),
            vec![
                Position::new(5, 5),
                Position::new(24, 6),
                Position::new(6, 24)
            ]
        );
        assert!(config.validate().is_ok());

        let versus = RoundConfig::for_mode(Mode::VersusAi, Features::default(), 2);
        assert_eq!(versus.spawn_points()[1], Position::new(25, 25));
    }

    #[test]
    fn test_rejects_bad_configs() {
        let mut config = RoundConfig::default();
        config.cols = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyGrid { .. })
        ));

        let config = RoundConfig::for_mode(Mode::Single, Features::default(), 0);
        assert!(matches!(config.validate(), Err(ConfigError::NoSnakes)));

        let config = RoundConfig::for_mode(Mode::Single, Features::default(), 2);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SnakeCountForMode { .. })
        ));

        let config = RoundConfig::for_mode(Mode::Multi, Features::default(), 5);
        assert!(config.validate().is_err());

        let mut config = RoundConfig::default();
        config.base_tick_ms = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TickInterval(_))
        ));

        let mut config = RoundConfig::default();
        config.cols = 6;
        config.rows = 6;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SpawnOutOfBounds { .. })
        ));

        let mut config = RoundConfig::default();
        config.cols = MAX_GRID_SIDE + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::GridTooLarge { .. })
        ));
    }

    #[test]
    fn test_from_json_uses_defaults() {
        let config = RoundConfig::from_json(
            r#"{"mode":"versus_ai","controllers":["human","ai"],"features":{"obstacles":true}}"#,
        )
        .expect("valid json config");
        assert_eq!(config.mode, Mode::VersusAi);
        assert!(config.features.obstacles);
        assert!(!config.features.no_boundary);
        assert_eq!(config.base_tick_ms, 150.0);
        assert_eq!(config.tuning.combo_window_ms, 4000.0);

        assert!(matches!(
            RoundConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_tiers() {
        let tuning = Tuning::default();
        assert_eq!(tuning.length_bonus(10), 0);
        assert_eq!(tuning.length_bonus(11), 10);
        assert_eq!(tuning.length_bonus(21), 20);
        assert_eq!(tuning.speed_factor(3), 1.0);
        assert_eq!(tuning.speed_factor(11), 0.8);
        assert_eq!(tuning.speed_factor(25), 0.6);
    }
}
