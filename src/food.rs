//! Food items and what eating them does
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::Position;

/// The four kinds of food
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FoodKind {
    /// 10 points, grows the snake. Earns the length bonus
    Normal,
    /// 20 points, grows the snake
    Bonus,
    /// no points, shrinks the snake by one
    Shorten,
    /// no points, grants an invincibility window
    Invincible,
}

/// Effect applied to the snake that eats a food
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    #[allow(missing_docs)]
    Grow,
    #[allow(missing_docs)]
    Shrink,
    #[allow(missing_docs)]
    Invincible,
}

impl FoodKind {
    /// base score before bonuses
    pub fn score(&self) -> u32 {
        match self {
            FoodKind::Normal => 10,
            FoodKind::Bonus => 20,
            FoodKind::Shorten | FoodKind::Invincible => 0,
        }
    }

    #[allow(missing_docs)]
    pub fn effect(&self) -> Effect {
        match self {
            FoodKind::Normal | FoodKind::Bonus => Effect::Grow,
            FoodKind::Shorten => Effect::Shrink,
            FoodKind::Invincible => Effect::Invincible,
        }
    }

    /// maps a roll in `[0, 1)` to a kind: 70% normal, then 10% each of bonus,
    /// shorten and invincible
    pub fn from_roll(roll: f64) -> FoodKind {
        if roll > 0.9 {
            FoodKind::Invincible
        } else if roll > 0.8 {
            FoodKind::Shorten
        } else if roll > 0.7 {
            FoodKind::Bonus
        } else {
            FoodKind::Normal
        }
    }

    /// draws a kind with the standard weights
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> FoodKind {
        Self::from_roll(rng.gen::<f64>())
    }
}

/// A food item on the board
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Food {
    #[allow(missing_docs)]
    pub position: Position,
    #[allow(missing_docs)]
    pub kind: FoodKind,
    /// false once eaten, until the cleanup pass drops it
    pub active: bool,
}

impl Food {
    #[allow(missing_docs)]
    pub fn new(position: Position, kind: FoodKind) -> Self {
        Food {
            position,
            kind,
            active: true,
        }
    }

    #[allow(missing_docs)]
    pub fn score(&self) -> u32 {
        self.kind.score()
    }

    #[allow(missing_docs)]
    pub fn effect(&self) -> Effect {
        self.kind.effect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_table() {
        assert_eq!(FoodKind::Normal.score(), 10);
        assert_eq!(FoodKind::Bonus.score(), 20);
        assert_eq!(FoodKind::Shorten.effect(), Effect::Shrink);
        assert_eq!(FoodKind::Invincible.effect(), Effect::Invincible);
        assert_eq!(FoodKind::Invincible.score(), 0);
    }

    #[test]
    fn test_roll_thresholds() {
        assert_eq!(FoodKind::from_roll(0.0), FoodKind::Normal);
        assert_eq!(FoodKind::from_roll(0.7), FoodKind::Normal);
        assert_eq!(FoodKind::from_roll(0.75), FoodKind::Bonus);
        assert_eq!(FoodKind::from_roll(0.85), FoodKind::Shorten);
        assert_eq!(FoodKind::from_roll(0.95), FoodKind::Invincible);
    }
}
