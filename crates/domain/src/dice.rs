//! Dice formulas and rolling
//!
//! Supports formulas like "2d6", "1d6+1", "d12". Rolling never touches a
//! global RNG: callers pass a `gen_range(min, max)` closure that returns a
//! uniform integer in the inclusive range, the same contract as the
//! engine's `RandomPort`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error when parsing a dice formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceParseError {
    /// The formula string is empty
    #[error("Empty dice formula")]
    Empty,
    /// Invalid format - expected XdY or XdY+Z
    #[error("Invalid dice format: {0}")]
    InvalidFormat(String),
    /// Dice count must be at least 1
    #[error("Dice count must be at least 1")]
    InvalidDiceCount,
    /// Die size must be at least 2
    #[error("Die size must be at least 2")]
    InvalidDieSize,
}

/// A parsed dice formula like "2d6+3"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceFormula {
    /// Number of dice to roll (X in XdY)
    pub dice_count: u8,
    /// Size of each die (Y in XdY)
    pub die_size: u8,
    /// Modifier to add/subtract after rolling (+Z or -Z)
    pub modifier: i32,
}

impl DiceFormula {
    /// One six-sided die, the default initiative roll.
    pub const ONE_D6: DiceFormula = DiceFormula {
        dice_count: 1,
        die_size: 6,
        modifier: 0,
    };

    /// Two six-sided dice, the weather table roll.
    pub const TWO_D6: DiceFormula = DiceFormula {
        dice_count: 2,
        die_size: 6,
        modifier: 0,
    };

    /// Create a new dice formula
    pub fn new(dice_count: u8, die_size: u8, modifier: i32) -> Result<Self, DiceParseError> {
        if dice_count == 0 {
            return Err(DiceParseError::InvalidDiceCount);
        }
        if die_size < 2 {
            return Err(DiceParseError::InvalidDieSize);
        }
        Ok(Self {
            dice_count,
            die_size,
            modifier,
        })
    }

    /// Parse a dice formula string like "1d6+1", "2d6", "d12"
    pub fn parse(input: &str) -> Result<Self, DiceParseError> {
        let input = input.trim().to_lowercase();
        if input.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let d_pos = input.find('d').ok_or_else(|| {
            DiceParseError::InvalidFormat(format!("Missing 'd' separator in '{}'", input))
        })?;

        let dice_count_str = &input[..d_pos];
        let dice_count: u8 = if dice_count_str.is_empty() {
            1
        } else {
            dice_count_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid dice count: '{}'", dice_count_str))
            })?
        };

        let after_d = &input[d_pos + 1..];
        let (die_size_str, modifier) = if let Some(plus_pos) = after_d.find('+') {
            let mod_str = &after_d[plus_pos + 1..];
            let modifier: i32 = mod_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid modifier: '+{}'", mod_str))
            })?;
            (&after_d[..plus_pos], modifier)
        } else if let Some(minus_pos) = after_d.rfind('-') {
            if minus_pos == 0 {
                return Err(DiceParseError::InvalidFormat(format!(
                    "Invalid die size: '{}'",
                    after_d
                )));
            }
            let mod_str = &after_d[minus_pos + 1..];
            let modifier: i32 = mod_str.parse().map_err(|_| {
                DiceParseError::InvalidFormat(format!("Invalid modifier: '-{}'", mod_str))
            })?;
            (&after_d[..minus_pos], -modifier)
        } else {
            (after_d, 0)
        };

        let die_size: u8 = die_size_str.parse().map_err(|_| {
            DiceParseError::InvalidFormat(format!("Invalid die size: '{}'", die_size_str))
        })?;

        Self::new(dice_count, die_size, modifier)
    }

    /// Roll the dice with an injected inclusive range generator.
    pub fn roll_with<R>(&self, gen_range: &mut R) -> DiceRollResult
    where
        R: FnMut(i32, i32) -> i32 + ?Sized,
    {
        let individual_rolls: Vec<i32> = (0..self.dice_count)
            .map(|_| gen_range(1, self.die_size as i32))
            .collect();
        let dice_total: i32 = individual_rolls.iter().sum();

        DiceRollResult {
            formula: *self,
            individual_rolls,
            dice_total,
            total: dice_total + self.modifier,
        }
    }
}

impl fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            0 => write!(f, "{}d{}", self.dice_count, self.die_size),
            m if m > 0 => write!(f, "{}d{}+{}", self.dice_count, self.die_size, m),
            m => write!(f, "{}d{}{}", self.dice_count, self.die_size, m),
        }
    }
}

/// Result of rolling dice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRollResult {
    pub formula: DiceFormula,
    pub individual_rolls: Vec<i32>,
    /// Sum of dice before modifier
    pub dice_total: i32,
    pub total: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted(values: Vec<i32>) -> impl FnMut(i32, i32) -> i32 {
        let mut iter = values.into_iter();
        move |min, _max| iter.next().unwrap_or(min)
    }

    #[test]
    fn test_parse_simple() {
        let formula = DiceFormula::parse("2d6").unwrap();
        assert_eq!(formula, DiceFormula::TWO_D6);
    }

    #[test]
    fn test_parse_shorthand() {
        let formula = DiceFormula::parse("d12").unwrap();
        assert_eq!(formula.dice_count, 1);
        assert_eq!(formula.die_size, 12);
    }

    #[test]
    fn test_parse_with_modifiers() {
        assert_eq!(DiceFormula::parse("1d6+1").unwrap().modifier, 1);
        assert_eq!(DiceFormula::parse(" 1D6-2 ").unwrap().modifier, -2);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(DiceFormula::parse(""), Err(DiceParseError::Empty)));
        assert!(matches!(
            DiceFormula::parse("6"),
            Err(DiceParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            DiceFormula::parse("0d6"),
            Err(DiceParseError::InvalidDiceCount)
        ));
        assert!(matches!(
            DiceFormula::parse("1d1"),
            Err(DiceParseError::InvalidDieSize)
        ));
    }

    #[test]
    fn test_roll_with_sums_each_die() {
        let mut rng = scripted(vec![3, 4]);
        let result = DiceFormula::TWO_D6.roll_with(&mut rng);
        assert_eq!(result.individual_rolls, vec![3, 4]);
        assert_eq!(result.total, 7);
        assert_eq!(result.dice_total, 7);
    }

    #[test]
    fn test_roll_with_passes_die_bounds() {
        let mut seen = Vec::new();
        let mut rng = |min: i32, max: i32| {
            seen.push((min, max));
            max
        };
        let result = DiceFormula::parse("1d6+1").unwrap().roll_with(&mut rng);
        assert_eq!(result.total, 7);
        assert_eq!(seen, vec![(1, 6)]);
    }

    #[test]
    fn test_display() {
        assert_eq!(DiceFormula::new(1, 20, 5).unwrap().to_string(), "1d20+5");
        assert_eq!(DiceFormula::new(1, 6, -1).unwrap().to_string(), "1d6-1");
        assert_eq!(DiceFormula::ONE_D6.to_string(), "1d6");
    }
}
