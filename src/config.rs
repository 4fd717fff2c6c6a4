//! Service configuration
//!
//! Reads settings from the environment, falling back to project-relative defaults.

use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;

/// Bag weights accepted for piece configuration when nothing else is configured
pub const DEFAULT_PIECE_WEIGHTS: [u32; 4] = [15, 20, 25, 30];

/// Default number of pooled SQLite connections
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub pool_size: u32,
    pub piece_weights: PieceWeightPolicy,
}

/// Which per-piece weights a product may be configured with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PieceWeightPolicy {
    /// Only the listed weights (in kilograms) are accepted
    AllowedSet(Vec<Decimal>),
    /// Any positive weight is accepted
    AnyPositive,
}

impl Default for PieceWeightPolicy {
    fn default() -> Self {
        PieceWeightPolicy::AllowedSet(
            DEFAULT_PIECE_WEIGHTS.iter().map(|w| Decimal::from(*w)).collect(),
        )
    }
}

impl PieceWeightPolicy {
    /// Parse a comma-separated list like "15,20,25,30"; an empty string means any positive weight
    pub fn parse(s: &str) -> Result<Self, String> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(PieceWeightPolicy::AnyPositive);
        }

        let mut weights = Vec::new();
        for part in trimmed.split(',') {
            let part = part.trim();
            let weight = Decimal::from_str(part)
                .map_err(|e| format!("invalid piece weight '{}': {}", part, e))?;
            if weight <= Decimal::ZERO {
                return Err(format!("piece weight must be positive, got {}", part));
            }
            weights.push(weight.normalize());
        }
        weights.sort();
        weights.dedup();

        Ok(PieceWeightPolicy::AllowedSet(weights))
    }

    /// Check a weight against the policy
    pub fn check(&self, weight: Decimal) -> Result<(), String> {
        if weight <= Decimal::ZERO {
            return Err("piece weight must be greater than 0".to_string());
        }
        match self {
            PieceWeightPolicy::AnyPositive => Ok(()),
            PieceWeightPolicy::AllowedSet(allowed) => {
                if allowed.iter().any(|w| *w == weight) {
                    Ok(())
                } else {
                    let listed: Vec<String> = allowed.iter().map(|w| w.to_string()).collect();
                    Err(format!("Bag weight must be one of [{}] kg", listed.join(", ")))
                }
            }
        }
    }
}

impl Config {
    /// Load configuration from `CATALOG_*` environment variables
    pub fn from_env() -> Result<Self, String> {
        let database_path = std::env::var("CATALOG_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_database_path());

        let pool_size = match std::env::var("CATALOG_DB_POOL_SIZE") {
            Ok(v) => v
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("CATALOG_DB_POOL_SIZE must be a positive integer, got '{}'", v))?,
            Err(_) => DEFAULT_POOL_SIZE,
        };

        let piece_weights = match std::env::var("CATALOG_ALLOWED_PIECE_WEIGHTS") {
            Ok(v) => PieceWeightPolicy::parse(&v)?,
            Err(_) => PieceWeightPolicy::default(),
        };

        Ok(Self {
            database_path,
            pool_size,
            piece_weights,
        })
    }
}

/// `<project>/data/catalog.db`, resolved relative to the running executable
pub fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(parent) = path.parent() {
            if let Some(grandparent) = parent.parent() {
                path = grandparent.to_path_buf();
            }
        }
    }

    path.push("data");
    path.push("catalog.db");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_bag_weights() {
        let policy = PieceWeightPolicy::default();
        assert!(policy.check(Decimal::from(20)).is_ok());
        assert!(policy.check(Decimal::from(30)).is_ok());
        assert!(policy.check(Decimal::from(22)).is_err());
    }

    #[test]
    fn test_parse_policy() {
        let policy = PieceWeightPolicy::parse("50, 10,10").unwrap();
        assert_eq!(
            policy,
            PieceWeightPolicy::AllowedSet(vec![Decimal::from(10), Decimal::from(50)])
        );
        assert!(policy.check(Decimal::from(50)).is_ok());
        assert!(policy.check(Decimal::from(20)).is_err());
    }

    #[test]
    fn test_empty_policy_accepts_any_positive() {
        let policy = PieceWeightPolicy::parse("  ").unwrap();
        assert_eq!(policy, PieceWeightPolicy::AnyPositive);
        assert!(policy.check(Decimal::new(125, 1)).is_ok());
        assert!(policy.check(Decimal::ZERO).is_err());
        assert!(policy.check(Decimal::from(-5)).is_err());
    }

    #[test]
    fn test_parse_policy_rejects_garbage() {
        assert!(PieceWeightPolicy::parse("15,abc").is_err());
        assert!(PieceWeightPolicy::parse("15,-2").is_err());
    }

    #[test]
    fn test_allowed_set_matches_scaled_decimals() {
        let policy = PieceWeightPolicy::default();
        // 20.0 and 20 compare equal as decimals
        assert!(policy.check(Decimal::new(200, 1)).is_ok());
    }
}
