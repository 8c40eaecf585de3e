//! Signal: a strategy's declared target exposure for one symbol.

use super::ids::StrategyId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Target direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    /// Hold `strength` long, unwind any short.
    Long,
    /// Hold `strength` short, unwind any long.
    Short,
    /// Unwind everything.
    #[serde(alias = "EMPTY")]
    Flat,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalType::Long => "LONG",
            SignalType::Short => "SHORT",
            SignalType::Flat => "FLAT",
        };
        f.write_str(name)
    }
}

/// Error from parsing a raw signal type outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown signal type '{0}'")]
pub struct UnknownSignalType(pub String);

impl FromStr for SignalType {
    type Err = UnknownSignalType;

    /// Accepts `LONG`, `SHORT`, `FLAT` and the legacy `EMPTY`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" => Ok(SignalType::Long),
            "SHORT" => Ok(SignalType::Short),
            "FLAT" | "EMPTY" => Ok(SignalType::Flat),
            _ => Err(UnknownSignalType(s.to_string())),
        }
    }
}

/// A signal produced by a strategy and consumed exactly once.
///
/// `strength` is a signed magnitude in signal units (lots); only its absolute
/// value, truncated toward zero, is used as the target exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub strategy: StrategyId,
    pub signal_type: SignalType,
    pub strength: f64,
}

impl Signal {
    pub fn new(
        symbol: impl Into<String>,
        strategy: impl Into<StrategyId>,
        signal_type: SignalType,
        strength: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            strategy: strategy.into(),
            signal_type,
            strength,
        }
    }

    pub fn long(symbol: &str, strategy: &str, strength: f64) -> Self {
        Self::new(symbol, strategy, SignalType::Long, strength)
    }

    pub fn short(symbol: &str, strategy: &str, strength: f64) -> Self {
        Self::new(symbol, strategy, SignalType::Short, strength)
    }

    pub fn flat(symbol: &str, strategy: &str) -> Self {
        Self::new(symbol, strategy, SignalType::Flat, 0.0)
    }

    /// Target magnitude in signal units, or `None` if the strength is not finite.
    pub fn target(&self) -> Option<u64> {
        if self.strength.is_finite() {
            Some(self.strength.abs().trunc() as u64)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signal_types() {
        assert_eq!("LONG".parse::<SignalType>().unwrap(), SignalType::Long);
        assert_eq!("short".parse::<SignalType>().unwrap(), SignalType::Short);
        assert_eq!("EMPTY".parse::<SignalType>().unwrap(), SignalType::Flat);
        assert_eq!(" Flat ".parse::<SignalType>().unwrap(), SignalType::Flat);
    }

    #[test]
    fn rejects_unknown_signal_type() {
        let err = "SIDEWAYS".parse::<SignalType>().unwrap_err();
        assert_eq!(err, UnknownSignalType("SIDEWAYS".into()));
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert_eq!(boxed.to_string(), "unknown signal type 'SIDEWAYS'");
    }

    #[test]
    fn target_truncates_absolute_strength() {
        assert_eq!(Signal::long("rb1710", "s", 3.9).target(), Some(3));
        assert_eq!(Signal::short("rb1710", "s", -2.5).target(), Some(2));
        assert_eq!(Signal::long("rb1710", "s", f64::NAN).target(), None);
        assert_eq!(Signal::long("rb1710", "s", f64::INFINITY).target(), None);
    }

    #[test]
    fn signal_type_serde_accepts_legacy_empty() {
        let parsed: SignalType = serde_json::from_str("\"EMPTY\"").unwrap();
        assert_eq!(parsed, SignalType::Flat);
        assert_eq!(serde_json::to_string(&SignalType::Long).unwrap(), "\"LONG\"");
    }
}
