use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The forecast lengths offered to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForecastHorizon {
    Week,
    HalfMonth,
    Month,
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("unsupported forecast horizon {0:?} (expected 7, 15 or 30 days)")]
pub struct InvalidHorizon(pub String);

impl ForecastHorizon {
    pub const ALL: [ForecastHorizon; 3] = [
        ForecastHorizon::Week,
        ForecastHorizon::HalfMonth,
        ForecastHorizon::Month,
    ];

    pub fn days(self) -> u32 {
        match self {
            ForecastHorizon::Week => 7,
            ForecastHorizon::HalfMonth => 15,
            ForecastHorizon::Month => 30,
        }
    }

    pub fn next(self) -> Self {
        match self {
            ForecastHorizon::Week => ForecastHorizon::HalfMonth,
            ForecastHorizon::HalfMonth => ForecastHorizon::Month,
            ForecastHorizon::Month => ForecastHorizon::Week,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ForecastHorizon::Week => ForecastHorizon::Month,
            ForecastHorizon::HalfMonth => ForecastHorizon::Week,
            ForecastHorizon::Month => ForecastHorizon::HalfMonth,
        }
    }
}

impl TryFrom<u32> for ForecastHorizon {
    type Error = InvalidHorizon;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        ForecastHorizon::ALL
            .into_iter()
            .find(|h| h.days() == days)
            .ok_or_else(|| InvalidHorizon(days.to_string()))
    }
}

impl FromStr for ForecastHorizon {
    type Err = InvalidHorizon;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days: u32 = s.trim().parse().map_err(|_| InvalidHorizon(s.to_string()))?;
        ForecastHorizon::try_from(days)
    }
}

impl fmt::Display for ForecastHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days", self.days())
    }
}

/// Operator input for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParams {
    pub topic: String,
    pub horizon: ForecastHorizon,
}

impl RunParams {
    /// A blank topic falls back to the configured default.
    pub fn new(topic: &str, default_topic: &str, horizon: ForecastHorizon) -> Self {
        let topic = match topic.trim() {
            "" => default_topic.trim(),
            t => t,
        };
        Self {
            topic: topic.to_string(),
            horizon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_three_horizons_exist() {
        assert_eq!(ForecastHorizon::try_from(7), Ok(ForecastHorizon::Week));
        assert_eq!(ForecastHorizon::try_from(15), Ok(ForecastHorizon::HalfMonth));
        assert_eq!(ForecastHorizon::try_from(30), Ok(ForecastHorizon::Month));
        assert!(ForecastHorizon::try_from(14).is_err());
        assert!("0".parse::<ForecastHorizon>().is_err());
        assert!("week".parse::<ForecastHorizon>().is_err());
        assert_eq!(" 30 ".parse::<ForecastHorizon>(), Ok(ForecastHorizon::Month));
    }

    #[test]
    fn test_cycle_wraps() {
        let mut h = ForecastHorizon::Week;
        for _ in 0..3 {
            h = h.next();
        }
        assert_eq!(h, ForecastHorizon::Week);
        assert_eq!(ForecastHorizon::Week.prev(), ForecastHorizon::Month);
    }

    #[test]
    fn test_blank_topic_uses_default() {
        let p = RunParams::new("   ", "artificial intelligence", ForecastHorizon::Week);
        assert_eq!(p.topic, "artificial intelligence");
        let p = RunParams::new(" rust ", "artificial intelligence", ForecastHorizon::Month);
        assert_eq!(p.topic, "rust");
    }
}
