use serde::{Deserialize, Serialize};
use std::fmt;

/// Daily reanalysis variables, named by their NASA POWER parameter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClimateVariable {
    /// Daily mean temperature at 2 m
    #[serde(rename = "T2M")]
    Temperature,
    /// Daily minimum temperature at 2 m
    #[serde(rename = "T2M_MIN")]
    TemperatureMin,
    /// Daily maximum temperature at 2 m
    #[serde(rename = "T2M_MAX")]
    TemperatureMax,
    /// Relative humidity at 2 m
    #[serde(rename = "RH2M")]
    RelativeHumidity,
    /// Bias-corrected precipitation total
    #[serde(rename = "PRECTOTCORR")]
    Precipitation,
    /// Wind speed at 10 m
    #[serde(rename = "WS10M")]
    WindSpeed,
}

impl ClimateVariable {
    pub const ALL: [ClimateVariable; 6] = [
        Self::Temperature,
        Self::TemperatureMin,
        Self::TemperatureMax,
        Self::RelativeHumidity,
        Self::Precipitation,
        Self::WindSpeed,
    ];

    /// Parameter code as used on the wire (e.g. `T2M`)
    pub fn code(&self) -> &'static str {
        match self {
            Self::Temperature => "T2M",
            Self::TemperatureMin => "T2M_MIN",
            Self::TemperatureMax => "T2M_MAX",
            Self::RelativeHumidity => "RH2M",
            Self::Precipitation => "PRECTOTCORR",
            Self::WindSpeed => "WS10M",
        }
    }

    /// Parse a parameter code; unknown codes are `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.code() == code)
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::Temperature | Self::TemperatureMin | Self::TemperatureMax => "°C",
            Self::RelativeHumidity => "%",
            Self::Precipitation => "mm/day",
            Self::WindSpeed => "m/s",
        }
    }

    /// Whether a value below the threshold is the uncomfortable direction.
    ///
    /// Only wind: still air removes evaporative cooling.
    pub fn low_is_bad(&self) -> bool {
        matches!(self, Self::WindSpeed)
    }
}

impl fmt::Display for ClimateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
