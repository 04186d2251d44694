use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a wire string does not name a known enum variant.
#[derive(Debug, Error)]
#[error("invalid {field} value: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(LabFormat {
    MyChartSingle => "mychart-single",
    MyChartPeriod => "mychart-period",
    Healow => "healow",
    UiHealth => "ui-health",
    FollowMyHealth => "follow-my-health",
    MemorialHealth => "memorial-health",
    ChartOcr => "chart-ocr",
});

str_enum!(Status {
    Normal => "normal",
    High => "high",
    Low => "low",
});

/// An explicit H/L annotation printed beside a value on the report.
/// Distinct from a status computed from the reference range: when a flag
/// is present it is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flag {
    High,
    Low,
}

impl Flag {
    /// Parse a printed flag token: `H`, `L`, `High`, `Low` (any case).
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "h" | "high" => Some(Self::High),
            "l" | "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn status(self) -> Status {
        match self {
            Self::High => Status::High,
            Self::Low => Status::Low,
        }
    }
}
