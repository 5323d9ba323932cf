//! Summary length modes.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Requested summary length.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LengthMode {
    Short,
    #[default]
    Medium,
    Long,
}

impl LengthMode {
    /// Resolve a user-supplied selector. Unknown values fall back to `Medium`.
    pub fn from_selector(selector: &str) -> Self {
        selector.trim().parse().unwrap_or_default()
    }

    /// Canonical profile for this mode.
    pub fn profile(&self) -> &'static LengthProfile {
        LengthProfile::for_mode(*self)
    }
}

/// Target compression ratio and output budget for a length mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LengthProfile {
    pub mode: LengthMode,
    /// Target summary length as a fraction of the input.
    pub ratio: f32,
    /// Hard cap passed to the model as `max_tokens`.
    pub max_output_tokens: u32,
}

const PROFILES: [LengthProfile; 3] = [
    LengthProfile {
        mode: LengthMode::Short,
        ratio: 0.10,
        max_output_tokens: 256,
    },
    LengthProfile {
        mode: LengthMode::Medium,
        ratio: 0.20,
        max_output_tokens: 512,
    },
    LengthProfile {
        mode: LengthMode::Long,
        ratio: 0.35,
        max_output_tokens: 1024,
    },
];

impl LengthProfile {
    pub fn for_mode(mode: LengthMode) -> &'static LengthProfile {
        match mode {
            LengthMode::Short => &PROFILES[0],
            LengthMode::Medium => &PROFILES[1],
            LengthMode::Long => &PROFILES[2],
        }
    }

    /// Ratio as a whole percentage, e.g. `20` for medium.
    pub fn ratio_percent(&self) -> u32 {
        (self.ratio * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_profiles_are_ordered() {
        let short = LengthMode::Short.profile();
        let medium = LengthMode::Medium.profile();
        let long = LengthMode::Long.profile();

        assert!(short.ratio < medium.ratio && medium.ratio < long.ratio);
        assert!(short.max_output_tokens < medium.max_output_tokens);
        assert!(medium.max_output_tokens < long.max_output_tokens);
    }

    #[test]
    fn test_canonical_table() {
        assert_eq!(LengthMode::Short.profile().max_output_tokens, 256);
        assert_eq!(LengthMode::Medium.profile().ratio_percent(), 20);
        assert_eq!(LengthMode::Long.profile().ratio_percent(), 35);
        for mode in LengthMode::iter() {
            assert_eq!(mode.profile().mode, mode);
        }
    }

    #[test]
    fn test_unknown_selector_is_medium() {
        assert_eq!(LengthMode::from_selector("short"), LengthMode::Short);
        assert_eq!(LengthMode::from_selector(" LONG "), LengthMode::Long);
        assert_eq!(LengthMode::from_selector("tiny"), LengthMode::Medium);
        assert_eq!(LengthMode::from_selector(""), LengthMode::Medium);
    }
}
