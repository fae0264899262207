use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prescribed diet. ADA compliance is tracked separately on the patient
/// because it combines with any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DietType {
    #[default]
    Regular,
    Cardiac,
    Renal,
    MechanicalSoft,
    Puree,
    ClearLiquid,
    FullLiquid,
}

impl DietType {
    pub const ALL: [DietType; 7] = [
        DietType::Regular,
        DietType::Cardiac,
        DietType::Renal,
        DietType::MechanicalSoft,
        DietType::Puree,
        DietType::ClearLiquid,
        DietType::FullLiquid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DietType::Regular => "regular",
            DietType::Cardiac => "cardiac",
            DietType::Renal => "renal",
            DietType::MechanicalSoft => "mechanical-soft",
            DietType::Puree => "puree",
            DietType::ClearLiquid => "clear-liquid",
            DietType::FullLiquid => "full-liquid",
        }
    }
}

impl fmt::Display for DietType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DietType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '_'], "-");
        DietType::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| {
                let valid: Vec<&str> = DietType::ALL.iter().map(|d| d.as_str()).collect();
                format!(
                    "Invalid diet type '{}'. Valid options: {}",
                    s,
                    valid.join(", ")
                )
            })
    }
}
