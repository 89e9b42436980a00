// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoring rules and their TOML configuration

use crate::classifier::MarkMode;
use crate::scoring::{HalfPoints, HandicapCompensation, ScoringSystem};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Named rule sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RulesPreset {
    /// Area scoring, 7.5 komi, one point per handicap stone
    Chinese,
    /// Territory scoring, 6.5 komi, no handicap compensation
    Japanese,
    /// Area scoring, 7.5 komi, handicap minus one
    Aga,
}

impl FromStr for RulesPreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chinese" => Ok(RulesPreset::Chinese),
            "japanese" => Ok(RulesPreset::Japanese),
            "aga" => Ok(RulesPreset::Aga),
            other => Err(anyhow::anyhow!("unknown rules preset {other:?}")),
        }
    }
}

/// Everything the calculator needs to know about the rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRules {
    pub scoring_system: ScoringSystem,
    /// Added to White's total
    pub komi: HalfPoints,
    pub handicap_compensation: HandicapCompensation,
    /// What toggling a group cycles through
    pub mark_mode: MarkMode,
}

impl ScoringRules {
    /// Rules of a named preset
    pub fn preset(preset: RulesPreset) -> Self {
        match preset {
            RulesPreset::Chinese => Self {
                scoring_system: ScoringSystem::Area,
                komi: HalfPoints::from_halves(15),
                handicap_compensation: HandicapCompensation::Full,
                mark_mode: MarkMode::DeadStones,
            },
            RulesPreset::Japanese => Self {
                scoring_system: ScoringSystem::Territory,
                komi: HalfPoints::from_halves(13),
                handicap_compensation: HandicapCompensation::None,
                mark_mode: MarkMode::DeadStones,
            },
            RulesPreset::Aga => Self {
                scoring_system: ScoringSystem::Area,
                komi: HalfPoints::from_halves(15),
                handicap_compensation: HandicapCompensation::MinusOne,
                mark_mode: MarkMode::DeadStones,
            },
        }
    }

    /// Same rules with another komi
    pub fn with_komi(mut self, komi: HalfPoints) -> Self {
        self.komi = komi;
        self
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self::preset(RulesPreset::Chinese)
    }
}

/// On-disk layout: a preset plus optional overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesFile {
    pub preset: Option<RulesPreset>,
    pub scoring_system: Option<ScoringSystem>,
    pub komi: Option<HalfPoints>,
    pub handicap_compensation: Option<HandicapCompensation>,
    pub mark_mode: Option<MarkMode>,
}

impl RulesFile {
    /// Apply the overrides on top of the preset (Chinese if none)
    pub fn resolve(&self) -> ScoringRules {
        let mut rules = ScoringRules::preset(self.preset.unwrap_or(RulesPreset::Chinese));
        if let Some(system) = self.scoring_system {
            rules.scoring_system = system;
        }
        if let Some(komi) = self.komi {
            rules.komi = komi;
        }
        if let Some(compensation) = self.handicap_compensation {
            rules.handicap_compensation = compensation;
        }
        if let Some(mode) = self.mark_mode {
            rules.mark_mode = mode;
        }
        rules
    }
}

/// Parse rules from TOML text
pub fn parse_rules(text: &str) -> Result<ScoringRules> {
    let file: RulesFile = toml::from_str(text).context("Failed to parse rules")?;
    Ok(file.resolve())
}

/// Load rules from a TOML file
pub fn load_rules(path: &Path) -> Result<ScoringRules> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules file: {}", path.display()))?;
    let rules = parse_rules(&content)
        .with_context(|| format!("Invalid rules file: {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        system = ?rules.scoring_system,
        komi = %rules.komi,
        "loaded scoring rules"
    );
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let chinese = ScoringRules::preset(RulesPreset::Chinese);
        assert_eq!(chinese.scoring_system, ScoringSystem::Area);
        assert_eq!(chinese.komi.to_string(), "7.5");
        let japanese = ScoringRules::preset(RulesPreset::Japanese);
        assert_eq!(japanese.scoring_system, ScoringSystem::Territory);
        assert_eq!(japanese.komi.to_string(), "6.5");
        assert_eq!(japanese.handicap_compensation, HandicapCompensation::None);
        assert_eq!(ScoringRules::default(), chinese);
    }

    #[test]
    fn overrides_apply_on_top_of_preset() {
        let rules = parse_rules(
            r#"
            preset = "japanese"
            komi = 0.5
            handicap_compensation = "minus-one"
            "#,
        )
        .unwrap();
        assert_eq!(rules.scoring_system, ScoringSystem::Territory);
        assert_eq!(rules.komi.halves(), 1);
        assert_eq!(rules.handicap_compensation, HandicapCompensation::MinusOne);
    }

    #[test]
    fn rejects_bad_komi_and_unknown_keys() {
        assert!(parse_rules("komi = 6.3").is_err());
        assert!(parse_rules("kommi = 6.5").is_err());
        assert!(parse_rules("").is_ok());
    }

    #[test]
    fn preset_names_parse() {
        assert_eq!("AGA".parse::<RulesPreset>().unwrap(), RulesPreset::Aga);
        assert!("ing".parse::<RulesPreset>().is_err());
    }
}
