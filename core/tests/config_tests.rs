// SPDX-License-Identifier: MIT OR Apache-2.0

use goscore_core::config::load_rules;
use goscore_core::{HandicapCompensation, MarkMode, ScoringSystem};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn load_rules_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
preset = "aga"
komi = 5.5
mark_mode = "seki"
"#
    )
    .unwrap();

    let rules = load_rules(file.path()).unwrap();
    assert_eq!(rules.scoring_system, ScoringSystem::Area);
    assert_eq!(rules.komi.to_string(), "5.5");
    assert_eq!(rules.handicap_compensation, HandicapCompensation::MinusOne);
    assert_eq!(rules.mark_mode, MarkMode::Seki);
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.toml");
    let err = load_rules(&path).unwrap_err();
    assert!(format!("{err:#}").contains("rules.toml"));
}

#[test]
fn invalid_komi_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "komi = 7.25").unwrap();
    assert!(load_rules(file.path()).is_err());
}
