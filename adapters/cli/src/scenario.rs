//! Scenario loading for the command-line adapter.

use std::{fs, path::Path};

use aerial_tactics_core::Scenario;
use anyhow::{Context, Result};

/// Skirmish played when no scenario file is given.
const DEFAULT_SCENARIO: &str = include_str!("../scenarios/skirmish.toml");

/// Reads and validates the scenario at `path`, or the bundled skirmish.
pub(crate) fn load(path: Option<&Path>) -> Result<Scenario> {
    let (source, text) = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read scenario {}", path.display()))?;
            (path.display().to_string(), text)
        }
        None => (String::from("bundled skirmish"), DEFAULT_SCENARIO.to_owned()),
    };
    parse(&text).with_context(|| format!("invalid scenario in {source}"))
}

fn parse(text: &str) -> Result<Scenario> {
    let scenario: Scenario = toml::from_str(text).context("failed to parse scenario TOML")?;
    scenario.validate().context("scenario failed validation")?;
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_scenario_is_valid() {
        let scenario = load(None).expect("bundled scenario loads");
        assert_eq!(scenario.teams.len(), 2);
        assert_eq!(scenario.placements.len(), 4);
    }

    #[test]
    fn dangling_references_are_reported() {
        let error = parse(
            r#"
                [[teams]]
                id = 1
                name = "Blue"
                priority = 0

                [[units]]
                name = "fighter"

                [[placements]]
                unit = "fighter"
                team = 3
            "#,
        )
        .expect_err("team 3 is undeclared");
        assert!(format!("{error:#}").contains("unknown team 3"));
    }
}
