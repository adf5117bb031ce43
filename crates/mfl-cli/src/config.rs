//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use mfl_core::{ProjectionConfig, RosterQuota, ScoringConfig};

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Roster slots per category.
    pub roster: RosterQuota,
    pub scoring: ScoringConfig,
    pub projection: ProjectionConfig,
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // MFL_SCORING__KICK__SEGMENT_START=35K sets scoring.kick.segment_start
        figment = figment.merge(Env::prefixed("MFL_").split("__"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for mfl.
///
/// On Linux: `~/.config/mfl`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("mfl"))
}

#[cfg(test)]
mod tests {
    use mfl_core::Split;

    use super::*;

    #[test]
    fn test_dirs_config_path_ends_with_mfl() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "mfl");
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.roster, RosterQuota { men: 3, women: 3 });
        assert_eq!(config.scoring.even_pace_tolerance_ms, 30_000);
        assert_eq!(config.scoring.kick.segment_start, Split::FortyK);
        assert_eq!(config.projection.quorum_percent, 50);
    }

    #[test]
    fn test_file_overrides_nested_values() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("mfl.toml");
        std::fs::write(
            &path,
            r#"
[roster]
women = 2

[scoring]
even_pace_tolerance_ms = 15000

[scoring.kick]
segment_start = "35K"

[projection]
quorum_percent = 60
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.roster.men, 3);
        assert_eq!(config.roster.women, 2);
        assert_eq!(config.scoring.even_pace_tolerance_ms, 15_000);
        assert_eq!(config.scoring.kick.segment_start, Split::ThirtyFiveK);
        assert_eq!(config.scoring.kick.min_pace_gain_bps, 0);
        assert_eq!(config.projection.quorum_percent, 60);
    }

    #[test]
    fn test_kick_segment_accepts_feed_spelling() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("mfl.toml");
        std::fs::write(&path, "[scoring.kick]\nsegment_start = \"half\"\n").unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.scoring.kick.segment_start, Split::Half);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config::load_from(Some(&temp.path().join("absent.toml"))).unwrap();
        assert_eq!(config.roster, RosterQuota::default());
    }
}
