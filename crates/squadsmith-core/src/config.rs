// Configuration loading and parsing (squadsmith.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::SquadRules;

/// Name of the configuration file inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "squadsmith.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// squadsmith.toml structs
// ---------------------------------------------------------------------------

/// The whole configuration. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub optimizer: OptimizerConfig,
    pub similarity: SimilarityConfig,
    pub source: SourceConfig,
    pub data: DataPaths,
    pub squad: SquadRules,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Salary cap for the 15-man squad.
    pub budget: f64,
    /// Score multiplier for substitutes.
    pub bench_fraction: f64,
    /// Relative optimality gap accepted from the solver.
    pub tolerance: f64,
    /// Player stat maximized by the optimizer.
    pub score_field: String,
    /// Adjustment factors at or above this value are ignored.
    pub adjustment_threshold: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            budget: 100.0,
            bench_fraction: 0.1,
            tolerance: 1e-6,
            score_field: "total_points".into(),
            adjustment_threshold: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Player stat holding the fraction of managers who own the player.
    pub rarity_field: String,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        SimilarityConfig {
            rarity_field: "ownership".into(),
        }
    }
}

/// Where the player data comes from. Passed through to the scraper and
/// logged; the optimizer itself does not read it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub season: String,
    pub source: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            season: "2014-15".into(),
            source: "fantasy.premierleague.com".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    pub players: Option<PathBuf>,
    pub adjustments: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/squadsmith.toml` relative to `base_dir`.
///
/// This does not copy defaults; prefer `load_config()` which does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    load_config_file(&base_dir.join("config").join(CONFIG_FILE))
}

/// Load and validate a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let text = read_file(path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Seed `config/squadsmith.toml` from `defaults/squadsmith.toml` when it
/// does not exist yet. Returns the seeded path, or `None` when the config was
/// already there. An existing config is never overwritten.
pub fn seed_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither config/{CONFIG_FILE} nor defaults/{CONFIG_FILE} found in {}",
                base_dir.display()
            ),
        });
    }

    if let Some(config_dir) = target.parent() {
        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", config_dir.display()),
        })?;
    }
    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    })?;

    Ok(Some(target))
}

/// Load the config under the current working directory, seeding it from
/// `defaults/` first if needed.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    seed_config_file(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check value ranges. Also run on configs assembled from CLI overrides.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let opt = &config.optimizer;

    if !(opt.budget.is_finite() && opt.budget > 0.0) {
        return Err(invalid("optimizer.budget", format!("must be > 0, got {}", opt.budget)));
    }

    let unit_fields: &[(&str, f64)] = &[
        ("optimizer.bench_fraction", opt.bench_fraction),
        ("optimizer.adjustment_threshold", opt.adjustment_threshold),
    ];
    for (name, val) in unit_fields {
        if !(0.0..=1.0).contains(val) {
            return Err(invalid(
                name,
                format!("must be between 0.0 and 1.0 inclusive, got {val}"),
            ));
        }
    }

    if !(0.0..1.0).contains(&opt.tolerance) {
        return Err(invalid(
            "optimizer.tolerance",
            format!("must be in [0.0, 1.0), got {}", opt.tolerance),
        ));
    }

    let name_fields: &[(&str, &str)] = &[
        ("optimizer.score_field", opt.score_field.as_str()),
        ("similarity.rarity_field", config.similarity.rarity_field.as_str()),
    ];
    for (name, val) in name_fields {
        if val.trim().is_empty() {
            return Err(invalid(name, "must not be empty".into()));
        }
    }

    config.squad.check().map_err(|message| invalid("squad", message))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// The crate directory holding `defaults/`.
    fn project_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    }

    /// Write `body` as config/squadsmith.toml under a fresh temp dir.
    fn config_dir_with(body: &str) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(tmp.path().join("config").join(CONFIG_FILE), body).unwrap();
        tmp
    }

    fn expect_validation_error(body: &str, expected_field: &str) {
        let tmp = config_dir_with(body);
        match load_config_from(tmp.path()).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected_field),
            other => panic!("expected ValidationError, got: {other}"),
        }
    }

    #[test]
    fn shipped_defaults_load_and_match_builtin_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("defaults")).unwrap();
        fs::copy(
            project_root().join("defaults").join(CONFIG_FILE),
            tmp.path().join("defaults").join(CONFIG_FILE),
        )
        .unwrap();

        seed_config_file(tmp.path()).expect("should seed the config");
        let config = load_config_from(tmp.path()).expect("should load valid config");

        assert!((config.optimizer.budget - 100.0).abs() < f64::EPSILON);
        assert!((config.optimizer.bench_fraction - 0.1).abs() < f64::EPSILON);
        assert!((config.optimizer.tolerance - 1e-6).abs() < f64::EPSILON);
        assert_eq!(config.optimizer.score_field, "total_points");
        assert!((config.optimizer.adjustment_threshold - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.similarity.rarity_field, "ownership");
        assert_eq!(config.source.season, "2014-15");
        assert_eq!(config.squad, SquadRules::default());
        assert_eq!(config.data.players, Some(PathBuf::from("data/players.csv")));
        assert_eq!(config.data.adjustments, None);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let tmp = config_dir_with("");
        let config = load_config_from(tmp.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_sections_override_defaults() {
        let tmp = config_dir_with(
            r#"
[optimizer]
budget = 95.5
score_field = "average_points"

[squad.forward]
min_starters = 2
max_starters = 3
total = 3
"#,
        );
        let config = load_config_from(tmp.path()).unwrap();
        assert!((config.optimizer.budget - 95.5).abs() < f64::EPSILON);
        assert_eq!(config.optimizer.score_field, "average_points");
        assert!((config.optimizer.bench_fraction - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.squad.forward.min_starters, 2);
        assert_eq!(config.squad.keeper, SquadRules::default().keeper);
    }

    #[test]
    fn rejects_non_positive_budget() {
        expect_validation_error("[optimizer]\nbudget = 0.0\n", "optimizer.budget");
        expect_validation_error("[optimizer]\nbudget = -5.0\n", "optimizer.budget");
    }

    #[test]
    fn rejects_bench_fraction_out_of_range() {
        expect_validation_error("[optimizer]\nbench_fraction = 1.5\n", "optimizer.bench_fraction");
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        expect_validation_error(
            "[optimizer]\nadjustment_threshold = -0.1\n",
            "optimizer.adjustment_threshold",
        );
    }

    #[test]
    fn rejects_tolerance_of_one() {
        expect_validation_error("[optimizer]\ntolerance = 1.0\n", "optimizer.tolerance");
    }

    #[test]
    fn rejects_empty_field_names() {
        expect_validation_error("[optimizer]\nscore_field = \" \"\n", "optimizer.score_field");
        expect_validation_error("[similarity]\nrarity_field = \"\"\n", "similarity.rarity_field");
    }

    #[test]
    fn rejects_inconsistent_squad_rules() {
        expect_validation_error(
            "[squad.defender]\nmin_starters = 6\nmax_starters = 5\ntotal = 5\n",
            "squad",
        );
    }

    #[test]
    fn file_not_found_for_missing_config() {
        let tmp = tempfile::tempdir().unwrap();
        match load_config_from(tmp.path()).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("config/squadsmith.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = config_dir_with("[optimizer\nbudget = ");
        assert!(matches!(
            load_config_from(tmp.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn parse_error_for_wrong_type() {
        let tmp = config_dir_with("[optimizer]\nbudget = \"lots\"\n");
        assert!(matches!(
            load_config_from(tmp.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn seeds_only_the_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let defaults = tmp.path().join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        fs::write(defaults.join(CONFIG_FILE), "[optimizer]\nbudget = 90.0\n").unwrap();
        fs::write(defaults.join("notes.toml"), "ignored").unwrap();

        let seeded = seed_config_file(tmp.path()).unwrap();
        assert_eq!(seeded, Some(tmp.path().join("config").join(CONFIG_FILE)));
        assert!(!tmp.path().join("config").join("notes.toml").exists());

        let config = load_config_from(tmp.path()).unwrap();
        assert!((config.optimizer.budget - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn seeding_keeps_an_existing_config() {
        let tmp = config_dir_with("[optimizer]\nbudget = 80.0\n");
        let defaults = tmp.path().join("defaults");
        fs::create_dir_all(&defaults).unwrap();
        fs::write(defaults.join(CONFIG_FILE), "[optimizer]\nbudget = 90.0\n").unwrap();

        assert_eq!(seed_config_file(tmp.path()).unwrap(), None);
        let config = load_config_from(tmp.path()).unwrap();
        assert!((config.optimizer.budget - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn existing_config_needs_no_defaults() {
        let tmp = config_dir_with("");
        assert_eq!(seed_config_file(tmp.path()).unwrap(), None);
    }

    #[test]
    fn seeding_without_config_or_defaults_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(
            seed_config_file(tmp.path()),
            Err(ConfigError::DefaultsCopyError { .. })
        ));
    }

    #[test]
    fn empty_config_dir_without_defaults_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        assert!(matches!(
            seed_config_file(tmp.path()),
            Err(ConfigError::DefaultsCopyError { .. })
        ));
    }
}
