// Configuration loading and parsing (optimizer.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::position::ROSTER_SIZE;

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
// optimizer.toml structs
// ---------------------------------------------------------------------------

/// Fully assembled optimizer configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub roster: RosterConfig,
    pub diversify: DiversifyConfig,
    pub matching: MatchConfig,
    pub strategy: StrategyConfig,
    pub solver: SolverConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RosterConfig {
    pub salary_cap: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiversifyConfig {
    pub num_lineups: usize,
    pub max_overlap: usize,
    pub max_exposure: usize,
}

/// Name matching between the cost table and the projection table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchConfig {
    /// When false the fuzzy pass is skipped entirely.
    pub fuzzy_enabled: bool,
    /// Minimum similarity on a 0-100 scale.
    pub fuzzy_threshold: f64,
}

/// Objective weights and cost-tier bounds used by the strategy catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StrategyConfig {
    pub balanced_value_weight: f64,
    pub balanced_efficiency_weight: f64,
    /// Multiplier applied to value-per-cost (points per 1000 cost units).
    pub efficiency_scale: f64,
    pub tier_reference_cost: f64,
    pub tier_high_fraction: f64,
    pub tier_low_fraction: f64,
    pub tier_min: usize,
    pub tier_max: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SolverConfig {
    /// Branch-and-bound nodes explored per solve before giving up.
    pub search_node_limit: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            roster: RosterConfig {
                salary_cap: 50_000.0,
            },
            diversify: DiversifyConfig::default(),
            matching: MatchConfig::default(),
            strategy: StrategyConfig::default(),
            solver: SolverConfig::default(),
        }
    }
}

impl Default for DiversifyConfig {
    fn default() -> Self {
        DiversifyConfig {
            num_lineups: 5,
            max_overlap: 3,
            max_exposure: 3,
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            fuzzy_enabled: true,
            fuzzy_threshold: 85.0,
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            balanced_value_weight: 0.6,
            balanced_efficiency_weight: 0.4,
            efficiency_scale: 1000.0,
            tier_reference_cost: 10_000.0,
            tier_high_fraction: 0.8,
            tier_low_fraction: 0.6,
            tier_min: 2,
            tier_max: 3,
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            search_node_limit: 50_000_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Name of the single config file under `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "optimizer.toml";

/// Load and validate `config/optimizer.toml` relative to `base_dir`.
///
/// This does not seed missing files; see `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config = parse_config(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Parse config text without touching the filesystem.
pub fn parse_config(text: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(text)
}

/// Copy `defaults/optimizer.toml` to `config/optimizer.toml` unless the
/// latter already exists. Returns the seeded path, if any.
pub fn seed_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no {CONFIG_FILE} under config/ or defaults/ in {}",
                base_dir.display()
            ),
        });
    }
    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create {}: {e}", dir.display()),
        })?;
    }
    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    })?;
    Ok(Some(target))
}

/// Load config relative to `base_dir`, seeding `config/` from `defaults/`.
///
/// When neither directory exists the built-in defaults are used, so the
/// optimizer runs out of the box from any working directory.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    if !base_dir.join("defaults").exists() && !base_dir.join("config").exists() {
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    }
    seed_config_file(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let cap = config.roster.salary_cap;
    if !cap.is_finite() || cap <= 0.0 {
        return Err(invalid("roster.salary_cap", format!("must be > 0, got {cap}")));
    }

    let d = &config.diversify;
    if d.num_lineups == 0 {
        return Err(invalid("diversify.num_lineups", "must be > 0"));
    }
    if d.max_overlap > ROSTER_SIZE {
        return Err(invalid(
            "diversify.max_overlap",
            format!("must be at most {ROSTER_SIZE}, got {}", d.max_overlap),
        ));
    }
    if d.max_exposure == 0 {
        return Err(invalid("diversify.max_exposure", "must be > 0"));
    }

    let threshold = config.matching.fuzzy_threshold;
    if !(threshold > 0.0 && threshold <= 100.0) {
        return Err(invalid(
            "matching.fuzzy_threshold",
            format!("must be in (0, 100], got {threshold}"),
        ));
    }

    let s = &config.strategy;
    let non_negative: &[(&str, f64)] = &[
        ("strategy.balanced_value_weight", s.balanced_value_weight),
        ("strategy.balanced_efficiency_weight", s.balanced_efficiency_weight),
    ];
    for (name, val) in non_negative {
        if !val.is_finite() || *val < 0.0 {
            return Err(invalid(name, format!("must be >= 0, got {val}")));
        }
    }
    let positive: &[(&str, f64)] = &[
        ("strategy.efficiency_scale", s.efficiency_scale),
        ("strategy.tier_reference_cost", s.tier_reference_cost),
    ];
    for (name, val) in positive {
        if !val.is_finite() || *val <= 0.0 {
            return Err(invalid(name, format!("must be > 0, got {val}")));
        }
    }
    if !(s.tier_low_fraction > 0.0 && s.tier_low_fraction < s.tier_high_fraction) {
        return Err(invalid(
            "strategy.tier_low_fraction",
            format!(
                "must be > 0 and below tier_high_fraction ({}), got {}",
                s.tier_high_fraction, s.tier_low_fraction
            ),
        ));
    }
    if s.tier_min > s.tier_max {
        return Err(invalid(
            "strategy.tier_min",
            format!("must not exceed tier_max ({}), got {}", s.tier_max, s.tier_min),
        ));
    }
    if s.tier_min * 3 > ROSTER_SIZE {
        return Err(invalid(
            "strategy.tier_min",
            format!("three tiers of {} exceed the roster size", s.tier_min),
        ));
    }

    if config.solver.search_node_limit == 0 {
        return Err(invalid("solver.search_node_limit", "must be > 0"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
