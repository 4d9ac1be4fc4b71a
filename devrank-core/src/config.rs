use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analyze::CentralityConfig;
use crate::error::ConfigError;
use crate::score::LabelWeights;
use crate::server::FileFilter;
use crate::types::{Blacklist, CommitId};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".devrank.toml";

/// Top-level devrank configuration, matching `.devrank.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevRankConfig {
    #[serde(default)]
    pub complexity: ComplexitySection,
    #[serde(default)]
    pub centrality: CentralityConfig,
    #[serde(default)]
    pub history: HistorySection,
    #[serde(default)]
    pub filter: FilterSection,
    #[serde(default)]
    pub scoring: ScoringSection,
}

impl DevRankConfig {
    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.display().to_string())
            } else {
                ConfigError::Parse(format!("{}: {e}", path.display()))
            }
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.centrality;
        if !(0.0..=1.0).contains(&c.alpha) {
            return Err(ConfigError::Invalid(format!(
                "centrality.alpha must be within [0, 1], got {}",
                c.alpha
            )));
        }
        if c.epsilon.is_nan() || c.epsilon <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "centrality.epsilon must be positive, got {}",
                c.epsilon
            )));
        }
        if c.max_iters == 0 {
            return Err(ConfigError::Invalid(
                "centrality.max_iters must be at least 1".into(),
            ));
        }
        if !self.complexity.r_n.is_finite() || !self.complexity.r_e.is_finite() {
            return Err(ConfigError::Invalid(
                "complexity.r_n and complexity.r_e must be finite".into(),
            ));
        }
        FileFilter::from_section(&self.filter)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplexitySection {
    /// Logical units per node.
    pub r_n: f64,
    /// Logical units per edge.
    pub r_e: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySection {
    /// Commit hexshas excluded from dev-eq and complexity sums.
    pub blacklist: Vec<String>,
}

impl HistorySection {
    pub fn blacklist_set(&self) -> Blacklist {
        self.blacklist.iter().map(|sha| CommitId::from(sha.as_str())).collect()
    }
}

/// Which changed files feed the graph. Paths are matched relative to the
/// repository root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            include_patterns: vec![
                "**/*.c".into(),
                "**/*.h".into(),
                "**/*.cc".into(),
                "**/*.cpp".into(),
                "**/*.hpp".into(),
                "**/*.go".into(),
                "**/*.java".into(),
                "**/*.js".into(),
                "**/*.rs".into(),
            ],
            exclude_patterns: vec![
                "**/node_modules/**".into(),
                "**/vendor/**".into(),
                "**/dist/**".into(),
                "**/build/**".into(),
                "**/.git/**".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSection {
    /// Weight per label category, in classifier output order.
    pub label_weights: LabelWeights,
    /// Score each commit by its most likely label only.
    pub top_one: bool,
}

impl Default for ScoringSection {
    fn default() -> Self {
        // bug, feature, improvement, maintenance
        Self {
            label_weights: LabelWeights::new(vec![1.0, 1.0, 1.0, 1.0]),
            top_one: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_from_empty_file() {
        let config = DevRankConfig::from_toml_str("").unwrap();
        assert!((config.centrality.alpha - 0.85).abs() < f64::EPSILON);
        assert!((config.centrality.epsilon - 1e-5).abs() < f64::EPSILON);
        assert_eq!(config.centrality.max_iters, 300);
        assert!(config.complexity.r_n.abs() < f64::EPSILON);
        assert!(config.history.blacklist.is_empty());
        assert_eq!(config.scoring.label_weights.len(), 4);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = DevRankConfig::from_toml_str(
            r#"
[complexity]
r_n = 2.5

[centrality]
alpha = 0.5

[history]
blacklist = ["deadbeef"]
"#,
        )
        .unwrap();
        assert!((config.complexity.r_n - 2.5).abs() < f64::EPSILON);
        assert!(config.complexity.r_e.abs() < f64::EPSILON);
        assert!((config.centrality.alpha - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.centrality.max_iters, 300);
        assert!(config.history.blacklist_set().contains(&CommitId::from("deadbeef")));
    }

    #[test]
    fn rejects_out_of_range_values() {
        for text in [
            "[centrality]\nalpha = 1.5",
            "[centrality]\nepsilon = 0.0",
            "[centrality]\nmax_iters = 0",
            "[filter]\ninclude_patterns = [\"src/[\"]",
        ] {
            let err = DevRankConfig::from_toml_str(text).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{text}: {err}");
        }
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        let err = DevRankConfig::from_toml_str("[centrality\nalpha = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(matches!(
            DevRankConfig::load(&path),
            Err(ConfigError::NotFound(_))
        ));

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[scoring]\nlabel_weights = [2.0, 1.0]\ntop_one = true").unwrap();
        let config = DevRankConfig::load(&path).unwrap();
        assert_eq!(config.scoring.label_weights.as_slice(), &[2.0, 1.0]);
        assert!(config.scoring.top_one);
    }
}
