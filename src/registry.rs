use clap::ValueEnum;

use crate::readme::{self, ReadmeMetrics};

/// Package index whose store is being analyzed. Each registry has its own
/// database file, table names and README flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Registry {
    /// npm packages, Markdown READMEs
    Npm,
    /// PyPI packages, reStructuredText READMEs
    Pypi,
}

impl Registry {
    pub fn label(self) -> &'static str {
        match self {
            Registry::Npm => "NPM",
            Registry::Pypi => "PyPI",
        }
    }

    pub fn package_table(self) -> &'static str {
        match self {
            Registry::Npm => "npmpackage",
            Registry::Pypi => "pypipackage",
        }
    }

    pub fn analysis_table(self) -> &'static str {
        match self {
            Registry::Npm => "npmreadmeanalysis",
            Registry::Pypi => "pypireadmeanalysis",
        }
    }

    pub fn analyze(self, readme_text: &str) -> ReadmeMetrics {
        match self {
            Registry::Npm => readme::markdown::analyze(readme_text),
            Registry::Pypi => readme::rst::analyze(readme_text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_values() {
        assert_eq!(Registry::from_str("npm", false), Ok(Registry::Npm));
        assert_eq!(Registry::from_str("pypi", false), Ok(Registry::Pypi));
        assert!(Registry::from_str("cargo", false).is_err());
    }

    #[test]
    fn dispatches_to_flavor() {
        // Indented block is code in Markdown; reST needs the `::` marker.
        let text = "Intro\n\n    indented\n";
        assert_eq!(Registry::Npm.analyze(text).code_count, 1);
        assert_eq!(Registry::Pypi.analyze(text).code_count, 0);
    }
}
