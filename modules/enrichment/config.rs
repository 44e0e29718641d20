use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use campus_core::{CampusLexicon, LexiconKind};
use place_search::{RetrySettings, SearchSettings};
use roster::{InputSettings, OutputSettings};
use serde::Deserialize;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "campus.toml";

/// `[parser]` section.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ParserSettings {
    /// Word lists to parse titles with.
    #[serde(default)]
    pub lexicon: LexiconKind,
}

impl ParserSettings {
    /// Lexicon selected by this section.
    #[must_use]
    pub fn lexicon(&self) -> CampusLexicon {
        CampusLexicon::for_kind(self.lexicon)
    }
}

/// Whole run configuration.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// Search API binding.
    pub search: SearchSettings,
    /// Retry budget and pacing.
    pub retry: RetrySettings,
    /// Parser vocabulary.
    pub parser: ParserSettings,
    /// Roster and supplementary inputs.
    pub input: InputSettings,
    /// Report and log destinations.
    pub output: OutputSettings,
    source_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct EnrichDocumentSerde {
    #[serde(default)]
    search: SearchSettings,
    #[serde(default)]
    retry: RetrySettings,
    #[serde(default)]
    parser: ParserSettings,
    #[serde(default)]
    input: InputSettings,
    #[serde(default)]
    output: OutputSettings,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            search: SearchSettings::default(),
            retry: RetrySettings::default(),
            parser: ParserSettings::default(),
            input: InputSettings::default(),
            output: OutputSettings::default(),
            source_dir: PathBuf::from("."),
        }
    }
}

impl EnrichConfig {
    /// Loads a TOML document. Relative input and output paths resolve
    /// against the file's directory.
    ///
    /// # Errors
    ///
    /// Unreadable or malformed files and out-of-range values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let document: EnrichDocumentSerde =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        if document.search.page_size == 0 {
            bail!("search.page_size must be at least 1");
        }
        if document.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        if document.retry.max_delay_ms < document.retry.delay_ms {
            bail!("retry.max_delay_ms must not be below retry.delay_ms");
        }
        let source_dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let mut config = Self {
            search: document.search,
            retry: document.retry,
            parser: document.parser,
            input: document.input,
            output: document.output,
            source_dir,
        };
        config.input.roster = config.resolve_path(&config.input.roster);
        config.input.supplementary = config
            .input
            .supplementary
            .as_ref()
            .map(|path| config.resolve_path(path));
        config.output.dir = config.resolve_path(&config.output.dir);
        Ok(config)
    }

    /// Loads `path` when given, else [`DEFAULT_CONFIG_FILE`] from the
    /// working directory when present, else the defaults.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::load(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Resolves a path relative to the configuration file.
    #[must_use]
    pub fn resolve_path(&self, candidate: impl AsRef<Path>) -> PathBuf {
        let candidate = candidate.as_ref();
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.source_dir.join(candidate)
        }
    }

    /// Replaces the roster path (taken as given, not config-relative).
    #[must_use]
    pub fn with_roster(mut self, roster: impl Into<PathBuf>) -> Self {
        self.input.roster = roster.into();
        self
    }

    /// Replaces the output directory (taken as given).
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output.dir = dir.into();
        self
    }
}
