//! Run mode selection
//!
//! Interactive mode is only available for interactive-capable languages.
//! Switching to another language while interactive falls back to batch.

use codexec_foundation::{Error, Language, Result};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Batch,
    Interactive,
}

/// Selected language + run mode
#[derive(Debug, Clone, Default)]
pub struct ModeSelector {
    language: Language,
    mode: RunMode,
}

impl ModeSelector {
    /// Batch mode for `language`
    pub fn new(language: Language) -> Self {
        Self {
            language,
            mode: RunMode::Batch,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Change language; returns the resulting mode
    pub fn select_language(&mut self, language: Language) -> RunMode {
        self.language = language;
        if self.mode == RunMode::Interactive && !language.is_interactive() {
            info!("{} is batch-only, leaving interactive mode", language.display_name());
            self.mode = RunMode::Batch;
        }
        self.mode
    }

    pub fn enter_interactive(&mut self) -> Result<()> {
        if !self.language.is_interactive() {
            return Err(Error::InvalidInput(format!(
                "{} does not support interactive mode",
                self.language.display_name()
            )));
        }
        self.mode = RunMode::Interactive;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_only_languages_cannot_go_interactive() {
        for language in [Language::C, Language::Cpp, Language::Java] {
            let mut selector = ModeSelector::new(language);
            assert!(matches!(selector.enter_interactive(), Err(Error::InvalidInput(_))));
            assert_eq!(selector.mode(), RunMode::Batch);
        }
    }

    #[test]
    fn test_switching_to_batch_only_language_forces_batch() {
        let mut selector = ModeSelector::new(Language::Python);
        selector.enter_interactive().unwrap();

        assert_eq!(selector.select_language(Language::Javascript), RunMode::Interactive);
        assert_eq!(selector.select_language(Language::Java), RunMode::Batch);
        assert_eq!(selector.language(), Language::Java);
    }

    #[test]
    fn test_default_is_python_batch() {
        let selector = ModeSelector::default();
        assert_eq!(selector.language(), Language::Python);
        assert_eq!(selector.mode(), RunMode::Batch);
    }
}
