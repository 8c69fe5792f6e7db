use crate::plugin::{Extraction, ExtractionEnvironment, Plugin};
use crate::result::{PhaseResult, SearchResult};
use crate::rule::Rule;
use crate::search::SearchContext;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Mutable record of one rule evaluated in one directory.
///
/// Each phase slot is written at most once; a second write is ignored and
/// logged. The plugin is created only when the search gate passes and is
/// owned by this record alone.
pub struct Evaluation {
    rule: Arc<Rule>,
    directory: PathBuf,
    search_context: Option<SearchContext>,
    searchable: Option<SearchResult>,
    applicable: Option<PhaseResult>,
    extractable: Option<PhaseResult>,
    extraction_environment: Option<ExtractionEnvironment>,
    extraction: Option<Extraction>,
    plugin: Option<Box<dyn Plugin>>,
}

fn set_once<T>(slot: &mut Option<T>, value: T, phase: &str, rule: &Rule) {
    if slot.is_some() {
        warn!(rule = %rule.id(), phase, "Phase result already recorded, ignoring");
        return;
    }
    *slot = Some(value);
}

impl Evaluation {
    pub fn new(rule: Arc<Rule>, directory: impl Into<PathBuf>) -> Self {
        Self {
            rule,
            directory: directory.into(),
            search_context: None,
            searchable: None,
            applicable: None,
            extractable: None,
            extraction_environment: None,
            extraction: None,
            plugin: None,
        }
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn search_context(&self) -> Option<&SearchContext> {
        self.search_context.as_ref()
    }

    pub fn searchable(&self) -> Option<&SearchResult> {
        self.searchable.as_ref()
    }

    pub fn applicable(&self) -> Option<&PhaseResult> {
        self.applicable.as_ref()
    }

    pub fn extractable(&self) -> Option<&PhaseResult> {
        self.extractable.as_ref()
    }

    pub fn extraction_environment(&self) -> Option<&ExtractionEnvironment> {
        self.extraction_environment.as_ref()
    }

    pub fn extraction(&self) -> Option<&Extraction> {
        self.extraction.as_ref()
    }

    pub fn has_plugin(&self) -> bool {
        self.plugin.is_some()
    }

    pub fn is_searchable(&self) -> bool {
        self.searchable.as_ref().is_some_and(SearchResult::passed)
    }

    pub fn is_applicable(&self) -> bool {
        self.is_searchable() && self.applicable.as_ref().is_some_and(PhaseResult::passed)
    }

    pub fn is_extractable(&self) -> bool {
        self.is_applicable() && self.extractable.as_ref().is_some_and(PhaseResult::passed)
    }

    pub fn was_extraction_attempted(&self) -> bool {
        self.extraction.is_some()
    }

    pub fn was_extraction_successful(&self) -> bool {
        self.is_extractable() && self.extraction.as_ref().is_some_and(Extraction::is_success)
    }

    /// Human readable explanation of how far this evaluation got
    pub fn status_message(&self) -> String {
        match (&self.searchable, &self.applicable, &self.extractable, &self.extraction) {
            (None, ..) => "Not evaluated.".to_string(),
            (Some(search), ..) if !search.passed() => search.to_string(),
            (_, Some(applicable), ..) if !applicable.passed() => applicable.to_string(),
            (_, None, ..) => "Applicable not evaluated.".to_string(),
            (_, _, Some(extractable), _) if !extractable.passed() => extractable.to_string(),
            (_, _, None, _) => "Extractable not evaluated.".to_string(),
            (_, _, _, Some(extraction)) => extraction.as_phase_result().to_string(),
            (_, _, _, None) => "Extraction not performed.".to_string(),
        }
    }

    pub(crate) fn set_search_context(&mut self, context: SearchContext) {
        self.search_context = Some(context);
    }

    pub(crate) fn set_searchable(&mut self, result: SearchResult) {
        set_once(&mut self.searchable, result, "searchable", &self.rule);
    }

    pub(crate) fn set_applicable(&mut self, result: PhaseResult) {
        set_once(&mut self.applicable, result, "applicable", &self.rule);
    }

    pub(crate) fn set_extractable(&mut self, result: PhaseResult) {
        set_once(&mut self.extractable, result, "extractable", &self.rule);
    }

    pub(crate) fn set_extraction_environment(&mut self, environment: ExtractionEnvironment) {
        set_once(
            &mut self.extraction_environment,
            environment,
            "extraction environment",
            &self.rule,
        );
    }

    pub(crate) fn set_extraction(&mut self, extraction: Extraction) {
        set_once(&mut self.extraction, extraction, "extraction", &self.rule);
    }

    pub(crate) fn set_plugin(&mut self, plugin: Box<dyn Plugin>) {
        self.plugin = Some(plugin);
    }

    pub(crate) fn plugin_mut(&mut self) -> Option<&mut (dyn Plugin + 'static)> {
        self.plugin.as_deref_mut()
    }
}

impl fmt::Debug for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluation")
            .field("rule", self.rule.id())
            .field("directory", &self.directory)
            .field("searchable", &self.searchable)
            .field("applicable", &self.applicable)
            .field("extractable", &self.extractable)
            .field("extraction", &self.extraction)
            .field("has_plugin", &self.plugin.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::NotSearchableReason;
    use crate::rule::test_support::passing_rule;

    fn evaluation() -> Evaluation {
        Evaluation::new(Arc::new(passing_rule("go-mod")), "/repo")
    }

    #[test]
    fn test_new_evaluation_is_blank() {
        let evaluation = evaluation();
        assert!(!evaluation.is_searchable());
        assert!(!evaluation.has_plugin());
        assert_eq!(evaluation.status_message(), "Not evaluated.");
    }

    #[test]
    fn test_gates_chain() {
        let mut evaluation = evaluation();
        evaluation.set_searchable(SearchResult::Searchable);
        evaluation.set_applicable(PhaseResult::Passed);
        assert!(evaluation.is_applicable());
        assert!(!evaluation.is_extractable());
        assert_eq!(evaluation.status_message(), "Extractable not evaluated.");

        evaluation.set_extractable(PhaseResult::executable_not_found("gradle"));
        assert!(!evaluation.is_extractable());
        assert_eq!(evaluation.status_message(), "No gradle executable was found");
    }

    #[test]
    fn test_phase_results_are_write_once() {
        let mut evaluation = evaluation();
        evaluation.set_searchable(SearchResult::NotSearchable(NotSearchableReason::Excluded));
        evaluation.set_searchable(SearchResult::Searchable);
        assert!(!evaluation.is_searchable());
        assert_eq!(evaluation.status_message(), "Detector type was excluded.");
    }

    #[test]
    fn test_applicable_requires_searchable() {
        let mut evaluation = evaluation();
        evaluation.set_applicable(PhaseResult::Passed);
        assert!(!evaluation.is_applicable());
    }

    #[test]
    fn test_successful_extraction() {
        let mut evaluation = evaluation();
        evaluation.set_searchable(SearchResult::Searchable);
        evaluation.set_applicable(PhaseResult::Passed);
        evaluation.set_extractable(PhaseResult::Passed);
        evaluation.set_extraction(Extraction::success(Vec::new()));
        assert!(evaluation.was_extraction_attempted());
        assert!(evaluation.was_extraction_successful());
        assert_eq!(evaluation.status_message(), "Passed.");
    }
}
