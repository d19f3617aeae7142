use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::Config;
use crate::doc::fetcher::{TocFetcher, TocSource};
use crate::doc::DocCategory;
use crate::error::{Error, Result};
use crate::retrieval::{CategoryRetriever, RetrievalOutcome};
use crate::storage::SharedCache;
use crate::ui::{LinkOpener, Presenter, ProgressReporter, Selection};

/// Which categories a request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalScope {
    /// One category, fetched regardless of its configuration flags.
    Category(DocCategory),
    /// Every category enabled for the "all documentation" command.
    All,
    /// Startup warm-up: categories enabled for pre-warming, never presented.
    Prewarm,
}

impl RetrievalScope {
    /// Category filter applied to the list shown for this scope.
    pub fn filter(self) -> Option<DocCategory> {
        match self {
            RetrievalScope::Category(category) => Some(category),
            RetrievalScope::All | RetrievalScope::Prewarm => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            RetrievalScope::Category(category) => category.display_name(),
            RetrievalScope::All => "Salesforce",
            RetrievalScope::Prewarm => "startup",
        }
    }
}

/// Runs retrievals for a request and hands the result to the front end.
pub struct RetrievalCoordinator {
    config: Arc<Config>,
    cache: SharedCache,
    source: Arc<dyn TocSource>,
}

impl RetrievalCoordinator {
    pub fn new(config: Config, cache: SharedCache, source: Arc<dyn TocSource>) -> Self {
        Self {
            config: Arc::new(config),
            cache,
            source,
        }
    }

    /// Coordinator backed by an HTTP fetcher built from `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let fetcher =
            TocFetcher::with_settings(config.fetch_timeout(), config.settings.user_agent.clone())?;
        Ok(Self::new(config, SharedCache::new(), Arc::new(fetcher)))
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn categories_in_scope(&self, scope: RetrievalScope) -> Vec<DocCategory> {
        match scope {
            RetrievalScope::Category(category) => vec![category],
            RetrievalScope::All => self.config.categories_for_all(),
            RetrievalScope::Prewarm => self.config.categories_for_prewarm(),
        }
    }

    /// Retrieves every category in `scope` that is not cached yet and waits
    /// for all of them. Categories already cached are never fetched again.
    pub async fn retrieve(&self, scope: RetrievalScope) -> Vec<RetrievalOutcome> {
        let started = Instant::now();
        let mut tasks = JoinSet::new();

        for category in self.categories_in_scope(scope) {
            if self.cache.is_populated(category) {
                debug!("{} already cached, skipping fetch", category);
                continue;
            }

            let retriever = CategoryRetriever::new(
                self.config.doc_type(category),
                Arc::clone(&self.source),
                self.cache.clone(),
            );
            let span = info_span!("retrieve", category = %category);
            tasks.spawn(retriever.run().instrument(span));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!("Retrieval task did not complete: {}", e),
            }
        }
        outcomes.sort_by_key(|o| o.category);

        if !outcomes.is_empty() {
            info!(
                "Retrieved {} categories in {:.2?} ({} failed)",
                outcomes.len(),
                started.elapsed(),
                outcomes.iter().filter(|o| o.failed).count()
            );
        }
        outcomes
    }

    /// Fills the cache for the categories configured for pre-warming.
    pub async fn prewarm(&self) -> Vec<RetrievalOutcome> {
        self.retrieve(RetrievalScope::Prewarm).await
    }

    /// Retrieves `scope`, presents its titles and opens what the user picks.
    ///
    /// Returns the URL that was opened, if any.
    pub async fn browse(
        &self,
        scope: RetrievalScope,
        presenter: &dyn Presenter,
        progress: &dyn ProgressReporter,
        opener: &dyn LinkOpener,
    ) -> Result<Option<String>> {
        if scope == RetrievalScope::Prewarm {
            return Err(Error::Invalid("the startup scope cannot be browsed".to_string()));
        }

        progress.begin(&format!(
            "Retrieving {} documentation index...",
            scope.label()
        ));
        self.retrieve(scope).await;
        progress.end();

        let filter = scope.filter();
        let titles = self.cache.titles(filter);
        let prompt = format!("{} documentation", scope.label());
        let selection = presenter.select(&prompt, &titles)?;

        self.on_selection(filter, selection, opener)
    }

    /// Resolves a pick made from `titles(filter)` and opens its page.
    ///
    /// Cancelled picks, stale indexes and failure entries open nothing.
    pub fn on_selection(
        &self,
        filter: Option<DocCategory>,
        selection: Selection,
        opener: &dyn LinkOpener,
    ) -> Result<Option<String>> {
        let index = match selection {
            Selection::Cancelled => return Ok(None),
            Selection::Chosen(index) => index,
        };

        let Some(url) = self.resolve_url(filter, index) else {
            return Ok(None);
        };

        opener.open(&url)?;
        Ok(Some(url))
    }

    /// The absolute URL behind position `index` of `titles(filter)`.
    pub fn resolve_url(&self, filter: Option<DocCategory>, index: usize) -> Option<String> {
        let Some(entry) = self.cache.resolve(filter, index) else {
            warn!("Selection {} is out of range", index);
            return None;
        };

        if entry.is_failure() {
            warn!("{} documentation is unavailable; see earlier errors", entry.category);
            return None;
        }

        let doc_type = self.config.doc_type(entry.category);
        Some(entry.absolute_url(&doc_type.doc_base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::doc::{TocEntry, RETRIEVAL_ERROR_TITLE};
    use crate::retrieval::testing::StubSource;
    use crate::ui::SilentProgress;

    const APEX_TOC: &str = r#"{"toc":[{"id":"apex_reference","children":[
        {"text":"Zeta","a_attr":{"href":"/z"},"children":[{"text":"m"}]},
        {"text":"Alpha","a_attr":{"href":"/a"},"children":[{"text":"m"}]}
    ]}]}"#;
    const VF_TOC: &str = r#"{"toc":[{"id":"pages_compref","children":[
        {"text":"apex:page","a_attr":{"href":"/page.htm"}}
    ]}]}"#;
    const CONSOLE_TOC: &str = r#"{"toc":[{"text":"Methods for Tabs","children":[
        {"text":"openPrimaryTab()","a_attr":{"href":"/tab.htm"}}
    ]}]}"#;

    fn config() -> Config {
        let mut config = Config::default();
        for category in DocCategory::ALL {
            let cfg = config.category_mut(category);
            cfg.toc_source_url = Some(format!("http://stub/{}", category.config_key()));
            cfg.doc_base_url = Some(format!("http://docs/{}", category.config_key()));
        }
        config
    }

    fn full_source() -> StubSource {
        StubSource::default()
            .with("http://stub/apex", APEX_TOC)
            .with("http://stub/visualforce", VF_TOC)
            .with("http://stub/service_console", CONSOLE_TOC)
    }

    struct ScriptedPresenter {
        selection: Selection,
        shown: RefCell<Vec<String>>,
    }

    impl ScriptedPresenter {
        fn new(selection: Selection) -> Self {
            Self {
                selection,
                shown: RefCell::new(Vec::new()),
            }
        }
    }

    impl Presenter for ScriptedPresenter {
        fn select(&self, _prompt: &str, items: &[String]) -> Result<Selection> {
            *self.shown.borrow_mut() = items.to_vec();
            Ok(self.selection)
        }
    }

    #[derive(Default)]
    struct RecordingOpener {
        opened: RefCell<Vec<String>>,
    }

    impl LinkOpener for RecordingOpener {
        fn open(&self, url: &str) -> Result<()> {
            self.opened.borrow_mut().push(url.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_retrieve_all_categories() {
        let coordinator =
            RetrievalCoordinator::new(config(), SharedCache::new(), Arc::new(full_source()));

        let outcomes = coordinator.retrieve(RetrievalScope::All).await;

        let categories: Vec<_> = outcomes.iter().map(|o| o.category).collect();
        assert_eq!(categories, DocCategory::ALL.to_vec());
        assert!(outcomes.iter().all(|o| !o.failed));
        assert_eq!(coordinator.cache().len(), 4);
    }

    #[tokio::test]
    async fn test_populated_category_is_not_fetched_again() {
        let source = Arc::new(full_source());
        let coordinator = RetrievalCoordinator::new(config(), SharedCache::new(), source.clone());

        let first = coordinator.retrieve(RetrievalScope::Category(DocCategory::Apex)).await;
        let count_after_first = coordinator.cache().len();
        let second = coordinator.retrieve(RetrievalScope::Category(DocCategory::Apex)).await;

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(coordinator.cache().len(), count_after_first);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_category_does_not_block_others() {
        let source = StubSource::default()
            .with("http://stub/apex", APEX_TOC)
            .with("http://stub/service_console", CONSOLE_TOC);
        let coordinator = RetrievalCoordinator::new(config(), SharedCache::new(), Arc::new(source));

        let outcomes = coordinator.retrieve(RetrievalScope::All).await;

        assert_eq!(outcomes.len(), 3);
        let vf = outcomes.iter().find(|o| o.category == DocCategory::Visualforce).unwrap();
        assert!(vf.failed);

        let cache = coordinator.cache();
        assert_eq!(cache.titles(Some(DocCategory::Apex)), vec!["Alpha", "Zeta"]);
        assert_eq!(cache.titles(Some(DocCategory::ServiceConsole)), vec!["openPrimaryTab()"]);
        assert_eq!(cache.titles(Some(DocCategory::Visualforce)), vec![RETRIEVAL_ERROR_TITLE]);
    }

    #[tokio::test]
    async fn test_all_scope_honours_configuration() {
        let mut config = config();
        config.category_mut(DocCategory::Visualforce).enabled = false;
        config
            .category_mut(DocCategory::ServiceConsole)
            .exclude_from_all_documentation_command = true;
        let source = Arc::new(full_source());
        let coordinator = RetrievalCoordinator::new(config, SharedCache::new(), source.clone());

        coordinator.retrieve(RetrievalScope::All).await;
        assert_eq!(coordinator.cache().snapshot().categories(), vec![DocCategory::Apex]);

        // An explicit request ignores the flags.
        coordinator
            .retrieve(RetrievalScope::Category(DocCategory::Visualforce))
            .await;
        assert!(coordinator.cache().is_populated(DocCategory::Visualforce));
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_prewarm_honours_per_category_flags() {
        let mut config = config();
        config.settings.refresh_cache_on_load = true;
        config.category_mut(DocCategory::Apex).refresh_cache_on_load = Some(false);
        let coordinator =
            RetrievalCoordinator::new(config, SharedCache::new(), Arc::new(full_source()));

        let outcomes = coordinator.prewarm().await;

        let categories: Vec<_> = outcomes.iter().map(|o| o.category).collect();
        assert_eq!(categories, vec![DocCategory::Visualforce, DocCategory::ServiceConsole]);
        assert!(!coordinator.cache().is_populated(DocCategory::Apex));
    }

    #[tokio::test]
    async fn test_browse_opens_selected_entry() {
        let coordinator =
            RetrievalCoordinator::new(config(), SharedCache::new(), Arc::new(full_source()));
        let presenter = ScriptedPresenter::new(Selection::Chosen(0));
        let opener = RecordingOpener::default();

        let opened = coordinator
            .browse(
                RetrievalScope::Category(DocCategory::Apex),
                &presenter,
                &SilentProgress,
                &opener,
            )
            .await
            .unwrap();

        assert_eq!(*presenter.shown.borrow(), vec!["Alpha", "Zeta"]);
        assert_eq!(opened.as_deref(), Some("http://docs/apex/a"));
        assert_eq!(*opener.opened.borrow(), vec!["http://docs/apex/a"]);
    }

    #[tokio::test]
    async fn test_browse_all_uses_global_positions() {
        let coordinator =
            RetrievalCoordinator::new(config(), SharedCache::new(), Arc::new(full_source()));
        let presenter = ScriptedPresenter::new(Selection::Chosen(1));
        let opener = RecordingOpener::default();

        let opened = coordinator
            .browse(RetrievalScope::All, &presenter, &SilentProgress, &opener)
            .await
            .unwrap();

        assert_eq!(
            *presenter.shown.borrow(),
            vec!["Alpha", "apex:page", "openPrimaryTab()", "Zeta"]
        );
        assert_eq!(opened.as_deref(), Some("http://docs/visualforce/page.htm"));
    }

    #[test]
    fn test_cancelled_selection_opens_nothing() {
        let cache = SharedCache::new();
        cache.append(TocEntry::new("Alpha", "/a", DocCategory::Apex));
        let coordinator = RetrievalCoordinator::new(config(), cache, Arc::new(StubSource::default()));
        let opener = RecordingOpener::default();

        let opened = coordinator
            .on_selection(Some(DocCategory::Apex), Selection::from_index(-1), &opener)
            .unwrap();

        assert!(opened.is_none());
        assert!(opener.opened.borrow().is_empty());
    }

    #[test]
    fn test_failure_entry_is_never_opened() {
        let cache = SharedCache::new();
        cache.append(TocEntry::failed(DocCategory::Apex, "offline"));
        let coordinator = RetrievalCoordinator::new(config(), cache, Arc::new(StubSource::default()));
        let opener = RecordingOpener::default();

        let opened = coordinator
            .on_selection(None, Selection::Chosen(0), &opener)
            .unwrap();

        assert!(opened.is_none());
        assert!(opener.opened.borrow().is_empty());
        assert!(coordinator.resolve_url(None, 0).is_none());
    }

    #[test]
    fn test_out_of_range_selection_opens_nothing() {
        let coordinator =
            RetrievalCoordinator::new(config(), SharedCache::new(), Arc::new(StubSource::default()));
        let opener = RecordingOpener::default();

        let opened = coordinator.on_selection(None, Selection::Chosen(3), &opener).unwrap();

        assert!(opened.is_none());
        assert!(opener.opened.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_prewarm_scope_cannot_be_browsed() {
        let coordinator =
            RetrievalCoordinator::new(config(), SharedCache::new(), Arc::new(StubSource::default()));
        let presenter = ScriptedPresenter::new(Selection::Cancelled);

        let result = coordinator
            .browse(RetrievalScope::Prewarm, &presenter, &SilentProgress, &RecordingOpener::default())
            .await;

        assert!(matches!(result, Err(Error::Invalid(_))));
    }
}
