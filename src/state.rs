use crate::agents::Collaborators;
use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::knowledge::{HashedEmbedder, KnowledgeIndex};
use crate::persistence::{DocumentStore, FsDocumentStore};
use crate::tools::ToolHandler;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Application state shared across all request handlers.
/// Everything here is read-only after startup; requests never share mutable state.
pub struct AppState {
    pub index: Arc<KnowledgeIndex>,
    /// Handlers reachable through `/invoke`, one per action group.
    pub tools: Vec<Arc<dyn ToolHandler>>,
    pub coordinator: Arc<Coordinator>,
    pub store: Arc<dyn DocumentStore>,
    /// Set once the index and collaborators are assembled.
    pub ready: AtomicBool,
    pub config: Arc<Config>,
}

impl AppState {
    /// Initialize application state.
    ///
    /// Reference files under `knowledge_dir` are chunked and indexed before
    /// the service reports ready. Without a directory the index starts empty
    /// and every owner lookup answers with the not-found text.
    pub fn new(config: Config) -> Result<Self> {
        let embedder = HashedEmbedder::new(config.embedding_dim);
        let index = match &config.knowledge_dir {
            Some(dir) => KnowledgeIndex::load_dir(embedder, dir)?,
            None => {
                tracing::warn!("KNOWLEDGE_DIR not set, starting with an empty knowledge index");
                KnowledgeIndex::empty(embedder)
            }
        };

        let store: Arc<dyn DocumentStore> = Arc::new(FsDocumentStore::new(&config.storage_root));
        Ok(Self::with_index(config, index, store))
    }

    /// Assemble state around an already built index.
    pub fn with_index(config: Config, index: KnowledgeIndex, store: Arc<dyn DocumentStore>) -> Self {
        let index = Arc::new(index);
        let collaborators = Collaborators::standard(&config, Arc::clone(&index));

        let tools: Vec<Arc<dyn ToolHandler>> = vec![
            collaborators.log_analysis.tool(),
            collaborators.resource_analysis.tool(),
            collaborators.knowledge_search.tool(),
        ];
        let coordinator = Coordinator::new(
            collaborators,
            config.collaborator_timeout,
            config.max_past_issues,
        );

        let state = Self {
            index,
            tools,
            coordinator: Arc::new(coordinator),
            store,
            ready: AtomicBool::new(false),
            config: Arc::new(config),
        };
        state.ready.store(true, Ordering::SeqCst);
        state
    }

    /// Why the service cannot serve investigations yet, if it cannot.
    pub fn readiness(&self) -> std::result::Result<(), &'static str> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err("state not initialized");
        }
        if self.config.knowledge_dir.is_some() && self.index.service_count() == 0 {
            return Err("knowledge directory produced no service records");
        }
        Ok(())
    }
}
