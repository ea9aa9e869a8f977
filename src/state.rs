use std::sync::Arc;

use tracing::info;

use crate::{
    config::Config,
    database::init_redis,
    friends::FriendGraph,
    notify::Notifier,
    posts::PostEngine,
    realtime::RealtimeRegistry,
    search::{MemoryIndex, SearchIndex, init_meilisearch},
    store::{DocumentStore, MemoryStore, RedisStore},
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub search: Arc<dyn SearchIndex>,
    pub registry: RealtimeRegistry,
    pub notifier: Notifier,
    pub friends: FriendGraph,
    pub posts: PostEngine,
}

impl State {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let (store, search): (Arc<dyn DocumentStore>, Arc<dyn SearchIndex>) = if config.standalone
        {
            info!("Standalone mode: in-memory store and search");
            (Arc::new(MemoryStore::new()), Arc::new(MemoryIndex::new()))
        } else {
            let redis_connection = init_redis(&config.redis_url).await;
            let search = init_meilisearch(&config.meili_url, &config.meili_key).await;
            (Arc::new(RedisStore::new(redis_connection)), Arc::new(search))
        };

        Self::assemble(config, store, search)
    }

    /// Wires the domain components over the given backends. Tests assemble
    /// a state directly over the in-memory implementations.
    pub fn assemble(
        config: Config,
        store: Arc<dyn DocumentStore>,
        search: Arc<dyn SearchIndex>,
    ) -> Arc<Self> {
        let registry = RealtimeRegistry::new();
        let notifier = Notifier::new(store.clone(), registry.clone());
        let friends = FriendGraph::new(store.clone(), notifier.clone());
        let posts = PostEngine::new(store.clone(), search.clone(), notifier.clone());

        Arc::new(Self {
            config,
            store,
            search,
            registry,
            notifier,
            friends,
            posts,
        })
    }
}
