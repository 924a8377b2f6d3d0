use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use super::{
    auth::TokenKeys,
    config::Config,
    database::MongoStore,
    memory::MemoryStore,
    notifier::{LogNotifier, Notifier, SmtpNotifier},
    seed::seed_catalog,
    store::{CatalogStore, OrderStore, UserStore},
};

pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub orders: Arc<dyn OrderStore>,
    pub notifier: Arc<dyn Notifier>,
    pub tokens: TokenKeys,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let notifier: Arc<dyn Notifier> = match &config.mail {
            Some(mail) => Arc::new(SmtpNotifier::new(mail)?),
            None => Arc::new(LogNotifier),
        };

        let state = match &config.mongodb_uri {
            Some(uri) => {
                let store = Arc::new(MongoStore::connect(uri, &config.database_name).await?);
                Self::with_store(config, store, notifier)
            }
            None => Self::with_store(config, Arc::new(MemoryStore::new()), notifier),
        };

        if let Err(e) = seed_catalog(state.catalog.as_ref()).await {
            error!("Error initializing meals: {e}");
        }

        Ok(state)
    }

    /// One store serving all three record sets.
    pub fn with_store<S>(config: Config, store: Arc<S>, notifier: Arc<dyn Notifier>) -> Arc<Self>
    where
        S: UserStore + CatalogStore + OrderStore + 'static,
    {
        info!("Pricing orders from {:?}", config.pricing);

        Arc::new(Self {
            tokens: TokenKeys::new(&config.jwt_secret),
            config,
            users: store.clone(),
            catalog: store.clone(),
            orders: store,
            notifier,
        })
    }
}
