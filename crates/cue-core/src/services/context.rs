//! Explicitly constructed application services.

use std::sync::Arc;

use crate::sync::{AutoSyncScheduler, EngineOptions, EventBus, RemoteGateway, SyncEngine};
use crate::Result;

use super::DatabaseService;

/// Root of the service graph: one database, one event bus, one engine
#[derive(Clone)]
pub struct AppContext {
    pub database: DatabaseService,
    pub events: EventBus,
    pub engine: SyncEngine,
}

impl AppContext {
    pub async fn new(database: DatabaseService, gateway: Arc<dyn RemoteGateway>) -> Result<Self> {
        Self::with_options(database, gateway, EngineOptions::default()).await
    }

    pub async fn with_options(
        database: DatabaseService,
        gateway: Arc<dyn RemoteGateway>,
        options: EngineOptions,
    ) -> Result<Self> {
        let events = EventBus::new();
        let store = Arc::new(database.clone());
        let engine =
            SyncEngine::with_options(gateway, store.clone(), store, events.clone(), options)
                .await?;
        Ok(Self {
            database,
            events,
            engine,
        })
    }

    /// Scheduler bound to this context's engine; call `start` to run it
    pub fn scheduler(&self) -> AutoSyncScheduler {
        AutoSyncScheduler::new(self.engine.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::test_support::{sample_timelines, video, FakeGateway};
    use crate::sync::{SyncEvent, SyncOutcome};
    use tokio_util::sync::CancellationToken;

    #[tokio::test(flavor = "multi_thread")]
    async fn context_wires_engine_to_shared_bus_and_database() {
        let database = DatabaseService::open_in_memory().await.unwrap();
        let gateway = Arc::new(FakeGateway::new());
        let context = AppContext::new(database, gateway.clone()).await.unwrap();
        let v = video("ctx");
        context
            .database
            .save_annotations(&v, &sample_timelines())
            .await
            .unwrap();
        let mut events = context.events.subscribe();

        context
            .engine
            .synchronize(&v, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            SyncEvent::SyncCompleted {
                video_id: v.clone(),
                outcome: SyncOutcome::PushedLocal
            }
        );
        assert_eq!(context.engine.known_videos().await.unwrap(), vec![v]);
    }
}
