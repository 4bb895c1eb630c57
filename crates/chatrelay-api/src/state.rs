//! Application state wiring the relay service together.
//!
//! The relay service is generic over its sink and backend traits;
//! AppState pins them to the concrete infra implementations. Both
//! external dependencies can be absent: the sink then skips remote
//! appends, the completion backend is `None` and every reply degrades to
//! the apology. Either way the process serves traffic.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chatrelay_core::conversation::ConversationStore;
use chatrelay_core::relay::RelayService;
use chatrelay_infra::llm::OpenAiCompletion;
use chatrelay_infra::sheets::SheetLogger;
use chatrelay_types::config::{CorsConfig, RelayConfig};

/// Concrete type alias for the relay service pinned to infra implementations.
pub type ConcreteRelayService = RelayService<SheetLogger, OpenAiCompletion>;

/// Shared application state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<ConcreteRelayService>,
    pub static_dir: PathBuf,
    pub cors: CorsConfig,
}

impl AppState {
    /// Wire the relay from configuration (consumed: secrets move into
    /// their services).
    pub fn init(config: RelayConfig) -> Self {
        let store = ConversationStore::new(
            config.conversation.max_conversations,
            Duration::from_secs(config.conversation.idle_ttl_secs),
        );

        let log = Arc::new(SheetLogger::from_config(config.sheets));
        if log.is_configured() {
            tracing::info!("sheet logging enabled");
        }

        let completion = OpenAiCompletion::from_config(&config.completion).map(Arc::new);
        if let Some(backend) = &completion {
            tracing::info!(model = backend.model(), "completion backend ready");
        }

        let relay = Arc::new(RelayService::new(store, log, completion));

        Self {
            relay,
            static_dir: PathBuf::from(config.server.static_dir),
            cors: config.cors,
        }
    }
}
