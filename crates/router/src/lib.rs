//! Multi-agent query routing.
//!
//! A question is rewritten, classified into an operating procedure and
//! answered by exactly one of three specialist agents:
//!
//! | label | specialist | tools |
//! |-------|------------|-------|
//! | `q-and-a` | Internal Q&A | file search |
//! | `fact-finding` | External fact finding | web search, code interpreter |
//! | anything else | General | none |
//!
//! # Example
//! ```no_run
//! use concierge_router::{AgentRegistry, OpenAiAgentRunner, QueryRouter, RouterConfig, WorkflowInput};
//! use concierge_core::AppConfig;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let router_config = RouterConfig::from(&config.router);
//! let registry = Arc::new(AgentRegistry::new(&router_config, &HashMap::new()));
//! let runner = Arc::new(OpenAiAgentRunner::new(concierge_llm::create_client(&config)?));
//! let router = QueryRouter::new(router_config, registry, runner);
//!
//! let result = router
//!     .run(&WorkflowInput::new("昨年の見積で粗利額の大きいものは？"), &CancellationToken::new())
//!     .await?;
//! println!("{}", result);
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod config;
pub mod router;
pub mod runner;
pub mod types;

pub use agents::{AgentDefinition, AgentId, AgentRegistry, ModelSettings};
pub use config::RouterConfig;
pub use router::QueryRouter;
pub use runner::{AgentRun, AgentRunner, OpenAiAgentRunner, RunMetadata};
pub use types::{
    Conversation, OperatingProcedure, Role, RunResult, Specialist, Stage, Turn, WorkflowInput,
};
