//! Command handlers for the Concierge CLI.

pub mod chat;
pub mod clock;
pub mod finetune;
pub mod models;
pub mod route;
pub mod translate;

pub use chat::ChatCommand;
pub use clock::ClockCommand;
pub use finetune::FineTuneCommand;
pub use models::ModelsCommand;
pub use route::RouteCommand;
pub use translate::TranslateCommand;
