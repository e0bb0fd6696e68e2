pub mod backend;
pub mod cli;
pub mod config;
pub mod export;
pub mod filter;
pub mod importer;
pub mod inventory;
pub mod logging;
pub mod parser;
pub mod preview;
pub mod schema;
pub mod ui;

pub use backend::{Backend, BackendError, Connection};
pub use cli::{Cli, Commands};
pub use ui::{Frontend, Phase, SilentUi, Ui, UiApp};
