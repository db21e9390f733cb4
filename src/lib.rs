#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod browse;
pub mod commands;
pub mod config;
pub mod error;
pub mod gate;
pub mod model;
pub mod providers;
pub mod render;
pub mod resolve;
pub mod sites;
pub mod store;

pub use commands::{CommandService, IncomingMessage, SearchReply};
pub use config::Config;
pub use error::{FicscoutError, Result};
pub use model::NormalizedResult;
pub use resolve::Family;
