// Declare all our modules
mod client;
pub mod clock;
mod config;
mod error;
mod logging;
mod mask;
mod marker;
mod models;
pub mod notify;
pub mod parsers;
mod runner;
mod snapshot;

// Publicly export the parts of our library that users will need
pub use client::{NeworldClient, Portal};
pub use config::{Credentials, Settings};
pub use error::{CheckinError, Result};
pub use logging::init_tracing;
pub use marker::{FileMarkerStore, MarkerStore};
pub use mask::mask_email;
pub use models::*;
pub use notify::{LogNotifier, Notifier, TelegramNotifier};
pub use runner::{Outcome, Runner};
pub use snapshot::SnapshotWriter;
