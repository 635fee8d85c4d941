use state::SubmissionState;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::Dialogue};

pub mod callback;
pub mod commands;
pub mod config;
pub mod constructor;
pub mod database;
pub mod keyboard;
pub mod render;
pub mod runner;
pub mod schema;
pub mod state;

pub use config::Settings;
pub use database::connection::Connection;

pub type UserDialogue = Dialogue<SubmissionState, InMemStorage<SubmissionState>>;
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type HandlerResult = Result<(), BoxError>;
