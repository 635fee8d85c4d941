use std::sync::Arc;

use dotenvy::dotenv;
use quizpoolbot::{schema::schema, state::SubmissionState, Connection, Settings};
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let settings = match Settings::from_env() {
        Ok(settings) => Arc::new(settings),
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from_level(settings.log_level))
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_line_number(true)
        .with_target(false)
        .init();

    if !settings.admin_ids.is_empty() {
        log::debug!("{} admin ids configured", settings.admin_ids.len());
    }

    let connection = match Connection::connect(&settings.database_url).await {
        Ok(connection) => Arc::new(connection),
        Err(e) => {
            log::error!("Failed to open {}: {}", settings.database_url, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = connection.run_migrations().await {
        log::error!("Failed to prepare the database: {}", e);
        std::process::exit(1);
    }

    let bot = Bot::new(&settings.token);
    log::info!("Starting bot...");

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![
            InMemStorage::<SubmissionState>::new(),
            connection,
            settings.clone()
        ])
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build();

    if let Some(webhook) = settings.webhook.clone() {
        let listener = match webhooks::axum(bot, Options::new(webhook.addr, webhook.url)).await {
            Ok(listener) => listener,
            Err(e) => {
                log::error!("Failed to build a webhook listener: {}", e);
                std::process::exit(1);
            }
        };
        dispatcher
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await
    } else {
        dispatcher.dispatch().await
    }
}
