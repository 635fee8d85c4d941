use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{Message, ReplyMarkup},
    utils::command::BotCommands,
    Bot,
};
use tracing::instrument;

use crate::{
    config::Settings,
    database::{
        connection::{RegisterUser, RetrieveQuestion, RetrieveStats},
        question::UserProfile,
    },
    render,
    state::{Step, SubmissionState},
    HandlerResult, UserDialogue,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "snake_case", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "register and show the welcome message.")]
    Start,
    #[command(description = "display help.")]
    Help,
    #[command(description = "show how many questions you added.")]
    Stats,
    #[command(description = "list the known categories.")]
    Categories,
    #[command(description = "add a new question.")]
    AddQuestion,
    #[command(description = "answer a random question.")]
    Quiz,
    #[command(description = "skip the optional explanation.")]
    Skip,
    #[command(description = "cancel adding a question.")]
    Cancel,
}

#[instrument(level = "info", skip(bot, msg, connection))]
pub(crate) async fn start<Registry: RegisterUser>(
    bot: Bot,
    msg: Message,
    connection: Arc<Registry>,
) -> HandlerResult {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    connection.ensure_user(&UserProfile::from(user)).await?;

    bot.send_message(msg.chat.id, render::welcome(&user.first_name))
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, msg))]
pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(
        msg.chat.id,
        format!(
            "📚 Help:\n\n{}\n\n⚠️ Notes:\n\
             - you can add an explanation to your questions\n\
             - you can rate the difficulty of your questions\n\n{}",
            render::command_list(),
            Command::descriptions()
        ),
    )
    .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, msg, settings, connection))]
pub(crate) async fn stats<Stats: RetrieveStats>(
    bot: Bot,
    msg: Message,
    settings: Arc<Settings>,
    connection: Arc<Stats>,
) -> HandlerResult {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let stats = connection.user_stats(user.id.0 as i64).await?;
    let total = connection.questions_count().await?;

    bot.send_message(
        msg.chat.id,
        render::stats(stats.questions_added, total, settings.max_questions_per_user),
    )
    .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, msg, connection))]
pub(crate) async fn categories<Retriever: RetrieveQuestion>(
    bot: Bot,
    msg: Message,
    connection: Arc<Retriever>,
) -> HandlerResult {
    let categories = connection.categories().await?;
    bot.send_message(msg.chat.id, render::categories(&categories))
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, msg))]
pub(crate) async fn cancel(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    state: SubmissionState,
) -> HandlerResult {
    match state.cancel() {
        Step::Advanced(next) => {
            log::info!("Chat {} cancels adding a question", msg.chat.id);
            bot.send_message(msg.chat.id, "Adding the question was cancelled.")
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            dialogue.update(next).await?;
        }
        _ => {
            log::debug!("Nothing to cancel in chat {}", msg.chat.id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use teloxide::utils::command::BotCommands;

    use super::Command;

    #[test]
    fn commands_use_snake_case() {
        assert!(matches!(
            Command::parse("/add_question", "quizbot"),
            Ok(Command::AddQuestion)
        ));
        assert!(matches!(Command::parse("/skip", "quizbot"), Ok(Command::Skip)));
        assert!(Command::parse("/addquestion", "quizbot").is_err());
    }
}
