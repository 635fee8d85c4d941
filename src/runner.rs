use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::{EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    types::{CallbackQuery, Message},
    Bot,
};
use tracing::instrument;

use crate::{
    database::{connection::RetrieveQuestion, question::OptionLetter},
    keyboard::{answers_keyboard, quiz_keyboard},
    render, HandlerResult,
};

#[instrument(level = "info", skip(bot, msg, connection))]
pub(crate) async fn quiz<Retriever: RetrieveQuestion>(
    bot: Bot,
    msg: Message,
    connection: Arc<Retriever>,
) -> HandlerResult {
    let categories = connection.categories().await?;
    if categories.is_empty() {
        bot.send_message(msg.chat.id, "There are no questions in the pool yet.")
            .await?;
        return Ok(());
    }

    bot.send_message(msg.chat.id, "Please choose the kind of question:")
        .reply_markup(quiz_keyboard(&categories))
        .await?;
    Ok(())
}

#[instrument(level = "info", skip(bot, q, connection))]
pub(crate) async fn random_question<Retriever: RetrieveQuestion>(
    bot: Bot,
    q: CallbackQuery,
    connection: Arc<Retriever>,
) -> HandlerResult {
    present_question(&bot, &q, None, connection.as_ref()).await
}

#[instrument(level = "info", skip(bot, q, connection))]
pub(crate) async fn category_question<Retriever: RetrieveQuestion>(
    bot: Bot,
    q: CallbackQuery,
    category: String,
    connection: Arc<Retriever>,
) -> HandlerResult {
    present_question(&bot, &q, Some(category.as_str()), connection.as_ref()).await
}

async fn present_question<Retriever: RetrieveQuestion>(
    bot: &Bot,
    q: &CallbackQuery,
    category: Option<&str>,
    connection: &Retriever,
) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;

    let (Some(chat_id), Some(message)) = (q.chat_id(), &q.message) else {
        return Ok(());
    };

    match connection.random_question(category).await? {
        Some(question) => {
            log::info!(
                "User {} gets question {} ({})",
                q.from.id,
                question.id,
                question.category
            );
            bot.edit_message_text(chat_id, message.id(), render::quiz_question(&question))
                .reply_markup(answers_keyboard(question.id))
                .await?;
        }
        None => {
            log::info!("User {}: no question for {:?}", q.from.id, category);
            bot.edit_message_text(
                chat_id,
                message.id(),
                "No question was found in this category.",
            )
            .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, q, connection))]
pub(crate) async fn take_answer<Retriever: RetrieveQuestion>(
    bot: Bot,
    q: CallbackQuery,
    (letter, question_id): (OptionLetter, i64),
    connection: Arc<Retriever>,
) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;

    let (Some(chat_id), Some(message)) = (q.chat_id(), &q.message) else {
        return Ok(());
    };

    let text = match connection.answer_info(question_id).await? {
        Some(info) => {
            log::info!(
                "User {} answers {} to question {}. Correctness: {}",
                q.from.id,
                letter,
                question_id,
                info.is_correct(letter)
            );
            let shown = message
                .regular_message()
                .and_then(|m| m.text())
                .unwrap_or_default();
            format!("{}\n\n{}", shown, render::answer_verdict(&info, letter))
        }
        None => {
            log::info!("Question {} is gone", question_id);
            "This question is no longer available.".to_owned()
        }
    };

    bot.edit_message_text(chat_id, message.id(), text).await?;
    Ok(())
}

/// Callback whose payload is unknown or no longer meaningful.
#[instrument(level = "debug", skip(bot, q))]
pub(crate) async fn stale_callback(bot: Bot, q: CallbackQuery) -> HandlerResult {
    log::debug!("Ignoring callback {:?} from {}", q.data, q.from.id);
    bot.answer_callback_query(&q.id).await?;
    Ok(())
}
