//! Question submission dialogue.

use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::SendMessageSetters,
    prelude::Requester,
    types::{CallbackQuery, ChatId, Message, ReplyMarkup},
    Bot,
};
use tracing::instrument;

use crate::{
    config::Settings,
    database::{
        connection::{RegisterUser, RetrieveQuestion, RetrieveStats, StoreQuestion},
        error::StoreError,
        question::{OptionLetter, QuestionDraft, UserProfile},
    },
    keyboard::{categories_keyboard, correct_option_keyboard, NEW_CATEGORY},
    render,
    state::{Step, SubmissionState},
    HandlerResult, UserDialogue,
};

#[instrument(level = "info", skip(bot, dialogue, msg, settings, connection))]
pub(crate) async fn begin<DbConnection: RegisterUser + RetrieveStats>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    settings: Arc<Settings>,
    connection: Arc<DbConnection>,
) -> HandlerResult {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let profile = UserProfile::from(user);
    connection.ensure_user(&profile).await?;

    let stats = connection.user_stats(profile.id).await?;
    let Some(next) = SubmissionState::begin(&stats, &settings) else {
        log::info!(
            "User {} is at the question limit ({})",
            profile.id,
            settings.max_questions_per_user
        );
        bot.send_message(
            msg.chat.id,
            render::limit_reached(settings.max_questions_per_user),
        )
        .await?;
        return Ok(());
    };

    log::info!("User {} starts adding a question", profile.id);
    bot.send_message(msg.chat.id, render::question_text_prompt())
        .reply_markup(ReplyMarkup::kb_remove())
        .await?;
    dialogue.update(next).await?;
    Ok(())
}

/// Handles a free-text reply in any collecting step.
#[instrument(level = "info", skip(bot, dialogue, msg, settings, connection))]
pub(crate) async fn receive_text<DbConnection: RetrieveQuestion + StoreQuestion>(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    state: SubmissionState,
    settings: Arc<Settings>,
    connection: Arc<DbConnection>,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if matches!(state, SubmissionState::ReceiveCategory { .. }) && text == NEW_CATEGORY {
        bot.send_message(msg.chat.id, render::new_category_prompt())
            .reply_markup(ReplyMarkup::kb_remove())
            .await?;
        return Ok(());
    }

    match state.accept_text(text) {
        Step::Advanced(next) => {
            prompt(&bot, msg.chat.id, &next, connection.as_ref()).await?;
            dialogue.update(next).await?;
        }
        Step::DifficultyDefaulted(next) => {
            log::info!("Chat {}: unusable difficulty '{}'", msg.chat.id, text);
            bot.send_message(msg.chat.id, render::difficulty_defaulted())
                .await?;
            prompt(&bot, msg.chat.id, &next, connection.as_ref()).await?;
            dialogue.update(next).await?;
        }
        Step::Complete(draft) => {
            let Some(user) = msg.from.as_ref() else {
                return Ok(());
            };
            complete(
                &bot,
                &dialogue,
                msg.chat.id,
                user.id.0 as i64,
                draft,
                &settings,
                connection.as_ref(),
            )
            .await?;
        }
        Step::Ignored => {
            log::debug!("Chat {}: ignoring text '{}'", msg.chat.id, text);
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, q))]
pub(crate) async fn receive_correct_option(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    letter: OptionLetter,
    state: SubmissionState,
) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;

    match state.accept_correct_option(letter) {
        Step::Advanced(next) => {
            log::info!("User {} marks option {} as correct", q.from.id, letter);
            if let (Some(chat_id), Some(message)) = (q.chat_id(), &q.message) {
                bot.edit_message_text(chat_id, message.id(), render::explanation_prompt(letter))
                    .await?;
            }
            dialogue.update(next).await?;
        }
        _ => {
            log::debug!("User {} picked option {} outside the dialogue", q.from.id, letter);
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bot, dialogue, msg))]
pub(crate) async fn skip_explanation(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    state: SubmissionState,
) -> HandlerResult {
    match state.skip_explanation() {
        Step::Advanced(next) => {
            bot.send_message(msg.chat.id, render::difficulty_prompt())
                .await?;
            dialogue.update(next).await?;
        }
        _ => {
            log::debug!("Chat {}: nothing to skip", msg.chat.id);
        }
    }

    Ok(())
}

/// Sends the prompt that belongs to `state`.
async fn prompt<Retriever: RetrieveQuestion>(
    bot: &Bot,
    chat_id: ChatId,
    state: &SubmissionState,
    connection: &Retriever,
) -> HandlerResult {
    use SubmissionState::*;

    match state {
        ReceiveOptionA { .. } => {
            bot.send_message(chat_id, render::option_prompt(OptionLetter::A))
                .await?;
        }
        ReceiveOptionB { .. } => {
            bot.send_message(chat_id, render::option_prompt(OptionLetter::B))
                .await?;
        }
        ReceiveOptionC { .. } => {
            bot.send_message(chat_id, render::option_prompt(OptionLetter::C))
                .await?;
        }
        ReceiveOptionD { .. } => {
            bot.send_message(chat_id, render::option_prompt(OptionLetter::D))
                .await?;
        }
        ReceiveCorrectOption { draft } => {
            bot.send_message(chat_id, correct_option_text(draft))
                .reply_markup(correct_option_keyboard())
                .await?;
        }
        ReceiveDifficulty { .. } => {
            bot.send_message(chat_id, render::difficulty_prompt())
                .await?;
        }
        ReceiveCategory { .. } => {
            let categories = connection.categories().await?;
            if categories.is_empty() {
                bot.send_message(chat_id, render::category_prompt(false))
                    .await?;
            } else {
                bot.send_message(chat_id, render::category_prompt(true))
                    .reply_markup(categories_keyboard(&categories))
                    .await?;
            }
        }
        Idle | ReceiveQuestionText | ReceiveExplanation { .. } => {
            log::error!("No text prompt for {:?}", state);
        }
    }

    Ok(())
}

fn correct_option_text(draft: &QuestionDraft) -> String {
    let options = OptionLetter::ALL.map(|letter| draft.option(letter).unwrap_or_default());
    render::correct_option_prompt(draft.question_text.as_deref().unwrap_or_default(), &options)
}

async fn complete<Store: StoreQuestion>(
    bot: &Bot,
    dialogue: &UserDialogue,
    chat_id: ChatId,
    user_id: i64,
    draft: QuestionDraft,
    settings: &Settings,
    connection: &Store,
) -> HandlerResult {
    match connection
        .record_question(user_id, draft, settings.max_questions_per_user)
        .await
    {
        Ok(question) => {
            bot.send_message(chat_id, render::submission_summary(&question))
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
        }
        Err(StoreError::QuotaExceeded { limit, .. }) => {
            log::info!("User {} hit the question limit at commit", user_id);
            bot.send_message(chat_id, render::limit_reached(limit))
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
        }
        Err(e) => return Err(e.into()),
    }

    dialogue.exit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{
        connection::{
            tests::{in_memory, profile},
            RegisterUser, RetrieveQuestion, RetrieveStats, StoreQuestion,
        },
        question::Difficulty,
    };
    use crate::render::answer_verdict;

    fn feed(state: SubmissionState, text: &str) -> SubmissionState {
        match state.accept_text(text) {
            Step::Advanced(next) | Step::DifficultyDefaulted(next) => next,
            other => panic!("unexpected step {other:?}"),
        }
    }

    /// Walks the whole dialogue and returns the completed draft.
    fn compose(explanation: Option<&str>, difficulty: &str, category: &str) -> QuestionDraft {
        let mut state = SubmissionState::ReceiveQuestionText;
        for text in ["Capital of France?", "Paris", "Lyon", "Nice", "Marseille"] {
            state = feed(state, text);
        }
        let Step::Advanced(state) = state.accept_correct_option(OptionLetter::A) else {
            panic!("correct option rejected");
        };
        let state = match explanation {
            Some(text) => feed(state, text),
            None => match state.skip_explanation() {
                Step::Advanced(next) => next,
                other => panic!("unexpected step {other:?}"),
            },
        };
        let state = feed(state, difficulty);
        match state.accept_text(category) {
            Step::Complete(draft) => draft,
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[tokio::test]
    async fn submitted_question_can_be_quizzed() {
        let connection = in_memory().await;

        let stored = connection
            .record_question(1, compose(None, "3", "Geography"), 10)
            .await
            .unwrap();
        assert_eq!(stored.correct_option, OptionLetter::A);
        assert_eq!(stored.explanation, "");
        assert_eq!(stored.difficulty, Difficulty::new(3).unwrap());
        assert_eq!(stored.category, "Geography");
        assert_eq!(stored.options[0], "Paris");

        let drawn = connection
            .random_question(Some("Geography"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(drawn.id, stored.id);

        let info = connection.answer_info(drawn.id).await.unwrap().unwrap();
        assert_eq!(answer_verdict(&info, OptionLetter::A), "✅ Your answer is correct!");
        assert_eq!(
            answer_verdict(&info, OptionLetter::B),
            "❌ Your answer is wrong. Correct answer: A"
        );
    }

    #[tokio::test]
    async fn malformed_difficulty_is_stored_as_three() {
        let connection = in_memory().await;

        for input in ["9", "abc"] {
            let stored = connection
                .record_question(1, compose(Some("Because."), input, "Geography"), 10)
                .await
                .unwrap();
            assert_eq!(stored.difficulty.value(), 3);
            assert_eq!(stored.explanation, "Because.");
        }
    }

    #[tokio::test]
    async fn cancelled_draft_leaves_stats_unchanged() {
        let connection = in_memory().await;
        connection.ensure_user(&profile(1)).await.unwrap();

        let mut state = SubmissionState::ReceiveQuestionText;
        for text in ["Capital of France?", "Paris", "Lyon"] {
            state = feed(state, text);
        }
        assert_eq!(state.cancel(), Step::Advanced(SubmissionState::Idle));

        assert_eq!(connection.user_stats(1).await.unwrap().questions_added, 0);
        assert_eq!(connection.questions_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn user_at_the_limit_gets_no_draft() {
        let connection = in_memory().await;
        let settings = Settings::from_lookup(|name| match name {
            "TELOXIDE_TOKEN" => Some("123:abc".to_owned()),
            "MAX_QUESTIONS_PER_USER" => Some("1".to_owned()),
            _ => None,
        })
        .unwrap();

        let stats = connection.user_stats(1).await.unwrap();
        assert!(SubmissionState::begin(&stats, &settings).is_some());

        connection
            .record_question(1, compose(None, "3", "Geography"), settings.max_questions_per_user)
            .await
            .unwrap();
        let stats = connection.user_stats(1).await.unwrap();
        assert_eq!(SubmissionState::begin(&stats, &settings), None);
    }

    #[test]
    fn correct_option_prompt_lists_draft_options() {
        let draft = compose(None, "2", "Geography");
        let text = correct_option_text(&draft);
        assert!(text.starts_with("Question: Capital of France?"));
        assert!(text.contains("A) Paris\nB) Lyon\nC) Nice\nD) Marseille"));
    }
}
