use std::{ops::ControlFlow, sync::Arc};

use teloxide::{
    dispatching::{dialogue::InMemStorage, UpdateFilterExt, UpdateHandler},
    dptree::{self, di::DependencySupplier},
    prelude::{DependencyMap, Requester},
    types::{CallbackQuery, ChatId, Message, Update},
    Bot,
};
use tracing::instrument;

use crate::{
    callback::Choice,
    commands::{self, Command},
    constructor,
    database::connection::Connection,
    render, runner,
    state::SubmissionState,
    BoxError, HandlerResult, UserDialogue,
};

/// Dispatch tree for every update the bot receives.
pub fn schema() -> UpdateHandler<BoxError> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(commands::start::<Connection>))
        .branch(case![Command::Help].endpoint(commands::help))
        .branch(case![Command::Stats].endpoint(commands::stats::<Connection>))
        .branch(case![Command::Categories].endpoint(commands::categories::<Connection>))
        .branch(case![Command::AddQuestion].endpoint(constructor::begin::<Connection>))
        .branch(case![Command::Quiz].endpoint(runner::quiz::<Connection>))
        .branch(case![Command::Skip].endpoint(constructor::skip_explanation))
        .branch(case![Command::Cancel].endpoint(commands::cancel));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(constructor_scheme())
        .endpoint(invalid_state);

    let callback_handler = Update::filter_callback_query()
        .branch(choice_scheme())
        .endpoint(runner::stale_callback);

    reply_on_failure().chain(
        enter_user_dialogue()
            .branch(message_handler)
            .branch(callback_handler),
    )
}

/// Drafts are stored per sender, so members of a shared chat never advance
/// each other's dialogue.
pub(crate) fn dialogue_key(update: &Update) -> Option<ChatId> {
    update.from().map(|user| ChatId::from(user.id))
}

/// Injects the sender's `UserDialogue` and its current `SubmissionState`.
fn enter_user_dialogue() -> UpdateHandler<BoxError> {
    dptree::filter_map(
        |storage: Arc<InMemStorage<SubmissionState>>, update: Update| {
            dialogue_key(&update).map(|key| UserDialogue::new(storage, key))
        },
    )
    .filter_map_async(|dialogue: UserDialogue| async move {
        match dialogue.get_or_default().await {
            Ok(state) => Some(state),
            Err(err) => {
                log::error!("Failed to read the dialogue of {}: {:?}", dialogue.chat_id(), err);
                None
            }
        }
    })
}

#[instrument(level = "debug")]
fn constructor_scheme() -> UpdateHandler<BoxError> {
    log::debug!("Building a dispatch tree for the constructor");
    dptree::filter(|msg: Message, state: SubmissionState| {
        state.expects_text() && msg.text().is_some_and(|text| !text.starts_with('/'))
    })
    .endpoint(constructor::receive_text::<Connection>)
}

#[instrument(level = "debug")]
fn choice_scheme() -> UpdateHandler<BoxError> {
    use dptree::case;
    log::debug!("Building a dispatch tree for callback queries");
    dptree::filter_map(|q: CallbackQuery| {
        q.data
            .as_deref()
            .and_then(|data| data.parse::<Choice>().ok())
    })
    .branch(case![Choice::CorrectOption(letter)].endpoint(constructor::receive_correct_option))
    .branch(case![Choice::Random].endpoint(runner::random_question::<Connection>))
    .branch(case![Choice::Category(category)].endpoint(runner::category_question::<Connection>))
    .branch(
        case![Choice::Answer {
            letter,
            question_id
        }]
        .endpoint(runner::take_answer::<Connection>),
    )
}

/// Catches handler errors: logs them and tells the user something went
/// wrong. Dialogue state is left as it was.
fn reply_on_failure() -> UpdateHandler<BoxError> {
    dptree::from_fn(|deps: DependencyMap, cont| async move {
        let update: Arc<Update> = deps.get();
        let bot: Arc<Bot> = deps.get();

        match cont(deps).await {
            ControlFlow::Break(Err(err)) => {
                tracing::error!(error = ?err, update_id = ?update.id, "Exception while handling an update");
                let reply = match update.chat() {
                    Some(chat) => bot
                        .send_message(chat.id, render::GENERIC_FAILURE)
                        .await
                        .map(|_| ())
                        .map_err(BoxError::from),
                    None => Ok(()),
                };
                ControlFlow::Break(reply)
            }
            flow => flow,
        }
    })
}

async fn invalid_state(msg: Message, state: SubmissionState) -> HandlerResult {
    log::debug!(
        "Chat {}: ignoring {:?} in state {:?}",
        msg.chat.id,
        msg.text(),
        state
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn group_message(user_id: u64, text: &str) -> Update {
        serde_json::from_str(
            &json!({
            "update_id": user_id,
            "message": {
                "message_id": user_id,
                "date": 1_700_000_000,
                "chat": { "id": -100, "type": "group", "title": "Quiz night" },
                "from": { "id": user_id, "is_bot": false, "first_name": "Player" },
                "text": text
            }
        })
            .to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn group_members_keep_separate_drafts() {
        let storage = InMemStorage::<SubmissionState>::new();
        let first = dialogue_key(&group_message(1, "/add_question")).unwrap();
        let second = dialogue_key(&group_message(2, "Capital of France?")).unwrap();
        assert_eq!(first, ChatId(1));
        assert_eq!(second, ChatId(2));

        UserDialogue::new(storage.clone(), first)
            .update(SubmissionState::ReceiveQuestionText)
            .await
            .unwrap();

        let other = UserDialogue::new(storage.clone(), second);
        assert_eq!(other.get_or_default().await.unwrap(), SubmissionState::Idle);
        let own = UserDialogue::new(storage, first);
        assert_eq!(
            own.get_or_default().await.unwrap(),
            SubmissionState::ReceiveQuestionText
        );
    }
}
