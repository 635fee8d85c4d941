use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::{callback::Choice, database::question::OptionLetter};

/// How many categories are offered as buttons at once.
pub(crate) const MAX_CATEGORY_BUTTONS: usize = 5;

pub(crate) const NEW_CATEGORY: &str = "New category🆕";
pub(crate) const RANDOM_QUESTION: &str = "Random question🎲";

fn choice_button(text: impl Into<String>, choice: &Choice) -> Option<InlineKeyboardButton> {
    match choice.payload() {
        Some(payload) => Some(InlineKeyboardButton::callback(text, payload)),
        None => {
            log::debug!("Dropping button {choice}: payload too long");
            None
        }
    }
}

fn letter_keyboard(choice: impl Fn(OptionLetter) -> Choice) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = OptionLetter::ALL
        .into_iter()
        .filter_map(|letter| choice_button(letter.as_str(), &choice(letter)))
        .map(|button| vec![button])
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}

pub(crate) fn correct_option_keyboard() -> InlineKeyboardMarkup {
    letter_keyboard(Choice::CorrectOption)
}

pub(crate) fn answers_keyboard(question_id: i64) -> InlineKeyboardMarkup {
    letter_keyboard(|letter| Choice::Answer {
        letter,
        question_id,
    })
}

/// Known categories as reply shortcuts plus an escape for typing a new one.
pub(crate) fn categories_keyboard(categories: &[String]) -> KeyboardMarkup {
    let mut keyboard: Vec<Vec<KeyboardButton>> = categories
        .iter()
        .take(MAX_CATEGORY_BUTTONS)
        .map(|category| vec![KeyboardButton::new(category)])
        .collect();
    keyboard.push(vec![KeyboardButton::new(NEW_CATEGORY)]);

    KeyboardMarkup::new(keyboard)
        .one_time_keyboard()
        .resize_keyboard()
}

pub(crate) fn quiz_keyboard(categories: &[String]) -> InlineKeyboardMarkup {
    let mut buttons: Vec<InlineKeyboardButton> =
        choice_button(RANDOM_QUESTION, &Choice::Random).into_iter().collect();
    buttons.extend(
        categories
            .iter()
            .filter_map(|category| choice_button(category, &Choice::Category(category.clone())))
            .take(MAX_CATEGORY_BUTTONS),
    );

    InlineKeyboardMarkup::new(buttons.into_iter().map(|button| vec![button]))
}
