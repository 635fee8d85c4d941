use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use teloxide::types::User;
use thiserror::Error;

use super::error::StoreError;

pub const DEFAULT_CATEGORY: &str = "General";

/// One of the four answer slots of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; 4] = [Self::A, Self::B, Self::C, Self::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not one of A, B, C, D")]
pub struct InvalidOptionLetter(pub String);

impl FromStr for OptionLetter {
    type Err = InvalidOptionLetter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            other => Err(InvalidOptionLetter(other.to_owned())),
        }
    }
}

/// Difficulty rating, always within 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Difficulty(u8);

impl Default for Difficulty {
    fn default() -> Self {
        Self(3)
    }
}

impl Difficulty {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Option<Self> {
        (i64::from(Self::MIN)..=i64::from(Self::MAX))
            .contains(&value)
            .then(|| Self(value as u8))
    }

    /// Parses user input. Anything that is not an integer in range yields the
    /// default and `false`. Non-ASCII decimal digits such as "۳" count too.
    pub fn parse_or_default(input: &str) -> (Self, bool) {
        match ascii_digits(input.trim()).parse::<i64>().ok().and_then(Self::new) {
            Some(difficulty) => (difficulty, true),
            None => (Self::default(), false),
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Five glyphs: filled stars for the rating, hollow ones for the rest.
    pub fn stars(&self) -> String {
        let filled = usize::from(self.0);
        format!("{}{}", "⭐".repeat(filled), "☆".repeat(5 - filled))
    }
}

/// First code point of each decimal digit run that maps onto 0-9.
const DECIMAL_ZEROS: &[u32] = &[
    0x0660, // Arabic-Indic
    0x06F0, // Extended Arabic-Indic (Persian, Urdu)
    0x07C0, // NKo
    0x0966, // Devanagari
    0x09E6, // Bengali
    0x0A66, // Gurmukhi
    0x0AE6, // Gujarati
    0x0B66, // Oriya
    0x0BE6, // Tamil
    0x0C66, // Telugu
    0x0CE6, // Kannada
    0x0D66, // Malayalam
    0x0E50, // Thai
    0x0ED0, // Lao
    0x0F20, // Tibetan
    0x1040, // Myanmar
    0x17E0, // Khmer
    0x1810, // Mongolian
    0xFF10, // Fullwidth
];

fn ascii_digits(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            let code = u32::from(c);
            DECIMAL_ZEROS
                .iter()
                .find(|&&zero| (zero..zero + 10).contains(&code))
                .and_then(|&zero| char::from_digit(code - zero, 10))
                .unwrap_or(c)
        })
        .collect()
}

/// Fields collected so far by a submission dialogue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    pub question_text: Option<String>,
    pub options: [Option<String>; 4],
    pub correct_option: Option<OptionLetter>,
    pub explanation: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
}

impl QuestionDraft {
    pub fn set_option(&mut self, letter: OptionLetter, text: impl Into<String>) {
        self.options[letter.index()] = Some(text.into());
    }

    pub fn option(&self, letter: OptionLetter) -> Option<&str> {
        self.options[letter.index()].as_deref()
    }
}

/// A fully validated question, ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub question_text: String,
    pub options: [String; 4],
    pub correct_option: OptionLetter,
    pub explanation: String,
    pub difficulty: Difficulty,
    pub category: String,
}

impl TryFrom<QuestionDraft> for NewQuestion {
    type Error = StoreError;

    fn try_from(draft: QuestionDraft) -> Result<Self, Self::Error> {
        let [a, b, c, d] = draft.options;
        Ok(Self {
            question_text: draft
                .question_text
                .ok_or(StoreError::MissingField("question_text"))?,
            options: [
                a.ok_or(StoreError::MissingField("option_a"))?,
                b.ok_or(StoreError::MissingField("option_b"))?,
                c.ok_or(StoreError::MissingField("option_c"))?,
                d.ok_or(StoreError::MissingField("option_d"))?,
            ],
            correct_option: draft
                .correct_option
                .ok_or(StoreError::MissingField("correct_option"))?,
            explanation: draft.explanation.unwrap_or_default(),
            difficulty: draft.difficulty.unwrap_or_default(),
            category: draft
                .category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_owned()),
        })
    }
}

/// A stored question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: i64,
    pub user_id: i64,
    pub question_text: String,
    pub options: [String; 4],
    pub correct_option: OptionLetter,
    pub explanation: String,
    pub difficulty: Difficulty,
    pub category: String,
    pub creation_date: NaiveDateTime,
}

/// What the answer check needs to know about a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerInfo {
    pub correct_option: OptionLetter,
    pub explanation: String,
}

impl AnswerInfo {
    pub fn is_correct(&self, selected: OptionLetter) -> bool {
        self.correct_option == selected
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub questions_added: i64,
}

/// Display fields of a Telegram account, as stored in `users`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0 as i64,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_accepts_only_one_to_five() {
        assert_eq!(Difficulty::parse_or_default("4"), (Difficulty(4), true));
        assert_eq!(Difficulty::parse_or_default(" 1 "), (Difficulty(1), true));
        assert_eq!(Difficulty::parse_or_default("9"), (Difficulty(3), false));
        assert_eq!(Difficulty::parse_or_default("0"), (Difficulty(3), false));
        assert_eq!(Difficulty::parse_or_default("-2"), (Difficulty(3), false));
        assert_eq!(Difficulty::parse_or_default("abc"), (Difficulty(3), false));
        assert_eq!(Difficulty::parse_or_default("2.5"), (Difficulty(3), false));
    }

    #[test]
    fn difficulty_accepts_other_decimal_digits() {
        assert_eq!(Difficulty::parse_or_default("۳"), (Difficulty(3), true));
        assert_eq!(Difficulty::parse_or_default("٥"), (Difficulty(5), true));
        assert_eq!(Difficulty::parse_or_default("２"), (Difficulty(2), true));
        assert_eq!(Difficulty::parse_or_default("۹"), (Difficulty(3), false));
        assert_eq!(Difficulty::parse_or_default("Ⅳ"), (Difficulty(3), false));
    }

    #[test]
    fn stars_always_have_five_glyphs() {
        assert_eq!(Difficulty(1).stars(), "⭐☆☆☆☆");
        assert_eq!(Difficulty(3).stars(), "⭐⭐⭐☆☆");
        assert_eq!(Difficulty(5).stars(), "⭐⭐⭐⭐⭐");
    }

    #[test]
    fn option_letter_rejects_lowercase_and_other_letters() {
        assert_eq!("C".parse::<OptionLetter>(), Ok(OptionLetter::C));
        assert!("c".parse::<OptionLetter>().is_err());
        assert!("E".parse::<OptionLetter>().is_err());
        assert!("".parse::<OptionLetter>().is_err());
    }

    #[test]
    fn draft_without_options_is_rejected() {
        let draft = QuestionDraft {
            question_text: Some("Capital of France?".into()),
            options: [Some("Paris".into()), Some("Lyon".into()), None, None],
            correct_option: Some(OptionLetter::A),
            ..Default::default()
        };

        let err = NewQuestion::try_from(draft).unwrap_err();
        assert!(matches!(err, StoreError::MissingField("option_c")));
    }

    #[test]
    fn draft_defaults_are_applied() {
        let mut draft = QuestionDraft {
            question_text: Some("Q".into()),
            correct_option: Some(OptionLetter::D),
            ..Default::default()
        };
        for letter in OptionLetter::ALL {
            draft.set_option(letter, letter.as_str());
        }

        let question = NewQuestion::try_from(draft).unwrap();
        assert_eq!(question.explanation, "");
        assert_eq!(question.difficulty.value(), 3);
        assert_eq!(question.category, DEFAULT_CATEGORY);
        assert_eq!(question.options[OptionLetter::B.index()], "B");
    }
}
