//! Payloads carried by inline buttons.
//!
//! Every payload is `tag` or `tag:body`. Only the first `:` separates the tag,
//! so a category label may contain any character.

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::database::question::OptionLetter;

/// Telegram rejects callback data longer than this many bytes.
pub const MAX_CALLBACK_DATA: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    /// Author picks the correct option while composing a question.
    CorrectOption(OptionLetter),
    /// Quiz on a question from the whole pool.
    Random,
    /// Quiz on a question from one category.
    Category(String),
    /// Player's answer to a presented question.
    Answer {
        letter: OptionLetter,
        question_id: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChoiceError {
    #[error("unknown payload tag in '{0}'")]
    UnknownTag(String),
    #[error("bad option letter in '{0}'")]
    BadLetter(String),
    #[error("bad question id in '{0}'")]
    BadQuestionId(String),
}

const CORRECT_OPTION: &str = "opt";
const RANDOM: &str = "rnd";
const CATEGORY: &str = "cat";
const ANSWER: &str = "ans";

impl Choice {
    /// Encoded payload, or `None` when it would not fit into a button.
    pub fn payload(&self) -> Option<String> {
        let encoded = self.to_string();
        (encoded.len() <= MAX_CALLBACK_DATA).then_some(encoded)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorrectOption(letter) => write!(f, "{CORRECT_OPTION}:{letter}"),
            Self::Random => f.write_str(RANDOM),
            Self::Category(label) => write!(f, "{CATEGORY}:{label}"),
            Self::Answer {
                letter,
                question_id,
            } => write!(f, "{ANSWER}:{letter}:{question_id}"),
        }
    }
}

impl FromStr for Choice {
    type Err = ChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, body) = match s.split_once(':') {
            Some((tag, body)) => (tag, Some(body)),
            None => (s, None),
        };
        let letter = |raw: &str| {
            raw.parse::<OptionLetter>()
                .map_err(|_| ChoiceError::BadLetter(s.to_owned()))
        };

        match (tag, body) {
            (RANDOM, None) => Ok(Self::Random),
            (CORRECT_OPTION, Some(body)) => Ok(Self::CorrectOption(letter(body)?)),
            (CATEGORY, Some(label)) => Ok(Self::Category(label.to_owned())),
            (ANSWER, Some(body)) => {
                let (raw_letter, raw_id) = body
                    .split_once(':')
                    .ok_or_else(|| ChoiceError::BadQuestionId(s.to_owned()))?;
                let question_id = raw_id
                    .parse()
                    .map_err(|_| ChoiceError::BadQuestionId(s.to_owned()))?;
                Ok(Self::Answer {
                    letter: letter(raw_letter)?,
                    question_id,
                })
            }
            _ => Err(ChoiceError::UnknownTag(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_keep_separators() {
        let choice = Choice::Category("World_History: 1900s".into());
        let encoded = choice.to_string();
        assert_eq!(encoded, "cat:World_History: 1900s");
        assert_eq!(encoded.parse::<Choice>(), Ok(choice));
    }

    #[test]
    fn answer_payload_carries_letter_and_id() {
        assert_eq!(
            "ans:B:42".parse::<Choice>(),
            Ok(Choice::Answer {
                letter: OptionLetter::B,
                question_id: 42
            })
        );
        assert_eq!(
            Choice::Answer {
                letter: OptionLetter::D,
                question_id: 7
            }
            .to_string(),
            "ans:D:7"
        );
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(matches!(
            "ans:E:1".parse::<Choice>(),
            Err(ChoiceError::BadLetter(_))
        ));
        assert!(matches!(
            "ans:A:x".parse::<Choice>(),
            Err(ChoiceError::BadQuestionId(_))
        ));
        assert!(matches!(
            "ans:A".parse::<Choice>(),
            Err(ChoiceError::BadQuestionId(_))
        ));
        assert!(matches!(
            "opt:".parse::<Choice>(),
            Err(ChoiceError::BadLetter(_))
        ));
        assert!(matches!(
            "rnd:extra".parse::<Choice>(),
            Err(ChoiceError::UnknownTag(_))
        ));
        assert!(matches!(
            "category_Geography".parse::<Choice>(),
            Err(ChoiceError::UnknownTag(_))
        ));
    }

    #[test]
    fn simple_payloads() {
        assert_eq!("rnd".parse::<Choice>(), Ok(Choice::Random));
        assert_eq!(
            "opt:C".parse::<Choice>(),
            Ok(Choice::CorrectOption(OptionLetter::C))
        );
        assert_eq!(
            "cat:".parse::<Choice>(),
            Ok(Choice::Category(String::new()))
        );
    }

    #[test]
    fn oversized_payload_is_not_offered() {
        assert!(Choice::Category("x".repeat(61)).payload().is_none());
        assert_eq!(
            Choice::Category("Geography".into()).payload().as_deref(),
            Some("cat:Geography")
        );
    }
}
