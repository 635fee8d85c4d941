use crate::{
    config::Settings,
    database::question::{Difficulty, OptionLetter, QuestionDraft, UserStats},
};

/// Where a user is in the question submission dialogue. Each collecting step
/// carries the fields gathered before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    ReceiveQuestionText,
    ReceiveOptionA {
        draft: QuestionDraft,
    },
    ReceiveOptionB {
        draft: QuestionDraft,
    },
    ReceiveOptionC {
        draft: QuestionDraft,
    },
    ReceiveOptionD {
        draft: QuestionDraft,
    },
    ReceiveCorrectOption {
        draft: QuestionDraft,
    },
    ReceiveExplanation {
        draft: QuestionDraft,
    },
    ReceiveDifficulty {
        draft: QuestionDraft,
    },
    ReceiveCategory {
        draft: QuestionDraft,
    },
}

/// Outcome of feeding one event into the dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Advanced(SubmissionState),
    /// Difficulty input was unusable and the default was stored instead.
    DifficultyDefaulted(SubmissionState),
    Complete(QuestionDraft),
    /// The event does not fit the current step.
    Ignored,
}

impl SubmissionState {
    pub fn is_collecting(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// Opens a new draft, replacing any draft in progress. Users at the
    /// question limit get `None`.
    pub fn begin(stats: &UserStats, settings: &Settings) -> Option<Self> {
        settings
            .has_quota_left(stats.questions_added)
            .then_some(Self::ReceiveQuestionText)
    }

    /// Drops the draft. Nothing is persisted.
    pub fn cancel(self) -> Step {
        if self.is_collecting() {
            Step::Advanced(Self::Idle)
        } else {
            Step::Ignored
        }
    }

    /// Steps that take a plain text reply.
    pub fn expects_text(&self) -> bool {
        !matches!(self, Self::Idle | Self::ReceiveCorrectOption { .. })
    }

    pub fn accept_text(self, text: &str) -> Step {
        use SubmissionState::*;

        match self {
            Idle | ReceiveCorrectOption { .. } => Step::Ignored,
            ReceiveQuestionText => Step::Advanced(ReceiveOptionA {
                draft: QuestionDraft {
                    question_text: Some(text.to_owned()),
                    ..Default::default()
                },
            }),
            ReceiveOptionA { mut draft } => {
                draft.set_option(OptionLetter::A, text);
                Step::Advanced(ReceiveOptionB { draft })
            }
            ReceiveOptionB { mut draft } => {
                draft.set_option(OptionLetter::B, text);
                Step::Advanced(ReceiveOptionC { draft })
            }
            ReceiveOptionC { mut draft } => {
                draft.set_option(OptionLetter::C, text);
                Step::Advanced(ReceiveOptionD { draft })
            }
            ReceiveOptionD { mut draft } => {
                draft.set_option(OptionLetter::D, text);
                Step::Advanced(ReceiveCorrectOption { draft })
            }
            ReceiveExplanation { mut draft } => {
                draft.explanation = Some(text.to_owned());
                Step::Advanced(ReceiveDifficulty { draft })
            }
            ReceiveDifficulty { mut draft } => {
                let (difficulty, valid) = Difficulty::parse_or_default(text);
                draft.difficulty = Some(difficulty);
                let next = ReceiveCategory { draft };
                if valid {
                    Step::Advanced(next)
                } else {
                    Step::DifficultyDefaulted(next)
                }
            }
            ReceiveCategory { mut draft } => {
                draft.category = Some(text.to_owned());
                Step::Complete(draft)
            }
        }
    }

    pub fn accept_correct_option(self, letter: OptionLetter) -> Step {
        match self {
            Self::ReceiveCorrectOption { mut draft } => {
                draft.correct_option = Some(letter);
                Step::Advanced(Self::ReceiveExplanation { draft })
            }
            _ => Step::Ignored,
        }
    }

    pub fn skip_explanation(self) -> Step {
        match self {
            Self::ReceiveExplanation { mut draft } => {
                draft.explanation = Some(String::new());
                Step::Advanced(Self::ReceiveDifficulty { draft })
            }
            _ => Step::Ignored,
        }
    }
}
