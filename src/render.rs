use crate::database::question::{AnswerInfo, OptionLetter, Question};

pub(crate) const GENERIC_FAILURE: &str = "⚠️ An error occurred. Please try again.";

pub(crate) fn option_list<S: AsRef<str>>(options: &[S; 4]) -> String {
    OptionLetter::ALL
        .iter()
        .zip(options)
        .map(|(letter, text)| format!("{letter}) {}", text.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn limit_reached(limit: i64) -> String {
    format!(
        "You have reached the maximum number of questions ({limit}). \
         Contact an administrator to add more."
    )
}

pub(crate) fn question_text_prompt() -> &'static str {
    "📝 Please send the text of your question.\n\nExample: 'What is the capital of France?'"
}

pub(crate) fn option_prompt(letter: OptionLetter) -> String {
    format!("Send option {letter}:")
}

pub(crate) fn correct_option_prompt(question_text: &str, options: &[&str; 4]) -> String {
    format!(
        "Question: {question_text}\n\n{}\n\nPlease choose the correct option:",
        option_list(options)
    )
}

pub(crate) fn explanation_prompt(letter: OptionLetter) -> String {
    format!(
        "Option {letter} was selected as the correct answer.\n\n\
         Would you like to add an explanation for this question? (optional)\n\n\
         If not, send /skip."
    )
}

pub(crate) fn difficulty_prompt() -> &'static str {
    "Rate the difficulty of the question from 1 to 5:\n\n\
     1 - very easy\n\
     2 - easy\n\
     3 - medium\n\
     4 - hard\n\
     5 - very hard\n\n\
     Default: 3"
}

pub(crate) fn difficulty_defaulted() -> &'static str {
    "Please enter a number between 1 and 5. Difficulty was set to 3."
}

pub(crate) fn category_prompt(has_shortcuts: bool) -> &'static str {
    if has_shortcuts {
        "Please pick a category or choose 'New category':"
    } else {
        "Please send the category of this question.\n\nExample: 'Geography' or 'Math'"
    }
}

pub(crate) fn new_category_prompt() -> &'static str {
    "Send the name of the new category:"
}

pub(crate) fn submission_summary(question: &Question) -> String {
    let explanation = if question.explanation.is_empty() {
        "no explanation"
    } else {
        question.explanation.as_str()
    };
    format!(
        "✅ Your question was saved!\n\n\
         📝 Question: {}\n\n\
         🔹 Options:\n{}\n\n\
         ✅ Correct answer: {}\n\
         📖 Explanation: {explanation}\n\
         ⚡ Difficulty: {}\n\
         🏷 Category: {}\n\n\
         🙏 Thanks for contributing!",
        question.question_text,
        option_list(&question.options),
        question.correct_option,
        question.difficulty.stars(),
        question.category,
    )
}

pub(crate) fn quiz_question(question: &Question) -> String {
    format!(
        "📝 Question:\n{}\n\n{}\n\n🏷 Category: {}\n⚡ Difficulty: {}",
        question.question_text,
        option_list(&question.options),
        question.category,
        question.difficulty.stars(),
    )
}

pub(crate) fn answer_verdict(info: &AnswerInfo, selected: OptionLetter) -> String {
    let verdict = if info.is_correct(selected) {
        "✅ Your answer is correct!".to_owned()
    } else {
        format!(
            "❌ Your answer is wrong. Correct answer: {}",
            info.correct_option
        )
    };

    if info.explanation.is_empty() {
        verdict
    } else {
        format!("{verdict}\n\n📖 Explanation:\n{}", info.explanation)
    }
}

pub(crate) fn welcome(first_name: &str) -> String {
    format!(
        "👋 Hello {first_name}!\n\n\
         Welcome to the quiz bot! 🤖\n\n\
         Add your own multiple-choice questions and answer questions from others.\n\n\
         {}",
        command_list()
    )
}

pub(crate) fn command_list() -> &'static str {
    "📝 Commands:\n\
     /add_question - add a new question\n\
     /quiz - answer a random question\n\
     /stats - your statistics\n\
     /categories - list categories\n\
     /help - show help"
}

pub(crate) fn stats(questions_added: i64, total: i64, limit: i64) -> String {
    format!(
        "📊 Your statistics:\n\n\
         ✅ Questions added: {questions_added}\n\
         📚 Questions in the pool: {total}\n\n\
         💡 You can add up to {limit} questions."
    )
}

pub(crate) fn categories(categories: &[String]) -> String {
    if categories.is_empty() {
        return "There are no categories yet.".to_owned();
    }
    let list = categories
        .iter()
        .map(|category| format!("🔹 {category}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("📚 Available categories:\n\n{list}")
}

#[cfg(test)]
mod tests {
    use crate::database::question::Difficulty;

    use super::*;

    fn sample() -> Question {
        Question {
            id: 1,
            user_id: 1,
            question_text: "Capital of France?".into(),
            options: ["Paris".into(), "Lyon".into(), "Nice".into(), "Marseille".into()],
            correct_option: OptionLetter::A,
            explanation: String::new(),
            difficulty: Difficulty::default(),
            category: "Geography".into(),
            creation_date: Default::default(),
        }
    }

    #[test]
    fn summary_shows_stars_and_missing_explanation() {
        let summary = submission_summary(&sample());
        assert!(summary.contains("A) Paris\nB) Lyon\nC) Nice\nD) Marseille"));
        assert!(summary.contains("⚡ Difficulty: ⭐⭐⭐☆☆"));
        assert!(summary.contains("📖 Explanation: no explanation"));
        assert!(summary.contains("🏷 Category: Geography"));
    }

    #[test]
    fn verdict_names_the_correct_option() {
        let info = AnswerInfo {
            correct_option: OptionLetter::A,
            explanation: String::new(),
        };
        assert_eq!(answer_verdict(&info, OptionLetter::A), "✅ Your answer is correct!");
        assert_eq!(
            answer_verdict(&info, OptionLetter::B),
            "❌ Your answer is wrong. Correct answer: A"
        );
    }

    #[test]
    fn verdict_appends_explanation() {
        let info = AnswerInfo {
            correct_option: OptionLetter::C,
            explanation: "Because.".into(),
        };
        assert!(answer_verdict(&info, OptionLetter::C).ends_with("📖 Explanation:\nBecause."));
    }

    #[test]
    fn empty_category_list() {
        assert_eq!(categories(&[]), "There are no categories yet.");
        assert_eq!(
            categories(&["Geography".to_owned(), "geography".to_owned()]),
            "📚 Available categories:\n\n🔹 Geography\n🔹 geography"
        );
    }
}
