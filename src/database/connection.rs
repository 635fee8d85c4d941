use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};

use super::{
    error::StoreError,
    question::{
        AnswerInfo, Difficulty, NewQuestion, OptionLetter, Question, QuestionDraft, UserProfile,
        UserStats,
    },
};

type StoreResult<T> = Result<T, StoreError>;

/// Long-lived handle to the question pool. SQLite's own locking covers
/// concurrent access, so no extra synchronization lives here.
pub struct Connection {
    pool: SqlitePool,
}

impl Connection {
    pub async fn connect(connection_string: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(connection_string)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(Self { pool })
    }

    /// Creates the tables if they are absent.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        log::debug!("Running migrations");
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

pub(crate) trait RegisterUser {
    async fn ensure_user(&self, user: &UserProfile) -> StoreResult<()>;
}

pub(crate) trait StoreQuestion {
    /// Persists a completed draft and counts it against the author's quota.
    async fn record_question(
        &self,
        user_id: i64,
        draft: QuestionDraft,
        limit: i64,
    ) -> StoreResult<Question>;
}

pub(crate) trait RetrieveStats {
    async fn user_stats(&self, user_id: i64) -> StoreResult<UserStats>;

    async fn questions_count(&self) -> StoreResult<i64>;
}

pub(crate) trait RetrieveQuestion {
    async fn random_question(&self, category: Option<&str>) -> StoreResult<Option<Question>>;

    async fn categories(&self) -> StoreResult<Vec<String>>;

    async fn question_by_id(&self, question_id: i64) -> StoreResult<Option<Question>>;

    async fn answer_info(&self, question_id: i64) -> StoreResult<Option<AnswerInfo>>;
}

fn parse_letter(raw: String) -> StoreResult<OptionLetter> {
    raw.parse()
        .map_err(|e| StoreError::CorruptRow(format!("correct_option: {e}")))
}

impl TryFrom<&SqliteRow> for Question {
    type Error = StoreError;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        let difficulty: i64 = row.try_get("difficulty")?;
        Ok(Self {
            id: row.try_get("question_id")?,
            user_id: row.try_get("user_id")?,
            question_text: row.try_get("question_text")?,
            options: [
                row.try_get("option_a")?,
                row.try_get("option_b")?,
                row.try_get("option_c")?,
                row.try_get("option_d")?,
            ],
            correct_option: parse_letter(row.try_get("correct_option")?)?,
            explanation: row.try_get("explanation")?,
            difficulty: Difficulty::new(difficulty).ok_or_else(|| {
                StoreError::CorruptRow(format!("difficulty {difficulty} out of range"))
            })?,
            category: row.try_get("category")?,
            creation_date: row.try_get("creation_date")?,
        })
    }
}

const QUESTION_COLUMNS: &str = "question_id, user_id, question_text, option_a, option_b, \
    option_c, option_d, correct_option, explanation, difficulty, category, creation_date";

impl RegisterUser for Connection {
    async fn ensure_user(&self, user: &UserProfile) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO users (user_id, username, first_name, last_name) VALUES (?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("INSERT OR IGNORE INTO user_stats (user_id) VALUES (?)")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if inserted > 0 {
            log::info!("Registered user {}", user.id);
        }
        Ok(())
    }
}

impl StoreQuestion for Connection {
    async fn record_question(
        &self,
        user_id: i64,
        draft: QuestionDraft,
        limit: i64,
    ) -> StoreResult<Question> {
        let question = NewQuestion::try_from(draft)?;

        log::debug!("Creating transaction");
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO users (user_id) VALUES (?)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("INSERT OR IGNORE INTO user_stats (user_id) VALUES (?)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        // The quota was checked when the dialogue began; claim the slot again
        // here so two dialogues finishing together cannot both pass it.
        let claimed = sqlx::query(
            "UPDATE user_stats
             SET questions_added = questions_added + 1, last_active = CURRENT_TIMESTAMP
             WHERE user_id = ? AND questions_added < ?",
        )
        .bind(user_id)
        .bind(limit)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if claimed == 0 {
            tx.rollback().await?;
            return Err(StoreError::QuotaExceeded { user_id, limit });
        }

        let [option_a, option_b, option_c, option_d] = &question.options;
        let sql = format!(
            "INSERT INTO questions (
                user_id, question_text, option_a, option_b, option_c, option_d,
                correct_option, explanation, difficulty, category
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {QUESTION_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(&question.question_text)
            .bind(option_a)
            .bind(option_b)
            .bind(option_c)
            .bind(option_d)
            .bind(question.correct_option.as_str())
            .bind(&question.explanation)
            .bind(i64::from(question.difficulty.value()))
            .bind(&question.category)
            .fetch_one(&mut *tx)
            .await?;
        let stored = Question::try_from(&row)?;

        log::debug!("Closing transaction");
        tx.commit().await?;

        log::info!("User {} added question {}", user_id, stored.id);
        Ok(stored)
    }
}

impl RetrieveStats for Connection {
    async fn user_stats(&self, user_id: i64) -> StoreResult<UserStats> {
        let questions_added = sqlx::query("SELECT questions_added FROM user_stats WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| row.try_get::<i64, _>("questions_added"))
            .transpose()?
            .unwrap_or(0);

        Ok(UserStats { questions_added })
    }

    async fn questions_count(&self) -> StoreResult<i64> {
        let count = sqlx::query("SELECT COUNT(*) AS total FROM questions")
            .fetch_one(&self.pool)
            .await?
            .try_get("total")?;

        Ok(count)
    }
}

impl RetrieveQuestion for Connection {
    async fn random_question(&self, category: Option<&str>) -> StoreResult<Option<Question>> {
        let row = match category {
            Some(category) => {
                let sql = format!(
                    "SELECT {QUESTION_COLUMNS} FROM questions WHERE category = ? ORDER BY RANDOM() LIMIT 1"
                );
                sqlx::query(&sql)
                    .bind(category)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions ORDER BY RANDOM() LIMIT 1");
                sqlx::query(&sql).fetch_optional(&self.pool).await?
            }
        };

        row.as_ref().map(Question::try_from).transpose()
    }

    async fn categories(&self) -> StoreResult<Vec<String>> {
        let records = sqlx::query(
            "SELECT category FROM questions GROUP BY category ORDER BY MIN(question_id)",
        )
        .fetch_all(&self.pool)
        .await?;

        records
            .iter()
            .map(|record| record.try_get("category").map_err(StoreError::from))
            .collect()
    }

    async fn question_by_id(&self, question_id: i64) -> StoreResult<Option<Question>> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE question_id = ?");
        let row = sqlx::query(&sql)
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Question::try_from).transpose()
    }

    async fn answer_info(&self, question_id: i64) -> StoreResult<Option<AnswerInfo>> {
        let row = sqlx::query(
            "SELECT correct_option, explanation FROM questions WHERE question_id = ?",
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(AnswerInfo {
                correct_option: parse_letter(row.try_get("correct_option")?)?,
                explanation: row.try_get("explanation")?,
            })),
            None => Ok(None),
        }
    }
}
