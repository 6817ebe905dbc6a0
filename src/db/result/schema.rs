use rusqlite::Row;
use serde::Serialize;
use std::sync::OnceLock;
use time::OffsetDateTime;

pub const TABLE_NAME: &str = "result";

pub enum Columns {
    Id,
    ResultId,
    ResultUserId,
    ResultTestId,
    ResultScore,
    ResultTotalScore,
    ResultPocId,
    CreatedAt,
}

impl Columns {
    pub fn as_str(&self) -> &'static str {
        match self {
            Columns::Id => "id",
            Columns::ResultId => "result_id",
            Columns::ResultUserId => "result_user_id",
            Columns::ResultTestId => "result_test_id",
            Columns::ResultScore => "result_score",
            Columns::ResultTotalScore => "result_total_score",
            Columns::ResultPocId => "result_poc_id",
            Columns::CreatedAt => "created_at",
        }
    }
}

/// One score per (user, test) pair, store-enforced.
#[derive(Debug, PartialEq, Serialize)]
pub struct ResultRecord {
    #[serde(skip_serializing)]
    pub id: i64,
    pub result_id: String,
    pub result_user_id: String,
    pub result_test_id: String,
    pub result_score: f64,
    pub result_total_score: f64,
    pub result_poc_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl ResultRecord {
    pub fn projection() -> &'static str {
        static PROJECTION: OnceLock<String> = OnceLock::new();
        PROJECTION.get_or_init(|| {
            [
                Columns::Id,
                Columns::ResultId,
                Columns::ResultUserId,
                Columns::ResultTestId,
                Columns::ResultScore,
                Columns::ResultTotalScore,
                Columns::ResultPocId,
                Columns::CreatedAt,
            ]
            .iter()
            .map(Columns::as_str)
            .collect::<Vec<_>>()
            .join(", ")
        })
    }

    pub const fn mapper() -> fn(&Row) -> rusqlite::Result<ResultRecord> {
        |row: &_| {
            Ok(ResultRecord {
                id: row.get(Columns::Id.as_str())?,
                result_id: row.get(Columns::ResultId.as_str())?,
                result_user_id: row.get(Columns::ResultUserId.as_str())?,
                result_test_id: row.get(Columns::ResultTestId.as_str())?,
                result_score: row.get(Columns::ResultScore.as_str())?,
                result_total_score: row.get(Columns::ResultTotalScore.as_str())?,
                result_poc_id: row.get(Columns::ResultPocId.as_str())?,
                created_at: row.get(Columns::CreatedAt.as_str())?,
            })
        }
    }
}
