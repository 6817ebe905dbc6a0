use rusqlite::Row;
use std::sync::OnceLock;
use time::{Date, OffsetDateTime};

pub const TABLE_NAME: &str = "individual";
pub const TEST_TABLE_NAME: &str = "individual_test";

pub enum Columns {
    Id,
    ReportId,
    UserId,
    UserName,
    ModuleName,
    ModuleId,
    OrgId,
    CollegeName,
    ModulePocName,
    ModulePocId,
    ModuleDuration,
    TotalDays,
    AttendTestDays,
    NotAttendTestDays,
    AggregateScore,
    CreatedAt,
    UpdatedAt,
}

impl Columns {
    pub fn as_str(&self) -> &'static str {
        match self {
            Columns::Id => "id",
            Columns::ReportId => "report_id",
            Columns::UserId => "user_id",
            Columns::UserName => "user_name",
            Columns::ModuleName => "module_name",
            Columns::ModuleId => "module_id",
            Columns::OrgId => "org_id",
            Columns::CollegeName => "college_name",
            Columns::ModulePocName => "module_poc_name",
            Columns::ModulePocId => "module_poc_id",
            Columns::ModuleDuration => "module_duration",
            Columns::TotalDays => "total_days",
            Columns::AttendTestDays => "attend_test_days",
            Columns::NotAttendTestDays => "not_attend_test_days",
            Columns::AggregateScore => "aggregate_score",
            Columns::CreatedAt => "created_at",
            Columns::UpdatedAt => "updated_at",
        }
    }
}

pub enum TestColumns {
    Id,
    IndividualId,
    ResultTestId,
    Date,
    ResultMcqScore,
    ResultCodingScore,
    ScoredMark,
    TotalMark,
}

impl TestColumns {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestColumns::Id => "id",
            TestColumns::IndividualId => "individual_id",
            TestColumns::ResultTestId => "result_test_id",
            TestColumns::Date => "date",
            TestColumns::ResultMcqScore => "result_mcq_score",
            TestColumns::ResultCodingScore => "result_coding_score",
            TestColumns::ScoredMark => "scored_mark",
            TestColumns::TotalMark => "total_mark",
        }
    }
}

/// Per-user test report with denormalized module/org/POC names and derived
/// attendance-day counters. `attend_test_days + not_attend_test_days` always
/// equals `total_days`.
#[derive(Debug, PartialEq)]
pub struct Individual {
    pub id: i64,
    pub report_id: String,
    pub user_id: String,
    pub user_name: String,
    pub module_name: String,
    pub module_id: String,
    pub org_id: String,
    pub college_name: String,
    pub module_poc_name: String,
    pub module_poc_id: String,
    pub module_duration: String,
    pub total_days: i64,
    pub attend_test_days: i64,
    pub not_attend_test_days: i64,
    pub aggregate_score: Option<f64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// At most one test per calendar date within a report (store-enforced).
#[derive(Debug, PartialEq)]
pub struct IndividualTest {
    pub id: i64,
    pub individual_id: i64,
    pub result_test_id: String,
    pub date: Date,
    pub result_mcq_score: f64,
    pub result_coding_score: f64,
    pub scored_mark: f64,
    pub total_mark: f64,
}

impl Individual {
    pub fn projection() -> &'static str {
        static PROJECTION: OnceLock<String> = OnceLock::new();
        PROJECTION.get_or_init(|| {
            [
                Columns::Id,
                Columns::ReportId,
                Columns::UserId,
                Columns::UserName,
                Columns::ModuleName,
                Columns::ModuleId,
                Columns::OrgId,
                Columns::CollegeName,
                Columns::ModulePocName,
                Columns::ModulePocId,
                Columns::ModuleDuration,
                Columns::TotalDays,
                Columns::AttendTestDays,
                Columns::NotAttendTestDays,
                Columns::AggregateScore,
                Columns::CreatedAt,
                Columns::UpdatedAt,
            ]
            .iter()
            .map(Columns::as_str)
            .collect::<Vec<_>>()
            .join(", ")
        })
    }

    pub const fn mapper() -> fn(&Row) -> rusqlite::Result<Individual> {
        |row: &_| {
            Ok(Individual {
                id: row.get(Columns::Id.as_str())?,
                report_id: row.get(Columns::ReportId.as_str())?,
                user_id: row.get(Columns::UserId.as_str())?,
                user_name: row.get(Columns::UserName.as_str())?,
                module_name: row.get(Columns::ModuleName.as_str())?,
                module_id: row.get(Columns::ModuleId.as_str())?,
                org_id: row.get(Columns::OrgId.as_str())?,
                college_name: row.get(Columns::CollegeName.as_str())?,
                module_poc_name: row.get(Columns::ModulePocName.as_str())?,
                module_poc_id: row.get(Columns::ModulePocId.as_str())?,
                module_duration: row.get(Columns::ModuleDuration.as_str())?,
                total_days: row.get(Columns::TotalDays.as_str())?,
                attend_test_days: row.get(Columns::AttendTestDays.as_str())?,
                not_attend_test_days: row.get(Columns::NotAttendTestDays.as_str())?,
                aggregate_score: row.get(Columns::AggregateScore.as_str())?,
                created_at: row.get(Columns::CreatedAt.as_str())?,
                updated_at: row.get(Columns::UpdatedAt.as_str())?,
            })
        }
    }
}

impl IndividualTest {
    pub fn projection() -> &'static str {
        static PROJECTION: OnceLock<String> = OnceLock::new();
        PROJECTION.get_or_init(|| {
            [
                TestColumns::Id,
                TestColumns::IndividualId,
                TestColumns::ResultTestId,
                TestColumns::Date,
                TestColumns::ResultMcqScore,
                TestColumns::ResultCodingScore,
                TestColumns::ScoredMark,
                TestColumns::TotalMark,
            ]
            .iter()
            .map(TestColumns::as_str)
            .collect::<Vec<_>>()
            .join(", ")
        })
    }

    pub const fn mapper() -> fn(&Row) -> rusqlite::Result<IndividualTest> {
        |row: &_| {
            Ok(IndividualTest {
                id: row.get(TestColumns::Id.as_str())?,
                individual_id: row.get(TestColumns::IndividualId.as_str())?,
                result_test_id: row.get(TestColumns::ResultTestId.as_str())?,
                date: row.get(TestColumns::Date.as_str())?,
                result_mcq_score: row.get(TestColumns::ResultMcqScore.as_str())?,
                result_coding_score: row.get(TestColumns::ResultCodingScore.as_str())?,
                scored_mark: row.get(TestColumns::ScoredMark.as_str())?,
                total_mark: row.get(TestColumns::TotalMark.as_str())?,
            })
        }
    }
}
