use rusqlite::Row;
use serde::Serialize;
use std::sync::OnceLock;

pub const TABLE_NAME: &str = "overall";

pub enum Columns {
    Id,
    ReportId,
    ReportMod,
    ReportPoc,
    StudentName,
    StudentId,
    TotalMarks,
    ScoredMarks,
    Percentage,
}

impl Columns {
    pub fn as_str(&self) -> &'static str {
        match self {
            Columns::Id => "id",
            Columns::ReportId => "report_id",
            Columns::ReportMod => "report_mod",
            Columns::ReportPoc => "report_poc",
            Columns::StudentName => "student_name",
            Columns::StudentId => "student_id",
            Columns::TotalMarks => "total_marks",
            Columns::ScoredMarks => "scored_marks",
            Columns::Percentage => "percentage",
        }
    }
}

/// One performance summary per student, `percentage` is always derived from
/// the marks on write.
#[derive(Debug, PartialEq, Serialize)]
pub struct Overall {
    #[serde(skip_serializing)]
    pub id: i64,
    pub report_id: String,
    pub report_mod: String,
    pub report_poc: String,
    pub student_name: String,
    pub student_id: String,
    pub total_marks: f64,
    pub scored_marks: f64,
    pub percentage: f64,
}

impl Overall {
    pub fn projection() -> &'static str {
        static PROJECTION: OnceLock<String> = OnceLock::new();
        PROJECTION.get_or_init(|| {
            [
                Columns::Id,
                Columns::ReportId,
                Columns::ReportMod,
                Columns::ReportPoc,
                Columns::StudentName,
                Columns::StudentId,
                Columns::TotalMarks,
                Columns::ScoredMarks,
                Columns::Percentage,
            ]
            .iter()
            .map(Columns::as_str)
            .collect::<Vec<_>>()
            .join(", ")
        })
    }

    pub const fn mapper() -> fn(&Row) -> rusqlite::Result<Overall> {
        |row: &_| {
            Ok(Overall {
                id: row.get(Columns::Id.as_str())?,
                report_id: row.get(Columns::ReportId.as_str())?,
                report_mod: row.get(Columns::ReportMod.as_str())?,
                report_poc: row.get(Columns::ReportPoc.as_str())?,
                student_name: row.get(Columns::StudentName.as_str())?,
                student_id: row.get(Columns::StudentId.as_str())?,
                total_marks: row.get(Columns::TotalMarks.as_str())?,
                scored_marks: row.get(Columns::ScoredMarks.as_str())?,
                percentage: row.get(Columns::Percentage.as_str())?,
            })
        }
    }
}
