use rusqlite::Row;
use std::sync::OnceLock;
use time::{Date, OffsetDateTime};

pub const TABLE_NAME: &str = "attendance";
pub const DAY_TABLE_NAME: &str = "attendance_day";

pub enum Columns {
    Id,
    ModName,
    ClassName,
    PocName,
    CreatedAt,
    UpdatedAt,
}

impl Columns {
    pub fn as_str(&self) -> &'static str {
        match self {
            Columns::Id => "id",
            Columns::ModName => "mod_name",
            Columns::ClassName => "class_name",
            Columns::PocName => "poc_name",
            Columns::CreatedAt => "created_at",
            Columns::UpdatedAt => "updated_at",
        }
    }
}

pub enum DayColumns {
    Id,
    AttendanceId,
    Date,
    PresentCount,
    TotalStudents,
}

impl DayColumns {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayColumns::Id => "id",
            DayColumns::AttendanceId => "attendance_id",
            DayColumns::Date => "date",
            DayColumns::PresentCount => "present_count",
            DayColumns::TotalStudents => "total_students",
        }
    }
}

/// One record per (module, class, POC) key, holding day-by-day attendance.
#[derive(Debug, PartialEq, Eq)]
pub struct Attendance {
    pub id: i64,
    pub mod_name: String,
    pub class_name: String,
    pub poc_name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, PartialEq, Eq)]
pub struct AttendanceDay {
    pub id: i64,
    pub attendance_id: i64,
    pub date: Date,
    pub present_count: i64,
    pub total_students: i64,
}

impl Attendance {
    pub fn projection() -> &'static str {
        static PROJECTION: OnceLock<String> = OnceLock::new();
        PROJECTION.get_or_init(|| {
            [
                Columns::Id,
                Columns::ModName,
                Columns::ClassName,
                Columns::PocName,
                Columns::CreatedAt,
                Columns::UpdatedAt,
            ]
            .iter()
            .map(Columns::as_str)
            .collect::<Vec<_>>()
            .join(", ")
        })
    }

    pub const fn mapper() -> fn(&Row) -> rusqlite::Result<Attendance> {
        |row: &_| {
            Ok(Attendance {
                id: row.get(Columns::Id.as_str())?,
                mod_name: row.get(Columns::ModName.as_str())?,
                class_name: row.get(Columns::ClassName.as_str())?,
                poc_name: row.get(Columns::PocName.as_str())?,
                created_at: row.get(Columns::CreatedAt.as_str())?,
                updated_at: row.get(Columns::UpdatedAt.as_str())?,
            })
        }
    }
}

impl AttendanceDay {
    pub fn projection() -> &'static str {
        static PROJECTION: OnceLock<String> = OnceLock::new();
        PROJECTION.get_or_init(|| {
            [
                DayColumns::Id,
                DayColumns::AttendanceId,
                DayColumns::Date,
                DayColumns::PresentCount,
                DayColumns::TotalStudents,
            ]
            .iter()
            .map(DayColumns::as_str)
            .collect::<Vec<_>>()
            .join(", ")
        })
    }

    pub const fn mapper() -> fn(&Row) -> rusqlite::Result<AttendanceDay> {
        |row: &_| {
            Ok(AttendanceDay {
                id: row.get(DayColumns::Id.as_str())?,
                attendance_id: row.get(DayColumns::AttendanceId.as_str())?,
                date: row.get(DayColumns::Date.as_str())?,
                present_count: row.get(DayColumns::PresentCount.as_str())?,
                total_students: row.get(DayColumns::TotalStudents.as_str())?,
            })
        }
    }

    /// Presentation-only rate, never persisted. Division is guarded so an
    /// empty class renders as "0.00%".
    pub fn rate(&self) -> String {
        let total = self.total_students.max(1) as f64;
        format!("{:.2}%", self.present_count as f64 / total * 100.0)
    }
}

#[cfg(test)]
mod test {
    use super::AttendanceDay;
    use time::macros::date;

    fn day(present: i64, total: i64) -> AttendanceDay {
        AttendanceDay {
            id: 1,
            attendance_id: 1,
            date: date!(2025 - 02 - 01),
            present_count: present,
            total_students: total,
        }
    }

    #[test]
    fn rate_two_decimals() {
        assert_eq!("66.67%", day(2, 3).rate());
        assert_eq!("100.00%", day(30, 30).rate());
    }

    #[test]
    fn rate_guards_division_by_zero() {
        assert_eq!("0.00%", day(0, 0).rate());
    }
}
