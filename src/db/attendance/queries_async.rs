use super::queries;
use super::schema::{Attendance, AttendanceDay};
use crate::Result;
use deadpool_sqlite::Pool;
use time::Date;

pub async fn record_day(
    mod_name: String,
    class_name: String,
    poc_name: String,
    date: Date,
    present_count: i64,
    total_students: i64,
    pool: &Pool,
) -> Result<bool> {
    pool.get()
        .await?
        .interact(move |conn| {
            queries::record_day(
                &mod_name,
                &class_name,
                &poc_name,
                date,
                present_count,
                total_students,
                conn,
            )
        })
        .await?
}

pub async fn select_all_with_days(pool: &Pool) -> Result<Vec<(Attendance, Vec<AttendanceDay>)>> {
    pool.get()
        .await?
        .interact(|conn| queries::select_all_with_days(conn))
        .await?
}

pub async fn select_by_mod_and_class_with_days(
    mod_name: String,
    class_name: String,
    pool: &Pool,
) -> Result<Vec<(Attendance, Vec<AttendanceDay>)>> {
    pool.get()
        .await?
        .interact(move |conn| {
            queries::select_by_mod_and_class_with_days(&mod_name, &class_name, conn)
        })
        .await?
}

pub async fn update_day_by_key(
    mod_name: String,
    class_name: String,
    poc_name: String,
    date: Date,
    present_count: Option<i64>,
    total_students: Option<i64>,
    pool: &Pool,
) -> Result<(Attendance, Vec<AttendanceDay>)> {
    pool.get()
        .await?
        .interact(move |conn| {
            queries::update_day_by_key(
                &mod_name,
                &class_name,
                &poc_name,
                date,
                present_count,
                total_students,
                conn,
            )
        })
        .await?
}

pub async fn delete_day_by_key(
    mod_name: String,
    class_name: String,
    poc_name: String,
    date: Date,
    pool: &Pool,
) -> Result<()> {
    pool.get()
        .await?
        .interact(move |conn| {
            queries::delete_day_by_key(&mod_name, &class_name, &poc_name, date, conn)
        })
        .await?
}
