use super::schema::{self, Attendance, AttendanceDay, Columns, DayColumns};
use crate::db;
use crate::{Error, Result};
use rusqlite::{named_params, params, Connection, OptionalExtension};
use time::Date;

pub fn insert(
    mod_name: &str,
    class_name: &str,
    poc_name: &str,
    conn: &Connection,
) -> Result<Attendance> {
    let sql = format!(
        r#"
            INSERT INTO {table} (
                {mod_name},
                {class_name},
                {poc_name}
            ) VALUES (
                :mod_name,
                :class_name,
                :poc_name
            )
        "#,
        table = schema::TABLE_NAME,
        mod_name = Columns::ModName.as_str(),
        class_name = Columns::ClassName.as_str(),
        poc_name = Columns::PocName.as_str(),
    );
    conn.execute(
        &sql,
        named_params! {
            ":mod_name": mod_name,
            ":class_name": class_name,
            ":poc_name": poc_name,
        },
    )?;
    select_by_id(conn.last_insert_rowid(), conn)
}

pub fn select_by_id(id: i64, conn: &Connection) -> Result<Attendance> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {id} = ?1
        "#,
        projection = Attendance::projection(),
        table = schema::TABLE_NAME,
        id = Columns::Id.as_str(),
    );
    conn.query_row(&sql, params![id], Attendance::mapper())
        .map_err(Into::into)
}

pub fn select_all(conn: &Connection) -> Result<Vec<Attendance>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            ORDER BY {id}
        "#,
        projection = Attendance::projection(),
        table = schema::TABLE_NAME,
        id = Columns::Id.as_str(),
    );
    Ok(conn
        .prepare(&sql)?
        .query_map(params![], Attendance::mapper())?
        .collect::<Result<Vec<_>, _>>()?)
}

pub fn select_by_key(
    mod_name: &str,
    class_name: &str,
    poc_name: &str,
    conn: &Connection,
) -> Result<Option<Attendance>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {mod_name} = :mod_name
                AND {class_name} = :class_name
                AND {poc_name} = :poc_name
        "#,
        projection = Attendance::projection(),
        table = schema::TABLE_NAME,
        mod_name = Columns::ModName.as_str(),
        class_name = Columns::ClassName.as_str(),
        poc_name = Columns::PocName.as_str(),
    );
    conn.query_row(
        &sql,
        named_params! {
            ":mod_name": mod_name,
            ":class_name": class_name,
            ":poc_name": poc_name,
        },
        Attendance::mapper(),
    )
    .optional()
    .map_err(Into::into)
}

pub fn select_by_mod_and_class(
    mod_name: &str,
    class_name: &str,
    conn: &Connection,
) -> Result<Vec<Attendance>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {mod_name} = ?1 AND {class_name} = ?2
            ORDER BY {id}
        "#,
        projection = Attendance::projection(),
        table = schema::TABLE_NAME,
        mod_name = Columns::ModName.as_str(),
        class_name = Columns::ClassName.as_str(),
        id = Columns::Id.as_str(),
    );
    Ok(conn
        .prepare(&sql)?
        .query_map(params![mod_name, class_name], Attendance::mapper())?
        .collect::<Result<Vec<_>, _>>()?)
}

pub fn select_days(attendance_id: i64, conn: &Connection) -> Result<Vec<AttendanceDay>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {attendance_id} = ?1
            ORDER BY {date}
        "#,
        projection = AttendanceDay::projection(),
        table = schema::DAY_TABLE_NAME,
        attendance_id = DayColumns::AttendanceId.as_str(),
        date = DayColumns::Date.as_str(),
    );
    Ok(conn
        .prepare(&sql)?
        .query_map(params![attendance_id], AttendanceDay::mapper())?
        .collect::<Result<Vec<_>, _>>()?)
}

/// The (attendance_id, date) UNIQUE constraint turns a same-date re-post
/// into a conflict instead of racing on a prior existence check.
pub fn insert_day(
    attendance_id: i64,
    date: Date,
    present_count: i64,
    total_students: i64,
    conn: &Connection,
) -> Result<AttendanceDay> {
    let sql = format!(
        r#"
            INSERT INTO {table} (
                {attendance_id},
                {date},
                {present_count},
                {total_students}
            ) VALUES (
                :attendance_id,
                :date,
                :present_count,
                :total_students
            )
        "#,
        table = schema::DAY_TABLE_NAME,
        attendance_id = DayColumns::AttendanceId.as_str(),
        date = DayColumns::Date.as_str(),
        present_count = DayColumns::PresentCount.as_str(),
        total_students = DayColumns::TotalStudents.as_str(),
    );
    conn.execute(
        &sql,
        named_params! {
            ":attendance_id": attendance_id,
            ":date": date.to_string(),
            ":present_count": present_count,
            ":total_students": total_students,
        },
    )
    .map_err(|err| {
        if db::is_unique_violation(&err) {
            Error::HttpConflict("Attendance for this date already exists".into())
        } else {
            err.into()
        }
    })?;
    touch(attendance_id, conn)?;
    select_day_by_id(conn.last_insert_rowid(), conn)
}

pub fn select_day_by_id(id: i64, conn: &Connection) -> Result<AttendanceDay> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {id} = ?1
        "#,
        projection = AttendanceDay::projection(),
        table = schema::DAY_TABLE_NAME,
        id = DayColumns::Id.as_str(),
    );
    conn.query_row(&sql, params![id], AttendanceDay::mapper())
        .map_err(Into::into)
}

pub fn select_day_by_date(
    attendance_id: i64,
    date: Date,
    conn: &Connection,
) -> Result<Option<AttendanceDay>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {attendance_id} = ?1 AND {date} = ?2
        "#,
        projection = AttendanceDay::projection(),
        table = schema::DAY_TABLE_NAME,
        attendance_id = DayColumns::AttendanceId.as_str(),
        date = DayColumns::Date.as_str(),
    );
    conn.query_row(
        &sql,
        params![attendance_id, date.to_string()],
        AttendanceDay::mapper(),
    )
    .optional()
    .map_err(Into::into)
}

pub fn update_day(
    attendance_id: i64,
    date: Date,
    present_count: Option<i64>,
    total_students: Option<i64>,
    conn: &Connection,
) -> Result<Option<AttendanceDay>> {
    let day = match select_day_by_date(attendance_id, date, conn)? {
        Some(day) => day,
        None => return Ok(None),
    };
    let sql = format!(
        r#"
            UPDATE {table}
            SET {present_count} = :present_count, {total_students} = :total_students
            WHERE {id} = :id
        "#,
        table = schema::DAY_TABLE_NAME,
        present_count = DayColumns::PresentCount.as_str(),
        total_students = DayColumns::TotalStudents.as_str(),
        id = DayColumns::Id.as_str(),
    );
    conn.execute(
        &sql,
        named_params! {
            ":present_count": present_count.unwrap_or(day.present_count),
            ":total_students": total_students.unwrap_or(day.total_students),
            ":id": day.id,
        },
    )?;
    touch(attendance_id, conn)?;
    Ok(Some(select_day_by_id(day.id, conn)?))
}

pub fn delete_day(attendance_id: i64, date: Date, conn: &Connection) -> Result<bool> {
    let sql = format!(
        r#"
            DELETE FROM {table}
            WHERE {attendance_id} = ?1 AND {date} = ?2
        "#,
        table = schema::DAY_TABLE_NAME,
        attendance_id = DayColumns::AttendanceId.as_str(),
        date = DayColumns::Date.as_str(),
    );
    let deleted = conn.execute(&sql, params![attendance_id, date.to_string()])?;
    if deleted > 0 {
        touch(attendance_id, conn)?;
    }
    Ok(deleted > 0)
}

/// Appends a day to the record with this key, creating the record first
/// when it doesn't exist yet. Returns true when a record was created.
pub fn record_day(
    mod_name: &str,
    class_name: &str,
    poc_name: &str,
    date: Date,
    present_count: i64,
    total_students: i64,
    conn: &Connection,
) -> Result<bool> {
    match select_by_key(mod_name, class_name, poc_name, conn)? {
        Some(existing) => {
            insert_day(existing.id, date, present_count, total_students, conn)?;
            Ok(false)
        }
        None => {
            let attendance = insert(mod_name, class_name, poc_name, conn)?;
            insert_day(attendance.id, date, present_count, total_students, conn)?;
            Ok(true)
        }
    }
}

pub fn select_all_with_days(conn: &Connection) -> Result<Vec<(Attendance, Vec<AttendanceDay>)>> {
    select_all(conn)?
        .into_iter()
        .map(|it| {
            let days = select_days(it.id, conn)?;
            Ok((it, days))
        })
        .collect()
}

pub fn select_by_mod_and_class_with_days(
    mod_name: &str,
    class_name: &str,
    conn: &Connection,
) -> Result<Vec<(Attendance, Vec<AttendanceDay>)>> {
    select_by_mod_and_class(mod_name, class_name, conn)?
        .into_iter()
        .map(|it| {
            let days = select_days(it.id, conn)?;
            Ok((it, days))
        })
        .collect()
}

pub fn update_day_by_key(
    mod_name: &str,
    class_name: &str,
    poc_name: &str,
    date: Date,
    present_count: Option<i64>,
    total_students: Option<i64>,
    conn: &Connection,
) -> Result<(Attendance, Vec<AttendanceDay>)> {
    let attendance = select_by_key(mod_name, class_name, poc_name, conn)?
        .ok_or_else(|| Error::NotFound("Record not found".into()))?;
    update_day(attendance.id, date, present_count, total_students, conn)?
        .ok_or_else(|| Error::NotFound("No attendance found for the given date".into()))?;
    let days = select_days(attendance.id, conn)?;
    Ok((attendance, days))
}

pub fn delete_day_by_key(
    mod_name: &str,
    class_name: &str,
    poc_name: &str,
    date: Date,
    conn: &Connection,
) -> Result<()> {
    let attendance = select_by_key(mod_name, class_name, poc_name, conn)?
        .ok_or_else(|| Error::NotFound("Record not found".into()))?;
    if !delete_day(attendance.id, date, conn)? {
        return Err(Error::NotFound(
            "No attendance found for the given date".into(),
        ));
    }
    Ok(())
}

fn touch(attendance_id: i64, conn: &Connection) -> Result<()> {
    let sql = format!(
        r#"
            UPDATE {table}
            SET {updated_at} = strftime('%Y-%m-%dT%H:%M:%fZ')
            WHERE {id} = ?1
        "#,
        table = schema::TABLE_NAME,
        updated_at = Columns::UpdatedAt.as_str(),
        id = Columns::Id.as_str(),
    );
    conn.execute(&sql, params![attendance_id])?;
    Ok(())
}
