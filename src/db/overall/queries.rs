use super::schema::{self, Columns, Overall};
use crate::db;
use crate::{Error, Result};
use rusqlite::{named_params, params, Connection, OptionalExtension};

pub struct OverallFields {
    pub report_id: String,
    pub report_mod: String,
    pub report_poc: String,
    pub student_name: String,
    pub student_id: String,
    pub total_marks: f64,
    pub scored_marks: f64,
}

#[derive(Default)]
pub struct OverallPatch {
    pub report_id: Option<String>,
    pub report_mod: Option<String>,
    pub report_poc: Option<String>,
    pub student_name: Option<String>,
    pub total_marks: Option<f64>,
    pub scored_marks: Option<f64>,
}

/// Marks of zero would divide by zero, those records report 0%.
pub fn percentage(scored_marks: f64, total_marks: f64) -> f64 {
    if total_marks > 0.0 {
        (scored_marks / total_marks * 100.0 * 100.0).round() / 100.0
    } else {
        0.0
    }
}

pub fn insert(fields: &OverallFields, conn: &Connection) -> Result<Overall> {
    let sql = format!(
        r#"
            INSERT INTO {table} (
                {report_id},
                {report_mod},
                {report_poc},
                {student_name},
                {student_id},
                {total_marks},
                {scored_marks},
                {percentage}
            ) VALUES (
                :report_id,
                :report_mod,
                :report_poc,
                :student_name,
                :student_id,
                :total_marks,
                :scored_marks,
                :percentage
            )
        "#,
        table = schema::TABLE_NAME,
        report_id = Columns::ReportId.as_str(),
        report_mod = Columns::ReportMod.as_str(),
        report_poc = Columns::ReportPoc.as_str(),
        student_name = Columns::StudentName.as_str(),
        student_id = Columns::StudentId.as_str(),
        total_marks = Columns::TotalMarks.as_str(),
        scored_marks = Columns::ScoredMarks.as_str(),
        percentage = Columns::Percentage.as_str(),
    );
    conn.execute(
        &sql,
        named_params! {
            ":report_id": fields.report_id,
            ":report_mod": fields.report_mod,
            ":report_poc": fields.report_poc,
            ":student_name": fields.student_name,
            ":student_id": fields.student_id,
            ":total_marks": fields.total_marks,
            ":scored_marks": fields.scored_marks,
            ":percentage": percentage(fields.scored_marks, fields.total_marks),
        },
    )
    .map_err(|err| {
        if db::is_unique_violation(&err) {
            Error::HttpConflict("Performance data already exists for this student".into())
        } else {
            Error::from(err)
        }
    })?;
    select_by_id(conn.last_insert_rowid(), conn)
}

pub fn select_by_id(id: i64, conn: &Connection) -> Result<Overall> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {id} = ?1
        "#,
        projection = Overall::projection(),
        table = schema::TABLE_NAME,
        id = Columns::Id.as_str(),
    );
    conn.query_row(&sql, params![id], Overall::mapper())
        .map_err(Into::into)
}

pub fn select_all(conn: &Connection) -> Result<Vec<Overall>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            ORDER BY {id}
        "#,
        projection = Overall::projection(),
        table = schema::TABLE_NAME,
        id = Columns::Id.as_str(),
    );
    Ok(conn
        .prepare(&sql)?
        .query_map(params![], Overall::mapper())?
        .collect::<Result<Vec<_>, _>>()?)
}

pub fn select_by_student_id(student_id: &str, conn: &Connection) -> Result<Option<Overall>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {student_id} = ?1
        "#,
        projection = Overall::projection(),
        table = schema::TABLE_NAME,
        student_id = Columns::StudentId.as_str(),
    );
    conn.query_row(&sql, params![student_id], Overall::mapper())
        .optional()
        .map_err(Into::into)
}

pub fn select_first_by_report_mod(report_mod: &str, conn: &Connection) -> Result<Option<Overall>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {report_mod} = ?1
            ORDER BY {id}
            LIMIT 1
        "#,
        projection = Overall::projection(),
        table = schema::TABLE_NAME,
        report_mod = Columns::ReportMod.as_str(),
        id = Columns::Id.as_str(),
    );
    conn.query_row(&sql, params![report_mod], Overall::mapper())
        .optional()
        .map_err(Into::into)
}

pub fn update_by_student_id(
    student_id: &str,
    patch: &OverallPatch,
    conn: &Connection,
) -> Result<Option<Overall>> {
    let current = match select_by_student_id(student_id, conn)? {
        Some(current) => current,
        None => return Ok(None),
    };
    let total_marks = patch.total_marks.unwrap_or(current.total_marks);
    let scored_marks = patch.scored_marks.unwrap_or(current.scored_marks);
    let sql = format!(
        r#"
            UPDATE {table}
            SET {report_id} = :report_id,
                {report_mod} = :report_mod,
                {report_poc} = :report_poc,
                {student_name} = :student_name,
                {total_marks} = :total_marks,
                {scored_marks} = :scored_marks,
                {percentage} = :percentage
            WHERE {id} = :id
        "#,
        table = schema::TABLE_NAME,
        report_id = Columns::ReportId.as_str(),
        report_mod = Columns::ReportMod.as_str(),
        report_poc = Columns::ReportPoc.as_str(),
        student_name = Columns::StudentName.as_str(),
        total_marks = Columns::TotalMarks.as_str(),
        scored_marks = Columns::ScoredMarks.as_str(),
        percentage = Columns::Percentage.as_str(),
        id = Columns::Id.as_str(),
    );
    conn.execute(
        &sql,
        named_params! {
            ":report_id": patch.report_id.as_deref().unwrap_or(&current.report_id),
            ":report_mod": patch.report_mod.as_deref().unwrap_or(&current.report_mod),
            ":report_poc": patch.report_poc.as_deref().unwrap_or(&current.report_poc),
            ":student_name": patch
                .student_name
                .as_deref()
                .unwrap_or(&current.student_name),
            ":total_marks": total_marks,
            ":scored_marks": scored_marks,
            ":percentage": percentage(scored_marks, total_marks),
            ":id": current.id,
        },
    )?;
    Ok(Some(select_by_id(current.id, conn)?))
}

pub fn delete_by_student_id(student_id: &str, conn: &Connection) -> Result<bool> {
    let sql = format!(
        r#"
            DELETE FROM {table}
            WHERE {student_id} = ?1
        "#,
        table = schema::TABLE_NAME,
        student_id = Columns::StudentId.as_str(),
    );
    Ok(conn.execute(&sql, params![student_id])? > 0)
}
