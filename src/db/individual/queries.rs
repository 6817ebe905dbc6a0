use super::schema::{self, Columns, Individual, IndividualTest, TestColumns};
use crate::db;
use crate::window::{self, DurationWindow};
use crate::{Error, Result};
use rusqlite::{named_params, params, Connection, OptionalExtension};
use std::collections::HashSet;
use time::Date;
use uuid::Uuid;

pub struct ReportFields {
    pub user_id: String,
    pub user_name: String,
    pub module_name: String,
    pub module_id: String,
    pub org_id: String,
    pub college_name: String,
    pub module_poc_name: String,
    pub module_poc_id: String,
    pub module_duration: String,
    pub aggregate_score: Option<f64>,
}

pub struct NewTest {
    pub result_test_id: String,
    pub date: Date,
    pub result_mcq_score: f64,
    pub result_coding_score: f64,
    pub total_mark: f64,
}

impl NewTest {
    /// scored_mark is always derived, never taken from the request.
    pub fn scored_mark(&self) -> f64 {
        self.result_mcq_score + self.result_coding_score
    }
}

#[derive(Default)]
pub struct TestPatch {
    pub date: Option<Date>,
    pub result_mcq_score: Option<f64>,
    pub result_coding_score: Option<f64>,
    pub total_mark: Option<f64>,
}

#[derive(Default)]
pub struct ReportPatch {
    pub module_name: Option<String>,
    pub module_id: Option<String>,
    pub module_poc_name: Option<String>,
    pub module_poc_id: Option<String>,
    pub user_name: Option<String>,
}

impl ReportPatch {
    fn is_empty(&self) -> bool {
        self.module_name.is_none()
            && self.module_id.is_none()
            && self.module_poc_name.is_none()
            && self.module_poc_id.is_none()
            && self.user_name.is_none()
    }
}

/// Create-or-append workflow behind POST. The caller has already validated
/// that `test.date` falls inside `window`.
pub fn record_test(
    fields: &ReportFields,
    test: &NewTest,
    window: &DurationWindow,
    conn: &mut Connection,
) -> Result<(Individual, Vec<IndividualTest>)> {
    let tx = conn.transaction()?;
    let total_days = window.total_days();
    let individual_id = match select_by_user_id(&fields.user_id, &tx)? {
        None => {
            let report = insert_report(fields, total_days, 1, total_days - 1, &tx)?;
            insert_test(report.id, test, &tx)?;
            report.id
        }
        Some(report) => {
            insert_test(report.id, test, &tx)?;
            let dates: HashSet<Date> = select_tests(report.id, &tx)?
                .iter()
                .map(|it| it.date)
                .collect();
            let attend = window.attended_days(&dates);
            update_day_counts(report.id, total_days, attend, total_days - attend, &tx)?;
            report.id
        }
    };
    touch(individual_id, &tx)?;
    let report = select_by_id(individual_id, &tx)?;
    let tests = select_tests(individual_id, &tx)?;
    tx.commit()?;
    Ok((report, tests))
}

/// PUT workflow: per-test patches plus optional top-level renames. A date
/// change re-derives the day counters from the set of dates now present.
pub fn update_test(
    user_id: &str,
    result_test_id: &str,
    patch: &TestPatch,
    report_patch: &ReportPatch,
    conn: &mut Connection,
) -> Result<(Individual, Vec<IndividualTest>)> {
    let tx = conn.transaction()?;
    let report = select_by_user_id(user_id, &tx)?
        .ok_or_else(|| Error::NotFound("User not found".into()))?;
    let test = select_test(report.id, result_test_id, &tx)?
        .ok_or_else(|| Error::NotFound("Test not found".into()))?;

    let date = patch.date.unwrap_or(test.date);
    let result_mcq_score = patch.result_mcq_score.unwrap_or(test.result_mcq_score);
    let result_coding_score = patch
        .result_coding_score
        .unwrap_or(test.result_coding_score);
    let total_mark = patch.total_mark.unwrap_or(test.total_mark);

    let sql = format!(
        r#"
            UPDATE {table}
            SET {date} = :date,
                {mcq} = :mcq,
                {coding} = :coding,
                {scored} = :scored,
                {total_mark} = :total_mark
            WHERE {id} = :id
        "#,
        table = schema::TEST_TABLE_NAME,
        date = TestColumns::Date.as_str(),
        mcq = TestColumns::ResultMcqScore.as_str(),
        coding = TestColumns::ResultCodingScore.as_str(),
        scored = TestColumns::ScoredMark.as_str(),
        total_mark = TestColumns::TotalMark.as_str(),
        id = TestColumns::Id.as_str(),
    );
    tx.execute(
        &sql,
        named_params! {
            ":date": date.to_string(),
            ":mcq": result_mcq_score,
            ":coding": result_coding_score,
            ":scored": result_mcq_score + result_coding_score,
            ":total_mark": total_mark,
            ":id": test.id,
        },
    )
    .map_err(|err| {
        if db::is_unique_violation(&err) {
            Error::HttpConflict(format!(
                "Test already exists for date {}",
                window::format_dmy(date)
            ))
        } else {
            err.into()
        }
    })?;

    if date != test.date {
        let attend = select_tests(report.id, &tx)?.len() as i64;
        update_day_counts(
            report.id,
            report.total_days,
            attend,
            report.total_days - attend,
            &tx,
        )?;
    }
    if !report_patch.is_empty() {
        apply_report_patch(report.id, report_patch, &tx)?;
    }
    touch(report.id, &tx)?;

    let report = select_by_id(report.id, &tx)?;
    let tests = select_tests(report.id, &tx)?;
    tx.commit()?;
    Ok((report, tests))
}

pub fn delete_test(
    user_id: &str,
    result_test_id: &str,
    conn: &mut Connection,
) -> Result<(Individual, Vec<IndividualTest>)> {
    let tx = conn.transaction()?;
    let report = select_by_user_id(user_id, &tx)?
        .ok_or_else(|| Error::NotFound("User not found".into()))?;
    let sql = format!(
        r#"
            DELETE FROM {table}
            WHERE {individual_id} = ?1 AND {result_test_id} = ?2
        "#,
        table = schema::TEST_TABLE_NAME,
        individual_id = TestColumns::IndividualId.as_str(),
        result_test_id = TestColumns::ResultTestId.as_str(),
    );
    let deleted = tx.execute(&sql, params![report.id, result_test_id])?;
    if deleted == 0 {
        return Err(Error::NotFound("Test not found".into()));
    }
    let attend = select_tests(report.id, &tx)?.len() as i64;
    update_day_counts(
        report.id,
        report.total_days,
        attend,
        report.total_days - attend,
        &tx,
    )?;
    touch(report.id, &tx)?;
    let report = select_by_id(report.id, &tx)?;
    let tests = select_tests(report.id, &tx)?;
    tx.commit()?;
    Ok((report, tests))
}

pub fn delete_by_user_id(user_id: &str, conn: &Connection) -> Result<bool> {
    let sql = format!(
        r#"
            DELETE FROM {table}
            WHERE {user_id} = ?1
        "#,
        table = schema::TABLE_NAME,
        user_id = Columns::UserId.as_str(),
    );
    Ok(conn.execute(&sql, params![user_id])? > 0)
}

fn insert_report(
    fields: &ReportFields,
    total_days: i64,
    attend_test_days: i64,
    not_attend_test_days: i64,
    conn: &Connection,
) -> Result<Individual> {
    let sql = format!(
        r#"
            INSERT INTO {table} (
                {report_id},
                {user_id},
                {user_name},
                {module_name},
                {module_id},
                {org_id},
                {college_name},
                {module_poc_name},
                {module_poc_id},
                {module_duration},
                {total_days},
                {attend_test_days},
                {not_attend_test_days},
                {aggregate_score}
            ) VALUES (
                :report_id,
                :user_id,
                :user_name,
                :module_name,
                :module_id,
                :org_id,
                :college_name,
                :module_poc_name,
                :module_poc_id,
                :module_duration,
                :total_days,
                :attend_test_days,
                :not_attend_test_days,
                :aggregate_score
            )
        "#,
        table = schema::TABLE_NAME,
        report_id = Columns::ReportId.as_str(),
        user_id = Columns::UserId.as_str(),
        user_name = Columns::UserName.as_str(),
        module_name = Columns::ModuleName.as_str(),
        module_id = Columns::ModuleId.as_str(),
        org_id = Columns::OrgId.as_str(),
        college_name = Columns::CollegeName.as_str(),
        module_poc_name = Columns::ModulePocName.as_str(),
        module_poc_id = Columns::ModulePocId.as_str(),
        module_duration = Columns::ModuleDuration.as_str(),
        total_days = Columns::TotalDays.as_str(),
        attend_test_days = Columns::AttendTestDays.as_str(),
        not_attend_test_days = Columns::NotAttendTestDays.as_str(),
        aggregate_score = Columns::AggregateScore.as_str(),
    );
    conn.execute(
        &sql,
        named_params! {
            ":report_id": Uuid::new_v4().to_string(),
            ":user_id": fields.user_id,
            ":user_name": fields.user_name,
            ":module_name": fields.module_name,
            ":module_id": fields.module_id,
            ":org_id": fields.org_id,
            ":college_name": fields.college_name,
            ":module_poc_name": fields.module_poc_name,
            ":module_poc_id": fields.module_poc_id,
            ":module_duration": fields.module_duration,
            ":total_days": total_days,
            ":attend_test_days": attend_test_days,
            ":not_attend_test_days": not_attend_test_days,
            ":aggregate_score": fields.aggregate_score,
        },
    )?;
    select_by_id(conn.last_insert_rowid(), conn)
}

fn insert_test(individual_id: i64, test: &NewTest, conn: &Connection) -> Result<IndividualTest> {
    let sql = format!(
        r#"
            INSERT INTO {table} (
                {individual_id},
                {result_test_id},
                {date},
                {mcq},
                {coding},
                {scored},
                {total_mark}
            ) VALUES (
                :individual_id,
                :result_test_id,
                :date,
                :mcq,
                :coding,
                :scored,
                :total_mark
            )
        "#,
        table = schema::TEST_TABLE_NAME,
        individual_id = TestColumns::IndividualId.as_str(),
        result_test_id = TestColumns::ResultTestId.as_str(),
        date = TestColumns::Date.as_str(),
        mcq = TestColumns::ResultMcqScore.as_str(),
        coding = TestColumns::ResultCodingScore.as_str(),
        scored = TestColumns::ScoredMark.as_str(),
        total_mark = TestColumns::TotalMark.as_str(),
    );
    conn.execute(
        &sql,
        named_params! {
            ":individual_id": individual_id,
            ":result_test_id": test.result_test_id,
            ":date": test.date.to_string(),
            ":mcq": test.result_mcq_score,
            ":coding": test.result_coding_score,
            ":scored": test.scored_mark(),
            ":total_mark": test.total_mark,
        },
    )
    .map_err(|err| {
        if db::is_unique_violation(&err) {
            Error::HttpConflict(format!(
                "Test already exists for user on {}",
                window::format_dmy(test.date)
            ))
        } else {
            Error::from(err)
        }
    })?;
    select_test_by_id(conn.last_insert_rowid(), conn)
}

pub fn select_by_id(id: i64, conn: &Connection) -> Result<Individual> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {id} = ?1
        "#,
        projection = Individual::projection(),
        table = schema::TABLE_NAME,
        id = Columns::Id.as_str(),
    );
    conn.query_row(&sql, params![id], Individual::mapper())
        .map_err(Into::into)
}

pub fn select_all(conn: &Connection) -> Result<Vec<Individual>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            ORDER BY {id}
        "#,
        projection = Individual::projection(),
        table = schema::TABLE_NAME,
        id = Columns::Id.as_str(),
    );
    Ok(conn
        .prepare(&sql)?
        .query_map(params![], Individual::mapper())?
        .collect::<Result<Vec<_>, _>>()?)
}

pub fn select_by_user_id(user_id: &str, conn: &Connection) -> Result<Option<Individual>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {user_id} = ?1
        "#,
        projection = Individual::projection(),
        table = schema::TABLE_NAME,
        user_id = Columns::UserId.as_str(),
    );
    conn.query_row(&sql, params![user_id], Individual::mapper())
        .optional()
        .map_err(Into::into)
}

pub fn select_by_report_id(report_id: &str, conn: &Connection) -> Result<Option<Individual>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {report_id} = ?1
        "#,
        projection = Individual::projection(),
        table = schema::TABLE_NAME,
        report_id = Columns::ReportId.as_str(),
    );
    conn.query_row(&sql, params![report_id], Individual::mapper())
        .optional()
        .map_err(Into::into)
}

pub fn select_tests(individual_id: i64, conn: &Connection) -> Result<Vec<IndividualTest>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {individual_id} = ?1
            ORDER BY {date}
        "#,
        projection = IndividualTest::projection(),
        table = schema::TEST_TABLE_NAME,
        individual_id = TestColumns::IndividualId.as_str(),
        date = TestColumns::Date.as_str(),
    );
    Ok(conn
        .prepare(&sql)?
        .query_map(params![individual_id], IndividualTest::mapper())?
        .collect::<Result<Vec<_>, _>>()?)
}

fn select_test(
    individual_id: i64,
    result_test_id: &str,
    conn: &Connection,
) -> Result<Option<IndividualTest>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {individual_id} = ?1 AND {result_test_id} = ?2
        "#,
        projection = IndividualTest::projection(),
        table = schema::TEST_TABLE_NAME,
        individual_id = TestColumns::IndividualId.as_str(),
        result_test_id = TestColumns::ResultTestId.as_str(),
    );
    conn.query_row(
        &sql,
        params![individual_id, result_test_id],
        IndividualTest::mapper(),
    )
    .optional()
    .map_err(Into::into)
}

fn select_test_by_id(id: i64, conn: &Connection) -> Result<IndividualTest> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {id} = ?1
        "#,
        projection = IndividualTest::projection(),
        table = schema::TEST_TABLE_NAME,
        id = TestColumns::Id.as_str(),
    );
    conn.query_row(&sql, params![id], IndividualTest::mapper())
        .map_err(Into::into)
}

fn update_day_counts(
    individual_id: i64,
    total_days: i64,
    attend_test_days: i64,
    not_attend_test_days: i64,
    conn: &Connection,
) -> Result<()> {
    let sql = format!(
        r#"
            UPDATE {table}
            SET {total_days} = :total_days,
                {attend} = :attend,
                {not_attend} = :not_attend
            WHERE {id} = :id
        "#,
        table = schema::TABLE_NAME,
        total_days = Columns::TotalDays.as_str(),
        attend = Columns::AttendTestDays.as_str(),
        not_attend = Columns::NotAttendTestDays.as_str(),
        id = Columns::Id.as_str(),
    );
    conn.execute(
        &sql,
        named_params! {
            ":total_days": total_days,
            ":attend": attend_test_days,
            ":not_attend": not_attend_test_days,
            ":id": individual_id,
        },
    )?;
    Ok(())
}

fn apply_report_patch(individual_id: i64, patch: &ReportPatch, conn: &Connection) -> Result<()> {
    let report = select_by_id(individual_id, conn)?;
    let sql = format!(
        r#"
            UPDATE {table}
            SET {module_name} = :module_name,
                {module_id} = :module_id,
                {module_poc_name} = :module_poc_name,
                {module_poc_id} = :module_poc_id,
                {user_name} = :user_name
            WHERE {id} = :id
        "#,
        table = schema::TABLE_NAME,
        module_name = Columns::ModuleName.as_str(),
        module_id = Columns::ModuleId.as_str(),
        module_poc_name = Columns::ModulePocName.as_str(),
        module_poc_id = Columns::ModulePocId.as_str(),
        user_name = Columns::UserName.as_str(),
        id = Columns::Id.as_str(),
    );
    conn.execute(
        &sql,
        named_params! {
            ":module_name": patch.module_name.as_deref().unwrap_or(&report.module_name),
            ":module_id": patch.module_id.as_deref().unwrap_or(&report.module_id),
            ":module_poc_name": patch
                .module_poc_name
                .as_deref()
                .unwrap_or(&report.module_poc_name),
            ":module_poc_id": patch
                .module_poc_id
                .as_deref()
                .unwrap_or(&report.module_poc_id),
            ":user_name": patch.user_name.as_deref().unwrap_or(&report.user_name),
            ":id": individual_id,
        },
    )?;
    Ok(())
}

fn touch(individual_id: i64, conn: &Connection) -> Result<()> {
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
    conn.execute(&sql, params![individual_id])?;
    Ok(())
}
