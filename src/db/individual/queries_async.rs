use super::queries::{self, NewTest, ReportFields, ReportPatch, TestPatch};
use super::schema::{Individual, IndividualTest};
use crate::window::DurationWindow;
use crate::Result;
use deadpool_sqlite::Pool;

pub async fn record_test(
    fields: ReportFields,
    test: NewTest,
    window: DurationWindow,
    pool: &Pool,
) -> Result<(Individual, Vec<IndividualTest>)> {
    pool.get()
        .await?
        .interact(move |conn| queries::record_test(&fields, &test, &window, conn))
        .await?
}

pub async fn update_test(
    user_id: String,
    result_test_id: String,
    patch: TestPatch,
    report_patch: ReportPatch,
    pool: &Pool,
) -> Result<(Individual, Vec<IndividualTest>)> {
    pool.get()
        .await?
        .interact(move |conn| {
            queries::update_test(&user_id, &result_test_id, &patch, &report_patch, conn)
        })
        .await?
}

pub async fn delete_test(
    user_id: String,
    result_test_id: String,
    pool: &Pool,
) -> Result<(Individual, Vec<IndividualTest>)> {
    pool.get()
        .await?
        .interact(move |conn| queries::delete_test(&user_id, &result_test_id, conn))
        .await?
}

pub async fn delete_by_user_id(user_id: String, pool: &Pool) -> Result<bool> {
    pool.get()
        .await?
        .interact(move |conn| queries::delete_by_user_id(&user_id, conn))
        .await?
}

pub async fn select_all(pool: &Pool) -> Result<Vec<Individual>> {
    pool.get()
        .await?
        .interact(|conn| queries::select_all(conn))
        .await?
}

pub async fn select_by_user_id(user_id: String, pool: &Pool) -> Result<Option<Individual>> {
    pool.get()
        .await?
        .interact(move |conn| queries::select_by_user_id(&user_id, conn))
        .await?
}

pub async fn select_by_report_id(report_id: String, pool: &Pool) -> Result<Option<Individual>> {
    pool.get()
        .await?
        .interact(move |conn| queries::select_by_report_id(&report_id, conn))
        .await?
}

pub async fn select_tests(individual_id: i64, pool: &Pool) -> Result<Vec<IndividualTest>> {
    pool.get()
        .await?
        .interact(move |conn| queries::select_tests(individual_id, conn))
        .await?
}
