use super::queries::{self, OverallFields, OverallPatch};
use super::schema::Overall;
use crate::Result;
use deadpool_sqlite::Pool;

pub async fn insert(fields: OverallFields, pool: &Pool) -> Result<Overall> {
    pool.get()
        .await?
        .interact(move |conn| queries::insert(&fields, conn))
        .await?
}

pub async fn select_all(pool: &Pool) -> Result<Vec<Overall>> {
    pool.get()
        .await?
        .interact(|conn| queries::select_all(conn))
        .await?
}

pub async fn select_by_student_id(student_id: String, pool: &Pool) -> Result<Option<Overall>> {
    pool.get()
        .await?
        .interact(move |conn| queries::select_by_student_id(&student_id, conn))
        .await?
}

pub async fn select_first_by_report_mod(
    report_mod: String,
    pool: &Pool,
) -> Result<Option<Overall>> {
    pool.get()
        .await?
        .interact(move |conn| queries::select_first_by_report_mod(&report_mod, conn))
        .await?
}

pub async fn update_by_student_id(
    student_id: String,
    patch: OverallPatch,
    pool: &Pool,
) -> Result<Option<Overall>> {
    pool.get()
        .await?
        .interact(move |conn| queries::update_by_student_id(&student_id, &patch, conn))
        .await?
}

pub async fn delete_by_student_id(student_id: String, pool: &Pool) -> Result<bool> {
    pool.get()
        .await?
        .interact(move |conn| queries::delete_by_student_id(&student_id, conn))
        .await?
}
