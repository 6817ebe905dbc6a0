use super::queries::{self, ResultFields, ResultPatch};
use super::schema::ResultRecord;
use crate::Result;
use deadpool_sqlite::Pool;

pub async fn insert(fields: ResultFields, pool: &Pool) -> Result<ResultRecord> {
    pool.get()
        .await?
        .interact(move |conn| queries::insert(&fields, conn))
        .await?
}

pub async fn insert_many(batch: Vec<ResultFields>, pool: &Pool) -> Result<Vec<ResultRecord>> {
    pool.get()
        .await?
        .interact(move |conn| queries::insert_many(&batch, conn))
        .await?
}

pub async fn select_all(pool: &Pool) -> Result<Vec<ResultRecord>> {
    pool.get()
        .await?
        .interact(|conn| queries::select_all(conn))
        .await?
}

pub async fn select_by_user_id(user_id: String, pool: &Pool) -> Result<Vec<ResultRecord>> {
    pool.get()
        .await?
        .interact(move |conn| queries::select_by_user_id(&user_id, conn))
        .await?
}

pub async fn select_by_user_and_test(
    user_id: String,
    test_id: String,
    pool: &Pool,
) -> Result<Vec<ResultRecord>> {
    pool.get()
        .await?
        .interact(move |conn| queries::select_by_user_and_test(&user_id, &test_id, conn))
        .await?
}

pub async fn exists(user_id: String, test_id: String, pool: &Pool) -> Result<bool> {
    pool.get()
        .await?
        .interact(move |conn| queries::exists(&user_id, &test_id, conn))
        .await?
}

pub async fn update_by_result_id(
    result_id: String,
    patch: ResultPatch,
    pool: &Pool,
) -> Result<Option<ResultRecord>> {
    pool.get()
        .await?
        .interact(move |conn| queries::update_by_result_id(&result_id, &patch, conn))
        .await?
}

pub async fn delete_by_result_id(result_id: String, pool: &Pool) -> Result<Option<ResultRecord>> {
    pool.get()
        .await?
        .interact(move |conn| queries::delete_by_result_id(&result_id, conn))
        .await?
}
