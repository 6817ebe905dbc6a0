use super::queries::{self, CertificatePatch};
use super::schema::Certificate;
use crate::Result;
use deadpool_sqlite::Pool;

pub async fn insert(
    certificate_user_id: String,
    certificate_mod_id: String,
    certificate_poc_id: String,
    certificate_generated_date: String,
    pool: &Pool,
) -> Result<Certificate> {
    pool.get()
        .await?
        .interact(move |conn| {
            queries::insert(
                &certificate_user_id,
                &certificate_mod_id,
                &certificate_poc_id,
                &certificate_generated_date,
                conn,
            )
        })
        .await?
}

pub async fn select_all(pool: &Pool) -> Result<Vec<Certificate>> {
    pool.get()
        .await?
        .interact(|conn| queries::select_all(conn))
        .await?
}

pub async fn select_by_user_id(user_id: String, pool: &Pool) -> Result<Vec<Certificate>> {
    pool.get()
        .await?
        .interact(move |conn| queries::select_by_user_id(&user_id, conn))
        .await?
}

pub async fn select_first_by_user_id(user_id: String, pool: &Pool) -> Result<Option<Certificate>> {
    pool.get()
        .await?
        .interact(move |conn| queries::select_first_by_user_id(&user_id, conn))
        .await?
}

pub async fn select_first_by_mod_id(mod_id: String, pool: &Pool) -> Result<Option<Certificate>> {
    pool.get()
        .await?
        .interact(move |conn| queries::select_first_by_mod_id(&mod_id, conn))
        .await?
}

pub async fn update_by_certificate_id(
    certificate_id: i64,
    patch: CertificatePatch,
    pool: &Pool,
) -> Result<Option<Certificate>> {
    pool.get()
        .await?
        .interact(move |conn| queries::update_by_certificate_id(certificate_id, &patch, conn))
        .await?
}

pub async fn delete_by_user_id(user_id: String, pool: &Pool) -> Result<Option<Certificate>> {
    pool.get()
        .await?
        .interact(move |conn| queries::delete_by_user_id(&user_id, conn))
        .await?
}
