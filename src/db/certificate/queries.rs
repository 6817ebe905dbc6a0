use super::schema::{self, Certificate, Columns};
use crate::db;
use crate::{Error, Result};
use rand::Rng;
use rusqlite::{named_params, params, Connection, OptionalExtension};

/// How many 6-digit draws we attempt before giving up. The id space is
/// 900k wide so collisions stay rare until the table is huge.
const ID_DRAW_ATTEMPTS: usize = 16;

pub fn insert(
    certificate_user_id: &str,
    certificate_mod_id: &str,
    certificate_poc_id: &str,
    certificate_generated_date: &str,
    conn: &Connection,
) -> Result<Certificate> {
    let sql = format!(
        r#"
            INSERT INTO {table} (
                {certificate_id},
                {user_id},
                {mod_id},
                {poc_id},
                {generated_date}
            ) VALUES (
                :certificate_id,
                :user_id,
                :mod_id,
                :poc_id,
                :generated_date
            )
        "#,
        table = schema::TABLE_NAME,
        certificate_id = Columns::CertificateId.as_str(),
        user_id = Columns::CertificateUserId.as_str(),
        mod_id = Columns::CertificateModId.as_str(),
        poc_id = Columns::CertificatePocId.as_str(),
        generated_date = Columns::CertificateGeneratedDate.as_str(),
    );
    let mut rng = rand::thread_rng();
    for _ in 0..ID_DRAW_ATTEMPTS {
        let certificate_id: i64 = rng.gen_range(100_000..1_000_000);
        let res = conn.execute(
            &sql,
            named_params! {
                ":certificate_id": certificate_id,
                ":user_id": certificate_user_id,
                ":mod_id": certificate_mod_id,
                ":poc_id": certificate_poc_id,
                ":generated_date": certificate_generated_date,
            },
        );
        match res {
            Ok(_) => return select_by_id(conn.last_insert_rowid(), conn),
            Err(err) if db::is_unique_violation(&err) => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Err(Error::Generic(
        "Could not allocate a unique certificate id".into(),
    ))
}

pub fn select_by_id(id: i64, conn: &Connection) -> Result<Certificate> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {id} = ?1
        "#,
        projection = Certificate::projection(),
        table = schema::TABLE_NAME,
        id = Columns::Id.as_str(),
    );
    conn.query_row(&sql, params![id], Certificate::mapper())
        .map_err(Into::into)
}

pub fn select_all(conn: &Connection) -> Result<Vec<Certificate>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            ORDER BY {id}
        "#,
        projection = Certificate::projection(),
        table = schema::TABLE_NAME,
        id = Columns::Id.as_str(),
    );
    Ok(conn
        .prepare(&sql)?
        .query_map(params![], Certificate::mapper())?
        .collect::<Result<Vec<_>, _>>()?)
}

pub fn select_by_user_id(user_id: &str, conn: &Connection) -> Result<Vec<Certificate>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {user_id} = ?1
            ORDER BY {id}
        "#,
        projection = Certificate::projection(),
        table = schema::TABLE_NAME,
        user_id = Columns::CertificateUserId.as_str(),
        id = Columns::Id.as_str(),
    );
    Ok(conn
        .prepare(&sql)?
        .query_map(params![user_id], Certificate::mapper())?
        .collect::<Result<Vec<_>, _>>()?)
}

pub fn select_first_by_user_id(user_id: &str, conn: &Connection) -> Result<Option<Certificate>> {
    Ok(select_by_user_id(user_id, conn)?.into_iter().next())
}

pub fn select_first_by_mod_id(mod_id: &str, conn: &Connection) -> Result<Option<Certificate>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {mod_id} = ?1
            ORDER BY {id}
            LIMIT 1
        "#,
        projection = Certificate::projection(),
        table = schema::TABLE_NAME,
        mod_id = Columns::CertificateModId.as_str(),
        id = Columns::Id.as_str(),
    );
    conn.query_row(&sql, params![mod_id], Certificate::mapper())
        .optional()
        .map_err(Into::into)
}

pub struct CertificatePatch {
    pub certificate_user_id: Option<String>,
    pub certificate_mod_id: Option<String>,
    pub certificate_poc_id: Option<String>,
    pub certificate_generated_date: Option<String>,
    pub certificate_url: Option<String>,
}

pub fn update_by_certificate_id(
    certificate_id: i64,
    patch: &CertificatePatch,
    conn: &Connection,
) -> Result<Option<Certificate>> {
    let select_sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {certificate_id} = ?1
        "#,
        projection = Certificate::projection(),
        table = schema::TABLE_NAME,
        certificate_id = Columns::CertificateId.as_str(),
    );
    let current = conn
        .query_row(&select_sql, params![certificate_id], Certificate::mapper())
        .optional()?;
    let current = match current {
        Some(current) => current,
        None => return Ok(None),
    };
    let sql = format!(
        r#"
            UPDATE {table}
            SET {user_id} = :user_id,
                {mod_id} = :mod_id,
                {poc_id} = :poc_id,
                {generated_date} = :generated_date,
                {url} = :url
            WHERE {id} = :id
        "#,
        table = schema::TABLE_NAME,
        user_id = Columns::CertificateUserId.as_str(),
        mod_id = Columns::CertificateModId.as_str(),
        poc_id = Columns::CertificatePocId.as_str(),
        generated_date = Columns::CertificateGeneratedDate.as_str(),
        url = Columns::CertificateUrl.as_str(),
        id = Columns::Id.as_str(),
    );
    conn.execute(
        &sql,
        named_params! {
            ":user_id": patch
                .certificate_user_id
                .as_deref()
                .unwrap_or(&current.certificate_user_id),
            ":mod_id": patch
                .certificate_mod_id
                .as_deref()
                .unwrap_or(&current.certificate_mod_id),
            ":poc_id": patch
                .certificate_poc_id
                .as_deref()
                .unwrap_or(&current.certificate_poc_id),
            ":generated_date": patch
                .certificate_generated_date
                .as_deref()
                .unwrap_or(&current.certificate_generated_date),
            ":url": patch
                .certificate_url
                .as_deref()
                .unwrap_or(&current.certificate_url),
            ":id": current.id,
        },
    )?;
    Ok(Some(select_by_id(current.id, conn)?))
}

pub fn delete_by_user_id(user_id: &str, conn: &Connection) -> Result<Option<Certificate>> {
    let deleted = match select_first_by_user_id(user_id, conn)? {
        Some(certificate) => certificate,
        None => return Ok(None),
    };
    let sql = format!(
        r#"
            DELETE FROM {table}
            WHERE {id} = ?1
        "#,
        table = schema::TABLE_NAME,
        id = Columns::Id.as_str(),
    );
    conn.execute(&sql, params![deleted.id])?;
    Ok(Some(deleted))
}

#[cfg(test)]
mod test {
    use super::CertificatePatch;
    use crate::test::mock_conn;
    use crate::Result;

    #[test]
    fn insert_generates_six_digit_id() -> Result<()> {
        let conn = mock_conn();
        let certificate = super::insert("user-1", "mod-1", "poc-1", "27/08/2026", &conn)?;
        assert!((100_000..1_000_000).contains(&certificate.certificate_id));
        assert_eq!("", certificate.certificate_url);
        Ok(())
    }

    #[test]
    fn ids_are_unique_across_inserts() -> Result<()> {
        let conn = mock_conn();
        let mut seen = std::collections::HashSet::new();
        for i in 0..50 {
            let certificate =
                super::insert(&format!("user-{i}"), "mod-1", "poc-1", "27/08/2026", &conn)?;
            assert!(seen.insert(certificate.certificate_id));
        }
        Ok(())
    }

    #[test]
    fn update_by_certificate_id_patches_url() -> Result<()> {
        let conn = mock_conn();
        let certificate = super::insert("user-1", "mod-1", "poc-1", "27/08/2026", &conn)?;
        let patch = CertificatePatch {
            certificate_user_id: None,
            certificate_mod_id: None,
            certificate_poc_id: None,
            certificate_generated_date: None,
            certificate_url: Some("https://certs.example.com/1".into()),
        };
        let updated = super::update_by_certificate_id(certificate.certificate_id, &patch, &conn)?
            .expect("certificate should exist");
        assert_eq!("https://certs.example.com/1", updated.certificate_url);
        assert_eq!(certificate.certificate_user_id, updated.certificate_user_id);
        Ok(())
    }

    #[test]
    fn update_unknown_certificate_id() -> Result<()> {
        let conn = mock_conn();
        let patch = CertificatePatch {
            certificate_user_id: None,
            certificate_mod_id: None,
            certificate_poc_id: None,
            certificate_generated_date: None,
            certificate_url: Some("x".into()),
        };
        assert!(super::update_by_certificate_id(123456, &patch, &conn)?.is_none());
        Ok(())
    }

    #[test]
    fn delete_by_user_id_returns_deleted_row() -> Result<()> {
        let conn = mock_conn();
        let certificate = super::insert("user-1", "mod-1", "poc-1", "27/08/2026", &conn)?;
        let deleted = super::delete_by_user_id("user-1", &conn)?.expect("should delete");
        assert_eq!(certificate, deleted);
        assert!(super::delete_by_user_id("user-1", &conn)?.is_none());
        Ok(())
    }
}
