use rusqlite::Row;
use serde::Serialize;
use std::sync::OnceLock;

pub const TABLE_NAME: &str = "certificate";

pub enum Columns {
    Id,
    CertificateId,
    CertificateUserId,
    CertificateModId,
    CertificatePocId,
    CertificateGeneratedDate,
    CertificateUrl,
}

impl Columns {
    pub fn as_str(&self) -> &'static str {
        match self {
            Columns::Id => "id",
            Columns::CertificateId => "certificate_id",
            Columns::CertificateUserId => "certificate_user_id",
            Columns::CertificateModId => "certificate_mod_id",
            Columns::CertificatePocId => "certificate_poc_id",
            Columns::CertificateGeneratedDate => "certificate_generated_date",
            Columns::CertificateUrl => "certificate_url",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct Certificate {
    #[serde(skip_serializing)]
    pub id: i64,
    pub certificate_id: i64,
    pub certificate_user_id: String,
    pub certificate_mod_id: String,
    pub certificate_poc_id: String,
    pub certificate_generated_date: String,
    pub certificate_url: String,
}

impl Certificate {
    pub fn projection() -> &'static str {
        static PROJECTION: OnceLock<String> = OnceLock::new();
        PROJECTION.get_or_init(|| {
            [
                Columns::Id,
                Columns::CertificateId,
                Columns::CertificateUserId,
                Columns::CertificateModId,
                Columns::CertificatePocId,
                Columns::CertificateGeneratedDate,
                Columns::CertificateUrl,
            ]
            .iter()
            .map(Columns::as_str)
            .collect::<Vec<_>>()
            .join(", ")
        })
    }

    pub const fn mapper() -> fn(&Row) -> rusqlite::Result<Certificate> {
        |row: &_| {
            Ok(Certificate {
                id: row.get(Columns::Id.as_str())?,
                certificate_id: row.get(Columns::CertificateId.as_str())?,
                certificate_user_id: row.get(Columns::CertificateUserId.as_str())?,
                certificate_mod_id: row.get(Columns::CertificateModId.as_str())?,
                certificate_poc_id: row.get(Columns::CertificatePocId.as_str())?,
                certificate_generated_date: row.get(Columns::CertificateGeneratedDate.as_str())?,
                certificate_url: row.get(Columns::CertificateUrl.as_str())?,
            })
        }
    }
}
