use crate::Result;
use std::env;
use std::fs::create_dir_all;
use std::path::PathBuf;

pub struct Conf {
    pub http_port: u16,
    pub registry_url: String,
    pub db_path: PathBuf,
}

impl Conf {
    pub fn from_env() -> Result<Conf> {
        let http_port = match env::var("PORT") {
            Ok(port) => port
                .parse()
                .map_err(|_| format!("Invalid PORT value: {port}"))?,
            Err(_) => 5000,
        };
        let registry_url =
            env::var("REGISTRY_URL").unwrap_or_else(|_| "http://localhost:8500".into());
        let db_path = match env::var("DB_PATH") {
            Ok(path) => path.into(),
            Err(_) => data_dir_file_path("report.db")?,
        };
        Ok(Conf {
            http_port,
            registry_url,
            db_path,
        })
    }
}

pub fn data_dir_file_path(file_name: &str) -> Result<PathBuf> {
    #[allow(deprecated)]
    let data_dir = env::home_dir()
        .ok_or("Home directory does not exist")?
        .join(".local/share/report-api");
    if !data_dir.exists() {
        create_dir_all(&data_dir)?;
    }
    Ok(data_dir.join(file_name))
}
