use crate::conf::Conf;
use crate::db::migration;
use crate::registry::Registry;
use crate::rest::{attendance, certificates, individual, overall, results};
use crate::{db, error, Result};
use actix_web::middleware::{Compress, NormalizePath};
use actix_web::web::{scope, Data, JsonConfig, QueryConfig};
use actix_web::{App, HttpServer};
use tracing::info;

pub async fn run() -> Result<()> {
    let conf = Conf::from_env()?;
    // All the worker threads are sharing a single connection pool
    let pool = db::pool(&conf)?;
    pool.get().await?.interact(migration::run).await??;
    let registry = Registry::new(conf.registry_url.clone());

    info!(conf.http_port, "Starting HTTP server");
    HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::trim())
            .wrap(Compress::default())
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(registry.clone()))
            .app_data(QueryConfig::default().error_handler(error::query_error_handler))
            .app_data(JsonConfig::default().error_handler(error::json_error_handler))
            .service(
                scope("attendance")
                    .service(attendance::get_all)
                    .service(attendance::get_by_mod_and_class)
                    .service(attendance::post)
                    .service(attendance::update_by_date)
                    .service(attendance::delete_by_date),
            )
            .service(
                scope("certificates")
                    .service(certificates::post)
                    .service(certificates::get_with_result_by_user_id)
                    .service(certificates::get_all_with_results)
                    .service(certificates::get_all_with_users)
                    .service(certificates::get_by_user_id_with_user)
                    .service(certificates::get_all_with_modules)
                    .service(certificates::get_by_mod_id_with_module)
                    .service(certificates::update)
                    .service(certificates::delete_by_user_id),
            )
            .service(
                scope("individual")
                    .service(individual::post)
                    .service(individual::get_all)
                    .service(individual::get_by_user_id)
                    .service(individual::get_by_report_id)
                    .service(individual::update)
                    .service(individual::delete_test)
                    .service(individual::delete_user)
                    .service(individual::get_user_details)
                    .service(individual::get_module_details)
                    .service(individual::get_org_details)
                    .service(individual::get_poc_details),
            )
            .service(
                scope("results")
                    .service(results::get_all)
                    .service(results::post)
                    .service(results::post_bulk)
                    .service(results::update)
                    .service(results::delete_by_result_id)
                    .service(results::get_by_user_id)
                    .service(results::check)
                    .service(results::get_by_user_and_test)
                    .service(results::list_by_user_id)
                    .service(results::aggregate_scores),
            )
            .service(
                scope("overall")
                    .service(overall::post)
                    .service(overall::update)
                    .service(overall::get_all)
                    .service(overall::total_marks_by_module)
                    .service(overall::delete_by_student_id)
                    // registered last, the path pattern matches everything
                    .service(overall::get_by_student_id),
            )
    })
    .bind(("0.0.0.0", conf.http_port))?
    .run()
    .await?;
    Ok(())
}
