use crate::db::certificate::queries::CertificatePatch;
use crate::db::certificate::queries_async;
use crate::db::certificate::schema::Certificate;
use crate::db::result::queries_async as result_queries_async;
use crate::db::result::schema::ResultRecord;
use crate::registry::{self, Registry};
use crate::upstream;
use crate::window;
use crate::{Error, Result};
use actix_web::web::{Data, Json, Path};
use actix_web::{delete, get, post, put, HttpResponse};
use deadpool_sqlite::Pool;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

#[derive(Serialize)]
pub struct CertificateWithResults {
    #[serde(flatten)]
    pub certificate: Certificate,
    #[serde(rename = "resultDetails")]
    pub result_details: Option<Vec<ResultRecord>>,
}

#[derive(Serialize)]
pub struct CertificateWithDetails {
    #[serde(flatten)]
    pub certificate: Certificate,
    #[serde(rename = "userDetails", skip_serializing_if = "Option::is_none")]
    pub user_details: Option<Option<Value>>,
    #[serde(rename = "moduleDetails", skip_serializing_if = "Option::is_none")]
    pub module_details: Option<Option<Value>>,
}

async fn with_results(
    certificate: Certificate,
    pool: &Pool,
) -> Result<CertificateWithResults> {
    let results =
        result_queries_async::select_by_user_id(certificate.certificate_user_id.clone(), pool)
            .await?;
    Ok(CertificateWithResults {
        certificate,
        result_details: if results.is_empty() {
            None
        } else {
            Some(results)
        },
    })
}

#[derive(Deserialize)]
pub struct PostArgs {
    certificate_user_id: String,
    certificate_mod_id: String,
    certificate_poc_id: String,
}

#[derive(Serialize)]
pub struct PostResponse {
    pub message: String,
    pub certificate: Certificate,
}

#[post("/post-certificates")]
pub async fn post(args: Json<PostArgs>, pool: Data<Pool>) -> Result<HttpResponse, Error> {
    let args = args.into_inner();
    let generated_date = window::format_dmy(OffsetDateTime::now_utc().date());
    let certificate = queries_async::insert(
        args.certificate_user_id,
        args.certificate_mod_id,
        args.certificate_poc_id,
        generated_date,
        &pool,
    )
    .await?;
    Ok(HttpResponse::Created().json(PostResponse {
        message: "Certificate added successfully".into(),
        certificate,
    }))
}

#[get("/certificate-with-result/{user_id}")]
pub async fn get_with_result_by_user_id(
    user_id: Path<String>,
    pool: Data<Pool>,
) -> Result<Json<Vec<CertificateWithResults>>, Error> {
    let certificates = queries_async::select_by_user_id(user_id.into_inner(), &pool).await?;
    if certificates.is_empty() {
        return Err(Error::NotFound("No certificates found for this user".into()));
    }
    let mut res = Vec::with_capacity(certificates.len());
    for certificate in certificates {
        res.push(with_results(certificate, &pool).await?);
    }
    Ok(Json(res))
}

#[get("/all-certificates-with-results")]
pub async fn get_all_with_results(
    pool: Data<Pool>,
) -> Result<Json<Vec<CertificateWithResults>>, Error> {
    let certificates = queries_async::select_all(&pool).await?;
    let mut res = Vec::with_capacity(certificates.len());
    for certificate in certificates {
        res.push(with_results(certificate, &pool).await?);
    }
    Ok(Json(res))
}

#[get("/all-certificates-with-users")]
pub async fn get_all_with_users(
    pool: Data<Pool>,
    registry: Data<Registry>,
) -> Result<Json<Vec<CertificateWithDetails>>, Error> {
    let certificates = queries_async::select_all(&pool).await?;
    let lookups = certificates.iter().map(|certificate| {
        let path = format!("/user/get_user_by_id/{}", certificate.certificate_user_id);
        let registry = &registry;
        async move { upstream::proxy(registry, registry::USER_SERVICE, &path).await }
    });
    let users = join_all(lookups).await;
    let res = certificates
        .into_iter()
        .zip(users)
        .map(|(certificate, user)| CertificateWithDetails {
            certificate,
            user_details: Some(upstream::soft(user)),
            module_details: None,
        })
        .collect();
    Ok(Json(res))
}

#[get("/certificate_id_with_user_id/{user_id}")]
pub async fn get_by_user_id_with_user(
    user_id: Path<String>,
    pool: Data<Pool>,
    registry: Data<Registry>,
) -> Result<Json<CertificateWithDetails>, Error> {
    let certificate = queries_async::select_first_by_user_id(user_id.into_inner(), &pool)
        .await?
        .ok_or_else(|| Error::NotFound("Certificate not found".into()))?;
    let user = upstream::proxy(
        &registry,
        registry::USER_SERVICE,
        &format!("/user/get_user_by_id/{}", certificate.certificate_user_id),
    )
    .await;
    Ok(Json(CertificateWithDetails {
        certificate,
        user_details: Some(upstream::soft(user)),
        module_details: None,
    }))
}

#[get("/all_certificates_with_module")]
pub async fn get_all_with_modules(
    pool: Data<Pool>,
    registry: Data<Registry>,
) -> Result<Json<Vec<CertificateWithDetails>>, Error> {
    let certificates = queries_async::select_all(&pool).await?;
    let lookups = certificates.iter().map(|certificate| {
        let path = format!(
            "/modules/get_module_by_id/{}",
            certificate.certificate_mod_id
        );
        let registry = &registry;
        async move { upstream::proxy(registry, registry::MODULE_SERVICE, &path).await }
    });
    let modules = join_all(lookups).await;
    let res = certificates
        .into_iter()
        .zip(modules)
        .map(|(certificate, module)| CertificateWithDetails {
            certificate,
            user_details: None,
            module_details: Some(upstream::soft(module)),
        })
        .collect();
    Ok(Json(res))
}

#[get("/certificate_mod_id_with_module_id/{mod_id}")]
pub async fn get_by_mod_id_with_module(
    mod_id: Path<String>,
    pool: Data<Pool>,
    registry: Data<Registry>,
) -> Result<Json<CertificateWithDetails>, Error> {
    let certificate = queries_async::select_first_by_mod_id(mod_id.into_inner(), &pool)
        .await?
        .ok_or_else(|| Error::NotFound("Certificate not found".into()))?;
    let module = upstream::proxy(
        &registry,
        registry::MODULE_SERVICE,
        &format!(
            "/modules/get_module_by_id/{}",
            certificate.certificate_mod_id
        ),
    )
    .await;
    Ok(Json(CertificateWithDetails {
        certificate,
        user_details: None,
        module_details: Some(upstream::soft(module)),
    }))
}

#[derive(Deserialize)]
pub struct UpdateArgs {
    certificate_id: i64,
    certificate_user_id: Option<String>,
    certificate_mod_id: Option<String>,
    certificate_poc_id: Option<String>,
    certificate_generated_date: Option<String>,
    certificate_url: Option<String>,
}

#[derive(Serialize)]
pub struct UpdateResponse {
    pub message: String,
    pub certificate: Certificate,
}

#[put("/update-certificates")]
pub async fn update(
    args: Json<UpdateArgs>,
    pool: Data<Pool>,
) -> Result<Json<UpdateResponse>, Error> {
    let args = args.into_inner();
    let patch = CertificatePatch {
        certificate_user_id: args.certificate_user_id,
        certificate_mod_id: args.certificate_mod_id,
        certificate_poc_id: args.certificate_poc_id,
        certificate_generated_date: args.certificate_generated_date,
        certificate_url: args.certificate_url,
    };
    let certificate = queries_async::update_by_certificate_id(args.certificate_id, patch, &pool)
        .await?
        .ok_or_else(|| Error::NotFound("Certificate not found".into()))?;
    Ok(Json(UpdateResponse {
        message: "Certificate updated successfully".into(),
        certificate,
    }))
}

#[delete("/delete-by-cert-user-id/{certificate_user_id}")]
pub async fn delete_by_user_id(
    certificate_user_id: Path<String>,
    pool: Data<Pool>,
) -> Result<Json<UpdateResponse>, Error> {
    let certificate = queries_async::delete_by_user_id(certificate_user_id.into_inner(), &pool)
        .await?
        .ok_or_else(|| Error::NotFound("Certificate not found".into()))?;
    Ok(Json(UpdateResponse {
        message: "Certificate deleted successfully".into(),
        certificate,
    }))
}

#[cfg(test)]
mod test {
    use crate::test::mock_state;
    use crate::Result;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use actix_web::web::{scope, Data};
    use actix_web::{test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn post_update_delete_flow() -> Result<()> {
        let state = mock_state();
        let app = test::init_service(
            App::new().app_data(Data::new(state.pool)).service(
                scope("/certificates")
                    .service(super::post)
                    .service(super::update)
                    .service(super::delete_by_user_id),
            ),
        )
        .await;
        let req = TestRequest::post()
            .uri("/certificates/post-certificates")
            .set_json(json!({
                "certificate_user_id": "user-1",
                "certificate_mod_id": "mod-1",
                "certificate_poc_id": "poc-1",
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::CREATED, res.status());
        let body: Value = test::read_body_json(res).await;
        let certificate_id = body["certificate"]["certificate_id"].as_i64().unwrap();
        assert!((100_000..1_000_000).contains(&certificate_id));

        let req = TestRequest::put()
            .uri("/certificates/update-certificates")
            .set_json(json!({
                "certificate_id": certificate_id,
                "certificate_url": "https://certs.example.com/1",
            }))
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            "https://certs.example.com/1",
            res["certificate"]["certificate_url"],
        );

        let req = TestRequest::delete()
            .uri("/certificates/delete-by-cert-user-id/user-1")
            .to_request();
        assert_eq!(StatusCode::OK, test::call_service(&app, req).await.status());
        let req = TestRequest::delete()
            .uri("/certificates/delete-by-cert-user-id/user-1")
            .to_request();
        assert_eq!(
            StatusCode::NOT_FOUND,
            test::call_service(&app, req).await.status(),
        );
        Ok(())
    }

    #[actix_web::test]
    async fn certificate_with_result_joins_local_results() -> Result<()> {
        let state = mock_state();
        state
            .conn
            .execute_batch(
                r#"
                    INSERT INTO result (
                        result_id,
                        result_user_id,
                        result_test_id,
                        result_score,
                        result_total_score,
                        result_poc_id
                    ) VALUES ('res-1', 'user-1', 'test-1', 80, 100, 'poc-1');
                "#,
            )
            .unwrap();
        let app = test::init_service(
            App::new().app_data(Data::new(state.pool)).service(
                scope("/certificates")
                    .service(super::post)
                    .service(super::get_with_result_by_user_id),
            ),
        )
        .await;
        let req = TestRequest::post()
            .uri("/certificates/post-certificates")
            .set_json(json!({
                "certificate_user_id": "user-1",
                "certificate_mod_id": "mod-1",
                "certificate_poc_id": "poc-1",
            }))
            .to_request();
        assert_eq!(
            StatusCode::CREATED,
            test::call_service(&app, req).await.status(),
        );
        let req = TestRequest::get()
            .uri("/certificates/certificate-with-result/user-1")
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(1, res.as_array().unwrap().len());
        assert_eq!(80.0, res[0]["resultDetails"][0]["result_score"]);

        let req = TestRequest::get()
            .uri("/certificates/certificate-with-result/ghost")
            .to_request();
        assert_eq!(
            StatusCode::NOT_FOUND,
            test::call_service(&app, req).await.status(),
        );
        Ok(())
    }

    #[actix_web::test]
    async fn unreachable_registry_degrades_to_null_details() -> Result<()> {
        let state = mock_state();
        let registry = crate::registry::Registry::new("http://127.0.0.1:9");
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state.pool))
                .app_data(Data::new(registry))
                .service(
                    scope("/certificates")
                        .service(super::post)
                        .service(super::get_all_with_users),
                ),
        )
        .await;
        let req = TestRequest::post()
            .uri("/certificates/post-certificates")
            .set_json(json!({
                "certificate_user_id": "user-1",
                "certificate_mod_id": "mod-1",
                "certificate_poc_id": "poc-1",
            }))
            .to_request();
        assert_eq!(
            StatusCode::CREATED,
            test::call_service(&app, req).await.status(),
        );
        let req = TestRequest::get()
            .uri("/certificates/all-certificates-with-users")
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(Value::Null, res[0]["userDetails"]);
        Ok(())
    }
}
