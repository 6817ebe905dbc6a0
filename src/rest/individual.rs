use crate::db::individual::queries::{self, NewTest, ReportFields, ReportPatch, TestPatch};
use crate::db::individual::queries_async;
use crate::db::individual::schema::{Individual, IndividualTest};
use crate::registry::{self, Registry};
use crate::upstream;
use crate::window::{self, DurationWindow};
use crate::{Error, Result};
use actix_web::web::{Data, Json, Path};
use actix_web::{delete, get, post, put, HttpResponse};
use deadpool_sqlite::Pool;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize)]
pub struct GetItem {
    pub report_id: String,
    pub user_id: String,
    pub user_name: String,
    pub module_name: String,
    pub module_id: String,
    pub org_id: String,
    pub college_name: String,
    pub module_poc_name: String,
    pub module_poc_id: String,
    pub module_duration: String,
    pub tests: Vec<TestItem>,
    pub details: Details,
}

#[derive(Serialize)]
pub struct TestItem {
    pub result_test_id: String,
    pub date: String,
    pub result_mcq_score: f64,
    pub result_coding_score: f64,
    pub scored_mark: f64,
    pub total_mark: f64,
}

#[derive(Serialize)]
pub struct Details {
    pub total_days: i64,
    pub attend_test_days: i64,
    pub not_attend_test_days: i64,
    pub aggregate_score: Option<f64>,
}

impl GetItem {
    fn new(report: Individual, tests: Vec<IndividualTest>) -> GetItem {
        GetItem {
            report_id: report.report_id,
            user_id: report.user_id,
            user_name: report.user_name,
            module_name: report.module_name,
            module_id: report.module_id,
            org_id: report.org_id,
            college_name: report.college_name,
            module_poc_name: report.module_poc_name,
            module_poc_id: report.module_poc_id,
            module_duration: report.module_duration,
            tests: tests
                .into_iter()
                .map(|test| TestItem {
                    result_test_id: test.result_test_id,
                    date: test.date.to_string(),
                    result_mcq_score: test.result_mcq_score,
                    result_coding_score: test.result_coding_score,
                    scored_mark: test.scored_mark,
                    total_mark: test.total_mark,
                })
                .collect(),
            details: Details {
                total_days: report.total_days,
                attend_test_days: report.attend_test_days,
                not_attend_test_days: report.not_attend_test_days,
                aggregate_score: report.aggregate_score,
            },
        }
    }
}

fn load_item(report: Individual, conn: &Connection) -> Result<GetItem> {
    let tests = queries::select_tests(report.id, conn)?;
    Ok(GetItem::new(report, tests))
}

#[derive(Deserialize)]
pub struct PostArgs {
    user_id: String,
    result_test_id: String,
    module_id: String,
    org_id: String,
    module_poc_id: String,
    module_name: Option<String>,
    user_name: Option<String>,
    college_name: Option<String>,
    module_poc_name: Option<String>,
    module_duration: Option<String>,
    date: Option<String>,
    result_mcq_score: Option<f64>,
    result_coding_score: Option<f64>,
    total_mark: Option<f64>,
    aggregate_score: Option<f64>,
}

/// Fills the name fields the caller left out from the sibling services.
/// Write-path enrichment is strict, an unreachable service fails the request.
async fn enrich(args: PostArgs, registry: &Registry) -> Result<(ReportFields, PostArgs)> {
    let mut module_name = args.module_name.clone();
    let mut module_duration = args.module_duration.clone();
    if module_name.is_none() || module_duration.is_none() {
        let module = upstream::module_by_id(registry, &args.module_id).await?;
        module_name = module_name.or(module.mod_name);
        module_duration = module_duration.or(module.mod_duration);
    }
    let college_name = match &args.college_name {
        Some(college_name) => college_name.clone(),
        None => upstream::org_by_id(registry, &args.org_id)
            .await?
            .org_name
            .ok_or_else(|| Error::NotFound("Organization name not found".into()))?,
    };
    let user_name = match &args.user_name {
        Some(user_name) => user_name.clone(),
        None => upstream::user_by_id(registry, &args.user_id)
            .await?
            .full_name
            .ok_or_else(|| Error::NotFound("User name not found".into()))?,
    };
    let module_poc_name = match &args.module_poc_name {
        Some(module_poc_name) => module_poc_name.clone(),
        None => upstream::poc_by_id(registry, &args.module_poc_id)
            .await?
            .mod_poc_name
            .unwrap_or_default(),
    };
    let fields = ReportFields {
        user_id: args.user_id.clone(),
        user_name,
        module_name: module_name.unwrap_or_default(),
        module_id: args.module_id.clone(),
        org_id: args.org_id.clone(),
        college_name,
        module_poc_name,
        module_poc_id: args.module_poc_id.clone(),
        module_duration: module_duration.unwrap_or_default(),
        aggregate_score: args.aggregate_score,
    };
    Ok((fields, args))
}

#[post("/post-individual")]
pub async fn post(
    args: Json<PostArgs>,
    pool: Data<Pool>,
    registry: Data<Registry>,
) -> Result<HttpResponse, Error> {
    let date = window::normalize_test_date(args.date.as_deref())?;
    let (fields, args) = enrich(args.into_inner(), &registry).await?;
    let window = DurationWindow::parse(&fields.module_duration)?;
    if !window.contains(date) {
        return Err(Error::InvalidInput(format!(
            "Test date {} is not within the module duration ({})",
            window::format_dmy(date),
            window.label(),
        )));
    }
    let test = NewTest {
        result_test_id: args.result_test_id,
        date,
        result_mcq_score: args.result_mcq_score.unwrap_or(0.0),
        result_coding_score: args.result_coding_score.unwrap_or(0.0),
        total_mark: args.total_mark.unwrap_or(100.0),
    };
    let (report, tests) = queries_async::record_test(fields, test, window, &pool).await?;
    Ok(HttpResponse::Created().json(GetItem::new(report, tests)))
}

#[get("/get-all-individual")]
pub async fn get_all(pool: Data<Pool>) -> Result<Json<Vec<GetItem>>, Error> {
    let items = pool
        .get()
        .await?
        .interact(|conn| {
            queries::select_all(conn)?
                .into_iter()
                .map(|it| load_item(it, conn))
                .collect::<Result<Vec<_>>>()
        })
        .await??;
    Ok(Json(items))
}

#[get("/get-by-id-individual/{user_id}")]
pub async fn get_by_user_id(user_id: Path<String>, pool: Data<Pool>) -> Result<Json<GetItem>, Error> {
    let user_id = user_id.into_inner();
    let item = pool
        .get()
        .await?
        .interact(move |conn| {
            queries::select_by_user_id(&user_id, conn)?
                .ok_or_else(|| Error::NotFound("No reports found for this user".into()))
                .and_then(|it| load_item(it, conn))
        })
        .await??;
    Ok(Json(item))
}

#[get("/get-by-report-id/{report_id}")]
pub async fn get_by_report_id(
    report_id: Path<String>,
    pool: Data<Pool>,
) -> Result<Json<GetItem>, Error> {
    let report_id = report_id.into_inner();
    let item = pool
        .get()
        .await?
        .interact(move |conn| {
            queries::select_by_report_id(&report_id, conn)?
                .ok_or_else(|| Error::NotFound("No reports found for this user".into()))
                .and_then(|it| load_item(it, conn))
        })
        .await??;
    Ok(Json(item))
}

#[derive(Deserialize)]
pub struct UpdateArgs {
    user_id: String,
    result_test_id: String,
    date: Option<String>,
    result_mcq_score: Option<f64>,
    result_coding_score: Option<f64>,
    total_mark: Option<f64>,
    module_name: Option<String>,
    module_id: Option<String>,
    module_poc_name: Option<String>,
    module_poc_id: Option<String>,
    user_name: Option<String>,
}

#[put("/update-individual")]
pub async fn update(args: Json<UpdateArgs>, pool: Data<Pool>) -> Result<Json<GetItem>, Error> {
    let args = args.into_inner();
    let date = match args.date.as_deref() {
        Some(raw) => Some(window::parse_flexible(raw)?),
        None => None,
    };
    let patch = TestPatch {
        date,
        result_mcq_score: args.result_mcq_score,
        result_coding_score: args.result_coding_score,
        total_mark: args.total_mark,
    };
    let report_patch = ReportPatch {
        module_name: args.module_name,
        module_id: args.module_id,
        module_poc_name: args.module_poc_name,
        module_poc_id: args.module_poc_id,
        user_name: args.user_name,
    };
    let (report, tests) =
        queries_async::update_test(args.user_id, args.result_test_id, patch, report_patch, &pool)
            .await?;
    Ok(Json(GetItem::new(report, tests)))
}

#[derive(Serialize)]
pub struct DeleteTestResponse {
    pub message: String,
    #[serde(rename = "updatedReport")]
    pub updated_report: GetItem,
}

#[delete("/delete-test/{user_id}/{result_test_id}")]
pub async fn delete_test(
    path: Path<(String, String)>,
    pool: Data<Pool>,
) -> Result<Json<DeleteTestResponse>, Error> {
    let (user_id, result_test_id) = path.into_inner();
    let (report, tests) = queries_async::delete_test(user_id, result_test_id, &pool).await?;
    Ok(Json(DeleteTestResponse {
        message: "Test deleted successfully".into(),
        updated_report: GetItem::new(report, tests),
    }))
}

#[derive(Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[delete("/delete-user/{user_id}")]
pub async fn delete_user(user_id: Path<String>, pool: Data<Pool>) -> Result<Json<Message>, Error> {
    let user_id = user_id.into_inner();
    if !queries_async::delete_by_user_id(user_id.clone(), &pool).await? {
        return Err(Error::NotFound("User not found".into()));
    }
    Ok(Json(Message {
        message: format!("User report with user_id '{user_id}' deleted successfully"),
    }))
}

#[get("/get-user-details-by-user-id/{user_id}")]
pub async fn get_user_details(
    user_id: Path<String>,
    registry: Data<Registry>,
) -> Result<Json<Value>, Error> {
    let res = upstream::proxy(
        &registry,
        registry::USER_SERVICE,
        &format!("/user/get_user_by_id/{user_id}"),
    )
    .await?;
    Ok(Json(res))
}

#[get("/get-by-mod-id_express_mod/{module_id}")]
pub async fn get_module_details(
    module_id: Path<String>,
    registry: Data<Registry>,
) -> Result<Json<Value>, Error> {
    let res = upstream::proxy(
        &registry,
        registry::MODULE_SERVICE,
        &format!("/modules/get_module_by_id/{module_id}"),
    )
    .await?;
    Ok(Json(res))
}

#[get("/get_org_by_org_id/{org_id}")]
pub async fn get_org_details(
    org_id: Path<String>,
    registry: Data<Registry>,
) -> Result<Json<Value>, Error> {
    let res = upstream::proxy(
        &registry,
        registry::MODULE_SERVICE,
        &format!("/organization/get_org_by_id/{org_id}"),
    )
    .await?;
    Ok(Json(res))
}

#[get("/get_poc_by_poc_id/{module_poc_id}")]
pub async fn get_poc_details(
    module_poc_id: Path<String>,
    registry: Data<Registry>,
) -> Result<Json<Value>, Error> {
    let res = upstream::proxy(
        &registry,
        registry::POC_SERVICE,
        &format!("/poc/get_poc_by_poc_id/{module_poc_id}"),
    )
    .await?;
    Ok(Json(res))
}

#[cfg(test)]
mod test {
    use crate::registry::Registry;
    use crate::test::mock_state;
    use crate::Result;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use actix_web::web::{scope, Data};
    use actix_web::{test, App};
    use serde_json::{json, Value};

    fn post_body(result_test_id: &str, date: &str) -> Value {
        json!({
            "user_id": "user-1",
            "result_test_id": result_test_id,
            "module_id": "mod-1",
            "org_id": "org-1",
            "module_poc_id": "poc-1",
            "module_name": "Rust 101",
            "user_name": "Jordan",
            "college_name": "Ferris College",
            "module_poc_name": "Alice",
            "module_duration": "01/02/2025 - 10/02/2025",
            "date": date,
            "result_mcq_score": 40,
            "result_coding_score": 35,
            "total_mark": 100,
        })
    }

    macro_rules! mock_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(Data::new($state.pool.clone()))
                    .app_data(Data::new(Registry::new("http://127.0.0.1:9")))
                    .service(
                        scope("/individual")
                            .service(super::post)
                            .service(super::get_all)
                            .service(super::get_by_user_id)
                            .service(super::get_by_report_id)
                            .service(super::update)
                            .service(super::delete_test)
                            .service(super::delete_user),
                    ),
            )
        };
    }

    #[actix_web::test]
    async fn post_creates_then_appends() -> Result<()> {
        let state = mock_state();
        let app = mock_app!(state).await;
        let req = TestRequest::post()
            .uri("/individual/post-individual")
            .set_json(post_body("test-1", "03/02/2025"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::CREATED, res.status());
        let body: Value = test::read_body_json(res).await;
        assert_eq!(10, body["details"]["total_days"]);
        assert_eq!(1, body["details"]["attend_test_days"]);
        assert_eq!(9, body["details"]["not_attend_test_days"]);
        assert_eq!(75.0, body["tests"][0]["scored_mark"]);

        let req = TestRequest::post()
            .uri("/individual/post-individual")
            .set_json(post_body("test-2", "05/02/2025"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(2, body["details"]["attend_test_days"]);
        assert_eq!(2, body["tests"].as_array().unwrap().len());
        Ok(())
    }

    #[actix_web::test]
    async fn post_rejects_date_outside_window() -> Result<()> {
        let state = mock_state();
        let app = mock_app!(state).await;
        let req = TestRequest::post()
            .uri("/individual/post-individual")
            .set_json(post_body("test-1", "15/03/2025"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::BAD_REQUEST, res.status());
        let body: Value = test::read_body_json(res).await;
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("01/02/2025 - 10/02/2025"));
        Ok(())
    }

    #[actix_web::test]
    async fn post_duplicate_date_conflicts() -> Result<()> {
        let state = mock_state();
        let app = mock_app!(state).await;
        let req = TestRequest::post()
            .uri("/individual/post-individual")
            .set_json(post_body("test-1", "03/02/2025"))
            .to_request();
        assert_eq!(
            StatusCode::CREATED,
            test::call_service(&app, req).await.status(),
        );
        let req = TestRequest::post()
            .uri("/individual/post-individual")
            .set_json(post_body("test-2", "03/02/2025"))
            .to_request();
        assert_eq!(
            StatusCode::CONFLICT,
            test::call_service(&app, req).await.status(),
        );
        Ok(())
    }

    #[actix_web::test]
    async fn get_by_user_and_report_id() -> Result<()> {
        let state = mock_state();
        let app = mock_app!(state).await;
        let req = TestRequest::post()
            .uri("/individual/post-individual")
            .set_json(post_body("test-1", "03/02/2025"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let report_id = body["report_id"].as_str().unwrap().to_string();

        let req = TestRequest::get()
            .uri("/individual/get-by-id-individual/user-1")
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!("Jordan", res["user_name"]);

        let req = TestRequest::get()
            .uri(&format!("/individual/get-by-report-id/{report_id}"))
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!("user-1", res["user_id"]);

        let req = TestRequest::get()
            .uri("/individual/get-by-id-individual/ghost")
            .to_request();
        assert_eq!(
            StatusCode::NOT_FOUND,
            test::call_service(&app, req).await.status(),
        );
        Ok(())
    }

    #[actix_web::test]
    async fn update_and_delete_test() -> Result<()> {
        let state = mock_state();
        let app = mock_app!(state).await;
        let req = TestRequest::post()
            .uri("/individual/post-individual")
            .set_json(post_body("test-1", "03/02/2025"))
            .to_request();
        assert_eq!(
            StatusCode::CREATED,
            test::call_service(&app, req).await.status(),
        );
        let req = TestRequest::put()
            .uri("/individual/update-individual")
            .set_json(json!({
                "user_id": "user-1",
                "result_test_id": "test-1",
                "result_mcq_score": 10,
                "module_name": "Rust 201",
            }))
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!("Rust 201", res["module_name"]);
        assert_eq!(45.0, res["tests"][0]["scored_mark"]);

        let req = TestRequest::delete()
            .uri("/individual/delete-test/user-1/test-1")
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(0, res["updatedReport"]["details"]["attend_test_days"]);

        let req = TestRequest::delete()
            .uri("/individual/delete-user/user-1")
            .to_request();
        assert_eq!(StatusCode::OK, test::call_service(&app, req).await.status());
        let req = TestRequest::delete()
            .uri("/individual/delete-user/user-1")
            .to_request();
        assert_eq!(
            StatusCode::NOT_FOUND,
            test::call_service(&app, req).await.status(),
        );
        Ok(())
    }
}
