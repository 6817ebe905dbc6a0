use crate::db::overall::queries::{OverallFields, OverallPatch};
use crate::db::overall::queries_async;
use crate::db::overall::schema::Overall;
use crate::{Error, Result};
use actix_web::web::{Data, Json, Path};
use actix_web::{delete, get, post, put, HttpResponse};
use deadpool_sqlite::Pool;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct PostArgs {
    report_id: String,
    report_mod: String,
    report_poc: String,
    student_name: String,
    student_id: String,
    total_marks: f64,
    scored_marks: f64,
}

#[post("/post-overall")]
pub async fn post(args: Json<PostArgs>, pool: Data<Pool>) -> Result<HttpResponse, Error> {
    let args = args.into_inner();
    let fields = OverallFields {
        report_id: args.report_id,
        report_mod: args.report_mod,
        report_poc: args.report_poc,
        student_name: args.student_name,
        student_id: args.student_id,
        total_marks: args.total_marks,
        scored_marks: args.scored_marks,
    };
    let overall = queries_async::insert(fields, &pool).await?;
    Ok(HttpResponse::Created().json(overall))
}

#[derive(Deserialize)]
pub struct UpdateArgs {
    student_id: String,
    report_id: Option<String>,
    report_mod: Option<String>,
    report_poc: Option<String>,
    student_name: Option<String>,
    total_marks: Option<f64>,
    scored_marks: Option<f64>,
}

#[put("/update-overall")]
pub async fn update(args: Json<UpdateArgs>, pool: Data<Pool>) -> Result<Json<Overall>, Error> {
    let args = args.into_inner();
    let patch = OverallPatch {
        report_id: args.report_id,
        report_mod: args.report_mod,
        report_poc: args.report_poc,
        student_name: args.student_name,
        total_marks: args.total_marks,
        scored_marks: args.scored_marks,
    };
    let overall = queries_async::update_by_student_id(args.student_id, patch, &pool)
        .await?
        .ok_or_else(|| Error::NotFound("Performance data not found for this student".into()))?;
    Ok(Json(overall))
}

#[get("/get-all-overall")]
pub async fn get_all(pool: Data<Pool>) -> Result<Json<Vec<Overall>>, Error> {
    Ok(Json(queries_async::select_all(&pool).await?))
}

#[derive(Serialize, Deserialize)]
pub struct TotalMarksResponse {
    pub total_marks: f64,
}

#[get("/total-marks/{module}")]
pub async fn total_marks_by_module(
    module: Path<String>,
    pool: Data<Pool>,
) -> Result<Json<TotalMarksResponse>, Error> {
    let overall = queries_async::select_first_by_report_mod(module.into_inner(), &pool)
        .await?
        .ok_or_else(|| Error::NotFound("Module not found".into()))?;
    Ok(Json(TotalMarksResponse {
        total_marks: overall.total_marks,
    }))
}

#[get("/{student_id}")]
pub async fn get_by_student_id(
    student_id: Path<String>,
    pool: Data<Pool>,
) -> Result<Json<Vec<Overall>>, Error> {
    let overall = queries_async::select_by_student_id(student_id.into_inner(), &pool)
        .await?
        .ok_or_else(|| Error::NotFound("No performance data found for this student".into()))?;
    Ok(Json(vec![overall]))
}

#[derive(Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[delete("/delete-overall-by-stu-id/{student_id}")]
pub async fn delete_by_student_id(
    student_id: Path<String>,
    pool: Data<Pool>,
) -> Result<Json<Message>, Error> {
    if !queries_async::delete_by_student_id(student_id.into_inner(), &pool).await? {
        return Err(Error::NotFound(
            "Performance data not found for this student".into(),
        ));
    }
    Ok(Json(Message {
        message: "Performance data deleted successfully".into(),
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

    macro_rules! mock_app {
        ($state:expr) => {
            test::init_service(
                App::new().app_data(Data::new($state.pool.clone())).service(
                    scope("/overall")
                        .service(super::post)
                        .service(super::update)
                        .service(super::get_all)
                        .service(super::total_marks_by_module)
                        .service(super::delete_by_student_id)
                        .service(super::get_by_student_id),
                ),
            )
        };
    }

    fn post_body(student_id: &str) -> Value {
        json!({
            "report_id": "report-1",
            "report_mod": "Rust 101",
            "report_poc": "Alice",
            "student_name": "Jordan",
            "student_id": student_id,
            "total_marks": 300,
            "scored_marks": 200,
        })
    }

    #[actix_web::test]
    async fn post_computes_percentage_and_conflicts_on_duplicate() -> Result<()> {
        let state = mock_state();
        let app = mock_app!(state).await;
        let req = TestRequest::post()
            .uri("/overall/post-overall")
            .set_json(post_body("stu-1"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::CREATED, res.status());
        let body: Value = test::read_body_json(res).await;
        assert_eq!(66.67, body["percentage"]);

        let req = TestRequest::post()
            .uri("/overall/post-overall")
            .set_json(post_body("stu-1"))
            .to_request();
        assert_eq!(
            StatusCode::CONFLICT,
            test::call_service(&app, req).await.status(),
        );
        Ok(())
    }

    #[actix_web::test]
    async fn update_recomputes_percentage() -> Result<()> {
        let state = mock_state();
        let app = mock_app!(state).await;
        let req = TestRequest::post()
            .uri("/overall/post-overall")
            .set_json(post_body("stu-1"))
            .to_request();
        assert_eq!(
            StatusCode::CREATED,
            test::call_service(&app, req).await.status(),
        );
        let req = TestRequest::put()
            .uri("/overall/update-overall")
            .set_json(json!({ "student_id": "stu-1", "scored_marks": 150 }))
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(50.0, res["percentage"]);

        let req = TestRequest::put()
            .uri("/overall/update-overall")
            .set_json(json!({ "student_id": "ghost", "scored_marks": 150 }))
            .to_request();
        assert_eq!(
            StatusCode::NOT_FOUND,
            test::call_service(&app, req).await.status(),
        );
        Ok(())
    }

    #[actix_web::test]
    async fn lookups_and_delete() -> Result<()> {
        let state = mock_state();
        let app = mock_app!(state).await;
        let req = TestRequest::post()
            .uri("/overall/post-overall")
            .set_json(post_body("stu-1"))
            .to_request();
        assert_eq!(
            StatusCode::CREATED,
            test::call_service(&app, req).await.status(),
        );

        let req = TestRequest::get().uri("/overall/get-all-overall").to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(1, res.as_array().unwrap().len());

        let req = TestRequest::get()
            .uri("/overall/total-marks/Rust%20101")
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(300.0, res["total_marks"]);

        let req = TestRequest::get().uri("/overall/stu-1").to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!("Jordan", res[0]["student_name"]);
        let req = TestRequest::get().uri("/overall/ghost").to_request();
        assert_eq!(
            StatusCode::NOT_FOUND,
            test::call_service(&app, req).await.status(),
        );

        let req = TestRequest::delete()
            .uri("/overall/delete-overall-by-stu-id/stu-1")
            .to_request();
        assert_eq!(StatusCode::OK, test::call_service(&app, req).await.status());
        let req = TestRequest::delete()
            .uri("/overall/delete-overall-by-stu-id/stu-1")
            .to_request();
        assert_eq!(
            StatusCode::NOT_FOUND,
            test::call_service(&app, req).await.status(),
        );
        Ok(())
    }
}
