use crate::db::attendance::queries_async;
use crate::db::attendance::schema::{Attendance, AttendanceDay};
use crate::window;
use crate::{Error, Result};
use actix_web::web::{Data, Json, Query};
use actix_web::{delete, get, post, put, HttpResponse};
use deadpool_sqlite::Pool;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct GetItem {
    pub mod_name: String,
    pub class_name: String,
    pub poc_name: String,
    pub daily_attendance: Vec<DayItem>,
}

#[derive(Serialize)]
pub struct DayItem {
    pub date: String,
    pub present_count: i64,
    pub total_students: i64,
    #[serde(rename = "attendanceRate")]
    pub attendance_rate: String,
}

impl GetItem {
    fn new(attendance: Attendance, days: Vec<AttendanceDay>) -> GetItem {
        GetItem {
            mod_name: attendance.mod_name,
            class_name: attendance.class_name,
            poc_name: attendance.poc_name,
            daily_attendance: days
                .into_iter()
                .map(|day| DayItem {
                    date: day.date.to_string(),
                    present_count: day.present_count,
                    total_students: day.total_students,
                    attendance_rate: day.rate(),
                })
                .collect(),
        }
    }
}

#[get("/get-all-attendance")]
pub async fn get_all(pool: Data<Pool>) -> Result<Json<Vec<GetItem>>, Error> {
    let items: Vec<GetItem> = queries_async::select_all_with_days(&pool)
        .await?
        .into_iter()
        .map(|(attendance, days)| GetItem::new(attendance, days))
        .collect();
    if items.is_empty() {
        return Err(Error::NotFound("No records found".into()));
    }
    Ok(Json(items))
}

#[derive(Deserialize)]
pub struct GetByModAndClassArgs {
    mod_name: String,
    class_name: String,
}

#[get("/get-by-mod-id-and-class-name")]
pub async fn get_by_mod_and_class(
    args: Query<GetByModAndClassArgs>,
    pool: Data<Pool>,
) -> Result<Json<Vec<GetItem>>, Error> {
    let args = args.into_inner();
    let items: Vec<GetItem> =
        queries_async::select_by_mod_and_class_with_days(args.mod_name, args.class_name, &pool)
            .await?
            .into_iter()
            .map(|(attendance, days)| GetItem::new(attendance, days))
            .collect();
    if items.is_empty() {
        return Err(Error::NotFound("No attendance records found".into()));
    }
    Ok(Json(items))
}

#[derive(Deserialize)]
pub struct PostArgs {
    mod_name: String,
    class_name: String,
    poc_name: String,
    date: String,
    present_count: i64,
    total_students: i64,
}

#[derive(Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[post("/post-attendance")]
pub async fn post(args: Json<PostArgs>, pool: Data<Pool>) -> Result<HttpResponse, Error> {
    let args = args.into_inner();
    if args.mod_name.is_empty() || args.class_name.is_empty() || args.poc_name.is_empty() {
        return Err(Error::InvalidInput("All fields are required".into()));
    }
    let date = window::parse_flexible(&args.date)?;
    let created = queries_async::record_day(
        args.mod_name,
        args.class_name,
        args.poc_name,
        date,
        args.present_count,
        args.total_students,
        &pool,
    )
    .await?;
    let res = if created {
        HttpResponse::Created().json(Message {
            message: "New attendance entry created".into(),
        })
    } else {
        HttpResponse::Ok().json(Message {
            message: "Attendance updated for existing record".into(),
        })
    };
    Ok(res)
}

#[derive(Deserialize)]
pub struct UpdateArgs {
    mod_name: String,
    class_name: String,
    poc_name: String,
    date: String,
    present_count: Option<i64>,
    total_students: Option<i64>,
}

#[derive(Serialize)]
pub struct UpdateResponse {
    pub message: String,
    #[serde(rename = "updatedRecord")]
    pub updated_record: GetItem,
}

#[put("/update-attendance-by-date")]
pub async fn update_by_date(
    args: Json<UpdateArgs>,
    pool: Data<Pool>,
) -> Result<Json<UpdateResponse>, Error> {
    let args = args.into_inner();
    let date = window::parse_flexible(&args.date)?;
    let (attendance, days) = queries_async::update_day_by_key(
        args.mod_name,
        args.class_name,
        args.poc_name,
        date,
        args.present_count,
        args.total_students,
        &pool,
    )
    .await?;
    Ok(Json(UpdateResponse {
        message: "Attendance updated for the date".into(),
        updated_record: GetItem::new(attendance, days),
    }))
}

#[derive(Deserialize)]
pub struct DeleteArgs {
    mod_name: String,
    class_name: String,
    poc_name: String,
    date: String,
}

#[delete("/delete-attendance-date")]
pub async fn delete_by_date(
    args: Json<DeleteArgs>,
    pool: Data<Pool>,
) -> Result<Json<Message>, Error> {
    let args = args.into_inner();
    let date = window::parse_flexible(&args.date)?;
    queries_async::delete_day_by_key(args.mod_name, args.class_name, args.poc_name, date, &pool)
        .await?;
    Ok(Json(Message {
        message: "Attendance entry deleted for the date".into(),
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
    async fn post_then_append_then_conflict() -> Result<()> {
        let state = mock_state();
        let app = test::init_service(
            App::new().app_data(Data::new(state.pool)).service(
                scope("/attendance")
                    .service(super::post)
                    .service(super::get_all),
            ),
        )
        .await;
        let body = |date: &str| {
            json!({
                "mod_name": "Rust 101",
                "class_name": "Batch A",
                "poc_name": "Alice",
                "date": date,
                "present_count": 20,
                "total_students": 30,
            })
        };
        let req = TestRequest::post()
            .uri("/attendance/post-attendance")
            .set_json(body("01/02/2025"))
            .to_request();
        assert_eq!(StatusCode::CREATED, test::call_service(&app, req).await.status());
        let req = TestRequest::post()
            .uri("/attendance/post-attendance")
            .set_json(body("02/02/2025"))
            .to_request();
        assert_eq!(StatusCode::OK, test::call_service(&app, req).await.status());
        let req = TestRequest::post()
            .uri("/attendance/post-attendance")
            .set_json(body("02/02/2025"))
            .to_request();
        assert_eq!(
            StatusCode::CONFLICT,
            test::call_service(&app, req).await.status(),
        );
        let req = TestRequest::get()
            .uri("/attendance/get-all-attendance")
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(1, res.as_array().unwrap().len());
        assert_eq!(2, res[0]["daily_attendance"].as_array().unwrap().len());
        assert_eq!("66.67%", res[0]["daily_attendance"][0]["attendanceRate"]);
        Ok(())
    }

    #[actix_web::test]
    async fn get_all_empty_is_not_found() -> Result<()> {
        let state = mock_state();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state.pool))
                .service(scope("/attendance").service(super::get_all)),
        )
        .await;
        let req = TestRequest::get()
            .uri("/attendance/get-all-attendance")
            .to_request();
        assert_eq!(
            StatusCode::NOT_FOUND,
            test::call_service(&app, req).await.status(),
        );
        Ok(())
    }

    #[actix_web::test]
    async fn update_and_delete_by_date() -> Result<()> {
        let state = mock_state();
        let app = test::init_service(
            App::new().app_data(Data::new(state.pool)).service(
                scope("/attendance")
                    .service(super::post)
                    .service(super::update_by_date)
                    .service(super::delete_by_date),
            ),
        )
        .await;
        let req = TestRequest::post()
            .uri("/attendance/post-attendance")
            .set_json(json!({
                "mod_name": "Rust 101",
                "class_name": "Batch A",
                "poc_name": "Alice",
                "date": "01/02/2025",
                "present_count": 20,
                "total_students": 30,
            }))
            .to_request();
        assert_eq!(StatusCode::CREATED, test::call_service(&app, req).await.status());
        let req = TestRequest::put()
            .uri("/attendance/update-attendance-by-date")
            .set_json(json!({
                "mod_name": "Rust 101",
                "class_name": "Batch A",
                "poc_name": "Alice",
                "date": "01/02/2025",
                "present_count": 25,
            }))
            .to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            25,
            res["updatedRecord"]["daily_attendance"][0]["present_count"],
        );
        let req = TestRequest::delete()
            .uri("/attendance/delete-attendance-date")
            .set_json(json!({
                "mod_name": "Rust 101",
                "class_name": "Batch A",
                "poc_name": "Alice",
                "date": "01/02/2025",
            }))
            .to_request();
        assert_eq!(StatusCode::OK, test::call_service(&app, req).await.status());
        let req = TestRequest::delete()
            .uri("/attendance/delete-attendance-date")
            .set_json(json!({
                "mod_name": "Rust 101",
                "class_name": "Batch A",
                "poc_name": "Alice",
                "date": "01/02/2025",
            }))
            .to_request();
        assert_eq!(
            StatusCode::NOT_FOUND,
            test::call_service(&app, req).await.status(),
        );
        Ok(())
    }

    #[actix_web::test]
    async fn unknown_record_is_not_found() -> Result<()> {
        let state = mock_state();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(state.pool))
                .service(scope("/attendance").service(super::update_by_date)),
        )
        .await;
        let req = TestRequest::put()
            .uri("/attendance/update-attendance-by-date")
            .set_json(json!({
                "mod_name": "Ghost",
                "class_name": "Ghost",
                "poc_name": "Ghost",
                "date": "01/02/2025",
                "present_count": 25,
            }))
            .to_request();
        assert_eq!(
            StatusCode::NOT_FOUND,
            test::call_service(&app, req).await.status(),
        );
        Ok(())
    }
}
