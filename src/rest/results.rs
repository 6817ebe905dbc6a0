use crate::db::result::queries::{ResultFields, ResultPatch};
use crate::db::result::queries_async;
use crate::db::result::schema::ResultRecord;
use crate::registry::Registry;
use crate::upstream;
use crate::{Error, Result};
use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, post, put, HttpResponse};
use deadpool_sqlite::Pool;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

#[get("/get-result")]
pub async fn get_all(pool: Data<Pool>) -> Result<Json<Vec<ResultRecord>>, Error> {
    Ok(Json(queries_async::select_all(&pool).await?))
}

#[derive(Deserialize)]
pub struct PostArgs {
    result_user_id: String,
    result_test_id: String,
    result_score: f64,
    result_total_score: f64,
    result_poc_id: String,
}

impl From<PostArgs> for ResultFields {
    fn from(args: PostArgs) -> ResultFields {
        ResultFields {
            result_user_id: args.result_user_id,
            result_test_id: args.result_test_id,
            result_score: args.result_score,
            result_total_score: args.result_total_score,
            result_poc_id: args.result_poc_id,
        }
    }
}

#[derive(Serialize)]
pub struct PostResponse {
    pub message: String,
    pub result: ResultRecord,
}

#[post("/post-result")]
pub async fn post(args: Json<PostArgs>, pool: Data<Pool>) -> Result<HttpResponse, Error> {
    let result = queries_async::insert(args.into_inner().into(), &pool).await?;
    Ok(HttpResponse::Created().json(PostResponse {
        message: "Result stored successfully".into(),
        result,
    }))
}

#[derive(Serialize)]
pub struct BulkResponse {
    pub message: String,
    pub count: usize,
    pub results: Vec<ResultRecord>,
}

#[post("/post-bulk-results")]
pub async fn post_bulk(args: Json<Vec<PostArgs>>, pool: Data<Pool>) -> Result<HttpResponse, Error> {
    let args = args.into_inner();
    if args.is_empty() {
        return Err(Error::InvalidInput(
            "Request body must be a non-empty array of results".into(),
        ));
    }
    let batch: Vec<ResultFields> = args.into_iter().map(Into::into).collect();
    let results = queries_async::insert_many(batch, &pool).await?;
    Ok(HttpResponse::Created().json(BulkResponse {
        message: "Bulk results stored successfully".into(),
        count: results.len(),
        results,
    }))
}

#[derive(Deserialize)]
pub struct UpdateArgs {
    result_id: String,
    result_user_id: Option<String>,
    result_test_id: Option<String>,
    result_score: Option<f64>,
    result_total_score: Option<f64>,
    result_poc_id: Option<String>,
}

#[put("/update-result")]
pub async fn update(args: Json<UpdateArgs>, pool: Data<Pool>) -> Result<Json<PostResponse>, Error> {
    let args = args.into_inner();
    let patch = ResultPatch {
        result_user_id: args.result_user_id,
        result_test_id: args.result_test_id,
        result_score: args.result_score,
        result_total_score: args.result_total_score,
        result_poc_id: args.result_poc_id,
    };
    let result = queries_async::update_by_result_id(args.result_id, patch, &pool)
        .await?
        .ok_or_else(|| Error::NotFound("Result not found".into()))?;
    Ok(Json(PostResponse {
        message: "Result updated successfully".into(),
        result,
    }))
}

#[delete("/delete-by-result-id/{result_id}")]
pub async fn delete_by_result_id(
    result_id: Path<String>,
    pool: Data<Pool>,
) -> Result<Json<PostResponse>, Error> {
    let result = queries_async::delete_by_result_id(result_id.into_inner(), &pool)
        .await?
        .ok_or_else(|| Error::NotFound("Result not found".into()))?;
    Ok(Json(PostResponse {
        message: "Result deleted successfully".into(),
        result,
    }))
}

#[get("/get-result-by-user/{result_user_id}")]
pub async fn get_by_user_id(
    result_user_id: Path<String>,
    pool: Data<Pool>,
) -> Result<Json<Vec<ResultRecord>>, Error> {
    let results = queries_async::select_by_user_id(result_user_id.into_inner(), &pool).await?;
    if results.is_empty() {
        return Err(Error::NotFound("No results found for this user".into()));
    }
    Ok(Json(results))
}

#[derive(Deserialize)]
pub struct CheckArgs {
    user_id: String,
    test_id: String,
}

#[derive(Serialize, Deserialize)]
pub struct CheckResponse {
    pub exists: bool,
}

#[get("/check")]
pub async fn check(args: Query<CheckArgs>, pool: Data<Pool>) -> Result<Json<CheckResponse>, Error> {
    let args = args.into_inner();
    let exists = queries_async::exists(args.user_id, args.test_id, &pool).await?;
    Ok(Json(CheckResponse { exists }))
}

#[derive(Deserialize)]
pub struct GetByUserAndTestArgs {
    result_user_id: String,
    result_test_id: String,
}

#[get("/get_result_by_user_id_test_id")]
pub async fn get_by_user_and_test(
    args: Query<GetByUserAndTestArgs>,
    pool: Data<Pool>,
) -> Result<Json<Vec<ResultRecord>>, Error> {
    let args = args.into_inner();
    let results =
        queries_async::select_by_user_and_test(args.result_user_id, args.result_test_id, &pool)
            .await?;
    Ok(Json(results))
}

#[derive(Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<ResultRecord>,
}

#[get("/get_results_by_user_id/{user_id}")]
pub async fn list_by_user_id(
    user_id: Path<String>,
    pool: Data<Pool>,
) -> Result<Json<ListResponse>, Error> {
    let user_id = user_id.into_inner();
    let results = queries_async::select_by_user_id(user_id.clone(), &pool).await?;
    if results.is_empty() {
        return Err(Error::NotFound(format!(
            "No results found for user ID: {user_id}"
        )));
    }
    Ok(Json(ListResponse {
        success: true,
        count: results.len(),
        data: results,
    }))
}

#[derive(Serialize)]
pub struct TestScore {
    pub test_id: String,
    pub test_total_score: f64,
    pub result_score: f64,
    pub percentage: f64,
}

#[derive(Serialize)]
pub struct AggregateResponse {
    pub tests: Vec<TestScore>,
    pub total_result_score: f64,
    pub total_test_score: f64,
    pub average_percentage: f64,
}

#[derive(Serialize)]
pub struct AggregateEnvelope {
    pub message: String,
    pub response: AggregateResponse,
}

fn summarize(tests: Vec<TestScore>) -> AggregateResponse {
    let total_result_score = tests.iter().map(|it| it.result_score).sum();
    let total_test_score: f64 = tests.iter().map(|it| it.test_total_score).sum();
    let average_percentage = if total_test_score > 0.0 {
        total_result_score / total_test_score * 100.0
    } else {
        0.0
    };
    AggregateResponse {
        tests,
        total_result_score,
        total_test_score,
        average_percentage,
    }
}

/// A test whose details can't be fetched contributes zero instead of
/// failing the whole aggregation.
async fn score_for(
    test_id: String,
    user_id: String,
    registry: &Registry,
    pool: &Pool,
) -> Result<TestScore> {
    let test_total_score = upstream::soft(upstream::test_by_id(registry, &test_id).await)
        .and_then(|it| it.test_total_score)
        .unwrap_or(0.0);
    let result_score = queries_async::select_by_user_and_test(user_id, test_id.clone(), pool)
        .await?
        .first()
        .map(|it| it.result_score)
        .unwrap_or(0.0);
    let percentage = if test_total_score > 0.0 {
        result_score / test_total_score * 100.0
    } else {
        0.0
    };
    Ok(TestScore {
        test_id,
        test_total_score,
        result_score,
        percentage,
    })
}

#[get("/aggregate_scores/{poc_id}/{user_id}")]
pub async fn aggregate_scores(
    path: Path<(String, String)>,
    pool: Data<Pool>,
    registry: Data<Registry>,
) -> Result<Json<AggregateEnvelope>, Error> {
    let (poc_id, user_id) = path.into_inner();
    let test_ids = upstream::tests_till_today(&registry, &poc_id).await?;
    if test_ids.is_empty() {
        return Ok(Json(AggregateEnvelope {
            message: "No tests found for this POC".into(),
            response: summarize(vec![]),
        }));
    }
    let lookups = test_ids
        .into_iter()
        .map(|test_id| score_for(test_id, user_id.clone(), &registry, &pool));
    let tests = join_all(lookups)
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;
    Ok(Json(AggregateEnvelope {
        message: "Scores aggregated successfully".into(),
        response: summarize(tests),
    }))
}
