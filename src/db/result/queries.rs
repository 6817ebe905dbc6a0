use super::schema::{self, Columns, ResultRecord};
use crate::db;
use crate::{Error, Result};
use rusqlite::{named_params, params, Connection, OptionalExtension};
use uuid::Uuid;

pub struct ResultFields {
    pub result_user_id: String,
    pub result_test_id: String,
    pub result_score: f64,
    pub result_total_score: f64,
    pub result_poc_id: String,
}

#[derive(Default)]
pub struct ResultPatch {
    pub result_user_id: Option<String>,
    pub result_test_id: Option<String>,
    pub result_score: Option<f64>,
    pub result_total_score: Option<f64>,
    pub result_poc_id: Option<String>,
}

pub fn insert(fields: &ResultFields, conn: &Connection) -> Result<ResultRecord> {
    let sql = format!(
        r#"
            INSERT INTO {table} (
                {result_id},
                {user_id},
                {test_id},
                {score},
                {total_score},
                {poc_id}
            ) VALUES (
                :result_id,
                :user_id,
                :test_id,
                :score,
                :total_score,
                :poc_id
            )
        "#,
        table = schema::TABLE_NAME,
        result_id = Columns::ResultId.as_str(),
        user_id = Columns::ResultUserId.as_str(),
        test_id = Columns::ResultTestId.as_str(),
        score = Columns::ResultScore.as_str(),
        total_score = Columns::ResultTotalScore.as_str(),
        poc_id = Columns::ResultPocId.as_str(),
    );
    conn.execute(
        &sql,
        named_params! {
            ":result_id": Uuid::new_v4().to_string(),
            ":user_id": fields.result_user_id,
            ":test_id": fields.result_test_id,
            ":score": fields.result_score,
            ":total_score": fields.result_total_score,
            ":poc_id": fields.result_poc_id,
        },
    )
    .map_err(|err| {
        if db::is_unique_violation(&err) {
            Error::HttpConflict("Result already exists for this user and test".into())
        } else {
            Error::from(err)
        }
    })?;
    select_by_id(conn.last_insert_rowid(), conn)
}

/// All-or-nothing bulk insert. Any duplicate pair in the batch, or against
/// stored rows, rolls the whole batch back.
pub fn insert_many(batch: &[ResultFields], conn: &mut Connection) -> Result<Vec<ResultRecord>> {
    let tx = conn.transaction()?;
    let mut inserted = Vec::with_capacity(batch.len());
    for fields in batch {
        inserted.push(insert(fields, &tx)?);
    }
    tx.commit()?;
    Ok(inserted)
}

pub fn select_by_id(id: i64, conn: &Connection) -> Result<ResultRecord> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {id} = ?1
        "#,
        projection = ResultRecord::projection(),
        table = schema::TABLE_NAME,
        id = Columns::Id.as_str(),
    );
    conn.query_row(&sql, params![id], ResultRecord::mapper())
        .map_err(Into::into)
}

pub fn select_all(conn: &Connection) -> Result<Vec<ResultRecord>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            ORDER BY {id}
        "#,
        projection = ResultRecord::projection(),
        table = schema::TABLE_NAME,
        id = Columns::Id.as_str(),
    );
    Ok(conn
        .prepare(&sql)?
        .query_map(params![], ResultRecord::mapper())?
        .collect::<Result<Vec<_>, _>>()?)
}

pub fn select_by_user_id(user_id: &str, conn: &Connection) -> Result<Vec<ResultRecord>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {user_id} = ?1
            ORDER BY {id}
        "#,
        projection = ResultRecord::projection(),
        table = schema::TABLE_NAME,
        user_id = Columns::ResultUserId.as_str(),
        id = Columns::Id.as_str(),
    );
    Ok(conn
        .prepare(&sql)?
        .query_map(params![user_id], ResultRecord::mapper())?
        .collect::<Result<Vec<_>, _>>()?)
}

pub fn select_by_user_and_test(
    user_id: &str,
    test_id: &str,
    conn: &Connection,
) -> Result<Vec<ResultRecord>> {
    let sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {user_id} = ?1 AND {test_id} = ?2
            ORDER BY {id}
        "#,
        projection = ResultRecord::projection(),
        table = schema::TABLE_NAME,
        user_id = Columns::ResultUserId.as_str(),
        test_id = Columns::ResultTestId.as_str(),
        id = Columns::Id.as_str(),
    );
    Ok(conn
        .prepare(&sql)?
        .query_map(params![user_id, test_id], ResultRecord::mapper())?
        .collect::<Result<Vec<_>, _>>()?)
}

pub fn exists(user_id: &str, test_id: &str, conn: &Connection) -> Result<bool> {
    Ok(!select_by_user_and_test(user_id, test_id, conn)?.is_empty())
}

pub fn update_by_result_id(
    result_id: &str,
    patch: &ResultPatch,
    conn: &Connection,
) -> Result<Option<ResultRecord>> {
    let select_sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {result_id} = ?1
        "#,
        projection = ResultRecord::projection(),
        table = schema::TABLE_NAME,
        result_id = Columns::ResultId.as_str(),
    );
    let current = conn
        .query_row(&select_sql, params![result_id], ResultRecord::mapper())
        .optional()?;
    let current = match current {
        Some(current) => current,
        None => return Ok(None),
    };
    let sql = format!(
        r#"
            UPDATE {table}
            SET {user_id} = :user_id,
                {test_id} = :test_id,
                {score} = :score,
                {total_score} = :total_score,
                {poc_id} = :poc_id
            WHERE {id} = :id
        "#,
        table = schema::TABLE_NAME,
        user_id = Columns::ResultUserId.as_str(),
        test_id = Columns::ResultTestId.as_str(),
        score = Columns::ResultScore.as_str(),
        total_score = Columns::ResultTotalScore.as_str(),
        poc_id = Columns::ResultPocId.as_str(),
        id = Columns::Id.as_str(),
    );
    conn.execute(
        &sql,
        named_params! {
            ":user_id": patch
                .result_user_id
                .as_deref()
                .unwrap_or(&current.result_user_id),
            ":test_id": patch
                .result_test_id
                .as_deref()
                .unwrap_or(&current.result_test_id),
            ":score": patch.result_score.unwrap_or(current.result_score),
            ":total_score": patch
                .result_total_score
                .unwrap_or(current.result_total_score),
            ":poc_id": patch
                .result_poc_id
                .as_deref()
                .unwrap_or(&current.result_poc_id),
            ":id": current.id,
        },
    )
    .map_err(|err| {
        if db::is_unique_violation(&err) {
            Error::HttpConflict("Result already exists for this user and test".into())
        } else {
            Error::from(err)
        }
    })?;
    Ok(Some(select_by_id(current.id, conn)?))
}

pub fn delete_by_result_id(result_id: &str, conn: &Connection) -> Result<Option<ResultRecord>> {
    let select_sql = format!(
        r#"
            SELECT {projection}
            FROM {table}
            WHERE {result_id} = ?1
        "#,
        projection = ResultRecord::projection(),
        table = schema::TABLE_NAME,
        result_id = Columns::ResultId.as_str(),
    );
    let deleted = conn
        .query_row(&select_sql, params![result_id], ResultRecord::mapper())
        .optional()?;
    let deleted = match deleted {
        Some(deleted) => deleted,
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
    use super::{ResultFields, ResultPatch};
    use crate::test::mock_conn;
    use crate::{Error, Result};

    fn fields(user_id: &str, test_id: &str) -> ResultFields {
        ResultFields {
            result_user_id: user_id.into(),
            result_test_id: test_id.into(),
            result_score: 80.0,
            result_total_score: 100.0,
            result_poc_id: "poc-1".into(),
        }
    }

    #[test]
    fn insert_assigns_result_id() -> Result<()> {
        let conn = mock_conn();
        let record = super::insert(&fields("user-1", "test-1"), &conn)?;
        assert!(!record.result_id.is_empty());
        assert!(super::exists("user-1", "test-1", &conn)?);
        assert!(!super::exists("user-1", "test-2", &conn)?);
        Ok(())
    }

    #[test]
    fn duplicate_pair_conflicts() -> Result<()> {
        let conn = mock_conn();
        super::insert(&fields("user-1", "test-1"), &conn)?;
        assert!(matches!(
            super::insert(&fields("user-1", "test-1"), &conn),
            Err(Error::HttpConflict(_)),
        ));
        super::insert(&fields("user-1", "test-2"), &conn)?;
        super::insert(&fields("user-2", "test-1"), &conn)?;
        Ok(())
    }

    #[test]
    fn insert_many_is_atomic() -> Result<()> {
        let mut conn = mock_conn();
        let batch = vec![
            fields("user-1", "test-1"),
            fields("user-1", "test-2"),
            fields("user-1", "test-1"),
            fields("user-1", "test-3"),
        ];
        assert!(matches!(
            super::insert_many(&batch, &mut conn),
            Err(Error::HttpConflict(_)),
        ));
        assert!(super::select_all(&conn)?.is_empty());
        let batch = vec![fields("user-1", "test-1"), fields("user-1", "test-2")];
        assert_eq!(2, super::insert_many(&batch, &mut conn)?.len());
        assert_eq!(2, super::select_all(&conn)?.len());
        Ok(())
    }

    #[test]
    fn update_by_result_id_patches_score() -> Result<()> {
        let conn = mock_conn();
        let record = super::insert(&fields("user-1", "test-1"), &conn)?;
        let patch = ResultPatch {
            result_score: Some(95.0),
            ..Default::default()
        };
        let updated = super::update_by_result_id(&record.result_id, &patch, &conn)?
            .expect("result should exist");
        assert_eq!(95.0, updated.result_score);
        assert_eq!("user-1", updated.result_user_id);
        assert!(super::update_by_result_id("ghost", &patch, &conn)?.is_none());
        Ok(())
    }

    #[test]
    fn update_cannot_create_duplicate_pair() -> Result<()> {
        let conn = mock_conn();
        super::insert(&fields("user-1", "test-1"), &conn)?;
        let record = super::insert(&fields("user-1", "test-2"), &conn)?;
        let patch = ResultPatch {
            result_test_id: Some("test-1".into()),
            ..Default::default()
        };
        assert!(matches!(
            super::update_by_result_id(&record.result_id, &patch, &conn),
            Err(Error::HttpConflict(_)),
        ));
        Ok(())
    }

    #[test]
    fn delete_by_result_id_returns_deleted_row() -> Result<()> {
        let conn = mock_conn();
        let record = super::insert(&fields("user-1", "test-1"), &conn)?;
        let deleted =
            super::delete_by_result_id(&record.result_id, &conn)?.expect("should delete");
        assert_eq!(record, deleted);
        assert!(super::delete_by_result_id(&record.result_id, &conn)?.is_none());
        Ok(())
    }
}
