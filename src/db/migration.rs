use crate::Result;
use include_dir::include_dir;
use include_dir::Dir;
use rusqlite::Connection;
use tracing::info;

static MIGRATIONS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/migrations");

struct Migration {
    version: i16,
    sql: String,
}

pub fn run(db: &mut Connection) -> Result<()> {
    apply(&embedded_migrations()?, db)
}

/// Migrations are numbered 1.sql, 2.sql, ... and embedded into the binary.
fn embedded_migrations() -> Result<Vec<Migration>> {
    let mut res = vec![];
    let mut version = 1;
    while let Some(file) = MIGRATIONS_DIR.get_file(format!("{version}.sql")) {
        let sql = file.contents_utf8().ok_or(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("{version}.sql is not valid UTF-8"),
        ))?;
        res.push(Migration {
            version,
            sql: sql.to_string(),
        });
        version += 1;
    }
    Ok(res)
}

fn apply(migrations: &[Migration], db: &mut Connection) -> Result<()> {
    let mut schema_ver: i16 =
        db.query_row("SELECT user_version FROM pragma_user_version", [], |row| {
            row.get(0)
        })?;

    for migration in migrations.iter().filter(move |it| it.version > schema_ver) {
        info!(migration.version, "Applying migration");
        let tx = db.transaction()?;
        tx.execute_batch(&migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version={}", migration.version))?;
        tx.commit()?;
        schema_ver = migration.version;
    }

    info!(schema_ver, "Database schema is up to date");

    Ok(())
}

#[cfg(test)]
mod test {
    use super::Migration;
    use crate::Result;
    use rusqlite::Connection;

    fn schema_ver(conn: &Connection) -> Result<i16> {
        Ok(
            conn.query_row("SELECT user_version FROM pragma_user_version", [], |row| {
                row.get(0)
            })?,
        )
    }

    #[test]
    fn apply_steps_user_version() -> Result<()> {
        let mut conn = Connection::open_in_memory()?;
        let mut migrations = vec![Migration {
            version: 1,
            sql: "CREATE TABLE foo(bar);".into(),
        }];
        super::apply(&migrations, &mut conn)?;
        assert_eq!(1, schema_ver(&conn)?);
        migrations.push(Migration {
            version: 2,
            sql: "INSERT INTO foo (bar) VALUES ('qwerty');".into(),
        });
        super::apply(&migrations, &mut conn)?;
        assert_eq!(2, schema_ver(&conn)?);
        Ok(())
    }

    #[test]
    fn embedded_migrations_are_contiguous() -> Result<()> {
        let migrations = super::embedded_migrations()?;
        assert!(!migrations.is_empty());
        for (i, migration) in migrations.iter().enumerate() {
            assert_eq!(i as i16 + 1, migration.version);
        }
        Ok(())
    }
}
