use async_trait::async_trait;
use lead_pipeline::{LeadRepository, NewLead, RepositoryError};
use rusqlite::{params, OptionalExtension, Row};
use shared_types::{Lead, LeadMeta};

use super::{AsyncDbConnection, DbError};

const LEAD_COLUMNS: &str =
    "id, firstname, lastname, email, phone, message, source, meta, created_at";

fn lead_from_row(row: &Row<'_>) -> rusqlite::Result<(Lead, String)> {
    let meta_json: String = row.get(7)?;
    Ok((
        Lead {
            id: row.get(0)?,
            firstname: row.get(1)?,
            lastname: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
            message: row.get(5)?,
            source: row.get(6)?,
            meta: LeadMeta::default(),
            created_at: row.get(8)?,
        },
        meta_json,
    ))
}

fn decode_meta((mut lead, meta_json): (Lead, String)) -> Result<Lead, DbError> {
    lead.meta = serde_json::from_str(&meta_json)?;
    Ok(lead)
}

pub async fn insert_lead(conn: AsyncDbConnection, lead: NewLead) -> Result<Lead, DbError> {
    conn.run(move |conn| {
        let now = chrono::Utc::now().timestamp();
        let meta_json = serde_json::to_string(&lead.meta)?;

        let id: i64 = conn.query_row(
            "INSERT INTO leads
             (firstname, lastname, email, phone, message, source, meta, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             RETURNING id",
            params![
                lead.firstname,
                lead.lastname,
                lead.email,
                lead.phone,
                lead.message,
                lead.source,
                meta_json,
                now
            ],
            |row| row.get(0),
        )?;

        Ok(Lead {
            id,
            firstname: lead.firstname,
            lastname: lead.lastname,
            email: lead.email,
            phone: lead.phone,
            message: lead.message,
            source: lead.source,
            meta: lead.meta,
            created_at: now,
        })
    })
    .await
}

pub async fn get_lead(conn: AsyncDbConnection, id: i64) -> Result<Option<Lead>, DbError> {
    conn.run(move |conn| {
        let row = conn
            .query_row(
                &format!("SELECT {} FROM leads WHERE id = ?1", LEAD_COLUMNS),
                [id],
                lead_from_row,
            )
            .optional()?;

        row.map(decode_meta).transpose()
    })
    .await
}

/// Newest first, optionally restricted to one source tag.
pub async fn list_leads(
    conn: AsyncDbConnection,
    source: Option<String>,
    limit: usize,
) -> Result<Vec<Lead>, DbError> {
    conn.run(move |conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM leads
             WHERE (?1 IS NULL OR source = ?1)
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
            LEAD_COLUMNS
        ))?;

        let rows = stmt
            .query_map(params![source, limit as i64], lead_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(decode_meta).collect()
    })
    .await
}

/// Back-office removal. Returns whether a row was deleted.
pub async fn delete_lead(conn: AsyncDbConnection, id: i64) -> Result<bool, DbError> {
    conn.run(move |conn| {
        let deleted = conn.execute("DELETE FROM leads WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    })
    .await
}

impl From<DbError> for RepositoryError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Sqlite(rusqlite::Error::SqliteFailure(code, msg))
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                RepositoryError::Constraint(msg.unwrap_or_else(|| code.to_string()))
            }
            other => RepositoryError::Unavailable(other.to_string()),
        }
    }
}

/// Lead storage backed by the `leads` table.
#[derive(Clone)]
pub struct SqliteLeadRepository {
    conn: AsyncDbConnection,
}

impl SqliteLeadRepository {
    pub fn new(conn: AsyncDbConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl LeadRepository for SqliteLeadRepository {
    async fn insert(&self, lead: NewLead) -> Result<Lead, RepositoryError> {
        Ok(insert_lead(self.conn.clone(), lead).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    fn new_lead(source: &str, property_id: Option<&str>) -> NewLead {
        NewLead {
            firstname: Some("Jo".to_string()),
            lastname: Some("Dupont".to_string()),
            email: Some("jo@x.com".to_string()),
            phone: Some("0601020304".to_string()),
            message: Some("Bonjour, je suis intéressé".to_string()),
            source: source.to_string(),
            meta: LeadMeta {
                property_id: property_id.map(str::to_string),
                user_agent: Some("Mozilla/5.0".to_string()),
                timestamp: "2026-03-01T10:00:00+00:00".to_string(),
                referrer: None,
            },
        }
    }

    fn open_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("leads.sqlite3")).unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip_meta() {
        let (_dir, db) = open_db();
        let conn = db.async_connection.clone();

        let stored = insert_lead(conn.clone(), new_lead("estimate", Some("villa-12")))
            .await
            .unwrap();
        let loaded = get_lead(conn, stored.id).await.unwrap().unwrap();

        assert_eq!(loaded, stored);
        assert_eq!(loaded.meta.property_id.as_deref(), Some("villa-12"));
        assert!(loaded.created_at > 0);
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let (_dir, db) = open_db();
        let repo = SqliteLeadRepository::new(db.async_connection.clone());

        let first = repo.insert(new_lead("contact", None)).await.unwrap();
        let second = repo.insert(new_lead("contact", None)).await.unwrap();

        assert_eq!(second.id, first.id + 1);
    }

    #[tokio::test]
    async fn test_list_filters_by_source_newest_first() {
        let (_dir, db) = open_db();
        let conn = db.async_connection.clone();
        for source in ["contact", "estimate", "contact"] {
            insert_lead(conn.clone(), new_lead(source, None)).await.unwrap();
        }

        let all = list_leads(conn.clone(), None, 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].id > all[1].id);

        let contacts = list_leads(conn.clone(), Some("contact".to_string()), 10)
            .await
            .unwrap();
        assert_eq!(contacts.len(), 2);
        assert!(contacts.iter().all(|l| l.source == "contact"));

        let limited = list_leads(conn, None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_lead() {
        let (_dir, db) = open_db();
        let conn = db.async_connection.clone();
        let stored = insert_lead(conn.clone(), new_lead("contact", None))
            .await
            .unwrap();

        assert!(delete_lead(conn.clone(), stored.id).await.unwrap());
        assert!(!delete_lead(conn.clone(), stored.id).await.unwrap());
        assert!(get_lead(conn, stored.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_not_null_violation_maps_to_constraint() {
        let (_dir, db) = open_db();
        let err = db
            .async_connection
            .run(|conn| {
                conn.execute(
                    "INSERT INTO leads (source, created_at) VALUES (NULL, 0)",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(
            RepositoryError::from(err),
            RepositoryError::Constraint(_)
        ));
    }
}
