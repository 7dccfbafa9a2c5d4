use crate::db::Database;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Persists what a component needs to be handled after the flow that sent
/// it is gone, keyed by the component's custom id.
pub struct ResumeService {
    db: Database,
}

impl ResumeService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Stores `context` for listener `event` and returns the id to use as
    /// the component's custom id.
    pub async fn create<T: Serialize>(&self, event: &str, context: &T) -> anyhow::Result<String> {
        let id = Uuid::new_v4().to_string();
        let context = serde_json::to_string(context)?;
        let event = event.to_string();
        let record_id = id.clone();
        self.db
            .run_blocking(move |db| db.create_resume_record(&record_id, &event, &context))
            .await?;
        Ok(id)
    }

    /// Event name and context stored under `id`. Records are left in place so
    /// the same component can fire again.
    pub async fn consume(&self, id: &str) -> anyhow::Result<Option<(String, Value)>> {
        let id = id.to_string();
        let record = self
            .db
            .run_blocking(move |db| db.find_resume_record(&id))
            .await?;
        match record {
            Some(record) => {
                let context = serde_json::from_str(&record.context)?;
                Ok(Some((record.event, context)))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;

    fn service() -> ResumeService {
        let db = Database::new(&Config::for_tests()).unwrap();
        db.execute_init().unwrap();
        ResumeService::new(db)
    }

    #[tokio::test]
    async fn test_create_then_consume() {
        let service = service();
        let id = service.create("hello", &json!({ "name": "X" })).await.unwrap();
        assert!(Uuid::parse_str(&id).is_ok());

        let (event, context) = service.consume(&id).await.unwrap().unwrap();
        assert_eq!(event, "hello");
        assert_eq!(context, json!({ "name": "X" }));

        // Still there for the next click
        assert!(service.consume(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let service = service();
        assert!(service.consume("no-such-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let service = service();
        let a = service.create("hello", &()).await.unwrap();
        let b = service.create("hello", &()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(service.consume(&a).await.unwrap().unwrap().1, Value::Null);
    }
}
