use async_graphql::{Context, Object, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use super::internal_error;
use crate::storage::{Database, FrontendLog};
use crate::util::clean_log_message;

pub struct FrontendLogNode(pub FrontendLog);

#[Object(name = "FrontendLog")]
impl FrontendLogNode {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn message(&self) -> &str {
        &self.0.message
    }

    /// RFC 3339 timestamp.
    async fn timestamp(&self) -> String {
        self.0.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp `{value}`: {e}").into())
}

#[derive(Default)]
pub struct FrontendLogQuery;

#[Object]
impl FrontendLogQuery {
    async fn frontend_log(&self, ctx: &Context<'_>, id: i64) -> Result<Option<FrontendLogNode>> {
        let db = ctx.data::<Database>()?;
        let entry = db.get_frontend_log(id).await.map_err(internal_error)?;
        Ok(entry.map(FrontendLogNode))
    }

    async fn frontend_logs(&self, ctx: &Context<'_>) -> Result<Vec<FrontendLogNode>> {
        let db = ctx.data::<Database>()?;
        let entries = db.list_frontend_logs().await.map_err(internal_error)?;
        Ok(entries.into_iter().map(FrontendLogNode).collect())
    }
}

#[derive(Default)]
pub struct FrontendLogMutation;

#[Object]
impl FrontendLogMutation {
    async fn create_frontend_log(
        &self,
        ctx: &Context<'_>,
        message: String,
        timestamp: String,
    ) -> Result<FrontendLogNode> {
        let db = ctx.data::<Database>()?;
        let timestamp = parse_timestamp(&timestamp)?;
        let message = clean_log_message(&message)?;

        let id = db
            .insert_frontend_log(&message, timestamp)
            .await
            .map_err(internal_error)?;
        Ok(FrontendLogNode(FrontendLog {
            id,
            message,
            timestamp,
        }))
    }

    /// Replaces the given fields; empty or omitted fields keep their value.
    async fn update_frontend_log(
        &self,
        ctx: &Context<'_>,
        id: i64,
        message: Option<String>,
        timestamp: Option<String>,
    ) -> Result<Option<FrontendLogNode>> {
        let db = ctx.data::<Database>()?;
        let Some(current) = db.get_frontend_log(id).await.map_err(internal_error)? else {
            return Ok(None);
        };

        let message = match message.filter(|m| !m.trim().is_empty()) {
            Some(m) => clean_log_message(&m)?,
            None => current.message,
        };
        let timestamp = match timestamp.filter(|t| !t.trim().is_empty()) {
            Some(t) => parse_timestamp(&t)?,
            None => current.timestamp,
        };

        let updated = db
            .update_frontend_log(id, &message, timestamp)
            .await
            .map_err(internal_error)?;
        Ok(updated.then(|| {
            FrontendLogNode(FrontendLog {
                id,
                message,
                timestamp,
            })
        }))
    }

    async fn delete_frontend_log(&self, ctx: &Context<'_>, id: i64) -> Result<bool> {
        let db = ctx.data::<Database>()?;
        db.delete_frontend_log(id).await.map_err(internal_error)
    }
}
