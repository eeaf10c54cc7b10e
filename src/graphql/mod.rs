//! GraphQL schema over articles, frontend logs and users.
//!
//! Resolvers are thin wrappers over [`Database`] and [`AuthService`]. The
//! schema carries both as context data, plus the image base URL used to
//! resolve `Article.image`. Per-request data (the bearer token claims) is
//! attached by the HTTP handler.
mod articles;
mod frontend_logs;
mod users;

use std::sync::Arc;

use async_graphql::{EmptySubscription, MergedObject, Schema};

use crate::auth::{AuthService, Claims};
use crate::storage::Database;

pub use articles::ArticleNode;
pub use frontend_logs::FrontendLogNode;
pub use users::UserNode;

#[derive(MergedObject, Default)]
pub struct QueryRoot(
    articles::ArticleQuery,
    frontend_logs::FrontendLogQuery,
    users::UserQuery,
);

#[derive(MergedObject, Default)]
pub struct MutationRoot(
    articles::ArticleMutation,
    frontend_logs::FrontendLogMutation,
    users::UserMutation,
);

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Prefix for relative article image paths.
#[derive(Debug, Clone)]
pub struct ImageBaseUrl(pub String);

/// Claims of a verified bearer token, attached to a request.
#[derive(Debug, Clone)]
pub struct BearerClaims(pub Claims);

pub fn build_schema(db: Database, auth: Arc<AuthService>, image_base_url: String) -> AppSchema {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(db)
        .data(auth)
        .data(ImageBaseUrl(image_base_url))
        .finish()
}

/// Logs a storage failure and hides its details from the client.
fn internal_error(err: anyhow::Error) -> async_graphql::Error {
    tracing::error!(error = %err, "GraphQL resolver failed");
    async_graphql::Error::new("Internal server error")
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_exposes_root_fields() {
        let (schema, _db) = test_support::schema().await;
        let sdl = schema.sdl();
        for field in [
            "article(id: Int!): Article",
            "articles: [Article!]!",
            "frontendLog(id: Int!): FrontendLog",
            "frontendLogs: [FrontendLog!]!",
            "me: User",
            "deleteArticle(id: Int!): Boolean!",
            "login(input: LoginInput!): String!",
            "register(input: RegisterInput!): User!",
        ] {
            assert!(sdl.contains(field), "missing `{field}` in SDL:\n{sdl}");
        }
    }
}
