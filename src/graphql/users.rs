use std::sync::Arc;

use async_graphql::{Context, InputObject, Object, Result};

use super::{internal_error, BearerClaims};
use crate::auth::{AuthError, AuthService, Registration};
use crate::storage::{Database, User};

pub struct UserNode(pub User);

#[Object(name = "User")]
impl UserNode {
    async fn user_id(&self) -> i64 {
        self.0.user_id
    }

    async fn email(&self) -> &str {
        &self.0.email
    }
}

#[derive(InputObject)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(InputObject)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

fn auth_error(err: AuthError) -> async_graphql::Error {
    if err.is_client_error() {
        async_graphql::Error::new(err.to_string())
    } else {
        tracing::error!(error = %err, "Authentication failed with server error");
        async_graphql::Error::new("Internal server error")
    }
}

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// The user identified by the request's bearer token, if any.
    async fn me(&self, ctx: &Context<'_>) -> Result<Option<UserNode>> {
        let Some(BearerClaims(claims)) = ctx.data_opt::<BearerClaims>() else {
            return Ok(None);
        };
        let db = ctx.data::<Database>()?;
        let user = db
            .get_user_by_id(claims.user_id)
            .await
            .map_err(internal_error)?;
        Ok(user.map(UserNode))
    }
}

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    async fn register(&self, ctx: &Context<'_>, input: RegisterInput) -> Result<UserNode> {
        let db = ctx.data::<Database>()?;
        let auth = ctx.data::<Arc<AuthService>>()?;

        let registration = Registration {
            email: input.email,
            password: input.password,
            confirm_password: input.password_confirmation,
        };
        let user_id = auth.register(db, &registration).await.map_err(auth_error)?;
        let user = db
            .get_user_by_id(user_id)
            .await
            .map_err(internal_error)?
            .ok_or_else(|| async_graphql::Error::new("Registered user not found"))?;
        Ok(UserNode(user))
    }

    /// Returns a bearer token valid for 24 hours.
    async fn login(&self, ctx: &Context<'_>, input: LoginInput) -> Result<String> {
        let db = ctx.data::<Database>()?;
        let auth = ctx.data::<Arc<AuthService>>()?;
        auth.login(db, &input.email, &input.password)
            .await
            .map_err(auth_error)
    }
}
