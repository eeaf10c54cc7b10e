use async_graphql::{Context, Object, Result};

use super::{internal_error, ImageBaseUrl};
use crate::storage::{Article, ArticlePatch, Database, NewArticle};
use crate::util::{generate_preview, resolve_image_url, PREVIEW_WORDS};

pub struct ArticleNode(pub Article);

#[Object(name = "Article")]
impl ArticleNode {
    async fn id(&self) -> i64 {
        self.0.id
    }

    async fn title(&self) -> &str {
        &self.0.title
    }

    /// Image URL, resolved against the configured image base URL.
    async fn image(&self, ctx: &Context<'_>) -> Result<String> {
        let base = ctx.data::<ImageBaseUrl>()?;
        Ok(resolve_image_url(&base.0, &self.0.image))
    }

    async fn preview(&self) -> &str {
        &self.0.preview
    }

    async fn text(&self) -> &str {
        &self.0.text
    }
}

#[derive(Default)]
pub struct ArticleQuery;

#[Object]
impl ArticleQuery {
    async fn article(&self, ctx: &Context<'_>, id: i64) -> Result<Option<ArticleNode>> {
        let db = ctx.data::<Database>()?;
        let article = db.get_article(id).await.map_err(internal_error)?;
        Ok(article.map(ArticleNode))
    }

    async fn articles(&self, ctx: &Context<'_>) -> Result<Vec<ArticleNode>> {
        let db = ctx.data::<Database>()?;
        let articles = db.list_articles().await.map_err(internal_error)?;
        Ok(articles.into_iter().map(ArticleNode).collect())
    }
}

#[derive(Default)]
pub struct ArticleMutation;

#[Object]
impl ArticleMutation {
    async fn create_article(
        &self,
        ctx: &Context<'_>,
        title: String,
        image: String,
        preview: String,
        text: String,
    ) -> Result<ArticleNode> {
        let db = ctx.data::<Database>()?;
        if title.trim().is_empty() {
            return Err("title must not be empty".into());
        }
        let preview = if preview.trim().is_empty() {
            generate_preview(&text, PREVIEW_WORDS)
        } else {
            preview
        };
        let article = NewArticle {
            title,
            image,
            preview,
            text,
        };

        let id = db.create_article(&article).await.map_err(internal_error)?;
        tracing::info!(id, "Article created via GraphQL");
        Ok(ArticleNode(Article {
            id,
            title: article.title,
            image: article.image,
            preview: article.preview,
            text: article.text,
        }))
    }

    /// Updates the given fields; omitted fields keep their value. Returns
    /// null when the article does not exist.
    async fn update_article(
        &self,
        ctx: &Context<'_>,
        id: i64,
        title: Option<String>,
        image: Option<String>,
        preview: Option<String>,
        text: Option<String>,
    ) -> Result<Option<ArticleNode>> {
        let db = ctx.data::<Database>()?;
        if title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err("title must not be empty".into());
        }
        let Some(current) = db.get_article(id).await.map_err(internal_error)? else {
            return Ok(None);
        };

        let patch = ArticlePatch {
            title,
            image,
            preview,
            text,
        };
        let updated = db
            .update_article(id, &patch.apply(&current))
            .await
            .map_err(internal_error)?;
        Ok(updated.map(ArticleNode))
    }

    async fn delete_article(&self, ctx: &Context<'_>, id: i64) -> Result<bool> {
        let db = ctx.data::<Database>()?;
        db.delete_article(id).await.map_err(internal_error)
    }
}
