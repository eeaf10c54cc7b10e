mod articles;
mod frontend_logs;
mod schema;
mod tasks;
mod types;
mod users;

pub use schema::Database;
pub use types::{
    is_unique_violation, Article, ArticlePatch, DatabaseError, FrontendLog, NewArticle, Task, User,
};
