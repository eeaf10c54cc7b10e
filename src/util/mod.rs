//! Utility functions for common operations.
//!
//! - **Text processing**: article previews and control-character stripping
//!   for client-submitted text
//! - **Markdown**: article bodies rendered to HTML for the article page
//! - **Image URLs**: stored image paths resolved against the image base URL
//!
//! # Examples
//!
//! ```
//! use newsdesk::util::{generate_preview, PREVIEW_WORDS};
//!
//! let preview = generate_preview("A long article body ...", PREVIEW_WORDS);
//! assert_eq!(preview, "A long article body ...");
//! ```

mod image_url;
mod markdown;
mod text;

pub use image_url::resolve_image_url;
pub use markdown::render_markdown;
pub use text::{
    clean_log_message, generate_preview, strip_control_chars, LogMessageError,
    MAX_LOG_MESSAGE_LEN, PREVIEW_WORDS,
};
