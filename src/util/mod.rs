//! Utility functions for common operations.
//!
//! - **Text processing**: HTML stripping and sentence-per-line formatting
//!   of entry descriptions
//! - **Redaction**: masking webhook URLs before they reach logs
//!
//! # Examples
//!
//! ```
//! use feedrelay::util::format_description;
//!
//! let text = format_description("<p>First. Second!</p>");
//! assert_eq!(text, "First.\r\nSecond!");
//! ```

mod redact;
mod text;

pub use redact::redact_url;
pub use text::{format_description, html_to_text};
