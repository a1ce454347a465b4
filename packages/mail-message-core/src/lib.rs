//! Mail Message Core - Message body and tracking value rendering library.
//!
//! This crate provides the logic behind a chat message view that does not
//! depend on any UI framework:
//!
//! - **Content tree**: Arena document with an HTML fragment parser and serializer
//! - **Quote collapsing**: "read more / read less" groups over quoted content
//! - **Tracking values**: Per-field-type formatting of audited field changes
//! - **Message view helpers**: Click dispatch, visibility geometry, timestamps
//!
//! # Example
//!
//! ```rust
//! use mail_message_core::content::Document;
//! use mail_message_core::quotes::{insert_read_more_less, ReadMoreLabels};
//!
//! let mut doc = Document::parse_fragment(
//!     r#"<p>Hello</p><blockquote data-o-mail-quote="1">Earlier mail</blockquote>"#,
//! );
//! let root = doc.root();
//! let groups = insert_read_more_less(&mut doc, root, &ReadMoreLabels::default());
//!
//! assert_eq!(groups.len(), 1);
//! assert!(doc.to_html().contains("o_Message_readMoreLess"));
//! ```

pub mod config;
pub mod content;
pub mod i18n;
pub mod message;
pub mod quotes;
pub mod tracking;
pub mod types;

// Re-export commonly used types
pub use types::{ApiResponse, Currency, CurrencyPosition, CurrencyTable, FieldType, TrackingValue};

// Re-export main functionality
pub use config::{Config, Localization};
pub use content::{Document, NodeId, NodeKind};
pub use i18n::Catalog;
pub use message::MessageBody;
pub use quotes::{
    apply_visibility, click_toggle, insert_read_more_less, strip_read_more_less, GroupId,
    QuoteGroup, ReadMoreLabels, ToggleClick, ToggleStates,
};
pub use tracking::TrackingFormatter;

/// Error types for mail-message-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid {field_type} value: {value}")]
    InvalidValue { field_type: String, value: String },

    #[error("Invalid format pattern: {0}")]
    InvalidFormat(String),

    #[error("Invalid property: {0}")]
    InvalidProp(String),
}

/// Result type for mail-message-core operations.
pub type Result<T> = std::result::Result<T, Error>;
