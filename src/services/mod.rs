//! Service layer for business logic
//!
//! Shared by the HTTP API and the offline CLI commands.

pub mod adk;
mod article;
pub mod content;
mod summary;
pub mod upstream;
pub mod vertex;

pub use adk::AdkClient;
pub use article::{ArticleService, category_for_key};
pub use content::{Content, Part};
pub use summary::{AgentResponse, DailySummaryView, SummaryService};
pub use vertex::{GenerateContentResponse, SummaryModel, VertexClient};
