//! 业务能力层
//!
//! 描述"我能做什么"，每个模块只负责一种能力，执行器作为参数传入

pub mod catalog_loader;
pub mod lockdown_guard;
pub mod quiz_view;
pub mod status_client;
pub mod submission;

pub use catalog_loader::CatalogLoader;
pub use lockdown_guard::LockdownGuard;
pub use quiz_view::{QuizView, TakerEvent};
pub use status_client::StatusClient;
pub use submission::SubmissionClient;
