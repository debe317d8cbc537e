//! 流程层
//!
//! 定义一场考试会话的状态与合法转移，不持有任何资源

pub mod session;

pub use session::{QuizSession, SessionPhase};
