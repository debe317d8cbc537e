//! 数据模型
//!
//! 题目与清单在加载后只读；提交载荷在提交时一次性派生

pub mod question;
pub mod submission;

pub use question::{Catalog, Options, Question};
pub use submission::{
    AnswerReport, QuizResults, QuizStatus, RecordedAnswer, SubmitRequest, NOT_ANSWERED,
};
