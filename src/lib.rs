//! # Quiz Proctor
//!
//! 一个通过 CDP 驱动浏览器标签页的监考考试客户端：
//! 题目清单加载、锁定环境、会话状态机、答卷提交握手
//! 全部在 Rust 进程里，页面只是被驱动的展示面
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，每个模块一种能力
//! - `CatalogLoader` - 题目清单读取与校验能力
//! - `LockdownGuard` - 锁定环境的获取 / 重算 / 拆除能力
//! - `QuizView` - 界面渲染与考生操作捕获能力
//! - `SubmissionClient` - 答卷提交能力
//! - `StatusClient` - 状态查询 / 成绩查询能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一场考试"的状态与合法转移
//! - `QuizSession` - 会话状态机（游标 + 答案映射）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/exam_runner` - 考试会话驱动循环
//! - `orchestrator/App` - 浏览器资源与阶段切换
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{connect_to_exam_page, launch_exam_browser};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::JsExecutor;
pub use models::{Catalog, Question, SubmitRequest};
pub use orchestrator::{run_exam, App, ExamOutcome};
pub use services::{CatalogLoader, LockdownGuard, QuizView, StatusClient, SubmissionClient};
pub use workflow::{QuizSession, SessionPhase};
