//! 编排层
//!
//! 管理浏览器资源和阶段切换：状态查询 → 考试会话 → 回顾

pub mod exam_runner;

pub use exam_runner::{run_exam, ExamOutcome};

use anyhow::Result;
use chromiumoxide::Browser;
use tracing::{error, info};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::JsExecutor;
use crate::services::status_client::validate_student_id;
use crate::services::{QuizView, StatusClient};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    browser: Browser,
    launched: bool,
    executor: JsExecutor,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(&config.student_id, &config.quiz_url);

        // 调试端口大于 0 时连接现有浏览器，否则自己启动一个
        let launched = config.browser_debug_port == 0;
        let (browser, page) = if launched {
            browser::launch_exam_browser(&config.quiz_url, config.browser_executable.as_deref())
                .await?
        } else {
            browser::connect_to_exam_page(config.browser_debug_port, &config.quiz_url).await?
        };

        Ok(Self {
            config,
            browser,
            launched,
            executor: JsExecutor::new(page),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(self) -> Result<()> {
        // 考生号先过格式校验，不合法时不发起任何网络请求
        validate_student_id(&self.config.student_id)?;

        let status_client = StatusClient::new(&self.config);

        // 状态查询决定进入作答还是直接回顾
        let status = status_client.check_status(&self.config.student_id).await?;
        if status.attempted {
            info!("考生 {} 已交卷，直接进入回顾阶段", self.config.student_id);
            self.show_review(&status_client).await?;
            self.wait_and_close().await;
            return Ok(());
        }

        match run_exam(&self.executor, &self.config).await? {
            ExamOutcome::Submitted { answered, total } => {
                logging::log_session_summary(answered, total, &self.config.output_log_file);
                // 交卷成功后移交回顾阶段（带考生号）
                self.show_review(&status_client).await?;
            }
            ExamOutcome::Aborted { message } => {
                error!("❌ 考试会话终止: {}", message);
            }
        }

        self.wait_and_close().await;
        Ok(())
    }

    /// 回顾阶段：拉取已评分的成绩并渲染只读摘要
    async fn show_review(&self, status_client: &StatusClient) -> Result<()> {
        let results = status_client
            .fetch_results(&self.config.student_id)
            .await?;

        let lines: Vec<(String, String, bool)> = results
            .answers
            .iter()
            .map(|a| {
                (
                    format!("Question {}", a.question_id),
                    a.selected_option.clone(),
                    a.is_correct,
                )
            })
            .collect();

        QuizView::render_review(
            &self.executor,
            &self.config.student_id,
            results.score,
            results.answers.len(),
            &lines,
        )
        .await?;

        Ok(())
    }

    /// 把最后一屏留给考生看，操作员 Ctrl+C 后再收尾
    ///
    /// 只有自己启动的浏览器才随进程关闭；
    /// 连接来的浏览器归操作员所有，不动
    async fn wait_and_close(mut self) {
        info!("💡 按 Ctrl+C 结束");
        let _ = tokio::signal::ctrl_c().await;

        if self.launched {
            if let Err(e) = self.browser.close().await {
                tracing::debug!("关闭浏览器失败: {}", e);
            }
        }
    }
}
