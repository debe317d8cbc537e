//! 考试会话驱动 - 编排层
//!
//! 把清单加载、环境锁定、状态机和提交握手串成一个
//! 单线程协作式的轮询循环。两个启动挂起点（清单读取、
//! 锁定安装）并发推进，二者都就绪之前不渲染任何题目内容；
//! 所有退出路径都恰好走一次锁定拆除

use tokio::time::{interval, Duration};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::JsExecutor;
use crate::services::{CatalogLoader, LockdownGuard, QuizView, SubmissionClient, TakerEvent};
use crate::workflow::{QuizSession, SessionPhase};

/// 考试会话的结局
#[derive(Debug)]
pub enum ExamOutcome {
    /// 答卷已被评分服务接受
    Submitted { answered: usize, total: usize },
    /// 会话在进入作答前终止（清单失败等）
    Aborted { message: String },
}

/// 驱动一场完整的考试会话
pub async fn run_exam(executor: &JsExecutor, config: &Config) -> anyhow::Result<ExamOutcome> {
    QuizView::install_event_bridge(executor).await?;
    QuizView::render_loading(executor).await?;

    let mut guard = LockdownGuard::new();

    // 两个独立的挂起点并发推进：清单读取 与 锁定安装（含首次全屏请求）
    let (catalog_result, engage_result) =
        tokio::join!(CatalogLoader::load(executor), guard.engage(executor));

    // 锁定安装失败意味着页面已经不可用，属于致命错误
    engage_result?;

    let catalog = match catalog_result {
        Ok(catalog) => catalog,
        Err(e) => {
            // 清单失败对本场考试是终止性的：阻塞界面，绝不进入作答
            let message = e.to_string();
            warn!("❌ {}", message);
            QuizView::render_fatal(executor, &message).await?;
            teardown_best_effort(&mut guard, executor).await;
            return Ok(ExamOutcome::Aborted { message });
        }
    };

    let mut session = match QuizSession::new(&config.student_id, catalog) {
        Ok(session) => session,
        Err(e) => {
            let message = e.to_string();
            QuizView::render_fatal(executor, &message).await?;
            teardown_best_effort(&mut guard, executor).await;
            return Ok(ExamOutcome::Aborted { message });
        }
    };

    let submission_client = SubmissionClient::new(config);

    let outcome = drive_session(executor, config, &guard, &submission_client, &mut session).await;

    // 无论成功、放弃还是出错，锁定都只拆除一次；
    // 错误路径上页面可能已经不在，拆除失败吞掉
    teardown_best_effort(&mut guard, executor).await;
    let _ = QuizView::remove_event_bridge(executor).await;

    let (answered, total) = outcome?;
    Ok(ExamOutcome::Submitted { answered, total })
}

/// 轮询循环：重算合规、取走考生操作、按阶段渲染、处理提交握手
///
/// 只有提交成功才会正常返回；页面丢失等错误直接上抛
async fn drive_session(
    executor: &JsExecutor,
    config: &Config,
    guard: &LockdownGuard,
    submission_client: &SubmissionClient,
    session: &mut QuizSession,
) -> AppResult<(usize, usize)> {
    let mut ticker = interval(Duration::from_millis(config.poll_interval_ms));
    let mut banner: Option<String> = None;
    let mut confirming = false;
    let mut dirty = true;

    loop {
        ticker.tick().await;

        // 合规标志每个周期从页面重算一次，喂给状态机
        let compliant = guard.is_compliant(executor).await?;
        let phase_before = session.phase();
        session.set_compliance(compliant);
        if session.phase() != phase_before {
            dirty = true;
            if session.phase() == SessionPhase::Blocked {
                // 失去合规时丢弃未完成的确认框
                confirming = false;
            }
        }

        for event in QuizView::drain_events(executor).await? {
            match session.phase() {
                SessionPhase::Active if confirming => match event {
                    TakerEvent::SubmitConfirmed => {
                        // 幂等闸门：重复确认不会产生第二次提交
                        if session.begin_submission()? {
                            confirming = false;
                            dirty = true;
                        }
                    }
                    TakerEvent::SubmitCancelled => {
                        confirming = false;
                        dirty = true;
                    }
                    _ => {}
                },
                SessionPhase::Active => match event {
                    TakerEvent::SelectOption(key) => match session.select_option(&key) {
                        Ok(()) => dirty = true,
                        Err(AppError::Session(e)) => {
                            // 页面只会产生渲染过的键，走到这里说明界面和状态机脱节
                            warn!("⚠️ 忽略非法选项事件: {}", e);
                        }
                        Err(e) => return Err(e),
                    },
                    TakerEvent::Next => {
                        session.go_next()?;
                        dirty = true;
                    }
                    TakerEvent::Prev => {
                        session.go_prev()?;
                        dirty = true;
                    }
                    TakerEvent::SubmitRequested => {
                        if session.can_request_submit() {
                            confirming = true;
                            dirty = true;
                        }
                    }
                    TakerEvent::DismissBanner => {
                        banner = None;
                        dirty = true;
                    }
                    _ => {}
                },
                SessionPhase::Blocked => match event {
                    TakerEvent::RetryFullscreen => {
                        // 手动重试；结果体现在下个周期的合规重算里
                        guard.request_fullscreen(executor).await?;
                    }
                    _ => {}
                },
                // 提交在本循环下方同步处理，这两个阶段不再接受操作
                SessionPhase::Submitting | SessionPhase::Done => {}
            }
        }

        // 提交握手：每次确认恰好一次网络请求，失败回滚且答案不丢
        if session.phase() == SessionPhase::Submitting {
            QuizView::render_submitting(executor).await?;

            let payload = session.build_submission();
            match submission_client.submit(executor, &payload).await {
                Ok(()) => {
                    session.complete();
                    info!("🎉 考试会话完成 (考生: {})", session.student_id());
                    return Ok((session.answered_count(), session.catalog().len()));
                }
                Err(AppError::Submission(e)) => {
                    warn!("⚠️ 提交失败，回滚到作答状态: {}", e);
                    session.rollback_submission();
                    banner = Some(e.to_string());
                    dirty = true;
                }
                Err(other) => return Err(other),
            }
        }

        if dirty {
            match session.phase() {
                SessionPhase::Blocked => QuizView::render_blocked(executor).await?,
                SessionPhase::Active if confirming => {
                    QuizView::render_confirm(
                        executor,
                        session.answered_count(),
                        session.catalog().len(),
                    )
                    .await?
                }
                SessionPhase::Active => {
                    QuizView::render_question(
                        executor,
                        session.current_question(),
                        session.cursor(),
                        session.catalog().len(),
                        session.selected_for_current(),
                        session.student_id(),
                        banner.as_deref(),
                    )
                    .await?
                }
                SessionPhase::Submitting | SessionPhase::Done => {}
            }
            dirty = false;
        }
    }
}

async fn teardown_best_effort(guard: &mut LockdownGuard, executor: &JsExecutor) {
    if let Err(e) = guard.teardown(executor).await {
        warn!("⚠️ 锁定拆除失败 (页面可能已关闭): {}", e);
    }
}
