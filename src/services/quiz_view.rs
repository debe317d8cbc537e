//! 考试界面 - 业务能力层
//!
//! 页面只是一块哑表面：本模块把当前会话状态渲染成注入的 DOM，
//! 并通过一个委托式点击监听把考生的操作收进事件队列，
//! 由编排层在每个轮询周期取走
//!
//! 界面文案面向考生（英文，与线上产品一致），日志面向运维

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::infrastructure::JsExecutor;
use crate::models::question::Question;

/// 考生操作事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TakerEvent {
    /// 选择了一个选项
    SelectOption(String),
    /// 上一题
    Prev,
    /// 下一题
    Next,
    /// 点击了提交按钮（尚未确认）
    SubmitRequested,
    /// 在确认框里点了"是"
    SubmitConfirmed,
    /// 在确认框里点了"否"
    SubmitCancelled,
    /// 在阻塞界面上点了手动重试全屏
    RetryFullscreen,
    /// 关闭了错误横幅
    DismissBanner,
}

/// 页面事件队列里的原始记录
#[derive(Debug, Deserialize)]
struct RawEvent {
    kind: String,
    #[serde(default)]
    key: Option<String>,
}

/// 考试界面
pub struct QuizView;

impl QuizView {
    /// 安装委托式点击监听（挂在 document 上，innerHTML 替换不影响它）
    ///
    /// 重复执行无害
    pub async fn install_event_bridge(executor: &JsExecutor) -> AppResult<()> {
        executor.eval(EVENT_BRIDGE_SCRIPT).await?;
        debug!("事件桥安装完成");
        Ok(())
    }

    /// 移除点击监听并清空事件队列（会话结束时调用）
    pub async fn remove_event_bridge(executor: &JsExecutor) -> AppResult<()> {
        executor.eval(EVENT_BRIDGE_REMOVE_SCRIPT).await?;
        Ok(())
    }

    /// 取走队列里积累的考生操作
    pub async fn drain_events(executor: &JsExecutor) -> AppResult<Vec<TakerEvent>> {
        let raw: Vec<RawEvent> = executor
            .eval_as("(() => { const q = window.__examEvents || []; return q.splice(0, q.length); })()")
            .await?;

        Ok(raw.into_iter().filter_map(parse_event).collect())
    }

    /// 渲染当前题目（仅作答状态；banner 用于可关闭的提交失败提示）
    pub async fn render_question(
        executor: &JsExecutor,
        question: &Question,
        index: usize,
        total: usize,
        selected: Option<&str>,
        student_id: &str,
        banner: Option<&str>,
    ) -> AppResult<()> {
        let html = build_question_html(question, index, total, selected, student_id, banner);
        set_root_html(executor, &html).await
    }

    /// 渲染提交确认框
    pub async fn render_confirm(executor: &JsExecutor, answered: usize, total: usize) -> AppResult<()> {
        let html = build_confirm_html(answered, total);
        set_root_html(executor, &html).await
    }

    /// 渲染"提交中"界面
    pub async fn render_submitting(executor: &JsExecutor) -> AppResult<()> {
        set_root_html(
            executor,
            r#"<div class="glass-panel center"><h2>Submitting...</h2><p>Please wait, do not close this tab.</p></div>"#,
        )
        .await
    }

    /// 渲染全屏阻塞界面（合规标志为 false 时，题目内容绝不出现）
    pub async fn render_blocked(executor: &JsExecutor) -> AppResult<()> {
        set_root_html(
            executor,
            r#"<div class="fullscreen-warning center"><h2>Fullscreen Required</h2><p>Please enable fullscreen to continue the quiz.</p><button class="btn btn-primary" data-event="retry-fullscreen">Enter Fullscreen</button></div>"#,
        )
        .await
    }

    /// 渲染加载中界面
    pub async fn render_loading(executor: &JsExecutor) -> AppResult<()> {
        set_root_html(
            executor,
            r#"<div class="center loading">Loading questions...</div>"#,
        )
        .await
    }

    /// 渲染终止性错误界面（清单失败等，不再提供任何操作）
    pub async fn render_fatal(executor: &JsExecutor, message: &str) -> AppResult<()> {
        let html = format!(
            r#"<div class="glass-panel center error"><h2>Something went wrong</h2><p>{}</p></div>"#,
            html_escape(message)
        );
        set_root_html(executor, &html).await
    }

    /// 渲染回顾界面（成绩 + 各题对错摘要，只读）
    pub async fn render_review(
        executor: &JsExecutor,
        student_id: &str,
        score: f64,
        total: usize,
        lines: &[(String, String, bool)],
    ) -> AppResult<()> {
        let html = build_review_html(student_id, score, total, lines);
        set_root_html(executor, &html).await
    }
}

/// 把 HTML 写进专用根节点（不存在则创建）
async fn set_root_html(executor: &JsExecutor, html: &str) -> AppResult<()> {
    let literal = serde_json::to_string(html)?;
    let script = format!(
        r#"
        (() => {{
            let root = document.getElementById('proctor-root');
            if (!root) {{
                root = document.createElement('div');
                root.id = 'proctor-root';
                document.body.innerHTML = '';
                document.body.appendChild(root);
            }}
            root.innerHTML = {};
            return true;
        }})()
        "#,
        literal
    );
    executor.eval(script).await?;
    Ok(())
}

fn parse_event(raw: RawEvent) -> Option<TakerEvent> {
    match raw.kind.as_str() {
        "select-option" => match raw.key {
            Some(key) => Some(TakerEvent::SelectOption(key)),
            None => {
                warn!("选项事件缺少 key，忽略");
                None
            }
        },
        "prev" => Some(TakerEvent::Prev),
        "next" => Some(TakerEvent::Next),
        "submit-request" => Some(TakerEvent::SubmitRequested),
        "confirm-submit" => Some(TakerEvent::SubmitConfirmed),
        "cancel-submit" => Some(TakerEvent::SubmitCancelled),
        "retry-fullscreen" => Some(TakerEvent::RetryFullscreen),
        "dismiss-banner" => Some(TakerEvent::DismissBanner),
        other => {
            warn!("未知的界面事件: {}", other);
            None
        }
    }
}

// ========== HTML 构建（纯函数） ==========

/// 题目界面
///
/// 结构与线上页面一致：题号栏、题干、可选的代码块、按清单顺序的
/// 选项按钮、导航区（首题隐藏 Previous，末题把 Next 换成 Submit）
fn build_question_html(
    question: &Question,
    index: usize,
    total: usize,
    selected: Option<&str>,
    student_id: &str,
    banner: Option<&str>,
) -> String {
    let mut html = String::new();

    if let Some(message) = banner {
        html.push_str(&format!(
            r#"<div class="error-banner">Error submitting quiz: {} <button class="btn btn-small" data-event="dismiss-banner">Dismiss</button></div>"#,
            html_escape(message)
        ));
    }

    html.push_str(r#"<div class="quiz-container"><div class="glass-panel">"#);

    html.push_str(&format!(
        r#"<div class="quiz-header"><span>Question {} of {}</span><span>Student: {}</span></div>"#,
        index + 1,
        total,
        html_escape(student_id)
    ));

    html.push_str(&format!(
        r#"<h2 class="stem">{}</h2>"#,
        html_escape(&question.stem)
    ));

    // 没有代码片段的题目直接省略整个代码块区域
    if let Some(code) = &question.code {
        html.push_str(&format!(
            r#"<div class="code-block-container"><pre><code>{}</code></pre></div>"#,
            html_escape(code)
        ));
    }

    html.push_str(r#"<div class="options">"#);
    for (key, text) in question.options.iter() {
        let selected_class = if selected == Some(key) { " selected" } else { "" };
        html.push_str(&format!(
            r#"<button class="option-btn{}" data-event="select-option" data-key="{}"><span class="option-key">{}.</span> {}</button>"#,
            selected_class,
            html_escape(key),
            html_escape(key),
            html_escape(text)
        ));
    }
    html.push_str("</div>");

    let prev_style = if index == 0 { r#" style="visibility: hidden""# } else { "" };
    let forward = if index + 1 == total {
        r#"<button class="btn btn-primary" data-event="submit-request">Submit Quiz</button>"#.to_string()
    } else {
        r#"<button class="btn btn-primary" data-event="next">Next</button>"#.to_string()
    };
    html.push_str(&format!(
        r#"<div class="nav"><button class="btn btn-outline" data-event="prev"{}>Previous</button>{}</div>"#,
        prev_style, forward
    ));

    html.push_str("</div></div>");
    html
}

/// 提交确认框
fn build_confirm_html(answered: usize, total: usize) -> String {
    format!(
        r#"<div class="glass-panel center confirm"><h2>Are you sure you want to submit?</h2><p>{} of {} questions answered. You cannot change your answers after submitting.</p><div class="nav"><button class="btn btn-outline" data-event="cancel-submit">No, go back</button><button class="btn btn-primary" data-event="confirm-submit">Yes, submit</button></div></div>"#,
        answered, total
    )
}

/// 回顾界面
fn build_review_html(
    student_id: &str,
    score: f64,
    total: usize,
    lines: &[(String, String, bool)],
) -> String {
    let mut html = format!(
        r#"<div class="quiz-container"><div class="glass-panel center"><h1>Quiz Completed</h1><p>Thank you, {}. Your submission has been recorded.</p><div class="score">Score: {} / {}</div></div>"#,
        html_escape(student_id),
        score,
        total
    );

    for (stem, selected, is_correct) in lines {
        let status = if *is_correct { "correct" } else { "incorrect" };
        html.push_str(&format!(
            r#"<div class="glass-panel review-item {}"><h3>{}</h3><p>Your answer: {}</p></div>"#,
            status,
            html_escape(stem),
            html_escape(selected)
        ));
    }

    html.push_str("</div>");
    html
}

/// HTML 转义（所有插值文本都必须经过这里）
fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// 事件桥脚本：一个挂在 document 上的委托式点击监听，
/// 把带 data-event 标记的元素点击收进 window.__examEvents
const EVENT_BRIDGE_SCRIPT: &str = r#"
(() => {
    if (window.__examBridge) { return true; }
    window.__examEvents = [];
    const onClick = (e) => {
        const el = e.target.closest('[data-event]');
        if (!el) { return; }
        window.__examEvents.push({ kind: el.dataset.event, key: el.dataset.key || null });
    };
    document.addEventListener('click', onClick);
    window.__examBridge = { onClick };
    return true;
})()
"#;

const EVENT_BRIDGE_REMOVE_SCRIPT: &str = r#"
(() => {
    const b = window.__examBridge;
    if (!b) { return true; }
    document.removeEventListener('click', b.onClick);
    delete window.__examBridge;
    delete window.__examEvents;
    return true;
})()
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::Options;

    fn question_with_code(code: Option<&str>) -> Question {
        Question {
            id: "q1".to_string(),
            stem: "What does this print?".to_string(),
            code: code.map(|c| c.to_string()),
            options: Options::new(vec![
                ("A".to_string(), "zero".to_string()),
                ("B".to_string(), "one".to_string()),
            ]),
            answer: "A".to_string(),
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<b>"x" & 'y'</b>"#),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_question_html_includes_code_block_when_present() {
        let q = question_with_code(Some("printf(\"%d\", 0);"));
        let html = build_question_html(&q, 0, 2, None, "n200094", None);
        assert!(html.contains("code-block-container"));
        assert!(html.contains("printf(&quot;%d&quot;, 0);"), "代码必须转义后嵌入");
    }

    #[test]
    fn test_question_html_omits_code_block_when_absent() {
        // 缺少 code 字段的题目必须正常渲染，只是没有代码块区域
        let q = question_with_code(None);
        let html = build_question_html(&q, 0, 2, None, "n200094", None);
        assert!(!html.contains("code-block-container"));
        assert!(html.contains("What does this print?"));
    }

    #[test]
    fn test_options_render_in_catalog_order_with_selection() {
        let q = question_with_code(None);
        let html = build_question_html(&q, 0, 2, Some("B"), "n200094", None);

        let pos_a = html.find(r#"data-key="A""#).unwrap();
        let pos_b = html.find(r#"data-key="B""#).unwrap();
        assert!(pos_a < pos_b, "选项必须按清单顺序渲染");
        assert!(html.contains(r#"option-btn selected" data-event="select-option" data-key="B""#));
    }

    #[test]
    fn test_last_question_shows_submit_instead_of_next() {
        let q = question_with_code(None);

        let middle = build_question_html(&q, 0, 2, None, "n200094", None);
        assert!(middle.contains(r#"data-event="next""#));
        assert!(!middle.contains(r#"data-event="submit-request""#));

        let last = build_question_html(&q, 1, 2, None, "n200094", None);
        assert!(last.contains(r#"data-event="submit-request""#));
        assert!(!last.contains(r#"data-event="next""#));
    }

    #[test]
    fn test_first_question_hides_previous() {
        let q = question_with_code(None);
        let first = build_question_html(&q, 0, 3, None, "n200094", None);
        assert!(first.contains("visibility: hidden"));

        let second = build_question_html(&q, 1, 3, None, "n200094", None);
        assert!(!second.contains("visibility: hidden"));
    }

    #[test]
    fn test_banner_renders_with_dismiss() {
        let q = question_with_code(None);
        let html = build_question_html(&q, 1, 2, None, "n200094", Some("HTTP 500"));
        assert!(html.contains("error-banner"));
        assert!(html.contains(r#"data-event="dismiss-banner""#));
    }

    #[test]
    fn test_parse_event_mapping() {
        let ev = parse_event(RawEvent {
            kind: "select-option".to_string(),
            key: Some("C".to_string()),
        });
        assert_eq!(ev, Some(TakerEvent::SelectOption("C".to_string())));

        assert_eq!(
            parse_event(RawEvent { kind: "confirm-submit".to_string(), key: None }),
            Some(TakerEvent::SubmitConfirmed)
        );
        assert_eq!(
            parse_event(RawEvent { kind: "mystery".to_string(), key: None }),
            None,
            "未知事件应被丢弃"
        );
        assert_eq!(
            parse_event(RawEvent { kind: "select-option".to_string(), key: None }),
            None,
            "缺 key 的选项事件应被丢弃"
        );
    }
}
