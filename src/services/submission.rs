//! 答卷提交 - 业务能力层
//!
//! 每次确认只发起一次提交，不自动重试；
//! 失败的分类是纯函数，方便单测覆盖回滚场景

use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::JsExecutor;
use crate::models::submission::SubmitRequest;

/// 评分服务客户端
pub struct SubmissionClient {
    api_base_url: String,
}

impl SubmissionClient {
    pub fn new(config: &Config) -> Self {
        Self {
            api_base_url: config.api_base_url.clone(),
        }
    }

    /// 提交答卷
    ///
    /// 请求在页面上下文中发出（与线上页面相同的通道）；
    /// 每次调用恰好一次网络请求
    pub async fn submit(&self, executor: &JsExecutor, request: &SubmitRequest) -> AppResult<()> {
        let payload = serde_json::to_string(request)?;

        info!(
            "📤 正在提交答卷 (考生: {}, {} 条记录)...",
            request.student_id,
            request.answers.len()
        );
        debug!("提交载荷: {}", payload);

        let script = build_submit_script(&self.api_base_url, &payload);
        let result = executor.eval(script).await?;

        classify_response(&result)?;

        info!("✅ 答卷提交成功");
        Ok(())
    }
}

/// 构建页面内提交脚本
///
/// 约定：网络层失败返回 null，其余情况返回 {ok, status, body}
fn build_submit_script(base_url: &str, payload_json: &str) -> String {
    format!(
        r#"
        (async () => {{
            try {{
                const res = await fetch("{}/api/quiz/submit", {{
                    method: "POST",
                    headers: {{
                        "Content-Type": "application/json",
                        "Accept": "application/json, text/plain, */*"
                    }},
                    body: JSON.stringify({})
                }});
                let body = null;
                try {{ body = await res.json(); }} catch (err) {{ body = null; }}
                return {{ ok: res.ok, status: res.status, body: body }};
            }} catch (err) {{
                console.error("提交请求失败:", err);
                return null;
            }}
        }})()
        "#,
        base_url, payload_json
    )
}

/// 把页面返回的探针结果分类为 成功 / 被拒绝 / 网络失败
///
/// 2xx 一律算接受（成功响应体的形状不做约定）；
/// 非 2xx 时尽量带上服务端给的 message
pub fn classify_response(result: &Value) -> AppResult<()> {
    if result.is_null() {
        return Err(AppError::submission_transport("请求未能到达评分服务"));
    }

    let ok = result.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
    if ok {
        return Ok(());
    }

    let status = result.get("status").and_then(|v| v.as_u64()).unwrap_or(0) as u16;
    let message = result
        .get("body")
        .and_then(|b| b.get("message"))
        .and_then(|m| m.as_str())
        .map(|s| s.to_string());

    Err(AppError::submission_rejected(status, message))
}
