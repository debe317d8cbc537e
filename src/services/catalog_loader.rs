//! 题目清单加载 - 业务能力层
//!
//! 每场考试只读取一次静态题目资源，成功后清单整场只读；
//! 任何失败都不重试，直接让会话进入终止错误状态

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::infrastructure::JsExecutor;
use crate::models::question::{Catalog, Question};

/// 题目资源相对考试页面源的路径
const CATALOG_ASSET: &str = "/questions.json";

/// 题目清单加载器
pub struct CatalogLoader;

impl CatalogLoader {
    /// 从考试页面源读取并校验题目清单
    ///
    /// 请求在页面上下文中发出，与原生页面取相对资源的行为一致
    pub async fn load(executor: &JsExecutor) -> AppResult<Catalog> {
        info!("📥 正在读取题目清单...");

        let script = build_fetch_script(CATALOG_ASSET);
        let result = executor.eval(script).await?;

        if result.is_null() {
            return Err(AppError::catalog_load_failed(
                CATALOG_ASSET,
                "请求未能完成或响应不可读",
            ));
        }

        let ok = result.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
        if !ok {
            let status = result.get("status").and_then(|v| v.as_u64()).unwrap_or(0);
            return Err(AppError::catalog_load_failed(
                CATALOG_ASSET,
                format!("HTTP {}", status),
            ));
        }

        let body = result.get("body").cloned().unwrap_or(Value::Null);
        let catalog = parse_catalog(&body)?;

        info!("✓ 题目清单加载完成，共 {} 道题", catalog.len());
        Ok(catalog)
    }
}

/// 构建页面内读取静态资源的脚本
///
/// 约定：网络层失败返回 null，其余情况返回 {ok, status, body}
fn build_fetch_script(asset_path: &str) -> String {
    format!(
        r#"
        (async () => {{
            try {{
                const res = await fetch("{}", {{
                    headers: {{ "Accept": "application/json" }}
                }});
                let body = null;
                try {{ body = await res.json(); }} catch (err) {{ body = null; }}
                return {{ ok: res.ok, status: res.status, body: body }};
            }} catch (err) {{
                console.error("题目资源请求失败:", err);
                return null;
            }}
        }})()
        "#,
        asset_path
    )
}

/// 校验题目资源的载荷并解析为清单
///
/// 与网络层分离的纯函数，便于直接对各种畸形载荷做测试
pub fn parse_catalog(body: &Value) -> AppResult<Catalog> {
    let questions = body
        .get("questions")
        .ok_or_else(|| AppError::catalog_invalid("缺少 questions 字段"))?;

    let list = questions
        .as_array()
        .ok_or_else(|| AppError::catalog_invalid("questions 字段不是数组"))?;

    if list.is_empty() {
        return Err(AppError::catalog_invalid("题目列表为空"));
    }

    debug!("题目资源包含 {} 个条目", list.len());

    let parsed: Vec<Question> = serde_json::from_value(questions.clone())
        .map_err(|e| AppError::catalog_invalid(format!("题目条目无法解析: {}", e)))?;

    Ok(Catalog::new(parsed))
}
