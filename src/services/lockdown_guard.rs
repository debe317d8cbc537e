//! 考试环境锁定守卫 - 业务能力层
//!
//! 会话开始时一次性获取浏览器级的三项约束：
//! 全屏、右键菜单抑制、离开页面确认；
//! 会话结束（无论成功、放弃还是出错）都必须走 teardown 归还，
//! 避免监听器泄漏到后续界面
//!
//! 全屏请求被拒绝不是错误：合规标志保持 false，
//! 界面给考生一个手动重试入口

use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::infrastructure::JsExecutor;

/// 环境锁定守卫
///
/// engage 之后必须保证 teardown，二者都可重复调用（幂等）
pub struct LockdownGuard {
    engaged: bool,
}

impl LockdownGuard {
    pub fn new() -> Self {
        Self { engaged: false }
    }

    /// 是否已装上锁定
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// 安装三项约束并发出首次全屏请求
    pub async fn engage(&mut self, executor: &JsExecutor) -> AppResult<()> {
        info!("🔒 正在进入考试锁定环境...");

        executor.eval(INSTALL_SCRIPT).await?;
        self.engaged = true;
        debug!("锁定监听器安装完成");

        // 首次全屏请求；被拒绝只记录，不上抛
        self.request_fullscreen(executor).await?;

        Ok(())
    }

    /// 重新发出全屏请求（考生在阻塞界面上手动重试时调用）
    ///
    /// 返回请求后的合规状态；浏览器拒绝不算错误
    pub async fn request_fullscreen(&self, executor: &JsExecutor) -> AppResult<bool> {
        let granted = executor.eval_bool(FULLSCREEN_REQUEST_SCRIPT).await?;

        if granted {
            info!("✓ 页面已进入全屏");
        } else {
            warn!("⚠️ 全屏请求未生效，等待考生手动重试");
        }

        Ok(granted)
    }

    /// 重新计算合规标志 = 文档当前处于全屏
    ///
    /// 每个轮询周期都按需重算，不做缓存
    pub async fn is_compliant(&self, executor: &JsExecutor) -> AppResult<bool> {
        executor.eval_bool("!!document.fullscreenElement").await
    }

    /// 拆除三项约束并尽力退出全屏
    ///
    /// 退出全屏的失败被吞掉；监听器移除失败会上抛，
    /// 调用方在错误路径上自行决定是否忽略
    pub async fn teardown(&mut self, executor: &JsExecutor) -> AppResult<()> {
        if !self.engaged {
            return Ok(());
        }

        executor.eval(TEARDOWN_SCRIPT).await?;
        self.engaged = false;
        info!("🔓 考试锁定环境已解除");

        Ok(())
    }
}

impl Default for LockdownGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// 安装脚本：三个监听器 + 全屏状态镜像，句柄挂在 window 上供拆除用
///
/// 重复执行是无害的（已安装则直接返回）
const INSTALL_SCRIPT: &str = r#"
(() => {
    if (window.__proctor) { return true; }
    const state = { fullscreen: !!document.fullscreenElement };
    const onContextMenu = (e) => e.preventDefault();
    const onBeforeUnload = (e) => { e.preventDefault(); e.returnValue = ''; };
    const onFullscreenChange = () => { state.fullscreen = !!document.fullscreenElement; };
    document.addEventListener('contextmenu', onContextMenu);
    window.addEventListener('beforeunload', onBeforeUnload);
    document.addEventListener('fullscreenchange', onFullscreenChange);
    window.__proctor = { state, onContextMenu, onBeforeUnload, onFullscreenChange };
    return true;
})()
"#;

/// 全屏请求脚本：拒绝时返回 false，绝不抛出
const FULLSCREEN_REQUEST_SCRIPT: &str = r#"
(async () => {
    try {
        if (document.documentElement.requestFullscreen) {
            await document.documentElement.requestFullscreen();
        }
        return !!document.fullscreenElement;
    } catch (err) {
        console.error("全屏请求被拒绝:", err);
        return false;
    }
})()
"#;

/// 拆除脚本：移除三个监听器，尽力退出全屏（失败吞掉）
const TEARDOWN_SCRIPT: &str = r#"
(async () => {
    const p = window.__proctor;
    if (!p) { return true; }
    document.removeEventListener('contextmenu', p.onContextMenu);
    window.removeEventListener('beforeunload', p.onBeforeUnload);
    document.removeEventListener('fullscreenchange', p.onFullscreenChange);
    delete window.__proctor;
    if (document.fullscreenElement && document.exitFullscreen) {
        try { await document.exitFullscreen(); } catch (err) {}
    }
    return true;
})()
"#;
