use std::path::Path;

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// 启动带界面的浏览器并导航到考试页面
///
/// 考生需要看到并操作页面，所以这里必须是有头模式；
/// 全屏在会话开始后由锁定守卫通过 Fullscreen API 请求
pub async fn launch_exam_browser(url: &str, executable: Option<&str>) -> Result<(Browser, Page)> {
    info!("🚀 启动考试浏览器...");
    debug!("考试页面地址: {}", url);

    let mut builder = BrowserConfig::builder()
        .with_head()
        .window_size(1280, 800)
        .args(vec![
            "--disable-gpu",             // 部分平台有头模式下 GPU 合成不稳定
            "--no-sandbox",              // 禁用沙盒，防止权限问题导致的崩溃
            "--disable-dev-shm-usage",   // 防止共享内存不足
            "--remote-debugging-port=0", // 让浏览器自动选择端口
        ]);

    if let Some(path) = executable {
        builder = builder.chrome_executable(Path::new(path));
    }

    let config = builder.build().map_err(|e| {
        error!("配置考试浏览器失败: {}", e);
        anyhow::anyhow!("配置考试浏览器失败: {}", e)
    })?;

    // 启动浏览器
    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动考试浏览器失败: {}", e);
        anyhow::anyhow!("启动考试浏览器失败: {}", e)
    })?;
    debug!("考试浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    // 创建新页面并导航
    let page = browser.new_page(url).await.map_err(|e| {
        error!("创建页面失败: {}", e);
        anyhow::anyhow!("创建页面失败: {}", e)
    })?;

    info!("✅ 考试浏览器已导航到: {}", url);

    Ok((browser, page))
}
