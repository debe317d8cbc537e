/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 浏览器调试端口（0 表示不连接现有浏览器，直接启动新实例）
    pub browser_debug_port: u16,
    /// 浏览器可执行文件路径（留空则使用 chromiumoxide 自动探测）
    pub browser_executable: Option<String>,
    /// 考试页面地址（题目资源 questions.json 相对于该源）
    pub quiz_url: String,
    /// 评分服务地址
    pub api_base_url: String,
    /// 考生号（格式: 字母 n 加 6 位数字）
    pub student_id: String,
    /// 事件轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 0,
            browser_executable: None,
            quiz_url: "http://localhost:5173".to_string(),
            api_base_url: "https://c-quiz.onrender.com".to_string(),
            student_id: "n200094".to_string(),
            poll_interval_ms: 150,
            verbose_logging: false,
            output_log_file: "exam_session.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser_debug_port),
            browser_executable: std::env::var("BROWSER_EXECUTABLE").ok().or(default.browser_executable),
            quiz_url: std::env::var("QUIZ_URL").unwrap_or(default.quiz_url),
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(default.api_base_url),
            student_id: std::env::var("STUDENT_ID").unwrap_or(default.student_id),
            poll_interval_ms: std::env::var("POLL_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.poll_interval_ms),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }
}
