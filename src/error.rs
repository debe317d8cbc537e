use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 浏览器相关错误
    Browser(BrowserError),
    /// 题目清单加载错误（对本场考试是终止性的）
    Catalog(CatalogError),
    /// 答卷提交错误（可恢复，考生可重试）
    Submission(SubmissionError),
    /// 协作接口调用错误（状态查询 / 成绩查询）
    Api(ApiError),
    /// 会话内部不变量被违反（属于编程错误，防御性拒绝）
    Session(SessionError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Browser(e) => write!(f, "浏览器错误: {}", e),
            AppError::Catalog(e) => write!(f, "题目清单错误: {}", e),
            AppError::Submission(e) => write!(f, "提交错误: {}", e),
            AppError::Api(e) => write!(f, "API错误: {}", e),
            AppError::Session(e) => write!(f, "会话错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Browser(e) => Some(e),
            AppError::Catalog(e) => Some(e),
            AppError::Submission(e) => Some(e),
            AppError::Api(e) => Some(e),
            AppError::Session(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 浏览器相关错误
#[derive(Debug)]
pub enum BrowserError {
    /// 连接浏览器失败
    ConnectionFailed {
        port: u16,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建页面失败
    PageCreationFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 导航失败
    NavigationFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 执行脚本失败
    ScriptExecutionFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 浏览器配置失败
    ConfigurationFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for BrowserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserError::ConnectionFailed { port, source } => {
                write!(f, "无法连接到浏览器 (端口: {}): {}", port, source)
            }
            BrowserError::PageCreationFailed { source } => {
                write!(f, "创建页面失败: {}", source)
            }
            BrowserError::NavigationFailed { url, source } => {
                write!(f, "导航到 {} 失败: {}", url, source)
            }
            BrowserError::ScriptExecutionFailed { source } => {
                write!(f, "执行脚本失败: {}", source)
            }
            BrowserError::ConfigurationFailed { source } => {
                write!(f, "浏览器配置失败: {}", source)
            }
        }
    }
}

impl std::error::Error for BrowserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BrowserError::ConnectionFailed { source, .. }
            | BrowserError::PageCreationFailed { source }
            | BrowserError::NavigationFailed { source, .. }
            | BrowserError::ScriptExecutionFailed { source }
            | BrowserError::ConfigurationFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 题目清单错误
///
/// 清单每场考试只加载一次，任何失败都不重试，直接进入终止状态
#[derive(Debug)]
pub enum CatalogError {
    /// 读取题目资源失败（网络层面）
    LoadFailed { url: String, detail: String },
    /// 题目资源格式不合法（缺少 questions 字段、不是数组、题目无法解析等）
    Invalid { reason: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::LoadFailed { url, detail } => {
                write!(f, "读取题目资源失败 ({}): {}", url, detail)
            }
            CatalogError::Invalid { reason } => {
                write!(f, "题目资源格式不合法: {}", reason)
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// 答卷提交错误
///
/// 提交失败后会话回滚到作答状态，答案映射保持不变
#[derive(Debug)]
pub enum SubmissionError {
    /// 服务端拒绝（非 2xx 响应）
    Rejected {
        status: u16,
        message: Option<String>,
    },
    /// 网络层面失败（请求未能到达服务端或响应不可读）
    Transport { detail: String },
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionError::Rejected { status, message } => match message {
                Some(msg) => write!(f, "服务端拒绝了答卷 (HTTP {}): {}", status, msg),
                None => write!(f, "服务端拒绝了答卷 (HTTP {})", status),
            },
            SubmissionError::Transport { detail } => {
                write!(f, "答卷提交请求失败: {}", detail)
            }
        }
    }
}

impl std::error::Error for SubmissionError {}

/// 协作接口调用错误
#[derive(Debug)]
pub enum ApiError {
    /// 网络请求失败
    RequestFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// API 返回错误响应
    BadResponse {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    /// JSON 解析失败
    JsonParseFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::RequestFailed { endpoint, source } => {
                write!(f, "API请求失败 ({}): {}", endpoint, source)
            }
            ApiError::BadResponse {
                endpoint,
                status,
                message,
            } => {
                write!(
                    f,
                    "API返回错误响应 ({}): status={}, message={:?}",
                    endpoint, status, message
                )
            }
            ApiError::JsonParseFailed { source } => {
                write!(f, "JSON解析失败: {}", source)
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::RequestFailed { source, .. } | ApiError::JsonParseFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 会话内部不变量错误
///
/// 这些错误在正常的操作契约下不可达，出现即说明调用方写错了代码
#[derive(Debug)]
pub enum SessionError {
    /// 在非作答状态下调用了只允许作答状态的操作
    NotActive { phase: &'static str },
    /// 选择的选项不在当前题目的选项集合中
    UnknownOption { question_id: String, key: String },
    /// 不在最后一题却发起了提交
    NotAtLastQuestion { cursor: usize, total: usize },
    /// 游标超出范围
    CursorOutOfRange { cursor: usize, total: usize },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotActive { phase } => {
                write!(f, "当前状态 {} 不允许该操作", phase)
            }
            SessionError::UnknownOption { question_id, key } => {
                write!(f, "选项 {} 不属于题目 {}", key, question_id)
            }
            SessionError::NotAtLastQuestion { cursor, total } => {
                write!(f, "只有最后一题允许提交 (当前: {}/{})", cursor + 1, total)
            }
            SessionError::CursorOutOfRange { cursor, total } => {
                write!(f, "游标 {} 超出范围 [0, {})", cursor, total)
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 考生号格式不合法
    InvalidStudentId { value: String },
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidStudentId { value } => {
                write!(
                    f,
                    "考生号格式不合法: '{}' (应为字母 n 加 6 位数字, 如 n200094)",
                    value
                )
            }
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            source: Box::new(err),
        })
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err.url().map(|u| u.to_string()).unwrap_or_default();
        AppError::Api(ApiError::RequestFailed {
            endpoint,
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn browser_connection_failed(
        port: u16,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Browser(BrowserError::ConnectionFailed {
            port,
            source: Box::new(source),
        })
    }

    /// 创建题目资源读取错误
    pub fn catalog_load_failed(url: impl Into<String>, detail: impl Into<String>) -> Self {
        AppError::Catalog(CatalogError::LoadFailed {
            url: url.into(),
            detail: detail.into(),
        })
    }

    /// 创建题目资源格式错误
    pub fn catalog_invalid(reason: impl Into<String>) -> Self {
        AppError::Catalog(CatalogError::Invalid {
            reason: reason.into(),
        })
    }

    /// 创建提交被拒绝错误
    pub fn submission_rejected(status: u16, message: Option<String>) -> Self {
        AppError::Submission(SubmissionError::Rejected { status, message })
    }

    /// 创建提交网络失败错误
    pub fn submission_transport(detail: impl Into<String>) -> Self {
        AppError::Submission(SubmissionError::Transport {
            detail: detail.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
