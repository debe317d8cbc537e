//! 考生状态与成绩查询 - 业务能力层
//!
//! 登录前的状态查询和交卷后的成绩查询属于核心之外的协作接口，
//! 不经过页面，直接走 HTTP

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult, ConfigError};
use crate::models::submission::{QuizResults, QuizStatus};

/// 考生号格式：字母 n 加 6 位数字（如 n200094）
const STUDENT_ID_PATTERN: &str = r"^[nN]\d{6}$";

/// 校验考生号格式
pub fn is_valid_student_id(student_id: &str) -> bool {
    Regex::new(STUDENT_ID_PATTERN)
        .map(|re| re.is_match(student_id))
        .unwrap_or(false)
}

/// 校验考生号，格式不合法时返回配置错误
pub fn validate_student_id(student_id: &str) -> AppResult<()> {
    if is_valid_student_id(student_id) {
        Ok(())
    } else {
        Err(AppError::Config(ConfigError::InvalidStudentId {
            value: student_id.to_string(),
        }))
    }
}

/// 状态 / 成绩查询客户端
pub struct StatusClient {
    client: reqwest::Client,
    base_url: String,
}

impl StatusClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_base_url.clone(),
        }
    }

    #[cfg(test)]
    fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// 查询考生是否已经交过卷（决定进入作答还是回顾阶段）
    pub async fn check_status(&self, student_id: &str) -> AppResult<QuizStatus> {
        let endpoint = format!("{}/api/quiz/status/{}", self.base_url, student_id);
        debug!("查询考生状态: {}", endpoint);

        let response = self.client.get(&endpoint).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = extract_message(response.json::<Value>().await.ok());
            return Err(AppError::Api(ApiError::BadResponse {
                endpoint,
                status: status.as_u16(),
                message,
            }));
        }

        let parsed: QuizStatus = response.json().await?;
        info!(
            "✓ 考生 {} 状态: {}",
            student_id,
            if parsed.attempted { "已交卷" } else { "未作答" }
        );
        Ok(parsed)
    }

    /// 拉取已评分的成绩（回顾阶段的只读数据）
    pub async fn fetch_results(&self, student_id: &str) -> AppResult<QuizResults> {
        let endpoint = format!("{}/api/quiz/answers/{}", self.base_url, student_id);
        debug!("查询考生成绩: {}", endpoint);

        let response = self.client.get(&endpoint).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = extract_message(response.json::<Value>().await.ok());
            return Err(AppError::Api(ApiError::BadResponse {
                endpoint,
                status: status.as_u16(),
                message,
            }));
        }

        let parsed: QuizResults = response.json().await?;
        info!("✓ 考生 {} 得分: {}", student_id, parsed.score);
        Ok(parsed)
    }
}

/// 从错误响应体里尽量取出服务端给的 message
fn extract_message(body: Option<Value>) -> Option<String> {
    body.as_ref()
        .and_then(|b| b.get("message"))
        .and_then(|m| m.as_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_student_id_format() {
        assert!(is_valid_student_id("n200094"));
        assert!(is_valid_student_id("N123456"));

        assert!(!is_valid_student_id(""));
        assert!(!is_valid_student_id("200094"));
        assert!(!is_valid_student_id("n20009"));
        assert!(!is_valid_student_id("n2000941"));
        assert!(!is_valid_student_id("x200094"));
        assert!(!is_valid_student_id("n20009a"));
        assert!(!is_valid_student_id(" n200094"));
    }

    #[test]
    fn test_validate_student_id_error_type() {
        match validate_student_id("bogus").unwrap_err() {
            AppError::Config(ConfigError::InvalidStudentId { value }) => {
                assert_eq!(value, "bogus");
            }
            other => panic!("应为配置错误, 实际是: {}", other),
        }
    }

    #[tokio::test]
    async fn test_check_status_parses_attempted() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/quiz/status/n200094"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"attempted": true})),
            )
            .mount(&server)
            .await;

        let client = StatusClient::with_base_url(server.uri());
        let status = client.check_status("n200094").await.unwrap();
        assert!(status.attempted);
    }

    #[tokio::test]
    async fn test_check_status_bad_response_carries_server_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/quiz/status/n200094"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"message": "student not found"})),
            )
            .mount(&server)
            .await;

        let client = StatusClient::with_base_url(server.uri());
        match client.check_status("n200094").await.unwrap_err() {
            AppError::Api(ApiError::BadResponse { status, message, .. }) => {
                assert_eq!(status, 404);
                assert_eq!(message.as_deref(), Some("student not found"));
            }
            other => panic!("应为API错误, 实际是: {}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_results_parses_score_and_answers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/quiz/answers/n200094"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "score": 7,
                "answers": [
                    {"questionId": "q1", "selectedOption": "B", "isCorrect": false},
                    {"questionId": "q2", "selectedOption": "Not Answered", "isCorrect": false}
                ]
            })))
            .mount(&server)
            .await;

        let client = StatusClient::with_base_url(server.uri());
        let results = client.fetch_results("n200094").await.unwrap();
        assert_eq!(results.score, 7.0);
        assert_eq!(results.answers.len(), 2);
        assert_eq!(results.answers[1].selected_option, "Not Answered");
    }
}
