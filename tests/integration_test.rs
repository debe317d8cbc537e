use std::collections::HashMap;

use quiz_proctor::error::{AppError, SubmissionError};
use quiz_proctor::models::NOT_ANSWERED;
use quiz_proctor::services::catalog_loader::parse_catalog;
use quiz_proctor::services::submission::classify_response;
use quiz_proctor::utils::logging;
use quiz_proctor::{connect_to_exam_page, Config, QuizSession, SessionPhase, SubmitRequest};

use serde_json::json;

/// 规定场景：Q1(A/B, 正确 A)，Q2(A/B/C, 正确 C)；
/// 考生 Q1 选 B，下一题，跳过 Q2，确认提交
#[test]
fn test_full_session_scenario_from_raw_catalog() {
    let body = json!({
        "questions": [
            {"id": "Q1", "question": "first?", "options": {"A": "a", "B": "b"}, "answer": "A"},
            {"id": "Q2", "question": "second?", "options": {"A": "a", "B": "b", "C": "c"}, "answer": "C"}
        ]
    });

    let catalog = parse_catalog(&body).expect("清单应能解析");
    let mut session = QuizSession::new("n200094", catalog).expect("会话应能创建");

    // 清单就绪 + 合规 才进入作答
    assert_eq!(session.phase(), SessionPhase::Blocked);
    session.set_compliance(true);
    assert_eq!(session.phase(), SessionPhase::Active);

    session.select_option("B").expect("Q1 选 B 应成功");
    session.go_next().expect("前进应成功");
    assert!(session.begin_submission().expect("确认提交应成功"));

    let payload = session.build_submission();
    assert_eq!(payload.answers.len(), 2);
    assert_eq!(payload.answers[0].question_id, "Q1");
    assert_eq!(payload.answers[0].selected_option, "B");
    assert!(!payload.answers[0].is_correct);
    assert_eq!(payload.answers[1].question_id, "Q2");
    assert_eq!(payload.answers[1].selected_option, NOT_ANSWERED);
    assert!(!payload.answers[1].is_correct);
}

/// 规定场景：评分服务返回 HTTP 500 → 回到最后一题的作答状态，
/// 答案映射不变，错误里带着服务端消息
#[test]
fn test_submission_500_rolls_back_with_answers_intact() {
    let body = json!({
        "questions": [
            {"id": "Q1", "question": "first?", "options": {"A": "a", "B": "b"}, "answer": "A"},
            {"id": "Q2", "question": "second?", "options": {"A": "a", "B": "b"}, "answer": "B"}
        ]
    });

    let mut session = QuizSession::new("n200094", parse_catalog(&body).unwrap()).unwrap();
    session.set_compliance(true);
    session.select_option("A").unwrap();
    session.go_next().unwrap();
    session.begin_submission().unwrap();

    // 服务端 500，提交被拒绝
    let server_result = json!({"ok": false, "status": 500, "body": {"message": "internal error"}});
    let err = classify_response(&server_result).unwrap_err();
    match &err {
        AppError::Submission(SubmissionError::Rejected { status, message }) => {
            assert_eq!(*status, 500);
            assert_eq!(message.as_deref(), Some("internal error"));
        }
        other => panic!("应为被拒绝错误, 实际是: {}", other),
    }

    session.rollback_submission();

    assert_eq!(session.phase(), SessionPhase::Active);
    assert_eq!(session.cursor(), 1, "回滚后应停在最后一题");
    assert_eq!(
        session.answers().get("Q1").map(String::as_str),
        Some("A"),
        "答案映射必须原样保留"
    );

    // 考生可以原地重试
    assert!(session.begin_submission().unwrap());
}

/// 规定场景：题目资源返回 {} → 终止性格式错误，
/// 会话根本不会被构造出来（题目内容无从渲染）
#[test]
fn test_empty_catalog_resource_is_terminal() {
    let err = parse_catalog(&json!({})).unwrap_err();
    assert!(matches!(err, AppError::Catalog(_)), "应为题目清单错误");
}

/// 提交载荷的键名必须与评分服务约定一致
#[test]
fn test_submit_request_wire_shape() {
    let body = json!({
        "questions": [
            {"id": 1, "question": "x?", "options": {"A": "a", "B": "b"}, "correct_answer": "A"}
        ]
    });
    let catalog = parse_catalog(&body).unwrap();

    let mut answers = HashMap::new();
    answers.insert("1".to_string(), "A".to_string());
    let payload = SubmitRequest::build("n200094", &catalog, &answers);

    let wire = serde_json::to_value(&payload).unwrap();
    assert_eq!(wire["studentId"], "n200094");
    assert_eq!(wire["answers"][0]["questionId"], "1");
    assert_eq!(wire["answers"][0]["selectedOption"], "A");
    assert_eq!(wire["answers"][0]["isCorrect"], true);
}

// ========== 以下测试需要真实浏览器，默认忽略 ==========
// 手动运行：cargo test -- --ignored

#[tokio::test]
#[ignore] // 需要一个已开启调试端口的浏览器
async fn test_browser_connection() {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 测试浏览器连接
    let result = connect_to_exam_page(config.browser_debug_port, &config.quiz_url).await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore] // 需要真实浏览器；验证锁定的安装与拆除不泄漏监听器
async fn test_lockdown_engage_and_teardown() {
    use quiz_proctor::{JsExecutor, LockdownGuard};

    logging::init();

    let config = Config::from_env();
    let (_browser, page) = connect_to_exam_page(config.browser_debug_port, &config.quiz_url)
        .await
        .expect("连接浏览器失败");

    let executor = JsExecutor::new(page);
    let mut guard = LockdownGuard::new();

    guard.engage(&executor).await.expect("锁定安装失败");
    let installed = executor
        .eval_bool("!!window.__proctor")
        .await
        .expect("探针执行失败");
    assert!(installed, "锁定句柄应已挂在页面上");

    guard.teardown(&executor).await.expect("锁定拆除失败");
    let removed = executor
        .eval_bool("!window.__proctor")
        .await
        .expect("探针执行失败");
    assert!(removed, "拆除后页面上不应残留锁定句柄");
}
