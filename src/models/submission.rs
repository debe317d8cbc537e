use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::question::Catalog;

/// 未作答题目的哨兵值（评分服务约定的字面量）
pub const NOT_ANSWERED: &str = "Not Answered";

/// 单题作答记录（提交载荷中的一项）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerReport {
    #[serde(rename = "questionId")]
    pub question_id: String,

    /// 所选选项的键，未作答时为 "Not Answered"
    #[serde(rename = "selectedOption")]
    pub selected_option: String,

    /// 本地判定的对错，仅供参考，权威评分在服务端
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
}

/// 答卷提交载荷
///
/// 提交时从 清单 × 答案映射 一次性派生，顺序与清单一致
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest {
    #[serde(rename = "studentId")]
    pub student_id: String,

    pub answers: Vec<AnswerReport>,
}

impl SubmitRequest {
    /// 构建提交载荷
    ///
    /// 每道题恰好产生一条记录：已作答的带所选键和本地对错判定，
    /// 未作答的带哨兵值且判为错
    pub fn build(student_id: &str, catalog: &Catalog, answers: &HashMap<String, String>) -> Self {
        let answers = catalog
            .iter()
            .map(|q| match answers.get(&q.id) {
                Some(key) => AnswerReport {
                    question_id: q.id.clone(),
                    selected_option: key.clone(),
                    is_correct: q.is_correct(key),
                },
                None => AnswerReport {
                    question_id: q.id.clone(),
                    selected_option: NOT_ANSWERED.to_string(),
                    is_correct: false,
                },
            })
            .collect();

        Self {
            student_id: student_id.to_string(),
            answers,
        }
    }
}

/// 考生状态查询结果
///
/// GET /api/quiz/status/{studentId} 的响应，决定考生进入作答还是回顾阶段
#[derive(Debug, Clone, Deserialize)]
pub struct QuizStatus {
    #[serde(default)]
    pub attempted: bool,
}

/// 已评分的单题记录
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedAnswer {
    #[serde(rename = "questionId")]
    pub question_id: String,

    #[serde(rename = "selectedOption")]
    pub selected_option: String,

    #[serde(rename = "isCorrect", default)]
    pub is_correct: bool,
}

/// 成绩查询结果
///
/// GET /api/quiz/answers/{studentId} 的响应，回顾阶段的只读数据
#[derive(Debug, Clone, Deserialize)]
pub struct QuizResults {
    pub score: f64,

    #[serde(default)]
    pub answers: Vec<RecordedAnswer>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Options, Question};

    fn question(id: &str, keys: &[&str], answer: &str) -> Question {
        Question {
            id: id.to_string(),
            stem: format!("题目 {}", id),
            code: None,
            options: Options::new(
                keys.iter()
                    .map(|k| (k.to_string(), format!("选项 {}", k)))
                    .collect(),
            ),
            answer: answer.to_string(),
        }
    }

    #[test]
    fn test_payload_has_one_entry_per_question_in_order() {
        let catalog = Catalog::new(vec![
            question("q1", &["A", "B"], "A"),
            question("q2", &["A", "B", "C"], "C"),
            question("q3", &["A", "B"], "B"),
        ]);
        let mut answers = HashMap::new();
        answers.insert("q3".to_string(), "B".to_string());
        answers.insert("q1".to_string(), "A".to_string());

        let payload = SubmitRequest::build("n200094", &catalog, &answers);

        assert_eq!(payload.answers.len(), 3, "每道题都应有且只有一条记录");
        let ids: Vec<&str> = payload
            .answers
            .iter()
            .map(|a| a.question_id.as_str())
            .collect();
        assert_eq!(ids, vec!["q1", "q2", "q3"], "记录顺序应与清单一致");
    }

    #[test]
    fn test_unanswered_question_gets_sentinel() {
        let catalog = Catalog::new(vec![question("q1", &["A", "B"], "A")]);
        let payload = SubmitRequest::build("n200094", &catalog, &HashMap::new());

        assert_eq!(payload.answers[0].selected_option, NOT_ANSWERED);
        assert!(!payload.answers[0].is_correct);
    }

    #[test]
    fn test_local_correctness_flag() {
        let catalog = Catalog::new(vec![
            question("q1", &["A", "B"], "A"),
            question("q2", &["A", "B", "C"], "C"),
        ]);
        let mut answers = HashMap::new();
        answers.insert("q1".to_string(), "B".to_string());

        let payload = SubmitRequest::build("n200094", &catalog, &answers);

        assert_eq!(payload.answers[0].selected_option, "B");
        assert!(!payload.answers[0].is_correct, "选错应判为错");
        assert_eq!(payload.answers[1].selected_option, NOT_ANSWERED);
        assert!(!payload.answers[1].is_correct, "未作答应判为错");
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let catalog = Catalog::new(vec![question("q1", &["A", "B"], "A")]);
        let payload = SubmitRequest::build("n200094", &catalog, &HashMap::new());

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("studentId").is_some());
        let first = &json["answers"][0];
        assert!(first.get("questionId").is_some());
        assert!(first.get("selectedOption").is_some());
        assert!(first.get("isCorrect").is_some());
    }
}
