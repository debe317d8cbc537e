use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};

/// 单道选择题
///
/// 清单加载完成后不可变，整场考试只读
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// 题目标识（整场考试内唯一且稳定）
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// 题干文本
    #[serde(rename = "question")]
    pub stem: String,

    /// 代码片段（可选，原样展示，不做类型化处理）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// 选项映射（键 → 展示文本，迭代顺序即展示顺序）
    pub options: Options,

    /// 正确选项的键
    ///
    /// 历史数据里同时存在 answer 和 correct_answer 两种字段名，
    /// 统一解析到 answer，比较时只认这一个字段
    #[serde(alias = "correct_answer")]
    pub answer: String,
}

impl Question {
    /// 判断键是否属于本题的选项集合
    pub fn has_option(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    /// 判断所选键是否为正确答案
    pub fn is_correct(&self, key: &str) -> bool {
        self.answer == key
    }
}

/// 选项映射
///
/// JSON 里是一个对象 {"A": "...", "B": "..."}，但展示顺序必须与
/// 资源文件中的书写顺序一致，所以内部用有序的键值对列表而不是 HashMap
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(Vec<(String, String)>);

impl Options {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 按展示顺序迭代 (键, 文本)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for Options {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Options {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{MapAccess, Visitor};
        use std::fmt;

        struct OptionsVisitor;

        impl<'de> Visitor<'de> for OptionsVisitor {
            type Value = Options;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of option key to option text")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(4));
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    entries.push((key, value));
                }
                Ok(Options(entries))
            }
        }

        deserializer.deserialize_map(OptionsVisitor)
    }
}

// Helper function to deserialize the question id as either string or integer
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct IdVisitor;

    impl<'de> Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer question id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// 题目清单
///
/// 整场考试固定长度的有序题目序列，只在会话开始时加载一次
#[derive(Debug, Clone)]
pub struct Catalog(Vec<Question>);

impl Catalog {
    pub fn new(questions: Vec<Question>) -> Self {
        Self(questions)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.0.get(index)
    }

    /// 最后一题的下标
    pub fn last_index(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_preserve_wire_order() {
        let json = r#"{"C": "third", "A": "first", "B": "second"}"#;
        let options: Options = serde_json::from_str(json).unwrap();

        let keys: Vec<&str> = options.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["C", "A", "B"], "选项顺序应与资源文件一致");
    }

    #[test]
    fn test_question_id_accepts_string_or_number() {
        let with_string: Question = serde_json::from_str(
            r#"{"id": "q1", "question": "x?", "options": {"A": "1", "B": "2"}, "answer": "A"}"#,
        )
        .unwrap();
        assert_eq!(with_string.id, "q1");

        let with_number: Question = serde_json::from_str(
            r#"{"id": 7, "question": "x?", "options": {"A": "1", "B": "2"}, "answer": "A"}"#,
        )
        .unwrap();
        assert_eq!(with_number.id, "7");
    }

    #[test]
    fn test_answer_accepts_legacy_field_name() {
        let q: Question = serde_json::from_str(
            r#"{"id": 1, "question": "x?", "options": {"A": "1", "B": "2"}, "correct_answer": "B"}"#,
        )
        .unwrap();
        assert_eq!(q.answer, "B");
        assert!(q.is_correct("B"));
        assert!(!q.is_correct("A"));
    }

    #[test]
    fn test_question_without_code_block() {
        let q: Question = serde_json::from_str(
            r#"{"id": 1, "question": "x?", "options": {"A": "1", "B": "2"}, "answer": "A"}"#,
        )
        .unwrap();
        assert!(q.code.is_none(), "缺少 code 字段不应导致解析失败");
    }

    #[test]
    fn test_question_with_single_option_still_parses() {
        // 少于 2 个选项属于数据缺陷，但解析和展示都不应报错
        let q: Question = serde_json::from_str(
            r#"{"id": 1, "question": "x?", "options": {"A": "only"}, "answer": "A"}"#,
        )
        .unwrap();
        assert_eq!(q.options.len(), 1);
        assert!(q.has_option("A"));
        assert!(!q.has_option("B"));
    }
}
