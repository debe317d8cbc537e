//! 考试会话状态机 - 流程层
//!
//! 持有一场考试的全部可变状态：当前题目游标和答案映射。
//! 不做任何 I/O，网络和页面都在别的层；这也是整个仓库
//! 唯一值得认真测试不变量的组件
//!
//! 状态转移：
//! Blocked ⇄ Active → Submitting → Done
//!
//! 清单加载完成之前状态机尚未构造（加载阶段由编排层表达），
//! 构造后的初始状态是 Blocked，等待首次合规重算；
//! 一旦进入 Submitting，合规变化不再影响状态

use std::collections::HashMap;

use tracing::debug;

use crate::error::{AppError, AppResult, SessionError};
use crate::models::question::{Catalog, Question};
use crate::models::submission::SubmitRequest;

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// 环境不合规，题目内容不得出现
    Blocked,
    /// 作答中，全部操作只在此阶段有效
    Active,
    /// 提交进行中（终止性转移的前半程）
    Submitting,
    /// 已交卷，控制权移交回顾阶段
    Done,
}

impl SessionPhase {
    pub fn name(self) -> &'static str {
        match self {
            SessionPhase::Blocked => "Blocked",
            SessionPhase::Active => "Active",
            SessionPhase::Submitting => "Submitting",
            SessionPhase::Done => "Done",
        }
    }
}

/// 考试会话
///
/// 不变量：`0 <= cursor < catalog.len()`，由构造和导航共同保证
#[derive(Debug)]
pub struct QuizSession {
    student_id: String,
    catalog: Catalog,
    cursor: usize,
    answers: HashMap<String, String>,
    phase: SessionPhase,
}

impl QuizSession {
    /// 创建新会话
    ///
    /// 空清单会让游标不变量无法成立，在这里直接拒绝
    pub fn new(student_id: impl Into<String>, catalog: Catalog) -> AppResult<Self> {
        if catalog.is_empty() {
            return Err(AppError::catalog_invalid("题目列表为空"));
        }

        Ok(Self {
            student_id: student_id.into(),
            catalog,
            cursor: 0,
            answers: HashMap::new(),
            phase: SessionPhase::Blocked,
        })
    }

    // ========== 只读访问 ==========

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn answers(&self) -> &HashMap<String, String> {
        &self.answers
    }

    /// 当前题目
    pub fn current_question(&self) -> &Question {
        debug_assert!(self.cursor < self.catalog.len());
        self.catalog
            .get(self.cursor)
            .unwrap_or_else(|| panic!("游标不变量被破坏: {}/{}", self.cursor, self.catalog.len()))
    }

    /// 当前题目已选的键
    pub fn selected_for_current(&self) -> Option<&str> {
        self.answers
            .get(&self.current_question().id)
            .map(String::as_str)
    }

    pub fn is_last_question(&self) -> bool {
        self.cursor == self.catalog.last_index()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    // ========== 状态转移 ==========

    /// 喂入最新的合规标志
    ///
    /// 提交开始前 Blocked ⇄ Active 随时切换；
    /// Submitting / Done 阶段忽略合规变化
    pub fn set_compliance(&mut self, compliant: bool) {
        match (self.phase, compliant) {
            (SessionPhase::Blocked, true) => {
                debug!("环境恢复合规，继续作答");
                self.phase = SessionPhase::Active;
            }
            (SessionPhase::Active, false) => {
                debug!("环境失去合规，暂停作答");
                self.phase = SessionPhase::Blocked;
            }
            _ => {}
        }
    }

    fn ensure_active(&self) -> AppResult<()> {
        if self.phase != SessionPhase::Active {
            return Err(AppError::Session(SessionError::NotActive {
                phase: self.phase.name(),
            }));
        }
        Ok(())
    }

    // ========== 作答操作（仅 Active 阶段有效） ==========

    /// 为当前题目记录所选的键，重复选择直接覆盖
    ///
    /// 键不属于当前题目的选项集合时防御性拒绝（属于编程错误，
    /// 界面只会产生合法的键）
    pub fn select_option(&mut self, key: &str) -> AppResult<()> {
        self.ensure_active()?;

        let question = self.current_question();
        if !question.has_option(key) {
            return Err(AppError::Session(SessionError::UnknownOption {
                question_id: question.id.clone(),
                key: key.to_string(),
            }));
        }

        let question_id = question.id.clone();
        self.answers.insert(question_id, key.to_string());
        Ok(())
    }

    /// 下一题；已在最后一题则不动（不要求先作答，允许跳过）
    pub fn go_next(&mut self) -> AppResult<()> {
        self.ensure_active()?;
        if self.cursor < self.catalog.last_index() {
            self.cursor += 1;
        }
        Ok(())
    }

    /// 上一题；已在第一题则不动
    pub fn go_prev(&mut self) -> AppResult<()> {
        self.ensure_active()?;
        if self.cursor > 0 {
            self.cursor -= 1;
        }
        Ok(())
    }

    /// 当前是否允许发起提交（作答中且停在最后一题）
    pub fn can_request_submit(&self) -> bool {
        self.phase == SessionPhase::Active && self.is_last_question()
    }

    /// 考生确认后进入提交状态
    ///
    /// 已在 Submitting 时幂等忽略并返回 false，这是防止
    /// 快速连点产生重复网络提交的唯一闸门；
    /// 不在最后一题时防御性拒绝
    pub fn begin_submission(&mut self) -> AppResult<bool> {
        if self.phase == SessionPhase::Submitting {
            debug!("提交已在进行中，忽略重复触发");
            return Ok(false);
        }

        self.ensure_active()?;

        if !self.is_last_question() {
            return Err(AppError::Session(SessionError::NotAtLastQuestion {
                cursor: self.cursor,
                total: self.catalog.len(),
            }));
        }

        self.phase = SessionPhase::Submitting;
        Ok(true)
    }

    /// 提交失败：回到作答状态，答案映射和游标原样保留
    pub fn rollback_submission(&mut self) {
        if self.phase == SessionPhase::Submitting {
            debug!("提交失败，回滚到作答状态");
            self.phase = SessionPhase::Active;
        }
    }

    /// 提交成功：会话结束
    pub fn complete(&mut self) {
        if self.phase == SessionPhase::Submitting {
            self.phase = SessionPhase::Done;
        }
    }

    /// 派生提交载荷（清单 × 答案映射，按需计算，不缓存）
    pub fn build_submission(&self) -> SubmitRequest {
        SubmitRequest::build(&self.student_id, &self.catalog, &self.answers)
    }
}
