// ==========================================
// 定制蛋糕排期系统 - 配置选择领域模型
// ==========================================
// 红线: Selection 是不可变值对象, 状态迁移只经由
//       engine::configurator 的 reduce 函数
// 红线: 馅料形态按选择模式标签化, 单选/多选不可同时成立
// ==========================================

use crate::domain::types::DesignType;
use serde::{Deserialize, Serialize};

// ==========================================
// FillingChoice - 馅料选择（按模式标签化）
// ==========================================
// Multi 模式的两个 Vec 保持点选顺序, 简单馅超上限时按 FIFO 淘汰
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum FillingChoice {
    Single {
        filling_id: Option<String>,
    },
    Multi {
        simple_ids: Vec<String>,
        premium_ids: Vec<String>,
    },
}

impl FillingChoice {
    /// 空的单选形态
    pub fn empty_single() -> Self {
        FillingChoice::Single { filling_id: None }
    }

    /// 空的多选形态
    pub fn empty_multi() -> Self {
        FillingChoice::Multi {
            simple_ids: Vec::new(),
            premium_ids: Vec::new(),
        }
    }

    /// 当前选中的全部馅料 id（含单选/多选两种形态）
    pub fn selected_ids(&self) -> Vec<&str> {
        match self {
            FillingChoice::Single { filling_id } => {
                filling_id.iter().map(|s| s.as_str()).collect()
            }
            FillingChoice::Multi {
                simple_ids,
                premium_ids,
            } => simple_ids
                .iter()
                .chain(premium_ids.iter())
                .map(|s| s.as_str())
                .collect(),
        }
    }

    /// 指定馅料当前是否选中
    pub fn contains(&self, id: &str) -> bool {
        self.selected_ids().iter().any(|x| *x == id)
    }
}

// ==========================================
// DesignSpec - 设计选择（按类型标签化）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "design_type", rename_all = "lowercase")]
pub enum DesignSpec {
    /// 图库简单设计: 结算前必须选定一个图库引用
    Simple { design_id: Option<String> },
    /// 复杂设计: 备注可为空, 订单转 WhatsApp 人工协调
    #[serde(rename = "elaborado")]
    Elaborate { notes: String },
}

impl DesignSpec {
    pub fn design_type(&self) -> DesignType {
        match self {
            DesignSpec::Simple { .. } => DesignType::Simple,
            DesignSpec::Elaborate { .. } => DesignType::Elaborate,
        }
    }
}

// ==========================================
// Selection - 交互期的配置状态
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub size_id: Option<String>,
    pub base_id: Option<String>,
    pub fillings: FillingChoice,
    pub design: DesignSpec,
}

impl Selection {
    /// 初始空选择（单选形态, 简单设计未选定）
    pub fn new() -> Self {
        Self {
            size_id: None,
            base_id: None,
            fillings: FillingChoice::empty_single(),
            design: DesignSpec::Simple { design_id: None },
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// SelectionAction - 状态迁移动作
// ==========================================
// UI 层（范围外）把用户交互翻译成动作, 交给 reduce 处理
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SelectionAction {
    SetSize { size_id: String },
    SetBase { base_id: String },
    ToggleFilling { filling_id: String },
    ChooseSimpleDesign { design_id: String },
    SwitchToSimpleDesign,
    SwitchToElaborateDesign,
    SetElaborateNotes { notes: String },
}

// ==========================================
// SelectionIssue - 结构化校验错误
// ==========================================
// 校验失败不是异常, 而是阻止 to_line_item 的数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionIssue {
    /// 出错字段（size / base / design）
    pub field: String,
    /// 面向用户的西语提示
    pub message: String,
}

impl SelectionIssue {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filling_choice_wire_format() {
        // 单选/多选按 mode 标签区分, 两种形态不可能同时成立
        let single = FillingChoice::Single {
            filling_id: Some("ddl".to_string()),
        };
        let json = serde_json::to_value(&single).unwrap();
        assert_eq!(json["mode"], "single");
        assert_eq!(json["filling_id"], "ddl");

        let multi = FillingChoice::Multi {
            simple_ids: vec!["ddl".to_string()],
            premium_ids: vec!["oreo".to_string()],
        };
        let json = serde_json::to_value(&multi).unwrap();
        assert_eq!(json["mode"], "multi");

        let parsed: FillingChoice = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, multi);
    }

    #[test]
    fn test_design_spec_wire_format() {
        // 复杂设计的线上字面值沿用西语 "elaborado"
        let elaborate = DesignSpec::Elaborate {
            notes: "2 pisos".to_string(),
        };
        let json = serde_json::to_value(&elaborate).unwrap();
        assert_eq!(json["design_type"], "elaborado");

        let simple: DesignSpec =
            serde_json::from_str(r#"{"design_type":"simple","design_id":"minimalista"}"#).unwrap();
        assert_eq!(
            simple,
            DesignSpec::Simple {
                design_id: Some("minimalista".to_string())
            }
        );
    }
}
