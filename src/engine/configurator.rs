// ==========================================
// 定制蛋糕排期系统 - 配置引擎
// ==========================================
// 职责: 选择状态迁移(reduce)、合法性校验、定价、行项生成
// 红线: 引擎纯函数化, 不持有可变状态; Selection 只进不改
// 红线: 价格 = 尺寸基价 + Σ已选高级馅加价, 简单馅与胚体不改价
// ==========================================

use crate::domain::catalog::{Catalog, SIMPLE_FILLING_CAP};
use crate::domain::order::LineItem;
use crate::domain::selection::{
    DesignSpec, FillingChoice, Selection, SelectionAction, SelectionIssue,
};
use crate::domain::types::SelectionMode;
use tracing::debug;

// ==========================================
// ConfiguratorEngine - 配置引擎
// ==========================================
pub struct ConfiguratorEngine {
    catalog: Catalog,
}

impl ConfiguratorEngine {
    /// 构造函数
    ///
    /// # 参数
    /// - catalog: 选项目录（静态数据）
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// 使用生产目录构造
    pub fn standard() -> Self {
        Self::new(Catalog::standard())
    }

    /// 目录只读访问
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // ==========================================
    // 状态迁移
    // ==========================================

    /// 纯迁移函数: (selection, action) -> selection
    ///
    /// 未知 id 的动作一律 no-op, 不产生半成品状态。
    pub fn reduce(&self, selection: &Selection, action: &SelectionAction) -> Selection {
        match action {
            SelectionAction::SetSize { size_id } => self.set_size(selection, size_id),
            SelectionAction::SetBase { base_id } => {
                if self.catalog.base(base_id).is_none() {
                    return selection.clone();
                }
                let mut next = selection.clone();
                next.base_id = Some(base_id.clone());
                next
            }
            SelectionAction::ToggleFilling { filling_id } => {
                self.toggle_filling(selection, filling_id)
            }
            SelectionAction::ChooseSimpleDesign { design_id } => {
                if self.catalog.design(design_id).is_none() {
                    return selection.clone();
                }
                let mut next = selection.clone();
                next.design = DesignSpec::Simple {
                    design_id: Some(design_id.clone()),
                };
                next
            }
            SelectionAction::SwitchToSimpleDesign => {
                let mut next = selection.clone();
                if !matches!(next.design, DesignSpec::Simple { .. }) {
                    next.design = DesignSpec::Simple { design_id: None };
                }
                next
            }
            SelectionAction::SwitchToElaborateDesign => {
                let mut next = selection.clone();
                if !matches!(next.design, DesignSpec::Elaborate { .. }) {
                    next.design = DesignSpec::Elaborate {
                        notes: String::new(),
                    };
                }
                next
            }
            SelectionAction::SetElaborateNotes { notes } => {
                let mut next = selection.clone();
                if matches!(next.design, DesignSpec::Elaborate { .. }) {
                    next.design = DesignSpec::Elaborate {
                        notes: notes.clone(),
                    };
                }
                next
            }
        }
    }

    /// 切换尺寸并按新模式对账馅料形态
    ///
    /// - Single→Multi: 已选的单一馅料放入对应(简单/高级)集合
    /// - Multi→Single: 取第一个简单馅, 否则第一个高级馅, 否则空; 其余丢弃
    /// - 同模式切换(如 10↔15): 馅料原样保留
    fn set_size(&self, selection: &Selection, size_id: &str) -> Selection {
        let Some(new_size) = self.catalog.size(size_id) else {
            return selection.clone();
        };
        if selection.size_id.as_deref() == Some(size_id) {
            return selection.clone();
        }

        let mut next = selection.clone();
        next.size_id = Some(size_id.to_string());

        next.fillings = match (&selection.fillings, new_size.selection_mode) {
            // 同模式: 保留原形态
            (FillingChoice::Single { .. }, SelectionMode::Single)
            | (FillingChoice::Multi { .. }, SelectionMode::Multi) => selection.fillings.clone(),

            // Single → Multi
            (FillingChoice::Single { filling_id }, SelectionMode::Multi) => {
                let mut simple_ids = Vec::new();
                let mut premium_ids = Vec::new();
                if let Some(id) = filling_id {
                    if self.catalog.is_premium_filling(id) {
                        premium_ids.push(id.clone());
                    } else {
                        simple_ids.push(id.clone());
                    }
                }
                FillingChoice::Multi {
                    simple_ids,
                    premium_ids,
                }
            }

            // Multi → Single
            (
                FillingChoice::Multi {
                    simple_ids,
                    premium_ids,
                },
                SelectionMode::Single,
            ) => FillingChoice::Single {
                filling_id: simple_ids.first().or(premium_ids.first()).cloned(),
            },
        };

        debug!(size_id, mode = %new_size.selection_mode, "尺寸切换, 馅料形态已对账");
        next
    }

    /// 点选/取消一种馅料
    ///
    /// - Single 模式: 互斥单选; 重复点选同一馅料即清空
    /// - Multi 模式简单馅: 上限 2, 超限时淘汰最早点选的一个(FIFO)
    /// - Multi 模式高级馅: 自由开关, 无上限
    fn toggle_filling(&self, selection: &Selection, filling_id: &str) -> Selection {
        let Some(filling) = self.catalog.filling(filling_id) else {
            return selection.clone();
        };

        let mut next = selection.clone();
        next.fillings = match &selection.fillings {
            FillingChoice::Single { filling_id: current } => FillingChoice::Single {
                filling_id: if current.as_deref() == Some(filling_id) {
                    None
                } else {
                    Some(filling_id.to_string())
                },
            },
            FillingChoice::Multi {
                simple_ids,
                premium_ids,
            } => {
                let mut simple_ids = simple_ids.clone();
                let mut premium_ids = premium_ids.clone();
                if filling.is_premium {
                    if let Some(pos) = premium_ids.iter().position(|x| x == filling_id) {
                        premium_ids.remove(pos);
                    } else {
                        premium_ids.push(filling_id.to_string());
                    }
                } else if let Some(pos) = simple_ids.iter().position(|x| x == filling_id) {
                    simple_ids.remove(pos);
                } else {
                    if simple_ids.len() >= SIMPLE_FILLING_CAP {
                        simple_ids.remove(0); // FIFO 淘汰
                    }
                    simple_ids.push(filling_id.to_string());
                }
                FillingChoice::Multi {
                    simple_ids,
                    premium_ids,
                }
            }
        };
        next
    }

    // ==========================================
    // 定价与校验
    // ==========================================

    /// 计算当前选择的价格
    ///
    /// 公式: basePrice(size) + Σ surcharge(f), f ∈ 已选高级馅。
    /// 尺寸未选时基价按 0 计（validate 会拦截该状态）。
    pub fn compute_price(&self, selection: &Selection) -> i64 {
        let base = selection
            .size_id
            .as_deref()
            .and_then(|id| self.catalog.size(id))
            .map(|s| s.base_price)
            .unwrap_or(0);

        let surcharges: i64 = selection
            .fillings
            .selected_ids()
            .iter()
            .filter_map(|id| self.catalog.filling(id))
            .filter(|f| f.is_premium)
            .map(|f| f.surcharge)
            .sum();

        base + surcharges
    }

    /// 校验选择合法性
    ///
    /// # 返回
    /// 结构化错误列表; 空列表即合法。
    /// 注意: Elaborate 设计允许备注为空, 只有 Simple 设计要求选定图库引用。
    pub fn validate(&self, selection: &Selection) -> Vec<SelectionIssue> {
        let mut issues = Vec::new();

        match selection.size_id.as_deref() {
            None => issues.push(SelectionIssue::new("size", "Elegí un tamaño para tu torta")),
            Some(id) if self.catalog.size(id).is_none() => {
                issues.push(SelectionIssue::new("size", "Tamaño inválido"))
            }
            Some(_) => {}
        }

        match selection.base_id.as_deref() {
            None => issues.push(SelectionIssue::new("base", "Elegí el bizcochuelo base")),
            Some(id) if self.catalog.base(id).is_none() => {
                issues.push(SelectionIssue::new("base", "Bizcochuelo inválido"))
            }
            Some(_) => {}
        }

        match &selection.design {
            DesignSpec::Simple { design_id: None } => {
                issues.push(SelectionIssue::new("design", "Elegí un diseño de la galería"))
            }
            DesignSpec::Simple {
                design_id: Some(id),
            } if self.catalog.design(id).is_none() => {
                issues.push(SelectionIssue::new("design", "Diseño inválido"))
            }
            _ => {}
        }

        issues
    }

    /// 把合法选择固化为不可变行项
    ///
    /// # 返回
    /// - Ok(LineItem): 定价行项, 含生成的配置摘要
    /// - Err(Vec<SelectionIssue>): 校验未通过, 阻止行项生成
    pub fn to_line_item(&self, selection: &Selection) -> Result<LineItem, Vec<SelectionIssue>> {
        let issues = self.validate(selection);
        if !issues.is_empty() {
            return Err(issues);
        }

        // validate 通过后目录查找必定命中
        let size = selection
            .size_id
            .as_deref()
            .and_then(|id| self.catalog.size(id))
            .ok_or_else(|| vec![SelectionIssue::new("size", "Tamaño inválido")])?;

        let design_name = match &selection.design {
            DesignSpec::Simple {
                design_id: Some(id),
            } => self
                .catalog
                .design(id)
                .map(|d| d.name.clone())
                .unwrap_or_else(|| "Diseño simple".to_string()),
            _ => "Diseño elaborado".to_string(),
        };

        Ok(LineItem {
            name: format!("Torta personalizada — {} · {}", size.label, design_name),
            unit_price: self.compute_price(selection),
            quantity: 1,
            description: self.describe(selection),
        })
    }

    // ==========================================
    // 摘要生成
    // ==========================================

    /// 生成配置摘要（收据/WhatsApp/内部备注共用, 永远与定价选择一致）
    pub fn describe(&self, selection: &Selection) -> String {
        let size_label = selection
            .size_id
            .as_deref()
            .and_then(|id| self.catalog.size(id))
            .map(|s| s.label.clone())
            .unwrap_or_else(|| "a definir".to_string());
        let base_label = selection
            .base_id
            .as_deref()
            .and_then(|id| self.catalog.base(id))
            .map(|b| b.label.clone())
            .unwrap_or_else(|| "a definir".to_string());

        let filling_part = match &selection.fillings {
            FillingChoice::Single { filling_id } => {
                let label = filling_id
                    .as_deref()
                    .and_then(|id| self.catalog.filling(id))
                    .map(|f| f.label.clone())
                    .unwrap_or_else(|| "a definir".to_string());
                format!("Relleno(s): {}", label)
            }
            FillingChoice::Multi {
                simple_ids,
                premium_ids,
            } => {
                let simple = self.filling_labels(simple_ids);
                let premium = self.filling_labels(premium_ids);
                format!(
                    "Rellenos simples: {} | Rellenos premium: {}",
                    if simple.is_empty() {
                        "a definir".to_string()
                    } else {
                        simple.join(", ")
                    },
                    if premium.is_empty() {
                        "ninguno".to_string()
                    } else {
                        premium.join(", ")
                    },
                )
            }
        };

        let design_part = match &selection.design {
            DesignSpec::Simple { design_id } => {
                let name = design_id
                    .as_deref()
                    .and_then(|id| self.catalog.design(id))
                    .map(|d| d.name.clone())
                    .unwrap_or_else(|| "simple".to_string());
                format!("Diseño: {}", name)
            }
            DesignSpec::Elaborate { notes } => {
                if notes.trim().is_empty() {
                    "Diseño: elaborado".to_string()
                } else {
                    format!("Diseño: elaborado | Detalles: {}", notes.trim())
                }
            }
        };

        format!(
            "Tamaño: {} | Bizcochuelo: {} | {} | {}",
            size_label, base_label, filling_part, design_part
        )
    }

    /// 生成 WhatsApp 交接文案（Elaborate 设计走人工协调渠道）
    ///
    /// 复杂设计订单不经过线上结算, 也不自动占用产能台账名额。
    /// 设计备注由 describe 统一携带, 这里不再单独拼接。
    pub fn whatsapp_message(&self, selection: &Selection) -> String {
        let lines = vec![
            "Hola! Quiero crear una torta personalizada 🎂".to_string(),
            String::new(),
            self.describe(selection).replace(" | ", "\n"),
            String::new(),
            format!("Precio estimado: ${}", self.compute_price(selection)),
            String::new(),
            "¿Podemos coordinar fechas disponibles y forma de entrega?".to_string(),
        ];
        lines.join("\n")
    }

    /// 生成 wa.me 链接（phone 来自配置）
    pub fn whatsapp_url(&self, selection: &Selection, phone: &str) -> String {
        format!(
            "https://wa.me/{}?text={}",
            phone,
            percent_encode(&self.whatsapp_message(selection))
        )
    }

    fn filling_labels(&self, ids: &[String]) -> Vec<String> {
        ids.iter()
            .filter_map(|id| self.catalog.filling(id))
            .map(|f| f.label.clone())
            .collect()
    }
}

/// URL 查询参数的百分号编码（UTF-8 字节级, 保留 RFC 3986 unreserved 字符）
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
