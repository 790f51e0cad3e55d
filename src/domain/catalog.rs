// ==========================================
// 定制蛋糕排期系统 - 选项目录领域模型
// ==========================================
// 用途: 尺寸/胚体/馅料/图库设计的静态目录数据
// 红线: 纯数据, 无行为; 价格只来自尺寸基价 + 高级馅加价
// ==========================================

use crate::domain::types::SelectionMode;
use serde::{Deserialize, Serialize};

/// 每种高级馅料的加价（乌拉圭比索, 整数）
pub const PREMIUM_SURCHARGE: i64 = 200;

/// Multi 模式下简单馅料的数量上限
pub const SIMPLE_FILLING_CAP: usize = 2;

// ==========================================
// SizeOption - 尺寸选项
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeOption {
    pub id: String,                  // 目录 id, 如 "15"
    pub label: String,               // 展示名, 如 "15 porciones"
    pub description: String,         // 直径/高度/重量说明
    pub base_price: i64,             // 基价（比索）
    pub selection_mode: SelectionMode, // 该尺寸的馅料选择模式
    pub badge: Option<String>,       // 营销角标（可选）
}

// ==========================================
// BaseFlavor - 蛋糕胚体
// ==========================================
// 胚体不影响价格
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseFlavor {
    pub id: String,
    pub label: String,
}

// ==========================================
// FillingOption - 馅料选项
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillingOption {
    pub id: String,
    pub label: String,
    pub is_premium: bool, // 高级馅才有加价
    pub surcharge: i64,   // 仅 is_premium 时有意义
}

// ==========================================
// SimpleDesign - 图库简单设计
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleDesign {
    pub id: String,
    pub name: String,
    pub image_url: String,
}

// ==========================================
// Catalog - 目录聚合
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub sizes: Vec<SizeOption>,
    pub bases: Vec<BaseFlavor>,
    pub fillings: Vec<FillingOption>,
    pub designs: Vec<SimpleDesign>,
}

impl Catalog {
    /// 生产目录（与店面展示的数据一致）
    pub fn standard() -> Self {
        let sizes = vec![
            SizeOption {
                id: "10".to_string(),
                label: "10 porciones".to_string(),
                description: "18cm diámetro · 10cm alto · ~2kg".to_string(),
                base_price: 1800,
                selection_mode: SelectionMode::Single,
                badge: Some("Ideal reuniones pequeñas".to_string()),
            },
            SizeOption {
                id: "15".to_string(),
                label: "15 porciones".to_string(),
                description: "23cm diámetro · 10cm alto · ~3kg".to_string(),
                base_price: 2500,
                selection_mode: SelectionMode::Single,
                badge: Some("Más elegida".to_string()),
            },
            SizeOption {
                id: "30".to_string(),
                label: "30 porciones".to_string(),
                description: "28cm diámetro · 15cm alto · ~6kg".to_string(),
                base_price: 3800,
                selection_mode: SelectionMode::Multi,
                badge: Some("Eventos grandes".to_string()),
            },
        ];

        let bases = [
            ("vainilla", "Vainilla"),
            ("chocolate", "Chocolate"),
            ("naranja", "Naranja"),
            ("limon", "Limón"),
            ("carrot", "Carrot Cake"),
            ("red-velvet", "Red Velvet"),
            ("canela", "Canela"),
        ]
        .into_iter()
        .map(|(id, label)| BaseFlavor {
            id: id.to_string(),
            label: label.to_string(),
        })
        .collect();

        let simple = [
            ("chantilly", "Crema chantilly"),
            ("caramelo", "Crema de caramelo"),
            ("pastelera", "Crema pastelera"),
            ("curd-limon", "Curd de limón"),
            ("ddl", "Dulce de leche"),
            ("mousse-choc", "Mousse de chocolate"),
            ("mousse-ddl", "Mousse de dulce de leche"),
        ];
        let premium = [
            ("oreo", "Chantilly con Oreo"),
            ("pepitos", "Chantilly con Pepitos"),
            ("caramelo-mani", "Caramelo & maní crunchy"),
            ("queso-crema", "Frosting de queso crema"),
            ("ganache-negro", "Ganache de chocolate negro"),
            ("ganache-blanco", "Ganache de chocolate blanco"),
            ("mani-dulce", "Mantequilla de maní dulce"),
        ];
        let fillings = simple
            .into_iter()
            .map(|(id, label)| FillingOption {
                id: id.to_string(),
                label: label.to_string(),
                is_premium: false,
                surcharge: 0,
            })
            .chain(premium.into_iter().map(|(id, label)| FillingOption {
                id: id.to_string(),
                label: label.to_string(),
                is_premium: true,
                surcharge: PREMIUM_SURCHARGE,
            }))
            .collect();

        let designs = [
            ("clasico-blanco", "Clásico blanco", "assets/designs/simple-1.png"),
            ("floral-delicate", "Floral delicado", "assets/designs/simple-2.png"),
            ("frutos-rojos", "Frutas y crema", "assets/designs/simple-3.png"),
            ("chocolate-elegante", "Chocolate elegante", "assets/designs/simple-4.png"),
            ("naked-vainilla", "Naked vainilla", "assets/designs/simple-5.png"),
            ("minimalista", "Minimalista", "assets/designs/simple-6.png"),
        ]
        .into_iter()
        .map(|(id, name, image_url)| SimpleDesign {
            id: id.to_string(),
            name: name.to_string(),
            image_url: image_url.to_string(),
        })
        .collect();

        Self {
            sizes,
            bases,
            fillings,
            designs,
        }
    }

    /// 按 id 查尺寸
    pub fn size(&self, id: &str) -> Option<&SizeOption> {
        self.sizes.iter().find(|s| s.id == id)
    }

    /// 按 id 查胚体
    pub fn base(&self, id: &str) -> Option<&BaseFlavor> {
        self.bases.iter().find(|b| b.id == id)
    }

    /// 按 id 查馅料
    pub fn filling(&self, id: &str) -> Option<&FillingOption> {
        self.fillings.iter().find(|f| f.id == id)
    }

    /// 按 id 查图库设计
    pub fn design(&self, id: &str) -> Option<&SimpleDesign> {
        self.designs.iter().find(|d| d.id == id)
    }

    /// 馅料是否为高级馅（未知 id 视为非高级）
    pub fn is_premium_filling(&self, id: &str) -> bool {
        self.filling(id).map(|f| f.is_premium).unwrap_or(false)
    }
}
