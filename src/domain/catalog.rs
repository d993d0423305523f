// ==========================================
// 产线产能模拟 - 产品/客户/分类领域模型
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// Client - 客户
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub priority: i32, // 1 = 不可削减 ... 5 = 可优先削减
    pub is_active: bool,
}

// ==========================================
// ProductCategory - 产品大类
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: i64,
    pub name: String,
}

// ==========================================
// Product - 产品
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub category_id: Option<i64>,
    pub default_line_id: Option<i64>,

    // ===== 筛选属性 =====
    pub product_type: Option<String>,
    pub recipe: Option<String>,
    pub material: Option<String>,
    pub packaging: Option<String>,

    pub is_active: bool,
}

impl Product {
    /// 展示标签: "CODE - Name"
    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}

// ==========================================
// LineProductAssignment - 产线/产品关系
// ==========================================
// 按产线集合聚合需求时只使用 is_default = true 的关系
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineProductAssignment {
    pub line_id: i64,
    pub product_id: i64,
    pub is_default: bool,
}

// ==========================================
// ProductFilter - 产品属性筛选
// ==========================================
// 空列表 = 该维度不限
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductFilter {
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub product_types: Vec<String>,
    #[serde(default)]
    pub recipes: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub packagings: Vec<String>,
}

impl ProductFilter {
    pub fn by_category(category_id: i64) -> Self {
        Self {
            category_id: Some(category_id),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.product_types.is_empty()
            && self.recipes.is_empty()
            && self.materials.is_empty()
            && self.packagings.is_empty()
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category_id) = self.category_id {
            if product.category_id != Some(category_id) {
                return false;
            }
        }
        attr_matches(&self.product_types, product.product_type.as_deref())
            && attr_matches(&self.recipes, product.recipe.as_deref())
            && attr_matches(&self.materials, product.material.as_deref())
            && attr_matches(&self.packagings, product.packaging.as_deref())
    }
}

fn attr_matches(allowed: &[String], value: Option<&str>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    match value {
        Some(v) => allowed.iter().any(|a| a.eq_ignore_ascii_case(v.trim())),
        None => false,
    }
}

/// 解析逗号拼接的属性列表（去空白、去空项）
pub fn split_csv_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

// ==========================================
// SimulationCategory - 模拟分类（筛选预设）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationCategory {
    pub id: i64,
    pub name: String,
    pub site_id: Option<i64>,
    pub line_ids: Vec<i64>,

    // ===== 逗号拼接的产品属性值 =====
    pub product_types: String,
    pub recipes: String,
    pub materials: String,
    pub packagings: String,
}

impl SimulationCategory {
    /// 转换为产品属性筛选
    pub fn product_filter(&self) -> ProductFilter {
        ProductFilter {
            category_id: None,
            product_types: split_csv_list(&self.product_types),
            recipes: split_csv_list(&self.recipes),
            materials: split_csv_list(&self.materials),
            packagings: split_csv_list(&self.packagings),
        }
    }
}

/// 仓储返回的分类范围: 产线集合 + 匹配产品集合
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScope {
    pub category: SimulationCategory,
    pub line_ids: Vec<i64>,
    pub matching_product_ids: BTreeSet<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(product_type: &str, packaging: Option<&str>) -> Product {
        Product {
            id: 1,
            code: "P1".to_string(),
            name: "Pizza".to_string(),
            category_id: Some(7),
            default_line_id: Some(1),
            product_type: Some(product_type.to_string()),
            recipe: None,
            material: None,
            packaging: packaging.map(|p| p.to_string()),
            is_active: true,
        }
    }

    #[test]
    fn test_split_csv_list() {
        assert_eq!(split_csv_list(" A, B ,,C"), vec!["A", "B", "C"]);
        assert!(split_csv_list("").is_empty());
    }

    #[test]
    fn test_filter_matches() {
        let filter = ProductFilter {
            product_types: vec!["FRESH".to_string(), "frozen".to_string()],
            ..Default::default()
        };
        assert!(filter.matches(&product("Frozen", None)));
        assert!(!filter.matches(&product("AMBIENT", None)));

        let packaging = ProductFilter {
            packagings: vec!["BOX".to_string()],
            ..Default::default()
        };
        assert!(!packaging.matches(&product("FRESH", None)));
        assert!(packaging.matches(&product("FRESH", Some("box"))));
    }

    #[test]
    fn test_filter_category() {
        assert!(ProductFilter::by_category(7).matches(&product("X", None)));
        assert!(!ProductFilter::by_category(8).matches(&product("X", None)));
    }
}
