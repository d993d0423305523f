// ==========================================
// SqliteSimulationRepository - 产品/客户/分类查询
// ==========================================

use super::{id_values, parse_id_list, placeholders, SqliteSimulationRepository};
use crate::domain::catalog::{CategoryScope, Client, Product, ProductCategory, SimulationCategory};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, params_from_iter, OptionalExtension, Result as SqliteResult, Row};
use std::collections::BTreeSet;

const PRODUCT_COLUMNS: &str = "p.id, p.code, p.name, p.category_id, p.default_line_id, \
     p.product_type, p.recipe, p.material, p.packaging, p.is_active";

fn map_product(row: &Row) -> SqliteResult<Product> {
    Ok(Product {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        category_id: row.get(3)?,
        default_line_id: row.get(4)?,
        product_type: row.get(5)?,
        recipe: row.get(6)?,
        material: row.get(7)?,
        packaging: row.get(8)?,
        is_active: row.get(9)?,
    })
}

fn map_client(row: &Row) -> SqliteResult<Client> {
    Ok(Client {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
        priority: row.get(3)?,
        is_active: row.get(4)?,
    })
}

impl SqliteSimulationRepository {
    /// 默认产线落在 line_ids 中的产品
    ///
    /// 默认产线 = product.default_line_id ∪ is_default 的分配关系
    pub(super) fn query_default_products(&self, line_ids: &[i64]) -> RepositoryResult<Vec<Product>> {
        if line_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;
        let ph = placeholders(line_ids.len());
        let sql = format!(
            r#"
            SELECT {cols}
            FROM product p
            WHERE p.default_line_id IN ({ph})
               OR p.id IN (
                   SELECT a.product_id FROM line_product_assignment a
                   WHERE a.is_default = 1 AND a.line_id IN ({ph})
               )
            ORDER BY p.id
            "#,
            cols = PRODUCT_COLUMNS,
            ph = ph
        );
        let values = id_values(line_ids.iter().chain(line_ids.iter()).copied());

        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map(params_from_iter(values), map_product)?
            .collect::<SqliteResult<Vec<Product>>>()?;
        Ok(products)
    }

    pub(super) fn query_client_by_code(&self, code: &str) -> RepositoryResult<Option<Client>> {
        let conn = self.get_conn()?;
        let client = conn
            .query_row(
                "SELECT id, code, name, priority, is_active FROM client WHERE LOWER(code) = LOWER(?1)",
                params![code.trim()],
                map_client,
            )
            .optional()?;
        Ok(client)
    }

    pub(super) fn query_client(&self, id: i64) -> RepositoryResult<Option<Client>> {
        let conn = self.get_conn()?;
        let client = conn
            .query_row(
                "SELECT id, code, name, priority, is_active FROM client WHERE id = ?1",
                params![id],
                map_client,
            )
            .optional()?;
        Ok(client)
    }

    pub(super) fn query_product_by_code(&self, code: &str) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM product p WHERE LOWER(p.code) = LOWER(?1)",
            PRODUCT_COLUMNS
        );
        let product = conn
            .query_row(&sql, params![code.trim()], map_product)
            .optional()?;
        Ok(product)
    }

    pub(super) fn query_product(&self, id: i64) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM product p WHERE p.id = ?1", PRODUCT_COLUMNS);
        let product = conn.query_row(&sql, params![id], map_product).optional()?;
        Ok(product)
    }

    pub(super) fn query_product_category(
        &self,
        id: i64,
    ) -> RepositoryResult<Option<ProductCategory>> {
        let conn = self.get_conn()?;
        let category = conn
            .query_row(
                "SELECT id, name FROM product_category WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ProductCategory {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    /// 模拟分类范围
    ///
    /// - 产线: 显式 line_ids; 为空且指定工厂时取工厂全部启用产线
    /// - 产品: 属性匹配; 指定工厂时还要求默认产线位于该工厂
    pub(super) fn query_simulation_category(
        &self,
        id: i64,
    ) -> RepositoryResult<Option<CategoryScope>> {
        let category = {
            let conn = self.get_conn()?;
            conn.query_row(
                r#"
                SELECT id, name, site_id, line_ids, product_types, recipes, materials, packagings
                FROM simulation_category WHERE id = ?1
                "#,
                params![id],
                |row| {
                    let raw_lines: String = row.get(3)?;
                    Ok(SimulationCategory {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        site_id: row.get(2)?,
                        line_ids: parse_id_list(&raw_lines),
                        product_types: row.get(4)?,
                        recipes: row.get(5)?,
                        materials: row.get(6)?,
                        packagings: row.get(7)?,
                    })
                },
            )
            .optional()?
        };

        let category = match category {
            Some(c) => c,
            None => return Ok(None),
        };

        let site_lines = match category.site_id {
            Some(site_id) => Some(self.query_site_line_ids(site_id)?),
            None => None,
        };

        let line_ids = match (&site_lines, category.line_ids.is_empty()) {
            (Some(lines), true) => lines.clone(),
            _ => category.line_ids.clone(),
        };

        let candidates = match &site_lines {
            Some(lines) => self.query_default_products(lines)?,
            None => self.query_all_products()?,
        };

        let filter = category.product_filter();
        let matching_product_ids: BTreeSet<i64> = candidates
            .into_iter()
            .filter(|p| filter.matches(p))
            .map(|p| p.id)
            .collect();

        Ok(Some(CategoryScope {
            category,
            line_ids,
            matching_product_ids,
        }))
    }

    fn query_all_products(&self) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM product p ORDER BY p.id", PRODUCT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map([], map_product)?
            .collect::<SqliteResult<Vec<Product>>>()?;
        Ok(products)
    }
}
