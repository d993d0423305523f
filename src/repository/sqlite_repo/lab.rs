// ==========================================
// SqliteSimulationRepository - 实验室查询
// ==========================================

use super::line::{shift_config_from_row, SHIFT_COLUMNS};
use super::{date_value, id_values, placeholders, SqliteSimulationRepository};
use crate::domain::lab::{LabForecast, LabForecastFilter, LabLine};
use crate::repository::error::RepositoryResult;
use rusqlite::{params_from_iter, Result as SqliteResult};
use std::collections::BTreeSet;

/// 实验室预测候选行（附带产品的默认产线, 用于产线过滤）
struct LabForecastRow {
    forecast: LabForecast,
    lab_default_line_id: Option<i64>,
    lab_real_line_id: Option<i64>,
}

impl SqliteSimulationRepository {
    pub(super) fn query_lab_lines(&self, ids: &[i64]) -> RepositoryResult<Vec<LabLine>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT l.id, l.code, l.name, l.base_capacity_per_hour, l.efficiency_factor, {}
            FROM lab_line l
            LEFT JOIN shift_configuration c ON c.id = l.shift_config_id
            WHERE l.id IN ({})
            ORDER BY l.id
            "#,
            SHIFT_COLUMNS,
            placeholders(ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let lines = stmt
            .query_map(params_from_iter(id_values(ids.iter().copied())), |row| {
                Ok(LabLine {
                    id: row.get(0)?,
                    code: row.get(1)?,
                    name: row.get(2)?,
                    base_capacity_per_hour: row.get(3)?,
                    efficiency_factor: row.get(4)?,
                    shift_config: shift_config_from_row(row, 5)?,
                })
            })?
            .collect::<SqliteResult<Vec<LabLine>>>()?;
        Ok(lines)
    }

    /// 与窗口相交、且产品落在所选产线上的实验室预测
    pub(super) fn query_lab_forecasts(
        &self,
        filter: &LabForecastFilter,
    ) -> RepositoryResult<Vec<LabForecast>> {
        let rows = {
            let conn = self.get_conn()?;
            let mut stmt = conn.prepare(
                r#"
                SELECT
                    f.id, f.lab_client_id, f.client_id, f.lab_product_id, f.product_id,
                    f.reference_product_id, f.annual_quantity, f.start_date, f.end_date,
                    lp.lab_default_line_id, lp.default_line_id
                FROM lab_forecast f
                LEFT JOIN lab_product lp ON lp.id = f.lab_product_id
                WHERE f.start_date <= ?1 AND f.end_date >= ?2
                ORDER BY f.id
                "#,
            )?;
            let rows = stmt
                .query_map(
                    params_from_iter([date_value(filter.end_date), date_value(filter.start_date)]),
                    |row| {
                        Ok(LabForecastRow {
                            forecast: LabForecast {
                                id: row.get(0)?,
                                lab_client_id: row.get(1)?,
                                client_id: row.get(2)?,
                                lab_product_id: row.get(3)?,
                                product_id: row.get(4)?,
                                reference_product_id: row.get(5)?,
                                annual_quantity: row.get(6)?,
                                start_date: row.get(7)?,
                                end_date: row.get(8)?,
                            },
                            lab_default_line_id: row.get(9)?,
                            lab_real_line_id: row.get(10)?,
                        })
                    },
                )?
                .collect::<SqliteResult<Vec<LabForecastRow>>>()?;
            rows
        };

        // 真实产品: 默认产线在所选真实产线上
        let real_products: BTreeSet<i64> = self
            .query_default_products(&filter.line_ids)?
            .into_iter()
            .map(|p| p.id)
            .collect();

        Ok(rows
            .into_iter()
            .filter(|r| {
                if r.forecast.lab_product_id.is_some() {
                    let on_lab = r
                        .lab_default_line_id
                        .map_or(false, |id| filter.lab_line_ids.contains(&id));
                    let on_real = r
                        .lab_real_line_id
                        .map_or(false, |id| filter.line_ids.contains(&id));
                    on_lab || on_real
                } else {
                    r.forecast
                        .product_id
                        .map_or(false, |id| real_products.contains(&id))
                }
            })
            .map(|r| r.forecast)
            .collect())
    }
}
