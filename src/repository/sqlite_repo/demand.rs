// ==========================================
// SqliteSimulationRepository - 需求预测查询
// ==========================================

use super::{date_value, id_values, placeholders, SqliteSimulationRepository};
use crate::domain::forecast::{ForecastFilter, WeeklyHistory};
use crate::domain::types::DateRange;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Result as SqliteResult};
use std::collections::{BTreeMap, BTreeSet};

impl SqliteSimulationRepository {
    /// 按 week_start_date 汇总预测量
    pub(super) fn query_forecast_totals(
        &self,
        product_ids: &BTreeSet<i64>,
        week_range: DateRange,
        filter: ForecastFilter,
    ) -> RepositoryResult<BTreeMap<NaiveDate, f64>> {
        if product_ids.is_empty() {
            return Ok(BTreeMap::new());
        }

        let mut sql = format!(
            r#"
            SELECT f.week_start_date, SUM(f.forecast_quantity)
            FROM demand_forecast f
            JOIN product p ON p.id = f.product_id
            WHERE f.product_id IN ({})
              AND f.week_start_date BETWEEN ? AND ?
            "#,
            placeholders(product_ids.len())
        );
        let mut values: Vec<Value> = id_values(product_ids.iter().copied());
        values.push(date_value(week_range.start));
        values.push(date_value(week_range.end));

        if let Some(client_id) = filter.client_id {
            sql.push_str(" AND f.client_id = ?");
            values.push(Value::Integer(client_id));
        }
        if let Some(category_id) = filter.category_id {
            sql.push_str(" AND p.category_id = ?");
            values.push(Value::Integer(category_id));
        }
        if let Some(product_id) = filter.product_id {
            sql.push_str(" AND f.product_id = ?");
            values.push(Value::Integer(product_id));
        }
        sql.push_str(" GROUP BY f.week_start_date ORDER BY f.week_start_date");

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| {
                Ok((row.get::<_, NaiveDate>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<SqliteResult<Vec<(NaiveDate, f64)>>>()?;

        Ok(rows.into_iter().collect())
    }

    /// 产品历史周需求（全部客户合计）
    pub(super) fn query_weekly_history(
        &self,
        product_id: i64,
    ) -> RepositoryResult<Vec<WeeklyHistory>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT year, week_number, SUM(forecast_quantity)
            FROM demand_forecast
            WHERE product_id = ?1
            GROUP BY year, week_number
            ORDER BY year, week_number
            "#,
        )?;
        let history = stmt
            .query_map(params![product_id], |row| {
                Ok(WeeklyHistory {
                    year: row.get(0)?,
                    week_number: row.get(1)?,
                    quantity: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<WeeklyHistory>>>()?;
        Ok(history)
    }
}
