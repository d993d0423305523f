// ==========================================
// SqliteSimulationRepository - 产线/班次/覆写查询
// ==========================================

use super::{date_value, id_values, placeholders, SqliteSimulationRepository};
use crate::domain::line::{LineConfigOverride, ProductionLine, ShiftConfiguration};
use crate::domain::types::DateRange;
use crate::repository::error::RepositoryResult;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Result as SqliteResult, Row};
use std::collections::BTreeMap;

/// 从行中读取可空的班次配置（offset 起 7 列）
pub(crate) fn shift_config_from_row(row: &Row, offset: usize) -> SqliteResult<Option<ShiftConfiguration>> {
    let id: Option<i64> = row.get(offset)?;
    match id {
        Some(id) => Ok(Some(ShiftConfiguration {
            id,
            name: row.get(offset + 1)?,
            shifts_per_day: row.get(offset + 2)?,
            hours_per_shift: row.get(offset + 3)?,
            days_per_week: row.get(offset + 4)?,
            includes_saturday: row.get(offset + 5)?,
            includes_sunday: row.get(offset + 6)?,
        })),
        None => Ok(None),
    }
}

pub(crate) const SHIFT_COLUMNS: &str = "c.id, c.name, c.shifts_per_day, c.hours_per_shift, \
     c.days_per_week, c.includes_saturday, c.includes_sunday";

impl SqliteSimulationRepository {
    /// 查询产线快照 + 与窗口相交的启用覆写
    pub(super) fn query_lines(
        &self,
        line_ids: &[i64],
        active_only: bool,
        window: DateRange,
    ) -> RepositoryResult<Vec<ProductionLine>> {
        if line_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.get_conn()?;

        let sql = format!(
            r#"
            SELECT
                l.id, l.site_id, l.code, l.name, s.name,
                l.base_capacity_per_hour, l.efficiency_factor, l.is_active,
                {}
            FROM production_line l
            LEFT JOIN site s ON s.id = l.site_id
            LEFT JOIN shift_configuration c ON c.id = l.default_shift_config_id
            WHERE l.id IN ({}) {}
            ORDER BY l.id
            "#,
            SHIFT_COLUMNS,
            placeholders(line_ids.len()),
            if active_only { "AND l.is_active = 1" } else { "" }
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut lines = stmt
            .query_map(params_from_iter(id_values(line_ids.iter().copied())), |row| {
                Ok(ProductionLine {
                    id: row.get(0)?,
                    site_id: row.get(1)?,
                    code: row.get(2)?,
                    name: row.get(3)?,
                    site_name: row.get(4)?,
                    base_capacity_per_hour: row.get(5)?,
                    efficiency_factor: row.get(6)?,
                    is_active: row.get(7)?,
                    default_shift_config: shift_config_from_row(row, 8)?,
                    overrides: Vec::new(),
                })
            })?
            .collect::<SqliteResult<Vec<ProductionLine>>>()?;

        if lines.is_empty() {
            return Ok(lines);
        }

        // 覆写: 显式排序 (start_date, id)
        let found_ids: Vec<i64> = lines.iter().map(|l| l.id).collect();
        let sql = format!(
            r#"
            SELECT
                id, line_id, start_date, end_date, shifts_per_day, hours_per_shift,
                days_per_week, include_saturday, include_sunday, recurrence_weeks,
                reason, is_active
            FROM line_config_override
            WHERE line_id IN ({})
              AND is_active = 1
              AND start_date <= ?
              AND end_date >= ?
            ORDER BY line_id, start_date, id
            "#,
            placeholders(found_ids.len())
        );
        let mut values: Vec<Value> = id_values(found_ids);
        values.push(date_value(window.end));
        values.push(date_value(window.start));

        let mut stmt = conn.prepare(&sql)?;
        let overrides = stmt
            .query_map(params_from_iter(values), |row| {
                Ok(LineConfigOverride {
                    id: row.get(0)?,
                    line_id: row.get(1)?,
                    start_date: row.get(2)?,
                    end_date: row.get(3)?,
                    shifts_per_day: row.get(4)?,
                    hours_per_shift: row.get(5)?,
                    days_per_week: row.get(6)?,
                    include_saturday: row.get(7)?,
                    include_sunday: row.get(8)?,
                    recurrence_weeks: row.get(9)?,
                    reason: row.get(10)?,
                    is_active: row.get(11)?,
                })
            })?
            .collect::<SqliteResult<Vec<LineConfigOverride>>>()?;

        let mut by_line: BTreeMap<i64, Vec<LineConfigOverride>> = BTreeMap::new();
        for o in overrides {
            by_line.entry(o.line_id).or_default().push(o);
        }
        for line in lines.iter_mut() {
            line.overrides = by_line.remove(&line.id).unwrap_or_default();
        }

        Ok(lines)
    }

    pub(super) fn query_site_line_ids(&self, site_id: i64) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id FROM production_line WHERE site_id = ?1 AND is_active = 1 ORDER BY id",
        )?;
        let ids = stmt
            .query_map(params![site_id], |row| row.get::<_, i64>(0))?
            .collect::<SqliteResult<Vec<i64>>>()?;
        Ok(ids)
    }

    pub(super) fn query_shift_configuration(
        &self,
        id: i64,
    ) -> RepositoryResult<Option<ShiftConfiguration>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM shift_configuration c WHERE c.id = ?1",
            SHIFT_COLUMNS
        );
        let config = conn
            .query_row(&sql, params![id], |row| shift_config_from_row(row, 0))
            .optional()?
            .flatten();
        Ok(config)
    }
}
