// ==========================================
// 产线产能模拟 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout, 减少并发读写时的偶发 busy 错误
// - 提供建表脚本（幂等）, 供 CLI 与测试共用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表（幂等）
///
/// 日期统一以 TEXT "YYYY-MM-DD" 存储
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_scope (
    scope_id TEXT PRIMARY KEY,
    scope_type TEXT NOT NULL,
    scope_key TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(scope_type, scope_key)
);

INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
VALUES ('global', 'GLOBAL', 'global');

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS site (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL UNIQUE,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS shift_configuration (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    shifts_per_day INTEGER NOT NULL CHECK (shifts_per_day BETWEEN 1 AND 4),
    hours_per_shift REAL NOT NULL CHECK (hours_per_shift >= 0),
    days_per_week INTEGER NOT NULL CHECK (days_per_week BETWEEN 1 AND 7),
    includes_saturday INTEGER NOT NULL DEFAULT 0,
    includes_sunday INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS production_line (
    id INTEGER PRIMARY KEY,
    site_id INTEGER NOT NULL REFERENCES site(id) ON DELETE CASCADE,
    code TEXT NOT NULL,
    name TEXT NOT NULL,
    default_shift_config_id INTEGER REFERENCES shift_configuration(id) ON DELETE SET NULL,
    base_capacity_per_hour REAL NOT NULL CHECK (base_capacity_per_hour >= 0),
    efficiency_factor REAL NOT NULL DEFAULT 0.85 CHECK (efficiency_factor BETWEEN 0 AND 1),
    is_active INTEGER NOT NULL DEFAULT 1,
    UNIQUE(site_id, code)
);

CREATE TABLE IF NOT EXISTS line_config_override (
    id INTEGER PRIMARY KEY,
    line_id INTEGER NOT NULL REFERENCES production_line(id) ON DELETE CASCADE,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    shifts_per_day INTEGER NOT NULL CHECK (shifts_per_day BETWEEN 0 AND 4),
    hours_per_shift REAL NOT NULL CHECK (hours_per_shift BETWEEN 0 AND 12),
    days_per_week INTEGER CHECK (days_per_week BETWEEN 0 AND 7),
    include_saturday INTEGER NOT NULL DEFAULT 0,
    include_sunday INTEGER NOT NULL DEFAULT 0,
    recurrence_weeks INTEGER CHECK (recurrence_weeks >= 1),
    reason TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    CHECK (start_date <= end_date)
);

CREATE INDEX IF NOT EXISTS idx_override_line_dates
    ON line_config_override(line_id, start_date, end_date);

CREATE TABLE IF NOT EXISTS product_category (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS product (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    category_id INTEGER REFERENCES product_category(id),
    default_line_id INTEGER REFERENCES production_line(id) ON DELETE SET NULL,
    product_type TEXT,
    recipe TEXT,
    material TEXT,
    packaging TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS client (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL UNIQUE,
    priority INTEGER NOT NULL DEFAULT 3,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS line_product_assignment (
    line_id INTEGER NOT NULL REFERENCES production_line(id) ON DELETE CASCADE,
    product_id INTEGER NOT NULL REFERENCES product(id) ON DELETE CASCADE,
    is_default INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (line_id, product_id)
);

CREATE TABLE IF NOT EXISTS demand_forecast (
    id INTEGER PRIMARY KEY,
    client_id INTEGER NOT NULL REFERENCES client(id) ON DELETE CASCADE,
    product_id INTEGER NOT NULL REFERENCES product(id) ON DELETE CASCADE,
    year INTEGER NOT NULL,
    week_number INTEGER NOT NULL CHECK (week_number BETWEEN 1 AND 53),
    week_start_date TEXT NOT NULL,
    forecast_quantity REAL NOT NULL CHECK (forecast_quantity >= 0),
    UNIQUE(client_id, product_id, year, week_number)
);

CREATE INDEX IF NOT EXISTS idx_forecast_week_start ON demand_forecast(week_start_date);
CREATE INDEX IF NOT EXISTS idx_forecast_product_week ON demand_forecast(product_id, year, week_number);

CREATE TABLE IF NOT EXISTS simulation_category (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    site_id INTEGER REFERENCES site(id) ON DELETE SET NULL,
    line_ids TEXT NOT NULL DEFAULT '',
    product_types TEXT NOT NULL DEFAULT '',
    recipes TEXT NOT NULL DEFAULT '',
    materials TEXT NOT NULL DEFAULT '',
    packagings TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS lab_line (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    base_capacity_per_hour REAL NOT NULL CHECK (base_capacity_per_hour >= 0),
    efficiency_factor REAL NOT NULL DEFAULT 0.85 CHECK (efficiency_factor BETWEEN 0 AND 1),
    shift_config_id INTEGER REFERENCES shift_configuration(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS lab_client (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lab_product (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    default_line_id INTEGER REFERENCES production_line(id) ON DELETE SET NULL,
    lab_default_line_id INTEGER REFERENCES lab_line(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS lab_forecast (
    id INTEGER PRIMARY KEY,
    lab_client_id INTEGER REFERENCES lab_client(id) ON DELETE CASCADE,
    client_id INTEGER REFERENCES client(id) ON DELETE CASCADE,
    lab_product_id INTEGER REFERENCES lab_product(id) ON DELETE CASCADE,
    product_id INTEGER REFERENCES product(id) ON DELETE CASCADE,
    reference_product_id INTEGER REFERENCES product(id) ON DELETE SET NULL,
    annual_quantity REAL NOT NULL CHECK (annual_quantity >= 0),
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    CHECK (start_date <= end_date)
);
"#;
