// ==========================================
// 门窗车间工时定额计算系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发读写时的偶发 busy 错误
// - 提供建表脚本（dem 源表镜像 + 定额业务表 + 配置表）
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
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
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

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表（幂等）并写入当前 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 打开连接后检查 schema_version，不一致时仅告警
pub fn check_schema_version(conn: &Connection) -> rusqlite::Result<()> {
    match read_schema_version(conn)? {
        Some(v) if v == CURRENT_SCHEMA_VERSION => {}
        Some(v) => tracing::warn!(
            found = v,
            expected = CURRENT_SCHEMA_VERSION,
            "数据库 schema_version 与程序不一致"
        ),
        None => tracing::warn!("数据库缺少 schema_version 表"),
    }
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL DEFAULT 'global',
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

-- ===== dem 源表镜像 =====

CREATE TABLE IF NOT EXISTS dem_orders (
    idorders INTEGER PRIMARY KEY,
    numorders TEXT NOT NULL,
    class_id INTEGER NOT NULL DEFAULT 10,
    customer TEXT,
    creator TEXT NOT NULL DEFAULT '',
    dop_info TEXT NOT NULL DEFAULT '',
    ms_note TEXT,
    creation_date INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_dem_orders_num ON dem_orders(numorders, class_id);

-- 订单生产计划行（位置 x 类型）
CREATE TABLE IF NOT EXISTS dem_plan (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    idorder INTEGER NOT NULL,
    x INTEGER NOT NULL,
    type INTEGER NOT NULL DEFAULT 0,
    text_type TEXT NOT NULL DEFAULT '',
    sqr REAL NOT NULL DEFAULT 0,
    icount REAL NOT NULL DEFAULT 0,
    color TEXT NOT NULL DEFAULT '',
    note TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS idx_dem_plan_order ON dem_plan(idorder, x);

CREATE TABLE IF NOT EXISTS dem_klaes_materials (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    idorders INTEGER NOT NULL,
    position INTEGER NOT NULL,
    articul_mat TEXT NOT NULL DEFAULT '',
    name_mat TEXT NOT NULL,
    width REAL NOT NULL DEFAULT 0,
    height REAL NOT NULL DEFAULT 0,
    count REAL NOT NULL DEFAULT 0,
    pole TEXT
);
CREATE INDEX IF NOT EXISTS idx_klaes_order_pos ON dem_klaes_materials(idorders, position);

CREATE TABLE IF NOT EXISTS dem_price (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    numorders TEXT NOT NULL,
    name_position TEXT NOT NULL DEFAULT '',
    vendor TEXT NOT NULL DEFAULT '',
    pos_k TEXT NOT NULL DEFAULT '',
    kol_vo REAL NOT NULL DEFAULT 0
);

-- ===== 定额模板 =====

CREATE TABLE IF NOT EXISTS dem_templates_al (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT '',
    operations TEXT NOT NULL DEFAULT '[]',
    systema TEXT,
    izd TEXT,
    profile TEXT,
    rules TEXT NOT NULL DEFAULT '[]',
    is_active INTEGER NOT NULL DEFAULT 1,
    head_name TEXT
);

-- ===== 订单定额 / 派工 =====

CREATE TABLE IF NOT EXISTS dem_product_instances_al (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_num TEXT NOT NULL,
    template_code TEXT NOT NULL,
    name TEXT NOT NULL,
    count REAL NOT NULL DEFAULT 0,
    total_time REAL NOT NULL DEFAULT 0,
    type TEXT NOT NULL DEFAULT '',
    part_type TEXT NOT NULL DEFAULT '',
    parent_assembly TEXT NOT NULL DEFAULT '',
    parent_product_id INTEGER REFERENCES dem_product_instances_al(id) ON DELETE CASCADE,
    customer TEXT NOT NULL DEFAULT '',
    position INTEGER NOT NULL DEFAULT 0,
    status TEXT,
    systema TEXT NOT NULL DEFAULT '',
    type_izd TEXT NOT NULL DEFAULT '',
    profile TEXT NOT NULL DEFAULT '',
    sqr REAL NOT NULL DEFAULT 0,
    customer_type TEXT NOT NULL DEFAULT '',
    brigade TEXT NOT NULL DEFAULT '',
    norm_money REAL NOT NULL DEFAULT 0,
    coefficient REAL,
    ready_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_product_order ON dem_product_instances_al(order_num);

CREATE TABLE IF NOT EXISTS dem_operation_values_al (
    product_id INTEGER NOT NULL REFERENCES dem_product_instances_al(id) ON DELETE CASCADE,
    operation_name TEXT NOT NULL,
    operation_label TEXT NOT NULL DEFAULT '',
    count REAL NOT NULL DEFAULT 0,
    value REAL NOT NULL DEFAULT 0,
    minutes REAL NOT NULL DEFAULT 0,
    sort_operation INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (product_id, operation_name)
);

CREATE TABLE IF NOT EXISTS dem_employees_al (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS dem_teams_al (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS dem_employee_teams_al (
    employee_id INTEGER NOT NULL REFERENCES dem_employees_al(id) ON DELETE CASCADE,
    team_id INTEGER NOT NULL REFERENCES dem_teams_al(id) ON DELETE CASCADE,
    PRIMARY KEY (employee_id, team_id)
);

CREATE TABLE IF NOT EXISTS dem_operation_executors_al (
    product_id INTEGER NOT NULL REFERENCES dem_product_instances_al(id) ON DELETE CASCADE,
    operation_name TEXT NOT NULL,
    employee_id INTEGER NOT NULL REFERENCES dem_employees_al(id),
    actual_minutes REAL NOT NULL DEFAULT 0,
    notes TEXT NOT NULL DEFAULT '',
    actual_value REAL NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (product_id, operation_name, employee_id)
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }
}
