// ==========================================
// 门窗车间工时定额计算系统 - dem 订单浏览仓储
// ==========================================
// 表: dem_orders / dem_plan（只读）
// 只列出生产订单 (class_id = 10)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::dem_order::{DemOrder, DemOrderPosition};
use crate::repository::dem_material_repo::PRODUCTION_ORDER_CLASS_ID;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

/// 计划表中不计入位置明细的行类型
pub const EXCLUDED_PLAN_TYPES: [i64; 2] = [17, 18];

fn map_order(row: &Row<'_>) -> rusqlite::Result<DemOrder> {
    Ok(DemOrder {
        id: row.get(0)?,
        order_num: row.get(1)?,
        creator: row.get(2)?,
        customer: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        dop_info: row.get(4)?,
        ms_note: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
    })
}

pub struct DemOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DemOrderRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按订单号片段查找
    pub fn search(&self, fragment: &str) -> RepositoryResult<Vec<DemOrder>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT idorders, numorders, creator, customer, dop_info, ms_note
            FROM dem_orders
            WHERE class_id = ?1 AND numorders LIKE '%' || ?2 || '%'
            ORDER BY numorders, idorders
            "#,
        )?;
        let orders = stmt
            .query_map(params![PRODUCTION_ORDER_CLASS_ID, fragment], map_order)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    /// 创建时间落在 [start, end) 内的订单（Unix 秒）
    pub fn list_created_between(&self, start: i64, end: i64) -> RepositoryResult<Vec<DemOrder>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT idorders, numorders, creator, customer, dop_info, ms_note
            FROM dem_orders
            WHERE class_id = ?1 AND creation_date >= ?2 AND creation_date < ?3
            ORDER BY creation_date, idorders
            "#,
        )?;
        let orders = stmt
            .query_map(params![PRODUCTION_ORDER_CLASS_ID, start, end], map_order)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    /// 订单的位置明细（按位置、类型合并，面积与数量求和）
    ///
    /// 订单不存在或没有计划行时返回空列表
    pub fn get_positions(&self, order_num: &str) -> RepositoryResult<Vec<DemOrderPosition>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT MIN(p.id), MAX(p.text_type), p.x, MAX(o.numorders),
                   SUM(p.sqr), MAX(p.note), SUM(p.icount), MAX(p.color), MAX(o.customer)
            FROM dem_plan p
            JOIN dem_orders o ON o.idorders = p.idorder
            WHERE o.numorders = ?1 AND o.class_id = ?2 AND p.type NOT IN (?3, ?4)
            GROUP BY p.x, p.type
            ORDER BY p.x, p.type
            "#,
        )?;
        let positions = stmt
            .query_map(
                params![
                    order_num,
                    PRODUCTION_ORDER_CLASS_ID,
                    EXCLUDED_PLAN_TYPES[0],
                    EXCLUDED_PLAN_TYPES[1]
                ],
                |row| {
                    Ok(DemOrderPosition {
                        id: row.get(0)?,
                        name_position: row.get(1)?,
                        position: row.get(2)?,
                        order_num: row.get(3)?,
                        sqr: row.get(4)?,
                        note: row.get(5)?,
                        count: row.get(6)?,
                        color: row.get(7)?,
                        customer: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(positions)
    }
}
