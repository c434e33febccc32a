use crate::db::open_sqlite_connection;
use crate::domain::material::Material;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

/// dem 订单中代表生产订单的 class_id
pub const PRODUCTION_ORDER_CLASS_ID: i64 = 10;

// ==========================================
// DemMaterialRepository - 订单物料清单仓储
// ==========================================
/// 订单物料清单仓储
/// 职责: 只读访问 dem_orders / dem_klaes_materials
/// 红线: 不含业务逻辑，名称不做规范化
pub struct DemMaterialRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DemMaterialRepository {
    /// 创建新的 DemMaterialRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按订单号解析 dem 订单内部ID
    ///
    /// # 返回
    /// - Ok(Some(id)): 找到生产订单
    /// - Ok(None): 订单号不存在
    pub fn find_order_id(&self, order_num: &str) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let id = conn
            .query_row(
                "SELECT idorders FROM dem_orders WHERE numorders = ?1 AND class_id = ?2",
                params![order_num, PRODUCTION_ORDER_CLASS_ID],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// 读取订单行物料清单
    ///
    /// # 参数
    /// - order_num: 订单号
    /// - position: 订单位置号
    ///
    /// # 返回
    /// - Ok(Vec<Material>): 物料行（可能为空）
    /// - Err(NotFound): 订单号不存在
    pub fn get_order_materials(
        &self,
        order_num: &str,
        position: i32,
    ) -> RepositoryResult<Vec<Material>> {
        let order_id = self
            .find_order_id(order_num)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "dem_orders".to_string(),
                id: order_num.to_string(),
            })?;

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT idorders, position, articul_mat, name_mat, width, height, count, pole
            FROM dem_klaes_materials
            WHERE idorders = ?1 AND position = ?2
            ORDER BY id
            "#,
        )?;

        let materials = stmt
            .query_map(params![order_id, position], |row| {
                Ok(Material {
                    order_id: row.get(0)?,
                    position: row.get(1)?,
                    article: row.get(2)?,
                    name: row.get(3)?,
                    width_mm: row.get(4)?,
                    height_mm: row.get(5)?,
                    count: row.get(6)?,
                    field: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            order_num = %order_num,
            position = position,
            rows = materials.len(),
            "读取物料清单"
        );
        Ok(materials)
    }
}
