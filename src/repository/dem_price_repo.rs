use crate::db::open_sqlite_connection;
use crate::domain::material::SupplementaryFact;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// DemPriceRepository - 报价单附注仓储
// ==========================================
/// 报价单附注仓储（dem_price，只读）
pub struct DemPriceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DemPriceRepository {
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

    /// 读取订单的报价单附注，订单号不存在时返回空列表
    pub fn get_supplementary_facts(
        &self,
        order_num: &str,
    ) -> RepositoryResult<Vec<SupplementaryFact>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT name_position, vendor, pos_k, kol_vo
            FROM dem_price
            WHERE numorders = ?1
            ORDER BY id
            "#,
        )?;

        let facts = stmt
            .query_map(params![order_num], |row| {
                Ok(SupplementaryFact {
                    position_name: row.get(0)?,
                    article: row.get(1)?,
                    position: row.get(2)?,
                    count: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(facts)
    }
}
