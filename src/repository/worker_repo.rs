use crate::db::open_sqlite_connection;
use crate::domain::norm_order::{NewWorker, Worker};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// 每名工人取字典序最小的班组 slug
const WORKER_SELECT: &str = r#"
    SELECT e.id, e.name, e.is_active,
           (SELECT MIN(t.slug)
              FROM dem_employee_teams_al et
              JOIN dem_teams_al t ON t.id = et.team_id
             WHERE et.employee_id = e.id) AS team
    FROM dem_employees_al e
"#;

fn map_worker(row: &Row<'_>) -> rusqlite::Result<Worker> {
    Ok(Worker {
        id: row.get(0)?,
        name: row.get(1)?,
        is_active: row.get(2)?,
        team: row.get(3)?,
    })
}

/// 将工人挂到班组下（班组不存在时创建），替换原有班组
fn replace_team(conn: &Connection, employee_id: i64, team_slug: &str) -> RepositoryResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO dem_teams_al (slug) VALUES (?1)",
        params![team_slug],
    )?;
    let team_id: i64 = conn.query_row(
        "SELECT id FROM dem_teams_al WHERE slug = ?1",
        params![team_slug],
        |row| row.get(0),
    )?;
    conn.execute(
        "DELETE FROM dem_employee_teams_al WHERE employee_id = ?1",
        params![employee_id],
    )?;
    conn.execute(
        "INSERT INTO dem_employee_teams_al (employee_id, team_id) VALUES (?1, ?2)",
        params![employee_id, team_id],
    )?;
    Ok(())
}

// ==========================================
// WorkerRepository - 工人仓储
// ==========================================
pub struct WorkerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkerRepository {
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

    /// 在岗工人（按姓名排序）
    pub fn list_active(&self) -> RepositoryResult<Vec<Worker>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE e.is_active = 1 ORDER BY e.name, e.id", WORKER_SELECT);
        let mut stmt = conn.prepare(&sql)?;
        let workers = stmt
            .query_map([], map_worker)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workers)
    }

    /// 指定班组的在岗工人
    pub fn list_active_by_team(&self, team_slug: &str) -> RepositoryResult<Vec<Worker>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT e.id, e.name, e.is_active, t.slug
            FROM dem_employees_al e
            JOIN dem_employee_teams_al et ON et.employee_id = e.id
            JOIN dem_teams_al t ON t.id = et.team_id
            WHERE e.is_active = 1 AND t.slug = ?1
            ORDER BY e.name, e.id
            "#,
        )?;
        let workers = stmt
            .query_map(params![team_slug], map_worker)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workers)
    }

    /// 全部工人（含离岗，按ID）
    pub fn list_all(&self) -> RepositoryResult<Vec<Worker>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY e.id", WORKER_SELECT);
        let mut stmt = conn.prepare(&sql)?;
        let workers = stmt
            .query_map([], map_worker)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workers)
    }

    /// 新增工人，可同时挂到班组
    pub fn create(&self, worker: &NewWorker) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO dem_employees_al (name, is_active) VALUES (?1, ?2)",
            params![worker.name, worker.is_active],
        )?;
        let id = tx.last_insert_rowid();
        if let Some(team) = worker.team.as_deref().filter(|t| !t.is_empty()) {
            replace_team(&tx, id, team)?;
        }

        tx.commit()?;
        Ok(id)
    }

    /// 批量修改姓名 / 在岗标记
    ///
    /// # 说明
    /// - 单个事务，任一ID不存在则整体回滚
    /// - team 为 Some 时替换班组，为 None 时保持不变
    pub fn update_all(&self, workers: &[Worker]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        for worker in workers {
            let changed = tx.execute(
                "UPDATE dem_employees_al SET name = ?1, is_active = ?2 WHERE id = ?3",
                params![worker.name, worker.is_active, worker.id],
            )?;
            if changed == 0 {
                return Err(RepositoryError::NotFound {
                    entity: "Worker".to_string(),
                    id: worker.id.to_string(),
                });
            }
            if let Some(team) = worker.team.as_deref().filter(|t| !t.is_empty()) {
                replace_team(&tx, worker.id, team)?;
            }
        }

        tx.commit()?;
        Ok(workers.len())
    }
}
