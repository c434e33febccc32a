// ==========================================
// 门窗车间工时定额计算系统 - 定额模板仓储
// ==========================================
// 表: dem_templates_al
// 存储: operations / rules 为 JSON 文本列
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::template::{Operation, Rule, Template};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const TEMPLATE_COLUMNS: &str =
    "id, code, name, category, operations, systema, izd, profile, rules, is_active, head_name";

/// 定额模板仓储
pub struct TemplateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TemplateRepository {
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

    /// 读取已启用模板，不存在或已停用 → NotFound
    pub fn get_active_by_code(&self, code: &str) -> RepositoryResult<Template> {
        self.find_by_code(code, true)?
            .ok_or_else(|| not_found(code))
    }

    /// 管理端读取（含停用模板）
    pub fn get_by_code_admin(&self, code: &str) -> RepositoryResult<Template> {
        self.find_by_code(code, false)?
            .ok_or_else(|| not_found(code))
    }

    fn find_by_code(&self, code: &str, active_only: bool) -> RepositoryResult<Option<Template>> {
        let conn = self.get_conn()?;
        let sql = if active_only {
            format!(
                "SELECT {} FROM dem_templates_al WHERE code = ?1 AND is_active = 1",
                TEMPLATE_COLUMNS
            )
        } else {
            format!("SELECT {} FROM dem_templates_al WHERE code = ?1", TEMPLATE_COLUMNS)
        };

        let raw = conn
            .query_row(&sql, params![code], TemplateRow::from_row)
            .optional()?;
        raw.map(TemplateRow::into_template).transpose()
    }

    /// 已启用模板列表（按 code 排序）
    pub fn list_active(&self) -> RepositoryResult<Vec<Template>> {
        self.list(true)
    }

    /// 全部模板列表（管理端）
    pub fn list_all(&self) -> RepositoryResult<Vec<Template>> {
        self.list(false)
    }

    fn list(&self, active_only: bool) -> RepositoryResult<Vec<Template>> {
        let conn = self.get_conn()?;
        let filter = if active_only { "WHERE is_active = 1" } else { "" };
        let sql = format!(
            "SELECT {} FROM dem_templates_al {} ORDER BY code",
            TEMPLATE_COLUMNS, filter
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], TemplateRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(TemplateRow::into_template).collect()
    }

    /// 新建模板
    ///
    /// # 返回
    /// - Ok(id): 新模板ID
    /// - Err(BusinessRuleViolation): code 已存在
    pub fn create(&self, template: &Template) -> RepositoryResult<i64> {
        let operations = serde_json::to_string(&template.operations)?;
        let rules = serde_json::to_string(&template.rules)?;

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT id FROM dem_templates_al WHERE code = ?1",
                params![template.code],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "模板代码已存在: {}",
                template.code
            )));
        }

        tx.execute(
            r#"
            INSERT INTO dem_templates_al (
                code, name, category, operations, systema, izd, profile, rules, is_active, head_name
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                template.code,
                template.name,
                template.category,
                operations,
                template.systema,
                template.type_izd,
                template.profile,
                rules,
                template.is_active,
                template.head_name,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    /// 按 code 更新模板，code 不存在 → NotFound
    pub fn update(&self, template: &Template) -> RepositoryResult<()> {
        let operations = serde_json::to_string(&template.operations)?;
        let rules = serde_json::to_string(&template.rules)?;

        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE dem_templates_al
            SET name = ?2, category = ?3, operations = ?4, systema = ?5, izd = ?6,
                profile = ?7, rules = ?8, is_active = ?9, head_name = ?10
            WHERE code = ?1
            "#,
            params![
                template.code,
                template.name,
                template.category,
                operations,
                template.systema,
                template.type_izd,
                template.profile,
                rules,
                template.is_active,
                template.head_name,
            ],
        )?;

        if affected == 0 {
            return Err(not_found(&template.code));
        }
        Ok(())
    }
}

fn not_found(code: &str) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "Template".to_string(),
        id: code.to_string(),
    }
}

// 行映射与 JSON 解析分两步，JSON 错误以 JsonParseError 返回
struct TemplateRow {
    id: i64,
    code: String,
    name: String,
    category: String,
    operations: String,
    systema: Option<String>,
    izd: Option<String>,
    profile: Option<String>,
    rules: String,
    is_active: bool,
    head_name: Option<String>,
}

impl TemplateRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            category: row.get(3)?,
            operations: row.get(4)?,
            systema: row.get(5)?,
            izd: row.get(6)?,
            profile: row.get(7)?,
            rules: row.get(8)?,
            is_active: row.get(9)?,
            head_name: row.get(10)?,
        })
    }

    fn into_template(self) -> RepositoryResult<Template> {
        let operations: Vec<Operation> = serde_json::from_str(&self.operations)?;
        let rules: Vec<Rule> = if self.rules.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&self.rules)?
        };

        Ok(Template {
            id: self.id,
            code: self.code,
            name: self.name,
            category: self.category,
            systema: self.systema,
            type_izd: self.izd,
            profile: self.profile,
            operations,
            rules,
            is_active: self.is_active,
            head_name: self.head_name,
        })
    }
}
