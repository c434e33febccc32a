// ==========================================
// 门窗车间工时定额计算系统 - 订单定额仓储
// ==========================================
// 表: dem_product_instances_al / dem_operation_values_al /
//     dem_operation_executors_al
// 红线: 写操作均在单个事务内完成
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::norm_order::{
    AssignedWorker, FinalOrderFilter, FinalOrderList, FinalOrderProduct, FinalOrderUpdate,
    NormOperation, NormOrder, NormOrderDraft, NormOrderFilter, NormOrderSummary,
    NormOrderUpdate, SaveWorkersRequest, Worker, STATUS_ASSIGNED, STATUS_FINAL,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

const NORM_ORDER_COLUMNS: &str = r#"
    id, order_num, template_code, name, count, total_time, type, part_type,
    parent_assembly, parent_product_id, status, customer, customer_type, systema,
    type_izd, profile, sqr, brigade, norm_money, coefficient, position,
    ready_date, created_at, updated_at
"#;

fn map_norm_order(row: &Row<'_>) -> rusqlite::Result<NormOrder> {
    Ok(NormOrder {
        id: row.get(0)?,
        order_num: row.get(1)?,
        template_code: row.get(2)?,
        name: row.get(3)?,
        count: row.get(4)?,
        total_time: row.get(5)?,
        operations: Vec::new(),
        kind: row.get(6)?,
        part_type: row.get(7)?,
        parent_assembly: row.get(8)?,
        parent_product_id: row.get(9)?,
        status: row.get(10)?,
        customer: row.get(11)?,
        customer_type: row.get(12)?,
        systema: row.get(13)?,
        type_izd: row.get(14)?,
        profile: row.get(15)?,
        sqr: row.get(16)?,
        brigade: row.get(17)?,
        norm_money: row.get(18)?,
        coefficient: row.get(19)?,
        position: row.get(20)?,
        ready_date: row.get::<_, Option<NaiveDate>>(21)?,
        created_at: row.get::<_, DateTime<Utc>>(22)?,
        updated_at: row.get::<_, DateTime<Utc>>(23)?,
    })
}

/// 写入工序（按列表顺序记录 sort_operation，无名称的保存为 manual_<序号>）
fn insert_operations(
    conn: &Connection,
    product_id: i64,
    operations: &[NormOperation],
) -> RepositoryResult<()> {
    let mut stmt = conn.prepare(
        r#"
        INSERT INTO dem_operation_values_al (
            product_id, operation_name, operation_label, count, value, minutes, sort_operation
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(product_id, operation_name) DO UPDATE SET
            operation_label = excluded.operation_label,
            count = excluded.count,
            value = excluded.value,
            minutes = excluded.minutes,
            sort_operation = excluded.sort_operation
        "#,
    )?;

    for (index, op) in operations.iter().enumerate() {
        let name = if op.name.trim().is_empty() {
            format!("manual_{}", index)
        } else {
            op.name.clone()
        };
        stmt.execute(params![
            product_id,
            name,
            op.label,
            op.count,
            op.value,
            op.minutes,
            index as i64,
        ])?;
    }
    Ok(())
}

/// 读取工序及各工序的执行人
fn load_operations(conn: &Connection, product_id: i64) -> RepositoryResult<Vec<NormOperation>> {
    let mut op_stmt = conn.prepare_cached(
        r#"
        SELECT operation_name, operation_label, count, value, minutes
        FROM dem_operation_values_al
        WHERE product_id = ?1
        ORDER BY sort_operation
        "#,
    )?;
    let mut exec_stmt = conn.prepare_cached(
        r#"
        SELECT employee_id, actual_minutes, actual_value
        FROM dem_operation_executors_al
        WHERE product_id = ?1 AND operation_name = ?2
        ORDER BY employee_id
        "#,
    )?;

    let mut operations = op_stmt
        .query_map(params![product_id], |row| {
            Ok(NormOperation {
                name: row.get(0)?,
                label: row.get(1)?,
                count: row.get(2)?,
                value: row.get(3)?,
                minutes: row.get(4)?,
                assigned_workers: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for op in operations.iter_mut() {
        op.assigned_workers = exec_stmt
            .query_map(params![product_id, op.name], |row| {
                Ok(AssignedWorker {
                    employee_id: row.get(0)?,
                    actual_minutes: row.get(1)?,
                    actual_value: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
    }
    Ok(operations)
}

fn not_found(id: i64) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "NormOrder".to_string(),
        id: id.to_string(),
    }
}

// ==========================================
// FinalReportRow - 最终报表平铺行
// ==========================================
/// 一行 = 产品 × 工序 × 执行人（无执行人时 worker 字段为空）
#[derive(Debug, Clone, PartialEq)]
pub struct FinalReportRow {
    pub product_id: i64,
    pub product_name: String,
    pub template_name: String,
    pub operation_name: String,
    pub operation_label: String,
    pub norm_minutes: f64,
    pub norm_value: f64,
    pub worker_name: Option<String>,
    pub actual_minutes: Option<f64>,
    pub actual_value: Option<f64>,
}

/// 订单定额仓储
pub struct NormOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl NormOrderRepository {
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

    /// 保存订单行定额及其工序
    ///
    /// # 返回
    /// - Ok(id): 新产品实例ID
    ///
    /// # 说明
    /// - total_time 为空时按工序分钟数求和
    /// - 无名称的工序保存为 manual_<序号>
    /// - sort_operation 记录工序原始顺序
    pub fn save(&self, draft: &NormOrderDraft) -> RepositoryResult<i64> {
        let now = Utc::now();
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO dem_product_instances_al (
                order_num, template_code, name, count, total_time, type, part_type,
                parent_assembly, parent_product_id, customer, position, status,
                systema, type_izd, profile, sqr, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18
            )
            "#,
            params![
                draft.order_num,
                draft.template_code,
                draft.name,
                draft.count,
                draft.resolved_total_time(),
                draft.kind,
                draft.part_type,
                draft.parent_assembly,
                draft.parent_product_id,
                draft.customer,
                draft.position,
                draft.status,
                draft.systema,
                draft.type_izd,
                draft.profile,
                draft.sqr,
                now,
                now,
            ],
        )?;
        let product_id = tx.last_insert_rowid();
        insert_operations(&tx, product_id, &draft.operations)?;

        tx.commit()?;
        Ok(product_id)
    }

    /// 按订单号读取全部定额（main 在前，其余按ID），附带工序与派工
    pub fn get_by_order(&self, order_num: &str) -> RepositoryResult<Vec<NormOrder>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}
            FROM dem_product_instances_al
            WHERE order_num = ?1
            ORDER BY CASE WHEN part_type = 'main' THEN 0 ELSE 1 END, id
            "#,
            NORM_ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut orders = stmt
            .query_map(params![order_num], map_norm_order)?
            .collect::<Result<Vec<_>, _>>()?;

        for order in orders.iter_mut() {
            order.operations = load_operations(&conn, order.id)?;
        }
        Ok(orders)
    }

    /// 按ID读取单条定额（含工序与派工）
    pub fn get_by_id(&self, id: i64) -> RepositoryResult<NormOrder> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM dem_product_instances_al WHERE id = ?1",
            NORM_ORDER_COLUMNS
        );
        let mut order = conn
            .query_row(&sql, params![id], map_norm_order)
            .optional()?
            .ok_or_else(|| not_found(id))?;
        order.operations = load_operations(&conn, id)?;
        Ok(order)
    }

    /// 主件定额列表（新建在前）
    pub fn list_main(&self, filter: &NormOrderFilter) -> RepositoryResult<Vec<NormOrderSummary>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, order_num, name, count, total_time, created_at, type, part_type,
                   parent_product_id, parent_assembly, status
            FROM dem_product_instances_al
            WHERE part_type = 'main'
              AND (?1 = '' OR order_num LIKE '%' || ?1 || '%')
              AND (?2 = '' OR type = ?2)
            ORDER BY created_at DESC, id DESC
            "#,
        )?;
        let rows = stmt
            .query_map(params![filter.order_num.trim(), filter.kind.trim()], |row| {
                Ok(NormOrderSummary {
                    id: row.get(0)?,
                    order_num: row.get(1)?,
                    name: row.get(2)?,
                    count: row.get(3)?,
                    total_time: row.get(4)?,
                    created_at: row.get::<_, DateTime<Utc>>(5)?,
                    kind: row.get(6)?,
                    part_type: row.get(7)?,
                    parent_product_id: row.get(8)?,
                    parent_assembly: row.get(9)?,
                    status: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 重新保存工序定额
    ///
    /// # 说明
    /// - 同一事务内: 更新总工时/类型/状态 → 删除旧工序 → 写入新工序
    /// - status 为空时保留原状态
    /// - 已有派工不受影响
    pub fn update(&self, id: i64, update: &NormOrderUpdate) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let changed = tx.execute(
            r#"
            UPDATE dem_product_instances_al
            SET total_time = ?1, type = ?2, status = COALESCE(?3, status), updated_at = ?4
            WHERE id = ?5
            "#,
            params![
                update.resolved_total_time(),
                update.kind,
                update.status,
                Utc::now(),
                id
            ],
        )?;
        if changed == 0 {
            return Err(not_found(id));
        }

        tx.execute(
            "DELETE FROM dem_operation_values_al WHERE product_id = ?1",
            params![id],
        )?;
        insert_operations(&tx, id, &update.operations)?;

        tx.commit()?;
        Ok(())
    }

    /// 撤销类状态变更：组件及其子件改为新状态并清空派工
    ///
    /// # 返回
    /// - Ok(n): 改动的产品数
    pub fn update_cancel_status(&self, root_product_id: i64, status: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let changed = tx.execute(
            r#"
            UPDATE dem_product_instances_al SET status = ?1, updated_at = ?2
            WHERE id = ?3 OR parent_product_id = ?3
            "#,
            params![status, Utc::now(), root_product_id],
        )?;
        if changed == 0 {
            return Err(not_found(root_product_id));
        }

        tx.execute(
            r#"
            DELETE FROM dem_operation_executors_al
            WHERE product_id IN (
                SELECT id FROM dem_product_instances_al WHERE id = ?1 OR parent_product_id = ?1
            )
            "#,
            params![root_product_id],
        )?;

        tx.commit()?;
        Ok(changed)
    }

    /// 定稿：写入提供了的字段并将状态置为 final
    pub fn update_final(&self, id: i64, update: &FinalOrderUpdate) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"
            UPDATE dem_product_instances_al SET
                brigade = COALESCE(?1, brigade),
                norm_money = COALESCE(?2, norm_money),
                coefficient = COALESCE(?3, coefficient),
                sqr = COALESCE(?4, sqr),
                parent_assembly = COALESCE(?5, parent_assembly),
                profile = COALESCE(?6, profile),
                systema = COALESCE(?7, systema),
                type_izd = COALESCE(?8, type_izd),
                customer_type = COALESCE(?9, customer_type),
                status = ?10,
                updated_at = ?11
            WHERE id = ?12
            "#,
            params![
                update.brigade,
                update.norm_money,
                update.coefficient,
                update.sqr,
                update.parent_assembly,
                update.profile,
                update.systema,
                update.type_izd,
                update.customer_type,
                STATUS_FINAL,
                Utc::now(),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    /// 已派工 / 已定稿产品列表（完成日期倒序），附在岗工人的实际工时合计
    pub fn list_final(&self, filter: &FinalOrderFilter) -> RepositoryResult<FinalOrderList> {
        let conn = self.get_conn()?;

        let mut sql = String::from(
            r#"
            SELECT id, order_num, customer, total_time, created_at, status, part_type, type,
                   parent_product_id, parent_assembly, customer_type, systema, type_izd,
                   profile, count, sqr, brigade, norm_money, position, ready_date, coefficient
            FROM dem_product_instances_al
            WHERE status IN (?1, ?2)"#,
        );
        let mut values: Vec<Value> = vec![
            Value::from(STATUS_ASSIGNED.to_string()),
            Value::from(STATUS_FINAL.to_string()),
        ];
        let mut idx = 3;

        if let Some(from) = filter.from {
            sql.push_str(&format!(" AND ready_date >= ?{}", idx));
            values.push(Value::from(from.format("%Y-%m-%d").to_string()));
            idx += 1;
        }
        if let Some(to) = filter.to {
            sql.push_str(&format!(" AND ready_date <= ?{}", idx));
            values.push(Value::from(to.format("%Y-%m-%d").to_string()));
            idx += 1;
        }
        let order_num = filter.order_num.trim();
        if !order_num.is_empty() {
            sql.push_str(&format!(" AND order_num LIKE ?{}", idx));
            values.push(Value::from(format!("%{}%", order_num)));
            idx += 1;
        }
        let kinds: Vec<&str> = filter
            .kinds
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();
        if !kinds.is_empty() {
            let placeholders: Vec<String> = (0..kinds.len()).map(|i| format!("?{}", idx + i)).collect();
            sql.push_str(&format!(" AND type IN ({})", placeholders.join(", ")));
            values.extend(kinds.iter().map(|k| Value::from(k.to_string())));
        }
        sql.push_str(" ORDER BY ready_date DESC, order_num, id");

        let mut stmt = conn.prepare(&sql)?;
        let mut products = stmt
            .query_map(params_from_iter(values), |row| {
                Ok(FinalOrderProduct {
                    id: row.get(0)?,
                    order_num: row.get(1)?,
                    customer: row.get(2)?,
                    total_time: row.get(3)?,
                    created_at: row.get::<_, DateTime<Utc>>(4)?,
                    status: row.get(5)?,
                    part_type: row.get(6)?,
                    kind: row.get(7)?,
                    parent_product_id: row.get(8)?,
                    parent_assembly: row.get(9)?,
                    customer_type: row.get(10)?,
                    systema: row.get(11)?,
                    type_izd: row.get(12)?,
                    profile: row.get(13)?,
                    count: row.get(14)?,
                    sqr: row.get(15)?,
                    brigade: row.get(16)?,
                    norm_money: row.get(17)?,
                    position: row.get(18)?,
                    ready_date: row.get::<_, Option<NaiveDate>>(19)?,
                    coefficient: row.get(20)?,
                    employee_minutes: BTreeMap::new(),
                    employee_value: BTreeMap::new(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if products.is_empty() {
            return Ok(FinalOrderList::default());
        }

        // 只统计在岗工人
        let mut exec_stmt = conn.prepare_cached(
            r#"
            SELECT e.id, e.name, oe.actual_minutes, oe.actual_value
            FROM dem_operation_executors_al oe
            JOIN dem_employees_al e ON e.id = oe.employee_id
            WHERE oe.product_id = ?1 AND e.is_active = 1
            "#,
        )?;
        let mut employees: BTreeMap<i64, String> = BTreeMap::new();
        for product in products.iter_mut() {
            let rows = exec_stmt
                .query_map(params![product.id], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            for (employee_id, name, minutes, value) in rows {
                *product.employee_minutes.entry(employee_id).or_insert(0.0) += minutes;
                *product.employee_value.entry(employee_id).or_insert(0.0) += value;
                employees.entry(employee_id).or_insert(name);
            }
        }

        let mut employees: Vec<Worker> = employees
            .into_iter()
            .map(|(id, name)| Worker {
                id,
                name,
                is_active: true,
                team: None,
            })
            .collect();
        employees.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Ok(FinalOrderList {
            employees,
            products,
        })
    }

    /// 保存派工（覆盖组件及其子件的全部旧派工）
    ///
    /// # 说明
    /// - 同一事务内: 删除旧派工 → 写入新派工 → 可选更新状态/完成日期
    /// - 状态与完成日期同时作用于根组件及其子件
    pub fn assign_workers(&self, req: &SaveWorkersRequest) -> RepositoryResult<usize> {
        let root = req.root_product_id;
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let exists: i64 = tx.query_row(
            "SELECT COUNT(*) FROM dem_product_instances_al WHERE id = ?1",
            params![root],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(not_found(root));
        }

        tx.execute(
            r#"
            DELETE FROM dem_operation_executors_al
            WHERE product_id = ?1
               OR product_id IN (SELECT id FROM dem_product_instances_al WHERE parent_product_id = ?1)
            "#,
            params![root],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO dem_operation_executors_al (
                    product_id, operation_name, employee_id, actual_minutes, notes, actual_value, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))
                ON CONFLICT(product_id, operation_name, employee_id) DO UPDATE SET
                    actual_minutes = excluded.actual_minutes,
                    actual_value = excluded.actual_value,
                    notes = excluded.notes,
                    updated_at = excluded.updated_at
                "#,
            )?;
            for a in &req.assignments {
                stmt.execute(params![
                    a.product_id,
                    a.operation_name,
                    a.employee_id,
                    a.actual_minutes,
                    a.notes,
                    a.actual_value,
                ])?;
            }
        }

        let now = Utc::now();
        if let Some(status) = req.update_status.as_deref().filter(|s| !s.is_empty()) {
            tx.execute(
                "UPDATE dem_product_instances_al SET status = ?1, updated_at = ?2 WHERE id = ?3 OR parent_product_id = ?3",
                params![status, now, root],
            )?;
        }
        if let Some(ready_date) = req.ready_date {
            tx.execute(
                "UPDATE dem_product_instances_al SET ready_date = ?1, updated_at = ?2 WHERE id = ?3 OR parent_product_id = ?3",
                params![ready_date, now, root],
            )?;
        }

        tx.commit()?;
        Ok(req.assignments.len())
    }

    /// 最终报表平铺行（产品按ID，工序按保存顺序）
    pub fn final_report_rows(&self, order_num: &str) -> RepositoryResult<Vec<FinalReportRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                pi.id, pi.name, COALESCE(t.name, ''),
                ov.operation_name, ov.operation_label, ov.minutes, ov.value,
                e.name, oe.actual_minutes, oe.actual_value
            FROM dem_product_instances_al pi
            LEFT JOIN dem_templates_al t ON pi.template_code = t.code
            JOIN dem_operation_values_al ov ON pi.id = ov.product_id
            LEFT JOIN dem_operation_executors_al oe
                ON ov.product_id = oe.product_id AND ov.operation_name = oe.operation_name
            LEFT JOIN dem_employees_al e ON oe.employee_id = e.id
            WHERE pi.order_num = ?1
            ORDER BY pi.id, ov.sort_operation, e.name
            "#,
        )?;

        let rows = stmt
            .query_map(params![order_num], |row| {
                Ok(FinalReportRow {
                    product_id: row.get(0)?,
                    product_name: row.get(1)?,
                    template_name: row.get(2)?,
                    operation_name: row.get(3)?,
                    operation_label: row.get(4)?,
                    norm_minutes: row.get(5)?,
                    norm_value: row.get(6)?,
                    worker_name: row.get(7)?,
                    actual_minutes: row.get(8)?,
                    actual_value: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
