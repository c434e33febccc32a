// ==========================================
// 门窗车间工时定额计算系统 - dem 订单浏览 API
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::dem_order::{DemOrder, DemOrderFilter, DemOrderPosition};
use crate::repository::dem_order_repo::DemOrderRepository;

/// 月份的 [首日, 次月首日)
pub(crate) fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start, next))
}

fn unix_seconds(date: NaiveDate) -> i64 {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).timestamp()
}

pub struct DemOrderApi {
    dem_order_repo: Arc<DemOrderRepository>,
}

impl DemOrderApi {
    pub fn new(dem_order_repo: Arc<DemOrderRepository>) -> Self {
        Self { dem_order_repo }
    }

    /// 订单列表
    ///
    /// # 说明
    /// - search 非空时按订单号片段查找，忽略年月
    /// - 否则 year 与 month 必填，按创建时间 (UTC) 落在该月过滤
    pub fn list_orders(&self, filter: &DemOrderFilter) -> ApiResult<Vec<DemOrder>> {
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return Ok(self.dem_order_repo.search(search)?);
        }

        let (year, month) = match (filter.year, filter.month) {
            (Some(y), Some(m)) => (y, m),
            _ => {
                return Err(ApiError::InvalidInput(
                    "未指定搜索条件时年份与月份必填".to_string(),
                ))
            }
        };
        let (start, next) = month_range(year, month)
            .ok_or_else(|| ApiError::InvalidInput(format!("非法月份: {}-{}", year, month)))?;

        let orders = self
            .dem_order_repo
            .list_created_between(unix_seconds(start), unix_seconds(next))?;
        debug!(year = year, month = month, orders = orders.len(), "按月读取订单");
        Ok(orders)
    }

    /// 订单位置明细
    pub fn get_order_details(&self, order_num: &str) -> ApiResult<Vec<DemOrderPosition>> {
        if order_num.trim().is_empty() {
            return Err(ApiError::InvalidInput("订单号不能为空".to_string()));
        }
        Ok(self.dem_order_repo.get_positions(order_num.trim())?)
    }
}
