// ==========================================
// 门窗车间工时定额计算系统 - 命令行入口
// ==========================================
// 用法:
//   dem-norm calc <订单号> <位置号> <产品类型> <模板代码> <件数>
//   dem-norm report <订单号>
//   dem-norm templates
//   dem-norm orders <年> <月> | dem-norm orders --search <订单号片段>
//   dem-norm positions <订单号>
//   dem-norm workers
// 结果以 JSON 输出到 stdout，日志输出到 stderr
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use dem_norm::api::CalculateRequest;
use dem_norm::app::{get_default_db_path, AppState};
use dem_norm::domain::DemOrderFilter;
use dem_norm::logging;

const USAGE: &str = "用法:
  dem-norm calc <order_num> <position> <type> <template_code> <count>
  dem-norm report <order_num>
  dem-norm templates
  dem-norm orders <year> <month>
  dem-norm orders --search <fragment>
  dem-norm positions <order_num>
  dem-norm workers";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!("{}", USAGE);
    };

    let db_path = get_default_db_path();
    tracing::info!(
        version = dem_norm::VERSION,
        db_path = %db_path,
        "{} 启动",
        dem_norm::APP_NAME
    );

    let state = AppState::new(db_path)
        .await
        .map_err(|e| anyhow!("无法初始化AppState: {}", e))?;

    let output = match command.as_str() {
        "calc" => {
            let [order_num, position, product_type, template_code, count] = &args[1..] else {
                bail!("{}", USAGE);
            };
            let req = CalculateRequest {
                order_num: order_num.clone(),
                position: position
                    .parse()
                    .with_context(|| format!("位置号不是整数: {}", position))?,
                product_type: product_type.clone(),
                template_code: template_code.clone(),
                item_count: count
                    .parse()
                    .with_context(|| format!("件数不是非负整数: {}", count))?,
            };
            let result = state.norm_api.calculate(req).await?;
            serde_json::to_string_pretty(&result)?
        }
        "report" => {
            let [order_num] = &args[1..] else {
                bail!("{}", USAGE);
            };
            let report = state.report_api.order_final_report(order_num)?;
            serde_json::to_string_pretty(&report)?
        }
        "templates" => {
            let templates = state.template_api.list_templates()?;
            serde_json::to_string_pretty(&templates)?
        }
        "orders" => {
            let filter = match &args[1..] {
                [flag, fragment] if flag == "--search" => DemOrderFilter {
                    search: Some(fragment.clone()),
                    ..Default::default()
                },
                [year, month] => DemOrderFilter {
                    year: Some(year.parse().with_context(|| format!("年份不是整数: {}", year))?),
                    month: Some(month.parse().with_context(|| format!("月份不是整数: {}", month))?),
                    search: None,
                },
                _ => bail!("{}", USAGE),
            };
            let orders = state.dem_order_api.list_orders(&filter)?;
            serde_json::to_string_pretty(&orders)?
        }
        "positions" => {
            let [order_num] = &args[1..] else {
                bail!("{}", USAGE);
            };
            let positions = state.dem_order_api.get_order_details(order_num)?;
            serde_json::to_string_pretty(&positions)?
        }
        "workers" => {
            let workers = state.norm_api.list_workers_admin()?;
            serde_json::to_string_pretty(&workers)?
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    };

    println!("{}", output);
    Ok(())
}
