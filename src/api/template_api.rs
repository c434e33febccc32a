// ==========================================
// 门窗车间工时定额计算系统 - 定额模板 API
// ==========================================
// 职责: 模板查询、管理端增改
// 说明: 规则中的未知字段照常保存，只返回告警
// ==========================================

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::template::Template;
use crate::engine::rule_lint::{lint_rules, RuleWarning};
use crate::repository::template_repo::TemplateRepository;

pub struct TemplateApi {
    template_repo: Arc<TemplateRepository>,
}

impl TemplateApi {
    pub fn new(template_repo: Arc<TemplateRepository>) -> Self {
        Self { template_repo }
    }

    /// 已启用模板
    pub fn get_template(&self, code: &str) -> ApiResult<Template> {
        validate_code(code)?;
        Ok(self.template_repo.get_active_by_code(code)?)
    }

    /// 管理端读取（含停用）
    pub fn get_template_admin(&self, code: &str) -> ApiResult<Template> {
        validate_code(code)?;
        Ok(self.template_repo.get_by_code_admin(code)?)
    }

    pub fn list_templates(&self) -> ApiResult<Vec<Template>> {
        Ok(self.template_repo.list_active()?)
    }

    pub fn list_templates_admin(&self) -> ApiResult<Vec<Template>> {
        Ok(self.template_repo.list_all()?)
    }

    /// 新建模板
    ///
    /// # 返回
    /// - Ok(Vec<RuleWarning>): 规则告警（可能为空）
    /// - Err(BusinessRuleViolation): 模板代码已存在
    pub fn create_template(&self, template: Template) -> ApiResult<Vec<RuleWarning>> {
        validate_template(&template)?;
        let warnings = lint_and_log(&template);

        let id = self.template_repo.create(&template)?;
        info!(
            code = %template.code,
            id = id,
            operations = template.operations.len(),
            rules = template.rules.len(),
            warnings = warnings.len(),
            "新建定额模板"
        );
        Ok(warnings)
    }

    /// 按 code 更新模板
    pub fn update_template(&self, template: Template) -> ApiResult<Vec<RuleWarning>> {
        validate_template(&template)?;
        let warnings = lint_and_log(&template);

        self.template_repo.update(&template)?;
        info!(
            code = %template.code,
            is_active = template.is_active,
            warnings = warnings.len(),
            "更新定额模板"
        );
        Ok(warnings)
    }
}

fn validate_code(code: &str) -> ApiResult<()> {
    if code.trim().is_empty() {
        return Err(ApiError::InvalidInput("模板代码不能为空".to_string()));
    }
    Ok(())
}

fn validate_template(template: &Template) -> ApiResult<()> {
    validate_code(&template.code)?;
    if template.name.trim().is_empty() {
        return Err(ApiError::InvalidInput("模板名称不能为空".to_string()));
    }
    Ok(())
}

fn lint_and_log(template: &Template) -> Vec<RuleWarning> {
    let warnings = lint_rules(template);
    for w in &warnings {
        warn!(code = %template.code, warning = %w, "模板规则告警");
    }
    warnings
}
