// ==========================================
// 学校教务管理系统 - 导入 API
// ==========================================
// 职责: 学生 / 班级批量导入（模板、预览、勾选写入）
// 流程: 读取快照 → 构建导入档 → 结构检查 + 校验 → 写入勾选行
// 说明: 写入时按当前快照重新校验, 勾选行若已失效则跳过并计入 skipped_rows
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{require, write_outcome, ApiError, ApiResult};
use crate::config::ImportConfigReader;
use crate::domain::access::{Capability, CapabilitySet};
use crate::domain::import::{ImportProgress, ImportTemplate, RawRecord, ValidationResult};
use crate::engine::chunked_writer::ChunkedWriter;
use crate::importer::{ClassImportProfile, ImportPipeline, ImportProfile, StudentImportProfile};
use crate::repository::SchoolRepository;

/// 导入写入结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub entity: String,
    /// 输入总行数
    pub total_rows: usize,
    /// 写入条数
    pub written: usize,
    /// 校验失败行数
    pub invalid_rows: usize,
    /// 勾选但校验未通过的行号
    pub skipped_rows: Vec<usize>,
}

/// 导入API
pub struct ImportApi {
    repo: Arc<dyn SchoolRepository>,
    config: Arc<dyn ImportConfigReader>,
}

impl ImportApi {
    pub fn new(repo: Arc<dyn SchoolRepository>, config: Arc<dyn ImportConfigReader>) -> Self {
        Self { repo, config }
    }

    // ==========================================
    // 模板（静态透传）
    // ==========================================

    pub fn student_template(&self) -> ImportTemplate {
        StudentImportProfile::new(Vec::new(), Vec::new()).template()
    }

    pub fn class_template(&self) -> ImportTemplate {
        ClassImportProfile::new(Vec::new()).template()
    }

    // ==========================================
    // 学生导入
    // ==========================================

    /// 预览学生导入（不写入）
    ///
    /// # 返回
    /// - Ok(ValidationResult): 有效 / 无效记录
    /// - Err(ApiError::Import): 空输入 / 缺表头 / 超行数
    pub async fn preview_students(
        &self,
        caps: &CapabilitySet,
        records: &[RawRecord],
    ) -> ApiResult<ValidationResult> {
        require(caps, Capability::ImportStudents)?;
        let pipeline = self.student_pipeline().await?;
        Ok(pipeline.preview(records)?)
    }

    /// 写入勾选的学生记录
    ///
    /// # 参数
    /// - selected_rows: 勾选的行号（与预览结果 row_num 对应）
    /// - on_progress: 每写完一块回调一次
    pub async fn import_students<P>(
        &self,
        caps: &CapabilitySet,
        records: &[RawRecord],
        selected_rows: &[usize],
        on_progress: P,
    ) -> ApiResult<ImportReport>
    where
        P: FnMut(ImportProgress),
    {
        require(caps, Capability::ImportStudents)?;
        let pipeline = self.student_pipeline().await?;
        let validation = pipeline.preview(records)?;
        let selected = validation.select_rows(selected_rows);

        let repo = self.repo.as_ref();
        let outcome = pipeline
            .write_selected(
                &selected,
                move |chunk| async move { repo.insert_students(chunk).await.map(|_| ()) },
                on_progress,
            )
            .await?;
        let written = write_outcome(outcome)?;

        Ok(report(pipeline.profile(), &validation, selected_rows, written))
    }

    // ==========================================
    // 班级导入
    // ==========================================

    pub async fn preview_classes(
        &self,
        caps: &CapabilitySet,
        records: &[RawRecord],
    ) -> ApiResult<ValidationResult> {
        require(caps, Capability::ImportClasses)?;
        let pipeline = self.class_pipeline().await?;
        Ok(pipeline.preview(records)?)
    }

    pub async fn import_classes<P>(
        &self,
        caps: &CapabilitySet,
        records: &[RawRecord],
        selected_rows: &[usize],
        on_progress: P,
    ) -> ApiResult<ImportReport>
    where
        P: FnMut(ImportProgress),
    {
        require(caps, Capability::ImportClasses)?;
        let pipeline = self.class_pipeline().await?;
        let validation = pipeline.preview(records)?;
        let selected = validation.select_rows(selected_rows);

        let repo = self.repo.as_ref();
        let outcome = pipeline
            .write_selected(
                &selected,
                move |chunk| async move { repo.insert_classes(chunk).await.map(|_| ()) },
                on_progress,
            )
            .await?;
        let written = write_outcome(outcome)?;

        Ok(report(pipeline.profile(), &validation, selected_rows, written))
    }

    // ==========================================
    // 内部: 按当前快照与配置构建流水线
    // ==========================================

    async fn writer_and_limit(&self) -> ApiResult<(ChunkedWriter, usize)> {
        let chunk_size = self
            .config
            .get_import_chunk_size()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let max_rows = self
            .config
            .get_import_max_rows()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Ok((ChunkedWriter::new(chunk_size)?, max_rows))
    }

    async fn student_pipeline(&self) -> ApiResult<ImportPipeline<StudentImportProfile>> {
        let (writer, max_rows) = self.writer_and_limit().await?;
        let classes = self.repo.list_classes().await?;
        let rolls = self.repo.existing_roll_numbers().await?;
        Ok(ImportPipeline::new(
            StudentImportProfile::new(classes, rolls),
            writer,
            max_rows,
        ))
    }

    async fn class_pipeline(&self) -> ApiResult<ImportPipeline<ClassImportProfile>> {
        let (writer, max_rows) = self.writer_and_limit().await?;
        let classes = self.repo.list_classes().await?;
        Ok(ImportPipeline::new(
            ClassImportProfile::new(classes),
            writer,
            max_rows,
        ))
    }
}

fn report<P: ImportProfile>(
    profile: &P,
    validation: &ValidationResult,
    selected_rows: &[usize],
    written: usize,
) -> ImportReport {
    let skipped_rows: Vec<usize> = selected_rows
        .iter()
        .copied()
        .filter(|row| !validation.valid_records.iter().any(|r| r.row_num == *row))
        .collect();
    if !skipped_rows.is_empty() {
        warn!(entity = profile.entity_name(), skipped = ?skipped_rows, "勾选行未通过校验, 已跳过");
    }
    info!(entity = profile.entity_name(), written = written, "导入完成");

    ImportReport {
        entity: profile.entity_name().to_string(),
        total_rows: validation.total(),
        written,
        invalid_rows: validation.invalid_records.len(),
        skipped_rows,
    }
}
