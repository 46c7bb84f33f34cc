// ==========================================
// 学校教务管理系统 - 通用表格导入流水线
// ==========================================
// 流程: 结构检查 → 逐行校验 → （调用方勾选）→ 构建领域对象 → 分块写入
// 错误分级:
//   - 结构错误（空输入 / 缺表头 / 超行数）: 整次失败, 先于逐行校验
//   - 逐行校验失败: 记录在 invalid_records, 不中断
//   - 写入失败: 剩余块不再写入, 已写入块保留
// ==========================================

use crate::domain::import::{
    AcceptedRecord, ChunkedWriteOutcome, ImportProgress, ImportTemplate, RawRecord,
    ValidationResult,
};
use crate::engine::chunked_writer::ChunkedWriter;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::profile::ImportProfile;
use crate::importer::validator::Validator;
use std::fmt::Display;
use std::future::Future;
use tracing::{info, instrument, warn};

pub struct ImportPipeline<P: ImportProfile> {
    profile: P,
    writer: ChunkedWriter,
    max_rows: usize,
}

impl<P: ImportProfile> ImportPipeline<P> {
    pub fn new(profile: P, writer: ChunkedWriter, max_rows: usize) -> Self {
        Self {
            profile,
            writer,
            max_rows,
        }
    }

    pub fn profile(&self) -> &P {
        &self.profile
    }

    pub fn template(&self) -> ImportTemplate {
        self.profile.template()
    }

    /// 文件结构检查（只看第一条记录的列名）
    pub fn check_structure(&self, records: &[RawRecord]) -> ImportResult<()> {
        let first = records.first().ok_or(ImportError::EmptyInput)?;

        if records.len() > self.max_rows {
            return Err(ImportError::TooManyRows {
                rows: records.len(),
                max: self.max_rows,
            });
        }

        let missing: Vec<String> = self
            .profile
            .required_headers()
            .into_iter()
            .filter(|h| !first.contains_key(h))
            .collect();
        if !missing.is_empty() {
            warn!(entity = self.profile.entity_name(), missing = ?missing, "缺少必需表头");
            return Err(ImportError::MissingHeaders(missing));
        }

        Ok(())
    }

    /// 预览: 结构检查 + 逐行校验（不写入）
    #[instrument(skip_all, fields(entity = self.profile.entity_name(), rows = records.len()))]
    pub fn preview(&self, records: &[RawRecord]) -> ImportResult<ValidationResult> {
        self.check_structure(records)?;
        let validator = Validator::new(self.profile.rules());
        Ok(validator.validate(records))
    }

    /// 写入调用方选中的有效记录
    ///
    /// 领域对象构建失败属于整次失败, 在任何写入之前返回
    #[instrument(skip_all, fields(entity = self.profile.entity_name(), selected = selected.len()))]
    pub async fn write_selected<F, Fut, E, Pr>(
        &self,
        selected: &[AcceptedRecord],
        write_fn: F,
        on_progress: Pr,
    ) -> ImportResult<ChunkedWriteOutcome<E>>
    where
        F: FnMut(Vec<P::Item>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
        Pr: FnMut(ImportProgress),
    {
        let items = selected
            .iter()
            .map(|record| self.profile.build(record))
            .collect::<ImportResult<Vec<_>>>()?;

        let outcome = self
            .writer
            .import_in_chunks(items, write_fn, on_progress)
            .await;

        info!(
            entity = self.profile.entity_name(),
            committed = outcome.committed(),
            complete = outcome.is_complete(),
            "导入写入结束"
        );
        Ok(outcome)
    }
}
