// ==========================================
// 学校教务管理系统 - 分块写入器
// ==========================================
// 职责: 将已选记录按固定块大小顺序写入, 每块完成后上报进度
// 并发: 严格串行, 同一时刻最多一个块在写（限制后端负载, 进度单调有序）
// 失败策略: fail-fast / 不重试 / 不回滚
//   - 某块写入失败: 立即停止, 已写入的块保持提交, 剩余块不再尝试
//   - 失败以 ChunkedWriteOutcome::PartiallyCommitted 显式返回, 原始错误原样携带
// ==========================================

use crate::domain::import::{ChunkedWriteOutcome, ImportProgress};
use crate::importer::error::{ImportError, ImportResult};
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkedWriter {
    chunk_size: usize,
}

impl ChunkedWriter {
    /// 创建分块写入器
    ///
    /// # 参数
    /// - chunk_size: 块大小（必须 > 0）
    pub fn new(chunk_size: usize) -> ImportResult<Self> {
        if chunk_size == 0 {
            return Err(ImportError::InvalidChunkSize(chunk_size));
        }
        Ok(Self { chunk_size })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// 记录数对应的块数: ceil(n / chunk_size)
    pub fn chunk_count(&self, total: usize) -> usize {
        total.div_ceil(self.chunk_size)
    }

    /// 分块导入
    ///
    /// # 参数
    /// - records: 待写入记录（保持顺序）
    /// - write_fn: 写入一个块; 返回 Err 即视为整块失败
    /// - on_progress: 每个块成功后调用一次, processed 为累计值, errors 恒为空
    ///
    /// # 返回
    /// - Completed { written }: 全部写入
    /// - PartiallyCommitted { .. }: 第一个失败块及之前已提交的数量
    pub async fn import_in_chunks<T, F, Fut, E, P>(
        &self,
        records: Vec<T>,
        mut write_fn: F,
        mut on_progress: P,
    ) -> ChunkedWriteOutcome<E>
    where
        F: FnMut(Vec<T>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
        P: FnMut(ImportProgress),
    {
        let total = records.len();
        let chunk_total = self.chunk_count(total);
        info!(
            total = total,
            chunk_size = self.chunk_size,
            chunks = chunk_total,
            "开始分块写入"
        );

        let mut iter = records.into_iter();
        let mut processed = 0usize;
        let mut chunk_index = 0usize;

        loop {
            let chunk: Vec<T> = iter.by_ref().take(self.chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            let chunk_len = chunk.len();

            match write_fn(chunk).await {
                Ok(()) => {
                    processed += chunk_len;
                    debug!(
                        chunk = chunk_index + 1,
                        chunks = chunk_total,
                        processed = processed,
                        "块写入完成"
                    );
                    on_progress(ImportProgress {
                        processed,
                        total,
                        errors: Vec::new(),
                    });
                }
                Err(error) => {
                    warn!(
                        chunk = chunk_index + 1,
                        committed = processed,
                        remaining = total - processed,
                        error = %error,
                        "块写入失败, 停止后续写入（已提交的块不回滚）"
                    );
                    return ChunkedWriteOutcome::PartiallyCommitted {
                        committed: processed,
                        remaining: total - processed,
                        failed_chunk: chunk_index,
                        error,
                    };
                }
            }

            chunk_index += 1;
        }

        info!(written = processed, "分块写入完成");
        ChunkedWriteOutcome::Completed { written: processed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(matches!(
            ChunkedWriter::new(0),
            Err(ImportError::InvalidChunkSize(0))
        ));
    }

    #[test]
    fn test_chunk_count() {
        let writer = ChunkedWriter::new(3).unwrap();
        assert_eq!(writer.chunk_count(0), 0);
        assert_eq!(writer.chunk_count(3), 1);
        assert_eq!(writer.chunk_count(7), 3);
    }

    #[tokio::test]
    async fn test_progress_is_cumulative_and_complete() {
        let writer = ChunkedWriter::new(3).unwrap();
        let written = RefCell::new(Vec::new());
        let mut progress = Vec::new();

        let outcome = writer
            .import_in_chunks(
                (1..=7).collect::<Vec<i32>>(),
                |chunk| {
                    written.borrow_mut().push(chunk);
                    async { Ok::<(), String>(()) }
                },
                |p| progress.push(p),
            )
            .await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.committed(), 7);
        assert_eq!(
            written.into_inner(),
            vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]
        );
        let processed: Vec<usize> = progress.iter().map(|p| p.processed).collect();
        assert_eq!(processed, vec![3, 6, 7]);
        assert!(progress.iter().all(|p| p.total == 7 && p.errors.is_empty()));
    }

    #[tokio::test]
    async fn test_empty_input_writes_nothing() {
        let writer = ChunkedWriter::new(5).unwrap();
        let mut calls = 0;
        let mut progress_calls = 0;

        let outcome = writer
            .import_in_chunks(
                Vec::<i32>::new(),
                |_chunk| {
                    calls += 1;
                    async { Ok::<(), String>(()) }
                },
                |_p| progress_calls += 1,
            )
            .await;

        assert_eq!(outcome.into_result(), Ok(0));
        assert_eq!(calls, 0);
        assert_eq!(progress_calls, 0);
    }

    #[tokio::test]
    async fn test_fail_fast_stops_remaining_chunks() {
        let writer = ChunkedWriter::new(2).unwrap();
        let attempted = RefCell::new(Vec::new());
        let mut progress = Vec::new();

        let outcome = writer
            .import_in_chunks(
                vec!["a", "b", "c", "d", "e", "f"],
                |chunk| {
                    let fail = chunk.contains(&"c");
                    attempted.borrow_mut().push(chunk);
                    async move {
                        if fail {
                            Err("backend rejected chunk".to_string())
                        } else {
                            Ok(())
                        }
                    }
                },
                |p| progress.push(p.processed),
            )
            .await;

        match outcome {
            ChunkedWriteOutcome::PartiallyCommitted {
                committed,
                remaining,
                failed_chunk,
                error,
            } => {
                assert_eq!(committed, 2);
                assert_eq!(remaining, 4);
                assert_eq!(failed_chunk, 1);
                assert_eq!(error, "backend rejected chunk");
            }
            other => panic!("expected partial commit, got {:?}", other),
        }
        // 第三块从未尝试
        assert_eq!(attempted.into_inner().len(), 2);
        assert_eq!(progress, vec![2]);
    }
}
