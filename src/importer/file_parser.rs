// ==========================================
// 学校教务管理系统 - CSV 文件解析器
// ==========================================
// 职责: CSV → Vec<RawRecord>（表头 TRIM, 保持行顺序）
// 说明: 解析本身属于外部协作方, 核心只接收 RawRecord 序列
// ==========================================

use crate::domain::import::RawRecord;
use crate::importer::error::{ImportError, ImportResult};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

pub struct CsvParser;

impl CsvParser {
    pub fn parse_path<P: AsRef<Path>>(&self, path: P) -> ImportResult<Vec<RawRecord>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let file = std::fs::File::open(path)?;
        let records = self.parse_reader(file)?;
        info!(file = %path.display(), rows = records.len(), "CSV 解析完成");
        Ok(records)
    }

    /// 解析 CSV
    ///
    /// - 每条记录都带全部表头键, 短行缺失的单元格为 ""
    /// - 行内单元格全为空白的行保留（行号与表格中看到的一致）,
    ///   只丢弃文件末尾的空白行
    /// - 长度为 0 的空行由 csv 读取器直接忽略, 不计入行号
    pub fn parse_reader<R: Read>(&self, reader: R) -> ImportResult<Vec<RawRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();
        debug!(headers = ?headers, "CSV 表头");

        let mut records = Vec::new();
        // 最后一个非空白行之后的记录数
        let mut trailing_blank = 0usize;
        for result in reader.records() {
            let row = result?;
            if row.iter().all(|cell| cell.trim().is_empty()) {
                trailing_blank += 1;
            } else {
                trailing_blank = 0;
            }
            let record: RawRecord = headers
                .iter()
                .enumerate()
                .map(|(idx, header)| (header.clone(), row.get(idx).unwrap_or("").to_string()))
                .collect();
            records.push(record);
        }
        records.truncate(records.len() - trailing_blank);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reader_headers_trimmed() {
        let data = "\u{feff}name , roll_number,class\nAli,R1,Class 1\nSara,R2\n,,\n , ,\n";
        let records = CsvParser.parse_reader(data.as_bytes()).unwrap();

        // 末尾空白行丢弃
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], "Ali");
        assert_eq!(records[0]["class"], "Class 1");
        // 短行: 缺失列为空字符串
        assert_eq!(records[1]["class"], "");
    }

    #[test]
    fn test_interior_blank_rows_keep_line_numbers() {
        let data = "name\nA\n,\nB\n,\n";
        let records = CsvParser.parse_reader(data.as_bytes()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[1]["name"], "");
        // B 位于表格第 4 行 = 下标 2 + 2
        assert_eq!(records[2]["name"], "B");
    }
}
