// ==========================================
// 学校教务管理系统 - 命令行入口
// ==========================================
// 命令: import-students / import-classes / template / promote / balance / config
// 输出: 结果以 JSON 打印到 stdout, 日志写 stderr
// ==========================================

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use school_admin::app::{get_default_db_path, AppState};
use school_admin::domain::{
    CapabilityOverrides, CapabilitySet, ClassId, ImportProgress, ImportTemplate, PromotionPreview,
    Role, StudentId,
};
use school_admin::engine::ExemptionSet;
use school_admin::importer::CsvParser;
use school_admin::{logging, APP_NAME, VERSION};

/// 学校教务管理系统: 批量导入 / 升班 / 欠费查询
#[derive(Parser, Debug)]
#[command(name = "school-admin")]
#[command(version, about, long_about = None)]
struct Cli {
    /// 数据库文件路径（默认: 用户数据目录）
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// 以哪个角色执行
    #[arg(long, value_enum, global = true, default_value = "admin")]
    role: CliRole,

    /// 日志以 JSON 行输出
    #[arg(long, global = true)]
    json_log: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 从 CSV 导入学生
    ImportStudents(ImportArgs),

    /// 从 CSV 导入班级
    ImportClasses(ImportArgs),

    /// 打印导入模板（CSV）
    Template {
        #[arg(value_enum)]
        entity: TemplateEntity,
    },

    /// 升班: 预览计划, 可指定豁免学生后确认
    Promote {
        /// 豁免学生 ID（可重复）
        #[arg(long = "exempt")]
        exempt: Vec<StudentId>,

        /// 整班豁免的班级 ID（可重复）
        #[arg(long = "exempt-class")]
        exempt_class: Vec<ClassId>,

        /// 只预览, 不写入
        #[arg(long)]
        dry_run: bool,
    },

    /// 查询学生欠费余额
    Balance {
        student_id: String,

        /// 同时输出逐单滚动台账
        #[arg(long)]
        ledger: bool,
    },

    /// 查看 / 修改系统设置
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// 列出全部设置（存储值与生效值）
    Show,

    /// 修改单个设置
    Set { key: String, value: String },
}

#[derive(clap::Args, Debug)]
struct ImportArgs {
    /// CSV 文件路径
    file: PathBuf,

    /// 只写入这些行号（默认: 全部有效行）
    #[arg(long, value_delimiter = ',')]
    rows: Vec<usize>,

    /// 只校验, 不写入
    #[arg(long)]
    dry_run: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliRole {
    SuperAdmin,
    Admin,
    Principal,
    Accountant,
    Teacher,
    Clerk,
}

impl From<CliRole> for Role {
    fn from(role: CliRole) -> Self {
        match role {
            CliRole::SuperAdmin => Role::SuperAdmin,
            CliRole::Admin => Role::Admin,
            CliRole::Principal => Role::Principal,
            CliRole::Accountant => Role::Accountant,
            CliRole::Teacher => Role::Teacher,
            CliRole::Clerk => Role::Clerk,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TemplateEntity {
    Students,
    Classes,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn log_progress(progress: ImportProgress) {
    info!(processed = progress.processed, total = progress.total, "写入进度");
}

fn print_template(template: &ImportTemplate) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(&template.headers)?;
    for row in &template.sample_rows {
        let cells: Vec<&str> = template
            .headers
            .iter()
            .map(|h| row.get(h).map(String::as_str).unwrap_or(""))
            .collect();
        writer.write_record(&cells)?;
    }
    writer.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.json_log {
        logging::init_json();
    } else {
        logging::init();
    }
    info!(app = APP_NAME, version = VERSION, "启动");

    let db_path = cli
        .db
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(get_default_db_path);
    let state = AppState::new(db_path).map_err(|e| anyhow!("无法初始化数据库: {}", e))?;

    // 权限集合每次调用解析一次
    let caps = CapabilitySet::resolve(cli.role.into(), &CapabilityOverrides::default());

    match cli.command {
        Command::ImportStudents(args) => {
            let records = CsvParser
                .parse_path(&args.file)
                .with_context(|| format!("读取 {} 失败", args.file.display()))?;
            let preview = state.import_api.preview_students(&caps, &records).await?;
            if args.dry_run {
                return print_json(&preview);
            }
            let rows = selected_rows(&args.rows, &preview);
            let report = state
                .import_api
                .import_students(&caps, &records, &rows, log_progress)
                .await?;
            print_json(&report)?;
        }
        Command::ImportClasses(args) => {
            let records = CsvParser
                .parse_path(&args.file)
                .with_context(|| format!("读取 {} 失败", args.file.display()))?;
            let preview = state.import_api.preview_classes(&caps, &records).await?;
            if args.dry_run {
                return print_json(&preview);
            }
            let rows = selected_rows(&args.rows, &preview);
            let report = state
                .import_api
                .import_classes(&caps, &records, &rows, log_progress)
                .await?;
            print_json(&report)?;
        }
        Command::Template { entity } => {
            let template = match entity {
                TemplateEntity::Students => state.import_api.student_template(),
                TemplateEntity::Classes => state.import_api.class_template(),
            };
            print_template(&template)?;
        }
        Command::Promote {
            exempt,
            exempt_class,
            dry_run,
        } => {
            let preview = state.promotion_api.preview(&caps).await?;
            let students = match &preview {
                PromotionPreview::NothingToPromote { message } => {
                    println!("{}", message);
                    return Ok(());
                }
                PromotionPreview::Ready { students, .. } => students,
            };

            // 豁免按学生当前班级分组
            let mut by_class: HashMap<String, Vec<StudentId>> = HashMap::new();
            for id in &exempt {
                let student = students
                    .iter()
                    .find(|s| &s.id == id)
                    .ok_or_else(|| anyhow!("学生 {} 不存在", id))?;
                by_class
                    .entry(student.class_id.clone())
                    .or_default()
                    .push(id.clone());
            }
            let mut exemptions = ExemptionSet::new();
            for (class_id, ids) in &by_class {
                state
                    .promotion_api
                    .save_exemptions(&caps, &preview, &mut exemptions, class_id, ids)?;
            }
            // 整班豁免覆盖该班的逐人选择
            for class_id in &exempt_class {
                let count = state
                    .promotion_api
                    .exempt_whole_class(&caps, &preview, &mut exemptions, class_id)?;
                info!(class_id = %class_id, exempted = count, "整班豁免");
            }

            if dry_run {
                return print_json(&preview);
            }
            let summary = state
                .promotion_api
                .confirm(&caps, &preview, &exemptions, log_progress)
                .await?;
            print_json(&summary)?;
        }
        Command::Balance { student_id, ledger } => {
            if ledger {
                let view = state.ledger_api.student_ledger(&caps, &student_id).await?;
                print_json(&view)?;
            } else {
                let balance = state.ledger_api.student_balance(&caps, &student_id).await?;
                println!("{:.2}", balance);
            }
        }
        Command::Config(ConfigCommand::Show) => {
            let items = state.settings_api.list_settings(&caps).await?;
            print_json(&items)?;
        }
        Command::Config(ConfigCommand::Set { key, value }) => {
            state.settings_api.update_setting(&caps, &key, &value)?;
            let items = state.settings_api.list_settings(&caps).await?;
            print_json(&items)?;
        }
    }

    Ok(())
}

/// 未指定行号时选中全部有效行
fn selected_rows(rows: &[usize], preview: &school_admin::ValidationResult) -> Vec<usize> {
    if rows.is_empty() {
        preview.valid_records.iter().map(|r| r.row_num).collect()
    } else {
        rows.to_vec()
    }
}
