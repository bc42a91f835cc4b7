// ==========================================
// 工艺主数据目录 - 命令行入口
// ==========================================
// 职责: 项目管理、主数据合并/导入、各类导出
// 输出: 导出内容写入 --out 指定文件，未指定时写到 stdout
// ==========================================

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use phase_catalog::app::commands;
use phase_catalog::config::{env_keys, CatalogConfig};
use phase_catalog::{logging, AppState, PhaseFilter};

#[derive(Parser, Debug)]
#[command(name = "phase-catalog", author, version, about = "工艺主数据目录", long_about = None)]
struct Cli {
    /// JSON 配置文件
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 项目数据库目录（覆盖配置）
    #[arg(long, global = true, env = env_keys::DATA_DIR)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// 按区域 id 过滤
    #[arg(long)]
    area_id: Option<i64>,

    /// 按单元 id 过滤
    #[arg(long)]
    unit_id: Option<i64>,

    /// 按 Phase 类型过滤
    #[arg(long)]
    phase_type: Option<String>,
}

impl From<FilterArgs> for PhaseFilter {
    fn from(args: FilterArgs) -> Self {
        PhaseFilter {
            area_id: args.area_id,
            unit_id: args.unit_id,
            phase_type: args.phase_type.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 创建项目（模板库存在时复制模板）
    Create { name: String },

    /// 列出项目
    List,

    /// 删除项目
    Delete { name: String },

    /// 合并主数据工作簿（仅插入缺失行）
    Merge { project: String, file: PathBuf },

    /// 全量导入主数据工作簿（清空后合并）
    Import { project: String, file: PathBuf },

    /// 导出主数据工作簿（xlsx；指定 --sheet 时导出该表 csv）
    ExportMaster {
        project: String,
        #[arg(long)]
        sheet: Option<String>,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// 导出过程列表 CSV
    ExportProcedures {
        project: String,
        /// 步骤翻译 XML 根路径
        #[arg(long)]
        root: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// 导出参数 CSV
    ExportParameters {
        project: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// 导出联锁 CSV
    ExportInterlocks {
        project: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// 导出转换条件 CSV
    ExportTransitions {
        project: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// 导出步骤翻译（指定 --phase-id 时输出单个 XML，否则 ZIP）
    ExportSteps {
        project: String,
        #[arg(long)]
        phase_id: Option<i64>,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn load_config(cli: &Cli) -> Result<CatalogConfig> {
    let mut config = match &cli.config {
        Some(path) => CatalogConfig::from_json_file(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?,
        None => CatalogConfig::from_env().context("读取环境变量配置失败")?,
    };
    if let Some(dir) = &cli.data_dir {
        config.database_folder = dir.clone();
    }
    Ok(config)
}

fn write_output(out: Option<PathBuf>, bytes: &[u8]) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(&path, bytes)
                .with_context(|| format!("写出文件失败: {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = bytes.len(), "导出完成");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

async fn run(state: &AppState, command: Command) -> Result<()> {
    match command {
        Command::Create { name } => {
            let path = commands::create_project(state, &name).await?;
            println!("{}", path.display());
        }
        Command::List => {
            for name in commands::list_projects(state).await? {
                println!("{}", name);
            }
        }
        Command::Delete { name } => {
            commands::delete_project(state, &name).await?;
        }
        Command::Merge { project, file } => {
            let summary = commands::merge_file(state, &project, file).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Import { project, file } => {
            let summary = commands::import_file(state, &project, file).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::ExportMaster { project, sheet, out } => {
            let bytes = match sheet {
                Some(sheet) => commands::export_master_csv(state, &project, &sheet).await?,
                None => commands::export_master_xlsx(state, &project).await?,
            };
            write_output(out, &bytes)?;
        }
        Command::ExportProcedures {
            project,
            root,
            filter,
            out,
        } => {
            let bytes =
                commands::export_procedures_csv(state, &project, filter.into(), &root).await?;
            write_output(out, &bytes)?;
        }
        Command::ExportParameters {
            project,
            filter,
            out,
        } => {
            let bytes = commands::export_parameters_csv(state, &project, filter.into()).await?;
            write_output(out, &bytes)?;
        }
        Command::ExportInterlocks {
            project,
            filter,
            out,
        } => {
            let bytes = commands::export_interlocks_csv(state, &project, filter.into()).await?;
            write_output(out, &bytes)?;
        }
        Command::ExportTransitions {
            project,
            filter,
            out,
        } => {
            let bytes = commands::export_transitions_csv(state, &project, filter.into()).await?;
            write_output(out, &bytes)?;
        }
        Command::ExportSteps {
            project,
            phase_id,
            filter,
            out,
        } => {
            let bytes = match phase_id {
                Some(id) => commands::export_steps_xml(state, &project, id).await?,
                None => commands::export_steps_zip(state, &project, filter.into()).await?,
            };
            write_output(out, &bytes)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init();

    tracing::info!(version = phase_catalog::VERSION, "{}", phase_catalog::APP_NAME);

    let config = load_config(&cli)?;
    let state = AppState::new(config);

    let result = run(&state, cli.command).await;
    if let Err(e) = state.shutdown() {
        tracing::warn!(error = %e, "释放项目连接失败");
    }
    result
}
