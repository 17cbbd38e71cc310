// ==========================================
// Shopify 商品批量导入生成系统 - 命令行入口
// ==========================================
// 子命令: validate（仅预检）/ build（预检 + 生成全部输出文件）
// 退出码: 0 = 通过;2 = 预检发现问题;1 = 其他错误
// ==========================================

use clap::{Parser, Subcommand};
use shopify_import_gen::api::{ApiError, BuildRequest, CatalogApi};
use shopify_import_gen::config::AppConfig;
use shopify_import_gen::domain::product::ProductStatus;
use shopify_import_gen::{logging, validator};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "shopify-import-gen", version, about = "表格转 Shopify 批量导入文件")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 仅运行预检规则(101-112)并打印报告
    Validate {
        /// 输入表格（.csv / .xlsx / .xls / .xlsm）
        #[arg(long)]
        input: PathBuf,

        /// Excel 工作表名（缺省 Products）
        #[arg(long)]
        sheet: Option<String>,

        /// 历史导出文件（SKU 种子 + 标题重复基准）
        #[arg(long)]
        prev: Option<PathBuf>,

        /// 离线模式: 图片仅做扩展名检查,不触网
        #[arg(long)]
        offline: bool,
    },

    /// 预检通过后生成全部导入文件
    Build {
        /// 输入表格（.csv / .xlsx / .xls / .xlsm）
        #[arg(long)]
        input: PathBuf,

        /// Excel 工作表名（缺省 Products）
        #[arg(long)]
        sheet: Option<String>,

        /// 输出目录（不存在则创建）
        #[arg(long)]
        outdir: PathBuf,

        /// 历史导出文件（SKU 种子 + 标题重复基准）
        #[arg(long)]
        prev: Option<PathBuf>,

        /// 保留输入表已有 SKU,仅填空槽
        #[arg(long)]
        respect_existing_skus: bool,

        /// 仅剩 101（破图）时仍放行构建,受影响商品降级 draft
        #[arg(long)]
        proceed_despite_broken_images: bool,

        /// 构建级状态覆盖
        #[arg(long, value_parser = ["active", "draft"])]
        status: Option<String>,

        /// 离线模式: 图片仅做扩展名检查,不触网
        #[arg(long)]
        offline: bool,

        /// 显式 SKU 起始基数（优先于配置与历史导出种子）
        #[arg(long)]
        start_base: Option<u32>,

        /// 配置文件路径（缺省取平台配置目录）
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    logging::init();
    let cli = Cli::parse();
    let exit_code = run(cli).await;
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> i32 {
    match cli.command {
        Command::Validate {
            input,
            sheet,
            prev,
            offline,
        } => {
            let mut config = AppConfig::resolve(None);
            if let Some(sheet) = sheet {
                config.sheet_name = sheet;
            }
            let api = CatalogApi::new(config, offline);
            let report = api.validate(&input, prev.as_deref()).await;
            println!("{}", validator::render_report(&report));
            if report.is_clean() {
                0
            } else {
                2
            }
        }

        Command::Build {
            input,
            sheet,
            outdir,
            prev,
            respect_existing_skus,
            proceed_despite_broken_images,
            status,
            offline,
            start_base,
            config,
        } => {
            let mut config = AppConfig::resolve(config.as_deref());
            if let Some(sheet) = sheet {
                config.sheet_name = sheet;
            }
            let api = CatalogApi::new(config, offline);

            // Ctrl-C → 取消令牌,商品间干净停机
            let cancel = api.cancellation_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });

            let request = BuildRequest {
                respect_existing_skus,
                proceed_despite_broken_images,
                status_override: status.as_deref().and_then(ProductStatus::parse),
                start_base_override: start_base,
            };

            match api.build(&input, prev.as_deref(), &outdir, &request).await {
                Ok(summary) => {
                    println!("Build complete.");
                    println!("- Shopify CSV       : {}", summary.import_csv.display());
                    println!("- Shopify inventory : {}", summary.inventory_csv.display());
                    println!("- Validation report : {}", summary.validation_csv.display());
                    println!("- Image report      : {}", summary.image_report_csv.display());
                    if let Some(path) = &summary.title_matches_csv {
                        println!("- Title matches     : {}", path.display());
                    }
                    println!(
                        "- Input with SKUs   : {}",
                        summary.input_with_skus_csv.display()
                    );
                    info!(
                        products = summary.outcome.counters.products,
                        rows = summary.outcome.counters.rows,
                        "构建成功"
                    );
                    0
                }
                Err(ApiError::ValidationBlocked { report, .. }) => {
                    println!("{}", validator::render_report(&report));
                    error!("预检未通过,构建被阻断");
                    2
                }
                Err(e) => {
                    error!(error = %e, "构建失败");
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
    }
}
