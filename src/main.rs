// ==========================================
// 报关单生成系统 - 命令行入口
// ==========================================
// 子命令: convert（完整转换）/ merge（仅合并）
// 退出码: 0 成功（告警打印到 stderr），非 0 致命错误
// ==========================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use customs_sheet::config::ConfigManager;
use customs_sheet::merge::WorkbookMerger;
use customs_sheet::pipeline::{ConversionInputs, ConversionPipeline};
use customs_sheet::{logging, APP_NAME, VERSION};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "customs-sheet", version, about = "商业发票 → 出口报关单工作簿")]
struct Cli {
    /// 配置文件（JSON，缺省依次查找 CUSTOMS_SHEET_CONFIG 与用户配置目录）
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 以 JSON 输出结果
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 生成报关单明细，并可选填充模板与合并
    Convert {
        /// 商业发票/装箱单工作簿
        #[arg(long)]
        invoice: PathBuf,

        /// 申报要素参照表
        #[arg(long)]
        reference: PathBuf,

        /// 政策费率表
        #[arg(long)]
        policy: PathBuf,

        /// 报关单明细输出路径
        #[arg(long)]
        output: PathBuf,

        /// 装箱单工作簿（缺省取发票工作簿）
        #[arg(long)]
        packing_list: Option<PathBuf>,

        /// 表头模板
        #[arg(long)]
        header_template: Option<PathBuf>,

        /// 合计模板
        #[arg(long)]
        totals_template: Option<PathBuf>,

        /// 合并输出路径
        #[arg(long)]
        merged: Option<PathBuf>,

        /// 保留填充后模板的目录
        #[arg(long, value_name = "DIR")]
        keep_intermediates: Option<PathBuf>,
    },

    /// 按顺序纵向合并工作簿
    Merge {
        /// 待合并工作簿（按顺序）
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// 输出路径
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.json);
    tracing::info!("{} v{}", APP_NAME, VERSION);

    let config = ConfigManager::load(cli.config.as_deref()).context("配置加载失败")?;

    match cli.command {
        Command::Convert {
            invoice,
            reference,
            policy,
            output,
            packing_list,
            header_template,
            totals_template,
            merged,
            keep_intermediates,
        } => {
            let inputs = ConversionInputs {
                invoice,
                reference,
                policy,
                declaration_output: output,
                packing_list,
                header_template,
                totals_template,
                merged_output: merged,
                intermediates_dir: keep_intermediates,
            };
            let outcome = ConversionPipeline::new(config)
                .run(&inputs)
                .context("报关单转换失败")?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                for warning in &outcome.warnings {
                    eprintln!("警告: {}", warning);
                }
                println!("运行编号: {}", outcome.run_id);
                println!("明细行数: {}", outcome.records.len());
                println!("总货值: {}", outcome.totals.total_amount);
                println!("总净重: {}", outcome.totals.total_net_weight);
                println!("运费（CNY): {}", outcome.totals.freight);
                println!("保费（CNY): {}", outcome.totals.insurance);
                println!("报关单: {}", outcome.declaration_path.display());
                if let Some(report) = &outcome.merge {
                    println!("合并结果: {} ({} 行)", report.output.display(), report.total_rows);
                }
            }
        }
        Command::Merge { sources, output } => {
            let report = WorkbookMerger::new(config.merge)
                .merge(&sources, &output)
                .context("工作簿合并失败")?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for source in &report.sources {
                    println!(
                        "{}: 起始偏移 {} 行, {} 行, 合并区域 {} (跳过 {}), 图片 {}",
                        source.path.display(),
                        source.row_offset,
                        source.rows,
                        source.merged_ranges,
                        source.skipped_ranges,
                        source.images
                    );
                }
                println!("合并结果: {} ({} 行)", report.output.display(), report.total_rows);
            }
        }
    }
    Ok(())
}
