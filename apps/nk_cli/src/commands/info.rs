// apps/nk_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 显示默认配置与外力文件内容概要。

use anyhow::{Context, Result};
use clap::Args;
use nk_config::RunConfig;
use nk_foundation::Calendar;
use nk_io::{JsonForcingFile, RecordSource};
use std::path::PathBuf;
use tracing::info;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 外力文件路径 (JSON)
    #[arg(short, long)]
    pub forcing: Option<PathBuf>,

    /// 显示默认配置
    #[arg(long)]
    pub defaults: bool,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== Nunatak 信息 ===");

    if args.defaults || args.forcing.is_none() {
        print_default_config()?;
    }

    if let Some(path) = &args.forcing {
        let file = JsonForcingFile::open(path)
            .with_context(|| format!("打开外力文件失败: {}", path.display()))?;
        print_forcing(&file)?;
    }

    Ok(())
}

fn print_default_config() -> Result<()> {
    println!("=== 默认配置 ===");
    let text = RunConfig::default().to_json_string()?;
    println!("{text}");
    Ok(())
}

fn print_forcing(file: &JsonForcingFile) -> Result<()> {
    let cal = Calendar::default();
    let grid = file.grid();

    println!("=== 外力文件 ===");
    println!("路径: {}", file.path().display());
    println!("网格: {} x {}, dx = {} m, dy = {} m", grid.nx, grid.ny, grid.dx, grid.dy);

    println!("\n变量:");
    for name in file.variable_names() {
        let n = file.n_records(name).unwrap_or(0);
        match file.record_axis(name)? {
            Some(axis) if !axis.times.is_empty() => {
                let first = axis.times[0];
                let last = axis.times[axis.times.len() - 1];
                println!(
                    "  {name}: {n} 条记录, {} .. {}{}",
                    cal.date(first),
                    cal.date(last),
                    if axis.bounds.is_some() { ", 带时间边界" } else { "" }
                );
            }
            _ => println!("  {name}: {n} 条记录, 无时间维"),
        }
    }
    Ok(())
}
