// apps/nk_cli/src/commands/validate.rs

//! 配置验证命令
//!
//! 验证运行配置与外力文件，并检查两者是否匹配。

use anyhow::{bail, Result};
use clap::Args;
use nk_config::RunConfig;
use nk_io::{JsonForcingFile, RecordSource};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 外力文件路径 (JSON)
    #[arg(short, long)]
    pub forcing: Option<PathBuf>,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

/// 验证结果
#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn is_ok_strict(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== Nunatak 配置验证 ===");

    if args.config.is_none() && args.forcing.is_none() {
        println!("用法: nk_cli validate --config <配置文件> [--forcing <外力文件>]");
        println!("      nk_cli validate --forcing <外力文件>");
        return Ok(());
    }

    let mut result = ValidationResult::default();

    let config = args
        .config
        .as_deref()
        .and_then(|path| validate_config(path, &mut result));

    let forcing = args
        .forcing
        .as_deref()
        .and_then(|path| validate_forcing(path, &mut result));

    if let (Some(config), Some(forcing)) = (&config, &forcing) {
        check_buffer_size(config, forcing, &mut result);
    }

    print_validation_result(&result, args.strict)
}

fn validate_config(path: &Path, result: &mut ValidationResult) -> Option<RunConfig> {
    println!("\n检查配置文件: {}", path.display());

    let config = match RunConfig::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            result.add_error(format!("配置无效: {e}"));
            return None;
        }
    };

    let ts = &config.time_stepping;
    let run_years = config.time.end_year - config.time.start_year;
    if ts.maximum_time_step_years > run_years {
        result.add_warning(format!(
            "最大时间步长 {} 年超过运行长度 {} 年",
            ts.maximum_time_step_years, run_years
        ));
    }
    if ts.hit_multiples_years > 0 && f64::from(ts.hit_multiples_years) > run_years {
        result.add_warning(format!(
            "命中整倍数间隔 {} 年超过运行长度, 不会生效",
            ts.hit_multiples_years
        ));
    }
    if ts.skip.enabled && ts.skip.max > 50 {
        result.add_warning(format!("最大跳步数 {} 过大, 可能影响精度", ts.skip.max));
    }
    for &y in &config.reporting.times_years {
        if y < config.time.start_year || y > config.time.end_year {
            result.add_warning(format!("报告时刻 {y} 年不在运行区间内"));
        }
    }

    println!("  ✓ 配置文件有效");
    Some(config)
}

fn validate_forcing(path: &Path, result: &mut ValidationResult) -> Option<JsonForcingFile> {
    println!("\n检查外力文件: {}", path.display());

    let file = match JsonForcingFile::open(path) {
        Ok(f) => f,
        Err(e) => {
            result.add_error(format!("外力文件无效: {e}"));
            return None;
        }
    };

    if file.variable_names().is_empty() {
        result.add_warning("外力文件不包含任何变量");
    }
    for name in file.variable_names() {
        match file.record_axis(name) {
            Ok(Some(axis)) => {
                if axis.times.windows(2).any(|w| w[1] <= w[0]) {
                    result.add_error(format!("变量 {name} 的记录时间不是严格递增"));
                }
            }
            Ok(None) => {}
            Err(e) => result.add_error(format!("变量 {name}: {e}")),
        }
    }

    println!("  ✓ 外力文件格式有效");
    Some(file)
}

/// 周期外力需要整个序列驻留
fn check_buffer_size(config: &RunConfig, file: &JsonForcingFile, result: &mut ValidationResult) {
    if !config.forcing.periodic {
        return;
    }
    for name in file.variable_names() {
        let n = file.n_records(name).unwrap_or(0);
        if n > config.forcing.buffer_size {
            result.add_error(format!(
                "周期变量 {name} 有 {n} 条记录, 超过缓冲容量 {}",
                config.forcing.buffer_size
            ));
        }
    }
}

fn print_validation_result(result: &ValidationResult, strict: bool) -> Result<()> {
    println!("\n=== 验证结果 ===");

    if !result.errors.is_empty() {
        println!("\n错误 ({}):", result.errors.len());
        for err in &result.errors {
            error!("  ✗ {}", err);
            println!("  ✗ {}", err);
        }
    }

    if !result.warnings.is_empty() {
        println!("\n警告 ({}):", result.warnings.len());
        for warning in &result.warnings {
            warn!("  ⚠ {}", warning);
            println!("  ⚠ {}", warning);
        }
    }

    let success = if strict {
        result.is_ok_strict()
    } else {
        result.is_ok()
    };

    if success {
        println!("\n✓ 验证通过");
        Ok(())
    } else {
        println!("\n✗ 验证失败");
        bail!(
            "验证失败：发现 {} 个错误，{} 个警告",
            result.errors.len(),
            result.warnings.len()
        )
    }
}
