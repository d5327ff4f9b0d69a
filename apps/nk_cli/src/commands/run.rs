// apps/nk_cli/src/commands/run.rs

//! 运行调度演练
//!
//! 不求解物理方程，只用给定的扩散系数、冰流速度与冰崩速率构造限制，
//! 从配置起始时刻推进到结束时刻，逐步刷新外力缓冲并统计时间步决策。

use anyhow::{bail, Context, Result};
use clap::Args;
use nk_config::RunConfig;
use nk_foundation::{BoundaryMask, CellType, CellTypeMask, Grid, ScalarField};
use nk_io::{JsonForcingFile, RecordSource};
use nk_physics::{
    max_timestep_cfl_2d, max_timestep_diffusivity, CflFrontRetreat, FixedRestriction,
    ForcingBuffer, ForcingOptions, FrontGeometry, ReportingSchedule, RetreatMechanism,
    TimeStepper,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// 运行参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 外力文件路径 (JSON)
    #[arg(short, long)]
    pub forcing: Option<PathBuf>,

    /// 只使用这些外力变量（默认全部）
    #[arg(long = "var")]
    pub variables: Vec<String>,

    /// 网格单元数 (x 方向)
    #[arg(long, default_value = "20")]
    pub nx: usize,

    /// 网格单元数 (y 方向)
    #[arg(long, default_value = "20")]
    pub ny: usize,

    /// 网格间距 [m]
    #[arg(long, default_value = "5000.0")]
    pub dx: f64,

    /// 最大扩散系数 [m²/s]
    #[arg(long, default_value = "0.0")]
    pub diffusivity: f64,

    /// 最大冰流速度 [m/a]
    #[arg(long, default_value = "0.0")]
    pub speed: f64,

    /// 冰崩速率 [m/a]
    #[arg(long, default_value = "0.0")]
    pub calving_rate: f64,

    /// 最多推进的步数
    #[arg(long)]
    pub max_steps: Option<usize>,
}

/// 空间均匀的冰崩速率
struct UniformCalving {
    rate: ScalarField,
}

impl RetreatMechanism for UniformCalving {
    fn name(&self) -> &str {
        "uniform calving"
    }

    fn calving_rate(&self) -> &ScalarField {
        &self.rate
    }
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== Nunatak 调度演练 ===");

    let config = RunConfig::from_file(&args.config)
        .with_context(|| format!("加载配置失败: {}", args.config.display()))?;
    let cal = config.calendar();

    // 外力文件决定网格；没有外力文件时使用命令行网格
    let file = match &args.forcing {
        Some(path) => Some(Arc::new(
            JsonForcingFile::open(path)
                .with_context(|| format!("打开外力文件失败: {}", path.display()))?,
        )),
        None => None,
    };
    let grid = match &file {
        Some(f) => f.grid(),
        None => {
            if args.nx == 0 || args.ny == 0 || args.dx.is_nan() || args.dx <= 0.0 {
                bail!("网格参数无效: {} x {}, dx = {}", args.nx, args.ny, args.dx);
            }
            Grid::new(args.nx, args.ny, args.dx, args.dx)
        }
    };
    info!("网格: {} x {}, dx = {} m", grid.nx, grid.ny, grid.dx);

    let buffers = attach_forcing(&config, file, &args.variables, &grid)?;

    // 左半边为浮冰，右半边为海洋
    let mut cells = CellTypeMask::uniform(grid, CellType::IceFreeOcean);
    for j in 0..grid.ny {
        for i in 0..grid.nx.div_ceil(2) {
            cells.set(i, j, CellType::FloatingIce);
        }
    }
    let bc = BoundaryMask::empty(&grid);
    let front = FrontGeometry {
        cell_type: &cells,
        bc_mask: &bc,
    };

    let mut stepper = TimeStepper::from_config(&config);
    {
        let collector = stepper.collector_mut();
        for buffer in &buffers {
            collector.register_shared(buffer.clone());
        }
        if !config.reporting_times().is_empty() {
            collector.register(ReportingSchedule::new("reporting", config.reporting_times()));
        }
        collector.register(FixedRestriction::new(max_timestep_diffusivity(
            args.diffusivity,
            &grid,
            config.time_stepping.adaptive_ratio,
            config.maximum_time_step(),
        )));
        let speed = args.speed / cal.seconds_per_year();
        collector.register(FixedRestriction::new(max_timestep_cfl_2d(speed, speed, &grid)));

        if args.calving_rate > 0.0 {
            if !config.time_stepping.front_retreat_use_cfl {
                warn!("给出了冰崩速率, 但 front_retreat_use_cfl 未开启, 不限制时间步");
            }
            let rate = args.calving_rate / cal.seconds_per_year();
            collector.add_retreat_mechanism(UniformCalving {
                rate: ScalarField::constant(&grid, rate),
            });
            collector.set_front_retreat_limiter(CflFrontRetreat);
        }
        info!("时间步限制: {:?}", collector.names());
    }

    info!(
        "开始推进: {} -> {}",
        cal.date(stepper.current_time()),
        cal.date(stepper.end_time())
    );

    let start = Instant::now();
    let mut reasons: BTreeMap<String, usize> = BTreeMap::new();
    while !stepper.is_finished() {
        if args.max_steps.is_some_and(|n| stepper.stats().steps >= n) {
            warn!("达到最大步数 {}, 提前结束", stepper.stats().steps);
            break;
        }

        let plan = stepper.plan(&front).context("时间步决策失败")?;
        let t = stepper.current_time();
        for buffer in &buffers {
            let mut guard = buffer.write();
            guard
                .ensure_covered(t, plan.dt)
                .with_context(|| format!("刷新外力 {} 失败", guard.name()))?;
            let mean = guard.average_over(t, plan.dt)?;
            debug!(
                "{}: [{}, +{:.3} a] 平均最大值 {:.4}",
                guard.name(),
                cal.date(t),
                cal.seconds_to_years(plan.dt),
                mean.max_abs()
            );
        }

        *reasons.entry(plan.reason.clone()).or_default() += 1;
        stepper.commit(&plan)?;
    }

    let elapsed = start.elapsed();
    let stats = stepper.stats();

    info!("=== 演练完成 ===");
    info!("结束时刻: {}", cal.date(stepper.current_time()));
    info!("总步数: {}", stats.steps);
    info!("昂贵物理过程更新: {}", stats.expensive_updates);
    if let (Some(lo), Some(hi)) = (stats.dt_min, stats.dt_max) {
        info!(
            "步长范围: {:.4} a .. {:.4} a",
            cal.seconds_to_years(lo),
            cal.seconds_to_years(hi)
        );
    }
    info!("计算时间: {:.3} s", elapsed.as_secs_f64());

    println!("\n=== 步长原因统计 ===");
    for (reason, count) in &reasons {
        println!("  {count:>8}  {reason}");
    }

    Ok(())
}

/// 为外力文件中的变量建立缓冲；没有文件时使用常数外力
fn attach_forcing(
    config: &RunConfig,
    file: Option<Arc<JsonForcingFile>>,
    wanted: &[String],
    grid: &Grid,
) -> Result<Vec<Arc<RwLock<ForcingBuffer>>>> {
    let Some(file) = file else {
        info!("未给出外力文件, 使用常数外力");
        let buffer = ForcingBuffer::constant("air_temp", ScalarField::constant(grid, 253.15));
        return Ok(vec![Arc::new(RwLock::new(buffer))]);
    };

    let names: Vec<String> = if wanted.is_empty() {
        file.variable_names().into_iter().map(String::from).collect()
    } else {
        wanted.to_vec()
    };

    let options = ForcingOptions::from_config(config);
    let source: Arc<dyn RecordSource> = file;
    let mut buffers = Vec::with_capacity(names.len());
    for name in &names {
        let buffer = ForcingBuffer::attach(source.clone(), name, options.clone())
            .with_context(|| format!("关联外力变量 {name} 失败"))?;
        info!(
            "外力 {}: {} 条记录, 缓冲容量 {}",
            buffer.name(),
            buffer.n_records(),
            buffer.capacity()
        );
        buffers.push(Arc::new(RwLock::new(buffer)));
    }
    Ok(buffers)
}
