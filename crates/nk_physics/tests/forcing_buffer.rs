// crates/nk_physics/tests/forcing_buffer.rs

//! 外力缓冲的窗口管理、周期与文件读取测试

use std::sync::Arc;

use nk_foundation::{Calendar, Grid, ScalarField};
use nk_io::{ForcingDocument, ForcingVariable, JsonForcingFile, MemorySource, RecordAxisData};
use nk_physics::{ForcingBuffer, ForcingError, ForcingOptions, InterpolationKind};

fn years(y: f64) -> f64 {
    Calendar::default().years_to_seconds(y)
}

fn grid() -> Grid {
    Grid::new(4, 3, 5000.0, 5000.0)
}

/// 记录 k 的每个点取值 values[k] + 点序号
fn source_with(times: Vec<f64>, values: &[f64]) -> Arc<MemorySource> {
    let g = grid();
    let records = values
        .iter()
        .map(|&v| {
            let data = (0..g.n_points()).map(|p| v + p as f64).collect();
            ScalarField::from_vec(&g, data).unwrap()
        })
        .collect();
    Arc::new(
        MemorySource::new("forcing", g)
            .with_series("air_temp", RecordAxisData::from_times(times), records)
            .unwrap(),
    )
}

// ============================================================
// 窗口滑动
// ============================================================

#[test]
fn test_sliding_window_reads_only_missing_records() {
    let source = source_with(vec![0.0, years(10.0), years(20.0)], &[0.0, 10.0, 20.0]);
    let options = ForcingOptions::default()
        .with_capacity(2)
        .with_interpolation(InterpolationKind::PiecewiseConstant);
    let mut buffer = ForcingBuffer::attach(source.clone(), "air_temp", options).unwrap();

    // 合成的边界：[0,10], [10,20], [20,20+1s]
    let b = buffer.bounds();
    assert!((b[1] - years(10.0)).abs() < 1e-6);
    assert!((b[5] - (years(20.0) + 1.0)).abs() < 1e-6);

    buffer.ensure_covered(years(5.0), years(10.0)).unwrap();
    assert_eq!(buffer.resident_range(), Some(0..2));
    assert_eq!(source.reads_of("air_temp"), vec![0, 1]);

    buffer.ensure_covered(years(12.0), years(10.0)).unwrap();
    assert_eq!(buffer.resident_range(), Some(1..3));
    // 记录 1 被复用，只读取记录 2
    assert_eq!(source.reads_of("air_temp"), vec![0, 1, 2]);
    assert!(buffer.resident_range().map_or(0, |r| r.len()) <= buffer.capacity());

    // 记录 1 与记录 2 的值都还正确
    let v = buffer.value_at(years(15.0)).unwrap();
    assert!((v.get(0, 0) - 10.0).abs() < 1e-12);
    let v = buffer.value_at(years(20.5)).unwrap();
    assert!((v.get(1, 0) - 21.0).abs() < 1e-12);
}

#[test]
fn test_covered_window_is_not_reloaded() {
    let source = source_with(vec![0.0, years(10.0), years(20.0)], &[0.0, 10.0, 20.0]);
    let options = ForcingOptions::default().with_capacity(3);
    let mut buffer = ForcingBuffer::attach(source.clone(), "air_temp", options).unwrap();

    buffer.ensure_covered(0.0, years(1.0)).unwrap();
    let reads = source.read_log().len();
    buffer.ensure_covered(years(3.0), years(5.0)).unwrap();
    buffer.ensure_covered(years(8.0), years(10.0)).unwrap();
    assert_eq!(source.read_log().len(), reads);
}

#[test]
fn test_going_backwards_reloads_window() {
    let times: Vec<f64> = (0..6).map(|k| years(10.0 * k as f64)).collect();
    let values: Vec<f64> = (0..6).map(|k| 100.0 * k as f64).collect();
    let source = source_with(times, &values);
    let options = ForcingOptions::default()
        .with_capacity(2)
        .with_interpolation(InterpolationKind::PiecewiseConstant);
    let mut buffer = ForcingBuffer::attach(source, "air_temp", options).unwrap();

    buffer.ensure_covered(years(41.0), years(1.0)).unwrap();
    assert_eq!(buffer.resident_range(), Some(4..6));
    buffer.ensure_covered(years(1.0), years(1.0)).unwrap();
    assert_eq!(buffer.resident_range(), Some(0..2));
    let v = buffer.value_at(years(12.0)).unwrap();
    assert!((v.get(0, 0) - 100.0).abs() < 1e-12);
}

#[test]
fn test_capacity_error() {
    let times: Vec<f64> = (0..5).map(|k| years(k as f64)).collect();
    let source = source_with(times, &[0.0, 1.0, 2.0, 3.0, 4.0]);
    let options = ForcingOptions::default().with_capacity(2);
    let mut buffer = ForcingBuffer::attach(source, "air_temp", options).unwrap();

    let err = buffer.ensure_covered(0.0, years(3.5)).unwrap_err();
    assert!(matches!(
        err,
        ForcingError::Capacity {
            required: 5,
            capacity: 2,
            ..
        }
    ));
}

#[test]
fn test_non_increasing_times_rejected() {
    let source = source_with(vec![0.0, years(2.0), years(1.0)], &[0.0, 1.0, 2.0]);
    let err = ForcingBuffer::attach(source, "air_temp", ForcingOptions::default()).unwrap_err();
    assert!(matches!(err, ForcingError::Configuration { .. }));
}

// ============================================================
// 求值
// ============================================================

#[test]
fn test_single_record_average_equals_value() {
    let source = source_with(vec![years(3.0)], &[250.0]);
    let mut buffer =
        ForcingBuffer::attach(source, "air_temp", ForcingOptions::default()).unwrap();
    buffer.ensure_covered(years(100.0), years(7.0)).unwrap();

    let avg = buffer.average_over(years(100.0), years(7.0)).unwrap();
    for t in [100.0, 103.5, 107.0] {
        let v = buffer.value_at(years(t)).unwrap();
        for (a, b) in avg.as_slice().iter().zip(v.as_slice()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}

#[test]
fn test_periodic_value_repeats() {
    let period = years(1.0);
    let t0 = years(2000.0);
    let times = vec![years(1.0 / 6.0), years(0.5), years(5.0 / 6.0)];
    let source = source_with(times, &[260.0, 280.0, 265.0]);
    let options = ForcingOptions::default().with_period(period, t0);
    let buffer = ForcingBuffer::attach(source.clone(), "air_temp", options).unwrap();

    // attach 时已读入全部记录
    assert_eq!(source.reads_of("air_temp"), vec![0, 1, 2]);

    let a = buffer.value_at(t0).unwrap();
    let b = buffer.value_at(t0 + period).unwrap();
    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        assert!((x - y).abs() < 1e-9);
    }

    // 周期数据不再读取
    let mut buffer = buffer;
    buffer.ensure_covered(t0 + years(5.0), years(3.0)).unwrap();
    assert_eq!(source.read_log().len(), 3);

    // 年初位于最后一条与下一周期第一条记录之间：265 -> 260 的中点
    assert!((a.get(0, 0) - 262.5).abs() < 1e-6);
}

#[test]
fn test_periodic_annual_mean() {
    let period = years(1.0);
    let times = vec![years(0.25), years(0.75)];
    let source = source_with(times, &[0.0, 10.0]);
    let options = ForcingOptions::default()
        .with_period(period, 0.0)
        .with_evaluations_per_year(1000);
    let buffer = ForcingBuffer::attach(source, "air_temp", options).unwrap();

    // 线性周期插值下，整年平均等于记录平均
    let mean = buffer.average_over(years(10.0), period).unwrap();
    assert!((mean.get(0, 0) - 5.0).abs() < 1e-6);
}

// ============================================================
// 文件记录源
// ============================================================

#[test]
fn test_json_file_backed_buffer() {
    let g = Grid::new(2, 1, 1000.0, 1000.0);
    let mut doc = ForcingDocument::new(g);
    doc.variables.insert(
        "precipitation".into(),
        ForcingVariable {
            units: Some("kg m-2 s-1".into()),
            time: Some(vec![0.0, years(1.0), years(2.0)]),
            time_bounds: Some(vec![0.0, years(1.0), years(1.0), years(2.0), years(2.0), years(3.0)]),
            records: vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
        },
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("precip.json");
    doc.write(&path).unwrap();

    let file = Arc::new(JsonForcingFile::open(&path).unwrap());
    let options = ForcingOptions::default()
        .with_capacity(2)
        .with_interpolation(InterpolationKind::PiecewiseConstant);
    let mut buffer = ForcingBuffer::attach(file, "precipitation", options).unwrap();

    buffer.ensure_covered(years(1.5), years(1.0)).unwrap();
    assert_eq!(buffer.resident_range(), Some(1..3));
    let v = buffer.value_at(years(2.5)).unwrap();
    assert_eq!(v.as_slice(), &[5.0, 6.0]);

    // 文件被删除后读取失败
    std::fs::remove_file(&path).unwrap();
    let err = buffer.ensure_covered(0.0, years(0.5)).unwrap_err();
    assert!(matches!(err, ForcingError::Io(_)));
}
