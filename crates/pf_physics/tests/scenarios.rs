// crates/pf_physics/tests/scenarios.rs

//! 场景验证测试
//!
//! 覆盖引擎端到端行为：平坦降雨、泵站迟滞切换、失效泵站，
//! 以及多步运行下的守恒与非负不变量。

use glam::DVec2;
use pf_physics::{
    EngineConfig, MemoryPumpLog, NullPumpLog, PumpController, PumpSpec, PumpState,
    RainfallSchedule, SimulationBuilder,
};
use pf_physics::engine::PumpPlacement;
use pf_physics::pump::Pump;
use pf_physics::state::WaterState;
use pf_terrain::TerrainField;

const EPS: f64 = 1e-9;

fn pump_spec(threshold_on: f64, capacity: f64) -> PumpSpec {
    PumpSpec {
        source: DVec2::new(106.8, -6.2),
        discharge: DVec2::new(106.9, -6.1),
        capacity_m3_hr: capacity,
        threshold_on,
        radius_m: 1.0,
    }
}

// ============================================================
// 场景 A: 平坦栅格均匀降雨
// ============================================================

#[test]
fn scenario_a_flat_rainfall() {
    // 5x5 均一高程（内部 3x3），10 mm 降雨 1 子迭代，
    // 土地利用分类 0（零下渗），无泵站：
    // 无梯度则无净汇流，每个活跃单元水深恰为 0.01 m。
    let terrain = TerrainField::uniform(5, 5, 2.0, 0);
    let schedule = RainfallSchedule::from_parallel(vec![10.0], vec![60.0], vec![1]).unwrap();

    let mut sim = SimulationBuilder::new(EngineConfig::default())
        .with_terrain(terrain)
        .with_schedule(schedule)
        .build()
        .unwrap();

    let stats = sim.run(&mut NullPumpLog).unwrap();
    assert_eq!(stats.steps, 1);
    assert_eq!(stats.sub_iterations, 1);

    for &d in sim.depth() {
        assert!((d - 0.01).abs() < EPS);
    }

    // 平坦场平滑后不变
    for &d in &sim.output() {
        assert!((d - 0.01).abs() < EPS);
    }
}

// ============================================================
// 场景 B: 泵站迟滞切换
// ============================================================

#[test]
fn scenario_b_hysteresis_switching() {
    // threshold_on = 0.5, 迟滞 0.1 → threshold_off = 0.45。
    // 驱动水深序列：首次越过 0.5 时恰好激活，
    // 直到首次跌破 0.45 才关断。
    let terrain = TerrainField::uniform(9, 9, 0.0, 0);
    let mut state = WaterState::zeros(81);
    let src = terrain.idx(4, 4);

    let pump = Pump::resolve(0, pump_spec(0.5, 0.0), (4, 4), (7, 7), &terrain, 1.0);
    let mut ctl = PumpController::new(vec![pump], 0, 1.0);
    let mut log = MemoryPumpLog::default();

    let samples = [0.3, 0.48, 0.6, 0.52, 0.46, 0.449, 0.2];
    let expect_active = [false, false, true, true, true, false, false];

    for (i, (&d, &want)) in samples.iter().zip(&expect_active).enumerate() {
        state.depth_mut()[src] = d;
        ctl.evaluate(&terrain, &mut state, 0, i, 1.0, 1, &mut log).unwrap();
        assert_eq!(
            ctl.pumps()[0].is_active(),
            want,
            "sample {} depth {}",
            i,
            d
        );
    }

    // 日志逐子迭代完整，阈值字段一致
    assert_eq!(log.records.len(), samples.len());
    for rec in &log.records {
        assert!((rec.threshold_on - 0.5).abs() < EPS);
        assert!((rec.threshold_off - 0.45).abs() < EPS);
    }
}

#[test]
fn scenario_b_rainfall_driven_activation() {
    // 降雨把源单元推到 0.6：首个子迭代即激活并开始抽水
    let terrain = TerrainField::uniform(9, 9, 0.0, 0);
    let schedule = RainfallSchedule::from_parallel(vec![600.0], vec![60.0], vec![3]).unwrap();

    let cfg = EngineConfig {
        cell_size_m: 1.0,
        pump_cooldown: 0,
    };
    let mut sim = SimulationBuilder::new(cfg)
        .with_terrain(terrain)
        .with_schedule(schedule)
        .with_pump(PumpPlacement {
            spec: pump_spec(0.5, 1.0),
            source_px: (4, 4),
            discharge_px: (7, 7),
        })
        .build()
        .unwrap();

    let mut log = MemoryPumpLog::default();
    sim.run(&mut log).unwrap();

    assert_eq!(log.records.len(), 3);
    assert!(log.records[0].active);
    assert!((log.records[0].depth_at_source - 0.6).abs() < EPS);
    assert!(log.records[0].pumped_depth > 0.0);

    // 任何子迭代后水深都不为负
    assert!(sim.depth().iter().all(|&d| d >= 0.0));
}

// ============================================================
// 场景 C: 失效泵站
// ============================================================

#[test]
fn scenario_c_out_of_bounds_pump() {
    // 源像素越界的泵站永远保持 INACTIVE，日志中抽水量恒为零
    let terrain = TerrainField::uniform(5, 5, 0.0, 0);
    let schedule =
        RainfallSchedule::from_parallel(vec![600.0, 600.0], vec![60.0, 60.0], vec![2, 2])
            .unwrap();

    let mut sim = SimulationBuilder::new(EngineConfig::default())
        .with_terrain(terrain)
        .with_schedule(schedule)
        .with_pump(PumpPlacement {
            spec: pump_spec(0.1, 1e6),
            source_px: (99, 99),
            discharge_px: (2, 2),
        })
        .build()
        .unwrap();

    let mut log = MemoryPumpLog::default();
    sim.run(&mut log).unwrap();

    assert!(!sim.pumps().pumps()[0].is_valid());
    assert_eq!(sim.pumps().pumps()[0].state(), PumpState::Inactive);

    // 每个 (步, 子迭代) 仍有记录，但全部为零抽水、非激活
    assert_eq!(log.records.len(), 4);
    for rec in &log.records {
        assert_eq!(rec.pumped_depth, 0.0);
        assert!(!rec.active);
    }
}

// ============================================================
// 不变量: 守恒与非负
// ============================================================

#[test]
fn invariant_mass_conserved_without_sinks() {
    // 无下渗、无泵站时，多步运行后总水量等于累计降雨量
    let mut elev = vec![0.0; 49];
    for (i, e) in elev.iter_mut().enumerate() {
        // 起伏地形，确保发生汇流
        *e = ((i * 7919) % 13) as f64 * 0.1;
    }
    let terrain = TerrainField::new(7, 7, elev, vec![0; 49], None).unwrap();
    let active = terrain.active_cells();

    let schedule = RainfallSchedule::from_parallel(
        vec![10.0, 20.0, 5.0],
        vec![60.0, 30.0, 60.0],
        vec![4, 4, 4],
    )
    .unwrap();
    let total_rain_m = schedule.total_depth_mm() / 1000.0;

    let mut sim = SimulationBuilder::new(EngineConfig::default())
        .with_terrain(terrain)
        .with_schedule(schedule)
        .build()
        .unwrap();
    sim.run(&mut NullPumpLog).unwrap();

    let total: f64 = sim.depth().iter().sum();
    assert!((total - total_rain_m * active as f64).abs() < 1e-9);
    assert!(sim.depth().iter().all(|&d| d >= 0.0));
}

#[test]
fn invariant_nodata_cells_stay_dry() {
    // 无数据单元不受降雨、汇流影响，终场水深为零
    let mut elev = vec![1.0; 49];
    elev[24] = f64::NAN;
    elev[25] = -32767.0;
    let terrain = TerrainField::new(7, 7, elev, vec![0; 49], Some(-32767.0)).unwrap();

    let schedule = RainfallSchedule::from_parallel(vec![50.0], vec![60.0], vec![5]).unwrap();
    let mut sim = SimulationBuilder::new(EngineConfig::default())
        .with_terrain(terrain)
        .with_schedule(schedule)
        .build()
        .unwrap();
    sim.run(&mut NullPumpLog).unwrap();

    assert_eq!(sim.depth()[24], 0.0);
    assert_eq!(sim.depth()[25], 0.0);
}

#[test]
fn invariant_depth_nonnegative_with_infiltration_and_pump() {
    // 强下渗 + 大容量泵并用，水深仍非负
    let terrain = TerrainField::uniform(9, 9, 0.0, 3);
    let schedule =
        RainfallSchedule::from_parallel(vec![30.0, 0.0], vec![60.0, 60.0], vec![5, 5]).unwrap();

    let cfg = EngineConfig {
        cell_size_m: 1.0,
        pump_cooldown: 2,
    };
    let mut sim = SimulationBuilder::new(cfg)
        .with_terrain(terrain)
        .with_schedule(schedule)
        .with_pump(PumpPlacement {
            spec: pump_spec(0.01, 1e5),
            source_px: (4, 4),
            discharge_px: (1, 1),
        })
        .build()
        .unwrap();

    let mut log = MemoryPumpLog::default();
    sim.run(&mut log).unwrap();

    assert!(sim.depth().iter().all(|&d| d >= 0.0));
    assert_eq!(log.records.len(), 10);
}
