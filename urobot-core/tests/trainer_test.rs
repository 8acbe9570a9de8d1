//! End-to-end tests for the online trainer

use std::path::PathBuf;
use urobot_core::optimizer::{sanitized_pow, BiasCorrection};
use rand::rngs::StdRng;
use rand::SeedableRng;
use urobot_core::{
    select_min_variance, Batch, Command, Ensemble, Phase, Trainer, TrainerConfig,
};

fn run(config: TrainerConfig, measurements: &[Vec<f64>]) -> Vec<usize> {
    let mut trainer = Trainer::new(config).unwrap();
    measurements
        .iter()
        .map(|m| trainer.step(m).unwrap().selected)
        .collect()
}

fn varied_measurements(width: usize, count: usize) -> Vec<Vec<f64>> {
    (0..count)
        .map(|i| {
            (0..width)
                .map(|j| ((i * 7 + j * 13) % 256) as f64 / 256.0)
                .collect()
        })
        .collect()
}

#[test]
fn test_selection_is_deterministic() {
    let measurements = varied_measurements(9, 30);
    let first = run(TrainerConfig::default(), &measurements);
    let second = run(TrainerConfig::default(), &measurements);
    assert_eq!(first, second);
}

#[test]
fn test_reports_are_bit_identical() {
    let measurements = varied_measurements(6, 10);
    let mut a = Trainer::new(TrainerConfig::default()).unwrap();
    let mut b = Trainer::new(TrainerConfig::default()).unwrap();
    for m in &measurements {
        let ra = a.step(m).unwrap();
        let rb = b.step(m).unwrap();
        assert_eq!(ra.loss.to_bits(), rb.loss.to_bits());
        let va: Vec<u64> = ra.variances.iter().map(|v| v.to_bits()).collect();
        let vb: Vec<u64> = rb.variances.iter().map(|v| v.to_bits()).collect();
        assert_eq!(va, vb);
    }
}

#[test]
fn test_forced_equal_variances_pick_lowest_index() {
    let v = 0.125;
    assert_eq!(select_min_variance(&[v, v, v]), 0);
    assert_eq!(select_min_variance(&[0.5, v, v]), 1);
    assert_eq!(select_min_variance(&[v, 0.5, v]), 0);
}

#[test]
fn test_cloned_members_tie_to_first() {
    let width = 5;
    let mut rng = StdRng::seed_from_u64(3);
    let mut ensemble = Ensemble::new(3, 1000);
    assert!(ensemble.initialize(width, &mut rng).unwrap());

    let template = ensemble.members()[1].clone();
    for i in 0..3 {
        let (member, _) = ensemble.member_and_counter(i).unwrap();
        *member = template.clone();
    }

    let mut batch = Batch::new(width, 4);
    for slot in 0..4 {
        let input: Vec<f64> = (0..width).map(|j| ((slot * 3 + j) % 7) as f64 / 7.0).collect();
        let target: Vec<f64> = (0..width).map(|j| (j % 2) as f64).collect();
        batch.set_slot(slot, &input, &target).unwrap();
    }

    let variances: Vec<f64> = ensemble
        .evaluate(&batch)
        .unwrap()
        .into_iter()
        .map(|f| f.variance)
        .collect();
    assert!(variances[0] > 0.0);
    assert!(variances.iter().all(|v| v.to_bits() == variances[0].to_bits()));
    assert_eq!(select_min_variance(&variances), 0);
}

#[test]
fn test_zero_variance_trainer_selects_first() {
    // identity projections and two identical slots give every member a variance of 0
    let config = TrainerConfig {
        batch_size: 2,
        projection_stddev: 0.0,
        ..TrainerConfig::default()
    };
    let mut trainer = Trainer::new(config).unwrap();
    for _ in 0..5 {
        let report = trainer.step(&[0.1, 0.7, 0.3, 0.9]).unwrap();
        assert_eq!(report.variances, vec![0.0; 3]);
        assert_eq!(report.selected, 0);
        assert_eq!(report.command, Command::Left);
    }
}

#[test]
fn test_step_counter_saturates() {
    let config = TrainerConfig {
        batch_size: 2,
        ..TrainerConfig::default()
    };
    let ceiling = config.optimizer.step_ceiling;
    let optimizer = config.optimizer;
    let mut trainer = Trainer::new(config).unwrap();
    let measurement = [0.25, 0.5, 0.75];

    let mut last_t = 0;
    for _ in 0..(ceiling + 50) {
        last_t = trainer.step(&measurement).unwrap().t;
    }
    assert_eq!(last_t, ceiling);
    assert!(trainer.ensemble().counter().is_saturated());

    let at_ceiling = BiasCorrection::at(&optimizer, ceiling);
    assert_eq!(at_ceiling.first, 1.0 - sanitized_pow(optimizer.beta1, ceiling));
    assert_eq!(at_ceiling.second, 1.0 - sanitized_pow(optimizer.beta2, ceiling));

    let report = trainer.step(&measurement).unwrap();
    assert_eq!(report.t, ceiling);
    assert_eq!(BiasCorrection::at(&optimizer, report.t), at_ceiling);
}

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("constant_w4_selection.json")
}

#[test]
fn test_constant_measurement_end_to_end() {
    let measurement = vec![0.5, 0.5, 0.5, 0.5];
    let mut trainer = Trainer::new(TrainerConfig::default()).unwrap();
    assert!(!trainer.ensemble().is_initialized());

    let mut selected = Vec::with_capacity(50);
    for step in 0..50 {
        let report = trainer.step(&measurement).unwrap();
        if step == 0 {
            assert_eq!(report.phase, Phase::Warm);
            assert!(trainer.ensemble().is_initialized());
            assert_eq!(trainer.ensemble().width(), Some(4));
        } else {
            assert_eq!(report.phase, Phase::Steady);
        }
        assert!(report.loss.is_finite(), "step {} loss {}", step, report.loss);
        assert!(Command::ALL.contains(&report.command));
        for member in trainer.ensemble().members() {
            for p in member.params() {
                assert!(p.values.iter().all(|x| x.is_finite()));
            }
        }
        selected.push(report.selected);
    }

    // Set UROBOT_RECORD_FIXTURES=1 to overwrite the recorded sequence.
    let path = fixture_path();
    if std::env::var_os("UROBOT_RECORD_FIXTURES").is_some() {
        let json = serde_json::to_string_pretty(&selected).unwrap();
        std::fs::write(&path, json).unwrap();
        return;
    }
    let recorded = std::fs::read_to_string(&path).unwrap_or_else(|e| {
        panic!(
            "missing fixture {} ({}); run with UROBOT_RECORD_FIXTURES=1 to record it",
            path.display(),
            e
        )
    });
    let recorded: Vec<usize> = serde_json::from_str(&recorded).unwrap();
    assert_eq!(recorded.len(), 50);
    assert_eq!(selected, recorded);
}
