use criterion::{Criterion, black_box, criterion_group, criterion_main};
use revision_core::{
    EpochOutcome, EpochPlan, RevisionConfig, RevisionDriver, RevisionError, SchedulerState,
    ThresholdConfig, ThresholdMethod, ThresholdScheduler,
};

fn long_history(epochs: usize) -> SchedulerState {
    let mut state = SchedulerState::new();
    for epoch in 0..epochs {
        let loss = 1.0 / (epoch + 1) as f64;
        state.record_epoch(0.5, loss, 2.0 * loss);
    }
    state
}

fn bench_scheduler_tau(c: &mut Criterion) {
    let state = long_history(1000);

    for method in [
        ThresholdMethod::Linear,
        ThresholdMethod::Cosine,
        ThresholdMethod::Exp,
        ThresholdMethod::AdaptiveVal,
    ] {
        let mut config = ThresholdConfig::new(method.clone(), 0.9, 0.1);
        config.cosine_warmup_epochs = 10;
        let scheduler = ThresholdScheduler::new(&config, 200).unwrap();
        c.bench_function(&format!("tau_{}", method), |b| {
            b.iter(|| scheduler.tau(black_box(137), black_box(&state)))
        });
    }
}

fn bench_driver_run(c: &mut Criterion) {
    let mut config = RevisionConfig::default();
    config.threshold.method = ThresholdMethod::AdaptiveGrad;
    config.training.total_epochs = 200;

    c.bench_function("driver_run_200_epochs", |b| {
        b.iter(|| {
            let mut driver = RevisionDriver::from_config(&config).unwrap();
            let mut trainer = |plan: &EpochPlan| -> Result<EpochOutcome, RevisionError> {
                Ok(EpochOutcome {
                    val_loss: 1.0 / (plan.epoch + 1) as f64,
                    grad_norm: 1.0,
                })
            };
            driver.run(&mut trainer).unwrap().records.len()
        })
    });
}

criterion_group!(benches, bench_scheduler_tau, bench_driver_run);
criterion_main!(benches);
