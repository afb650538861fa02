use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratebench::{
    make_moons, parse_arguments, save_traces_csv, split_data, summarize, EpochRecord,
    ScheduleKind, ScheduleRunner,
};
use std::error::Error;
use std::time::Instant;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let start = Instant::now();

    let settings = match parse_arguments() {
        Ok(settings) => settings,
        Err(e) => e.exit(),
    };

    let mut rng = StdRng::seed_from_u64(settings.comparison.seed);
    let moons = make_moons(settings.samples, settings.noise, &mut rng);
    let (train, test) = split_data(&moons, settings.test_ratio, &mut rng);
    info!(
        "generated {} samples: {} train, {} test",
        moons.len(),
        train.len(),
        test.len()
    );

    let log_every = settings.log_every;
    let mut runner = ScheduleRunner::new(settings.comparison.clone()).with_observer(
        move |kind: ScheduleKind, record: &EpochRecord| {
            if log_every > 0 && record.epoch % log_every == 0 {
                info!(
                    "[{}] epoch {:>4}: loss {:.6}, accuracy {:.2}%, lr {:.6e}",
                    kind, record.epoch, record.loss, record.accuracy, record.learning_rate
                );
            }
        },
    );

    let schedules = runner.default_configs(&settings.schedules, train.len());
    let traces = runner.run(&train, &test, &schedules)?;

    println!("\n=== Schedule comparison ===");
    println!(
        "{:<16}{:>12}{:>12}{:>14}{:>14}{:>12}",
        "schedule", "final loss", "best loss", "epochs to thr", "final lr", "test acc"
    );
    for summary in summarize(&traces, settings.loss_threshold) {
        let reached = summary
            .epochs_to_threshold
            .map(|epoch| epoch.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<16}{:>12.6}{:>12.6}{:>14}{:>14.3e}{:>11.2}%",
            summary.kind.name(),
            summary.final_loss,
            summary.best_loss,
            reached,
            summary.final_lr,
            summary.test_accuracy
        );
    }

    if let Some(path) = &settings.output {
        save_traces_csv(&traces, path)?;
        println!("\nSaved traces to {}", path.display());
    }

    println!("\nTotal runtime: {:.2?}", start.elapsed());
    Ok(())
}
