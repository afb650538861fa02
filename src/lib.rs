pub mod args;
pub mod comparison;
pub mod data;
pub mod driver;
pub mod error;
pub mod evaluation;
pub mod layers;
pub mod lr_scheduler;
pub mod network;
pub mod normalization;
pub mod optimizers;
pub mod tensor;
pub mod test_utils;
pub mod training;

pub use args::{parse_arguments, BenchSettings};
pub use comparison::{
    save_traces_csv, summarize, write_traces_csv, ComparisonConfig, EpochObserver, EpochRecord,
    OptimizerKind, RunSummary, RunTrace, ScheduleRunner,
};
pub use data::{load_batch, make_moons, prepare_data_iteration, split_data, Dataset};
pub use driver::TrainingStepDriver;
pub use error::ScheduleError;
pub use evaluation::{
    calculate_loss, calculate_number_of_correct_outputs, evaluate_dataset, EvaluationStats,
};
pub use layers::{
    Dense,
    DenseBackwardContext,
    DenseForwardContext,
    //
    Layer,
    LayerBackwardContext,
    LayerForwardContext,
    //
    LeakyReLU,
    LeakyReLUForwardContext,
};
pub use lr_scheduler::{
    Granularity, ScheduleConfig, ScheduleEvent, ScheduleKind, SchedulePolicy, ScheduleState,
    Scheduler, LR_FLOOR,
};
pub use network::Network;
pub use normalization::NormalizationParams;
pub use optimizers::{Adam, Momentum, Optimizer, SGD};
pub use tensor::Tensor;
pub use training::{process_batch, train_epoch, BatchResults, TrainingConfig, TrainingStats};
