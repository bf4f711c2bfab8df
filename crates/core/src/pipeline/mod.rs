pub mod frame_pipeline;
pub mod pipeline_logger;
pub mod preprocessor;
pub mod stop_signal;
