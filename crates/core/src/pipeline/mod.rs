pub mod detection_config;
pub mod detection_pipeline;
