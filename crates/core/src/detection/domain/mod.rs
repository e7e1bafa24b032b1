pub mod confidence_filter;
pub mod image_preprocessor;
pub mod inference_engine;
pub mod non_max_suppressor;
pub mod output_decoder;
