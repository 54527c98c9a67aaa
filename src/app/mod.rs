pub mod ports;
pub mod preprocess_use_case;
pub mod demographics_use_case;
pub mod merge_use_case;
