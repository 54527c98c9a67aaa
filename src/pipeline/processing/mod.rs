// Pipeline processing: pure transformations over in-memory tables

pub mod demographics;
pub mod merge;
pub mod normalize;
pub mod session_date;
