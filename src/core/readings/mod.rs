//! 位移读数：计算、落盘、回读与统计
//!
//! The record log is the only artifact shared between a live extraction run
//! and a later re-analysis; both go through `parser` and `stats`.

pub mod parser;
pub mod reading;
pub mod record;
pub mod stats;

pub use parser::{parse_log, parse_records, ExcludedLine, MalformedLine, ParsedLog};
pub use reading::{
    displacement, in_valid_range, Reading, RunTally, MAX_DISPLACEMENT_MM, MIN_DISPLACEMENT_MM,
};
pub use record::{format_record, RecordWriter, WriteOutcome};
pub use stats::{max_record, mean, median, Report, SkewClass};
