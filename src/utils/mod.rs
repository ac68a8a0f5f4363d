pub mod dates;

pub use dates::{
    DATE_FORMAT_ERROR, day_window, digest_window, format_compact_date, format_duration_human,
    is_compact_date, parse_compact_date, start_of_day,
};
