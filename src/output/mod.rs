pub mod formatter;

pub use formatter::{
    format_breakdown_detail, format_event_table, format_points, format_pool_summary,
    format_pool_table, format_pool_tsv, should_use_colors,
};
