//! Dashboard rendering for screened opportunities.
//!
//! This module handles:
//! - Value formatters shared by the page
//! - Category counts, filtering and pagination
//! - Static HTML page rendering
//! - Writing `data.json` and `index.html`

pub mod format;
pub mod html;
pub mod output;
pub mod view;

pub use format::{
    format_integer, format_number, format_percent, format_time_ago, format_time_left, signal_label,
};
pub use html::{escape_html, render_page, render_page_at};
pub use output::{write_outputs, OutputPaths};
pub use view::{
    category_counts, filter_by_category, paginate, CategoryCounts, CategorySelection, Page,
    PAGE_SIZE,
};
