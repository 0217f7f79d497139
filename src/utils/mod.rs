pub mod date;

pub use date::{parse_date_expr, parse_date_expr_at};
