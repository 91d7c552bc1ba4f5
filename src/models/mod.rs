pub mod favorite;
pub mod layout;
pub mod order;
pub mod stats;

pub use favorite::{Favorite, FAVORITES_HEADER};
pub use layout::{
    split_table_name, LayoutKind, TableLayout, WriteMode, PER_RESTAURANT_HEADER, SHARED_HEADER,
};
pub use order::{parse_date_or, parse_price, today, OrderInput, OrderRecord, DATE_FORMAT};
pub use stats::{WeekWindow, WeeklyStats};
