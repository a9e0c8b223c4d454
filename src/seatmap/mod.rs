//! Конвейер обработки схемы зала: разбор HTML, поиск групп мест, сравнение
//! с предыдущим результатом.

pub mod diff;
pub mod grouping;
pub mod parser;
pub mod target;

pub use diff::new_groups;
pub use grouping::find_adjacent_groups;
pub use parser::parse_seats;
pub use target::extract_theater_id;
