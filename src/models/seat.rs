use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Одно место из схемы зала, как оно пришло в разметке.
///
/// Ряд и номер места остаются строками: обычно это цифры, но гарантии нет.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub row: String,
    pub seat_number: String,
    pub occupied: bool,
}

impl Seat {
    pub fn new(row: impl Into<String>, seat_number: impl Into<String>, occupied: bool) -> Self {
        Self {
            row: row.into(),
            seat_number: seat_number.into(),
            occupied,
        }
    }
}

/// Максимальная непрерывная серия свободных мест в одном ряду.
///
/// Идентичность группы это тройка `(row, start_seat, end_seat)`; `count`
/// хранится только для отображения и в сравнении не участвует.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatGroup {
    pub row: String,
    #[serde(rename = "start_chair")]
    pub start_seat: String,
    #[serde(rename = "end_chair")]
    pub end_seat: String,
    pub count: u32,
}

impl SeatGroup {
    pub fn new(
        row: impl Into<String>,
        start_seat: impl Into<String>,
        end_seat: impl Into<String>,
        count: u32,
    ) -> Self {
        Self {
            row: row.into(),
            start_seat: start_seat.into(),
            end_seat: end_seat.into(),
            count,
        }
    }

    pub fn identity(&self) -> (&str, &str, &str) {
        (&self.row, &self.start_seat, &self.end_seat)
    }
}

impl PartialEq for SeatGroup {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for SeatGroup {}

impl Hash for SeatGroup {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}
