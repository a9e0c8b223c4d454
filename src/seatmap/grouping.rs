//! Поиск групп соседних свободных мест.

use std::collections::HashMap;

use crate::models::{Seat, SeatGroup};

/// Численное значение метки ряда или места, если это целое число.
fn numeric(label: &str) -> Option<i64> {
    label.trim().parse().ok()
}

/// Ряд проходит фильтр по максимальному ряду.
///
/// Нечисловой ряд сравнить не с чем, поэтому он всегда остаётся.
fn within_ceiling(seat: &Seat, row_ceiling: Option<u32>) -> bool {
    match (row_ceiling, numeric(&seat.row)) {
        (Some(ceiling), Some(row)) => row <= i64::from(ceiling),
        _ => true,
    }
}

fn is_next(previous: &Seat, current: &Seat) -> bool {
    match (numeric(&previous.seat_number), numeric(&current.seat_number)) {
        (Some(prev), Some(cur)) => prev.checked_add(1) == Some(cur),
        _ => false,
    }
}

/// Находит максимальные серии свободных мест длиной не меньше `min_run`.
///
/// Ряды идут в порядке первого появления во входных данных, внутри ряда
/// серии идут слева направо. На этот порядок опирается текст уведомлений.
pub fn find_adjacent_groups(seats: &[Seat], min_run: u32, row_ceiling: Option<u32>) -> Vec<SeatGroup> {
    let mut rows: Vec<(&str, Vec<&Seat>)> = Vec::new();
    let mut row_index: HashMap<&str, usize> = HashMap::new();

    for seat in seats
        .iter()
        .filter(|seat| !seat.occupied)
        .filter(|seat| within_ceiling(seat, row_ceiling))
    {
        match row_index.get(seat.row.as_str()) {
            Some(&idx) => rows[idx].1.push(seat),
            None => {
                row_index.insert(&seat.row, rows.len());
                rows.push((&seat.row, vec![seat]));
            }
        }
    }

    let min_len = min_run.max(1) as usize;
    let mut groups = Vec::new();

    for (row, mut row_seats) in rows {
        // sort_by_key стабилен: нечисловые места уходят в конец в исходном порядке
        row_seats.sort_by_key(|seat| match numeric(&seat.seat_number) {
            Some(n) => (0u8, n),
            None => (1u8, 0),
        });

        let mut start = 0;
        for end in 1..=row_seats.len() {
            let closes = end == row_seats.len() || !is_next(row_seats[end - 1], row_seats[end]);
            if !closes {
                continue;
            }

            let len = end - start;
            if len >= min_len {
                groups.push(SeatGroup {
                    row: row.to_string(),
                    start_seat: row_seats[start].seat_number.clone(),
                    end_seat: row_seats[end - 1].seat_number.clone(),
                    count: len as u32,
                });
            }
            start = end;
        }
    }

    groups
}
