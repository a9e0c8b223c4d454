use std::collections::HashSet;

use crate::models::SeatGroup;

/// Группы из `current`, которых не было в `previous`, в порядке `current`.
///
/// Сравнение идёт по `(row, start_seat, end_seat)`. Изменившийся `count` при
/// тех же границах новой группой не считается.
pub fn new_groups(previous: &[SeatGroup], current: &[SeatGroup]) -> Vec<SeatGroup> {
    let known: HashSet<(&str, &str, &str)> = previous.iter().map(SeatGroup::identity).collect();

    current
        .iter()
        .filter(|group| !known.contains(&group.identity()))
        .cloned()
        .collect()
}
