//! Разбор схемы зала из HTML.
//!
//! Схема приходит как набор `<a>` с атрибутами `class`, `data-chair` и
//! `data-row`. Занятое место помечено подстрокой `taken` в классе.
//! Это скрейпинг, а не строгая грамматика: элементы без нужных атрибутов
//! просто пропускаются.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::Seat;

const CLASS_ATTR: &str = "class";
const SEAT_ATTR: &str = "data-chair";
const ROW_ATTR: &str = "data-row";
const TAKEN_MARKER: &str = "taken";

fn anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<a\b([^>]*)>").expect("anchor regex is valid"))
}

fn attribute_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("attribute regex is valid")
    })
}

/// Достаёт все места из документа в порядке появления.
pub fn parse_seats(document: &str) -> Vec<Seat> {
    anchor_re()
        .captures_iter(document)
        .filter_map(|caps| caps.get(1).and_then(|attrs| seat_from_attributes(attrs.as_str())))
        .collect()
}

fn seat_from_attributes(attrs: &str) -> Option<Seat> {
    let mut class = None;
    let mut seat_number = None;
    let mut row = None;

    for caps in attribute_re().captures_iter(attrs) {
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();

        // Первое вхождение атрибута выигрывает, как у браузера
        if name.eq_ignore_ascii_case(CLASS_ATTR) {
            class.get_or_insert(value);
        } else if name.eq_ignore_ascii_case(SEAT_ATTR) {
            seat_number.get_or_insert(value);
        } else if name.eq_ignore_ascii_case(ROW_ATTR) {
            row.get_or_insert(value);
        }
    }

    let class = class?;
    Some(Seat {
        row: row?.to_string(),
        seat_number: seat_number?.to_string(),
        occupied: class.contains(TAKEN_MARKER),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_seats_in_document_order() {
        let html = r##"
            <div class="row">
              <a href="#" class="chair" data-chair="1" data-row="5"><span>1</span></a>
              <a href="#" class="chair taken" data-chair="2" data-row="5"><span>2</span></a>
            </div>
        "##;

        let seats = parse_seats(html);

        assert_eq!(
            seats,
            vec![Seat::new("5", "1", false), Seat::new("5", "2", true)]
        );
    }

    #[test]
    fn tolerates_attribute_order_and_line_breaks() {
        let html = "<a data-row=\"3\"\n   data-chair='7'\n   class=\"chair chair-taken\"\n>\n7\n</a>";

        assert_eq!(parse_seats(html), vec![Seat::new("3", "7", true)]);
    }

    #[test]
    fn skips_anchors_missing_attributes() {
        let html = r#"
            <a class="chair" data-chair="1">no row</a>
            <a data-chair="2" data-row="1">no class</a>
            <a href="/help">help</a>
            <abbr class="x" data-chair="3" data-row="1">not an anchor</abbr>
            <a class="chair" data-chair="4" data-row="1">ok</a>
        "#;

        assert_eq!(parse_seats(html), vec![Seat::new("1", "4", false)]);
    }

    #[test]
    fn empty_for_markup_without_seats() {
        assert!(parse_seats("<html><body><p>Sold out</p></body></html>").is_empty());
        assert!(parse_seats("").is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let html = r#"<a class="c" data-chair="1" data-row="1"></a><a class="c" data-chair="1" data-row="1"></a>"#;
        assert_eq!(parse_seats(html).len(), 2);
    }

    fn render(seat: &Seat, order: u8) -> String {
        let class = if seat.occupied { "chair taken" } else { "chair" };
        let attrs = [
            format!("class=\"{}\"", class),
            format!("data-chair=\"{}\"", seat.seat_number),
            format!("data-row=\"{}\"", seat.row),
        ];
        let (a, b, c) = match order % 6 {
            0 => (0, 1, 2),
            1 => (0, 2, 1),
            2 => (1, 0, 2),
            3 => (1, 2, 0),
            4 => (2, 0, 1),
            _ => (2, 1, 0),
        };
        format!(
            "<a href=\"#\" {}\n {} {}>{}</a>\n",
            attrs[a], attrs[b], attrs[c], seat.seat_number
        )
    }

    proptest! {
        #[test]
        fn recovers_rendered_seats(
            seats in prop::collection::vec(("[0-9A-Z]{1,3}", "[0-9a-z]{1,3}", any::<bool>()), 0..40),
            orders in prop::collection::vec(any::<u8>(), 40),
        ) {
            let seats: Vec<Seat> = seats
                .into_iter()
                .map(|(row, number, occupied)| Seat::new(row, number, occupied))
                .collect();
            let html: String = seats
                .iter()
                .zip(orders.iter())
                .map(|(seat, order)| render(seat, *order))
                .collect();

            prop_assert_eq!(parse_seats(&html), seats);
        }
    }
}
