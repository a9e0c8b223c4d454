//! Тексты, которые бот отправляет пользователю.

use crate::models::{SeatGroup, Subscription, SubscriptionKey};

pub const BUTTON_FIND: &str = "🔍 Find Available Seats";
pub const BUTTON_MONITOR: &str = "➕ Monitor Show";
pub const BUTTON_MY_SHOWS: &str = "📋 My Monitored Shows";
pub const BUTTON_STOP: &str = "❌ Stop Monitoring";
pub const BUTTON_HELP: &str = "❓ Help";

pub const MAIN_MENU: &[&[&str]] = &[
    &[BUTTON_FIND, BUTTON_MONITOR],
    &[BUTTON_MY_SHOWS, BUTTON_STOP],
    &[BUTTON_HELP],
];

pub const WELCOME: &str = "🎭 Welcome to Theater Seat Finder Bot!\n\
I'll help you find available seats for shows.\n\
Use the buttons below or commands:\n\
/find - Find available seats\n\
/monitor - Monitor a show\n\
/myshows - View your monitored shows\n\
/stop - Stop monitoring shows\n\
/help - Show help information";

pub const HELP: &str = "❓ Theater Seat Finder Bot Help\n\
1. Send me a show URL to find seats\n\
2. Use /monitor to watch a show\n\
3. I'll notify you when seats become available\n\
Available commands:\n\
/find - Find available seats\n\
/monitor - Monitor a show\n\
/myshows - View your monitored shows\n\
/stop - Stop monitoring shows\n\
/maxrow <show id> - Change the maximum row of a monitored show\n\
/help - Show this help\n\
Use the buttons at the bottom of your screen for quick access!";

pub const ASK_URL: &str = "Please send me the show URL";
pub const ASK_MONITOR_URL: &str = "Please send me the show URL to monitor";
pub const ASK_MIN_SEATS: &str = "How many adjacent seats do you need? (Enter a number)";
pub const ASK_MAX_ROW: &str =
    "What is the maximum row number you want to consider? (Enter a number, or 0 for unlimited)";
pub const ASK_NEW_MAX_ROW: &str =
    "What is the new maximum row number you want to consider? (Enter a number, or 0 for unlimited)";
pub const INVALID_NUMBER: &str = "Please enter a valid number.";
pub const INVALID_MIN_SEATS: &str = "Please enter a number of at least 1.";
pub const INVALID_MAX_ROW: &str = "Please enter a valid number (0 for unlimited).";
pub const INVALID_URL: &str = "Invalid URL format. Please send a valid URL";
pub const UNKNOWN_INPUT: &str = "Please send a valid show URL or use the menu buttons.";
pub const NO_SEATS: &str = "No available seats found or error occurred.";
pub const NO_GROUPS: &str = "No adjacent seats found that meet your criteria.";
pub const SHOW_NOT_FOUND: &str = "❌ Show not found.";
pub const NOT_MONITORING: &str = "You are not monitoring any shows.";
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong. Please try again.";

/// Уведомление о новых группах мест по одной подписке.
#[derive(Debug, Clone)]
pub struct Notification {
    pub theater_id: String,
    pub new_groups: Vec<SeatGroup>,
    pub total_groups: usize,
    pub source_url: Option<String>,
}

impl Notification {
    pub fn render(&self) -> String {
        let mut message = format!("🎉 New available seats found for show {}!\n", self.theater_id);
        message.push_str(&numbered_groups(&self.new_groups));
        message.push_str(&format!("\nTotal available groups: {}", self.total_groups));
        if let Some(url) = &self.source_url {
            message.push_str(&format!("\n🔗 {}", url));
        }
        message
    }
}

fn numbered_groups(groups: &[SeatGroup]) -> String {
    groups
        .iter()
        .enumerate()
        .map(|(i, g)| {
            format!(
                "{}. {} adjacent seats: Row {}, Chair {} - {}\n",
                i + 1,
                g.count,
                g.row,
                g.start_seat,
                g.end_seat
            )
        })
        .collect()
}

pub fn max_row_label(row_ceiling: Option<u32>) -> String {
    match row_ceiling {
        Some(row) => row.to_string(),
        None => "Unlimited".to_string(),
    }
}

pub fn find_result(groups: &[SeatGroup]) -> String {
    if groups.is_empty() {
        return NO_GROUPS.to_string();
    }
    format!(
        "Found {} groups of adjacent seats:\n{}",
        groups.len(),
        numbered_groups(groups)
    )
}

pub fn subscription_list(shows: &[(SubscriptionKey, Subscription)]) -> String {
    if shows.is_empty() {
        return format!(
            "{}\nUse the '{}' button to start monitoring!",
            NOT_MONITORING, BUTTON_MONITOR
        );
    }

    let mut message = String::from("📋 Your monitored shows:\n");
    for (_, show) in shows {
        message.push_str(&format!("• Show ID: {}\n", show.target_id));
        message.push_str(&format!("  Min seats: {}\n", show.min_run));
        message.push_str(&format!("  Max row: {}\n", max_row_label(show.row_ceiling)));
        message.push_str(&format!("  Last checked: {} groups found\n", show.last_groups.len()));
        message.push_str(&format!(
            "  Manage: /maxrow {} · /stop {}\n",
            show.target_id, show.target_id
        ));
    }
    message
}

pub fn stop_menu(shows: &[(SubscriptionKey, Subscription)]) -> String {
    if shows.is_empty() {
        return NOT_MONITORING.to_string();
    }

    let mut message = String::from("Select a show to stop monitoring:\n");
    for (_, show) in shows {
        message.push_str(&format!(
            "/stop {} (Min: {})\n",
            show.target_id, show.min_run
        ));
    }
    message
}

pub fn found_show(theater_id: &str) -> String {
    format!("Found show ID: {}", theater_id)
}

pub fn monitoring_started(subscription: &Subscription) -> String {
    format!(
        "✅ Successfully started monitoring show {} for {} adjacent seats!\n\
         Maximum row: {}\n\
         I'll notify you when available seats are found.",
        subscription.target_id,
        subscription.min_run,
        max_row_label(subscription.row_ceiling)
    )
}

pub fn monitoring_stopped(subscription: &Subscription) -> String {
    format!("✅ Successfully stopped monitoring show {}", subscription.target_id)
}

pub fn max_row_updated(subscription: &Subscription) -> String {
    let status = match subscription.row_ceiling {
        Some(row) => row.to_string(),
        None => "unlimited".to_string(),
    };
    format!(
        "✅ Successfully updated max row to {} for show {}.",
        status, subscription.target_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_lists_new_groups_and_total() {
        let notification = Notification {
            theater_id: "4521".to_string(),
            new_groups: vec![SeatGroup::new("5", "1", "2", 2), SeatGroup::new("5", "4", "6", 3)],
            total_groups: 4,
            source_url: Some("https://example.com/?showURL=4521".to_string()),
        };

        assert_eq!(
            notification.render(),
            "🎉 New available seats found for show 4521!\n\
             1. 2 adjacent seats: Row 5, Chair 1 - 2\n\
             2. 3 adjacent seats: Row 5, Chair 4 - 6\n\
             \nTotal available groups: 4\n\
             🔗 https://example.com/?showURL=4521"
        );
    }

    #[test]
    fn notification_without_link() {
        let notification = Notification {
            theater_id: "1".to_string(),
            new_groups: vec![SeatGroup::new("A", "3", "4", 2)],
            total_groups: 1,
            source_url: None,
        };

        assert!(notification.render().ends_with("Total available groups: 1"));
    }

    #[test]
    fn list_shows_unlimited_rows() {
        let sub = Subscription::new(1, "77", 3, None, None);
        let text = subscription_list(&[(sub.key(), sub)]);

        assert!(text.contains("• Show ID: 77"));
        assert!(text.contains("Min seats: 3"));
        assert!(text.contains("Max row: Unlimited"));
        assert!(text.contains("Last checked: 0 groups found"));
    }

    #[test]
    fn empty_find_result() {
        assert_eq!(find_result(&[]), NO_GROUPS);
    }
}
