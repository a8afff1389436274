//! Calendar listing command.

use lifely_core::Calendar;

use crate::commands::open_session;
use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Lists the calendars on the account, primary first.
pub async fn run(config: &ClientConfig) -> ClientResult<()> {
    let session = open_session(config)?;
    let client = session.calendar_client().await?;
    let mut calendars = client.list_calendars().await?;

    if calendars.is_empty() {
        println!("No calendars found.");
        return Ok(());
    }

    sort_primary_first(&mut calendars);
    for calendar in &calendars {
        println!("{}", format_calendar(calendar));
    }
    Ok(())
}

fn sort_primary_first(calendars: &mut [Calendar]) {
    calendars.sort_by(|a, b| {
        b.primary
            .cmp(&a.primary)
            .then_with(|| a.summary.to_lowercase().cmp(&b.summary.to_lowercase()))
    });
}

fn format_calendar(calendar: &Calendar) -> String {
    let marker = if calendar.primary { "*" } else { " " };
    match calendar.access_role.as_deref() {
        Some(role) => format!("{} {} ({}) [{}]", marker, calendar.summary, calendar.id, role),
        None => format!("{} {} ({})", marker, calendar.summary, calendar.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar(id: &str, summary: &str, primary: bool) -> Calendar {
        Calendar {
            id: id.to_string(),
            summary: summary.to_string(),
            primary,
            ..Default::default()
        }
    }

    #[test]
    fn primary_sorts_first() {
        let mut calendars = vec![
            calendar("b", "birthdays", false),
            calendar("me@example.com", "Me", true),
            calendar("a", "Alpha", false),
        ];
        sort_primary_first(&mut calendars);
        let ids: Vec<_> = calendars.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["me@example.com", "a", "b"]);
    }

    #[test]
    fn format_marks_primary() {
        let mut cal = calendar("me@example.com", "Me", true);
        assert_eq!(format_calendar(&cal), "* Me (me@example.com)");
        cal.primary = false;
        cal.access_role = Some("reader".to_string());
        assert_eq!(format_calendar(&cal), "  Me (me@example.com) [reader]");
    }
}
