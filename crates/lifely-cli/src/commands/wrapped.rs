//! Year summary command.

use std::io::Write;
use std::time::Duration;

use chrono::{Datelike, Local, Utc};
use lifely_core::{FriendStats, TimeStats, compute_friend_stats, compute_time_stats, normalize_events};
use lifely_google::ProgressFn;
use lifely_render::{Bar, MotionPreference, ProgressDots, animate_bars, count_up, typewriter};
use tracing::info;

use crate::cache::{EventCache, RawEvents, StatsReport};
use crate::cli::WrappedArgs;
use crate::commands::open_session;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

const STEPS: [&str; 4] = ["Signing in", "Fetching events", "Crunching numbers", "Your year"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const BAR_COLUMNS: usize = 30;
const COUNT_UP_DURATION: Duration = Duration::from_millis(1200);
const TYPEWRITER_STEP: Duration = Duration::from_millis(40);

/// Builds and prints the summary for one year.
pub async fn run(
    args: WrappedArgs,
    config: &ClientConfig,
    motion: MotionPreference,
) -> ClientResult<()> {
    let year = args.year.unwrap_or_else(|| Local::now().year());
    let tz = config.wrapped.timezone().map_err(ClientError::Config)?;
    let top = args.top.unwrap_or(config.wrapped.top);
    let cache = EventCache::new(config.wrapped.data_dir());
    let mut dots = ProgressDots::new(STEPS.len());

    let cached = if args.no_cache {
        None
    } else {
        cache.load_raw(year)?
    };

    let raw = match cached {
        Some(raw) => {
            info!("using cached events from {}", cache.raw_path(year).display());
            dots.set_current(2);
            raw
        }
        None => {
            show_step(&dots);
            let session = open_session(config)?;
            let client = session.calendar_client().await?;
            let user = client.fetch_user_info().await?;

            dots.advance();
            show_step(&dots);
            let mut on_page = |total: usize| eprint!("\r  {} events", total);
            let progress: ProgressFn<'_> = &mut on_page;
            let events = client
                .fetch_calendar_events_in(year, &tz, Some(progress))
                .await?;
            eprintln!();

            let raw = RawEvents {
                year,
                user_email: user.email,
                fetched_at: Utc::now(),
                events,
            };
            let path = cache.save_raw(&raw)?;
            info!("cached {} events at {}", raw.events.len(), path.display());
            dots.advance();
            raw
        }
    };

    show_step(&dots);
    let events = normalize_events(&raw.events, &raw.user_email, tz);
    let time_stats = compute_time_stats(&events);
    let friend_stats = compute_friend_stats(&events, config.wrapped.min_events);

    let stats_path = cache.save_stats(&StatsReport {
        year,
        time_stats: &time_stats,
        friend_stats: &friend_stats,
    })?;

    dots.advance();
    show_step(&dots);
    eprintln!();

    if time_stats.total_events == 0 {
        println!("No events found for {}.", year);
        return Ok(());
    }

    print_summary(year, &time_stats, &friend_stats, top, motion).await;
    println!();
    println!("Stats saved to {}", stats_path.display());
    Ok(())
}

fn show_step(dots: &ProgressDots) {
    eprintln!("{}  {}", dots.render(), STEPS[dots.current()]);
}

async fn print_summary(
    year: i32,
    time_stats: &TimeStats,
    friend_stats: &[FriendStats],
    top: usize,
    motion: MotionPreference,
) {
    let title = format!("Your {}, wrapped", year);
    typewriter(&title, TYPEWRITER_STEP, motion, |shown| {
        print!("\r{}", shown);
        let _ = std::io::stdout().flush();
    })
    .await;
    println!();
    println!();

    count_up(
        time_stats.total_events as u64,
        COUNT_UP_DURATION,
        motion,
        |value| {
            print!("\r  {:>6} events", value);
            let _ = std::io::stdout().flush();
        },
    )
    .await;
    println!();
    count_up(
        time_stats.total_hours.round() as u64,
        COUNT_UP_DURATION,
        motion,
        |value| {
            print!("\r  {:>6} hours", value);
            let _ = std::io::stdout().flush();
        },
    )
    .await;
    println!();
    println!();

    for line in month_lines(time_stats, motion) {
        println!("{}", line);
    }
    println!();

    for line in highlight_lines(time_stats) {
        println!("{}", line);
    }

    let people = friend_lines(friend_stats, top);
    if !people.is_empty() {
        println!();
        println!("  Who you spent it with");
        for line in people {
            println!("{}", line);
        }
    }
}

/// One bar per month, scaled to the busiest month.
fn month_lines(time_stats: &TimeStats, motion: MotionPreference) -> Vec<String> {
    let counts: Vec<usize> = (1..=12u32)
        .map(|m| time_stats.events_per_month.get(&m).copied().unwrap_or(0))
        .collect();
    let max = counts.iter().copied().max().unwrap_or(0) as f64;

    let mut bars: Vec<Bar> = counts
        .iter()
        .map(|&count| Bar::proportional(count as f64, max))
        .collect();
    animate_bars(&mut bars, motion);

    MONTHS
        .iter()
        .zip(counts.iter().zip(bars.iter()))
        .map(|(name, (count, bar))| {
            format!("  {} {:<width$} {}", name, bar_text(bar), count, width = BAR_COLUMNS)
        })
        .collect()
}

/// Renders a bar at its applied width, or its target when motion is reduced.
fn bar_text(bar: &Bar) -> String {
    let percent = bar
        .width()
        .and_then(|w| w.trim_end_matches('%').parse::<f64>().ok())
        .or_else(|| bar.target_percent())
        .unwrap_or(0.0);
    let cells = (percent / 100.0 * BAR_COLUMNS as f64).round() as usize;
    "█".repeat(cells.min(BAR_COLUMNS))
}

fn highlight_lines(time_stats: &TimeStats) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(name) = time_stats
        .busiest_month()
        .and_then(|m| m.checked_sub(1))
        .and_then(|i| MONTHS.get(i as usize))
    {
        lines.push(format!("  Busiest month:   {}", name));
    }
    if let Some(day) = time_stats.busiest_weekday() {
        lines.push(format!("  Favourite day:   {}", day));
    }
    if let Some(ref day) = time_stats.busiest_day {
        lines.push(format!(
            "  Busiest day:     {} ({} events, {:.1}h)",
            day.date, day.event_count, day.hours
        ));
    }
    lines
}

fn friend_lines(friend_stats: &[FriendStats], top: usize) -> Vec<String> {
    friend_stats
        .iter()
        .take(top)
        .enumerate()
        .map(|(idx, friend)| {
            format!(
                "  {:>2}. {:<32} {:>4} events {:>7.1}h",
                idx + 1,
                friend.label(),
                friend.event_count,
                friend.total_hours
            )
        })
        .collect()
}
