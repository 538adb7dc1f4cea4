//! `!18`, `!navidad` and `!añonuevo`.

use chrono::{DateTime, Datelike, FixedOffset, TimeZone};

pub const COUNTDOWN_COMMANDS: &[&str] = &["18", "navidad", "añonuevo"];

/// Time left until the event named by `command`, measured from `now` in its
/// own offset. `None` for anything that is not a countdown command.
pub fn countdown_message(command: &str, now: DateTime<FixedOffset>) -> Option<String> {
    let year = now.year();
    let (target_year, month, day, event, emoji) = match command {
        "18" => (year, 9, 18, "el 18", "🇨🇱"),
        "navidad" => (year, 12, 25, "Navidad", "🎅"),
        "añonuevo" => (year + 1, 1, 1, "Año Nuevo", "🎆"),
        _ => return None,
    };

    let target = now
        .offset()
        .with_ymd_and_hms(target_year, month, day, 0, 0, 0)
        .single()?;
    let left = target.signed_duration_since(now);

    if left.num_milliseconds() <= 0 {
        return Some(format!("¡Feliz {}! {}", event, emoji));
    }

    Some(format!(
        "Para {} quedan: {} días, {} horas y {} minutos {}",
        event,
        left.num_days(),
        left.num_hours() % 24,
        left.num_minutes() % 60,
        emoji
    ))
}
