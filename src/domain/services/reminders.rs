use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::domain::models::{
    Event, GlobalConfig, Notification, NotificationExtra, NotificationSchedule, NumberKey,
    Student,
};
use crate::domain::services::policy;
use crate::domain::time;

pub const EVENT_ACTION_TYPE: &str = "event_actions";

/// Maps an entity id to the numeric notification id the platform requires.
/// Deterministic so the same entity always lands on the same slot, which is
/// what makes cancel-by-id work. Collision-tolerant, not collision-free: two
/// ids may hash alike, and that risk is accepted rather than resolved.
pub fn numeric_id(id: &str) -> u32 {
    let mut hash: i32 = 0;
    for byte in id.bytes() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(byte));
    }
    hash.unsigned_abs()
}

/// Notifications are only scheduled when the fire time is in the future and
/// at most `window_days` ahead; anything beyond is silently skipped.
fn within_window(at: NaiveDateTime, now: NaiveDateTime, window_days: i64) -> bool {
    let diff = at - now;
    diff > chrono::Duration::zero() && diff <= chrono::Duration::days(window_days)
}

fn notify_event_at(
    event: &Event,
    student: &Student,
    config: &GlobalConfig,
    now: NaiveDateTime,
    window_days: i64,
) -> Option<NaiveDateTime> {
    if event.date.is_empty() || event.time.is_empty() {
        return None;
    }
    let start = time::parse_date(&event.date, &event.time)?;
    let minutes_before = policy::resolve_number(
        &event.policy,
        Some(&student.policy),
        config,
        NumberKey::MinutesBefore,
    );
    let at = start - chrono::Duration::milliseconds((minutes_before * 60_000.0) as i64);
    within_window(at, now, window_days).then_some(at)
}

/// Builds the reminder for one lesson, or `None` when the lesson does not
/// qualify (missing fields, fire time outside the window).
pub fn event_notification(
    event: &Event,
    student: &Student,
    config: &GlobalConfig,
    now: NaiveDateTime,
    window_days: i64,
) -> Option<Notification> {
    if event.id_event.is_empty() || event.id_student.is_empty() {
        return None;
    }
    let at = notify_event_at(event, student, config, now, window_days)?;

    let name = collapse_whitespace(&student.student_name);
    let phone = if student.student_phone.is_empty() {
        &student.parent_phone
    } else {
        &student.student_phone
    };
    let minutes_before = policy::resolve_number(
        &event.policy,
        Some(&student.policy),
        config,
        NumberKey::MinutesBefore,
    );
    let duration = policy::resolve_number(
        &event.policy,
        Some(&student.policy),
        config,
        NumberKey::Duration,
    );

    Some(Notification {
        id: numeric_id(&event.id_event),
        title: name.clone(),
        body: format!(
            "Your next lesson with {} starts in {} (length: {})",
            name,
            time::format_duration(minutes_before / 60.0),
            time::format_duration(duration),
        ),
        schedule: NotificationSchedule {
            at,
            allow_while_idle: true,
        },
        extra: NotificationExtra {
            event_id: Some(event.id_event.clone()),
            student_id: None,
            whatsapp: whatsapp_link(phone),
            maps: maps_link(&student.address),
        },
        action_type_id: Some(EVENT_ACTION_TYPE.to_string()),
    })
}

/// Next occurrence of a "YYYY-MM-DD" birthday, rolled a year forward when this
/// year's date has already passed. A Feb 29 birthday falls on Mar 1 in
/// non-leap years.
pub fn next_birthday(dob: &str, today: NaiveDate) -> Option<NaiveDate> {
    let dob = NaiveDate::parse_from_str(dob, time::DATE_FMT).ok()?;
    let candidate = birthday_on(today.year(), dob.month(), dob.day())?;
    if candidate < today {
        birthday_on(today.year() + 1, dob.month(), dob.day())
    } else {
        Some(candidate)
    }
}

fn birthday_on(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
        return Some(date);
    }
    if month == 2 && day == 29 {
        return NaiveDate::from_ymd_opt(year, 3, 1);
    }
    None
}

fn notify_birthday_at(
    dob: &str,
    config: &GlobalConfig,
    now: NaiveDateTime,
    window_days: i64,
) -> Option<NaiveDateTime> {
    let birthday = next_birthday(dob, now.date())?;
    let fire_day = if config.notify_birthday_day_before {
        birthday.pred_opt()?
    } else {
        birthday
    };
    let at = fire_day.and_hms_opt(9, 0, 0)?;
    within_window(at, now, window_days).then_some(at)
}

/// Builds the birthday notification for one student, or `None` when no dob is
/// recorded or the fire time falls outside the window.
pub fn birthday_notification(
    student: &Student,
    config: &GlobalConfig,
    now: NaiveDateTime,
    window_days: i64,
) -> Option<Notification> {
    if student.id_student.is_empty() || student.student_name.is_empty() || student.dob.is_empty()
    {
        return None;
    }
    let at = notify_birthday_at(&student.dob, config, now, window_days)?;

    let name = collapse_whitespace(&student.student_name);
    let body = if config.notify_birthday_day_before {
        format!("{} has a birthday tomorrow! 🎉🎂", name)
    } else {
        format!("{} has a birthday today! 🎉🎂", name)
    };

    Some(Notification {
        id: numeric_id(&student.id_student),
        title: format!("{}'s birthday", name),
        body,
        schedule: NotificationSchedule {
            at,
            allow_while_idle: true,
        },
        extra: NotificationExtra {
            event_id: None,
            student_id: Some(student.id_student.clone()),
            whatsapp: None,
            maps: None,
        },
        action_type_id: None,
    })
}

/// Returns today's ISO date when the stored refresh stamp is from another day,
/// `None` when the daily refresh already ran.
pub fn is_new_day(last_refresh: Option<&str>, today: NaiveDate) -> Option<String> {
    let today = time::date_iso(today);
    match last_refresh {
        Some(last) if last == today => None,
        _ => Some(today),
    }
}

pub fn whatsapp_link(phone: &str) -> Option<String> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        None
    } else {
        Some(format!("https://wa.me/{}", digits))
    }
}

pub fn maps_link(address: &str) -> Option<String> {
    let address = address.trim();
    if address.is_empty() {
        None
    } else {
        Some(format!(
            "https://www.google.com/maps/dir/?api=1&destination={}",
            percent_encode(address)
        ))
    }
}

fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn collapse_whitespace(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Setting;
    use chrono::{Duration, Timelike};

    const WINDOW: i64 = 7;

    // Lesson times only carry minute precision, so tests anchor on a whole
    // minute to compare fire times exactly.
    fn now_minute() -> NaiveDateTime {
        time::now().with_second(0).unwrap().with_nanosecond(0).unwrap()
    }

    fn student() -> Student {
        let mut student = Student::new("Ana  Souza");
        student.id_student = "student_1".into();
        student.student_phone = "+55 (11) 98765-4321".into();
        student.address = "Rua A, 123".into();
        student
    }

    fn event_at(start: NaiveDateTime) -> Event {
        let mut event = Event::new();
        event.id_event = "event_1".into();
        event.id_student = "student_1".into();
        event.date = time::date_iso(start.date());
        event.time = time::time_iso(start);
        event.policy.minutes_before = Setting::Num(15.0);
        event.policy.duration = Setting::Num(1.0);
        event
    }

    #[test]
    fn hash_is_deterministic_and_numeric() {
        let a = numeric_id("event_4fe2b1aa-0001");
        let b = numeric_id("event_4fe2b1aa-0001");
        assert_eq!(a, b);
        assert_ne!(a, numeric_id("event_4fe2b1aa-0002"));
    }

    #[test]
    fn event_six_days_out_is_eligible() {
        let now = now_minute();
        let event = event_at(now + Duration::days(6) + Duration::hours(23));
        let config = GlobalConfig::default();
        assert!(event_notification(&event, &student(), &config, now, WINDOW).is_some());
    }

    #[test]
    fn event_eight_days_out_is_skipped() {
        let now = now_minute();
        let event = event_at(now + Duration::days(8));
        let config = GlobalConfig::default();
        assert!(event_notification(&event, &student(), &config, now, WINDOW).is_none());
    }

    #[test]
    fn past_fire_time_is_skipped() {
        let now = now_minute();
        let event = event_at(now + Duration::minutes(10)); // fires at -5min with 15min lead
        let config = GlobalConfig::default();
        assert!(event_notification(&event, &student(), &config, now, WINDOW).is_none());
    }

    #[test]
    fn reminder_carries_deep_links_and_clean_name() {
        let now = now_minute();
        let event = event_at(now + Duration::days(1));
        let config = GlobalConfig::default();
        let n = event_notification(&event, &student(), &config, now, WINDOW).unwrap();
        assert_eq!(n.title, "Ana Souza");
        assert_eq!(n.extra.whatsapp.as_deref(), Some("https://wa.me/5511987654321"));
        assert!(n.extra.maps.as_deref().unwrap().contains("Rua%20A%2C%20123"));
        assert_eq!(n.action_type_id.as_deref(), Some(EVENT_ACTION_TYPE));
        assert_eq!(n.schedule.at, (now + Duration::days(1)) - Duration::minutes(15));
    }

    #[test]
    fn parent_phone_is_the_fallback_contact() {
        let now = now_minute();
        let event = event_at(now + Duration::days(1));
        let mut s = student();
        s.student_phone = String::new();
        s.parent_phone = "+55 11 91111-2222".into();
        let config = GlobalConfig::default();
        let n = event_notification(&event, &s, &config, now, WINDOW).unwrap();
        assert_eq!(n.extra.whatsapp.as_deref(), Some("https://wa.me/5511911112222"));
    }

    #[test]
    fn birthday_rolls_to_next_year_when_passed() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(
            next_birthday("2015-03-10", today),
            NaiveDate::from_ymd_opt(2027, 3, 10)
        );
        assert_eq!(
            next_birthday("2015-11-10", today),
            NaiveDate::from_ymd_opt(2026, 11, 10)
        );
        assert_eq!(
            next_birthday("2015-08-06", today),
            NaiveDate::from_ymd_opt(2026, 8, 6)
        );
    }

    #[test]
    fn day_before_shift_moves_fire_time() {
        let now = NaiveDate::from_ymd_opt(2026, 8, 6)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let mut s = student();
        s.dob = "2015-08-10".into();

        let mut config = GlobalConfig::default();
        config.notify_birthday_day_before = true;
        let n = birthday_notification(&s, &config, now, WINDOW).unwrap();
        assert_eq!(
            n.schedule.at,
            NaiveDate::from_ymd_opt(2026, 8, 9)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
        );
        assert!(n.body.contains("tomorrow"));

        config.notify_birthday_day_before = false;
        let n = birthday_notification(&s, &config, now, WINDOW).unwrap();
        assert_eq!(
            n.schedule.at,
            NaiveDate::from_ymd_opt(2026, 8, 10)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap()
        );
        assert!(n.body.contains("today"));
    }

    #[test]
    fn missing_dob_produces_nothing() {
        let now = time::now();
        let config = GlobalConfig::default();
        assert!(birthday_notification(&student(), &config, now, WINDOW).is_none());
    }

    #[test]
    fn new_day_detection() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(is_new_day(None, today), Some("2026-08-06".into()));
        assert_eq!(is_new_day(Some("2026-08-05"), today), Some("2026-08-06".into()));
        assert_eq!(is_new_day(Some("2026-08-06"), today), None);
    }
}
