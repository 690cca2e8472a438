use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use alive_db::models::{CheckinRow, NewCheckin};
use alive_db::{DbError, SharedStore, blocking, format_date, format_timestamp, parse_date};
use alive_types::api::CheckinStats;
use alive_types::models::Checkin;
use alive_types::status::CheckinStatus;

use crate::convert;
use crate::error::{CoreError, CoreResult};

/// How many check-ins the stats view shows.
pub const RECENT_CHECKINS: u32 = 7;

/// Record today's check-in for a user.
///
/// "Today" is the UTC calendar date of `now`. The insert and the
/// `last_checkin` refresh commit together.
pub async fn daily_checkin(
    store: &SharedStore,
    user_id: Uuid,
    status: Option<&str>,
    message: Option<String>,
    now: DateTime<Utc>,
) -> CoreResult<Checkin> {
    let raw = status
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::validation("status is required"))?;
    let status = CheckinStatus::parse(raw)
        .ok_or_else(|| CoreError::validation(format!("unknown status '{raw}'")))?;
    let message = message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

    let today = format_date(now.date_naive());
    let uid = user_id.to_string();

    let (u, d) = (uid.clone(), today.clone());
    if blocking(store, move |s| s.get_checkin_on(&u, &d)).await?.is_some() {
        return Err(already_checked_in());
    }

    let row = NewCheckin {
        id: Uuid::new_v4().to_string(),
        user_id: uid.clone(),
        checkin_date: today.clone(),
        status: status.as_str().to_string(),
        message,
        created_at: format_timestamp(now),
    };
    // The pre-check is advisory; the (user, date) index decides races
    let inserted = row.clone();
    blocking(store, move |s| s.record_checkin(&inserted))
        .await
        .map_err(|e| match e {
            DbError::UniqueViolation { .. } => already_checked_in(),
            other => other.into(),
        })?;

    info!(%user_id, date = %today, status = %status, "Checked in");
    Ok(convert::checkin(CheckinRow {
        id: row.id,
        user_id: row.user_id,
        checkin_date: row.checkin_date,
        status: row.status,
        message: row.message,
        created_at: row.created_at,
    }))
}

fn already_checked_in() -> CoreError {
    CoreError::conflict("already checked in today")
}

/// Today's status, the last week of check-ins and the streak.
pub async fn compute_stats(
    store: &SharedStore,
    user_id: Uuid,
    today: NaiveDate,
) -> CoreResult<CheckinStats> {
    let uid = user_id.to_string();
    let day = format_date(today);

    let (today_row, recent, dates, total) = blocking(store, move |s| {
        Ok((
            s.get_checkin_on(&uid, &day)?,
            s.recent_checkins(&uid, RECENT_CHECKINS)?,
            s.checkin_dates(&uid)?,
            s.count_checkins(&uid)?,
        ))
    })
    .await?;

    let dates = streak_dates(user_id, &dates);
    let today_checkin = today_row.map(convert::checkin);

    Ok(CheckinStats {
        has_checked_in_today: today_checkin.is_some(),
        today_checkin,
        recent_checkins: recent.into_iter().map(convert::checkin).collect(),
        consecutive_days: consecutive_days(&dates),
        total_checkins: total,
    })
}

/// Parsed dates, newest first, up to the first unreadable one. A corrupt
/// row is a gap of unknown size, so the run can't be counted past it.
fn streak_dates(user_id: Uuid, raw_desc: &[String]) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(raw_desc.len());
    for raw in raw_desc {
        match parse_date(raw) {
            Some(date) => dates.push(date),
            None => {
                warn!(%user_id, date = %raw, "Corrupt check-in date, streak stops here");
                break;
            }
        }
    }
    dates
}

/// Length of the contiguous run of days at the head of `dates_desc`.
///
/// Not anchored to today: a run that ended last week still counts.
pub fn consecutive_days(dates_desc: &[NaiveDate]) -> u32 {
    if dates_desc.is_empty() {
        return 0;
    }
    let mut count = 1;
    for pair in dates_desc.windows(2) {
        if pair[0] - pair[1] == Duration::days(1) {
            count += 1;
        } else {
            break;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use chrono::TimeZone;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, d).unwrap()
    }

    #[test]
    fn streak_counts_contiguous_days() {
        assert_eq!(consecutive_days(&[day(10), day(9), day(8)]), 3);
        assert_eq!(consecutive_days(&[day(10), day(8)]), 1);
        assert_eq!(consecutive_days(&[day(10), day(9), day(7), day(6)]), 2);
        assert_eq!(consecutive_days(&[]), 0);
    }

    #[test]
    fn streak_is_not_anchored_to_today() {
        // Latest check-in is days old; the run ending there still counts
        assert_eq!(consecutive_days(&[day(3), day(2), day(1)]), 3);
    }

    #[test]
    fn corrupt_date_ends_the_streak() {
        let raw: Vec<String> = ["2026-04-10", "2026-04-09", "04/08/2026", "2026-04-08", "2026-04-07"]
            .iter()
            .map(|d| d.to_string())
            .collect();
        let dates = streak_dates(Uuid::new_v4(), &raw);
        assert_eq!(dates, vec![day(10), day(9)]);
        assert_eq!(consecutive_days(&dates), 2);
    }

    #[tokio::test]
    async fn no_checkins_means_empty_stats() {
        let store = testutil::store();
        let uid = testutil::add_user(&store, "a@example.com", "alice");
        let stats = compute_stats(&store, uid, day(10)).await.unwrap();
        assert!(!stats.has_checked_in_today);
        assert!(stats.today_checkin.is_none());
        assert_eq!(stats.consecutive_days, 0);
        assert_eq!(stats.total_checkins, 0);
    }

    #[tokio::test]
    async fn second_checkin_same_day_conflicts() {
        let store = testutil::store();
        let uid = testutil::add_user(&store, "a@example.com", "alice");
        let now = Utc.with_ymd_and_hms(2026, 4, 10, 9, 0, 0).unwrap();

        daily_checkin(&store, uid, Some("Good"), None, now).await.unwrap();
        let later = now + Duration::hours(3);
        let err = daily_checkin(&store, uid, Some("Tired"), None, later)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn concurrent_checkins_yield_one_conflict() {
        let store = testutil::store();
        let uid = testutil::add_user(&store, "a@example.com", "alice");
        let now = Utc.with_ymd_and_hms(2026, 4, 10, 9, 0, 0).unwrap();

        let (a, b) = tokio::join!(
            daily_checkin(&store, uid, Some("Good"), None, now),
            daily_checkin(&store, uid, Some("OK"), None, now),
        );
        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(CoreError::Conflict(_))))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn invalid_status_is_rejected() {
        let store = testutil::store();
        let uid = testutil::add_user(&store, "a@example.com", "alice");
        for status in [None, Some("  "), Some("Ecstatic")] {
            let err = daily_checkin(&store, uid, status, None, Utc::now())
                .await
                .unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn stats_reflect_history() {
        let store = testutil::store();
        let uid = testutil::add_user(&store, "a@example.com", "alice");
        for d in [7, 8, 9, 10] {
            let at = Utc.with_ymd_and_hms(2026, 4, d, 8, 0, 0).unwrap();
            daily_checkin(&store, uid, Some("Good"), Some(" ok ".into()), at).await.unwrap();
        }

        let stats = compute_stats(&store, uid, day(10)).await.unwrap();
        assert!(stats.has_checked_in_today);
        assert_eq!(stats.consecutive_days, 4);
        assert_eq!(stats.total_checkins, 4);
        assert_eq!(stats.recent_checkins[0].date, day(10));
        assert_eq!(stats.recent_checkins[0].message.as_deref(), Some("ok"));
        assert_eq!(stats.recent_checkins[0].presentation.emoji, "😊");

        // Next day, nothing yet: streak still reports the stale run
        let stats = compute_stats(&store, uid, day(11)).await.unwrap();
        assert!(!stats.has_checked_in_today);
        assert_eq!(stats.consecutive_days, 4);
    }

    #[tokio::test]
    async fn recent_checkins_are_capped() {
        let store = testutil::store();
        let uid = testutil::add_user(&store, "a@example.com", "alice");
        for d in 1..=9 {
            let at = Utc.with_ymd_and_hms(2026, 4, d, 8, 0, 0).unwrap();
            daily_checkin(&store, uid, Some("OK"), None, at).await.unwrap();
        }
        let stats = compute_stats(&store, uid, day(9)).await.unwrap();
        assert_eq!(stats.recent_checkins.len(), RECENT_CHECKINS as usize);
        assert_eq!(stats.total_checkins, 9);
    }
}
