//! Daily statistics, streak and dashboard aggregates

use chrono::{Days, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};

use super::sqlite::{format_timestamp, parse_date, Result, Storage};
use crate::model::{DailyStats, DashboardData, PillarProgress};

/// Longest history the streak walk looks at
const STREAK_WINDOW: i64 = 365;

/// Days of history shown as recent activity, today included
const RECENT_ACTIVITY_DAYS: u64 = 7;

impl Storage {
    /// Counters for one date; an all-zero row when nothing was reviewed
    pub fn get_daily_stats(&self, date: NaiveDate) -> Result<DailyStats> {
        let reader = self.lock_reader()?;
        let stats = reader
            .query_row(
                "SELECT * FROM daily_stats WHERE date = ?1",
                params![date.to_string()],
                row_to_stats,
            )
            .optional()?;
        Ok(stats.unwrap_or_else(|| DailyStats::empty(date)))
    }

    /// Stored rows between `start` and `end` inclusive, oldest first
    pub fn get_stats_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyStats>> {
        let reader = self.lock_reader()?;
        stats_between(&reader, start, end, "ASC")
    }

    /// Consecutive days with reviews, ending today
    pub fn calculate_streak(&self) -> Result<i64> {
        let today = self.today();
        let reader = self.lock_reader()?;
        streak_at(&reader, today)
    }

    pub fn get_dashboard_data(&self) -> Result<DashboardData> {
        let now = self.now();
        let today = self.day_boundary.date_of(now);
        let reader = self.lock_reader()?;

        let due_today: i64 = reader.query_row(
            "SELECT COUNT(*) FROM cards
             WHERE state != 0 AND due IS NOT NULL AND due <= ?1",
            params![format_timestamp(now)],
            |row| row.get(0),
        )?;

        let new_available: i64 =
            reader.query_row("SELECT COUNT(*) FROM cards WHERE state = 0", [], |row| row.get(0))?;

        let reviewed_today: i64 = reader
            .query_row(
                "SELECT COALESCE(cards_reviewed, 0) FROM daily_stats WHERE date = ?1",
                params![today.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(0);

        let mut stmt = reader.prepare(
            "SELECT
                p.id, p.name, p.icon, p.color,
                COUNT(c.id) AS total,
                COALESCE(SUM(CASE WHEN c.state = 2 THEN 1 ELSE 0 END), 0) AS mastered
             FROM pillars p
             LEFT JOIN domains d ON d.pillar_id = p.id
             LEFT JOIN topics t ON t.domain_id = d.id
             LEFT JOIN cards c ON c.topic_id = t.id
             GROUP BY p.id
             ORDER BY p.sort_order, p.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PillarProgress {
                pillar_id: row.get("id")?,
                name: row.get("name")?,
                icon: row.get("icon")?,
                color: row.get("color")?,
                total: row.get("total")?,
                mastered: row.get("mastered")?,
            })
        })?;
        let mut pillar_progress = Vec::new();
        for row in rows {
            pillar_progress.push(row?);
        }

        let week_start = today
            .checked_sub_days(Days::new(RECENT_ACTIVITY_DAYS - 1))
            .unwrap_or(today);
        let recent_activity = stats_between(&reader, week_start, today, "DESC")?;

        let streak = streak_at(&reader, today)?;

        Ok(DashboardData {
            due_today,
            new_available,
            reviewed_today,
            streak,
            pillar_progress,
            recent_activity,
        })
    }
}

/// Count consecutive calendar days ending at `today`.
///
/// `dates` must be sorted newest first. Dates after `today` are ignored; the
/// walk stops at the first missing day, so no review today means zero.
pub fn streak_from_dates(dates: &[NaiveDate], today: NaiveDate) -> i64 {
    let mut streak = 0;
    let mut expected = Some(today);

    for &date in dates.iter().skip_while(|d| **d > today) {
        match expected {
            Some(day) if date == day => {
                streak += 1;
                expected = day.pred_opt();
            }
            _ => break,
        }
    }

    streak
}

fn streak_at(conn: &Connection, today: NaiveDate) -> Result<i64> {
    let mut stmt = conn.prepare_cached(
        "SELECT date FROM daily_stats
         WHERE cards_reviewed > 0
         ORDER BY date DESC
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![STREAK_WINDOW], |row| {
        let date: String = row.get(0)?;
        parse_date(&date)
    })?;

    let mut dates = Vec::new();
    for date in rows {
        dates.push(date?);
    }
    Ok(streak_from_dates(&dates, today))
}

fn stats_between(conn: &Connection, start: NaiveDate, end: NaiveDate, order: &str) -> Result<Vec<DailyStats>> {
    let sql = format!(
        "SELECT * FROM daily_stats WHERE date BETWEEN ?1 AND ?2 ORDER BY date {}",
        if order == "DESC" { "DESC" } else { "ASC" }
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![start.to_string(), end.to_string()], row_to_stats)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

fn row_to_stats(row: &rusqlite::Row) -> rusqlite::Result<DailyStats> {
    let date: String = row.get("date")?;
    let domains: Option<String> = row.get("domains_touched")?;
    let domains_touched = domains
        .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok())
        .unwrap_or_default();

    Ok(DailyStats {
        date: parse_date(&date)?,
        cards_reviewed: row.get::<_, Option<i64>>("cards_reviewed")?.unwrap_or(0),
        cards_new: row.get::<_, Option<i64>>("cards_new")?.unwrap_or(0),
        time_spent_ms: row.get::<_, Option<i64>>("time_spent_ms")?.unwrap_or(0),
        domains_touched,
    })
}

// ============================================================================
// TESTS
// ============================================================================
