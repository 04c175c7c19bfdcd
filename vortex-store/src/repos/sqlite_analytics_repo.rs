//! SQLite Analytics and Cache Repository Implementations
//!
//! Aggregations are plain `GROUP BY` queries. Timestamps are stored as
//! `%Y-%m-%d %H:%M:%S` text, so the period cutoff is a string comparison and
//! day/hour buckets come from `substr`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use vortex_core::{
    ActionSummary, AnalyticsEvent, DayActivity, GrowthPoint, HourActivity, LabeledCount,
    MarketTrends, OverallStats, PageActivity, Period, SessionId, TrackEvent, UserBehavior, UserId,
};

use crate::datastore::{format_ts, parse_ts, user_from, user_param, SqliteDatastore};
use crate::error::StoreResult;
use crate::repos::{AnalyticsRepository, CacheRepository};
use crate::schema;

/// Rows returned by the market "top N" lists
const TOP_N: i64 = 10;

fn cutoff_param(cutoff: Option<DateTime<Utc>>) -> String {
    // every stored timestamp sorts after the empty string
    cutoff.map(|c| format_ts(&c)).unwrap_or_default()
}

fn count(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or_default()
}

// ============================================================
// Analytics
// ============================================================

/// SQLite implementation of AnalyticsRepository
pub struct SqliteAnalyticsRepository {
    datastore: SqliteDatastore,
    table: String,
}

impl SqliteAnalyticsRepository {
    /// Create a new repository
    pub fn new(datastore: SqliteDatastore) -> Self {
        Self {
            table: datastore.table(schema::ANALYTICS),
            datastore,
        }
    }

    fn labeled(conn: &Connection, sql: &str, cutoff: &str) -> StoreResult<Vec<LabeledCount>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![cutoff, TOP_N], |row| {
            Ok(LabeledCount {
                label: row.get(0)?,
                count: count(row.get(1)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[async_trait]
impl AnalyticsRepository for SqliteAnalyticsRepository {
    async fn insert(&self, event: TrackEvent, created_at: DateTime<Utc>) -> StoreResult<i64> {
        let table = self.table.clone();
        let action_data = serde_json::to_string(&event.action_data)?;
        self.datastore.run(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {table} (user_id, session_id, action_type, action_data, page_url, \
                     referrer, ip_address, user_agent, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
                ),
                params![
                    user_param(event.user_id),
                    event.session_id.as_str(),
                    event.action_type,
                    action_data,
                    event.page_url,
                    event.referrer,
                    event.ip_address,
                    event.user_agent,
                    format_ts(&created_at),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    async fn recent_for_user(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> StoreResult<Vec<AnalyticsEvent>> {
        let table = self.table.clone();
        self.datastore.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, user_id, session_id, action_type, action_data, page_url, referrer, \
                 ip_address, user_agent, created_at FROM {table} WHERE user_id = ?1 \
                 ORDER BY id DESC LIMIT ?2"
            ))?;
            let mut rows = stmt.query(params![user_param(user_id), limit as i64])?;
            let mut events = Vec::new();
            while let Some(row) = rows.next()? {
                let action_data: String = row.get(4)?;
                let created_at: String = row.get(9)?;
                events.push(AnalyticsEvent {
                    id: row.get(0)?,
                    user_id: user_from(row.get(1)?),
                    session_id: SessionId(row.get(2)?),
                    action_type: row.get(3)?,
                    // opaque payload; keep whatever was stored
                    action_data: serde_json::from_str(&action_data)
                        .unwrap_or(serde_json::Value::String(action_data)),
                    page_url: row.get(5)?,
                    referrer: row.get(6)?,
                    ip_address: row.get(7)?,
                    user_agent: row.get(8)?,
                    created_at: parse_ts(&table, &created_at)?,
                });
            }
            Ok(events)
        })
        .await
    }

    async fn user_behavior(
        &self,
        user_id: UserId,
        period: Period,
        cutoff: Option<DateTime<Utc>>,
    ) -> StoreResult<UserBehavior> {
        let table = self.table.clone();
        let cutoff = cutoff_param(cutoff);
        let uid = user_param(user_id);

        self.datastore.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT action_type, COUNT(*) AS count, MIN(created_at), MAX(created_at) \
                 FROM {table} WHERE user_id = ?1 AND created_at >= ?2 \
                 GROUP BY action_type ORDER BY count DESC, action_type ASC"
            ))?;
            let actions = stmt
                .query_map(params![uid, cutoff], |row| {
                    Ok(ActionSummary {
                        action_type: row.get(0)?,
                        count: count(row.get(1)?),
                        first_occurrence: row.get(2)?,
                        last_occurrence: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            let total_actions = actions.iter().map(|a| a.count).sum();

            let unique_sessions: i64 = conn.query_row(
                &format!(
                    "SELECT COUNT(DISTINCT session_id) FROM {table} WHERE user_id = ?1 AND created_at >= ?2"
                ),
                params![uid, cutoff],
                |row| row.get(0),
            )?;

            let (first_seen, last_seen): (Option<String>, Option<String>) = conn.query_row(
                &format!("SELECT MIN(created_at), MAX(created_at) FROM {table} WHERE user_id = ?1"),
                params![uid],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT substr(created_at, 1, 10) AS day, COUNT(*) FROM {table} \
                 WHERE user_id = ?1 AND created_at >= ?2 GROUP BY day ORDER BY day ASC"
            ))?;
            let activity_by_day = stmt
                .query_map(params![uid, cutoff], |row| {
                    Ok(DayActivity {
                        date: row.get(0)?,
                        count: count(row.get(1)?),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut stmt = conn.prepare(&format!(
                "SELECT CAST(substr(created_at, 12, 2) AS INTEGER) AS hour, COUNT(*) FROM {table} \
                 WHERE user_id = ?1 AND created_at >= ?2 GROUP BY hour ORDER BY hour ASC"
            ))?;
            let activity_by_hour = stmt
                .query_map(params![uid, cutoff], |row| {
                    Ok(HourActivity {
                        hour: row.get::<_, u32>(0)?,
                        count: count(row.get(1)?),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let most_active_page = conn
                .query_row(
                    &format!(
                        "SELECT page_url, COUNT(*) AS count FROM {table} \
                         WHERE user_id = ?1 AND created_at >= ?2 \
                         GROUP BY page_url ORDER BY count DESC, page_url ASC LIMIT 1"
                    ),
                    params![uid, cutoff],
                    |row| {
                        Ok(PageActivity {
                            page_url: row.get(0)?,
                            count: count(row.get(1)?),
                        })
                    },
                )
                .optional()?;

            Ok(UserBehavior {
                user_id,
                period,
                actions,
                total_actions,
                unique_sessions: count(unique_sessions),
                first_seen,
                last_seen,
                activity_by_day,
                activity_by_hour,
                most_active_page,
            })
        })
        .await
    }

    async fn market_trends(
        &self,
        period: Period,
        cutoff: Option<DateTime<Utc>>,
    ) -> StoreResult<MarketTrends> {
        let table = self.table.clone();
        let cutoff = cutoff_param(cutoff);

        self.datastore.run(move |conn| {
            let overall = conn.query_row(
                &format!(
                    "SELECT COUNT(*), COUNT(DISTINCT user_id), COUNT(DISTINCT session_id) \
                     FROM {table} WHERE user_id > 0 AND created_at >= ?1"
                ),
                params![cutoff],
                |row| {
                    Ok(OverallStats {
                        total_events: count(row.get(0)?),
                        unique_users: count(row.get(1)?),
                        unique_sessions: count(row.get(2)?),
                    })
                },
            )?;

            let popular_actions = Self::labeled(
                conn,
                &format!(
                    "SELECT action_type, COUNT(*) AS count FROM {table} \
                     WHERE user_id > 0 AND created_at >= ?1 \
                     GROUP BY action_type ORDER BY count DESC, action_type ASC LIMIT ?2"
                ),
                &cutoff,
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT substr(created_at, 1, 10) AS day, COUNT(DISTINCT user_id) FROM {table} \
                 WHERE user_id > 0 AND created_at >= ?1 GROUP BY day ORDER BY day ASC"
            ))?;
            let user_growth = stmt
                .query_map(params![cutoff], |row| {
                    Ok(GrowthPoint {
                        date: row.get(0)?,
                        users: count(row.get(1)?),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let search_terms = Self::labeled(
                conn,
                &format!(
                    "SELECT json_extract(action_data, '$.query') AS term, COUNT(*) AS count \
                     FROM {table} WHERE action_type = 'search' AND user_id > 0 AND created_at >= ?1 \
                     AND json_valid(action_data) AND json_type(action_data, '$.query') = 'text' \
                     GROUP BY term ORDER BY count DESC, term ASC LIMIT ?2"
                ),
                &cutoff,
            )?;

            let top_referrers = Self::labeled(
                conn,
                &format!(
                    "SELECT referrer, COUNT(*) AS count FROM {table} \
                     WHERE user_id > 0 AND referrer != '' AND created_at >= ?1 \
                     GROUP BY referrer ORDER BY count DESC, referrer ASC LIMIT ?2"
                ),
                &cutoff,
            )?;

            Ok(MarketTrends {
                period,
                overall,
                popular_actions,
                user_growth,
                search_terms,
                top_referrers,
            })
        })
        .await
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let table = self.table.clone();
        self.datastore.run(move |conn| {
            Ok(conn.execute(
                &format!("DELETE FROM {table} WHERE created_at < ?1"),
                params![format_ts(&cutoff)],
            )?)
        })
        .await
    }
}

// ============================================================
// Cache
// ============================================================

/// SQLite implementation of CacheRepository
pub struct SqliteCacheRepository {
    datastore: SqliteDatastore,
    table: String,
}

impl SqliteCacheRepository {
    /// Create a new repository
    pub fn new(datastore: SqliteDatastore) -> Self {
        Self {
            table: datastore.table(schema::CACHE),
            datastore,
        }
    }
}

#[async_trait]
impl CacheRepository for SqliteCacheRepository {
    async fn get(&self, key: &str, now: DateTime<Utc>) -> StoreResult<Option<String>> {
        let table = self.table.clone();
        let key = key.to_string();
        self.datastore.run(move |conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT cache_value FROM {table} WHERE cache_key = ?1 AND expiration > ?2"),
                    params![key, now.timestamp()],
                    |row| row.get(0),
                )
                .optional()?)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let table = self.table.clone();
        let (key, value) = (key.to_string(), value.to_string());
        self.datastore.run(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {table} (cache_key, cache_value, expiration, created_at) \
                     VALUES (?1, ?2, ?3, ?4) \
                     ON CONFLICT(cache_key) DO UPDATE SET cache_value = excluded.cache_value, \
                     expiration = excluded.expiration, created_at = excluded.created_at"
                ),
                params![key, value, expires_at.timestamp(), format_ts(&Utc::now())],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let table = self.table.clone();
        let key = key.to_string();
        self.datastore.run(move |conn| {
            Ok(conn.execute(&format!("DELETE FROM {table} WHERE cache_key = ?1"), params![key])? > 0)
        })
        .await
    }

    async fn delete_prefix(&self, prefix: &str) -> StoreResult<usize> {
        let table = self.table.clone();
        let prefix = prefix.to_string();
        // substr instead of LIKE: prefixes contain `_`
        self.datastore.run(move |conn| {
            Ok(conn.execute(
                &format!("DELETE FROM {table} WHERE substr(cache_key, 1, length(?1)) = ?1"),
                params![prefix],
            )?)
        })
        .await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<usize> {
        let table = self.table.clone();
        self.datastore.run(move |conn| {
            Ok(conn.execute(
                &format!("DELETE FROM {table} WHERE expiration <= ?1"),
                params![now.timestamp()],
            )?)
        })
        .await
    }

    async fn count(&self) -> StoreResult<u64> {
        let table = self.table.clone();
        self.datastore.run(move |conn| {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(count(n))
        })
        .await
    }
}
