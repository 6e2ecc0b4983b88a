//! Offline store for saved flights

use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;

use crate::error::{DbError, Result, SkyfareError};
use crate::types::{FlightDuration, FlightOffer, SavedFlight, Segment};

/// Maximum rows returned by [`Database::list_flights`]
pub const LIST_LIMIT: i64 = 50;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

const SELECT_COLUMNS: &str = r#"
    SELECT id, origin, destination, travel_date, price, currency, airline,
           airline_code, duration, stops, segments, is_favorite, searched_at
    FROM saved_flights
"#;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database file and run migrations
    pub async fn new(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
            }
        }

        // mode=rwc creates the file on first use
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, running migrations on it
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        tracing::debug!("Saved-flights database ready");
        Ok(Self { pool })
    }

    /// Persist an offer found by a search and return the new row id
    pub async fn save_flight(
        &self,
        origin: &str,
        destination: &str,
        travel_date: &str,
        offer: &FlightOffer,
    ) -> Result<i64> {
        let now = chrono::Utc::now().timestamp();
        self.save_flight_at(origin, destination, travel_date, offer, now)
            .await
    }

    /// Same as [`Database::save_flight`] with an explicit search timestamp
    pub async fn save_flight_at(
        &self,
        origin: &str,
        destination: &str,
        travel_date: &str,
        offer: &FlightOffer,
        searched_at: i64,
    ) -> Result<i64> {
        let segments = serde_json::to_string(&offer.segments).map_err(DbError::Segments)?;

        let result = sqlx::query(
            r#"
            INSERT INTO saved_flights
                (origin, destination, travel_date, price, currency, airline, airline_code,
                 duration, stops, segments, is_favorite, searched_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(origin)
        .bind(destination)
        .bind(travel_date)
        .bind(offer.price)
        .bind(&offer.currency)
        .bind(&offer.airline)
        .bind(&offer.airline_code)
        .bind(offer.duration.as_ref().map(FlightDuration::to_db))
        .bind(offer.stops as i64)
        .bind(segments)
        .bind(searched_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        let id = result.last_insert_rowid();
        tracing::info!("Saved flight {} ({} → {}, {})", id, origin, destination, travel_date);
        Ok(id)
    }

    /// Most recent saved flights first, at most [`LIST_LIMIT`] rows
    pub async fn list_flights(&self) -> Result<Vec<SavedFlight>> {
        let sql = format!("{} ORDER BY searched_at DESC, id DESC LIMIT ?", SELECT_COLUMNS);
        let rows = sqlx::query(&sql)
            .bind(LIST_LIMIT)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(rows.iter().map(row_to_flight).collect())
    }

    /// Favorite flights, most recent first
    pub async fn list_favorites(&self) -> Result<Vec<SavedFlight>> {
        let sql = format!(
            "{} WHERE is_favorite = 1 ORDER BY searched_at DESC, id DESC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(rows.iter().map(row_to_flight).collect())
    }

    pub async fn get_flight(&self, id: i64) -> Result<Option<SavedFlight>> {
        let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(row.as_ref().map(row_to_flight))
    }

    /// Flip the favorite flag and return the new state
    ///
    /// Read-then-write; two concurrent togglers can both read the same state.
    pub async fn toggle_favorite(&self, id: i64) -> Result<bool> {
        let current: Option<i64> =
            sqlx::query_scalar("SELECT is_favorite FROM saved_flights WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(DbError::SqlxError)?;

        let current = current.ok_or_else(|| {
            SkyfareError::InvalidInput(format!("Saved flight not found: {}", id))
        })?;
        let next = current == 0;

        sqlx::query("UPDATE saved_flights SET is_favorite = ? WHERE id = ?")
            .bind(if next { 1 } else { 0 })
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        tracing::debug!("Flight {} favorite = {}", id, next);
        Ok(next)
    }

    /// Delete a saved flight; returns whether a row existed
    pub async fn delete_flight(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM saved_flights WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove non-favorite rows searched more than `days_old` days ago
    pub async fn cleanup(&self, days_old: u32) -> Result<u64> {
        let cutoff = chrono::Utc::now().timestamp() - i64::from(days_old) * SECONDS_PER_DAY;

        let result =
            sqlx::query("DELETE FROM saved_flights WHERE is_favorite = 0 AND searched_at < ?")
                .bind(cutoff)
                .execute(&self.pool)
                .await
                .map_err(DbError::SqlxError)?;

        let removed = result.rows_affected();
        if removed > 0 {
            tracing::info!("Cleaned up {} saved flight(s) older than {} days", removed, days_old);
        }
        Ok(removed)
    }
}

fn row_to_flight(r: &SqliteRow) -> SavedFlight {
    let id: i64 = r.get("id");
    let segments = match r.get::<Option<String>, _>("segments") {
        Some(text) if !text.is_empty() => {
            serde_json::from_str::<Vec<Segment>>(&text).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable segments for flight {}: {}", id, e);
                Vec::new()
            })
        }
        _ => Vec::new(),
    };

    SavedFlight {
        id,
        origin: r.get("origin"),
        destination: r.get("destination"),
        travel_date: r.get("travel_date"),
        price: r.get("price"),
        currency: r.get("currency"),
        airline: r.get("airline"),
        airline_code: r.get("airline_code"),
        duration: r
            .get::<Option<String>, _>("duration")
            .map(|d| FlightDuration::from_db(&d)),
        stops: r.get::<Option<i64>, _>("stops").unwrap_or(0).max(0) as u32,
        segments,
        is_favorite: r.get::<i64, _>("is_favorite") != 0,
        searched_at: r.get("searched_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use tempfile::TempDir;

    async fn memory_db() -> Database {
        // One connection, otherwise each pooled connection gets its own in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        Database::from_pool(pool).await.unwrap()
    }

    fn offer(price: f64) -> FlightOffer {
        FlightOffer {
            price,
            currency: "MXN".to_string(),
            departure_at: Some("2026-11-15T08:30:00".to_string()),
            arrival_at: Some("2026-11-16T06:10:00".to_string()),
            duration: Some(FlightDuration::Iso8601("PT14H40M".to_string())),
            stops: 1,
            airline: Some("Iberia".to_string()),
            airline_code: Some("IB".to_string()),
            segments: vec![Segment {
                origin: "MEX".to_string(),
                destination: "MAD".to_string(),
                departure_at: Some("2026-11-15T08:30:00".to_string()),
                arrival_at: Some("2026-11-16T01:30:00".to_string()),
                carrier_code: Some("IB".to_string()),
                flight_number: Some("6400".to_string()),
                duration: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_save_and_get_flight() {
        let db = memory_db().await;
        let id = db.save_flight("MEX", "VIE", "2026-11-15", &offer(18250.0)).await.unwrap();

        let flight = db.get_flight(id).await.unwrap().unwrap();
        assert_eq!(flight.origin, "MEX");
        assert_eq!(flight.destination, "VIE");
        assert_eq!(flight.price, 18250.0);
        assert_eq!(flight.airline_code.as_deref(), Some("IB"));
        assert_eq!(flight.stops, 1);
        assert_eq!(flight.segments.len(), 1);
        assert_eq!(flight.segments[0].flight_number.as_deref(), Some("6400"));
        assert!(!flight.is_favorite);
    }

    #[tokio::test]
    async fn test_get_missing_flight_returns_none() {
        let db = memory_db().await;
        assert!(db.get_flight(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let db = memory_db().await;
        let now = chrono::Utc::now().timestamp();
        let old = db.save_flight_at("MEX", "MAD", "2026-11-01", &offer(1.0), now - 7200).await.unwrap();
        let new = db.save_flight_at("MEX", "BCN", "2026-11-02", &offer(2.0), now).await.unwrap();
        let mid = db.save_flight_at("MEX", "LHR", "2026-11-03", &offer(3.0), now - 3600).await.unwrap();

        let ids: Vec<i64> = db.list_flights().await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![new, mid, old]);
    }

    #[tokio::test]
    async fn test_list_caps_at_fifty_rows() {
        let db = memory_db().await;
        for i in 0..55 {
            db.save_flight("MEX", "CUN", &format!("2026-12-{:02}", (i % 28) + 1), &offer(i as f64))
                .await
                .unwrap();
        }

        assert_eq!(db.list_flights().await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_toggle_favorite_twice_restores_state() {
        let db = memory_db().await;
        let id = db.save_flight("GDL", "LAX", "2026-11-20", &offer(4300.0)).await.unwrap();

        assert!(db.toggle_favorite(id).await.unwrap());
        assert!(db.get_flight(id).await.unwrap().unwrap().is_favorite);
        assert!(!db.toggle_favorite(id).await.unwrap());
        assert!(!db.get_flight(id).await.unwrap().unwrap().is_favorite);
    }

    #[tokio::test]
    async fn test_toggle_unknown_flight_is_invalid_input() {
        let db = memory_db().await;
        let err = db.toggle_favorite(42).await.unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_list_favorites_only_returns_favorites() {
        let db = memory_db().await;
        let a = db.save_flight("MEX", "JFK", "2026-11-10", &offer(7000.0)).await.unwrap();
        let _b = db.save_flight("MEX", "MIA", "2026-11-11", &offer(5000.0)).await.unwrap();
        db.toggle_favorite(a).await.unwrap();

        let favorites = db.list_favorites().await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].id, a);
    }

    #[tokio::test]
    async fn test_delete_flight() {
        let db = memory_db().await;
        let id = db.save_flight("MTY", "DFW", "2026-11-05", &offer(3100.0)).await.unwrap();

        assert!(db.delete_flight(id).await.unwrap());
        assert!(!db.delete_flight(id).await.unwrap());
        assert!(db.get_flight(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cleanup_never_removes_favorites() {
        let db = memory_db().await;
        let now = chrono::Utc::now().timestamp();
        let ancient = now - 400 * SECONDS_PER_DAY;

        let old_plain = db.save_flight_at("MEX", "FCO", "2025-01-01", &offer(1.0), ancient).await.unwrap();
        let old_fav = db.save_flight_at("MEX", "AMS", "2025-01-02", &offer(2.0), ancient).await.unwrap();
        let fresh = db.save_flight_at("MEX", "FRA", "2026-12-01", &offer(3.0), now).await.unwrap();
        db.toggle_favorite(old_fav).await.unwrap();

        let removed = db.cleanup(30).await.unwrap();
        assert_eq!(removed, 1);
        assert!(db.get_flight(old_plain).await.unwrap().is_none());
        assert!(db.get_flight(old_fav).await.unwrap().is_some());
        assert!(db.get_flight(fresh).await.unwrap().is_some());

        // Even a zero-day threshold keeps the favorite
        db.cleanup(0).await.unwrap();
        assert!(db.get_flight(old_fav).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unreadable_segments_become_empty() {
        let db = memory_db().await;
        let id = db.save_flight("MEX", "CDG", "2026-11-30", &offer(9999.0)).await.unwrap();
        sqlx::query("UPDATE saved_flights SET segments = 'not json' WHERE id = ?")
            .bind(id)
            .execute(&db.pool)
            .await
            .unwrap();

        let flight = db.get_flight(id).await.unwrap().unwrap();
        assert!(flight.segments.is_empty());
    }

    #[tokio::test]
    async fn test_new_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("dir").join("flights.db");

        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
        db.save_flight("TIJ", "GDL", "2026-11-01", &offer(900.0)).await.unwrap();
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_database_initialization_with_invalid_path() {
        #[cfg(unix)]
        let invalid_path = "/tmp/skyfare\0invalid.db";
        #[cfg(windows)]
        let invalid_path = "C:\\invalid<>path\\flights.db";

        match Database::new(invalid_path).await {
            Err(SkyfareError::Database(_)) => {}
            other => panic!("Expected database error, got {:?}", other.map(|_| ())),
        }
    }
}
