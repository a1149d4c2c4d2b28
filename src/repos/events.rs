use sqlx::{PgPool, Postgres, QueryBuilder, Result};
use uuid::Uuid;

use crate::models::{Event, EventChanges, EventDetail, EventFilter, NewEvent};
use crate::utils::search::contains_pattern;

const EVENT_COLUMNS: &str = "id, title, description, start_time, end_time, venue_id, category_id, \
     organizer_id, status, created_at, updated_at";

const DETAIL_SELECT: &str = "SELECT e.id, e.title, e.description, e.start_time, e.end_time, \
        e.venue_id, v.name AS venue_name, v.address AS venue_address, \
        e.category_id, c.name AS category_name, \
        e.organizer_id, u.name AS organizer_name, \
        e.status, e.created_at, e.updated_at \
     FROM events e \
     JOIN users u ON u.id = e.organizer_id \
     LEFT JOIN venues v ON v.id = e.venue_id \
     LEFT JOIN categories c ON c.id = e.category_id";

pub struct EventRepo {
    db: PgPool,
}

impl EventRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &EventFilter) -> Result<Vec<EventDetail>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(DETAIL_SELECT);
        query.push(" WHERE 1=1");

        if let Some(pattern) = filter.search.as_deref().and_then(contains_pattern) {
            query.push(" AND (e.title ILIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR e.description ILIKE ");
            query.push_bind(pattern);
            query.push(")");
        }

        if let Some(organizer_id) = filter.organizer_id {
            query.push(" AND e.organizer_id = ");
            query.push_bind(organizer_id);
        }

        if filter.published_only {
            query.push(" AND e.status = 'PUBLISHED'");
        }

        if let Some(after) = filter.upcoming_after {
            query.push(" AND e.end_time > ");
            query.push_bind(after);
        }

        query.push(" ORDER BY e.start_time ASC, e.id ASC");

        query
            .build_query_as::<EventDetail>()
            .fetch_all(&self.db)
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let sql = format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS);
        sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn get_detail(&self, id: Uuid) -> Result<Option<EventDetail>> {
        let sql = format!("{} WHERE e.id = $1", DETAIL_SELECT);
        sqlx::query_as::<_, EventDetail>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn create(&self, organizer_id: Uuid, event: NewEvent) -> Result<Event> {
        let sql = format!(
            "INSERT INTO events (id, title, description, start_time, end_time, venue_id, category_id, organizer_id, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            EVENT_COLUMNS
        );
        sqlx::query_as::<_, Event>(&sql)
            .bind(Uuid::new_v4())
            .bind(event.title)
            .bind(event.description)
            .bind(event.start_time)
            .bind(event.end_time)
            .bind(event.venue_id)
            .bind(event.category_id)
            .bind(organizer_id)
            .bind(event.status)
            .fetch_one(&self.db)
            .await
    }

    pub async fn update(&self, id: Uuid, changes: EventChanges) -> Result<Option<Event>> {
        let sql = format!(
            "UPDATE events SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                start_time = COALESCE($4, start_time), \
                end_time = COALESCE($5, end_time), \
                venue_id = COALESCE($6, venue_id), \
                category_id = COALESCE($7, category_id), \
                status = COALESCE($8, status), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            EVENT_COLUMNS
        );
        sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.start_time)
            .bind(changes.end_time)
            .bind(changes.venue_id)
            .bind(changes.category_id)
            .bind(changes.status)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
