use sea_orm::{ConnectionTrait, EntityTrait, Set, sea_query::OnConflict};

use crate::{entities::ratings, error::AppResult, models::RatingRow};

/// Writes every rating, replacing any earlier row for the same (user, movie).
///
/// Rows are applied in order, so the last row for a key wins.
pub async fn load_ratings<C: ConnectionTrait>(db: &C, rows: &[RatingRow]) -> AppResult<usize> {
    for row in rows {
        let model = ratings::ActiveModel {
            user_id: Set(row.user_id),
            movie_ml_id: Set(row.movie_id),
            rating: Set(row.rating),
            timestamp: Set(row.timestamp),
        };

        ratings::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([ratings::Column::UserId, ratings::Column::MovieMlId])
                    .update_columns([ratings::Column::Rating, ratings::Column::Timestamp])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }

    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use sea_orm::PaginatorTrait;

    use super::*;
    use crate::db::temp_db;

    fn rating(user_id: i64, movie_id: i64, rating: f64, timestamp: i64) -> RatingRow {
        RatingRow { user_id, movie_id, rating, timestamp }
    }

    #[tokio::test]
    async fn later_row_replaces_earlier_one() {
        let (_dir, db) = temp_db().await;

        load_ratings(&db, &[rating(1, 10, 3.0, 100)]).await.unwrap();
        load_ratings(&db, &[rating(1, 10, 4.5, 200)]).await.unwrap();

        let rows = ratings::Entity::find().all(&db).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rating, 4.5);
        assert_eq!(rows[0].timestamp, 200);
    }

    #[tokio::test]
    async fn last_row_in_a_batch_wins() {
        let (_dir, db) = temp_db().await;

        let loaded = load_ratings(&db, &[
            rating(1, 10, 3.0, 100),
            rating(2, 10, 5.0, 150),
            rating(1, 10, 1.0, 300),
        ])
        .await
        .unwrap();

        assert_eq!(loaded, 3);
        assert_eq!(ratings::Entity::find().count(&db).await.unwrap(), 2);
        let row = ratings::Entity::find_by_id((1, 10)).one(&db).await.unwrap().unwrap();
        assert_eq!(row.rating, 1.0);
        assert_eq!(row.timestamp, 300);
    }
}
