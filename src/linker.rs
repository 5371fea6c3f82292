//! Get-or-create lookups and idempotent writes for movies and their genre/director links.
//!
//! Everything here is generic over [`ConnectionTrait`] so the pipeline can run it inside a
//! per-movie transaction.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, NotSet,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use tracing::debug;

use crate::{
    entities::{directors, genres, movie_directors, movie_genres, movies},
    error::AppResult,
};

#[derive(Clone, Debug, PartialEq)]
pub struct MovieUpsert {
    /// External identity: an IMDb id, or `ML_<id>` when the API had no match.
    pub identity: String,
    pub title: String,
    pub year: Option<i32>,
    pub runtime_minutes: Option<i32>,
    pub plot: Option<String>,
    pub box_office: Option<i64>,
}

/// Inserts the movie or refreshes the existing row, returning its row id.
///
/// An existing row matches on identity *or* exact title, lowest id first. Only year,
/// runtime, plot and box office are overwritten on a match.
pub async fn upsert_movie<C: ConnectionTrait>(db: &C, movie: &MovieUpsert) -> AppResult<i32> {
    let existing = movies::Entity::find()
        .filter(
            Condition::any()
                .add(movies::Column::MovieId.eq(movie.identity.as_str()))
                .add(movies::Column::Title.eq(movie.title.as_str())),
        )
        .order_by_asc(movies::Column::Id)
        .one(db)
        .await?;

    if let Some(existing) = existing {
        let id = existing.id;
        debug!(id, movie_id = %existing.movie_id, title = %movie.title, "updating movie");
        let mut model: movies::ActiveModel = existing.into();
        model.year = Set(movie.year);
        model.runtime_minutes = Set(movie.runtime_minutes);
        model.plot = Set(movie.plot.clone());
        model.box_office = Set(movie.box_office);
        model.update(db).await?;
        return Ok(id);
    }

    let model = movies::ActiveModel {
        id: NotSet,
        movie_id: Set(movie.identity.clone()),
        title: Set(movie.title.clone()),
        year: Set(movie.year),
        runtime_minutes: Set(movie.runtime_minutes),
        plot: Set(movie.plot.clone()),
        box_office: Set(movie.box_office),
    };
    let id = movies::Entity::insert(model).exec(db).await?.last_insert_id;
    debug!(id, movie_id = %movie.identity, title = %movie.title, "inserted movie");
    Ok(id)
}

pub async fn get_or_create_genre<C: ConnectionTrait>(db: &C, name: &str) -> AppResult<i32> {
    if let Some(genre) =
        genres::Entity::find().filter(genres::Column::Name.eq(name)).one(db).await?
    {
        return Ok(genre.id);
    }

    let model = genres::ActiveModel { id: NotSet, name: Set(name.to_string()) };
    Ok(genres::Entity::insert(model).exec(db).await?.last_insert_id)
}

pub async fn get_or_create_director<C: ConnectionTrait>(db: &C, name: &str) -> AppResult<i32> {
    if let Some(director) =
        directors::Entity::find().filter(directors::Column::Name.eq(name)).one(db).await?
    {
        return Ok(director.id);
    }

    let model = directors::ActiveModel { id: NotSet, name: Set(name.to_string()) };
    Ok(directors::Entity::insert(model).exec(db).await?.last_insert_id)
}

/// Links a movie to a genre. Linking an already linked pair is a no-op.
pub async fn link_movie_genre<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    genre_id: i32,
) -> AppResult<()> {
    let model = movie_genres::ActiveModel { movie_id: Set(movie_id), genre_id: Set(genre_id) };
    let result = movie_genres::Entity::insert(model).exec_without_returning(db).await;
    absorb_duplicate(result, "movie_genres", movie_id, genre_id)
}

/// Links a movie to a director. Linking an already linked pair is a no-op.
pub async fn link_movie_director<C: ConnectionTrait>(
    db: &C,
    movie_id: i32,
    director_id: i32,
) -> AppResult<()> {
    let model =
        movie_directors::ActiveModel { movie_id: Set(movie_id), director_id: Set(director_id) };
    let result = movie_directors::Entity::insert(model).exec_without_returning(db).await;
    absorb_duplicate(result, "movie_directors", movie_id, director_id)
}

fn absorb_duplicate(
    result: Result<u64, DbErr>,
    table: &str,
    movie_id: i32,
    other_id: i32,
) -> AppResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            debug!(table, movie_id, other_id, "link already present");
            Ok(())
        },
        Err(err) => Err(err.into()),
    }
}
