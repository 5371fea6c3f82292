pub mod directors;
pub mod genres;
pub mod movie_directors;
pub mod movie_genres;
pub mod movies;
pub mod ratings;
