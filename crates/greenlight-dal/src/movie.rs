use std::time::Duration;

use futures::TryStreamExt as _;
use greenlight_types::{ValidationError, Validator, validator::unique};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Row, types::Json};
use tracing::debug;

use crate::{
    Batch, ChosenRow, DEFAULT_QUERY_TIMEOUT, Error, Filters,
    error::Result,
    runtime::Runtime,
    timed,
};

pub const MIN_YEAR: i32 = 1888;
pub const MAX_TITLE_BYTES: usize = 500;
pub const MAX_GENRES: usize = 5;

pub const SORT_SAFELIST: &[&str] = &[
    "id", "title", "year", "runtime", "-id", "-title", "-year", "-runtime",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    #[serde(skip)]
    pub created_at: Option<time::PrimitiveDateTime>,
    pub title: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub year: i32,
    #[serde(default, skip_serializing_if = "Runtime::is_zero")]
    pub runtime: Runtime,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    pub version: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl Movie {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        validate_movie(&mut v, self);
        v.into_result()
    }
}

impl sqlx::FromRow<'_, ChosenRow> for Movie {
    fn from_row(row: &ChosenRow) -> Result<Self, sqlx::Error> {
        let genres: Json<Vec<String>> = row.try_get("genres")?;
        Ok(Movie {
            id: row.try_get("id")?,
            created_at: Some(row.try_get("created_at")?),
            title: row.try_get("title")?,
            year: row.try_get("year")?,
            runtime: row.try_get("runtime")?,
            genres: genres.0,
            version: row.try_get("version")?,
        })
    }
}

/// Runs every movie rule, so all violations are reported at once.
pub fn validate_movie(v: &mut Validator, movie: &Movie) {
    v.check(!movie.title.is_empty(), "title", "must be provided");
    v.check(
        movie.title.len() <= MAX_TITLE_BYTES,
        "title",
        "must not be more than 500 bytes long",
    );

    let current_year = time::OffsetDateTime::now_utc().year();
    v.check(movie.year != 0, "year", "must be provided");
    v.check(movie.year >= MIN_YEAR, "year", "must be greater than 1888");
    v.check(movie.year <= current_year, "year", "must not be in the future");

    v.check(!movie.runtime.is_zero(), "runtime", "must be provided");
    v.check(
        movie.runtime.minutes() > 0,
        "runtime",
        "must be a positive integer",
    );

    v.check(
        !movie.genres.is_empty(),
        "genres",
        "must contain at least 1 genre",
    );
    v.check(
        movie.genres.len() <= MAX_GENRES,
        "genres",
        "must not contain more than 5 genres",
    );
    v.check(
        unique(&movie.genres),
        "genres",
        "must not contain duplicate values",
    );
    v.check(
        movie.genres.iter().all(|g| !g.is_empty()),
        "genres",
        "must not contain empty values",
    );
}

/// Client supplied fields of a new movie, missing fields are left zero and fail validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreateMovie {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
}

impl From<CreateMovie> for Movie {
    fn from(payload: CreateMovie) -> Self {
        Movie {
            title: payload.title,
            year: payload.year,
            runtime: payload.runtime,
            genres: payload.genres,
            ..Default::default()
        }
    }
}

/// Partial update, `None` means the field was not supplied and stays unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateMovie {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime: Option<Runtime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
}

impl UpdateMovie {
    pub fn apply(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(year) = self.year {
            movie.year = year;
        }
        if let Some(runtime) = self.runtime {
            movie.runtime = runtime;
        }
        if let Some(genres) = self.genres {
            movie.genres = genres;
        }
    }
}

pub type MovieRepository = MovieRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct MovieRepositoryImpl<E> {
    executor: E,
    timeout: Duration,
}

impl<'c, E> MovieRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn create(&self, payload: CreateMovie) -> Result<Movie> {
        let mut movie = Movie::from(payload);
        self.insert(&mut movie).await?;
        Ok(movie)
    }

    /// Stores a new movie, filling in its `id`, `created_at` and `version`.
    pub async fn insert(&self, movie: &mut Movie) -> Result<()> {
        movie.validate()?;
        let (id, created_at, version): (i64, time::PrimitiveDateTime, i32) =
            timed(self.timeout, async {
                let row = sqlx::query_as::<_, (i64, time::PrimitiveDateTime, i32)>(
                    "INSERT INTO movies (title, year, runtime, genres) VALUES (?, ?, ?, ?) RETURNING id, created_at, version",
                )
                .bind(&movie.title)
                .bind(movie.year)
                .bind(movie.runtime)
                .bind(Json(&movie.genres))
                .fetch_one(&self.executor)
                .await?;
                Ok::<_, Error>(row)
            })
            .await?;

        movie.id = id;
        movie.created_at = Some(created_at);
        movie.version = version;
        debug!(id, "Movie created");
        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<Movie> {
        if id < 1 {
            return Err(Error::RecordNotFound("Movie".to_string()));
        }
        let record = timed(self.timeout, async {
            let record = sqlx::query_as::<_, Movie>(
                "SELECT id, created_at, title, year, runtime, genres, version FROM movies WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(&self.executor)
            .await?;
            Ok::<_, Error>(record)
        })
        .await?;

        record.ok_or_else(|| Error::RecordNotFound("Movie".to_string()))
    }

    /// Writes the movie only if the stored version still equals `movie.version`,
    /// incrementing it in the same statement. The new version is written back to `movie`.
    pub async fn update(&self, movie: &mut Movie) -> Result<()> {
        movie.validate()?;
        let new_version: Option<i32> = timed(self.timeout, async {
            let version = sqlx::query_scalar::<_, i32>(
                "UPDATE movies SET title = ?, year = ?, runtime = ?, genres = ?, version = version + 1 \
                 WHERE id = ? AND version = ? RETURNING version",
            )
            .bind(&movie.title)
            .bind(movie.year)
            .bind(movie.runtime)
            .bind(Json(&movie.genres))
            .bind(movie.id)
            .bind(movie.version)
            .fetch_optional(&self.executor)
            .await?;
            Ok::<_, Error>(version)
        })
        .await?;

        match new_version {
            Some(version) => {
                debug!(id = movie.id, version, "Movie updated");
                movie.version = version;
                Ok(())
            }
            None => {
                debug!(id = movie.id, version = movie.version, "Movie update conflict");
                Err(Error::EditConflict {
                    id: movie.id,
                    version: movie.version,
                })
            }
        }
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if id < 1 {
            return Err(Error::RecordNotFound("Movie".to_string()));
        }
        let res = timed(self.timeout, async {
            let res = sqlx::query("DELETE FROM movies WHERE id = ?")
                .bind(id)
                .execute(&self.executor)
                .await?;
            Ok::<_, Error>(res)
        })
        .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("Movie".to_string()))
        } else {
            debug!(id, "Movie deleted");
            Ok(())
        }
    }

    pub async fn count(&self) -> Result<u64> {
        timed(self.timeout, async {
            let count: i64 = sqlx::query_scalar("SELECT count(*) FROM movies")
                .fetch_one(&self.executor)
                .await?;
            Ok::<_, Error>(count as u64)
        })
        .await
    }

    /// Lists movies whose title contains every word of `title` (case-insensitive)
    /// and whose genres include all of `genres`. Empty filters match everything.
    /// Paging and sort are validated first, invalid `filters` give `Error::Validation`.
    pub async fn list(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<Batch<Movie>> {
        filters.validate()?;
        let order = filters.ordering()?;
        let words = title.split_whitespace().collect::<Vec<_>>();
        let sql = format!(
            "SELECT count(*) OVER() AS total, id, created_at, title, year, runtime, genres, version
            FROM movies m
            WHERE NOT EXISTS (
                SELECT 1 FROM json_each(?) w WHERE instr(lower(m.title), lower(w.value)) = 0
            )
            AND NOT EXISTS (
                SELECT 1 FROM json_each(?) g
                WHERE g.value NOT IN (SELECT value FROM json_each(m.genres))
            )
            ORDER BY {order}, id ASC
            LIMIT ? OFFSET ?"
        );

        let rows: Vec<ChosenRow> = timed(self.timeout, async {
            let rows = sqlx::query(&sql)
                .bind(Json(&words))
                .bind(Json(genres))
                .bind(filters.limit())
                .bind(filters.offset())
                .fetch(&self.executor)
                .try_collect::<Vec<_>>()
                .await?;
            Ok::<_, Error>(rows)
        })
        .await?;

        let total = match rows.first() {
            Some(row) => row.try_get::<i64, _>("total")? as u64,
            None => 0,
        };
        let movies = rows
            .iter()
            .map(<Movie as sqlx::FromRow<'_, ChosenRow>>::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Batch {
            offset: filters.offset(),
            limit: filters.limit(),
            total,
            rows: movies,
        })
    }
}
