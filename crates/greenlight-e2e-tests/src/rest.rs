use anyhow::{Result, anyhow};
use greenlight_dal::movie::Movie;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct MovieEnvelope {
    pub movie: Movie,
}

pub async fn create_movie(
    client: &reqwest::Client,
    base_url: &Url,
    title: &str,
    year: i32,
    runtime: &str,
    genres: &[&str],
) -> Result<Movie> {
    let payload = json!({"title": title, "year": year, "runtime": runtime, "genres": genres});
    let api_url = base_url.join("v1/movies")?;

    let response = client.post(api_url).json(&payload).send().await?;
    if response.status().as_u16() != 201 {
        return Err(anyhow!(
            "Unexpected status {}: {}",
            response.status(),
            response.text().await?
        ));
    }

    let created: MovieEnvelope = response.json().await?;
    Ok(created.movie)
}

pub async fn get_movie(client: &reqwest::Client, base_url: &Url, id: i64) -> Result<Movie> {
    let api_url = base_url.join(&format!("v1/movies/{id}"))?;
    let response = client.get(api_url).send().await?.error_for_status()?;
    let envelope: MovieEnvelope = response.json().await?;
    Ok(envelope.movie)
}
