//! Parsers for the catalog and rating tables.
//!
//! Two MovieLens layouts are understood:
//! - CSV releases (`movies.csv`, `ratings.csv`): header row, quoted titles
//!   - movieId,title,genres
//!   - userId,movieId,rating[,timestamp]
//! - Classic `.dat` releases (`movies.dat`, `ratings.dat`), Latin-1 encoded
//!   - movieId::title::genres
//!   - userId::movieId::rating::timestamp
//!
//! Genres are pipe-separated in both: "Animation|Children's|Comedy".

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Split a raw genre field into its tokens.
///
/// Empty tokens are dropped, so an empty or missing field is an empty set.
pub fn split_genres(s: &str) -> BTreeSet<String> {
    s.split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a movie table, picking the layout from the file extension
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    match extension(path).as_deref() {
        Some("csv") => parse_movies_csv(path),
        Some("dat") => parse_movies_dat(path),
        _ => Err(DataLoadError::UnsupportedFormat {
            path: path.display().to_string(),
        }),
    }
}

/// Parse a rating table, picking the layout from the file extension
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    match extension(path).as_deref() {
        Some("csv") => parse_ratings_csv(path),
        Some("dat") => parse_ratings_dat(path),
        _ => Err(DataLoadError::UnsupportedFormat {
            path: path.display().to_string(),
        }),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })
}

// =============================================================================
// CSV layout
// =============================================================================

#[derive(Debug, Deserialize)]
struct MovieRecord {
    #[serde(rename = "movieId", default)]
    movie_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    genres: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RatingRecord {
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
    #[serde(rename = "movieId", default)]
    movie_id: Option<String>,
    #[serde(default)]
    rating: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

fn csv_reader(path: &Path) -> Result<csv::Reader<File>> {
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(open(path)?))
}

fn parse_movies_csv(path: &Path) -> Result<Vec<Movie>> {
    let file = file_name(path);
    let mut reader = csv_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|source| DataLoadError::Csv { file: file.clone(), source })?
        .clone();

    let mut movies = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| DataLoadError::Csv { file: file.clone(), source })?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        let row: MovieRecord = record
            .deserialize(Some(&headers))
            .map_err(|source| DataLoadError::Csv { file: file.clone(), source })?;

        let id = required(&file, line, "movieId", row.movie_id)?;
        let title = required(&file, line, "title", row.title)?;
        movies.push(Movie {
            id: parse_number(&file, line, "movieId", &id)?,
            title,
            genres: split_genres(row.genres.as_deref().unwrap_or("")),
        });
    }
    Ok(movies)
}

fn parse_ratings_csv(path: &Path) -> Result<Vec<Rating>> {
    let file = file_name(path);
    let mut reader = csv_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|source| DataLoadError::Csv { file: file.clone(), source })?
        .clone();

    let mut ratings = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| DataLoadError::Csv { file: file.clone(), source })?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        let row: RatingRecord = record
            .deserialize(Some(&headers))
            .map_err(|source| DataLoadError::Csv { file: file.clone(), source })?;

        let user_id = required(&file, line, "userId", row.user_id)?;
        let movie_id = required(&file, line, "movieId", row.movie_id)?;
        let rating = required(&file, line, "rating", row.rating)?;
        let timestamp = match row.timestamp.filter(|t| !t.is_empty()) {
            Some(t) => Some(parse_number(&file, line, "timestamp", &t)?),
            None => None,
        };

        ratings.push(Rating {
            user_id: parse_number(&file, line, "userId", &user_id)?,
            movie_id: parse_number(&file, line, "movieId", &movie_id)?,
            rating: parse_score(&file, line, &rating)?,
            timestamp,
        });
    }
    Ok(ratings)
}

// =============================================================================
// `::` layout
// =============================================================================

/// Read a file with ISO-8859-1 encoding (Latin-1)
///
/// Each byte maps directly to the Unicode code point of the same value.
fn read_lines_latin1(path: &Path) -> Result<Vec<String>> {
    let mut file = open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content: String = bytes.iter().map(|&b| b as char).collect();

    Ok(content.lines().map(|s| s.to_string()).collect())
}

fn parse_movies_dat(path: &Path) -> Result<Vec<Movie>> {
    let file = file_name(path);
    let lines = read_lines_latin1(path)?;
    let mut movies = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let mut parts = line_trimmed.split("::");
        let movie_id = next_field(&mut parts, &file, line_no, "movieId")?;
        let title = next_field(&mut parts, &file, line_no, "title")?;
        // A missing genre column is an empty genre set
        let genres = parts.next().unwrap_or("");

        movies.push(Movie {
            id: parse_number(&file, line_no, "movieId", movie_id)?,
            title: title.to_string(),
            genres: split_genres(genres),
        });
    }
    Ok(movies)
}

fn parse_ratings_dat(path: &Path) -> Result<Vec<Rating>> {
    let file = file_name(path);
    let lines = read_lines_latin1(path)?;
    let mut ratings = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let mut parts = line_trimmed.split("::");
        let user_id = next_field(&mut parts, &file, line_no, "userId")?;
        let movie_id = next_field(&mut parts, &file, line_no, "movieId")?;
        let rating = next_field(&mut parts, &file, line_no, "rating")?;
        let timestamp = match parts.next().map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => Some(parse_number(&file, line_no, "timestamp", t)?),
            None => None,
        };

        ratings.push(Rating {
            user_id: parse_number(&file, line_no, "userId", user_id)?,
            movie_id: parse_number(&file, line_no, "movieId", movie_id)?,
            rating: parse_score(&file, line_no, rating)?,
            timestamp,
        });
    }
    Ok(ratings)
}

// =============================================================================
// Field helpers
// =============================================================================

fn next_field<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    file: &str,
    line: usize,
    field: &'static str,
) -> Result<&'a str> {
    parts
        .next()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| DataLoadError::MissingField {
            file: file.to_string(),
            line,
            field,
        })
}

fn required(file: &str, line: usize, field: &'static str, value: Option<String>) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| DataLoadError::MissingField {
            file: file.to_string(),
            line,
            field,
        })
}

fn parse_number<T>(file: &str, line: usize, field: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {}: {}", field, e),
    })
}

fn parse_score(file: &str, line: usize, value: &str) -> Result<f32> {
    let score: f32 = parse_number(file, line, "rating", value)?;
    if !score.is_finite() {
        return Err(DataLoadError::InvalidValue {
            field: "rating".to_string(),
            value: value.to_string(),
        });
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_split_genres() {
        let genres = split_genres("Action|Adventure|Sci-Fi");
        assert_eq!(genres.len(), 3);
        assert!(genres.contains("Sci-Fi"));
        assert!(split_genres("").is_empty());
        assert_eq!(split_genres("Drama||Drama").len(), 1);
    }

    #[test]
    fn test_parse_movies_csv_with_quoted_title() {
        let file = write_temp(
            ".csv",
            "movieId,title,genres\n\
             1,Toy Story (1995),Adventure|Animation|Children|Comedy|Fantasy\n\
             11,\"American President, The (1995)\",Comedy|Drama|Romance\n\
             99,Untagged (2001),\n",
        );

        let movies = parse_movies(file.path()).unwrap();
        assert_eq!(movies.len(), 3);
        assert_eq!(movies[1].title, "American President, The (1995)");
        assert_eq!(movies[1].genres.len(), 3);
        assert!(movies[2].genres.is_empty());
    }

    #[test]
    fn test_parse_ratings_csv() {
        let file = write_temp(
            ".csv",
            "userId,movieId,rating,timestamp\n1,1,4.0,964982703\n1,3,4.5,\n",
        );

        let ratings = parse_ratings(file.path()).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].timestamp, Some(964982703));
        assert_eq!(ratings[1].rating, 4.5);
        assert_eq!(ratings[1].timestamp, None);
    }

    #[test]
    fn test_missing_title_is_malformed() {
        let file = write_temp(".csv", "movieId,title,genres\n1,,Drama\n");

        let err = parse_movies(file.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingField { field: "title", .. }));
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_bad_rating_is_malformed() {
        let file = write_temp(".csv", "userId,movieId,rating\n1,2,great\n");

        let err = parse_ratings(file.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_parse_dat_files() {
        let movies = write_temp(".dat", "1::Toy Story (1995)::Animation|Children's|Comedy\n2::Jumanji (1995)\n");
        let ratings = write_temp(".dat", "1::1::5::978300760\n\n2::1::3::978300761\n");

        let movies = parse_movies(movies.path()).unwrap();
        assert_eq!(movies.len(), 2);
        assert!(movies[0].genres.contains("Children's"));
        assert!(movies[1].genres.is_empty());

        let ratings = parse_ratings(ratings.path()).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[1].user_id, 2);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".json", "[]");
        assert!(matches!(
            parse_movies(file.path()),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
    }
}
