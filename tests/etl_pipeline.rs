use anyhow::Result;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::tempdir;

use movies_etl::app::ports::MovieSink;
use movies_etl::config::{Config, DatabaseConfig, ParsingConfig, PipelineConfig, SourcesConfig};
use movies_etl::constants::{MOVIES_TABLE, RATINGS_TABLE, RUNS_TABLE};
use movies_etl::infra::{InMemorySink, SqliteSink};
use movies_etl::run_etl;
use movies_etl::EtlError;

const METADATA_HEADER: &str = "adult,belongs_to_collection,budget,genres,homepage,id,imdb_id,original_language,original_title,overview,popularity,poster_path,production_companies,production_countries,release_date,revenue,runtime,spoken_languages,status,tagline,title,video,vote_average,vote_count";

fn wiki_movie(imdb_id: &str, title: &str, extra: serde_json::Value) -> serde_json::Value {
    let mut movie = json!({
        "url": format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_")),
        "year": 1995,
        "imdb_link": format!("https://www.imdb.com/title/{}/", imdb_id),
        "title": title,
        "Directed by": "Director",
        "Produced by": ["Producer A", "Producer B"],
        "Screenplay by": "Writer",
        "Starring": ["Lead", "Support"],
        "Music by": "Composer",
        "Cinematography": "DP",
        "Edited by": "Editor",
        "Productioncompany ": "Studio",
        "Distributed by": "Distributor",
        "Release date": ["December 15, 1995", "(United States)"],
        "Running time": "170 minutes",
        "Country": "United States",
        "Language": "English",
        "Budget": "$60 million[2]",
        "Box office": "$187.4 million[3]",
        "Based on": "Novel"
    });
    if let (Some(target), Some(extra)) = (movie.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }
    movie
}

fn write_fixtures(dir: &Path) -> Result<(PathBuf, PathBuf, PathBuf)> {
    let wiki = json!([
        wiki_movie("tt0113277", "Heat", json!({})),
        wiki_movie("tt0114709", "Toy Story", json!({
            "Release date": "November 22, 1995",
            "Running time": "1 hr 21 min",
            "Budget": "$30 million",
            "Box office": "$373.6 million"
        })),
        wiki_movie("tt0113277", "Heat (duplicate)", json!({})),
        {
            "title": "Twin Peaks",
            "Directed by": "David Lynch",
            "imdb_link": "https://www.imdb.com/title/tt0098936/",
            "No. of episodes": 30
        }
    ]);
    let wiki_path = dir.join("wikipedia-movies.json");
    std::fs::write(&wiki_path, serde_json::to_string(&wiki)?)?;

    let metadata = format!(
        "{}\n{}\n{}\n{}\n",
        METADATA_HEADER,
        "False,,60000000,\"[{'id': 28, 'name': 'Action'}]\",,949,tt0113277,en,Heat,Robbers and cops.,17.924927,/p.jpg,\"[{'name': 'Regency'}]\",\"[{'name': 'US'}]\",1995-12-15,187436818,170.0,\"[{'name': 'English'}]\",Released,A Los Angeles crime saga,Heat,False,7.7,1886",
        "False,,0,,,862,tt0114709,en,Toy Story,Toys.,21.946943,,,,1995-10-30,0,81.0,,Released,,Toy Story,False,7.7,5415",
        "True,,0,,,5,tt0000005,en,Adult,,1.0,,,,2000-01-01,0,90,,Released,,Adult,False,1.0,1"
    );
    let metadata_path = dir.join("movies_metadata.csv");
    std::fs::write(&metadata_path, metadata)?;

    let ratings_path = dir.join("ratings.csv");
    std::fs::write(
        &ratings_path,
        "userId,movieId,rating,timestamp\n\
         1,949,4.0,1425941529\n\
         2,949,4.0,1425942435\n\
         3,949,3.5,1425941556\n\
         4,862,5.0,1425942167\n\
         5,31,2.0,1425941529\n",
    )?;

    Ok((wiki_path, metadata_path, ratings_path))
}

fn config(dir: &Path, chunk_size: usize) -> Result<Config> {
    let (wiki_path, metadata_path, ratings_path) = write_fixtures(dir)?;
    Ok(Config {
        sources: SourcesConfig {
            wiki_path,
            metadata_path,
            ratings_path,
        },
        database: DatabaseConfig {
            path: dir.join("movie_data.db"),
        },
        pipeline: PipelineConfig {
            chunk_size,
            ..Default::default()
        },
        parsing: ParsingConfig::default(),
    })
}

#[tokio::test]
async fn test_full_run_into_sqlite() -> Result<()> {
    let temp_dir = tempdir()?;
    let config = config(temp_dir.path(), 2)?;
    let sink = Arc::new(SqliteSink::open(&config.database.path)?);

    let summary = run_etl(&config, sink.clone()).await?;

    assert_eq!(summary.movies_written, 2);
    assert_eq!(summary.ratings_written, 5);
    assert_eq!(summary.rating_chunks, 3);
    assert_eq!(summary.stats.eligible_records, 3);
    assert_eq!(summary.stats.deduplicated_records, 2);
    assert_eq!(summary.stats.metadata_rows, 2);

    assert_eq!(sink.count_rows(MOVIES_TABLE)?, 2);
    assert_eq!(sink.count_rows(RATINGS_TABLE)?, 5);
    assert_eq!(sink.count_rows(RUNS_TABLE)?, 1);

    let columns = sink.table_columns(MOVIES_TABLE)?;
    assert_eq!(
        &columns[columns.len() - 4..],
        &["rating_2.0", "rating_3.5", "rating_4.0", "rating_5.0"]
    );
    Ok(())
}

#[tokio::test]
async fn test_rerun_replaces_movies_and_ratings() -> Result<()> {
    let temp_dir = tempdir()?;
    let config = config(temp_dir.path(), 1_000_000)?;
    let sink = Arc::new(SqliteSink::open(&config.database.path)?);

    run_etl(&config, sink.clone()).await?;
    run_etl(&config, sink.clone()).await?;

    assert_eq!(sink.count_rows(MOVIES_TABLE)?, 2);
    assert_eq!(sink.count_rows(RATINGS_TABLE)?, 5);
    assert_eq!(sink.count_rows(RUNS_TABLE)?, 2);
    Ok(())
}

#[tokio::test]
async fn test_fill_gap_and_pivot_in_output() -> Result<()> {
    let temp_dir = tempdir()?;
    let config = config(temp_dir.path(), 1_000_000)?;
    let sink = Arc::new(InMemorySink::new());

    run_etl(&config, sink.clone() as Arc<dyn MovieSink>).await?;

    let table = sink.movies().await.expect("movies were written");
    let toy_story = table
        .rows
        .iter()
        .find(|r| r.imdb_id == "tt0114709")
        .expect("Toy Story reconciled");

    // Metadata budget and revenue are zero, so the wiki values fill in
    assert_eq!(toy_story.budget, Some(30_000_000.0));
    assert_eq!(toy_story.revenue, Some(373_600_000.0));
    assert_eq!(toy_story.runtime, Some(81.0));
    assert_eq!(toy_story.producers, Some(json!(["Producer A", "Producer B"])));
    assert_eq!(toy_story.rating_counts.values().sum::<u64>(), 1);

    let heat = table.rows.iter().find(|r| r.kaggle_id == 949).expect("Heat reconciled");
    assert_eq!(heat.rating_counts.values().sum::<u64>(), 3);
    assert_eq!(heat.title.as_deref(), Some("Heat"));
    Ok(())
}

#[tokio::test]
async fn test_missing_source_writes_nothing() -> Result<()> {
    let temp_dir = tempdir()?;
    let mut config = config(temp_dir.path(), 1_000_000)?;
    config.sources.ratings_path = temp_dir.path().join("absent.csv");
    let sink = Arc::new(InMemorySink::new());

    let err = run_etl(&config, sink.clone() as Arc<dyn MovieSink>)
        .await
        .unwrap_err();

    assert!(matches!(err, EtlError::Source { .. }));
    assert!(sink.movies().await.is_none());
    assert!(sink.ratings().await.is_empty());
    assert!(sink.runs().await.is_empty());
    Ok(())
}
