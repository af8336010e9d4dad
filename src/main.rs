use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinesphere::{
    config::Config,
    models::{CollectionKind, CollectionSort, GenreId, MovieId, MovieSummary, SortKey},
    services::{
        providers::tmdb::TmdbProvider, CollectionBrowser, CollectionSync, Discovery,
        DiscoverySnapshot, FetchOutcome, GenreIndex, HttpAuthService, MovieCatalogService,
        ResultsStatus, SessionStore,
    },
};

#[derive(Parser, Debug)]
#[command(name = "cinesphere")]
#[command(about = "Browse the movie catalog and manage your collections", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Movies trending this week
    Trending {
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Search titles by free text
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Discover movies by genre; only the first genre is sent upstream
    Genre {
        #[arg(required = true)]
        ids: Vec<GenreId>,
        #[arg(long, default_value_t = SortKey::default())]
        sort: SortKey,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// List all genres
    Genres,
    /// Show one movie
    Detail { id: u64 },
    /// List a collection of the signed-in user
    Collection {
        kind: CollectionKind,
        #[arg(long, default_value_t = CollectionSort::default())]
        sort: CollectionSort,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Add or remove a movie from favorites
    Favorite { id: u64 },
    /// Add or remove a movie from the watchlist
    Watchlist { id: u64 },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinesphere=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if let Err(e) = run(args.command).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Command) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let provider = Arc::new(TmdbProvider::from_config(&config)?);

    match command {
        Command::Trending { pages } => {
            let discovery = Discovery::new(provider.clone());
            discovery.reset_to_discover().await?;
            load_pages(&discovery, pages).await?;
            print_snapshot(&discovery.snapshot().await, &load_genres(provider.as_ref()).await);
        }
        Command::Search { query, pages } => {
            let discovery = Discovery::new(provider.clone());
            discovery.set_free_text(&query).await?;
            load_pages(&discovery, pages).await?;
            print_snapshot(&discovery.snapshot().await, &load_genres(provider.as_ref()).await);
        }
        Command::Genre { ids, sort, pages } => {
            let discovery = Discovery::new(provider.clone());
            discovery.set_genre_filter(&ids, sort).await?;
            load_pages(&discovery, pages).await?;
            print_snapshot(&discovery.snapshot().await, &load_genres(provider.as_ref()).await);
        }
        Command::Genres => {
            let genres = GenreIndex::load(provider.as_ref()).await?;
            for genre in genres.genres() {
                println!("{:>6}  {}", genre.id, genre.name);
            }
        }
        Command::Detail { id } => {
            let detail = provider.get_movie_detail(MovieId(id)).await?;
            println!("{} ({})", detail.title, detail.release_date.as_deref().unwrap_or("?"));
            println!("Rating: {:.1}", detail.vote_average);
            if let Some(runtime) = detail.runtime {
                println!("Runtime: {} min", runtime);
            }
            let genres: Vec<&str> = detail.genres.iter().map(|g| g.name.as_str()).collect();
            if !genres.is_empty() {
                println!("Genres: {}", genres.join(", "));
            }
            if let Some(overview) = &detail.overview {
                println!("\n{}", overview);
            }
        }
        Command::Collection { kind, sort, pages } => {
            signed_in_session(&config).await?;

            let browser = CollectionBrowser::new(provider.clone(), kind);
            browser.set_sort(sort).await?;
            for _ in 1..pages {
                if browser.load_more().await? == FetchOutcome::Skipped {
                    break;
                }
            }

            let genres = load_genres(provider.as_ref()).await;
            match browser.status().await {
                ResultsStatus::Empty => println!("Your {} is empty", kind),
                _ => print_movies(&browser.items().await, &genres),
            }
        }
        Command::Favorite { id } => {
            toggle(&config, provider, CollectionKind::Favorites, MovieId(id)).await?;
        }
        Command::Watchlist { id } => {
            toggle(&config, provider, CollectionKind::Watchlist, MovieId(id)).await?;
        }
    }

    Ok(())
}

async fn signed_in_session(config: &Config) -> anyhow::Result<SessionStore> {
    let session = SessionStore::new(Arc::new(HttpAuthService::from_config(config)?));
    if session.init(config.session_token.clone()).await.is_none() {
        bail!("Not signed in; set SESSION_TOKEN to a valid session token");
    }
    Ok(session)
}

async fn toggle(
    config: &Config,
    provider: Arc<TmdbProvider>,
    kind: CollectionKind,
    movie_id: MovieId,
) -> anyhow::Result<()> {
    let session = signed_in_session(config).await?;

    let sync = CollectionSync::new(provider);
    sync.refresh(&session)
        .await
        .context("Failed to load collection membership")?;

    let member = sync.toggle(kind, movie_id).await?;
    if member {
        println!("Added {} to {}", movie_id, kind);
    } else {
        println!("Removed {} from {}", movie_id, kind);
    }
    Ok(())
}

async fn load_pages(discovery: &Discovery, pages: u32) -> anyhow::Result<()> {
    for _ in 1..pages {
        if discovery.load_more().await? == FetchOutcome::Skipped {
            break;
        }
    }
    Ok(())
}

/// Genre names are decoration only; a failed lookup leaves them blank
async fn load_genres(catalog: &dyn MovieCatalogService) -> GenreIndex {
    GenreIndex::load(catalog).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Genre list unavailable");
        GenreIndex::default()
    })
}

fn print_snapshot(snapshot: &DiscoverySnapshot, genres: &GenreIndex) {
    match snapshot.status {
        ResultsStatus::Empty => println!("No movies found"),
        _ => {
            print_movies(&snapshot.results, genres);
            println!(
                "\npage {} of {}",
                snapshot.page,
                snapshot.total_pages.max(snapshot.page)
            );
        }
    }
}

fn print_movies(movies: &[MovieSummary], genres: &GenreIndex) {
    for movie in movies {
        let year = movie
            .release_year()
            .map(|y| y.to_string())
            .unwrap_or_else(|| "----".to_string());
        println!(
            "{:>8}  {}  {:>4.1}  {}  [{}]",
            movie.id,
            year,
            movie.average_rating,
            movie.title,
            genres.names(&movie.genre_ids).join(", ")
        );
    }
}
