use anyhow::Context;
use std::path::{Path, PathBuf};
use wapo_search::cli::{Cli, Commands, ConfigAction};
use wapo_search::config::{expand_path, Config};
use wapo_search::error::{Result, SearchAppError};
use wapo_search::pipeline::{build_embedders, build_query_analyzer, SearchPipeline, SearchRequest};
use wapo_search::retrieval::{
    fill_missing_vectors, read_jsonl, Analyzer, Hit, LocalIndex, Ranker, SearchError,
};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    match cli.command {
        Commands::Search {
            query,
            analyzer,
            ranker,
            limit,
            page,
            doc,
            json,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            let options = SearchOptions {
                analyzer,
                ranker,
                limit,
                page,
                doc,
                json,
            };
            cmd_search(&config, query, options)?;
        }
        Commands::Analyze { query, json } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_analyze(&config, &query, json)?;
        }
        Commands::Index {
            file,
            embed,
            index_dir,
        } => {
            let config = load_config(cli.config, cli.profile)?;
            cmd_index(&config, &file, embed, index_dir)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, cli.profile, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "wapo_search=debug"
    } else {
        "wapo_search=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    Ok(runtime)
}

struct SearchOptions {
    analyzer: Option<String>,
    ranker: Option<String>,
    limit: Option<usize>,
    page: usize,
    doc: Option<String>,
    json: bool,
}

fn cmd_search(config: &Config, query: String, options: SearchOptions) -> Result<()> {
    let analyzer = match options.analyzer {
        Some(name) => name.parse::<Analyzer>()?,
        None => config.pipeline.default_analyzer,
    };
    let ranker = match options.ranker {
        Some(name) => name.parse::<Ranker>()?,
        None => config.pipeline.default_ranker,
    };
    if options.page == 0 {
        return Err(SearchError::ValidationError("Page numbers start at 1".to_string()).into());
    }

    let request = SearchRequest {
        query,
        analyzer,
        ranker,
        limit: options.limit.unwrap_or(config.pipeline.default_limit),
    };

    let pipeline = SearchPipeline::from_config(config)?;
    let response = runtime()?.block_on(pipeline.search(&request))?;
    let results = &response.results;

    if let Some(doc_id) = options.doc {
        let hit = results.get(&doc_id).ok_or_else(|| {
            SearchError::ValidationError(format!("Document {} is not among the results", doc_id))
        })?;
        if options.json {
            println!("{}", to_json(hit)?);
        } else {
            print_document(hit);
        }
        return Ok(());
    }

    let page = results.page(options.page).ok_or_else(|| {
        SearchError::ValidationError(format!(
            "Page {} out of range (1..={})",
            options.page,
            results.page_count()
        ))
    })?;
    let last_page = results.is_last_page(options.page);

    if options.json {
        let output = serde_json::json!({
            "request_id": response.request_id,
            "query": response.query,
            "processed": response.processed,
            "analyzer": response.analyzer,
            "ranker": response.ranker,
            "total": results.total(),
            "page": options.page,
            "page_count": results.page_count(),
            "last_page": last_page,
            "hits": page,
        });
        println!("{}", to_json(&output)?);
        return Ok(());
    }

    println!("Query:     {}", response.query);
    println!(
        "Processed: {} ({})",
        response.processed.text, response.processed.strategy
    );
    println!(
        "Results:   {} total, page {} of {}{}",
        results.total(),
        options.page,
        results.page_count(),
        if last_page { " (last page)" } else { "" }
    );

    if page.is_empty() {
        println!("\nNo results");
        return Ok(());
    }

    let first_rank = (options.page - 1) * results.page_size() + 1;
    for (offset, hit) in page.iter().enumerate() {
        println!(
            "\n{:>3}. {} [{}] score {:.3}",
            first_rank + offset,
            display_or(&hit.title, "(untitled)"),
            hit.doc_id,
            hit.score
        );
        if !hit.author.is_empty() || !hit.date.is_empty() {
            println!("     {} {}", hit.author, hit.date);
        }
        println!("     {}", hit.preview(160));
    }

    Ok(())
}

fn print_document(hit: &Hit) {
    println!("{}", display_or(&hit.title, "(untitled)"));
    println!("Doc ID: {}", hit.doc_id);
    if !hit.author.is_empty() {
        println!("Author: {}", hit.author);
    }
    if !hit.date.is_empty() {
        println!("Date:   {}", hit.date);
    }
    println!("Score:  {:.3}", hit.score);
    if !hit.annotation.is_empty() {
        println!("Note:   {}", hit.annotation);
    }
    println!("\n{}", hit.content);
}

fn display_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn cmd_analyze(config: &Config, query: &str, json: bool) -> Result<()> {
    let analysis = build_query_analyzer(config)?.analyze(query);

    if json {
        println!("{}", to_json(&analysis)?);
        return Ok(());
    }

    println!("Raw:        {}", analysis.raw);
    println!("Normalized: {}", analysis.normalized);
    println!("Filtered:   {}", analysis.filtered.lower.join(" "));
    println!(
        "Strategy:   {} ({} terms)",
        analysis.processed.strategy,
        analysis.filtered.len()
    );
    println!("Processed:  {}", analysis.processed.text);

    Ok(())
}

fn cmd_index(config: &Config, file: &Path, embed: bool, index_dir: Option<PathBuf>) -> Result<()> {
    let mut records = read_jsonl(file)?;
    println!("Read {} documents from {}", records.len(), file.display());

    if embed {
        let embedders = build_embedders(&config.embedding)?;
        let filled = runtime()?.block_on(fill_missing_vectors(&mut records, &embedders))?;
        println!("✓ Encoded {} missing vectors", filled);
    }

    let dir = expand_path(&index_dir.unwrap_or_else(|| config.backend.index_dir.clone()))?;
    let index = LocalIndex::new(dir)?;
    let added = index.insert(&records)?;

    println!("✓ Indexed {} documents at {}", added, index.path().display());
    println!("  Searchable documents: {}", index.len());

    Ok(())
}

fn cmd_config(
    config_path: Option<PathBuf>,
    profile: Option<String>,
    action: ConfigAction,
) -> Result<()> {
    match action {
        ConfigAction::Show { section } => {
            let config = load_config(config_path, profile)?;
            let value = serde_json::to_value(&config).map_err(|e| SearchAppError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;

            let shown = match section {
                Some(section) => value.get(&section).cloned().ok_or_else(|| {
                    SearchAppError::InvalidConfigValue {
                        path: section.clone(),
                        message: "No such configuration section".to_string(),
                    }
                })?,
                None => value,
            };

            println!("{}", to_json(&shown)?);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!("  Profiles: {}", config.profiles.len());
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| SearchAppError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
        ConfigAction::Path => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>, profile: Option<String>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    let mut config = if path.exists() {
        Config::load(&path)?
    } else {
        tracing::warn!(
            "Config file not found, using defaults. Run 'wapo-search config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    };

    if let Some(profile) = profile {
        config.apply_profile(&profile)?;
    }

    Ok(config)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| SearchAppError::Json {
        source: e,
        context: "Failed to serialize output".to_string(),
    })
}
