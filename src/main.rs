mod cache;
mod cli;
mod client;
mod config;
mod confirm;
mod criteria;
mod details;
mod model;
mod normalizer;
mod output;
mod reference;
mod search;

use std::path::Path;
use std::time::Instant;

use clap::Parser;
use tracing::{debug, error, info, warn};

use crate::cache::ReferenceDataCache;
use crate::cli::{AuxCommand, RiaOpts};
use crate::client::RiaClient;
use crate::confirm::{Confirmer, TerminalConfirmer};
use crate::details::DetailFetcher;
use crate::model::{CriteriaError, FlatRecord, RunError};
use crate::normalizer::FieldMapping;
use crate::output::OutputWriter;
use crate::reference::ReferenceService;
use crate::search::{SearchAggregator, SearchOutcome};

/// Ids at or above this count risk the API token connection limit; the
/// operator is asked before the detail batch starts.
const TOKEN_LIMIT_WARN_COUNT: usize = 500;

#[tokio::main]
async fn main() {
    let opts = RiaOpts::parse();
    init_logging(opts.verbose);

    // Key update mode: store and exit.
    if let Some(key) = &opts.api_key {
        if let Err(err) = config::store_api_key(Path::new(config::DEFAULT_KEY_PATH), key) {
            error!("Failed to store api key: {err}");
            std::process::exit(1);
        }
        return;
    }

    if let Err(err) = run(&opts).await {
        error!("{err}");
        if let RunError::Criteria(CriteriaError::UnknownName { known, .. }) = &err {
            if !known.is_empty() {
                eprintln!("Available to search:");
                for name in known {
                    eprintln!("'{name}'");
                }
            }
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();
}

async fn run(opts: &RiaOpts) -> Result<(), RunError> {
    let started = Instant::now();

    let app_config = config::load_or_init(Path::new(config::DEFAULT_CONFIG_PATH))?;
    let api_key = config::obtain_api_key(Path::new(config::DEFAULT_KEY_PATH))?;

    let client = RiaClient::new(api_key);
    let cache = ReferenceDataCache::new(&app_config.cache_dir, app_config.cache_ttl_seconds);
    let refs = ReferenceService::new(&client, &cache);

    let tables = refs.load_all().await?;

    // Resolve make and model up front; both the search and the average-price
    // mode want the ids, and unknown names should fail before any paging.
    let make_name = match &opts.make {
        Some(name) => name.clone(),
        None if opts.get.is_none() => return Err(CriteriaError::MakeRequired.into()),
        None => String::new(),
    };
    let make_id = if make_name.is_empty() {
        None
    } else {
        Some(criteria::resolve_make(&make_name, &tables.makes)?)
    };

    let (model_name, model_id) = match &opts.model {
        Some(model) => {
            let Some(make_id) = make_id else {
                return Err(CriteriaError::MakeRequiredForModel.into());
            };
            let models = refs.models(make_id).await?;
            let id = criteria::resolve_model(model, &models)?;
            (model.clone(), Some(id))
        }
        None => (String::new(), None),
    };

    if let Some(AuxCommand::AveragePrice) = opts.get {
        let avg_criteria = criteria::build_average_price(opts, &tables, make_id, model_id)?;
        let prices = client.average_price(&avg_criteria).await?;
        println!("Total cars: {}", prices.total);
        println!("Arithmetic mean: {}", prices.arithmetic_mean);
        println!("Inter quartile mean: {}", prices.inter_quartile_mean);
        println!("Percentiles: {}", prices.percentiles);
        info!("Printed out Ria average prices to stdout");
        return Ok(());
    }

    let Some(make_id) = make_id else {
        return Err(CriteriaError::MakeRequired.into());
    };

    let search_criteria = criteria::build(opts, &tables, make_id, model_id)?;
    debug!("Searching by following criteria: {:?}", search_criteria.params());

    let confirmer = TerminalConfirmer;
    let aggregator = SearchAggregator::new(&client, &confirmer);
    let label = if model_name.is_empty() {
        make_name.clone()
    } else {
        format!("{make_name} {model_name}")
    };

    let ids = match aggregator.search(&search_criteria, &label).await? {
        SearchOutcome::Found(ids) => ids,
        SearchOutcome::NoMatches | SearchOutcome::Cancelled => return Ok(()),
    };

    if ids.len() >= TOKEN_LIMIT_WARN_COUNT {
        println!("Might go over the token connection limit,");
        if !confirmer.confirm("continue? (y/n)") {
            info!("Search is cancelled by user");
            return Ok(());
        }
    }

    let mapping = FieldMapping::resolve(&app_config.fields)?;
    debug!("Extracting following fields: {:?}", app_config.fields);

    let fetcher = DetailFetcher::new(&client);
    let report = details::run_batch(&fetcher, &ids).await?;

    if report.records.is_empty() {
        return Err(RunError::NoDetails);
    }
    let with_warning = !report.is_complete() || report.records.len() != ids.len();
    if with_warning {
        warn!("Inaccurate search results due to errors, check log for more details");
    }
    info!("Downloaded details for {} cars", report.records.len());

    let records: Vec<FlatRecord> = report
        .records
        .iter()
        .map(|record| normalizer::normalize(&record.raw, &tables.bodies, &mapping))
        .collect();

    let format = opts.output.unwrap_or(app_config.output_format);
    let writer = OutputWriter::new(&app_config.results_dir, format);
    writer.write(&records, &make_name, &model_name, with_warning)?;

    let elapsed = started.elapsed().as_secs_f64();
    if with_warning {
        warn!("Finished search in {elapsed:.2} seconds with warnings");
    } else {
        info!("Finished search in {elapsed:.2} seconds");
    }
    let timings: Vec<String> = report
        .records
        .iter()
        .map(|record| format!("{}={:.3}s", record.id, record.elapsed.as_secs_f64()))
        .collect();
    debug!("Detailed run times: {:?}", timings);

    Ok(())
}
