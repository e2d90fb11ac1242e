use crate::archive::{MonthlySplitter, PrismDownloader};
use crate::cli::args::{Cli, Commands};
use crate::config::Settings;
use crate::error::Result;
use crate::processors::{ExtractionEngine, SeriesAssembler, StationSeriesBuilder};
use crate::readers::{CatalogSource, StationCatalog};
use crate::utils::constants::STATION_LIST_FILE;
use crate::writers::write_station_list;
use std::path::PathBuf;
use tracing::info;

fn setup_logging(cli: &Cli) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("prism_extractor={}", cli.get_log_level())));

    // A second init (e.g. from tests) is ignored
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init();
}

pub async fn run(cli: Cli) -> Result<()> {
    setup_logging(&cli);
    let settings = Settings::load(cli.config.as_deref())?;
    let show_progress = settings.progress && !cli.quiet;

    match cli.command {
        Commands::Download {
            root,
            variables,
            scale,
            years,
            base_url,
        } => {
            let downloader = PrismDownloader::new(&root)?
                .with_base_url(base_url.unwrap_or(settings.base_url))
                .with_progress(show_progress);

            for variable in &variables {
                for summary in downloader.download_range(variable, scale, years.years()).await? {
                    println!(
                        "{} {}: {} archives downloaded, {} failed{}",
                        summary.variable,
                        summary.year,
                        summary.downloaded.len(),
                        summary.failed.len(),
                        summary
                            .stopped_at
                            .map(|key| format!(" (stopped at {})", key))
                            .unwrap_or_default()
                    );
                }
            }
        }

        Commands::SplitMonthly {
            root,
            variable,
            scale,
            years,
        } => {
            let copied = MonthlySplitter::new(&root, scale).split_range(&variable, years.years())?;
            println!("Copied {} files into monthly folders", copied);
        }

        Commands::Extract {
            root,
            output_dir,
            variables,
            scale,
            years,
            stations,
            catalog_date_key,
            missing_raster_policy,
            checkpoint_every,
        } => {
            let engine = ExtractionEngine::new(&root, &output_dir, scale)
                .with_policy(missing_raster_policy.unwrap_or(settings.missing_raster_policy))
                .with_checkpoint_every(checkpoint_every.unwrap_or(settings.checkpoint_every))
                .with_progress(show_progress);
            let catalog_date_key = catalog_date_key.unwrap_or(settings.catalog_date_key);

            for variable in &variables {
                // PRISM publishes a separate station list per variable
                let source = match &stations {
                    Some(path) => CatalogSource::File(path.clone()),
                    None => CatalogSource::Directory {
                        root: root.clone(),
                        variable: variable.clone(),
                        scale,
                        date_key: catalog_date_key.clone(),
                    },
                };
                let catalog = StationCatalog::load(&source)?;
                info!("Loaded {} stations for {}", catalog.len(), variable);

                for summary in engine.extract_range(years.years(), &[variable.as_str()], catalog.stations())? {
                    println!(
                        "{} {}: {} dates extracted, {} skipped -> {}",
                        summary.variable,
                        summary.year,
                        summary.dates_processed,
                        summary.dates_skipped.len(),
                        summary.output_path.display()
                    );
                    if let Some(key) = summary.stopped_at {
                        println!("  stopped at date {}", key);
                    }
                }
            }
        }

        Commands::Assemble {
            data_dir,
            output_dir,
            states,
            variables,
            years,
        } => {
            let assembler = SeriesAssembler::new(&data_dir, &output_dir);
            for state in &states {
                for variable in &variables {
                    let series = assembler.assemble(state, variable, years.years())?;
                    println!(
                        "{} {}: {} dates x {} stations -> {}",
                        state,
                        variable,
                        series.table.dates().len(),
                        series.table.stations().len(),
                        series.series_path.display()
                    );
                }
            }
        }

        Commands::BuildStations {
            input_dir,
            output_dir,
            years,
        } => {
            let summary = StationSeriesBuilder::new(&input_dir, &output_dir, years.years()).build()?;
            println!(
                "Wrote {} stations ({}) to {}",
                summary.stations_written.len(),
                summary.variables.join(", "),
                summary.station_dir.display()
            );
            for (station, reason) in &summary.stations_failed {
                println!("  skipped {}: {}", station, reason);
            }
        }

        Commands::StationList { catalog, output } => {
            let catalog = StationCatalog::load(&CatalogSource::File(catalog))?;
            let output = output.unwrap_or_else(|| PathBuf::from(STATION_LIST_FILE));
            write_station_list(&output, catalog.stations())?;
            println!("Wrote {} stations to {}", catalog.len(), output.display());
        }

        Commands::FilterStations {
            catalogs,
            output,
            west,
            south,
            east,
            north,
        } => {
            let loaded = catalogs
                .into_iter()
                .map(|path| StationCatalog::load(&CatalogSource::File(path)))
                .collect::<Result<Vec<_>>>()?;
            let filtered: Vec<StationCatalog> = loaded
                .iter()
                .map(|c| c.within_bounds(west, south, east, north))
                .collect();
            let merged = StationCatalog::merge_unique(&filtered);
            merged.write_csv(&output)?;
            println!("Wrote {} stations to {}", merged.len(), output.display());
        }
    }

    Ok(())
}
