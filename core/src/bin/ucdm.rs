use clap::Parser;
use log::{error, info};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use ucdm_core::cli::report::TextReport;
use ucdm_core::cli::{Cli, CommonArgs, Commands, InputArgs, OutputFormat};
use ucdm_core::{
    collect_dicom_files, expand_tag_lists, partition_by_directory, run_partitions, Attribute,
    AttributeSet, DicomScanner, ExtractionOptions, ExtractionPipeline, FailurePolicy,
    ResultTable, Result, ScanIndex, Subseries, SubseriesResolver, Tag, TagConfig, UcdmError,
    Unitizer, UnreadablePolicy,
};

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Scan {
            directory,
            tags,
            output,
            common,
        } => {
            let config = load_config(&common)?;
            let tags: BTreeSet<Tag> = resolve_tokens(&config, &tags)?
                .into_iter()
                .map(|(tag, _)| tag)
                .collect();
            let files = find_files(&directory)?;
            let index = ScanIndex::scan(&DicomScanner::new(), &files, &tags, policy(&common))?;
            info!("Writing {} rows", index.len());
            match output {
                Some(path) => index.to_csv_path(&path),
                None => index.write_csv(io::stdout().lock()),
            }
        }
        Commands::Extract {
            input,
            unit,
            lookup,
            slices,
            subseries,
            parallel,
            skip_failed,
            output,
            common,
        } => {
            let config = load_config(&common)?;
            let unit_tags = resolve_tokens(&config, &unit)?.into_iter().map(|(tag, _)| tag);
            let unitizer = Unitizer::hierarchical(unit_tags)?;

            let mut attributes = AttributeSet::new();
            for (tag, name) in resolve_tokens(&config, &lookup)? {
                attributes.insert(name, Attribute::lookup_tag(tag))?;
            }
            if slices {
                attributes.add(Attribute::number_of_slices())?;
            }
            if subseries {
                let resolver = SubseriesResolver::from_config(&config)?;
                attributes.add(Attribute::has_subseries(&resolver))?;
                attributes.add(Attribute::subseries_axes(&resolver))?;
            }

            let pipeline = ExtractionPipeline::new(unitizer, attributes)
                .with_options(ExtractionOptions::default().with_unreadable(policy(&common)));

            let table = match (&input.index, parallel) {
                (Some(index), _) => pipeline
                    .extract_from_index(ScanIndex::from_csv_path(index)?)?
                    .into_table()?,
                (None, true) => {
                    let directory = input_directory(&input)?;
                    let files = find_files(directory)?;
                    let partitions = partition_by_directory(directory, &files);
                    let failure_policy = if skip_failed {
                        FailurePolicy::Skip
                    } else {
                        FailurePolicy::Abort
                    };
                    run_partitions(&pipeline, &DicomScanner::new(), partitions)
                        .into_table(failure_policy)?
                }
                (None, false) => {
                    let files = find_files(input_directory(&input)?)?;
                    pipeline
                        .extract(&DicomScanner::new(), &files)?
                        .into_table()?
                }
            };
            write_table(&table, output.as_deref())
        }
        Commands::Subseries {
            input,
            format,
            common,
        } => {
            let config = load_config(&common)?;
            let resolver = SubseriesResolver::from_config(&config)?;
            let index = match &input.index {
                Some(path) => ScanIndex::from_csv_path(path)?,
                None => {
                    let files = find_files(input_directory(&input)?)?;
                    ScanIndex::scan(
                        &DicomScanner::new(),
                        &files,
                        &resolver.required_tags(),
                        policy(&common),
                    )?
                }
            };

            let series = resolver
                .series_ids(&index)?
                .iter()
                .map(|id| resolver.resolve_series(&index, id))
                .collect::<Result<Vec<_>>>()?;
            output_subseries(&series, format)
        }
    }
}

fn load_config(common: &CommonArgs) -> Result<TagConfig> {
    match &common.tag_config {
        Some(path) => TagConfig::from_json_file(path),
        None => Ok(TagConfig::default()),
    }
}

fn resolve_tokens(config: &TagConfig, tokens: &[String]) -> Result<Vec<(Tag, String)>> {
    let tokens = expand_tag_lists(tokens)?;
    config.resolve_all(tokens.as_slice())
}

fn policy(common: &CommonArgs) -> UnreadablePolicy {
    if common.skip_unreadable {
        UnreadablePolicy::Skip
    } else {
        UnreadablePolicy::Fail
    }
}

fn input_directory(input: &InputArgs) -> Result<&Path> {
    input
        .directory
        .as_deref()
        .ok_or_else(|| UcdmError::Configuration("no input directory given".to_string()))
}

fn find_files(directory: &Path) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(UcdmError::Configuration(format!(
            "{} is not a directory",
            directory.display()
        )));
    }

    info!("Processing directory: {}", directory.display());
    let files = collect_dicom_files(directory)?;
    if files.is_empty() {
        return Err(UcdmError::Configuration(format!(
            "no DICOM files found in {}",
            directory.display()
        )));
    }

    info!("Found {} DICOM files", files.len());
    Ok(files)
}

fn write_table(table: &ResultTable, output: Option<&Path>) -> Result<()> {
    info!("Writing {} rows", table.len());
    match output {
        Some(path) => table.to_csv_path(path),
        None => table.write_csv(io::stdout().lock()),
    }
}

fn output_subseries(series: &[Subseries], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", TextReport::new(series));
            Ok(())
        }
        OutputFormat::Json => {
            println!("{}", output_json(series)?);
            Ok(())
        }
    }
}

#[cfg(not(feature = "json"))]
fn output_json(_series: &[Subseries]) -> Result<String> {
    Err(UcdmError::Configuration(
        "JSON output requires the 'json' feature".to_string(),
    ))
}

#[cfg(feature = "json")]
fn output_json(series: &[Subseries]) -> Result<String> {
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct SeriesJson {
        series_id: String,
        files: usize,
        has_subseries: bool,
        axes: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    }

    let json: Vec<SeriesJson> = series
        .iter()
        .map(|s| SeriesJson {
            series_id: s.series_id().to_string(),
            files: s.len(),
            has_subseries: s.has_subseries(),
            axes: s
                .axes()
                .iter()
                .map(|(tag, grouping)| {
                    let buckets = grouping
                        .iter()
                        .map(|(value, files)| {
                            let files = files.iter().map(|f| f.display().to_string()).collect();
                            (value.clone(), files)
                        })
                        .collect();
                    (tag.display_name(), buckets)
                })
                .collect(),
        })
        .collect();

    Ok(serde_json::to_string_pretty(&json)?)
}
