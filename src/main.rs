use banana_l10n::loaders::{BucketOptions, DocumentFormat, create_loader};
use banana_l10n::providers::{
    ClientOptions, ConfigLoader, MockMode, MockTranslator, Translator, create_client_for_model,
};
use banana_l10n::{Dictionary, LocalizationPipeline};
use clap::{Arg, ArgAction, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("banana-l10n")
        .version("0.1.0")
        .about("Localize a document, translating only what changed since the last run")
        .arg(
            Arg::new("file")
                .help("Source document")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .short('t')
                .help("Target locale (repeatable, e.g. -t fr -t de)")
                .required(true)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("source")
                .long("source")
                .short('s')
                .help("Source locale (default: en)")
                .default_value("en"),
        )
        .arg(
            Arg::new("pattern")
                .long("pattern")
                .short('p')
                .help("Regex for spans that must not be translated (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("locked-key")
                .long("locked-key")
                .help("Key glob whose value is never translated (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Document format: text, markdown or json (default: from the file extension)"),
        )
        .arg(
            Arg::new("dictionary")
                .long("dictionary")
                .short('d')
                .help("Dictionary file holding cached translations"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .help("Provider and model, e.g. openai:gpt-4o-mini (default: lingo.dev)")
                .default_value("lingo.dev"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use the mock translator instead of a provider")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let file = matches
        .get_one::<String>("file")
        .map(PathBuf::from)
        .ok_or("missing source file")?;
    let source_locale = matches
        .get_one::<String>("source")
        .map(String::as_str)
        .unwrap_or("en");
    let targets: Vec<String> = matches
        .get_many::<String>("target")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let options = BucketOptions {
        locked_patterns: strings(&matches, "pattern"),
        locked_keys: strings(&matches, "locked-key"),
    };
    let format = match matches.get_one::<String>("format") {
        Some(format) => format.parse::<DocumentFormat>()?,
        None => format_from_extension(&file)?,
    };

    let translator: Arc<dyn Translator> = if matches.get_flag("mock") {
        Arc::new(MockTranslator::new(MockMode::Bracket))
    } else {
        let model = matches
            .get_one::<String>("model")
            .map(String::as_str)
            .unwrap_or("lingo.dev");
        let config = ConfigLoader::new(std::env::current_dir()?);
        let sources = config.key_sources()?;
        Arc::from(create_client_for_model(model, &ClientOptions::default(), &sources)?)
    };

    let dictionary_path = matches.get_one::<String>("dictionary").map(PathBuf::from);
    let mut dictionary = match &dictionary_path {
        Some(path) if path.exists() => {
            let (dictionary, warnings) = Dictionary::deserialize(&std::fs::read_to_string(path)?)?;
            for warning in warnings {
                warn!("{}", warning);
            }
            dictionary
        }
        _ => Dictionary::new(),
    };

    let source = std::fs::read_to_string(&file)?;
    let file_key = file.to_string_lossy().replace('\\', "/");
    let pipeline = LocalizationPipeline::new(translator, source_locale, &targets)?;
    let mut loader = create_loader(format, &options)?;

    let localized = pipeline
        .localize_document(&mut dictionary, &file_key, &mut loader, &source)
        .await?;

    for warning in &localized.report.warnings {
        warn!("{}", warning);
    }
    for (locale, output) in &localized.outputs {
        println!("===== {} =====", locale);
        println!("{}", output);
    }

    if let Some(path) = dictionary_path {
        std::fs::write(&path, dictionary.serialize()?)?;
        info!(path = %path.display(), "Dictionary saved");
    }

    Ok(())
}

fn strings(matches: &clap::ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn format_from_extension(path: &Path) -> Result<DocumentFormat, String> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| format!("Cannot tell the format of {}, pass --format", path.display()))?;
    extension.parse()
}
