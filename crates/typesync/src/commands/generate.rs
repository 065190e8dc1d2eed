//! Generate command - TypeScript declarations from an OpenAPI document.

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use typesync_typegen::config::NamingConvention;
use typesync_typegen::{OpenApiDocument, TypegenConfig, generate, output};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG: &str = "typesync.toml";

/// Generate command arguments
#[derive(Args)]
pub struct GenerateArgs {
    /// OpenAPI 3.x document (JSON or YAML), use - for stdin
    pub input: PathBuf,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file (defaults to ./typesync.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Input format
    #[arg(short, long, value_enum, default_value = "auto")]
    pub format: InputFormat,

    /// Print the structured generation result as JSON instead of TypeScript
    #[arg(long)]
    pub json: bool,

    /// Regenerate whenever the input file changes
    #[arg(short, long)]
    pub watch: bool,

    /// Prefix for every generated type name
    #[arg(long)]
    pub prefix: Option<String>,

    /// Suffix for every generated type name
    #[arg(long)]
    pub suffix: Option<String>,

    /// Case convention for type names
    #[arg(long, value_enum)]
    pub naming: Option<NamingArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// Detect from the file extension, then from the content
    Auto,
    Json,
    Yaml,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum NamingArg {
    Pascal,
    Camel,
    Snake,
}

impl From<NamingArg> for NamingConvention {
    fn from(arg: NamingArg) -> Self {
        match arg {
            NamingArg::Pascal => NamingConvention::Pascal,
            NamingArg::Camel => NamingConvention::Camel,
            NamingArg::Snake => NamingConvention::Snake,
        }
    }
}

/// Run the generate command
pub fn run(args: GenerateArgs) -> Result<()> {
    let config = load_config(&args)?;
    if !args.watch {
        return regenerate(&args, &config);
    }

    if is_stdin(&args.input) {
        bail!("--watch needs a file input, not stdin");
    }
    if let Err(e) = regenerate(&args, &config) {
        tracing::error!("{:#}", e);
    }
    let debounce = Duration::from_millis(config.watch.debounce_ms);
    crate::watch::watch(&args.input, debounce, || {
        let config = load_config(&args)?;
        regenerate(&args, &config)
    })
}

/// One complete run: read, parse, generate, write.
fn regenerate(args: &GenerateArgs, config: &TypegenConfig) -> Result<()> {
    let source = read_input(&args.input)?;
    let format = resolve_format(args.format, &args.input, &source);
    let document = parse_document(&source, format)
        .with_context(|| format!("failed to parse {}", display_input(&args.input)))?;

    let result = generate(&document, config)
        .with_context(|| format!("failed to generate types for {}", display_input(&args.input)))?;

    let rendered = if args.json {
        let mut json = serde_json::to_string_pretty(&result)?;
        json.push('\n');
        json
    } else {
        output::render_declarations(&result, &config.output)
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "Generated {} ({} types, {} operations)",
                path.display(),
                result.type_count,
                result.operation_count
            );
        }
        None => {
            print!("{}", rendered);
            eprintln!(
                "Generated {} types, {} operations",
                result.type_count, result.operation_count
            );
        }
    }
    Ok(())
}

/// File config (explicit, or `./typesync.toml` if present) with flag
/// overrides applied on top.
fn load_config(args: &GenerateArgs) -> Result<TypegenConfig> {
    let path = match &args.config {
        Some(path) => Some(path.clone()),
        None => Some(PathBuf::from(DEFAULT_CONFIG)).filter(|p| p.is_file()),
    };

    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            let config: TypegenConfig = toml::from_str(&content)
                .with_context(|| format!("invalid config {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => TypegenConfig::default(),
    };

    if let Some(prefix) = &args.prefix {
        config.naming.prefix = prefix.clone();
    }
    if let Some(suffix) = &args.suffix {
        config.naming.suffix = suffix.clone();
    }
    if let Some(naming) = args.naming {
        config.naming.types = naming.into();
    }
    Ok(config)
}

fn is_stdin(input: &Path) -> bool {
    input.as_os_str() == "-"
}

fn display_input(input: &Path) -> String {
    if is_stdin(input) {
        "<stdin>".to_string()
    } else {
        input.display().to_string()
    }
}

fn read_input(input: &Path) -> Result<String> {
    if is_stdin(input) {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("failed to read stdin")?;
        return Ok(source);
    }
    std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

/// Settle `auto`: extension first, then a look at the first character.
fn resolve_format(format: InputFormat, input: &Path, source: &str) -> InputFormat {
    if format != InputFormat::Auto {
        return format;
    }
    match input.extension().and_then(|e| e.to_str()) {
        Some("json") => InputFormat::Json,
        Some("yaml" | "yml") => InputFormat::Yaml,
        _ if source.trim_start().starts_with('{') => InputFormat::Json,
        _ => InputFormat::Yaml,
    }
}

fn parse_document(source: &str, format: InputFormat) -> Result<OpenApiDocument> {
    let document = match format {
        InputFormat::Json => OpenApiDocument::from_json_str(source)?,
        InputFormat::Yaml | InputFormat::Auto => OpenApiDocument::from_yaml_str(source)?,
    };
    Ok(document)
}
