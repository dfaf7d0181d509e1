use std::collections::HashSet;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use xml2json_serde::{xml_str_to_json, xml_str_to_records, Config, JsonArray, JsonType, NullValue};

#[derive(Debug, Parser)]
#[command(name = "xml2json", version, about = "Convert XML documents to JSON")]
struct Args {
    /// Input files or glob patterns; `-` or nothing reads stdin
    #[arg(value_name = "INPUT")]
    inputs: Vec<String>,
    /// JSON file with conversion settings, e.g. {"inferNumbers": false}
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Keep number-like text as strings
    #[arg(long)]
    no_infer_numbers: bool,
    /// Keep true/false text as strings
    #[arg(long)]
    no_infer_booleans: bool,
    /// Turn empty text into "" instead of null
    #[arg(long)]
    keep_empty_strings: bool,
    /// Trim whitespace around text values
    #[arg(long)]
    trim_text: bool,
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,
    #[arg(long, value_name = "PREFIX")]
    attr_prefix: Option<String>,
    #[arg(long, value_name = "KEY")]
    text_key: Option<String>,
    /// What elements without attributes or content become
    #[arg(long, value_enum, value_name = "MODE")]
    empty_elements: Option<EmptyArg>,
    /// Wrap the output in an object keyed by the root tag name
    #[arg(long)]
    wrap_root: bool,
    /// Never infer types at this path, e.g. /a/b or /a/b/@id (repeatable)
    #[arg(long = "string-path", value_name = "PATH")]
    string_paths: Vec<String>,
    /// Always emit an array for the elements at this path (repeatable)
    #[arg(long = "array-path", value_name = "PATH")]
    array_paths: Vec<String>,
    /// Leave out the elements at this path (repeatable)
    #[arg(long = "exclude", value_name = "PATH")]
    excludes: Vec<String>,
    /// Emit one record per element at this path instead of the whole document
    #[arg(long, value_name = "PATH")]
    select: Option<String>,
    /// Copy the attributes of the ancestor at this path into every selected record (repeatable)
    #[arg(long = "attr-path", value_name = "PATH", requires = "select")]
    attr_paths: Vec<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
    /// Indent JSON output (ignored for jsonl)
    #[arg(long)]
    pretty: bool,
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE", conflicts_with = "target_dir")]
    output: Option<PathBuf>,
    /// Write one <name>.json or <name>.jsonl per input into this directory
    #[arg(long, value_name = "DIR")]
    target_dir: Option<PathBuf>,
    /// Skip inputs whose output file already exists
    #[arg(long, requires = "target_dir")]
    no_overwrite: bool,
    /// Gzip the output files; target-dir outputs get a `.gz` suffix
    #[arg(long)]
    zip: bool,
    /// Number of inputs converted at the same time
    #[arg(short, long, default_value_t = 1, value_name = "N")]
    jobs: usize,
    /// More logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EmptyArg {
    Null,
    Object,
    Ignore,
}

impl From<EmptyArg> for NullValue {
    fn from(value: EmptyArg) -> Self {
        match value {
            EmptyArg::Null => NullValue::Null,
            EmptyArg::Object => NullValue::EmptyObject,
            EmptyArg::Ignore => NullValue::Ignore,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Jsonl,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    fn label(&self) -> String {
        match self {
            Input::Stdin => "<stdin>".to_owned(),
            Input::File(path) => path.display().to_string(),
        }
    }
}

enum Converted {
    Document(Value),
    Records(Vec<Value>),
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = build_config(&args)?;
    config.validate()?;

    let inputs = expand_inputs(&args.inputs)?;
    if args.output.is_some() && inputs.len() > 1 {
        bail!("--output takes a single input, got {}", inputs.len());
    }
    if args.zip && args.output.is_none() && args.target_dir.is_none() {
        bail!("--zip needs --output or --target-dir");
    }
    let inputs = skip_existing(&args, inputs)?;
    info!(count = inputs.len(), "processing inputs");

    let rendered = convert_all(&args, &config, &inputs)?;
    write_outputs(&args, &inputs, rendered)
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            serde_json::from_str::<Config>(&text)
                .with_context(|| format!("invalid config file {}", path.display()))?
        }
        None => Config::new_with_defaults(),
    };

    if args.no_infer_numbers {
        config.infer_numbers = false;
    }
    if args.no_infer_booleans {
        config.infer_booleans = false;
    }
    if args.keep_empty_strings {
        config.empty_as_null = false;
    }
    if args.trim_text {
        config.trim_text = true;
    }
    if args.wrap_root {
        config.wrap_root = true;
    }
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(prefix) = &args.attr_prefix {
        config.attribute_prefix = prefix.clone();
    }
    if let Some(key) = &args.text_key {
        config.text_key = key.clone();
    }
    if let Some(mode) = args.empty_elements {
        config.empty_element_handling = mode.into();
    }

    for path in &args.string_paths {
        let rule = if args.array_paths.contains(path) {
            JsonArray::Always(JsonType::AlwaysString)
        } else {
            JsonArray::Infer(JsonType::AlwaysString)
        };
        config = config.add_json_type_override(path.as_str(), rule);
    }
    for path in args.array_paths.iter().filter(|p| !args.string_paths.contains(p)) {
        config = config.add_json_type_override(path.as_str(), JsonArray::Always(JsonType::Infer));
    }
    for path in &args.excludes {
        config = config.add_exclude_path(path);
    }
    for path in &args.attr_paths {
        config = config.add_attribute_path(path);
    }

    Ok(config)
}

fn expand_inputs(patterns: &[String]) -> Result<Vec<Input>> {
    if patterns.is_empty() {
        return Ok(vec![Input::Stdin]);
    }

    let mut seen = HashSet::new();
    let mut inputs = Vec::new();
    for pattern in patterns {
        if pattern == "-" {
            if seen.insert(Input::Stdin) {
                inputs.push(Input::Stdin);
            }
            continue;
        }
        let mut matched = false;
        for entry in glob::glob(pattern).with_context(|| format!("invalid pattern {pattern}"))? {
            let input = Input::File(entry?);
            matched = true;
            if seen.insert(input.clone()) {
                inputs.push(input);
            }
        }
        if !matched {
            bail!("no input matches {pattern}");
        }
    }
    Ok(inputs)
}

/// `<dir>/<name>.json[l][.gz]`, where `<name>` is the input file name without
/// a trailing `.gz` and then `.xml`. Other dots are kept, so `report.2024.xml`
/// and `report.2025.xml` get distinct outputs.
fn target_path(dir: &Path, input: &Path, format: OutputFormat, zip: bool) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = file_name.strip_suffix(".gz").unwrap_or(&file_name);
    let base = base.strip_suffix(".xml").unwrap_or(base);

    let mut name = format!("{}.{}", base, format.extension());
    if zip {
        name.push_str(".gz");
    }
    dir.join(name)
}

fn skip_existing(args: &Args, inputs: Vec<Input>) -> Result<Vec<Input>> {
    let Some(dir) = &args.target_dir else {
        return Ok(inputs);
    };
    let mut kept = Vec::with_capacity(inputs.len());
    for input in inputs {
        let Input::File(path) = &input else {
            bail!("stdin cannot be written to --target-dir");
        };
        if args.no_overwrite && target_path(dir, path, args.format, args.zip).exists() {
            info!(input = %path.display(), "output exists, skipping");
            continue;
        }
        kept.push(input);
    }
    Ok(kept)
}

fn read_input(input: &Input) -> Result<String> {
    match input {
        Input::Stdin => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
        Input::File(path) if path.extension().is_some_and(|ext| ext == "gz") => {
            let file = fs::File::open(path)
                .with_context(|| format!("failed to open input file {}", path.display()))?;
            let mut buffer = String::new();
            GzDecoder::new(file)
                .read_to_string(&mut buffer)
                .with_context(|| format!("failed to decompress input file {}", path.display()))?;
            Ok(buffer)
        }
        Input::File(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
    }
}

fn convert_one(args: &Args, config: &Config, input: &Input) -> Result<String> {
    debug!(input = %input.label(), "converting");
    let xml = read_input(input)?;
    let converted = match &args.select {
        Some(path) => Converted::Records(xml_str_to_records(&xml, path, config)?),
        None => Converted::Document(xml_str_to_json(&xml, config)?),
    };
    render(&converted, args.format, args.pretty)
}

/// Converts every input on a pool of `args.jobs` threads. Results come back in input order.
fn convert_all(args: &Args, config: &Config, inputs: &[Input]) -> Result<Vec<String>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs.max(1))
        .build()
        .context("failed to start conversion threads")?;

    pool.install(|| {
        inputs
            .par_iter()
            .map(|input| {
                convert_one(args, config, input)
                    .with_context(|| format!("failed to convert {}", input.label()))
            })
            .collect()
    })
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

fn render(converted: &Converted, format: OutputFormat, pretty: bool) -> Result<String> {
    let mut out = String::new();
    match (format, converted) {
        (OutputFormat::Json, Converted::Document(value)) => {
            out.push_str(&to_json(value, pretty)?);
            out.push('\n');
        }
        (OutputFormat::Json, Converted::Records(records)) => {
            out.push_str(&to_json(records, pretty)?);
            out.push('\n');
        }
        (OutputFormat::Jsonl, Converted::Document(value)) => {
            out.push_str(&to_json(value, false)?);
            out.push('\n');
        }
        (OutputFormat::Jsonl, Converted::Records(records)) => {
            for record in records {
                out.push_str(&to_json(record, false)?);
                out.push('\n');
            }
        }
    }
    Ok(out)
}

fn write_outputs(args: &Args, inputs: &[Input], rendered: Vec<String>) -> Result<()> {
    if let Some(dir) = &args.target_dir {
        for (input, text) in inputs.iter().zip(rendered) {
            let Input::File(path) = input else {
                continue;
            };
            if text.is_empty() {
                info!(input = %path.display(), "no data found");
                continue;
            }
            let target = target_path(dir, path, args.format, args.zip);
            write_file(&target, &text, args.zip)?;
            info!(output = %target.display(), "completed");
        }
        return Ok(());
    }

    if let Some(path) = &args.output {
        let text: String = rendered.concat();
        return write_file(path, &text, args.zip);
    }

    let stdout = io::stdout();
    let mut lock = stdout.lock();
    for text in rendered {
        lock.write_all(text.as_bytes())
            .context("failed to write stdout")?;
    }
    lock.flush().context("failed to flush stdout")?;
    Ok(())
}

fn write_file(path: &Path, text: &str, zip: bool) -> Result<()> {
    if !zip {
        return fs::write(path, text).with_context(|| format!("failed to write {}", path.display()));
    }
    let file = fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder
        .write_all(text.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    encoder
        .finish()
        .with_context(|| format!("failed to finish {}", path.display()))?;
    Ok(())
}
