use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use xmlform::{
    classify, parse_input, render_html, to_document_with_options, to_xml_string, ColumnInference,
    Config, Document, FieldKind, Input, MixedContent, SchemaIndex, TranscodeOptions,
};

#[derive(Debug, Parser)]
#[command(
    name = "xmlform",
    version,
    about = "Turn XML into an editable document and back"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the content kind of each text
    Classify {
        #[arg(required = true, value_name = "TEXT")]
        texts: Vec<String>,
    },
    /// Render the document view as an HTML fragment
    Render(DocumentArgs),
    /// Transcode forward and back, printing the rebuilt XML
    Roundtrip(DocumentArgs),
    /// Dump the annotated document as JSON
    Inspect(DocumentArgs),
    /// List the fields a schema declares
    Schema {
        /// Schema file
        #[arg(value_name = "XSD")]
        schema: PathBuf,
    },
}

#[derive(Debug, Args)]
struct DocumentArgs {
    /// Input file (defaults to stdin)
    #[arg(value_name = "XML")]
    input: Option<PathBuf>,
    /// Schema describing field kinds and enumerations
    #[arg(short, long, value_name = "XSD")]
    schema: Option<PathBuf>,
    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,
    /// How collection table columns are inferred
    #[arg(long, value_enum, default_value = "first-row")]
    columns: ColumnsArg,
    /// Deepest level rendered with a heading
    #[arg(long, default_value_t = 2)]
    section_depth: u8,
    /// Handling of text mixed with child elements
    #[arg(long, value_enum, default_value = "collapse")]
    mixed: MixedArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColumnsArg {
    FirstRow,
    Union,
}

impl From<ColumnsArg> for ColumnInference {
    fn from(value: ColumnsArg) -> Self {
        match value {
            ColumnsArg::FirstRow => ColumnInference::FirstRow,
            ColumnsArg::Union => ColumnInference::Union,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MixedArg {
    Collapse,
    Preserve,
    Reject,
}

impl From<MixedArg> for MixedContent {
    fn from(value: MixedArg) -> Self {
        match value {
            MixedArg::Collapse => MixedContent::Collapse,
            MixedArg::Preserve => MixedContent::Preserve,
            MixedArg::Reject => MixedContent::Reject,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Classify { texts } => {
            let mut lines = String::new();
            for text in texts {
                lines.push_str(classify(&text).name());
                lines.push('\t');
                lines.push_str(&text);
                lines.push('\n');
            }
            write_output(&None, lines.as_bytes())
        }
        Command::Render(args) => {
            let doc = match load(&args) {
                Ok(doc) => doc,
                Err(err) => {
                    error!("{err:#}");
                    Document::invalid(format!("Invalid document: {err:#}"))
                }
            };
            write_output(&args.output, render_html(&doc).as_bytes())
        }
        Command::Roundtrip(args) => {
            let doc = load(&args)?;
            let xml = to_xml_string(&doc).context("failed to rebuild XML")?;
            write_output(&args.output, xml.as_bytes())
        }
        Command::Inspect(args) => {
            let doc = load(&args)?;
            let mut json = serde_json::to_string_pretty(&doc).context("failed to encode JSON")?;
            json.push('\n');
            write_output(&args.output, json.as_bytes())
        }
        Command::Schema { schema } => {
            let index = SchemaIndex::build(&read_input(&Some(schema))?);
            if index.is_empty() {
                bail!("schema declares no simple fields (or could not be parsed)");
            }
            let mut table = String::new();
            for (tag, descriptor) in index.iter() {
                table.push_str(tag);
                table.push('\t');
                table.push_str(&descriptor.kind.to_string());
                if descriptor.kind == FieldKind::Enum {
                    table.push('\t');
                    let values: Vec<String> = descriptor
                        .enumeration_values
                        .iter()
                        .map(|value| match descriptor.doc_for(value) {
                            Some(doc) => format!("{value} ({doc})"),
                            None => value.clone(),
                        })
                        .collect();
                    table.push_str(&values.join(", "));
                }
                table.push('\n');
            }
            write_output(&None, table.as_bytes())
        }
    }
}

/// Parse the input and transcode it forward
fn load(args: &DocumentArgs) -> Result<Document> {
    let schema = match &args.schema {
        Some(path) => {
            let index = SchemaIndex::build(&read_input(&Some(path.clone()))?);
            info!(fields = index.len(), "schema loaded");
            index
        }
        None => SchemaIndex::empty(),
    };
    let options = TranscodeOptions::default()
        .with_column_inference(args.columns.into())
        .with_section_depth(args.section_depth);
    let config = Config::default().with_mixed_content(args.mixed.into());

    let source = read_input(&args.input)?;
    let filename = args
        .input
        .as_ref()
        .map_or_else(|| "<stdin>".to_string(), |p| p.display().to_string());
    let root = parse_input(&Input::from_str(&source).with_filename(&filename), config)
        .with_context(|| format!("failed to parse {filename}"))?;
    Ok(to_document_with_options(&root, &schema, &options))
}

fn read_input(path: &Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            if buffer.trim().is_empty() {
                bail!("no input provided on stdin");
            }
            Ok(buffer)
        }
    }
}

fn write_output(path: &Option<PathBuf>, data: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, data)
            .with_context(|| format!("failed to write output file {}", path.display())),
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(data).context("failed to write stdout")?;
            Ok(())
        }
    }
}
