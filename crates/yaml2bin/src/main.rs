//! yaml2bin - create a binary file from a YAML description

use std::process;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yaml2bin_core::{
    ConvertOptions, DEFAULT_MAX_SIZE, Driver, ErrorSink, InputSource, OutputTarget, StderrSink,
};

const TOOL_NAME: &str = "yaml2bin";

/// Create a binary file from a YAML description
#[derive(Parser, Debug)]
#[command(name = TOOL_NAME)]
#[command(version)]
#[command(about = "Create a binary file from a YAML description", long_about = None)]
struct Args {
    /// Input file ('-' for standard input)
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    /// Define a macro used by [[MACRO]] placeholders in the input
    #[arg(short = 'D', value_name = "MACRO=DEFINITION")]
    defines: Vec<String>,

    /// Read the specified document from the input
    #[arg(long, value_name = "N", default_value_t = 1)]
    docnum: u32,

    /// Maximum allowed output size in bytes (0 means no limit)
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_SIZE)]
    max_size: u64,

    /// Output filename ('-' for standard output)
    #[arg(short = 'o', value_name = "FILE", default_value = "-")]
    output: String,
}

impl Args {
    fn to_options(&self) -> ConvertOptions {
        ConvertOptions {
            input: InputSource::from_arg(&self.input),
            defines: self.defines.clone(),
            doc_num: self.docnum,
            max_size: self.max_size,
            output: OutputTarget::from_arg(&self.output),
        }
    }
}

fn main() {
    let args = Args::parse();
    let mut sink = StderrSink::new(TOOL_NAME);

    if let Err(e) = run(&args, &mut sink) {
        // Pipeline errors have already been reported through the sink.
        if e.downcast_ref::<yaml2bin_core::Error>().is_none() {
            sink.report(&format!("{:#}", e));
        }
        process::exit(1);
    }
}

fn run(args: &Args, sink: &mut StderrSink) -> Result<()> {
    init_logging()?;

    let options = args.to_options();
    tracing::debug!(?options, "Starting conversion");

    let written = Driver::default().run(&options, sink)?;
    tracing::debug!(bytes = written, output = %options.output, "Conversion complete");
    Ok(())
}

/// Log to stderr; stdout may be carrying the output.
fn init_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yaml2bin=warn,yaml2bin_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["yaml2bin"]).unwrap();
        assert_eq!(args.to_options(), ConvertOptions::default());
    }

    #[test]
    fn test_all_options() {
        let args = Args::try_parse_from([
            "yaml2bin",
            "in.yaml",
            "-D",
            "A=1",
            "-DB=2",
            "--docnum",
            "3",
            "--max-size",
            "0",
            "-o",
            "out.bin",
        ])
        .unwrap();
        let options = args.to_options();
        assert_eq!(options.input, InputSource::from_arg("in.yaml"));
        assert_eq!(options.defines, vec!["A=1".to_string(), "B=2".to_string()]);
        assert_eq!(options.doc_num, 3);
        assert_eq!(options.size_limit(), u64::MAX);
        assert_eq!(options.output, OutputTarget::from_arg("out.bin"));
    }

    #[test]
    fn test_attached_output_value() {
        let args = Args::try_parse_from(["yaml2bin", "-oout.bin"]).unwrap();
        assert_eq!(args.output, "out.bin");
    }
}
