use anyhow::{Error, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use geoipcli::config::{self, ConfigLayer};
use geoipcli::input::FileOrStdin;
use geoipcli::{Column, DatasetKind, Datasets, Format, Resolver, RowWriter, Settings};

/// Exit status for a closed stdout, 128 + SIGPIPE.
const BROKEN_PIPE_EXIT: u8 = 141;

/// Check if the error chain contains a broken pipe error.
#[inline(always)]
fn is_broken_pipe(err: &Error) -> bool {
    fn io_kind(err: &csv::Error) -> Option<io::ErrorKind> {
        match err.kind() {
            csv::ErrorKind::Io(io_err) => Some(io_err.kind()),
            _ => None,
        }
    }

    for cause in err.chain() {
        let kind = if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            Some(io_err.kind())
        } else if let Some(csv_err) = cause.downcast_ref::<csv::Error>() {
            io_kind(csv_err)
        } else {
            // Transparent variants hide the wrapped error from the chain.
            match cause.downcast_ref::<geoipcli::Error>() {
                Some(geoipcli::Error::Io(io_err)) => Some(io_err.kind()),
                Some(geoipcli::Error::Csv(csv_err)) => io_kind(csv_err),
                _ => None,
            }
        };
        if kind == Some(io::ErrorKind::BrokenPipe) {
            return true;
        }
    }
    false
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to GeoIP2/GeoLite2-Country database
    #[clap(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    country: Option<String>,

    /// Path to GeoIP2/GeoLite2-City database
    #[clap(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    city: Option<String>,

    /// Path to GeoLite2-ASN database
    #[clap(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    asn: Option<String>,

    /// Path to GeoIP2-ISP database
    #[clap(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    isp: Option<String>,

    /// Path to GeoIP2-Domain database
    #[clap(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    domain: Option<String>,

    /// Path to GeoIP2-Connection-Type database
    #[clap(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    contype: Option<String>,

    /// Path to GeoIP2-Anonymous-IP database
    #[clap(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    anonymousip: Option<String>,

    /// Output columns separated by comma (,). See --list-columns for the
    /// available names
    #[clap(short, long, value_name = "COLUMNS")]
    output: Option<String>,

    /// Output format
    #[clap(long, value_enum)]
    format: Option<Format>,

    /// Skip invalid IP addresses instead of stopping
    #[clap(long)]
    skip_invalid_ip: bool,

    /// Keep commas in values instead of replacing them with <comma>
    #[clap(long)]
    no_escape_comma: bool,

    /// Keep double quotes in values instead of replacing them with <doublequotes>
    #[clap(long)]
    no_escape_quotes: bool,

    /// Config file, applied on top of ~/.geoipcli.yaml and ~/.config/geoipcli.yaml
    #[clap(
        long,
        value_name = "PATH",
        value_hint = clap::ValueHint::FilePath,
        env = "GEOIPCLI_CONFIG"
    )]
    conffile: Option<Utf8PathBuf>,

    /// Read IP addresses from a file instead of stdin
    #[clap(long, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    readfile: Option<String>,

    /// Show all column names
    #[clap(long)]
    list_columns: bool,

    /// Print debug messages to stderr
    #[clap(long)]
    debug: bool,

    /// IP addresses to look up. Read from --readfile or stdin when empty
    #[clap(value_name = "ADDRESS")]
    addresses: Vec<String>,
}

impl Args {
    /// The command line as the topmost config layer.
    fn layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();
        let paths = [
            (DatasetKind::Country, &self.country),
            (DatasetKind::City, &self.city),
            (DatasetKind::Asn, &self.asn),
            (DatasetKind::Isp, &self.isp),
            (DatasetKind::Domain, &self.domain),
            (DatasetKind::ConnectionType, &self.contype),
            (DatasetKind::AnonymousIp, &self.anonymousip),
        ];
        for (kind, path) in paths {
            if let Some(path) = path.as_deref().filter(|p| !p.is_empty()) {
                layer.paths.set(kind, path);
            }
        }

        if let Some(output) = self.output.as_deref().filter(|o| !o.is_empty()) {
            let columns = output
                .to_lowercase()
                .split(',')
                .map(|c| c.trim().to_string())
                .collect();
            layer.output.columns = Some(columns);
        }
        layer.output.format = self.format;
        layer.output.skip_invalid_ip = self.skip_invalid_ip.then_some(true);
        layer.output.escape_comma = self.no_escape_comma.then_some(false);
        layer.output.escape_double_quotes = self.no_escape_quotes.then_some(false);
        layer
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    // Use a separate run function to handle the actual work
    let err = match run_main() {
        Ok(code) => return code,
        Err(err) => err,
    };

    // A closed stdout ends the run silently, with the SIGPIPE status.
    if is_broken_pipe(&err) {
        return ExitCode::from(BROKEN_PIPE_EXIT);
    }

    // Print detailed error information based on environment variables
    let mut stderr = io::stderr();
    let _ = if std::env::var("RUST_BACKTRACE").is_ok_and(|v| v == "1")
        && std::env::var("RUST_LIB_BACKTRACE").map_or(true, |v| v == "1")
    {
        writeln!(stderr, "{:?}", err)
    } else {
        writeln!(stderr, "{:#}", err)
    };

    ExitCode::FAILURE
}

fn run_main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.debug);

    // if user asks to see available column names
    if args.list_columns {
        print_columns()?;
        return Ok(ExitCode::SUCCESS);
    }

    let layers = config::load_layers(args.conffile.as_deref())?;
    let settings = Settings::from(layers.merge(args.layer()));
    debug!(?settings, "settings");

    run(args, settings)?;

    Ok(ExitCode::SUCCESS)
}

fn run(args: Args, settings: Settings) -> Result<()> {
    // Reject malformed column names before touching any database.
    for column in &settings.columns {
        Column::parse(column)?;
    }

    let datasets = Datasets::open(
        settings
            .paths
            .iter()
            .map(|(kind, path)| (*kind, path.as_path())),
    )?;
    let resolver = Resolver::new(datasets, &settings.columns, settings.skip_invalid_ip)?;

    let stdout = io::stdout().lock();
    let mut writer = RowWriter::new(stdout, settings.format, settings.escapes);

    if !args.addresses.is_empty() {
        if let Some(path) = &args.readfile {
            warn!(%path, "addresses given on the command line, ignoring --readfile");
        }
        return Ok(resolver.run(&args.addresses, &mut writer)?);
    }

    let input = FileOrStdin::from_path(args.readfile.as_deref().map(config::expand_tilde));
    debug!(%input, "reading IP addresses");
    let mut reader = input.reader()?;
    reader.for_each_line(|line| Ok(resolver.process(line, &mut writer)?))?;

    Ok(())
}

fn print_columns() -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(
        out,
        "The following columns can be used for output (--output option)."
    )?;
    writeln!(out)?;
    writeln!(out, "List of columns:")?;
    for (_, columns) in geoipcli::catalog() {
        for column in columns {
            writeln!(out, "- {}", column)?;
        }
    }
    writeln!(out)?;
    writeln!(out, "Note:")?;
    writeln!(
        out,
        "- The [language] strings need to be replaced by actual languages such as 'en' and 'ja'."
    )?;
    writeln!(
        out,
        "- The subdivisions index 0 can be replaced by 1, 2, ... for further subdivisions."
    )?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broken_pipe_through_library_error() {
        let pipe = io::Error::from(io::ErrorKind::BrokenPipe);
        assert!(is_broken_pipe(&Error::from(geoipcli::Error::Io(pipe))));

        let pipe = csv::Error::from(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(is_broken_pipe(&Error::from(geoipcli::Error::Csv(pipe))));

        let other = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(!is_broken_pipe(&Error::from(geoipcli::Error::Io(other))));
        assert!(!is_broken_pipe(&Error::from(geoipcli::Error::NoDatasets)));
    }

    #[test]
    fn output_columns_are_lowercased() {
        let args = Args::parse_from([
            "geoipcli",
            "--asn",
            "GeoLite2-ASN.mmdb",
            "-o",
            "ASN.autonomous_system_number, asn.autonomous_system_organization",
            "--no-escape-comma",
        ]);
        let layer = args.layer();
        assert_eq!(layer.paths.asn.as_deref(), Some("GeoLite2-ASN.mmdb"));
        assert_eq!(
            layer.output.columns,
            Some(vec![
                "asn.autonomous_system_number".to_string(),
                "asn.autonomous_system_organization".to_string(),
            ])
        );
        assert_eq!(layer.output.escape_comma, Some(false));
        assert_eq!(layer.output.escape_double_quotes, None);
        assert_eq!(layer.output.skip_invalid_ip, None);
    }
}
