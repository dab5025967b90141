use std::path::PathBuf;
use std::process;

use clap::Parser;
use hdfits::keywords::COMMENT_SUFFIX;
use hdfits::reader::{read_container, ReadOutcome};
use hdfits::{File, ReadOptions, Unit, UnitData};
use tracing_subscriber::EnvFilter;

/// Print a summary of the units stored in an HDFITS container.
#[derive(Debug, Parser)]
#[command(name = "hdfinfo", version)]
struct Cli {
    /// Container file to inspect.
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Also list header entries of every unit.
    #[arg(short = 'H', long)]
    headers: bool,

    /// Fail if the root class tag is not HDFITS.
    #[arg(long)]
    strict: bool,

    /// Log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn format_unit(index: usize, unit: &Unit) -> String {
    let mut out = format!("Unit {}: {} ({})\n", index, unit.name, unit.kind());
    match &unit.data {
        UnitData::Primary => {}
        UnitData::Table(table) => {
            out.push_str(&format!("  Columns: {}\n", table.num_columns()));
            out.push_str(&format!("  Rows: {}\n", table.num_rows()));
            for column in table.columns() {
                let unit_label = match column.unit() {
                    Some(u) => format!(" [{}]", u),
                    None => String::new(),
                };
                out.push_str(&format!(
                    "    {}: {}{}\n",
                    column.name,
                    column.data.dtype().name(),
                    unit_label
                ));
            }
        }
        UnitData::Image(data) => {
            out.push_str(&format!("  Type: {}\n", data.dtype().name()));
            out.push_str(&format!("  Dimensions: {:?}\n", data.shape()));
        }
    }
    if let Some(lines) = &unit.comment {
        out.push_str(&format!("  Comment lines: {}\n", lines.len()));
    }
    if let Some(lines) = &unit.history {
        out.push_str(&format!("  History lines: {}\n", lines.len()));
    }
    out
}

fn format_headers(unit: &Unit) -> String {
    let mut out = String::from("  Header:\n");
    for (key, value) in unit.header.iter() {
        if key.ends_with(COMMENT_SUFFIX) {
            continue;
        }
        match unit.header.comment_for(key).filter(|c| !c.is_empty()) {
            Some(comment) => out.push_str(&format!("    {} = {} / {}\n", key, value, comment)),
            None => out.push_str(&format!("    {} = {}\n", key, value)),
        }
    }
    out
}

fn format_outcome(outcome: &ReadOutcome, headers: bool) -> String {
    let mut out = String::new();
    for (i, unit) in outcome.units.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format_unit(i, unit));
        if headers {
            out.push_str(&format_headers(unit));
        }
    }
    for warning in &outcome.warnings {
        out.push_str(&format!("warning: {}\n", warning));
    }
    out
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("hdfits={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> Result<String, String> {
    let file = File::open(&cli.path)
        .map_err(|e| format!("Error reading '{}': {}", cli.path.display(), e))?;
    let options = ReadOptions {
        require_format: cli.strict,
    };
    let outcome = read_container(&file, &options)
        .map_err(|e| format!("Error parsing '{}': {}", cli.path.display(), e))?;
    Ok(format_outcome(&outcome, cli.headers))
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(&cli) {
        Ok(output) => print!("{}", output),
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdfits::{export_hdf, Column, Header, Table, TypedArray, UnitList, WriteOptions};

    fn sample() -> UnitList {
        let mut header = Header::new();
        header.insert_with_comment("OBSERVER", "Smith", "who");
        header.insert("EXPTIME", 30.0);

        let mut table = Table::new();
        table
            .add_column(Column::new("FLUX", vec![1.0f64, 2.0, 3.0]).with_unit("Jy"))
            .unwrap();
        table.add_column(Column::new("ID", vec![1i32, 2, 3])).unwrap();

        let img = TypedArray::from_shape_vec(vec![4, 8], vec![0u8; 32]).unwrap();

        let mut list = UnitList::new();
        list.push(Unit::primary("PRIMARY").with_header(header)).unwrap();
        list.push(Unit::table("SRC1", table)).unwrap();
        list.push(Unit::image("SCI", img)).unwrap();
        list
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("hdfinfo").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn summary_of_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.hdfits");
        export_hdf(&sample(), &path, &WriteOptions::default()).unwrap();

        let out = run(&cli(&[path.to_str().unwrap()])).unwrap();
        assert!(out.contains("Unit 0: PRIMARY (Primary)"));
        assert!(out.contains("Unit 1: SRC1 (Table)"));
        assert!(out.contains("    FLUX: f64 [Jy]"));
        assert!(out.contains("    ID: i32\n"));
        assert!(out.contains("Rows: 3"));
        assert!(out.contains("Unit 2: SCI (Image)"));
        assert!(out.contains("Dimensions: [4, 8]"));
        assert!(!out.contains("Header:"));
        assert!(!out.contains("warning:"));
    }

    #[test]
    fn headers_flag_lists_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.hdfits");
        export_hdf(&sample(), &path, &WriteOptions::default()).unwrap();

        let out = run(&cli(&["-H", path.to_str().unwrap()])).unwrap();
        assert!(out.contains("OBSERVER = 'Smith' / who"));
        assert!(out.contains("EXPTIME = 30.0\n"));
        assert!(!out.contains("OBSERVER_COMMENT ="));
    }

    #[test]
    fn missing_file() {
        let err = run(&cli(&["nonexistent.hdfits"])).unwrap_err();
        assert!(err.contains("Error reading"));
    }

    #[test]
    fn strict_rejects_foreign_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.hdfits");
        File::create(&path).open().unwrap().close().unwrap();

        let out = run(&cli(&[path.to_str().unwrap()])).unwrap();
        assert!(out.contains("warning: root has no class tag"));
        let err = run(&cli(&["--strict", path.to_str().unwrap()])).unwrap_err();
        assert!(err.contains("Error parsing"));
    }

    #[test]
    fn verbosity_counts() {
        assert_eq!(cli(&["-vv", "x"]).verbose, 2);
        assert!(Cli::try_parse_from(["hdfinfo"]).is_err());
    }
}
