use clap::{Arg, ArgAction, Command};
use std::io::{self, Write};

fn main() -> anyhow::Result<()> {
    let matches = Command::new("gen")
        .about("Writes a synthetic headered CSV to stdout")
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .arg(
            Arg::new("no_header")
                .long("no-header")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("cols")
                .long("cols")
                .value_parser(clap::value_parser!(usize))
                .default_value("3"),
        )
        .arg(Arg::new("delim").long("delim").default_value(","))
        .arg(
            Arg::new("ragged_every")
                .long("ragged-every")
                .help("Drop the last column on every Nth data row")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("quoted_every")
                .long("quoted-every")
                .help("Put an embedded newline in a quoted field on every Nth data row")
                .value_parser(clap::value_parser!(u64)),
        )
        .get_matches();

    let rows: u64 = matches.get_one::<u64>("rows").copied().unwrap_or_default();
    let cols: usize = matches.get_one::<usize>("cols").copied().unwrap_or(3).max(1);
    let delim = matches
        .get_one::<String>("delim")
        .map(String::as_str)
        .unwrap_or(",");
    let ragged_every = matches.get_one::<u64>("ragged_every").copied();
    let quoted_every = matches.get_one::<u64>("quoted_every").copied();

    let mut out = io::BufWriter::new(io::stdout().lock());

    if !matches.get_flag("no_header") {
        write!(&mut out, "sku")?;
        for i in 1..cols {
            write!(&mut out, "{delim}col{i}")?;
        }
        writeln!(&mut out)?;
    }

    let hits = |every: Option<u64>, i: u64| every.is_some_and(|n| n > 0 && i % n == n - 1);

    // sku, col1, col2, ... with the occasional ragged or multi-line row
    for i in 0..rows {
        let width = if hits(ragged_every, i) && cols > 1 {
            cols - 1
        } else {
            cols
        };
        write!(&mut out, "SKU{:010}", i)?;
        for c in 1..width {
            if c == 1 && hits(quoted_every, i) {
                write!(&mut out, "{delim}\"v{c}_{i}\nmore\"")?;
            } else {
                write!(&mut out, "{delim}v{c}_{i}")?;
            }
        }
        writeln!(&mut out)?;
        if i % 10_000 == 0 {
            out.flush()?;
        } // keep buffers moving on huge runs
    }

    out.flush()?;
    Ok(())
}
