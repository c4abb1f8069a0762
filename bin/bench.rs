use clap::{Arg, ArgAction, Command};
use crc32fast::Hasher as Crc32;
use csv_headered::{
    csv_reader, decode_stream, open_path, CsvError, HeaderedReader, Locale, ReaderConfig,
    RecordSource, SourceMeta,
};
use std::path::PathBuf;
use std::time::Instant;
use tokio::fs::File;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Tally {
    rows: u64,
    mismatched: u64,
    crc: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("bench")
        .arg(Arg::new("path").long("path").value_parser(clap::value_parser!(PathBuf)).required(true))
        .arg(Arg::new("project").long("project").help("Header names to project; repeat for several").action(ArgAction::Append))
        .arg(Arg::new("map").long("map").help("Read name-keyed maps instead of projections").action(ArgAction::SetTrue))
        .arg(Arg::new("verify").long("verify").help("CRC32 over every value returned").action(ArgAction::SetTrue))
        .arg(Arg::new("limit").long("limit").help("Stop after N data rows").value_parser(clap::value_parser!(u64)))
        .arg(Arg::new("skip-lines").long("skip-lines").value_parser(clap::value_parser!(usize)).default_value("0"))
        .arg(Arg::new("locale").long("locale").value_parser(clap::value_parser!(String)).default_value("en"))
        .arg(Arg::new("tokenizer-only").long("tokenizer-only").help("Feed csv_async records directly, without the line layer").action(ArgAction::SetTrue))
        .get_matches();

    let path = matches
        .get_one::<PathBuf>("path")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Provide --path <file>"))?;
    let project: Vec<String> = matches
        .get_many::<String>("project")
        .map(|names| names.cloned().collect())
        .unwrap_or_default();
    let locale: Locale = matches
        .get_one::<String>("locale")
        .map(|tag| tag.parse())
        .transpose()?
        .unwrap_or_default();
    let config = ReaderConfig::default()
        .skip_lines(matches.get_one::<usize>("skip-lines").copied().unwrap_or(0))
        .locale(locale);
    let options = Options {
        project,
        map: matches.get_flag("map"),
        verify: matches.get_flag("verify"),
        limit: matches.get_one::<u64>("limit").copied(),
    };

    let start = Instant::now();
    let tally = if matches.get_flag("tokenizer-only") {
        let file = File::open(&path).await?;
        let decoded = decode_stream(file, &SourceMeta::from_path(&path), config.buffer_capacity);
        let source = csv_reader(decoded, &config);
        run(HeaderedReader::new(source, config).await?, &options).await?
    } else {
        let source = open_path(&path, &config).await?;
        run(HeaderedReader::new(source, config).await?, &options).await?
    };
    let elapsed = start.elapsed().as_secs_f64();
    let rps = (tally.rows as f64) / elapsed;

    print!(
        "source={} rows={} mismatched={}",
        path.display(),
        tally.rows,
        tally.mismatched
    );
    if let Some(d) = tally.crc {
        print!(" crc=0x{d:08x}");
    }
    println!("\nelapsed={:.1}s rows/sec={:.0}", elapsed, rps);
    Ok(())
}

struct Options {
    project: Vec<String>,
    map: bool,
    verify: bool,
    limit: Option<u64>,
}

async fn run<S: RecordSource>(
    mut reader: HeaderedReader<S>,
    options: &Options,
) -> anyhow::Result<Tally> {
    let names: Vec<&str> = options.project.iter().map(String::as_str).collect();
    let names = (!names.is_empty()).then_some(&names[..]);

    let mut tally = Tally::default();
    let mut crc = Crc32::new();
    loop {
        let values = if options.map {
            reader.read_map().await.map(|m| {
                m.map(|m| {
                    // HashMap order is arbitrary; sort so the checksum is stable
                    let mut pairs: Vec<_> = m.into_iter().collect();
                    pairs.sort();
                    pairs.into_iter().map(|(_, v)| v).collect::<Vec<_>>()
                })
            })
        } else {
            reader.read_named(names).await
        };

        match values {
            Ok(Some(values)) => {
                tally.rows += 1;
                if options.verify {
                    // fields separated by '\x1f' (unit separator)
                    for (fi, value) in values.iter().enumerate() {
                        if fi > 0 {
                            crc.update(&[0x1f]);
                        }
                        crc.update(value.as_bytes());
                    }
                }
            }
            Ok(None) => break,
            Err(CsvError::RecordHeaderWidthMismatch { .. }) => {
                // record is consumed; keep going
                tally.rows += 1;
                tally.mismatched += 1;
            }
            Err(e) => return Err(e.into()),
        }

        if options.limit.is_some_and(|lim| tally.rows >= lim) {
            break;
        }
    }

    if options.verify {
        tally.crc = Some(crc.finalize());
    }
    Ok(tally)
}
