use csv_headered::{open_path, HeaderedReaderBuilder, Predicate, ReaderConfig};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = Path::new("./data/sample.csv.gz");
    let config = ReaderConfig::default();
    let source = open_path(path, &config).await?;

    let mut reader = HeaderedReaderBuilder::new(config)
        .row_validator(Predicate::new("empty field", |row: &[String]| {
            row.iter().all(|f| !f.is_empty())
        }))
        .build(source)
        .await?;

    let wanted = ["sku", "col1"];
    while let Some(fields) = reader.read_named(Some(&wanted[..])).await? {
        let _sku = &fields[0];
    }
    println!("records read: {}", reader.records_read());
    Ok(())
}
