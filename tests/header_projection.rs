use std::collections::VecDeque;

use csv_headered::{
    CsvError, ErrorKind, HeaderedReader, LineRecordSource, ReaderConfig, Record,
};

fn text_source(text: &'static str) -> LineRecordSource<&'static [u8]> {
    LineRecordSource::new(text.as_bytes(), &ReaderConfig::default())
}

fn records(rows: &[&[&str]]) -> VecDeque<Record> {
    rows.iter()
        .map(|row| row.iter().map(|s| s.to_string()).collect())
        .collect()
}

#[tokio::test]
async fn projects_requested_names_in_order() -> anyhow::Result<()> {
    let source = text_source("name,orderNumber,id\nkyle,123456,emp123\n");
    let mut reader = HeaderedReader::new(source, ReaderConfig::default()).await?;

    let fields = reader.read_named(Some(&["id", "name"][..])).await?;
    assert_eq!(fields, Some(vec!["emp123".to_string(), "kyle".to_string()]));
    assert_eq!(reader.read_named(Some(&["id"][..])).await?, None);
    Ok(())
}

#[tokio::test]
async fn header_positions_follow_the_first_record() -> anyhow::Result<()> {
    let source = text_source("name,orderNumber,id\n");
    let reader = HeaderedReader::new(source, ReaderConfig::default()).await?;

    let header = reader.header();
    assert_eq!(header.len(), 3);
    for (i, name) in ["name", "orderNumber", "id"].into_iter().enumerate() {
        assert_eq!(header.position(name), Some(i));
    }
    assert_eq!(reader.records_read(), 1);
    Ok(())
}

#[tokio::test]
async fn duplicate_header_uses_last_column() -> anyhow::Result<()> {
    let source = text_source("a,a,b\nfirst,second,third\n");
    let mut reader = HeaderedReader::new(source, ReaderConfig::default()).await?;

    assert_eq!(reader.header().position("a"), Some(1));
    let fields = reader.read_named(Some(&["a"][..])).await?;
    assert_eq!(fields, Some(vec!["second".to_string()]));
    Ok(())
}

#[tokio::test]
async fn repeated_name_yields_value_twice() -> anyhow::Result<()> {
    let source = text_source("x,y\n1,2\n");
    let mut reader = HeaderedReader::new(source, ReaderConfig::default()).await?;

    let fields = reader.read_named(Some(&["y", "x", "y"][..])).await?;
    assert_eq!(
        fields,
        Some(vec!["2".to_string(), "1".to_string(), "2".to_string()])
    );
    Ok(())
}

#[tokio::test]
async fn unspecified_names_return_raw_record() -> anyhow::Result<()> {
    // no width check without projection
    let source = text_source("a,b,c\n1,2\n");
    let mut reader = HeaderedReader::new(source, ReaderConfig::default()).await?;

    let fields = reader.read_named(None).await?;
    assert_eq!(fields, Some(vec!["1".to_string(), "2".to_string()]));
    Ok(())
}

#[tokio::test]
async fn empty_name_list_returns_empty_record() -> anyhow::Result<()> {
    let source = text_source("a,b,c\n1,2\n4,5,6\n");
    let mut reader = HeaderedReader::new(source, ReaderConfig::default()).await?;

    assert_eq!(reader.read_named(Some(&[][..])).await?, Some(vec![]));
    assert_eq!(reader.read_named(Some(&[][..])).await?, Some(vec![]));
    assert_eq!(reader.read_named(Some(&[][..])).await?, None);
    Ok(())
}

#[tokio::test]
async fn unknown_name_fails_and_reader_stays_usable() -> anyhow::Result<()> {
    let source = text_source("name,id\nkyle,1\njimmy,2\n");
    let mut reader = HeaderedReader::new(source, ReaderConfig::default()).await?;

    let err = reader
        .read_named(Some(&["name", "nope"][..]))
        .await
        .unwrap_err();
    match &err {
        CsvError::UnknownHeaderName { name, .. } => assert_eq!(name, "nope"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("nope"));

    let fields = reader.read_named(Some(&["name"][..])).await?;
    assert_eq!(fields, Some(vec!["jimmy".to_string()]));
    Ok(())
}

#[tokio::test]
async fn short_row_reports_record_count() -> anyhow::Result<()> {
    let source = text_source("name,orderNumber,id\na,b\n");
    let mut reader = HeaderedReader::new(source, ReaderConfig::default()).await?;

    let err = reader.read_named(Some(&["id"][..])).await.unwrap_err();
    match err {
        CsvError::RecordHeaderWidthMismatch {
            record,
            expected,
            actual,
            ..
        } => {
            assert_eq!(record, 2);
            assert_eq!(expected, 3);
            assert_eq!(actual, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(reader.records_read(), 2);
    Ok(())
}

#[tokio::test]
async fn wide_row_is_a_mismatch_too() -> anyhow::Result<()> {
    let source = text_source("a,b\n1,2,3\n4,5\n");
    let mut reader = HeaderedReader::new(source, ReaderConfig::default()).await?;

    let err = reader.read_named(Some(&["a"][..])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RecordHeaderWidthMismatch);

    // the bad record was consumed, not replayed
    let fields = reader.read_named(Some(&["b"][..])).await?;
    assert_eq!(fields, Some(vec!["5".to_string()]));
    assert_eq!(reader.records_read(), 3);
    Ok(())
}

#[tokio::test]
async fn record_count_is_stable_between_reads() -> anyhow::Result<()> {
    let source = text_source("a\n1\n2\n");
    let mut reader = HeaderedReader::new(source, ReaderConfig::default()).await?;

    assert_eq!(reader.records_read(), 1);
    assert_eq!(reader.records_read(), 1);
    reader.read_next().await?;
    assert_eq!(reader.records_read(), 2);
    assert_eq!(reader.records_read(), 2);
    reader.read_next().await?;
    reader.read_next().await?;
    assert_eq!(reader.records_read(), 3);
    Ok(())
}

#[tokio::test]
async fn exhausted_source_gives_empty_header() -> anyhow::Result<()> {
    let mut reader = HeaderedReader::new(VecDeque::<Record>::new(), ReaderConfig::default()).await?;

    assert!(reader.header().is_empty());
    assert_eq!(reader.records_read(), 0);
    assert_eq!(reader.read_next().await?, None);
    assert_eq!(reader.read_named(Some(&["a"][..])).await?, None);
    assert_eq!(reader.read_map().await?, None);
    Ok(())
}

#[tokio::test]
async fn zero_field_header_is_not_an_error() -> anyhow::Result<()> {
    let source = records(&[&[], &["a"], &[]]);
    let mut reader = HeaderedReader::new(source, ReaderConfig::default()).await?;

    assert_eq!(reader.header().width(), 0);
    let err = reader.read_named(Some(&["a"][..])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownHeaderName);
    assert_eq!(reader.read_map().await?, Some(Default::default()));
    Ok(())
}

#[tokio::test]
async fn in_memory_source_projects_like_text() -> anyhow::Result<()> {
    let source = records(&[&["k", "v"], &["one", "1"], &["two", "2"]]);
    let mut reader = HeaderedReader::new(source, ReaderConfig::default()).await?;

    assert_eq!(
        reader.read_named(Some(&["v", "k"][..])).await?,
        Some(vec!["1".to_string(), "one".to_string()])
    );
    assert_eq!(
        reader.read_named(Some(&["v"][..])).await?,
        Some(vec!["2".to_string()])
    );
    assert!(reader.into_source().is_empty());
    Ok(())
}
