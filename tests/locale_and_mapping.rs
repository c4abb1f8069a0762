use std::collections::VecDeque;
use std::sync::Arc;

use csv_headered::{
    bind_all, ColumnPositionMapping, ConfigurationKind, CsvError, Diagnostics, ErrorKind,
    HeaderedReader, LineRecordSource, Locale, MessageKey, MessageResolver, ReaderConfig, Record,
    RecordSchema,
};

fn row(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|s| s.to_string()).collect()
}

async fn first_error(config: ReaderConfig, names: &[&str]) -> CsvError {
    let text = "name,orderNumber,id\nkyle,123456\n";
    let source = LineRecordSource::new(text.as_bytes(), &config);
    let mut reader = HeaderedReader::new(source, config)
        .await
        .expect("header should parse");
    reader
        .read_named(Some(names))
        .await
        .expect_err("read should fail")
}

#[tokio::test]
async fn locale_changes_text_not_outcome() {
    let mut texts = Vec::new();
    for locale in [Locale::English, Locale::German, Locale::French] {
        let config = ReaderConfig::default().locale(locale);
        let err = first_error(config, &["name"]).await;
        match &err {
            CsvError::RecordHeaderWidthMismatch { record, .. } => assert_eq!(*record, 2),
            other => panic!("{locale}: unexpected {other:?}"),
        }
        let text = err.to_string();
        assert!(text.contains('2'), "{locale}: {text}");
        texts.push(text);
    }
    assert_ne!(texts[0], texts[1]);
    assert_ne!(texts[0], texts[2]);
    assert_ne!(texts[1], texts[2]);
}

#[tokio::test]
async fn unknown_header_message_is_localized() {
    let en = first_error(ReaderConfig::default(), &["missing"]).await;
    let de = first_error(ReaderConfig::default().locale(Locale::German), &["missing"]).await;

    assert_eq!(en.kind(), ErrorKind::UnknownHeaderName);
    assert_eq!(de.kind(), ErrorKind::UnknownHeaderName);
    assert!(en.to_string().contains("missing"));
    assert!(de.to_string().contains("missing"));
    assert_ne!(en.to_string(), de.to_string());
}

#[derive(Debug)]
struct KeyOnly;

impl MessageResolver for KeyOnly {
    fn resolve(&self, locale: Locale, key: MessageKey, args: &[String]) -> String {
        format!("{locale}:{key:?}:{}", args.join("|"))
    }
}

#[tokio::test]
async fn custom_resolver_receives_key_and_arguments() {
    let config = ReaderConfig::default()
        .locale(Locale::French)
        .messages(Arc::new(KeyOnly));
    let err = first_error(config, &["id"]).await;
    assert_eq!(err.to_string(), "fr:HeaderDataMismatch:2|2|3");
}

#[test]
fn column_index_before_mapping_is_none() {
    let mapping = ColumnPositionMapping::new();
    assert_eq!(mapping.column_index("name"), None);
    assert!(mapping.column_mapping().is_empty());
    assert_eq!(mapping.column_name(0), None);
}

#[test]
fn column_index_follows_mapping() {
    let mut mapping = ColumnPositionMapping::new();
    mapping.set_column_mapping(["name", "orderNumber", "id"].map(Some));

    assert_eq!(mapping.column_index("name"), Some(0));
    assert_eq!(mapping.column_index("orderNumber"), Some(1));
    assert_eq!(mapping.column_index("id"), Some(2));
    assert_eq!(mapping.column_index("name not mapped"), None);
    assert_eq!(mapping.column_mapping().len(), 3);
}

#[test]
fn unnamed_columns_have_no_name() {
    let mut mapping = ColumnPositionMapping::new();
    mapping.set_column_mapping([Some("name"), None, Some("id")]);

    assert_eq!(mapping.column_name(0), Some("name"));
    assert_eq!(mapping.column_name(1), None);
    assert_eq!(mapping.column_name(2), Some("id"));
    assert_eq!(mapping.column_name(3), None);
    assert_eq!(
        mapping.column_mapping(),
        &[Some("name".to_string()), None, Some("id".to_string())][..]
    );

    mapping.clear_column_mapping();
    assert_eq!(mapping.column_name(0), None);
    assert!(mapping.column_mapping().is_empty());
}

#[test]
fn bind_without_target_is_a_localized_configuration_error() {
    let record = row(&["doesnt", "matter"]);

    let english = ColumnPositionMapping::new();
    let english_err = english.bind(&record).unwrap_err();

    let mut german = ColumnPositionMapping::new();
    german.set_locale(Locale::German);
    let german_err = german.bind(&record).unwrap_err();

    let expected = ErrorKind::Configuration(ConfigurationKind::TargetUnset);
    assert_eq!(english_err.kind(), expected);
    assert_eq!(german_err.kind(), expected);
    assert_ne!(english_err.to_string(), german_err.to_string());
}

#[test]
fn bind_copies_schema_fields_by_position() -> anyhow::Result<()> {
    let mut mapping = ColumnPositionMapping::with_diagnostics(Diagnostics::default());
    mapping.set_column_mapping([Some("name"), Some("orderNumber"), Some("id"), Some("num")]);
    mapping.set_target(RecordSchema::new("order", ["name", "id", "num"]));

    let bound = mapping.bind(&row(&["kyle  ", "123456", "emp123"]))?;
    assert_eq!(bound.get("name"), Some("kyle  "));
    assert_eq!(bound.get("id"), Some("emp123"));
    // not in the schema
    assert_eq!(bound.get("orderNumber"), None);
    // past the end of the record
    assert_eq!(bound.get("num"), None);
    assert_eq!(bound.len(), 2);
    Ok(())
}

#[tokio::test]
async fn bind_all_checks_configuration_before_reading() {
    let mut source: VecDeque<Record> =
        VecDeque::from(vec![row(&["doesnt", "matter"]), row(&["at", "all"])]);
    let mapping = ColumnPositionMapping::new();

    let err = bind_all(&mapping, &mut source).await.unwrap_err();
    assert_eq!(
        err.kind(),
        ErrorKind::Configuration(ConfigurationKind::TargetUnset)
    );
    assert_eq!(source.len(), 2);
}

#[tokio::test]
async fn bind_all_binds_every_record() -> anyhow::Result<()> {
    let text = "kyle,123456,emp123,1\njimmy,abcnum,cust09878,2\n";
    let config = ReaderConfig::default();
    let mut source = LineRecordSource::new(text.as_bytes(), &config);

    let mut mapping = ColumnPositionMapping::new();
    mapping.set_column_mapping(["name", "orderNumber", "id", "num"].map(Some));
    mapping.set_target(RecordSchema::new("order", ["name", "orderNumber", "id", "num"]));

    let bound = bind_all(&mapping, &mut source).await?;
    assert_eq!(bound.len(), 2);
    assert_eq!(bound[0].get("name"), Some("kyle"));
    assert_eq!(bound[1].get("id"), Some("cust09878"));
    assert_eq!(bound[1].get("num"), Some("2"));
    Ok(())
}
