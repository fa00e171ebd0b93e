use std::path::Path;

use fmpxml_to_json::{convert, ConvertConfig, ConvertError, OutputMode, RecordOptions};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

const PEOPLE_EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<FMPXMLRESULT xmlns="http://www.filemaker.com/fmpxmlresult">
  <ERRORCODE>0</ERRORCODE>
  <PRODUCT BUILD="01-25-2011" NAME="FileMaker" VERSION="ProAdvanced 11.0v2"/>
  <DATABASE DATEFORMAT="M/d/yyyy" LAYOUT="summary" NAME="people.fp7" RECORDS="2" TIMEFORMAT="h:mm:ss a"/>
  <METADATA>
    <FIELD EMPTYOK="NO" MAXREPEAT="1" NAME="First" TYPE="TEXT"/>
    <FIELD EMPTYOK="YES" MAXREPEAT="1" NAME="Birthday" TYPE="DATE"/>
    <FIELD EMPTYOK="YES" MAXREPEAT="1" NAME="Seen" TYPE="TIMESTAMP"/>
    <FIELD EMPTYOK="YES" MAXREPEAT="3" NAME="Phones" TYPE="TEXT"/>
  </METADATA>
  <RESULTSET FOUND="2">
    <ROW MODID="5" RECORDID="1">
      <COL><DATA>Adam</DATA></COL>
      <COL><DATA>1/11/1986</DATA></COL>
      <COL><DATA>1/11/1986 8:09:21 PM</DATA></COL>
      <COL><DATA>555-0100</DATA><DATA>555-0101</DATA></COL>
    </ROW>
    <ROW MODID="2" RECORDID="2">
      <COL><DATA>Beth</DATA></COL>
      <COL><DATA>3/4/1988</DATA></COL>
      <COL/>
      <COL/>
    </ROW>
  </RESULTSET>
</FMPXMLRESULT>
"#;

/// End-to-end test for document-mode conversion through real files
#[tokio::test]
async fn test_document_conversion_e2e() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging for the test
    tracing_subscriber::fmt()
        .with_env_filter("fmpxml_to_json=debug")
        .try_init()
        .ok();

    println!("🧪 Starting document-mode conversion end-to-end test");

    let dir = tempfile::tempdir()?;
    let input_path = dir.path().join("export.xml");
    let output_path = dir.path().join("export.json");
    std::fs::write(&input_path, PEOPLE_EXPORT)?;

    println!("🔄 Running document-mode conversion...");
    let options = RecordOptions {
        record_id_key: Some("recordId".to_string()),
        mod_id_key: Some("modId".to_string()),
        hash_key: Some("hash".to_string()),
        ..RecordOptions::default()
    };
    run_document(&input_path, &output_path, options).await?;

    println!("🔍 Verifying converted document...");
    let output = std::fs::read_to_string(&output_path)?;
    assert!(output.starts_with("{\n  \"errorCode\": 0,\n"));
    assert!(output.ends_with("}\n"));

    let value: serde_json::Value = serde_json::from_str(&output)?;
    assert_eq!(value["errorCode"], 0);
    assert_eq!(value["database"]["name"], "people.fp7");
    assert_eq!(value["database"]["dateFormat"], "M/d/yyyy");
    assert_eq!(value["database"]["records"], 2);
    assert_eq!(value["product"]["version"], "ProAdvanced 11.0v2");

    let fields = value["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 4);
    assert_eq!(fields[0]["name"], "First");
    assert_eq!(fields[0]["emptyOK"], false);
    assert_eq!(fields[3]["maxRepeat"], 3);
    assert_eq!(fields[3]["type"], "TEXT");

    let records = value["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);

    let adam = records[0].as_object().unwrap();
    let keys: Vec<_> = adam.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        ["recordId", "modId", "hash", "First", "Birthday", "Seen", "Phones"]
    );
    assert_eq!(adam["recordId"], "1");
    assert_eq!(adam["modId"], "5");
    assert_eq!(adam["First"], "Adam");
    assert_eq!(adam["Birthday"], "1986-01-11");
    assert_eq!(adam["Seen"], "1986-01-11T20:09:21");
    assert_eq!(
        adam["Phones"],
        serde_json::json!(["555-0100", "555-0101"])
    );

    let hash = adam["hash"].as_str().unwrap();
    assert_eq!(hash.len(), 128);
    assert!(hash.bytes().all(|b| b.is_ascii_hexdigit()));

    let beth = records[1].as_object().unwrap();
    assert_eq!(beth["First"], "Beth");
    assert_eq!(beth["Birthday"], "1988-03-04");
    assert_eq!(beth["Seen"], serde_json::Value::Null);
    assert_eq!(beth["Phones"], serde_json::json!([]));

    println!("✅ Document-mode conversion test completed successfully");
    Ok(())
}

/// A single-row export exercising every field type, repeating columns,
/// an untouched empty column, and custom id key names
#[tokio::test]
async fn test_contact_export_with_custom_id_keys() -> Result<(), Box<dyn std::error::Error>> {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<FMPXMLRESULT xmlns="http://www.filemaker.com/fmpxmlresult">
  <ERRORCODE>0</ERRORCODE>
  <PRODUCT BUILD="01-25-2011" NAME="FileMaker" VERSION="ProAdvanced 11.0v2"/>
  <DATABASE DATEFORMAT="M/d/yyyy" LAYOUT="summary" NAME="contacts.fp7" RECORDS="1" TIMEFORMAT="h:mm:ss a"/>
  <METADATA>
    <FIELD EMPTYOK="NO" MAXREPEAT="1" NAME="First" TYPE="TEXT"/>
    <FIELD EMPTYOK="NO" MAXREPEAT="1" NAME="Last" TYPE="TEXT"/>
    <FIELD EMPTYOK="YES" MAXREPEAT="2" NAME="Email" TYPE="TEXT"/>
    <FIELD EMPTYOK="YES" MAXREPEAT="1" NAME="Birthday" TYPE="DATE"/>
    <FIELD EMPTYOK="YES" MAXREPEAT="1" NAME="Favorite Time" TYPE="TIME"/>
    <FIELD EMPTYOK="YES" MAXREPEAT="2" NAME="Favorite Number" TYPE="NUMBER"/>
    <FIELD EMPTYOK="YES" MAXREPEAT="1" NAME="Favorite Pie" TYPE="TEXT"/>
  </METADATA>
  <RESULTSET FOUND="1">
    <ROW MODID="196" RECORDID="683">
      <COL><DATA>Adam</DATA></COL>
      <COL><DATA>Peacock</DATA></COL>
      <COL><DATA>apeacock@example.org</DATA><DATA>apeacock-test@example.org</DATA></COL>
      <COL><DATA>1/11/1986</DATA></COL>
      <COL><DATA>8:09:21 PM</DATA></COL>
      <COL><DATA>42</DATA><DATA>41.1</DATA></COL>
      <COL/>
    </ROW>
  </RESULTSET>
</FMPXMLRESULT>
"#;

    let dir = tempfile::tempdir()?;
    let input_path = dir.path().join("export.xml");
    let output_path = dir.path().join("export.json");
    std::fs::write(&input_path, xml)?;

    let options = RecordOptions {
        record_id_key: Some("recordID".to_string()),
        mod_id_key: Some("modificationID".to_string()),
        ..RecordOptions::default()
    };
    run_document(&input_path, &output_path, options).await?;

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output_path)?)?;
    assert_eq!(value["database"]["records"], 1);

    let record = value["records"][0].as_object().unwrap();
    let keys: Vec<_> = record.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        [
            "recordID",
            "modificationID",
            "First",
            "Last",
            "Email",
            "Birthday",
            "Favorite Time",
            "Favorite Number",
            "Favorite Pie",
        ]
    );
    assert_eq!(
        value["records"][0],
        serde_json::json!({
            "recordID": "683",
            "modificationID": "196",
            "First": "Adam",
            "Last": "Peacock",
            "Email": ["apeacock@example.org", "apeacock-test@example.org"],
            "Birthday": "1986-01-11",
            "Favorite Time": "20:09:21",
            "Favorite Number": [42, 41.1],
            "Favorite Pie": null,
        })
    );
    Ok(())
}

/// Rows emitted before the metadata and database sections still come out
/// in source order
#[tokio::test]
async fn test_rows_before_metadata_keep_their_order() -> Result<(), Box<dyn std::error::Error>> {
    let xml = r#"<FMPXMLRESULT xmlns="http://www.filemaker.com/fmpxmlresult">
  <ERRORCODE>0</ERRORCODE>
  <PRODUCT BUILD="b" NAME="FileMaker" VERSION="v"/>
  <RESULTSET FOUND="3">
    <ROW MODID="0" RECORDID="1"><COL><DATA>one</DATA></COL></ROW>
    <ROW MODID="0" RECORDID="2"><COL><DATA>two</DATA></COL></ROW>
    <ROW MODID="0" RECORDID="3"><COL><DATA>three</DATA></COL></ROW>
  </RESULTSET>
  <METADATA>
    <FIELD EMPTYOK="NO" MAXREPEAT="1" NAME="Word" TYPE="TEXT"/>
  </METADATA>
  <DATABASE DATEFORMAT="M/d/yyyy" LAYOUT="" NAME="words.fp7" RECORDS="3" TIMEFORMAT="h:mm:ss a"/>
</FMPXMLRESULT>
"#;

    let dir = tempfile::tempdir()?;
    let input_path = dir.path().join("export.xml");
    let output_path = dir.path().join("export.json");
    std::fs::write(&input_path, xml)?;

    run_document(&input_path, &output_path, RecordOptions::default()).await?;

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output_path)?)?;
    let words: Vec<_> = value["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["Word"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(words, ["one", "two", "three"]);
    Ok(())
}

/// A structural failure produces no document at all
#[tokio::test]
async fn test_structural_failure_writes_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let xml = r#"<FMPXMLRESULT xmlns="http://www.filemaker.com/fmpxmlresult">
  <ERRORCODE>0</ERRORCODE>
  <PRODUCT BUILD="b" NAME="n" VERSION="v"/>
  <DATABASE DATEFORMAT="M/d/yyyy" LAYOUT="" NAME="db" RECORDS="0" TIMEFORMAT="h:mm:ss a"/>
  <DATABASE DATEFORMAT="M/d/yyyy" LAYOUT="" NAME="db" RECORDS="0" TIMEFORMAT="h:mm:ss a"/>
  <METADATA></METADATA>
  <RESULTSET FOUND="0"></RESULTSET>
</FMPXMLRESULT>
"#;

    let dir = tempfile::tempdir()?;
    let input_path = dir.path().join("export.xml");
    let output_path = dir.path().join("export.json");
    std::fs::write(&input_path, xml)?;

    let result = run_document(&input_path, &output_path, RecordOptions::default()).await;
    assert!(matches!(result, Err(ConvertError::DuplicateDatabase)));
    assert_eq!(std::fs::metadata(&output_path)?.len(), 0);
    Ok(())
}

/// A row carrying fewer columns than the metadata declares aborts the
/// conversion before anything is written
#[tokio::test]
async fn test_column_count_mismatch_aborts() -> Result<(), Box<dyn std::error::Error>> {
    let xml = r#"<FMPXMLRESULT xmlns="http://www.filemaker.com/fmpxmlresult">
  <ERRORCODE>0</ERRORCODE>
  <PRODUCT BUILD="b" NAME="n" VERSION="v"/>
  <DATABASE DATEFORMAT="M/d/yyyy" LAYOUT="" NAME="db" RECORDS="1" TIMEFORMAT="h:mm:ss a"/>
  <METADATA>
    <FIELD EMPTYOK="NO" MAXREPEAT="1" NAME="First" TYPE="TEXT"/>
    <FIELD EMPTYOK="NO" MAXREPEAT="1" NAME="Last" TYPE="TEXT"/>
    <FIELD EMPTYOK="YES" MAXREPEAT="2" NAME="Email" TYPE="TEXT"/>
  </METADATA>
  <RESULTSET FOUND="1">
    <ROW MODID="1" RECORDID="1">
      <COL><DATA>Adam</DATA></COL>
      <COL><DATA>Peacock</DATA></COL>
    </ROW>
  </RESULTSET>
</FMPXMLRESULT>
"#;

    let dir = tempfile::tempdir()?;
    let input_path = dir.path().join("export.xml");
    let output_path = dir.path().join("export.json");
    std::fs::write(&input_path, xml)?;

    let result = run_document(&input_path, &output_path, RecordOptions::default()).await;
    assert!(matches!(
        result,
        Err(ConvertError::FieldCountMismatch {
            row: 1,
            fields: 3,
            columns: 2,
        })
    ));
    assert_eq!(std::fs::metadata(&output_path)?.len(), 0);
    Ok(())
}

#[tokio::test]
async fn test_cancelled_conversion_aborts() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input_path = dir.path().join("export.xml");
    let output_path = dir.path().join("export.json");
    std::fs::write(&input_path, PEOPLE_EXPORT)?;

    let input = BufReader::new(tokio::fs::File::open(&input_path).await?);
    let output = tokio::fs::File::create(&output_path).await?;
    let token = CancellationToken::new();
    token.cancel();

    let result = convert(input, output, ConvertConfig::default(), token).await;
    assert!(matches!(result, Err(ConvertError::Cancelled)));
    assert_eq!(std::fs::metadata(&output_path)?.len(), 0);
    Ok(())
}

async fn run_document(
    input: &Path,
    output: &Path,
    records: RecordOptions,
) -> fmpxml_to_json::Result<()> {
    let input = BufReader::new(tokio::fs::File::open(input).await?);
    let output = tokio::fs::File::create(output).await?;
    let config = ConvertConfig {
        records,
        mode: OutputMode::Document,
    };
    convert(input, output, config, CancellationToken::new()).await
}
