use claims_core::{error::AggError, reader::ClaimReader, record::RawClaim};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn read(csv: &str) -> Vec<Result<RawClaim, AggError>> {
    ClaimReader::from_reader(csv.as_bytes()).unwrap().collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Header names and cell values are trimmed.
#[test]
fn fields_and_headers_are_trimmed() {
    let rows = read(" ADJUSTERNAME , DOLLARAMOUNTHIGH \n  Ann Lee  ,  1200 \n");
    assert_eq!(rows.len(), 1);
    let row = rows[0].as_ref().unwrap();
    assert_eq!(row.get("ADJUSTERNAME"), Some("Ann Lee"));
    assert_eq!(row.get("DOLLARAMOUNTHIGH"), Some("1200"));
    assert_eq!(row.get("MISSING"), None);
}

/// Empty and whitespace-only lines produce no records.
#[test]
fn empty_lines_are_skipped() {
    let rows = read("A,B\n\n1,2\n   \n\n3,4\n");
    let values: Vec<_> = rows
        .into_iter()
        .map(|r| r.unwrap().get("A").map(str::to_string))
        .collect();
    assert_eq!(values, vec![Some("1".to_string()), Some("3".to_string())]);
}

/// A row of empty cells with the full column count is a record, not a blank line.
#[test]
fn empty_cell_rows_are_kept() {
    let rows = read("A,B,C\n1,2,3\n,,\n  ,  ,  \n");
    assert_eq!(rows.len(), 3);
    let blank = rows[1].as_ref().unwrap();
    assert_eq!(blank.get("A"), None);
    assert_eq!(blank.line(), 3);
    assert_eq!(rows[2].as_ref().unwrap().line(), 4);
}

/// Header names are kept in file order.
#[test]
fn header_names_follow_file_order() {
    let reader = ClaimReader::from_reader("B , A,C\n1,2,3\n".as_bytes()).unwrap();
    assert_eq!(reader.headers().names(), ["B", "A", "C"]);
}

/// A row with the wrong column count ends the stream with an error.
#[test]
fn malformed_row_fails_fast() {
    let rows = read("A,B\n1,2\n1,2,3\n4,5\n");
    assert_eq!(rows.len(), 2, "stream stops at the malformed row");
    assert!(rows[0].is_ok());
    match &rows[1] {
        Err(AggError::MalformedRow { line, expected, found }) => {
            assert_eq!(*line, 3);
            assert_eq!(*expected, 2);
            assert_eq!(*found, 3);
        }
        other => panic!("expected MalformedRow, got {other:?}"),
    }
}

/// Quoted fields keep embedded commas, quotes and newlines.
#[test]
fn quoted_fields_parse() {
    let rows = read("BODY_REGION,NOTE\n\"Cervical, Lumbar\",\"said \"\"ouch\"\"\nlater\"\n");
    let row = rows[0].as_ref().unwrap();
    assert_eq!(row.get("BODY_REGION"), Some("Cervical, Lumbar"));
    assert_eq!(row.get("NOTE"), Some("said \"ouch\"\nlater"));
}

#[test]
fn missing_file_is_reported() {
    match ClaimReader::open("/definitely/not/here/dat.csv") {
        Err(AggError::InputNotFound { path }) => assert!(path.ends_with("dat.csv")),
        Err(other) => panic!("expected InputNotFound, got {other}"),
        Ok(_) => panic!("expected InputNotFound, got a reader"),
    }
}

/// An empty file has no header and yields nothing.
#[test]
fn empty_input_yields_no_records() {
    let reader = ClaimReader::from_reader("".as_bytes()).unwrap();
    assert!(reader.headers().is_empty());
    assert_eq!(reader.count(), 0);
}
