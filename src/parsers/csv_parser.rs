//! Account CSV parsing and template generation
//!
//! Columns are located by header name, so the order in the file does not
//! matter and common spellings (`channel_id`, `Channel ID`, ...) are accepted.

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::core::models::{AppError, AppResult};
use crate::utils::encoding::decode_to_string;
use crate::utils::validation::{non_empty, to_iso_date};

/// Default file name offered for the downloadable template
pub const TEMPLATE_FILE_NAME: &str = "youtube_accounts_template.csv";

/// Header plus one example row
pub const CSV_TEMPLATE: &str =
    "name,email,channelId,createdAt\nExample Channel,example@mail.com,UC123456789,2023-01-01";

/// Accepted header spellings per field, compared case-insensitively
#[derive(Debug, Clone)]
pub struct CsvFieldMapping {
    pub name_names: Vec<String>,
    pub email_names: Vec<String>,
    pub channel_id_names: Vec<String>,
    pub created_at_names: Vec<String>,
}

impl Default for CsvFieldMapping {
    fn default() -> Self {
        let names = |values: &[&str]| -> Vec<String> { values.iter().map(|v| v.to_string()).collect() };
        Self {
            name_names: names(&["name", "channel name", "channel_name", "title"]),
            email_names: names(&["email", "e-mail", "mail"]),
            channel_id_names: names(&["channelId", "channel_id", "channel id", "youtube id"]),
            created_at_names: names(&["createdAt", "created_at", "created at", "date"]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CsvField {
    Name,
    Email,
    ChannelId,
    CreatedAt,
}

/// One usable data row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvAccountRow {
    /// 1-based line in the file, header included
    pub source_row: usize,
    pub name: String,
    pub email: String,
    pub channel_id: Option<String>,
    /// Normalized `YYYY-MM-DD`; `None` when missing or unparseable
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
}

/// Result of parsing one file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountCsv {
    pub rows: Vec<CsvAccountRow>,
    pub skipped: Vec<SkippedRow>,
    pub detected_encoding: String,
}

pub struct AccountCsvParser {
    mapping: CsvFieldMapping,
    max_bytes: u64,
}

impl AccountCsvParser {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            mapping: CsvFieldMapping::default(),
            max_bytes,
        }
    }

    pub fn with_mapping(mut self, mapping: CsvFieldMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn parse_file(&self, path: &Path) -> AppResult<AccountCsv> {
        let size = fs::metadata(path)?.len();
        self.check_size(size)?;

        let data = fs::read(path)?;
        debug!("Parsing account CSV {} ({} bytes)", path.display(), size);
        self.parse_bytes(&data)
    }

    pub fn parse_bytes(&self, data: &[u8]) -> AppResult<AccountCsv> {
        self.check_size(data.len() as u64)?;

        let (text, encoding) = decode_to_string(data);
        debug!("Detected CSV encoding: {}", encoding.name());

        let delimiter = detect_delimiter(&text);
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::Parse(format!("Failed to read CSV header: {}", e)))?
            .clone();
        let columns = self.build_column_map(&headers);
        if !columns.contains_key(&CsvField::Name) {
            return Err(AppError::Parse(
                "CSV file has no name column".to_string(),
            ));
        }

        let mut parsed = AccountCsv {
            detected_encoding: encoding.name().to_string(),
            ..AccountCsv::default()
        };

        for (index, result) in reader.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    let row = e.position().map_or(index + 2, |p| p.line() as usize);
                    warn!("Skipping CSV row {}: {}", row, e);
                    parsed.skipped.push(SkippedRow {
                        row,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }

            let row = record.position().map_or(index + 2, |p| p.line() as usize);

            match parse_record(&record, &columns, row) {
                Ok(account) => parsed.rows.push(account),
                Err(reason) => {
                    warn!("Skipping CSV row {}: {}", row, reason);
                    parsed.skipped.push(SkippedRow { row, reason });
                }
            }
        }

        info!(
            "CSV parsed: {} usable row(s), {} skipped",
            parsed.rows.len(),
            parsed.skipped.len()
        );
        Ok(parsed)
    }

    fn check_size(&self, size: u64) -> AppResult<()> {
        if size > self.max_bytes {
            return Err(AppError::Parse(format!(
                "CSV file is too large ({} bytes, limit {})",
                size, self.max_bytes
            )));
        }
        Ok(())
    }

    fn build_column_map(&self, headers: &StringRecord) -> HashMap<CsvField, usize> {
        let matches = |names: &[String], header: &str| {
            names.iter().any(|name| name.to_lowercase() == header)
        };

        let mut columns = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            let header = header.trim().trim_start_matches('\u{feff}').to_lowercase();
            let field = if matches(&self.mapping.name_names, &header) {
                CsvField::Name
            } else if matches(&self.mapping.email_names, &header) {
                CsvField::Email
            } else if matches(&self.mapping.channel_id_names, &header) {
                CsvField::ChannelId
            } else if matches(&self.mapping.created_at_names, &header) {
                CsvField::CreatedAt
            } else {
                continue;
            };
            // First matching column wins
            columns.entry(field).or_insert(index);
        }

        debug!("CSV column map: {:?}", columns);
        columns
    }
}

fn parse_record(
    record: &StringRecord,
    columns: &HashMap<CsvField, usize>,
    row: usize,
) -> Result<CsvAccountRow, String> {
    let field = |field: CsvField| {
        columns
            .get(&field)
            .and_then(|&index| record.get(index))
            .map(str::trim)
    };

    let name = non_empty(field(CsvField::Name)).ok_or_else(|| "name is empty".to_string())?;
    let created_at = field(CsvField::CreatedAt).and_then(to_iso_date);

    Ok(CsvAccountRow {
        source_row: row,
        name,
        email: field(CsvField::Email).unwrap_or_default().to_string(),
        channel_id: non_empty(field(CsvField::ChannelId)),
        created_at,
    })
}

/// Pick the delimiter that splits the header line into the most fields
fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    [b',', b';', b'\t']
        .into_iter()
        .max_by_key(|&delimiter| header.bytes().filter(|&b| b == delimiter).count())
        .filter(|&delimiter| header.as_bytes().contains(&delimiter))
        .unwrap_or(b',')
}

/// Write the template to `path`
pub fn write_template(path: &Path) -> AppResult<()> {
    fs::write(path, CSV_TEMPLATE)?;
    info!("CSV template written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> AccountCsvParser {
        AccountCsvParser::new(5 * 1024 * 1024)
    }

    #[test]
    fn test_template_parses_as_one_account() {
        let parsed = parser().parse_bytes(CSV_TEMPLATE.as_bytes()).unwrap();

        assert_eq!(parsed.rows.len(), 1);
        let row = &parsed.rows[0];
        assert_eq!(row.name, "Example Channel");
        assert_eq!(row.email, "example@mail.com");
        assert_eq!(row.channel_id.as_deref(), Some("UC123456789"));
        assert_eq!(row.created_at.as_deref(), Some("2023-01-01"));
        assert_eq!(row.source_row, 2);
    }

    #[test]
    fn test_header_aliases_and_column_order() {
        let csv = "Created_At;E-Mail;Channel ID;Name\n2021-05-06;a@b.co;UCx;Alpha\n";
        let parsed = parser().parse_bytes(csv.as_bytes()).unwrap();

        assert_eq!(
            parsed.rows,
            vec![CsvAccountRow {
                source_row: 2,
                name: "Alpha".to_string(),
                email: "a@b.co".to_string(),
                channel_id: Some("UCx".to_string()),
                created_at: Some("2021-05-06".to_string()),
            }]
        );
    }

    #[test]
    fn test_rows_without_name_are_reported() {
        let csv = "name,email,createdAt\nAlpha,a@b.co,not-a-date\n,b@c.co,2021-01-01\n\n";
        let parsed = parser().parse_bytes(csv.as_bytes()).unwrap();

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].created_at, None);
        assert_eq!(parsed.skipped, vec![SkippedRow { row: 3, reason: "name is empty".to_string() }]);
    }

    #[test]
    fn test_missing_name_column_is_rejected() {
        let result = parser().parse_bytes(b"email,channelId\na@b.co,UC1\n");
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn test_size_limit() {
        let result = AccountCsvParser::new(8).parse_bytes(CSV_TEMPLATE.as_bytes());
        assert!(matches!(result, Err(AppError::Parse(message)) if message.contains("too large")));
    }

    #[test]
    fn test_utf16_with_bom() {
        let mut data = vec![0xFF, 0xFE];
        for unit in "name,email\nCanal,c@d.es\n".encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        let parsed = parser().parse_bytes(&data).unwrap();

        assert_eq!(parsed.detected_encoding, "UTF-16LE");
        assert_eq!(parsed.rows[0].name, "Canal");
    }

    #[test]
    fn test_write_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TEMPLATE_FILE_NAME);

        write_template(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), CSV_TEMPLATE);
    }
}
