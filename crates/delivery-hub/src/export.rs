use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::DeliveryError;

/// Row type that knows its CSV column layout.
pub trait CsvRecord {
    const HEADER: &'static [&'static str];

    fn csv_row(&self) -> Vec<String>;
}

/// Rendered CSV attachment.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub body: Vec<u8>,
}

impl CsvExport {
    pub fn build<'a, T, I>(resource: &str, rows: I) -> Result<Self, DeliveryError>
    where
        T: CsvRecord + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(T::HEADER)?;
        for row in rows {
            writer.write_record(row.csv_row())?;
        }
        let body = writer
            .into_inner()
            .map_err(|err| csv::Error::from(err.into_error()))?;

        Ok(Self {
            filename: format!("{resource}.csv"),
            body,
        })
    }

    pub fn as_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl IntoResponse for CsvExport {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.filename);
        (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.body,
        )
            .into_response()
    }
}

pub(crate) fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

pub(crate) fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|inner| inner.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row(&'static str, u32);

    impl CsvRecord for Row {
        const HEADER: &'static [&'static str] = &["name", "count"];

        fn csv_row(&self) -> Vec<String> {
            vec![self.0.to_string(), self.1.to_string()]
        }
    }

    #[test]
    fn writes_header_then_rows_with_quoting() {
        let rows = [Row("Dock, North", 3), Row("Annex", 0)];
        let export = CsvExport::build("docks", rows.iter()).expect("csv builds");
        assert_eq!(export.filename, "docks.csv");
        assert_eq!(export.as_text(), "name,count\n\"Dock, North\",3\nAnnex,0\n");
    }
}
