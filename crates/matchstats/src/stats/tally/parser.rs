use serde::Deserialize;
use std::io::Read;

#[derive(Debug)]
pub(crate) struct TallyRecord {
    pub(crate) action: String,
    pub(crate) count: u64,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<TallyRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for record in csv_reader.deserialize::<TallyRow>() {
        let row = record?;
        if row.action.trim().is_empty() {
            continue;
        }

        records.push(TallyRecord {
            action: row.action,
            count: row.count.unwrap_or(0),
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct TallyRow {
    #[serde(alias = "Action")]
    action: String,
    #[serde(default, alias = "Count")]
    count: Option<u64>,
}
