//! Collapses raw usage records into per-(description, usage type) totals

use std::collections::{BTreeSet, HashMap};

use super::record::{AggregatedRecord, UsageRecord};
use super::types::usage_type_name;
use crate::domain::DomainError;

#[derive(Debug)]
struct Accumulator {
    description: String,
    usagetype: String,
    hours: f64,
    startdate: String,
    enddate: String,
}

impl Accumulator {
    fn finish(self) -> AggregatedRecord {
        AggregatedRecord {
            description: self.description,
            usagetype: self.usagetype,
            usage: format!("{:.2} Hrs", self.hours),
            startdate: self.startdate,
            enddate: self.enddate,
        }
    }
}

/// Aggregates usage records, keeping only the selected usage type names
///
/// An empty selection keeps every record. Output preserves the order in which
/// each (description, usage type) pair was first seen. Date ranges are merged
/// with plain string ordering, which matches calendar order for
/// `YYYY-MM-DDTHH:MM`-style timestamps but is not calendar-aware.
///
/// A record whose usage value cannot be parsed fails the whole pass.
pub fn aggregate(
    records: &[UsageRecord],
    selected: &BTreeSet<String>,
) -> Result<Vec<AggregatedRecord>, DomainError> {
    let mut index: HashMap<(String, i64), usize> = HashMap::new();
    let mut totals: Vec<Accumulator> = Vec::new();

    for record in records {
        let usagetype = usage_type_name(record.usagetype);

        if !selected.is_empty() && !selected.contains(&*usagetype) {
            continue;
        }

        let hours = record.hours()?;
        let description = record.description_or_default();
        let startdate = record.startdate_or_default();
        let enddate = record.enddate_or_default();

        let key = (description.to_string(), record.usagetype);

        match index.get(&key) {
            Some(&position) => {
                let total = &mut totals[position];
                total.hours += hours;

                if startdate < total.startdate.as_str() {
                    total.startdate = startdate.to_string();
                }

                if enddate > total.enddate.as_str() {
                    total.enddate = enddate.to_string();
                }
            }
            None => {
                index.insert(key, totals.len());
                totals.push(Accumulator {
                    description: description.to_string(),
                    usagetype: usagetype.into_owned(),
                    hours,
                    startdate: startdate.to_string(),
                    enddate: enddate.to_string(),
                });
            }
        }
    }

    Ok(totals.into_iter().map(Accumulator::finish).collect())
}
