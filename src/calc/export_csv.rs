//! CSV export of a per-slot cost breakdown plus a total row.
//!
//! Columns: `slot, category, from, to, <resource...>, power, note`. Only
//! resources that appear in the total get a column.

use crate::calc::aggregate::AggregateCost;
use crate::calc::resource::Resource;
use crate::calc::session::{SlotCost, SlotOutcome};

pub fn breakdown_to_csv(rows: &[SlotCost], total: &AggregateCost) -> Result<String, csv::Error> {
    let resources: Vec<Resource> = total.sum.resources().collect();
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec![
        "slot".to_string(),
        "category".to_string(),
        "from".to_string(),
        "to".to_string(),
    ];
    header.extend(resources.iter().map(|resource| resource.as_str().to_string()));
    header.push("power".to_string());
    header.push("note".to_string());
    writer.write_record(&header)?;

    for row in rows {
        let (from, to) = match &row.range {
            Some(range) => (range.from.to_string(), range.to.to_string()),
            None => (String::new(), String::new()),
        };
        let mut record = vec![row.slot_id.clone(), row.category.clone(), from, to];
        match &row.outcome {
            SlotOutcome::Costed(range_cost) => {
                record.extend(
                    resources
                        .iter()
                        .map(|resource| range_cost.cost.get(*resource).to_string()),
                );
                record.push(range_cost.terminal_power.to_string());
                record.push(String::new());
            }
            other => {
                record.extend(resources.iter().map(|_| "0".to_string()));
                record.push(String::new());
                record.push(match other {
                    SlotOutcome::Unset => "unset".to_string(),
                    SlotOutcome::NonIncreasing => "from is not below to".to_string(),
                    SlotOutcome::Invalid { message } => message.clone(),
                    SlotOutcome::Costed(_) => String::new(),
                });
            }
        }
        writer.write_record(&record)?;
    }

    let mut footer = vec![
        "total".to_string(),
        String::new(),
        String::new(),
        String::new(),
    ];
    footer.extend(
        resources
            .iter()
            .map(|resource| total.sum.get(*resource).to_string()),
    );
    footer.push(total.final_power.map(|power| power.to_string()).unwrap_or_default());
    footer.push(format!("{} range(s) costed", total.contributing_ranges));
    writer.write_record(&footer)?;

    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
