use super::mechanism::SpfEntry;
use super::types::SpfRecord;

/// Flatten a record tree into one allowlist: every include's ranges, in
/// include order and recursively, followed by the record's own entries.
pub fn aggregate_allowlist(record: &SpfRecord) -> Vec<SpfEntry> {
    let mut out = Vec::new();
    collect(record, &mut out);
    out
}

fn collect(record: &SpfRecord, out: &mut Vec<SpfEntry>) {
    for include in &record.includes {
        collect(include, out);
    }
    out.extend(record.entries.iter().cloned());
}
