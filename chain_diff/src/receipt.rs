//! Receipt and event log comparison.

use crate::mismatch::{MismatchRecord, Mismatches};
use crate::views::{LogView, ReceiptView};

/// Diffs two receipts of the same transaction.
///
/// Logs are order-significant. When the log counts differ a `logs` record
/// carrying both log index sequences is emitted and only the overlapping
/// prefix is compared.
pub fn compare(a: &ReceiptView, b: &ReceiptView) -> Vec<MismatchRecord> {
    let mut m = Mismatches::new();

    m.field("status", &a.status, &b.status);
    m.field("cumulativeGasUsed", &a.cumulative_gas_used, &b.cumulative_gas_used);
    m.bytes("postState", &a.post_state, &b.post_state);
    m.field("contractAddress", &a.contract_address, &b.contract_address);
    m.field("gasUsed", &a.gas_used, &b.gas_used);
    m.field("logsBloom", &a.logs_bloom, &b.logs_bloom);

    if a.logs.len() != b.logs.len() {
        m.push_record(
            MismatchRecord::new("logs", log_indices(&a.logs), log_indices(&b.logs)).with_note(
                format!(
                    "log count {} vs {}, comparing the first {}",
                    a.logs.len(),
                    b.logs.len(),
                    a.logs.len().min(b.logs.len())
                ),
            ),
        );
    }
    for (i, (log_a, log_b)) in a.logs.iter().zip(&b.logs).enumerate() {
        m.nested(&format!("logs[{i}]"), |m| compare_log(m, log_a, log_b));
    }

    m.finish()
}

fn compare_log(m: &mut Mismatches, a: &LogView, b: &LogView) {
    m.field("address", &a.address, &b.address);
    m.bytes("data", &a.data, &b.data);

    if a.topics.len() != b.topics.len() {
        m.push_record(
            MismatchRecord::new("topics", a.topics.clone(), b.topics.clone()).with_note(format!(
                "topic count {} vs {}",
                a.topics.len(),
                b.topics.len()
            )),
        );
    }
    for (j, (topic_a, topic_b)) in a.topics.iter().zip(&b.topics).enumerate() {
        m.field(&format!("topics[{j}]"), topic_a, topic_b);
    }
}

fn log_indices(logs: &[LogView]) -> Vec<u64> {
    logs.iter().map(|log| log.log_index).collect()
}
