//! Header and transaction-set comparison.

use crate::mismatch::{MismatchRecord, Mismatches};
use crate::views::HeaderView;

/// The agreement oracle used by the divergence search.
pub fn hashes_agree(a: &HeaderView, b: &HeaderView) -> bool {
    a.hash == b.hash
}

/// Whether receipts of the block have to be compared individually.
pub fn needs_receipt_cascade(a: &HeaderView, b: &HeaderView) -> bool {
    a.receipts_root != b.receipts_root
}

/// Diffs two headers field by field.
///
/// The canonical hash is not a compared field. When the transaction counts
/// differ a single `transactions` record carrying both hash lists is emitted
/// and no positional comparison takes place.
pub fn compare(a: &HeaderView, b: &HeaderView) -> Vec<MismatchRecord> {
    let mut m = Mismatches::new();

    m.field("parentHash", &a.parent_hash, &b.parent_hash);
    m.field("uncleHash", &a.uncle_hash, &b.uncle_hash);
    m.field("stateRoot", &a.state_root, &b.state_root);
    m.field("transactionsRoot", &a.transactions_root, &b.transactions_root);
    m.field("receiptsRoot", &a.receipts_root, &b.receipts_root);
    m.field("logsBloom", &a.logs_bloom, &b.logs_bloom);
    m.field("difficulty", &a.difficulty, &b.difficulty);
    m.field("number", &a.number, &b.number);
    m.field("gasLimit", &a.gas_limit, &b.gas_limit);
    m.field("gasUsed", &a.gas_used, &b.gas_used);
    m.field("timestamp", &a.timestamp, &b.timestamp);
    m.field("mixDigest", &a.mix_digest, &b.mix_digest);
    m.field("nonce", &a.nonce, &b.nonce);
    m.field("baseFee", &a.base_fee, &b.base_fee);

    if let Some(record) = transaction_count_mismatch(a, b) {
        m.push_record(record);
    } else {
        for (i, (tx_a, tx_b)) in a.transactions.iter().zip(&b.transactions).enumerate() {
            m.field(&format!("transactions[{i}]"), tx_a, tx_b);
        }
    }

    m.finish()
}

/// The `transactions` record emitted when the blocks list a different number
/// of transactions. Carries both hash lists.
pub fn transaction_count_mismatch(a: &HeaderView, b: &HeaderView) -> Option<MismatchRecord> {
    if a.transactions.len() == b.transactions.len() {
        return None;
    }
    let record = MismatchRecord::new("transactions", a.transactions.clone(), b.transactions.clone())
        .with_note(format!(
            "transaction count {} vs {}",
            a.transactions.len(),
            b.transactions.len()
        ));
    Some(record)
}
