//! Opcode level trace comparison.
//!
//! Once two executions diverge every following step differs as well, so only
//! the first differing step is reported, paired with the step that preceded
//! it.

use crate::mismatch::{MismatchRecord, Mismatches, StepContext};
use crate::views::{OpStepView, TraceView};

/// Diffs two traces of the same transaction.
pub fn compare(a: &TraceView, b: &TraceView) -> Vec<MismatchRecord> {
    let mut m = Mismatches::new();

    m.field("failed", &a.failed, &b.failed);
    m.field("gas", &a.gas, &b.gas);
    m.field("returnValue", &a.return_value, &b.return_value);

    if a.steps.len() != b.steps.len() {
        m.push("structLogs", a.steps.len(), b.steps.len());
    }

    let first_diff = a
        .steps
        .iter()
        .zip(&b.steps)
        .enumerate()
        .find_map(|(i, (step_a, step_b))| step_diff(step_a, step_b).map(|note| (i, note)));

    if let Some((i, note)) = first_diff {
        m.push_record(
            MismatchRecord::new(
                format!("structLogs[{i}]"),
                context(&a.steps, i),
                context(&b.steps, i),
            )
            .with_note(note),
        );
    }

    m.finish()
}

fn context(steps: &[OpStepView], index: usize) -> StepContext {
    StepContext {
        index,
        step: steps[index].clone(),
        previous: index.checked_sub(1).map(|prev| steps[prev].clone()),
    }
}

/// Describes how two steps differ, or `None` if they are equal.
fn step_diff(a: &OpStepView, b: &OpStepView) -> Option<String> {
    let mut parts = Vec::new();

    if a.pc != b.pc {
        parts.push("pc".to_string());
    }
    if a.op != b.op {
        parts.push("op".to_string());
    }
    if a.gas != b.gas {
        parts.push("gas".to_string());
    }
    if a.gas_cost != b.gas_cost {
        parts.push("gasCost".to_string());
    }
    if a.depth != b.depth {
        parts.push("depth".to_string());
    }
    if a.refund != b.refund {
        parts.push("refund".to_string());
    }
    if let Some(stack) = stack_diff(&a.stack, &b.stack) {
        parts.push(stack);
    }

    match parts.is_empty() {
        true => None,
        false => Some(format!("differs in {}", parts.join(", "))),
    }
}

/// Positional stack comparison, stopping at the first differing entry.
fn stack_diff(a: &[String], b: &[String]) -> Option<String> {
    match a.iter().zip(b).position(|(x, y)| x != y) {
        Some(i) => Some(format!(
            "stack[{i}] (stack lengths {} vs {})",
            a.len(),
            b.len()
        )),
        None if a.len() != b.len() => Some(format!("stack length {} vs {}", a.len(), b.len())),
        None => None,
    }
}
