use crate::buffer::{ResourceBuffer, digest_of};
use crate::error::MutationError;
use crate::planner::{ReplacementPlan, Verdict};

/// Applies an approved [`ReplacementPlan`] to the buffer it was computed for.
///
/// The output is assembled into a fresh buffer: unaffected regions are copied
/// verbatim and the replacement bytes are written at each occurrence. Offsets in the
/// plan always refer to the original buffer, so growth or shrinkage at one site never
/// shifts a later one. The input buffer is never modified.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResourceMutator;

impl ResourceMutator {
    pub fn new() -> Self {
        ResourceMutator
    }

    pub fn apply(
        &self,
        buffer: &[u8],
        plan: &ReplacementPlan,
    ) -> Result<ResourceBuffer, MutationError> {
        if let Verdict::Denied(reason) = plan.verdict() {
            return Err(MutationError::IllegalPlan(format!(
                "plan was denied ({reason})"
            )));
        }
        if buffer.len() != plan.source_len() || digest_of(buffer) != plan.source_digest() {
            return Err(MutationError::IllegalPlan(
                "plan was computed for different resource contents".to_string(),
            ));
        }

        let replacement = plan.replacement().as_bytes();
        let mut output = Vec::with_capacity(plan.output_len());
        let mut cursor = 0usize;

        for occurrence in plan.occurrences() {
            if occurrence.offset < cursor || occurrence.end() > buffer.len() {
                return Err(MutationError::IllegalPlan(format!(
                    "occurrence at offset {} is out of order or out of bounds",
                    occurrence.offset
                )));
            }
            output.extend_from_slice(&buffer[cursor..occurrence.offset]);
            output.extend_from_slice(replacement);
            cursor = occurrence.end();
        }
        output.extend_from_slice(&buffer[cursor..]);

        Ok(ResourceBuffer::new(output))
    }
}
