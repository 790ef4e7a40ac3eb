use crate::buffer::{digest_of, hex_digest};
use crate::error::ValidationError;
use crate::pattern::{ReplacementPattern, SearchPattern, TextEncoding};
use crate::scanner::{self, Occurrence};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What to do when the search text does not occur in the resource at all.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroMatchPolicy {
    /// Succeed without changing anything.
    #[default]
    Silent,
    /// Fail with [`ValidationError::NotFound`].
    Report,
}

/// Whether a plan may be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Denied(ValidationError),
}

/// Every substitution a request would make, computed against one specific buffer.
///
/// Plans are transient: build one with [`ReplacementPlanner`], hand it to the
/// [`ResourceMutator`](crate::mutator::ResourceMutator), then drop it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementPlan {
    pub(crate) search: SearchPattern,
    pub(crate) replacement: ReplacementPattern,
    pub(crate) occurrences: Vec<Occurrence>,
    pub(crate) verdict: Verdict,
    pub(crate) source_len: usize,
    pub(crate) source_digest: [u8; 16],
}

impl ReplacementPlan {
    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    pub fn search(&self) -> &SearchPattern {
        &self.search
    }

    pub fn replacement(&self) -> &ReplacementPattern {
        &self.replacement
    }

    pub fn verdict(&self) -> &Verdict {
        &self.verdict
    }

    pub fn is_allowed(&self) -> bool {
        self.verdict == Verdict::Allowed
    }

    /// `true` when there is nothing to substitute.
    pub fn is_noop(&self) -> bool {
        self.occurrences.is_empty()
    }

    pub fn source_len(&self) -> usize {
        self.source_len
    }

    pub fn source_digest(&self) -> [u8; 16] {
        self.source_digest
    }

    /// Length of the buffer after every occurrence has been substituted.
    pub fn output_len(&self) -> usize {
        let n = self.occurrences.len();
        self.source_len - n * self.search.len() + n * self.replacement.len()
    }

    pub fn report(&self) -> PlanReport {
        let (verdict, reason) = match &self.verdict {
            Verdict::Allowed => ("allowed", None),
            Verdict::Denied(err) => ("denied", Some(err.to_string())),
        };
        PlanReport {
            offsets: self.occurrences.iter().map(|o| o.offset).collect(),
            search_len: self.search.len(),
            replacement_len: self.replacement.len(),
            source_len: self.source_len,
            output_len: self.output_len(),
            source_md5: hex_digest(&self.source_digest),
            verdict,
            reason,
        }
    }
}

/// Serializable summary of a plan, used for dry runs.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PlanReport {
    pub offsets: Vec<usize>,
    pub search_len: usize,
    pub replacement_len: usize,
    pub source_len: usize,
    pub output_len: usize,
    pub source_md5: String,
    pub verdict: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Turns find/replace text and the two request policies into a [`ReplacementPlan`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplacementPlanner {
    encoding: TextEncoding,
    zero_match: ZeroMatchPolicy,
}

impl ReplacementPlanner {
    pub fn new(encoding: TextEncoding, zero_match: ZeroMatchPolicy) -> Self {
        Self {
            encoding,
            zero_match,
        }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn zero_match(&self) -> ZeroMatchPolicy {
        self.zero_match
    }

    /// Builds a plan and fails if its verdict is a denial.
    pub fn plan(
        &self,
        buffer: &[u8],
        find_text: &str,
        replace_text: &str,
        null_terminate: bool,
        allow_overflow: bool,
    ) -> Result<ReplacementPlan, ValidationError> {
        let plan = self.evaluate(buffer, find_text, replace_text, null_terminate, allow_overflow)?;
        if let Verdict::Denied(err) = &plan.verdict {
            return Err(err.clone());
        }
        Ok(plan)
    }

    /// Builds a plan, keeping a denied verdict inside it instead of failing.
    ///
    /// Input errors (empty search text, unencodable text, a reported zero match) still fail.
    pub fn evaluate(
        &self,
        buffer: &[u8],
        find_text: &str,
        replace_text: &str,
        null_terminate: bool,
        allow_overflow: bool,
    ) -> Result<ReplacementPlan, ValidationError> {
        let search = SearchPattern::encode(find_text, self.encoding)?;
        let replacement = ReplacementPattern::encode(replace_text, self.encoding, null_terminate)?;

        let occurrences = scanner::find_all(buffer, &search);
        debug!(
            pattern_len = search.len(),
            replacement_len = replacement.len(),
            occurrences = occurrences.len(),
            "Scanned resource"
        );

        if occurrences.is_empty() && self.zero_match == ZeroMatchPolicy::Report {
            return Err(ValidationError::NotFound);
        }

        let verdict = length_verdict(&search, &replacement, &occurrences, allow_overflow);

        Ok(ReplacementPlan {
            search,
            replacement,
            occurrences,
            verdict,
            source_len: buffer.len(),
            source_digest: digest_of(buffer),
        })
    }
}

fn length_verdict(
    search: &SearchPattern,
    replacement: &ReplacementPattern,
    occurrences: &[Occurrence],
    allow_overflow: bool,
) -> Verdict {
    // Every occurrence has the pattern's length, so one denial denies them all.
    let overflows = occurrences.iter().any(|occ| replacement.len() > occ.len);
    if overflows && !allow_overflow {
        return Verdict::Denied(ValidationError::Overflow {
            pattern_len: search.len(),
            replacement_len: replacement.len(),
        });
    }
    Verdict::Allowed
}
