use crate::sampling::{select_titles, Measured, SampleContext};
use crate::synthetic::SyntheticGenerator;
use futures::future::join_all;
use regscope_core::{content_checksum, AgencyWordCount, DocumentNode, RegScopeError, Result, Title};
use tracing::{debug, warn};

/// Word count of a document tree plus its text in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordTally {
    pub word_count: u64,
    /// Node texts concatenated verbatim; checksum input only
    pub content: String,
}

/// Walk `node` depth-first in pre-order and sum whitespace-delimited tokens.
///
/// Uses an explicit stack so malformed, very deep trees cannot exhaust the call stack.
pub fn count_words(node: &DocumentNode) -> WordTally {
    let mut tally = WordTally::default();
    let mut stack = vec![node];

    while let Some(current) = stack.pop() {
        if let Some(text) = current.text.as_deref() {
            tally.word_count += text.split_whitespace().count() as u64;
            tally.content.push_str(text);
        }
        // Reversed so the first child is popped next
        stack.extend(current.children.iter().rev());
    }

    tally
}

/// Per-agency word counts over a capped sample of titles
pub struct WordCountAggregator {
    title_cap: usize,
}

impl WordCountAggregator {
    pub fn new(title_cap: usize) -> Self {
        Self { title_cap }
    }

    /// Live word count for `agency`, or `SampleExhausted` when no title could be walked.
    ///
    /// A failure on one of the sampled titles is tolerated as long as another succeeds.
    pub async fn sample(
        &self,
        ctx: &SampleContext<'_>,
        agency: &str,
        titles: &[Title],
    ) -> Result<AgencyWordCount> {
        let selected = select_titles(titles, agency, self.title_cap);
        if selected.is_empty() {
            return Err(RegScopeError::SampleExhausted(agency.to_string()));
        }

        let fetched = join_all(selected.iter().map(|t| ctx.fetch_structure(t.number))).await;

        let mut total = WordTally::default();
        let mut walked = 0usize;
        for (title, result) in selected.iter().zip(fetched) {
            match result {
                Ok(tree) => {
                    let tally = count_words(&tree);
                    total.word_count += tally.word_count;
                    total.content.push_str(&tally.content);
                    walked += 1;
                }
                Err(e) => warn!(agency, title = title.number, "Structure fetch failed: {}", e),
            }
        }

        if walked == 0 {
            return Err(RegScopeError::SampleExhausted(agency.to_string()));
        }

        let checksum_input = if total.content.is_empty() {
            agency
        } else {
            total.content.as_str()
        };

        Ok(AgencyWordCount {
            name: agency.to_string(),
            word_count: total.word_count,
            checksum: content_checksum(checksum_input),
        })
    }

    /// Live word count, falling back to synthetic values for this agency only.
    pub async fn measure(
        &self,
        ctx: &SampleContext<'_>,
        agency: &str,
        titles: &[Title],
        synthetic: &SyntheticGenerator,
    ) -> Measured<AgencyWordCount> {
        match self.sample(ctx, agency, titles).await {
            Ok(count) => Measured::live(count),
            Err(e) => {
                debug!(agency, "Using synthetic word count: {}", e);
                Measured::synthetic(AgencyWordCount {
                    name: agency.to_string(),
                    word_count: synthetic.word_count_for(agency),
                    checksum: content_checksum(agency),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_tree_counts_every_text_node() {
        let tree = DocumentNode::branch(
            Some("alpha beta".to_string()),
            vec![DocumentNode::leaf("gamma")],
        );
        let tally = count_words(&tree);
        assert_eq!(tally.word_count, 3);
        assert_eq!(tally.content, "alpha betagamma");
    }

    #[test]
    fn content_follows_document_order() {
        let tree = DocumentNode::branch(
            None,
            vec![
                DocumentNode::branch(
                    Some("a ".to_string()),
                    vec![DocumentNode::leaf("b "), DocumentNode::leaf("c ")],
                ),
                DocumentNode::leaf("d"),
            ],
        );
        let tally = count_words(&tree);
        assert_eq!(tally.content, "a b c d");
        assert_eq!(tally.word_count, 4);
    }

    #[test]
    fn whitespace_runs_and_empty_text_add_nothing() {
        let tree = DocumentNode::branch(
            Some("  one\t\n two   ".to_string()),
            vec![DocumentNode::leaf(""), DocumentNode::leaf("   "), DocumentNode::default()],
        );
        assert_eq!(count_words(&tree).word_count, 2);
    }

    #[test]
    fn count_is_independent_of_sibling_order() {
        let forward = DocumentNode::branch(
            None,
            vec![DocumentNode::leaf("one two"), DocumentNode::leaf("three")],
        );
        let reversed = DocumentNode::branch(
            None,
            vec![DocumentNode::leaf("three"), DocumentNode::leaf("one two")],
        );
        assert_eq!(count_words(&forward).word_count, count_words(&reversed).word_count);
        assert_ne!(count_words(&forward).content, count_words(&reversed).content);
    }

    #[test]
    fn deep_tree_does_not_overflow() {
        let mut node = DocumentNode::leaf("bottom");
        for _ in 0..50_000 {
            node = DocumentNode::branch(Some("w".to_string()), vec![node]);
        }
        assert_eq!(count_words(&node).word_count, 50_001);
        // Dismantle iteratively; the derived drop would recurse once per level
        let mut current = node;
        while let Some(child) = current.children.pop() {
            current = child;
        }
    }
}
