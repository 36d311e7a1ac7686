//! Bucketing claims by category.

use crate::types::{Claim, ClaimGroups};

/// Partition claims into category buckets, keeping first-seen category order
/// and the original order of claims inside each bucket.
///
/// Claims without a category are dropped.
pub fn group_claims<I>(claims: I) -> ClaimGroups
where
    I: IntoIterator<Item = Claim>,
{
    let mut groups = ClaimGroups::new();
    let mut dropped = 0usize;

    for claim in claims {
        match claim.category().map(str::to_owned) {
            Some(category) => groups.push(&category, claim),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        log::debug!("Dropped {} claims without a category", dropped);
    }
    log::info!(
        "Grouped {} claims into {} categories",
        groups.claim_count(),
        groups.len()
    );

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uncategorized(slide: usize) -> Claim {
        let mut claim = Claim::new(slide, "", "loose text");
        claim.metric_category = None;
        claim
    }

    #[test]
    fn test_partition_is_stable_and_complete() {
        let claims = vec![
            Claim::new(1, "b", "b1"),
            Claim::new(1, "a", "a1"),
            uncategorized(2),
            Claim::new(2, "b", "b2"),
            Claim::new(3, "  ", "blank category"),
            Claim::new(3, "a", "a2"),
        ];
        let input_len = claims.len();

        let groups = group_claims(claims);

        assert_eq!(groups.categories().collect::<Vec<_>>(), vec!["b", "a"]);
        let b: Vec<&str> = groups.get("b").unwrap().iter().map(|c| c.text_content.as_str()).collect();
        assert_eq!(b, vec!["b1", "b2"]);
        let a: Vec<&str> = groups.get("a").unwrap().iter().map(|c| c.text_content.as_str()).collect();
        assert_eq!(a, vec!["a1", "a2"]);

        let excluded = 2;
        assert_eq!(groups.claim_count() + excluded, input_len);
        for (category, bucket) in groups.iter() {
            assert!(bucket.iter().all(|c| c.category() == Some(category)));
        }
    }

    #[test]
    fn test_category_whitespace_is_trimmed() {
        let groups = group_claims(vec![Claim::new(1, " cost ", "x"), Claim::new(2, "cost", "y")]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get("cost").unwrap().len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_claims(Vec::new()).is_empty());
    }
}
