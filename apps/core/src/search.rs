use crate::model::{normalize_for_search, PeerNode};

/// Ranked subsequence filter over hostnames.
///
/// A node matches when every query character appears in its hostname in
/// order, ignoring case. Matches are ordered by the length of the tightest
/// matching span, then by where that span starts, then by the raw
/// (case-sensitive) hostname, then by input order. An empty query matches every node with a zero-length span.
pub fn search<'a>(nodes: &'a [PeerNode], query: &str, limit: usize) -> Vec<&'a PeerNode> {
    if limit == 0 || nodes.is_empty() {
        return Vec::new();
    }

    let normalized_query: Vec<char> = normalize_for_search(query).chars().collect();

    let mut scored: Vec<(MatchSpan, usize, &PeerNode)> = nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            tightest_span(node.normalized_hostname(), &normalized_query)
                .map(|span| (span, index, node))
        })
        .collect();

    scored.sort_by(|a, b| {
        a.0.len
            .cmp(&b.0.len)
            .then_with(|| a.0.start.cmp(&b.0.start))
            .then_with(|| a.2.hostname.cmp(&b.2.hostname))
            .then_with(|| a.1.cmp(&b.1))
    });

    scored
        .into_iter()
        .take(limit)
        .map(|(_, _, node)| node)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MatchSpan {
    start: usize,
    len: usize,
}

fn tightest_span(haystack: &str, needle: &[char]) -> Option<MatchSpan> {
    let Some((&first, rest)) = needle.split_first() else {
        return Some(MatchSpan { start: 0, len: 0 });
    };

    let hay: Vec<char> = haystack.chars().collect();
    let mut best: Option<MatchSpan> = None;

    for (start, &c) in hay.iter().enumerate() {
        if c != first {
            continue;
        }
        let Some(tail) = subsequence_len(&hay[start + 1..], rest) else {
            // No later start can complete the match either.
            break;
        };
        let len = tail + 1;
        if best.map_or(true, |b| len < b.len) {
            best = Some(MatchSpan { start, len });
        }
    }

    best
}

/// Length of the shortest prefix of `hay` containing `needle` as a
/// subsequence, matched greedily.
fn subsequence_len(hay: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }

    let mut next = 0;
    for (offset, &c) in hay.iter().enumerate() {
        if c == needle[next] {
            next += 1;
            if next == needle.len() {
                return Some(offset + 1);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{tightest_span, MatchSpan};

    fn span(haystack: &str, needle: &str) -> Option<MatchSpan> {
        let needle: Vec<char> = needle.chars().collect();
        tightest_span(haystack, &needle)
    }

    #[test]
    fn picks_shortest_span_over_leftmost() {
        assert_eq!(span("sxxrvserver", "srv"), Some(MatchSpan { start: 5, len: 4 }));
    }

    #[test]
    fn single_char_span_has_length_one() {
        assert_eq!(span("laptop", "p"), Some(MatchSpan { start: 2, len: 1 }));
    }

    #[test]
    fn out_of_order_chars_do_not_match() {
        assert_eq!(span("server", "vs"), None);
    }
}
