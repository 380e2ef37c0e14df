use deckseg_segment::{Irreducible, Segment, SegmentationResult};

/// One human-readable line per segment, pages numbered from 1.
pub fn render_lines(result: &SegmentationResult) -> Vec<String> {
    result.segments.iter().map(render_segment).collect()
}

fn render_segment(segment: &Segment) -> String {
    let pages = if segment.len() == 1 {
        format!("page {}", segment.start + 1)
    } else {
        format!("pages {}-{}", segment.start + 1, segment.end)
    };

    let mut flags = Vec::new();
    if segment.is_low_confidence() {
        flags.push(format!("uncertain boundaries: {}", segment.uncertain_boundaries));
    }
    match segment.irreducible {
        Some(Irreducible::Unified) => flags.push("oversized: judged one topic".to_string()),
        Some(Irreducible::DepthLimit) => flags.push("oversized: depth limit".to_string()),
        None => {}
    }

    if flags.is_empty() {
        pages
    } else {
        format!("{pages}  [{}]", flags.join("; "))
    }
}
