//! Prompt templates for the page-pair similarity judgment and sub-topic summaries.

use crate::provider::Message;

const PAIR_SYSTEM: &str = r#"# Role
You are an expert in the structure of educational material. You are given the text of two consecutive slides from a PDF deck and must decide whether they belong to the same **micro sub-topic**, i.e. the same concrete unit of knowledge.

# Context
1. **Document Main Topic**: what the whole deck is about.
2. **Slide A Text**: the earlier slide.
3. **Slide B Text**: the later slide.

# Analysis Criteria
Judge at a fine granularity.

**Same sub-topic (Conclusion: 1) when:**
* **Continuation**: Slide B finishes a sentence or continues a list that Slide A started.
* **Elaboration**: Slide B defines, illustrates, or derives a concept introduced on Slide A without introducing a new core concept.
* **Shared structure**: both slides share the same second-level heading or hierarchy and their content is tightly related.

**Different sub-topic (Conclusion: 0) when:**
* **New concept**: Slide B introduces a new definition, a new algorithm step, or a new section with a different focus.
* **Turn**: Slide A covers advantages and Slide B turns to drawbacks, or Slide A is background and Slide B moves to methodology (unless both sit inside one very small logical block).
* **Independence**: Slide B stands on its own and covers another facet of the main topic.

# Negative Constraints
* Never call two slides the same just because both fit the document main topic. Almost every slide does; that is not evidence. Look for coherence at the micro level.
* Ignore differences caused by headers, footers, page numbers, or boilerplate notices.

# Output Format
Follow this format exactly, without Markdown code fences:

Analysis: [Briefly explain the specific link or difference between the two slides and why they are the same or different.]
Conclusion: [0 or 1]
"#;

const PAIR_USER: &str = r#"Analyse the text of the following two slides.

**Document Main Topic**:
{{main_topic}}

**Slide A Text (earlier slide)**:
"""
{{slide_text_a}}
"""

**Slide B Text (later slide)**:
"""
{{slide_text_b}}
"""

Apply the criteria from the system prompt and give your conclusion.
"#;

const PAIR_SYSTEM_OCR: &str = r#"# Role
You are an expert in the structure of educational material. You are given two consecutive slides from a PDF deck, each with its **main text** and the **OCR text of its images**, and must decide whether they belong to the same **micro sub-topic**, i.e. the same concrete unit of knowledge.

# Context
1. **Document Main Topic**: what the whole deck is about.
2. **Slide A**: main text and image OCR text.
3. **Slide B**: main text and image OCR text.

# Analysis Criteria
Combine the main text and the OCR text and judge at a fine granularity.

**Same sub-topic (Conclusion: 1) when:**
* **Text and figure complement each other**: Slide A explains a concept in text and Slide B's image OCR is the chart, code screenshot, or derivation of that concept (or the other way round).
* **Visual continuation**: the OCR text of both slides shows parts of the same diagram or consecutive steps of the same algorithm.
* **Content or list continuation**: Slide B finishes a sentence or continues a list that Slide A started.
* **Strong dependency**: even with different titles, Slide B's OCR content clearly answers a question raised on Slide A or visualises its data.

**Different sub-topic (Conclusion: 0) when:**
* **New concept or section**: Slide B introduces a new definition, new experimental results, or a new section heading, and no longer shares Slide A's focus.
* **Figures mean different things**: Slide A's OCR shows the architecture of model A while Slide B's shows model B or a results comparison, with no transition between them.
* **Independence**: both slides fit the main topic but are parallel at the micro level (e.g. each introduces a different algorithm) rather than one following from the other.

# Negative Constraints
* **OCR noise**: OCR text may contain garbage characters, fragments, or broken punctuation. Focus on keywords, core terms, and numbers; ignore formatting noise.
* Never call two slides the same just because both fit the document main topic.
* If a slide has no OCR content (empty), judge it from its main text alone.

# Output Format
Follow this format exactly, without Markdown code fences:

Analysis: [Briefly explain your reasoning and say whether it rests on text continuity or on the OCR content.]
Conclusion: [0 or 1]
"#;

const PAIR_USER_OCR: &str = r#"Analyse the following two slides (main text plus image OCR text).

**Document Main Topic**:
{{main_topic}}

---
**Slide A (earlier slide)**:
[Main Text]:
"""
{{slide_text_a}}
"""
[Image OCR Text]:
"""
{{slide_ocr_a}}
"""

---
**Slide B (later slide)**:
[Main Text]:
"""
{{slide_text_b}}
"""
[Image OCR Text]:
"""
{{slide_ocr_b}}
"""

---
Apply the criteria from the system prompt, especially text/figure complementarity and logical continuity, and give your conclusion.
"#;

const SUBTOPIC_SYSTEM: &str = r#"You summarise a run of consecutive slides that were judged to cover one sub-topic of a larger deck.
Name the narrowest sub-topic that still covers every slide in the run, in one short line.

Follow this format exactly, without Markdown:
Sub-topic: [one line]
"#;

/// Text and OCR text of one slide, as fed to the prompt.
pub struct SlideInput<'a> {
    pub text: &'a str,
    pub ocr: &'a str,
}

/// Messages asking whether slides `a` and `b` share a sub-topic.
///
/// The OCR variant is used only when at least one slide has OCR text.
pub fn pair_messages(topic: &str, a: &SlideInput<'_>, b: &SlideInput<'_>) -> Vec<Message> {
    let use_ocr = !a.ocr.is_empty() || !b.ocr.is_empty();

    let (system, user) = if use_ocr {
        (PAIR_SYSTEM_OCR, PAIR_USER_OCR)
    } else {
        (PAIR_SYSTEM, PAIR_USER)
    };

    let mut user = user
        .replace("{{main_topic}}", topic)
        .replace("{{slide_text_a}}", a.text)
        .replace("{{slide_text_b}}", b.text);
    if use_ocr {
        user = user
            .replace("{{slide_ocr_a}}", a.ocr)
            .replace("{{slide_ocr_b}}", b.ocr);
    }

    vec![Message::system(system), Message::user(user)]
}

/// Messages asking for a one-line sub-topic covering `slides`.
pub fn subtopic_messages(topic: &str, slides: &[(usize, &str)]) -> Vec<Message> {
    let mut user = format!("**Document Main Topic**:\n{topic}\n\n");
    for (index, text) in slides {
        user.push_str(&format!("**Slide {}**:\n\"\"\"\n{}\n\"\"\"\n\n", index + 1, text));
    }
    user.push_str("Name the sub-topic these slides share.");

    vec![Message::system(SUBTOPIC_SYSTEM), Message::user(user)]
}

/// Read the 0/1 label from a `Conclusion:` line (case-insensitive, first match wins).
pub fn extract_label(output: &str) -> Option<u8> {
    const KEY: &str = "conclusion:";
    let lower = output.to_ascii_lowercase();

    let mut from = 0;
    while let Some(pos) = lower[from..].find(KEY) {
        let after = &lower[from + pos + KEY.len()..];
        match after.trim_start().chars().next() {
            Some('0') => return Some(0),
            Some('1') => return Some(1),
            _ => from += pos + KEY.len(),
        }
    }
    None
}

/// Pull the sub-topic line out of a summary reply.
pub fn extract_subtopic(output: &str) -> Option<String> {
    const KEY: &str = "sub-topic:";
    let noise = |c: char| c.is_whitespace() || matches!(c, '*' | '"' | '[' | ']');

    let line = output
        .lines()
        .map(|l| l.trim_matches(noise))
        .find(|l| l.to_ascii_lowercase().starts_with(KEY))
        .map(|l| &l[KEY.len()..])
        .or_else(|| output.lines().find(|l| !l.trim().is_empty()))?;

    let line = line.trim_matches(noise);
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
