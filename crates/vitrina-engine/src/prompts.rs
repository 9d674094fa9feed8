// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt templates for the generative backend.

/// Heading that opens the recommendations section of an analysis. The
/// improvement flow extracts everything after this marker.
pub const RECOMMENDATIONS_MARKER: &str = "💡 Recommendations";

/// Prompt run by the analysis flow against the text model, with the card
/// image attached.
pub const ANALYSIS_PROMPT: &str = "\
You are an expert in marketplace product cards. Analyze the attached \
product card image for click-through potential. Cover, briefly and \
concretely:

1. First impression — what catches the eye in the first second.
2. Composition — product placement, background, cropping.
3. Readability — text overlays, badges, price visibility.
4. Weaknesses — what is hurting the click-through rate.

Finish with a section titled \"💡 Recommendations\" containing 3-5 \
specific, actionable changes that would raise the click-through rate. \
Keep the whole answer under 300 words.";

/// Block appended to a generation prompt when the intent classifier says
/// the user is asking for click-through optimization rather than a
/// concrete visual edit.
pub const CTR_ENHANCEMENT: &str = "\n\n\
Additionally, optimize the card for marketplace click-through rate: \
make the product large and sharply lit, use a clean contrasting \
background, and keep any text short and highly readable at thumbnail \
size.";

/// Builds the regeneration prompt from an analysis' recommendations.
pub fn improvement_prompt(recommendations: &str) -> String {
    format!(
        "Redraw the attached product card, keeping the same product, \
         brand elements, and overall identity, but apply the following \
         improvements:\n\n{recommendations}\n\n\
         Produce a single polished marketplace-ready card."
    )
}

/// Extracts the recommendations section from an analysis.
///
/// Takes everything after the marker heading; when the marker is missing
/// or the section is empty, the whole analysis is used instead.
pub fn extract_recommendations(analysis: &str) -> &str {
    if let Some(idx) = analysis.find(RECOMMENDATIONS_MARKER) {
        let section = analysis[idx + RECOMMENDATIONS_MARKER.len()..]
            .trim_start_matches([':', ' ', '\n']);
        if !section.trim().is_empty() {
            return section.trim_end();
        }
    }
    analysis.trim()
}
