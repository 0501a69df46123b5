// src/services/classifier.rs
// DOCUMENTATION: Preference classification through a text generation model
// PURPOSE: Ask the model for the best places per preference and reconcile its
// free-text answer against the canonical candidate set

use crate::models::{Location, PipelineWarning, PreferenceResult};
use crate::services::candidate_store::CandidateSet;
use crate::services::providers::TextGenerator;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Characters trimmed from both ends of every response token
const INCIDENTAL_PUNCTUATION: &[char] = &[
    '"', '\'', '`', '*', '_', '-', '•', '.', ':', '[', ']', '{', '}', '“', '”', '‘', '’',
];

/// Shortest token allowed to match by containment inside a longer name
const MIN_PARTIAL_TOKEN_LEN: usize = 4;

/// Outcome of classifying one preference
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub result: PreferenceResult,
    pub warning: Option<PipelineWarning>,
}

impl Classification {
    fn degraded(preference: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        log::warn!("Classification of '{}' degraded: {}", preference, reason);
        Self {
            result: PreferenceResult::empty(preference),
            warning: Some(PipelineWarning::Classification {
                preference: preference.to_string(),
                reason,
            }),
        }
    }
}

/// Preference classifier
/// DOCUMENTATION: Model output is untrusted text. Only ids of candidates the
/// response can be matched to ever reach a PreferenceResult; anything else in
/// the response is dropped.
pub struct PreferenceClassifier {
    generator: Arc<dyn TextGenerator>,
    top_n: usize,
    timeout: Duration,
}

impl PreferenceClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>, top_n: usize, timeout: Duration) -> Self {
        Self {
            generator,
            top_n: top_n.max(1),
            timeout,
        }
    }

    /// Classify the candidates for one preference
    ///
    /// # Arguments
    /// * `location` - Resolved location, named in the prompt
    /// * `candidates` - Frozen candidate set
    /// * `preference` - Preference label (e.g., "food")
    ///
    /// # Returns
    /// Never fails: generator errors, timeouts and unusable responses yield an
    /// empty result carrying a Classification warning
    pub async fn classify(
        &self,
        location: &Location,
        candidates: &CandidateSet,
        preference: &str,
    ) -> Classification {
        if candidates.is_empty() {
            log::debug!("No candidates to classify for '{}'", preference);
            return Classification {
                result: PreferenceResult::empty(preference),
                warning: None,
            };
        }

        let prompt = self.build_prompt(location, candidates, preference);

        // Quota wait happens before the call's time budget starts
        self.generator.acquire().await;

        let response =
            match tokio::time::timeout(self.timeout, self.generator.generate(&prompt)).await {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => return Classification::degraded(preference, e.to_string()),
                Err(_) => {
                    return Classification::degraded(
                        preference,
                        format!("timed out after {:?}", self.timeout),
                    )
                }
            };

        if response.trim().is_empty() {
            return Classification::degraded(preference, "empty model response");
        }

        let places = reconcile(candidates, &response, self.top_n);
        if places.is_empty() {
            return Classification::degraded(
                preference,
                "model response named no known place",
            );
        }

        log::info!(
            "Classified {} place(s) for '{}' in {}",
            places.len(),
            preference,
            location.name
        );

        Classification {
            result: PreferenceResult {
                preference: preference.to_string(),
                places,
            },
            warning: None,
        }
    }

    /// Build the instruction sent to the model
    /// DOCUMENTATION: Lists every candidate by name with its id and asks for a flat,
    /// comma-separated list of names, bounded to top N
    pub fn build_prompt(
        &self,
        location: &Location,
        candidates: &CandidateSet,
        preference: &str,
    ) -> String {
        let listing: Vec<String> = candidates
            .all()
            .iter()
            .map(|place| {
                if place.types.is_empty() {
                    format!("- {} (id: {})", place.name, place.id)
                } else {
                    format!(
                        "- {} (id: {}; tags: {})",
                        place.name,
                        place.id,
                        place.types.join(", ")
                    )
                }
            })
            .collect();

        format!(
            "For the city {city}, name only the top {n} attractions from the list below \
             for someone who is touring for \"{preference}\".\n\
             Return the output as comma separated values on a single line. \
             Use the place names exactly as listed. \
             Do not add numbering, quotes, explanations or places that are not listed.\n\n\
             Places:\n{listing}",
            city = location.name,
            n = self.top_n,
            preference = preference,
            listing = listing.join("\n"),
        )
    }
}

/// Match a free-text model response back to candidate ids
/// DOCUMENTATION: Tokens are split on commas (newlines and semicolons too), cleaned
/// of incidental punctuation, then matched in order of confidence:
/// 1. exact id
/// 2. exact name, case and punctuation insensitive (every id sharing that name)
/// 3. exact name once a trailing qualifier is removed ("High Park (nature)",
///    "CN Tower - skyline views")
/// 4. the first candidate whose name contains the token
///
/// Unmatched tokens are dropped. Output ids are unique, in response order,
/// capped at `top_n`, and always present in `candidates`.
pub fn reconcile(candidates: &CandidateSet, response: &str, top_n: usize) -> Vec<String> {
    let normalized: Vec<(String, &str)> = candidates
        .all()
        .iter()
        .map(|place| (normalize(&place.name), place.id.as_str()))
        .collect();

    let mut seen = HashSet::new();
    let mut places = Vec::new();

    for raw in response.split(|c: char| c == ',' || c == '\n' || c == ';') {
        let token = clean_token(raw);
        if token.is_empty() {
            continue;
        }

        for id in match_token(candidates, &normalized, token) {
            if places.len() >= top_n {
                return places;
            }
            if seen.insert(id) {
                places.push(id.to_string());
            }
        }
    }

    places
}

fn match_token<'a>(
    candidates: &'a CandidateSet,
    normalized: &[(String, &'a str)],
    token: &str,
) -> Vec<&'a str> {
    if let Some(place) = candidates.get(token) {
        return vec![place.id.as_str()];
    }

    let needle = normalize(token);
    if needle.is_empty() {
        return Vec::new();
    }

    let exact: Vec<&str> = normalized
        .iter()
        .filter(|(name, _)| *name == needle)
        .map(|(_, id)| *id)
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    if let Some(head) = strip_qualifier(token) {
        let head = normalize(head);
        let qualified: Vec<&str> = normalized
            .iter()
            .filter(|(name, _)| !head.is_empty() && *name == head)
            .map(|(_, id)| *id)
            .collect();
        if !qualified.is_empty() {
            return qualified;
        }
    }

    // "Ripleys Aquarium" against "Ripleys Aquarium of Canada"
    if needle.len() >= MIN_PARTIAL_TOKEN_LEN {
        if let Some((_, id)) = normalized
            .iter()
            .find(|(name, _)| contains_words(name, &needle))
        {
            return vec![*id];
        }
    }

    Vec::new()
}

/// Strip whitespace, list markers and incidental punctuation from a token
fn clean_token(raw: &str) -> &str {
    let token = raw.trim_matches(is_incidental);

    // "1. CN Tower" / "2) Casa Loma"
    let digits = token.chars().take_while(|c| c.is_ascii_digit()).count();
    let token = if digits > 0 && token[digits..].starts_with(|c: char| c == '.' || c == ')') {
        &token[digits + 1..]
    } else {
        token
    };

    token.trim_matches(is_incidental)
}

/// Text before a trailing parenthetical or dash/colon annotation, if there is one
fn strip_qualifier(token: &str) -> Option<&str> {
    let cut = [" (", "(", " - ", " – ", " — ", ": "]
        .iter()
        .filter_map(|sep| token.find(*sep))
        .min()?;
    Some(token[..cut].trim_matches(is_incidental))
}

fn is_incidental(c: char) -> bool {
    c.is_whitespace() || INCIDENTAL_PUNCTUATION.contains(&c)
}

/// Lowercase, drop apostrophes, turn other punctuation into spaces, collapse runs
fn normalize(text: &str) -> String {
    let mapped: String = text
        .chars()
        .filter(|c| *c != '\'' && *c != '’')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .flat_map(char::to_lowercase)
        .collect();

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Word-boundary containment on normalized text
fn contains_words(haystack: &str, needle: &str) -> bool {
    format!(" {} ", haystack).contains(&format!(" {} ", needle))
}
