//! Structural merge of a hand-edited skeleton with its regenerated version.
//!
//! The engine talks to the [`Merger`] trait. [`RegionMerger`] is the
//! built-in implementation: generated code is fenced by managed regions
//!
//! ```text
//! // codesync-managed-start: <key>
//! ...generated...
//! // codesync-managed-end: <key>
//! ```
//!
//! and everything outside a region belongs to the user. The comment style
//! around the tag is free (`//`, `/* */`, `{/* */}`), only the tag matters.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use codesync_core::ComponentId;

/// Tag opening a managed region. Its presence is the managed-edit marker.
pub const REGION_START: &str = "codesync-managed-start:";
/// Tag closing a managed region.
pub const REGION_END: &str = "codesync-managed-end:";

/// Whether `content` carries managed regions.
pub fn has_managed_marker(content: &str) -> bool {
    content.contains(REGION_START)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("{which} file has unbalanced managed region markers near line {line}")]
    Malformed { which: &'static str, line: usize },

    #[error("generated region {key:?} has no place in the edited file")]
    UnplacedRegion { key: String },

    #[error("{0}")]
    Other(String),
}

/// Everything a merger needs for one component.
#[derive(Debug, Clone, Copy)]
pub struct MergeRequest<'a> {
    pub component_id: &'a ComponentId,
    pub edited: &'a str,
    pub generated: &'a str,
    /// Node name → stable uuid, from the component bundle.
    pub node_ids: &'a BTreeMap<String, String>,
    /// Append generated regions that cannot be placed instead of failing.
    pub append_on_missing_base: bool,
}

pub trait Merger {
    fn merge(&self, request: &MergeRequest<'_>) -> Result<String, MergeError>;
}

// ---------------------------------------------------------------------------
// RegionMerger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct RegionMerger;

#[derive(Debug)]
enum Segment<'a> {
    Text(&'a str),
    Region {
        key: String,
        start: &'a str,
        body: &'a str,
        end: &'a str,
    },
}

impl Merger for RegionMerger {
    fn merge(&self, request: &MergeRequest<'_>) -> Result<String, MergeError> {
        let canonical = |key: &str| {
            request
                .node_ids
                .get(key)
                .cloned()
                .unwrap_or_else(|| key.to_owned())
        };

        let edited = split_regions(request.edited, "edited", &canonical)?;
        let generated = split_regions(request.generated, "generated", &canonical)?;

        let mut fresh: BTreeMap<&str, (&str, &str, &str)> = BTreeMap::new();
        let mut order: Vec<&str> = Vec::new();
        for segment in &generated {
            if let Segment::Region {
                key,
                start,
                body,
                end,
            } = segment
            {
                fresh.insert(key.as_str(), (*start, *body, *end));
                order.push(key.as_str());
            }
        }

        let mut placed: BTreeSet<&str> = BTreeSet::new();
        let mut out = String::with_capacity(request.edited.len());
        for segment in &edited {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Region {
                    key, start, end, ..
                } => {
                    // Regions removed upstream are dropped with their markers.
                    if let Some((_, body, _)) = fresh.get(key.as_str()) {
                        out.push_str(start);
                        out.push_str(body);
                        out.push_str(end);
                        placed.insert(key.as_str());
                    }
                }
            }
        }

        let unplaced: Vec<&str> = order
            .into_iter()
            .filter(|key| !placed.contains(key))
            .collect();
        if let Some(first) = unplaced.first() {
            if !request.append_on_missing_base {
                return Err(MergeError::UnplacedRegion {
                    key: (*first).to_owned(),
                });
            }
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            for key in unplaced {
                let (start, body, end) = fresh[key];
                out.push_str(start);
                out.push_str(body);
                out.push_str(end);
            }
        }

        Ok(out)
    }
}

/// Split `content` into text and managed regions, keeping every byte.
fn split_regions<'a>(
    content: &'a str,
    which: &'static str,
    canonical: &dyn Fn(&str) -> String,
) -> Result<Vec<Segment<'a>>, MergeError> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut open: Option<(String, usize, usize)> = None; // key, start-line offset, body offset
    let mut offset = 0;

    for (index, line) in content.split_inclusive('\n').enumerate() {
        let line_start = offset;
        offset += line.len();

        if let Some(key) = tag_key(line, REGION_START) {
            if open.is_some() {
                return Err(MergeError::Malformed {
                    which,
                    line: index + 1,
                });
            }
            if line_start > text_start {
                segments.push(Segment::Text(&content[text_start..line_start]));
            }
            open = Some((canonical(key), line_start, offset));
        } else if let Some(key) = tag_key(line, REGION_END) {
            let Some((open_key, start_at, body_at)) = open.take() else {
                return Err(MergeError::Malformed {
                    which,
                    line: index + 1,
                });
            };
            if canonical(key) != open_key {
                return Err(MergeError::Malformed {
                    which,
                    line: index + 1,
                });
            }
            segments.push(Segment::Region {
                key: open_key,
                start: &content[start_at..body_at],
                body: &content[body_at..line_start],
                end: &content[line_start..offset],
            });
            text_start = offset;
        }
    }

    if open.is_some() {
        return Err(MergeError::Malformed {
            which,
            line: content.lines().count(),
        });
    }
    if text_start < content.len() {
        segments.push(Segment::Text(&content[text_start..]));
    }
    Ok(segments)
}

/// The key following `tag` on this line, up to whitespace or a comment closer.
fn tag_key<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let rest = &line[line.find(tag)? + tag.len()..];
    let key = rest
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '*' || c == '}')
        .next()
        .unwrap_or("");
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
