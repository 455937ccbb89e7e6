//! Random section and page selection for unattended runs
//!
//! A random run lands on one listing page of any configured section. When a
//! media run saves nothing, a text section is tried instead.

use crate::config::{Config, ContentKind, SectionEntry};
use rand::seq::SliceRandom;
use rand::Rng;

/// Highest listing page a random run may pick
pub const RANDOM_PAGE_MAX: u32 = 10;

/// A section and a single listing page chosen at random
#[derive(Debug, Clone, Copy)]
pub struct RandomTarget<'a> {
    pub section: &'a SectionEntry,
    pub page: u32,
}

/// Picks any configured section and a page in `1..=RANDOM_PAGE_MAX`
///
/// Returns `None` when no section is configured.
pub fn pick_random_target<'a, R: Rng + ?Sized>(
    config: &'a Config,
    rng: &mut R,
) -> Option<RandomTarget<'a>> {
    let section = config.sections.choose(rng)?;
    let page = rng.gen_range(1..=RANDOM_PAGE_MAX);
    tracing::info!("Randomly picked section '{}', page {}", section.key, page);
    Some(RandomTarget { section, page })
}

/// Picks a text section to try after a media run came back empty
pub fn pick_fallback_section<'a, R: Rng + ?Sized>(
    config: &'a Config,
    rng: &mut R,
) -> Option<&'a SectionEntry> {
    let text: Vec<&SectionEntry> = config
        .sections
        .iter()
        .filter(|s| s.kind == ContentKind::Text)
        .collect();
    text.choose(rng).copied()
}
