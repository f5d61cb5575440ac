//! Subtitle-to-target filename matching.
//!
//! Every subtitle token found as a substring of a target's normalized name
//! adds its length to the score. The best target per subtitle is kept when
//! its score is above the threshold.

use std::collections::HashSet;

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::normalize::{token_len, NormalizedName, PathEntry};

pub const DEFAULT_THRESHOLD: u32 = 5;
pub const DEFAULT_MIN_TOKEN_LENGTH: usize = 2;

/// How targets are shared between subtitles.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AssignMode {
    /// Each subtitle takes its best target; a target can be claimed many times.
    #[default]
    Shared,
    /// Greedy by descending score; a target is claimed at most once.
    Exclusive,
    /// One-to-one assignment with the most pairs, then the highest total score.
    Optimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    pub threshold: u32,
    /// Tokens of this many characters or fewer are ignored.
    pub min_token_length: usize,
    pub mode: AssignMode,
    pub parallel: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_token_length: DEFAULT_MIN_TOKEN_LENGTH,
            mode: AssignMode::Shared,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchCandidate {
    pub subtitle: PathEntry,
    pub target: PathEntry,
    pub score: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    /// Sorted by descending score, subtitle order on ties.
    pub matches: Vec<MatchCandidate>,
    pub unmatched_subtitles: Vec<PathEntry>,
    pub unmatched_targets: Vec<PathEntry>,
}

struct Scanned {
    entry: PathEntry,
    name: NormalizedName,
}

/// Score of one subtitle against one target's normalized text.
pub fn score(subtitle: &NormalizedName, target_text: &str) -> u32 {
    subtitle
        .tokens
        .iter()
        .filter(|tok| target_text.contains(tok.as_str()))
        .map(|tok| token_len(tok) as u32)
        .sum()
}

/// Pairs subtitles with targets. Pure: nothing on disk is read or written.
pub fn match_paths<S, T>(
    subtitles: &[S],
    targets: &[T],
    opts: &MatchOptions,
) -> Result<MatchReport, MatchError>
where
    S: AsRef<str>,
    T: AsRef<str>,
{
    if opts.min_token_length == 0 {
        return Err(MatchError::InvalidOption(
            "min_token_length must be at least 1".to_string(),
        ));
    }
    validate(subtitles, "subtitles")?;
    validate(targets, "targets")?;

    let subs = scan_entries(subtitles, opts.min_token_length);
    let tgts = scan_entries(targets, opts.min_token_length);

    if subs.is_empty() || tgts.is_empty() {
        return Ok(MatchReport {
            matches: Vec::new(),
            unmatched_subtitles: subs.into_iter().map(|s| s.entry).collect(),
            unmatched_targets: tgts.into_iter().map(|t| t.entry).collect(),
        });
    }

    // Per subtitle: index of the chosen target and its score, or None.
    let chosen: Vec<Option<(usize, u32)>> = match opts.mode {
        AssignMode::Shared => {
            if opts.parallel {
                subs.par_iter()
                    .map(|s| best_target(s, &tgts, opts.threshold))
                    .collect()
            } else {
                subs.iter()
                    .map(|s| best_target(s, &tgts, opts.threshold))
                    .collect()
            }
        }
        AssignMode::Exclusive => {
            let rows = score_matrix(&subs, &tgts, opts.parallel);
            assign_exclusive(&subs, &tgts, &rows, opts.threshold)
        }
        AssignMode::Optimal => {
            let rows = score_matrix(&subs, &tgts, opts.parallel);
            assign_optimal(&subs, &tgts, &rows, opts.threshold)
        }
    };

    Ok(build_report(subs, tgts, chosen))
}

fn validate<P: AsRef<str>>(paths: &[P], list: &'static str) -> Result<(), MatchError> {
    match paths.iter().position(|p| p.as_ref().trim().is_empty()) {
        Some(index) => Err(MatchError::InvalidInput { list, index }),
        None => Ok(()),
    }
}

fn scan_entries<P: AsRef<str>>(paths: &[P], min_token_length: usize) -> Vec<Scanned> {
    paths
        .iter()
        .map(|p| {
            let entry = PathEntry::new(p.as_ref());
            let name = NormalizedName::from_base_name(&entry.base_name, min_token_length);
            Scanned { entry, name }
        })
        .collect()
}

fn best_target(sub: &Scanned, tgts: &[Scanned], threshold: u32) -> Option<(usize, u32)> {
    let mut best: Option<(usize, u32)> = None;
    for (idx, t) in tgts.iter().enumerate() {
        let s = score(&sub.name, &t.name.text);
        // Strict comparison keeps the first target on ties.
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((idx, s));
        }
    }
    match best {
        Some((idx, s)) if s > threshold => {
            debug!("{} -> {} (score {})", sub.entry.path, tgts[idx].entry.path, s);
            Some((idx, s))
        }
        _ => {
            let best_score = best.map_or(0, |(_, s)| s);
            debug!("{} unmatched (best score {})", sub.entry.path, best_score);
            None
        }
    }
}

/// Row per subtitle, column per target.
fn score_matrix(subs: &[Scanned], tgts: &[Scanned], parallel: bool) -> Vec<Vec<u32>> {
    let row = |sub: &Scanned| -> Vec<u32> {
        tgts.iter().map(|t| score(&sub.name, &t.name.text)).collect()
    };
    if parallel {
        subs.par_iter().map(row).collect()
    } else {
        subs.iter().map(row).collect()
    }
}

fn assign_exclusive(
    subs: &[Scanned],
    tgts: &[Scanned],
    rows: &[Vec<u32>],
    threshold: u32,
) -> Vec<Option<(usize, u32)>> {
    let mut pairs: Vec<(u32, usize, usize)> = rows
        .iter()
        .enumerate()
        .flat_map(|(si, row)| {
            row.iter()
                .enumerate()
                .filter(move |(_, s)| **s > threshold)
                .map(move |(ti, s)| (*s, si, ti))
        })
        .collect();
    pairs.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut chosen: Vec<Option<(usize, u32)>> = vec![None; subs.len()];
    let mut claimed: HashSet<usize> = HashSet::new();
    for (s, si, ti) in pairs {
        if chosen[si].is_some() || claimed.contains(&ti) {
            continue;
        }
        debug!(
            "{} -> {} (score {}, exclusive)",
            subs[si].entry.path, tgts[ti].entry.path, s
        );
        chosen[si] = Some((ti, s));
        claimed.insert(ti);
    }
    chosen
}

/// Maximum-weight assignment over the above-threshold pairs.
///
/// Weights are packed so the solver ranks assignments by pair count, then
/// total score, then a preference for earlier subtitles and earlier targets.
fn assign_optimal(
    subs: &[Scanned],
    tgts: &[Scanned],
    rows: &[Vec<u32>],
    threshold: u32,
) -> Vec<Option<(usize, u32)>> {
    let ns = subs.len() as i128;
    let nt = tgts.len() as i128;
    let pairs = ns.min(nt);
    let max_score = rows.iter().flatten().copied().max().unwrap_or(0) as i128;
    let order_cap = pairs * (ns * (nt + 1) + nt) + 1;
    let count_unit = pairs * (max_score + 1) * order_cap + 1;

    let weight = |si: usize, ti: usize| -> i128 {
        let s = rows[si][ti];
        if s <= threshold {
            return 0;
        }
        let order = (ns - si as i128) * (nt + 1) + (nt - ti as i128);
        count_unit + s as i128 * order_cap + order
    };

    // The solver wants rows <= columns and minimizes, so negate and
    // transpose when there are more subtitles than targets.
    let assigned: Vec<(usize, usize)> = if subs.len() <= tgts.len() {
        let cost: Vec<Vec<i128>> = (0..subs.len())
            .map(|si| (0..tgts.len()).map(|ti| -weight(si, ti)).collect())
            .collect();
        hungarian(&cost, tgts.len())
            .into_iter()
            .enumerate()
            .collect()
    } else {
        let cost: Vec<Vec<i128>> = (0..tgts.len())
            .map(|ti| (0..subs.len()).map(|si| -weight(si, ti)).collect())
            .collect();
        hungarian(&cost, subs.len())
            .into_iter()
            .enumerate()
            .map(|(ti, si)| (si, ti))
            .collect()
    };

    let mut chosen: Vec<Option<(usize, u32)>> = vec![None; subs.len()];
    for (si, ti) in assigned {
        let s = rows[si][ti];
        if s > threshold {
            debug!(
                "{} -> {} (score {}, optimal)",
                subs[si].entry.path, tgts[ti].entry.path, s
            );
            chosen[si] = Some((ti, s));
        }
    }
    chosen
}

/// Kuhn-Munkres with potentials for an `n x m` cost matrix, `n <= m`.
/// Returns the column given to each row, minimizing the total cost.
fn hungarian(cost: &[Vec<i128>], m: usize) -> Vec<usize> {
    let n = cost.len();
    let inf = i128::MAX / 4;
    let mut u = vec![0i128; n + 1];
    let mut v = vec![0i128; m + 1];
    // p[j]: row (1-based) holding column j; column 0 is the virtual start.
    let mut p = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        p[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![inf; m + 1];
        let mut used = vec![false; m + 1];
        loop {
            used[j0] = true;
            let i0 = p[j0];
            let mut delta = inf;
            let mut j1 = 0usize;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let cur = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if cur < minv[j] {
                    minv[j] = cur;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[p[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if p[j0] == 0 {
                break;
            }
        }
        loop {
            let j1 = way[j0];
            p[j0] = p[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assigned = vec![0usize; n];
    for j in 1..=m {
        if p[j] != 0 {
            assigned[p[j] - 1] = j - 1;
        }
    }
    assigned
}

fn build_report(
    subs: Vec<Scanned>,
    tgts: Vec<Scanned>,
    chosen: Vec<Option<(usize, u32)>>,
) -> MatchReport {
    let mut claimed = vec![false; tgts.len()];
    let mut matches = Vec::new();
    let mut unmatched_subtitles = Vec::new();
    for (sub, pick) in subs.into_iter().zip(chosen) {
        match pick {
            Some((ti, score)) => {
                claimed[ti] = true;
                matches.push(MatchCandidate {
                    subtitle: sub.entry,
                    target: tgts[ti].entry.clone(),
                    score,
                });
            }
            None => unmatched_subtitles.push(sub.entry),
        }
    }
    // Stable sort keeps subtitle order among equal scores.
    matches.sort_by(|a, b| b.score.cmp(&a.score));

    let unmatched_targets = tgts
        .into_iter()
        .zip(claimed)
        .filter(|(_, c)| !c)
        .map(|(t, _)| t.entry)
        .collect();

    MatchReport {
        matches,
        unmatched_subtitles,
        unmatched_targets,
    }
}
