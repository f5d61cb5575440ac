//! Rendering of a [`MatchReport`]: CSV rows for downstream copy/move
//! scripts, JSON, and the console summary.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::matcher::MatchReport;

pub const CSV_HEADER: [&str; 3] = ["subtitle_path", "target_path", "score"];

pub fn write_csv<W: Write>(report: &MatchReport, out: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(out);
    writer.write_record(CSV_HEADER)?;
    for m in &report.matches {
        writer.write_record([
            m.subtitle.path.as_str(),
            m.target.path.as_str(),
            m.score.to_string().as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_csv_file(report: &MatchReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Create directory {:?}", parent))?;
        }
    }
    let file = fs::File::create(path).with_context(|| format!("Open output CSV {:?}", path))?;
    write_csv(report, file)
}

pub fn to_json(report: &MatchReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Targets claimed by more than one subtitle, with their claim count.
/// Only possible in shared mode.
pub fn double_claimed(report: &MatchReport) -> Vec<(&str, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for m in &report.matches {
        *counts.entry(m.target.path.as_str()).or_default() += 1;
    }
    counts.into_iter().filter(|(_, n)| *n > 1).collect()
}

pub fn summary(report: &MatchReport) -> String {
    let mut out = String::new();
    for m in &report.matches {
        out.push_str(&format!(
            "OK   [{:>3}] {}  =>  {}\n",
            m.score, m.subtitle.path, m.target.path
        ));
    }
    for s in &report.unmatched_subtitles {
        out.push_str(&format!("MISS       {}\n", s.path));
    }
    for t in &report.unmatched_targets {
        out.push_str(&format!("FREE       {}\n", t.path));
    }
    for (target, n) in double_claimed(report) {
        out.push_str(&format!("WARN {} claimed by {} subtitles\n", target, n));
    }
    out.push_str(&format!(
        "Matched: {}  Unmatched subtitles: {}  Unclaimed targets: {}\n",
        report.matches.len(),
        report.unmatched_subtitles.len(),
        report.unmatched_targets.len()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{match_paths, MatchOptions};

    fn report() -> MatchReport {
        let subs = ["subs/Show.S01E01.srt", "subs/Show.S01E01.chs.srt", "subs/xyz.srt"];
        let tgts = ["tv/Show S01E01 1080p.mkv", "tv/abc.mkv"];
        match_paths(&subs, &tgts, &MatchOptions::default()).unwrap()
    }

    #[test]
    fn csv_has_header_and_one_row_per_match() {
        let mut buf = Vec::new();
        write_csv(&report(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "subtitle_path,target_path,score");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "subs/Show.S01E01.srt,tv/Show S01E01 1080p.mkv,10");
        assert_eq!(lines[2], "subs/Show.S01E01.chs.srt,tv/Show S01E01 1080p.mkv,10");
    }

    #[test]
    fn csv_quotes_commas_in_paths() {
        let opts = MatchOptions::default();
        let r = match_paths(&["a,b/Long Name.srt"], &["Long Name.mkv"], &opts).unwrap();
        let mut buf = Vec::new();
        write_csv(&r, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\"a,b/Long Name.srt\""));
    }

    #[test]
    fn json_lists_all_sections() {
        let json = to_json(&report()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["matches"].as_array().unwrap().len(), 2);
        assert_eq!(v["matches"][0]["score"], 10);
        assert_eq!(v["unmatched_subtitles"][0]["path"], "subs/xyz.srt");
        assert_eq!(v["unmatched_targets"][0]["base_name"], "abc");
    }

    #[test]
    fn double_claims_are_reported() {
        let r = report();
        assert_eq!(double_claimed(&r), vec![("tv/Show S01E01 1080p.mkv", 2)]);
        let text = summary(&r);
        assert!(text.contains("claimed by 2 subtitles"));
        assert!(text.contains("Matched: 2  Unmatched subtitles: 1  Unclaimed targets: 1"));
    }
}
